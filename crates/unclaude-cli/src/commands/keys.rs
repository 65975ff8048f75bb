//! Keys command — inspect the daemon's cryptographic identity.

use std::path::Path;

use anyhow::Result;
use unclaude_identity::IdentityManager;

use crate::theme::Theme;

/// Show the root and owner identities, and the effective delegation chain
/// length/capabilities (spec §4.5 `export_identity_card`).
pub(crate) fn show(identity_dir: &Path) -> Result<()> {
    let manager = IdentityManager::new(identity_dir)?;
    let card = manager.export_identity_card();

    println!("\n{}", Theme::header("Cryptographic Identity"));
    println!("  Protocol:     {} v{}", card.protocol, card.version);
    println!("  Root id:      {}", card.agent.id);
    println!("  Root key:     {}", card.agent.public_key);
    println!("  Owner id:     {}", card.owner.id);
    println!("  Owner key:    {}", card.owner.public_key);
    println!("  Chain length: {}", card.chain_length);
    println!("  Capabilities: {}", card.capabilities.join(", "));
    println!();
    Ok(())
}
