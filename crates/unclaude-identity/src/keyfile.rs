//! On-disk persistence for the root and owner identities (spec §4.5):
//! `<name>_key.json` (mode 0600, secret seed) and `<name>_meta.json`
//! (public). Distinct from [`unclaude_crypto::KeyPair::load_or_generate`]'s
//! raw-byte format — the spec mandates this JSON shape so identity files
//! stay human-inspectable and match the original's `_save_identity`/
//! `_load_identity`.

use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use unclaude_core::Timestamp;
use unclaude_crypto::KeyPair;

use crate::error::{IdentityError, IdentityResult};
use crate::identity::{Identity, IdentityKind};

#[derive(Serialize, Deserialize)]
struct KeyFile {
    private_key_seed: String,
    public_key: String,
}

#[derive(Serialize, Deserialize)]
struct MetaFile {
    #[serde(rename = "type")]
    kind: String,
    id: String,
    name: String,
    public_key: String,
    created_at: Timestamp,
}

fn reject_symlink(path: &Path) -> IdentityResult<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => Err(IdentityError::SymlinkRejected(path.to_path_buf())),
        _ => Ok(()),
    }
}

/// Load the identity at `key_file`/`meta_file` if present, otherwise
/// generate a fresh Ed25519 keypair, persist it (mode 0600 on the key file),
/// and return it.
pub fn load_or_create(
    key_file: &Path,
    meta_file: &Path,
    kind: IdentityKind,
    name: &str,
) -> IdentityResult<(Identity, KeyPair)> {
    if key_file.exists() {
        load(key_file, meta_file)
    } else {
        let keypair = KeyPair::generate();
        let identity = Identity::new(kind, keypair.export_public_key(), name);
        save(&identity, &keypair, key_file, meta_file)?;
        Ok((identity, keypair))
    }
}

fn save(identity: &Identity, keypair: &KeyPair, key_file: &Path, meta_file: &Path) -> IdentityResult<()> {
    if let Some(parent) = key_file.parent() {
        std::fs::create_dir_all(parent).map_err(|e| IdentityError::Io(e.to_string()))?;
    }

    let seed = Zeroizing::new(keypair.secret_key_bytes());
    let key_data = KeyFile {
        private_key_seed: base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(*seed),
        public_key: identity.public_key.to_hex(),
    };
    let key_json = serde_json::to_string_pretty(&key_data)?;
    write_owner_only(key_file, key_json.as_bytes())?;

    let meta = MetaFile {
        kind: identity.kind.as_str().to_string(),
        id: identity.id.clone(),
        name: identity.name.clone(),
        public_key: identity.public_key.to_hex(),
        created_at: identity.created_at,
    };
    std::fs::write(meta_file, serde_json::to_string_pretty(&meta)?).map_err(|e| IdentityError::Io(e.to_string()))?;
    Ok(())
}

#[cfg(unix)]
fn write_owner_only(path: &Path, bytes: &[u8]) -> IdentityResult<()> {
    use std::io::Write as _;
    use std::os::unix::fs::OpenOptionsExt as _;
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(|e| IdentityError::Io(e.to_string()))?;
    file.write_all(bytes).map_err(|e| IdentityError::Io(e.to_string()))
}

#[cfg(not(unix))]
fn write_owner_only(path: &Path, bytes: &[u8]) -> IdentityResult<()> {
    std::fs::write(path, bytes).map_err(|e| IdentityError::Io(e.to_string()))
}

fn load(key_file: &Path, meta_file: &Path) -> IdentityResult<(Identity, KeyPair)> {
    reject_symlink(key_file)?;
    reject_symlink(meta_file)?;

    let key_json = std::fs::read_to_string(key_file).map_err(|e| IdentityError::Io(e.to_string()))?;
    let key_data: KeyFile = serde_json::from_str(&key_json)?;
    let meta_json = std::fs::read_to_string(meta_file).map_err(|e| IdentityError::Io(e.to_string()))?;
    let meta: MetaFile = serde_json::from_str(&meta_json)?;

    let seed = Zeroizing::new(
        base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(&key_data.private_key_seed)
            .map_err(|_| IdentityError::Io("malformed private_key_seed".to_string()))?,
    );
    let keypair = KeyPair::from_secret_key(&seed)?;

    let kind = if meta.kind == "human" {
        IdentityKind::Human
    } else {
        IdentityKind::Agent
    };
    let identity = Identity {
        kind,
        id: meta.id,
        public_key: keypair.export_public_key(),
        name: meta.name,
        created_at: meta.created_at,
    };
    Ok((identity, keypair))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_across_load_or_create_calls() {
        let dir = tempfile::tempdir().expect("tempdir");
        let key_file = dir.path().join("root_key.json");
        let meta_file = dir.path().join("root_meta.json");

        let (first, _) = load_or_create(&key_file, &meta_file, IdentityKind::Agent, "unclaude-root").expect("create");
        let (second, _) = load_or_create(&key_file, &meta_file, IdentityKind::Agent, "unclaude-root").expect("load");
        assert_eq!(first.id, second.id);
        assert_eq!(first.public_key.to_hex(), second.public_key.to_hex());
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt as _;
        let dir = tempfile::tempdir().expect("tempdir");
        let key_file = dir.path().join("root_key.json");
        let meta_file = dir.path().join("root_meta.json");
        load_or_create(&key_file, &meta_file, IdentityKind::Agent, "unclaude-root").expect("create");
        let perms = std::fs::metadata(&key_file).expect("metadata").permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }

    #[test]
    fn key_file_never_contains_a_bare_seed_in_meta() {
        let dir = tempfile::tempdir().expect("tempdir");
        let key_file = dir.path().join("owner_key.json");
        let meta_file = dir.path().join("owner_meta.json");
        load_or_create(&key_file, &meta_file, IdentityKind::Human, "unclaude-owner").expect("create");
        let meta_json = std::fs::read_to_string(&meta_file).expect("read");
        assert!(!meta_json.to_lowercase().contains("seed"));
        assert!(!meta_json.to_lowercase().contains("private"));
    }
}
