//! A delegation chain: the ordered sequence of links from the owner down to
//! a session or subagent identity (spec §3 Delegation Chain).

use crate::delegation::Delegation;

/// An ordered chain of delegations, root-most link first.
#[derive(Debug, Clone, Default)]
pub struct DelegationChain(Vec<Delegation>);

impl DelegationChain {
    /// An empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a chain from an existing sequence of links.
    #[must_use]
    pub fn from_links(links: Vec<Delegation>) -> Self {
        Self(links)
    }

    /// Append a link, returning the extended chain.
    #[must_use]
    pub fn extended_with(&self, link: Delegation) -> Self {
        let mut links = self.0.clone();
        links.push(link);
        Self(links)
    }

    /// Links in root-to-leaf order.
    #[must_use]
    pub fn links(&self) -> &[Delegation] {
        &self.0
    }

    /// Number of links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the chain has no links.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The leaf-most (most recently minted) link, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Delegation> {
        self.0.last()
    }

    /// The capabilities in effect at the end of the chain: the leaf link's
    /// capability list, or empty if the chain has no links.
    #[must_use]
    pub fn effective_capabilities(&self) -> Vec<String> {
        self.last().map(|link| link.capabilities.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use unclaude_crypto::KeyPair;

    #[test]
    fn effective_capabilities_come_from_leaf_link() {
        let signer = KeyPair::generate();
        let root_link = Delegation::new("owner", "root", &signer, vec!["*".to_string()], Duration::days(365), 5);
        let session_link = Delegation::new(
            "root",
            "session",
            &signer,
            vec!["file:read".to_string()],
            Duration::hours(8),
            3,
        );
        let chain = DelegationChain::new().extended_with(root_link).extended_with(session_link);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.effective_capabilities(), vec!["file:read".to_string()]);
    }

    #[test]
    fn empty_chain_has_no_capabilities() {
        assert!(DelegationChain::new().effective_capabilities().is_empty());
    }
}
