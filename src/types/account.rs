//! Signing identities and network classes

use alloy::{primitives::Address, signers::local::PrivateKeySigner};

pub const LOCAL_NETWORKS: &[&str] = &["development", "ganache-local", "anvil"];
pub const FORKED_NETWORKS: &[&str] = &["mainnet-fork", "mainnet-fork-dev"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    Local,
    Forked,
    Live,
}

impl NetworkKind {
    pub fn classify(network: &str) -> Self {
        if LOCAL_NETWORKS.contains(&network) {
            NetworkKind::Local
        } else if FORKED_NETWORKS.contains(&network) {
            NetworkKind::Forked
        } else {
            NetworkKind::Live
        }
    }

    /// Whether the node manages accounts and supports snapshot/revert.
    pub fn is_test_node(self) -> bool {
        !matches!(self, NetworkKind::Live)
    }
}

#[derive(Debug, Clone)]
pub enum Account {
    /// Account unlocked on the node (local and fork networks).
    NodeManaged { address: Address },
    /// Key held by this process (live networks).
    LocalSigner { signer: PrivateKeySigner },
}

impl Account {
    pub fn address(&self) -> Address {
        match self {
            Account::NodeManaged { address } => *address,
            Account::LocalSigner { signer } => signer.address(),
        }
    }

    pub fn signer(&self) -> Option<&PrivateKeySigner> {
        match self {
            Account::NodeManaged { .. } => None,
            Account::LocalSigner { signer } => Some(signer),
        }
    }
}
