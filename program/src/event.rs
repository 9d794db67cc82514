use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::{
    error::hex,
    state::{Category, DeployMethod, Hash32},
};

/// State transitions reported to off-chain indexers, emitted only after commit.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum Event {
    BlueprintRegistered {
        id: u64,
        author: Pubkey,
        content_hash: Hash32,
        category: Category,
    },
    BlueprintUpdated {
        id: u64,
    },
    BlueprintActivated {
        id: u64,
        by: Pubkey,
    },
    BlueprintDeactivated {
        id: u64,
        by: Pubkey,
    },
    ImplementationBound {
        blueprint_id: u64,
        implementation: Pubkey,
    },
    InstanceCreated {
        address: Pubkey,
        creator: Pubkey,
        blueprint_id: u64,
        method: DeployMethod,
        salt: Hash32,
    },
    InstanceDeactivated {
        address: Pubkey,
        by: Pubkey,
    },
    Paused {
        by: Pubkey,
    },
    Unpaused {
        by: Pubkey,
    },
    AdminTransferred {
        previous: Pubkey,
        next: Pubkey,
    },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::BlueprintRegistered { id, author, content_hash, category } => write!(
                f,
                "Blueprint registered: id={} author={} hash={} category={:?}",
                id,
                author,
                hex(content_hash),
                category
            ),
            Event::BlueprintUpdated { id } => write!(f, "Blueprint updated: id={}", id),
            Event::BlueprintActivated { id, by } => {
                write!(f, "Blueprint activated: id={} by={}", id, by)
            }
            Event::BlueprintDeactivated { id, by } => {
                write!(f, "Blueprint deactivated: id={} by={}", id, by)
            }
            Event::ImplementationBound { blueprint_id, implementation } => write!(
                f,
                "Implementation bound: blueprint={} implementation={}",
                blueprint_id, implementation
            ),
            Event::InstanceCreated { address, creator, blueprint_id, method, .. } => write!(
                f,
                "Instance created: address={} creator={} blueprint={} method={:?}",
                address, creator, blueprint_id, method
            ),
            Event::InstanceDeactivated { address, by } => {
                write!(f, "Instance deactivated: address={} by={}", address, by)
            }
            Event::Paused { by } => write!(f, "Paused by {}", by),
            Event::Unpaused { by } => write!(f, "Unpaused by {}", by),
            Event::AdminTransferred { previous, next } => {
                write!(f, "Admin transferred: {} -> {}", previous, next)
            }
        }
    }
}
