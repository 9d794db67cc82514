use solana_program::{program_error::ProgramError, pubkey::Pubkey};
use thiserror::Error;

use crate::state::Hash32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlueprintError {
    #[error("Invalid instruction")]
    InvalidInstruction,

    #[error("Blueprint {0} not found")]
    BlueprintNotFound(u64),

    #[error("Instance {0} not found")]
    InstanceNotFound(Pubkey),

    #[error("Content hash {} already registered as blueprint {existing}", hex(.hash))]
    DuplicateContent { hash: Hash32, existing: u64 },

    #[error("Required field `{0}` is empty")]
    EmptyField(&'static str),

    #[error("{caller} is not the author of blueprint {id}")]
    NotAuthor { id: u64, caller: Pubkey },

    #[error("Unauthorized: {0}")]
    Unauthorized(Pubkey),

    #[error("Blueprint {0} is inactive")]
    BlueprintInactive(u64),

    #[error("No implementation bound to blueprint {0}")]
    ImplementationNotBound(u64),

    #[error("Invalid payload: {0}")]
    InvalidPayload(&'static str),

    #[error("Instantiation of {address} failed: {reason}")]
    InstantiationFailed { address: Pubkey, reason: String },

    #[error("Instance {0} already exists")]
    AlreadyExists(Pubkey),

    #[error("Paused")]
    Paused,

    #[error("Reentrant call")]
    Reentrant,

    #[error("Account {0} does not match the expected address or owner")]
    InvalidAccount(Pubkey),

    #[error("Record account {0} was not passed to the instruction")]
    MissingAccount(Pubkey),

    #[error("Writing record account {account} failed: {reason}")]
    StorageFailed { account: Pubkey, reason: String },
}

impl BlueprintError {
    /// Stable numeric code carried by `ProgramError::Custom`.
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidInstruction => 0,
            Self::BlueprintNotFound(_) => 1,
            Self::InstanceNotFound(_) => 2,
            Self::DuplicateContent { .. } => 3,
            Self::EmptyField(_) => 4,
            Self::NotAuthor { .. } => 5,
            Self::Unauthorized(_) => 6,
            Self::BlueprintInactive(_) => 7,
            Self::ImplementationNotBound(_) => 8,
            Self::InvalidPayload(_) => 9,
            Self::InstantiationFailed { .. } => 10,
            Self::AlreadyExists(_) => 11,
            Self::Paused => 12,
            Self::Reentrant => 13,
            Self::InvalidAccount(_) => 14,
            Self::MissingAccount(_) => 15,
            Self::StorageFailed { .. } => 16,
        }
    }
}

impl From<BlueprintError> for ProgramError {
    fn from(e: BlueprintError) -> Self {
        ProgramError::Custom(e.code())
    }
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub type Result<T, E = BlueprintError> = std::result::Result<T, E>;
