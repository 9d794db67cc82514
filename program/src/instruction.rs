use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::{
    registry::{MetadataUpdate, NewBlueprint},
    state::Hash32,
};

/// Registry and factory instructions take a fixed account prefix followed by
/// the record accounts (`address::RecordKey`) the operation reads or writes,
/// in any order. Record accounts are writable; the caller pays their rent.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub enum BlueprintInstruction {
    /// Create the config and counters accounts. The signer becomes admin.
    /// Accounts:
    /// 0. [signer, writable] admin
    /// 1. [writable] config (PDA)
    /// 2. [writable] counters (PDA)
    /// 3. [] system_program
    Initialize,

    /// Accounts:
    /// 0. [signer] admin
    /// 1. [writable] config
    SetPaused { paused: bool },

    /// Accounts:
    /// 0. [signer] admin
    /// 1. [writable] config
    TransferAdmin { new_admin: Pubkey },

    /// Register a blueprint; the signer becomes its author.
    /// Accounts:
    /// 0. [signer, writable] author
    /// 1. [] config
    /// 2. [writable] counters
    /// 3. [] system_program
    /// Records: Blueprint(next id), Hash(content_hash), Category, Author(author)
    RegisterBlueprint(NewBlueprint),

    /// Accounts 0..=3 as `RegisterBlueprint`, signer is the author.
    /// Records: Blueprint(id)
    UpdateMetadata { id: u64, update: MetadataUpdate },

    /// Accounts 0..=3 as `RegisterBlueprint`, signer is the author or admin.
    /// Records: Blueprint(id)
    SetActive { id: u64, active: bool },

    /// Accounts 0..=3 as `RegisterBlueprint`, signer is the admin.
    /// Records: Blueprint(blueprint_id), Binding(blueprint_id)
    BindImplementation {
        blueprint_id: u64,
        implementation: Pubkey,
    },

    /// Create a minimal proxy of a bound blueprint.
    /// Accounts:
    /// 0. [signer, writable] creator (pays rent)
    /// 1. [writable] config
    /// 2. [writable] counters
    /// 3. [writable] instance (PDA)
    /// 4. [] system_program
    /// Records: Blueprint(blueprint_id), Binding(blueprint_id), Instance(instance),
    /// Creator(creator), Deployed(blueprint_id), Ledger.
    /// Plus the implementation program when `init_payload` is non-empty.
    CreateProxyInstance {
        blueprint_id: u64,
        salt: Hash32,
        init_payload: Vec<u8>,
    },

    /// Create an instance holding `raw_payload`, outside any blueprint.
    /// Accounts 0..=4 as `CreateProxyInstance`.
    /// Records: Instance(instance), Creator(creator), Ledger.
    /// Plus `init_program` when `init_payload` is non-empty.
    CreateDirectInstance {
        raw_payload: Vec<u8>,
        salt: Hash32,
        init_payload: Vec<u8>,
        init_program: Option<Pubkey>,
    },

    /// Same accounts as `CreateProxyInstance`.
    CreateFromTemplate {
        blueprint_id: u64,
        salt: Hash32,
        init_payload: Vec<u8>,
    },

    /// Accounts 0..=3 as `RegisterBlueprint`, signer is the creator or admin.
    /// Records: Instance(address)
    DeactivateInstance { address: Pubkey },
}
