//! Where registry and factory records live.
//!
//! The registry and factory rules only talk to a [`Store`]. On-chain that is
//! one account per record (see `accounts`); [`MemoryStore`] keeps the same
//! records, plus the query indexes, in memory.

use solana_program::pubkey::Pubkey;

use crate::{
    error::Result,
    factory::Factory,
    registry::Registry,
    state::{Blueprint, Hash32, InstanceRecord},
};

pub trait Store: Sized {
    /// Ids handed out so far are `1..=blueprint_count()`.
    fn blueprint_count(&self) -> Result<u64>;

    fn blueprint(&self, id: u64) -> Result<Blueprint>;

    /// Id registered under `hash`, or 0 if none.
    fn blueprint_by_hash(&self, hash: &Hash32) -> Result<u64>;

    /// Stores a new blueprint and indexes it by hash, category and author.
    fn insert_blueprint(&mut self, blueprint: Blueprint) -> Result<()>;

    fn save_blueprint(&mut self, blueprint: &Blueprint) -> Result<()>;

    fn implementation(&self, blueprint_id: u64) -> Result<Option<Pubkey>>;

    fn bind(&mut self, blueprint_id: u64, implementation: Pubkey) -> Result<()>;

    fn has_instance(&self, address: &Pubkey) -> Result<bool>;

    fn instance(&self, address: &Pubkey) -> Result<InstanceRecord>;

    /// Appends to the ledger and indexes by creator and blueprint.
    fn insert_instance(&mut self, record: InstanceRecord) -> Result<()>;

    fn save_instance(&mut self, record: &InstanceRecord) -> Result<()>;

    /// A copy for an operation to work on, or `None` when the environment
    /// already throws away the writes of a failed operation.
    fn draft(&self) -> Option<Self>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    pub registry: Registry,
    pub factory: Factory,
}

impl Store for MemoryStore {
    fn blueprint_count(&self) -> Result<u64> {
        Ok(self.registry.len())
    }

    fn blueprint(&self, id: u64) -> Result<Blueprint> {
        self.registry.get(id).cloned()
    }

    fn blueprint_by_hash(&self, hash: &Hash32) -> Result<u64> {
        Ok(self.registry.find_by_hash(hash))
    }

    fn insert_blueprint(&mut self, blueprint: Blueprint) -> Result<()> {
        self.registry.insert(blueprint);
        Ok(())
    }

    fn save_blueprint(&mut self, blueprint: &Blueprint) -> Result<()> {
        self.registry.replace(blueprint)
    }

    fn implementation(&self, blueprint_id: u64) -> Result<Option<Pubkey>> {
        Ok(self.factory.implementation_of(blueprint_id).copied())
    }

    fn bind(&mut self, blueprint_id: u64, implementation: Pubkey) -> Result<()> {
        self.factory.bind(blueprint_id, implementation);
        Ok(())
    }

    fn has_instance(&self, address: &Pubkey) -> Result<bool> {
        Ok(self.factory.contains(address))
    }

    fn instance(&self, address: &Pubkey) -> Result<InstanceRecord> {
        self.factory.get(address).cloned()
    }

    fn insert_instance(&mut self, record: InstanceRecord) -> Result<()> {
        self.factory.insert(record);
        Ok(())
    }

    fn save_instance(&mut self, record: &InstanceRecord) -> Result<()> {
        self.factory.replace(record)
    }

    fn draft(&self) -> Option<Self> {
        Some(self.clone())
    }
}
