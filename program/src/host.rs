//! The environment the core runs in.
//!
//! Registry and factory logic never call syscalls directly; they create
//! instances, forward init calls and read the clock through [`Host`]. The
//! processor supplies a CPI-backed host, [`MemoryHost`] keeps everything in
//! memory for off-chain simulation and tests.

use std::collections::BTreeMap;

use solana_program::pubkey::Pubkey;

use crate::{
    error::{BlueprintError, Result},
    event::Event,
    state::Hash32,
};

/// Everything needed to create one instance at its derived address.
#[derive(Debug, Clone)]
pub struct Deployment<'a> {
    pub address: Pubkey,
    pub bump: u8,
    pub final_salt: Hash32,
    pub code_hash: Hash32,
    pub code: &'a [u8],
}

pub trait Host {
    fn program_id(&self) -> &Pubkey;

    fn now(&self) -> i64;

    /// Creates the instance account holding `deployment.code`.
    fn deploy(&mut self, deployment: &Deployment) -> Result<()>;

    /// Forwards `payload` to the freshly created instance. `delegate` is the
    /// program that handles it, if the instance has one bound.
    fn initialize(&mut self, deployment: &Deployment, delegate: Option<&Pubkey>, payload: &[u8]) -> Result<()>;

    fn emit(&mut self, event: &Event);

    /// Called once the operation has committed.
    fn commit(&mut self) {}

    /// Called when the operation failed; staged side effects must be dropped.
    fn revert(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitCall {
    pub instance: Pubkey,
    pub delegate: Option<Pubkey>,
    pub payload: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    program_id: Pubkey,
    pub clock: i64,
    pub accounts: BTreeMap<Pubkey, Vec<u8>>,
    pub init_calls: Vec<InitCall>,
    pub events: Vec<Event>,
    /// Init payloads the simulated instances refuse.
    pub rejected_payloads: Vec<Vec<u8>>,
    staged_accounts: Vec<Pubkey>,
    staged_calls: usize,
}

impl MemoryHost {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            clock: 1,
            ..Default::default()
        }
    }

    pub fn reject_payload(mut self, payload: &[u8]) -> Self {
        self.rejected_payloads.push(payload.to_vec());
        self
    }

    pub fn account(&self, address: &Pubkey) -> Option<&[u8]> {
        self.accounts.get(address).map(Vec::as_slice)
    }
}

impl Host for MemoryHost {
    fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    fn now(&self) -> i64 {
        self.clock
    }

    fn deploy(&mut self, deployment: &Deployment) -> Result<()> {
        if self.accounts.contains_key(&deployment.address) {
            return Err(BlueprintError::InstantiationFailed {
                address: deployment.address,
                reason: "account already in use".into(),
            });
        }
        self.accounts.insert(deployment.address, deployment.code.to_vec());
        self.staged_accounts.push(deployment.address);
        Ok(())
    }

    fn initialize(&mut self, deployment: &Deployment, delegate: Option<&Pubkey>, payload: &[u8]) -> Result<()> {
        if self.rejected_payloads.iter().any(|p| p == payload) {
            return Err(BlueprintError::InstantiationFailed {
                address: deployment.address,
                reason: "init call rejected".into(),
            });
        }
        self.init_calls.push(InitCall {
            instance: deployment.address,
            delegate: delegate.copied(),
            payload: payload.to_vec(),
        });
        self.staged_calls += 1;
        Ok(())
    }

    fn emit(&mut self, event: &Event) {
        self.events.push(event.clone());
    }

    fn commit(&mut self) {
        self.staged_accounts.clear();
        self.staged_calls = 0;
        self.clock += 1;
    }

    fn revert(&mut self) {
        for address in self.staged_accounts.drain(..) {
            self.accounts.remove(&address);
        }
        let kept = self.init_calls.len() - self.staged_calls;
        self.init_calls.truncate(kept);
        self.staged_calls = 0;
    }
}
