use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::{
    error::{BlueprintError, Result},
    event::Event,
};

pub type Hash32 = [u8; 32];

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Token,
    Nft,
    Multisig,
    Governance,
    Defi,
    Game,
    Custom,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Blueprint {
    pub id: u64,
    pub content_hash: Hash32,
    /// Where the payload lives in content-addressed storage. Never dereferenced here.
    pub locator: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub tags: Vec<String>,
    pub init_schema: String,
    pub author: Pubkey,
    pub category: Category,
    pub created_at: i64,
    pub deployment_count: u64,
    pub active: bool,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployMethod {
    Proxy,
    Direct,
    Template,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    pub address: Pubkey,
    pub creator: Pubkey,
    /// 0 for direct instances.
    pub blueprint_id: u64,
    pub method: DeployMethod,
    pub salt: Hash32,
    pub created_at: i64,
    pub active: bool,
}

/// Record counts, stored in the counters PDA. Blueprint ids are `1..=blueprints`.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    pub blueprints: u64,
    pub instances: u64,
    pub bump: u8,
}

impl Counters {
    pub const LEN: usize = 8 + 8 + 1;
}

/// Process-wide configuration, stored in the config PDA.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub admin: Pubkey,
    pub paused: bool,
    pub locked: bool,
    pub bump: u8,
}

impl Config {
    pub const LEN: usize = 32 + // admin
        1 + // paused
        1 + // locked
        1; // bump

    pub fn new(admin: Pubkey, bump: u8) -> Self {
        Self {
            admin,
            paused: false,
            locked: false,
            bump,
        }
    }

    pub fn is_admin(&self, who: &Pubkey) -> bool {
        self.admin == *who
    }

    pub fn require_admin(&self, who: &Pubkey) -> Result<()> {
        if !self.is_admin(who) {
            return Err(BlueprintError::Unauthorized(*who));
        }
        Ok(())
    }

    pub fn require_not_paused(&self) -> Result<()> {
        if self.paused {
            return Err(BlueprintError::Paused);
        }
        Ok(())
    }

    /// Takes the reentrancy lock.
    pub fn lock(&mut self) -> Result<()> {
        if self.locked {
            return Err(BlueprintError::Reentrant);
        }
        self.locked = true;
        Ok(())
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn set_paused(&mut self, caller: &Pubkey, paused: bool) -> Result<Event> {
        self.require_admin(caller)?;
        self.paused = paused;
        Ok(if paused {
            Event::Paused { by: *caller }
        } else {
            Event::Unpaused { by: *caller }
        })
    }

    pub fn transfer_admin(&mut self, caller: &Pubkey, next: Pubkey) -> Result<Event> {
        self.require_admin(caller)?;
        if next == Pubkey::default() {
            return Err(BlueprintError::EmptyField("admin"));
        }
        let previous = std::mem::replace(&mut self.admin, next);
        Ok(Event::AdminTransferred { previous, next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_len_matches_encoding() {
        let config = Config::new(Pubkey::new_unique(), 254);
        assert_eq!(borsh::to_vec(&config).unwrap().len(), Config::LEN);
    }

    #[test]
    fn counters_len_matches_encoding() {
        let counters = Counters { blueprints: u64::MAX, instances: 3, bump: 7 };
        assert_eq!(borsh::to_vec(&counters).unwrap().len(), Counters::LEN);
    }

    #[test]
    fn lock_is_not_reentrant() {
        let mut config = Config::new(Pubkey::new_unique(), 255);
        config.lock().unwrap();
        assert_eq!(config.lock(), Err(BlueprintError::Reentrant));
        config.unlock();
        assert!(config.lock().is_ok());
    }

    #[test]
    fn admin_checks() {
        let admin = Pubkey::new_unique();
        let other = Pubkey::new_unique();
        let mut config = Config::new(admin, 255);
        assert!(config.require_admin(&admin).is_ok());
        assert_eq!(config.require_admin(&other), Err(BlueprintError::Unauthorized(other)));

        assert!(config.require_not_paused().is_ok());
        config.paused = true;
        assert_eq!(config.require_not_paused(), Err(BlueprintError::Paused));
    }

    #[test]
    fn pause_and_admin_transfer() {
        let admin = Pubkey::new_unique();
        let next = Pubkey::new_unique();
        let mut config = Config::new(admin, 255);

        assert_eq!(config.set_paused(&next, true), Err(BlueprintError::Unauthorized(next)));
        assert_eq!(config.set_paused(&admin, true), Ok(Event::Paused { by: admin }));
        assert!(config.paused);
        assert_eq!(config.set_paused(&admin, false), Ok(Event::Unpaused { by: admin }));

        assert_eq!(
            config.transfer_admin(&admin, Pubkey::default()),
            Err(BlueprintError::EmptyField("admin"))
        );
        assert_eq!(
            config.transfer_admin(&admin, next),
            Ok(Event::AdminTransferred { previous: admin, next })
        );
        assert!(config.is_admin(&next));
        assert!(config.require_admin(&admin).is_err());
    }
}
