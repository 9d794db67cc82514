//! Mutating entry points over the registry and the factory.
//!
//! Every entry point checks the pause flag, holds the reentrancy lock for its
//! whole duration, and either commits all of its writes or none of them.
//! Events are handed to the host only after a commit.

use solana_program::pubkey::Pubkey;

use crate::{
    error::Result,
    event::Event,
    factory,
    host::Host,
    registry::{self, MetadataUpdate, NewBlueprint},
    state::{Config, Hash32},
    store::Store,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hub<S> {
    pub store: S,
}

impl<S: Store> Hub<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn transact<H, T, F>(&mut self, config: &mut Config, host: &mut H, op: F) -> Result<T>
    where
        H: Host,
        F: FnOnce(&mut S, &Config, &mut H, &mut Vec<Event>) -> Result<T>,
    {
        config.require_not_paused()?;
        config.lock()?;

        let mut events = Vec::new();
        let result = match self.store.draft() {
            Some(mut draft) => {
                let result = op(&mut draft, &*config, &mut *host, &mut events);
                if result.is_ok() {
                    self.store = draft;
                }
                result
            }
            None => op(&mut self.store, &*config, &mut *host, &mut events),
        };
        config.unlock();

        match result {
            Ok(value) => {
                host.commit();
                for event in &events {
                    host.emit(event);
                }
                Ok(value)
            }
            Err(e) => {
                host.revert();
                Err(e)
            }
        }
    }

    pub fn register_blueprint<H: Host>(
        &mut self,
        config: &mut Config,
        host: &mut H,
        caller: &Pubkey,
        new: NewBlueprint,
    ) -> Result<u64> {
        self.transact(config, host, |store, _, host, events| {
            let content_hash = new.content_hash;
            let category = new.category;
            let id = registry::register(store, *caller, host.now(), new)?;
            events.push(Event::BlueprintRegistered {
                id,
                author: *caller,
                content_hash,
                category,
            });
            Ok(id)
        })
    }

    pub fn update_metadata<H: Host>(
        &mut self,
        config: &mut Config,
        host: &mut H,
        caller: &Pubkey,
        id: u64,
        update: MetadataUpdate,
    ) -> Result<()> {
        self.transact(config, host, |store, _, _, events| {
            registry::update_metadata(store, caller, id, update)?;
            events.push(Event::BlueprintUpdated { id });
            Ok(())
        })
    }

    pub fn set_active<H: Host>(
        &mut self,
        config: &mut Config,
        host: &mut H,
        caller: &Pubkey,
        id: u64,
        active: bool,
    ) -> Result<()> {
        self.transact(config, host, |store, config, _, events| {
            registry::set_active(store, caller, config.is_admin(caller), id, active)?;
            events.push(if active {
                Event::BlueprintActivated { id, by: *caller }
            } else {
                Event::BlueprintDeactivated { id, by: *caller }
            });
            Ok(())
        })
    }

    pub fn bind_implementation<H: Host>(
        &mut self,
        config: &mut Config,
        host: &mut H,
        caller: &Pubkey,
        blueprint_id: u64,
        implementation: Pubkey,
    ) -> Result<()> {
        self.transact(config, host, |store, config, _, events| {
            config.require_admin(caller)?;
            factory::bind_implementation(store, blueprint_id, implementation)?;
            events.push(Event::ImplementationBound {
                blueprint_id,
                implementation,
            });
            Ok(())
        })
    }

    pub fn create_proxy_instance<H: Host>(
        &mut self,
        config: &mut Config,
        host: &mut H,
        caller: &Pubkey,
        blueprint_id: u64,
        salt: Hash32,
        init_payload: &[u8],
    ) -> Result<Pubkey> {
        self.transact(config, host, |store, _, host, events| {
            let address = factory::create_proxy_instance(store, host, caller, blueprint_id, salt, init_payload)?;
            events.push(instance_created(store, &address)?);
            Ok(address)
        })
    }

    pub fn create_direct_instance<H: Host>(
        &mut self,
        config: &mut Config,
        host: &mut H,
        caller: &Pubkey,
        raw_payload: &[u8],
        salt: Hash32,
        init_payload: &[u8],
    ) -> Result<Pubkey> {
        self.transact(config, host, |store, _, host, events| {
            let address = factory::create_direct_instance(store, host, caller, raw_payload, salt, init_payload)?;
            events.push(instance_created(store, &address)?);
            Ok(address)
        })
    }

    pub fn create_from_template<H: Host>(
        &mut self,
        config: &mut Config,
        host: &mut H,
        caller: &Pubkey,
        blueprint_id: u64,
        salt: Hash32,
        init_payload: &[u8],
    ) -> Result<Pubkey> {
        self.transact(config, host, |store, _, host, events| {
            let address = factory::create_from_template(store, host, caller, blueprint_id, salt, init_payload)?;
            events.push(instance_created(store, &address)?);
            Ok(address)
        })
    }

    pub fn deactivate_instance<H: Host>(
        &mut self,
        config: &mut Config,
        host: &mut H,
        caller: &Pubkey,
        address: Pubkey,
    ) -> Result<()> {
        self.transact(config, host, |store, config, _, events| {
            factory::deactivate_instance(store, caller, config.is_admin(caller), &address)?;
            events.push(Event::InstanceDeactivated { address, by: *caller });
            Ok(())
        })
    }
}

fn instance_created<S: Store>(store: &S, address: &Pubkey) -> Result<Event> {
    let record = store.instance(address)?;
    Ok(Event::InstanceCreated {
        address: record.address,
        creator: record.creator,
        blueprint_id: record.blueprint_id,
        method: record.method,
        salt: record.salt,
    })
}
