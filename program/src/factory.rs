use std::collections::BTreeMap;

use solana_program::pubkey::Pubkey;

use crate::{
    address::{code_hash, combine_salt, derive_address, proxy_image},
    constants::NO_BLUEPRINT,
    error::{BlueprintError, Result},
    host::{Deployment, Host},
    registry::{self, window},
    state::{DeployMethod, Hash32, InstanceRecord},
    store::Store,
};

/// Binds (or rebinds) the proxy target of an active blueprint.
pub fn bind_implementation<S: Store>(store: &mut S, blueprint_id: u64, implementation: Pubkey) -> Result<()> {
    registry::require_active(store, blueprint_id)?;
    if implementation == Pubkey::default() {
        return Err(BlueprintError::EmptyField("implementation"));
    }
    store.bind(blueprint_id, implementation)
}

pub fn create_proxy_instance<S: Store, H: Host>(
    store: &mut S,
    host: &mut H,
    creator: &Pubkey,
    blueprint_id: u64,
    salt: Hash32,
    init_payload: &[u8],
) -> Result<Pubkey> {
    create_proxy(store, host, creator, blueprint_id, salt, init_payload, DeployMethod::Proxy)
}

/// Template instantiation reuses the proxy path; only the ledger method differs.
pub fn create_from_template<S: Store, H: Host>(
    store: &mut S,
    host: &mut H,
    creator: &Pubkey,
    blueprint_id: u64,
    salt: Hash32,
    init_payload: &[u8],
) -> Result<Pubkey> {
    create_proxy(store, host, creator, blueprint_id, salt, init_payload, DeployMethod::Template)
}

pub fn create_direct_instance<S: Store, H: Host>(
    store: &mut S,
    host: &mut H,
    creator: &Pubkey,
    raw_payload: &[u8],
    salt: Hash32,
    init_payload: &[u8],
) -> Result<Pubkey> {
    if raw_payload.is_empty() {
        return Err(BlueprintError::InvalidPayload("empty bytecode"));
    }
    let address = instantiate(store, host, creator, salt, raw_payload, None, init_payload)?;
    record(store, host, address, *creator, NO_BLUEPRINT, DeployMethod::Direct, salt)?;
    Ok(address)
}

fn create_proxy<S: Store, H: Host>(
    store: &mut S,
    host: &mut H,
    creator: &Pubkey,
    blueprint_id: u64,
    salt: Hash32,
    init_payload: &[u8],
    method: DeployMethod,
) -> Result<Pubkey> {
    registry::require_active(store, blueprint_id)?;
    let implementation = store
        .implementation(blueprint_id)?
        .ok_or(BlueprintError::ImplementationNotBound(blueprint_id))?;

    let image = proxy_image(&implementation);
    let address = instantiate(store, host, creator, salt, &image, Some(&implementation), init_payload)?;
    registry::record_deployment(store, blueprint_id)?;
    record(store, host, address, *creator, blueprint_id, method, salt)?;
    Ok(address)
}

fn instantiate<S: Store, H: Host>(
    store: &S,
    host: &mut H,
    creator: &Pubkey,
    salt: Hash32,
    code: &[u8],
    delegate: Option<&Pubkey>,
    init_payload: &[u8],
) -> Result<Pubkey> {
    let final_salt = combine_salt(&salt, creator);
    let code_hash = code_hash(code);
    let (address, bump) = derive_address(host.program_id(), &final_salt, &code_hash);
    if store.has_instance(&address)? {
        return Err(BlueprintError::AlreadyExists(address));
    }

    let deployment = Deployment {
        address,
        bump,
        final_salt,
        code_hash,
        code,
    };
    host.deploy(&deployment)?;
    if !init_payload.is_empty() {
        host.initialize(&deployment, delegate, init_payload)?;
    }
    Ok(address)
}

fn record<S: Store, H: Host>(
    store: &mut S,
    host: &H,
    address: Pubkey,
    creator: Pubkey,
    blueprint_id: u64,
    method: DeployMethod,
    salt: Hash32,
) -> Result<()> {
    store.insert_instance(InstanceRecord {
        address,
        creator,
        blueprint_id,
        method,
        salt,
        created_at: host.now(),
        active: true,
    })
}

/// Marks the record inactive. Bookkeeping only; the instance itself is untouched.
pub fn deactivate_instance<S: Store>(store: &mut S, caller: &Pubkey, is_admin: bool, address: &Pubkey) -> Result<()> {
    let mut record = store.instance(address)?;
    if record.creator != *caller && !is_admin {
        return Err(BlueprintError::Unauthorized(*caller));
    }
    record.active = false;
    store.save_instance(&record)
}

/// Instance ledger plus the blueprint -> implementation bindings used for proxies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Factory {
    implementations: BTreeMap<u64, Pubkey>,
    /// Append-only, in creation order.
    instances: Vec<InstanceRecord>,
    by_address: BTreeMap<Pubkey, u64>,
    by_creator: BTreeMap<Pubkey, Vec<Pubkey>>,
    by_blueprint: BTreeMap<u64, Vec<Pubkey>>,
}

impl Factory {
    pub(crate) fn bind(&mut self, blueprint_id: u64, implementation: Pubkey) {
        self.implementations.insert(blueprint_id, implementation);
    }

    pub(crate) fn insert(&mut self, record: InstanceRecord) {
        self.by_address.insert(record.address, self.instances.len() as u64);
        self.by_creator.entry(record.creator).or_default().push(record.address);
        if record.blueprint_id != NO_BLUEPRINT {
            self.by_blueprint.entry(record.blueprint_id).or_default().push(record.address);
        }
        self.instances.push(record);
    }

    pub(crate) fn replace(&mut self, record: &InstanceRecord) -> Result<()> {
        let index = *self
            .by_address
            .get(&record.address)
            .ok_or(BlueprintError::InstanceNotFound(record.address))?;
        self.instances[index as usize] = record.clone();
        Ok(())
    }

    pub fn implementation_of(&self, blueprint_id: u64) -> Option<&Pubkey> {
        self.implementations.get(&blueprint_id)
    }

    pub fn get(&self, address: &Pubkey) -> Result<&InstanceRecord> {
        self.by_address
            .get(address)
            .map(|&i| &self.instances[i as usize])
            .ok_or(BlueprintError::InstanceNotFound(*address))
    }

    pub fn contains(&self, address: &Pubkey) -> bool {
        self.by_address.contains_key(address)
    }

    pub fn instances_by_creator(&self, creator: &Pubkey) -> &[Pubkey] {
        self.by_creator.get(creator).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn instances_by_blueprint(&self, blueprint_id: u64) -> &[Pubkey] {
        self.by_blueprint.get(&blueprint_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> u64 {
        self.instances.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Window of records in creation order, plus the total count.
    pub fn list_paginated(&self, offset: u64, limit: u64) -> (&[InstanceRecord], u64) {
        (window(&self.instances, offset, limit), self.len())
    }
}
