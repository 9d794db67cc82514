use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::{
    constants::NO_BLUEPRINT,
    error::{BlueprintError, Result},
    state::{Blueprint, Category, Hash32},
    store::Store,
};

/// Fields supplied when registering a blueprint.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewBlueprint {
    pub name: String,
    pub description: String,
    pub version: String,
    pub content_hash: Hash32,
    pub locator: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub init_schema: String,
}

/// Metadata edits. `None` and empty strings leave the stored value alone.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub init_schema: Option<String>,
}

pub fn register<S: Store>(store: &mut S, author: Pubkey, now: i64, new: NewBlueprint) -> Result<u64> {
    if new.name.is_empty() {
        return Err(BlueprintError::EmptyField("name"));
    }
    if new.content_hash == [0u8; 32] {
        return Err(BlueprintError::EmptyField("content_hash"));
    }
    if new.locator.is_empty() {
        return Err(BlueprintError::EmptyField("locator"));
    }
    let existing = store.blueprint_by_hash(&new.content_hash)?;
    if existing != NO_BLUEPRINT {
        return Err(BlueprintError::DuplicateContent {
            hash: new.content_hash,
            existing,
        });
    }

    let id = store.blueprint_count()? + 1;
    store.insert_blueprint(Blueprint {
        id,
        content_hash: new.content_hash,
        locator: new.locator,
        name: new.name,
        description: new.description,
        version: new.version,
        tags: new.tags,
        init_schema: new.init_schema,
        author,
        category: new.category,
        created_at: now,
        deployment_count: 0,
        active: true,
    })?;
    Ok(id)
}

pub fn update_metadata<S: Store>(store: &mut S, caller: &Pubkey, id: u64, update: MetadataUpdate) -> Result<()> {
    let mut blueprint = store.blueprint(id)?;
    if blueprint.author != *caller {
        return Err(BlueprintError::NotAuthor { id, caller: *caller });
    }

    let replace = |slot: &mut String, value: Option<String>| {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            *slot = value;
        }
    };
    replace(&mut blueprint.name, update.name);
    replace(&mut blueprint.description, update.description);
    replace(&mut blueprint.version, update.version);
    replace(&mut blueprint.init_schema, update.init_schema);
    store.save_blueprint(&blueprint)
}

/// Toggles the lifecycle flag. Administrators bypass the author check.
pub fn set_active<S: Store>(store: &mut S, caller: &Pubkey, is_admin: bool, id: u64, active: bool) -> Result<()> {
    let mut blueprint = store.blueprint(id)?;
    if blueprint.author != *caller && !is_admin {
        return Err(BlueprintError::NotAuthor { id, caller: *caller });
    }
    blueprint.active = active;
    store.save_blueprint(&blueprint)
}

/// Counts one more instance against `id`. Only the factory reaches this.
pub(crate) fn record_deployment<S: Store>(store: &mut S, id: u64) -> Result<u64> {
    let mut blueprint = require_active(store, id)?;
    blueprint.deployment_count += 1;
    store.save_blueprint(&blueprint)?;
    Ok(blueprint.deployment_count)
}

pub fn require_active<S: Store>(store: &S, id: u64) -> Result<Blueprint> {
    let blueprint = store.blueprint(id)?;
    if !blueprint.active {
        return Err(BlueprintError::BlueprintInactive(id));
    }
    Ok(blueprint)
}

/// Blueprint arena. Ids are dense: blueprint `id` lives at index `id - 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    blueprints: Vec<Blueprint>,
    by_hash: BTreeMap<Hash32, u64>,
    by_category: BTreeMap<Category, Vec<u64>>,
    by_author: BTreeMap<Pubkey, Vec<u64>>,
}

impl Registry {
    pub(crate) fn insert(&mut self, blueprint: Blueprint) {
        self.by_hash.insert(blueprint.content_hash, blueprint.id);
        self.by_category.entry(blueprint.category).or_default().push(blueprint.id);
        self.by_author.entry(blueprint.author).or_default().push(blueprint.id);
        self.blueprints.push(blueprint);
    }

    pub(crate) fn replace(&mut self, blueprint: &Blueprint) -> Result<()> {
        let slot = Self::index(blueprint.id)
            .and_then(|i| self.blueprints.get_mut(i))
            .ok_or(BlueprintError::BlueprintNotFound(blueprint.id))?;
        *slot = blueprint.clone();
        Ok(())
    }

    pub fn get(&self, id: u64) -> Result<&Blueprint> {
        Self::index(id)
            .and_then(|i| self.blueprints.get(i))
            .ok_or(BlueprintError::BlueprintNotFound(id))
    }

    fn index(id: u64) -> Option<usize> {
        if id == NO_BLUEPRINT {
            return None;
        }
        usize::try_from(id - 1).ok()
    }

    /// Id registered under `hash`, or 0 if none.
    pub fn find_by_hash(&self, hash: &Hash32) -> u64 {
        self.by_hash.get(hash).copied().unwrap_or(NO_BLUEPRINT)
    }

    pub fn ids_by_category(&self, category: Category) -> &[u64] {
        self.by_category.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn ids_by_author(&self, author: &Pubkey) -> &[u64] {
        self.by_author.get(author).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_ids(&self) -> Vec<u64> {
        (1..=self.len()).collect()
    }

    pub fn len(&self) -> u64 {
        self.blueprints.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }

    /// Window of records in id order, plus the total count.
    pub fn list_paginated(&self, offset: u64, limit: u64) -> (&[Blueprint], u64) {
        (window(&self.blueprints, offset, limit), self.len())
    }
}

pub(crate) fn window<T>(items: &[T], offset: u64, limit: u64) -> &[T] {
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(items.len());
    let len = usize::try_from(limit).unwrap_or(usize::MAX);
    let end = start.saturating_add(len).min(items.len());
    &items[start..end]
}
