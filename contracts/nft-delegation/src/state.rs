use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Order, StdResult, Storage};
use cw_storage_plus::{Item, Map};
use shared::{is_active, Collection, UseCase};

#[cw_serde]
pub struct Config {
    /// Maximum number of entries accepted by a single batch message
    pub max_batch_size: u32,
}

/// Tokens of the collection a delegation applies to
#[cw_serde]
pub enum TokenScope {
    AllTokens,
    SingleToken { token_id: String },
}

impl TokenScope {
    pub fn covers(&self, token_id: &str) -> bool {
        match self {
            TokenScope::AllTokens => true,
            TokenScope::SingleToken { token_id: id } => id == token_id,
        }
    }
}

#[cw_serde]
pub struct Delegation {
    /// Address that granted the right
    pub delegator: Addr,
    /// Collection storage key (the global sentinel for wildcard grants)
    pub collection: String,
    /// Purpose tag
    pub usecase: u64,
    /// Address receiving the right
    pub delegate: Addr,
    /// Token scope
    pub scope: TokenScope,
    /// Expiration timestamp, active while strictly in the future
    pub expiry: u64,
    /// Block time of the last registration
    pub registered_at: u64,
}

impl Delegation {
    pub fn is_active(&self, now: u64) -> bool {
        is_active(now, self.expiry)
    }
}

/// Identifies at most one delegation record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DelegationKey {
    pub delegator: Addr,
    pub collection: Collection,
    pub usecase: UseCase,
    pub delegate: Addr,
}

impl DelegationKey {
    pub fn new(delegator: Addr, collection: Collection, usecase: UseCase, delegate: Addr) -> Self {
        Self {
            delegator,
            collection,
            usecase,
            delegate,
        }
    }

    fn storage_key(&self) -> RecordKey<'_> {
        record_key(
            &self.delegator,
            self.collection.as_key(),
            self.usecase.as_u64(),
            &self.delegate,
        )
    }
}

/// Configuration storage
pub const CONFIG: Item<Config> = Item::new("config");

/// Delegation records indexed by (delegator, (collection, usecase, delegate))
const DELEGATIONS: Map<(&Addr, (&str, u64, &Addr)), Delegation> = Map::new("delegations");

/// Forward index: (delegator, collection, usecase) -> delegates in registration order
const DELEGATES: Map<(&Addr, &str, u64), Vec<Addr>> = Map::new("delegates");

/// Reverse index: (delegate, collection, usecase) -> delegators in registration order
const DELEGATORS: Map<(&Addr, &str, u64), Vec<Addr>> = Map::new("delegators");

type AddressIndex<'a> = Map<'a, (&'a Addr, &'a str, u64), Vec<Addr>>;

type RecordKey<'a> = (&'a Addr, (&'a str, u64, &'a Addr));

fn record_key<'a>(
    delegator: &'a Addr,
    collection: &'a str,
    usecase: u64,
    delegate: &'a Addr,
) -> RecordKey<'a> {
    (delegator, (collection, usecase, delegate))
}

// Record and index mutations. Nothing outside these two functions writes to
// DELEGATIONS, DELEGATES or DELEGATORS.

/// Upserts the record for `key`. Index entries are only added when the record
/// is new, so each index holds a member at most once. Returns whether the
/// record was created.
pub fn save_delegation(
    storage: &mut dyn Storage,
    key: &DelegationKey,
    scope: TokenScope,
    expiry: u64,
    now: u64,
) -> StdResult<bool> {
    let storage_key = key.storage_key();
    let created = !DELEGATIONS.has(storage, storage_key);

    let delegation = Delegation {
        delegator: key.delegator.clone(),
        collection: key.collection.as_key().to_string(),
        usecase: key.usecase.as_u64(),
        delegate: key.delegate.clone(),
        scope,
        expiry,
        registered_at: now,
    };
    DELEGATIONS.save(storage, storage_key, &delegation)?;

    if created {
        let collection = key.collection.as_key();
        let usecase = key.usecase.as_u64();
        insert_member(
            &DELEGATES,
            storage,
            (&key.delegator, collection, usecase),
            &key.delegate,
        )?;
        insert_member(
            &DELEGATORS,
            storage,
            (&key.delegate, collection, usecase),
            &key.delegator,
        )?;
    }

    Ok(created)
}

/// Removes the record for `key` and both of its index entries. Returns false
/// when there was nothing to remove.
pub fn remove_delegation(storage: &mut dyn Storage, key: &DelegationKey) -> StdResult<bool> {
    let storage_key = key.storage_key();
    if !DELEGATIONS.has(storage, storage_key) {
        return Ok(false);
    }

    DELEGATIONS.remove(storage, storage_key);

    let collection = key.collection.as_key();
    let usecase = key.usecase.as_u64();
    remove_member(
        &DELEGATES,
        storage,
        (&key.delegator, collection, usecase),
        &key.delegate,
    )?;
    remove_member(
        &DELEGATORS,
        storage,
        (&key.delegate, collection, usecase),
        &key.delegator,
    )?;

    Ok(true)
}

fn insert_member<'a>(
    index: &AddressIndex<'a>,
    storage: &mut dyn Storage,
    key: (&'a Addr, &'a str, u64),
    member: &Addr,
) -> StdResult<()> {
    let mut members = index.may_load(storage, key)?.unwrap_or_default();
    if !members.contains(member) {
        members.push(member.clone());
        index.save(storage, key, &members)?;
    }
    Ok(())
}

fn remove_member<'a>(
    index: &AddressIndex<'a>,
    storage: &mut dyn Storage,
    key: (&'a Addr, &'a str, u64),
    member: &Addr,
) -> StdResult<()> {
    let mut members = index.may_load(storage, key)?.unwrap_or_default();
    members.retain(|m| m != member);
    if members.is_empty() {
        index.remove(storage, key);
    } else {
        index.save(storage, key, &members)?;
    }
    Ok(())
}

// Reads

/// Stored record for `key`, active or not.
pub fn load_delegation(
    storage: &dyn Storage,
    key: &DelegationKey,
) -> StdResult<Option<Delegation>> {
    DELEGATIONS.may_load(storage, key.storage_key())
}

/// Record for `key` if it is active at `now`.
pub fn active_delegation(
    storage: &dyn Storage,
    key: &DelegationKey,
    now: u64,
) -> StdResult<Option<Delegation>> {
    Ok(load_delegation(storage, key)?.filter(|d| d.is_active(now)))
}

/// Raw forward index entry, including expired delegates.
pub fn delegates_of(
    storage: &dyn Storage,
    delegator: &Addr,
    collection: &Collection,
    usecase: UseCase,
) -> StdResult<Vec<Addr>> {
    Ok(DELEGATES
        .may_load(storage, (delegator, collection.as_key(), usecase.as_u64()))?
        .unwrap_or_default())
}

/// Raw reverse index entry, including expired delegators.
pub fn delegators_of(
    storage: &dyn Storage,
    delegate: &Addr,
    collection: &Collection,
    usecase: UseCase,
) -> StdResult<Vec<Addr>> {
    Ok(DELEGATORS
        .may_load(storage, (delegate, collection.as_key(), usecase.as_u64()))?
        .unwrap_or_default())
}

/// Active records granted by `delegator`, in forward index order.
pub fn active_delegations_from(
    storage: &dyn Storage,
    delegator: &Addr,
    collection: &Collection,
    usecase: UseCase,
    now: u64,
) -> StdResult<Vec<Delegation>> {
    let delegates = delegates_of(storage, delegator, collection, usecase)?;
    let keys = delegates
        .iter()
        .map(|delegate| record_key(delegator, collection.as_key(), usecase.as_u64(), delegate));
    collect_active(storage, now, keys)
}

/// Active records pointing at `delegate`, in reverse index order.
pub fn active_delegations_to(
    storage: &dyn Storage,
    delegate: &Addr,
    collection: &Collection,
    usecase: UseCase,
    now: u64,
) -> StdResult<Vec<Delegation>> {
    let delegators = delegators_of(storage, delegate, collection, usecase)?;
    let keys = delegators
        .iter()
        .map(|delegator| record_key(delegator, collection.as_key(), usecase.as_u64(), delegate));
    collect_active(storage, now, keys)
}

/// Active records granted by `delegator` over every usecase, ascending by
/// usecase and in index order within a usecase.
pub fn active_delegations_from_any(
    storage: &dyn Storage,
    delegator: &Addr,
    collection: &Collection,
    now: u64,
) -> StdResult<Vec<Delegation>> {
    let mut delegations = Vec::new();
    for item in DELEGATES
        .prefix((delegator, collection.as_key()))
        .range(storage, None, None, Order::Ascending)
    {
        let (usecase, delegates) = item?;
        delegations.extend(collect_active(
            storage,
            now,
            delegates.iter().map(|delegate| {
                record_key(delegator, collection.as_key(), usecase, delegate)
            }),
        )?);
    }
    Ok(delegations)
}

/// Active records pointing at `delegate` over every usecase.
pub fn active_delegations_to_any(
    storage: &dyn Storage,
    delegate: &Addr,
    collection: &Collection,
    now: u64,
) -> StdResult<Vec<Delegation>> {
    let mut delegations = Vec::new();
    for item in DELEGATORS
        .prefix((delegate, collection.as_key()))
        .range(storage, None, None, Order::Ascending)
    {
        let (usecase, delegators) = item?;
        delegations.extend(collect_active(
            storage,
            now,
            delegators.iter().map(|delegator| {
                record_key(delegator, collection.as_key(), usecase, delegate)
            }),
        )?);
    }
    Ok(delegations)
}

fn collect_active<'a>(
    storage: &dyn Storage,
    now: u64,
    keys: impl Iterator<Item = RecordKey<'a>>,
) -> StdResult<Vec<Delegation>> {
    let mut active = Vec::new();
    for key in keys {
        let delegation = DELEGATIONS.load(storage, key)?;
        if delegation.is_active(now) {
            active.push(delegation);
        }
    }
    Ok(active)
}

/// Whether `manager` holds an active manager grant from `delegator` for
/// `collection`. A global grant covers every collection.
pub fn is_delegation_manager(
    storage: &dyn Storage,
    delegator: &Addr,
    collection: &Collection,
    manager: &Addr,
    now: u64,
) -> StdResult<bool> {
    let scoped = DelegationKey::new(
        delegator.clone(),
        collection.clone(),
        UseCase::Manager,
        manager.clone(),
    );
    if active_delegation(storage, &scoped, now)?.is_some() {
        return Ok(true);
    }
    if collection.is_global() {
        return Ok(false);
    }

    let global = DelegationKey {
        collection: Collection::Global,
        ..scoped
    };
    Ok(active_delegation(storage, &global, now)?.is_some())
}
