use cosmwasm_std::{
    entry_point, to_json_binary, Addr, Binary, Deps, DepsMut, Env, MessageInfo, Response,
    StdResult, Storage,
};
use cw2::set_contract_version;
use shared::{Collection, UseCase};
use std::collections::HashSet;

use crate::error::ContractError;
use crate::msg::{
    AddressesResponse, ConfigResponse, DelegationDetails, DetailsResponse, ExecuteMsg,
    InstantiateMsg, MostRecentResponse, QueryMsg, StatusResponse,
};
use crate::state::{self, Config, Delegation, DelegationKey, TokenScope, CONFIG};

const CONTRACT_NAME: &str = "crates.io:nft-delegation";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_MAX_BATCH_SIZE: u32 = 100;

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let config = Config {
        max_batch_size: msg.max_batch_size.unwrap_or(DEFAULT_MAX_BATCH_SIZE),
    };
    if config.max_batch_size == 0 {
        return Err(ContractError::InvalidBatchSize {});
    }
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("max_batch_size", config.max_batch_size.to_string()))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::RegisterDelegation {
            collection,
            delegate,
            expiry,
            usecase,
            all_tokens,
            token_id,
        } => execute_register_delegation(
            deps, env, info, collection, delegate, expiry, usecase, all_tokens, token_id,
        ),
        ExecuteMsg::RevokeDelegation {
            collection,
            delegate,
            usecase,
        } => execute_revoke_delegation(deps, info, collection, delegate, usecase),
        ExecuteMsg::RegisterDelegationViaManager {
            delegator,
            collection,
            delegate,
            expiry,
            usecase,
            all_tokens,
            token_id,
        } => execute_register_delegation_via_manager(
            deps, env, info, delegator, collection, delegate, expiry, usecase, all_tokens,
            token_id,
        ),
        ExecuteMsg::RevokeDelegationViaManager {
            delegator,
            collection,
            delegate,
            usecase,
        } => execute_revoke_delegation_via_manager(
            deps, env, info, delegator, collection, delegate, usecase,
        ),
        ExecuteMsg::BatchDelegations {
            collections,
            delegates,
            expiries,
            usecases,
            all_tokens,
            token_ids,
        } => execute_batch_delegations(
            deps,
            env,
            info,
            collections,
            delegates,
            expiries,
            usecases,
            all_tokens,
            token_ids,
        ),
        ExecuteMsg::BatchRevocations {
            collections,
            delegates,
            usecases,
        } => execute_batch_revocations(deps, info, collections, delegates, usecases),
    }
}

fn token_scope(all_tokens: bool, token_id: Option<String>) -> Result<TokenScope, ContractError> {
    if all_tokens {
        return Ok(TokenScope::AllTokens);
    }
    match token_id {
        Some(token_id) if !token_id.is_empty() => Ok(TokenScope::SingleToken { token_id }),
        _ => Err(ContractError::MissingTokenId {}),
    }
}

fn delegation_key(
    deps: Deps,
    delegator: Addr,
    collection: &str,
    usecase: u64,
    delegate: &str,
) -> StdResult<DelegationKey> {
    Ok(DelegationKey::new(
        delegator,
        Collection::parse(deps.api, collection)?,
        UseCase::from(usecase),
        deps.api.addr_validate(delegate)?,
    ))
}

/// The sender must be an active delegation manager of the key's delegator for
/// its collection, and reserved usecases stay with the delegator.
fn assert_manager(
    storage: &dyn Storage,
    manager: &Addr,
    key: &DelegationKey,
    now: u64,
) -> Result<(), ContractError> {
    if key.usecase.is_reserved() {
        return Err(ContractError::ReservedUseCase {
            usecase: key.usecase.as_u64(),
        });
    }
    if !state::is_delegation_manager(storage, &key.delegator, &key.collection, manager, now)? {
        return Err(ContractError::Unauthorized {});
    }
    Ok(())
}

fn delegation_attributes(method: &str, key: &DelegationKey) -> Response {
    Response::new()
        .add_attribute("method", method)
        .add_attribute("delegator", key.delegator.as_str())
        .add_attribute("collection", key.collection.to_string())
        .add_attribute("usecase", key.usecase.to_string())
        .add_attribute("delegate", key.delegate.as_str())
}

pub fn execute_register_delegation(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    collection: String,
    delegate: String,
    expiry: u64,
    usecase: u64,
    all_tokens: bool,
    token_id: Option<String>,
) -> Result<Response, ContractError> {
    let key = delegation_key(deps.as_ref(), info.sender, &collection, usecase, &delegate)?;
    let scope = token_scope(all_tokens, token_id)?;

    let now = env.block.time.seconds();
    let created = state::save_delegation(deps.storage, &key, scope, expiry, now)?;

    Ok(delegation_attributes("register_delegation", &key)
        .add_attribute("expiry", expiry.to_string())
        .add_attribute("created", created.to_string()))
}

pub fn execute_revoke_delegation(
    deps: DepsMut,
    info: MessageInfo,
    collection: String,
    delegate: String,
    usecase: u64,
) -> Result<Response, ContractError> {
    let key = delegation_key(deps.as_ref(), info.sender, &collection, usecase, &delegate)?;

    // Revoking an unknown delegation is a no-op
    let revoked = state::remove_delegation(deps.storage, &key)?;

    Ok(delegation_attributes("revoke_delegation", &key)
        .add_attribute("revoked", revoked.to_string()))
}

pub fn execute_register_delegation_via_manager(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    delegator: String,
    collection: String,
    delegate: String,
    expiry: u64,
    usecase: u64,
    all_tokens: bool,
    token_id: Option<String>,
) -> Result<Response, ContractError> {
    let now = env.block.time.seconds();
    let delegator_addr = deps.api.addr_validate(&delegator)?;
    let key = delegation_key(deps.as_ref(), delegator_addr, &collection, usecase, &delegate)?;
    assert_manager(deps.storage, &info.sender, &key, now)?;
    let scope = token_scope(all_tokens, token_id)?;

    let created = state::save_delegation(deps.storage, &key, scope, expiry, now)?;

    Ok(delegation_attributes("register_delegation_via_manager", &key)
        .add_attribute("manager", info.sender)
        .add_attribute("expiry", expiry.to_string())
        .add_attribute("created", created.to_string()))
}

pub fn execute_revoke_delegation_via_manager(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    delegator: String,
    collection: String,
    delegate: String,
    usecase: u64,
) -> Result<Response, ContractError> {
    let delegator_addr = deps.api.addr_validate(&delegator)?;
    let key = delegation_key(deps.as_ref(), delegator_addr, &collection, usecase, &delegate)?;
    assert_manager(deps.storage, &info.sender, &key, env.block.time.seconds())?;

    let revoked = state::remove_delegation(deps.storage, &key)?;

    Ok(delegation_attributes("revoke_delegation_via_manager", &key)
        .add_attribute("manager", info.sender)
        .add_attribute("revoked", revoked.to_string()))
}

fn assert_batch_size(storage: &dyn Storage, len: usize) -> Result<(), ContractError> {
    let config = CONFIG.load(storage)?;
    if len > config.max_batch_size as usize {
        return Err(ContractError::BatchTooLarge {
            max: config.max_batch_size,
        });
    }
    Ok(())
}

pub fn execute_batch_delegations(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    collections: Vec<String>,
    delegates: Vec<String>,
    expiries: Vec<u64>,
    usecases: Vec<u64>,
    all_tokens: Vec<bool>,
    token_ids: Vec<Option<String>>,
) -> Result<Response, ContractError> {
    let len = collections.len();
    if [
        delegates.len(),
        expiries.len(),
        usecases.len(),
        all_tokens.len(),
        token_ids.len(),
    ]
    .iter()
    .any(|other| *other != len)
    {
        return Err(ContractError::LengthMismatch {});
    }
    assert_batch_size(deps.storage, len)?;

    // Validate every entry before the first write
    let mut entries = Vec::with_capacity(len);
    for (i, token_id) in token_ids.into_iter().enumerate() {
        let key = delegation_key(
            deps.as_ref(),
            info.sender.clone(),
            &collections[i],
            usecases[i],
            &delegates[i],
        )?;
        let scope = token_scope(all_tokens[i], token_id)?;
        entries.push((key, scope, expiries[i]));
    }

    let now = env.block.time.seconds();
    let mut created = 0u32;
    for (key, scope, expiry) in &entries {
        if state::save_delegation(deps.storage, key, scope.clone(), *expiry, now)? {
            created += 1;
        }
    }

    Ok(Response::new()
        .add_attribute("method", "batch_delegations")
        .add_attribute("delegator", info.sender)
        .add_attribute("count", entries.len().to_string())
        .add_attribute("created", created.to_string()))
}

pub fn execute_batch_revocations(
    deps: DepsMut,
    info: MessageInfo,
    collections: Vec<String>,
    delegates: Vec<String>,
    usecases: Vec<u64>,
) -> Result<Response, ContractError> {
    let len = collections.len();
    if delegates.len() != len || usecases.len() != len {
        return Err(ContractError::LengthMismatch {});
    }
    assert_batch_size(deps.storage, len)?;

    let keys = collections
        .iter()
        .zip(&delegates)
        .zip(&usecases)
        .map(|((collection, delegate), usecase)| {
            delegation_key(deps.as_ref(), info.sender.clone(), collection, *usecase, delegate)
        })
        .collect::<StdResult<Vec<_>>>()?;

    let mut revoked = 0u32;
    for key in &keys {
        if state::remove_delegation(deps.storage, key)? {
            revoked += 1;
        }
    }

    Ok(Response::new()
        .add_attribute("method", "batch_revocations")
        .add_attribute("delegator", info.sender)
        .add_attribute("count", keys.len().to_string())
        .add_attribute("revoked", revoked.to_string()))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    let now = env.block.time.seconds();
    match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::RetrieveDelegationAddresses {
            delegator,
            collection,
            usecase,
        } => to_json_binary(&query_delegation_addresses(
            deps, now, delegator, collection, usecase,
        )?),
        QueryMsg::RetrieveDelegationAddressesDetails {
            delegator,
            collection,
            usecase,
        } => to_json_binary(&query_delegation_addresses_details(
            deps, now, delegator, collection, usecase,
        )?),
        QueryMsg::RetrieveDelegators {
            delegate,
            collection,
            usecase,
        } => to_json_binary(&query_delegators(deps, now, delegate, collection, usecase)?),
        QueryMsg::RetrieveDelegatorsDetails {
            delegate,
            collection,
            usecase,
        } => to_json_binary(&query_delegators_details(
            deps, now, delegate, collection, usecase,
        )?),
        QueryMsg::RetrieveGlobalStatusOfDelegation {
            delegator,
            collection,
            delegate,
            usecase,
        } => to_json_binary(&query_status_of_delegation(
            deps, now, delegator, collection, delegate, usecase,
        )?),
        QueryMsg::RetrieveTokenStatus {
            delegator,
            collection,
            delegate,
            usecase,
            token_id,
        } => to_json_binary(&query_token_status(
            deps, now, delegator, collection, delegate, usecase, token_id,
        )?),
        QueryMsg::RetrieveSubDelegationStatus {
            delegator,
            collection,
            manager,
        } => to_json_binary(&query_sub_delegation_status(
            deps, now, delegator, collection, manager,
        )?),
        QueryMsg::CheckConsolidationStatus {
            address_a,
            address_b,
            collection,
        } => to_json_binary(&query_consolidation_status(
            deps, now, address_a, address_b, collection,
        )?),
        QueryMsg::RetrieveActiveDelegators {
            delegate,
            collection,
            usecase,
            offset,
            limit,
        } => to_json_binary(&query_active_delegators(
            deps, now, delegate, collection, usecase, offset, limit,
        )?),
        QueryMsg::RetrieveActiveDelegations {
            delegator,
            collection,
            usecase,
            offset,
            limit,
        } => to_json_binary(&query_active_delegations(
            deps, now, delegator, collection, usecase, offset, limit,
        )?),
        QueryMsg::RetrieveMostRecentDelegation {
            delegator,
            collection,
            usecase,
        } => to_json_binary(&query_most_recent_delegation(
            deps, now, delegator, collection, usecase,
        )?),
        QueryMsg::RetrieveMostRecentDelegator {
            delegate,
            collection,
            usecase,
        } => to_json_binary(&query_most_recent_delegator(
            deps, now, delegate, collection, usecase,
        )?),
    }
}

fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        max_batch_size: config.max_batch_size,
    })
}

fn delegations_from(
    deps: Deps,
    now: u64,
    delegator: &str,
    collection: &str,
    usecase: u64,
) -> StdResult<Vec<Delegation>> {
    let delegator_addr = deps.api.addr_validate(delegator)?;
    let collection = Collection::parse(deps.api, collection)?;
    state::active_delegations_from(
        deps.storage,
        &delegator_addr,
        &collection,
        UseCase::from(usecase),
        now,
    )
}

fn delegations_to(
    deps: Deps,
    now: u64,
    delegate: &str,
    collection: &str,
    usecase: u64,
) -> StdResult<Vec<Delegation>> {
    let delegate_addr = deps.api.addr_validate(delegate)?;
    let collection = Collection::parse(deps.api, collection)?;
    state::active_delegations_to(
        deps.storage,
        &delegate_addr,
        &collection,
        UseCase::from(usecase),
        now,
    )
}

fn to_details(delegations: Vec<Delegation>) -> DetailsResponse {
    DetailsResponse {
        details: delegations
            .into_iter()
            .map(|d| DelegationDetails {
                scope: d.scope,
                expiry: d.expiry,
                registered_at: d.registered_at,
            })
            .collect(),
    }
}

fn query_delegation_addresses(
    deps: Deps,
    now: u64,
    delegator: String,
    collection: String,
    usecase: u64,
) -> StdResult<AddressesResponse> {
    let addresses = delegations_from(deps, now, &delegator, &collection, usecase)?
        .into_iter()
        .map(|d| d.delegate)
        .collect();
    Ok(AddressesResponse { addresses })
}

fn query_delegation_addresses_details(
    deps: Deps,
    now: u64,
    delegator: String,
    collection: String,
    usecase: u64,
) -> StdResult<DetailsResponse> {
    let delegations = delegations_from(deps, now, &delegator, &collection, usecase)?;
    Ok(to_details(delegations))
}

fn query_delegators(
    deps: Deps,
    now: u64,
    delegate: String,
    collection: String,
    usecase: u64,
) -> StdResult<AddressesResponse> {
    let addresses = delegations_to(deps, now, &delegate, &collection, usecase)?
        .into_iter()
        .map(|d| d.delegator)
        .collect();
    Ok(AddressesResponse { addresses })
}

fn query_delegators_details(
    deps: Deps,
    now: u64,
    delegate: String,
    collection: String,
    usecase: u64,
) -> StdResult<DetailsResponse> {
    let delegations = delegations_to(deps, now, &delegate, &collection, usecase)?;
    Ok(to_details(delegations))
}

fn query_status_of_delegation(
    deps: Deps,
    now: u64,
    delegator: String,
    collection: String,
    delegate: String,
    usecase: u64,
) -> StdResult<StatusResponse> {
    let delegator_addr = deps.api.addr_validate(&delegator)?;
    let key = delegation_key(deps, delegator_addr, &collection, usecase, &delegate)?;

    let status = state::active_delegation(deps.storage, &key, now)?.is_some();
    Ok(StatusResponse { status })
}

fn query_token_status(
    deps: Deps,
    now: u64,
    delegator: String,
    collection: String,
    delegate: String,
    usecase: u64,
    token_id: String,
) -> StdResult<StatusResponse> {
    let delegator_addr = deps.api.addr_validate(&delegator)?;
    let key = delegation_key(deps, delegator_addr, &collection, usecase, &delegate)?;

    let status = state::active_delegation(deps.storage, &key, now)?
        .map_or(false, |d| d.scope.covers(&token_id));
    Ok(StatusResponse { status })
}

fn query_sub_delegation_status(
    deps: Deps,
    now: u64,
    delegator: String,
    collection: String,
    manager: String,
) -> StdResult<StatusResponse> {
    let delegator_addr = deps.api.addr_validate(&delegator)?;
    let manager_addr = deps.api.addr_validate(&manager)?;
    let collection = Collection::parse(deps.api, &collection)?;

    let status = state::is_delegation_manager(
        deps.storage,
        &delegator_addr,
        &collection,
        &manager_addr,
        now,
    )?;
    Ok(StatusResponse { status })
}

fn query_consolidation_status(
    deps: Deps,
    now: u64,
    address_a: String,
    address_b: String,
    collection: String,
) -> StdResult<StatusResponse> {
    let a = deps.api.addr_validate(&address_a)?;
    let b = deps.api.addr_validate(&address_b)?;
    let collection = Collection::parse(deps.api, &collection)?;

    let a_to_b = DelegationKey::new(
        a.clone(),
        collection.clone(),
        UseCase::Consolidation,
        b.clone(),
    );
    let b_to_a = DelegationKey::new(b, collection, UseCase::Consolidation, a);

    // Both directions must be registered independently
    let status = state::active_delegation(deps.storage, &a_to_b, now)?.is_some()
        && state::active_delegation(deps.storage, &b_to_a, now)?.is_some();
    Ok(StatusResponse { status })
}

/// Filters first, then slices, so expired entries never take a page slot.
/// An address registered under several usecases is returned once.
fn paginate(addresses: impl Iterator<Item = Addr>, offset: u32, limit: u32) -> Vec<Addr> {
    let mut seen = HashSet::new();
    addresses
        .filter(|addr| seen.insert(addr.clone()))
        .skip(offset as usize)
        .take(limit as usize)
        .collect()
}

fn query_active_delegators(
    deps: Deps,
    now: u64,
    delegate: String,
    collection: String,
    usecase: Option<u64>,
    offset: u32,
    limit: u32,
) -> StdResult<AddressesResponse> {
    let delegate_addr = deps.api.addr_validate(&delegate)?;
    let collection = Collection::parse(deps.api, &collection)?;

    let delegations = match usecase {
        Some(usecase) => state::active_delegations_to(
            deps.storage,
            &delegate_addr,
            &collection,
            UseCase::from(usecase),
            now,
        )?,
        None => state::active_delegations_to_any(deps.storage, &delegate_addr, &collection, now)?,
    };

    let addresses = paginate(delegations.into_iter().map(|d| d.delegator), offset, limit);
    Ok(AddressesResponse { addresses })
}

fn query_active_delegations(
    deps: Deps,
    now: u64,
    delegator: String,
    collection: String,
    usecase: Option<u64>,
    offset: u32,
    limit: u32,
) -> StdResult<AddressesResponse> {
    let delegator_addr = deps.api.addr_validate(&delegator)?;
    let collection = Collection::parse(deps.api, &collection)?;

    let delegations = match usecase {
        Some(usecase) => state::active_delegations_from(
            deps.storage,
            &delegator_addr,
            &collection,
            UseCase::from(usecase),
            now,
        )?,
        None => {
            state::active_delegations_from_any(deps.storage, &delegator_addr, &collection, now)?
        }
    };

    let addresses = paginate(delegations.into_iter().map(|d| d.delegate), offset, limit);
    Ok(AddressesResponse { addresses })
}

fn query_most_recent_delegation(
    deps: Deps,
    now: u64,
    delegator: String,
    collection: String,
    usecase: u64,
) -> StdResult<MostRecentResponse> {
    let address = delegations_from(deps, now, &delegator, &collection, usecase)?
        .pop()
        .map(|d| d.delegate);
    Ok(MostRecentResponse { address })
}

fn query_most_recent_delegator(
    deps: Deps,
    now: u64,
    delegate: String,
    collection: String,
    usecase: u64,
) -> StdResult<MostRecentResponse> {
    let address = delegations_to(deps, now, &delegate, &collection, usecase)?
        .pop()
        .map(|d| d.delegator);
    Ok(MostRecentResponse { address })
}
