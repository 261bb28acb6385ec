use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::Addr;

use crate::state::TokenScope;

#[cw_serde]
pub struct InstantiateMsg {
    /// Maximum entries per batch message
    pub max_batch_size: Option<u32>,
}

/// `collection` accepts a collection address or the global sentinel
/// (`shared::GLOBAL_COLLECTION`). `token_id` is ignored when `all_tokens` is set.
#[cw_serde]
pub enum ExecuteMsg {
    /// Register or update a delegation from the sender
    RegisterDelegation {
        collection: String,
        delegate: String,
        expiry: u64,
        usecase: u64,
        all_tokens: bool,
        token_id: Option<String>,
    },
    /// Revoke a delegation made by the sender
    RevokeDelegation {
        collection: String,
        delegate: String,
        usecase: u64,
    },
    /// Register a delegation on behalf of `delegator` as its delegation manager
    RegisterDelegationViaManager {
        delegator: String,
        collection: String,
        delegate: String,
        expiry: u64,
        usecase: u64,
        all_tokens: bool,
        token_id: Option<String>,
    },
    /// Revoke a delegation of `delegator` as its delegation manager
    RevokeDelegationViaManager {
        delegator: String,
        collection: String,
        delegate: String,
        usecase: u64,
    },
    /// Register several delegations from the sender, all or nothing
    BatchDelegations {
        collections: Vec<String>,
        delegates: Vec<String>,
        expiries: Vec<u64>,
        usecases: Vec<u64>,
        all_tokens: Vec<bool>,
        token_ids: Vec<Option<String>>,
    },
    /// Revoke several delegations made by the sender, all or nothing
    BatchRevocations {
        collections: Vec<String>,
        delegates: Vec<String>,
        usecases: Vec<u64>,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Get configuration
    #[returns(ConfigResponse)]
    Config {},

    /// Active delegates of a delegator, in registration order
    #[returns(AddressesResponse)]
    RetrieveDelegationAddresses {
        delegator: String,
        collection: String,
        usecase: u64,
    },

    /// Scope, expiry and registration time of each address from `RetrieveDelegationAddresses`
    #[returns(DetailsResponse)]
    RetrieveDelegationAddressesDetails {
        delegator: String,
        collection: String,
        usecase: u64,
    },

    /// Active delegators pointing at a delegate, in registration order
    #[returns(AddressesResponse)]
    RetrieveDelegators {
        delegate: String,
        collection: String,
        usecase: u64,
    },

    /// Scope, expiry and registration time of each address from `RetrieveDelegators`
    #[returns(DetailsResponse)]
    RetrieveDelegatorsDetails {
        delegate: String,
        collection: String,
        usecase: u64,
    },

    /// Whether an active delegation exists for exactly this key
    #[returns(StatusResponse)]
    RetrieveGlobalStatusOfDelegation {
        delegator: String,
        collection: String,
        delegate: String,
        usecase: u64,
    },

    /// Whether an active delegation for this key covers `token_id`
    #[returns(StatusResponse)]
    RetrieveTokenStatus {
        delegator: String,
        collection: String,
        delegate: String,
        usecase: u64,
        token_id: String,
    },

    /// Whether `manager` is an active delegation manager of `delegator`
    #[returns(StatusResponse)]
    RetrieveSubDelegationStatus {
        delegator: String,
        collection: String,
        manager: String,
    },

    /// Whether both addresses hold an active consolidation grant to each other
    #[returns(StatusResponse)]
    CheckConsolidationStatus {
        address_a: String,
        address_b: String,
        collection: String,
    },

    /// Page of active delegators pointing at a delegate, across every usecase
    /// unless `usecase` is given
    #[returns(AddressesResponse)]
    RetrieveActiveDelegators {
        delegate: String,
        collection: String,
        usecase: Option<u64>,
        offset: u32,
        limit: u32,
    },

    /// Page of active delegates of a delegator, across every usecase unless
    /// `usecase` is given
    #[returns(AddressesResponse)]
    RetrieveActiveDelegations {
        delegator: String,
        collection: String,
        usecase: Option<u64>,
        offset: u32,
        limit: u32,
    },

    /// Most recently registered active delegate of a delegator
    #[returns(MostRecentResponse)]
    RetrieveMostRecentDelegation {
        delegator: String,
        collection: String,
        usecase: u64,
    },

    /// Most recently registered active delegator pointing at a delegate
    #[returns(MostRecentResponse)]
    RetrieveMostRecentDelegator {
        delegate: String,
        collection: String,
        usecase: u64,
    },
}

// Response types

#[cw_serde]
pub struct ConfigResponse {
    pub max_batch_size: u32,
}

#[cw_serde]
pub struct AddressesResponse {
    pub addresses: Vec<Addr>,
}

#[cw_serde]
pub struct DelegationDetails {
    pub scope: TokenScope,
    pub expiry: u64,
    /// Block time of the last registration
    pub registered_at: u64,
}

#[cw_serde]
pub struct DetailsResponse {
    pub details: Vec<DelegationDetails>,
}

#[cw_serde]
pub struct StatusResponse {
    pub status: bool,
}

#[cw_serde]
pub struct MostRecentResponse {
    pub address: Option<Addr>,
}
