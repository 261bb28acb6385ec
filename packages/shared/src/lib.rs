// Shared types for the NFT delegation registry on CosmWasm

use std::fmt;

use cosmwasm_std::{Addr, Api, StdResult};

/// Collection identifier meaning "applies to every collection".
pub const GLOBAL_COLLECTION: &str = "0x8888888888888888888888888888888888888888";

/// Collection a delegation applies to, resolved from the raw identifier at the
/// message boundary.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Global,
    Specific(Addr),
}

impl Collection {
    /// Maps the sentinel to `Global`, everything else must be a valid address.
    pub fn parse(api: &dyn Api, raw: &str) -> StdResult<Self> {
        if raw == GLOBAL_COLLECTION {
            return Ok(Collection::Global);
        }
        Ok(Collection::Specific(api.addr_validate(raw)?))
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Collection::Global)
    }

    /// Storage key component
    pub fn as_key(&self) -> &str {
        match self {
            Collection::Global => GLOBAL_COLLECTION,
            Collection::Specific(addr) => addr.as_str(),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// Purpose tag of a delegation.
///
/// `0`, `998` and `999` are reserved by the registry; every other value is an
/// application-defined rights category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UseCase {
    /// Generic, all-purpose delegation
    All,
    /// Grants the delegate the right to manage delegations on the delegator's behalf
    Manager,
    /// One direction of a consolidation pair
    Consolidation,
    /// Application-defined; `From<u64>` never produces it for a reserved value
    Custom(u64),
}

impl UseCase {
    pub const ALL: u64 = 0;
    pub const MANAGER: u64 = 998;
    pub const CONSOLIDATION: u64 = 999;

    /// Manager and consolidation grants can only be issued by the delegator itself.
    /// Checked on the numeric value, so a hand-built `Custom(998)` is reserved too.
    pub fn is_reserved(&self) -> bool {
        matches!(self.as_u64(), UseCase::MANAGER | UseCase::CONSOLIDATION)
    }

    pub fn as_u64(&self) -> u64 {
        u64::from(*self)
    }
}

impl From<u64> for UseCase {
    fn from(value: u64) -> Self {
        match value {
            UseCase::ALL => UseCase::All,
            UseCase::MANAGER => UseCase::Manager,
            UseCase::CONSOLIDATION => UseCase::Consolidation,
            other => UseCase::Custom(other),
        }
    }
}

impl From<UseCase> for u64 {
    fn from(usecase: UseCase) -> Self {
        match usecase {
            UseCase::All => UseCase::ALL,
            UseCase::Manager => UseCase::MANAGER,
            UseCase::Consolidation => UseCase::CONSOLIDATION,
            UseCase::Custom(value) => value,
        }
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u64())
    }
}

/// A delegation is active while its expiry lies strictly in the future.
/// An expiry of 0 is already expired.
pub fn is_active(current_time: u64, expiry: u64) -> bool {
    expiry > current_time
}
