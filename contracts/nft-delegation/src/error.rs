use cosmwasm_std::StdError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Usecase {usecase} cannot be managed through a delegation manager")]
    ReservedUseCase { usecase: u64 },

    #[error("Batch arrays length mismatch")]
    LengthMismatch {},

    #[error("Batch too large (max {max})")]
    BatchTooLarge { max: u32 },

    #[error("Token id required when not delegating all tokens")]
    MissingTokenId {},

    #[error("Max batch size must be greater than zero")]
    InvalidBatchSize {},
}
