//! Error types for chain operations.

use thiserror::Error;
use valyield_core::{EraIndex, ValidatorId};

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Failed to connect to chain: {0}")]
    Connection(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Storage query failed: {0}")]
    Storage(String),

    #[error("Subxt error: {0}")]
    Subxt(#[from] subxt::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] subxt::error::DecodeError),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Query timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// All connection attempts to an endpoint failed.
#[derive(Error, Debug)]
#[error("Could not connect to {endpoint} after {attempts} attempts: {last_cause}")]
pub struct ConnectionError {
    pub endpoint: String,
    pub attempts: u32,
    pub last_cause: String,
}

/// Fetching one validator's era facts failed.
#[derive(Error, Debug)]
#[error("Failed to fetch era {era} data for {validator_id}: {cause}")]
pub struct FetchError {
    pub validator_id: ValidatorId,
    pub era: EraIndex,
    #[source]
    pub cause: ChainError,
}

impl FetchError {
    pub fn new(validator_id: ValidatorId, era: EraIndex, cause: ChainError) -> Self {
        Self {
            validator_id,
            era,
            cause,
        }
    }

    /// Whether the failure came from a bad input rather than the chain.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.cause, ChainError::InvalidArgument(_))
    }
}

/// A batch run could not proceed at all.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
