use std::net::AddrParseError;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BudgetError>;

#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("{0}")]
    Validation(String),
    #[error("income must be a positive amount to calculate a budget")]
    InsufficientIncome,
    #[error("unsupported projection horizon of {0} months")]
    InvalidHorizon(u32),
    #[error("invalid bind address: {0}")]
    InvalidAddress(#[from] AddrParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl BudgetError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BudgetError::Validation(msg.into())
    }
}
