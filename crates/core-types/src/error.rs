use thiserror::Error;

/// Field-level failures while turning raw ledger text into typed values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unrecognized timestamp: '{0}'")]
    UnparsableTimestamp(String),

    #[error("Unrecognized amount: '{0}'")]
    UnparsableAmount(String),

    #[error("Amount is not a finite number: '{0}'")]
    NonFiniteAmount(String),
}
