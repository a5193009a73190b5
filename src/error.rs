use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Precondition failed: {0}")]
    Precondition(String),
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Remote commit rejected: {0}")]
    RemoteCommit(String),
    #[error("Gateway initiation failed: {0}")]
    GatewayInitiation(String),
    #[error("Mutation already in flight for entity {0}")]
    MutationInFlight(String),
    #[error("No wizard is open")]
    WizardClosed,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
