#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("command file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("command record missing required field: {0}")]
    MissingField(String),
    #[error("command record field has the wrong shape: {0}")]
    BadField(String),
    #[error(transparent)]
    Rpc(#[from] rpc::RpcArgError),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("local connection to the orchestrator connector is closed")]
    ConnectorClosed,
}
