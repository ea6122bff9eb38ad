use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RpcArgError {
    #[error("unknown RPC function: {0}")]
    UnknownFunction(String),
    #[error("missing required argument '{0}'")]
    MissingField(String),
    #[error("argument '{field}' has invalid value '{value}'")]
    InvalidValue { field: String, value: String },
}
