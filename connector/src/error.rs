use thiserror::Error;
use wire::WireError;

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to reach {host}:{port} after {tries} attempt(s): {source}")]
    Exhausted { host: String, port: u16, tries: u32, source: std::io::Error },
    #[error(transparent)]
    Wire(#[from] WireError),
}
