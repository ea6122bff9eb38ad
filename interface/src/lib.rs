pub mod config;
pub mod driver;
pub mod error;
pub mod psd;
pub mod store;
pub mod viewer;

pub use config::Config;
pub use driver::Driver;
pub use error::DriverError;
pub use store::{MemoryStore, SampleStore, SharedMemoryStore};
pub use viewer::{NoopViewer, ProcessViewer, PsdViewer};
