pub mod client;
pub mod config;
pub mod dsp;
pub mod radio;

pub use client::Client;
pub use config::Config;
pub use radio::{FakeRadio, Radio, RadioError};
