pub mod admission;
pub mod callmap;
pub mod config;
pub mod registry;
pub mod server;
pub mod session;

pub use admission::AllowList;
pub use callmap::CallMap;
pub use config::Config;
pub use registry::{PeerKey, PeerRegistry, PeerRegistryEntry};
pub use server::serve;
pub use session::{handle_frame, ConnAction, SharedState};
