pub mod attrs;
pub mod codec;
pub mod endpoint;
pub mod error;
pub mod message;

pub use attrs::Attrs;
pub use codec::{decode_unframed, encode_unframed, read_framed, write_framed};
pub use endpoint::{ChannelEndpoint, FramedStream, MessageEndpoint};
pub use error::WireError;
pub use message::{random_id, MsgType, PeerType, Sample, SessionMessage, ALL_CLIENTS};
