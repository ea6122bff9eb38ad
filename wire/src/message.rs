use serde::{Deserialize, Serialize};

use crate::attrs::Attrs;

/// Sentinel that, when it appears at position 0 of `clients`, means
/// "every currently registered peer" rather than the literal name "all".
pub const ALL_CLIENTS: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsgType {
    Init,
    Close,
    Call,
    Result,
    Hb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerType {
    MeasClient,
    IfaceClient,
    Orch,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub r: f32,
    pub j: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub sid: u32,
    pub uuid: u32,
    pub msg_type: MsgType,
    pub peer_type: PeerType,
    pub start_time: f64,
    pub clients: Vec<String>,
    pub samples: Vec<Sample>,
    pub measurements: Vec<f32>,
    pub attributes: Attrs,
}

impl SessionMessage {
    pub fn new(msg_type: MsgType, peer_type: PeerType) -> Self {
        SessionMessage {
            sid: 0,
            uuid: 0,
            msg_type,
            peer_type,
            start_time: 0.0,
            clients: Vec::new(),
            samples: Vec::new(),
            measurements: Vec::new(),
            attributes: Attrs::new(),
        }
    }

    /// True when `clients` resolves to the fan-out-to-everyone sentinel,
    /// i.e. `"all"` sits at position 0. A client literally named `all`
    /// appearing anywhere else in the list is just a name.
    pub fn targets_all(&self) -> bool {
        self.clients.first().map(|c| c.as_str() == ALL_CLIENTS).unwrap_or(false)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key)
    }

    pub fn with_attr(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.attributes.push(key, val);
        self
    }
}

/// 31-bit random id, matching `random.getrandbits(31)` in the peer this
/// protocol was modeled on: `sid` and `uuid` are always non-negative when
/// read back as a signed 32-bit integer by older clients.
pub fn random_id() -> u32 {
    rand::random::<u32>() & 0x7fff_ffff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_sentinel_only_at_position_zero() {
        let mut msg = SessionMessage::new(MsgType::Call, PeerType::IfaceClient);
        msg.clients = vec!["node-a".into(), "all".into()];
        assert!(!msg.targets_all());

        msg.clients = vec!["all".into(), "node-a".into()];
        assert!(msg.targets_all());
    }

    #[test]
    fn random_id_is_non_negative_when_cast_to_i32() {
        for _ in 0..1000 {
            let id = random_id();
            assert!(id as i32 >= 0);
        }
    }
}
