use std::collections::HashMap;

/// `uuid` of an in-flight CALL -> the sid of the interface client that
/// originated it, so the matching RESULT can be routed back.
///
/// Entries are removed the moment a RESULT is delivered, so a correlation
/// entry never outlives the call it was recorded for.
#[derive(Default)]
pub struct CallMap(HashMap<u32, u32>);

impl CallMap {
    pub fn new() -> Self {
        CallMap::default()
    }

    pub fn record(&mut self, uuid: u32, origin_sid: u32) {
        self.0.insert(uuid, origin_sid);
    }

    pub fn take(&mut self, uuid: u32) -> Option<u32> {
        self.0.remove(&uuid)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
