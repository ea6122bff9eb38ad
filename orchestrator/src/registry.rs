use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::time::Instant;

use indexmap::IndexMap;
use wire::{PeerType, SessionMessage};

pub type PeerKey = (String, u16);

pub struct PeerRegistryEntry {
    pub host: String,
    pub port: u16,
    pub sid: u32,
    pub name: Option<String>,
    pub role: PeerType,
    pub outbox: Sender<SessionMessage>,
    pub last_activity: Instant,
}

/// Live peers keyed by `(host, port)`. Iteration order is registration
/// order, required for `"all"` fan-out and for `getclients` to report a
/// stable, reproducible list.
#[derive(Default)]
pub struct PeerRegistry {
    by_key: IndexMap<PeerKey, PeerRegistryEntry>,
    sid_index: HashMap<u32, PeerKey>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        PeerRegistry::default()
    }

    /// True if `sid` belongs to a live entry other than `except`. Used to
    /// reject an INIT that claims a sid already held by a different peer.
    pub fn sid_in_use(&self, sid: u32, except: &PeerKey) -> bool {
        self.sid_index.get(&sid).map(|k| k != except).unwrap_or(false)
    }

    pub fn insert(&mut self, entry: PeerRegistryEntry) {
        let key = (entry.host.clone(), entry.port);
        self.sid_index.insert(entry.sid, key.clone());
        self.by_key.insert(key, entry);
    }

    pub fn remove(&mut self, key: &PeerKey) -> Option<PeerRegistryEntry> {
        let entry = self.by_key.shift_remove(key)?;
        self.sid_index.remove(&entry.sid);
        Some(entry)
    }

    pub fn touch(&mut self, key: &PeerKey) {
        if let Some(entry) = self.by_key.get_mut(key) {
            entry.last_activity = Instant::now();
        }
    }

    pub fn set_name(&mut self, key: &PeerKey, name: String) {
        if let Some(entry) = self.by_key.get_mut(key) {
            entry.name = Some(name);
        }
    }

    pub fn by_sid(&self, sid: u32) -> Option<&PeerRegistryEntry> {
        self.sid_index.get(&sid).and_then(|k| self.by_key.get(k))
    }

    pub fn by_name(&self, name: &str) -> Option<&PeerRegistryEntry> {
        self.by_key.values().find(|e| e.name.as_deref() == Some(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerRegistryEntry> {
        self.by_key.values()
    }

    /// Registered measurement clients only, in registration order. Used
    /// wherever a reply or fan-out must exclude interface clients (and any
    /// other non-measurement role) per the `"all"` and `getclients` contract.
    pub fn meas_clients(&self) -> impl Iterator<Item = &PeerRegistryEntry> {
        self.by_key.values().filter(|e| e.role == PeerType::MeasClient)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn entry(host: &str, port: u16, sid: u32) -> (PeerRegistryEntry, std::sync::mpsc::Receiver<SessionMessage>) {
        entry_with_role(host, port, sid, PeerType::MeasClient)
    }

    fn entry_with_role(host: &str, port: u16, sid: u32, role: PeerType) -> (PeerRegistryEntry, std::sync::mpsc::Receiver<SessionMessage>) {
        let (tx, rx) = mpsc::channel();
        (
            PeerRegistryEntry { host: host.to_string(), port, sid, name: None, role, outbox: tx, last_activity: Instant::now() },
            rx,
        )
    }

    #[test]
    fn iteration_preserves_registration_order() {
        let mut reg = PeerRegistry::new();
        let (e1, _r1) = entry("10.0.0.1", 1111, 1);
        let (e2, _r2) = entry("10.0.0.2", 2222, 2);
        let (e3, _r3) = entry("10.0.0.3", 3333, 3);
        reg.insert(e1);
        reg.insert(e2);
        reg.insert(e3);
        let sids: Vec<u32> = reg.iter().map(|e| e.sid).collect();
        assert_eq!(sids, vec![1, 2, 3]);
    }

    #[test]
    fn sid_collision_detection_ignores_self() {
        let mut reg = PeerRegistry::new();
        let (e1, _r1) = entry("10.0.0.1", 1111, 42);
        reg.insert(e1);
        let key = ("10.0.0.1".to_string(), 1111);
        assert!(!reg.sid_in_use(42, &key));
        let other_key = ("10.0.0.2".to_string(), 2222);
        assert!(reg.sid_in_use(42, &other_key));
    }

    #[test]
    fn remove_clears_both_indexes() {
        let mut reg = PeerRegistry::new();
        let (e1, _r1) = entry("10.0.0.1", 1111, 7);
        reg.insert(e1);
        let key = ("10.0.0.1".to_string(), 1111);
        assert!(reg.remove(&key).is_some());
        assert!(reg.by_sid(7).is_none());
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn meas_clients_excludes_other_roles() {
        let mut reg = PeerRegistry::new();
        let (e1, _r1) = entry_with_role("10.0.0.1", 1111, 1, PeerType::MeasClient);
        let (e2, _r2) = entry_with_role("10.0.0.2", 2222, 2, PeerType::IfaceClient);
        let (e3, _r3) = entry_with_role("10.0.0.3", 3333, 3, PeerType::MeasClient);
        reg.insert(e1);
        reg.insert(e2);
        reg.insert(e3);
        let sids: Vec<u32> = reg.meas_clients().map(|e| e.sid).collect();
        assert_eq!(sids, vec![1, 3]);
    }
}
