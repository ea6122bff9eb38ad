use std::sync::Mutex;

use slog::{warn, Logger};
use wire::{MsgType, PeerType, SessionMessage};

use crate::admission::AllowList;
use crate::callmap::CallMap;
use crate::registry::{PeerKey, PeerRegistry};

pub const FUNCNAME_GETCLIENTS: &str = "getclients";

pub struct SharedState {
    pub registry: Mutex<PeerRegistry>,
    pub callmap: Mutex<CallMap>,
    pub allow_list: AllowList,
    pub logger: Logger,
}

impl SharedState {
    pub fn new(allow_list: AllowList, logger: Logger) -> Self {
        SharedState { registry: Mutex::new(PeerRegistry::new()), callmap: Mutex::new(CallMap::new()), allow_list, logger }
    }
}

pub enum ConnAction {
    Continue,
    Close,
}

/// Dispatch one frame already known to belong to an established peer
/// (INIT has already completed). Mirrors the per-message-type dispatch
/// table the original orchestrator keyed off `SessionMsg.type`.
pub fn handle_frame(shared: &SharedState, key: &PeerKey, sid: u32, msg: SessionMessage) -> ConnAction {
    {
        let mut reg = shared.registry.lock().unwrap();
        reg.touch(key);
        if let Some(name) = msg.attr("clientname") {
            reg.set_name(key, name.to_string());
        }
    }

    match msg.msg_type {
        MsgType::Init => {
            warn!(shared.logger, "ignoring unexpected second INIT on an established connection"; "sid" => sid);
            ConnAction::Continue
        }
        MsgType::Hb => ConnAction::Continue,
        MsgType::Close => ConnAction::Close,
        MsgType::Call => {
            handle_call(shared, sid, msg);
            ConnAction::Continue
        }
        MsgType::Result => {
            handle_result(shared, msg);
            ConnAction::Continue
        }
    }
}

fn handle_call(shared: &SharedState, origin_sid: u32, msg: SessionMessage) {
    if msg.attr("funcname") == Some(FUNCNAME_GETCLIENTS) {
        reply_getclients(shared, origin_sid);
        return;
    }

    if msg.peer_type == PeerType::IfaceClient {
        shared.callmap.lock().unwrap().record(msg.uuid, origin_sid);
    }

    let reg = shared.registry.lock().unwrap();
    if msg.targets_all() {
        for entry in reg.meas_clients() {
            let _ = entry.outbox.send(msg.clone());
        }
    } else {
        for name in &msg.clients {
            match reg.by_name(name) {
                Some(entry) => {
                    let _ = entry.outbox.send(msg.clone());
                }
                None => warn!(shared.logger, "CALL targets an unregistered client, skipping"; "name" => name),
            }
        }
    }
}

/// The only built-in orchestrator function: answer with the list of
/// currently registered measurement clients' names, in registration order.
/// Interface clients (and any other non-measurement role) are excluded.
/// Matches the original's committed behavior of not echoing the request's
/// uuid back.
fn reply_getclients(shared: &SharedState, origin_sid: u32) {
    let reg = shared.registry.lock().unwrap();
    let mut reply = SessionMessage::new(MsgType::Result, PeerType::Orch);
    reply.clients = reg.meas_clients().map(|e| e.name.clone().unwrap_or_else(|| e.sid.to_string())).collect();
    reply = reply.with_attr("funcname", FUNCNAME_GETCLIENTS);
    if let Some(origin) = reg.by_sid(origin_sid) {
        let _ = origin.outbox.send(reply);
    }
}

fn handle_result(shared: &SharedState, msg: SessionMessage) {
    let origin_sid = {
        let mut callmap = shared.callmap.lock().unwrap();
        match callmap.take(msg.uuid) {
            Some(sid) => sid,
            None => {
                warn!(shared.logger, "RESULT with unknown uuid dropped"; "uuid" => msg.uuid);
                return;
            }
        }
    };

    let reg = shared.registry.lock().unwrap();
    match reg.by_sid(origin_sid) {
        Some(entry) => {
            let _ = entry.outbox.send(msg);
        }
        None => warn!(shared.logger, "RESULT's originating interface client is gone"; "sid" => origin_sid),
    }
}
