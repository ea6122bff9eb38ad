use std::net::{IpAddr, TcpListener, TcpStream};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use slog::{info, warn};
use wire::{FramedStream, MessageEndpoint, MsgType, SessionMessage};

use crate::registry::PeerRegistryEntry;
use crate::session::{handle_frame, ConnAction, SharedState};

/// Accept connections forever, spawning one reader thread per connection.
/// No connection-level error is fatal to the orchestrator process itself;
/// a bad peer only ever costs its own connection.
pub fn serve(listener: TcpListener, shared: Arc<SharedState>) -> ! {
    loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                let ip = addr.ip();
                if !is_allowed(&shared, ip) {
                    warn!(shared.logger, "rejecting connection from non-allow-listed address"; "addr" => %addr);
                    continue;
                }
                let shared = Arc::clone(&shared);
                thread::spawn(move || handle_connection(shared, stream));
            }
            Err(e) => {
                warn!(shared.logger, "accept() failed"; "error" => %e);
            }
        }
    }
}

fn is_allowed(shared: &SharedState, ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => shared.allow_list.allows(v4),
        IpAddr::V6(_) => false,
    }
}

fn handle_connection(shared: Arc<SharedState>, stream: TcpStream) {
    let Ok(peer_addr) = stream.peer_addr() else { return };
    let host = peer_addr.ip().to_string();
    let port = peer_addr.port();
    let key = (host.clone(), port);

    let mut reader = match stream.try_clone() {
        Ok(s) => FramedStream::new(s),
        Err(_) => return,
    };

    let init_msg = match reader.recv() {
        Ok(m) => m,
        Err(e) => {
            warn!(shared.logger, "connection dropped before INIT"; "host" => &host, "port" => port, "error" => %e);
            return;
        }
    };
    if init_msg.msg_type != MsgType::Init {
        warn!(shared.logger, "first message from peer was not INIT, dropping connection"; "host" => &host, "port" => port);
        return;
    }

    let requested_sid = init_msg.sid;
    {
        let reg = shared.registry.lock().unwrap();
        if requested_sid != 0 && reg.sid_in_use(requested_sid, &key) {
            warn!(shared.logger, "rejecting INIT: sid already claimed by a different peer"; "sid" => requested_sid);
            return;
        }
    }
    let sid = if requested_sid == 0 { wire::random_id() } else { requested_sid };

    let (outbox_tx, outbox_rx) = mpsc::channel::<SessionMessage>();
    let writer_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    };
    let writer_logger = shared.logger.clone();
    thread::spawn(move || {
        let mut writer = FramedStream::new(writer_stream);
        for msg in outbox_rx.iter() {
            if writer.send(&msg).is_err() {
                warn!(writer_logger, "write to peer failed, closing its outbox");
                break;
            }
        }
    });

    let name = init_msg.attr("clientname").map(|s| s.to_string());
    {
        let mut reg = shared.registry.lock().unwrap();
        reg.insert(PeerRegistryEntry {
            host: host.clone(),
            port,
            sid,
            name,
            role: init_msg.peer_type,
            outbox: outbox_tx.clone(),
            last_activity: Instant::now(),
        });
    }
    info!(shared.logger, "peer registered"; "host" => &host, "port" => port, "sid" => sid);

    let mut reply = init_msg;
    reply.sid = sid;
    let _ = outbox_tx.send(reply);

    loop {
        match reader.recv() {
            Ok(msg) => {
                if matches!(handle_frame(&shared, &key, sid, msg), ConnAction::Close) {
                    info!(shared.logger, "CLOSE from peer"; "sid" => sid);
                    break;
                }
            }
            Err(e) => {
                if e.is_disconnect() {
                    info!(shared.logger, "connection closed"; "host" => &host, "port" => port, "sid" => sid);
                } else {
                    warn!(shared.logger, "malformed frame from peer, closing connection"; "sid" => sid, "error" => %e);
                }
                break;
            }
        }
    }

    shared.registry.lock().unwrap().remove(&key);
}
