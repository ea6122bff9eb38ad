use std::net::TcpStream;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use wire::{FramedStream, MessageEndpoint, MsgType, PeerType, SessionMessage};

use crate::error::ConnectError;
use crate::policy::ReconnectPolicy;

/// Dials the orchestrator and performs the INIT handshake, honoring a
/// connector's reconnect policy (see `ReconnectPolicy::MEASUREMENT` vs
/// `ReconnectPolicy::INTERFACE`).
pub struct Dialer {
    host: String,
    port: u16,
    policy: ReconnectPolicy,
    peer_type: PeerType,
    name: Option<String>,
}

impl Dialer {
    pub fn new(host: impl Into<String>, port: u16, peer_type: PeerType, policy: ReconnectPolicy) -> Self {
        Dialer { host: host.into(), port, policy, peer_type, name: None }
    }

    /// Stamp `clientname` on the INIT message. The measurement side never
    /// calls this (it registers its name on the first RESULT instead); the
    /// interface side does, matching `ifaceconnector.py`'s `send_init`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn connect(&self) -> Result<TcpStream, ConnectError> {
        let mut tries = 0u32;
        loop {
            match TcpStream::connect((self.host.as_str(), self.port)) {
                Ok(stream) => return Ok(stream),
                Err(source) => {
                    tries += 1;
                    if tries >= self.policy.max_tries {
                        return Err(ConnectError::Exhausted { host: self.host.clone(), port: self.port, tries, source });
                    }
                    thread::sleep(self.policy.sleep);
                }
            }
        }
    }

    /// Dial and exchange INIT. `sid` is 0 on first connect (let the
    /// orchestrator assign one); pass a previously assigned sid to ask the
    /// orchestrator to recognize this as the same peer reconnecting.
    pub fn dial_and_init(&self, sid: u32) -> Result<(FramedStream<TcpStream>, u32), ConnectError> {
        let stream = self.connect()?;
        let mut endpoint = FramedStream::new(stream);
        let mut init = SessionMessage::new(MsgType::Init, self.peer_type);
        init.sid = sid;
        if let Some(name) = &self.name {
            init = init.with_attr("clientname", name.clone());
        }
        endpoint.send(&init)?;
        let reply = endpoint.recv()?;
        Ok((endpoint, reply.sid))
    }
}

/// One multiplexed source feeding a connector's main loop: either the
/// orchestrator connection or the local driver mailbox.
pub enum Event {
    FromPeer(SessionMessage),
    PeerClosed,
    FromLocal(SessionMessage),
    LocalClosed,
}

pub fn spawn_peer_reader(mut endpoint: FramedStream<TcpStream>, out: Sender<Event>) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        match endpoint.recv() {
            Ok(msg) => {
                if out.send(Event::FromPeer(msg)).is_err() {
                    break;
                }
            }
            Err(_) => {
                let _ = out.send(Event::PeerClosed);
                break;
            }
        }
    })
}

pub fn spawn_local_reader(from_driver: Receiver<SessionMessage>, out: Sender<Event>) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        match from_driver.recv() {
            Ok(msg) => {
                if out.send(Event::FromLocal(msg)).is_err() {
                    break;
                }
            }
            Err(_) => {
                let _ = out.send(Event::LocalClosed);
                break;
            }
        }
    })
}
