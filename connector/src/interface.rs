use std::sync::mpsc::{self, Receiver, Sender};

use slog::{info, o, warn, Logger};
use wire::{MessageEndpoint, MsgType, PeerType, SessionMessage};

use crate::base::{spawn_local_reader, spawn_peer_reader, Dialer, Event};
use crate::error::ConnectError;
use crate::policy::ReconnectPolicy;

pub const CALL_QUIT: &str = "quit";
pub const CALL_STATUS: &str = "status";
pub const RES_READY: &str = "ready";

/// What to do with a local (driver-originated) call once handled.
enum LocalOutcome {
    /// Not a built-in call: forward it on to the orchestrator unchanged.
    Forward,
    /// A built-in call was answered locally; keep the loop running.
    Handled,
    /// `quit` was received: a CLOSE has already been sent, stop the loop.
    Quit,
}

/// The interface driver's peer connector: dials the orchestrator once
/// (fail-fast, no retry budget, see `ReconnectPolicy::INTERFACE`),
/// answers the driver's readiness poll and quit request locally, and
/// otherwise relays CALLs down to measurement clients and RESULTs back up.
pub struct InterfaceConnector {
    dialer: Dialer,
    logger: Logger,
}

impl InterfaceConnector {
    pub fn new(host: impl Into<String>, port: u16, name: impl Into<String>, logger: Logger) -> Self {
        InterfaceConnector {
            dialer: Dialer::new(host, port, PeerType::IfaceClient, ReconnectPolicy::INTERFACE).with_name(name),
            logger: logger.new(o!("role" => "iface-connector")),
        }
    }

    pub fn run(&mut self, to_driver: Sender<SessionMessage>, from_driver: Receiver<SessionMessage>) -> Result<(), ConnectError> {
        let (endpoint, sid) = self.dialer.dial_and_init(0)?;
        info!(self.logger, "connected to orchestrator"; "sid" => sid);

        let (tx_evt, rx_evt) = mpsc::channel::<Event>();
        let mut writer = endpoint.try_clone()?;
        spawn_peer_reader(endpoint, tx_evt.clone());
        spawn_local_reader(from_driver, tx_evt);

        loop {
            match rx_evt.recv() {
                Ok(Event::FromPeer(msg)) => {
                    to_driver.send(msg).ok();
                }
                Ok(Event::PeerClosed) => {
                    warn!(self.logger, "orchestrator connection closed");
                    return Ok(());
                }
                Ok(Event::FromLocal(msg)) => match self.handle_local_call(&msg, sid, &mut writer, &to_driver) {
                    LocalOutcome::Quit => return Ok(()),
                    LocalOutcome::Handled => {}
                    LocalOutcome::Forward => {
                        let mut out = msg;
                        out.sid = sid;
                        if writer.send(&out).is_err() {
                            warn!(self.logger, "write to orchestrator failed");
                            return Ok(());
                        }
                    }
                },
                Ok(Event::LocalClosed) | Err(_) => return Ok(()),
            }
        }
    }

    fn handle_local_call(
        &mut self,
        msg: &SessionMessage,
        sid: u32,
        writer: &mut wire::FramedStream<std::net::TcpStream>,
        to_driver: &Sender<SessionMessage>,
    ) -> LocalOutcome {
        let Some(funcname) = msg.attr("funcname") else {
            return LocalOutcome::Forward;
        };
        match funcname {
            CALL_STATUS => {
                let reply = SessionMessage::new(MsgType::Result, PeerType::IfaceClient)
                    .with_attr("funcname", CALL_STATUS)
                    .with_attr("result", RES_READY);
                to_driver.send(reply).ok();
                LocalOutcome::Handled
            }
            CALL_QUIT => {
                let mut close = SessionMessage::new(MsgType::Close, PeerType::IfaceClient);
                close.sid = sid;
                writer.send(&close).ok();
                LocalOutcome::Quit
            }
            _ => LocalOutcome::Forward,
        }
    }
}
