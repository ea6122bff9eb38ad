use std::sync::mpsc::{self, Receiver, Sender};

use slog::{info, o, warn, Logger};
use wire::{MessageEndpoint, MsgType, PeerType, SessionMessage};

use crate::base::{spawn_local_reader, spawn_peer_reader, Dialer, Event};
use crate::error::ConnectError;
use crate::policy::ReconnectPolicy;

/// The measurement-side peer connector: dials the orchestrator, forwards
/// CALLs down to the local measurement client, stamps and forwards its
/// RESULTs back up, and reconnects (preserving its assigned sid) if the
/// orchestrator connection drops unexpectedly.
pub struct MeasurementConnector {
    dialer: Dialer,
    clientname: String,
    logger: Logger,
}

impl MeasurementConnector {
    pub fn new(host: impl Into<String>, port: u16, clientname: impl Into<String>, logger: Logger) -> Self {
        let clientname = clientname.into();
        MeasurementConnector {
            dialer: Dialer::new(host, port, PeerType::MeasClient, ReconnectPolicy::MEASUREMENT),
            logger: logger.new(o!("role" => "meas-connector")),
            clientname,
        }
    }

    /// Blocks until the local driver mailbox closes (`from_driver` hangs
    /// up) or reconnect attempts are exhausted. `to_driver`/`from_driver`
    /// are the two halves of the pipe this connector shares with the
    /// measurement client driving the radio.
    pub fn run(&mut self, to_driver: Sender<SessionMessage>, from_driver: Receiver<SessionMessage>) -> Result<(), ConnectError> {
        let (tx_evt, rx_evt) = mpsc::channel::<Event>();
        spawn_local_reader(from_driver, tx_evt.clone());

        let mut sid = 0u32;
        loop {
            let (endpoint, assigned_sid) = self.dialer.dial_and_init(sid)?;
            sid = assigned_sid;
            info!(self.logger, "connected to orchestrator"; "sid" => sid);

            let mut writer = endpoint.try_clone()?;
            spawn_peer_reader(endpoint, tx_evt.clone());

            let mut need_reconnect = false;
            loop {
                match rx_evt.recv() {
                    Ok(Event::FromPeer(msg)) => {
                        to_driver.send(msg).ok();
                    }
                    Ok(Event::PeerClosed) => {
                        warn!(self.logger, "orchestrator connection closed unexpectedly; reconnecting");
                        need_reconnect = true;
                        break;
                    }
                    Ok(Event::FromLocal(mut msg)) => {
                        if msg.msg_type == MsgType::Result {
                            msg = msg.with_attr("clientid", sid.to_string()).with_attr("clientname", self.clientname.clone());
                        }
                        if writer.send(&msg).is_err() {
                            warn!(self.logger, "write to orchestrator failed; reconnecting");
                            need_reconnect = true;
                            break;
                        }
                    }
                    Ok(Event::LocalClosed) | Err(_) => return Ok(()),
                }
            }
            if !need_reconnect {
                return Ok(());
            }
        }
    }
}
