use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value};
use slog::{info, Logger};

use rpc::{RpcCall, SeqArgs, SeqMeasureArgs, SeqTransmitArgs, Tuning};
use wire::{random_id, Attrs, MsgType, PeerType, SessionMessage, ALL_CLIENTS};

use crate::error::DriverError;
use crate::psd;
use crate::store::SampleStore;
use crate::viewer::PsdViewer;

const CMD_PAUSE: &str = "pause";
const CMD_WAIT_RESULTS: &str = "wait_results";
const CMD_PLOT_PSD: &str = "plot_psd";
const CMD_PRINT_RESULTS: &str = "print_results";
const CMD_MEASURE_PATHS: &str = "measure_paths";

/// The orchestrator's single built-in function; intercepted there, so any
/// target in the CALL's `clients` field is irrelevant.
const FUNCNAME_GETCLIENTS: &str = "getclients";

/// Active pass's transmitter leads the receivers by this much so its first
/// step is already underway when the receivers' rendezvous point arrives.
const TX_TOFF: f64 = 0.5;

/// Poll quantum `wait_results` (and the internal collector it shares with
/// `measure_paths`) sleeps for between channel drains.
const POLLTIME: Duration = Duration::from_millis(100);

fn now_epoch() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs_f64()
}

fn field_f64(obj: &Map<String, Value>, key: &str) -> Result<f64, DriverError> {
    obj.get(key).and_then(Value::as_f64).ok_or_else(|| DriverError::MissingField(key.to_string()))
}

fn field_f64_or(obj: &Map<String, Value>, key: &str, default: f64) -> f64 {
    obj.get(key).and_then(Value::as_f64).unwrap_or(default)
}

/// Executes a parsed command script against the orchestrator fabric,
/// maintaining the `sync` start-time cache and the `last_results` table
/// `wait_results`/`plot_psd`/`print_results` read from.
pub struct Driver {
    to_connector: Sender<SessionMessage>,
    from_connector: Receiver<SessionMessage>,
    store: Box<dyn SampleStore>,
    viewer: Box<dyn PsdViewer>,
    logger: Logger,
    last_results: HashMap<String, SessionMessage>,
    cached_start_time: Option<f64>,
}

impl Driver {
    pub fn new(
        to_connector: Sender<SessionMessage>,
        from_connector: Receiver<SessionMessage>,
        store: impl SampleStore + 'static,
        viewer: impl PsdViewer + 'static,
        logger: Logger,
    ) -> Self {
        Driver {
            to_connector,
            from_connector,
            store: Box::new(store),
            viewer: Box::new(viewer),
            logger,
            last_results: HashMap::new(),
            cached_start_time: None,
        }
    }

    pub fn run_script(&mut self, commands: &[Value]) -> Result<(), DriverError> {
        for record in commands {
            self.dispatch_command(record)?;
        }
        Ok(())
    }

    fn dispatch_command(&mut self, record: &Value) -> Result<(), DriverError> {
        let mut obj = record.as_object().ok_or_else(|| DriverError::BadField("command record must be a JSON object".to_string()))?.clone();
        let cmd = obj.get("cmd").and_then(Value::as_str).ok_or_else(|| DriverError::MissingField("cmd".to_string()))?.to_string();
        self.resolve_sync(&mut obj);

        match cmd.as_str() {
            CMD_PAUSE => self.handle_pause(&obj),
            CMD_WAIT_RESULTS => self.handle_wait_results(&obj),
            CMD_PLOT_PSD => self.handle_plot_psd(&obj),
            CMD_PRINT_RESULTS => self.handle_print_results(&obj),
            CMD_MEASURE_PATHS => self.handle_measure_paths(&obj),
            other => self.handle_rpc_call(other, &obj),
        }
    }

    /// A `sync: true` command shares one computed `start_time` with every
    /// other `sync: true` command until a non-sync command clears it.
    fn resolve_sync(&mut self, obj: &mut Map<String, Value>) {
        let sync = obj.get("sync").and_then(Value::as_bool).unwrap_or(false);
        if sync {
            let toff = field_f64_or(obj, "toff", 0.0);
            let start_time = *self.cached_start_time.get_or_insert_with(|| now_epoch().ceil() + toff);
            obj.insert("start_time".to_string(), serde_json::json!(start_time));
        } else {
            self.cached_start_time = None;
        }
    }

    fn handle_pause(&mut self, obj: &Map<String, Value>) -> Result<(), DriverError> {
        let duration = field_f64(obj, "duration")?;
        thread::sleep(Duration::from_secs_f64(duration.max(0.0)));
        Ok(())
    }

    fn handle_wait_results(&mut self, obj: &Map<String, Value>) -> Result<(), DriverError> {
        let timeout = field_f64(obj, "timeout")?;
        let want = self.resolve_client_list(obj, "client_list");
        self.last_results = self.collect_results(&want, Duration::from_secs_f64(timeout));
        Ok(())
    }

    fn handle_plot_psd(&mut self, obj: &Map<String, Value>) -> Result<(), DriverError> {
        let targets = self.resolve_client_list(obj, "client_list");
        let target_set: HashSet<&str> = targets.iter().map(String::as_str).collect();
        for (name, result) in self.last_results.iter() {
            if result.samples.is_empty() || !target_set.contains(name.as_str()) {
                continue;
            }
            let rate: f64 = result.attr("rate").and_then(|s| s.parse().ok()).unwrap_or(1.0);
            let freqs = psd::freq_grid(rate, result.samples.len());
            let spectrum = psd::magnitude_squared(&result.samples);
            self.viewer.show(name, &freqs, &spectrum);
        }
        Ok(())
    }

    fn handle_print_results(&mut self, obj: &Map<String, Value>) -> Result<(), DriverError> {
        let targets = self.resolve_client_list(obj, "client_list");
        for name in &targets {
            match self.last_results.get(name) {
                Some(result) => {
                    info!(self.logger, "result"; "client" => name, "measurements" => format!("{:?}", result.measurements), "nsamples" => result.samples.len())
                }
                None => info!(self.logger, "no result retained for client"; "client" => name),
            }
        }
        Ok(())
    }

    fn handle_rpc_call(&mut self, funcname: &str, obj: &Map<String, Value>) -> Result<(), DriverError> {
        let value = Value::Object(obj.clone());
        let call = RpcCall::from_json(funcname, &value)?;
        let targets = self.resolve_client_list(obj, "clients");
        self.dispatch_call(targets, call.encode());
        Ok(())
    }

    /// The sequenced path-measurement protocol: baseline pass (no
    /// transmitter), then an active pass per selected transmitter with the
    /// designated transmitter emitting the stepped carrier.
    fn handle_measure_paths(&mut self, obj: &Map<String, Value>) -> Result<(), DriverError> {
        let txgain = field_f64(obj, "txgain")?;
        let rxgain = field_f64(obj, "rxgain")?;
        let freq = field_f64(obj, "freq")?;
        let rate = field_f64(obj, "rate")?;
        let freq_step = field_f64(obj, "freq_step")?;
        let time_step = field_f64_or(obj, "time_step", 1.0);
        let timeout = field_f64(obj, "timeout")?;
        let toff = field_f64_or(obj, "toff", 2.0);
        let get_samples = obj.get("get_samples").and_then(Value::as_bool).unwrap_or(false);
        let clients = self.resolve_client_list(obj, "client_list");

        let run_ts = now_epoch().floor() as u64;

        for (t_idx, transmitter) in clients.iter().enumerate() {
            let receivers: Vec<String> = clients.iter().enumerate().filter(|&(i, _)| i != t_idx).map(|(_, c)| c.clone()).collect();
            if receivers.is_empty() {
                continue;
            }

            let baseline_start = now_epoch().ceil();
            let baseline_args = SeqArgs {
                tuning: Tuning { freq, gain: rxgain, rate },
                freq_step,
                time_step,
                start_time: baseline_start,
                nsamps: 1000,
                wampl: 1.0,
            };
            self.dispatch_call(receivers.clone(), RpcCall::SeqMeasure(SeqMeasureArgs(baseline_args)).encode());
            let baseline_results = self.collect_results(&receivers, Duration::from_secs_f64(timeout));

            let active_start = now_epoch().ceil() + toff;
            let active_measure_args = SeqArgs {
                tuning: Tuning { freq, gain: rxgain, rate },
                freq_step,
                time_step,
                start_time: active_start,
                nsamps: 1000,
                wampl: 1.0,
            };
            let active_xmit_args = SeqArgs {
                tuning: Tuning { freq, gain: txgain, rate },
                freq_step,
                time_step,
                start_time: active_start - TX_TOFF,
                nsamps: 1000,
                wampl: 1.0,
            };
            self.dispatch_call(receivers.clone(), RpcCall::SeqMeasure(SeqMeasureArgs(active_measure_args)).encode());
            self.dispatch_call(vec![transmitter.clone()], RpcCall::SeqTransmit(SeqTransmitArgs(active_xmit_args)).encode());
            let mut wanted = receivers.clone();
            wanted.push(transmitter.clone());
            let active_results = self.collect_results(&wanted, Duration::from_secs_f64(timeout));

            for receiver in &receivers {
                let path = format!("measure_paths/{run_ts}/{transmitter}/{receiver}");
                self.store.create_group(&path);
                self.store.set_attrs(
                    &path,
                    &[
                        ("txgain".to_string(), txgain.to_string()),
                        ("rxgain".to_string(), rxgain.to_string()),
                        ("freq".to_string(), freq.to_string()),
                        ("rate".to_string(), rate.to_string()),
                    ],
                );
                if let Some(baseline) = baseline_results.get(receiver) {
                    self.store.write_dataset_f32(&format!("{path}/avgpower"), 0, &baseline.measurements);
                    if get_samples {
                        self.store.write_dataset_samples(&format!("{path}/samples"), 0, &baseline.samples);
                    }
                }
                if let Some(active) = active_results.get(receiver) {
                    self.store.write_dataset_f32(&format!("{path}/avgpower"), 1, &active.measurements);
                    if get_samples {
                        self.store.write_dataset_samples(&format!("{path}/samples"), 1, &active.samples);
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve_client_list(&mut self, obj: &Map<String, Value>, key: &str) -> Vec<String> {
        match obj.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
            Some(Value::String(s)) if s != ALL_CLIENTS => vec![s.clone()],
            _ => self.get_connected_clients(),
        }
    }

    fn get_connected_clients(&mut self) -> Vec<String> {
        self.dispatch_call(vec![ALL_CLIENTS.to_string()], Attrs::new().with("funcname", FUNCNAME_GETCLIENTS));
        match self.from_connector.recv_timeout(Duration::from_secs(5)) {
            Ok(msg) if msg.msg_type == MsgType::Result => msg.clients,
            _ => Vec::new(),
        }
    }

    fn dispatch_call(&mut self, targets: Vec<String>, attrs: Attrs) -> u32 {
        let mut msg = SessionMessage::new(MsgType::Call, PeerType::IfaceClient);
        msg.clients = targets;
        msg.uuid = random_id();
        msg.attributes = attrs;
        let uuid = msg.uuid;
        let _ = self.to_connector.send(msg);
        uuid
    }

    /// Collects RESULT messages whose `clientname` is in `want` until every
    /// one has reported or `timeout` elapses, polling in `POLLTIME`
    /// increments so a slow arrival doesn't block past the deadline.
    fn collect_results(&mut self, want: &[String], timeout: Duration) -> HashMap<String, SessionMessage> {
        let mut got = HashMap::new();
        let want_set: HashSet<&str> = want.iter().map(String::as_str).collect();
        let deadline = Instant::now() + timeout;
        while got.len() < want_set.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.from_connector.recv_timeout(remaining.min(POLLTIME)) {
                Ok(msg) if msg.msg_type == MsgType::Result => {
                    if let Some(name) = msg.attr("clientname") {
                        if want_set.contains(name) {
                            got.insert(name.to_string(), msg);
                        }
                    }
                }
                Ok(_) => {}
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        got
    }
}
