use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use slog::{debug, warn, Logger};
use wire::{MsgType, PeerType, SessionMessage};

use rpc::{RpcCall, SeqArgs, SeqMeasureArgs, SeqRxSamplesArgs, SeqTransmitArgs};

use crate::dsp;
use crate::radio::Radio;

const FUNCNAME_ECHO: &str = "echo";

/// Frequency offset of the bandpass window each measuring step filters
/// around, matching the fixed offset used by the power-measurement primitive.
const FREQ_OFFSET: f64 = 1e4;

/// Minimum length of a transmit buffer before it's looped onto the air, so
/// short-period tones still get a reasonably long burst per send.
const XMIT_SAMPS_MIN: f64 = 100_000.0;

/// Step end time is backed off by this margin so a step's transmit loop
/// yields before the next step's rendezvous point rather than racing it.
const STEP_END_MARGIN: f64 = 0.1;

fn now_epoch() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs_f64()
}

fn xmit_buffer_len(rate: f64, wfreq: f64) -> usize {
    if wfreq == 0.0 {
        return XMIT_SAMPS_MIN as usize;
    }
    let base = (rate / wfreq).floor().max(1.0);
    let reps = (XMIT_SAMPS_MIN / base).ceil().max(1.0);
    (base * reps) as usize
}

/// Drives a `Radio` on behalf of the orchestrator fabric: reads CALL
/// messages handed up by the connector, executes the named RPC, and hands
/// back a RESULT. Runs entirely in the calling thread; callers typically
/// dedicate one thread to this loop and another to the connector.
pub struct Client<R: Radio> {
    radio: R,
    logger: Logger,
}

impl<R: Radio> Client<R> {
    pub fn new(radio: R, logger: Logger) -> Self {
        Client { radio, logger }
    }

    /// Consumes CALL messages from `from_connector` until it hangs up,
    /// sending one RESULT per CALL to `to_connector`.
    pub fn run(&mut self, to_connector: Sender<SessionMessage>, from_connector: Receiver<SessionMessage>) {
        for msg in from_connector.iter() {
            if msg.msg_type != MsgType::Call {
                continue;
            }
            let Some(result) = self.dispatch(&msg) else { continue };
            if to_connector.send(result).is_err() {
                break;
            }
        }
    }

    fn dispatch(&mut self, msg: &SessionMessage) -> Option<SessionMessage> {
        let funcname = msg.attr("funcname")?.to_string();

        if funcname == FUNCNAME_ECHO {
            let mut result = SessionMessage::new(MsgType::Result, PeerType::MeasClient).with_attr("funcname", &funcname);
            result.uuid = msg.uuid;
            return Some(result);
        }

        let call = match RpcCall::decode(&funcname, &msg.attributes) {
            Ok(call) => call,
            Err(err) => {
                warn!(self.logger, "rejecting malformed call"; "funcname" => &funcname, "error" => %err);
                return None;
            }
        };

        let mut result = SessionMessage::new(MsgType::Result, PeerType::MeasClient).with_attr("funcname", &funcname);
        result.uuid = msg.uuid;

        match call {
            RpcCall::TxSine(args) => self.do_txsine(args, &mut result),
            RpcCall::RxSamples(args) => self.do_rxsamples(args, &mut result),
            RpcCall::MeasurePower(args) => self.do_measure_power(args, &mut result),
            RpcCall::SeqMeasure(SeqMeasureArgs(args)) => self.do_seq(args, &mut result, Self::measure_power_step),
            RpcCall::SeqTransmit(SeqTransmitArgs(args)) => self.do_seq(args, &mut result, Self::xmit_only_step),
            RpcCall::SeqRxSamples(SeqRxSamplesArgs(args)) => {
                result.attributes.push("rate", args.tuning.rate.to_string());
                self.do_seq(args, &mut result, Self::rxsamples_step)
            }
        }

        Some(result)
    }

    fn do_txsine(&mut self, args: rpc::TxSineArgs, _result: &mut SessionMessage) {
        if let Err(err) = self.radio.tune(args.tuning.freq, args.tuning.gain, args.tuning.rate) {
            warn!(self.logger, "tune failed"; "error" => %err);
            return;
        }
        let end_time = now_epoch() + args.duration;
        self.xmit_step(args.tuning.rate, args.wampl, args.wfreq, end_time);
    }

    fn do_rxsamples(&mut self, args: rpc::RxSamplesArgs, result: &mut SessionMessage) {
        if let Err(err) = self.radio.tune(args.tuning.freq, args.tuning.gain, args.tuning.rate) {
            warn!(self.logger, "tune failed"; "error" => %err);
            return;
        }
        result.attributes.push("rate", args.tuning.rate.to_string());
        match self.radio.recv_samples(args.nsamps) {
            Ok(samples) => result.samples = samples,
            Err(err) => warn!(self.logger, "recv_samples failed"; "error" => %err),
        }
    }

    fn do_measure_power(&mut self, args: rpc::MeasurePowerArgs, result: &mut SessionMessage) {
        if let Err(err) = self.radio.tune(args.tuning.freq, args.tuning.gain, args.tuning.rate) {
            warn!(self.logger, "tune failed"; "error" => %err);
            return;
        }
        match self.radio.recv_samples(args.nsamps) {
            Ok(samples) => {
                let filtered = dsp::bandpass_filter(&samples, args.wfreq - FREQ_OFFSET, args.wfreq + FREQ_OFFSET, args.tuning.rate);
                result.measurements.push(dsp::average_power_db(&filtered));
            }
            Err(err) => warn!(self.logger, "recv_samples failed"; "error" => %err),
        }
    }

    /// Rendezvous loop shared by every `seq_*` call: tunes once, then steps
    /// through `floor(rate/freq_step/2) - 1` frequency offsets, sleeping
    /// until each step's scheduled wall-clock time before invoking `step`.
    fn do_seq(&mut self, mut args: SeqArgs, result: &mut SessionMessage, mut step: impl FnMut(&mut Self, SeqArgs, f64, f64, &mut SessionMessage)) {
        if let Err(err) = self.radio.tune(args.tuning.freq, args.tuning.gain, args.tuning.rate) {
            warn!(self.logger, "tune failed"; "error" => %err);
            return;
        }
        if args.start_time == 0.0 {
            args.start_time = now_epoch().ceil();
        }
        let steps = (args.tuning.rate / args.freq_step / 2.0).floor() as i64;
        for i in 1..steps.max(1) {
            let wfreq = i as f64 * args.freq_step;
            let rendezvous = args.start_time + i as f64 * args.time_step;
            let end_time = args.start_time + (i as f64 + 1.0) * args.time_step - STEP_END_MARGIN;
            let sleep_for = rendezvous - now_epoch();
            if sleep_for > 0.0 {
                thread::sleep(Duration::from_secs_f64(sleep_for));
            }
            step(self, args, wfreq, end_time, result);
        }
        debug!(self.logger, "sequence complete"; "steps" => steps.max(1) - 1);
    }

    fn measure_power_step(&mut self, args: SeqArgs, wfreq: f64, _end_time: f64, result: &mut SessionMessage) {
        match self.radio.recv_samples(args.nsamps) {
            Ok(samples) => {
                let filtered = dsp::bandpass_filter(&samples, wfreq - FREQ_OFFSET, wfreq + FREQ_OFFSET, args.tuning.rate);
                result.measurements.push(dsp::average_power_db(&filtered));
            }
            Err(err) => warn!(self.logger, "recv_samples failed mid-sequence"; "error" => %err),
        }
    }

    fn rxsamples_step(&mut self, args: SeqArgs, _wfreq: f64, _end_time: f64, result: &mut SessionMessage) {
        match self.radio.recv_samples(args.nsamps) {
            Ok(samples) => result.samples.extend(samples),
            Err(err) => warn!(self.logger, "recv_samples failed mid-sequence"; "error" => %err),
        }
    }

    fn xmit_only_step(&mut self, args: SeqArgs, wfreq: f64, end_time: f64, _result: &mut SessionMessage) {
        self.xmit_step(args.tuning.rate, args.wampl, wfreq, end_time);
    }

    fn xmit_step(&mut self, rate: f64, wampl: f64, wfreq: f64, end_time: f64) {
        let buf = dsp::make_sine(xmit_buffer_len(rate, wfreq), wampl as f32, wfreq, rate);
        while now_epoch() < end_time {
            if let Err(err) = self.radio.send_samples(&buf) {
                warn!(self.logger, "send_samples failed"; "error" => %err);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::FakeRadio;
    use rpc::{RxSamplesArgs, Tuning};
    use std::sync::mpsc;
    use wire::Attrs;

    fn test_logger() -> Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    fn call_with(funcname: &str, attrs: Attrs) -> SessionMessage {
        let mut msg = SessionMessage::new(MsgType::Call, PeerType::IfaceClient);
        msg.attributes = attrs.with("funcname", funcname);
        msg.uuid = 42;
        msg
    }

    #[test]
    fn echo_replies_with_same_uuid() {
        let mut client = Client::new(FakeRadio::new(), test_logger());
        let msg = call_with(FUNCNAME_ECHO, Attrs::new());
        let result = client.dispatch(&msg).unwrap();
        assert_eq!(result.uuid, 42);
        assert_eq!(result.msg_type, MsgType::Result);
    }

    #[test]
    fn rxsamples_fills_in_requested_sample_count() {
        let mut client = Client::new(FakeRadio::new(), test_logger());
        let args = RxSamplesArgs { tuning: Tuning { freq: 915e6, gain: 0.0, rate: 2e6 }, nsamps: 64 };
        let msg = call_with("rxsamples", args.encode());
        let result = client.dispatch(&msg).unwrap();
        assert_eq!(result.samples.len(), 64);
    }

    #[test]
    fn malformed_call_is_dropped_without_panicking() {
        let mut client = Client::new(FakeRadio::new(), test_logger());
        let msg = call_with("rxsamples", Attrs::new());
        assert!(client.dispatch(&msg).is_none());
    }

    #[test]
    fn seq_measure_collects_one_measurement_per_step() {
        let mut client = Client::new(FakeRadio::new(), test_logger());
        let args = SeqArgs {
            tuning: Tuning { freq: 915e6, gain: 0.0, rate: 2e4 },
            freq_step: 5e3,
            time_step: 0.0,
            start_time: now_epoch(),
            nsamps: 16,
            wampl: 1.0,
        };
        let msg = call_with("seq_measure", rpc::SeqMeasureArgs(args).encode());
        let result = client.dispatch(&msg).unwrap();
        // steps = floor(rate/freq_step/2) = floor(2e4/5e3/2) = 2, loop runs i in 1..2 => 1 measurement.
        assert_eq!(result.measurements.len(), 1);
    }

    #[test]
    fn run_loop_stops_when_output_channel_is_dropped() {
        let (to_tx, _to_rx) = mpsc::channel();
        let (from_tx, from_rx) = mpsc::channel();
        drop(to_tx.clone());
        from_tx.send(call_with(FUNCNAME_ECHO, Attrs::new())).unwrap();
        drop(from_tx);
        let mut client = Client::new(FakeRadio::new(), test_logger());
        client.run(to_tx, from_rx);
    }
}
