use serde_json::Value;
use wire::Attrs;

use crate::error::RpcArgError;

pub(crate) fn push_f64(attrs: &mut Attrs, key: &str, val: f64) {
    attrs.push(key, val.to_string());
}

pub(crate) fn push_u32(attrs: &mut Attrs, key: &str, val: u32) {
    attrs.push(key, val.to_string());
}

pub(crate) fn required_f64(attrs: &Attrs, key: &str) -> Result<f64, RpcArgError> {
    let raw = attrs.get(key).ok_or_else(|| RpcArgError::MissingField(key.to_string()))?;
    raw.parse::<f64>().map_err(|_| RpcArgError::InvalidValue { field: key.to_string(), value: raw.to_string() })
}

pub(crate) fn optional_f64(attrs: &Attrs, key: &str, default: f64) -> Result<f64, RpcArgError> {
    match attrs.get(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<f64>().map_err(|_| RpcArgError::InvalidValue { field: key.to_string(), value: raw.to_string() }),
    }
}

pub(crate) fn optional_u32(attrs: &Attrs, key: &str, default: u32) -> Result<u32, RpcArgError> {
    match attrs.get(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<u32>().map_err(|_| RpcArgError::InvalidValue { field: key.to_string(), value: raw.to_string() }),
    }
}

pub(crate) fn json_f64(obj: &Value, key: &str, default: f64) -> Result<f64, RpcArgError> {
    match obj.get(key) {
        None => Ok(default),
        Some(v) => v.as_f64().ok_or_else(|| RpcArgError::InvalidValue { field: key.to_string(), value: v.to_string() }),
    }
}

pub(crate) fn json_f64_required(obj: &Value, key: &str) -> Result<f64, RpcArgError> {
    let v = obj.get(key).ok_or_else(|| RpcArgError::MissingField(key.to_string()))?;
    v.as_f64().ok_or_else(|| RpcArgError::InvalidValue { field: key.to_string(), value: v.to_string() })
}

pub(crate) fn json_u32(obj: &Value, key: &str, default: u32) -> Result<u32, RpcArgError> {
    match obj.get(key) {
        None => Ok(default),
        Some(v) => v
            .as_u64()
            .map(|n| n as u32)
            .ok_or_else(|| RpcArgError::InvalidValue { field: key.to_string(), value: v.to_string() }),
    }
}

/// Collected radio-tuning parameters common to every call that touches the
/// `Radio` capability. `gain` is asymmetric on purpose: `measure_paths`
/// swaps in `txgain`/`rxgain` for the same underlying field depending on
/// which half of the pair it is building (see `interface::sequencer`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub freq: f64,
    pub gain: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TxSineArgs {
    pub tuning: Tuning,
    pub wfreq: f64,
    pub wampl: f64,
    pub duration: f64,
}

impl TxSineArgs {
    pub fn encode(&self) -> Attrs {
        let mut attrs = Attrs::new();
        push_f64(&mut attrs, "freq", self.tuning.freq);
        push_f64(&mut attrs, "gain", self.tuning.gain);
        push_f64(&mut attrs, "rate", self.tuning.rate);
        push_f64(&mut attrs, "wfreq", self.wfreq);
        push_f64(&mut attrs, "wampl", self.wampl);
        push_f64(&mut attrs, "duration", self.duration);
        attrs
    }

    pub fn decode(attrs: &Attrs) -> Result<Self, RpcArgError> {
        Ok(TxSineArgs {
            tuning: Tuning {
                freq: required_f64(attrs, "freq")?,
                gain: optional_f64(attrs, "gain", 0.0)?,
                rate: required_f64(attrs, "rate")?,
            },
            wfreq: required_f64(attrs, "wfreq")?,
            wampl: optional_f64(attrs, "wampl", 1.0)?,
            duration: optional_f64(attrs, "duration", 1.0)?,
        })
    }

    pub fn from_json(obj: &Value) -> Result<Self, RpcArgError> {
        Ok(TxSineArgs {
            tuning: Tuning {
                freq: json_f64_required(obj, "freq")?,
                gain: json_f64(obj, "txgain", json_f64(obj, "gain", 0.0)?)?,
                rate: json_f64_required(obj, "rate")?,
            },
            wfreq: json_f64(obj, "wfreq", 0.0)?,
            wampl: json_f64(obj, "wampl", 1.0)?,
            duration: json_f64(obj, "duration", 1.0)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RxSamplesArgs {
    pub tuning: Tuning,
    pub nsamps: u32,
}

impl RxSamplesArgs {
    pub fn encode(&self) -> Attrs {
        let mut attrs = Attrs::new();
        push_f64(&mut attrs, "freq", self.tuning.freq);
        push_f64(&mut attrs, "gain", self.tuning.gain);
        push_f64(&mut attrs, "rate", self.tuning.rate);
        push_u32(&mut attrs, "nsamps", self.nsamps);
        attrs
    }

    pub fn decode(attrs: &Attrs) -> Result<Self, RpcArgError> {
        Ok(RxSamplesArgs {
            tuning: Tuning {
                freq: required_f64(attrs, "freq")?,
                gain: optional_f64(attrs, "gain", 0.0)?,
                rate: required_f64(attrs, "rate")?,
            },
            nsamps: optional_u32(attrs, "nsamps", 1000)?,
        })
    }

    pub fn from_json(obj: &Value) -> Result<Self, RpcArgError> {
        Ok(RxSamplesArgs {
            tuning: Tuning {
                freq: json_f64_required(obj, "freq")?,
                gain: json_f64(obj, "rxgain", json_f64(obj, "gain", 0.0)?)?,
                rate: json_f64_required(obj, "rate")?,
            },
            nsamps: json_u32(obj, "nsamps", 1000)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurePowerArgs {
    pub tuning: Tuning,
    pub nsamps: u32,
    pub wfreq: f64,
}

impl MeasurePowerArgs {
    pub fn encode(&self) -> Attrs {
        let mut attrs = Attrs::new();
        push_f64(&mut attrs, "freq", self.tuning.freq);
        push_f64(&mut attrs, "gain", self.tuning.gain);
        push_f64(&mut attrs, "rate", self.tuning.rate);
        push_u32(&mut attrs, "nsamps", self.nsamps);
        push_f64(&mut attrs, "wfreq", self.wfreq);
        attrs
    }

    pub fn decode(attrs: &Attrs) -> Result<Self, RpcArgError> {
        Ok(MeasurePowerArgs {
            tuning: Tuning {
                freq: required_f64(attrs, "freq")?,
                gain: optional_f64(attrs, "gain", 0.0)?,
                rate: required_f64(attrs, "rate")?,
            },
            nsamps: optional_u32(attrs, "nsamps", 1000)?,
            wfreq: optional_f64(attrs, "wfreq", 0.0)?,
        })
    }

    pub fn from_json(obj: &Value) -> Result<Self, RpcArgError> {
        Ok(MeasurePowerArgs {
            tuning: Tuning {
                freq: json_f64_required(obj, "freq")?,
                gain: json_f64(obj, "gain", 0.0)?,
                rate: json_f64_required(obj, "rate")?,
            },
            nsamps: json_u32(obj, "nsamps", 1000)?,
            wfreq: json_f64(obj, "wfreq", 0.0)?,
        })
    }
}

/// Shared argument set for the `seq_*` family: each is driven by the same
/// rendezvous loop (see `measurement::sequence::run_steps`), differing only
/// in which primitive the loop calls on each step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeqArgs {
    pub tuning: Tuning,
    pub freq_step: f64,
    pub time_step: f64,
    pub start_time: f64,
    pub nsamps: u32,
    pub wampl: f64,
}

impl SeqArgs {
    fn encode_into(&self, attrs: &mut Attrs) {
        push_f64(attrs, "freq", self.tuning.freq);
        push_f64(attrs, "gain", self.tuning.gain);
        push_f64(attrs, "rate", self.tuning.rate);
        push_f64(attrs, "freq_step", self.freq_step);
        push_f64(attrs, "time_step", self.time_step);
        push_f64(attrs, "start_time", self.start_time);
        push_u32(attrs, "nsamps", self.nsamps);
        push_f64(attrs, "wampl", self.wampl);
    }

    fn decode_from(attrs: &Attrs) -> Result<Self, RpcArgError> {
        Ok(SeqArgs {
            tuning: Tuning {
                freq: required_f64(attrs, "freq")?,
                gain: optional_f64(attrs, "gain", 0.0)?,
                rate: required_f64(attrs, "rate")?,
            },
            freq_step: required_f64(attrs, "freq_step")?,
            time_step: optional_f64(attrs, "time_step", 1.0)?,
            start_time: optional_f64(attrs, "start_time", 0.0)?,
            nsamps: optional_u32(attrs, "nsamps", 1000)?,
            wampl: optional_f64(attrs, "wampl", 1.0)?,
        })
    }

    fn from_json_with_gain(obj: &Value, gain_key: &str) -> Result<Self, RpcArgError> {
        Ok(SeqArgs {
            tuning: Tuning {
                freq: json_f64_required(obj, "freq")?,
                gain: json_f64(obj, gain_key, json_f64(obj, "gain", 0.0)?)?,
                rate: json_f64_required(obj, "rate")?,
            },
            freq_step: json_f64(obj, "freq_step", 1e4)?,
            time_step: json_f64(obj, "time_step", 1.0)?,
            start_time: json_f64(obj, "start_time", 0.0)?,
            nsamps: json_u32(obj, "nsamps", 1000)?,
            wampl: json_f64(obj, "wampl", 1.0)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeqMeasureArgs(pub SeqArgs);

impl SeqMeasureArgs {
    pub fn encode(&self) -> Attrs {
        let mut attrs = Attrs::new();
        self.0.encode_into(&mut attrs);
        attrs
    }

    pub fn decode(attrs: &Attrs) -> Result<Self, RpcArgError> {
        Ok(SeqMeasureArgs(SeqArgs::decode_from(attrs)?))
    }

    pub fn from_json(obj: &Value) -> Result<Self, RpcArgError> {
        Ok(SeqMeasureArgs(SeqArgs::from_json_with_gain(obj, "rxgain")?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeqTransmitArgs(pub SeqArgs);

impl SeqTransmitArgs {
    pub fn encode(&self) -> Attrs {
        let mut attrs = Attrs::new();
        self.0.encode_into(&mut attrs);
        attrs
    }

    pub fn decode(attrs: &Attrs) -> Result<Self, RpcArgError> {
        Ok(SeqTransmitArgs(SeqArgs::decode_from(attrs)?))
    }

    pub fn from_json(obj: &Value) -> Result<Self, RpcArgError> {
        Ok(SeqTransmitArgs(SeqArgs::from_json_with_gain(obj, "txgain")?))
    }
}

/// Not present in the retrieved source under any name: the sequenced
/// counterpart of `rxsamples` (collect raw samples per step instead of an
/// averaged power reading), added to fill the registry slot spec calls for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeqRxSamplesArgs(pub SeqArgs);

impl SeqRxSamplesArgs {
    pub fn encode(&self) -> Attrs {
        let mut attrs = Attrs::new();
        self.0.encode_into(&mut attrs);
        attrs
    }

    pub fn decode(attrs: &Attrs) -> Result<Self, RpcArgError> {
        Ok(SeqRxSamplesArgs(SeqArgs::decode_from(attrs)?))
    }

    pub fn from_json(obj: &Value) -> Result<Self, RpcArgError> {
        Ok(SeqRxSamplesArgs(SeqArgs::from_json_with_gain(obj, "rxgain")?))
    }
}
