use serde_json::Value;
use wire::Attrs;

use crate::args::{MeasurePowerArgs, RxSamplesArgs, SeqMeasureArgs, SeqRxSamplesArgs, SeqTransmitArgs, TxSineArgs};
use crate::error::RpcArgError;

/// One entry per function a measurement client will dispatch. Mirrors the
/// `RPCCALLS` table's role: a single place that knows how to turn a
/// funcname plus a bag of arguments into an encoded call, and back.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcCall {
    TxSine(TxSineArgs),
    RxSamples(RxSamplesArgs),
    MeasurePower(MeasurePowerArgs),
    SeqMeasure(SeqMeasureArgs),
    SeqTransmit(SeqTransmitArgs),
    SeqRxSamples(SeqRxSamplesArgs),
}

pub const FUNCNAME_TXSINE: &str = "txsine";
pub const FUNCNAME_RXSAMPLES: &str = "rxsamples";
pub const FUNCNAME_MEASURE_POWER: &str = "measure_power";
pub const FUNCNAME_SEQ_MEASURE: &str = "seq_measure";
pub const FUNCNAME_SEQ_TRANSMIT: &str = "seq_transmit";
pub const FUNCNAME_SEQ_RXSAMPLES: &str = "seq_rxsamples";

impl RpcCall {
    pub fn funcname(&self) -> &'static str {
        match self {
            RpcCall::TxSine(_) => FUNCNAME_TXSINE,
            RpcCall::RxSamples(_) => FUNCNAME_RXSAMPLES,
            RpcCall::MeasurePower(_) => FUNCNAME_MEASURE_POWER,
            RpcCall::SeqMeasure(_) => FUNCNAME_SEQ_MEASURE,
            RpcCall::SeqTransmit(_) => FUNCNAME_SEQ_TRANSMIT,
            RpcCall::SeqRxSamples(_) => FUNCNAME_SEQ_RXSAMPLES,
        }
    }

    /// Every `seq_*` entry is driven through the rendezvous step loop
    /// rather than invoked directly.
    pub fn is_sequenced(&self) -> bool {
        self.funcname().starts_with("seq_")
    }

    pub fn encode(&self) -> Attrs {
        let mut attrs = match self {
            RpcCall::TxSine(a) => a.encode(),
            RpcCall::RxSamples(a) => a.encode(),
            RpcCall::MeasurePower(a) => a.encode(),
            RpcCall::SeqMeasure(a) => a.encode(),
            RpcCall::SeqTransmit(a) => a.encode(),
            RpcCall::SeqRxSamples(a) => a.encode(),
        };
        attrs.push("funcname", self.funcname());
        attrs
    }

    pub fn decode(funcname: &str, attrs: &Attrs) -> Result<RpcCall, RpcArgError> {
        match funcname {
            FUNCNAME_TXSINE => Ok(RpcCall::TxSine(TxSineArgs::decode(attrs)?)),
            FUNCNAME_RXSAMPLES => Ok(RpcCall::RxSamples(RxSamplesArgs::decode(attrs)?)),
            FUNCNAME_MEASURE_POWER => Ok(RpcCall::MeasurePower(MeasurePowerArgs::decode(attrs)?)),
            FUNCNAME_SEQ_MEASURE => Ok(RpcCall::SeqMeasure(SeqMeasureArgs::decode(attrs)?)),
            FUNCNAME_SEQ_TRANSMIT => Ok(RpcCall::SeqTransmit(SeqTransmitArgs::decode(attrs)?)),
            FUNCNAME_SEQ_RXSAMPLES => Ok(RpcCall::SeqRxSamples(SeqRxSamplesArgs::decode(attrs)?)),
            other => Err(RpcArgError::UnknownFunction(other.to_string())),
        }
    }

    /// Build a call from a parsed command-file JSON object, the path the
    /// interface driver's sequencer uses (`cmd['cmd']` selects the
    /// funcname, the rest of the object supplies its arguments).
    pub fn from_json(funcname: &str, obj: &Value) -> Result<RpcCall, RpcArgError> {
        match funcname {
            FUNCNAME_TXSINE => Ok(RpcCall::TxSine(TxSineArgs::from_json(obj)?)),
            FUNCNAME_RXSAMPLES => Ok(RpcCall::RxSamples(RxSamplesArgs::from_json(obj)?)),
            FUNCNAME_MEASURE_POWER => Ok(RpcCall::MeasurePower(MeasurePowerArgs::from_json(obj)?)),
            FUNCNAME_SEQ_MEASURE => Ok(RpcCall::SeqMeasure(SeqMeasureArgs::from_json(obj)?)),
            FUNCNAME_SEQ_TRANSMIT => Ok(RpcCall::SeqTransmit(SeqTransmitArgs::from_json(obj)?)),
            FUNCNAME_SEQ_RXSAMPLES => Ok(RpcCall::SeqRxSamples(SeqRxSamplesArgs::from_json(obj)?)),
            other => Err(RpcArgError::UnknownFunction(other.to_string())),
        }
    }
}
