pub mod args;
pub mod error;
pub mod registry;

pub use args::{
    MeasurePowerArgs, RxSamplesArgs, SeqArgs, SeqMeasureArgs, SeqRxSamplesArgs, SeqTransmitArgs, Tuning, TxSineArgs,
};
pub use error::RpcArgError;
pub use registry::{
    RpcCall, FUNCNAME_MEASURE_POWER, FUNCNAME_RXSAMPLES, FUNCNAME_SEQ_MEASURE, FUNCNAME_SEQ_RXSAMPLES,
    FUNCNAME_SEQ_TRANSMIT, FUNCNAME_TXSINE,
};
