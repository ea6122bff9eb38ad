use wire::Sample;

#[derive(Debug, thiserror::Error)]
pub enum RadioError {
    #[error("radio hardware error: {0}")]
    Hardware(String),
}

/// Capability this client drives to produce a measurement. The real
/// implementation talks to a software-defined radio; kept behind a trait so
/// the dispatch and sequencing logic can be exercised without one.
pub trait Radio: Send {
    fn tune(&mut self, freq: f64, gain: f64, rate: f64) -> Result<(), RadioError>;
    fn recv_samples(&mut self, nsamps: u32) -> Result<Vec<Sample>, RadioError>;
    fn send_samples(&mut self, samples: &[Sample]) -> Result<(), RadioError>;
}

/// Deterministic stand-in for the hardware radio. No crate in this stack
/// binds to a real SDR, so this is what `meascli` actually runs against;
/// it exists to let the fabric (orchestrator, connector, sequencing) be
/// exercised end to end without hardware.
pub struct FakeRadio {
    pub last_tune: Option<(f64, f64, f64)>,
    pub sent: Vec<Vec<Sample>>,
}

impl FakeRadio {
    pub fn new() -> Self {
        FakeRadio { last_tune: None, sent: Vec::new() }
    }
}

impl Default for FakeRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl Radio for FakeRadio {
    fn tune(&mut self, freq: f64, gain: f64, rate: f64) -> Result<(), RadioError> {
        self.last_tune = Some((freq, gain, rate));
        Ok(())
    }

    fn recv_samples(&mut self, nsamps: u32) -> Result<Vec<Sample>, RadioError> {
        Ok((0..nsamps)
            .map(|i| {
                let phase = i as f32 * 0.1;
                Sample { r: phase.cos(), j: phase.sin() }
            })
            .collect())
    }

    fn send_samples(&mut self, samples: &[Sample]) -> Result<(), RadioError> {
        self.sent.push(samples.to_vec());
        Ok(())
    }
}
