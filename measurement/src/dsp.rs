use wire::Sample;

/// Restricts a sample block to the band around `wfreq`. The hardware path
/// this stands in for does this with an actual filter bank; a synthetic
/// `Radio` has nothing to filter out, so this is an identity pass-through
/// that keeps the call site shape intact for a real implementation to fill.
pub fn bandpass_filter(samples: &[Sample], _flo: f64, _fhi: f64, _rate: f64) -> Vec<Sample> {
    samples.to_vec()
}

/// Mean sample magnitude converted to dB (20*log10, the amplitude-to-dB
/// convention) rather than a true power spectral density estimate.
pub fn average_power_db(samples: &[Sample]) -> f32 {
    if samples.is_empty() {
        return f32::NEG_INFINITY;
    }
    let mean_mag: f32 = samples.iter().map(|s| (s.r * s.r + s.j * s.j).sqrt()).sum::<f32>() / samples.len() as f32;
    20.0 * mean_mag.max(f32::MIN_POSITIVE).log10()
}

/// Synthesizes `nsamps` of a complex sinusoid at `wfreq` against a radio
/// tuned at `rate` samples/sec, the buffer a transmit step repeats onto
/// the air.
pub fn make_sine(nsamps: usize, wampl: f32, wfreq: f64, rate: f64) -> Vec<Sample> {
    (0..nsamps)
        .map(|n| {
            let phase = 2.0 * std::f64::consts::PI * wfreq * (n as f64) / rate;
            Sample { r: wampl * phase.cos() as f32, j: wampl * phase.sin() as f32 }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_power_of_silence_is_negative_infinity() {
        let samples = vec![Sample { r: 0.0, j: 0.0 }; 16];
        assert_eq!(average_power_db(&samples), f32::NEG_INFINITY);
    }

    #[test]
    fn average_power_of_unit_amplitude_is_zero_db() {
        let samples = vec![Sample { r: 1.0, j: 0.0 }; 16];
        assert!((average_power_db(&samples) - 0.0).abs() < 1e-3);
    }

    #[test]
    fn make_sine_produces_requested_length() {
        let buf = make_sine(256, 1.0, 1e4, 1e6);
        assert_eq!(buf.len(), 256);
    }
}
