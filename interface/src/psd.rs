use wire::Sample;

/// Frequency grid `plot_psd` hands a viewer, centered on baseband: `n`
/// equally spaced bins spanning `-rate/2 .. rate/2`.
pub fn freq_grid(rate: f64, n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| (-rate / 2.0 + rate * i as f64 / n as f64) as f32)
        .collect()
}

/// Magnitude-squared per sample. Signal processing is out of scope here, so
/// this is a placeholder spectrum a real viewer would replace with an FFT;
/// it gives the viewer trait something concrete to plot in tests.
pub fn magnitude_squared(samples: &[Sample]) -> Vec<f32> {
    samples.iter().map(|s| s.r * s.r + s.j * s.j).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freq_grid_is_centered_on_zero() {
        let grid = freq_grid(1e6, 4);
        assert_eq!(grid.len(), 4);
        assert_eq!(grid[0], -500_000.0);
    }

    #[test]
    fn magnitude_squared_of_unit_sample_is_one() {
        let samples = vec![Sample { r: 1.0, j: 0.0 }];
        assert_eq!(magnitude_squared(&samples), vec![1.0]);
    }
}
