use std::process::Command;

use slog::{warn, Logger};

/// The out-of-band plotting process `plot_psd` hands frequency/PSD data to.
/// Real plotting stays external, as spec'd; this is the boundary the driver
/// calls through.
pub trait PsdViewer: Send {
    fn show(&mut self, client_name: &str, freqs: &[f32], psd: &[f32]);
}

/// No-op viewer for tests and headless runs.
#[derive(Default)]
pub struct NoopViewer {
    pub calls: Vec<String>,
}

impl NoopViewer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PsdViewer for NoopViewer {
    fn show(&mut self, client_name: &str, _freqs: &[f32], _psd: &[f32]) {
        self.calls.push(client_name.to_string());
    }
}

/// Shells out to an operator-configured plotting command, one process per
/// call, mirroring `plot_stuff`'s out-of-band viewer launch.
pub struct ProcessViewer {
    command: String,
    logger: Logger,
}

impl ProcessViewer {
    pub fn new(command: impl Into<String>, logger: Logger) -> Self {
        ProcessViewer { command: command.into(), logger }
    }
}

impl PsdViewer for ProcessViewer {
    fn show(&mut self, client_name: &str, freqs: &[f32], psd: &[f32]) {
        let payload = serde_json::json!({ "client": client_name, "freqs": freqs, "psd": psd }).to_string();
        match Command::new(&self.command).arg(client_name).arg(payload).spawn() {
            Ok(_) => {}
            Err(err) => warn!(self.logger, "failed to launch viewer process"; "command" => &self.command, "error" => %err),
        }
    }
}
