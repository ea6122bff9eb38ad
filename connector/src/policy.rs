use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub max_tries: u32,
    pub sleep: Duration,
}

impl ReconnectPolicy {
    /// ~15 minutes of retrying at 5s intervals: a measurement client
    /// tolerates the orchestrator being briefly unreachable (restart,
    /// network blip) without the whole experiment run aborting.
    pub const MEASUREMENT: ReconnectPolicy = ReconnectPolicy { max_tries: 12 * 15, sleep: Duration::from_secs(5) };

    /// Fail fast: an interface driver invocation is a one-shot command-file
    /// run, not a long-lived daemon, so retrying a dead orchestrator just
    /// delays reporting the failure.
    pub const INTERFACE: ReconnectPolicy = ReconnectPolicy { max_tries: 1, sleep: Duration::from_secs(0) };
}
