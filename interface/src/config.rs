use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "measiface", about = "Interface driver: runs a command script against the orchestrator fabric")]
pub struct Config {
    /// JSON command-file to execute.
    #[arg(short = 'c', long = "cmdfile")]
    pub cmdfile: String,

    /// Name this driver registers under at INIT; defaults to a generated name if unset.
    #[arg(short = 'n', long = "name")]
    pub name: Option<String>,

    /// Directory the persistent store's output would be written under.
    /// Currently informational: no on-disk store is wired in by default.
    #[arg(short = 'o', long = "datadir", default_value = ".")]
    pub datadir: String,

    /// Base filename for the run's dataset file.
    #[arg(short = 'd', long = "dfname", default_value = "measure_paths")]
    pub dfname: String,

    /// Command to shell out to for `plot_psd`; if unset, plotting is a no-op.
    #[arg(long = "viewer-cmd")]
    pub viewer_cmd: Option<String>,

    /// Orchestrator host to dial.
    #[arg(short = 's', long = "host", default_value = "127.0.0.1")]
    pub host: String,

    /// Orchestrator port to dial.
    #[arg(short, long, default_value_t = 5555)]
    pub port: u16,

    /// Write logs here in addition to stderr.
    #[arg(short, long)]
    pub logfile: Option<String>,
}
