use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "meascli", about = "Measurement-side peer: drives a radio on behalf of the orchestrator fabric")]
pub struct Config {
    /// Radio device arguments, forwarded verbatim to the hardware driver.
    #[arg(short = 'a', long = "args", default_value = "")]
    pub radio_args: String,

    /// Name this client registers under; defaults to the assigned sid if unset.
    #[arg(short = 'n', long = "name")]
    pub name: Option<String>,

    /// Orchestrator host to dial.
    #[arg(short = 's', long = "host", default_value = "127.0.0.1")]
    pub host: String,

    /// Orchestrator port to dial.
    #[arg(short, long, default_value_t = 5555)]
    pub port: u16,

    /// Stay attached to the controlling terminal instead of logging only to file.
    #[arg(short, long)]
    pub foreground: bool,

    /// Write logs here in addition to stderr.
    #[arg(short, long)]
    pub logfile: Option<String>,
}
