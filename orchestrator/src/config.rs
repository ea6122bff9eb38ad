use clap::Parser;

pub const DEFAULT_PORT: u16 = 5555;

#[derive(Debug, Parser)]
#[command(name = "orchestrator", about = "Routes session messages between measurement and interface peers")]
pub struct Config {
    /// Address to listen on.
    #[arg(short, long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// CIDR block permitted to connect; repeat to allow multiple ranges.
    /// Defaults to loopback only.
    #[arg(long = "allow", value_name = "CIDR")]
    pub allow: Vec<String>,

    /// Write logs here in addition to stderr.
    #[arg(short, long)]
    pub logfile: Option<String>,
}
