use std::fs;
use std::sync::mpsc;
use std::thread;

use clap::Parser;
use slog::{info, o, warn, Drain};
use sloggers::file::FileLoggerBuilder;
use sloggers::types::Severity;
use sloggers::Build;

use connector::InterfaceConnector;
use interface::{Config, Driver, MemoryStore, NoopViewer, ProcessViewer};
use wire::random_id;

fn build_logger(logfile: Option<&str>) -> slog::Logger {
    let stderr_drain = sloggers::terminal::TerminalLoggerBuilder::new().level(Severity::Debug).build().expect("terminal logger");
    let root = match logfile {
        Some(path) => {
            let file_drain = FileLoggerBuilder::new(path).level(Severity::Debug).build().expect("file logger");
            slog::Async::new(slog::Duplicate::new(stderr_drain, file_drain).fuse()).build().fuse()
        }
        None => slog::Async::new(stderr_drain).build().fuse(),
    };
    slog::Logger::root(root, o!("component" => "measiface"))
}

fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let logger = build_logger(config.logfile.as_deref());

    let raw = fs::read_to_string(&config.cmdfile)?;
    let commands: Vec<serde_json::Value> = serde_json::from_str(&raw)?;

    warn!(logger, "no persistent store crate wired in; datasets are kept in memory only"; "datadir" => &config.datadir, "dfname" => &config.dfname);

    let (to_connector_tx, from_driver_rx) = mpsc::channel();
    let (to_driver_tx, from_connector_rx) = mpsc::channel();

    let connector_logger = logger.new(o!());
    let host = config.host.clone();
    let port = config.port;
    let name = config.name.clone().unwrap_or_else(|| format!("iface-{:x}", random_id()));
    let connector_handle = thread::spawn(move || {
        let mut connector = InterfaceConnector::new(host, port, name, connector_logger);
        connector.run(to_driver_tx, from_driver_rx)
    });

    let driver_logger = logger.new(o!("role" => "driver"));
    let mut driver = match config.viewer_cmd {
        Some(cmd) => Driver::new(to_connector_tx, from_connector_rx, MemoryStore::new(), ProcessViewer::new(cmd, driver_logger.clone()), driver_logger),
        None => Driver::new(to_connector_tx, from_connector_rx, MemoryStore::new(), NoopViewer::new(), driver_logger),
    };

    info!(logger, "running command file"; "cmdfile" => &config.cmdfile, "ncommands" => commands.len());
    let outcome = driver.run_script(&commands);
    // Dropping the driver closes its half of the local channel, which is
    // the connector's cue to shut down cleanly (see `Event::LocalClosed`).
    drop(driver);
    outcome?;

    match connector_handle.join() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(anyhow::anyhow!(err)),
        Err(_) => Err(anyhow::anyhow!("connector thread panicked")),
    }
}
