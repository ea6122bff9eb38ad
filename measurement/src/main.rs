use std::sync::mpsc;
use std::thread;

use clap::Parser;
use slog::{info, o, warn, Drain};
use sloggers::file::FileLoggerBuilder;
use sloggers::types::Severity;
use sloggers::Build;

use connector::MeasurementConnector;
use measurement::{Client, Config, FakeRadio};
use wire::random_id;

fn build_logger(logfile: Option<&str>, foreground: bool) -> slog::Logger {
    let stderr_drain = sloggers::terminal::TerminalLoggerBuilder::new().level(Severity::Debug).build().expect("terminal logger");
    let root = match logfile {
        Some(path) => {
            let file_drain = FileLoggerBuilder::new(path).level(Severity::Debug).build().expect("file logger");
            if foreground {
                let duplicated = slog::Duplicate::new(stderr_drain, file_drain).fuse();
                slog::Async::new(duplicated).build().fuse()
            } else {
                slog::Async::new(file_drain).build().fuse()
            }
        }
        None => slog::Async::new(stderr_drain).build().fuse(),
    };
    slog::Logger::root(root, o!("component" => "meascli"))
}

fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let logger = build_logger(config.logfile.as_deref(), config.foreground);
    let clientname = config.name.clone().unwrap_or_else(|| format!("meas-{:x}", random_id()));

    info!(logger, "starting"; "host" => &config.host, "port" => config.port, "clientname" => &clientname);
    if config.radio_args.is_empty() {
        warn!(logger, "no radio args given; running against the in-process fake radio");
    }

    let (to_connector, from_client) = mpsc::channel();
    let (to_client, from_connector) = mpsc::channel();

    let connector_logger = logger.new(o!());
    let connector_handle = thread::spawn(move || {
        let mut connector = MeasurementConnector::new(config.host, config.port, clientname, connector_logger);
        connector.run(to_client, from_client)
    });

    let mut client = Client::new(FakeRadio::new(), logger.new(o!("role" => "client")));
    client.run(to_connector, from_connector);

    match connector_handle.join() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(anyhow::anyhow!(err)),
        Err(_) => Err(anyhow::anyhow!("connector thread panicked")),
    }
}
