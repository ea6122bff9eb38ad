use std::net::TcpListener;
use std::sync::Arc;

use clap::Parser;
use slog::{info, o, Drain};
use sloggers::file::FileLoggerBuilder;
use sloggers::types::Severity;
use sloggers::Build;

use orchestrator::{serve, AllowList, Config, SharedState};

fn build_logger(logfile: Option<&str>) -> slog::Logger {
    let stderr_drain = sloggers::terminal::TerminalLoggerBuilder::new().level(Severity::Debug).build().expect("terminal logger");
    match logfile {
        Some(path) => {
            let file_drain =
                FileLoggerBuilder::new(path).level(Severity::Debug).build().expect("file logger");
            let duplicated = slog::Duplicate::new(stderr_drain, file_drain).fuse();
            slog::Logger::root(slog::Async::new(duplicated).build().fuse(), o!("component" => "orchestrator"))
        }
        None => slog::Logger::root(slog::Async::new(stderr_drain).build().fuse(), o!("component" => "orchestrator")),
    }
}

fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let logger = build_logger(config.logfile.as_deref());

    let allow_list = if config.allow.is_empty() {
        AllowList::loopback_only()
    } else {
        AllowList::parse_all(&config.allow)?
    };

    let listener = TcpListener::bind((config.bind.as_str(), config.port))?;
    info!(logger, "listening"; "bind" => &config.bind, "port" => config.port);

    let shared = Arc::new(SharedState::new(allow_list, logger));
    serve(listener, shared);
}
