#![warn(missing_docs)]

//! Entry point for the `aot-sim` binary.

mod cli;
mod error;
mod scenarios;
mod world;

use std::process;

use aot_config::Config;
use clap::Parser;
use logging::forward::{self, LogRecord};
use tokio::sync::mpsc;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, registry};

use crate::{
    cli::{Cli, Commands},
    error::Result,
    scenarios::Env,
};

/// Capacity of the forwarded log transport.
const FORWARD_CAPACITY: usize = 1024;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = run().await {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

/// Parse CLI arguments, install logging, and dispatch to the chosen subcommand.
async fn run() -> Result<()> {
    let Cli {
        log,
        config,
        store,
        forward_logs,
        command,
    } = Cli::parse();
    let env_filter = logging::env_filter_from_spec(&log.spec());
    registry()
        .with(env_filter)
        .with((!forward_logs).then(|| fmt::layer().without_time()))
        .with(forward::layer())
        .try_init()
        .ok();

    let printer = forward_logs.then(|| {
        let (tx, mut rx) = mpsc::channel::<LogRecord>(FORWARD_CAPACITY);
        forward::set_sink(tx);
        tokio::spawn(async move {
            while let Some(rec) = rx.recv().await {
                println!("[{}] {:>5} {}: {}", rec.side, rec.level, rec.target, rec.message);
            }
        })
    });

    let cfg = match config {
        Some(path) => aot_config::load_from_path(&path)?,
        None => Config::default(),
    };
    let env = Env {
        cfg,
        store_path: store,
    };

    let outcome = match command {
        Commands::List => {
            for s in scenarios::ALL {
                println!("{}", s.label());
            }
            Ok(())
        }
        Commands::Run { scenario } => scenarios::run(scenario, &env).map(|()| {
            println!("scenario {}: ok", scenario.label());
        }),
    };

    if let Some(printer) = printer {
        forward::clear_sink();
        if printer.await.is_err() {
            eprintln!("log printer stopped early");
        }
        let dropped = forward::dropped();
        if dropped > 0 {
            eprintln!("{dropped} forwarded log records dropped");
        }
    }
    outcome
}
