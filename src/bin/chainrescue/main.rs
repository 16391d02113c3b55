use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};

mod accept;
mod cli;
mod cmd_recover;
mod cmd_scan;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт — info.
    // Пример: RUST_LOG=debug ./chainrescue recover --path ...
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Recover { path, network } => cmd_recover::exec(path, network),
        cli::Cmd::Scan {
            path,
            network,
            json,
        } => cmd_scan::exec(path, network, json),
    }
}
