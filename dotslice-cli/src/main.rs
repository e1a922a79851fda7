mod app;
mod commands;
mod output;

use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .expect("failed to set Ctrl+C handler");

    let cli = Cli::parse();

    // Show dotslice info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("dotslice", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Extract {
            class,
            module,
            output,
            read,
            write,
            allow_stub,
            no_log_stub,
            strict_types,
            name,
            reader_type,
            writer_type,
        } => commands::extract::run(
            &commands::extract::ExtractArgs {
                class,
                module,
                output,
                read: read.as_deref(),
                write: write.as_deref(),
                allow_stub,
                no_log_stub: *no_log_stub,
                strict_types: *strict_types,
                name: name.as_deref(),
                reader_type,
                writer_type,
            },
            &cli.global,
        ),
        Command::Info { path } => commands::info::run(path, &cli.global),
    }
}
