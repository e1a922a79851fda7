use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// dotslice - extract the closure of serialization entry points into a standalone module
#[derive(Debug, Parser)]
#[command(name = "dotslice", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract the read and/or write method of a class into a new module.
    Extract {
        /// Full name of the class, or a suffix unique within the module.
        #[arg(value_name = "CLASS")]
        class: String,

        /// Path to the source module.
        #[arg(value_name = "MODULE")]
        module: PathBuf,

        /// Path of the module to write.
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Name of the read method, taking the reader type first.
        #[arg(short, long, value_name = "NAME")]
        read: Option<String>,

        /// Name of the write method, taking the writer type first.
        #[arg(short, long, value_name = "NAME")]
        write: Option<String>,

        /// Only stub this unresolvable call, written `Namespace.Type::Method`. Repeatable.
        #[arg(long, value_name = "NAME", conflicts_with = "no_log_stub")]
        allow_stub: Vec<String>,

        /// Never replace unresolvable logging calls.
        #[arg(long)]
        no_log_stub: bool,

        /// Fail on unresolvable external types instead of using System.Object.
        #[arg(long)]
        strict_types: bool,

        /// Name of the produced module (default: `<Class>-schema`).
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        /// Full name of the reader type.
        #[arg(long, value_name = "TYPE", default_value = dotslice::extract::DEFAULT_READER_TYPE)]
        reader_type: String,

        /// Full name of the writer type.
        #[arg(long, value_name = "TYPE", default_value = dotslice::extract::DEFAULT_WRITER_TYPE)]
        writer_type: String,
    },

    /// Display module overview: name, version, entry markers, and table counts.
    Info {
        /// Path to the module file.
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}
