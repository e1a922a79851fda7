use std::path::Path;

use anyhow::Context;
use dotslice::prelude::*;
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{file_display_name, load_module},
    output::{print_output, print_table},
};

/// Arguments of the `extract` subcommand.
pub struct ExtractArgs<'a> {
    pub class: &'a str,
    pub module: &'a Path,
    pub output: &'a Path,
    pub read: Option<&'a str>,
    pub write: Option<&'a str>,
    pub allow_stub: &'a [String],
    pub no_log_stub: bool,
    pub strict_types: bool,
    pub name: Option<&'a str>,
    pub reader_type: &'a str,
    pub writer_type: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ExtractSummary {
    pub module: String,
    pub output: String,
    pub entry_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write: Option<String>,
    pub type_count: usize,
    pub method_count: usize,
    pub constructors_added: Vec<String>,
    pub constructors_widened: Vec<String>,
    pub fields_widened: usize,
    pub dependencies_removed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

fn stub_policy(args: &ExtractArgs<'_>) -> StubPolicy {
    if args.no_log_stub {
        StubPolicy::Disabled
    } else if !args.allow_stub.is_empty() {
        StubPolicy::AllowList(args.allow_stub.to_vec())
    } else {
        StubPolicy::Heuristic
    }
}

pub fn run(args: &ExtractArgs<'_>, opts: &GlobalOptions) -> anyhow::Result<()> {
    let source = load_module(args.module)?;

    let mut options = ExtractOptions::default()
        .with_stub_policy(stub_policy(args))
        .with_strict_types(args.strict_types)
        .with_cursor_types(args.reader_type, args.writer_type);
    if let Some(name) = args.name {
        options = options.with_module_name(name);
    }

    let entries = resolve_entry_points(&source, args.class, args.read, args.write, &options)
        .with_context(|| format!("failed to select entry points on {}", args.class))?;

    let resolver = DirectoryResolver::for_module(args.module);
    let extraction = Extractor::new(&source, &resolver, &options)
        .extract(&entries)
        .with_context(|| {
            format!(
                "failed to extract {} from {}",
                args.class,
                file_display_name(args.module)
            )
        })?;

    for warning in &extraction.warnings {
        log::warn!("{warning}");
    }

    dotslice::file::save(&extraction.module, args.output)
        .with_context(|| format!("failed to write module: {}", args.output.display()))?;

    let module = &extraction.module;
    let markers = &module.markers;
    let summary = ExtractSummary {
        module: module.name.clone(),
        output: args.output.display().to_string(),
        entry_type: markers
            .entry_type
            .and_then(|token| module.type_full_name(token))
            .unwrap_or_default(),
        read: markers.read.and_then(|token| module.method_full_name(token)),
        write: markers.write.and_then(|token| module.method_full_name(token)),
        type_count: module.type_def_count(),
        method_count: module.method_count(),
        constructors_added: extraction.report.constructors_added.clone(),
        constructors_widened: extraction.report.constructors_widened.clone(),
        fields_widened: extraction.report.fields_widened,
        dependencies_removed: extraction.report.dependencies_removed.clone(),
        warnings: extraction.warnings.iter().map(ToString::to_string).collect(),
    };

    print_output(&summary, opts, |summary| {
        println!("Module:          {}", summary.module);
        println!("Output:          {}", summary.output);
        println!("Entry type:      {}", summary.entry_type);
        if let Some(read) = &summary.read {
            println!("Read:            {read}");
        }
        if let Some(write) = &summary.write {
            println!("Write:           {write}");
        }
        println!("Types:           {}", summary.type_count);
        println!("Methods:         {}", summary.method_count);
        println!("Fields widened:  {}", summary.fields_widened);
        let constructors = summary
            .constructors_added
            .iter()
            .map(|name| vec![name.clone(), "added".to_string()])
            .chain(
                summary
                    .constructors_widened
                    .iter()
                    .map(|name| vec![name.clone(), "made public".to_string()]),
            )
            .collect();
        print_table("Constructors", &["Type", "Edit"], &[], constructors);
        print_table(
            "Dependencies removed",
            &["Name"],
            &[],
            summary
                .dependencies_removed
                .iter()
                .map(|name| vec![name.clone()])
                .collect(),
        );
    })
}
