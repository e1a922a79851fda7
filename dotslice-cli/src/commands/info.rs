use std::path::Path;

use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::load_module,
    output::{print_output, print_table},
};

#[derive(Debug, Serialize)]
pub struct ModuleInfo {
    pub name: String,
    pub version: String,
    pub mvid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write: Option<String>,
    pub tables: Vec<TableCount>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<AssemblyRefInfo>,
}

#[derive(Debug, Serialize)]
pub struct TableCount {
    pub table: &'static str,
    pub rows: usize,
}

#[derive(Debug, Serialize)]
pub struct AssemblyRefInfo {
    pub name: String,
    pub version: String,
}

pub fn run(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let module = load_module(path)?;
    let markers = &module.markers;

    let tables = vec![
        TableCount {
            table: "TypeDef",
            rows: module.type_def_count(),
        },
        TableCount {
            table: "TypeRef",
            rows: module.type_refs().count(),
        },
        TableCount {
            table: "Field",
            rows: module.fields().count(),
        },
        TableCount {
            table: "MethodDef",
            rows: module.method_count(),
        },
        TableCount {
            table: "MemberRef",
            rows: module.member_refs().count(),
        },
        TableCount {
            table: "Property",
            rows: module.properties().count(),
        },
        TableCount {
            table: "MethodSpec",
            rows: module.method_specs().count(),
        },
    ];

    let info = ModuleInfo {
        name: module.name.clone(),
        version: module.version.to_string(),
        mvid: module.mvid().to_string(),
        entry_type: markers
            .entry_type
            .and_then(|token| module.type_full_name(token)),
        read: markers.read.and_then(|token| module.method_full_name(token)),
        write: markers.write.and_then(|token| module.method_full_name(token)),
        tables,
        references: module
            .assembly_refs
            .iter()
            .map(|aref| AssemblyRefInfo {
                name: aref.name.clone(),
                version: aref.version.to_string(),
            })
            .collect(),
    };

    print_output(&info, opts, |info| {
        println!("Module:          {}", info.name);
        println!("Version:         {}", info.version);
        println!("MVID:            {}", info.mvid);
        if let Some(entry_type) = &info.entry_type {
            println!("Entry type:      {entry_type}");
        }
        if let Some(read) = &info.read {
            println!("Read:            {read}");
        }
        if let Some(write) = &info.write {
            println!("Write:           {write}");
        }

        print_table(
            "Tables",
            &["Table", "Rows"],
            &[1],
            info.tables
                .iter()
                .map(|t| vec![t.table.to_string(), t.rows.to_string()])
                .collect(),
        );
        print_table(
            "References",
            &["Name", "Version"],
            &[],
            info.references
                .iter()
                .map(|r| vec![r.name.clone(), r.version.clone()])
                .collect(),
        );
    })
}
