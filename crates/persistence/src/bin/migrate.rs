#![deny(warnings)]

//! Migrate a browser storage export into the on-disk storage document.
//!
//! The export is a JSON object mapping storage keys to their string values,
//! as produced by `JSON.stringify(localStorage)`. Only the known keys are
//! copied, and nothing is written unless every one of them parses.

use anyhow::{bail, Context, Result};
use persistence::{default_storage_path, migrate_export, FileStorage};
use std::collections::BTreeMap;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(export) = args.next() else {
        bail!("usage: migrate <browser-export.json> [storage-path]");
    };
    let target = args
        .next()
        .unwrap_or_else(|| default_storage_path().to_string());

    let text = std::fs::read_to_string(&export).with_context(|| format!("reading {export}"))?;
    let entries: BTreeMap<String, String> =
        serde_json::from_str(&text).context("export is not a key/value object")?;

    let storage = FileStorage::open(&target)?;
    let copied = migrate_export(&entries, &storage).context("export rejected")?;
    println!("Migrated {} keys into {}", copied, target);
    Ok(())
}
