//! Loading a results file end to end.
//!
//! bytes -> [`detect`] -> [`read_rows`] -> [`normalize`] -> [`ResultSet`].
//! Fatal problems (undecodable bytes, too few columns, reader failures) are
//! returned as errors; everything row-level ends up in the report's
//! diagnostics.

use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;

use crate::config::IngestConfig;
use crate::error::ResultsResult;
use crate::models::{ResultSet, RowDiagnostic, SourceInfo};
use crate::parsing::detector::detect;
use crate::parsing::{read_rows, SourceHint};
use crate::preprocessing::{normalize, NormalizeOptions};
use crate::store::{ResultStore, Snapshot};

/// A successfully loaded source.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub result_set: ResultSet,
    pub diagnostics: Vec<RowDiagnostic>,
}

impl LoadReport {
    /// Number of source rows excluded from the result set.
    pub fn dropped_rows(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_dropped()).count()
    }
}

/// SHA-256 of the raw source bytes, hex encoded.
pub fn calculate_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Load a source from memory.
pub fn load_bytes(bytes: &[u8], hint: &SourceHint, config: &IngestConfig) -> ResultsResult<LoadReport> {
    let name = hint.filename.clone().unwrap_or_else(|| "<upload>".to_string());
    load_named(bytes, hint, config, &name).map_err(|e| e.with_source(&name))
}

fn load_named(
    bytes: &[u8],
    hint: &SourceHint,
    config: &IngestConfig,
    name: &str,
) -> ResultsResult<LoadReport> {
    let plan = detect(bytes, hint, config)?;
    let parsed = read_rows(bytes, &plan)?;
    if parsed.used_fallback {
        log::warn!(
            "'{}' is not valid {}; decoded as {}",
            name,
            plan.encoding.name(),
            parsed.encoding
        );
    }

    let normalized = normalize(
        &parsed.rows,
        &NormalizeOptions {
            header: config.header,
        },
    )?;

    let source = SourceInfo {
        name: name.to_string(),
        format: plan.format,
        encoding: parsed.encoding,
        used_fallback: parsed.used_fallback,
        delimiter: plan.delimiter.map(char::from),
        column_count: normalized.column_count,
        header_row: normalized.header_row,
        checksum: calculate_checksum(bytes),
    };
    let (result_set, diagnostics) = normalized.into_result_set(source);

    for diagnostic in &diagnostics {
        log::debug!("{}: {}", name, diagnostic);
    }

    Ok(LoadReport {
        result_set,
        diagnostics,
    })
}

/// Load a source from disk. The file name doubles as the format hint.
pub fn load_path<P: AsRef<Path>>(path: P, config: &IngestConfig) -> ResultsResult<LoadReport> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    log::info!("Loading results from {}", path.display());
    load_bytes(&bytes, &SourceHint::from_filename(name), config)
}

/// Load a source and swap it into the store.
pub fn load_into_store(
    store: &ResultStore,
    bytes: &[u8],
    hint: &SourceHint,
    config: &IngestConfig,
) -> ResultsResult<Arc<Snapshot>> {
    let report = load_bytes(bytes, hint, config)?;
    Ok(store.load(report.result_set, report.diagnostics))
}
