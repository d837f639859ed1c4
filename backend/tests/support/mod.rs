//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::io::Write;
use std::sync::Mutex;

use swim_results::config::IngestConfig;
use swim_results::parsing::SourceHint;
use swim_results::services::{load_bytes, LoadReport};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Header line as exported by the timing software.
pub const HEADER: &str =
    "Código1;Código2;Nome;Categoria;Sexo;Chegada;Partida;Tempo;Modalidade;Equipe;Geral;Categoria";

/// One semicolon-separated result line with all twelve columns.
#[allow(clippy::too_many_arguments)]
pub fn line(
    id: u32,
    name: &str,
    category: &str,
    sex: &str,
    elapsed: &str,
    event: &str,
    overall: &str,
    category_rank: &str,
) -> String {
    format!(
        "{id};;{name};{category};{sex};;;{elapsed};{event};;{overall};{category_rank}"
    )
}

/// Header plus lines, newline terminated.
pub fn csv(lines: &[String]) -> String {
    let mut text = String::from(HEADER);
    text.push('\n');
    for l in lines {
        text.push_str(l);
        text.push('\n');
    }
    text
}

/// The five-record event used across scenarios.
pub fn scenario_csv() -> String {
    csv(&[
        line(1, "Ana Lima", "25-29", "F", "00:09:10", "500m", "", ""),
        line(2, "Bruno Costa", "25-29", "M", "00:08:30", "500m", "", ""),
        line(3, "Carla Souza", "30-34", "F", "00:08:55", "500m", "", ""),
        line(4, "Diana Reis", "30-34", "F", "00:20:00", "1km", "", ""),
        line(5, "Elisa Prado", "25-29", "F", "00:09:40", "500m", "", ""),
    ])
}

/// Load in-memory text as `name` with default ingestion settings.
pub fn load_text(name: &str, text: &str) -> LoadReport {
    load_bytes(
        text.as_bytes(),
        &SourceHint::from_filename(name),
        &IngestConfig::default(),
    )
    .expect("fixture should load")
}

/// Write bytes to a named temp file inside `dir`.
pub fn write_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("create fixture");
    file.write_all(bytes).expect("write fixture");
    path
}

/// Runs `f` with environment variables temporarily modified.
///
/// Restores variables on unwind and serializes access to process-global env
/// vars, since tests run in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}
struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}
