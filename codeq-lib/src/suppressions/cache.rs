use crate::Result;
use crate::model::SuppressedSymbolInfo;
use crate::reports::{load_json, write_json};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "     cache";

/// On-disk list of the suppressions found by the last source scan.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SuppressionCache {
    suppressed_symbols: Vec<SuppressedSymbolInfo>,
}

/// Load a suppression cache, or nothing if the file does not exist.
pub fn load_cache(path: &Utf8Path) -> Result<Vec<SuppressedSymbolInfo>> {
    if !path.exists() {
        log::debug!(target: LOG_TARGET, "No suppression cache at '{path}'");
        return Ok(Vec::new());
    }

    let cache: SuppressionCache = load_json(path)?;
    log::debug!(target: LOG_TARGET, "Loaded {} suppression(s) from '{path}'", cache.suppressed_symbols.len());
    Ok(cache.suppressed_symbols)
}

/// Replace the suppression cache at `path`.
pub fn save_cache(path: &Utf8Path, suppressions: &[SuppressedSymbolInfo]) -> Result<()> {
    let cache = SuppressionCache {
        suppressed_symbols: suppressions.to_vec(),
    };

    write_json(&cache, path)?;
    log::debug!(target: LOG_TARGET, "Saved {} suppression(s) to '{path}'", suppressions.len());
    Ok(())
}
