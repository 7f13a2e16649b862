use crate::error::{Result, TeamScoreError};
use crate::types::config::ScoreConfig;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

pub const DEFAULT_CONFIG_FILE: &str = "teamscore.toml";
pub const DEFAULT_LOCAL_FILE: &str = ".teamscore/local.toml";
pub const DEFAULT_GLOBAL_CONFIG_FILE: &str = ".config/teamscore/config.toml";

pub fn load_config(root: &Path) -> Result<Option<ScoreConfig>> {
    let global = std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(DEFAULT_GLOBAL_CONFIG_FILE));
    load_config_with_global(root, global.as_deref())
}

/// Files read for one data root, lowest precedence first: the user's global
/// file, the root's `teamscore.toml`, then the uncommitted local override.
fn layer_paths(root: &Path, global_path: Option<&Path>) -> Vec<PathBuf> {
    global_path
        .map(Path::to_path_buf)
        .into_iter()
        .chain([root.join(DEFAULT_CONFIG_FILE), root.join(DEFAULT_LOCAL_FILE)])
        .collect()
}

/// `None` when the root has no `teamscore.toml`; the global and local layers
/// only refine a root that opted in.
pub(crate) fn load_config_with_global(
    root: &Path,
    global_path: Option<&Path>,
) -> Result<Option<ScoreConfig>> {
    if !root.join(DEFAULT_CONFIG_FILE).exists() {
        return Ok(None);
    }

    let mut merged = Table::new();
    for path in layer_paths(root, global_path) {
        if !path.exists() {
            continue;
        }
        tracing::debug!(path = %path.display(), "merging config layer");
        overlay(&mut merged, read_layer(&path)?);
    }

    let cfg: ScoreConfig = Value::Table(merged)
        .try_into()
        .map_err(|e: toml::de::Error| TeamScoreError::ConfigParse(e.to_string()))?;
    cfg.validate()?;
    Ok(Some(cfg))
}

fn read_layer(path: &Path) -> Result<Table> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| TeamScoreError::ConfigParse(format!("{}: {}", path.display(), e)))
}

/// Nested tables such as `[scoring.weights]` merge key by key; any other
/// value in `layer` replaces the one in `base`.
fn overlay(base: &mut Table, layer: Table) {
    for (key, value) in layer {
        match value {
            Value::Table(nested) => match base.get_mut(&key) {
                Some(Value::Table(existing)) => overlay(existing, nested),
                _ => {
                    base.insert(key, Value::Table(nested));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}
