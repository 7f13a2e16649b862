use crate::error::TeamScoreError;
use crate::types::metrics::Dimension;
use crate::types::rules::Weights;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoreConfig {
    pub data: Option<DataConfig>,
    pub scoring: Option<ScoringConfig>,
    pub identity: Option<IdentityConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub teams_file: Option<String>,
    pub active_team_file: Option<String>,
    pub code_metrics_file: Option<String>,
    pub combined_docs_file: Option<String>,
    pub registry_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    pub weights: Option<HashMap<String, f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub strip_bot_suffix: Option<bool>,
}

/// Where each flat JSON file lives, relative to the data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    pub teams_file: String,
    pub active_team_file: String,
    pub code_metrics_file: String,
    pub combined_docs_file: String,
    pub registry_file: String,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self {
            teams_file: "data/teams.json".to_string(),
            active_team_file: "data/activeTeam.json".to_string(),
            code_metrics_file: "data/finalStats.json".to_string(),
            combined_docs_file: "data/combined_documentation_metrics.json".to_string(),
            registry_file: "fileRegistry.json".to_string(),
        }
    }
}

impl ScoreConfig {
    /// Weights applied to teams that have no stored rules. Keys left out of
    /// `[scoring.weights]` keep their built-in default.
    pub fn default_weights(&self) -> Weights {
        let mut weights = Weights::default();
        if let Some(overrides) = self
            .scoring
            .as_ref()
            .and_then(|scoring| scoring.weights.as_ref())
        {
            for (name, value) in overrides {
                if let Some(dim) = Dimension::from_name(name) {
                    weights.set(dim, *value);
                }
            }
        }
        weights
    }

    pub fn layout(&self) -> DataLayout {
        let defaults = DataLayout::default();
        match &self.data {
            Some(data) => DataLayout {
                teams_file: data.teams_file.clone().unwrap_or(defaults.teams_file),
                active_team_file: data
                    .active_team_file
                    .clone()
                    .unwrap_or(defaults.active_team_file),
                code_metrics_file: data
                    .code_metrics_file
                    .clone()
                    .unwrap_or(defaults.code_metrics_file),
                combined_docs_file: data
                    .combined_docs_file
                    .clone()
                    .unwrap_or(defaults.combined_docs_file),
                registry_file: data.registry_file.clone().unwrap_or(defaults.registry_file),
            },
            None => defaults,
        }
    }

    pub fn strip_bot_suffix(&self) -> bool {
        self.identity
            .as_ref()
            .and_then(|identity| identity.strip_bot_suffix)
            .unwrap_or(true)
    }

    pub fn validate(&self) -> Result<(), TeamScoreError> {
        if let Some(weights) = self
            .scoring
            .as_ref()
            .and_then(|scoring| scoring.weights.as_ref())
        {
            let mut unknown = weights
                .keys()
                .filter(|key| Dimension::from_name(key).is_none())
                .cloned()
                .collect::<Vec<_>>();
            if !unknown.is_empty() {
                unknown.sort();
                return Err(TeamScoreError::ConfigParse(format!(
                    "scoring.weights contains unknown key(s): {}",
                    unknown.join(", ")
                )));
            }
            if weights
                .values()
                .any(|weight| !weight.is_finite() || *weight < 0.0)
            {
                return Err(TeamScoreError::ConfigParse(
                    "scoring.weights values must be finite and non-negative".to_string(),
                ));
            }
        }

        if let Some(data) = &self.data {
            for (field, value) in [
                ("teams_file", &data.teams_file),
                ("active_team_file", &data.active_team_file),
                ("code_metrics_file", &data.code_metrics_file),
                ("combined_docs_file", &data.combined_docs_file),
                ("registry_file", &data.registry_file),
            ] {
                if value.as_deref().is_some_and(|path| path.trim().is_empty()) {
                    return Err(TeamScoreError::ConfigParse(format!(
                        "data.{field} cannot be empty"
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: ScoreConfig = toml::from_str("").expect("empty config should parse");
        assert_eq!(cfg.layout(), DataLayout::default());
        assert_eq!(cfg.default_weights(), Weights::default());
        assert!(cfg.strip_bot_suffix());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parse_full_config() {
        let cfg: ScoreConfig = toml::from_str(
            r#"
[data]
teams_file = "store/teams.json"
registry_file = "uploads/registry.json"

[scoring.weights]
commits = 40.0
"Word Count" = 0.0

[identity]
strip_bot_suffix = false
"#,
        )
        .expect("config should parse");

        let layout = cfg.layout();
        assert_eq!(layout.teams_file, "store/teams.json");
        assert_eq!(layout.registry_file, "uploads/registry.json");
        assert_eq!(layout.code_metrics_file, "data/finalStats.json");

        let weights = cfg.default_weights();
        assert_eq!(weights.get(Dimension::Commits), 40.0);
        assert_eq!(weights.get(Dimension::WordCount), 0.0);
        assert_eq!(weights.get(Dimension::Loc), 12.0);
        assert!(!cfg.strip_bot_suffix());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unknown_weight_keys() {
        let cfg: ScoreConfig = toml::from_str(
            r#"
[scoring.weights]
peer_review = 10.0
"#,
        )
        .expect("config should parse");
        let err = cfg.validate().expect_err("unknown key should be rejected");
        assert!(err.to_string().contains("peer_review"));
    }

    #[test]
    fn validate_rejects_negative_weights() {
        let cfg: ScoreConfig = toml::from_str(
            r#"
[scoring.weights]
loc = -1.0
"#,
        )
        .expect("config should parse");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_layout_path() {
        let cfg: ScoreConfig = toml::from_str(
            r#"
[data]
teams_file = "  "
"#,
        )
        .expect("config should parse");
        let err = cfg.validate().expect_err("empty path should be rejected");
        assert!(err.to_string().contains("data.teams_file"));
    }
}
