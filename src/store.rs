//! Flat JSON storage rooted at one directory. The store is passed by
//! reference to whatever needs it; nothing here is global.

use crate::aggregate::DataSources;
use crate::combine::combine_documentation_metrics;
use crate::error::{Result, TeamScoreError};
use crate::types::config::DataLayout;
use crate::types::rules::{Rule, RuleSet, Triangulation, Weights};
use crate::types::team::{NewTeam, Team};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseInfo {
    #[serde(default)]
    pub json_path: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One uploaded file as tracked by the upload registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub stored_name: Option<String>,
    #[serde(default)]
    pub detected_type: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub parse_info: Option<ParseInfo>,
}

impl RegistryEntry {
    /// The type confirmed by the uploader, else the one guessed from the
    /// file name.
    pub fn effective_type(&self) -> Option<&str> {
        self.user_type
            .as_deref()
            .or(self.detected_type.as_deref())
    }

    pub fn is_parsed(&self) -> bool {
        self.status.as_deref() == Some("parsed")
    }

    pub fn json_path(&self) -> Option<&str> {
        self.parse_info
            .as_ref()
            .and_then(|info| info.json_path.as_deref())
            .filter(|path| !path.trim().is_empty())
    }
}

/// Partial rule-settings save. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub rules: Option<Vec<Rule>>,
    pub auto_recalc: Option<bool>,
    pub cross_verify: Option<bool>,
    pub triangulation: Option<Triangulation>,
    pub peer_validation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TeamStore {
    root: PathBuf,
    layout: DataLayout,
}

impl TeamStore {
    pub fn new(root: &Path, layout: DataLayout) -> Self {
        Self {
            root: root.to_path_buf(),
            layout,
        }
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative.replace('\\', "/"))
    }

    /// Missing storage reads as no teams.
    pub fn load_teams(&self) -> Result<Vec<Team>> {
        let path = self.resolve(&self.layout.teams_file);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "teams file missing");
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn find_team(&self, id: &str) -> Result<Team> {
        self.load_teams()?
            .into_iter()
            .find(|team| team.id == id)
            .ok_or_else(|| TeamScoreError::TeamNotFound(id.to_string()))
    }

    /// Accepts both `"team_1"` and `{ "id": "team_1" }`.
    pub fn active_team_id(&self) -> Option<String> {
        let id = match self.read_json(&self.layout.active_team_file)? {
            Value::String(id) => Some(id),
            Value::Object(map) => map.get("id").and_then(Value::as_str).map(str::to_string),
            _ => None,
        };
        id.filter(|id| !id.trim().is_empty())
    }

    pub fn set_active_team(&self, id: &str) -> Result<()> {
        self.find_team(id)?;
        self.write_json(
            &self.layout.active_team_file,
            &serde_json::json!({ "id": id }),
        )?;
        tracing::info!(team = id, "active team updated");
        Ok(())
    }

    /// Persists a new team, which becomes the active team.
    pub fn create_team(&self, new_team: NewTeam) -> Result<Team> {
        if new_team.name.trim().is_empty() || new_team.code.trim().is_empty() {
            return Err(TeamScoreError::InvalidTeam(
                "missing required fields: name, code".to_string(),
            ));
        }
        if let Some(student) = new_team
            .students
            .iter()
            .find(|student| student.name.trim().is_empty())
        {
            return Err(TeamScoreError::InvalidTeam(format!(
                "student with email {} has no name",
                student.email.as_deref().unwrap_or("-")
            )));
        }

        let mut teams = self.load_teams()?;
        let now = Utc::now();
        let mut stamp = now.timestamp_millis();
        while teams.iter().any(|team| team.id == format!("team_{stamp}")) {
            stamp += 1;
        }

        let team = Team {
            id: format!("team_{stamp}"),
            name: new_team.name,
            code: new_team.code,
            repo: new_team.repo,
            students: new_team.students,
            rules: None,
            created_at: Some(now.to_rfc3339()),
        };
        teams.push(team.clone());
        self.write_json(&self.layout.teams_file, &teams)?;
        self.write_json(
            &self.layout.active_team_file,
            &serde_json::json!({ "id": team.id }),
        )?;
        tracing::info!(team = %team.id, students = team.students.len(), "team created");
        Ok(team)
    }

    /// Merges `update` into the team's stored rule settings and persists the
    /// result in the rule-settings form.
    pub fn save_rules(&self, id: &str, update: RuleUpdate, defaults: &Weights) -> Result<RuleSet> {
        let mut teams = self.load_teams()?;
        let team = teams
            .iter_mut()
            .find(|team| team.id == id)
            .ok_or_else(|| TeamScoreError::TeamNotFound(id.to_string()))?;

        let current = team
            .rules
            .as_ref()
            .map(|rules| rules.to_rule_set(defaults))
            .unwrap_or_else(|| RuleSet::from_weights(defaults));
        let saved = RuleSet {
            rules: update.rules.unwrap_or(current.rules),
            auto_recalc: update.auto_recalc.unwrap_or(current.auto_recalc),
            cross_verify: update.cross_verify.unwrap_or(current.cross_verify),
            triangulation: update.triangulation.unwrap_or(current.triangulation),
            peer_validation: update.peer_validation.unwrap_or(current.peer_validation),
        };
        team.rules = Some(crate::types::rules::RulesInput::Named(saved.clone()));

        self.write_json(&self.layout.teams_file, &teams)?;
        tracing::info!(team = id, total = saved.total(), "rules saved");
        Ok(saved)
    }

    pub fn load_registry(&self) -> Vec<RegistryEntry> {
        match self.read_json(&self.layout.registry_file) {
            Some(Value::Array(entries)) => entries
                .into_iter()
                .filter_map(|entry| serde_json::from_value(entry).ok())
                .collect(),
            Some(_) => {
                tracing::debug!("upload registry is not an array; ignoring");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Reads every upstream document scoring needs, running the documentation
    /// combination first when its output is missing.
    pub fn load_sources(&self) -> Result<DataSources> {
        let code = self.read_json(&self.layout.code_metrics_file);

        let docs = match self.read_json(&self.layout.combined_docs_file) {
            Some(docs) => Some(docs),
            None => {
                tracing::debug!("combined documentation metrics missing; combining");
                combine_documentation_metrics(self)?
            }
        };

        let attendance = self
            .load_registry()
            .iter()
            .rev()
            .filter(|entry| entry.effective_type() == Some("attendance") && entry.is_parsed())
            .filter_map(RegistryEntry::json_path)
            .find_map(|path| self.read_json(path));

        Ok(DataSources {
            code,
            attendance,
            docs,
        })
    }

    /// Absent or unparsable files read as `None`.
    pub fn read_json(&self, relative: &str) -> Option<Value> {
        let path = self.resolve(relative);
        if !path.exists() {
            return None;
        }
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "unreadable json file");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "malformed json file");
                None
            }
        }
    }

    pub fn write_json<T: Serialize + ?Sized>(&self, relative: &str, value: &T) -> Result<PathBuf> {
        let path = self.resolve(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(TeamScoreError::Io)?;
        }
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json).map_err(TeamScoreError::Io)?;
        Ok(path)
    }
}
