use super::Extracted;
use crate::types::metrics::{lenient_f64, CodeMetrics};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Per-author statistics as written by the repository collector.
#[derive(Debug, Clone, Default, Deserialize)]
struct CodeStats {
    #[serde(default, deserialize_with = "lenient_f64")]
    average_complexity: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    percentage_of_functions_written: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    percentage_of_hotspots: f64,
    #[serde(default, rename = "percentage_of_LOC", deserialize_with = "lenient_f64")]
    percentage_of_loc: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    commits: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    additions: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    deletions: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    commit_percentage: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    edit_percentage: f64,
}

impl From<CodeStats> for CodeMetrics {
    fn from(stats: CodeStats) -> Self {
        CodeMetrics {
            pct_loc: stats.percentage_of_loc,
            edit_pct: stats.edit_percentage,
            commit_pct: stats.commit_percentage,
            pct_functions: stats.percentage_of_functions_written,
            pct_hotspots: stats.percentage_of_hotspots,
            avg_complexity: stats.average_complexity,
            commit_count: stats.commits,
            additions: stats.additions,
            deletions: stats.deletions,
        }
    }
}

/// Authors appear either as a bare string or as a commit-author object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AuthorKey {
    Plain(String),
    Nested {
        name: Option<String>,
        email: Option<String>,
        login: Option<String>,
    },
}

impl AuthorKey {
    fn into_key(self) -> Option<String> {
        match self {
            AuthorKey::Plain(key) => Some(key),
            AuthorKey::Nested { name, email, login } => name.or(email).or(login),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CodeRow {
    author: Option<AuthorKey>,
    name: Option<String>,
    email: Option<String>,
    login: Option<String>,
    #[serde(flatten)]
    stats: CodeStats,
}

impl CodeRow {
    fn key(self) -> Option<(String, CodeStats)> {
        let key = self
            .author
            .and_then(AuthorKey::into_key)
            .or(self.name)
            .or(self.email)
            .or(self.login)?;
        Some((key, self.stats))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CodeSource {
    // Arrays must be tried first: untagged structs also accept sequences.
    Rows(Vec<Value>),
    /// Mapped forms are visited in key order, not document order, so
    /// last-write fields follow the sorted author keys.
    Wrapped { authors: BTreeMap<String, Value> },
    Keyed(BTreeMap<String, Value>),
    Other(Value),
}

pub fn extract_code_metrics(source: &Value) -> Extracted<CodeMetrics> {
    let shape = match serde_json::from_value::<CodeSource>(source.clone()) {
        Ok(shape) => shape,
        Err(_) => CodeSource::Other(Value::Null),
    };

    match shape {
        CodeSource::Wrapped { authors } | CodeSource::Keyed(authors) => authors
            .into_iter()
            .filter_map(|(author, value)| {
                if !value.is_object() {
                    tracing::debug!(author = %author, "skipping non-object code stats");
                    return None;
                }
                let stats = serde_json::from_value::<CodeStats>(value).ok()?;
                Some((author, CodeMetrics::from(stats)))
            })
            .collect(),
        CodeSource::Rows(rows) => rows
            .into_iter()
            .filter_map(|row| serde_json::from_value::<CodeRow>(row).ok()?.key())
            .map(|(author, stats)| (author, CodeMetrics::from(stats)))
            .collect(),
        CodeSource::Other(_) => {
            tracing::debug!("unrecognised code metrics shape; treating as empty");
            Vec::new()
        }
    }
}
