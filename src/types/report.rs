use crate::types::team::RepoRef;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricSource {
    Code,
    Attendance,
    Docs,
}

impl MetricSource {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricSource::Code => "code",
            MetricSource::Attendance => "attendance",
            MetricSource::Docs => "docs",
        }
    }
}

/// A source key that matched no roster identity. Reported for roster
/// maintenance only; it never changes a score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedKey {
    pub source: MetricSource,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredStudent {
    pub rank: usize,
    pub name: String,
    pub email: Option<String>,
    pub github: Option<String>,
    /// 0..=100 relative to the top scorer, two decimals.
    pub score: f64,
    pub breakdown: BTreeMap<String, f64>,
    pub raw: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSummary {
    pub id: String,
    pub name: String,
    pub code: String,
    pub repo: Option<RepoRef>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub team: TeamSummary,
    pub ranking: Vec<ScoredStudent>,
    pub weights: BTreeMap<String, f64>,
    pub dims: Vec<String>,
    pub students_count: usize,
    pub unmatched: Vec<UnmatchedKey>,
    pub generated_at: String,
}
