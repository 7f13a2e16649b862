pub mod json;
pub mod md;

use crate::error::TeamScoreError;
use crate::types::report::ScoreReport;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Md,
}

pub fn render(report: &ScoreReport, format: OutputFormat) -> Result<String, TeamScoreError> {
    match format {
        OutputFormat::Json => json::to_json(report).map_err(TeamScoreError::Json),
        OutputFormat::Md => Ok(md::to_markdown(report)),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::types::report::{
        MetricSource, ScoreReport, ScoredStudent, TeamSummary, UnmatchedKey,
    };
    use std::collections::BTreeMap;

    pub fn sample_report() -> ScoreReport {
        let entry = |rank: usize, name: &str, score: f64, commits: f64| ScoredStudent {
            rank,
            name: name.to_string(),
            email: Some(format!("{}@x.edu", name.to_lowercase())),
            github: None,
            score,
            breakdown: BTreeMap::from([("commits".to_string(), commits)]),
            raw: BTreeMap::from([
                ("commits".to_string(), commits * 100.0),
                ("attendance".to_string(), 0.9),
            ]),
        };
        ScoreReport {
            team: TeamSummary {
                id: "team_1".to_string(),
                name: "Falcons".to_string(),
                code: "COS40005".to_string(),
                repo: None,
            },
            ranking: vec![entry(1, "Alice", 100.0, 1.0), entry(2, "Bob", 42.5, 0.0)],
            weights: BTreeMap::from([("commits".to_string(), 7.0)]),
            dims: vec!["commits".to_string()],
            students_count: 2,
            unmatched: vec![UnmatchedKey {
                source: MetricSource::Code,
                key: "Carol Smith".to_string(),
            }],
            generated_at: "2026-10-15T00:00:00+00:00".to_string(),
        }
    }
}
