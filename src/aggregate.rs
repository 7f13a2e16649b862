use crate::error::Result;
use crate::extract::attendance::extract_attendance;
use crate::extract::code::extract_code_metrics;
use crate::extract::docs::extract_doc_metrics;
use crate::identity::IdentityResolver;
use crate::score::score_students;
use crate::store::TeamStore;
use crate::types::config::ScoreConfig;
use crate::types::metrics::StudentMetrics;
use crate::types::report::{MetricSource, ScoreReport, TeamSummary, UnmatchedKey};
use crate::types::team::Team;
use chrono::Utc;
use serde_json::Value;

/// Raw upstream documents for one team, already read from storage.
#[derive(Debug, Clone, Default)]
pub struct DataSources {
    pub code: Option<Value>,
    pub attendance: Option<Value>,
    pub docs: Option<Value>,
}

#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    pub strip_bot_suffix: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            strip_bot_suffix: true,
        }
    }
}

impl From<&ScoreConfig> for AggregateOptions {
    fn from(config: &ScoreConfig) -> Self {
        Self {
            strip_bot_suffix: config.strip_bot_suffix(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregatedTeam {
    pub students: Vec<StudentMetrics>,
    /// Source keys that matched nobody. They are excluded from every score.
    pub unmatched: Vec<UnmatchedKey>,
}

/// Attributes every source row to a roster entry. Code rows accumulate;
/// attendance and documentation rows overwrite.
pub fn aggregate_for_team(
    team: &Team,
    sources: &DataSources,
    options: AggregateOptions,
) -> AggregatedTeam {
    let resolver = IdentityResolver::new(&team.students);
    if resolver.is_empty() {
        tracing::warn!(team = %team.id, "team roster has no identities to match against");
    }
    tracing::debug!(team = %team.id, identities = resolver.len(), "built identity resolver");

    let mut aggregated = AggregatedTeam {
        students: team
            .students
            .iter()
            .map(|student| StudentMetrics {
                name: student.name.clone(),
                email: student.email.clone(),
                github: student.github.clone(),
                ..StudentMetrics::default()
            })
            .collect(),
        unmatched: Vec::new(),
    };

    if let Some(code) = &sources.code {
        for (author, metrics) in extract_code_metrics(code) {
            match resolver.resolve_author(&author, options.strip_bot_suffix) {
                Some(idx) => aggregated.students[idx].code.accumulate(&metrics),
                None => aggregated.record_unmatched(MetricSource::Code, author),
            }
        }
    }

    if let Some(attendance) = &sources.attendance {
        for (member, metrics) in extract_attendance(attendance) {
            match resolver.resolve(&member) {
                Some(idx) => aggregated.students[idx].attendance = metrics,
                None => aggregated.record_unmatched(MetricSource::Attendance, member),
            }
        }
    }

    if let Some(docs) = &sources.docs {
        for (name, metrics) in extract_doc_metrics(docs) {
            match resolver.resolve(&name) {
                Some(idx) => aggregated.students[idx].docs = metrics,
                None => aggregated.record_unmatched(MetricSource::Docs, name),
            }
        }
    }

    aggregated
}

impl AggregatedTeam {
    fn record_unmatched(&mut self, source: MetricSource, key: String) {
        tracing::warn!(
            source = source.as_str(),
            key = %key,
            "no roster identity matches source key; contribution dropped"
        );
        self.unmatched.push(UnmatchedKey { source, key });
    }
}

/// Loads the team and its sources from `store`, aggregates and scores.
pub fn aggregate_team_scores(
    store: &TeamStore,
    team_id: &str,
    config: &ScoreConfig,
) -> Result<ScoreReport> {
    let team = store.find_team(team_id)?;
    let sources = store.load_sources()?;
    let aggregated = aggregate_for_team(&team, &sources, AggregateOptions::from(config));
    let outcome = score_students(
        &aggregated.students,
        team.rules.as_ref(),
        &config.default_weights(),
    );

    tracing::info!(
        team = %team.id,
        students = aggregated.students.len(),
        unmatched = aggregated.unmatched.len(),
        "scored team"
    );

    Ok(ScoreReport {
        team: TeamSummary {
            id: team.id,
            name: team.name,
            code: team.code,
            repo: team.repo,
        },
        students_count: aggregated.students.len(),
        ranking: outcome.ranking,
        weights: outcome.weights.to_map(),
        dims: outcome.dims.iter().map(|dim| dim.key().to_string()).collect(),
        unmatched: aggregated.unmatched,
        generated_at: Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::team::Student;
    use serde_json::json;

    fn team() -> Team {
        Team {
            id: "team_1".to_string(),
            name: "Falcons".to_string(),
            code: "COS40005".to_string(),
            repo: None,
            students: vec![
                Student {
                    name: "Alice".to_string(),
                    email: Some("a@x.edu".to_string()),
                    github: Some("alice-gh".to_string()),
                    aliases: Vec::new(),
                },
                Student {
                    name: "Bob".to_string(),
                    email: Some("b@x.edu".to_string()),
                    github: None,
                    aliases: vec!["Robert".to_string()],
                },
            ],
            rules: None,
            created_at: None,
        }
    }

    #[test]
    fn code_rows_accumulate_across_aliases() {
        let sources = DataSources {
            code: Some(json!({
                "Alice": {"commit_percentage": 30, "percentage_of_LOC": 10, "average_complexity": 4},
                "alice-gh": {"commit_percentage": 20, "percentage_of_LOC": 15, "average_complexity": 2},
                "Robert": {"edit_percentage": 50}
            })),
            ..DataSources::default()
        };

        let aggregated = aggregate_for_team(&team(), &sources, AggregateOptions::default());
        let alice = &aggregated.students[0].code;
        assert_eq!(alice.commit_pct, 50.0);
        assert_eq!(alice.pct_loc, 25.0);
        // Keyed sources iterate in key order: "Alice" then "alice-gh".
        assert_eq!(alice.avg_complexity, 2.0);
        assert_eq!(aggregated.students[1].code.edit_pct, 50.0);
        assert!(aggregated.unmatched.is_empty());
    }

    #[test]
    fn unmatched_authors_are_dropped_and_reported() {
        let base = DataSources {
            code: Some(json!({
                "Alice": {"commit_percentage": 60, "edit_percentage": 40},
                "Bob": {"commit_percentage": 40, "edit_percentage": 60}
            })),
            ..DataSources::default()
        };
        let with_carol = DataSources {
            code: Some(json!({
                "Alice": {"commit_percentage": 60, "edit_percentage": 40},
                "Bob": {"commit_percentage": 40, "edit_percentage": 60},
                "Carol Smith": {"commit_percentage": 90, "edit_percentage": 90}
            })),
            ..DataSources::default()
        };

        let without = aggregate_for_team(&team(), &base, AggregateOptions::default());
        let with = aggregate_for_team(&team(), &with_carol, AggregateOptions::default());

        assert_eq!(without.students, with.students);
        assert_eq!(
            with.unmatched,
            vec![UnmatchedKey {
                source: MetricSource::Code,
                key: "Carol Smith".to_string()
            }]
        );
    }

    #[test]
    fn attendance_matches_through_parenthetical_suffix() {
        let sources = DataSources {
            attendance: Some(json!({
                "AttendanceSummary": {"Alice (Leader)": 0.9, "Bob": 0.6},
                "WeeklyAttendance": [{"Absentees": ["Bob"]}, {"Absentees": []}]
            })),
            ..DataSources::default()
        };

        let aggregated = aggregate_for_team(&team(), &sources, AggregateOptions::default());
        assert_eq!(aggregated.students[0].attendance.attendance, 0.9);
        assert_eq!(aggregated.students[0].attendance.meetings, 2.0);
        assert_eq!(aggregated.students[1].attendance.meetings, 1.0);
        assert_eq!(aggregated.students[1].attendance.hours, 0.0);
    }

    #[test]
    fn docs_overwrite_by_display_name() {
        let sources = DataSources {
            docs: Some(json!({
                "students": {
                    "ALICE": {"combined": {"total_word_count": 800, "readability_score": 61.5}},
                    "Dana": {"combined": {"total_word_count": 50}}
                }
            })),
            ..DataSources::default()
        };

        let aggregated = aggregate_for_team(&team(), &sources, AggregateOptions::default());
        assert_eq!(aggregated.students[0].docs.word_count, 800.0);
        assert_eq!(aggregated.students[0].docs.readability, 61.5);
        assert_eq!(aggregated.unmatched.len(), 1);
        assert_eq!(aggregated.unmatched[0].source, MetricSource::Docs);
    }

    #[test]
    fn bot_suffix_retry_respects_option() {
        let sources = DataSources {
            code: Some(json!({"alice-gh[bot]": {"commits": 4}})),
            ..DataSources::default()
        };
        let on = aggregate_for_team(&team(), &sources, AggregateOptions::default());
        assert_eq!(on.students[0].code.commit_count, 4.0);

        let off = aggregate_for_team(
            &team(),
            &sources,
            AggregateOptions {
                strip_bot_suffix: false,
            },
        );
        assert_eq!(off.students[0].code.commit_count, 0.0);
        assert_eq!(off.unmatched.len(), 1);
    }

    #[test]
    fn missing_sources_leave_zeroed_records() {
        let aggregated =
            aggregate_for_team(&team(), &DataSources::default(), AggregateOptions::default());
        assert_eq!(aggregated.students.len(), 2);
        assert_eq!(aggregated.students[0].code, Default::default());
        assert_eq!(aggregated.students[1].docs, Default::default());
    }
}
