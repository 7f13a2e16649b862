use crate::normalize::normalize;
use crate::types::metrics::{round_to, Dimension, StudentMetrics};
use crate::types::report::ScoredStudent;
use crate::types::rules::{resolve_weights, RulesInput, Weights};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct ScoreOutcome {
    pub ranking: Vec<ScoredStudent>,
    pub weights: Weights,
    pub dims: Vec<Dimension>,
}

/// Normalizes every dimension across the cohort, combines them with the
/// resolved weights and expresses each total relative to the top scorer.
/// Ties keep roster order.
pub fn score_students(
    students: &[StudentMetrics],
    rules: Option<&RulesInput>,
    defaults: &Weights,
) -> ScoreOutcome {
    let weights = resolve_weights(rules, defaults);
    let dims = Dimension::ALL.to_vec();

    let normalized: Vec<Vec<f64>> = dims
        .iter()
        .map(|dim| {
            let raw: Vec<f64> = students.iter().map(|s| s.raw_value(*dim)).collect();
            normalize(&raw)
        })
        .collect();

    let totals: Vec<f64> = (0..students.len())
        .map(|i| {
            dims.iter()
                .zip(&normalized)
                .map(|(dim, column)| column[i] * weights.get(*dim))
                .sum()
        })
        .collect();

    let max_total = totals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let divisor = if max_total > 0.0 { max_total } else { 1.0 };

    let mut ranking: Vec<ScoredStudent> = students
        .iter()
        .enumerate()
        .map(|(i, student)| {
            let breakdown = dims
                .iter()
                .zip(&normalized)
                .map(|(dim, column)| (dim.key().to_string(), round_to(column[i], 4)))
                .collect::<BTreeMap<_, _>>();
            let mut raw = dims
                .iter()
                .map(|dim| (dim.key().to_string(), student.raw_value(*dim)))
                .collect::<BTreeMap<_, _>>();
            for (key, value) in student.passthrough() {
                raw.insert(key.to_string(), value);
            }

            ScoredStudent {
                rank: 0,
                name: student.name.clone(),
                email: student.email.clone(),
                github: student.github.clone(),
                score: round_to(100.0 * totals[i] / divisor, 2),
                breakdown,
                raw,
            }
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (position, entry) in ranking.iter_mut().enumerate() {
        entry.rank = position + 1;
    }

    ScoreOutcome {
        ranking,
        weights,
        dims,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::metrics::{AttendanceMetrics, CodeMetrics, DocMetrics};

    fn student(name: &str, commit_pct: f64, edit_pct: f64) -> StudentMetrics {
        StudentMetrics {
            name: name.to_string(),
            email: Some(format!("{}@x.edu", name.to_lowercase())),
            github: None,
            code: CodeMetrics {
                commit_pct,
                edit_pct,
                ..CodeMetrics::default()
            },
            attendance: AttendanceMetrics::default(),
            docs: DocMetrics::default(),
        }
    }

    fn commit_edit_rules(commits: f64, edits: f64) -> RulesInput {
        RulesInput::List(vec![
            crate::types::rules::Rule {
                name: "Total Commits".to_string(),
                value: commits,
                desc: String::new(),
            },
            crate::types::rules::Rule {
                name: "Total Edited Code".to_string(),
                value: edits,
                desc: String::new(),
            },
        ])
    }

    fn cohort() -> Vec<StudentMetrics> {
        let mut cara = student("Cara", 30.0, 10.0);
        cara.docs.word_count = 900.0;
        cara.code.pct_loc = 50.0;
        vec![
            student("Alice", 50.0, 20.0),
            student("Bob", 20.0, 70.0),
            cara,
        ]
    }

    #[test]
    fn top_scorer_is_always_one_hundred() {
        let outcome = score_students(&cohort(), None, &Weights::default());
        assert_eq!(outcome.ranking[0].rank, 1);
        assert_eq!(outcome.ranking[0].score, 100.0);
        assert!(outcome
            .ranking
            .iter()
            .all(|entry| (0.0..=100.0).contains(&entry.score)));
    }

    #[test]
    fn doubling_weights_keeps_ranking_and_scores() {
        let students = cohort();
        let base = score_students(&students, None, &Weights::default());

        let doubled_rules = RulesInput::Named(crate::types::rules::RuleSet::from_weights(
            &Weights::from_pairs(Weights::default().iter().map(|(dim, w)| (dim.key(), 2.0 * w))),
        ));
        let doubled = score_students(&students, Some(&doubled_rules), &Weights::zero());

        let names = |outcome: &ScoreOutcome| {
            outcome
                .ranking
                .iter()
                .map(|entry| (entry.name.clone(), entry.score))
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&base), names(&doubled));
        assert_eq!(doubled.weights.total(), 2.0 * base.weights.total());
    }

    #[test]
    fn commit_and_edit_weighting_separates_two_students() {
        let students = vec![student("Alice", 60.0, 40.0), student("Bob", 40.0, 60.0)];
        let rules = commit_edit_rules(50.0, 50.0);
        let outcome = score_students(&students, Some(&rules), &Weights::default());

        let alice = outcome
            .ranking
            .iter()
            .find(|entry| entry.name == "Alice")
            .expect("alice ranked");
        assert_eq!(alice.breakdown["commits"], 1.0);
        assert_eq!(alice.breakdown["editedCode"], 0.0);
        assert_eq!(alice.breakdown["loc"], 0.5);
        // Equal totals: both reach the top and roster order breaks the tie.
        assert_eq!(outcome.ranking[0].name, "Alice");
        assert_eq!(outcome.ranking[0].score, 100.0);
        assert_eq!(outcome.ranking[1].score, 100.0);
        assert_eq!(outcome.ranking[1].rank, 2);
    }

    #[test]
    fn unequal_weights_give_exactly_one_full_score() {
        let students = vec![student("Alice", 60.0, 40.0), student("Bob", 40.0, 60.0)];
        let rules = commit_edit_rules(60.0, 40.0);
        let outcome = score_students(&students, Some(&rules), &Weights::default());
        assert_eq!(outcome.ranking[0].name, "Alice");
        assert_eq!(outcome.ranking[0].score, 100.0);
        assert!(outcome.ranking[1].score < 100.0);
        assert!(outcome.ranking[1].score > 0.0);
    }

    #[test]
    fn zero_weights_score_everyone_zero() {
        let students = cohort();
        let outcome = score_students(&students, None, &Weights::zero());
        assert!(outcome.ranking.iter().all(|entry| entry.score == 0.0));
        let order: Vec<&str> = outcome.ranking.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(order, vec!["Alice", "Bob", "Cara"]);
    }

    #[test]
    fn raw_carries_passthrough_fields() {
        let mut students = cohort();
        students[0].attendance = AttendanceMetrics {
            attendance: 0.9,
            meetings: 7.0,
            hours: 0.0,
        };
        let outcome = score_students(&students, None, &Weights::default());
        let alice = outcome
            .ranking
            .iter()
            .find(|entry| entry.name == "Alice")
            .expect("alice ranked");
        assert_eq!(alice.raw["attendance"], 0.9);
        assert_eq!(alice.raw["meetings"], 7.0);
        assert_eq!(alice.raw["hours"], 0.0);
        assert_eq!(alice.raw["commits"], 50.0);
        assert!(!alice.breakdown.contains_key("attendance"));
        assert_eq!(outcome.dims.len(), Dimension::COUNT);
    }

    #[test]
    fn empty_cohort_scores_nothing() {
        let outcome = score_students(&[], None, &Weights::default());
        assert!(outcome.ranking.is_empty());
    }
}
