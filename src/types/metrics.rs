use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A scored metric axis. Order of [`Dimension::ALL`] is the canonical order
/// used for `dims`, weight arrays and report rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Loc,
    EditedCode,
    Commits,
    Functions,
    Hotspots,
    CodeComplexity,
    AvgSentenceLength,
    SentenceComplexity,
    WordCount,
    Readability,
}

impl Dimension {
    pub const COUNT: usize = 10;

    pub const ALL: [Dimension; Dimension::COUNT] = [
        Dimension::Loc,
        Dimension::EditedCode,
        Dimension::Commits,
        Dimension::Functions,
        Dimension::Hotspots,
        Dimension::CodeComplexity,
        Dimension::AvgSentenceLength,
        Dimension::SentenceComplexity,
        Dimension::WordCount,
        Dimension::Readability,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Dimension::Loc => "loc",
            Dimension::EditedCode => "editedCode",
            Dimension::Commits => "commits",
            Dimension::Functions => "functions",
            Dimension::Hotspots => "hotspots",
            Dimension::CodeComplexity => "codeComplexity",
            Dimension::AvgSentenceLength => "avgSentenceLength",
            Dimension::SentenceComplexity => "sentenceComplexity",
            Dimension::WordCount => "wordCount",
            Dimension::Readability => "readability",
        }
    }

    /// Rule name shown in the rule-settings form.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Loc => "Total Lines of Code",
            Dimension::EditedCode => "Total Edited Code",
            Dimension::Commits => "Total Commits",
            Dimension::Functions => "Total Functions Written",
            Dimension::Hotspots => "Total Hotspot Contributed",
            Dimension::CodeComplexity => "Code Complexity",
            Dimension::AvgSentenceLength => "Average Sentence Length",
            Dimension::SentenceComplexity => "Sentence Complexity",
            Dimension::WordCount => "Word Count",
            Dimension::Readability => "Readability",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Dimension::Loc => "Percentage of code written in code base",
            Dimension::EditedCode => "Percentage of total edited code (additions and deletions)",
            Dimension::Commits => "Percentage of commits made",
            Dimension::Functions => "Percentage of functions written in codebase",
            Dimension::Hotspots => {
                "Percentage of hotspots written in codebase (hotspots = above average function complexity)"
            }
            Dimension::CodeComplexity => "Average code complexity",
            Dimension::AvgSentenceLength => "Average sentence length",
            Dimension::SentenceComplexity => "Sentence complexity",
            Dimension::WordCount => "Word Count",
            Dimension::Readability => "Readability",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Matches a rule name or weight key against the key or the label,
    /// trimmed and case-insensitive.
    pub fn from_name(name: &str) -> Option<Dimension> {
        let wanted = name.trim();
        Dimension::ALL.into_iter().find(|dim| {
            dim.key().eq_ignore_ascii_case(wanted) || dim.label().eq_ignore_ascii_case(wanted)
        })
    }
}

/// Display-only fields carried in `raw` but never weighted.
pub const PASSTHROUGH_KEYS: [&str; 3] = ["attendance", "meetings", "hours"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeMetrics {
    pub pct_loc: f64,
    pub edit_pct: f64,
    pub commit_pct: f64,
    pub pct_functions: f64,
    pub pct_hotspots: f64,
    pub avg_complexity: f64,
    pub commit_count: f64,
    pub additions: f64,
    pub deletions: f64,
}

impl CodeMetrics {
    /// Percentages and counts add up across source rows; complexity is
    /// overwritten by the latest row.
    pub fn accumulate(&mut self, other: &CodeMetrics) {
        self.pct_loc += other.pct_loc;
        self.edit_pct += other.edit_pct;
        self.commit_pct += other.commit_pct;
        self.pct_functions += other.pct_functions;
        self.pct_hotspots += other.pct_hotspots;
        self.avg_complexity = other.avg_complexity;
        self.commit_count += other.commit_count;
        self.additions += other.additions;
        self.deletions += other.deletions;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttendanceMetrics {
    /// Fraction of meetings attended, 0..=1.
    pub attendance: f64,
    pub meetings: f64,
    pub hours: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocMetrics {
    pub word_count: f64,
    pub avg_sentence_length: f64,
    pub sentence_complexity: f64,
    pub readability: f64,
    pub total_docs: f64,
    pub total_sections: f64,
}

/// One roster entry with every raw signal attributed to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudentMetrics {
    pub name: String,
    pub email: Option<String>,
    pub github: Option<String>,
    pub code: CodeMetrics,
    pub attendance: AttendanceMetrics,
    pub docs: DocMetrics,
}

impl StudentMetrics {
    pub fn raw_value(&self, dim: Dimension) -> f64 {
        let value = match dim {
            Dimension::Loc => self.code.pct_loc,
            Dimension::EditedCode => self.code.edit_pct,
            Dimension::Commits => self.code.commit_pct,
            Dimension::Functions => self.code.pct_functions,
            Dimension::Hotspots => self.code.pct_hotspots,
            Dimension::CodeComplexity => self.code.avg_complexity,
            Dimension::AvgSentenceLength => self.docs.avg_sentence_length,
            Dimension::SentenceComplexity => self.docs.sentence_complexity,
            Dimension::WordCount => self.docs.word_count,
            Dimension::Readability => self.docs.readability,
        };
        finite_or_zero(value)
    }

    pub fn passthrough(&self) -> [(&'static str, f64); 3] {
        [
            (PASSTHROUGH_KEYS[0], finite_or_zero(self.attendance.attendance)),
            (PASSTHROUGH_KEYS[1], finite_or_zero(self.attendance.meetings)),
            (PASSTHROUGH_KEYS[2], finite_or_zero(self.attendance.hours)),
        ]
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Coerces a loosely typed JSON value to a finite number. Numeric strings are
/// accepted; everything else reads as zero.
pub fn pick_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|number| number.is_finite()).unwrap_or(0.0)
}

pub fn pick_field(object: &Value, field: &str) -> f64 {
    object.get(field).map(pick_number).unwrap_or(0.0)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// `deserialize_with` adapter for numeric fields that may arrive as strings,
/// nulls or garbage.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| pick_number(&value))
}

/// `deserialize_with` adapter that reads an explicit `null` as the type's
/// default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pick_number_tolerates_strings_and_garbage() {
        assert_eq!(pick_number(&json!(12.5)), 12.5);
        assert_eq!(pick_number(&json!(" 7 ")), 7.0);
        assert_eq!(pick_number(&json!("seven")), 0.0);
        assert_eq!(pick_number(&json!(null)), 0.0);
        assert_eq!(pick_number(&json!({"a": 1})), 0.0);
        assert_eq!(pick_number(&json!("NaN")), 0.0);
        assert_eq!(pick_number(&json!("inf")), 0.0);
    }

    #[test]
    fn dimension_matches_key_or_label_case_insensitively() {
        assert_eq!(Dimension::from_name("  total commits "), Some(Dimension::Commits));
        assert_eq!(Dimension::from_name("EDITEDCODE"), Some(Dimension::EditedCode));
        assert_eq!(Dimension::from_name("Word Count"), Some(Dimension::WordCount));
        assert_eq!(Dimension::from_name("peer review"), None);
    }

    #[test]
    fn dimension_index_follows_canonical_order() {
        for (position, dim) in Dimension::ALL.iter().enumerate() {
            assert_eq!(dim.index(), position);
        }
    }

    #[test]
    fn code_accumulation_sums_percentages_and_overwrites_complexity() {
        let mut total = CodeMetrics {
            pct_loc: 10.0,
            commit_pct: 5.0,
            avg_complexity: 4.0,
            ..CodeMetrics::default()
        };
        total.accumulate(&CodeMetrics {
            pct_loc: 15.0,
            commit_pct: 2.5,
            avg_complexity: 2.0,
            ..CodeMetrics::default()
        });
        assert_eq!(total.pct_loc, 25.0);
        assert_eq!(total.commit_pct, 7.5);
        assert_eq!(total.avg_complexity, 2.0);
    }
}
