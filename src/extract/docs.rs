use super::Extracted;
use crate::types::metrics::{lenient_f64, DocMetrics};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
struct CombinedDocStats {
    #[serde(default, deserialize_with = "lenient_f64")]
    total_word_count: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    total_docs: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    total_sections: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    avg_sentence_length: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    sentence_complexity: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    readability_score: f64,
}

impl From<CombinedDocStats> for DocMetrics {
    fn from(stats: CombinedDocStats) -> Self {
        DocMetrics {
            word_count: stats.total_word_count,
            avg_sentence_length: stats.avg_sentence_length,
            sentence_complexity: stats.sentence_complexity,
            readability: stats.readability_score,
            total_docs: stats.total_docs,
            total_sections: stats.total_sections,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DocsSource {
    // Arrays must be tried first: untagged structs also accept sequences.
    Sequence(Vec<Value>),
    Wrapped { students: BTreeMap<String, Value> },
    Keyed(BTreeMap<String, Value>),
    Other(Value),
}

/// Reads combined documentation metrics keyed by student display name.
/// Entries without a `combined` object carry no signal and are skipped.
pub fn extract_doc_metrics(source: &Value) -> Extracted<DocMetrics> {
    let shape = match serde_json::from_value::<DocsSource>(source.clone()) {
        Ok(shape) => shape,
        Err(_) => DocsSource::Other(Value::Null),
    };

    let students = match shape {
        DocsSource::Wrapped { students } | DocsSource::Keyed(students) => students,
        DocsSource::Sequence(_) | DocsSource::Other(_) => {
            tracing::debug!("unrecognised documentation metrics shape; treating as empty");
            return Vec::new();
        }
    };

    students
        .into_iter()
        .filter_map(|(name, entry)| {
            let combined = entry.get("combined").filter(|value| value.is_object())?;
            let stats = serde_json::from_value::<CombinedDocStats>(combined.clone()).ok()?;
            Some((name, DocMetrics::from(stats)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrapped_students_pass_through() {
        let out = extract_doc_metrics(&json!({
            "students": {
                "Alice": {
                    "docs": {},
                    "combined": {
                        "total_word_count": 1200,
                        "total_docs": 2,
                        "total_sections": 5,
                        "avg_sentence_length": 17.25,
                        "sentence_complexity": 0.412,
                        "readability_score": 55.1
                    }
                }
            }
        }));

        assert_eq!(out.len(), 1);
        let (name, alice) = &out[0];
        assert_eq!(name, "Alice");
        assert_eq!(alice.word_count, 1200.0);
        assert_eq!(alice.total_docs, 2.0);
        assert_eq!(alice.total_sections, 5.0);
        assert_eq!(alice.avg_sentence_length, 17.25);
        assert_eq!(alice.sentence_complexity, 0.412);
        assert_eq!(alice.readability, 55.1);
    }

    #[test]
    fn bare_mapping_is_accepted_and_entries_without_combined_skipped() {
        let out = extract_doc_metrics(&json!({
            "Alice": {"combined": {"total_word_count": "300"}},
            "Bob": {"docs": {}},
            "Cara": {"combined": 12}
        }));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1.word_count, 300.0);
        assert_eq!(out[0].1.readability, 0.0);
    }

    #[test]
    fn unrecognised_input_is_empty() {
        assert!(extract_doc_metrics(&json!(["Alice"])).is_empty());
        assert!(extract_doc_metrics(&json!([{"Alice": {"combined": {}}}])).is_empty());
    }
}
