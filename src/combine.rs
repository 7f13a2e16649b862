//! Folds parsed worklogs, sprint reports and project plans into one
//! per-student documentation record.

use crate::error::Result;
use crate::store::{RegistryEntry, TeamStore};
use crate::types::metrics::{pick_field, round_to};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const DOCUMENT_TYPES: [&str; 3] = ["worklog", "sprint_report", "project_plan"];

#[derive(Debug, Clone, Serialize)]
struct DocumentEntry {
    sections_written: Vec<Value>,
    word_count: f64,
    avg_sentence_length: f64,
    sentence_complexity: f64,
    readability_score: f64,
}

#[derive(Debug, Clone, Serialize)]
struct CombinedStats {
    total_word_count: f64,
    total_docs: usize,
    total_sections: usize,
    avg_sentence_length: f64,
    sentence_complexity: f64,
    readability_score: f64,
}

#[derive(Debug, Clone, Default)]
struct StudentDocs {
    docs: BTreeMap<String, DocumentEntry>,
}

impl StudentDocs {
    fn combined(&self) -> CombinedStats {
        let count = self.docs.len();
        let mean = |pick: fn(&DocumentEntry) -> f64| {
            if count == 0 {
                0.0
            } else {
                self.docs.values().map(pick).sum::<f64>() / count as f64
            }
        };
        CombinedStats {
            total_word_count: self.docs.values().map(|doc| doc.word_count).sum(),
            total_docs: count,
            total_sections: self.docs.values().map(|doc| doc.sections_written.len()).sum(),
            avg_sentence_length: round_to(mean(|doc| doc.avg_sentence_length), 2),
            sentence_complexity: round_to(mean(|doc| doc.sentence_complexity), 3),
            readability_score: round_to(mean(|doc| doc.readability_score), 2),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct StudentOutput {
    docs: BTreeMap<String, DocumentEntry>,
    combined: CombinedStats,
}

/// Rebuilds the combined documentation file from the upload registry and
/// returns what was written. `None` when the registry is empty.
pub fn combine_documentation_metrics(store: &TeamStore) -> Result<Option<Value>> {
    let registry = store.load_registry();
    if registry.is_empty() {
        tracing::warn!("no registry entries found; cannot combine documentation metrics");
        return Ok(None);
    }

    let mut students: BTreeMap<String, StudentDocs> = BTreeMap::new();
    let mut processed: HashSet<String> = HashSet::new();

    for entry in &registry {
        let Some(kind) = entry.effective_type() else {
            continue;
        };
        if !DOCUMENT_TYPES.contains(&kind) {
            continue;
        }
        let name = entry.original_name.as_deref().unwrap_or("-");
        if !entry.is_parsed() {
            tracing::debug!(file = name, status = ?entry.status, "skipping unparsed document");
            continue;
        }
        let Some(json_path) = entry.json_path() else {
            tracing::debug!(file = name, "parsed document has no json path");
            continue;
        };
        let json_path = json_path.replace('\\', "/");
        if !processed.insert(json_path.clone()) {
            tracing::debug!(path = %json_path, "json already processed; skipping duplicate");
            continue;
        }
        let Some(data) = store.read_json(&json_path) else {
            tracing::debug!(path = %json_path, "parsed document json unreadable");
            continue;
        };

        let contributors = data
            .get("students")
            .or_else(|| data.get("contributors"))
            .and_then(Value::as_object);
        let Some(contributors) = contributors else {
            continue;
        };

        let doc_key = document_key(entry, &data);
        for (student, details) in contributors {
            let record = students.entry(student.clone()).or_default();
            if record.docs.contains_key(&doc_key) {
                tracing::debug!(student = %student, doc = %doc_key, "document already counted");
                continue;
            }
            record.docs.insert(doc_key.clone(), document_entry(details));
        }
    }

    let output: BTreeMap<String, StudentOutput> = students
        .into_iter()
        .map(|(name, record)| {
            let combined = record.combined();
            (
                name,
                StudentOutput {
                    docs: record.docs,
                    combined,
                },
            )
        })
        .collect();

    let result = serde_json::json!({ "students": output });
    let path = store.write_json(&store.layout().combined_docs_file, &result)?;
    tracing::info!(
        path = %path.display(),
        students = output_len(&result),
        files = processed.len(),
        "combined documentation metrics written"
    );
    Ok(Some(result))
}

fn output_len(result: &Value) -> usize {
    result["students"].as_object().map_or(0, |students| students.len())
}

fn document_entry(details: &Value) -> DocumentEntry {
    let metrics = details
        .get("metrics")
        .filter(|metrics| metrics.is_object())
        .unwrap_or(details);
    let word_count = match pick_field(metrics, "word_count") {
        words if words != 0.0 => words,
        _ => pick_field(metrics, "words"),
    };
    DocumentEntry {
        sections_written: details
            .get("sections_written")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        word_count,
        avg_sentence_length: pick_field(metrics, "avg_sentence_length"),
        sentence_complexity: pick_field(metrics, "sentence_complexity"),
        readability_score: pick_field(metrics, "readability_score"),
    }
}

/// Documents are identified by their original file name so re-uploads of the
/// same file count once. Stored names look like `base__<timestamp>.ext`.
fn document_key(entry: &RegistryEntry, data: &Value) -> String {
    if let Some(stored) = entry.stored_name.as_deref() {
        let parts: Vec<&str> = stored.split("__").collect();
        if let [base, stamped] = parts.as_slice() {
            let ext = Path::new(stamped)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| format!(".{ext}"))
                .unwrap_or_default();
            return format!("{base}{ext}");
        }
    }
    data.get("source_file")
        .and_then(Value::as_str)
        .or(entry.original_name.as_deref())
        .or(entry.stored_name.as_deref())
        .unwrap_or("unknown")
        .to_string()
}
