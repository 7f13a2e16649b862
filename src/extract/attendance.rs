use super::Extracted;
use crate::identity::{normalize_key, strip_parenthetical};
use crate::types::metrics::{pick_field, pick_number, AttendanceMetrics};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AttendanceSource {
    // Arrays must be tried first: untagged structs also accept sequences.
    Sequence(Vec<Value>),
    /// Spreadsheet parser output: per-member fraction plus weekly absentees.
    Summary {
        #[serde(rename = "AttendanceSummary", deserialize_with = "summary_entries")]
        summary: BTreeMap<String, Value>,
        /// Only an array carries weeks; any other value counts no meetings.
        #[serde(rename = "WeeklyAttendance", default)]
        weekly: Option<Value>,
    },
    /// Older roster form: `{ students: [{ name | email, hours, meetings }] }`.
    Roster { students: Vec<Value> },
    /// Older keyed form: `{ name: { hours, meetings } }`.
    Keyed(BTreeMap<String, Value>),
    Other(Value),
}

pub fn extract_attendance(source: &Value) -> Extracted<AttendanceMetrics> {
    let shape = match serde_json::from_value::<AttendanceSource>(source.clone()) {
        Ok(shape) => shape,
        Err(_) => AttendanceSource::Other(Value::Null),
    };

    match shape {
        AttendanceSource::Summary { summary, weekly } => {
            let weeks = weekly
                .as_ref()
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            from_summary(summary, weeks)
        }
        AttendanceSource::Roster { students } => students
            .iter()
            .filter_map(|student| {
                let key = ["email", "name"]
                    .iter()
                    .filter_map(|field| student.get(*field).and_then(Value::as_str))
                    .find(|key| !key.trim().is_empty())?;
                Some((key.to_string(), legacy_metrics(student)))
            })
            .collect(),
        AttendanceSource::Keyed(entries) => entries
            .into_iter()
            .filter(|(_, value)| value.is_object())
            .map(|(key, value)| (key, legacy_metrics(&value)))
            .collect(),
        AttendanceSource::Sequence(_) | AttendanceSource::Other(_) => {
            tracing::debug!("unrecognised attendance shape; treating as empty");
            Vec::new()
        }
    }
}

fn summary_entries<'de, D>(deserializer: D) -> Result<BTreeMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| match value {
        Value::Object(entries) => entries.into_iter().collect(),
        _ => BTreeMap::new(),
    })
}

fn legacy_metrics(value: &Value) -> AttendanceMetrics {
    AttendanceMetrics {
        attendance: pick_field(value, "attendance"),
        meetings: pick_field(value, "meetings"),
        hours: pick_field(value, "hours"),
    }
}

/// The fraction is taken as reported. Meetings are counted from the weekly
/// sheet: a member listed in the summary is credited for every week whose
/// absentee list does not name them.
fn from_summary(
    summary: BTreeMap<String, Value>,
    weekly: &[Value],
) -> Extracted<AttendanceMetrics> {
    let weeks: Vec<HashSet<String>> = weekly.iter().map(absentees).collect();

    summary
        .into_iter()
        .map(|(member, fraction)| {
            let member_key = comparable_name(&member);
            let meetings = weeks
                .iter()
                .filter(|absent| !absent.contains(&member_key))
                .count();
            let metrics = AttendanceMetrics {
                attendance: pick_number(&fraction),
                meetings: meetings as f64,
                hours: 0.0,
            };
            (member, metrics)
        })
        .collect()
}

fn absentees(week: &Value) -> HashSet<String> {
    week.get("Absentees")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(comparable_name)
                .collect()
        })
        .unwrap_or_default()
}

fn comparable_name(name: &str) -> String {
    normalize_key(strip_parenthetical(name))
}
