//! Attribution of free-text author keys to roster positions.

use crate::types::team::Student;
use std::collections::HashMap;

/// Case-insensitive lookup from every identity string of a roster to the
/// student's index in that roster.
#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    keys: HashMap<String, usize>,
}

impl IdentityResolver {
    /// On collisions the earlier roster entry keeps the key.
    pub fn new(students: &[Student]) -> Self {
        let mut keys = HashMap::new();
        for (idx, student) in students.iter().enumerate() {
            for identity in student.identities() {
                let key = normalize_key(identity);
                if key.is_empty() {
                    continue;
                }
                match keys.get(&key) {
                    Some(&owner) if owner != idx => {
                        tracing::debug!(
                            identity = %key,
                            owner,
                            ignored = idx,
                            "identity already registered to an earlier student"
                        );
                    }
                    Some(_) => {}
                    None => {
                        keys.insert(key, idx);
                    }
                }
            }
        }
        Self { keys }
    }

    /// Exact normalized match first, then the same key with a trailing
    /// parenthetical removed.
    pub fn resolve(&self, key: &str) -> Option<usize> {
        let normalized = normalize_key(key);
        if normalized.is_empty() {
            return None;
        }
        if let Some(&idx) = self.keys.get(&normalized) {
            return Some(idx);
        }
        let stripped = strip_parenthetical(&normalized);
        if stripped.is_empty() || stripped == normalized {
            return None;
        }
        self.keys.get(stripped).copied()
    }

    /// Like [`IdentityResolver::resolve`], retrying once without a trailing
    /// `[bot]` marker.
    pub fn resolve_author(&self, key: &str, strip_bot: bool) -> Option<usize> {
        self.resolve(key).or_else(|| {
            if !strip_bot {
                return None;
            }
            strip_bot_suffix(key).and_then(|base| self.resolve(base))
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// `"Jane Doe (Leader)"` becomes `"Jane Doe"`. Input without a trailing
/// parenthetical is returned trimmed.
pub fn strip_parenthetical(key: &str) -> &str {
    let trimmed = key.trim();
    if !trimmed.ends_with(')') {
        return trimmed;
    }
    match trimmed.rfind('(') {
        Some(open) => trimmed[..open].trim_end(),
        None => trimmed,
    }
}

fn strip_bot_suffix(key: &str) -> Option<&str> {
    let trimmed = key.trim_end();
    let cut = trimmed.len().checked_sub("[bot]".len())?;
    let tail = trimmed.get(cut..)?;
    if tail.eq_ignore_ascii_case("[bot]") {
        Some(trimmed[..cut].trim_end())
    } else {
        None
    }
}
