use crate::types::metrics::{lenient_f64, null_as_default, pick_number, Dimension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub desc: String,
}

/// Cross-source agreement thresholds. Stored and echoed, never scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Triangulation {
    #[serde(default = "default_code_worklog")]
    pub code_worklog: f64,
    #[serde(default = "default_meeting_doc")]
    pub meeting_doc: f64,
    #[serde(default = "default_activity_dist")]
    pub activity_dist: f64,
}

fn default_code_worklog() -> f64 {
    80.0
}

fn default_meeting_doc() -> f64 {
    70.0
}

fn default_activity_dist() -> f64 {
    60.0
}

fn default_true() -> bool {
    true
}

fn default_peer_validation() -> String {
    "Statistical analysis".to_string()
}

impl Default for Triangulation {
    fn default() -> Self {
        Self {
            code_worklog: default_code_worklog(),
            meeting_doc: default_meeting_doc(),
            activity_dist: default_activity_dist(),
        }
    }
}

/// The editable rule-settings form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    #[serde(deserialize_with = "lenient_rules")]
    pub rules: Vec<Rule>,
    #[serde(default = "default_true", deserialize_with = "lenient_flag")]
    pub auto_recalc: bool,
    #[serde(default = "default_true", deserialize_with = "lenient_flag")]
    pub cross_verify: bool,
    #[serde(default, deserialize_with = "or_default")]
    pub triangulation: Triangulation,
    #[serde(
        default = "default_peer_validation",
        deserialize_with = "lenient_peer_validation"
    )]
    pub peer_validation: String,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            rules: rules_from_weights(&Weights::default()),
            auto_recalc: true,
            cross_verify: true,
            triangulation: Triangulation::default(),
            peer_validation: default_peer_validation(),
        }
    }
}

impl RuleSet {
    pub fn from_weights(weights: &Weights) -> Self {
        Self {
            rules: rules_from_weights(weights),
            ..RuleSet::default()
        }
    }

    pub fn total(&self) -> f64 {
        self.rules.iter().map(|rule| rule.value).sum()
    }

    /// Sets the named rule's weight, appending a new rule when no existing
    /// rule carries that name.
    pub fn set_rule(&mut self, name: &str, value: f64) {
        let wanted = name.trim();
        match self
            .rules
            .iter_mut()
            .find(|rule| rule.name.trim().eq_ignore_ascii_case(wanted))
        {
            Some(rule) => rule.value = value,
            None => self.rules.push(Rule {
                name: wanted.to_string(),
                value,
                desc: Dimension::from_name(wanted)
                    .map(|dim| dim.description().to_string())
                    .unwrap_or_default(),
            }),
        }
    }
}

fn rules_from_weights(weights: &Weights) -> Vec<Rule> {
    weights
        .iter()
        .map(|(dim, value)| Rule {
            name: dim.label().to_string(),
            value,
            desc: dim.description().to_string(),
        })
        .collect()
}

/// Entries without a string name are dropped; the rest keep their weight.
fn parse_rules(entries: Vec<Value>) -> Vec<Rule> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Rule>(entry) {
            Ok(rule) => Some(rule),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed rule entry");
                None
            }
        })
        .collect()
}

/// A `rules` key of any type selects the rule-settings form; anything but an
/// array reads as no rules.
fn lenient_rules<'de, D>(deserializer: D) -> Result<Vec<Rule>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| match value {
        Value::Array(entries) => parse_rules(entries),
        _ => Vec::new(),
    })
}

fn rule_list<'de, D>(deserializer: D) -> Result<Vec<Rule>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Value>::deserialize(deserializer).map(parse_rules)
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| value.as_bool().unwrap_or(true))
}

fn lenient_peer_validation<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| match value {
        Value::String(text) => text,
        _ => default_peer_validation(),
    })
}

fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Value::deserialize(deserializer).map(|value| serde_json::from_value(value).unwrap_or_default())
}

/// Every rule shape found in stored teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RulesInput {
    // Arrays must be tried first: untagged structs also accept sequences.
    List(#[serde(deserialize_with = "rule_list")] Vec<Rule>),
    Named(RuleSet),
    Flat(BTreeMap<String, Value>),
    Other(Value),
}

impl RulesInput {
    /// Translates the stored shape into a per-dimension weight array.
    /// Unrecognised names contribute nothing; an unusable shape falls back to
    /// `defaults`.
    pub fn weights(&self, defaults: &Weights) -> Weights {
        match self {
            RulesInput::Named(set) => Weights::from_pairs(
                set.rules.iter().map(|rule| (rule.name.as_str(), rule.value)),
            ),
            RulesInput::List(rules) => {
                Weights::from_pairs(rules.iter().map(|rule| (rule.name.as_str(), rule.value)))
            }
            RulesInput::Flat(map) => Weights::from_pairs(
                map.iter()
                    .map(|(name, value)| (name.as_str(), pick_number(value))),
            ),
            RulesInput::Other(_) => defaults.clone(),
        }
    }

    /// The rule-settings form for this input, materialising defaults for
    /// shapes that carry no flags.
    pub fn to_rule_set(&self, defaults: &Weights) -> RuleSet {
        match self {
            RulesInput::Named(set) => set.clone(),
            RulesInput::List(rules) => RuleSet {
                rules: rules.clone(),
                ..RuleSet::default()
            },
            RulesInput::Flat(_) | RulesInput::Other(_) => {
                RuleSet::from_weights(&self.weights(defaults))
            }
        }
    }
}

pub fn resolve_weights(rules: Option<&RulesInput>, defaults: &Weights) -> Weights {
    match rules {
        Some(input) => input.weights(defaults),
        None => defaults.clone(),
    }
}

/// Relative weight per dimension, indexed by [`Dimension::index`].
#[derive(Debug, Clone, PartialEq)]
pub struct Weights([f64; Dimension::COUNT]);

impl Default for Weights {
    fn default() -> Self {
        Self([12.0, 10.0, 7.0, 12.0, 10.0, 9.0, 5.0, 5.0, 7.0, 11.0])
    }
}

impl Weights {
    pub fn zero() -> Self {
        Self([0.0; Dimension::COUNT])
    }

    /// Builds weights from name/value pairs. Later duplicates overwrite
    /// earlier ones; unknown names are ignored.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let mut weights = Self::zero();
        for (name, value) in pairs {
            if let Some(dim) = Dimension::from_name(name) {
                weights.set(dim, value);
            }
        }
        weights
    }

    pub fn get(&self, dim: Dimension) -> f64 {
        self.0[dim.index()]
    }

    pub fn set(&mut self, dim: Dimension, value: f64) {
        self.0[dim.index()] = if value.is_finite() { value } else { 0.0 };
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL.into_iter().map(move |dim| (dim, self.get(dim)))
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.iter()
            .map(|(dim, value)| (dim.key().to_string(), value))
            .collect()
    }
}
