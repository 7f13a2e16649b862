use crate::types::metrics::null_as_default;
use crate::types::rules::RulesInput;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoRef {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub aliases: Vec<String>,
}

impl Student {
    /// Every identity string this student may be referred to by, in
    /// registration order: name, email, GitHub handle, then aliases.
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.email.as_deref())
            .chain(self.github.as_deref())
            .chain(self.aliases.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default)]
    pub repo: Option<RepoRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub students: Vec<Student>,
    #[serde(default)]
    pub rules: Option<RulesInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Payload accepted by team setup.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTeam {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default)]
    pub repo: Option<RepoRef>,
    #[serde(default)]
    pub students: Vec<Student>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_team_with_optional_fields_missing() {
        let team: Team = serde_json::from_str(
            r#"{
                "id": "team_1",
                "name": "Falcons",
                "code": "COS40005",
                "students": [{"name": "Alice", "email": "a@x.edu"}]
            }"#,
        )
        .expect("team should parse");

        assert!(team.repo.is_none());
        assert!(team.rules.is_none());
        assert_eq!(team.students[0].email.as_deref(), Some("a@x.edu"));
        assert!(team.students[0].aliases.is_empty());
    }

    #[test]
    fn null_aliases_and_code_read_as_empty() {
        let teams: Vec<Team> = serde_json::from_str(
            r#"[
                {
                    "id": "team_1",
                    "name": "Falcons",
                    "code": null,
                    "students": [{"name": "Alice", "aliases": null}]
                },
                {"id": "team_2", "name": "Hawks", "code": "COS30001", "students": null}
            ]"#,
        )
        .expect("teams with nulls should parse");

        assert_eq!(teams[0].code, "");
        assert!(teams[0].students[0].aliases.is_empty());
        assert_eq!(teams[0].students[0].identities().collect::<Vec<_>>(), vec!["Alice"]);
        assert!(teams[1].students.is_empty());
    }

    #[test]
    fn identities_follow_registration_order() {
        let student = Student {
            name: "Jane Doe".to_string(),
            email: Some("jane@x.edu".to_string()),
            github: Some("jdoe".to_string()),
            aliases: vec!["JD".to_string()],
        };
        let ids: Vec<&str> = student.identities().collect();
        assert_eq!(ids, vec!["Jane Doe", "jane@x.edu", "jdoe", "JD"]);
    }
}
