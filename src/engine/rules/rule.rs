use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CookieSyncError;

/// A unique identifier for a rule, represented as a UUID.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleId(Uuid);

impl RuleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RuleId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for RuleId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A mapping from an origin address (where cookies are read) to a target
/// address (where they are written).
///
/// An empty `origin` is allowed: the rule exists but is skipped by sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Older persisted collections name this field `key`.
    #[serde(alias = "key")]
    pub id: RuleId,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub target: String,
}

impl Rule {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            id: RuleId::new(),
            origin: String::new(),
            target: target.into(),
        }
    }

    /// Rules without an origin never take part in a sync run.
    pub fn is_inert(&self) -> bool {
        self.origin.is_empty()
    }
}

/// Editable fields of a [`Rule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    Origin,
    Target,
}

impl RuleField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Origin => "origin",
            Self::Target => "target",
        }
    }
}

impl FromStr for RuleField {
    type Err = CookieSyncError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "origin" => Ok(Self::Origin),
            "target" => Ok(Self::Target),
            other => Err(CookieSyncError::UnknownField(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rule_is_inert_with_given_target() {
        let rule = Rule::new("http://localhost");
        assert!(rule.is_inert());
        assert_eq!(rule.target, "http://localhost");
    }

    #[test]
    fn rule_ids_are_distinct() {
        assert_ne!(RuleId::new(), RuleId::new());
    }

    #[test]
    fn rule_serializes_as_flat_record() {
        let rule = Rule {
            id: "3b241101-e2bb-4255-8caf-4136c566a962".parse().unwrap(),
            origin: "https://a.test".into(),
            target: "http://localhost".into(),
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "3b241101-e2bb-4255-8caf-4136c566a962",
                "origin": "https://a.test",
                "target": "http://localhost",
            })
        );
    }

    #[test]
    fn legacy_key_field_is_accepted() {
        let rule: Rule = serde_json::from_value(serde_json::json!({
            "key": "3b241101-e2bb-4255-8caf-4136c566a962",
            "origin": "",
            "target": "http://localhost",
        }))
        .unwrap();
        assert_eq!(rule.id.to_string(), "3b241101-e2bb-4255-8caf-4136c566a962");
    }

    #[test]
    fn field_parses_case_insensitively() {
        assert_eq!("Target".parse::<RuleField>().unwrap(), RuleField::Target);
        assert_eq!(" origin ".parse::<RuleField>().unwrap(), RuleField::Origin);
        assert!(matches!(
            "control".parse::<RuleField>(),
            Err(CookieSyncError::UnknownField(ref field)) if field == "control"
        ));
    }
}
