//! Core data types shared by the search pipeline.

use serde::{Deserialize, Deserializer, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Normalize a query or skill label for comparison: NFKC, trim, lowercase.
pub fn normalize_label(raw: &str) -> String {
    raw.nfkc().collect::<String>().trim().to_lowercase()
}

/// Stable candidate identifier. Profiles store ids as either strings or
/// integers; both are kept as their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

impl CandidateId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CandidateId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for CandidateId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CandidateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        })
    }
}

/// A skill entry as it arrives from the profile store.
///
/// Older rows store plain strings, newer ones store objects with a `name`
/// field. Anything else is kept verbatim as `Unrecognized` and never matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Skill {
    Plain(String),
    Named { name: String },
    Unrecognized(serde_json::Value),
}

impl Skill {
    pub fn plain(label: impl Into<String>) -> Self {
        Self::Plain(label.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named { name: name.into() }
    }

    /// The raw label, if this entry has one.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Plain(s) => Some(s),
            Self::Named { name } => Some(name),
            Self::Unrecognized(_) => None,
        }
    }

    /// Normalized label; `None` for unrecognized shapes and blank labels.
    pub fn normalized(&self) -> Option<String> {
        self.label()
            .map(normalize_label)
            .filter(|label| !label.is_empty())
    }
}

impl From<&str> for Skill {
    fn from(s: &str) -> Self {
        Self::plain(s)
    }
}

/// A searchable profile with its skill labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    #[serde(default, alias = "full_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skills: Vec<Skill>,
}

impl Candidate {
    pub fn new<I, S>(id: impl Into<CandidateId>, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Skill>,
    {
        Self {
            id: id.into(),
            name: None,
            skills: skills.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display title: the profile name, falling back to the id.
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Skill>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Skill>>::deserialize(deserializer)?.unwrap_or_default())
}

/// How a candidate's best skill matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// The skill label contains the query.
    Partial,
    /// The skill label equals the query.
    Exact,
}

impl MatchKind {
    pub fn weight(self) -> f32 {
        match self {
            Self::Exact => 1.0,
            Self::Partial => 0.5,
        }
    }
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Partial => write!(f, "partial"),
        }
    }
}

/// One ranked candidate in a result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch {
    pub candidate: Candidate,
    pub score: f32,
    pub kind: MatchKind,
    /// Normalized labels of the skills that matched, in candidate order.
    pub matched_skills: Vec<String>,
}

/// "Did you mean" hint offered when nothing matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub term: String,
    /// Normalized similarity in `0.0..=1.0`.
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchResult {
    /// Normalized query the result was computed for.
    pub query: String,
    pub matches: Vec<RankedMatch>,
    pub suggestion: Option<Suggestion>,
}

impl MatchResult {
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  React "), "react");
        assert_eq!(normalize_label("GUITAR"), "guitar");
        // full-width letters fold under NFKC
        assert_eq!(normalize_label("Ｊａｖａ"), "java");
        assert_eq!(normalize_label("   "), "");
    }

    #[test]
    fn test_skill_shapes_deserialize() {
        let skills: Vec<Skill> =
            serde_json::from_str(r#"["Guitar", {"name": "Piano", "level": 3}, 42, {"title": "x"}]"#)
                .unwrap();
        assert_eq!(skills[0], Skill::plain("Guitar"));
        assert_eq!(skills[1], Skill::named("Piano"));
        assert!(matches!(skills[2], Skill::Unrecognized(_)));
        assert!(matches!(skills[3], Skill::Unrecognized(_)));
    }

    #[test]
    fn test_skill_normalized() {
        assert_eq!(Skill::plain(" Python ").normalized().as_deref(), Some("python"));
        assert_eq!(Skill::named("Yoga").normalized().as_deref(), Some("yoga"));
        assert_eq!(Skill::plain("  ").normalized(), None);
        assert_eq!(Skill::Unrecognized(serde_json::json!(7)).normalized(), None);
    }

    #[test]
    fn test_candidate_ids_accept_numbers() {
        let c: Candidate = serde_json::from_str(r#"{"id": 7, "skills": ["Cooking"]}"#).unwrap();
        assert_eq!(c.id.as_str(), "7");

        let c: Candidate =
            serde_json::from_str(r#"{"id": "u-1", "full_name": "Ada", "skills": null}"#).unwrap();
        assert_eq!(c.id.as_str(), "u-1");
        assert_eq!(c.title(), "Ada");
        assert!(c.skills.is_empty());
    }

    #[test]
    fn test_candidate_ids_beyond_i64_and_floats() {
        let c: Candidate =
            serde_json::from_str(r#"{"id": 18446744073709551615, "skills": []}"#).unwrap();
        assert_eq!(c.id.as_str(), "18446744073709551615");

        let c: Candidate = serde_json::from_str(r#"{"id": 1.5, "skills": []}"#).unwrap();
        assert_eq!(c.id.as_str(), "1.5");
    }

    #[test]
    fn test_candidate_missing_skills_defaults_empty() {
        let c: Candidate = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert!(c.skills.is_empty());
        assert_eq!(c.title(), "1");
    }

    #[test]
    fn test_match_kind_ordering() {
        assert!(MatchKind::Exact > MatchKind::Partial);
        assert!(MatchKind::Exact.weight() > MatchKind::Partial.weight());
        assert_eq!(MatchKind::Exact.to_string(), "exact");
    }
}
