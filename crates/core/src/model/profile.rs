use serde::{Deserialize, Serialize};

/// Structured candidate profile produced by the external resume-parsing
/// step. The engine never inspects it beyond handing it to the oracle, but
/// it is persisted with the session so question generation can resume after
/// a restart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_years: Option<u32>,
    #[serde(default)]
    pub projects: Vec<ProjectHighlight>,
}

/// One project entry extracted from the resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectHighlight {
    pub name: String,
    pub tech: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_deserializes_with_missing_optional_fields() {
        let profile: CandidateProfile =
            serde_json::from_str(r#"{"name": "Ada Lovelace"}"#).unwrap();
        assert_eq!(profile.name, "Ada Lovelace");
        assert!(profile.skills.is_empty());
        assert!(profile.experience_years.is_none());
        assert!(profile.projects.is_empty());
    }

    #[test]
    fn profile_roundtrips_through_json() {
        let profile = CandidateProfile {
            name: "Grace Hopper".to_string(),
            skills: vec!["Rust".to_string(), "SQL".to_string()],
            experience_years: Some(4),
            projects: vec![ProjectHighlight {
                name: "compiler".to_string(),
                tech: "Rust".to_string(),
                description: "A toy compiler".to_string(),
            }],
        };
        let json = serde_json::to_string(&profile).unwrap();
        let back: CandidateProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(profile, back);
    }
}
