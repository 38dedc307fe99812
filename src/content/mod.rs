//! Portfolio content.
//!
//! The site owner's profile (hero links, about text, skills, projects,
//! experience, contact details) and the chatbot's persona live in one YAML
//! document. A copy is compiled into the binary; deployments can point
//! `chat.profile_path` at their own file instead.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Profile compiled into the binary.
pub const DEFAULT_PROFILE_YAML: &str = include_str!("profile.yaml");

/// Errors loading a profile document.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The file could not be read.
    #[error("failed to read profile {path}: {source}")]
    Io {
        /// File that was requested.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The YAML did not match the expected shape.
    #[error("invalid profile: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A required field was blank.
    #[error("invalid profile: {0} must not be empty")]
    Missing(&'static str),
}

/// Complete site profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Who the site is about.
    pub owner: Owner,
    /// About-section paragraphs.
    #[serde(default)]
    pub about: Vec<String>,
    /// Optional closing quote for the about section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    /// Skill cards.
    #[serde(default)]
    pub skills: Vec<Skill>,
    /// Project cards.
    #[serde(default)]
    pub projects: Vec<Project>,
    /// Experience timeline, newest first.
    #[serde(default)]
    pub experience: Vec<Experience>,
    /// Chatbot persona.
    pub assistant: AssistantProfile,
}

/// The site owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    /// Full name.
    pub name: String,
    /// Name the assistant uses.
    pub short_name: String,
    /// Hero heading.
    pub headline: String,
    /// Hero sub-heading.
    #[serde(default)]
    pub tagline: String,
    /// City, country.
    #[serde(default)]
    pub location: String,
    /// Public contact address.
    pub email: String,
    /// Public phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Social links.
    #[serde(default)]
    pub links: Links,
}

/// Social and document links shown in the hero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Links {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
}

/// One skill card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub description: String,
}

/// One project card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tech: Vec<String>,
    /// Card image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Source repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    /// Live deployment or package page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live: Option<String>,
}

/// Kind of experience entry, used to pick the timeline accent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceKind {
    Work,
    Achievement,
    Milestone,
}

impl ExperienceKind {
    /// CSS modifier class.
    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Work => "timeline-work",
            Self::Achievement => "timeline-achievement",
            Self::Milestone => "timeline-milestone",
        }
    }
}

/// One timeline entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub role: String,
    pub company: String,
    pub duration: String,
    pub kind: ExperienceKind,
    pub description: String,
    #[serde(default)]
    pub achievements: Vec<String>,
}

/// Chatbot persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantProfile {
    /// Chat window title.
    pub title: String,
    /// Synthetic first message of every conversation.
    pub greeting: String,
    /// Instruction sent to the model with every request.
    #[serde(skip_serializing)]
    pub system_prompt: String,
}

impl Profile {
    /// Parse a profile from YAML and check required fields.
    pub fn from_yaml(yaml: &str) -> Result<Self, ContentError> {
        let profile: Self = serde_yaml::from_str(yaml)?;
        profile.validate()?;
        Ok(profile)
    }

    /// The profile compiled into the binary.
    pub fn builtin() -> Result<Self, ContentError> {
        Self::from_yaml(DEFAULT_PROFILE_YAML)
    }

    /// Load from `path`, or the built-in profile when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ContentError> {
        let Some(path) = path else {
            return Self::builtin();
        };
        let yaml = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    fn validate(&self) -> Result<(), ContentError> {
        if self.owner.name.trim().is_empty() {
            return Err(ContentError::Missing("owner.name"));
        }
        if self.assistant.greeting.trim().is_empty() {
            return Err(ContentError::Missing("assistant.greeting"));
        }
        if self.assistant.system_prompt.trim().is_empty() {
            return Err(ContentError::Missing("assistant.system_prompt"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profile_parses() {
        let profile = Profile::builtin().unwrap();
        assert_eq!(profile.owner.short_name, "Jay");
        assert_eq!(profile.projects.len(), 3);
        assert_eq!(profile.experience[1].kind, ExperienceKind::Achievement);
        assert!(profile.assistant.system_prompt.contains("Rules:"));
        assert!(profile.assistant.greeting.starts_with("Hello!"));
    }

    #[test]
    fn test_system_prompt_not_serialized() {
        let profile = Profile::builtin().unwrap();
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json["assistant"].get("system_prompt").is_none());
        assert_eq!(json["assistant"]["title"], "Jay's Assistant");
    }

    #[test]
    fn test_blank_prompt_rejected() {
        let yaml = r#"
owner: { name: A, short_name: A, headline: Dev, email: a@example.com }
assistant: { title: Bot, greeting: Hi, system_prompt: "  " }
"#;
        assert!(matches!(
            Profile::from_yaml(yaml),
            Err(ContentError::Missing("assistant.system_prompt"))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.yaml");
        std::fs::write(
            &path,
            r"
owner: { name: Ada, short_name: Ada, headline: Engineer, email: ada@example.com }
assistant: { title: Ada's Bot, greeting: Hello, system_prompt: You describe Ada. }
",
        )
        .unwrap();

        let profile = Profile::load(Some(&path)).unwrap();
        assert_eq!(profile.owner.name, "Ada");
        assert!(profile.projects.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = Profile::load(Some(Path::new("/nonexistent/profile.yaml"))).unwrap_err();
        assert!(matches!(err, ContentError::Io { .. }));
    }
}
