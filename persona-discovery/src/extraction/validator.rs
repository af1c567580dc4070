//! Draft validation
//!
//! Checks a draft before it is finalized. Only `Error` issues make a draft
//! invalid; warnings and info lower the quality score.
//!
//! Quality score (0-100): `100 - 20*errors - 10*warnings - 5*infos +
//! 20*completeness`, clamped.

use crate::extraction::CharacterDraft;
use serde::Serialize;

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 100;
const NAME_FORBIDDEN: [char; 7] = ['<', '>', '{', '}', '[', ']', '\\'];
const TRAITS_MIN: usize = 3;
const TRAITS_MAX: usize = 15;
const BACKGROUND_MIN_CHARS: usize = 50;
const BACKGROUND_MAX_CHARS: usize = 2000;
const PLACEHOLDER_PHRASES: [&str; 5] = [
    "lorem ipsum",
    "placeholder",
    "example",
    "insert here",
    "to be determined",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    fn new(field: &str, severity: Severity, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            severity,
            suggestion: None,
        }
    }

    fn suggest(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
    /// Quality score, 0-100
    pub score: f32,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// Error messages, for surfacing as a fatal validation failure
    pub fn error_messages(&self) -> Vec<String> {
        self.errors().map(|i| i.message.clone()).collect()
    }
}

/// Stateless draft validator
#[derive(Debug, Clone, Copy, Default)]
pub struct DraftValidator;

impl DraftValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, draft: &CharacterDraft) -> ValidationReport {
        let mut issues = Vec::new();
        issues.extend(validate_name(&draft.name));
        issues.extend(validate_personality(&draft.personality));
        issues.extend(validate_background(&draft.background));
        issues.extend(validate_quality(draft));

        let count = |severity: Severity| issues.iter().filter(|i| i.severity == severity).count();
        let errors = count(Severity::Error);
        let score = 100.0 - errors as f32 * 20.0
            - count(Severity::Warning) as f32 * 10.0
            - count(Severity::Info) as f32 * 5.0
            + completeness(draft) * 20.0;

        ValidationReport {
            valid: errors == 0,
            issues,
            score: score.clamp(0.0, 100.0),
        }
    }
}

fn validate_name(name: &str) -> Vec<ValidationIssue> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return vec![ValidationIssue::new("name", Severity::Error, "Character name is required")
            .suggest("Provide a unique name for your character")];
    }

    let mut issues = Vec::new();
    let len = trimmed.chars().count();
    if len < NAME_MIN_CHARS {
        issues.push(ValidationIssue::new(
            "name",
            Severity::Error,
            "Name must be at least 2 characters",
        ));
    }
    if len > NAME_MAX_CHARS {
        issues.push(ValidationIssue::new(
            "name",
            Severity::Error,
            "Name must be less than 100 characters",
        ));
    }
    if trimmed.contains(NAME_FORBIDDEN) {
        issues.push(ValidationIssue::new(
            "name",
            Severity::Error,
            "Name contains invalid characters",
        ));
    }
    issues
}

fn validate_personality(traits: &[String]) -> Vec<ValidationIssue> {
    let traits: Vec<String> = traits
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let mut issues = Vec::new();
    if traits.len() < TRAITS_MIN {
        issues.push(
            ValidationIssue::new(
                "personality",
                Severity::Warning,
                "At least 3 personality traits are recommended",
            )
            .suggest("Add more traits for a well-rounded character"),
        );
    }
    if traits.len() > TRAITS_MAX {
        issues.push(
            ValidationIssue::new(
                "personality",
                Severity::Warning,
                "Too many personality traits (max 15)",
            )
            .suggest("Focus on the most important traits"),
        );
    }

    let mut unique = traits.clone();
    unique.sort();
    unique.dedup();
    if unique.len() < traits.len() {
        issues.push(
            ValidationIssue::new(
                "personality",
                Severity::Info,
                "Duplicate personality traits detected",
            )
            .suggest("Remove duplicate traits"),
        );
    }
    issues
}

fn validate_background(background: &str) -> Vec<ValidationIssue> {
    let len = background.trim().chars().count();
    if len == 0 {
        return vec![ValidationIssue::new(
            "background",
            Severity::Warning,
            "Background story is recommended",
        )
        .suggest("Add a brief backstory to give the character depth")];
    }
    if len < BACKGROUND_MIN_CHARS {
        return vec![ValidationIssue::new(
            "background",
            Severity::Warning,
            "Background is too short (min 50 characters)",
        )];
    }
    if len > BACKGROUND_MAX_CHARS {
        return vec![ValidationIssue::new(
            "background",
            Severity::Warning,
            "Background is too long (max 2000 characters)",
        )];
    }
    Vec::new()
}

fn validate_quality(draft: &CharacterDraft) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if completeness(draft) < 0.5 {
        issues.push(
            ValidationIssue::new("overall", Severity::Warning, "Character profile is incomplete")
                .suggest("Fill in more fields for a better character"),
        );
    }

    if !draft.ai_generated_fields.is_empty() {
        let text = format!(
            "{} {} {}",
            draft.name,
            draft.background,
            draft.personality.join(" ")
        )
        .to_lowercase();
        if PLACEHOLDER_PHRASES.iter().any(|p| text.contains(p)) {
            issues.push(
                ValidationIssue::new(
                    "ai_generated",
                    Severity::Info,
                    "AI-generated content contains placeholder text",
                )
                .suggest("Review and edit AI-generated content"),
            );
        }
    }
    issues
}

/// Share of profile fields filled in, 0-1
fn completeness(draft: &CharacterDraft) -> f32 {
    let checks = [
        !draft.name.trim().is_empty(),
        draft.personality.len() >= TRAITS_MIN,
        draft.background.chars().count() >= BACKGROUND_MIN_CHARS,
        draft.appearance.is_some(),
        draft.age.is_some(),
        draft.gender.is_some(),
        draft.occupation.is_some(),
        draft.communication_style.is_some(),
    ];
    checks.iter().filter(|c| **c).count() as f32 / checks.len() as f32
}
