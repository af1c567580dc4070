//! Extraction confidence scoring
//!
//! Weighted checklist over field presence and quality:
//!
//! | Factor | Weight |
//! |---|---|
//! | name | 0.10 |
//! | description longer than 50 chars | 0.15 |
//! | three or more traits | 0.15 |
//! | background longer than 100 chars | 0.10 |
//! | appearance, occupation | 0.10 each |
//! | age, gender, relationships, goals | 0.05 each |
//! | quirks, skills | 0.03 each |
//! | description longer than 200 chars | +0.05 |
//! | five or more traits | +0.05 |
//! | description shorter than 50 chars | -0.10 |
//! | fewer than two traits | -0.10 |
//!
//! The sum is clamped to `[0.2, 1.0]`.

/// Lowest confidence of a structured extraction
pub const CONFIDENCE_FLOOR: f32 = 0.2;

/// Inputs to the confidence checklist
#[derive(Debug, Clone, Default)]
pub struct ConfidenceFactors {
    pub has_name: bool,
    pub has_appearance: bool,
    pub has_age: bool,
    pub has_gender: bool,
    pub has_occupation: bool,
    pub has_relationships: bool,
    pub has_goals: bool,
    pub has_quirks: bool,
    pub has_skills: bool,
    /// Description length in characters
    pub description_len: usize,
    /// Background length in characters
    pub background_len: usize,
    pub trait_count: usize,
}

impl ConfidenceFactors {
    pub fn score(&self) -> f32 {
        let mut score = 0.0_f32;

        // Core fields
        if self.has_name {
            score += 0.1;
        }
        if self.description_len > 50 {
            score += 0.15;
        }
        if self.trait_count >= 3 {
            score += 0.15;
        }

        // Important fields
        if self.background_len > 100 {
            score += 0.1;
        }
        if self.has_appearance {
            score += 0.1;
        }
        if self.has_occupation {
            score += 0.1;
        }

        // Supporting fields
        let supporting = [
            self.has_age,
            self.has_gender,
            self.has_relationships,
            self.has_goals,
        ];
        score += supporting.iter().filter(|present| **present).count() as f32 * 0.05;

        if self.has_quirks {
            score += 0.03;
        }
        if self.has_skills {
            score += 0.03;
        }

        // Quality bonuses and penalties
        if self.description_len > 200 {
            score += 0.05;
        }
        if self.trait_count >= 5 {
            score += 0.05;
        }
        if self.description_len < 50 {
            score -= 0.1;
        }
        if self.trait_count < 2 {
            score -= 0.1;
        }

        score.clamp(CONFIDENCE_FLOOR, 1.0)
    }
}
