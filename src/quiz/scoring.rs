use std::collections::BTreeSet;

use indexmap::IndexMap;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::QuizError;

pub const REQUIRED_QUESTIONS: [&str; 5] = ["pants", "shirt", "shorts", "overlayer", "shoes"];

const FEMALE_CATEGORIES: &[&str] = &[
    "Bohemian",
    "Streetwear",
    "Classic",
    "Feminine",
    "Edgy",
    "Athleisure",
    "Vintage",
    "Glamorous",
    "Eclectic",
    "Minimalist",
];

// Not defined yet.
const MALE_CATEGORIES: &[&str] = &[];

/// Style categories offered to a quiz taker.
pub fn categories_for_gender(gender: &str) -> Result<&'static [&'static str], QuizError> {
    match gender {
        "female" => Ok(FEMALE_CATEGORIES),
        "male" => Ok(MALE_CATEGORIES),
        other => Err(QuizError::UnknownGender(other.to_string())),
    }
}

/// The style picked for one quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSelection {
    pub question: String,
    pub category: String,
}

impl QuizSelection {
    pub fn new(question: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            category: category.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleAssignment {
    pub primary: String,
    /// `None` only when every pick was the primary style.
    pub secondary: Option<String>,
    pub message: String,
    pub scores: IndexMap<String, u32>,
}

/// Turns five quiz picks into a primary and secondary style.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuizScoringEngine;

impl QuizScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Checks the question keys; an empty list means the submission is valid.
    pub fn validate(&self, selections: &[QuizSelection]) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = BTreeSet::new();
        let mut duplicated = BTreeSet::new();
        for selection in selections {
            if !seen.insert(selection.question.as_str()) {
                duplicated.insert(selection.question.as_str());
            }
        }

        let missing: Vec<&str> = REQUIRED_QUESTIONS
            .iter()
            .copied()
            .filter(|q| !seen.contains(q))
            .collect();
        if !missing.is_empty() {
            errors.push(format!("Missing selections for: {}", missing.join(", ")));
        }

        let unexpected: Vec<&str> = seen
            .iter()
            .copied()
            .filter(|q| !REQUIRED_QUESTIONS.contains(q))
            .collect();
        if !unexpected.is_empty() {
            errors.push(format!("Unexpected selections: {}", unexpected.join(", ")));
        }

        if !duplicated.is_empty() {
            let duplicated: Vec<&str> = duplicated.into_iter().collect();
            errors.push(format!("Duplicate selections for: {}", duplicated.join(", ")));
        }

        errors
    }

    pub fn score(&self, selections: &[QuizSelection]) -> Result<StyleAssignment, QuizError> {
        self.score_with_rng(selections, &mut rand::rng())
    }

    /// Same as [`score`](Self::score) with a caller supplied tie breaker.
    pub fn score_with_rng<R: Rng + ?Sized>(
        &self,
        selections: &[QuizSelection],
        rng: &mut R,
    ) -> Result<StyleAssignment, QuizError> {
        if selections.len() != REQUIRED_QUESTIONS.len() {
            return Err(QuizError::SelectionCount {
                expected: REQUIRED_QUESTIONS.len(),
                actual: selections.len(),
            });
        }

        let errors = self.validate(selections);
        if !errors.is_empty() {
            return Err(QuizError::Validation(errors));
        }

        let mut scores: IndexMap<String, u32> = IndexMap::new();
        for selection in selections {
            *scores.entry(selection.category.clone()).or_insert(0) += 1;
        }

        // Stable sort keeps first-picked order among equal counts.
        let mut ranked: Vec<(&str, u32)> = scores.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let (primary, primary_count) = ranked[0];
        let secondary = match ranked.get(1) {
            Some(&(_, second_count)) if (primary_count as usize) < selections.len() => {
                let tied: Vec<&str> = ranked[1..]
                    .iter()
                    .filter(|(_, count)| *count == second_count)
                    .map(|(name, _)| *name)
                    .collect();
                tied.choose(rng).map(|name| name.to_string())
            }
            _ => None,
        };

        let primary = primary.to_string();
        let message = style_message(&primary, secondary.as_deref());
        tracing::info!(
            "Quiz scored: primary={}, secondary={:?}, scores={:?}",
            primary,
            secondary,
            scores
        );

        Ok(StyleAssignment {
            primary,
            secondary,
            message,
            scores,
        })
    }
}

pub fn style_message(primary: &str, secondary: Option<&str>) -> String {
    match secondary {
        Some(secondary) => format!("{primary} with a hint of {secondary}"),
        None => format!("Pure {primary}"),
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn picks(categories: [&str; 5]) -> Vec<QuizSelection> {
        REQUIRED_QUESTIONS
            .iter()
            .zip(categories)
            .map(|(q, c)| QuizSelection::new(*q, c))
            .collect()
    }

    #[test]
    fn test_unanimous_has_no_secondary() {
        let result = QuizScoringEngine::new()
            .score(&picks(["Edgy"; 5]))
            .unwrap();
        assert_eq!(result.primary, "Edgy");
        assert_eq!(result.secondary, None);
        assert_eq!(result.message, "Pure Edgy");
        assert_eq!(result.scores["Edgy"], 5);
    }

    #[test]
    fn test_clear_secondary_is_deterministic() {
        let engine = QuizScoringEngine::new();
        for seed in 0..10 {
            let result = engine
                .score_with_rng(
                    &picks(["Classic", "Classic", "Classic", "Vintage", "Vintage"]),
                    &mut StdRng::seed_from_u64(seed),
                )
                .unwrap();
            assert_eq!(result.primary, "Classic");
            assert_eq!(result.secondary.as_deref(), Some("Vintage"));
            assert_eq!(result.message, "Classic with a hint of Vintage");
        }
    }

    #[test]
    fn test_primary_tie_keeps_first_picked() {
        let result = QuizScoringEngine::new()
            .score(&picks(["Boho", "Edgy", "Edgy", "Boho", "Glam"]))
            .unwrap();
        assert_eq!(result.primary, "Boho");
        assert_eq!(result.secondary.as_deref(), Some("Edgy"));
    }

    #[test]
    fn test_secondary_tie_is_random_among_tier() {
        let selection = picks(["Classic", "Classic", "Edgy", "Vintage", "Glam"]);
        let mut rng = StdRng::seed_from_u64(7);
        let engine = QuizScoringEngine::new();
        let mut seen = BTreeSet::new();
        for _ in 0..50 {
            let result = engine.score_with_rng(&selection, &mut rng).unwrap();
            let secondary = result.secondary.unwrap();
            assert!(["Edgy", "Vintage", "Glam"].contains(&secondary.as_str()));
            seen.insert(secondary);
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn test_wrong_selection_count() {
        let mut selection = picks(["Classic"; 5]);
        selection.pop();
        assert_eq!(
            QuizScoringEngine::new().score(&selection),
            Err(QuizError::SelectionCount { expected: 5, actual: 4 })
        );
    }

    #[test]
    fn test_validation_reports_missing_unexpected_and_duplicates() {
        let selection = vec![
            QuizSelection::new("pants", "Classic"),
            QuizSelection::new("pants", "Edgy"),
            QuizSelection::new("shirt", "Classic"),
            QuizSelection::new("hat", "Classic"),
            QuizSelection::new("shoes", "Classic"),
        ];
        let Err(QuizError::Validation(errors)) = QuizScoringEngine::new().score(&selection) else {
            panic!("expected a validation error");
        };
        assert_eq!(
            errors,
            vec![
                "Missing selections for: shorts, overlayer",
                "Unexpected selections: hat",
                "Duplicate selections for: pants",
            ]
        );
    }

    #[test]
    fn test_categories_for_gender() {
        assert_eq!(categories_for_gender("female").unwrap().len(), 10);
        assert!(categories_for_gender("male").unwrap().is_empty());
        assert_eq!(
            categories_for_gender("other"),
            Err(QuizError::UnknownGender("other".to_string()))
        );
    }
}
