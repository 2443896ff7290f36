pub mod scoring;
pub mod weighted;

pub use scoring::{QuizScoringEngine, QuizSelection, StyleAssignment};
pub use weighted::{SlotSelection, StyleCategory, WeightedAssignment, WeightedStyleAssignment};
