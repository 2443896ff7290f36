pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod matching;
pub mod quiz;

pub use config::Settings;
pub use engine::{Engine, EngineBuilder};
pub use error::{AnalysisError, AppError, QuizError};
