use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Analysis Error: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("Quiz Error: {0}")]
    Quiz(#[from] QuizError),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization Error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Image / annotation analysis errors
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("{detector} needs at least {min}x{min} pixels, got {width}x{height}")]
    InsufficientData {
        detector: &'static str,
        min: u32,
        width: u32,
        height: u32,
    },
    #[error("{0} produced no usable measurement")]
    EmptySignal(&'static str),
    #[error("Analysis timed out")]
    Timeout,
    #[error("Analysis worker failed: {0}")]
    Worker(String),
    #[error("Annotation provider failed: {0}")]
    Annotations(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum QuizError {
    #[error("Expected {expected} selections, got {actual}")]
    SelectionCount { expected: usize, actual: usize },
    #[error("Invalid quiz submission: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("Invalid gender: {0}")]
    UnknownGender(String),
}
