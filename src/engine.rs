use std::sync::Arc;
use std::time::Duration;

use crate::analysis::annotations::AnnotationProvider;
use crate::analysis::batch::BatchAnalyzer;
use crate::analysis::orchestrator::{AnalysisRequest, GarmentAnalysis, GarmentAnalyzer};
use crate::config::Settings;
use crate::error::{AppError, QuizError};
use crate::matching::{ClosetItem, OutfitMatchResult, OutfitMatchingService, OutfitRecommendation, Weather};
use crate::quiz::{
    QuizScoringEngine, QuizSelection, SlotSelection, StyleAssignment, StyleCategory, WeightedAssignment,
    WeightedStyleAssignment,
};

/// Every service of the crate, built once and shared read-only.
#[derive(Clone)]
pub struct Engine {
    analyzer: Arc<GarmentAnalyzer>,
    batch: BatchAnalyzer,
    matching: OutfitMatchingService,
    quiz: QuizScoringEngine,
    weighted: Arc<WeightedStyleAssignment>,
}

impl Engine {
    pub fn builder(settings: Settings) -> EngineBuilder {
        EngineBuilder::new(settings)
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        EngineBuilder::new(settings.clone()).build()
    }

    pub fn analyzer(&self) -> &GarmentAnalyzer {
        &self.analyzer
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> GarmentAnalysis {
        let mut results = self.batch.analyze_all(vec![request]).await;
        match results.pop() {
            Some(analysis) => analysis,
            None => GarmentAnalysis::degraded(uuid::Uuid::nil(), "Batch returned no result"),
        }
    }

    /// Fetches annotations for `image` first, then analyzes it.
    pub async fn analyze_with_provider(
        &self,
        image: Vec<u8>,
        provider: &dyn AnnotationProvider,
    ) -> Result<GarmentAnalysis, AppError> {
        let annotations = provider.annotate(&image).await?;
        Ok(self
            .analyze(AnalysisRequest::new(image).with_annotations(annotations))
            .await)
    }

    pub async fn analyze_batch(&self, requests: Vec<AnalysisRequest>) -> Vec<GarmentAnalysis> {
        self.batch.analyze_all(requests).await
    }

    pub fn match_outfit(
        &self,
        recommendation: &OutfitRecommendation,
        wardrobe: &[ClosetItem],
        weather: Option<Weather>,
        style_preference: Option<&str>,
    ) -> OutfitMatchResult {
        self.matching
            .match_outfit(recommendation, wardrobe, weather, style_preference)
    }

    pub fn score_quiz(&self, selections: &[QuizSelection]) -> Result<StyleAssignment, QuizError> {
        self.quiz.score(selections)
    }

    pub fn assign_style(&self, categories: &[StyleCategory], selections: &[SlotSelection]) -> WeightedAssignment {
        self.weighted.assign(categories, selections)
    }
}

pub struct EngineBuilder {
    settings: Settings,
    weights: Vec<(String, f32)>,
}

impl EngineBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            weights: Vec::new(),
        }
    }

    // Overrides the configured worker count.
    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.settings.analysis.max_concurrency = max_concurrency;
        self
    }

    // Overrides the configured per-image timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.analysis.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn min_match_score(mut self, min_match_score: f32) -> Self {
        self.settings.matching.min_match_score = min_match_score;
        self
    }

    pub fn slot_weight(mut self, slot: impl Into<String>, weight: f32) -> Self {
        self.weights.push((slot.into(), weight));
        self
    }

    pub fn build(self) -> Result<Engine, AppError> {
        self.settings.validate()?;
        let analysis = &self.settings.analysis;

        let analyzer = Arc::new(GarmentAnalyzer::new(analysis));
        let batch = BatchAnalyzer::new(analyzer.clone(), analysis.max_concurrency, analysis.timeout());
        tracing::info!(
            "Engine ready: resolution {}, {} workers, {}ms timeout",
            analysis.resolution,
            analysis.max_concurrency,
            analysis.timeout_ms
        );

        Ok(Engine {
            analyzer,
            batch,
            matching: OutfitMatchingService::from_settings(&self.settings.matching),
            quiz: QuizScoringEngine::new(),
            weighted: Arc::new(WeightedStyleAssignment::new().with_weights(self.weights)),
        })
    }
}
