// Garment feature extraction: pixel detectors, annotation parsing and
// aggregation into a `FeatureSet`.

pub mod aggregator;
pub mod annotations;
pub mod batch;
pub mod brand;
pub mod color;
pub mod core;
pub mod orchestrator;
pub mod pattern;
pub mod raster;
pub mod spectrum;
pub mod style;
pub mod texture;

pub use aggregator::{FeatureAggregator, FeatureSet, FeatureSource};
pub use annotations::{AnnotationProvider, ColorSample, StaticAnnotations, VisionAnnotations};
pub use batch::BatchAnalyzer;
pub use color::ColorClassifier;
pub use core::{AnalysisContext, Signal};
pub use orchestrator::{AnalysisRequest, AnalysisService, GarmentAnalysis, GarmentAnalyzer};
pub use pattern::{Pattern, PatternDetector, PatternResult};
pub use style::{StyleFeatureAnalyzer, StyleResult};
pub use texture::{Texture, TextureAnalyzer, TextureResult};
