use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tower::limit::ConcurrencyLimit;
use tower::timeout::error::Elapsed;
use tower::timeout::Timeout;
use tower::{BoxError, ServiceBuilder, ServiceExt};

use super::orchestrator::{AnalysisRequest, AnalysisService, GarmentAnalysis, GarmentAnalyzer};
use crate::error::AnalysisError;

/// Analyzes many images with bounded concurrency and a per-image timeout.
/// A failed item comes back degraded; the rest of the batch is unaffected.
///
/// A timed-out image leaves the queue at once but keeps its worker until
/// the blocking job finishes, so at most `max_concurrency` analyses ever
/// run at the same time.
#[derive(Clone)]
pub struct BatchAnalyzer {
    service: ConcurrencyLimit<Timeout<AnalysisService>>,
    workers: Arc<Semaphore>,
}

impl BatchAnalyzer {
    pub fn new(analyzer: Arc<GarmentAnalyzer>, max_concurrency: usize, timeout: Duration) -> Self {
        Self::with_workers(
            analyzer,
            max_concurrency,
            timeout,
            Arc::new(Semaphore::new(max_concurrency)),
        )
    }

    fn with_workers(
        analyzer: Arc<GarmentAnalyzer>,
        max_concurrency: usize,
        timeout: Duration,
        workers: Arc<Semaphore>,
    ) -> Self {
        let service = ServiceBuilder::new()
            .concurrency_limit(max_concurrency)
            .timeout(timeout)
            .service(AnalysisService::new(analyzer).with_workers(workers.clone()));
        Self { service, workers }
    }

    /// Workers not held by a running analysis.
    pub fn idle_workers(&self) -> usize {
        self.workers.available_permits()
    }

    /// Results are returned in request order.
    pub async fn analyze_all(&self, requests: Vec<AnalysisRequest>) -> Vec<GarmentAnalysis> {
        let total = requests.len();
        let pending = requests.into_iter().map(|request| {
            let id = request.id;
            let service = self.service.clone();
            async move {
                match service.oneshot(request).await {
                    Ok(analysis) => analysis,
                    Err(e) => {
                        let reason = describe_failure(e);
                        tracing::warn!("Analysis {} degraded: {}", id, reason);
                        GarmentAnalysis::degraded(id, reason)
                    }
                }
            }
        });

        let results = join_all(pending).await;
        let degraded = results.iter().filter(|r| r.is_degraded()).count();
        tracing::info!(
            "Batch finished: {} analyzed, {} degraded, {} idle workers",
            total,
            degraded,
            self.idle_workers()
        );
        results
    }
}

fn describe_failure(error: BoxError) -> String {
    if error.is::<Elapsed>() {
        AnalysisError::Timeout.to_string()
    } else {
        error.to_string()
    }
}
