//! Doubt resolution engine
//!
//! `DoubtResolver` runs the answering policy in strict order, stopping at
//! the first step that produces an answer:
//!
//! 1. exam-mode gate (read from `system/settings`, fail-open)
//! 2. keyword override (substring match on the normalized question)
//! 3. canned answer (token-set score `>=` threshold)
//! 4. generative model (single call, errors become answers)
//!
//! `resolve` is total: every failure is turned into a `ResolutionResult`
//! whose answer text explains it.

pub mod catalog;
pub mod matcher;
pub mod predictor;

pub use catalog::{CannedAnswer, CannedCatalog, CannedMatch, KeywordOverride};
pub use matcher::{token_set_ratio, DEFAULT_THRESHOLD};
pub use predictor::predict;

use std::sync::Arc;
use std::time::Instant;

use crate::client::{CredentialSource, DocumentStore, GenerativeClient};
use crate::contracts::{IncomingQuestion, ResolutionPath, ResolutionResult};
use crate::settings::{read_exam_mode, ExamModeRead};
use crate::telemetry::DoubtMetrics;

pub const EXAM_MODE_MESSAGE: &str = "⚠️ Exam Mode is Active. 'Ask Manan' is temporarily disabled.";
pub const DEFAULT_MODEL_ID: &str = "gemini-2.0-flash";
pub const GENERATIVE_CITATIONS: [&str; 2] = ["General Knowledge", "Gemini Model"];

/// Tunables for the resolver
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverOptions {
    /// Model used for the generative fallback
    pub model_id: String,
    /// Minimum canned-answer score, inclusive
    pub match_threshold: u8,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            match_threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// The doubt answering policy
pub struct DoubtResolver {
    store: Arc<dyn DocumentStore>,
    generator: Arc<dyn GenerativeClient>,
    credentials: Arc<dyn CredentialSource>,
    catalog: Arc<CannedCatalog>,
    options: ResolverOptions,
    metrics: Option<DoubtMetrics>,
}

impl DoubtResolver {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        generator: Arc<dyn GenerativeClient>,
        credentials: Arc<dyn CredentialSource>,
        catalog: Arc<CannedCatalog>,
    ) -> Self {
        Self {
            store,
            generator,
            credentials,
            catalog,
            options: ResolverOptions::default(),
            metrics: None,
        }
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_metrics(mut self, metrics: DoubtMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn catalog(&self) -> &CannedCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Answer a question
    pub async fn resolve(&self, question: &IncomingQuestion) -> ResolutionResult {
        let start = Instant::now();
        let result = self.run_policy(question).await;
        let elapsed = start.elapsed();

        if let Some(metrics) = &self.metrics {
            metrics.record_resolution(result.path, elapsed.as_secs_f64());
            if let Some(score) = result.match_score {
                metrics.observe_match_score(score);
            }
        }

        tracing::info!(
            student_id = %question.student_id,
            path = %result.path,
            score = ?result.match_score,
            has_image = question.image_url.is_some(),
            duration_ms = elapsed.as_millis() as u64,
            "Resolved doubt"
        );

        result
    }

    async fn run_policy(&self, question: &IncomingQuestion) -> ResolutionResult {
        if self.exam_mode_active().await {
            return ResolutionResult::uncited(EXAM_MODE_MESSAGE, ResolutionPath::ExamMode);
        }

        let normalized = question.normalized();

        if let Some(hit) = self.catalog.keyword_override(&normalized) {
            return ResolutionResult::new(
                hit.body.clone(),
                hit.citations.clone(),
                ResolutionPath::Keyword,
            );
        }

        let best = self.catalog.best_match(&normalized);
        let best_score = best.map(|m| m.score);
        if let Some(m) = best.filter(|m| m.score >= self.options.match_threshold) {
            return ResolutionResult::new(
                m.answer.body.clone(),
                m.answer.citations.clone(),
                ResolutionPath::Canned,
            )
            .with_score(Some(m.score));
        }

        self.generate(question).await.with_score(best_score)
    }

    async fn exam_mode_active(&self) -> bool {
        let read = read_exam_mode(self.store.as_ref()).await;
        if let ExamModeRead::ReadFailed(reason) = &read {
            tracing::warn!(error = %reason, "Exam-mode read failed, treating as off");
            if let Some(metrics) = &self.metrics {
                metrics.record_flag_read_failure();
            }
        }
        read.is_blocking()
    }

    async fn generate(&self, question: &IncomingQuestion) -> ResolutionResult {
        let Some(api_key) = self.credentials.api_key() else {
            tracing::warn!(credential = self.credentials.name(), "No API credential configured");
            return ResolutionResult::uncited(
                format!(
                    "Error: {} not found in environment variables.",
                    self.credentials.name()
                ),
                ResolutionPath::MissingCredential,
            );
        };

        match self
            .generator
            .generate(&api_key, &self.options.model_id, &question.question_text)
            .await
        {
            Ok(text) => ResolutionResult::new(
                text,
                GENERATIVE_CITATIONS.iter().map(|c| c.to_string()).collect(),
                ResolutionPath::Generative,
            ),
            Err(e) => {
                tracing::error!(error = %e, model = %self.options.model_id, "Generative call failed");
                ResolutionResult::uncited(
                    format!("Error processing request: {}", e),
                    ResolutionPath::UpstreamFailure,
                )
            }
        }
    }
}
