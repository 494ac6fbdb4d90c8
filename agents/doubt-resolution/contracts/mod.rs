//! Doubt Resolution Agent Contracts
//!
//! Wire types shared by the HTTP handler, the CLI and the resolver.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inbound body of `POST /solve-doubt`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingQuestion {
    /// Student asking the question
    pub student_id: String,

    /// Free-text question, forwarded verbatim to the model
    pub question_text: String,

    /// Optional image attachment (accepted, not interpreted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl IncomingQuestion {
    /// Create a text-only question
    pub fn new(student_id: impl Into<String>, question_text: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            question_text: question_text.into(),
            image_url: None,
        }
    }

    /// Attach an image URL
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Lowercased, trimmed question text used by the keyword and fuzzy steps
    pub fn normalized(&self) -> String {
        self.question_text.trim().to_lowercase()
    }
}

/// Outbound body of `POST /solve-doubt`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubtAnswer {
    pub answer: String,
    pub citations: Vec<String>,
}

/// Which step of the pipeline produced an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPath {
    ExamMode,
    Keyword,
    Canned,
    Generative,
    MissingCredential,
    UpstreamFailure,
}

impl ResolutionPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPath::ExamMode => "exam_mode",
            ResolutionPath::Keyword => "keyword",
            ResolutionPath::Canned => "canned",
            ResolutionPath::Generative => "generative",
            ResolutionPath::MissingCredential => "missing_credential",
            ResolutionPath::UpstreamFailure => "upstream_failure",
        }
    }

    /// Paths whose answer text describes a failure
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ResolutionPath::MissingCredential | ResolutionPath::UpstreamFailure
        )
    }
}

impl fmt::Display for ResolutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running the resolution policy
///
/// The path and score are kept for logs and metrics; only the answer and
/// citations go on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionResult {
    pub answer_text: String,
    pub citations: Vec<String>,
    pub path: ResolutionPath,
    /// Best fuzzy score, when the fuzzy step ran
    pub match_score: Option<u8>,
}

impl ResolutionResult {
    pub fn new(answer_text: impl Into<String>, citations: Vec<String>, path: ResolutionPath) -> Self {
        Self {
            answer_text: answer_text.into(),
            citations,
            path,
            match_score: None,
        }
    }

    /// Answer with no citations
    pub fn uncited(answer_text: impl Into<String>, path: ResolutionPath) -> Self {
        Self::new(answer_text, Vec::new(), path)
    }

    pub fn with_score(mut self, score: Option<u8>) -> Self {
        self.match_score = score;
        self
    }
}

impl From<ResolutionResult> for DoubtAnswer {
    fn from(result: ResolutionResult) -> Self {
        Self {
            answer: result.answer_text,
            citations: result.citations,
        }
    }
}

/// Inbound body of `POST /predict`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub attendance: f64,
    pub marks: f64,
}

/// Academic risk band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
        };
        f.write_str(s)
    }
}

/// Outbound body of `POST /predict`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub risk_level: RiskLevel,
    pub predicted_cgpa: f64,
}
