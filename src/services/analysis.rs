use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::analysis::{self, VideoAnalysisResult};
use crate::services::gemini::{GenerateContent, GenerateRequest, ServiceError, VideoPart};
use crate::services::prompt::{self, AnalysisMode};

pub const FAILURE_MESSAGE: &str = "Failed to get analysis from Gemini.";

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub video_uri: String,
    pub goal: String,
    pub reference_video_uri: Option<String>,
    pub mode: AnalysisMode,
}

impl AnalysisRequest {
    /// Comparison needs both the mode and a usable reference video.
    fn reference(&self) -> Option<&str> {
        match self.mode {
            AnalysisMode::Comparison => self
                .reference_video_uri
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty()),
            AnalysisMode::Single => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Configuration,
    Transport,
    Service,
    Validation,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AnalysisFailure {
    pub error: String,
    pub message: String,
    pub kind: FailureKind,
}

impl From<ServiceError> for AnalysisFailure {
    fn from(e: ServiceError) -> Self {
        let kind = match e {
            ServiceError::MissingCredential => FailureKind::Configuration,
            ServiceError::Transport(_) => FailureKind::Transport,
            ServiceError::Http { .. } | ServiceError::EmptyResponse(_) => FailureKind::Service,
        };
        Self {
            error: e.to_string(),
            message: FAILURE_MESSAGE.to_string(),
            kind,
        }
    }
}

impl From<analysis::ValidationError> for AnalysisFailure {
    fn from(e: analysis::ValidationError) -> Self {
        Self {
            error: e.to_string(),
            message: FAILURE_MESSAGE.to_string(),
            kind: FailureKind::Validation,
        }
    }
}

/// Serializes as the bare result on success, or as `{error, message, kind}`.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Success(VideoAnalysisResult),
    Failure(AnalysisFailure),
}

impl AnalysisOutcome {
    pub fn result(&self) -> Option<&VideoAnalysisResult> {
        match self {
            AnalysisOutcome::Success(r) => Some(r),
            AnalysisOutcome::Failure(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({ "error": e.to_string(), "message": FAILURE_MESSAGE })
        })
    }
}

pub struct Analyzer<T: GenerateContent> {
    transport: T,
    video_mime_type: String,
}

impl<T: GenerateContent> Analyzer<T> {
    pub fn new(transport: T, video_mime_type: impl Into<String>) -> Self {
        Self {
            transport,
            video_mime_type: video_mime_type.into(),
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn build_request(&self, req: &AnalysisRequest) -> GenerateRequest {
        let mut videos = vec![VideoPart {
            uri: req.video_uri.clone(),
            mime_type: self.video_mime_type.clone(),
        }];

        let reference = req.reference();
        if let Some(uri) = reference {
            videos.push(VideoPart {
                uri: uri.to_string(),
                mime_type: self.video_mime_type.clone(),
            });
        }

        GenerateRequest {
            videos,
            prompt: prompt::build_prompt(&req.goal, reference.is_some()),
            response_schema: analysis::response_schema(),
        }
    }

    /// Runs one analysis. Never fails: errors come back as `AnalysisOutcome::Failure`.
    pub fn analyze(&self, req: &AnalysisRequest) -> AnalysisOutcome {
        let request = self.build_request(req);

        tracing::info!(
            goal = %req.goal,
            videos = request.videos.len(),
            "sending analysis request"
        );

        let outcome = self
            .transport
            .generate(&request)
            .map_err(AnalysisFailure::from)
            .and_then(|text| analysis::validate(&text).map_err(AnalysisFailure::from));

        match outcome {
            Ok(result) => {
                tracing::info!(
                    score = result.overall_score,
                    review_check = result.review_check,
                    "analysis complete"
                );
                AnalysisOutcome::Success(result)
            }
            Err(failure) => {
                tracing::warn!(kind = ?failure.kind, error = %failure.error, "analysis failed");
                AnalysisOutcome::Failure(failure)
            }
        }
    }
}
