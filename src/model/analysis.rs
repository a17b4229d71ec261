use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 10;

/// One identified issue and its remedy.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FeedbackComponent {
    pub area: String,
    pub problem: String,
    pub solution: String,
}

/// Full critique of one video, as returned by the model.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VideoAnalysisResult {
    pub overall_score: i64,
    pub review_check: bool,
    pub summary_insight: String,
    pub detailed_feedback: Vec<FeedbackComponent>,
}

impl VideoAnalysisResult {
    pub fn is_below(&self, threshold: i64) -> bool {
        self.overall_score < threshold
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid analysis json: {0}")]
    Malformed(String),

    #[error("overall_score must be between 1 and 10, got {value}")]
    ScoreOutOfRange { value: i64 },
}

/// Decodes the model's JSON text into a result, enforcing the score range.
pub fn validate(json_text: &str) -> Result<VideoAnalysisResult, ValidationError> {
    let result: VideoAnalysisResult =
        serde_json::from_str(json_text).map_err(|e| ValidationError::Malformed(e.to_string()))?;

    if !(MIN_SCORE..=MAX_SCORE).contains(&result.overall_score) {
        return Err(ValidationError::ScoreOutOfRange {
            value: result.overall_score,
        });
    }

    Ok(result)
}

/// Schema declaration sent as `generationConfig.responseSchema`.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "overall_score": {
                "type": "INTEGER",
                "minimum": MIN_SCORE,
                "maximum": MAX_SCORE,
                "description": "Overall quality score from 1 (poor) to 10 (pro-level)."
            },
            "review_check": {
                "type": "BOOLEAN",
                "description": "True if the score is low (e.g., <5) and needs human review, otherwise False."
            },
            "summary_insight": {
                "type": "STRING",
                "description": "A single sentence summary of the video's biggest strength and weakness."
            },
            "detailed_feedback": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "area": {
                            "type": "STRING",
                            "description": "The area analyzed (e.g., 'Visuals', 'Audio', 'Pacing')."
                        },
                        "problem": {
                            "type": "STRING",
                            "description": "A clear, identified problem in this area (e.g., 'Harsh backlighting')."
                        },
                        "solution": {
                            "type": "STRING",
                            "description": "A specific, actionable solution for the creator (e.g., 'Use a ring light in front')."
                        }
                    },
                    "required": ["area", "problem", "solution"],
                    "propertyOrdering": ["area", "problem", "solution"]
                }
            }
        },
        "required": ["overall_score", "review_check", "summary_insight", "detailed_feedback"],
        "propertyOrdering": ["overall_score", "review_check", "summary_insight", "detailed_feedback"]
    })
}
