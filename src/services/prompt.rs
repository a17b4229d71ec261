use serde::{Deserialize, Serialize};

const COMPARISON_PREFIX: &str =
    "Compare the FIRST video (User's upload) with the SECOND video (Reference/Goal). ";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    #[default]
    Single,
    Comparison,
}

impl AnalysisMode {
    /// Older pipeline graphs select comparison by sending a fixed goal text
    /// instead of a mode.
    pub fn resolve_legacy(goal: &str, comparison_goal: &str) -> Self {
        if !comparison_goal.is_empty() && goal == comparison_goal {
            AnalysisMode::Comparison
        } else {
            AnalysisMode::Single
        }
    }
}

pub fn base_prompt(goal: &str) -> String {
    format!(
        "You are an expert video producer and content quality analyst. Your task is to analyze the \
         provided video URL/file for technical quality issues. \
         Focus on: 1) Camera Angle/Framing, 2) Lighting Quality, 3) Audio Clarity/Noise, 4) Video Pacing/Engagement. \
         Generate a structured JSON output that conforms exactly to the VideoAnalysisResult schema. \
         Set review_check to true when overall_score is below 5, otherwise false. \
         The user's goal is: {goal}. Be critical but constructive."
    )
}

pub fn build_prompt(goal: &str, comparing: bool) -> String {
    if comparing {
        let mut p = String::from(COMPARISON_PREFIX);
        p.push_str(&base_prompt(goal));
        p
    } else {
        base_prompt(goal)
    }
}
