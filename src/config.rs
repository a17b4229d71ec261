use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_COMPARISON_GOAL: &str = "Option 3";
pub const DEFAULT_VIDEO_MIME_TYPE: &str = "video/mp4";
pub const DEFAULT_REVIEW_THRESHOLD: i64 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Left unset at load time; the first analysis call reports it instead.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Goal text that older pipeline graphs send to request comparison mode.
    pub comparison_goal: String,
    pub video_mime_type: String,
    pub review_threshold: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            comparison_goal: DEFAULT_COMPARISON_GOAL.to_string(),
            video_mime_type: DEFAULT_VIDEO_MIME_TYPE.to_string(),
            review_threshold: DEFAULT_REVIEW_THRESHOLD,
        }
    }
}

impl Settings {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let review_threshold = match get("CRITIC_REVIEW_THRESHOLD") {
            Some(raw) => {
                let n: i64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "CRITIC_REVIEW_THRESHOLD",
                    reason: format!("not an integer: {raw}"),
                })?;
                if !(1..=10).contains(&n) {
                    return Err(ConfigError::Invalid {
                        key: "CRITIC_REVIEW_THRESHOLD",
                        reason: format!("must be between 1 and 10, got {n}"),
                    });
                }
                n
            }
            None => defaults.review_threshold,
        };

        Ok(Self {
            api_key: get("GEMINI_API_KEY").map(|k| k.trim().to_string()),
            model: get("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: get("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            comparison_goal: get("CRITIC_COMPARISON_GOAL").unwrap_or(defaults.comparison_goal),
            video_mime_type: get("CRITIC_VIDEO_MIME_TYPE").unwrap_or(defaults.video_mime_type),
            review_threshold,
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s, Settings::default());
        assert!(!s.has_credential());
    }

    #[test]
    fn reads_named_keys() {
        let s = Settings::from_lookup(lookup(&[
            ("GEMINI_API_KEY", " secret "),
            ("GEMINI_MODEL", "gemini-2.5-pro"),
            ("CRITIC_COMPARISON_GOAL", "Copy & Create"),
            ("CRITIC_REVIEW_THRESHOLD", "6"),
        ]))
        .unwrap();

        assert_eq!(s.api_key.as_deref(), Some("secret"));
        assert_eq!(s.model, "gemini-2.5-pro");
        assert_eq!(s.comparison_goal, "Copy & Create");
        assert_eq!(s.review_threshold, 6);
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let s = Settings::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap();
        assert!(!s.has_credential());
    }

    #[test]
    fn rejects_bad_threshold() {
        assert!(Settings::from_lookup(lookup(&[("CRITIC_REVIEW_THRESHOLD", "five")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("CRITIC_REVIEW_THRESHOLD", "11")])).is_err());
    }
}
