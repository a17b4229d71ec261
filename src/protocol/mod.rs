use serde_json::{json, Value};

use crate::model::analysis;
use crate::services::analysis::{AnalysisRequest, Analyzer};
use crate::services::gemini::GenerateContent;
use crate::services::prompt::AnalysisMode;

mod command;
use command::Command;

/// What the handler needs besides the request line.
pub struct Context<T: GenerateContent> {
    pub analyzer: Analyzer<T>,
    pub comparison_goal: String,
}

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload(req: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "message": message.into()
    })
    .to_string()
}

fn parse_analysis_request(payload: &Value, comparison_goal: &str) -> Result<AnalysisRequest, String> {
    let text = |key: &str| {
        payload
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let video_uri = text("video_uri").ok_or("payload.video_uri is required")?;
    let goal = payload
        .get("goal")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or("payload.goal is required")?;

    // Without an explicit mode, fall back to the sentinel goal text.
    let mode = match payload.get("mode") {
        None | Some(Value::Null) => AnalysisMode::resolve_legacy(goal, comparison_goal),
        Some(v) => serde_json::from_value::<AnalysisMode>(v.clone())
            .map_err(|_| "payload.mode must be \"single\" or \"comparison\"".to_string())?,
    };

    Ok(AnalysisRequest {
        video_uri: video_uri.to_string(),
        goal: goal.to_string(),
        reference_video_uri: text("reference_video_uri").map(str::to_string),
        mode,
    })
}

pub fn handle<T: GenerateContent>(input: &str, ctx: &Context<T>) -> String {
    let req: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(_) => {
            return json!({
                "status": "error",
                "message": "invalid json"
            })
            .to_string();
        }
    };

    let id = get_id(&req);
    let cmd_str = get_cmd(&req);
    let payload = get_payload(&req);

    tracing::debug!(cmd = cmd_str, "request received");

    match Command::from(cmd_str) {
        Command::Ping => ok(id, json!({ "message": "video-critic-core alive" })),

        Command::Schema => ok(id, json!({ "schema": analysis::response_schema() })),

        Command::AnalyzeVideo => {
            let request = match parse_analysis_request(payload, &ctx.comparison_goal) {
                Ok(r) => r,
                Err(e) => return err(id, e),
            };

            // Analysis failures are still a normal reply; the pipeline checks for `error`.
            let outcome = ctx.analyzer.analyze(&request);
            ok(id, outcome.to_value())
        }

        Command::Unknown => err(id, "unknown command"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::tests::{FakeGemini, SCENARIO_RESPONSE};
    use crate::services::gemini::ServiceError;

    fn ctx(fake: FakeGemini) -> Context<FakeGemini> {
        Context {
            analyzer: Analyzer::new(fake, "video/mp4"),
            comparison_goal: "Option 3".into(),
        }
    }

    fn reply(line: &str, ctx: &Context<FakeGemini>) -> Value {
        serde_json::from_str(&handle(line, ctx)).unwrap()
    }

    #[test]
    fn ping_echoes_id() {
        let c = ctx(FakeGemini::answering(SCENARIO_RESPONSE));
        let v = reply(r#"{"id": 7, "cmd": "ping"}"#, &c);
        assert_eq!(v["id"], json!(7));
        assert_eq!(v["status"], json!("ok"));
    }

    #[test]
    fn invalid_json_and_unknown_command() {
        let c = ctx(FakeGemini::answering(SCENARIO_RESPONSE));
        assert_eq!(reply("{nope", &c)["message"], json!("invalid json"));

        let v = reply(r#"{"id": "a", "cmd": "transcode"}"#, &c);
        assert_eq!(v["status"], json!("error"));
        assert_eq!(v["message"], json!("unknown command"));
    }

    #[test]
    fn analyze_requires_video_and_goal() {
        let c = ctx(FakeGemini::answering(SCENARIO_RESPONSE));
        let v = reply(r#"{"id": 1, "cmd": "analyze_video", "payload": {"goal": "x"}}"#, &c);
        assert_eq!(v["message"], json!("payload.video_uri is required"));

        let v = reply(
            r#"{"id": 1, "cmd": "analyze_video", "payload": {"video_uri": "http://example/video.mp4"}}"#,
            &c,
        );
        assert_eq!(v["message"], json!("payload.goal is required"));
        assert_eq!(c.analyzer.transport().call_count(), 0);
    }

    #[test]
    fn analyze_returns_result_as_payload() {
        let c = ctx(FakeGemini::answering(SCENARIO_RESPONSE));
        let v = reply(
            r#"{"id": 2, "cmd": "analyze_video", "payload": {"video_uri": "http://example/video.mp4", "goal": "Option 2"}}"#,
            &c,
        );

        let expected: Value = serde_json::from_str(SCENARIO_RESPONSE).unwrap();
        assert_eq!(v["status"], json!("ok"));
        assert_eq!(v["payload"], expected);
        assert!(v["payload"]["overall_score"].as_i64().unwrap() < 5);
    }

    #[test]
    fn sentinel_goal_with_reference_selects_comparison() {
        let c = ctx(FakeGemini::answering(SCENARIO_RESPONSE));
        reply(
            r#"{"cmd": "analyze", "payload": {"video_uri": "http://example/video.mp4", "goal": "Option 3", "reference_video_uri": "http://example/ref.mp4"}}"#,
            &c,
        );

        let call = c.analyzer.transport().last_call();
        assert_eq!(call.videos.len(), 2);
        assert_eq!(call.videos[0].uri, "http://example/video.mp4");
        assert_eq!(call.videos[1].uri, "http://example/ref.mp4");
        assert!(call.prompt.contains("SECOND video"));
    }

    #[test]
    fn other_goal_with_reference_stays_single() {
        let c = ctx(FakeGemini::answering(SCENARIO_RESPONSE));
        reply(
            r#"{"cmd": "analyze", "payload": {"video_uri": "http://example/video.mp4", "goal": "Option 2", "reference_video_uri": "http://example/ref.mp4"}}"#,
            &c,
        );

        let call = c.analyzer.transport().last_call();
        assert_eq!(call.videos.len(), 1);
        assert!(!call.prompt.to_lowercase().contains("second video"));
    }

    #[test]
    fn explicit_mode_overrides_goal_text() {
        let c = ctx(FakeGemini::answering(SCENARIO_RESPONSE));
        reply(
            r#"{"cmd": "analyze", "payload": {"video_uri": "v", "goal": "Match the reference look", "reference_video_uri": "r", "mode": "comparison"}}"#,
            &c,
        );
        assert_eq!(c.analyzer.transport().last_call().videos.len(), 2);

        let v = reply(
            r#"{"id": 3, "cmd": "analyze", "payload": {"video_uri": "v", "goal": "g", "mode": "batch"}}"#,
            &c,
        );
        assert_eq!(v["status"], json!("error"));
    }

    #[test]
    fn service_failure_is_an_ok_reply_with_error_field() {
        let c = ctx(FakeGemini::failing(|| {
            ServiceError::Transport("connection refused".into())
        }));
        let v = reply(
            r#"{"id": 4, "cmd": "analyze_video", "payload": {"video_uri": "http://example/video.mp4", "goal": "Option 2"}}"#,
            &c,
        );

        assert_eq!(v["status"], json!("ok"));
        assert_eq!(
            v["payload"]["message"],
            json!("Failed to get analysis from Gemini.")
        );
        assert!(v["payload"]["error"].as_str().unwrap().contains("connection refused"));
    }

    #[test]
    fn schema_command_returns_declaration() {
        let c = ctx(FakeGemini::answering(SCENARIO_RESPONSE));
        let v = reply(r#"{"cmd": "schema"}"#, &c);
        assert_eq!(v["payload"]["schema"], analysis::response_schema());
    }
}
