//! Vision completion API client
//!
//! Request/response contract of an OpenAI-compatible chat completions
//! endpoint with image input. `VisionBackend` is the seam the analysis
//! pipeline talks to: `GroqVisionClient` performs real HTTP calls,
//! `DemoVisionBackend` answers from a fixed fallback set.

use async_trait::async_trait;
use bb_common::config::VisionConfig;
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::AnalysisFailure;

const USER_AGENT: &str = concat!("BowlBetter/", env!("CARGO_PKG_VERSION"));

/// Longest error body kept in an `HttpStatus` failure
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Vision API credential
///
/// Never blank. Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// `None` for empty or whitespace-only keys
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if crate::config::is_valid_key(&raw) {
            Some(Self(raw.trim().to_string()))
        } else {
            None
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential(***)")
    }
}

/// What a request is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisionTask {
    /// Per-step feedback (0-based step index)
    Step { index: usize },
    /// Overall approach assessment
    Aggregate,
    /// Ball release assessment
    Release,
    /// Credential check
    KeyCheck,
    /// Free-form coaching question, with or without an image
    Question,
}

/// One completion request
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub task: VisionTask,
    pub instruction: String,
    /// `data:<media>;base64,...` URL of the image, if any
    pub image_data_url: Option<String>,
    /// Overrides the configured token budget
    pub max_tokens: Option<u32>,
}

/// Content of the first completion choice
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionContent {
    Text(String),
    /// Content delivered as a JSON object or array instead of a string
    Structured(Value),
}

impl CompletionContent {
    /// Text form (structured content is serialized)
    pub fn into_text(self) -> String {
        match self {
            CompletionContent::Text(text) => text,
            CompletionContent::Structured(value) => value.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CompletionContent::Text(text) => text.trim().is_empty(),
            CompletionContent::Structured(value) => value.is_null(),
        }
    }
}

/// Completion backend
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Issue exactly one completion request
    async fn complete(
        &self,
        credential: &Credential,
        request: &VisionRequest,
    ) -> Result<CompletionContent, AnalysisFailure>;

    /// Backend name for logs and `/health`
    fn name(&self) -> &'static str;
}

/// Build the chat completions request body
pub fn build_request_body(model: &str, default_max_tokens: u32, request: &VisionRequest) -> Value {
    let mut content = vec![json!({ "type": "text", "text": request.instruction })];
    if let Some(url) = &request.image_data_url {
        content.push(json!({ "type": "image_url", "image_url": { "url": url } }));
    }

    json!({
        "model": model,
        "messages": [{ "role": "user", "content": content }],
        "max_tokens": request.max_tokens.unwrap_or(default_max_tokens),
    })
}

/// Extract `choices[0].message.content`
pub fn extract_content(body: &Value) -> Result<CompletionContent, AnalysisFailure> {
    let content = body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .ok_or_else(|| AnalysisFailure::malformed("response has no choices[0].message.content"))?;

    match content {
        Value::String(text) if !text.trim().is_empty() => Ok(CompletionContent::Text(text.clone())),
        Value::String(_) => Err(AnalysisFailure::malformed("completion content is empty")),
        Value::Object(_) | Value::Array(_) => Ok(CompletionContent::Structured(content.clone())),
        other => Err(AnalysisFailure::malformed(format!(
            "unexpected completion content type: {}",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// HTTP vision backend
pub struct GroqVisionClient {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

impl GroqVisionClient {
    pub fn new(config: &VisionConfig) -> Result<Self, AnalysisFailure> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnalysisFailure::transport(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl VisionBackend for GroqVisionClient {
    async fn complete(
        &self,
        credential: &Credential,
        request: &VisionRequest,
    ) -> Result<CompletionContent, AnalysisFailure> {
        let body = build_request_body(&self.model, self.max_tokens, request);

        tracing::debug!(
            task = ?request.task,
            has_image = request.image_data_url.is_some(),
            model = %self.model,
            "Querying vision API"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisFailure::transport(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(
                task = ?request.task,
                status_code = status.as_u16(),
                "Vision API returned error status"
            );
            return Err(AnalysisFailure::HttpStatus {
                status: status.as_u16(),
                body: truncate_chars(&error_text, MAX_ERROR_BODY_CHARS),
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AnalysisFailure::malformed(format!("response is not JSON: {}", e)))?;

        let content = extract_content(&payload)?;

        tracing::info!(
            task = ?request.task,
            structured = matches!(content, CompletionContent::Structured(_)),
            "Vision API call successful"
        );

        Ok(content)
    }

    fn name(&self) -> &'static str {
        "groq"
    }
}

/// Canned per-step feedback
pub const DEMO_STEP_TEXTS: [&str; 4] = [
    "Step 1: Your initial stance shows good posture with shoulders aligned properly (90% confidence). Your weight distribution appears to be 60/40 favoring your dominant side, which is optimal. Your knee flex is at approximately 20 degrees - aim for 25-30 degrees for improved stability and power. Ball position is at chest height, which is good, but consider raising it by 2-3 inches for improved momentum and a more consistent push away motion. Ensure your grip pressure remains relaxed to avoid tension traveling up your arm.",
    "Step 2: Push away motion timing scores 85/100 - your ball starts moving in sync with your first step. Arm swing path deviates 8 degrees from centerline (aim for <5 degrees). Your timing sequence shows ball and foot moving in precise sync, which is excellent for consistency. Shoulder rotation is minimal at 4 degrees, which is ideal. Head position remains stable throughout the push away, maintaining a consistent eye line to your target. Focus on keeping your elbow closer to your side during the push away for improved directional control.",
    "Step 3: Excellent knee bend at 35 degrees, which is optimal for power generation. Back angle is maintained at 15 degrees from vertical, providing excellent leverage. Shoulder alignment shows 7 degrees of rotation away from parallel to the foul line - work on reducing this to <5 degrees. Ball position is at the bottom of the swing, with a path that's 94% on plane. Timing indicators show you're right at the transition point between downswing and upswing. Head position remains steady with eyes focused on target.",
    "Step 4: Follow-through shows lateral deviation of 4.5 inches from ideal path - aim for <3 inches. Slide foot is angled 12 degrees from your target line - work on reducing this to <8 degrees for improved directional control. Arm extension at release point is 95% complete, which is excellent. Follow-through height is optimal, finishing above shoulder level. Balance at finish position scored 82/100 - work on maintaining your center of gravity over your slide foot. Head position remains steady through release, indicating good focus.",
];

/// Canned overall assessment
pub const DEMO_OVERALL_TEXT: &str = "Overall Performance Assessment (Score: 83/100):\n\nYour approach demonstrates solid fundamentals with consistent timing and good posture fundamentals. The tempo of your approach is very consistent at 0.87 seconds per step, which is excellent for repeatability.\n\nFor significant improvement, focus on these key areas:\n\n1) Arm Swing Consistency: Your arm swing deviates 6-8 degrees from the ideal pendulum path. Practice one-step drills focusing exclusively on maintaining a straight swing path directly in line with your target.\n\n2) Shoulder Alignment: Throughout your approach, your shoulders rotate 7-10 degrees open relative to the lane. Work on keeping your shoulders more square to the lane using the 'square shoulders' drill.\n\n3) Follow-through Precision: Your follow-through shows inconsistency in direction and extension. Practice the 'finish position hold' drill, maintaining your finish position for 3 seconds after each shot.";

/// Canned answer to any free-form question
pub const DEMO_ANSWER_TEXT: &str = "Keep your shoulders square to the foul line and let the ball swing like a pendulum from the shoulder. A relaxed grip and a consistent four-step tempo fix most accuracy problems before any equipment change does.";

/// Fixed fallback backend for disconnected use
///
/// Still requires a credential upstream; it just never sends it anywhere.
#[derive(Debug, Default, Clone)]
pub struct DemoVisionBackend;

#[async_trait]
impl VisionBackend for DemoVisionBackend {
    async fn complete(
        &self,
        _credential: &Credential,
        request: &VisionRequest,
    ) -> Result<CompletionContent, AnalysisFailure> {
        tracing::debug!(task = ?request.task, "Answering from demo fallback set");

        let content = match request.task {
            VisionTask::Step { index } => CompletionContent::Text(
                DEMO_STEP_TEXTS
                    .get(index)
                    .copied()
                    .unwrap_or("Analysis not available for this step.")
                    .to_string(),
            ),
            VisionTask::Aggregate => CompletionContent::Structured(json!({
                "overall": DEMO_OVERALL_TEXT,
                "subscores": { "timing": 89, "balance": 82, "armSwing": 77, "posture": 85 }
            })),
            VisionTask::Release => CompletionContent::Structured(json!({
                "overall": "Clean release with the hand behind the ball and a firm wrist. Let the thumb exit a fraction earlier for more consistent rotation.",
                "wristPosition": "Wrist stays cupped slightly through the release, which supports hook potential.",
                "fingerPosition": "Fingers exit at roughly 4 o'clock, giving good axis rotation.",
                "releaseAngle": "Ball leaves the hand about 2 degrees inside the target line.",
                "metrics": {
                    "wristPositionScore": 84,
                    "fingerPositionScore": 79,
                    "releaseAngleScore": 81,
                    "overallScore": 82
                }
            })),
            VisionTask::KeyCheck => CompletionContent::Text("API key test successful.".to_string()),
            VisionTask::Question => CompletionContent::Text(DEMO_ANSWER_TEXT.to_string()),
        };

        Ok(content)
    }

    fn name(&self) -> &'static str {
        "demo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_rejects_blank() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   ").is_none());
        assert_eq!(Credential::new(" gsk_abc ").unwrap().expose(), "gsk_abc");
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("secret-key").unwrap();
        assert!(!format!("{:?}", credential).contains("secret"));
    }

    #[test]
    fn test_request_body_with_image() {
        let request = VisionRequest {
            task: VisionTask::Step { index: 0 },
            instruction: "Describe".to_string(),
            image_data_url: Some("data:image/png;base64,AQID".to_string()),
            max_tokens: None,
        };

        let body = build_request_body("model-x", 512, &request);

        assert_eq!(body["model"], "model-x");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["messages"][0]["role"], "user");
        let content = body["messages"][0]["content"].as_array().unwrap();
        assert_eq!(content.len(), 2);
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[0]["text"], "Describe");
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], "data:image/png;base64,AQID");
    }

    #[test]
    fn test_request_body_text_only_with_override() {
        let request = VisionRequest {
            task: VisionTask::KeyCheck,
            instruction: "Say hi".to_string(),
            image_data_url: None,
            max_tokens: Some(10),
        };

        let body = build_request_body("model-x", 512, &request);

        assert_eq!(body["max_tokens"], 10);
        assert_eq!(body["messages"][0]["content"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_extract_string_content() {
        let body = json!({ "choices": [{ "message": { "content": "Nice stance" } }] });
        assert_eq!(
            extract_content(&body).unwrap(),
            CompletionContent::Text("Nice stance".to_string())
        );
    }

    #[test]
    fn test_extract_structured_content() {
        let body = json!({ "choices": [{ "message": { "content": { "overall": "ok" } } }] });
        let content = extract_content(&body).unwrap();
        assert_eq!(content, CompletionContent::Structured(json!({ "overall": "ok" })));
        assert_eq!(content.into_text(), r#"{"overall":"ok"}"#);
    }

    #[test]
    fn test_extract_missing_path_is_malformed() {
        for body in [
            json!({}),
            json!({ "choices": [] }),
            json!({ "choices": [{ "message": {} }] }),
            json!({ "choices": [{ "message": { "content": 42 } }] }),
            json!({ "choices": [{ "message": { "content": "  " } }] }),
        ] {
            assert!(matches!(
                extract_content(&body),
                Err(AnalysisFailure::MalformedResponse { .. })
            ));
        }
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
    }

    #[tokio::test]
    async fn test_demo_backend_fallback_set() {
        let backend = DemoVisionBackend;
        let credential = Credential::new("demo").unwrap();
        let request = |task| VisionRequest {
            task,
            instruction: String::new(),
            image_data_url: None,
            max_tokens: None,
        };

        let step = backend
            .complete(&credential, &request(VisionTask::Step { index: 1 }))
            .await
            .unwrap()
            .into_text();
        assert!(step.starts_with("Step 2:"));

        let beyond = backend
            .complete(&credential, &request(VisionTask::Step { index: 5 }))
            .await
            .unwrap()
            .into_text();
        assert_eq!(beyond, "Analysis not available for this step.");

        match backend
            .complete(&credential, &request(VisionTask::Aggregate))
            .await
            .unwrap()
        {
            CompletionContent::Structured(value) => assert_eq!(value["subscores"]["timing"], 89),
            other => panic!("expected structured aggregate, got {:?}", other),
        }
    }
}
