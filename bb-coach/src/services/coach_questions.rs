//! Free-form coaching questions
//!
//! One question in, one answer out, with optional background context and an
//! optional image. Nothing is kept in the session.

use serde::Serialize;

use crate::error::CoachError;
use crate::models::Frame;
use crate::services::prompts;
use crate::services::vision_client::{Credential, VisionBackend, VisionRequest, VisionTask};

/// Answer to one question
#[derive(Debug, Clone, Serialize)]
pub struct CoachAnswer {
    pub answer: String,
    /// Whether an image went along with the question
    pub with_image: bool,
}

/// Ask the vision service a question
///
/// - No credential: `MissingCredential`, nothing is sent
/// - Blank question: `InvalidInput`, nothing is sent
/// - Otherwise exactly one request; failures come back as `AnalysisFailed`
pub async fn ask(
    backend: &dyn VisionBackend,
    credential: Option<&Credential>,
    question: &str,
    context: &str,
    image: Option<&Frame>,
) -> Result<CoachAnswer, CoachError> {
    let credential = credential.ok_or(CoachError::MissingCredential)?;
    if question.trim().is_empty() {
        return Err(CoachError::InvalidInput("question must not be empty".to_string()));
    }

    let request = VisionRequest {
        task: VisionTask::Question,
        instruction: prompts::question_instruction(question, context),
        image_data_url: image.map(Frame::data_url),
        max_tokens: None,
    };

    let content = backend.complete(credential, &request).await.map_err(|failure| {
        tracing::warn!(kind = failure.kind(), "Question failed: {}", failure);
        failure
    })?;

    let answer = content.into_text();
    tracing::info!(with_image = image.is_some(), chars = answer.len(), "Question answered");
    Ok(CoachAnswer {
        answer,
        with_image: image.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisFailure;
    use crate::services::vision_client::{CompletionContent, DemoVisionBackend, DEMO_ANSWER_TEXT};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBackend {
        requests: Mutex<Vec<VisionRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl VisionBackend for RecordingBackend {
        async fn complete(
            &self,
            _credential: &Credential,
            request: &VisionRequest,
        ) -> Result<CompletionContent, AnalysisFailure> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(AnalysisFailure::HttpStatus {
                    status: 429,
                    body: "rate limited".to_string(),
                });
            }
            Ok(CompletionContent::Text("Bend your knees more.".to_string()))
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn credential() -> Credential {
        Credential::new("gsk_test").unwrap()
    }

    #[tokio::test]
    async fn test_text_question_sends_context_and_no_image() {
        let backend = RecordingBackend::default();
        let answer = ask(&backend, Some(&credential()), "How do I add hook?", "Two-handed", None)
            .await
            .unwrap();

        assert_eq!(answer.answer, "Bend your knees more.");
        assert!(!answer.with_image);

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].task, VisionTask::Question);
        assert_eq!(requests[0].instruction, "Two-handed\nHow do I add hook?");
        assert!(requests[0].image_data_url.is_none());
    }

    #[tokio::test]
    async fn test_image_question_attaches_data_url() {
        let backend = RecordingBackend::default();
        let frame = Frame::new("stance.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF]);

        let answer = ask(&backend, Some(&credential()), "Is my stance balanced?", "", Some(&frame))
            .await
            .unwrap();

        assert!(answer.with_image);
        let requests = backend.requests.lock().unwrap();
        let url = requests[0].image_data_url.as_deref().unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn test_preconditions_send_nothing() {
        let backend = RecordingBackend::default();

        let missing = ask(&backend, None, "Anything?", "", None).await;
        assert!(matches!(missing, Err(CoachError::MissingCredential)));

        let blank = ask(&backend, Some(&credential()), "  ", "context", None).await;
        assert!(matches!(blank, Err(CoachError::InvalidInput(_))));

        assert!(backend.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_reported_as_analysis_failed() {
        let backend = RecordingBackend {
            fail: true,
            ..RecordingBackend::default()
        };
        let result = ask(&backend, Some(&credential()), "Why?", "", None).await;
        assert!(matches!(
            result,
            Err(CoachError::AnalysisFailed(AnalysisFailure::HttpStatus { status: 429, .. }))
        ));
    }

    #[tokio::test]
    async fn test_demo_backend_answers_questions() {
        let answer = ask(&DemoVisionBackend, Some(&credential()), "Any tips?", "", None)
            .await
            .unwrap();
        assert_eq!(answer.answer, DEMO_ANSWER_TEXT);
    }
}
