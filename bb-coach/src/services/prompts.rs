//! Instruction texts sent to the vision service

use crate::models::StepAnalysis;

/// Step instructions for a 1-based step number out of `step_count`
pub fn step_instruction(step_index: usize, step_count: usize) -> String {
    format!(
        "You are an expert bowling coach. This image shows step {} of a {}-step bowling approach. \
         Assess the bowler's posture, knee flex, arm swing path, ball position, balance and timing \
         at this point of the approach. Give specific, measurable observations (angles in degrees, \
         scores out of 100) and one or two concrete corrections. Start your answer with \"Step {}:\".",
        step_index + 1,
        step_count,
        step_index + 1
    )
}

/// Aggregate request built from settled per-step results
///
/// `step_texts` holds one entry per step; `None` marks a step whose
/// analysis failed.
pub fn aggregate_instruction(
    step_texts: &[Option<&StepAnalysis>],
    scoring_context: &str,
) -> String {
    let mut prompt = String::from(
        "You are an expert bowling coach. Below are per-step observations of one bowler's approach. \
         Write an overall assessment and score the approach.\n\n",
    );

    for (index, text) in step_texts.iter().enumerate() {
        match text {
            Some(analysis) => prompt.push_str(&format!(
                "Step {} observations:\n{}\n\n",
                index + 1,
                analysis.raw_text
            )),
            None => {
                prompt.push_str(&format!("Step {} observations: unavailable.\n\n", index + 1))
            }
        }
    }

    let context = scoring_context.trim();
    if !context.is_empty() {
        prompt.push_str("Scoring guidance:\n");
        prompt.push_str(context);
        prompt.push_str("\n\n");
    }

    prompt.push_str(
        "Respond with only a JSON object of the form \
         {\"overall\": string, \"subscores\": {\"timing\": integer, \"balance\": integer, \
         \"armSwing\": integer, \"posture\": integer}} with every score from 0 to 100.",
    );
    prompt
}

/// Free-form question, prefixed by optional background context
pub fn question_instruction(question: &str, context: &str) -> String {
    let context = context.trim();
    if context.is_empty() {
        question.trim().to_string()
    } else {
        format!("{}\n{}", context, question.trim())
    }
}

/// Release frame instructions
pub const RELEASE_INSTRUCTION: &str = "You are an expert bowling coach. This image shows the moment \
of ball release. Assess wrist position, finger position and release angle. Respond with only a JSON \
object of the form {\"overall\": string, \"wristPosition\": string, \"fingerPosition\": string, \
\"releaseAngle\": string, \"metrics\": {\"wristPositionScore\": integer, \"fingerPositionScore\": \
integer, \"releaseAngleScore\": integer, \"overallScore\": integer}} with every score from 0 to 100.";

/// Minimal text-only request used to check a credential
pub const KEY_CHECK_INSTRUCTION: &str = "Say: API key test successful.";

/// Token budget of the credential check
pub const KEY_CHECK_MAX_TOKENS: u32 = 10;

/// Default scoring guidance
pub const DEFAULT_SCORING_CONTEXT: &str = "Ideal angles for scoring: Shoulder alignment < 5 degrees, \
Knee flex 25-30 degrees, Arm swing deviation < 5 degrees, Slide foot angle < 8 degrees.";
