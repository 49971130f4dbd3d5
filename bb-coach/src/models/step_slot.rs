//! Approach step slots
//!
//! Per-step state machine:
//!
//! ```text
//! Empty -> ImagePresent -> Analyzing -> Completed
//!                                    -> Failed
//! Completed | Failed -> Analyzing       (re-invocation)
//! any -> ImagePresent                   (new image, result discarded)
//! any -> Empty                          (image removed)
//! ```

use super::frame::Frame;
use crate::error::{CoachError, CoachResult};
use serde::Serialize;
use uuid::Uuid;

/// Smallest supported number of approach steps
pub const MIN_STEP_COUNT: usize = 3;
/// Largest supported number of approach steps
pub const MAX_STEP_COUNT: usize = 6;
/// Step count of a new session
pub const DEFAULT_STEP_COUNT: usize = 4;

/// Analysis state of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Empty,
    ImagePresent,
    Analyzing,
    Completed,
    Failed,
}

impl StepState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepState::Empty => "empty",
            StepState::ImagePresent => "image_present",
            StepState::Analyzing => "analyzing",
            StepState::Completed => "completed",
            StepState::Failed => "failed",
        }
    }
}

/// One approach step
#[derive(Debug, Clone)]
pub struct StepSlot {
    pub step_index: usize,
    image: Option<Frame>,
    result_text: Option<String>,
    error: Option<String>,
    state: StepState,
}

impl StepSlot {
    fn empty(step_index: usize) -> Self {
        Self {
            step_index,
            image: None,
            result_text: None,
            error: None,
            state: StepState::Empty,
        }
    }

    pub fn image(&self) -> Option<&Frame> {
        self.image.as_ref()
    }

    pub fn result_text(&self) -> Option<&str> {
        self.result_text.as_deref()
    }

    /// Failure message of the last analysis, if it failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> StepState {
        self.state
    }

    fn image_id(&self) -> Option<Uuid> {
        self.image.as_ref().map(|f| f.id)
    }
}

/// The contiguous slots `[0, step_count)`
#[derive(Debug, Clone)]
pub struct StepBoard {
    slots: Vec<StepSlot>,
}

impl Default for StepBoard {
    fn default() -> Self {
        Self {
            slots: (0..DEFAULT_STEP_COUNT).map(StepSlot::empty).collect(),
        }
    }
}

impl StepBoard {
    pub fn new(step_count: usize) -> CoachResult<Self> {
        let mut board = Self { slots: Vec::new() };
        board.resize(step_count)?;
        Ok(board)
    }

    pub fn step_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[StepSlot] {
        &self.slots
    }

    pub fn slot(&self, step_index: usize) -> Option<&StepSlot> {
        self.slots.get(step_index)
    }

    /// Change the number of steps
    ///
    /// Slots that stay in range keep their image and result; new slots start empty.
    pub fn resize(&mut self, step_count: usize) -> CoachResult<()> {
        if !(MIN_STEP_COUNT..=MAX_STEP_COUNT).contains(&step_count) {
            return Err(CoachError::InvalidInput(format!(
                "step count must be between {} and {}, got {}",
                MIN_STEP_COUNT, MAX_STEP_COUNT, step_count
            )));
        }

        if step_count < self.slots.len() {
            self.slots.truncate(step_count);
        } else {
            let start = self.slots.len();
            self.slots.extend((start..step_count).map(StepSlot::empty));
        }
        Ok(())
    }

    fn slot_mut(&mut self, step_index: usize) -> CoachResult<&mut StepSlot> {
        let step_count = self.slots.len();
        self.slots.get_mut(step_index).ok_or_else(|| {
            CoachError::NotFound(format!(
                "step {} (approach has {} steps)",
                step_index, step_count
            ))
        })
    }

    /// Bind (or clear) the image of a step
    ///
    /// Returns `false` when the slot already holds this exact frame, in which
    /// case nothing changes. A different frame discards the previous result.
    pub fn set_image(&mut self, step_index: usize, image: Option<Frame>) -> CoachResult<bool> {
        let slot = self.slot_mut(step_index)?;

        if slot.image_id() == image.as_ref().map(|f| f.id) {
            return Ok(false);
        }

        slot.state = if image.is_some() {
            StepState::ImagePresent
        } else {
            StepState::Empty
        };
        slot.image = image;
        slot.result_text = None;
        slot.error = None;
        Ok(true)
    }

    /// Move a step into `Analyzing`
    ///
    /// Returns the bound frame, or `None` when the step has no image (no-op).
    pub fn begin_analysis(&mut self, step_index: usize) -> CoachResult<Option<Frame>> {
        let slot = self.slot_mut(step_index)?;
        let Some(frame) = slot.image.clone() else {
            return Ok(None);
        };
        slot.state = StepState::Analyzing;
        slot.error = None;
        Ok(Some(frame))
    }

    /// Move a step into `Analyzing` only while it is still bound to `frame_id`
    pub fn begin_analysis_of(&mut self, step_index: usize, frame_id: Uuid) -> bool {
        match self.slots.get_mut(step_index) {
            Some(slot) if slot.image_id() == Some(frame_id) => {
                slot.state = StepState::Analyzing;
                slot.error = None;
                true
            }
            _ => false,
        }
    }

    /// Record the settled outcome of an analysis of `frame_id`
    ///
    /// Discarded (returns `false`) when the step has since been resized away,
    /// rebound to another frame, or reset out of `Analyzing`.
    pub fn record_outcome(
        &mut self,
        step_index: usize,
        frame_id: Uuid,
        outcome: Result<String, String>,
    ) -> bool {
        let Some(slot) = self.slots.get_mut(step_index) else {
            return false;
        };
        if slot.image_id() != Some(frame_id) || slot.state != StepState::Analyzing {
            return false;
        }

        match outcome {
            Ok(text) => {
                slot.result_text = Some(text);
                slot.error = None;
                slot.state = StepState::Completed;
            }
            Err(message) => {
                slot.result_text = None;
                slot.error = Some(message);
                slot.state = StepState::Failed;
            }
        }
        true
    }

    /// Indices in range without an image
    pub fn missing_images(&self) -> Vec<usize> {
        self.slots
            .iter()
            .filter(|s| s.image.is_none())
            .map(|s| s.step_index)
            .collect()
    }

    /// Bound frames by step index, for handing to the analysis pipeline
    pub fn frame_snapshot(&self) -> Vec<Option<Frame>> {
        self.slots.iter().map(|s| s.image.clone()).collect()
    }
}
