//! Sequence frame assignments
//!
//! Maps a frame index of the imported sequence to the role it plays. The map
//! is keyed by `frame_index`: assigning an index again replaces the previous
//! entry, it never adds a second one.

use super::frame::Frame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What an assigned frame is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Approach step; the frame index doubles as the step index
    ApproachStep,
    /// Ball release frame
    ReleaseFrame,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ApproachStep => "approach_step",
            Role::ReleaseFrame => "release_frame",
        }
    }
}

/// One entry of the map
#[derive(Debug, Clone)]
pub struct Assignment {
    pub frame_index: usize,
    pub role: Role,
    pub bound_frame: Option<Frame>,
}

/// Assignments of the current import batch, keyed by frame index
#[derive(Debug, Clone, Default)]
pub struct AssignmentMap {
    entries: BTreeMap<usize, Assignment>,
}

impl AssignmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the assignment at `frame_index`
    ///
    /// Returns the replaced assignment, if any.
    pub fn assign(
        &mut self,
        frame_index: usize,
        role: Role,
        frame: Option<Frame>,
    ) -> Option<Assignment> {
        self.entries.insert(
            frame_index,
            Assignment {
                frame_index,
                role,
                bound_frame: frame,
            },
        )
    }

    pub fn get(&self, frame_index: usize) -> Option<&Assignment> {
        self.entries.get(&frame_index)
    }

    /// Project assignments with `role` onto step indices `[0, step_count)`
    ///
    /// The frame index is used as the step index unchanged. Entries at or past
    /// `step_count` stay in the map and reappear once `step_count` grows.
    pub fn resolve(&self, role: Role, step_count: usize) -> BTreeMap<usize, Frame> {
        self.entries
            .range(..step_count)
            .filter(|(_, a)| a.role == role)
            .filter_map(|(&index, a)| a.bound_frame.clone().map(|frame| (index, frame)))
            .collect()
    }

    /// Release frame: the release assignment with the highest frame index
    pub fn release_frame(&self) -> Option<(usize, &Frame)> {
        self.entries
            .values()
            .rev()
            .filter(|a| a.role == Role::ReleaseFrame)
            .find_map(|a| a.bound_frame.as_ref().map(|frame| (a.frame_index, frame)))
    }

    /// Drop every assignment (new import batch)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assignments in ascending frame index order
    pub fn iter(&self) -> impl Iterator<Item = &Assignment> {
        self.entries.values()
    }
}
