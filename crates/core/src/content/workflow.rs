//! Publication workflow for content.
//!
//! ```text
//! draft     -> review | published
//! review    -> draft | published | archived
//! published -> archived
//! archived  -> draft
//! ```

use super::model::ContentStatus;
use crate::error::{CoreError, CoreResult};

impl ContentStatus {
    pub fn allowed_transitions(&self) -> &'static [ContentStatus] {
        use ContentStatus::*;
        match self {
            Draft => &[Review, Published],
            Review => &[Draft, Published, Archived],
            Published => &[Archived],
            Archived => &[Draft],
        }
    }

    pub fn can_transition_to(&self, next: ContentStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn transition_to(&self, next: ContentStatus) -> CoreResult<ContentStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
                allowed: self
                    .allowed_transitions()
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            })
        }
    }
}
