//! Translation readiness workflow.
//!
//! Work moves forward `pending -> in_progress -> completed -> reviewed` and
//! may be sent back to an earlier stage. Re-asserting the current status is
//! allowed.

use super::model::TranslationStatus;
use crate::error::{CoreError, CoreResult};

impl TranslationStatus {
    pub fn allowed_transitions(&self) -> &'static [TranslationStatus] {
        use TranslationStatus::*;
        match self {
            Pending => &[Pending, InProgress],
            InProgress => &[InProgress, Completed, Pending],
            Completed => &[Completed, Reviewed, InProgress, Pending],
            Reviewed => &[Reviewed, InProgress, Pending],
        }
    }

    pub fn can_transition_to(&self, next: TranslationStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn transition_to(&self, next: TranslationStatus) -> CoreResult<TranslationStatus> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use TranslationStatus::*;

    #[test]
    fn forward_path_is_one_step_at_a_time() {
        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Completed.can_transition_to(Reviewed));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Reviewed));
        assert!(!InProgress.can_transition_to(Reviewed));
    }

    #[test]
    fn work_can_be_sent_back() {
        assert!(Reviewed.can_transition_to(InProgress));
        assert!(Reviewed.can_transition_to(Pending));
        assert!(Completed.can_transition_to(Pending));
        assert!(!Reviewed.can_transition_to(Completed));
    }

    #[test]
    fn self_transitions_are_allowed() {
        for s in [Pending, InProgress, Completed, Reviewed] {
            assert_eq!(s.transition_to(s).unwrap(), s);
        }
    }

    #[test]
    fn public_statuses() {
        assert!(!Pending.is_public());
        assert!(!InProgress.is_public());
        assert!(Completed.is_public());
        assert!(Reviewed.is_public());
    }

    #[test]
    fn rejection_names_the_states() {
        let err = Pending.transition_to(Reviewed).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid status transition from 'pending' to 'reviewed'; allowed: pending, in_progress"
        );
    }
}
