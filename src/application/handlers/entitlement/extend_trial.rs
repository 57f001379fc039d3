//! Extend trial command handler (admin).

use crate::domain::entitlement::EntitlementError;
use crate::domain::foundation::UserId;

use super::trial_lifecycle::TrialLifecycle;

#[derive(Debug, Clone)]
pub struct ExtendTrialCommand {
    pub user_id: UserId,
    pub extra_days: i64,
}

/// Admin handler that pushes a trial's end date forward.
pub struct ExtendTrialHandler {
    trials: TrialLifecycle,
}

impl ExtendTrialHandler {
    pub fn new(trials: TrialLifecycle) -> Self {
        Self { trials }
    }

    /// Returns `true` when the trial was extended, `false` when the user
    /// has no trial or the day count is not positive.
    pub async fn handle(&self, command: ExtendTrialCommand) -> Result<bool, EntitlementError> {
        self.trials
            .extend(&command.user_id, command.extra_days)
            .await
    }
}
