//! Remote acknowledgement check.

use super::PreflightWarning;
use crate::notify::NotifyChannel;

/// Warn if the remote still holds an unacknowledged kick.
pub fn check_remote_idle(notify: &NotifyChannel) -> Option<PreflightWarning> {
    notify
        .remote_busy()
        .map(|obs| PreflightWarning::RemoteBusy { obs })
}
