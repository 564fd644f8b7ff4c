//! Drift notification state shown to the user until dismissed.

use serde::{Deserialize, Serialize};

/// `{active, newVersion}` as exposed to the display layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationState {
    pub active: bool,
    pub new_version: Option<String>,
}

impl NotificationState {
    /// Raise the notification for a confirmed mismatch.
    pub fn raise(&mut self, new_version: impl Into<String>) {
        self.active = true;
        self.new_version = Some(new_version.into());
    }

    /// Clear the notification. Valid when inactive too; returns whether
    /// anything changed.
    pub fn dismiss(&mut self) -> bool {
        let changed = self.active || self.new_version.is_some();
        self.active = false;
        self.new_version = None;
        changed
    }
}
