use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The configured voting window. Singleton record; voting is permitted iff
/// `start_time <= now <= end_time` (both ends inclusive).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionWindow {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStatus {
    NotConfigured,
    NotStarted,
    Open,
    Closed,
}

impl std::fmt::Display for WindowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::NotConfigured => "not configured",
            Self::NotStarted => "not started",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Pure function of the window record and wall-clock time. Callers must
/// re-evaluate it per request; it changes with time, not with data.
pub fn window_status(window: Option<&ElectionWindow>, now: DateTime<Utc>) -> WindowStatus {
    match window {
        None => WindowStatus::NotConfigured,
        Some(window) if now < window.start_time => WindowStatus::NotStarted,
        Some(window) if now > window.end_time => WindowStatus::Closed,
        Some(_) => WindowStatus::Open,
    }
}

/// Policy for the one ambiguous case: whether an absent window means voting
/// is open. Defaults to closed; `OPEN_WHEN_UNSCHEDULED` opts in.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowPolicy {
    pub open_when_unscheduled: bool,
}

impl WindowPolicy {
    pub fn permits(&self, status: WindowStatus) -> bool {
        match status {
            WindowStatus::Open => true,
            WindowStatus::NotConfigured => self.open_when_unscheduled,
            WindowStatus::NotStarted | WindowStatus::Closed => false,
        }
    }
}
