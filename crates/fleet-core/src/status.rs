use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Online,
    Idle,
    Busy,
    Offline,
    Unknown,
}

impl AgentStatus {
    pub const ALL: [AgentStatus; 5] = [
        AgentStatus::Online,
        AgentStatus::Idle,
        AgentStatus::Busy,
        AgentStatus::Offline,
        AgentStatus::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Online => "online",
            AgentStatus::Idle => "idle",
            AgentStatus::Busy => "busy",
            AgentStatus::Offline => "offline",
            AgentStatus::Unknown => "unknown",
        }
    }

    /// Busy agents are up and working, so they count towards "online".
    pub fn is_online(&self) -> bool {
        matches!(self, AgentStatus::Online | AgentStatus::Busy)
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Order matters: the first matching entry wins.
const STATUS_TABLE: &[(&str, AgentStatus)] = &[
    ("Active", AgentStatus::Online),
    ("Ready", AgentStatus::Online),
    ("✅", AgentStatus::Online),
    ("Idle", AgentStatus::Idle),
    ("⏸️", AgentStatus::Idle),
    ("Busy", AgentStatus::Busy),
    ("Offline", AgentStatus::Offline),
    ("❌", AgentStatus::Offline),
];

/// Maps a raw status cell onto [`AgentStatus`].
///
/// Exact matches are tried before substring matches, each pass walking the
/// table in order. Anything unrecognised is `Unknown`, never `Online`.
pub fn classify(raw: &str) -> AgentStatus {
    let raw = raw.trim();
    if raw.is_empty() {
        return AgentStatus::Unknown;
    }
    if let Some((_, status)) = STATUS_TABLE.iter().find(|(key, _)| *key == raw) {
        return *status;
    }
    STATUS_TABLE
        .iter()
        .find(|(key, _)| raw.contains(key))
        .map(|(_, status)| *status)
        .unwrap_or(AgentStatus::Unknown)
}

/// Backend (OAuth) health of the whole fleet. Binary on purpose: only a
/// state containing `Active` is healthy, everything else is not.
pub fn backend_healthy(raw_state: &str) -> bool {
    raw_state.contains("Active")
}
