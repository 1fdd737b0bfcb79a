use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, warn};

pub const PASSWORD_ENV: &str = "DASHBOARD_PASSWORD";

#[derive(Debug, Default, Deserialize)]
struct SecretsFile {
    #[serde(default)]
    dashboard: Option<DashboardSecrets>,
}

#[derive(Debug, Default, Deserialize)]
struct DashboardSecrets {
    #[serde(default)]
    password: Option<String>,
}

pub fn password_from_env_or_file(secrets_path: &Path) -> Option<String> {
    resolve_password(std::env::var(PASSWORD_ENV).ok(), secrets_path)
}

/// The environment wins; the `[dashboard] password` entry of the secrets
/// file is the fallback. `None` means the gate can never open.
pub fn resolve_password(env_value: Option<String>, secrets_path: &Path) -> Option<String> {
    if let Some(value) = env_value.filter(|value| !value.is_empty()) {
        return Some(value);
    }

    let contents = match fs::read_to_string(secrets_path) {
        Ok(contents) => contents,
        Err(err) => {
            error!(path = %secrets_path.display(), "password_config_unreadable: {err}");
            return None;
        }
    };
    let secrets: SecretsFile = match toml::from_str(&contents) {
        Ok(secrets) => secrets,
        Err(err) => {
            error!(path = %secrets_path.display(), "password_config_invalid: {err}");
            return None;
        }
    };
    let password = secrets
        .dashboard
        .and_then(|dashboard| dashboard.password)
        .filter(|value| !value.is_empty());
    if password.is_none() {
        error!(path = %secrets_path.display(), "password_config_missing");
    }
    password
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Unlocked,
    Rejected,
    Unconfigured,
}

/// Session-scoped password check. Once unlocked it stays unlocked for the
/// life of the process; there is no expiry and no lockout.
#[derive(Debug)]
pub struct PasswordGate {
    expected: Option<String>,
    unlocked: bool,
    last_outcome: Option<GateOutcome>,
}

impl PasswordGate {
    pub fn new(expected: Option<String>) -> Self {
        Self {
            expected,
            unlocked: false,
            last_outcome: None,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn last_outcome(&self) -> Option<GateOutcome> {
        self.last_outcome
    }

    pub fn submit(&mut self, attempt: &str) -> GateOutcome {
        if self.unlocked {
            return GateOutcome::Unlocked;
        }
        let outcome = match self.expected.as_deref() {
            None => {
                error!("password_check_unconfigured");
                GateOutcome::Unconfigured
            }
            Some(expected) if expected == attempt => GateOutcome::Unlocked,
            Some(_) => {
                warn!("password_check_failed");
                GateOutcome::Rejected
            }
        };
        self.unlocked = outcome == GateOutcome::Unlocked;
        self.last_outcome = Some(outcome);
        outcome
    }
}
