use crate::snapshot::FleetSnapshot;
use crate::status::AgentStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Offline agents tolerated before the fleet reads as critical. A display
/// heuristic, not a measured objective.
pub const DEGRADED_OFFLINE_MAX: usize = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    AllHealthy,
    Degraded,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::AllHealthy => "all-healthy",
            Severity::Degraded => "degraded",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn online_count(snapshot: &FleetSnapshot) -> usize {
    snapshot
        .agents
        .iter()
        .filter(|agent| agent.status().is_online())
        .count()
}

pub fn offline_bucket(online: usize, total: usize) -> Severity {
    if online == total {
        return Severity::AllHealthy;
    }
    if total.saturating_sub(online) <= DEGRADED_OFFLINE_MAX {
        Severity::Degraded
    } else {
        Severity::Critical
    }
}

/// Everything the presentation layer derives from one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FleetSummary {
    pub total: usize,
    pub online: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    pub backend_healthy: bool,
    pub session_count: u64,
    pub active_sessions: u64,
    pub total_tokens: u64,
}

impl FleetSummary {
    pub fn from_snapshot(snapshot: &FleetSnapshot) -> Self {
        let mut by_status: BTreeMap<&'static str, usize> = AgentStatus::ALL
            .iter()
            .map(|status| (status.as_str(), 0))
            .collect();
        for agent in &snapshot.agents {
            *by_status.entry(agent.status().as_str()).or_default() += 1;
        }

        Self {
            total: snapshot.agents.len(),
            online: online_count(snapshot),
            by_status,
            backend_healthy: snapshot.system.backend_healthy(),
            session_count: snapshot.session.session_count,
            active_sessions: snapshot.session.active_sessions,
            total_tokens: snapshot.session.total_tokens,
        }
    }

    pub fn offline(&self) -> usize {
        self.total.saturating_sub(self.online)
    }

    pub fn severity(&self) -> Severity {
        offline_bucket(self.online, self.total)
    }

    pub fn count(&self, status: AgentStatus) -> usize {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Agent, FleetSnapshot};

    fn agent(id: &str, raw_status: &str) -> Agent {
        Agent {
            id: id.to_string(),
            name: id.to_uppercase(),
            role: "worker".to_string(),
            model: "m".to_string(),
            raw_status: raw_status.to_string(),
        }
    }

    #[test]
    fn severity_thresholds() {
        assert_eq!(offline_bucket(9, 9), Severity::AllHealthy);
        assert_eq!(offline_bucket(8, 9), Severity::Degraded);
        assert_eq!(offline_bucket(7, 9), Severity::Degraded);
        assert_eq!(offline_bucket(6, 9), Severity::Critical);
        assert_eq!(offline_bucket(5, 9), Severity::Critical);
        assert_eq!(offline_bucket(0, 0), Severity::AllHealthy);
    }

    #[test]
    fn online_counts_busy_but_not_idle_or_unknown() {
        let snapshot = FleetSnapshot {
            agents: vec![
                agent("a", "Ready"),
                agent("b", "Busy"),
                agent("c", "Idle"),
                agent("d", "Offline"),
                agent("e", "??"),
            ],
            ..FleetSnapshot::default()
        };
        assert_eq!(online_count(&snapshot), 2);
        assert!(online_count(&snapshot) <= snapshot.agents.len());
    }

    #[test]
    fn summary_tallies_every_status() {
        let mut snapshot = FleetSnapshot {
            agents: vec![
                agent("a", "✅"),
                agent("b", "⏸️"),
                agent("c", "❌"),
                agent("d", "❌"),
                agent("e", ""),
            ],
            ..FleetSnapshot::default()
        };
        snapshot.system.raw_state = "Active".to_string();
        snapshot.session.total_tokens = 15_000;

        let summary = FleetSummary::from_snapshot(&snapshot);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.online, 1);
        assert_eq!(summary.offline(), 4);
        assert_eq!(summary.count(AgentStatus::Online), 1);
        assert_eq!(summary.count(AgentStatus::Idle), 1);
        assert_eq!(summary.count(AgentStatus::Offline), 2);
        assert_eq!(summary.count(AgentStatus::Unknown), 1);
        assert_eq!(summary.count(AgentStatus::Busy), 0);
        assert_eq!(summary.severity(), Severity::Critical);
        assert!(summary.backend_healthy);
        assert_eq!(summary.total_tokens, 15_000);
    }

    #[test]
    fn empty_snapshot_is_healthy_with_no_agents() {
        let summary = FleetSummary::from_snapshot(&FleetSnapshot::default());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.severity(), Severity::AllHealthy);
        assert!(!summary.backend_healthy);
    }
}
