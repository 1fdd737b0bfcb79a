use crate::grid::RawGrid;
use crate::layout::SheetLayout;
use crate::status::{backend_healthy, classify, AgentStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub update_time: String,
    pub default_model: String,
    pub raw_state: String,
    pub fallback: String,
}

impl SystemStatus {
    pub fn backend_healthy(&self) -> bool {
        backend_healthy(&self.raw_state)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_count: u64,
    pub active_sessions: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub role: String,
    pub model: String,
    pub raw_status: String,
}

impl Agent {
    pub fn status(&self) -> AgentStatus {
        classify(&self.raw_status)
    }
}

/// Parsed view of one fetched grid. Replaced wholesale on every refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    pub system: SystemStatus,
    pub session: SessionInfo,
    pub agents: Vec<Agent>,
}

impl FleetSnapshot {
    pub fn is_empty(&self) -> bool {
        *self == FleetSnapshot::default()
    }
}

pub fn parse_snapshot(grid: &RawGrid) -> FleetSnapshot {
    parse_snapshot_with(grid, &SheetLayout::FLEET_V1)
}

/// Extracts a snapshot using fixed offsets. Never fails: short grids give an
/// empty snapshot, short rows give empty strings, bad numbers give zero and
/// rows that do not look like agents are skipped.
pub fn parse_snapshot_with(grid: &RawGrid, layout: &SheetLayout) -> FleetSnapshot {
    if grid.len() < layout.min_rows {
        return FleetSnapshot::default();
    }

    let sys = layout.system_row;
    let system = SystemStatus {
        update_time: grid.cell(sys, layout.system.update_time).to_string(),
        default_model: grid.cell(sys, layout.system.default_model).to_string(),
        raw_state: grid.cell(sys, layout.system.raw_state).to_string(),
        fallback: grid.cell(sys, layout.system.fallback).to_string(),
    };

    let ses = layout.session_row;
    let session = SessionInfo {
        session_count: parse_counter(grid.cell(ses, layout.session.session_count)),
        active_sessions: parse_counter(grid.cell(ses, layout.session.active_sessions)),
        total_tokens: parse_counter(grid.cell(ses, layout.session.total_tokens)),
    };

    let agents = grid
        .rows()
        .iter()
        .skip(layout.agent_first_row)
        .filter_map(|row| parse_agent_row(row, layout))
        .collect();

    FleetSnapshot {
        system,
        session,
        agents,
    }
}

fn parse_agent_row(row: &[String], layout: &SheetLayout) -> Option<Agent> {
    if row.len() < layout.agent_min_cells {
        return None;
    }
    let cell = |idx: usize| row.get(idx).cloned().unwrap_or_default();
    let id = cell(layout.agent.id);
    if id.is_empty() {
        return None;
    }
    Some(Agent {
        id,
        name: cell(layout.agent.name),
        role: cell(layout.agent.role),
        model: cell(layout.agent.model),
        raw_status: cell(layout.agent.status),
    })
}

/// Digits only; signs, separators, decimals and overflow all read as zero.
fn parse_counter(raw: &str) -> u64 {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    raw.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    fn padded_grid(len: usize) -> Vec<Vec<String>> {
        (0..len).map(|_| Vec::new()).collect()
    }

    #[test]
    fn short_grids_give_empty_snapshot() {
        for len in 0..11 {
            let mut rows = padded_grid(len);
            if len > 1 {
                rows[1] = row(&["t", "m", "Active", "fb"]);
            }
            let snapshot = parse_snapshot(&RawGrid::new(rows));
            assert!(snapshot.is_empty(), "len={len}");
        }
    }

    #[test]
    fn missing_system_and_session_cells_default() {
        let mut rows = padded_grid(11);
        rows[1] = row(&["12:00"]);
        rows[6] = row(&["Sessions", "4"]);
        let snapshot = parse_snapshot(&RawGrid::new(rows));
        assert_eq!(snapshot.system.update_time, "12:00");
        assert_eq!(snapshot.system.default_model, "");
        assert_eq!(snapshot.system.raw_state, "");
        assert_eq!(snapshot.system.fallback, "");
        assert!(!snapshot.system.backend_healthy());
        assert_eq!(snapshot.session.session_count, 4);
        assert_eq!(snapshot.session.active_sessions, 0);
        assert_eq!(snapshot.session.total_tokens, 0);
    }

    #[test]
    fn non_numeric_counters_read_as_zero() {
        assert_eq!(parse_counter("15000"), 15000);
        assert_eq!(parse_counter(" 42 "), 42);
        assert_eq!(parse_counter("1,000"), 0);
        assert_eq!(parse_counter("-3"), 0);
        assert_eq!(parse_counter("2.5"), 0);
        assert_eq!(parse_counter("n/a"), 0);
        assert_eq!(parse_counter(""), 0);
        assert_eq!(parse_counter("99999999999999999999999"), 0);
    }

    #[test]
    fn agent_rows_need_six_cells_and_an_id() {
        let mut rows = padded_grid(10);
        rows.push(row(&["", "a1", "Alpha", "coder", "m", "Ready"]));
        rows.push(row(&["", "a2", "Beta", "coder", "m"]));
        rows.push(row(&["", "", "Ghost", "coder", "m", "Ready"]));
        rows.push(Vec::new());
        rows.push(row(&["", "a3", "Gamma", "review", "m", "Idle", "extra"]));
        let snapshot = parse_snapshot(&RawGrid::new(rows));
        let ids: Vec<_> = snapshot.agents.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a3"]);
        assert_eq!(snapshot.agents[1].raw_status, "Idle");
    }

    #[test]
    fn rows_before_agent_section_are_never_agents() {
        let mut rows = padded_grid(11);
        rows[9] = row(&["", "header", "Name", "Role", "Model", "Status"]);
        rows[10] = row(&["", "a1", "Alpha", "coder", "m", "Busy"]);
        let snapshot = parse_snapshot(&RawGrid::new(rows));
        assert_eq!(snapshot.agents.len(), 1);
        assert_eq!(snapshot.agents[0].status(), AgentStatus::Busy);
    }

    #[test]
    fn custom_layout_moves_every_offset() {
        let layout = SheetLayout {
            min_rows: 3,
            system_row: 0,
            session_row: 1,
            agent_first_row: 2,
            ..SheetLayout::FLEET_V1
        };
        let grid = RawGrid::new(vec![
            row(&["now", "model", "Active", "fb"]),
            row(&["", "1", "1", "10"]),
            row(&["", "x", "X", "r", "m", "Ready"]),
        ]);
        let snapshot = parse_snapshot_with(&grid, &layout);
        assert_eq!(snapshot.system.update_time, "now");
        assert_eq!(snapshot.session.total_tokens, 10);
        assert_eq!(snapshot.agents.len(), 1);
    }
}
