//! Row and column offsets of the fleet sheet.
//!
//! The sheet format is owned by whoever edits the spreadsheet, so every
//! offset the parser reads lives in [`SheetLayout`]. A format change edits
//! [`SheetLayout::FLEET_V1`] and nothing else.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemColumns {
    pub update_time: usize,
    pub default_model: usize,
    pub raw_state: usize,
    pub fallback: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionColumns {
    pub session_count: usize,
    pub active_sessions: usize,
    pub total_tokens: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentColumns {
    pub id: usize,
    pub name: usize,
    pub role: usize,
    pub model: usize,
    pub status: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    /// Grids shorter than this are treated as still warming up.
    pub min_rows: usize,
    pub system_row: usize,
    pub system: SystemColumns,
    pub session_row: usize,
    pub session: SessionColumns,
    pub agent_first_row: usize,
    pub agent_min_cells: usize,
    pub agent: AgentColumns,
}

impl SheetLayout {
    pub const FLEET_V1: SheetLayout = SheetLayout {
        min_rows: 11,
        system_row: 1,
        system: SystemColumns {
            update_time: 0,
            default_model: 1,
            raw_state: 2,
            fallback: 3,
        },
        session_row: 6,
        session: SessionColumns {
            session_count: 1,
            active_sessions: 2,
            total_tokens: 3,
        },
        agent_first_row: 10,
        agent_min_cells: 6,
        agent: AgentColumns {
            id: 1,
            name: 2,
            role: 3,
            model: 4,
            status: 5,
        },
    };
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self::FLEET_V1
    }
}
