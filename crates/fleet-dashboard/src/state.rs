use crate::config::LayoutMode;
use crate::gate::{GateOutcome, PasswordGate};
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fleet_core::{parse_snapshot, FleetDataSource, FleetSnapshot, FleetSummary, GridTransport, RawGrid};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Terminals narrower than this get the compact (phone-sized) layout.
pub const COMPACT_WIDTH: u16 = 92;

pub struct App {
    pub source: FleetDataSource<Box<dyn GridTransport>>,
    pub gate: PasswordGate,
    pub password_input: String,
    pub snapshot: FleetSnapshot,
    pub summary: FleetSummary,
    pub last_grid: Option<Arc<RawGrid>>,
    pub last_loaded: Option<DateTime<Local>>,
    pub last_error: Option<String>,
    pub status_note: Option<String>,
    pub layout: LayoutMode,
    pub selected: usize,
    pub expanded: HashSet<String>,
    pub show_help: bool,
    /// Raw sheet rows instead of the agent roster.
    pub show_raw: bool,
    pub raw_offset: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        source: FleetDataSource<Box<dyn GridTransport>>,
        gate: PasswordGate,
        layout: LayoutMode,
    ) -> Self {
        Self {
            source,
            gate,
            password_input: String::new(),
            snapshot: FleetSnapshot::default(),
            summary: FleetSummary::default(),
            last_grid: None,
            last_loaded: None,
            last_error: None,
            status_note: None,
            layout,
            selected: 0,
            expanded: HashSet::new(),
            show_help: false,
            show_raw: false,
            raw_offset: 0,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn is_compact(&self, width: u16) -> bool {
        match self.layout {
            LayoutMode::Auto => width < COMPACT_WIDTH,
            LayoutMode::Desktop => false,
            LayoutMode::Compact => true,
        }
    }

    pub fn on_tick(&mut self) {
        self.refresh(false);
    }

    /// One render cycle's worth of data loading. Nothing is fetched until the
    /// gate is open. Failures keep the previous snapshot on screen.
    pub fn refresh(&mut self, force: bool) {
        if !self.gate.is_unlocked() {
            return;
        }
        let fetched = if force {
            self.source.refresh()
        } else {
            self.source.fetch(false)
        };
        match fetched {
            Ok(grid) => {
                self.apply_grid(grid);
                self.last_error = None;
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
            }
        }
    }

    fn apply_grid(&mut self, grid: Arc<RawGrid>) {
        if let Some(previous) = &self.last_grid {
            if Arc::ptr_eq(previous, &grid) {
                return;
            }
        }
        self.snapshot = parse_snapshot(&grid);
        self.summary = FleetSummary::from_snapshot(&self.snapshot);
        self.raw_offset = self.raw_offset.min(grid.len().saturating_sub(1));
        self.last_grid = Some(grid);
        self.last_loaded = Some(Local::now());

        let known: HashSet<&str> = self.snapshot.agents.iter().map(|a| a.id.as_str()).collect();
        self.expanded.retain(|id| known.contains(id.as_str()));
        if self.selected >= self.snapshot.agents.len() {
            self.selected = self.snapshot.agents.len().saturating_sub(1);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if !self.gate.is_unlocked() {
            self.handle_gate_key(key);
            return;
        }
        if self.show_help {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            KeyCode::Char('r') => {
                self.refresh(true);
                self.status_note = Some(match &self.last_error {
                    Some(_) => "refresh failed".to_string(),
                    None => "refreshed".to_string(),
                });
            }
            KeyCode::Char('v') => {
                self.show_raw = !self.show_raw;
                self.status_note = Some(
                    if self.show_raw { "raw sheet view" } else { "agent view" }.to_string(),
                );
            }
            KeyCode::Char('l') => {
                self.layout = self.layout.next();
                self.status_note = Some(format!("layout: {}", self.layout.label()));
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(-1);
            }
            KeyCode::Char('g') => {
                if self.show_raw {
                    self.raw_offset = 0;
                } else {
                    self.selected = 0;
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.toggle_expand();
            }
            _ => {}
        }
    }

    fn handle_gate_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Enter => {
                let outcome = self.gate.submit(&self.password_input);
                self.password_input.clear();
                if outcome == GateOutcome::Unlocked {
                    info!("dashboard_unlocked");
                    self.refresh(false);
                }
            }
            KeyCode::Backspace => {
                self.password_input.pop();
            }
            KeyCode::Char(ch) => {
                self.password_input.push(ch);
            }
            _ => {}
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.show_raw {
            let rows = self.last_grid.as_ref().map_or(0, |grid| grid.len());
            self.raw_offset = step(self.raw_offset, delta, rows);
        } else {
            self.selected = step(self.selected, delta, self.snapshot.agents.len());
        }
    }

    fn toggle_expand(&mut self) {
        let Some(agent) = self.snapshot.agents.get(self.selected) else {
            return;
        };
        if !self.expanded.remove(&agent.id) {
            self.expanded.insert(agent.id.clone());
        }
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current as isize + delta).clamp(0, len as isize - 1) as usize
}
