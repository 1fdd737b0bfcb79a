use fleet_core::{AgentStatus, FleetSummary, Severity};
use ratatui::style::{Color, Modifier, Style};

#[derive(Clone, Copy)]
pub struct FleetTheme {
    pub bg: Color,
    pub surface: Color,
    pub border: Color,
    pub title: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub ok: Color,
    pub warn: Color,
    pub critical: Color,
    pub info: Color,
}

pub fn fleet_theme() -> FleetTheme {
    FleetTheme {
        bg: Color::Rgb(11, 18, 32),
        surface: Color::Rgb(17, 26, 46),
        border: Color::Rgb(71, 85, 105),
        title: Color::Rgb(191, 219, 254),
        text: Color::Rgb(226, 232, 240),
        muted: Color::Rgb(148, 163, 184),
        accent: Color::Rgb(56, 189, 248),
        ok: Color::Rgb(34, 197, 94),
        warn: Color::Rgb(245, 158, 11),
        critical: Color::Rgb(239, 68, 68),
        info: Color::Rgb(59, 130, 246),
    }
}

pub fn selected_style(theme: FleetTheme) -> Style {
    Style::new()
        .bg(theme.border)
        .fg(theme.text)
        .add_modifier(Modifier::BOLD)
}

pub fn zebra_row_style(theme: FleetTheme, index: usize) -> Style {
    let bg = if index % 2 == 0 {
        theme.surface
    } else {
        theme.bg
    };
    Style::new().bg(bg).fg(theme.text)
}

pub mod icons {
    pub const ONLINE: &str = "🟢";
    pub const IDLE: &str = "⚪";
    pub const OFFLINE: &str = "🔴";
    pub const UNKNOWN: &str = "❔";
    pub const HEALTHY: &str = "✓";
    pub const UNHEALTHY: &str = "✗";
    pub const EXPANDED: &str = "v";
    pub const COLLAPSED: &str = ">";
}

pub fn status_icon(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Online | AgentStatus::Busy => icons::ONLINE,
        AgentStatus::Idle => icons::IDLE,
        AgentStatus::Offline => icons::OFFLINE,
        AgentStatus::Unknown => icons::UNKNOWN,
    }
}

pub fn status_color(status: AgentStatus, theme: FleetTheme) -> Color {
    match status {
        AgentStatus::Online => theme.ok,
        AgentStatus::Busy => theme.info,
        AgentStatus::Idle => theme.muted,
        AgentStatus::Offline => theme.critical,
        AgentStatus::Unknown => theme.warn,
    }
}

pub fn severity_color(severity: Severity, theme: FleetTheme) -> Color {
    match severity {
        Severity::AllHealthy => theme.ok,
        Severity::Degraded => theme.warn,
        Severity::Critical => theme.critical,
    }
}

pub fn severity_text(summary: &FleetSummary) -> String {
    match summary.severity() {
        Severity::AllHealthy => "✅ all online".to_string(),
        Severity::Degraded => format!("⚠️ {} offline", summary.offline()),
        Severity::Critical => format!("❌ {} offline", summary.offline()),
    }
}

pub fn health_color(healthy: bool, theme: FleetTheme) -> Color {
    if healthy {
        theme.ok
    } else {
        theme.critical
    }
}
