use crate::gate::GateOutcome;
use crate::state::App;
use crate::theme::{self, fleet_theme, icons, FleetTheme};
use fleet_core::Agent;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState,
        Wrap,
    },
    Frame,
};

const TITLE: &str = "🚢 Fleet Command Center";

pub fn render(frame: &mut Frame, app: &App) {
    let theme = fleet_theme();
    let area = frame.size();
    frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), area);

    if !app.gate.is_unlocked() {
        render_gate(frame, app, theme, area);
        return;
    }

    let compact = app.is_compact(area.width);
    let mut constraints = vec![
        Constraint::Length(4),
        Constraint::Length(if compact { 8 } else { 5 }),
    ];
    if app.last_error.is_some() {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(1));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    frame.render_widget(render_header(app, theme, compact, area.width), chunks[0]);
    render_cards(frame, app, theme, compact, chunks[1]);
    let mut next = 2;
    if let Some(error) = app.last_error.as_deref() {
        frame.render_widget(render_error(error, theme), chunks[next]);
        next += 1;
    }
    if app.show_raw {
        render_raw_grid(frame, app, theme, chunks[next]);
    } else if compact {
        render_agent_list(frame, app, theme, chunks[next]);
    } else {
        render_agent_table(frame, app, theme, chunks[next]);
    }
    frame.render_widget(render_footer(app, theme, compact), chunks[next + 1]);

    if app.show_help {
        render_help_overlay(frame, theme);
    }
}

fn render_gate(frame: &mut Frame, app: &App, theme: FleetTheme, area: Rect) {
    let area = centered_rect(60, 40, area);
    let masked = "•".repeat(app.password_input.chars().count());
    let mut lines = vec![
        Line::from(Span::styled(
            "🔐 Fleet Command Center",
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Password: ", Style::default().fg(theme.muted)),
            Span::styled(format!("{masked}_"), Style::default().fg(theme.text)),
        ]),
        Line::from(""),
    ];
    let (note, color) = match app.gate.last_outcome() {
        Some(GateOutcome::Rejected) => ("❌ Wrong password", theme.critical),
        Some(GateOutcome::Unconfigured) => ("❌ No password configured", theme.critical),
        _ => ("Ask the fleet owner for access", theme.info),
    };
    lines.push(Line::from(Span::styled(note, Style::default().fg(color))));
    lines.push(Line::from(Span::styled(
        "Enter submit · Esc quit",
        Style::default().fg(theme.muted),
    )));

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .style(Style::default().fg(theme.text).bg(theme.surface))
            .block(panel("Access", theme)),
        area,
    );
}

fn render_header(app: &App, theme: FleetTheme, compact: bool, width: u16) -> Paragraph<'static> {
    let inner_width = width.saturating_sub(4) as usize;
    let updated = app
        .last_loaded
        .map(|at| {
            if compact {
                at.format("%H:%M").to_string()
            } else {
                at.format("%Y-%m-%d %H:%M:%S").to_string()
            }
        })
        .unwrap_or_else(|| "never".to_string());
    let age = app
        .source
        .cached_age()
        .map(|age| format!("{}s", age.as_secs()))
        .unwrap_or_else(|| "-".to_string());
    let system = &app.snapshot.system;

    let mut fields = vec![format!("Updated: {updated}"), format!("Age: {age}")];
    if !compact {
        fields.push(format!("Sheet: {}", ellipsize(app.source.source_id(), 24)));
        if !system.update_time.is_empty() {
            fields.push(format!("Sheet time: {}", system.update_time));
        }
        if !system.default_model.is_empty() {
            fields.push(format!("Model: {}", system.default_model));
        }
        if !system.fallback.is_empty() {
            fields.push(format!("Fallback: {}", system.fallback));
        }
    }
    let status_line = fit_fields(&fields, inner_width.max(12));
    let action = app.status_note.as_deref().unwrap_or("ready (r refresh, ? help)");

    Paragraph::new(Text::from(vec![
        Line::from(Span::styled(status_line, Style::default().fg(theme.text))),
        Line::from(Span::styled(
            ellipsize(&format!("Last Action: {action}"), inner_width.max(12)),
            Style::default().fg(theme.muted),
        )),
    ]))
    .style(Style::default().fg(theme.text).bg(theme.bg))
    .block(panel(TITLE, theme))
}

fn render_cards(frame: &mut Frame, app: &App, theme: FleetTheme, compact: bool, area: Rect) {
    let summary = &app.summary;
    let severity_color = theme::severity_color(summary.severity(), theme);
    let healthy = summary.backend_healthy;

    let agents_card = card(
        "Agents online",
        format!("{}/{}", summary.online, summary.total),
        severity_color,
        theme::severity_text(summary),
        theme,
    );
    let backend_card = card(
        "Backend auth",
        if healthy { icons::HEALTHY } else { icons::UNHEALTHY }.to_string(),
        theme::health_color(healthy, theme),
        if healthy { "valid" } else { "re-authentication needed" }.to_string(),
        theme,
    );

    if compact {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Length(4)])
            .split(area);
        frame.render_widget(agents_card, rows[0]);
        frame.render_widget(backend_card, rows[1]);
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);
    frame.render_widget(agents_card, columns[0]);
    frame.render_widget(backend_card, columns[1]);
    frame.render_widget(
        card(
            "Sessions",
            summary.session_count.to_string(),
            theme.accent,
            format!("{} active", summary.active_sessions),
            theme,
        ),
        columns[2],
    );
    frame.render_widget(
        card(
            "Tokens",
            format_tokens(summary.total_tokens),
            theme.accent,
            format!(
                "{} idle · {} unknown",
                summary.count(fleet_core::AgentStatus::Idle),
                summary.count(fleet_core::AgentStatus::Unknown)
            ),
            theme,
        ),
        columns[3],
    );
}

fn card(
    title: &str,
    value: String,
    accent: ratatui::style::Color,
    caption: String,
    theme: FleetTheme,
) -> Paragraph<'static> {
    Paragraph::new(Text::from(vec![
        Line::from(Span::styled(
            value,
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(caption, Style::default().fg(theme.muted))),
    ]))
    .alignment(Alignment::Center)
    .style(Style::default().fg(theme.text).bg(theme.surface))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent))
            .style(Style::default().bg(theme.surface))
            .title(Span::styled(
                title.to_string(),
                Style::default().fg(theme.title),
            )),
    )
}

fn render_error(error: &str, theme: FleetTheme) -> Paragraph<'static> {
    Paragraph::new(Line::from(Span::styled(
        format!("⚠️ {error}"),
        Style::default().fg(theme.warn),
    )))
    .style(Style::default().bg(theme.surface))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.warn))
            .style(Style::default().bg(theme.surface)),
    )
    .wrap(Wrap { trim: true })
}

fn render_empty(frame: &mut Frame, app: &App, theme: FleetTheme, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "⚠️ No fleet data yet. Check the sheet connection.",
            Style::default().fg(theme.warn),
        )),
        Line::from(""),
        Line::from(format!("source: {}", app.source.source_id())),
        Line::from("Press r to retry, q to quit."),
    ];
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .style(Style::default().fg(theme.text).bg(theme.surface))
            .block(panel("Agents", theme))
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_agent_table(frame: &mut Frame, app: &App, theme: FleetTheme, area: Rect) {
    if app.snapshot.agents.is_empty() {
        render_empty(frame, app, theme, area);
        return;
    }

    let header = Row::new(["", "ID", "Name", "Role", "Model", "Status"])
        .style(
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        )
        .bottom_margin(1);
    let rows: Vec<Row> = app
        .snapshot
        .agents
        .iter()
        .enumerate()
        .map(|(idx, agent)| {
            let status = agent.status();
            let color = theme::status_color(status, theme);
            Row::new(vec![
                Cell::from(theme::status_icon(status)),
                Cell::from(agent.id.clone()),
                Cell::from(agent.name.clone()),
                Cell::from(agent.role.clone()),
                Cell::from(agent.model.clone()),
                Cell::from(Span::styled(
                    format!("{} ({})", status, agent.raw_status),
                    Style::default().fg(color),
                )),
            ])
            .style(theme::zebra_row_style(theme, idx))
        })
        .collect();
    let widths = [
        Constraint::Length(3),
        Constraint::Percentage(15),
        Constraint::Percentage(25),
        Constraint::Percentage(15),
        Constraint::Percentage(20),
        Constraint::Percentage(25),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .highlight_style(theme::selected_style(theme))
        .block(panel(
            &format!("Agents ({}/{} online)", app.summary.online, app.summary.total),
            theme,
        ));
    let mut state = TableState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(table, area, &mut state);
}

/// Caps the raw view; the fleet sheet only uses the first six columns.
const RAW_MAX_COLUMNS: usize = 12;

fn render_raw_grid(frame: &mut Frame, app: &App, theme: FleetTheme, area: Rect) {
    let Some(grid) = app.last_grid.as_deref().filter(|grid| !grid.is_empty()) else {
        render_empty(frame, app, theme, area);
        return;
    };

    let columns = grid
        .rows()
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .clamp(1, RAW_MAX_COLUMNS);
    let mut header = vec![Cell::from("#")];
    header.extend((0..columns).map(|col| Cell::from(column_label(col))));
    let rows: Vec<Row> = grid
        .rows()
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let mut cells = vec![Cell::from(Span::styled(
                idx.to_string(),
                Style::default().fg(theme.muted),
            ))];
            cells.extend((0..columns).map(|col| Cell::from(grid.cell(idx, col).to_string())));
            if row.is_empty() {
                cells.truncate(1);
            }
            Row::new(cells).style(theme::zebra_row_style(theme, idx))
        })
        .collect();

    let mut widths = vec![Constraint::Length(4)];
    widths.extend((0..columns).map(|_| Constraint::Ratio(1, columns as u32)));
    let table = Table::new(rows, widths)
        .header(
            Row::new(header).style(
                Style::default()
                    .fg(theme.title)
                    .add_modifier(Modifier::BOLD),
            ),
        )
        .highlight_style(theme::selected_style(theme))
        .block(panel(
            &format!("Raw sheet ({} rows, v to close)", grid.len()),
            theme,
        ));
    let mut state = TableState::default().with_selected(Some(app.raw_offset));
    frame.render_stateful_widget(table, area, &mut state);
}

fn column_label(col: usize) -> String {
    let mut label = String::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        label.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    label
}

fn render_agent_list(frame: &mut Frame, app: &App, theme: FleetTheme, area: Rect) {
    if app.snapshot.agents.is_empty() {
        render_empty(frame, app, theme, area);
        return;
    }

    let items: Vec<ListItem> = app
        .snapshot
        .agents
        .iter()
        .map(|agent| agent_list_item(agent, app.expanded.contains(&agent.id), theme))
        .collect();
    let list = List::new(items)
        .highlight_style(theme::selected_style(theme))
        .block(panel("Agents", theme));
    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn agent_list_item(agent: &Agent, expanded: bool, theme: FleetTheme) -> ListItem<'static> {
    let status = agent.status();
    let marker = if expanded {
        icons::EXPANDED
    } else {
        icons::COLLAPSED
    };
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{marker} "), Style::default().fg(theme.muted)),
        Span::raw(format!("{} ", theme::status_icon(status))),
        Span::styled(
            format!("{} - {}", agent.name, agent.role),
            Style::default().fg(theme.text),
        ),
    ])];
    if expanded {
        lines.push(Line::from(Span::styled(
            format!("    status: {}", agent.raw_status),
            Style::default().fg(theme::status_color(status, theme)),
        )));
        lines.push(Line::from(Span::styled(
            format!("    id: {}", agent.id),
            Style::default().fg(theme.muted),
        )));
        lines.push(Line::from(Span::styled(
            format!("    model: {}", agent.model),
            Style::default().fg(theme.muted),
        )));
    }
    ListItem::new(Text::from(lines))
}

fn render_footer(app: &App, theme: FleetTheme, compact: bool) -> Paragraph<'static> {
    let text = if compact {
        "r refresh · Enter details · v raw · l layout · q quit".to_string()
    } else {
        format!(
            "r refresh · j/k select · v raw sheet · l layout ({}) · ? help · q quit",
            app.layout.label()
        )
    };
    Paragraph::new(Line::from(Span::styled(text, Style::default().fg(theme.muted))))
        .style(Style::default().bg(theme.bg))
}

fn render_help_overlay(frame: &mut Frame, theme: FleetTheme) {
    let area = centered_rect(70, 60, frame.size());
    let section = |title: &'static str| {
        Line::from(Span::styled(
            title,
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ))
    };
    let lines = vec![
        section("Data"),
        Line::from("  r        refresh now (bypasses the cache)"),
        Line::from("  v        toggle the raw sheet rows"),
        Line::from(""),
        section("Navigation"),
        Line::from("  j/k      select agent"),
        Line::from("  g        jump to first agent"),
        Line::from("  Enter    expand agent details (compact layout)"),
        Line::from("  l        cycle layout auto/desktop/compact"),
        Line::from(""),
        section("Exit"),
        Line::from("  ?/Esc    close this help"),
        Line::from("  q        quit"),
    ];
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .style(Style::default().fg(theme.text).bg(theme.surface))
            .block(panel("Help", theme))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn panel(title: &str, theme: FleetTheme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .style(Style::default().bg(theme.surface))
        .title(Span::styled(
            title.to_string(),
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        ))
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
        ])
        .split(vertical[1])[1]
}

// The `k` arm stops where one decimal would round up to "1000.0k".
fn format_tokens(tokens: u64) -> String {
    match tokens {
        0..=9_999 => tokens.to_string(),
        10_000..=999_949 => format!("{:.1}k", tokens as f64 / 1_000.0),
        _ => format!("{:.1}M", tokens as f64 / 1_000_000.0),
    }
}

fn ellipsize(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    if max <= 3 {
        return "...".chars().take(max).collect();
    }
    let prefix: String = input.chars().take(max - 3).collect();
    format!("{prefix}...")
}

fn fit_fields(fields: &[String], max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let mut output = String::new();
    for field in fields {
        if field.trim().is_empty() {
            continue;
        }
        let candidate = if output.is_empty() {
            field.clone()
        } else {
            format!("{output} | {field}")
        };
        if candidate.chars().count() <= max {
            output = candidate;
            continue;
        }
        if output.is_empty() {
            return ellipsize(field, max);
        }
        break;
    }
    output
}
