//! TUI views and rendering
//!
//! All rendering logic is contained here. Views read the session and the
//! presentation state; the only writes are cached scroll bounds.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing::trace;

use super::state::{Focus, UiState, quick_actions, status_badge};
use crate::agent::AgentState;
use crate::session::{EntryKind, SessionState};

mod colors {
    use ratatui::style::Color;

    pub const IDLE: Color = Color::Gray;
    pub const RESEARCHING: Color = Color::Rgb(100, 149, 237); // Cornflower blue
    pub const GENERATING: Color = Color::Rgb(255, 191, 0); // Amber
    pub const COMPLETE: Color = Color::Rgb(50, 205, 50); // Lime green
    pub const OTHER: Color = Color::Magenta;
    pub const HEADER: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const KEYBIND: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const SELECTED_BG: Color = Color::Rgb(40, 40, 40);
    pub const DIM: Color = Color::DarkGray;

    pub const USER: Color = Color::Rgb(0, 255, 127); // Green
    pub const ERROR: Color = Color::Rgb(220, 20, 60); // Crimson
}

/// Badge color for an agent state
fn state_color(state: &AgentState) -> Color {
    match state {
        AgentState::Idle => colors::IDLE,
        AgentState::Researching => colors::RESEARCHING,
        AgentState::GeneratingPlan => colors::GENERATING,
        AgentState::Complete => colors::COMPLETE,
        AgentState::Other(_) => colors::OTHER,
    }
}

/// Main render function
pub fn render(ui: &mut UiState, session: &SessionState, frame: &mut Frame) {
    trace!("render: called");
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Chat + sidebar
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    render_header(session, frame, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(36)])
        .split(chunks[1]);

    render_chat(ui, session, frame, body[0]);
    render_sidebar(ui, session, frame, body[1]);
    render_footer(ui, session, frame, chunks[2]);

    if session.is_plan_modal_open() {
        render_plan_modal(ui, session, frame, frame.area());
    }
    if ui.show_help {
        render_help_overlay(frame, frame.area());
    }
}

fn render_header(session: &SessionState, frame: &mut Frame, area: Rect) {
    let state = session.agent_status();
    let mut spans = vec![
        Span::styled(
            " ResearchDesk",
            Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ "),
        Span::styled(
            format!(" {} ", status_badge(state)),
            Style::default()
                .fg(Color::Black)
                .bg(state_color(state))
                .add_modifier(Modifier::BOLD),
        ),
    ];

    if let Some(company) = session.current_company() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(company, Style::default().add_modifier(Modifier::BOLD)));
    }
    if let Some(message) = session.status_message() {
        spans.push(Span::styled(" │ ", Style::default().fg(colors::DIM)));
        spans.push(Span::styled(message, Style::default().fg(colors::DIM)));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn calculate_input_height(input: &str, width: u16) -> u16 {
    if input.is_empty() {
        return 1;
    }

    // Account for "> " prefix (2 chars) and cursor "_" (1 char)
    let effective_width = width.saturating_sub(3) as usize;
    if effective_width == 0 {
        return 1;
    }

    let lines = input.chars().count().div_ceil(effective_width);
    lines.clamp(1, 6) as u16
}

/// Transcript, busy indicator and input under one border
fn render_chat(ui: &mut UiState, session: &SessionState, frame: &mut Frame, area: Rect) {
    let border = if ui.focus == Focus::Input { colors::HEADER } else { colors::DIM };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Chat ")
        .border_style(Style::default().fg(border));

    let inner = block.inner(area);
    let input_height = calculate_input_height(session.input_buffer(), inner.width);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(input_height)])
        .split(inner);

    frame.render_widget(block, area);
    render_transcript(ui, session, frame, chunks[0]);
    render_input(ui, session, frame, chunks[1]);
}

fn render_transcript(ui: &mut UiState, session: &SessionState, frame: &mut Frame, area: Rect) {
    trace!(entries = session.transcript().len(), "render_transcript: called");
    let mut lines: Vec<Line> = Vec::new();

    for entry in session.transcript() {
        match entry.kind {
            EntryKind::User => prefixed_lines(&mut lines, &entry.content, "> ", colors::USER),
            EntryKind::Agent => {
                let markdown_text = tui_markdown::from_str(&entry.content);
                for line in markdown_text.lines.iter() {
                    let mut spans = vec![Span::raw("  ")];
                    spans.extend(line.spans.iter().cloned());
                    lines.push(Line::from(spans));
                }
            }
            EntryKind::Error => prefixed_lines(&mut lines, &entry.content, "! ", colors::ERROR),
        }
        lines.push(Line::from(""));
    }

    if let Some(since) = ui.busy_since.filter(|_| session.is_busy()) {
        let word = if ui.busy_word.is_empty() { "Thinking" } else { &ui.busy_word };
        lines.push(Line::from(vec![Span::styled(
            format!("* {}... ({})", word, format_elapsed(since.elapsed())),
            Style::default().fg(colors::DIM),
        )]));
    } else if session.is_busy() {
        lines.push(Line::from(vec![Span::styled(
            "* Thinking...",
            Style::default().fg(colors::DIM),
        )]));
    }

    if session.transcript().is_empty() && !session.is_busy() {
        lines.push(Line::from(vec![Span::styled(
            "Welcome to ResearchDesk",
            Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
        )]));
        lines.push(Line::from(""));
        lines.push(Line::from(vec![Span::styled(
            "Ask the agent to research a company, e.g. \"Research Tesla\". Finished account plans appear on the right.",
            Style::default().fg(colors::DIM),
        )]));
    }

    let viewport_height = area.height as usize;
    let viewport_width = area.width as usize;

    // Visual line count, accounting for wrapping
    let content_height: usize = lines
        .iter()
        .map(|line| {
            let line_width = line.width();
            if viewport_width == 0 || line_width == 0 {
                1
            } else {
                line_width.div_ceil(viewport_width)
            }
        })
        .sum();

    let max_scroll = content_height.saturating_sub(viewport_height);
    ui.transcript_max_scroll = max_scroll;
    let scroll = ui.transcript_scroll.unwrap_or(max_scroll).min(max_scroll);

    let transcript = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll_offset(scroll), 0));
    frame.render_widget(transcript, area);
}

/// Push `content` with a colored marker on the first line
fn prefixed_lines<'a>(lines: &mut Vec<Line<'a>>, content: &'a str, marker: &'static str, color: Color) {
    for (i, content_line) in content.lines().enumerate() {
        let prefix = if i == 0 {
            Span::styled(marker, Style::default().fg(color).add_modifier(Modifier::BOLD))
        } else {
            Span::raw("  ")
        };
        lines.push(Line::from(vec![prefix, Span::styled(content_line, Style::default().fg(color))]));
    }
}

fn render_input(ui: &UiState, session: &SessionState, frame: &mut Frame, area: Rect) {
    let input = session.input_buffer();
    let input_style = if session.is_busy() {
        Style::default().fg(colors::DIM)
    } else {
        Style::default().fg(Color::White)
    };

    let mut cursor_pos = ui.cursor_pos.min(input.len());
    while cursor_pos > 0 && !input.is_char_boundary(cursor_pos) {
        cursor_pos -= 1;
    }
    let (before_cursor, after_cursor) = input.split_at(cursor_pos);

    let mut spans = vec![Span::styled(
        "> ",
        Style::default().fg(colors::USER).add_modifier(Modifier::BOLD),
    )];
    if !before_cursor.is_empty() {
        spans.push(Span::styled(before_cursor, input_style));
    }

    if ui.focus != Focus::Input {
        if !after_cursor.is_empty() {
            spans.push(Span::styled(after_cursor, input_style));
        }
    } else if after_cursor.is_empty() {
        spans.push(Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)));
    } else {
        let mut chars = after_cursor.chars();
        if let Some(c) = chars.next() {
            spans.push(Span::styled(
                c.to_string(),
                Style::default().fg(Color::Black).bg(Color::White),
            ));
            let remaining = chars.as_str();
            if !remaining.is_empty() {
                spans.push(Span::styled(remaining, input_style));
            }
        }
    }

    let paragraph = Paragraph::new(Line::from(spans)).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_sidebar(ui: &UiState, session: &SessionState, frame: &mut Frame, area: Rect) {
    let actions = quick_actions(session);
    let research_height = if session.shows_current_research() { 4 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(research_height),
            Constraint::Length(actions.len() as u16 + 2),
        ])
        .split(area);

    render_plan_list(ui, session, frame, chunks[0]);
    if session.shows_current_research() {
        render_current_research(session, frame, chunks[1]);
    }

    let lines: Vec<Line> = actions
        .iter()
        .enumerate()
        .map(|(i, action)| {
            Line::from(vec![
                Span::styled(format!(" Alt+{} ", i + 1), Style::default().fg(colors::KEYBIND)),
                Span::raw(action.label()),
            ])
        })
        .collect();
    let quick = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Quick Actions "));
    frame.render_widget(quick, chunks[2]);
}

fn render_plan_list(ui: &UiState, session: &SessionState, frame: &mut Frame, area: Rect) {
    let focused = ui.focus == Focus::Plans;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Plans ({}) ", session.plans().len()))
        .border_style(Style::default().fg(if focused { colors::HEADER } else { colors::DIM }));

    if session.plans().is_empty() {
        let inner = block.inner(area);
        frame.render_widget(block, area);
        render_empty_message(frame, inner, "No plans generated yet");
        return;
    }

    let mut lines = Vec::new();
    for (i, plan) in session.plans().iter().enumerate() {
        let selected = focused && i == ui.plan_selected;
        let style = if selected {
            Style::default().bg(colors::SELECTED_BG).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let marker = if selected { "▶ " } else { "  " };
        lines.push(Line::from(vec![
            Span::styled(marker, style.fg(colors::KEYBIND)),
            Span::styled(plan.company.as_str(), style),
        ]));
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(plan.timestamp.as_str(), Style::default().fg(colors::DIM)),
        ]));
    }

    // Keep the selected plan (two lines each) in view
    let visible = block.inner(area).height as usize;
    let scroll = (ui.plan_selected * 2 + 2).saturating_sub(visible);

    let list = Paragraph::new(lines).block(block).scroll((scroll_offset(scroll), 0));
    frame.render_widget(list, area);
}

fn render_current_research(session: &SessionState, frame: &mut Frame, area: Rect) {
    let state = session.agent_status();
    let lines = vec![
        Line::from(vec![Span::styled(
            session.current_company().unwrap_or_default(),
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(vec![Span::styled(
            state.display_label(),
            Style::default().fg(state_color(state)),
        )]),
    ];
    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Current Research "));
    frame.render_widget(panel, area);
}

fn render_footer(ui: &UiState, session: &SessionState, frame: &mut Frame, area: Rect) {
    let content = if let Some(notice) = &ui.notice {
        Line::from(vec![Span::styled(notice.as_str(), Style::default().fg(Color::Yellow))])
    } else {
        let binds: Vec<(&str, &str)> = if session.is_plan_modal_open() {
            vec![("[Esc]", "Close"), ("[j/k]", "Scroll"), ("[g/G]", "Top/Bottom")]
        } else if ui.focus == Focus::Plans {
            vec![("[Enter]", "View plan"), ("[r]", "Refresh"), ("[Tab]", "Chat"), ("[?]", "Help")]
        } else {
            vec![
                ("[Enter]", "Send"),
                ("[Tab]", "Plans"),
                ("/edit", "Edit section"),
                ("[F1]", "Help"),
                ("[Ctrl+C]", "Quit"),
            ]
        };

        let mut spans = Vec::new();
        for (key, desc) in binds {
            spans.push(Span::styled(key, Style::default().fg(colors::KEYBIND)));
            spans.push(Span::raw(format!(" {}  ", desc)));
        }
        if let Some(draft) = session.edit_draft() {
            spans.push(Span::styled(
                format!("editing: {}", draft.section),
                Style::default().fg(colors::GENERATING),
            ));
        }
        Line::from(spans)
    };

    let footer = Paragraph::new(content).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}

fn render_plan_modal(ui: &mut UiState, session: &SessionState, frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(80, 80, area);
    frame.render_widget(Clear, popup_area);

    let content = session.selected_plan_content().unwrap_or_default();
    let markdown_text = tui_markdown::from_str(content);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Account Plan (Esc to close) ")
        .border_style(Style::default().fg(colors::HEADER))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    let width = inner.width as usize;
    let content_height: usize = markdown_text
        .lines
        .iter()
        .map(|line| {
            let line_width = line.width();
            if width == 0 || line_width == 0 { 1 } else { line_width.div_ceil(width) }
        })
        .sum();
    ui.modal_max_scroll = content_height.saturating_sub(inner.height as usize);
    ui.modal_scroll = ui.modal_scroll.min(ui.modal_max_scroll);

    let plan = Paragraph::new(markdown_text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll_offset(ui.modal_scroll), 0));
    frame.render_widget(plan, popup_area);
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))])
    };

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                .fg(colors::HEADER),
        )]),
        Line::from(""),
        section("Chat"),
        key_line("Enter", "Send message"),
        key_line("PgUp/PgDn", "Scroll conversation"),
        key_line("Tab", "Switch between chat and plans"),
        key_line("Alt+1..4", "Quick actions"),
        key_line("Ctrl+C", "Quit"),
        Line::from(""),
        section("Commands"),
        key_line("/edit", "/edit <section> <instructions>"),
        key_line("/plans", "Refresh the plan list"),
        key_line("/help", "Toggle this help"),
        key_line("/quit", "Quit"),
        Line::from(""),
        section("Plans"),
        key_line("j/↓  k/↑", "Move selection"),
        key_line("Enter", "Open plan"),
        key_line("r", "Refresh"),
        key_line("Esc", "Close plan"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help (Esc to close) ")
                .style(Style::default().bg(Color::Black)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(help, popup_area);
}

/// Helper to create a key binding line
fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{:<12}", key), Style::default().fg(colors::KEYBIND)),
        Span::raw(desc),
    ])
}

fn render_empty_message(frame: &mut Frame, area: Rect, message: &str) {
    let empty = Paragraph::new(message)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(empty, area);
}

/// Helper to create a centered rect
/// Paragraph scroll offset; saturates instead of wrapping past u16
fn scroll_offset(lines: usize) -> u16 {
    u16::try_from(lines).unwrap_or(u16::MAX)
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Format elapsed time for display (e.g., "45s", "1m 15s")
fn format_elapsed(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::PlanSummary;
    use crate::session::SessionStore;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;

    fn buffer_to_text(buf: &Buffer) -> String {
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn draw(ui: &mut UiState, store: &SessionStore) -> String {
        let mut term = Terminal::new(TestBackend::new(120, 40)).expect("term");
        term.draw(|f| render(ui, store.state(), f)).expect("draw");
        buffer_to_text(term.backend().buffer())
    }

    #[test]
    fn test_empty_session_renders_welcome() {
        let mut ui = UiState::new();
        let store = SessionStore::new();
        let text = draw(&mut ui, &store);

        assert!(text.contains("ResearchDesk"));
        assert!(text.contains("IDLE"));
        assert!(text.contains("No plans generated yet"));
        assert!(text.contains("Research Tesla"));
        assert!(!text.contains("View Summary"));
        assert!(!text.contains("Current Research"));
    }

    #[test]
    fn test_transcript_and_status_render() {
        let mut ui = UiState::new();
        let mut store = SessionStore::new();
        store.append_entry(EntryKind::User, "Research Tesla");
        store.append_entry(EntryKind::Error, "Error communicating with agent: Timeout after 1s");
        store.set_agent_status(
            AgentState::Complete,
            Some("Tesla".to_string()),
            Some("Plan ready".to_string()),
        );
        store.set_plans(vec![PlanSummary::new("Tesla", "20240101_120000", "tesla.md")]);

        let text = draw(&mut ui, &store);
        assert!(text.contains("> Research Tesla"));
        assert!(text.contains("! Error communicating with agent"));
        assert!(text.contains("COMPLETE"));
        assert!(text.contains("Plan ready"));
        assert!(text.contains("Current Research"));
        assert!(text.contains("View Summary"));
        assert!(text.contains("20240101_120000"));
    }

    #[test]
    fn test_plan_modal_renders_content() {
        let mut ui = UiState::new();
        let mut store = SessionStore::new();
        store.set_selected_plan(Some("# Tesla Account Plan\n\nOverview text".to_string()));
        store.open_plan_modal();

        let text = draw(&mut ui, &store);
        assert!(text.contains("Account Plan (Esc to close)"));
        assert!(text.contains("Tesla Account Plan"));
    }

    #[test]
    fn test_busy_indicator() {
        let mut ui = UiState::new();
        let mut store = SessionStore::new();
        store.set_busy(true);
        ui.start_busy();

        let text = draw(&mut ui, &store);
        assert!(text.contains(&format!("* {}...", ui.busy_word)));
    }

    #[test]
    fn test_scroll_offset_saturates() {
        assert_eq!(scroll_offset(0), 0);
        assert_eq!(scroll_offset(65_535), u16::MAX);
        assert_eq!(scroll_offset(70_000), u16::MAX);
    }

    #[test]
    fn test_input_height() {
        assert_eq!(calculate_input_height("", 40), 1);
        assert_eq!(calculate_input_height(&"x".repeat(100), 23), 5);
        assert_eq!(calculate_input_height(&"x".repeat(1000), 23), 6);
    }
}
