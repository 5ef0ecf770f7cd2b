//! UI rendering functions

use crate::state::{Direction as MessageDirection, LogEntry};
use crate::tui::app::App;
use crate::tui::types::{AuthTab, ChatFocus, Screen};
use chrono::{DateTime, Datelike, Local, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Main UI rendering function
pub fn ui(f: &mut Frame, app: &App) {
    match app.current_screen {
        Screen::Auth => render_auth(f, app),
        Screen::Chat => render_chat(f, app),
    }
}

/// Human-friendly timestamp for the message log
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    let local = ts.with_timezone(&Local);
    let now = Local::now();

    if local.date_naive() == now.date_naive() {
        format!("Today at {}", local.format("%H:%M"))
    } else if local.date_naive() == now.date_naive().pred_opt().unwrap_or(now.date_naive()) {
        format!("Yesterday at {}", local.format("%H:%M"))
    } else if local.year() == now.year() {
        local.format("%b %d at %H:%M").to_string()
    } else {
        local.format("%Y-%m-%d %H:%M").to_string()
    }
}

fn field_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn render_input_field(f: &mut Frame, area: Rect, title: &str, value: &str, focused: bool) {
    let display = if focused {
        format!("{}█", value)
    } else {
        value.to_string()
    };
    let field = Paragraph::new(display).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(field_style(focused)),
    );
    f.render_widget(field, area);
}

fn render_auth(f: &mut Frame, app: &App) {
    let screen = &app.auth_screen;

    // Center the form horizontally
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
        ])
        .split(f.size());

    let is_register = screen.tab == AuthTab::Register;
    let mut constraints = vec![
        Constraint::Length(3), // title
        Constraint::Length(1), // tabs
        Constraint::Length(3), // username
    ];
    if is_register {
        constraints.push(Constraint::Length(3)); // email
    }
    constraints.push(Constraint::Length(3)); // password
    constraints.push(Constraint::Length(2)); // status
    constraints.push(Constraint::Min(1)); // help

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(constraints)
        .split(columns[1]);

    let title = Paragraph::new("Chatter")
        .style(Style::default().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(title, rows[0]);

    let tab_line = Line::from(vec![
        Span::styled(
            AuthTab::Login.label(),
            if screen.tab == AuthTab::Login {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            },
        ),
        Span::raw("  |  "),
        Span::styled(
            AuthTab::Register.label(),
            if is_register {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            },
        ),
    ]);
    f.render_widget(Paragraph::new(tab_line).alignment(Alignment::Center), rows[1]);

    render_input_field(
        f,
        rows[2],
        "Username",
        &screen.username,
        screen.focused_field == 0,
    );

    let password_row;
    if is_register {
        render_input_field(f, rows[3], "Email", &screen.email, screen.focused_field == 1);
        password_row = 4;
    } else {
        password_row = 3;
    }

    // Password is masked
    let masked = "*".repeat(screen.password.chars().count());
    render_input_field(
        f,
        rows[password_row],
        "Password",
        &masked,
        screen.focused_field == screen.tab.field_count() - 1,
    );

    if let Some(message) = &screen.status_message {
        let style = if screen.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        f.render_widget(
            Paragraph::new(message.as_str())
                .style(style)
                .alignment(Alignment::Center),
            rows[password_row + 1],
        );
    }

    let help = Paragraph::new("Tab: switch form | ↑/↓: fields | Enter: submit | Esc: quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(help, rows[password_row + 2]);
}

fn render_chat(f: &mut Frame, app: &App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(f.size());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(30)])
        .split(outer[0]);

    render_sidebar(f, app, panes[0]);
    render_conversation_pane(f, app, panes[1]);

    let help = match app.chat_screen.focus {
        ChatFocus::Search => "Type to search | Enter: search | Tab: next pane | Esc: logout",
        ChatFocus::Results => "↑/↓: select user | Enter: open chat | Tab: next pane | Esc: logout",
        ChatFocus::Conversations => {
            "↑/↓: select chat | Enter: open chat | Tab: next pane | Esc: logout"
        }
        ChatFocus::Message => {
            "Type message | Enter: send | PgUp/PgDn: scroll | Tab: next pane | Esc: logout"
        }
    };
    // A pending status message takes over the help line
    let footer = match &app.chat_screen.status_message {
        Some(message) => Paragraph::new(message.as_str()).style(Style::default().fg(Color::Red)),
        None => Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
    };
    f.render_widget(footer, outer[1]);
}

fn render_sidebar(f: &mut Frame, app: &App, area: Rect) {
    let screen = &app.chat_screen;
    let has_results = !screen.search_results.is_empty();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            if has_results {
                Constraint::Length((screen.search_results.len() as u16 + 2).min(8))
            } else {
                Constraint::Length(0)
            },
            Constraint::Min(3),
        ])
        .split(area);

    render_input_field(
        f,
        rows[0],
        "Search users",
        &screen.search_input,
        screen.focus == ChatFocus::Search,
    );

    if has_results {
        let items: Vec<ListItem> = screen
            .search_results
            .iter()
            .enumerate()
            .map(|(i, user)| {
                let selected = screen.focus == ChatFocus::Results && i == screen.selected_result;
                let style = if selected {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(user.username.as_str()).style(style)
            })
            .collect();
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Results")
                .border_style(field_style(screen.focus == ChatFocus::Results)),
        );
        f.render_widget(list, rows[1]);
    }

    let conversations = app.state.conversations();
    let items: Vec<ListItem> = conversations
        .iter()
        .enumerate()
        .map(|(i, conversation)| {
            let active = app.state.active_peer() == Some(conversation.peer.as_str());
            let selected =
                screen.focus == ChatFocus::Conversations && i == screen.selected_conversation;

            let mut spans = vec![Span::raw(if active { "→ " } else { "  " })];
            spans.push(Span::raw(conversation.peer.as_str()));
            if conversation.unread > 0 {
                spans.push(Span::styled(
                    format!(" ({})", conversation.unread),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ));
            }

            let mut style = Style::default();
            if selected {
                style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
            } else if active {
                style = style.add_modifier(Modifier::BOLD);
            }
            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    let title = match app.state.session().username() {
        Some(username) => format!("Chats ({})", username),
        None => "Chats".to_string(),
    };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(field_style(screen.focus == ChatFocus::Conversations)),
    );
    f.render_widget(list, rows[2]);
}

fn render_conversation_pane(f: &mut Frame, app: &App, area: Rect) {
    let screen = &app.chat_screen;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let title = match app.state.active_peer() {
        Some(peer) => format!("Chat with {}", peer),
        None => "Select a conversation".to_string(),
    };

    // Anchored to the newest messages; scroll_offset walks back into
    // history from the bottom.
    let log = app.state.log();
    let visible = rows[0].height.saturating_sub(2) as usize;
    let skip = log.len().saturating_sub(visible + screen.scroll_offset);
    let lines: Vec<Line> = log
        .iter()
        .skip(skip)
        .take(visible)
        .map(message_line)
        .collect();

    let pane = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(pane, rows[0]);

    render_input_field(
        f,
        rows[1],
        "Message",
        &screen.message_input,
        screen.focus == ChatFocus::Message,
    );
}

fn message_line(entry: &LogEntry) -> Line<'_> {
    let when = entry
        .message
        .created()
        .map(format_timestamp)
        .unwrap_or_default();

    match entry.direction {
        MessageDirection::Incoming => Line::from(vec![
            Span::styled(
                format!("{}: ", entry.message.sender),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(entry.message.content.as_str()),
            Span::styled(format!("  {}", when), Style::default().fg(Color::DarkGray)),
        ]),
        MessageDirection::Outgoing => Line::from(vec![
            Span::styled("me: ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(entry.message.content.as_str()),
            Span::styled(format!("  {}", when), Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!(" {}", entry.status.indicator()),
                if entry.status == crate::state::TickStatus::Read {
                    Style::default().fg(Color::Blue)
                } else {
                    Style::default().fg(Color::DarkGray)
                },
            ),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, LoginOk};
    use crate::protocol::Message;
    use chrono::{Duration, Timelike};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn logged_in_app() -> App {
        let api = ApiClient::new("http://127.0.0.1:1").expect("Failed to build client");
        let mut app = App::new(api);
        app.complete_login(Ok(LoginOk {
            message: "Login successful".to_string(),
            username: "alice".to_string(),
        }));
        app
    }

    fn message(id: &str, sender: &str, receiver: &str, content: &str) -> Message {
        Message {
            id: id.to_string(),
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            content: content.to_string(),
            created_at: None,
            sent_at: None,
            delivered_at: None,
            read_at: None,
            timestamp: None,
        }
    }

    /// Draw the app into a test backend and flatten the buffer to text
    fn rendered_text(app: &App, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).expect("Failed to build terminal");
        terminal.draw(|f| ui(f, app)).expect("Failed to draw");
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_chat_screen_renders_status_message() {
        let mut app = logged_in_app();

        app.complete_search(Err(crate::Error::Api("boom".to_string())));

        let rendered = rendered_text(&app, 120, 40);
        assert!(rendered.contains("An error occurred"));
    }

    #[test]
    fn test_status_message_clears_on_next_success() {
        let mut app = logged_in_app();
        app.complete_search(Err(crate::Error::Api("boom".to_string())));

        app.complete_search(Ok(Vec::new()));

        let rendered = rendered_text(&app, 120, 40);
        assert!(!rendered.contains("An error occurred"));
    }

    #[test]
    fn test_message_pane_anchors_to_newest() {
        let mut app = logged_in_app();
        app.start_chat("bob");

        let history: Vec<Message> = (0..50)
            .map(|i| message(&format!("m{}", i), "bob", "alice", &format!("msg-{:03}", i)))
            .collect();
        app.complete_history("bob", Ok(history));

        // A pane far shorter than the log still shows the newest message
        let rendered = rendered_text(&app, 80, 20);
        assert!(rendered.contains("msg-049"));
        assert!(!rendered.contains("msg-000"));
    }

    #[test]
    fn test_scrolling_up_reveals_older_messages() {
        let mut app = logged_in_app();
        app.start_chat("bob");

        let history: Vec<Message> = (0..50)
            .map(|i| message(&format!("m{}", i), "bob", "alice", &format!("msg-{:03}", i)))
            .collect();
        app.complete_history("bob", Ok(history));

        for _ in 0..49 {
            app.chat_screen.scroll_up(49);
        }

        let rendered = rendered_text(&app, 80, 20);
        assert!(rendered.contains("msg-000"));
        assert!(!rendered.contains("msg-049"));
    }

    #[test]
    fn test_format_timestamp_today() {
        let now = Utc::now();
        let formatted = format_timestamp(now);
        assert!(formatted.starts_with("Today at "));
    }

    #[test]
    fn test_format_timestamp_yesterday() {
        // Noon avoids crossing a date boundary under timezone conversion
        let yesterday = (Utc::now() - Duration::days(1))
            .with_hour(12)
            .and_then(|t| t.with_minute(0))
            .unwrap_or_else(|| Utc::now() - Duration::days(1));
        let local = yesterday.with_timezone(&Local);
        if local.date_naive()
            == Local::now()
                .date_naive()
                .pred_opt()
                .unwrap_or(Local::now().date_naive())
        {
            assert!(format_timestamp(yesterday).starts_with("Yesterday at "));
        }
    }

    #[test]
    fn test_format_timestamp_older_dates_show_date() {
        let old = Utc::now() - Duration::days(30);
        let formatted = format_timestamp(old);
        assert!(!formatted.starts_with("Today"));
        assert!(!formatted.starts_with("Yesterday"));
    }
}
