//! Chatter TUI (Terminal User Interface)
//!
//! A terminal client for the Chatter messaging backend.

use chatter::api::ApiClient;
use chatter::tui::{ui::ui, App, ChatFocus, Screen};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

fn main() -> anyhow::Result<()> {
    chatter::init();

    let base_url =
        std::env::var("CHATTER_URL").unwrap_or_else(|_| "http://127.0.0.1:5000".to_string());
    let api = ApiClient::new(&base_url)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(api);

    // Run main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        // The draw above is the render-completion signal: anything in the
        // message log is now on screen and may be reported as read.
        app.on_frame_rendered();

        // Apply finished background requests and drain realtime events
        app.poll_pending();
        app.poll_socket();

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                match app.current_screen {
                    Screen::Auth => match key.code {
                        KeyCode::Esc => {
                            app.should_quit = true;
                        }
                        KeyCode::Tab => {
                            app.auth_screen.switch_tab();
                        }
                        KeyCode::Down => {
                            app.auth_screen.next_field();
                        }
                        KeyCode::Up => {
                            app.auth_screen.previous_field();
                        }
                        KeyCode::Enter => {
                            app.submit_auth();
                        }
                        KeyCode::Backspace => {
                            app.auth_screen.backspace();
                        }
                        KeyCode::Char(c) if !c.is_control() => {
                            app.auth_screen.add_char(c);
                        }
                        _ => {}
                    },
                    Screen::Chat => match key.code {
                        KeyCode::Char('q') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            app.should_quit = true;
                        }
                        KeyCode::Esc => {
                            app.trigger_logout();
                        }
                        KeyCode::Tab => {
                            app.chat_screen.cycle_focus();
                        }
                        KeyCode::Down => {
                            let count = app.state.conversations().len();
                            app.chat_screen.next_item(count);
                        }
                        KeyCode::Up => {
                            let count = app.state.conversations().len();
                            app.chat_screen.previous_item(count);
                        }
                        KeyCode::PageUp => {
                            let max_offset = app.state.log().len().saturating_sub(1);
                            app.chat_screen.scroll_up(max_offset);
                        }
                        KeyCode::PageDown => {
                            app.chat_screen.scroll_down();
                        }
                        KeyCode::Enter => match app.chat_screen.focus {
                            ChatFocus::Search => app.submit_search(),
                            ChatFocus::Results => app.chat_with_selected_result(),
                            ChatFocus::Conversations => app.open_selected_conversation(),
                            ChatFocus::Message => app.send_current_message(),
                        },
                        KeyCode::Backspace => {
                            app.chat_screen.backspace();
                        }
                        KeyCode::Char(c) if !c.is_control() => {
                            app.chat_screen.add_char(c);
                        }
                        _ => {}
                    },
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
