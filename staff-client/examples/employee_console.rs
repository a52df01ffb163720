//! Employee Console - TUI front end for the employee screen
//!
//! Run: cargo run -p staff-client --example employee_console [-- mock|offline|remote]
//!
//! - `mock` (default): starts the in-process mock backend on a local port
//! - `offline`: in-memory auth and rows, nothing leaves the process
//! - `remote`: talks to `STAFF_API_URL` with `STAFF_API_KEY`

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{prelude::*, widgets::*};
use staff_client::view::{ListBody, ListView};
use staff_client::view::BadgeVariant;
use staff_client::{
    AuthUser, ChannelNotifier, ClientConfig, Confirmation, EmployeeScreen, FormField,
    InMemoryEmployeeStore, NetworkAuthClient, NetworkHttpClient, Notification, RestEmployeeStore,
    ScreenView, SessionStore, StaticAuthProvider,
};
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;
use tui_logger::{TuiLoggerLevelOutput, TuiLoggerWidget, TuiWidgetEvent, TuiWidgetState};

/// A delete prompt waiting for `/yes` or `/no`
struct PendingConfirm {
    prompt: String,
    reply: oneshot::Sender<bool>,
}

/// Routes delete prompts to the UI loop
struct ChannelConfirmation {
    tx: mpsc::UnboundedSender<PendingConfirm>,
}

#[async_trait]
impl Confirmation for ChannelConfirmation {
    async fn confirm(&self, prompt: &str) -> bool {
        let (reply, rx) = oneshot::channel();
        let pending = PendingConfirm {
            prompt: prompt.to_string(),
            reply,
        };
        if self.tx.send(pending).is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }
}

/// Where sign-in goes
enum Backend {
    Offline(Arc<StaticAuthProvider>),
    Network(Arc<NetworkAuthClient>),
}

impl Backend {
    fn label(&self) -> &'static str {
        match self {
            Self::Offline(_) => "offline",
            Self::Network(_) => "network",
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> anyhow::Result<()> {
        match self {
            Self::Offline(auth) => {
                auth.sign_in(AuthUser {
                    id: format!("local-{}", email),
                    email: email.to_string(),
                });
            }
            Self::Network(auth) => {
                auth.sign_in_with_password(email, password).await?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    #[default]
    Normal,
    Editing,
}

struct App {
    input: Input,
    input_mode: InputMode,
    screen: Arc<EmployeeScreen>,
    backend: Arc<Backend>,
    pending: Option<PendingConfirm>,
    last_notice: Option<Notification>,
    logger_state: TuiWidgetState,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=warn,hyper=warn"));
    tracing_subscriber::registry()
        .with(tui_logger::tracing_subscriber_layer())
        .with(env_filter)
        .init();
    tui_logger::init_logger(log::LevelFilter::Info).ok();
    tui_logger::set_default_level(log::LevelFilter::Info);

    let mode = std::env::args().nth(1).unwrap_or_else(|| "mock".to_string());
    let (notifier, mut notices) = ChannelNotifier::channel();
    let (confirm_tx, mut confirms) = mpsc::unbounded_channel();
    let confirmation = Arc::new(ChannelConfirmation { tx: confirm_tx });

    // Kept alive for the whole session
    let mut _mock = None;
    let (screen, backend) = match mode.as_str() {
        "offline" => {
            let auth = Arc::new(StaticAuthProvider::new());
            let store = Arc::new(InMemoryEmployeeStore::new());
            let screen =
                EmployeeScreen::start(auth.clone(), store, Arc::new(notifier), confirmation);
            (screen, Backend::Offline(auth))
        }
        "mock" | "remote" => {
            let config = if mode == "mock" {
                let mock = staff_mock::spawn(staff_mock::Config::default()).await?;
                let config = ClientConfig::new(mock.base_url(), mock.state.config.api_key.clone());
                _mock = Some(mock);
                config
            } else {
                ClientConfig::from_env()
            };
            let http = NetworkHttpClient::new(&config, SessionStore::new())?;
            let auth = Arc::new(NetworkAuthClient::new(http.clone()));
            let store = Arc::new(RestEmployeeStore::new(&config, http));
            let screen =
                EmployeeScreen::start(auth.clone(), store, Arc::new(notifier), confirmation);
            (screen, Backend::Network(auth))
        }
        other => anyhow::bail!("unknown mode {other:?}, expected mock, offline or remote"),
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut app = App {
        input: Input::default(),
        input_mode: InputMode::Normal,
        screen: Arc::new(screen),
        backend: Arc::new(backend),
        pending: None,
        last_notice: None,
        logger_state: TuiWidgetState::new(),
    };
    tracing::info!(mode = %mode, "Press 'e' to type commands (/help), 'q' to quit");

    let res = run_app(&mut terminal, &mut app, &mut notices, &mut confirms).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    app.screen.shutdown();

    if let Err(err) = res {
        println!("{:?}", err);
    }
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    notices: &mut mpsc::UnboundedReceiver<Notification>,
    confirms: &mut mpsc::UnboundedReceiver<PendingConfirm>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat)
        {
            match app.input_mode {
                InputMode::Normal => match key.code {
                    KeyCode::Char('e') => app.input_mode = InputMode::Editing,
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::PageUp => app.logger_state.transition(TuiWidgetEvent::PrevPageKey),
                    KeyCode::PageDown => app.logger_state.transition(TuiWidgetEvent::NextPageKey),
                    KeyCode::Up => app.logger_state.transition(TuiWidgetEvent::UpKey),
                    KeyCode::Down => app.logger_state.transition(TuiWidgetEvent::DownKey),
                    _ => {}
                },
                InputMode::Editing => match key.code {
                    KeyCode::Enter => {
                        let line: String = app.input.value().into();
                        if !line.is_empty() {
                            handle_command(app, &line);
                            app.input.reset();
                        }
                    }
                    KeyCode::Esc => app.input_mode = InputMode::Normal,
                    _ => {
                        app.input.handle_event(&Event::Key(key));
                    }
                },
            }
        }

        while let Ok(notice) = notices.try_recv() {
            if notice.is_error() {
                tracing::warn!("{}: {}", notice.title, notice.description);
            } else {
                tracing::info!("{}: {}", notice.title, notice.description);
            }
            app.last_notice = Some(notice);
        }
        while let Ok(pending) = confirms.try_recv() {
            tracing::warn!("{} (/yes or /no)", pending.prompt);
            // A newer prompt replaces an unanswered one, which counts as declined
            app.pending = Some(pending);
        }
    }
}

fn field_by_key(key: &str) -> Option<FormField> {
    match key {
        "name" => Some(FormField::Name),
        "email" => Some(FormField::Email),
        "designation" => Some(FormField::Designation),
        "department" => Some(FormField::Department),
        "salary" => Some(FormField::Salary),
        "joined" => Some(FormField::DateOfJoining),
        "left" => Some(FormField::LastDayOfWorking),
        _ => None,
    }
}

/// 1-based row number as shown in the table
fn row_id(app: &App, arg: Option<&str>) -> Option<String> {
    let n: usize = arg?.parse().ok()?;
    let list = app.screen.list();
    let state = list.borrow();
    state
        .employees
        .get(n.checked_sub(1)?)
        .map(|e| e.id.clone())
}

fn handle_command(app: &mut App, cmd: &str) {
    let parts: Vec<&str> = cmd.split_whitespace().collect();
    let Some(&head) = parts.first() else {
        return;
    };

    match head {
        "/help" => {
            tracing::info!("Available commands:");
            tracing::info!("  /signin <email> <password>   - Sign in");
            tracing::info!("  /signout                     - Sign out");
            tracing::info!("  /add                         - Open the add form");
            tracing::info!("  /edit <row>                  - Edit a listed employee");
            tracing::info!("  /set <field> <value>         - name|email|designation|department|salary|joined|left");
            tracing::info!("  /save                        - Submit the form");
            tracing::info!("  /cancel                      - Close the form");
            tracing::info!("  /delete <row>                - Delete a listed employee");
            tracing::info!("  /yes | /no                   - Answer a delete prompt");
            tracing::info!("  /reload                      - Refetch the list");
        }
        "/signin" => {
            if parts.len() < 3 {
                tracing::error!("Usage: /signin <email> <password>");
                return;
            }
            let (email, password) = (parts[1].to_string(), parts[2].to_string());
            let backend = app.backend.clone();
            tokio::spawn(async move {
                match backend.sign_in(&email, &password).await {
                    Ok(()) => tracing::info!(backend = backend.label(), "Signed in as {}", email),
                    Err(e) => tracing::error!("Sign-in failed: {}", e),
                }
            });
        }
        "/signout" => {
            let screen = app.screen.clone();
            tokio::spawn(async move {
                if let Err(e) = screen.sign_out().await {
                    tracing::error!("Sign-out failed: {}", e);
                }
            });
        }
        "/add" => app.screen.open_create_form(),
        "/edit" => match row_id(app, parts.get(1).copied()) {
            Some(id) => {
                if let Err(e) = app.screen.open_edit_form(&id) {
                    tracing::error!("{}", e);
                }
            }
            None => tracing::error!("Usage: /edit <row>"),
        },
        "/set" => {
            let Some(field) = parts.get(1).and_then(|k| field_by_key(k)) else {
                tracing::error!("Usage: /set <field> <value>");
                return;
            };
            let value = parts[2..].join(" ");
            if !app.screen.update_form(|form| form.set(field, value)) {
                tracing::error!("No form is open, use /add or /edit first");
            }
        }
        "/save" => {
            let screen = app.screen.clone();
            tokio::spawn(async move {
                match screen.submit_form().await {
                    Ok(outcome) => tracing::info!(id = %outcome.employee().id, "Saved"),
                    Err(e) => tracing::debug!("Submit ended: {}", e),
                }
            });
        }
        "/cancel" => app.screen.cancel_form(),
        "/delete" => match row_id(app, parts.get(1).copied()) {
            Some(id) => {
                let screen = app.screen.clone();
                tokio::spawn(async move {
                    if let Err(e) = screen.delete(&id).await {
                        tracing::debug!("Delete ended: {}", e);
                    }
                });
            }
            None => tracing::error!("Usage: /delete <row>"),
        },
        "/yes" | "/no" => match app.pending.take() {
            Some(pending) => {
                let _ = pending.reply.send(head == "/yes");
            }
            None => tracing::warn!("Nothing to confirm"),
        },
        "/reload" => {
            let screen = app.screen.clone();
            tokio::spawn(async move {
                screen.reload().await;
            });
        }
        "/quit" => tracing::warn!("Press Esc then 'q' to quit application"),
        _ => tracing::warn!("Unknown command: {}", head),
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Screen + logs
            Constraint::Length(3), // Input
        ])
        .split(f.area());

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    // Header
    let session = app.screen.session().current();
    let who = match &session {
        Some(s) => Span::styled(format!(" {} ", s.email), Style::default().fg(Color::Green)),
        None => Span::styled(" Signed out ", Style::default().fg(Color::Red)),
    };
    let mut header = vec![
        Span::raw(" Staff Desk "),
        Span::styled(
            format!(" {} ", app.backend.label()),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw(" | "),
        who,
    ];
    if let Some(notice) = &app.last_notice {
        let color = if notice.is_error() { Color::Red } else { Color::Green };
        header.push(Span::raw(" | "));
        header.push(Span::styled(
            format!("{}: {}", notice.title, notice.description),
            Style::default().fg(color),
        ));
    }
    let title = Paragraph::new(Line::from(header)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(title, chunks[0]);

    render_screen(f, main_chunks[0], app);

    let logs = TuiLoggerWidget::default()
        .block(
            Block::default()
                .title(" Logs ")
                .border_style(Style::default().fg(Color::White).add_modifier(Modifier::DIM))
                .borders(Borders::ALL),
        )
        .output_separator('|')
        .output_timestamp(Some("%H:%M:%S".to_string()))
        .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
        .output_target(false)
        .output_file(false)
        .output_line(false)
        .style(Style::default().fg(Color::White))
        .state(&app.logger_state);
    f.render_widget(logs, main_chunks[1]);

    // Input
    let input_title = match &app.pending {
        Some(p) => format!(" {} (/yes or /no) ", p.prompt),
        None => " Command Input (Type /help) ".to_string(),
    };
    let style = match app.input_mode {
        InputMode::Normal => Style::default().fg(Color::Gray),
        InputMode::Editing => Style::default().fg(Color::Yellow),
    };
    let width = chunks[2].width.max(3) - 3;
    let scroll = app.input.visual_scroll(width as usize);
    let input = Paragraph::new(app.input.value())
        .style(style)
        .scroll((0, scroll as u16))
        .block(Block::default().borders(Borders::ALL).title(input_title));
    f.render_widget(input, chunks[2]);

    if app.input_mode == InputMode::Editing {
        f.set_cursor_position((
            chunks[2].x + ((app.input.visual_cursor().max(scroll) - scroll) as u16) + 1,
            chunks[2].y + 1,
        ));
    } else {
        let help = Paragraph::new("Press 'e' to edit, 'q' to quit ")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Right);
        f.render_widget(help, chunks[0]);
    }
}

fn render_screen(f: &mut Frame, area: Rect, app: &App) {
    match app.screen.view() {
        ScreenView::SignIn(view) => {
            let text = vec![
                Line::from(Span::styled(
                    view.title,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(view.prompt),
                Line::from(""),
                Line::from(Span::styled(
                    format!("[ {} ]  /signin <email> <password>", view.button),
                    Style::default().fg(Color::Yellow),
                )),
            ];
            let p = Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(p, area);
        }
        ScreenView::List(view) => render_list(f, area, &view),
        ScreenView::Form(view) => {
            let mut lines: Vec<Line> = view
                .fields
                .iter()
                .map(|field| {
                    let marker = if field.required { "*" } else { " " };
                    Line::from(vec![
                        Span::styled(
                            format!("{:<32}", format!("{}{}", field.label, marker)),
                            Style::default().fg(Color::Cyan),
                        ),
                        Span::raw(field.value.clone()),
                    ])
                })
                .collect();
            lines.push(Line::from(""));
            let submit_style = if view.submit_enabled {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("[ {} ] /save", view.submit_label), submit_style),
                Span::raw("   "),
                Span::raw(format!("[ {} ] /cancel", view.cancel_label)),
            ]));
            let p = Paragraph::new(lines).block(
                Block::default()
                    .title(format!(" {} ", view.title))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Magenta)),
            );
            f.render_widget(p, area);
        }
    }
}

fn render_list(f: &mut Frame, area: Rect, view: &ListView) {
    let block = Block::default()
        .title(format!(" {} | {} ", view.title, view.card_title))
        .title_bottom(format!(" {}: /add ", view.add_label))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    match &view.body {
        ListBody::Loading { message } => {
            f.render_widget(Paragraph::new(*message).block(block), area);
        }
        ListBody::Empty { message, action } => {
            let text = vec![
                Line::from(*message),
                Line::from(Span::styled(
                    format!("[ {} ] /add", action),
                    Style::default().fg(Color::Yellow),
                )),
            ];
            f.render_widget(
                Paragraph::new(text).alignment(Alignment::Center).block(block),
                area,
            );
        }
        ListBody::Table { columns, rows, .. } => {
            let header = Row::new(
                std::iter::once("#")
                    .chain(columns.iter().copied())
                    .map(|c| Cell::from(c).style(Style::default().add_modifier(Modifier::BOLD))),
            );
            let body = rows.iter().enumerate().map(|(i, r)| {
                let badge = match r.badge {
                    BadgeVariant::Secondary => Color::Green,
                    BadgeVariant::Destructive => Color::Red,
                };
                let n = i + 1;
                Row::new(vec![
                    Cell::from(n.to_string()),
                    Cell::from(r.name.clone()),
                    Cell::from(r.email.clone()),
                    Cell::from(r.designation.clone()),
                    Cell::from(r.department.clone()),
                    Cell::from(r.salary.clone()),
                    Cell::from(r.date_of_joining.clone()),
                    Cell::from(r.status_label).style(Style::default().fg(badge)),
                    Cell::from(format!("/edit {n} /delete {n}")),
                ])
            });
            let widths = [
                Constraint::Length(3),
                Constraint::Percentage(14),
                Constraint::Percentage(18),
                Constraint::Percentage(12),
                Constraint::Percentage(12),
                Constraint::Percentage(10),
                Constraint::Percentage(10),
                Constraint::Percentage(8),
                Constraint::Min(12),
            ];
            f.render_widget(Table::new(body, widths).header(header).block(block), area);
        }
    }
}
