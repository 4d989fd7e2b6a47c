use std::sync::Arc;

use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::load::{mount, CancellationToken, LoadEvent, LoadState, Loader};

use super::helpers::{centered_rect, key_hint};

/// Title shown above every state.
const TITLE: &str = "SQLite test app";
/// Height of the title bar.
const HEADER_HEIGHT: u16 = 2;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// The one screen of the application. Owns the state of the current load
/// cycle and the token that ties that cycle to this view.
pub struct App {
    runtime: Handle,
    loader: Arc<Loader>,
    key_column: String,
    label_column: String,
    state: LoadState,
    cycle: u64,
    token: Option<CancellationToken>,
    sender: UnboundedSender<LoadEvent>,
    events: UnboundedReceiver<LoadEvent>,
    selected: usize,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(runtime: Handle, loader: Arc<Loader>, config: &AppConfig) -> Self {
        let (sender, events) = mpsc::unbounded_channel();
        Self {
            runtime,
            loader,
            key_column: config.key_column.clone(),
            label_column: config.label_column.clone(),
            state: LoadState::Idle,
            cycle: 0,
            token: None,
            sender,
            events,
            selected: 0,
            status: None,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Start a fresh load cycle. Any cycle still in flight is cancelled first
    /// so it can no longer touch this view.
    pub fn mount(&mut self) {
        self.unmount();
        self.cycle += 1;
        self.state = LoadState::Idle;
        self.selected = 0;
        info!(cycle = self.cycle, "mounting view");
        self.token = Some(mount(
            &self.runtime,
            Arc::clone(&self.loader),
            self.cycle,
            self.sender.clone(),
        ));
    }

    /// Cancel the active cycle, if any.
    pub fn unmount(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }

    /// Apply every queued event. Returns whether the state changed.
    pub fn drain_events(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events.try_recv() {
            changed |= self.apply(event);
        }
        changed
    }

    /// Apply one event from the current cycle. Events from older cycles and
    /// out-of-order transitions are ignored.
    pub fn apply(&mut self, event: LoadEvent) -> bool {
        if event.cycle != self.cycle {
            debug!(cycle = event.cycle, current = self.cycle, "ignoring stale load event");
            return false;
        }
        if !self.state.can_transition_to(&event.state) {
            debug!(from = ?self.state, to = ?event.state, "ignoring invalid transition");
            return false;
        }
        match &event.state {
            LoadState::Error(message) => {
                self.set_status(format!("Load failed: {message}"), StatusKind::Error)
            }
            LoadState::Loaded(_) => self.status = None,
            _ => {}
        }
        self.state = event.state;
        true
    }

    /// Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.unmount();
                return true;
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.row_count().saturating_sub(1),
            KeyCode::Char('r') => {
                self.mount();
                self.set_status("Reloading from the local database.", StatusKind::Info);
            }
            _ => {}
        }
        false
    }

    /// `(key, label)` for every loaded row, in query order.
    pub fn visible_lines(&self) -> Vec<(String, String)> {
        match &self.state {
            LoadState::Loaded(rows) => rows
                .iter()
                .map(|row| (row.text(&self.key_column), row.text(&self.label_column)))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT.min(area.height)),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);
        match &self.state {
            LoadState::Idle => {}
            LoadState::Loading => self.draw_loading(frame, chunks[1]),
            LoadState::Error(message) => self.draw_error(frame, chunks[1], message),
            LoadState::Loaded(_) => self.draw_rows(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let title = Paragraph::new(Span::styled(
            TITLE,
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(title, area);
    }

    fn draw_loading(&self, frame: &mut Frame, area: Rect) {
        let message = Paragraph::new("Loading...").alignment(Alignment::Center);
        frame.render_widget(message, centered_rect(60, 50, area));
    }

    fn draw_error(&self, frame: &mut Frame, area: Rect, message: &str) {
        let text = Paragraph::new(Line::from(vec![Span::styled(
            format!("Error occurred: {message}"),
            Style::default().fg(Color::Red),
        )]))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(text, centered_rect(90, 60, area));
    }

    fn draw_rows(&self, frame: &mut Frame, area: Rect) {
        let lines = self.visible_lines();
        if lines.is_empty() {
            let message = Paragraph::new("No rows.").alignment(Alignment::Center);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = lines
            .into_iter()
            .map(|(_, label)| ListItem::new(label))
            .collect();
        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from(self.selection_summary())
        };

        let mut hints = Vec::new();
        hints.extend(key_hint("[↑↓]", " Navigate   "));
        hints.extend(key_hint("[r]", " Reload   "));
        hints.extend(key_hint("[q]", " Quit"));

        let paragraph =
            Paragraph::new(vec![status_line, Line::from(hints)]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn selection_summary(&self) -> String {
        let lines = self.visible_lines();
        match lines.get(self.selected) {
            Some((key, _)) => format!(
                "{} {} ({} of {})",
                self.key_column,
                key,
                self.selected + 1,
                lines.len()
            ),
            None => String::new(),
        }
    }

    fn row_count(&self) -> usize {
        match &self.state {
            LoadState::Loaded(rows) => rows.len(),
            _ => 0,
        }
    }

    fn move_selection(&mut self, offset: isize) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        let next = self.selected as isize + offset;
        self.selected = next.clamp(0, count as isize - 1) as usize;
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.unmount();
    }
}
