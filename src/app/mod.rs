use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;

use crate::calendar::CalendarDate;
use crate::config::themes::Palette;
use crate::config::AppConfig;
use crate::events::EventError;
use crate::storage::{self, SlotStore};
use crate::ui::{self, GridGeometry};

pub mod actions;
pub mod state;

pub use actions::{ActionDispatcher, SaveOutcome};
pub use state::{AppState, EventsPanel, FocusPane, OverlayState, ViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    MoveSelection(i64),
    MoveEventCursor(isize),
    PrevMonth,
    NextMonth,
    Today,
    ToggleFocus,
    AddEvent,
    DeleteEvent,
}

pub struct App {
    pub config: Arc<AppConfig>,
    storage: Box<dyn SlotStore>,
    state: AppState,
    palette: Palette,
    list_state: ListState,
    grid_geometry: Option<GridGeometry>,
    today: CalendarDate,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, storage: Box<dyn SlotStore>) -> Self {
        Self::with_today(config, storage, CalendarDate::today())
    }

    pub fn with_today(
        config: Arc<AppConfig>,
        storage: Box<dyn SlotStore>,
        today: CalendarDate,
    ) -> Self {
        let store = storage::load(storage.as_ref());
        tracing::info!(
            dates = store.len(),
            events = store.total_events(),
            "calendar loaded"
        );
        let state = AppState::new(store, today, config.show_event_counts);
        Self {
            palette: Palette::for_theme(config.theme),
            config,
            storage,
            state,
            list_state: ListState::default(),
            grid_geometry: None,
            today,
            should_quit: false,
            tick_rate: Duration::from_millis(250),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| {
                    self.grid_geometry = ui::draw_app(
                        frame,
                        &self.state,
                        self.today,
                        &self.palette,
                        &mut self.list_state,
                    );
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    /// Picks up the date change when the app stays open past midnight.
    fn on_tick(&mut self) {
        let now = CalendarDate::today();
        if now != self.today {
            tracing::debug!(today = %now.key(), "date rolled over");
            self.today = now;
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.handle_overlay_key(key) {
            return;
        }

        let action = match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Left | KeyCode::Char('h') if is_plain(&key) => {
                Some(Action::MoveSelection(-1))
            }
            KeyCode::Right | KeyCode::Char('l') if is_plain(&key) => {
                Some(Action::MoveSelection(1))
            }
            KeyCode::Up | KeyCode::Char('k') => Some(match self.state.focus {
                FocusPane::Grid => Action::MoveSelection(-7),
                FocusPane::Events => Action::MoveEventCursor(-1),
            }),
            KeyCode::Down | KeyCode::Char('j') => Some(match self.state.focus {
                FocusPane::Grid => Action::MoveSelection(7),
                FocusPane::Events => Action::MoveEventCursor(1),
            }),
            KeyCode::Char('[') | KeyCode::PageUp => Some(Action::PrevMonth),
            KeyCode::Char(']') | KeyCode::PageDown => Some(Action::NextMonth),
            KeyCode::Char('t') if is_plain(&key) => Some(Action::Today),
            KeyCode::Tab => Some(Action::ToggleFocus),
            KeyCode::Char('a') if is_plain(&key) => Some(Action::AddEvent),
            KeyCode::Enter if self.state.focus == FocusPane::Grid => Some(Action::AddEvent),
            KeyCode::Char('d') | KeyCode::Delete if is_plain(&key) => Some(Action::DeleteEvent),
            _ => None,
        };

        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::MoveSelection(delta) => {
                if let Err(err) = self.state.move_selection(self.today, delta) {
                    tracing::warn!(%err, delta, "selection move out of range");
                    self.state
                        .set_status_message(Some("Date is outside the supported range"));
                }
            }
            Action::MoveEventCursor(delta) => self.state.move_event_cursor(self.today, delta),
            Action::PrevMonth => self.state.prev_month(),
            Action::NextMonth => self.state.next_month(),
            Action::Today => {
                self.state.go_today(self.today);
                self.state.clear_status_message();
            }
            Action::ToggleFocus => self.state.toggle_focus(),
            Action::AddEvent => {
                self.state.open_add_event(self.today);
                self.state
                    .set_status_message(Some("Type the event and press Enter"));
            }
            Action::DeleteEvent => {
                if !self.state.open_delete_event(self.today) {
                    self.state.set_status_message(Some("No event to delete"));
                }
            }
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.state.overlay().is_some() {
            return;
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(index) = self
                    .grid_geometry
                    .and_then(|geometry| geometry.cell_index_at(mouse.column, mouse.row))
                else {
                    return;
                };
                match self.state.grid(self.today) {
                    Ok(cells) => {
                        if let Some(cell) = cells.get(index) {
                            if self.state.select_cell(cell) {
                                self.state.focus = FocusPane::Grid;
                            }
                        }
                    }
                    Err(err) => tracing::error!(%err, "failed to build grid for click"),
                }
            }
            MouseEventKind::ScrollUp => self.state.prev_month(),
            MouseEventKind::ScrollDown => self.state.next_month(),
            _ => {}
        }
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> bool {
        if self.state.overlay().is_some()
            && key.code == KeyCode::Char('c')
            && key.modifiers.contains(KeyModifiers::CONTROL)
        {
            self.state.close_overlay();
            self.should_quit = true;
            return true;
        }
        match self.state.overlay() {
            Some(OverlayState::AddEvent(_)) => {
                match key.code {
                    KeyCode::Esc => {
                        self.state.close_overlay();
                        self.state.set_status_message(Some("Add canceled"));
                    }
                    KeyCode::Enter => self.submit_add_event(),
                    KeyCode::Backspace => self.state.add_event_pop_char(),
                    KeyCode::Char(ch) if is_plain(&key) => self.state.add_event_push_char(ch),
                    _ => {}
                }
                true
            }
            Some(OverlayState::DeleteEvent(_)) => {
                match key.code {
                    KeyCode::Esc | KeyCode::Char('n') => {
                        self.state.close_overlay();
                        self.state.set_status_message(Some("Delete canceled"));
                    }
                    KeyCode::Enter | KeyCode::Char('y') => self.submit_delete_event(),
                    _ => {}
                }
                true
            }
            None => false,
        }
    }

    fn submit_add_event(&mut self) {
        let Some((date, text)) = self
            .state
            .add_event_overlay()
            .map(|draft| (draft.date, draft.input.clone()))
        else {
            return;
        };
        let dispatcher = ActionDispatcher::new(self.storage.as_ref());
        match dispatcher.add_event(self.state.store_mut(), &date, &text) {
            Ok(outcome) => {
                self.state.close_overlay();
                self.state.select(date);
                let count = self.state.store().event_count(&date);
                self.state.move_event_cursor(self.today, count as isize);
                self.report_save(outcome, "Event added");
            }
            Err(EventError::EmptyText) => {
                self.state
                    .set_status_message(Some("Event text cannot be empty"));
            }
        }
    }

    fn submit_delete_event(&mut self) {
        let Some((date, index)) = self
            .state
            .delete_event_overlay()
            .map(|draft| (draft.date, draft.index))
        else {
            return;
        };
        self.state.close_overlay();
        let dispatcher = ActionDispatcher::new(self.storage.as_ref());
        match dispatcher.delete_event(self.state.store_mut(), &date, index) {
            Some((_, outcome)) => {
                self.state.clamp_event_cursor(self.today);
                self.report_save(outcome, "Event deleted");
            }
            None => self.state.set_status_message(Some("Event no longer exists")),
        }
    }

    fn report_save(&mut self, outcome: SaveOutcome, done: &str) {
        match outcome {
            SaveOutcome::Saved => self.state.set_status_message(Some(done)),
            SaveOutcome::Failed(message) => self
                .state
                .set_status_message(Some(format!("{done}, but saving failed: {message}"))),
        }
    }
}

fn is_plain(key: &KeyEvent) -> bool {
    !key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}
