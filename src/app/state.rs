use unicode_segmentation::UnicodeSegmentation;

use crate::calendar::{build_grid, shift_month, CalendarDate, DateError, GridCell};
use crate::events::EventStore;

pub const EMPTY_EVENTS_LABEL: &str = "No events for this day";
const MAX_EVENT_INPUT: usize = 200;

/// Which month is on screen and which day, if any, is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    viewed_year: i32,
    viewed_month: u8,
    selected: Option<CalendarDate>,
}

impl ViewState {
    pub fn new(today: CalendarDate) -> Self {
        Self {
            viewed_year: today.year(),
            viewed_month: today.month(),
            selected: None,
        }
    }

    pub fn viewed_year(&self) -> i32 {
        self.viewed_year
    }

    pub fn viewed_month(&self) -> u8 {
        self.viewed_month
    }

    pub fn selected(&self) -> Option<CalendarDate> {
        self.selected
    }

    /// Day the events panel and new events refer to; today when nothing is
    /// selected.
    pub fn selected_or(&self, today: CalendarDate) -> CalendarDate {
        self.selected.unwrap_or(today)
    }

    pub fn prev_month(&mut self) {
        self.shift(-1);
    }

    pub fn next_month(&mut self) {
        self.shift(1);
    }

    pub fn go_today(&mut self, today: CalendarDate) {
        self.viewed_year = today.year();
        self.viewed_month = today.month();
        self.selected = Some(today);
    }

    /// Selects `date` and brings its month into view.
    pub fn select(&mut self, date: CalendarDate) {
        self.viewed_year = date.year();
        self.viewed_month = date.month();
        self.selected = Some(date);
    }

    /// Grid-click selection: days spilling in from adjacent months are not
    /// selectable.
    pub fn select_cell(&mut self, cell: &GridCell) -> bool {
        if cell.is_other_month {
            return false;
        }
        self.selected = Some(cell.date);
        true
    }

    /// Moves the selection by whole days. With no selection in the viewed
    /// month the first move only picks an anchor (today if visible, else the
    /// first of the month).
    pub fn move_selection(
        &mut self,
        today: CalendarDate,
        delta_days: i64,
    ) -> Result<(), DateError> {
        match self.selected {
            Some(current) if current.is_same_month(self.viewed_year, self.viewed_month) => {
                let target = current.add_days(delta_days)?;
                self.select(target);
            }
            _ => {
                let anchor = if today.is_same_month(self.viewed_year, self.viewed_month) {
                    today
                } else {
                    CalendarDate::first_of_month(self.viewed_year, self.viewed_month)?
                };
                self.select(anchor);
            }
        }
        Ok(())
    }

    pub fn grid(
        &self,
        today: CalendarDate,
        store: &EventStore,
    ) -> Result<Vec<GridCell>, DateError> {
        build_grid(
            self.viewed_year,
            self.viewed_month,
            today,
            self.selected,
            store,
        )
    }

    fn shift(&mut self, delta: i32) {
        let (year, month) = shift_month(self.viewed_year, self.viewed_month, delta);
        self.viewed_year = year;
        self.viewed_month = month;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsPanel {
    pub date: CalendarDate,
    pub title: String,
    pub events: Vec<String>,
}

impl EventsPanel {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Grid,
    Events,
}

#[derive(Debug, Clone)]
pub struct AddEventOverlay {
    pub date: CalendarDate,
    pub input: String,
}

#[derive(Debug, Clone)]
pub struct DeleteEventOverlay {
    pub date: CalendarDate,
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
pub enum OverlayState {
    AddEvent(AddEventOverlay),
    DeleteEvent(DeleteEventOverlay),
}

pub struct AppState {
    view: ViewState,
    store: EventStore,
    pub focus: FocusPane,
    event_cursor: usize,
    overlay: Option<OverlayState>,
    pub status_message: Option<String>,
    pub show_event_counts: bool,
}

impl AppState {
    pub fn new(store: EventStore, today: CalendarDate, show_event_counts: bool) -> Self {
        Self {
            view: ViewState::new(today),
            store,
            focus: FocusPane::Grid,
            event_cursor: 0,
            overlay: None,
            status_message: None,
            show_event_counts,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EventStore {
        &mut self.store
    }

    pub fn grid(&self, today: CalendarDate) -> Result<Vec<GridCell>, DateError> {
        self.view.grid(today, &self.store)
    }

    pub fn events_panel(&self, today: CalendarDate) -> EventsPanel {
        let date = self.view.selected_or(today);
        EventsPanel {
            date,
            title: date.to_string(),
            events: self.store.events_for(&date).to_vec(),
        }
    }

    pub fn prev_month(&mut self) {
        self.view.prev_month();
    }

    pub fn next_month(&mut self) {
        self.view.next_month();
    }

    pub fn go_today(&mut self, today: CalendarDate) {
        self.view.go_today(today);
        self.event_cursor = 0;
    }

    pub fn select(&mut self, date: CalendarDate) {
        self.view.select(date);
        self.event_cursor = 0;
    }

    pub fn select_cell(&mut self, cell: &GridCell) -> bool {
        let changed = self.view.select_cell(cell);
        if changed {
            self.event_cursor = 0;
        }
        changed
    }

    pub fn move_selection(
        &mut self,
        today: CalendarDate,
        delta_days: i64,
    ) -> Result<(), DateError> {
        self.view.move_selection(today, delta_days)?;
        self.event_cursor = 0;
        Ok(())
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::Grid => FocusPane::Events,
            FocusPane::Events => FocusPane::Grid,
        };
    }

    pub fn event_cursor(&self) -> usize {
        self.event_cursor
    }

    pub fn move_event_cursor(&mut self, today: CalendarDate, delta: isize) {
        let len = self.events_panel(today).events.len();
        if len == 0 {
            self.event_cursor = 0;
            return;
        }
        let next = self.event_cursor as isize + delta;
        self.event_cursor = next.clamp(0, len as isize - 1) as usize;
    }

    /// Keeps the cursor on an existing entry after the list shrinks.
    pub fn clamp_event_cursor(&mut self, today: CalendarDate) {
        let len = self.events_panel(today).events.len();
        self.event_cursor = self.event_cursor.min(len.saturating_sub(1));
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
    }

    pub fn overlay(&self) -> Option<&OverlayState> {
        self.overlay.as_ref()
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn open_add_event(&mut self, today: CalendarDate) {
        let date = self.view.selected_or(today);
        self.overlay = Some(OverlayState::AddEvent(AddEventOverlay {
            date,
            input: String::new(),
        }));
    }

    /// Opens the delete confirmation for the entry under the cursor; returns
    /// false when the day has no events.
    pub fn open_delete_event(&mut self, today: CalendarDate) -> bool {
        let panel = self.events_panel(today);
        let Some(text) = panel.events.get(self.event_cursor) else {
            return false;
        };
        self.overlay = Some(OverlayState::DeleteEvent(DeleteEventOverlay {
            date: panel.date,
            index: self.event_cursor,
            text: text.clone(),
        }));
        true
    }

    pub fn add_event_overlay(&self) -> Option<&AddEventOverlay> {
        match self.overlay.as_ref() {
            Some(OverlayState::AddEvent(overlay)) => Some(overlay),
            _ => None,
        }
    }

    pub fn delete_event_overlay(&self) -> Option<&DeleteEventOverlay> {
        match self.overlay.as_ref() {
            Some(OverlayState::DeleteEvent(overlay)) => Some(overlay),
            _ => None,
        }
    }

    pub fn add_event_push_char(&mut self, ch: char) {
        if let Some(OverlayState::AddEvent(overlay)) = self.overlay.as_mut() {
            if overlay.input.chars().count() < MAX_EVENT_INPUT {
                overlay.input.push(ch);
            }
        }
    }

    pub fn add_event_pop_char(&mut self) {
        if let Some(OverlayState::AddEvent(overlay)) = self.overlay.as_mut() {
            let cut = overlay
                .input
                .grapheme_indices(true)
                .next_back()
                .map(|(idx, _)| idx)
                .unwrap_or(0);
            overlay.input.truncate(cut);
        }
    }
}
