use super::{days_in_month, shift_month, CalendarDate, DateError};
use crate::events::EventStore;

/// Six Monday-first weeks.
pub const GRID_CELLS: usize = 42;
pub const GRID_COLUMNS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    pub date: CalendarDate,
    pub is_other_month: bool,
    pub is_today: bool,
    pub is_selected: bool,
    pub event_count: usize,
}

impl GridCell {
    pub fn day(&self) -> u8 {
        self.date.day()
    }
}

/// Derives the month view: leading days of the previous month, the viewed
/// month itself, then days of the next month until exactly 42 cells exist.
///
/// Today and selection highlighting only ever apply to cells of the viewed
/// month.
pub fn build_grid(
    viewed_year: i32,
    viewed_month: u8,
    today: CalendarDate,
    selected: Option<CalendarDate>,
    store: &EventStore,
) -> Result<Vec<GridCell>, DateError> {
    let leading = CalendarDate::first_of_month(viewed_year, viewed_month)?.weekday_offset();
    let month_len = days_in_month(viewed_year, viewed_month)?;

    let (prev_year, prev_month) = shift_month(viewed_year, viewed_month, -1);
    let prev_len = days_in_month(prev_year, prev_month)?;
    let (next_year, next_month) = shift_month(viewed_year, viewed_month, 1);

    let make_cell = |date: CalendarDate, is_other_month: bool| GridCell {
        date,
        is_other_month,
        is_today: !is_other_month && date == today,
        is_selected: !is_other_month && selected == Some(date),
        event_count: store.event_count(&date),
    };

    let mut cells = Vec::with_capacity(GRID_CELLS);
    for day in (prev_len - leading + 1)..=prev_len {
        cells.push(make_cell(
            CalendarDate::new(prev_year, prev_month, day)?,
            true,
        ));
    }
    for day in 1..=month_len {
        cells.push(make_cell(
            CalendarDate::new(viewed_year, viewed_month, day)?,
            false,
        ));
    }
    let trailing = GRID_CELLS - cells.len();
    for day in 1..=trailing as u8 {
        cells.push(make_cell(
            CalendarDate::new(next_year, next_month, day)?,
            true,
        ));
    }
    Ok(cells)
}

/// Cells that belong to the viewed month, in day order.
pub fn body_cells(grid: &[GridCell]) -> impl Iterator<Item = &GridCell> {
    grid.iter().filter(|cell| !cell.is_other_month)
}
