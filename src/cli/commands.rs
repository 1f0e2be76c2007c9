use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::app::state::EMPTY_EVENTS_LABEL;
use crate::app::{ActionDispatcher, App, SaveOutcome};
use crate::calendar::{
    build_grid, month_name, parse_date_key, CalendarDate, GRID_COLUMNS, WEEKDAY_SHORT,
};
use crate::events::{EventError, EventStore};
use crate::storage::{self, SlotStore};

const TEXT_CELL_WIDTH: usize = 8;

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Day of the event: YYYY-MM-DD or `today`
    pub date: String,
    /// Event text; multiple words are joined with spaces
    #[arg(required = true, trailing_var_arg = true)]
    pub text: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Day of the event: YYYY-MM-DD or `today`
    pub date: String,
    /// Position of the event as printed by `list` (starting at 1)
    pub index: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Only list this day (YYYY-MM-DD or `today`)
    pub date: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct MonthArgs {
    /// Year to print (defaults to the current year)
    #[arg(long)]
    pub year: Option<i32>,
    /// Month to print, 1-12 (defaults to the current month)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=12))]
    pub month: Option<u8>,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

/// Accepts a `YYYY-MM-DD` key or the word `today`.
pub fn parse_date_arg(raw: &str, today: CalendarDate) -> Result<CalendarDate> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("today") {
        return Ok(today);
    }
    trimmed
        .parse::<CalendarDate>()
        .with_context(|| format!("invalid date '{raw}', expected YYYY-MM-DD or 'today'"))
}

pub fn run_add(storage: &dyn SlotStore, args: &AddArgs, today: CalendarDate) -> Result<String> {
    let date = parse_date_arg(&args.date, today)?;
    let text = args.text.join(" ");
    let mut store = storage::load(storage);
    let dispatcher = ActionDispatcher::new(storage);
    match dispatcher.add_event(&mut store, &date, &text) {
        Ok(SaveOutcome::Saved) => {}
        Ok(SaveOutcome::Failed(message)) => bail!("event could not be saved: {message}"),
        Err(EventError::EmptyText) => bail!("event text cannot be empty"),
    }
    let count = store.event_count(&date);
    Ok(format!(
        "Added event #{count} on {}: {}\n",
        date.key(),
        text.trim()
    ))
}

/// Deletes by 1-based position; a position that does not exist is reported,
/// not treated as an error.
pub fn run_delete(
    storage: &dyn SlotStore,
    args: &DeleteArgs,
    today: CalendarDate,
) -> Result<String> {
    let date = parse_date_arg(&args.date, today)?;
    let mut store = storage::load(storage);
    let removed = args
        .index
        .checked_sub(1)
        .and_then(|index| {
            ActionDispatcher::new(storage).delete_event(&mut store, &date, index)
        });
    match removed {
        Some((text, SaveOutcome::Saved)) => Ok(format!("Removed '{text}' from {}\n", date.key())),
        Some((_, SaveOutcome::Failed(message))) => {
            bail!("event removed but could not be saved: {message}")
        }
        None => Ok(format!("No event #{} on {}\n", args.index, date.key())),
    }
}

pub fn run_list(storage: &dyn SlotStore, args: &ListArgs, today: CalendarDate) -> Result<String> {
    let store = storage::load(storage);
    let mut out = String::new();
    match &args.date {
        Some(raw) => {
            let date = parse_date_arg(raw, today)?;
            write_day(&mut out, &date, store.events_for(&date));
        }
        None => {
            let mut days: Vec<(CalendarDate, &[String])> = store
                .iter()
                .filter_map(|(key, events)| match parse_date_key(key) {
                    Ok(date) => Some((date, events)),
                    Err(err) => {
                        tracing::warn!(%key, %err, "skipping unparsable date key");
                        None
                    }
                })
                .collect();
            days.sort_by_key(|(date, _)| *date);
            if days.is_empty() {
                out.push_str("No events stored.\n");
            }
            for (date, events) in days {
                write_day(&mut out, &date, events);
            }
        }
    }
    Ok(out)
}

fn write_day(out: &mut String, date: &CalendarDate, events: &[String]) {
    let _ = writeln!(out, "{} ({})", date, date.key());
    if events.is_empty() {
        let _ = writeln!(out, "    {EMPTY_EVENTS_LABEL}");
    }
    for (idx, text) in events.iter().enumerate() {
        let _ = writeln!(out, "    {}. {text}", idx + 1);
    }
}

pub fn run_month(storage: &dyn SlotStore, args: &MonthArgs, today: CalendarDate) -> Result<String> {
    let year = args.year.unwrap_or_else(|| today.year());
    let month = args.month.map(|m| m - 1).unwrap_or_else(|| today.month());
    let store = storage::load(storage);
    render_month_text(year, month, today, &store)
}

/// Plain-text month grid: other-month days in parentheses, today prefixed
/// with `*`, event counts appended as `+N`.
pub fn render_month_text(
    year: i32,
    month: u8,
    today: CalendarDate,
    store: &EventStore,
) -> Result<String> {
    let cells = build_grid(year, month, today, None, store)
        .with_context(|| format!("building grid for {year}-{:02}", month + 1))?;
    let title = format!("{} {year}", month_name(month)?);

    let mut out = String::new();
    let width = TEXT_CELL_WIDTH * GRID_COLUMNS;
    let _ = writeln!(out, "{title:^width$}");
    let header: String = WEEKDAY_SHORT
        .iter()
        .map(|name| format!("{name:<TEXT_CELL_WIDTH$}"))
        .collect();
    let _ = writeln!(out, "{}", header.trim_end());

    for week in cells.chunks(GRID_COLUMNS) {
        let row: String = week
            .iter()
            .map(|cell| {
                let mut label = if cell.is_other_month {
                    format!("({})", cell.day())
                } else if cell.is_today {
                    format!("*{}", cell.day())
                } else {
                    cell.day().to_string()
                };
                if cell.event_count > 0 {
                    let _ = write!(label, "+{}", cell.event_count);
                }
                format!("{label:<TEXT_CELL_WIDTH$}")
            })
            .collect();
        let _ = writeln!(out, "{}", row.trim_end());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemorySlots, EVENTS_SLOT};

    type TestResult<T = ()> = Result<T>;

    fn today() -> CalendarDate {
        CalendarDate::new(2024, 2, 5).expect("valid date")
    }

    fn add(storage: &dyn SlotStore, date: &str, text: &str) -> TestResult<String> {
        let args = AddArgs {
            date: date.into(),
            text: text.split(' ').map(String::from).collect(),
        };
        run_add(storage, &args, today())
    }

    #[test]
    fn date_argument_accepts_keys_and_today() -> TestResult {
        assert_eq!(parse_date_arg("today", today())?, today());
        assert_eq!(parse_date_arg("TODAY", today())?, today());
        assert_eq!(
            parse_date_arg("2023-12-31", today())?,
            CalendarDate::new(2023, 11, 31)?
        );
        assert!(parse_date_arg("31/12/2023", today()).is_err());
        assert!(parse_date_arg("2023-02-30", today()).is_err());
        Ok(())
    }

    #[test]
    fn cli_add_joins_words_and_persists() -> TestResult {
        let storage = MemorySlots::new();
        let output = add(&storage, "today", "Call the dentist")?;
        assert_eq!(output, "Added event #1 on 2024-03-05: Call the dentist\n");
        assert_eq!(
            storage.read_slot(EVENTS_SLOT)?.as_deref(),
            Some(r#"{"2024-03-05":["Call the dentist"]}"#)
        );
        Ok(())
    }

    #[test]
    fn cli_add_rejects_blank_text() -> TestResult {
        let storage = MemorySlots::new();
        let err = add(&storage, "2024-03-05", "   ").expect_err("blank text");
        assert!(err.to_string().contains("cannot be empty"));
        assert_eq!(storage.read_slot(EVENTS_SLOT)?, None);
        Ok(())
    }

    #[test]
    fn cli_delete_uses_one_based_positions() -> TestResult {
        let storage = MemorySlots::new();
        add(&storage, "2024-03-05", "Dentist")?;
        add(&storage, "2024-03-05", "Meeting")?;

        let missing = DeleteArgs {
            date: "2024-03-05".into(),
            index: 0,
        };
        assert_eq!(
            run_delete(&storage, &missing, today())?,
            "No event #0 on 2024-03-05\n"
        );

        let args = DeleteArgs {
            date: "2024-03-05".into(),
            index: 2,
        };
        assert_eq!(
            run_delete(&storage, &args, today())?,
            "Removed 'Meeting' from 2024-03-05\n"
        );
        assert_eq!(
            run_delete(&storage, &args, today())?,
            "No event #2 on 2024-03-05\n"
        );
        Ok(())
    }

    #[test]
    fn cli_list_orders_days_chronologically() -> TestResult {
        let storage = MemorySlots::new();
        add(&storage, "2024-03-05", "Dentist")?;
        add(&storage, "2023-12-31", "Party")?;

        let all = run_list(&storage, &ListArgs { date: None }, today())?;
        let party = all.find("Party").expect("party listed");
        let dentist = all.find("Dentist").expect("dentist listed");
        assert!(party < dentist);
        assert!(all.contains("5 March 2024 (2024-03-05)"));

        let empty_day = ListArgs {
            date: Some("2024-03-06".into()),
        };
        assert!(run_list(&storage, &empty_day, today())?.contains(EMPTY_EVENTS_LABEL));
        Ok(())
    }

    #[test]
    fn cli_list_shows_events_before_year_one() -> TestResult {
        let storage = MemorySlots::new();
        add(&storage, "-0001-12-31", "Solstice")?;
        add(&storage, "0044-03-15", "Ides")?;

        let all = run_list(&storage, &ListArgs { date: None }, today())?;
        let solstice = all.find("Solstice").expect("negative year listed");
        let ides = all.find("Ides").expect("early year listed");
        assert!(solstice < ides);
        assert!(all.contains("(-0001-12-31)"));
        assert!(parse_date_arg("+2024-03-05", today()).is_err());
        Ok(())
    }

    #[test]
    fn cli_list_reports_empty_store() -> TestResult {
        let output = run_list(&MemorySlots::new(), &ListArgs { date: None }, today())?;
        assert_eq!(output, "No events stored.\n");
        Ok(())
    }

    #[test]
    fn month_text_marks_spillover_today_and_counts() -> TestResult {
        let mut store = EventStore::new();
        store.add_event(&today(), "Dentist")?;
        store.add_event(&today(), "Meeting")?;
        store.add_event(&CalendarDate::new(2024, 3, 1)?, "April fool")?;

        let text = render_month_text(2024, 2, today(), &store)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[0].contains("March 2024"));
        assert!(lines[1].starts_with("Mon"));
        assert!(lines[2].starts_with("(26)"));
        assert!(lines[2].ends_with("3"));
        assert!(lines[3].contains("*5+2"));
        assert!(lines[6].ends_with("31"));
        assert!(lines[7].starts_with("(1)+1"));
        assert!(lines[7].ends_with("(7)"));
        Ok(())
    }

    #[test]
    fn month_command_defaults_to_current_month() -> TestResult {
        let storage = MemorySlots::new();
        let args = MonthArgs {
            year: None,
            month: None,
        };
        assert!(run_month(&storage, &args, today())?.contains("March 2024"));

        let args = MonthArgs {
            year: Some(2021),
            month: Some(2),
        };
        let text = run_month(&storage, &args, today())?;
        assert!(text.contains("February 2021"));
        assert!(text.lines().nth(2).is_some_and(|row| row.starts_with('1')));
        Ok(())
    }
}
