pub mod app;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod events;
pub mod storage;
pub mod ui;

pub use calendar::{build_grid, date_key, parse_date_key, CalendarDate, DateError, GridCell};
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use events::{EventError, EventStore};
pub use storage::{load, save, SlotStore, EVENTS_SLOT};
