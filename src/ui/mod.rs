use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{AppState, FocusPane, OverlayState, EMPTY_EVENTS_LABEL};
use crate::calendar::{CalendarDate, GridCell, GRID_COLUMNS, WEEKDAY_SHORT};
use crate::config::themes::Palette;

const GRID_ROWS: u16 = 6;

/// Where the day cells were drawn on the last frame, for mouse hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub area: Rect,
    pub cell_width: u16,
    pub row_height: u16,
}

impl GridGeometry {
    /// `area` is the inner grid block: one weekday header row followed by
    /// six week rows.
    pub fn new(area: Rect) -> Self {
        let cell_width = (area.width / GRID_COLUMNS as u16).max(1);
        let row_height = (area.height.saturating_sub(1) / GRID_ROWS).max(1);
        Self {
            area,
            cell_width,
            row_height,
        }
    }

    pub fn cell_rect(&self, index: usize) -> Rect {
        let column = (index % GRID_COLUMNS) as u16;
        let row = (index / GRID_COLUMNS) as u16;
        Rect {
            x: self.area.x + column * self.cell_width,
            y: self.area.y + 1 + row * self.row_height,
            width: self.cell_width,
            height: self.row_height,
        }
    }

    /// Grid index under a terminal position, if any.
    pub fn cell_index_at(&self, column: u16, row: u16) -> Option<usize> {
        if column < self.area.x || row <= self.area.y {
            return None;
        }
        let col = (column - self.area.x) / self.cell_width;
        let week = (row - self.area.y - 1) / self.row_height;
        if col >= GRID_COLUMNS as u16 || week >= GRID_ROWS {
            return None;
        }
        Some(week as usize * GRID_COLUMNS + col as usize)
    }
}

pub fn draw_app(
    frame: &mut Frame,
    state: &AppState,
    today: CalendarDate,
    palette: &Palette,
    list_state: &mut ListState,
) -> Option<GridGeometry> {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(2)])
        .split(frame.size());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(vertical[0]);

    let geometry = draw_month(frame, state, today, palette, columns[0]);
    draw_events(frame, state, today, palette, list_state, columns[1]);

    let status = build_status_line(state, palette);
    frame.render_widget(Paragraph::new(status), vertical[1]);

    render_overlay(frame, state, palette);
    geometry
}

fn focus_style(state: &AppState, pane: FocusPane, palette: &Palette) -> Style {
    if state.focus == pane {
        Style::default().fg(palette.accent)
    } else {
        Style::default()
    }
}

fn draw_month(
    frame: &mut Frame,
    state: &AppState,
    today: CalendarDate,
    palette: &Palette,
    area: Rect,
) -> Option<GridGeometry> {
    let view = state.view();
    let title = format!(
        " ◂ {} {} ▸ ",
        crate::calendar::month_name(view.viewed_month()).unwrap_or_default(),
        view.viewed_year()
    );
    let block = Block::default()
        .title(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(focus_style(state, FocusPane::Grid, palette));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cells = match state.grid(today) {
        Ok(cells) => cells,
        Err(err) => {
            tracing::error!(%err, "failed to build month grid");
            let message = Paragraph::new(format!("Cannot show this month: {err}"))
                .style(Style::default().fg(palette.error))
                .wrap(Wrap { trim: true });
            frame.render_widget(message, inner);
            return None;
        }
    };

    let geometry = GridGeometry::new(inner);
    let width = geometry.cell_width as usize;
    let header: Vec<Span> = WEEKDAY_SHORT
        .iter()
        .map(|name| {
            Span::styled(
                fit_width(&format!(" {name}"), width),
                Style::default()
                    .fg(palette.muted)
                    .add_modifier(Modifier::BOLD),
            )
        })
        .collect();
    let header_area = Rect {
        height: 1.min(inner.height),
        ..inner
    };
    frame.render_widget(Paragraph::new(Line::from(header)), header_area);

    for (index, cell) in cells.iter().enumerate() {
        let rect = geometry.cell_rect(index).intersection(inner);
        if rect.height == 0 || rect.width == 0 {
            continue;
        }
        let paragraph = Paragraph::new(cell_lines(cell, state.show_event_counts, rect, palette))
            .style(cell_style(cell, palette));
        frame.render_widget(paragraph, rect);
    }
    Some(geometry)
}

fn cell_style(cell: &GridCell, palette: &Palette) -> Style {
    if cell.is_selected {
        Style::default()
            .fg(palette.selected_fg)
            .bg(palette.selected_bg)
            .add_modifier(Modifier::BOLD)
    } else if cell.is_today {
        Style::default()
            .fg(palette.today)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else if cell.is_other_month {
        Style::default().fg(palette.muted)
    } else {
        Style::default().fg(palette.text)
    }
}

fn cell_lines(
    cell: &GridCell,
    show_counts: bool,
    rect: Rect,
    palette: &Palette,
) -> Vec<Line<'static>> {
    let width = rect.width as usize;
    let day = format!(" {:>2}", cell.day());
    let marker = (show_counts && cell.event_count > 0).then(|| format!(" •{}", cell.event_count));
    let marker_style = if cell.is_selected {
        Style::default()
    } else {
        Style::default().fg(palette.event_marker)
    };
    match marker {
        Some(marker) if rect.height >= 2 => vec![
            Line::from(fit_width(&day, width)),
            Line::from(Span::styled(fit_width(&marker, width), marker_style)),
        ],
        Some(marker) => vec![Line::from(vec![
            Span::raw(day.clone()),
            Span::styled(
                fit_width(&marker, width.saturating_sub(day.width())),
                marker_style,
            ),
        ])],
        None => vec![Line::from(fit_width(&day, width))],
    }
}

fn draw_events(
    frame: &mut Frame,
    state: &AppState,
    today: CalendarDate,
    palette: &Palette,
    list_state: &mut ListState,
    area: Rect,
) {
    let panel = state.events_panel(today);
    let title = if panel.is_empty() {
        format!(" {} ", panel.title)
    } else {
        format!(" {} ({}) ", panel.title, panel.events.len())
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(focus_style(state, FocusPane::Events, palette));

    if panel.is_empty() {
        list_state.select(None);
        let empty = Paragraph::new(Line::from(Span::styled(
            EMPTY_EVENTS_LABEL,
            Style::default()
                .fg(palette.muted)
                .add_modifier(Modifier::ITALIC),
        )))
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = panel
        .events
        .iter()
        .enumerate()
        .map(|(idx, text)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", idx + 1), Style::default().fg(palette.muted)),
                Span::styled(text.clone(), Style::default().fg(palette.text)),
            ]))
        })
        .collect();

    list_state.select(Some(state.event_cursor()));
    let highlight = if state.focus == FocusPane::Events {
        Style::default()
            .bg(palette.selected_bg)
            .fg(palette.selected_fg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let list = List::new(items)
        .block(block)
        .highlight_style(highlight)
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, area, list_state);
}

fn build_status_line(state: &AppState, palette: &Palette) -> Text<'static> {
    let store = state.store();
    let focus = match state.focus {
        FocusPane::Grid => "Grid",
        FocusPane::Events => "Events",
    };
    let mut spans = vec![
        Span::raw(format!(
            "Events: {} on {} day(s)",
            store.total_events(),
            store.len()
        )),
        Span::raw(" | Focus: "),
        Span::styled(focus, Style::default().add_modifier(Modifier::BOLD)),
    ];
    if let Some(message) = &state.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            message.clone(),
            Style::default().fg(palette.accent),
        ));
    }

    let help = Line::from(Span::styled(
        "←→↑↓ move • [ ] month • t today • a add • d delete • Tab focus • q quit",
        Style::default().fg(palette.muted),
    ));
    Text::from(vec![Line::from(spans), help])
}

fn render_overlay(frame: &mut Frame, state: &AppState, palette: &Palette) {
    match state.overlay() {
        Some(OverlayState::AddEvent(draft)) => {
            let area = centered_rect(60, 30, frame.size());
            frame.render_widget(Clear, area);
            let mut input_display = draft.input.clone();
            input_display.push('▌');
            let paragraph = Paragraph::new(vec![
                Line::from(Span::styled(
                    format!("New event for {}", draft.date),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(input_display),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter to save • Esc to cancel",
                    Style::default().fg(palette.muted),
                )),
            ])
            .block(
                Block::default()
                    .title("Add Event")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.accent)),
            )
            .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        Some(OverlayState::DeleteEvent(draft)) => {
            let area = centered_rect(60, 30, frame.size());
            frame.render_widget(Clear, area);
            let paragraph = Paragraph::new(vec![
                Line::from(Span::styled(
                    "Delete Event",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(format!("Remove '{}' from {}?", draft.text, draft.date)),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter to confirm • Esc to cancel",
                    Style::default().fg(palette.muted),
                )),
            ])
            .block(
                Block::default()
                    .title(format!("Confirm Delete (#{})", draft.index + 1))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.error)),
            )
            .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        None => {}
    }
}

/// Truncates to at most `width` display columns on grapheme boundaries.
fn fit_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let w = grapheme.width();
        if used + w > width {
            break;
        }
        out.push_str(grapheme);
        used += w;
    }
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}
