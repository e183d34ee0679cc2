use crate::app::{App, InputMode};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph, Wrap,
};
use ratatui::Frame;
use tickerdash_domain::services::time_format::time_only;
use tickerdash_domain::value_objects::color::Rgb;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(8),
                Constraint::Length(7),
            ]
            .as_ref(),
        )
        .split(size);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(36), Constraint::Min(20)].as_ref())
        .split(outer[1]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)].as_ref())
        .split(body[0]);

    draw_top_banner(frame, outer[0], app);
    draw_watchlist(frame, side[0], app);
    draw_chat(frame, side[1], app);
    draw_chart(frame, body[1], app);
    draw_bottom(frame, outer[2], app);
}

fn color_of(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

fn draw_top_banner(frame: &mut Frame, area: Rect, app: &App) {
    let (text, style) = match &app.status {
        Some(Ok(msg)) => (msg.clone(), Style::default().fg(Color::Green)),
        Some(Err(err)) => (
            format!("error: {err}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        None => (
            "a add · c chat · space mark · +/- window · w send · e export · r refresh · q quit"
                .to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    };
    let busy = if app.pending > 0 { " [busy]" } else { "" };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("tickerdash ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(text, style),
            Span::raw(busy),
        ]))
        .alignment(Alignment::Left),
        area,
    );
}

fn draw_watchlist(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = if app.series.is_empty() {
        vec![ListItem::new(Line::from("press `a` to add a ticker"))]
    } else {
        app.series
            .iter()
            .enumerate()
            .map(|(idx, series)| {
                let marked = app.marked.contains(&series.symbol);
                let price = series
                    .latest()
                    .map(|(_, p)| format!("{p:.2}"))
                    .unwrap_or_else(|| "-".to_string());
                let mut name_style = Style::default().fg(color_of(series.color));
                if idx == app.cursor {
                    name_style = name_style.add_modifier(Modifier::REVERSED);
                }
                ListItem::new(Line::from(vec![
                    Span::raw(if marked { "[x] " } else { "[ ] " }),
                    Span::styled(format!("{:<8}", series.symbol.as_str()), name_style),
                    Span::raw(format!(" {price:>10}")),
                ]))
            })
            .collect()
    };

    let title = format!("Watchlist (window {})", app.selection_window);
    frame.render_widget(
        List::new(items).block(Block::default().title(title).borders(Borders::ALL)),
        area,
    );
}

fn draw_chat(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)].as_ref())
        .split(area);

    let max_lines = chunks[0].height.saturating_sub(2) as usize;
    let skip = app.chat.len().saturating_sub(max_lines);
    let lines: Vec<Line> = app
        .chat
        .iter()
        .skip(skip)
        .map(|line| {
            let style = if line.from_user {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            Line::from(Span::styled(line.text.clone(), style))
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().title("Chat").borders(Borders::ALL))
            .wrap(Wrap { trim: false }),
        chunks[0],
    );

    let (title, active) = match app.mode {
        InputMode::Normal => ("Input", false),
        InputMode::AddTicker => ("Add ticker (Enter / Esc)", true),
        InputMode::Chat => ("Ask a price (Enter / Esc)", true),
    };
    let style = if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    frame.render_widget(
        Paragraph::new(Line::from(app.input.value.clone()))
            .block(Block::default().title(title).borders(Borders::ALL).border_style(style)),
        chunks[1],
    );
    if active {
        let prefix = app.input.value[..app.input.cursor].chars().count() as u16;
        frame.set_cursor_position((chunks[1].x + 1 + prefix, chunks[1].y + 1));
    }
}

fn draw_chart(frame: &mut Frame, area: Rect, app: &App) {
    let mut title = "Prices".to_string();
    if let Some(note) = &app.refresh_note {
        title.push_str(&format!(" ({note})"));
    }
    let block = Block::default().title(title).borders(Borders::ALL);

    if app.series.iter().all(|s| s.points.is_empty()) {
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(""),
                Line::from("No data yet."),
                Line::from("Add a ticker; prices refresh automatically."),
            ])
            .block(block)
            .alignment(Alignment::Center),
            area,
        );
        return;
    }

    let origin = app
        .series
        .iter()
        .filter_map(|s| s.points.first().map(|p| p.0))
        .min()
        .unwrap_or(0);
    let data: Vec<Vec<(f64, f64)>> = app
        .series
        .iter()
        .map(|s| {
            s.points
                .iter()
                .map(|(ts, price)| ((ts - origin) as f64 / 1000.0, *price))
                .collect()
        })
        .collect();

    let all: Vec<(f64, f64)> = data.iter().flatten().copied().collect();
    let (x_min, x_max) = x_bounds(&all);
    let (y_min, y_max) = y_bounds(&all);

    let datasets: Vec<Dataset> = app
        .series
        .iter()
        .zip(data.iter())
        .map(|(series, points)| {
            Dataset::default()
                .name(series.symbol.to_string())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(color_of(series.color)))
                .data(points)
        })
        .collect();

    let x_labels = vec![
        Line::from(time_only(origin + (x_min * 1000.0) as i64)),
        Line::from(time_only(origin + (x_max * 1000.0) as i64)),
    ];
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(Axis::default().bounds([x_min, x_max]).labels(x_labels))
        .y_axis(
            Axis::default()
                .bounds([y_min, y_max])
                .labels(axis_labels(y_min, y_max)),
        );
    frame.render_widget(chart, area);
}

/// `(min, max)` of the finite values, or `None` when there are none.
fn span_of(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn x_bounds(points: &[(f64, f64)]) -> (f64, f64) {
    match span_of(points.iter().map(|p| p.0)) {
        None => (0.0, 1.0),
        Some((lo, hi)) if hi <= lo => (lo, lo + 1.0),
        Some(span) => span,
    }
}

/// Price axis with 5% headroom; a flat line gets one unit either side.
fn y_bounds(points: &[(f64, f64)]) -> (f64, f64) {
    match span_of(points.iter().map(|p| p.1)) {
        None => (0.0, 1.0),
        Some((lo, hi)) if hi <= lo => (lo - 1.0, hi + 1.0),
        Some((lo, hi)) => {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        }
    }
}

fn axis_labels(min: f64, max: f64) -> Vec<Line<'static>> {
    let mid = (min + max) / 2.0;
    vec![
        Line::from(format!("{min:.2}")),
        Line::from(format!("{mid:.2}")),
        Line::from(format!("{max:.2}")),
    ]
}

fn draw_bottom(frame: &mut Frame, area: Rect, app: &App) {
    let (logs, dropped) = {
        let store = app.logs.lock();
        (store.snapshot(), store.dropped())
    };
    let max_lines = area.height.saturating_sub(2) as usize;

    let start_from_end = app.log_scroll.min(logs.len());
    let mut visible: Vec<String> = logs
        .into_iter()
        .rev()
        .skip(start_from_end)
        .take(max_lines)
        .collect();
    visible.reverse();

    let text: Vec<Line> = visible.into_iter().map(Line::from).collect();
    let title = if dropped > 0 {
        format!("Logs ({dropped} older dropped)")
    } else {
        "Logs".to_string()
    };
    frame.render_widget(
        Paragraph::new(text)
            .block(Block::default().title(title).borders(Borders::ALL))
            .wrap(Wrap { trim: false }),
        area,
    );
}
