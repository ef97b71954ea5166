use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table,
    },
    Frame, Terminal,
};

use crate::cities::is_searchable;
use crate::debounce::Debouncer;
use crate::error::Result;
use crate::icons::Icon;
use crate::suggest::Suggestions;
use crate::units::Units;
use crate::weather::{forecast_days, CurrentView, ForecastDay};
use crate::worker::{Request, Response, Worker};

const MISSING: &str = "--";
const TICK: Duration = Duration::from_millis(250);
const MAX_SUGGESTIONS_SHOWN: u16 = 8;

pub struct App {
    pub input: String,
    pub suggestions: Suggestions,
    pub current: Option<CurrentView>,
    pub forecast: Vec<ForecastDay>,
    pub status: Option<String>,
    pub loading: Option<String>,
    pub should_quit: bool,
    units: Units,
    debouncer: Debouncer<String>,
    search_seq: u64,
    last_city: Option<String>,
    refresh: Option<Duration>,
    last_fetch: Option<Instant>,
}

impl App {
    pub fn new(units: Units, debounce: Duration, refresh: Option<Duration>) -> Self {
        Self {
            input: String::new(),
            suggestions: Suggestions::default(),
            current: None,
            forecast: Vec::new(),
            status: None,
            loading: None,
            should_quit: false,
            units,
            debouncer: Debouncer::new(debounce),
            search_seq: 0,
            last_city: None,
            refresh,
            last_fetch: None,
        }
    }

    pub fn last_city(&self) -> Option<&str> {
        self.last_city.as_deref()
    }

    pub fn request_weather(&mut self, city: &str, now: Instant) -> Request {
        self.loading = Some(city.to_string());
        self.last_fetch = Some(now);
        Request::Weather {
            city: city.to_string(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Option<Request> {
        if key.kind == KeyEventKind::Release {
            return None;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                None
            }
            KeyCode::Esc => {
                if self.suggestions.is_visible() {
                    self.close_suggestions();
                } else {
                    self.should_quit = true;
                }
                None
            }
            KeyCode::Down => {
                self.suggestions.select_next();
                None
            }
            KeyCode::Up => {
                self.suggestions.select_prev();
                None
            }
            KeyCode::Enter => {
                let city = match self.suggestions.selected() {
                    Some(city) => city.name.clone(),
                    None => self.input.trim().to_string(),
                };
                self.input.clear();
                self.debouncer.cancel();
                if city.is_empty() {
                    return None;
                }
                Some(self.request_weather(&city, now))
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.debouncer.push(self.input.clone(), now);
                None
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
                self.debouncer.push(self.input.clone(), now);
                None
            }
            _ => None,
        }
    }

    /// Time-driven work: a settled search query, or a due refresh.
    pub fn tick(&mut self, now: Instant) -> Option<Request> {
        if let Some(query) = self.debouncer.poll(now) {
            // Any answer still in flight is for an older query now
            self.search_seq += 1;
            if !is_searchable(&query) {
                self.suggestions.clear();
                return None;
            }
            return Some(Request::Cities {
                seq: self.search_seq,
                query,
            });
        }

        let due = match (self.refresh, self.last_fetch) {
            (Some(every), Some(last)) => now.duration_since(last) >= every,
            _ => false,
        };
        if due && self.loading.is_none() {
            let city = self.last_city.clone()?;
            tracing::debug!(city = %city, "refreshing");
            return Some(self.request_weather(&city, now));
        }
        None
    }

    /// Apply a worker answer. Returns the city name when a new city was shown.
    pub fn apply(&mut self, response: Response) -> Option<String> {
        match response {
            Response::Cities { seq, .. } if seq != self.search_seq => {
                tracing::debug!(seq, current = self.search_seq, "dropping stale suggestions");
                None
            }
            Response::Cities { result, .. } => {
                match result {
                    Ok(cities) => self.suggestions.show(cities),
                    Err(_) => self.suggestions.fail(),
                }
                None
            }
            Response::Weather { city, result } => {
                self.loading = None;
                match result {
                    Ok(report) => {
                        let view =
                            CurrentView::from_weather(&report.current, &Local::now(), self.units)
                                .merge_icon(self.current.as_ref());
                        // Current conditions are shown even when the forecast failed
                        self.status = match &report.daily {
                            Ok(daily) => {
                                self.forecast = forecast_days(daily, report.current.timezone);
                                None
                            }
                            Err(e) => {
                                self.forecast.clear();
                                Some(format!("{city}: forecast unavailable. {}", e.user_message()))
                            }
                        };
                        tracing::debug!(
                            icon = ?view.icon.map(Icon::asset_path),
                            forecast_icons = ?self.forecast.iter().map(|d| &d.icon_url).collect::<Vec<_>>(),
                            "views updated"
                        );
                        self.current = Some(view);
                        self.suggestions.clear();
                        let changed = self.last_city.as_deref() != Some(city.as_str());
                        self.last_city = Some(city.clone());
                        changed.then_some(city)
                    }
                    Err(e) => {
                        self.status = Some(format!("{city}: {}", e.user_message()));
                        None
                    }
                }
            }
        }
    }

    fn close_suggestions(&mut self) {
        self.debouncer.cancel();
        self.search_seq += 1;
        self.suggestions.clear();
    }

    fn poll_timeout(&self, now: Instant) -> Duration {
        self.debouncer
            .time_until_due(now)
            .map_or(TICK, |due| due.min(TICK))
    }
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    worker: &Worker,
    mut on_city_shown: impl FnMut(&str),
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(app.poll_timeout(Instant::now()))? {
            if let Event::Key(key) = event::read()? {
                if let Some(request) = app.handle_key(key, Instant::now()) {
                    worker.send(request)?;
                }
            }
        }

        if let Some(request) = app.tick(Instant::now()) {
            worker.send(request)?;
        }

        while let Some(response) = worker.try_recv()? {
            if let Some(city) = app.apply(response) {
                on_city_shown(&city);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Yellow),
        ))
        .title_alignment(Alignment::Left)
        .border_style(Style::default().fg(Color::Cyan))
        .border_type(BorderType::Rounded)
}

fn display_search(app: &App) -> Paragraph<'_> {
    let text = if app.input.is_empty() {
        Span::styled("Search for a city...", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(app.input.as_str())
    };
    Paragraph::new(Line::from(vec![Span::raw(" "), text])).block(panel("City"))
}

fn display_current_conditions(current: &CurrentView) -> Table<'_> {
    let units = current.units;
    let value = |text: String| Cell::from(text).style(Style::default().fg(Color::Green));

    let glyph = current.icon.map_or(" ", |icon| icon.glyph());
    let rows = vec![
        Row::new(vec![Cell::from("")]),
        Row::new(vec![
            Cell::from(" City"),
            Cell::from(current.city.clone()).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Row::new(vec![Cell::from(" Day"), value(current.day.clone())]),
        Row::new(vec![
            Cell::from(" Conditions"),
            value(format!("{glyph} {}", current.description)),
        ]),
        Row::new(vec![
            Cell::from(" Temperature"),
            value(format!("{} {}", current.temperature, units.temperature_suffix())),
        ]),
        Row::new(vec![
            Cell::from(" Humidity"),
            value(format!("{} %", current.humidity)),
        ]),
        Row::new(vec![
            Cell::from(" Pressure"),
            value(format!("{} hPa", current.pressure)),
        ]),
        Row::new(vec![
            Cell::from(" Wind"),
            value(format!("{} {}", current.wind, units.speed_suffix())),
        ]),
    ];

    Table::new(rows, [Constraint::Length(13), Constraint::Min(10)])
        .block(panel("Current Conditions"))
}

fn display_forecast(day: &ForecastDay, units: Units) -> Vec<Line<'_>> {
    vec![
        Line::from(""),
        Line::from(vec![
            Span::raw(" "),
            Span::styled(
                day.day.as_str(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw(format!(" {} ", day.glyph)),
            Span::styled(
                format!("{} {}", day.temperature, units.temperature_suffix()),
                Style::default().fg(Color::Green),
            ),
            Span::raw(format!("  {}", day.description)),
        ]),
    ]
}

fn display_suggestions(app: &App) -> (List<'_>, ListState) {
    let items: Vec<ListItem> = match app.suggestions.message() {
        Some(message) => vec![ListItem::new(format!(" {message}"))],
        None => app
            .suggestions
            .cities()
            .iter()
            .map(|city| ListItem::new(format!(" {city}")))
            .collect(),
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .border_type(BorderType::Rounded),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    let state = ListState::default().with_selected(app.suggestions.selected_index());
    (list, state)
}

fn suggestions_area(search: Rect, frame: Rect, rows: usize) -> Rect {
    let wanted = (rows as u16).min(MAX_SUGGESTIONS_SHOWN) + 2;
    let below = frame.bottom().saturating_sub(search.bottom());
    Rect {
        x: search.x,
        y: search.bottom(),
        width: search.width,
        height: wanted.min(below),
    }
}

fn display_status(app: &App) -> Paragraph<'_> {
    let line = if let Some(city) = &app.loading {
        Line::from(Span::styled(
            format!(" Loading {city}..."),
            Style::default().fg(Color::Blue),
        ))
    } else if let Some(status) = &app.status {
        Line::from(Span::styled(
            format!(" {status}"),
            Style::default().fg(Color::Red),
        ))
    } else {
        Line::from(Span::styled(
            " ↑/↓ select  Enter show  Esc close/quit",
            Style::default().fg(Color::DarkGray),
        ))
    };
    Paragraph::new(line)
}

pub fn ui(f: &mut Frame, app: &App) {
    let vert_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    let search = vert_layout[0];
    f.render_widget(display_search(app), search);
    let cursor_x = search.x + 2 + app.input.chars().count() as u16;
    f.set_cursor_position((cursor_x.min(search.right().saturating_sub(2)), search.y + 1));

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(vert_layout[1]);

    match &app.current {
        Some(current) => f.render_widget(display_current_conditions(current), chunks[0]),
        None => f.render_widget(
            Paragraph::new(vec![Line::from(""), Line::from(format!(" {MISSING}"))])
                .block(panel("Current Conditions")),
            chunks[0],
        ),
    }

    let mut list_items = vec![];
    for day in &app.forecast {
        list_items.push(ListItem::new(display_forecast(day, app.units)));
    }
    if list_items.is_empty() {
        list_items.push(ListItem::new(format!("\n {MISSING}")));
    }
    f.render_widget(List::new(list_items).block(panel("Forecast")), chunks[1]);

    f.render_widget(display_status(app), vert_layout[2]);

    if app.suggestions.is_visible() {
        let rows = app.suggestions.cities().len().max(1);
        let area = suggestions_area(search, f.area(), rows);
        let (list, mut state) = display_suggestions(app);
        f.render_widget(Clear, area);
        f.render_stateful_widget(list, area, &mut state);
    }
}
