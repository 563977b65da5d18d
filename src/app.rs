use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, BorderType, Borders, Cell, Chart, Dataset, Gauge, GraphType, LineGauge, List,
        ListItem, Paragraph, Row, Table,
    },
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::aqi::{AqiResult, Tier};
use crate::config::Settings;
use crate::owm::forecast::Entry;
use crate::source::Source;
use crate::weather::{Condition, Mode, Query, SolarPhase, Snapshot, Stats};

const MISSING: &str = "--";
const FETCH_FAILED: &str = "Could not fetch weather data.";
const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Loading,
    Ready,
    Failed(String),
    Notice(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

pub struct App {
    pub settings: Settings,
    settings_path: Option<PathBuf>,
    source: Source,
    seed: Option<u64>,
    pub query: Query,
    pub snapshot: Option<Snapshot>,
    pub status: Status,
    /// City being typed, when search is open.
    pub search: Option<String>,
    refresh_every: Duration,
    last_fetch: Option<Instant>,
}

impl App {
    pub fn new(
        settings: Settings,
        settings_path: Option<PathBuf>,
        seed: Option<u64>,
        query: Query,
        refresh_every: Duration,
    ) -> Self {
        let source = Source::from_settings(&settings, seed);
        Self {
            settings,
            settings_path,
            source,
            seed,
            query,
            snapshot: None,
            status: Status::Loading,
            search: None,
            refresh_every,
            last_fetch: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.source.mode()
    }

    /// Fetch for the current query. A failure keeps the previous snapshot.
    pub fn refresh(&mut self) {
        self.status = Status::Loading;
        self.last_fetch = Some(Instant::now());
        match self.source.fetch(&self.query, self.settings.units) {
            Ok(snapshot) => {
                if let Query::City(_) = self.query {
                    let name = snapshot.forecast.city.name.clone();
                    if self.settings.last_city.as_deref() != Some(name.as_str())
                        && self.mode() == Mode::Live
                    {
                        self.settings.last_city = Some(name);
                        self.persist();
                    }
                }
                self.snapshot = Some(snapshot);
                self.status = Status::Ready;
            }
            Err(err) => {
                error!(query = %self.query, error = %err, "weather fetch failed");
                self.status = Status::Failed(format!("{FETCH_FAILED} {err}"));
            }
        }
    }

    pub fn refresh_due(&self) -> bool {
        self.last_fetch
            .map_or(true, |last| last.elapsed() >= self.refresh_every)
    }

    fn persist(&mut self) {
        let Some(path) = &self.settings_path else {
            return;
        };
        if let Err(err) = self.settings.save(path) {
            warn!(error = %err, "could not save settings");
            self.status = Status::Notice(format!("Settings not saved: {err}"));
        }
    }

    fn rebuild_source(&mut self) {
        self.source = Source::from_settings(&self.settings, self.seed);
    }

    pub fn toggle_units(&mut self) {
        self.settings.units = self.settings.units.toggled();
        self.persist();
        self.refresh();
    }

    pub fn toggle_mode(&mut self) {
        if self.mode() == Mode::Demo && self.settings.api_key().is_none() {
            self.status = Status::Notice(
                "Live data needs an API key (--api-key or SKYCAST_API_KEY)".to_string(),
            );
            return;
        }
        self.settings.demo_mode = self.mode() == Mode::Live;
        info!(demo_mode = self.settings.demo_mode, "switching data source");
        self.rebuild_source();
        self.persist();
        self.refresh();
    }

    pub fn search_city(&mut self, city: &str) {
        let city = city.trim();
        if city.is_empty() {
            return;
        }
        self.query = Query::City(city.to_string());
        self.settings.last_city = Some(city.to_string());
        self.persist();
        self.refresh();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Control {
        if key.kind != KeyEventKind::Press {
            return Control::Continue;
        }

        if let Some(input) = self.search.as_mut() {
            match key.code {
                KeyCode::Enter => {
                    let city = input.clone();
                    self.search = None;
                    self.search_city(&city);
                }
                KeyCode::Esc => self.search = None,
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                _ => {}
            }
            return Control::Continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('u') => self.toggle_units(),
            KeyCode::Char('m') => self.toggle_mode(),
            KeyCode::Char('/') => self.search = Some(String::new()),
            _ => {}
        }
        Control::Continue
    }
}

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        if app.refresh_due() && app.search.is_none() {
            app.status = Status::Loading;
            terminal.draw(|f| ui(f, app))?;
            app.refresh();
        }

        terminal.draw(|f| ui(f, app))?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if app.handle_key(key) == Control::Quit {
                    return Ok(());
                }
            }
        }
    }
}

fn tier_color(tier: Tier) -> Color {
    match tier {
        Tier::Good => Color::Green,
        Tier::Moderate => Color::Yellow,
        Tier::UnhealthyForSensitiveGroups => Color::LightRed,
        Tier::Unhealthy => Color::Red,
        Tier::VeryUnhealthy => Color::Magenta,
        Tier::Hazardous => Color::Rgb(128, 0, 32),
    }
}

fn condition_color(condition: Condition) -> Color {
    match condition {
        Condition::Rain => Color::Blue,
        Condition::Snow => Color::White,
        Condition::Clouds => Color::Gray,
        Condition::Clear => Color::Yellow,
        Condition::Thunder => Color::Magenta,
        Condition::Other => Color::Cyan,
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

fn value_style() -> Style {
    Style::default().fg(Color::Green)
}

fn display_headline<'a>(app: &'a App, snapshot: Option<&'a Snapshot>) -> Paragraph<'a> {
    let location = match snapshot {
        Some(s) => format!("{}, {}", s.forecast.city.name, s.forecast.city.country),
        None => app.query.to_string(),
    };
    let mode_color = match app.mode() {
        Mode::Demo => Color::Magenta,
        Mode::Live => Color::Green,
    };

    let mut first = vec![
        Span::raw(" "),
        Span::styled(
            location,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(format!("[{}]", app.mode()), Style::default().fg(mode_color)),
    ];
    if let Some(s) = snapshot {
        let coord = s.forecast.city.coord;
        first.push(Span::styled(
            format!("  {:.2}, {:.2}", coord.lat, coord.lon),
            Style::default().fg(Color::Blue),
        ));
    }

    let second = match (&app.search, &app.status) {
        (Some(input), _) => Line::from(vec![
            Span::raw(" Search city: "),
            Span::styled(format!("{input}_"), Style::default().fg(Color::White)),
        ]),
        (None, Status::Loading) => Line::from(" Updating forecast..."),
        (None, Status::Failed(msg)) => {
            Line::from(Span::styled(format!(" {msg}"), Style::default().fg(Color::Red)))
        }
        (None, Status::Notice(msg)) => {
            Line::from(Span::styled(format!(" {msg}"), Style::default().fg(Color::Yellow)))
        }
        (None, Status::Ready) => {
            let updated = snapshot
                .and_then(|s| s.local_time(s.fetched_at.timestamp()))
                .map(|dt| dt.format("%d-%m-%Y %H:%M").to_string())
                .unwrap_or_else(|| MISSING.to_string());
            Line::from(format!(
                " Updated {updated}   q quit  r refresh  u units  m mode  / search"
            ))
        }
    };

    Paragraph::new(vec![Line::from(first), second]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .border_type(BorderType::Rounded),
    )
}

fn display_current(snapshot: &Snapshot) -> Paragraph<'_> {
    let symbol = snapshot.units.temperature_symbol();
    let mut lines = vec![Line::from("")];
    match snapshot.current() {
        Some(current) => {
            let (main, description) = current
                .conditions()
                .map(|c| (c.main.as_str(), c.description.as_str()))
                .unwrap_or((MISSING, MISSING));
            let condition = Condition::from_main(main);
            lines.push(Line::from(vec![
                Span::raw(" "),
                Span::styled(
                    format!("{:.0}{symbol}", current.main.temp.round()),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(
                    format!("{} {description}", condition.icon()),
                    Style::default().fg(condition_color(condition)),
                ),
            ]));
            lines.push(Line::from(format!(
                " H {:.0}{symbol}  L {:.0}{symbol}",
                current.main.temp_max.round(),
                current.main.temp_min.round()
            )));
        }
        None => lines.push(Line::from(format!(" {MISSING}"))),
    }
    Paragraph::new(lines).block(panel("Current Conditions"))
}

fn display_trend(snapshot: &Snapshot, area: Rect, f: &mut Frame) {
    let trend = snapshot.trend();
    if trend.is_empty() {
        f.render_widget(Paragraph::new(format!(" {MISSING}")).block(panel("24h Trend")), area);
        return;
    }

    let points: Vec<(f64, f64)> = trend
        .iter()
        .enumerate()
        .map(|(i, (_, temp))| (i as f64, *temp as f64))
        .collect();
    let low = trend.iter().map(|(_, t)| *t).min().unwrap_or(0) as f64 - 1.0;
    let high = trend.iter().map(|(_, t)| *t).max().unwrap_or(0) as f64 + 1.0;
    let last = trend.len().saturating_sub(1);

    let x_labels = vec![
        Span::raw(trend[0].0.clone()),
        Span::raw(trend[last / 2].0.clone()),
        Span::raw(trend[last].0.clone()),
    ];
    let y_labels = vec![Span::raw(format!("{low:.0}")), Span::raw(format!("{high:.0}"))];

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::White))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(panel("24h Trend"))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, last.max(1) as f64])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([low, high])
                .labels(y_labels),
        );
    f.render_widget(chart, area);
}

fn display_stats(snapshot: &Snapshot) -> Table<'_> {
    let symbol = snapshot.units.temperature_symbol();
    let mut rows = vec![Row::new(vec![Cell::from("")])];

    let Some(current) = snapshot.current() else {
        return Table::new(rows, [Constraint::Length(14), Constraint::Min(10)])
            .block(panel("Details"));
    };
    let stats = Stats::from_entry(current);
    let visibility = stats
        .visibility_km
        .map(|km| format!("{km} km"))
        .unwrap_or_else(|| MISSING.to_string());

    let readouts = [
        ("Feels Like", format!("{}{symbol}", stats.feels_like)),
        (
            "Wind",
            format!(
                "{} {} {}",
                stats.wind_direction,
                stats.wind_speed,
                snapshot.units.speed_symbol()
            ),
        ),
        ("Humidity", format!("{}%", stats.humidity)),
        ("UV Index", format!("{} ({})", stats.uv, stats.uv_level)),
        ("Visibility", visibility),
        ("Pressure", format!("{} hPa", stats.pressure)),
    ];
    for (label, value) in readouts {
        rows.push(Row::new(vec![
            Cell::from(format!(" {label}")),
            Cell::from(value).style(value_style()),
        ]));
    }

    Table::new(rows, [Constraint::Length(14), Constraint::Min(10)]).block(panel("Details"))
}

fn display_aqi(aqi: &AqiResult, snapshot: &Snapshot, area: Rect, f: &mut Frame) {
    let block = panel("Air Quality (US EPA)");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let color = tier_color(aqi.tier);
    let mut headline = vec![
        Span::raw(" "),
        Span::styled(
            aqi.index.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(aqi.label, Style::default().fg(color)),
    ];
    if aqi.is_approximate() {
        headline.push(Span::styled(
            "  (approx.)",
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(headline)), chunks[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .ratio((aqi.scale_position_percent / 100.0).clamp(0.0, 1.0))
        .label(format!("{:.0}%", aqi.scale_position_percent));
    f.render_widget(gauge, chunks[1]);

    let Some(sample) = &snapshot.air else {
        return;
    };
    let c = &sample.components;
    let pm2_5 = c
        .pm2_5
        .map(|v| format!("{v:.1}"))
        .unwrap_or_else(|| MISSING.to_string());
    let rows = vec![
        Row::new(vec![
            Cell::from(" PM2.5"),
            Cell::from(pm2_5).style(value_style()),
            Cell::from("PM10"),
            Cell::from(format!("{:.1}", c.pm10)).style(value_style()),
        ]),
        Row::new(vec![
            Cell::from(" NO2"),
            Cell::from(format!("{:.1}", c.no2)).style(value_style()),
            Cell::from("O3"),
            Cell::from(format!("{:.1}", c.o3)).style(value_style()),
        ]),
        Row::new(vec![
            Cell::from(" SO2"),
            Cell::from(format!("{:.1}", c.so2)).style(value_style()),
            Cell::from("CO"),
            Cell::from(format!("{:.0}", c.co)).style(value_style()),
        ]),
    ];
    let widths = [
        Constraint::Length(7),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Length(8),
    ];
    f.render_widget(Table::new(rows, widths), chunks[2]);
}

fn display_solar(snapshot: &Snapshot, area: Rect, f: &mut Frame) {
    let fmt_time = |ts: i64| {
        snapshot
            .local_time(ts)
            .map(|dt| dt.format("%H:%M").to_string())
            .unwrap_or_else(|| MISSING.to_string())
    };
    let sunrise = fmt_time(snapshot.forecast.city.sunrise);
    let sunset = fmt_time(snapshot.forecast.city.sunset);
    let phase = snapshot.solar_phase(Utc::now());

    let (ratio, label) = match phase {
        SolarPhase::Day(progress) => (progress, format!("☀ {:.0}% of daylight", progress * 100.0)),
        other => (0.0, format!("☾ {}", other.label())),
    };

    let block = panel("Solar Cycle");
    let inner = block.inner(area);
    f.render_widget(block, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let gauge = LineGauge::default()
        .filled_style(Style::default().fg(Color::Yellow))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(label);
    f.render_widget(gauge, chunks[0]);
    f.render_widget(
        Paragraph::new(format!(" Sunrise {sunrise}    Sunset {sunset}")),
        chunks[1],
    );
}

fn display_forecast_day<'a>(snapshot: &Snapshot, entry: &'a Entry) -> Line<'a> {
    let day = snapshot
        .local_time(entry.dt)
        .map(|dt| dt.format("%a").to_string())
        .unwrap_or_else(|| MISSING.to_string());
    let (main, description) = entry
        .conditions()
        .map(|c| (c.main.as_str(), c.description.as_str()))
        .unwrap_or((MISSING, MISSING));
    let condition = Condition::from_main(main);
    let symbol = snapshot.units.temperature_symbol();

    Line::from(vec![
        Span::styled(format!(" {day:5}"), Style::default().fg(Color::Yellow)),
        Span::styled(
            format!("{} ", condition.icon()),
            Style::default().fg(condition_color(condition)),
        ),
        Span::styled(
            format!("{:>4.0}{symbol}  ", entry.main.temp.round()),
            value_style(),
        ),
        Span::raw(description),
    ])
}

fn display_forecast(snapshot: &Snapshot) -> List<'_> {
    let days = snapshot.daily();
    let items: Vec<ListItem> = if days.is_empty() {
        vec![ListItem::new(format!(" {MISSING}"))]
    } else {
        days.into_iter()
            .map(|entry| ListItem::new(display_forecast_day(snapshot, entry)))
            .collect()
    };
    let title = format!("{}-Day Forecast", items.len());
    List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                format!(" {title} "),
                Style::default().fg(Color::Yellow),
            ))
            .border_style(Style::default().fg(Color::Cyan))
            .border_type(BorderType::Rounded),
    )
}

fn ui(f: &mut Frame, app: &App) {
    let vert_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(f.area());

    f.render_widget(display_headline(app, app.snapshot.as_ref()), vert_layout[0]);

    let Some(snapshot) = &app.snapshot else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(vert_layout[1]);

    let lchunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(8),
            Constraint::Length(9),
        ])
        .split(chunks[0]);

    f.render_widget(display_current(snapshot), lchunks[0]);
    display_trend(snapshot, lchunks[1], f);
    f.render_widget(display_stats(snapshot), lchunks[2]);

    let rchunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(4),
            Constraint::Min(0),
        ])
        .split(chunks[1]);

    if snapshot.air.is_some() {
        display_aqi(&snapshot.aqi, snapshot, rchunks[0], f);
    } else {
        f.render_widget(
            Paragraph::new(format!(" {MISSING}")).block(panel("Air Quality (US EPA)")),
            rchunks[0],
        );
    }
    display_solar(snapshot, rchunks[1], f);
    f.render_widget(display_forecast(snapshot), rchunks[2]);
}
