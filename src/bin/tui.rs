//! envdash TUI - interactive dashboard for the sensor station
//!
//! Runs the sensor poller in the background and displays:
//! - Latest value per display slot, grouped into pages (tabs)
//! - Per-slot freshness (live / stale / unavailable)
//! - Actual-vs-predicted model charts with accuracy, fetched once at startup
//!
//! Keys: q/Esc quit, Tab/Shift-Tab or 1..9 switch pages, r manual refresh.

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use envdash::infra::Config;
use envdash::io::{PredictionClient, ThingSpeakClient};
use envdash::services::{build_charts, ChartSpec, PageNav, SensorPoller, SlotBoard, SlotStatus};
use parking_lot::RwLock;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Row, Table, Tabs},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// envdash-tui - interactive sensor dashboard
#[derive(Parser, Debug)]
#[command(name = "envdash-tui", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

/// Name of the synthetic page holding the model charts.
const CHARTS_PAGE: &str = "charts";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    let board = Arc::new(RwLock::new(SlotBoard::new(config.fields())));
    let charts: Arc<RwLock<Vec<ChartSpec>>> = Arc::new(RwLock::new(Vec::new()));

    let feed = Arc::new(ThingSpeakClient::new(&config)?);
    let poller = Arc::new(SensorPoller::new(&config, feed, board.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Background polling loop
    let poller_task = poller.clone();
    tokio::spawn(async move {
        poller_task.run(shutdown_rx).await;
    });

    // One-shot chart fetch; replaces the (empty) chart set when it lands
    if config.predictions_enabled() {
        let chart_config = config.clone();
        let chart_state = charts.clone();
        tokio::spawn(async move {
            if let Ok(client) = PredictionClient::new(&chart_config) {
                if let Ok(predictions) = client.fetch().await {
                    *chart_state.write() = build_charts(&chart_config, &predictions);
                }
            }
        });
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut pages = config.pages();
    pages.push(CHARTS_PAGE.to_string());
    let nav = PageNav::new(pages);

    let result = run_ui(&mut terminal, &config, nav, board, charts, poller).await;

    let _ = shutdown_tx.send(true);
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

async fn run_ui(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &Config,
    mut nav: PageNav,
    board: Arc<RwLock<SlotBoard>>,
    charts: Arc<RwLock<Vec<ChartSpec>>>,
    poller: Arc<SensorPoller>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        {
            let board = board.read();
            let charts = charts.read();
            terminal.draw(|f| draw_ui(f, config, &nav, &board, &charts))?;
        }

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                        KeyCode::Tab | KeyCode::Right => nav.next(),
                        KeyCode::BackTab | KeyCode::Left => nav.prev(),
                        KeyCode::Char('r') => {
                            // Manual refresh; the in-flight guard drops it if
                            // a scheduled cycle is already running
                            let poller = poller.clone();
                            tokio::spawn(async move {
                                poller.poll_once().await;
                            });
                        }
                        KeyCode::Char(c @ '1'..='9') => {
                            let idx = (c as usize) - ('1' as usize);
                            nav.select_index(idx);
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
}

fn draw_ui(
    f: &mut Frame,
    config: &Config,
    nav: &PageNav,
    board: &SlotBoard,
    charts: &[ChartSpec],
) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Page content
        ])
        .split(f.area());

    draw_header(f, main_chunks[0], config, board);
    draw_tabs(f, main_chunks[1], nav);

    if nav.active() == CHARTS_PAGE {
        draw_charts_page(f, main_chunks[2], charts);
    } else {
        draw_sensor_page(f, main_chunks[2], nav.active(), board);
    }
}

fn draw_header(f: &mut Frame, area: Rect, config: &Config, board: &SlotBoard) {
    let snapshot = board.snapshot();
    let live = snapshot.iter().filter(|v| v.status == SlotStatus::Live).count();
    let stale = snapshot.iter().filter(|v| v.status == SlotStatus::Stale).count();

    let last_update = board
        .last_update()
        .map(|t| format!("{}s ago", t.elapsed().as_secs()))
        .unwrap_or_else(|| "never".to_string());

    let freshness_color = if stale == 0 && live > 0 {
        Color::Green
    } else if live > 0 {
        Color::Yellow
    } else {
        Color::Red
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled("envdash ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw("| channel "),
        Span::raw(config.channel_id().to_string()),
        Span::raw(" | slots "),
        Span::styled(format!("{}/{} live", live, snapshot.len()), Style::default().fg(freshness_color)),
        Span::raw(" | "),
        Span::styled(format!("{} stale", stale), Style::default().fg(Color::DarkGray)),
        Span::raw(" | Last: "),
        Span::raw(last_update),
        Span::raw(" | Press 'q' to quit, 'r' to refresh"),
    ]))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(header, area);
}

fn draw_tabs(f: &mut Frame, area: Rect, nav: &PageNav) {
    let titles: Vec<String> = nav
        .pages()
        .iter()
        .enumerate()
        .map(|(i, p)| format!("[{}] {}", i + 1, p))
        .collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(" Pages "))
        .select(nav.active_index())
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD));

    f.render_widget(tabs, area);
}

fn draw_sensor_page(f: &mut Frame, area: Rect, page: &str, board: &SlotBoard) {
    let rows: Vec<Row> = board
        .page_snapshot(page)
        .into_iter()
        .map(|view| {
            let (icon, color) = match view.status {
                SlotStatus::Live => ("●", Color::Green),
                SlotStatus::Stale => ("○", Color::Yellow),
                SlotStatus::Unavailable => ("·", Color::DarkGray),
            };

            let sampled = view
                .sampled_at
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());

            Row::new(vec![
                icon.to_string(),
                view.label.clone(),
                view.slot.clone(),
                view.display_value(),
                view.status.as_str().to_string(),
                sampled,
            ])
            .style(Style::default().fg(color))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),  // Status icon
            Constraint::Length(24), // Label
            Constraint::Length(14), // Slot
            Constraint::Length(14), // Value
            Constraint::Length(12), // Status
            Constraint::Length(10), // Sampled at
        ],
    )
    .header(
        Row::new(vec!["", "Sensor", "Slot", "Value", "Status", "Sampled"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .title(format!(" {} ", page))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );

    f.render_widget(table, area);
}

fn draw_charts_page(f: &mut Frame, area: Rect, charts: &[ChartSpec]) {
    if charts.is_empty() {
        let placeholder = Paragraph::new("Waiting for prediction data...")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Model Charts "));
        f.render_widget(placeholder, area);
        return;
    }

    let constraints: Vec<Constraint> =
        charts.iter().map(|_| Constraint::Ratio(1, charts.len() as u32)).collect();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (chart, chunk) in charts.iter().zip(chunks.iter()) {
        draw_prediction_chart(f, *chunk, chart);
    }
}

fn draw_prediction_chart(f: &mut Frame, area: Rect, spec: &ChartSpec) {
    let (x_min, x_max, y_min, y_max) = spec.bounds(0.05);

    let datasets = vec![
        Dataset::default()
            .name("Actual")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&spec.actual),
        Dataset::default()
            .name("Predicted")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Yellow))
            .data(&spec.predicted),
    ];

    // First / middle / last of the shared label sequence
    let x_labels: Vec<Span> = if spec.labels.is_empty() {
        vec![Span::raw("")]
    } else {
        let mid = spec.labels.len() / 2;
        let last = spec.labels.len() - 1;
        vec![
            Span::raw(spec.labels[0].clone()),
            Span::raw(spec.labels[mid].clone()),
            Span::raw(spec.labels[last].clone()),
        ]
    };

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(format!(" {} ", spec.title))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta)),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([x_min, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.1}", y_min)),
                    Span::raw(format!("{:.1}", (y_min + y_max) / 2.0)),
                    Span::raw(format!("{:.1}", y_max)),
                ]),
        );

    f.render_widget(chart, area);
}
