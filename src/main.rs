mod app;
mod event;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};
use rust_i18n::t;

use kanadrill::audio::{CuePlayer, Silent, TerminalBell};
use kanadrill::catalog::{Family, FamilySelection};
use kanadrill::config::Config;
use kanadrill::session::{TimerDuration, View};
use kanadrill::store::export::{export_data, import_data, read_export, write_export};
use kanadrill::store::{FileStore, KeyValueStore, MemoryStore, StatsStore};

use app::App;
use event::{AppEvent, EventHandler};
use ui::components::controls::{Controls, timer_label};
use ui::components::progress_bar::TimerBar;
use ui::components::question_card::QuestionCard;
use ui::components::scoreboard::Scoreboard;
use ui::components::stats_grid::StatsGrid;
use ui::layout::{PracticeLayout, centered_column, centered_rect};
use ui::theme::Theme;

rust_i18n::i18n!("locales", fallback = "en");

const MAX_CONTENT_WIDTH: u16 = 72;
const MAX_STATS_WIDTH: u16 = 110;

#[derive(Parser)]
#[command(name = "kanadrill", version, about = "Terminal kana flashcard trainer")]
struct Cli {
    #[arg(long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "Seconds per question (3, 5, 10 or unlimited)")]
    timer: Option<TimerDuration>,

    #[arg(
        long,
        value_delimiter = ',',
        value_parser = parse_family,
        help = "Kana families to practice (hiragana,katakana)"
    )]
    families: Vec<Family>,

    #[arg(long, help = "Disable the answer bell")]
    mute: bool,

    #[arg(long, value_parser = ["en", "vi"], help = "Interface language")]
    lang: Option<String>,

    #[arg(long, value_name = "PATH", help = "Write all statistics to a JSON file and exit")]
    export: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PATH",
        conflicts_with = "export",
        help = "Replace statistics from a JSON export and exit"
    )]
    import: Option<PathBuf>,
}

fn parse_family(value: &str) -> Result<Family, String> {
    Family::from_key(value).ok_or_else(|| format!("unknown kana family '{value}'"))
}

fn log_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("kanadrill").join("kanadrill.log"))
}

/// The terminal belongs to the UI, so log records go to a file. Without a
/// writable log file logging stays off.
fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    let file = log_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });
    match file {
        Some(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    let _ = builder.try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    // An unreadable file is left untouched on quit.
    let (mut config, config_path) = match Config::load() {
        Ok(config) => (config, Some(Config::path())),
        Err(e) => {
            log::warn!("Ignoring unreadable config: {e:#}");
            (Config::default(), None)
        }
    };
    if let Some(timer) = cli.timer {
        config.timer_seconds = timer;
    }
    if let Some(selection) = FamilySelection::from_families(cli.families.iter().copied()) {
        config.set_family_selection(&selection);
    }
    let locale = cli.lang.as_deref().unwrap_or(&config.locale);
    rust_i18n::set_locale(locale);

    if let Some(path) = cli.export {
        return run_export(&path, &config);
    }
    if let Some(path) = cli.import {
        return run_import(&path);
    }

    let theme_name = cli.theme.as_deref().unwrap_or(&config.theme);
    let theme = Theme::load(theme_name).unwrap_or_else(|| {
        log::warn!(
            "Unknown theme '{theme_name}', available: {}",
            Theme::available_themes().join(", ")
        );
        Theme::default()
    });
    log::debug!("Using theme {}", theme.name);
    let theme: &'static Theme = Box::leak(Box::new(theme));

    let store: Box<dyn KeyValueStore> = match FileStore::new() {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::error!("Stats will not be saved this session: {e:#}");
            Box::new(MemoryStore::new())
        }
    };
    let audio: Box<dyn CuePlayer> = if config.sound && !cli.mute {
        Box::new(TerminalBell)
    } else {
        Box::new(Silent)
    };

    let tick_rate = config.tick_rate();
    let mut app = App::new(config, store, audio, theme)?;
    app.config_path = config_path;
    log::info!(
        "Session started with {} characters",
        app.session.engine().pool().len()
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(tick_rate);

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.save_preferences();

    if let Err(err) = result {
        log::error!("Exited with error: {err:#}");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_export(path: &Path, config: &Config) -> Result<()> {
    let stats = StatsStore::new(FileStore::new().context("Cannot open stats directory")?);
    let data = export_data(&stats, config);
    write_export(path, &data)?;
    println!(
        "Exported {} characters to {}",
        data.stats.len(),
        path.display()
    );
    Ok(())
}

fn run_import(path: &Path) -> Result<()> {
    let data = read_export(path)?;
    let mut stats = StatsStore::new(FileStore::new().context("Cannot open stats directory")?);
    import_data(&mut stats, &data)?;
    println!(
        "Imported {} characters from {}",
        data.stats.len(),
        path.display()
    );
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    // Confirmation dialog takes priority
    if app.confirm_reset {
        match key.code {
            KeyCode::Char('y') => app.resolve_reset(true),
            KeyCode::Char('n') | KeyCode::Esc => app.resolve_reset(false),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Tab | KeyCode::BackTab => app.switch_view(),
        _ => match app.session.view() {
            View::Practice => handle_practice_key(app, key),
            View::Stats => {
                if key.code == KeyCode::Char('x') {
                    app.request_reset();
                }
            }
        },
    }
}

fn handle_practice_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char(ch @ '1'..='4') => app.answer(ch as usize - '1' as usize),
        KeyCode::Char('h') => app.toggle_family(Family::Hiragana),
        KeyCode::Char('k') => app.toggle_family(Family::Katakana),
        KeyCode::Char('t') => app.cycle_timer(true),
        KeyCode::Char('T') => app.cycle_timer(false),
        KeyCode::Char('r') => app.restart(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()).fg(colors.fg()));
    frame.render_widget(bg, area);

    match app.session.view() {
        View::Practice => render_practice(frame, app),
        View::Stats => render_stats(frame, app),
    }

    if app.confirm_reset {
        render_confirm_reset(frame, app);
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect) {
    let colors = &app.theme.colors;
    let mut spans = vec![Span::styled(
        format!(" {} ", t!("app.title")),
        Style::default()
            .fg(colors.header_fg())
            .bg(colors.header_bg())
            .add_modifier(Modifier::BOLD),
    )];
    for (view, label) in [
        (View::Practice, t!("nav.practice")),
        (View::Stats, t!("nav.stats")),
    ] {
        let style = if app.session.view() == view {
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.accent())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.dim()).bg(colors.header_bg())
        };
        spans.push(Span::styled(format!(" {label} "), style));
    }
    let subtitle = match app.session.view() {
        View::Practice => t!("app.subtitle"),
        View::Stats => t!("stats.subtitle"),
    };
    spans.push(Span::styled(
        format!("  {subtitle}"),
        Style::default().fg(colors.dim()).bg(colors.header_bg()),
    ));

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, area: ratatui::layout::Rect, hints: &str) {
    let colors = &app.theme.colors;
    let line = match &app.notice {
        Some(notice) => Line::from(Span::styled(
            format!(" {} ", notice.text),
            Style::default().fg(colors.warning()),
        )),
        None => Line::from(Span::styled(hints.to_string(), Style::default().fg(colors.dim()))),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_practice(frame: &mut ratatui::Frame, app: &App) {
    let area = centered_column(MAX_CONTENT_WIDTH, frame.area());
    let session = &app.session;
    let show_timer = !session.timer_duration().is_unlimited();
    let layout = PracticeLayout::new(area, show_timer);

    render_header(frame, app, layout.header);
    frame.render_widget(Scoreboard::new(session.score(), app.theme), layout.scoreboard);
    frame.render_widget(
        Controls::new(session.families(), session.timer_duration(), app.theme),
        layout.controls,
    );
    frame.render_widget(
        QuestionCard::new(session.question(), session.feedback(), app.theme),
        layout.card,
    );

    if let Some(timer_area) = layout.timer {
        let label = if session.timer().is_running() {
            let secs = format!("{:.1}", session.timer().remaining().as_secs_f64());
            t!("timer.remaining", s = secs).to_string()
        } else {
            timer_label(session.timer_duration())
        };
        frame.render_widget(TimerBar::new(label, session.progress(), app.theme), timer_area);
    }

    render_footer(frame, app, layout.footer, &t!("footer.practice"));
}

fn render_stats(frame: &mut ratatui::Frame, app: &App) {
    let area = centered_column(MAX_STATS_WIDTH, frame.area());
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(frame, app, layout[0]);
    frame.render_widget(
        StatsGrid::new(
            app.session.engine().catalog(),
            app.session.stats(),
            app.theme,
        ),
        layout[1],
    );
    render_footer(frame, app, layout[2], &t!("footer.stats"));
}

fn render_confirm_reset(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let popup = centered_rect(50, 25, frame.area());
    frame.render_widget(Clear, popup);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            t!("stats.confirm_reset").to_string(),
            Style::default().fg(colors.fg()),
        )),
        Line::from(""),
        Line::from(Span::styled(
            t!("footer.confirm").to_string(),
            Style::default().fg(colors.dim()),
        )),
    ];
    let dialog = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .alignment(ratatui::layout::Alignment::Center)
        .block(
            Block::bordered()
                .border_style(Style::default().fg(colors.incorrect()))
                .style(Style::default().bg(colors.bg())),
        );
    frame.render_widget(dialog, popup);
}
