use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use rust_i18n::t;

use kanadrill::audio::CuePlayer;
use kanadrill::catalog::{Catalog, Family};
use kanadrill::config::Config;
use kanadrill::engine::QuestionEngine;
use kanadrill::session::{SessionController, SessionEvent, View};
use kanadrill::store::{KeyValueStore, StatsStore};

use crate::ui::theme::Theme;

const NOTICE_TTL: Duration = Duration::from_secs(3);

pub type Session = SessionController<Box<dyn KeyValueStore>, Box<dyn CuePlayer>>;

pub struct Notice {
    pub text: String,
    shown_at: Instant,
}

pub struct App {
    pub session: Session,
    pub config: Config,
    pub theme: &'static Theme,
    pub confirm_reset: bool,
    pub should_quit: bool,
    pub notice: Option<Notice>,
    /// Where preferences are written on quit; `None` leaves the file alone.
    pub config_path: Option<PathBuf>,
    last_tick: Instant,
}

impl App {
    pub fn new(
        config: Config,
        store: Box<dyn KeyValueStore>,
        audio: Box<dyn CuePlayer>,
        theme: &'static Theme,
    ) -> Result<Self> {
        let catalog = Catalog::load()?;
        let engine = QuestionEngine::new(catalog);
        let session = SessionController::new(
            engine,
            StatsStore::new(store),
            audio,
            config.session_settings(),
        );
        Ok(Self {
            session,
            config,
            theme,
            confirm_reset: false,
            should_quit: false,
            notice: None,
            config_path: None,
            last_tick: Instant::now(),
        })
    }

    /// Feed wall-clock time since the previous tick to the session.
    pub fn on_tick(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick);
        self.last_tick = now;

        match self.session.tick(elapsed) {
            Some(SessionEvent::TimedOut) => log::debug!("Question timed out"),
            Some(SessionEvent::Advanced) | None => {}
        }

        if self
            .notice
            .as_ref()
            .is_some_and(|n| n.shown_at.elapsed() >= NOTICE_TTL)
        {
            self.notice = None;
        }
    }

    fn show_notice(&mut self, text: String) {
        self.notice = Some(Notice {
            text,
            shown_at: Instant::now(),
        });
    }

    pub fn answer(&mut self, index: usize) {
        self.session.submit_choice(index);
    }

    pub fn toggle_family(&mut self, family: Family) {
        if !self.session.toggle_family(family) {
            self.show_notice(t!("notice.last_family").to_string());
        }
    }

    pub fn cycle_timer(&mut self, forward: bool) {
        let current = self.session.timer_duration();
        let next = if forward { current.next() } else { current.prev() };
        self.session.set_timer_duration(next);
    }

    pub fn restart(&mut self) {
        self.session.reset_score_and_queue();
        self.show_notice(t!("notice.restarted").to_string());
    }

    pub fn switch_view(&mut self) {
        let next = match self.session.view() {
            View::Practice => View::Stats,
            View::Stats => View::Practice,
        };
        self.confirm_reset = false;
        self.session.set_view(next);
    }

    pub fn request_reset(&mut self) {
        self.confirm_reset = true;
    }

    pub fn resolve_reset(&mut self, confirmed: bool) {
        self.confirm_reset = false;
        if confirmed {
            self.session.reset_all_stats();
            self.show_notice(t!("notice.stats_cleared").to_string());
        }
    }

    /// Copy the session's family and timer choices into the config.
    pub fn sync_config(&mut self) {
        self.config.set_family_selection(self.session.families());
        self.config.timer_seconds = self.session.timer_duration();
    }

    pub fn save_preferences(&mut self) {
        let Some(path) = self.config_path.clone() else {
            log::info!("Not saving preferences");
            return;
        };
        self.sync_config();
        if let Err(e) = self.config.save_to(&path) {
            log::error!("Failed to save config: {e:#}");
        }
    }
}
