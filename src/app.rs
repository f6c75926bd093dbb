//! Main application structure and event loop

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::loader::{DataEvent, Loader};
use crate::store::Database;
use crate::themes::Theme;
use crate::ui::animation::{apply_alpha, FadeState};
use crate::ui::{HelpOverlay, MonitorStatus, Sidebar, StatusBar};
use crate::views::{
    OverviewView, ProcurementsView, StatisticsView, View, ViewAction, ViewTrait,
};

const TICK: Duration = Duration::from_millis(100);

/// Main application state
pub struct App {
    /// Current view
    current_view: View,
    /// View instances
    overview_view: OverviewView,
    procurements_view: ProcurementsView,
    statistics_view: StatisticsView,
    /// Should exit?
    should_quit: bool,
    theme: Theme,
    municipality: String,
    refresh_interval: Duration,
    /// Last (re)load of the current view
    last_refresh: Instant,
    loader: Loader,
    events: UnboundedReceiver<DataEvent>,
    monitor_status: MonitorStatus,
    help_overlay: HelpOverlay,
    /// Auto-hide sidebar
    sidebar: Sidebar,
    /// View transition fade animation
    view_fade: Option<FadeState>,
}

impl App {
    /// Create new app instance and start loading the first page.
    /// Must be called inside a tokio runtime.
    pub fn new(settings: Settings) -> Result<Self> {
        info!("Initializing PNCP dashboard for {}", settings.municipality);

        let theme = Theme::load(&settings.theme);
        let db = Database::open(&settings.database_path)
            .with_context(|| format!("opening database {}", settings.database_path.display()))?;
        let (loader, events) = Loader::new(db, settings.clone());

        let mut sidebar = Sidebar::with_default_items(settings.municipality.clone());
        sidebar.set_active(View::Overview.id());

        let mut app = Self {
            current_view: View::Overview,
            overview_view: OverviewView::new(theme.clone(), settings.recent_window_days),
            procurements_view: ProcurementsView::new(theme.clone()),
            statistics_view: StatisticsView::new(theme.clone()),
            should_quit: false,
            theme,
            municipality: settings.municipality.clone(),
            refresh_interval: settings.refresh_interval(),
            last_refresh: Instant::now(),
            loader,
            events,
            monitor_status: MonitorStatus::Idle,
            help_overlay: HelpOverlay::new(),
            sidebar,
            view_fade: Some(FadeState::fade_in(200)), // Initial fade-in
        };
        app.reload(true);
        Ok(app)
    }

    /// Switch to a new view with fade-in animation
    fn switch_view(&mut self, view: View) {
        if self.current_view == view {
            return;
        }
        debug!("Switched to view: {:?}", view);
        self.current_view = view;
        self.sidebar.set_active(view.id());
        self.view_fade = Some(FadeState::fade_in(150));

        // First visit shows the skeleton; later visits refresh in place
        let first_visit = !self.current_started();
        self.reload(first_visit);
    }

    fn current_started(&self) -> bool {
        match self.current_view {
            View::Overview => self.overview_view.data.started(),
            View::Procurements => self.procurements_view.started(),
            View::Statistics => self.statistics_view.data.started(),
        }
    }

    /// Request fresh data for the current view
    fn reload(&mut self, show_skeleton: bool) {
        match self.current_view {
            View::Overview => {
                let ticket = self.overview_view.data.begin(show_skeleton);
                self.loader.load_overview(ticket);
            }
            View::Procurements => {
                let ticket = self.procurements_view.begin(show_skeleton);
                self.loader.load_procurements(ticket, self.procurements_view.query());
            }
            View::Statistics => {
                let ticket = self.statistics_view.data.begin(show_skeleton);
                self.loader.load_statistics(ticket);
            }
        }
        self.last_refresh = Instant::now();
    }

    fn start_monitor(&mut self) {
        if self.monitor_status.is_running() {
            info!("Monitoring run already in progress");
            return;
        }
        info!("Monitoring run requested from the dashboard");
        self.monitor_status = MonitorStatus::Running;
        self.loader.spawn_monitor();
    }

    /// Apply one result from the loader
    fn handle_event(&mut self, event: DataEvent) {
        match event {
            DataEvent::Overview { ticket, result } => {
                if let Err(e) = &result {
                    warn!("Overview load failed: {}", e);
                }
                self.overview_view.data.finish(ticket, result);
            }
            DataEvent::Procurements { ticket, result } => {
                if let Err(e) = &result {
                    warn!("Listing load failed: {}", e);
                }
                self.procurements_view.apply(ticket, result);
            }
            DataEvent::Statistics { ticket, result } => {
                if let Err(e) = &result {
                    warn!("Statistics load failed: {}", e);
                }
                self.statistics_view.data.finish(ticket, result);
            }
            DataEvent::MonitorFinished(result) => {
                self.monitor_status = match result {
                    Ok(report) => MonitorStatus::Finished {
                        inserted: report.inserted,
                        at: report.executed_at,
                    },
                    Err(e) => MonitorStatus::Failed(e),
                };
                self.sidebar.set_monitor_status(self.monitor_status.clone());
                // The run log changed either way
                self.reload(false);
            }
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
    }

    /// Render fade overlay for view transitions
    fn render_fade_overlay(&self, area: Rect, buf: &mut Buffer) {
        let Some(fade) = &self.view_fade else {
            return;
        };
        if fade.is_done() {
            return;
        }
        // 1.0 = fully dark, 0.0 = transparent
        let overlay_alpha = 1.0 - fade.alpha();
        if overlay_alpha <= 0.01 {
            return;
        }
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.fg = apply_alpha(cell.fg, 1.0 - overlay_alpha * 0.7);
                    cell.bg = apply_alpha(cell.bg, 1.0 - overlay_alpha * 0.5);
                }
            }
        }
    }

    fn draw(&mut self, f: &mut Frame) {
        let area = f.area();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);
        let (main, status) = (rows[0], rows[1]);

        self.sidebar.render(main, f.buffer_mut(), &self.theme);
        let content_area = self.sidebar.content_area(main);

        let render_result = match self.current_view {
            View::Overview => ViewTrait::render(&mut self.overview_view, f, content_area),
            View::Procurements => ViewTrait::render(&mut self.procurements_view, f, content_area),
            View::Statistics => ViewTrait::render(&mut self.statistics_view, f, content_area),
        };
        if let Err(e) = render_result {
            warn!("View render error: {}", e);
        }

        self.render_fade_overlay(content_area, f.buffer_mut());

        f.render_widget(
            StatusBar::new(&self.theme, &self.municipality, &self.monitor_status)
                .metric("Página", self.current_view.title()),
            status,
        );

        // Overlays use the full area so they cover the sidebar too
        self.help_overlay.render(area, f.buffer_mut(), &self.theme);
    }

    /// Run the main event loop
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

        loop {
            self.drain_events();

            // Cleanup completed view fade animation
            if self.view_fade.as_ref().is_some_and(FadeState::is_done) {
                self.view_fade = None;
            }

            // Update sidebar hide delay
            self.sidebar.update();

            if self.last_refresh.elapsed() >= self.refresh_interval {
                debug!("Periodic refresh of {:?}", self.current_view);
                self.reload(false);
            }

            terminal.draw(|f| self.draw(f))?;

            if event::poll(TICK)? {
                match event::read()? {
                    Event::Key(key) => {
                        if key.kind == KeyEventKind::Press && self.handle_key(key.code, key.modifiers)? {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => {
                        // Handle mouse movement for sidebar auto-show/hide
                        if let crossterm::event::MouseEventKind::Moved = mouse.kind {
                            self.sidebar.handle_mouse(mouse.column, mouse.row);
                        }
                    }
                    _ => {}
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Returns true when the app should quit
    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
        if modifiers.contains(KeyModifiers::CONTROL) && key == KeyCode::Char('c') {
            return Ok(true);
        }

        // Any key closes the help overlay
        if self.help_overlay.visible {
            self.help_overlay.hide();
            return Ok(false);
        }

        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                return Ok(true);
            }
            KeyCode::Char('?') => self.help_overlay.show(),
            KeyCode::Tab => self.switch_view(self.current_view.next()),
            KeyCode::Char('r') => self.reload(true),
            KeyCode::Char('m') => {
                self.start_monitor();
                self.sidebar.set_monitor_status(self.monitor_status.clone());
            }
            KeyCode::Char('[') => self.sidebar.toggle(),
            KeyCode::Char(']') => self.sidebar.toggle_pin(),
            KeyCode::Char(c) if View::from_shortcut(c).is_some() => {
                if let Some(view) = View::from_shortcut(c) {
                    self.switch_view(view);
                }
            }
            _ => {
                let action = match self.current_view {
                    View::Overview => self.overview_view.handle_key(key)?,
                    View::Procurements => self.procurements_view.handle_key(key)?,
                    View::Statistics => self.statistics_view.handle_key(key)?,
                };
                if action == ViewAction::Reload {
                    self.reload(false);
                }
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Modality;
    use crate::store::tests::new_record;
    use crate::views::LoadState;
    use ratatui::backend::TestBackend;

    fn settings(dir: &tempfile::TempDir) -> Settings {
        let path = dir.path().join("pncp.db");
        let mut db = Database::open(&path).unwrap();
        db.save_all(&[
            new_record(17, Modality::PregaoEletronico, 7_631_669.79, "2025-05-12T08:16:48"),
            new_record(18, Modality::DispensaDeLicitacao, 720_591.72, "2025-05-14T07:05:04"),
        ])
        .unwrap();
        Settings {
            database_path: path,
            ..Settings::default()
        }
    }

    async fn settle(app: &mut App) {
        let event = app.events.recv().await.unwrap();
        app.handle_event(event);
    }

    fn screen(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        let buf = terminal.backend().buffer().clone();
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_overview_loads_on_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(settings(&dir)).unwrap();
        assert_eq!(app.overview_view.data.state(), &LoadState::Loading);

        settle(&mut app).await;
        match app.overview_view.data.state() {
            LoadState::Ready(data) => assert_eq!(data.statistics.total, 2),
            other => panic!("unexpected state: {:?}", other),
        }
        let out = screen(&mut app);
        assert!(out.contains("Total de Contratações"));
        assert!(out.contains("Monitor ocioso"));
    }

    #[tokio::test]
    async fn test_shortcuts_switch_and_load_pages() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(settings(&dir)).unwrap();
        settle(&mut app).await;

        assert!(!app.handle_key(KeyCode::Char('2'), KeyModifiers::NONE).unwrap());
        assert_eq!(app.current_view, View::Procurements);
        assert_eq!(app.sidebar.active_id(), Some("procurements"));
        settle(&mut app).await;
        assert!(screen(&mut app).contains("2 registro(s)"));

        app.handle_key(KeyCode::Tab, KeyModifiers::NONE).unwrap();
        assert_eq!(app.current_view, View::Statistics);
        settle(&mut app).await;
        assert!(matches!(app.statistics_view.data.state(), LoadState::Ready(_)));
    }

    #[tokio::test]
    async fn test_escape_closes_help_before_quitting() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(settings(&dir)).unwrap();

        app.handle_key(KeyCode::Char('?'), KeyModifiers::NONE).unwrap();
        assert!(app.help_overlay.visible);
        assert!(!app.handle_key(KeyCode::Esc, KeyModifiers::NONE).unwrap());
        assert!(!app.help_overlay.visible);
        assert!(app.handle_key(KeyCode::Esc, KeyModifiers::NONE).unwrap());
    }

    #[tokio::test]
    async fn test_monitor_result_updates_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(settings(&dir)).unwrap();
        settle(&mut app).await;

        app.handle_event(DataEvent::MonitorFinished(Err("timeout".to_string())));
        assert_eq!(app.monitor_status, MonitorStatus::Failed("timeout".to_string()));
        assert!(screen(&mut app).contains("Falha no monitoramento"));
    }
}
