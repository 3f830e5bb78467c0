use std::mem;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::debug;

use crate::auth::{AuthContext, AuthError};
use crate::db::{BandService, MoveDirection, RepertoireService};
use crate::live::{LiveSettings, SessionController};
use crate::models::{Band, BandMember, Repertoire, Song};

use super::forms::{BandForm, MemberForm, RepertoireForm, SongForm};
use super::helpers::{centered_rect, key_hints, surface_error};
use super::live_view;
use super::screens::{AuthScreen, AuthTab, BandScreen, DashboardScreen, RepertoireScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Longest the event loop sleeps when no tick is pending.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Display settings the UI needs from configuration.
#[derive(Debug, Clone, Copy)]
pub struct UiSettings {
    pub live: LiveSettings,
    pub units_per_line: u32,
    pub refresh_metrics_on_resize: bool,
    pub min_password_len: usize,
}

enum Screen {
    Auth(AuthScreen),
    Dashboard(DashboardScreen),
    Repertoire(RepertoireScreen),
    /// Performing; the song list screen is kept to return to.
    Live(RepertoireScreen),
    Band(BandScreen),
}

/// Modal overlays scoped to the current screen.
enum Mode {
    Normal,
    AddingRepertoire(RepertoireForm),
    EditingRepertoire { id: i64, form: RepertoireForm },
    ConfirmRepertoireDelete(Repertoire),
    AddingSong(SongForm),
    EditingSong { id: i64, form: SongForm },
    ConfirmSongDelete(Song),
    EditingBand(BandForm),
    AddingMember(MemberForm),
    ConfirmMemberRemove(BandMember),
    ConfirmBandDelete(Band),
}

struct StatusMessage {
    text: String,
    kind: StatusKind,
}

enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    repertoires: Box<dyn RepertoireService>,
    bands: Box<dyn BandService>,
    auth: AuthContext,
    live: SessionController,
    settings: UiSettings,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    last_area: Option<Rect>,
}

impl App {
    pub fn new(
        repertoires: Box<dyn RepertoireService>,
        bands: Box<dyn BandService>,
        auth: AuthContext,
        settings: UiSettings,
    ) -> Self {
        let mut app = Self {
            repertoires,
            bands,
            auth,
            live: SessionController::new(settings.live),
            settings,
            screen: Screen::Auth(AuthScreen::default()),
            mode: Mode::Normal,
            status: None,
            last_area: None,
        };
        if app.auth.session().is_some() {
            app.screen = app.dashboard_or_auth();
        }
        app
    }

    /// Handle one key press. Returns `true` when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.live.exit_session();
            return true;
        }

        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(key, &mut exit),
            Mode::AddingRepertoire(form) => self.handle_repertoire_form(key, None, form),
            Mode::EditingRepertoire { id, form } => {
                self.handle_repertoire_form(key, Some(id), form)
            }
            Mode::ConfirmRepertoireDelete(repertoire) => {
                self.handle_confirm_repertoire_delete(key.code, repertoire)
            }
            Mode::AddingSong(form) => self.handle_song_form(key, None, form),
            Mode::EditingSong { id, form } => self.handle_song_form(key, Some(id), form),
            Mode::ConfirmSongDelete(song) => self.handle_confirm_song_delete(key.code, song),
            Mode::EditingBand(form) => self.handle_band_form(key.code, form),
            Mode::AddingMember(form) => self.handle_member_form(key.code, form),
            Mode::ConfirmMemberRemove(member) => {
                self.handle_confirm_member_remove(key.code, member)
            }
            Mode::ConfirmBandDelete(band) => self.handle_confirm_band_delete(key.code, band),
        };
        exit
    }

    /// Advance time: fire due auto-scroll ticks and pick up pushed changes.
    pub fn tick(&mut self, now: Instant) {
        self.live.poll(now);

        if self.auth.refresh() {
            self.session_changed();
        }
        if let Err(err) = self.sync_screen() {
            self.set_status(surface_error(&err), StatusKind::Error);
        }
    }

    /// How long the event loop may wait for input before calling [`App::tick`].
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        self.live
            .time_until_next_tick(now)
            .map_or(IDLE_POLL, |until| until.min(IDLE_POLL))
    }

    /// Supply content metrics to the live session before a frame is drawn.
    /// Measurement happens after every song change, and on resize when
    /// configured.
    pub fn sync_layout(&mut self, area: Rect) {
        let resized = self.last_area.is_some_and(|last| last != area);
        self.last_area = Some(area);
        if !matches!(self.screen, Screen::Live(_)) {
            return;
        }
        if !self.live.needs_metrics() && !(resized && self.settings.refresh_metrics_on_resize) {
            return;
        }
        let (content, _) = split_footer(area);
        let metrics = self.live.session().and_then(|session| {
            live_view::measure(session, content, self.settings.units_per_line)
        });
        if let Some(metrics) = metrics {
            debug!(?metrics, "live content measured");
            self.live.set_content_metrics(metrics);
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent, exit: &mut bool) -> Mode {
        let screen = mem::replace(&mut self.screen, Screen::Auth(AuthScreen::default()));
        let (screen, mode) = match screen {
            Screen::Auth(auth) => (self.handle_auth_key(key, auth, exit), Mode::Normal),
            Screen::Dashboard(dashboard) => self.handle_dashboard_key(key.code, dashboard, exit),
            Screen::Repertoire(songs) => self.handle_repertoire_key(key.code, songs, exit),
            Screen::Live(songs) => (self.handle_live_key(key, songs), Mode::Normal),
            Screen::Band(band) => self.handle_band_key(key.code, band, exit),
        };
        self.screen = screen;
        mode
    }

    fn handle_auth_key(&mut self, key: KeyEvent, mut auth: AuthScreen, exit: &mut bool) -> Screen {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('n') {
            auth.switch_tab();
            self.clear_status();
            return Screen::Auth(auth);
        }

        match (auth.tab, key.code) {
            (_, KeyCode::Esc) => *exit = true,
            (AuthTab::SignIn, KeyCode::Tab | KeyCode::BackTab) => auth.login.toggle_field(),
            (AuthTab::SignIn, KeyCode::Backspace) => auth.login.backspace(),
            (AuthTab::SignIn, KeyCode::Char(ch)) => {
                if auth.login.push_char(ch) {
                    auth.login.error = None;
                }
            }
            (AuthTab::SignIn, KeyCode::Enter) => return self.submit_login(auth),
            (AuthTab::Register, KeyCode::Tab) => auth.register.next_field(),
            (AuthTab::Register, KeyCode::BackTab) => auth.register.previous_field(),
            (AuthTab::Register, KeyCode::Backspace) => auth.register.backspace(),
            (AuthTab::Register, KeyCode::Char(ch)) => {
                if auth.register.push_char(ch) {
                    auth.register.error = None;
                }
            }
            (AuthTab::Register, KeyCode::Enter) => return self.submit_registration(auth),
            _ => {}
        }
        Screen::Auth(auth)
    }

    fn submit_login(&mut self, mut auth: AuthScreen) -> Screen {
        let (email, password) = match auth.login.validate() {
            Ok(values) => values,
            Err(err) => {
                auth.login.error = Some(err.to_string());
                return Screen::Auth(auth);
            }
        };
        match self.auth.login(&email, &password) {
            Ok(()) => {
                self.clear_status();
                self.dashboard_or_auth()
            }
            Err(err) => {
                auth.login.error = Some(err.user_message().to_string());
                auth.login.password.clear();
                Screen::Auth(auth)
            }
        }
    }

    fn submit_registration(&mut self, mut auth: AuthScreen) -> Screen {
        let registration = match auth.register.validate(self.settings.min_password_len) {
            Ok(registration) => registration,
            Err(err) => {
                auth.register.error = Some(err.to_string());
                return Screen::Auth(auth);
            }
        };
        match self.auth.register(
            &registration.email,
            &registration.password,
            &registration.display_name,
        ) {
            Ok(()) => {
                self.set_status("Account created.", StatusKind::Info);
                self.dashboard_or_auth()
            }
            Err(AuthError::EmailUnconfirmed) => {
                let mut auth = AuthScreen::default();
                auth.login.email = registration.email;
                self.set_status(
                    "Account created. Confirm your email, then sign in.",
                    StatusKind::Info,
                );
                Screen::Auth(auth)
            }
            Err(err) => {
                auth.register.error = Some(err.user_message().to_string());
                Screen::Auth(auth)
            }
        }
    }

    fn handle_dashboard_key(
        &mut self,
        code: KeyCode,
        mut dashboard: DashboardScreen,
        exit: &mut bool,
    ) -> (Screen, Mode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => dashboard.move_selection(-1),
            KeyCode::Down => dashboard.move_selection(1),
            KeyCode::PageUp => dashboard.move_selection(-5),
            KeyCode::PageDown => dashboard.move_selection(5),
            KeyCode::Enter => match dashboard.current().cloned() {
                Some(repertoire) => {
                    self.clear_status();
                    return (self.open_repertoire(repertoire, dashboard), Mode::Normal);
                }
                None => self.set_status("No repertoire selected.", StatusKind::Error),
            },
            KeyCode::Char('l') => match dashboard.current().cloned() {
                Some(repertoire) => {
                    self.clear_status();
                    return match self.open_repertoire(repertoire, dashboard) {
                        Screen::Repertoire(songs) => (self.go_live(songs), Mode::Normal),
                        other => (other, Mode::Normal),
                    };
                }
                None => self.set_status("No repertoire selected.", StatusKind::Error),
            },
            KeyCode::Char('+') => {
                self.clear_status();
                return (
                    Screen::Dashboard(dashboard),
                    Mode::AddingRepertoire(RepertoireForm::default()),
                );
            }
            KeyCode::Char('e') | KeyCode::Char('E') => match dashboard.current() {
                Some(repertoire) => {
                    let mode = Mode::EditingRepertoire {
                        id: repertoire.id,
                        form: RepertoireForm::from_repertoire(repertoire),
                    };
                    self.clear_status();
                    return (Screen::Dashboard(dashboard), mode);
                }
                None => self.set_status("No repertoire selected to edit.", StatusKind::Error),
            },
            KeyCode::Char('-') => match dashboard.current().cloned() {
                Some(repertoire) => {
                    self.clear_status();
                    return (
                        Screen::Dashboard(dashboard),
                        Mode::ConfirmRepertoireDelete(repertoire),
                    );
                }
                None => self.set_status("No repertoire selected to delete.", StatusKind::Error),
            },
            KeyCode::Char('b') | KeyCode::Char('B') => {
                match BandScreen::load(self.bands.as_ref(), dashboard.owner_id) {
                    Ok(band) => {
                        self.clear_status();
                        return (Screen::Band(band), Mode::Normal);
                    }
                    Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
                }
            }
            KeyCode::Char('L') => match self.auth.logout() {
                Ok(()) => {
                    self.set_status("Signed out.", StatusKind::Info);
                    return (Screen::Auth(AuthScreen::default()), Mode::Normal);
                }
                Err(err) => self.set_status(err.user_message(), StatusKind::Error),
            },
            _ => {}
        }
        (Screen::Dashboard(dashboard), Mode::Normal)
    }

    fn handle_repertoire_key(
        &mut self,
        code: KeyCode,
        mut songs: RepertoireScreen,
        exit: &mut bool,
    ) -> (Screen, Mode) {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                self.clear_status();
                return (self.dashboard_or_auth(), Mode::Normal);
            }
            KeyCode::Up => songs.move_selection(-1),
            KeyCode::Down => songs.move_selection(1),
            KeyCode::PageUp => songs.move_selection(-5),
            KeyCode::PageDown => songs.move_selection(5),
            KeyCode::Home => songs.select_first(),
            KeyCode::End => songs.select_last(),
            KeyCode::Char('+') => {
                self.clear_status();
                return (Screen::Repertoire(songs), Mode::AddingSong(SongForm::default()));
            }
            KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E') => {
                match songs.current_song() {
                    Some(song) => {
                        let mode = Mode::EditingSong {
                            id: song.id,
                            form: SongForm::from_song(song),
                        };
                        self.clear_status();
                        return (Screen::Repertoire(songs), mode);
                    }
                    None => self.set_status("No song selected to edit.", StatusKind::Error),
                }
            }
            KeyCode::Char('-') => match songs.current_song().cloned() {
                Some(song) => {
                    self.clear_status();
                    return (Screen::Repertoire(songs), Mode::ConfirmSongDelete(song));
                }
                None => self.set_status("No song selected to delete.", StatusKind::Error),
            },
            KeyCode::Char('K') => self.move_song(&mut songs, MoveDirection::Up),
            KeyCode::Char('J') => self.move_song(&mut songs, MoveDirection::Down),
            KeyCode::Char('l') | KeyCode::Char('L') => {
                self.clear_status();
                return (self.go_live(songs), Mode::Normal);
            }
            _ => {}
        }
        (Screen::Repertoire(songs), Mode::Normal)
    }

    fn go_live(&mut self, songs: RepertoireScreen) -> Screen {
        self.live
            .start_session(songs.repertoire.clone(), songs.songs.clone());
        self.last_area = None;
        Screen::Live(songs)
    }

    fn move_song(&mut self, songs: &mut RepertoireScreen, direction: MoveDirection) {
        let Some(id) = songs.current_song().map(|song| song.id) else {
            return;
        };
        match self.repertoires.move_song(id, direction) {
            Ok(true) => {
                songs.has_changes();
                if let Err(err) = songs.reload(self.repertoires.as_ref()) {
                    self.set_status(surface_error(&err), StatusKind::Error);
                }
            }
            Ok(false) => {}
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    /// Performance keys go through the session's router first; the rest are
    /// the on-screen buttons.
    fn handle_live_key(&mut self, key: KeyEvent, songs: RepertoireScreen) -> Screen {
        if let Some(action) = self.live.handle_key(key.code, key.modifiers, Instant::now()) {
            debug!(?action, "live action");
            return Screen::Live(songs);
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.live.exit_session();
                return Screen::Repertoire(songs);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.live.faster();
            }
            KeyCode::Char('-') => {
                self.live.slower();
            }
            _ => {}
        }
        Screen::Live(songs)
    }

    fn handle_band_key(
        &mut self,
        code: KeyCode,
        mut band: BandScreen,
        exit: &mut bool,
    ) -> (Screen, Mode) {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                self.clear_status();
                return (self.dashboard_or_auth(), Mode::Normal);
            }
            KeyCode::Up => band.move_selection(-1),
            KeyCode::Down => band.move_selection(1),
            KeyCode::Char('n') | KeyCode::Char('N') => {
                let form = band
                    .band
                    .as_ref()
                    .map(|existing| BandForm::with_name(&existing.name))
                    .unwrap_or_default();
                self.clear_status();
                return (Screen::Band(band), Mode::EditingBand(form));
            }
            KeyCode::Char('+') => {
                if band.band.is_some() {
                    self.clear_status();
                    return (Screen::Band(band), Mode::AddingMember(MemberForm::default()));
                }
                self.set_status("Name your band first (press n).", StatusKind::Error);
            }
            KeyCode::Char('-') => match band.current_member().cloned() {
                Some(member) => {
                    self.clear_status();
                    return (Screen::Band(band), Mode::ConfirmMemberRemove(member));
                }
                None => self.set_status("No member selected to remove.", StatusKind::Error),
            },
            KeyCode::Char('d') | KeyCode::Char('D') => match band.band.clone() {
                Some(existing) => {
                    self.clear_status();
                    return (Screen::Band(band), Mode::ConfirmBandDelete(existing));
                }
                None => self.set_status("There is no band to delete.", StatusKind::Error),
            },
            _ => {}
        }
        (Screen::Band(band), Mode::Normal)
    }

    fn handle_repertoire_form(
        &mut self,
        key: KeyEvent,
        id: Option<i64>,
        mut form: RepertoireForm,
    ) -> Mode {
        match key.code {
            KeyCode::Esc => {
                self.set_status("Cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_repertoire(id, &form) {
                Ok(message) => {
                    self.set_status(message, StatusKind::Info);
                    return Mode::Normal;
                }
                Err(message) => {
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        match id {
            Some(id) => Mode::EditingRepertoire { id, form },
            None => Mode::AddingRepertoire(form),
        }
    }

    fn save_repertoire(
        &mut self,
        id: Option<i64>,
        form: &RepertoireForm,
    ) -> Result<&'static str, String> {
        let (name, description) = form.parse_inputs().map_err(|err| err.to_string())?;
        let Screen::Dashboard(dashboard) = &mut self.screen else {
            return Err("Repertoires can only be edited from the dashboard.".to_string());
        };
        let service = self.repertoires.as_ref();
        let focus = match id {
            Some(id) => {
                service
                    .rename_repertoire(id, &name, description.as_deref())
                    .map_err(|err| surface_error(&err))?;
                id
            }
            None => {
                service
                    .create_repertoire(&name, description.as_deref(), dashboard.owner_id)
                    .map_err(|err| surface_error(&err))?
                    .id
            }
        };
        dashboard.has_changes();
        dashboard.reload(service).map_err(|err| surface_error(&err))?;
        dashboard.select_id(focus);
        Ok(if id.is_some() {
            "Repertoire updated."
        } else {
            "Repertoire created."
        })
    }

    fn handle_confirm_repertoire_delete(&mut self, code: KeyCode, repertoire: Repertoire) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.repertoires.delete_repertoire(repertoire.id) {
                    Ok(()) => {
                        self.set_status(
                            format!("Deleted \"{}\".", repertoire.name),
                            StatusKind::Info,
                        );
                        Mode::Normal
                    }
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Mode::ConfirmRepertoireDelete(repertoire)
                    }
                }
            }
            _ => Mode::ConfirmRepertoireDelete(repertoire),
        }
    }

    fn handle_song_form(&mut self, key: KeyEvent, id: Option<i64>, mut form: SongForm) -> Mode {
        let save = (key.code == KeyCode::Enter && !form.editing_chords())
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s'));

        if save {
            match self.save_song(id, &form) {
                Ok(message) => {
                    self.set_status(message, StatusKind::Info);
                    return Mode::Normal;
                }
                Err(message) => {
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            }
        } else {
            match key.code {
                KeyCode::Esc => {
                    self.set_status("Cancelled.", StatusKind::Info);
                    return Mode::Normal;
                }
                KeyCode::Tab => form.next_field(),
                KeyCode::BackTab => form.previous_field(),
                KeyCode::Left => {
                    form.cycle_key(false);
                }
                KeyCode::Right => {
                    form.cycle_key(true);
                }
                KeyCode::Enter => {
                    form.push_newline();
                }
                KeyCode::Backspace => form.backspace(),
                KeyCode::Char(ch) => {
                    if form.push_char(ch) {
                        form.error = None;
                    }
                }
                _ => {}
            }
        }

        match id {
            Some(id) => Mode::EditingSong { id, form },
            None => Mode::AddingSong(form),
        }
    }

    fn save_song(&mut self, id: Option<i64>, form: &SongForm) -> Result<&'static str, String> {
        let fields = form.to_fields().map_err(|err| err.to_string())?;
        let Screen::Repertoire(songs) = &mut self.screen else {
            return Err("Songs can only be edited from a repertoire.".to_string());
        };
        let service = self.repertoires.as_ref();
        let focus = match id {
            Some(id) => {
                service
                    .update_song(id, &fields)
                    .map_err(|err| surface_error(&err))?;
                id
            }
            None => {
                service
                    .create_song(songs.repertoire.id, &fields)
                    .map_err(|err| surface_error(&err))?
                    .id
            }
        };
        songs.has_changes();
        songs.reload(service).map_err(|err| surface_error(&err))?;
        songs.select_id(focus);
        Ok(if id.is_some() {
            "Song updated."
        } else {
            "Song added."
        })
    }

    fn handle_confirm_song_delete(&mut self, code: KeyCode, song: Song) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.repertoires.delete_song(song.id) {
                    Ok(()) => {
                        self.set_status("Song deleted.", StatusKind::Info);
                        Mode::Normal
                    }
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Mode::ConfirmSongDelete(song)
                    }
                }
            }
            _ => Mode::ConfirmSongDelete(song),
        }
    }

    fn handle_band_form(&mut self, code: KeyCode, mut form: BandForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                let result = form
                    .parse_inputs()
                    .map_err(|err| err.to_string())
                    .and_then(|name| {
                        let Screen::Band(band) = &self.screen else {
                            return Err("Open the band screen first.".to_string());
                        };
                        self.bands
                            .save_band(band.owner_id, &name)
                            .map_err(|err| surface_error(&err))
                    });
                match result {
                    Ok(saved) => {
                        self.set_status(
                            format!("Band \"{}\" saved.", saved.name),
                            StatusKind::Info,
                        );
                        return Mode::Normal;
                    }
                    Err(message) => {
                        form.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::EditingBand(form)
    }

    fn handle_member_form(&mut self, code: KeyCode, mut form: MemberForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                let result = form
                    .parse_inputs()
                    .map_err(|err| err.to_string())
                    .and_then(|(name, instrument)| {
                        let band_id = match &self.screen {
                            Screen::Band(BandScreen {
                                band: Some(band), ..
                            }) => band.id,
                            _ => return Err("Name your band first.".to_string()),
                        };
                        self.bands
                            .add_member(band_id, &name, &instrument)
                            .map_err(|err| surface_error(&err))
                    });
                match result {
                    Ok(member) => {
                        self.set_status(format!("Added {member}."), StatusKind::Info);
                        return Mode::Normal;
                    }
                    Err(message) => {
                        form.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::AddingMember(form)
    }

    fn handle_confirm_member_remove(&mut self, code: KeyCode, member: BandMember) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Removal cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.bands.remove_member(member.id) {
                    Ok(()) => {
                        self.set_status(format!("Removed {}.", member.name), StatusKind::Info);
                        Mode::Normal
                    }
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Mode::ConfirmMemberRemove(member)
                    }
                }
            }
            _ => Mode::ConfirmMemberRemove(member),
        }
    }

    fn handle_confirm_band_delete(&mut self, code: KeyCode, band: Band) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.bands.delete_band(band.id) {
                    Ok(()) => {
                        self.set_status("Band deleted.", StatusKind::Info);
                        Mode::Normal
                    }
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Mode::ConfirmBandDelete(band)
                    }
                }
            }
            _ => Mode::ConfirmBandDelete(band),
        }
    }

    /// Reload whichever screen has pending change notifications.
    fn sync_screen(&mut self) -> Result<()> {
        match &mut self.screen {
            Screen::Dashboard(dashboard) if dashboard.has_changes() => {
                dashboard.reload(self.repertoires.as_ref())
            }
            Screen::Repertoire(songs) if songs.has_changes() => {
                songs.reload(self.repertoires.as_ref())
            }
            Screen::Band(band) if band.has_changes() => band.reload(self.bands.as_ref()),
            _ => Ok(()),
        }
    }

    /// React to sign-in state changing underneath the UI.
    fn session_changed(&mut self) {
        let signed_in = self.auth.session().is_some();
        let on_auth = matches!(self.screen, Screen::Auth(_));
        match (on_auth, signed_in) {
            (true, true) => self.screen = self.dashboard_or_auth(),
            (true, false) | (false, true) => {}
            (false, false) => {
                self.live.exit_session();
                self.mode = Mode::Normal;
                self.screen = Screen::Auth(AuthScreen::default());
                self.set_status("Signed out.", StatusKind::Info);
            }
        }
    }

    /// Dashboard for the signed-in user, or the sign-in screen when nobody
    /// is signed in or the list cannot be loaded.
    fn dashboard_or_auth(&mut self) -> Screen {
        let Some(owner_id) = self.auth.session().map(|session| session.user_id()) else {
            return Screen::Auth(AuthScreen::default());
        };
        match DashboardScreen::load(self.repertoires.as_ref(), owner_id) {
            Ok(dashboard) => Screen::Dashboard(dashboard),
            Err(err) => {
                self.set_status(surface_error(&err), StatusKind::Error);
                Screen::Auth(AuthScreen::default())
            }
        }
    }

    fn open_repertoire(&mut self, repertoire: Repertoire, dashboard: DashboardScreen) -> Screen {
        match RepertoireScreen::load(self.repertoires.as_ref(), repertoire) {
            Ok(songs) => Screen::Repertoire(songs),
            Err(err) => {
                self.set_status(surface_error(&err), StatusKind::Error);
                Screen::Dashboard(dashboard)
            }
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let (content_area, footer_area) = split_footer(area);

        match &self.screen {
            Screen::Auth(auth) => self.draw_auth(frame, content_area, auth),
            Screen::Dashboard(dashboard) => self.draw_dashboard(frame, content_area, dashboard),
            Screen::Repertoire(songs) => self.draw_repertoire(frame, content_area, songs),
            Screen::Live(_) => {
                if let Some(session) = self.live.session() {
                    live_view::draw(frame, content_area, session, self.settings.units_per_line);
                }
            }
            Screen::Band(band) => self.draw_band(frame, content_area, band),
        }

        if let Some(footer_area) = footer_area {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Normal => {}
            Mode::AddingRepertoire(form) => draw_form(
                frame,
                centered_rect(60, 40, area),
                "New Repertoire",
                form.lines(),
                form.error.as_deref(),
                "Enter to save • Tab to switch • Esc to cancel",
                form.cursor(),
            ),
            Mode::EditingRepertoire { form, .. } => draw_form(
                frame,
                centered_rect(60, 40, area),
                "Edit Repertoire",
                form.lines(),
                form.error.as_deref(),
                "Enter to save • Tab to switch • Esc to cancel",
                form.cursor(),
            ),
            Mode::ConfirmRepertoireDelete(repertoire) => draw_confirm(
                frame,
                area,
                "Delete Repertoire",
                vec![
                    Line::from(format!("Delete \"{}\"?", repertoire.name)),
                    Line::from("All of its songs will be deleted too."),
                ],
            ),
            Mode::AddingSong(form) => draw_form(
                frame,
                centered_rect(70, 70, area),
                "Add Song",
                form.lines(),
                form.error.as_deref(),
                song_form_hint(form),
                form.cursor(),
            ),
            Mode::EditingSong { form, .. } => draw_form(
                frame,
                centered_rect(70, 70, area),
                "Edit Song",
                form.lines(),
                form.error.as_deref(),
                song_form_hint(form),
                form.cursor(),
            ),
            Mode::ConfirmSongDelete(song) => draw_confirm(
                frame,
                area,
                "Delete Song",
                vec![Line::from(format!("Delete {}?", song.display_title()))],
            ),
            Mode::EditingBand(form) => draw_form(
                frame,
                centered_rect(60, 30, area),
                "Band",
                form.lines(),
                form.error.as_deref(),
                "Enter to save • Esc to cancel",
                form.cursor(),
            ),
            Mode::AddingMember(form) => draw_form(
                frame,
                centered_rect(60, 40, area),
                "Add Member",
                form.lines(),
                form.error.as_deref(),
                "Enter to save • Tab to switch • Esc to cancel",
                form.cursor(),
            ),
            Mode::ConfirmMemberRemove(member) => draw_confirm(
                frame,
                area,
                "Remove Member",
                vec![Line::from(format!("Remove {member} from the band?"))],
            ),
            Mode::ConfirmBandDelete(band) => draw_confirm(
                frame,
                area,
                "Delete Band",
                vec![
                    Line::from(format!("Delete \"{}\"?", band.name)),
                    Line::from("All members will be removed."),
                ],
            ),
        }
    }

    fn draw_auth(&self, frame: &mut Frame, area: Rect, auth: &AuthScreen) {
        let popup_area = centered_rect(60, 60, area);
        let active = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        let inactive = Style::default().fg(Color::DarkGray);
        let (sign_in_style, register_style) = match auth.tab {
            AuthTab::SignIn => (active, inactive),
            AuthTab::Register => (inactive, active),
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Sign in", sign_in_style),
                Span::raw("  |  "),
                Span::styled("Create account", register_style),
            ]),
            Line::from(""),
        ];
        let (fields, error, cursor) = match auth.tab {
            AuthTab::SignIn => (auth.login.lines(), &auth.login.error, auth.login.cursor()),
            AuthTab::Register => (
                auth.register.lines(),
                &auth.register.error,
                auth.register.cursor(),
            ),
        };
        let field_count = fields.len() as u16;
        lines.extend(fields);
        lines.push(Line::from(""));
        lines.push(match error {
            Some(error) => Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
            None => Line::from(Span::styled(
                "Enter to submit • Tab to switch field • Ctrl+N to switch form",
                Style::default().fg(Color::Gray),
            )),
        });

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Repertoire Manager");
        let inner = block.inner(popup_area);
        frame.render_widget(Paragraph::new(lines).block(block), popup_area);

        let (row, column) = cursor;
        if row < field_count {
            frame.set_cursor_position((inner.x + column, inner.y + 2 + row));
        }
    }

    fn draw_dashboard(&self, frame: &mut Frame, area: Rect, dashboard: &DashboardScreen) {
        let name = self
            .auth
            .session()
            .map(|session| session.user.display_name.clone())
            .unwrap_or_default();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Repertoires for {name}"));

        if dashboard.repertoires.is_empty() {
            let message = Paragraph::new("No repertoires yet. Press '+' to create one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = dashboard
            .repertoires
            .iter()
            .map(|repertoire| {
                let mut spans = vec![Span::styled(
                    repertoire.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )];
                if let Some(description) = &repertoire.description {
                    spans.push(Span::styled(
                        format!("  {description}"),
                        Style::default().fg(Color::Gray),
                    ));
                }
                spans.push(Span::styled(
                    format!("  ({})", repertoire.created_at.format("%Y-%m-%d")),
                    Style::default().fg(Color::DarkGray),
                ));
                ListItem::new(Line::from(spans))
            })
            .collect();
        render_list(frame, area, block, items, dashboard.selected);
    }

    fn draw_repertoire(&self, frame: &mut Frame, area: Rect, songs: &RepertoireScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(1)])
            .split(area);

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                songs.repertoire.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!(
                    "{}{} songs",
                    songs
                        .repertoire
                        .description
                        .as_deref()
                        .map(|description| format!("{description}  •  "))
                        .unwrap_or_default(),
                    songs.songs.len()
                ),
                Style::default().fg(Color::Gray),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title("Repertoire"));
        frame.render_widget(header, chunks[0]);

        let block = Block::default().borders(Borders::ALL).title("Set list");
        if songs.songs.is_empty() {
            let message = Paragraph::new("No songs yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, chunks[1]);
            return;
        }

        let items: Vec<ListItem> = songs
            .songs
            .iter()
            .enumerate()
            .map(|(index, song)| {
                let mut spans = vec![
                    Span::styled(
                        format!("{:>2}. ", index + 1),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::raw(song.display_title()),
                ];
                if let Some(key) = song.key {
                    spans.push(Span::styled(
                        format!("  [{key}]"),
                        Style::default().fg(Color::Cyan),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();
        render_list(frame, chunks[1], block, items, songs.selected);
    }

    fn draw_band(&self, frame: &mut Frame, area: Rect, band: &BandScreen) {
        let Some(existing) = &band.band else {
            let message = Paragraph::new("You have not set up a band yet. Press 'n' to name it.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Band"));
            frame.render_widget(message, area);
            return;
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Band: {}", existing.name));
        if band.members.is_empty() {
            let message = Paragraph::new("No members yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = band
            .members
            .iter()
            .map(|member| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        member.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  {}", member.instrument),
                        Style::default().fg(Color::Gray),
                    ),
                ]))
            })
            .collect();
        render_list(frame, area, block, items, band.selected);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match (&self.screen, &self.mode) {
            (_, Mode::AddingSong(_) | Mode::EditingSong { .. }) => key_hints(&[
                ("Tab", "Next field"),
                ("←→", "Key"),
                ("Ctrl+S", "Save"),
                ("Esc", "Cancel"),
            ]),
            (_, Mode::ConfirmRepertoireDelete(_))
            | (_, Mode::ConfirmSongDelete(_))
            | (_, Mode::ConfirmMemberRemove(_))
            | (_, Mode::ConfirmBandDelete(_)) => {
                key_hints(&[("y", "Confirm"), ("n/Esc", "Cancel")])
            }
            (_, Mode::AddingRepertoire(_) | Mode::EditingRepertoire { .. })
            | (_, Mode::EditingBand(_) | Mode::AddingMember(_)) => key_hints(&[
                ("Enter", "Save"),
                ("Tab", "Switch field"),
                ("Esc", "Cancel"),
            ]),
            (Screen::Auth(_), _) => key_hints(&[
                ("Enter", "Submit"),
                ("Tab", "Next field"),
                ("Ctrl+N", "Sign in / Create account"),
                ("Esc", "Quit"),
            ]),
            (Screen::Dashboard(_), _) => key_hints(&[
                ("↑↓", "Select"),
                ("Enter", "Open"),
                ("l", "Go live"),
                ("+", "New"),
                ("e", "Edit"),
                ("-", "Delete"),
                ("b", "Band"),
                ("L", "Sign out"),
                ("q", "Quit"),
            ]),
            (Screen::Repertoire(_), _) => key_hints(&[
                ("↑↓", "Select"),
                ("+", "Add"),
                ("e", "Edit"),
                ("-", "Delete"),
                ("K/J", "Move up/down"),
                ("l", "Go live"),
                ("Esc", "Back"),
                ("q", "Quit"),
            ]),
            (Screen::Live(_), _) => key_hints(&[
                ("←→", "Previous/Next"),
                ("Space", "Auto-scroll"),
                ("r", "Reset scroll"),
                ("+/-", "Speed"),
                ("Esc", "Exit live"),
            ]),
            (Screen::Band(_), _) => key_hints(&[
                ("↑↓", "Select"),
                ("n", "Name band"),
                ("+", "Add member"),
                ("-", "Remove member"),
                ("d", "Delete band"),
                ("Esc", "Back"),
                ("q", "Quit"),
            ]),
        }
    }

    #[cfg(test)]
    fn is_live(&self) -> bool {
        matches!(self.screen, Screen::Live(_))
    }
}

/// Split off the footer when the terminal is tall enough to hold it.
fn split_footer(area: Rect) -> (Rect, Option<Rect>) {
    if area.height <= FOOTER_HEIGHT {
        return (area, None);
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(FOOTER_HEIGHT)])
        .split(area);
    (chunks[0], Some(chunks[1]))
}

fn song_form_hint(form: &SongForm) -> &'static str {
    if form.editing_chords() {
        "Enter for new line • Ctrl+S to save • Tab to switch • Esc to cancel"
    } else {
        "Enter to save • Tab to switch • ←/→ to pick key • Esc to cancel"
    }
}

fn render_list<'a>(
    frame: &mut Frame,
    area: Rect,
    block: Block<'a>,
    items: Vec<ListItem<'a>>,
    selected: usize,
) {
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Yellow))
        .highlight_symbol("▶ ");
    let mut list_state = ListState::default();
    list_state.select(Some(selected));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn draw_form(
    frame: &mut Frame,
    popup_area: Rect,
    title: &str,
    mut lines: Vec<Line<'static>>,
    error: Option<&str>,
    hint: &str,
    cursor: (u16, u16),
) {
    frame.render_widget(Clear, popup_area);
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(popup_area);

    lines.push(Line::from(""));
    lines.push(match error {
        Some(error) => Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            hint.to_string(),
            Style::default().fg(Color::Gray),
        )),
    });
    frame.render_widget(Paragraph::new(lines).block(block), popup_area);

    let (row, column) = cursor;
    if row < inner.height && column < inner.width {
        frame.set_cursor_position((inner.x + column, inner.y + row));
    }
}

fn draw_confirm(frame: &mut Frame, area: Rect, title: &str, mut lines: Vec<Line<'static>>) {
    let popup_area = centered_rect(60, 30, area);
    frame.render_widget(Clear, popup_area);

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press Y to confirm or N / Esc to cancel.",
        Style::default().fg(Color::Gray),
    )));
    let paragraph = Paragraph::new(lines)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup_area);
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crossterm::event::KeyEventKind;

    use anyhow::anyhow;

    use super::*;
    use crate::auth::LocalIdentity;
    use crate::db::{open_in_memory, ChangeFeed, Scope, SqliteStore, Subscription};
    use crate::models::SongFields;

    /// Reads go to the real store; song inserts and repertoire deletes fail.
    struct FailingWrites(SqliteStore);

    impl RepertoireService for FailingWrites {
        fn list_repertoires(&self, owner_id: i64) -> Result<Vec<Repertoire>> {
            self.0.list_repertoires(owner_id)
        }

        fn create_repertoire(
            &self,
            name: &str,
            description: Option<&str>,
            owner_id: i64,
        ) -> Result<Repertoire> {
            self.0.create_repertoire(name, description, owner_id)
        }

        fn rename_repertoire(&self, id: i64, name: &str, description: Option<&str>) -> Result<()> {
            self.0.rename_repertoire(id, name, description)
        }

        fn delete_repertoire(&self, _id: i64) -> Result<()> {
            Err(anyhow!("database is locked"))
        }

        fn list_songs(&self, repertoire_id: i64) -> Result<Vec<Song>> {
            self.0.list_songs(repertoire_id)
        }

        fn create_song(&self, _repertoire_id: i64, _fields: &SongFields) -> Result<Song> {
            Err(anyhow!("database is locked"))
        }

        fn update_song(&self, id: i64, fields: &SongFields) -> Result<()> {
            self.0.update_song(id, fields)
        }

        fn delete_song(&self, id: i64) -> Result<()> {
            self.0.delete_song(id)
        }

        fn move_song(&self, id: i64, direction: MoveDirection) -> Result<bool> {
            self.0.move_song(id, direction)
        }

        fn subscribe(&self, scope: Scope) -> Subscription {
            self.0.subscribe(scope)
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(press(KeyCode::Char(ch)));
        }
    }

    fn settings() -> UiSettings {
        UiSettings {
            live: LiveSettings::default(),
            units_per_line: 20,
            refresh_metrics_on_resize: true,
            min_password_len: 6,
        }
    }

    fn build(failing_writes: bool) -> (App, SqliteStore) {
        let conn = Rc::new(open_in_memory().unwrap());
        let feed = ChangeFeed::new();
        let store = SqliteStore::new(Rc::clone(&conn), feed.clone());
        let identity = LocalIdentity::new(conn, feed, false);
        let auth = AuthContext::init(Box::new(identity));
        let repertoires: Box<dyn RepertoireService> = if failing_writes {
            Box::new(FailingWrites(store.clone()))
        } else {
            Box::new(store.clone())
        };
        let app = App::new(repertoires, Box::new(store.clone()), auth, settings());
        (app, store)
    }

    fn app() -> (App, SqliteStore) {
        build(false)
    }

    fn status_is_error(app: &App, text: &str) -> bool {
        matches!(
            &app.status,
            Some(StatusMessage { text: shown, kind: StatusKind::Error }) if shown == text
        )
    }

    fn register(app: &mut App) {
        app.handle_key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL));
        type_text(app, "Ana");
        app.handle_key(press(KeyCode::Tab));
        type_text(app, "ana@example.com");
        app.handle_key(press(KeyCode::Tab));
        type_text(app, "secret1");
        app.handle_key(press(KeyCode::Tab));
        type_text(app, "secret1");
        app.handle_key(press(KeyCode::Enter));
    }

    #[test]
    fn registration_lands_on_the_dashboard() {
        let (mut app, _) = app();
        register(&mut app);
        assert!(matches!(app.screen, Screen::Dashboard(_)));
    }

    #[test]
    fn short_password_keeps_the_register_form_open() {
        let (mut app, _) = app();
        app.handle_key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL));
        type_text(&mut app, "Ana");
        app.handle_key(press(KeyCode::Tab));
        type_text(&mut app, "ana@example.com");
        app.handle_key(press(KeyCode::Tab));
        type_text(&mut app, "abc");
        app.handle_key(press(KeyCode::Tab));
        type_text(&mut app, "abc");
        app.handle_key(press(KeyCode::Enter));

        let Screen::Auth(auth) = &app.screen else {
            panic!("expected the auth screen");
        };
        assert_eq!(
            auth.register.error.as_deref(),
            Some("Password must be at least 6 characters.")
        );
    }

    #[test]
    fn creating_a_repertoire_from_the_dashboard() {
        let (mut app, _) = app();
        register(&mut app);
        app.handle_key(press(KeyCode::Char('+')));
        type_text(&mut app, "Friday");
        app.handle_key(press(KeyCode::Enter));

        assert!(matches!(app.mode, Mode::Normal));
        let Screen::Dashboard(dashboard) = &app.screen else {
            panic!("expected the dashboard");
        };
        assert_eq!(dashboard.repertoires.len(), 1);
        assert_eq!(dashboard.current().map(|r| r.name.as_str()), Some("Friday"));
    }

    #[test]
    fn live_mode_round_trip_stops_the_clock() {
        let (mut app, store) = app();
        register(&mut app);
        let owner = app.auth.session().unwrap().user_id();
        let repertoire = store.create_repertoire("Gig", None, owner).unwrap();
        store
            .create_song(repertoire.id, &SongFields::titled("Opener"))
            .unwrap();
        app.tick(Instant::now());

        app.handle_key(press(KeyCode::Enter));
        app.handle_key(press(KeyCode::Char('l')));
        assert!(app.is_live());

        app.sync_layout(Rect::new(0, 0, 80, 30));
        app.handle_key(press(KeyCode::Char(' ')));
        assert!(app.live.session().unwrap().is_auto_scrolling());

        app.handle_key(press(KeyCode::Esc));
        assert!(!app.is_live());
        assert!(!app.live.is_active());
        assert!(matches!(app.screen, Screen::Repertoire(_)));
    }

    #[test]
    fn failed_repertoire_delete_keeps_the_list_and_dialog() {
        let (mut app, store) = build(true);
        register(&mut app);
        let owner = app.auth.session().unwrap().user_id();
        store.create_repertoire("Keep", None, owner).unwrap();
        store.create_repertoire("Other", None, owner).unwrap();
        app.tick(Instant::now());

        app.handle_key(press(KeyCode::Down));
        app.handle_key(press(KeyCode::Char('-')));
        app.handle_key(press(KeyCode::Char('y')));

        let Mode::ConfirmRepertoireDelete(pending) = &app.mode else {
            panic!("expected the delete dialog to stay open");
        };
        assert_eq!(pending.name, "Keep");
        let Screen::Dashboard(dashboard) = &app.screen else {
            panic!("expected the dashboard");
        };
        assert_eq!(dashboard.repertoires.len(), 2);
        assert_eq!(dashboard.selected, 1);
        assert!(status_is_error(&app, "database is locked"));
    }

    #[test]
    fn failed_song_save_keeps_the_form_and_song_list() {
        let (mut app, store) = build(true);
        register(&mut app);
        let owner = app.auth.session().unwrap().user_id();
        let repertoire = store.create_repertoire("Gig", None, owner).unwrap();
        store
            .create_song(repertoire.id, &SongFields::titled("Opener"))
            .unwrap();
        app.tick(Instant::now());

        app.handle_key(press(KeyCode::Enter));
        app.handle_key(press(KeyCode::Char('+')));
        type_text(&mut app, "Closer");
        app.handle_key(press(KeyCode::Enter));

        let Mode::AddingSong(form) = &app.mode else {
            panic!("expected the song form to stay open");
        };
        assert_eq!(form.title, "Closer");
        assert_eq!(form.error.as_deref(), Some("database is locked"));
        let Screen::Repertoire(songs) = &app.screen else {
            panic!("expected the repertoire screen");
        };
        assert_eq!(songs.songs.len(), 1);
        assert_eq!(songs.selected, 0);
        assert!(status_is_error(&app, "database is locked"));
    }

    #[test]
    fn sign_out_returns_to_auth_screen() {
        let (mut app, _) = app();
        register(&mut app);
        app.handle_key(press(KeyCode::Char('L')));
        assert!(matches!(app.screen, Screen::Auth(_)));
        assert!(app.auth.session().is_none());
    }

    #[test]
    fn poll_timeout_follows_the_clock() {
        let (app, _) = app();
        assert_eq!(app.poll_timeout(Instant::now()), IDLE_POLL);
    }
}
