use chrono::{Local, NaiveDateTime};
use gpui::prelude::*;
use gpui::*;
use log::{error, info, warn};
use std::sync::Arc;

use prayer_clock::config::{self, SettingsStore};
use prayer_clock::diyanet::DiyanetClient;
use prayer_clock::geometry::{self, Screen};
use prayer_clock::location::LocationPicker;
use prayer_clock::urgency::{next_palette_color, parse_hex_color};
use prayer_clock::{CountdownEngine, PresentationSink, Settings};

use crate::notifications;
use crate::theme::MenuTheme;
use crate::ui::{ClockFace, ContextMenu, MenuAction, MenuPage, MenuStatus};

actions!(prayer_clock, [QuitApp]);

const MENU_WIDTH: f32 = 240.0;
const MENU_HEIGHT: f32 = 210.0;

/// Last frame handed over by the engine, in paintable form.
pub struct FaceState {
    pub text: String,
    pub background: u32,
    pub foreground: u32,
    pub last_refresh: Option<bool>,
    enable_notifications: bool,
}

impl FaceState {
    fn new(settings: &Settings) -> Self {
        let colors = &settings.tiers.normal;
        Self {
            text: String::new(),
            background: colors.background_rgb().unwrap_or(0x0a1932),
            foreground: colors.text_rgb().unwrap_or(0xffffff),
            last_refresh: None,
            enable_notifications: settings.enable_notifications,
        }
    }
}

impl PresentationSink for FaceState {
    fn on_tick(&mut self, text: &str, background: &str, foreground: &str) {
        self.text = text.to_string();
        if let Ok(rgb) = parse_hex_color(background) {
            self.background = rgb;
        }
        if let Ok(rgb) = parse_hex_color(foreground) {
            self.foreground = rgb;
        }
    }

    fn on_refresh_completed(&mut self, success: bool) {
        // Only the first failure in a row is worth a notification.
        let was_failing = self.last_refresh == Some(false);
        self.last_refresh = Some(success);
        if !success && !was_failing && self.enable_notifications {
            notifications::notify_refresh_failed();
        }
    }

    fn on_prayer_time(&mut self, instant: NaiveDateTime) {
        if self.enable_notifications {
            notifications::notify_prayer_time(instant);
        }
    }
}

pub fn screen_from_bounds(bounds: Bounds<Pixels>) -> Screen {
    Screen {
        origin: config::Position {
            x: f32::from(bounds.origin.x),
            y: f32::from(bounds.origin.y),
        },
        size: geometry::Size {
            width: f32::from(bounds.size.width),
            height: f32::from(bounds.size.height),
        },
    }
}

pub struct ClockApp {
    engine: CountdownEngine,
    settings: Settings,
    store: SettingsStore,
    client: Arc<DiyanetClient>,
    face: FaceState,
    focus_handle: FocusHandle,
    menu_open: bool,
    menu_page: MenuPage,
    menu_error: Option<String>,
    picker: LocationPicker,
    window_origin: Option<config::Position>,
}

impl ClockApp {
    pub fn new(
        settings: Settings,
        store: SettingsStore,
        client: Arc<DiyanetClient>,
        engine: CountdownEngine,
        cx: &mut Context<'_, Self>,
    ) -> Self {
        // Tick loop; ends once the view is released.
        cx.spawn(async move |this, cx| {
            loop {
                let Ok(interval) = this.update(cx, |app, cx| {
                    app.tick(cx);
                    app.settings.tick_interval()
                }) else {
                    break;
                };

                cx.background_spawn(async move {
                    std::thread::sleep(interval);
                })
                .await;
            }
            info!("Tick loop stopped");
        })
        .detach();

        Self {
            face: FaceState::new(&settings),
            picker: LocationPicker::new(&settings.location),
            engine,
            settings,
            store,
            client,
            focus_handle: cx.focus_handle(),
            menu_open: false,
            menu_page: MenuPage::Main,
            menu_error: None,
            window_origin: None,
        }
    }

    fn tick(&mut self, cx: &mut Context<'_, Self>) {
        match self.store.reload_if_changed() {
            Ok(Some(saved)) => self.adopt(saved),
            Ok(None) => {}
            Err(e) => warn!("Ignoring unreadable settings file: {:#}", e),
        }

        let now = Local::now().naive_local();
        self.engine.tick(now, &self.settings, &mut self.face);
        cx.notify();
    }

    /// Takes over settings saved on disk. Display settings belong to this
    /// window and are kept as they are.
    fn adopt(&mut self, saved: Settings) {
        let relocated = saved.location.district.id != self.settings.location.district.id;
        self.settings = Settings {
            display: self.settings.display.clone(),
            ..saved
        };
        self.face.enable_notifications = self.settings.enable_notifications;

        if relocated {
            info!(
                "Location changed to {} / {}",
                self.settings.location.district.name, self.settings.location.city.name
            );
            self.engine.relocate();
            self.face.last_refresh = None;
            self.picker = LocationPicker::new(&self.settings.location);
        }
    }

    /// Applies `edit` here and to the settings file. Edits that fail
    /// validation are rejected and reported in the menu.
    fn edit_settings(&mut self, edit: impl Fn(&mut Settings)) -> bool {
        let mut candidate = self.settings.clone();
        edit(&mut candidate);
        if let Err(e) = candidate.validate() {
            warn!("Rejected settings change: {:#}", e);
            self.menu_error = Some(e.root_cause().to_string());
            return false;
        }

        self.menu_error = None;
        self.settings = candidate;
        match self.store.update(&edit) {
            Ok(saved) => self.adopt(saved),
            Err(e) => error!("Failed to save settings: {:#}", e),
        }
        true
    }

    pub fn handle_refresh_now(&mut self, cx: &mut Context<'_, Self>) {
        if self.engine.request_refresh(&self.settings.location.district.id) {
            info!("Manual refresh started");
        }
        cx.notify();
    }

    pub fn handle_toggle_orientation(&mut self, window: &mut Window, cx: &mut Context<'_, Self>) {
        let orientation = self.settings.display.orientation.toggled();
        self.edit_settings(move |settings| settings.display.orientation = orientation);
        self.fit_window(window);
        self.tick(cx);
    }

    pub fn handle_toggle_seconds(&mut self, window: &mut Window, cx: &mut Context<'_, Self>) {
        let show_seconds = !self.settings.display.show_seconds;
        self.edit_settings(move |settings| settings.display.show_seconds = show_seconds);
        self.fit_window(window);
        self.tick(cx);
    }

    pub fn handle_toggle_menu(&mut self, window: &mut Window, cx: &mut Context<'_, Self>) {
        self.menu_open = !self.menu_open;
        self.menu_page = MenuPage::Main;
        self.menu_error = None;
        self.fit_window(window);
        cx.notify();
    }

    pub fn handle_close_menu(&mut self, window: &mut Window, cx: &mut Context<'_, Self>) {
        if self.menu_page != MenuPage::Main {
            self.handle_open_page(MenuPage::Main, cx);
        } else if self.menu_open {
            self.handle_toggle_menu(window, cx);
        }
    }

    pub fn handle_drag_start(&mut self, window: &mut Window) {
        window.start_window_move();
    }

    pub fn handle_menu_action(
        &mut self,
        action: MenuAction,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) {
        match action {
            MenuAction::Refresh => self.handle_refresh_now(cx),
            MenuAction::ToggleOrientation => self.handle_toggle_orientation(window, cx),
            MenuAction::ToggleSeconds => self.handle_toggle_seconds(window, cx),
            MenuAction::Open(page) => self.handle_open_page(page, cx),
            MenuAction::StepCity(step) => {
                self.picker.step_city(step);
                self.load_districts(cx);
                cx.notify();
            }
            MenuAction::StepDistrict(step) => {
                self.picker.step_district(step);
                cx.notify();
            }
            MenuAction::ApplyLocation => self.handle_apply_location(cx),
            MenuAction::AdjustTrigger(tier, delta) => {
                let mut tiers = self.settings.tiers.clone();
                tiers.adjust_trigger(tier, delta);
                self.edit_settings(move |settings| settings.tiers = tiers.clone());
                self.tick(cx);
            }
            MenuAction::CycleColor(tier) => {
                let next = next_palette_color(&self.settings.tiers.colors(tier).background);
                self.edit_settings(move |settings| {
                    settings.tiers.colors_mut(tier).background = next.to_string();
                });
                self.tick(cx);
            }
            MenuAction::Quit => cx.quit(),
        }
    }

    fn handle_open_page(&mut self, page: MenuPage, cx: &mut Context<'_, Self>) {
        self.menu_page = page;
        self.menu_error = None;
        if page == MenuPage::Location {
            self.picker = LocationPicker::new(&self.settings.location);
            self.load_districts(cx);
        }
        cx.notify();
    }

    fn handle_apply_location(&mut self, cx: &mut Context<'_, Self>) {
        let Some(location) = self.picker.selection() else {
            return;
        };
        if location != self.settings.location
            && self.edit_settings(move |settings| settings.location = location.clone())
        {
            info!(
                "Location set to {} / {}",
                self.settings.location.district.name, self.settings.location.city.name
            );
            self.engine.relocate();
            self.face.last_refresh = None;
        }
        self.menu_page = MenuPage::Main;
        self.tick(cx);
    }

    fn load_districts(&mut self, cx: &mut Context<'_, Self>) {
        let Some(city_id) = self.picker.begin_load() else {
            return;
        };
        let client = Arc::clone(&self.client);

        cx.spawn(async move |this, cx| {
            let result = cx
                .background_spawn(async move { client.districts(city_id) })
                .await;
            let _ = this.update(cx, |app, cx| {
                if let Err(e) = &result {
                    warn!("Failed to fetch districts of city {}: {:#}", city_id, e);
                }
                app.picker.finish_load(city_id, result);
                cx.notify();
            });
        })
        .detach();
    }

    fn fit_window(&self, window: &mut Window) {
        let display = &self.settings.display;
        let face = geometry::window_size(display.orientation, display.show_seconds, display.font_size);
        let (width, height) = if self.menu_open {
            (face.width.max(MENU_WIDTH), face.height + MENU_HEIGHT)
        } else {
            (face.width, face.height)
        };
        window.resize(size(px(width), px(height)));
    }

    /// Stores where the user dragged the window, snapped to nearby edges.
    fn track_position(&mut self, window: &Window, cx: &Context<'_, Self>) {
        let origin = window.bounds().origin;
        let current = config::Position {
            x: f32::from(origin.x),
            y: f32::from(origin.y),
        };
        let Some(previous) = self.window_origin.replace(current) else {
            return;
        };
        if (current.x - previous.x).abs() < 1.0 && (current.y - previous.y).abs() < 1.0 {
            return;
        }

        let display = &self.settings.display;
        let size = geometry::window_size(display.orientation, display.show_seconds, display.font_size);
        let position = match cx.primary_display() {
            Some(screen) => geometry::snap_to_edges(
                current,
                size,
                screen_from_bounds(screen.bounds()),
                display.snap_distance,
            ),
            None => current,
        };

        info!("Window moved to ({}, {})", position.x, position.y);
        self.edit_settings(move |settings| settings.display.position = position);
    }

    fn menu_status(&self) -> MenuStatus {
        if let Some(error) = &self.menu_error {
            return MenuStatus::Error(error.clone());
        }
        if self.engine.is_refreshing() {
            return MenuStatus::Info("Updating times…".to_string());
        }
        match self.face.last_refresh {
            Some(true) => MenuStatus::Info("Times updated".to_string()),
            Some(false) => MenuStatus::Error("Update failed".to_string()),
            None => MenuStatus::Info(format!("{} day(s) cached", self.engine.schedule().len())),
        }
    }
}

impl Render for ClockApp {
    fn render(&mut self, window: &mut Window, cx: &mut Context<'_, Self>) -> impl IntoElement {
        if !self.menu_open {
            self.track_position(window, cx);
        }

        let view_for_keyboard = cx.entity().clone();
        let view_for_ui = cx.entity().clone();
        let focus_handle = self.focus_handle.clone();
        self.focus_handle.focus(window);

        let theme = MenuTheme::for_appearance(window.appearance());
        let display = &self.settings.display;
        let location = format!(
            "{} / {}",
            self.settings.location.district.name, self.settings.location.city.name
        );

        div()
            .size_full()
            .flex()
            .flex_col()
            .track_focus(&focus_handle)
            .on_key_down(move |event, window, cx| {
                let key = event.keystroke.key.as_str();
                cx.update_entity(&view_for_keyboard, |app, cx| match key {
                    "r" => app.handle_refresh_now(cx),
                    "o" => app.handle_toggle_orientation(window, cx),
                    "s" => app.handle_toggle_seconds(window, cx),
                    "m" => app.handle_toggle_menu(window, cx),
                    "escape" => app.handle_close_menu(window, cx),
                    _ => {}
                });
            })
            .on_action(|_: &QuitApp, _window, cx| {
                cx.quit();
            })
            .child(ClockFace::new(
                self.face.text.clone(),
                self.face.background,
                self.face.foreground,
                display.font_size,
                view_for_ui.clone(),
            ))
            .when(self.menu_open, |div| {
                div.child(ContextMenu::new(
                    theme,
                    self.menu_page,
                    location,
                    self.menu_status(),
                    display.orientation,
                    display.show_seconds,
                    self.picker.clone(),
                    self.settings.tiers.clone(),
                    view_for_ui,
                ))
            })
    }
}
