use gpui::*;
use log::{error, info, warn};
use std::sync::Arc;

mod app;
mod notifications;
mod theme;
mod ui;

use app::{screen_from_bounds, ClockApp, QuitApp};
use prayer_clock::cache::ScheduleCache;
use prayer_clock::config::SettingsStore;
use prayer_clock::diyanet::DiyanetClient;
use prayer_clock::geometry;
use prayer_clock::refresh::Refresher;
use prayer_clock::{CountdownEngine, PrayerSchedule, Settings};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut store = match SettingsStore::at_default_location() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Cannot locate the settings file: {:#}", e);
            std::process::exit(1);
        }
    };

    let settings = match store.load() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load settings: {:#}", e);
            warn!(
                "Using default settings; {} is left untouched until it is fixed",
                store.path().display()
            );
            Settings::default()
        }
    };

    let cache = match ScheduleCache::at_default_location() {
        Ok(cache) => cache,
        Err(e) => {
            eprintln!("Cannot locate the schedule cache: {:#}", e);
            std::process::exit(1);
        }
    };

    let schedule = cache.load().unwrap_or_else(|e| {
        warn!("Ignoring unreadable schedule cache: {:#}", e);
        PrayerSchedule::new()
    });

    let client = match DiyanetClient::new(settings.refresh.fetch_timeout()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("Failed to set up the prayer-times client: {:#}", e);
            std::process::exit(1);
        }
    };

    let (refresher, outcomes) =
        Refresher::new(client.clone(), cache, settings.refresh.retry_interval());
    let engine = CountdownEngine::new(schedule, refresher, outcomes);

    info!(
        "Starting clock for {} / {}",
        settings.location.district.name, settings.location.city.name
    );

    Application::new().run(move |cx| {
        cx.bind_keys([KeyBinding::new("cmd-q", QuitApp, None)]);

        let display = &settings.display;
        let window_size =
            geometry::window_size(display.orientation, display.show_seconds, display.font_size);
        let position = match cx.displays().first() {
            Some(screen) => geometry::place_window(
                display.position,
                window_size,
                screen_from_bounds(screen.bounds()),
                display.snap_distance,
            ),
            None => display.position,
        };

        let bounds = Bounds {
            origin: point(px(position.x), px(position.y)),
            size: size(px(window_size.width), px(window_size.height)),
        };

        cx.open_window(
            WindowOptions {
                window_bounds: Some(WindowBounds::Windowed(bounds)),
                titlebar: None,
                window_decorations: Some(WindowDecorations::Client),
                kind: if display.always_on_top {
                    WindowKind::PopUp
                } else {
                    WindowKind::Normal
                },
                is_movable: true,
                is_resizable: false,
                focus: true,
                show: true,
                app_id: Some("prayer-clock".to_string()),
                ..Default::default()
            },
            |_window, cx| cx.new(|cx| ClockApp::new(settings.clone(), store, client, engine, cx)),
        )
        .expect("Failed to open window");
    });
}
