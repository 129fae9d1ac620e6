//! Browser host for the tract map dashboard.
//!
//! The page script creates the mapbox-gl map and stores it on `window.map`.
//! This module waits for the page to load, gives the map a moment to appear,
//! and then wires the page and the map to a `Dashboard`.

mod app;
mod dom;
mod logger;
mod mapbox;

pub use app::App;
pub use dom::DomPage;
pub use mapbox::{MapboxEngine, MapboxMap};

use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use log::LevelFilter;
use tractmap_core::DashboardConfig;
use wasm_bindgen::prelude::*;

/// Global the page may set (JSON string or plain object) to override defaults.
const CONFIG_GLOBAL: &str = "TRACTMAP_CONFIG";

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    logger::init(LevelFilter::Info);

    let config = read_config();
    let Some(window) = web_sys::window() else {
        return;
    };
    let ready = window
        .document()
        .is_some_and(|d| d.ready_state() == "complete");

    if ready {
        mount_after_wait(config);
    } else {
        EventListener::once(&window, "load", move |_| mount_after_wait(config)).forget();
    }
}

fn mount_after_wait(config: DashboardConfig) {
    let wait = config.map_wait_ms;
    Timeout::new(wait, move || {
        let map = MapboxEngine::from_window();
        if map.is_none() {
            log::error!(
                "[Dashboard] window.map not found after {} ms, map features disabled",
                wait
            );
        }
        if App::mount(config, map).is_some() {
            log::info!("[Dashboard] Mounted");
        }
    })
    .forget();
}

fn read_config() -> DashboardConfig {
    let raw = web_sys::window().and_then(|w| mapbox::get(&w, CONFIG_GLOBAL));
    let Some(raw) = raw else {
        return DashboardConfig::default();
    };

    let json = raw.as_string().or_else(|| {
        js_sys::JSON::stringify(&raw)
            .ok()
            .and_then(|s| s.as_string())
    });
    let parsed = match json {
        Some(json) => DashboardConfig::from_json(&json),
        None => {
            log::error!("[Config] window.{} is not JSON, using defaults", CONFIG_GLOBAL);
            return DashboardConfig::default();
        }
    };

    match parsed {
        Ok(config) => {
            log::info!("[Config] Loaded window.{}", CONFIG_GLOBAL);
            config
        }
        Err(e) => {
            log::error!("[Config] {}, using defaults", e);
            DashboardConfig::default()
        }
    }
}
