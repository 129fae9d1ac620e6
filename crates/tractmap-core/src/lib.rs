pub mod cities;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod feature;
pub mod frame;
pub mod headless;
pub mod layers;
pub mod legend;
pub mod panels;
pub mod tracker;

pub use config::DashboardConfig;
pub use dashboard::{Dashboard, DashboardEvent, Reaction};
pub use engine::{
    CameraTarget, FilterExpr, LngLat, MapEngine, Page, PopupKind, ScreenPoint, Visibility,
};
pub use feature::{Feature, TractDetails};

use thiserror::Error;

/// Placeholder shown for any attribute that is missing or not numeric.
pub const PLACEHOLDER: &str = "—";

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("Invalid legend range: min {min} must be below max {max}")]
    InvalidLegendRange { min: f64, max: f64 },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Unknown city: {0}")]
    UnknownCity(String),
    #[error("No map to move to {0}")]
    MapUnavailable(String),
}
