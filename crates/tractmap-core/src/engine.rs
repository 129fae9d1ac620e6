use crate::config::OutlineStyle;
use crate::feature::Feature;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Sentinel tract id that no feature carries, used to clear outline filters.
pub const MATCH_NOTHING: &str = "__none__";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Pixel position relative to the map canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraTarget {
    pub center: LngLat,
    pub zoom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    None,
}

impl Visibility {
    pub fn from_shown(shown: bool) -> Self {
        if shown {
            Visibility::Visible
        } else {
            Visibility::None
        }
    }

    /// Value of the `visibility` layout property.
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopupKind {
    /// Follows the pointer while hovering a tract.
    Hover,
    /// Pinned at the last click on a tract.
    Selected,
}

/// Single-feature equality filter: `["==", ["get", key], value]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterExpr {
    pub key: String,
    pub value: String,
}

impl FilterExpr {
    pub fn matching(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub fn nothing(key: &str) -> Self {
        Self::matching(key, MATCH_NOTHING)
    }

    pub fn matches_nothing(&self) -> bool {
        self.value == MATCH_NOTHING
    }

    pub fn to_expression(&self) -> Value {
        json!(["==", ["get", self.key], self.value])
    }
}

/// What the interaction layer needs from the mapping engine.
///
/// Implementations must treat operations on unknown layers as no-ops; callers
/// check `has_layer` first when they need to report the absence.
pub trait MapEngine {
    /// `false` while no live map backs the engine.
    fn is_attached(&self) -> bool {
        true
    }

    fn has_layer(&self, layer: &str) -> bool;

    fn set_layer_visibility(&mut self, layer: &str, visibility: Visibility);

    fn set_filter(&mut self, layer: &str, filter: &FilterExpr);

    /// Features rendered under `point`, restricted to `layers`, topmost first.
    fn query_features_at(&self, point: ScreenPoint, layers: &[String]) -> Vec<Feature>;

    /// Adds a line layer drawing tract outlines, sourced like `base_layer`.
    fn add_outline_layer(
        &mut self,
        style: &OutlineStyle,
        base_layer: &str,
        filter: &FilterExpr,
    ) -> bool;

    fn ease_to(&mut self, target: CameraTarget, duration_ms: u32);

    /// Attaches the popup to the map without moving it. No-op if already open.
    fn open_popup(&mut self, kind: PopupKind);

    fn show_popup(&mut self, kind: PopupKind, at: LngLat, html: &str);

    fn remove_popup(&mut self, kind: PopupKind);

    fn is_popup_open(&self, kind: PopupKind) -> bool;

    /// `None` restores the engine's own cursor.
    fn set_cursor(&mut self, cursor: Option<&str>);
}

/// What the interaction layer needs from the page.
///
/// Targets are element ids, optionally followed by a space and a descendant
/// selector (`"box-1 img.picto"`). Every method tolerates a missing element:
/// setters return `false` and getters return `None`.
pub trait Page {
    fn set_text(&mut self, id: &str, text: &str) -> bool;

    fn set_class(&mut self, id: &str, class: &str, on: bool) -> bool;

    fn has_class(&self, id: &str, class: &str) -> Option<bool>;

    fn set_attribute(&mut self, id: &str, name: &str, value: &str) -> bool;

    fn set_image(&mut self, id: &str, src: &str, alt: &str) -> bool;

    fn is_checked(&self, id: &str) -> Option<bool>;

    fn element_width(&self, id: &str) -> Option<f64>;

    /// Positions the marker `left_px` from the start of its track, or hides it.
    fn set_marker(&mut self, id: &str, left_px: Option<f64>) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_expression_shape() {
        let filter = FilterExpr::matching("GEOID", "36061000100");
        assert_eq!(
            filter.to_expression(),
            json!(["==", ["get", "GEOID"], "36061000100"])
        );
        assert!(!filter.matches_nothing());
        assert!(FilterExpr::nothing("GEOID").matches_nothing());
    }

    #[test]
    fn test_visibility_strings() {
        assert_eq!(Visibility::from_shown(true).as_str(), "visible");
        assert_eq!(Visibility::from_shown(false).as_str(), "none");
    }
}
