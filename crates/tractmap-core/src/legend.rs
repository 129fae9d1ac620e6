use crate::config::LegendConfig;
use crate::engine::Page;

/// Maps an index value onto the legend track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendScale {
    pub min: f64,
    pub max: f64,
}

impl LegendScale {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Position of `value` along the track in `[0, 1]`.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 || !value.is_finite() {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    /// Left offset in pixels that centers a marker of `marker_width` on `value`.
    pub fn marker_left(&self, value: f64, track_width: f64, marker_width: f64) -> f64 {
        self.normalize(value) * track_width - marker_width / 2.0
    }
}

/// Places or hides the legend marker on the page.
pub struct LegendMarker<'a> {
    config: &'a LegendConfig,
}

impl<'a> LegendMarker<'a> {
    pub fn new(config: &'a LegendConfig) -> Self {
        Self { config }
    }

    /// Returns the applied left offset, or `None` if the marker was hidden.
    pub fn place<P: Page>(&self, page: &mut P, value: Option<f64>) -> Option<f64> {
        let Some(value) = value else {
            self.hide(page);
            return None;
        };

        let track_width = page
            .element_width(&self.config.track_id)
            .filter(|w| *w > 0.0)
            .unwrap_or(self.config.track_width);
        let marker_width = page
            .element_width(&self.config.marker_id)
            .filter(|w| *w > 0.0)
            .unwrap_or(self.config.marker_width);

        let left = LegendScale::new(self.config.min, self.config.max).marker_left(
            value,
            track_width,
            marker_width,
        );
        if !page.set_marker(&self.config.marker_id, Some(left)) {
            log::debug!("[Legend] Marker element '{}' not found", self.config.marker_id);
        }
        Some(left)
    }

    pub fn hide<P: Page>(&self, page: &mut P) {
        page.set_marker(&self.config.marker_id, None);
    }
}
