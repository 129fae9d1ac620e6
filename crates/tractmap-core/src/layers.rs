use crate::config::{LayerToggle, PeriodToggle};
use crate::engine::{MapEngine, Page, Visibility};

pub struct LayerSwitch;

impl LayerSwitch {
    /// Shows or hides a single layer. Returns `false` if the layer is absent.
    pub fn set_visible<M: MapEngine>(map: &mut M, layer: &str, visible: bool) -> bool {
        if !map.has_layer(layer) {
            log::warn!("[Layers] Layer not found: {}", layer);
            return false;
        }

        let visibility = Visibility::from_shown(visible);
        map.set_layer_visibility(layer, visibility);
        log::info!("[Layers] {}: {}", layer, visibility.as_str());
        true
    }

    /// Shows one period layer and hides the other. Both layers are checked
    /// before either is touched, so a missing layer leaves the map as it was.
    pub fn select_period<M: MapEngine>(map: &mut M, period: &PeriodToggle, checked: bool) -> bool {
        if !map.has_layer(&period.checked_layer) || !map.has_layer(&period.unchecked_layer) {
            log::warn!(
                "[Layers] One or both period layers not found: {}, {}",
                period.checked_layer,
                period.unchecked_layer
            );
            return false;
        }

        let (shown, hidden) = if checked {
            (&period.checked_layer, &period.unchecked_layer)
        } else {
            (&period.unchecked_layer, &period.checked_layer)
        };
        map.set_layer_visibility(shown, Visibility::Visible);
        map.set_layer_visibility(hidden, Visibility::None);
        log::info!("[Layers] Period: {} shown, {} hidden", shown, hidden);
        true
    }

    /// Applies a checkbox's current state to its layer. A missing checkbox
    /// leaves the layer untouched.
    pub fn sync_toggle<M: MapEngine, P: Page>(map: &mut M, page: &P, toggle: &LayerToggle) -> bool {
        match page.is_checked(&toggle.input_id) {
            Some(checked) => Self::set_visible(map, &toggle.layer, checked),
            None => {
                log::debug!("[Layers] Checkbox '{}' not found", toggle.input_id);
                false
            }
        }
    }

    pub fn sync_period<M: MapEngine, P: Page>(map: &mut M, page: &P, period: &PeriodToggle) -> bool {
        match page.is_checked(&period.input_id) {
            Some(checked) => Self::select_period(map, period, checked),
            None => {
                log::debug!("[Layers] Period checkbox '{}' not found", period.input_id);
                false
            }
        }
    }
}
