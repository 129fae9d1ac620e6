//! Hover and click handling over the period layers.
//!
//! Hovering a tract outlines it and moves a small popup that follows the
//! pointer (one redraw per animation frame). Clicking a tract selects it:
//! a second outline, a pinned popup, the detail panel, and the legend marker.
//! Clicking where no tract is rendered clears the selection.

use crate::config::{DashboardConfig, DetailIds};
use crate::engine::{FilterExpr, LngLat, MapEngine, Page, PopupKind, ScreenPoint};
use crate::feature::{Feature, TractDetails};
use crate::frame::{FrameCoalescer, FrameTicket};
use crate::legend::LegendMarker;
use crate::PLACEHOLDER;

#[derive(Debug, Clone, PartialEq)]
pub struct PopupUpdate {
    pub at: LngLat,
    pub html: String,
}

/// Everything the tracker remembers between events.
#[derive(Debug, Default)]
pub struct InteractionState {
    /// Tract id of the selected feature.
    pub selected: Option<String>,
    /// Index value last placed on the legend.
    pub last_index: Option<f64>,
    pub hovered: Option<String>,
    pub frames: FrameCoalescer<PopupUpdate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Selected {
        tract: String,
        index: Option<f64>,
        marker_left: Option<f64>,
    },
    Cleared,
    /// The tracker is not installed.
    Ignored,
}

#[derive(Debug, Default)]
pub struct HoverTracker {
    state: InteractionState,
    bound: Vec<String>,
}

impl HoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn selected(&self) -> Option<&str> {
        self.state.selected.as_deref()
    }

    pub fn is_installed(&self) -> bool {
        !self.bound.is_empty()
    }

    /// Period layers the tracker listens to.
    pub fn bound_layers(&self) -> &[String] {
        &self.bound
    }

    /// Binds every period layer present in the style and adds the outline
    /// layers. Returns the bound layers; empty when no period layer exists.
    pub fn install<M: MapEngine>(&mut self, config: &DashboardConfig, map: &mut M) -> Vec<String> {
        let candidates = config.period_layers();

        let Some(base) = candidates.iter().find(|id| map.has_layer(id)).cloned() else {
            log::error!("[Tracker] No period layers found: {:?}", candidates);
            self.bound.clear();
            return Vec::new();
        };

        let nothing = FilterExpr::nothing(&config.id_property);
        for outline in [&config.hover_outline, &config.selected_outline] {
            if !map.has_layer(&outline.layer) && !map.add_outline_layer(outline, &base, &nothing) {
                log::warn!("[Tracker] Could not add outline layer {}", outline.layer);
            }
        }

        self.bound = candidates
            .into_iter()
            .filter(|id| {
                let present = map.has_layer(id);
                if !present {
                    log::warn!("[Tracker] Missing layer: {}", id);
                }
                present
            })
            .collect();

        log::debug!("[Tracker] Bound to {:?}", self.bound);
        self.bound.clone()
    }

    fn is_bound(&self, layer: &str) -> bool {
        self.bound.iter().any(|l| l == layer)
    }

    pub fn on_enter<M: MapEngine>(&mut self, map: &mut M, layer: &str) {
        if !self.is_bound(layer) {
            return;
        }
        // keep the normal arrow rather than the engine's pointer
        map.set_cursor(Some("default"));
        if !map.is_popup_open(PopupKind::Hover) {
            map.open_popup(PopupKind::Hover);
        }
    }

    /// Outlines the hovered tract and queues a popup redraw. The returned
    /// ticket must be run on the next animation frame; it supersedes any
    /// ticket handed out before.
    pub fn on_move<M: MapEngine>(
        &mut self,
        config: &DashboardConfig,
        map: &mut M,
        layer: &str,
        at: LngLat,
        feature: Option<&Feature>,
    ) -> Option<FrameTicket> {
        if !self.is_bound(layer) {
            return None;
        }
        let feature = feature?;

        let tract = feature.text(&config.id_property).unwrap_or_default();
        map.set_filter(
            &config.hover_outline.layer,
            &FilterExpr::matching(&config.id_property, &tract),
        );
        self.state.hovered = Some(tract);

        let index_key = config.index_property_for(feature.layer.as_deref().or(Some(layer)));
        let details = TractDetails::from_feature(feature, &config.id_property, index_key);

        Some(self.state.frames.push(PopupUpdate {
            at,
            html: details.hover_html(),
        }))
    }

    /// Applies the popup update queued for `ticket`, if still current.
    pub fn run_frame<M: MapEngine>(&mut self, map: &mut M, ticket: FrameTicket) -> bool {
        match self.state.frames.fire(ticket) {
            Some(update) => {
                map.show_popup(PopupKind::Hover, update.at, &update.html);
                true
            }
            None => false,
        }
    }

    pub fn on_leave<M: MapEngine, P: Page>(
        &mut self,
        config: &DashboardConfig,
        map: &mut M,
        page: &mut P,
        layer: &str,
    ) {
        if !self.is_bound(layer) {
            return;
        }

        map.set_filter(
            &config.hover_outline.layer,
            &FilterExpr::nothing(&config.id_property),
        );
        self.state.frames.cancel();
        self.state.hovered = None;
        map.remove_popup(PopupKind::Hover);
        map.set_cursor(None);

        if self.state.selected.is_none() {
            LegendMarker::new(&config.legend).hide(page);
        }
    }

    pub fn on_click<M: MapEngine, P: Page>(
        &mut self,
        config: &DashboardConfig,
        map: &mut M,
        page: &mut P,
        point: ScreenPoint,
        at: LngLat,
    ) -> ClickOutcome {
        if !self.is_installed() {
            return ClickOutcome::Ignored;
        }

        let hit = map.query_features_at(point, &self.bound).into_iter().next();
        match hit {
            Some(feature) => self.select(config, map, page, &feature, at),
            None => {
                self.clear(config, map, page);
                ClickOutcome::Cleared
            }
        }
    }

    fn select<M: MapEngine, P: Page>(
        &mut self,
        config: &DashboardConfig,
        map: &mut M,
        page: &mut P,
        feature: &Feature,
        at: LngLat,
    ) -> ClickOutcome {
        let tract = feature.text(&config.id_property).unwrap_or_default();
        let index_key = config.index_property_for(feature.layer.as_deref());
        let index = feature.number(index_key);
        let details = TractDetails::from_feature(feature, &config.id_property, index_key);

        map.set_filter(
            &config.selected_outline.layer,
            &FilterExpr::matching(&config.id_property, &tract),
        );
        write_details(page, &config.details, &details);
        map.show_popup(PopupKind::Selected, at, &details.selected_html());
        let marker_left = LegendMarker::new(&config.legend).place(page, index);

        log::info!("[Tracker] Selected tract {} (index {})", tract, details.index);
        self.state.selected = Some(tract.clone());
        self.state.last_index = index;

        ClickOutcome::Selected {
            tract,
            index,
            marker_left,
        }
    }

    pub fn clear<M: MapEngine, P: Page>(
        &mut self,
        config: &DashboardConfig,
        map: &mut M,
        page: &mut P,
    ) {
        if let Some(previous) = self.state.selected.take() {
            log::info!("[Tracker] Cleared selection of tract {}", previous);
        }
        self.state.last_index = None;

        map.set_filter(
            &config.selected_outline.layer,
            &FilterExpr::nothing(&config.id_property),
        );
        map.remove_popup(PopupKind::Selected);
        LegendMarker::new(&config.legend).hide(page);
        clear_details(page, &config.details);
    }

    /// Re-measures the legend and moves the marker for the current selection.
    pub fn on_resize<P: Page>(&mut self, config: &DashboardConfig, page: &mut P) -> Option<f64> {
        self.state.selected.as_ref()?;
        LegendMarker::new(&config.legend).place(page, self.state.last_index)
    }
}

fn detail_fields<'a>(ids: &'a DetailIds, d: &'a TractDetails) -> [(&'a str, &'a str); 10] {
    [
        (ids.tract.as_str(), d.tract.as_str()),
        (ids.metro.as_str(), d.metro.as_str()),
        (ids.class.as_str(), d.class.as_str()),
        (ids.index.as_str(), d.index.as_str()),
        (ids.rent.as_str(), d.rent.as_str()),
        (ids.house_value.as_str(), d.house_value.as_str()),
        (ids.income.as_str(), d.income.as_str()),
        (ids.poverty.as_str(), d.poverty.as_str()),
        (ids.bachelor.as_str(), d.bachelor.as_str()),
        (ids.white_collar.as_str(), d.white_collar.as_str()),
    ]
}

fn write_details<P: Page>(page: &mut P, ids: &DetailIds, details: &TractDetails) {
    for (id, text) in detail_fields(ids, details) {
        page.set_text(id, text);
    }
}

fn clear_details<P: Page>(page: &mut P, ids: &DetailIds) {
    let blank = TractDetails {
        tract: PLACEHOLDER.to_string(),
        metro: PLACEHOLDER.to_string(),
        class: PLACEHOLDER.to_string(),
        index: PLACEHOLDER.to_string(),
        rent: PLACEHOLDER.to_string(),
        house_value: PLACEHOLDER.to_string(),
        income: PLACEHOLDER.to_string(),
        poverty: PLACEHOLDER.to_string(),
        bachelor: PLACEHOLDER.to_string(),
        white_collar: PLACEHOLDER.to_string(),
    };
    write_details(page, ids, &blank);
}
