//! In-memory map and page used by the replay tool and the tests.

use crate::config::OutlineStyle;
use crate::engine::{
    CameraTarget, FilterExpr, LngLat, MapEngine, Page, PopupKind, ScreenPoint, Visibility,
};
use crate::feature::Feature;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitArea {
    pub min: ScreenPoint,
    pub max: ScreenPoint,
}

impl HitArea {
    pub fn around(center: ScreenPoint, radius: f64) -> Self {
        Self {
            min: ScreenPoint::new(center.x - radius, center.y - radius),
            max: ScreenPoint::new(center.x + radius, center.y + radius),
        }
    }

    pub fn contains(&self, p: ScreenPoint) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerState {
    pub visibility: Visibility,
    pub filter: Option<FilterExpr>,
    /// Set for outline layers added at runtime.
    pub outline: Option<OutlineStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PopupState {
    pub open: bool,
    pub at: Option<LngLat>,
    pub html: String,
}

/// One call made on the headless map, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum MapCall {
    SetVisibility { layer: String, visibility: Visibility },
    SetFilter { layer: String, expression: serde_json::Value },
    AddLayer { layer: String, source_layer: String },
    EaseTo { target: CameraTarget, duration_ms: u32 },
    OpenPopup { kind: PopupKind },
    ShowPopup { kind: PopupKind, at: LngLat },
    RemovePopup { kind: PopupKind },
    Cursor { cursor: Option<String> },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HeadlessMap {
    pub layers: BTreeMap<String, LayerState>,
    #[serde(skip)]
    hits: Vec<(HitArea, Feature)>,
    pub camera: Option<CameraTarget>,
    pub hover_popup: PopupState,
    pub selected_popup: PopupState,
    pub cursor: Option<String>,
    pub calls: Vec<MapCall>,
    /// Stands in for a page where the map object never appeared.
    pub detached: bool,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    pub fn with_layer(mut self, id: &str, visibility: Visibility) -> Self {
        self.add_layer(id, visibility);
        self
    }

    pub fn add_layer(&mut self, id: &str, visibility: Visibility) {
        self.layers.insert(
            id.to_string(),
            LayerState {
                visibility,
                filter: None,
                outline: None,
            },
        );
    }

    /// Renders `feature` under `area`. The feature must name its layer to be
    /// found by `query_features_at`.
    pub fn with_feature(mut self, area: HitArea, feature: Feature) -> Self {
        self.add_feature(area, feature);
        self
    }

    pub fn add_feature(&mut self, area: HitArea, feature: Feature) {
        self.hits.push((area, feature));
    }

    pub fn visibility(&self, layer: &str) -> Option<Visibility> {
        self.layers.get(layer).map(|l| l.visibility)
    }

    pub fn filter(&self, layer: &str) -> Option<&FilterExpr> {
        self.layers.get(layer).and_then(|l| l.filter.as_ref())
    }

    pub fn popup(&self, kind: PopupKind) -> &PopupState {
        match kind {
            PopupKind::Hover => &self.hover_popup,
            PopupKind::Selected => &self.selected_popup,
        }
    }

    fn popup_mut(&mut self, kind: PopupKind) -> &mut PopupState {
        match kind {
            PopupKind::Hover => &mut self.hover_popup,
            PopupKind::Selected => &mut self.selected_popup,
        }
    }

    /// Number of hover popup redraws performed so far.
    pub fn hover_redraws(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, MapCall::ShowPopup { kind: PopupKind::Hover, .. }))
            .count()
    }
}

impl MapEngine for HeadlessMap {
    fn is_attached(&self) -> bool {
        !self.detached
    }

    fn has_layer(&self, layer: &str) -> bool {
        self.layers.contains_key(layer)
    }

    fn set_layer_visibility(&mut self, layer: &str, visibility: Visibility) {
        if let Some(state) = self.layers.get_mut(layer) {
            state.visibility = visibility;
            self.calls.push(MapCall::SetVisibility {
                layer: layer.to_string(),
                visibility,
            });
        }
    }

    fn set_filter(&mut self, layer: &str, filter: &FilterExpr) {
        if let Some(state) = self.layers.get_mut(layer) {
            state.filter = Some(filter.clone());
            self.calls.push(MapCall::SetFilter {
                layer: layer.to_string(),
                expression: filter.to_expression(),
            });
        }
    }

    fn query_features_at(&self, point: ScreenPoint, layers: &[String]) -> Vec<Feature> {
        self.hits
            .iter()
            .rev()
            .filter(|(area, _)| area.contains(point))
            .filter(|(_, feature)| {
                feature.layer.as_ref().is_some_and(|l| {
                    layers.contains(l) && self.visibility(l) == Some(Visibility::Visible)
                })
            })
            .map(|(_, feature)| feature.clone())
            .collect()
    }

    fn add_outline_layer(
        &mut self,
        style: &OutlineStyle,
        base_layer: &str,
        filter: &FilterExpr,
    ) -> bool {
        if !self.has_layer(base_layer) {
            return false;
        }
        self.layers.insert(
            style.layer.clone(),
            LayerState {
                visibility: Visibility::Visible,
                filter: Some(filter.clone()),
                outline: Some(style.clone()),
            },
        );
        self.calls.push(MapCall::AddLayer {
            layer: style.layer.clone(),
            source_layer: base_layer.to_string(),
        });
        true
    }

    fn ease_to(&mut self, target: CameraTarget, duration_ms: u32) {
        self.camera = Some(target);
        self.calls.push(MapCall::EaseTo {
            target,
            duration_ms,
        });
    }

    fn open_popup(&mut self, kind: PopupKind) {
        let popup = self.popup_mut(kind);
        if popup.open {
            return;
        }
        popup.open = true;
        self.calls.push(MapCall::OpenPopup { kind });
    }

    fn show_popup(&mut self, kind: PopupKind, at: LngLat, html: &str) {
        let popup = self.popup_mut(kind);
        popup.open = true;
        popup.at = Some(at);
        popup.html = html.to_string();
        self.calls.push(MapCall::ShowPopup { kind, at });
    }

    fn remove_popup(&mut self, kind: PopupKind) {
        *self.popup_mut(kind) = PopupState::default();
        self.calls.push(MapCall::RemovePopup { kind });
    }

    fn is_popup_open(&self, kind: PopupKind) -> bool {
        self.popup(kind).open
    }

    fn set_cursor(&mut self, cursor: Option<&str>) {
        self.cursor = cursor.map(str::to_string);
        self.calls.push(MapCall::Cursor {
            cursor: self.cursor.clone(),
        });
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Element {
    pub text: String,
    pub classes: BTreeSet<String>,
    pub attributes: BTreeMap<String, String>,
    pub checked: Option<bool>,
    pub width: Option<f64>,
    /// Left offset while shown; `None` while hidden.
    pub marker: Option<f64>,
}

/// Page made of named elements. Targets are looked up verbatim, so a
/// descendant target such as `"box-1 img.picto"` is its own element here.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HeadlessPage {
    pub elements: BTreeMap<String, Element>,
}

impl HeadlessPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(mut self, id: &str) -> Self {
        self.elements.entry(id.to_string()).or_default();
        self
    }

    pub fn with_checkbox(mut self, id: &str, checked: bool) -> Self {
        self.elements.entry(id.to_string()).or_default().checked = Some(checked);
        self
    }

    pub fn with_width(mut self, id: &str, width: f64) -> Self {
        self.elements.entry(id.to_string()).or_default().width = Some(width);
        self
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|e| e.text.as_str())
    }

    pub fn attribute(&self, id: &str, name: &str) -> Option<&str> {
        self.elements
            .get(id)
            .and_then(|e| e.attributes.get(name))
            .map(String::as_str)
    }

    pub fn marker(&self, id: &str) -> Option<f64> {
        self.elements.get(id).and_then(|e| e.marker)
    }

    /// Simulates the user ticking a checkbox. Returns `false` if absent.
    pub fn set_checked(&mut self, id: &str, checked: bool) -> bool {
        match self.elements.get_mut(id) {
            Some(e) => {
                e.checked = Some(checked);
                true
            }
            None => false,
        }
    }
}

impl Page for HeadlessPage {
    fn set_text(&mut self, id: &str, text: &str) -> bool {
        match self.elements.get_mut(id) {
            Some(e) => {
                e.text = text.to_string();
                true
            }
            None => false,
        }
    }

    fn set_class(&mut self, id: &str, class: &str, on: bool) -> bool {
        match self.elements.get_mut(id) {
            Some(e) => {
                if on {
                    e.classes.insert(class.to_string());
                } else {
                    e.classes.remove(class);
                }
                true
            }
            None => false,
        }
    }

    fn has_class(&self, id: &str, class: &str) -> Option<bool> {
        self.elements.get(id).map(|e| e.classes.contains(class))
    }

    fn set_attribute(&mut self, id: &str, name: &str, value: &str) -> bool {
        match self.elements.get_mut(id) {
            Some(e) => {
                e.attributes.insert(name.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    fn set_image(&mut self, id: &str, src: &str, alt: &str) -> bool {
        match self.elements.get_mut(id) {
            Some(e) => {
                e.attributes.insert("src".to_string(), src.to_string());
                e.attributes.insert("alt".to_string(), alt.to_string());
                true
            }
            None => false,
        }
    }

    fn is_checked(&self, id: &str) -> Option<bool> {
        self.elements.get(id).and_then(|e| e.checked)
    }

    fn element_width(&self, id: &str) -> Option<f64> {
        self.elements.get(id).and_then(|e| e.width)
    }

    fn set_marker(&mut self, id: &str, left_px: Option<f64>) -> bool {
        match self.elements.get_mut(id) {
            Some(e) => {
                e.marker = left_px;
                true
            }
            None => false,
        }
    }
}
