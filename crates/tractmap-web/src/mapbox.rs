//! Bindings to the page's `mapboxgl` global and the `MapEngine` built on them.

use js_sys::{Array, Reflect};
use serde::Serialize;
use serde_json::{json, Value};
use tractmap_core::config::OutlineStyle;
use tractmap_core::{
    CameraTarget, Feature, FilterExpr, LngLat, MapEngine, PopupKind, ScreenPoint, Visibility,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = mapboxgl, js_name = Map)]
    #[derive(Debug, Clone)]
    pub type MapboxMap;

    #[wasm_bindgen(method, js_name = getLayer)]
    fn get_layer(this: &MapboxMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, js_name = setLayoutProperty)]
    fn set_layout_property(this: &MapboxMap, layer: &str, name: &str, value: &JsValue);

    #[wasm_bindgen(method, js_name = setFilter)]
    fn set_filter(this: &MapboxMap, layer: &str, filter: &JsValue);

    #[wasm_bindgen(method, js_name = queryRenderedFeatures)]
    fn query_rendered_features(this: &MapboxMap, point: &JsValue, options: &JsValue) -> Array;

    #[wasm_bindgen(method, js_name = easeTo)]
    fn ease_to(this: &MapboxMap, options: &JsValue);

    #[wasm_bindgen(method, js_name = addLayer)]
    fn add_layer(this: &MapboxMap, layer: &JsValue);

    #[wasm_bindgen(method, js_name = getCanvas)]
    fn get_canvas(this: &MapboxMap) -> web_sys::HtmlElement;

    #[wasm_bindgen(method, js_name = isStyleLoaded)]
    pub fn is_style_loaded(this: &MapboxMap) -> bool;

    #[wasm_bindgen(method)]
    pub fn on(this: &MapboxMap, event: &str, handler: &js_sys::Function);

    #[wasm_bindgen(method)]
    pub fn once(this: &MapboxMap, event: &str, handler: &js_sys::Function);

    #[wasm_bindgen(method, js_name = on)]
    pub fn on_layer(this: &MapboxMap, event: &str, layer: &str, handler: &js_sys::Function);

    #[wasm_bindgen(js_namespace = mapboxgl)]
    #[derive(Debug, Clone)]
    type Popup;

    #[wasm_bindgen(constructor, js_namespace = mapboxgl)]
    fn new(options: &JsValue) -> Popup;

    #[wasm_bindgen(method, js_name = setLngLat)]
    fn set_lng_lat(this: &Popup, at: &JsValue) -> Popup;

    #[wasm_bindgen(method, js_name = setHTML)]
    fn set_html(this: &Popup, html: &str) -> Popup;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &Popup, map: &MapboxMap) -> Popup;

    #[wasm_bindgen(method)]
    fn remove(this: &Popup) -> Popup;

    #[wasm_bindgen(method, js_name = isOpen)]
    fn is_open(this: &Popup) -> bool;
}

/// Plain JSON to a plain JS object (not an ES `Map`).
pub(crate) fn to_js(value: &Value) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}

pub(crate) fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn get_f64(target: &JsValue, key: &str) -> Option<f64> {
    get(target, key).and_then(|v| v.as_f64())
}

/// `e.lngLat` of a map mouse event.
pub(crate) fn event_lng_lat(event: &JsValue) -> Option<LngLat> {
    let at = get(event, "lngLat")?;
    Some(LngLat::new(get_f64(&at, "lng")?, get_f64(&at, "lat")?))
}

/// `e.point` of a map mouse event.
pub(crate) fn event_point(event: &JsValue) -> Option<ScreenPoint> {
    let point = get(event, "point")?;
    Some(ScreenPoint::new(get_f64(&point, "x")?, get_f64(&point, "y")?))
}

/// First of `e.features`, present on layer-scoped events.
pub(crate) fn event_feature(event: &JsValue) -> Option<Feature> {
    let features: Array = get(event, "features")?.dyn_into().ok()?;
    feature_from_js(&features.get(0))
}

pub(crate) fn feature_from_js(value: &JsValue) -> Option<Feature> {
    let props = get(value, "properties")?;
    let properties = serde_wasm_bindgen::from_value(props).ok()?;
    let layer = get(value, "layer")
        .and_then(|l| get(&l, "id"))
        .and_then(|id| id.as_string());
    Some(Feature::new(layer.as_deref(), properties))
}

fn hover_popup_options() -> Value {
    json!({
        "className": "popup-override",
        "closeButton": false,
        "closeOnClick": false,
        "closeOnMove": false,
        "anchor": "left",
        "offset": { "left": [32, 32] }
    })
}

fn selected_popup_options() -> Value {
    json!({
        "className": "popup-selected",
        "closeButton": false,
        "closeOnClick": false
    })
}

struct Attached {
    map: MapboxMap,
    hover: Popup,
    selected: Popup,
}

/// `MapEngine` over a live mapbox-gl map. Built without a map (when
/// `window.map` never showed up) every call is a no-op.
pub struct MapboxEngine {
    inner: Option<Attached>,
}

impl MapboxEngine {
    pub fn new(map: Option<MapboxMap>) -> Self {
        let inner = map.map(|map| Attached {
            map,
            hover: Popup::new(&to_js(&hover_popup_options())),
            selected: Popup::new(&to_js(&selected_popup_options())),
        });
        Self { inner }
    }

    /// Looks up the map the page script left on `window.map`.
    pub fn from_window() -> Option<MapboxMap> {
        let window = web_sys::window()?;
        let map = get(&window, "map")?;
        Some(map.unchecked_into())
    }

    pub fn js_map(&self) -> Option<&MapboxMap> {
        self.inner.as_ref().map(|a| &a.map)
    }

    fn popup(&self, kind: PopupKind) -> Option<(&MapboxMap, &Popup)> {
        self.inner.as_ref().map(|a| {
            let popup = match kind {
                PopupKind::Hover => &a.hover,
                PopupKind::Selected => &a.selected,
            };
            (&a.map, popup)
        })
    }
}

impl MapEngine for MapboxEngine {
    fn is_attached(&self) -> bool {
        self.inner.is_some()
    }

    fn has_layer(&self, layer: &str) -> bool {
        self.js_map().is_some_and(|m| {
            let found = m.get_layer(layer);
            !found.is_undefined() && !found.is_null()
        })
    }

    fn set_layer_visibility(&mut self, layer: &str, visibility: Visibility) {
        if let Some(map) = self.js_map().filter(|_| self.has_layer(layer)) {
            let value = JsValue::from_str(visibility.as_str());
            map.set_layout_property(layer, "visibility", &value);
        }
    }

    fn set_filter(&mut self, layer: &str, filter: &FilterExpr) {
        if let Some(map) = self.js_map().filter(|_| self.has_layer(layer)) {
            map.set_filter(layer, &to_js(&filter.to_expression()));
        }
    }

    fn query_features_at(&self, point: ScreenPoint, layers: &[String]) -> Vec<Feature> {
        let Some(map) = self.js_map() else {
            return Vec::new();
        };
        // mapbox rejects the whole query when one of the layers is missing
        let present: Vec<&String> = layers.iter().filter(|l| self.has_layer(l)).collect();
        if present.is_empty() {
            return Vec::new();
        }

        let options = to_js(&json!({ "layers": present }));
        let point = to_js(&json!([point.x, point.y]));
        map.query_rendered_features(&point, &options)
            .iter()
            .filter_map(|f| feature_from_js(&f))
            .collect()
    }

    fn add_outline_layer(
        &mut self,
        style: &OutlineStyle,
        base_layer: &str,
        filter: &FilterExpr,
    ) -> bool {
        let Some(map) = self.js_map() else {
            return false;
        };
        let base_def = map.get_layer(base_layer);
        let Some(source) = get(&base_def, "source") else {
            return false;
        };

        let mut def = json!({
            "id": style.layer,
            "type": "line",
            "filter": filter.to_expression(),
            "paint": {
                "line-color": style.color,
                "line-width": style.width,
                "line-opacity": 1
            }
        });
        // the source is usually an id, but inline sources come back as objects
        def["source"] = match source.as_string() {
            Some(id) => Value::String(id),
            None => serde_wasm_bindgen::from_value(source).unwrap_or(Value::Null),
        };
        let source_layer = get(&base_def, "source-layer")
            .or_else(|| get(&base_def, "sourceLayer"))
            .and_then(|v| v.as_string());
        if let Some(source_layer) = source_layer {
            def["source-layer"] = Value::String(source_layer);
        }

        map.add_layer(&to_js(&def));
        self.has_layer(&style.layer)
    }

    fn ease_to(&mut self, target: CameraTarget, duration_ms: u32) {
        if let Some(map) = self.js_map() {
            let options = json!({
                "center": [target.center.lng, target.center.lat],
                "zoom": target.zoom,
                "duration": duration_ms
            });
            map.ease_to(&to_js(&options));
        }
    }

    fn open_popup(&mut self, kind: PopupKind) {
        if let Some((map, popup)) = self.popup(kind) {
            if !popup.is_open() {
                popup.add_to(map);
            }
        }
    }

    fn show_popup(&mut self, kind: PopupKind, at: LngLat, html: &str) {
        if let Some((map, popup)) = self.popup(kind) {
            popup.set_lng_lat(&to_js(&json!([at.lng, at.lat])));
            popup.set_html(html);
            if !popup.is_open() {
                popup.add_to(map);
            }
        }
    }

    fn remove_popup(&mut self, kind: PopupKind) {
        if let Some((_, popup)) = self.popup(kind) {
            popup.remove();
        }
    }

    fn is_popup_open(&self, kind: PopupKind) -> bool {
        self.popup(kind).is_some_and(|(_, p)| p.is_open())
    }

    fn set_cursor(&mut self, cursor: Option<&str>) {
        if let Some(map) = self.js_map() {
            let applied = map
                .get_canvas()
                .style()
                .set_property("cursor", cursor.unwrap_or(""));
            if applied.is_err() {
                log::debug!("[Tracker] Could not set map cursor to {:?}", cursor);
            }
        }
    }
}
