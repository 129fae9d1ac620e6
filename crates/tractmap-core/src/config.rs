use crate::cities::CityView;
use crate::engine::{CameraTarget, LngLat};
use crate::DashboardError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One checkbox bound to the visibility of one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerToggle {
    pub input_id: String,
    pub layer: String,
}

/// Two layers of which exactly one is visible, switched by a checkbox.
/// Checked shows `checked_layer`, unchecked shows `unchecked_layer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodToggle {
    pub input_id: String,
    pub checked_layer: String,
    pub unchecked_layer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineStyle {
    pub layer: String,
    pub color: String,
    pub width: f64,
}

impl Default for OutlineStyle {
    fn default() -> Self {
        Self {
            layer: "gi-hover".to_string(),
            color: "#314A80".to_string(),
            width: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub min: f64,
    pub max: f64,
    pub track_id: String,
    pub marker_id: String,
    /// Used when the page cannot measure the track.
    pub track_width: f64,
    /// Used when the page cannot measure the marker.
    pub marker_width: f64,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            min: -2.0,
            max: 2.0,
            track_id: "legend-track".to_string(),
            marker_id: "legend-marker".to_string(),
            track_width: 240.0,
            marker_width: 12.0,
        }
    }
}

/// Content block a panel needs before it is wired, tagged with `class`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelBody {
    pub target: String,
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub panel_id: String,
    pub button_id: String,
    pub icon_id: String,
    pub open: bool,
    pub body: Option<PanelBody>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    pub expand_src: String,
    pub collapse_src: String,
    pub collapsed_class: String,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            expand_src: "images/picto-plus.png".to_string(),
            collapse_src: "images/picto-minus.png".to_string(),
            collapsed_class: "is-collapsed".to_string(),
        }
    }
}

/// Element ids of the detail panel fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailIds {
    pub tract: String,
    pub metro: String,
    pub class: String,
    pub index: String,
    pub rent: String,
    pub house_value: String,
    pub income: String,
    pub poverty: String,
    pub bachelor: String,
    pub white_collar: String,
}

impl Default for DetailIds {
    fn default() -> Self {
        Self {
            tract: "detail-tract".to_string(),
            metro: "detail-metro".to_string(),
            class: "detail-class".to_string(),
            index: "detail-index".to_string(),
            rent: "detail-rent".to_string(),
            house_value: "detail-house".to_string(),
            income: "detail-income".to_string(),
            poverty: "detail-poverty".to_string(),
            bachelor: "detail-bach".to_string(),
            white_collar: "detail-white".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropdownConfig {
    pub label_id: String,
    pub label_text_id: String,
    pub menu_id: String,
    pub open_class: String,
    pub ease_duration_ms: u32,
}

impl Default for DropdownConfig {
    fn default() -> Self {
        Self {
            label_id: "dropdown-selected-city".to_string(),
            label_text_id: "dropdown-selected-city .txt-menu".to_string(),
            menu_id: "dropdown-menu-city".to_string(),
            open_class: "open".to_string(),
            ease_duration_ms: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Feature property holding the census tract key.
    pub id_property: String,
    pub period: PeriodToggle,
    /// Index property per period layer; layers not listed use `default_index_property`.
    pub index_properties: HashMap<String, String>,
    pub default_index_property: String,
    pub toggles: Vec<LayerToggle>,
    pub hover_outline: OutlineStyle,
    pub selected_outline: OutlineStyle,
    pub legend: LegendConfig,
    pub details: DetailIds,
    pub panels: Vec<PanelConfig>,
    pub icons: IconConfig,
    pub dropdown: DropdownConfig,
    pub cities: Vec<CityView>,
    /// Delay after window load before looking up the map object.
    pub map_wait_ms: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let mut index_properties = HashMap::new();
        index_properties.insert(
            "gi-fac-1970_2020_temp".to_string(),
            "FAC_1970to2020".to_string(),
        );
        index_properties.insert(
            "gi-fac-1990_2020".to_string(),
            "FAC_1990to2020".to_string(),
        );

        Self {
            id_property: "GEOID".to_string(),
            period: PeriodToggle {
                input_id: "checkbox-period-input".to_string(),
                checked_layer: "gi-fac-1970_2020_temp".to_string(),
                unchecked_layer: "gi-fac-1990_2020".to_string(),
            },
            index_properties,
            default_index_property: "FAC_1990to2020".to_string(),
            toggles: vec![LayerToggle {
                input_id: "checkbox-municipality-input".to_string(),
                layer: "municipality-limits".to_string(),
            }],
            hover_outline: OutlineStyle::default(),
            selected_outline: OutlineStyle {
                layer: "gi-selected".to_string(),
                color: "#E4572E".to_string(),
                width: 3.0,
            },
            legend: LegendConfig::default(),
            details: DetailIds::default(),
            panels: vec![
                PanelConfig {
                    panel_id: "box-1".to_string(),
                    button_id: "dropdown-learn_more".to_string(),
                    icon_id: "dropdown-learn_more img.picto".to_string(),
                    open: true,
                    body: Some(PanelBody {
                        target: "box-1 .wrapper:has(.txt-body)".to_string(),
                        class: "learnmore-collapse".to_string(),
                    }),
                },
                PanelConfig {
                    panel_id: "box-3".to_string(),
                    button_id: "toggle-details".to_string(),
                    icon_id: "toggle-details img.picto".to_string(),
                    open: true,
                    body: None,
                },
            ],
            icons: IconConfig::default(),
            dropdown: DropdownConfig::default(),
            cities: default_cities(),
            map_wait_ms: 1000,
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            panel_id: String::new(),
            button_id: String::new(),
            icon_id: String::new(),
            open: true,
            body: None,
        }
    }
}

fn city(name: &str, lng: f64, lat: f64, zoom: f64) -> CityView {
    CityView {
        name: name.to_string(),
        target: CameraTarget {
            center: LngLat::new(lng, lat),
            zoom,
        },
    }
}

pub fn default_cities() -> Vec<CityView> {
    vec![
        city("New York City", -74.0000, 40.7300, 10.0),
        city("Los Angeles", -118.2437, 34.0522, 10.0),
        city("Chicago", -87.6298, 41.8781, 10.0),
        city("Dallas", -96.7970, 32.7767, 10.0),
        city("Houston", -95.3698, 29.7604, 10.0),
        city("Washington DC", -77.0369, 38.9072, 10.0),
        city("Philadelphia", -75.1652, 39.9526, 10.0),
        city("Atlanta", -84.3880, 33.7490, 10.0),
        city("US", -98.5795, 39.8283, 5.0),
    ]
}

impl DashboardConfig {
    pub fn from_json(content: &str) -> Result<Self, DashboardError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DashboardError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| DashboardError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("[Config] Loading dashboard config from {:?}", path);
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<(), DashboardError> {
        let legend = &self.legend;
        if !(legend.min.is_finite() && legend.max.is_finite() && legend.min < legend.max) {
            return Err(DashboardError::InvalidLegendRange {
                min: legend.min,
                max: legend.max,
            });
        }

        if self.period.checked_layer.is_empty() || self.period.unchecked_layer.is_empty() {
            return Err(DashboardError::InvalidConfig(
                "period layers must be named".to_string(),
            ));
        }
        if self.period.checked_layer == self.period.unchecked_layer {
            return Err(DashboardError::InvalidConfig(format!(
                "period layers must differ (both are '{}')",
                self.period.checked_layer
            )));
        }
        if self.id_property.is_empty() {
            return Err(DashboardError::InvalidConfig(
                "id_property must be set".to_string(),
            ));
        }
        if let Some(toggle) = self.toggles.iter().find(|t| t.layer.is_empty()) {
            return Err(DashboardError::InvalidConfig(format!(
                "toggle '{}' has no layer",
                toggle.input_id
            )));
        }

        Ok(())
    }

    /// Both period layers, in the order they are queried on click.
    pub fn period_layers(&self) -> Vec<String> {
        vec![
            self.period.unchecked_layer.clone(),
            self.period.checked_layer.clone(),
        ]
    }

    pub fn index_property_for(&self, layer: Option<&str>) -> &str {
        layer
            .and_then(|l| self.index_properties.get(l))
            .map(String::as_str)
            .unwrap_or(&self.default_index_property)
    }

    pub fn to_json_pretty(&self) -> Result<String, DashboardError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cities.len(), 9);
        assert_eq!(config.dropdown.ease_duration_ms, 400);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = DashboardConfig::from_json(r#"{ "legend": { "min": 0.0, "max": 10.0 } }"#)
            .unwrap();
        assert_eq!(config.legend.min, 0.0);
        assert_eq!(config.legend.max, 10.0);
        assert_eq!(config.legend.marker_id, "legend-marker");
        assert_eq!(config.id_property, "GEOID");
    }

    #[test]
    fn test_rejects_inverted_legend() {
        let err = DashboardConfig::from_json(r#"{ "legend": { "min": 3.0, "max": 1.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidLegendRange { .. }));
    }

    #[test]
    fn test_rejects_identical_period_layers() {
        let json = r#"{ "period": { "input_id": "p", "checked_layer": "a", "unchecked_layer": "a" } }"#;
        assert!(DashboardConfig::from_json(json).is_err());
    }

    #[test]
    fn test_index_property_lookup() {
        let config = DashboardConfig::default();
        assert_eq!(
            config.index_property_for(Some("gi-fac-1970_2020_temp")),
            "FAC_1970to2020"
        );
        assert_eq!(config.index_property_for(Some("other")), "FAC_1990to2020");
        assert_eq!(config.index_property_for(None), "FAC_1990to2020");
    }
}
