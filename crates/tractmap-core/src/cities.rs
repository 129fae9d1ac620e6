use crate::config::DropdownConfig;
use crate::engine::{CameraTarget, MapEngine, Page};
use crate::DashboardError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityView {
    pub name: String,
    pub target: CameraTarget,
}

/// Dropdown of cities; picking one eases the camera there.
#[derive(Debug, Clone)]
pub struct CitySelector {
    cities: Vec<CityView>,
    config: DropdownConfig,
    open: bool,
    current: Option<String>,
}

impl CitySelector {
    pub fn new(cities: Vec<CityView>, config: DropdownConfig) -> Self {
        Self {
            cities,
            config,
            open: false,
            current: None,
        }
    }

    pub fn cities(&self) -> &[CityView] {
        &self.cities
    }

    pub fn lookup(&self, name: &str) -> Result<&CityView, DashboardError> {
        let name = name.trim();
        self.cities
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| DashboardError::UnknownCity(name.to_string()))
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Click on the dropdown label.
    pub fn toggle<P: Page>(&mut self, page: &mut P) {
        self.set_open(page, !self.open);
    }

    /// Click anywhere outside the menu.
    pub fn close<P: Page>(&mut self, page: &mut P) {
        if self.open {
            self.set_open(page, false);
        }
    }

    fn set_open<P: Page>(&mut self, page: &mut P, open: bool) {
        self.open = open;
        page.set_class(&self.config.menu_id, &self.config.open_class, open);
    }

    /// Eases to the named city, updates the label, and closes the menu.
    /// Unknown names, or no map to move, leave everything unchanged.
    pub fn pick<M: MapEngine, P: Page>(
        &mut self,
        map: &mut M,
        page: &mut P,
        name: &str,
    ) -> Result<CameraTarget, DashboardError> {
        let view = self.lookup(name)?.clone();
        if !map.is_attached() {
            return Err(DashboardError::MapUnavailable(view.name));
        }

        map.ease_to(view.target, self.config.ease_duration_ms);
        page.set_text(&self.config.label_text_id, &view.name);
        log::info!(
            "[Cities] Easing to {} ({:.4}, {:.4}) z{}",
            view.name,
            view.target.center.lng,
            view.target.center.lat,
            view.target.zoom
        );

        self.current = Some(view.name);
        self.set_open(page, false);
        Ok(view.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_cities;
    use crate::headless::{HeadlessMap, HeadlessPage};

    #[test]
    fn test_lookup_trims_and_rejects_unknown() {
        let selector = CitySelector::new(default_cities(), DropdownConfig::default());
        assert_eq!(selector.lookup("  Chicago ").unwrap().target.zoom, 10.0);
        assert!(matches!(
            selector.lookup("Springfield"),
            Err(DashboardError::UnknownCity(_))
        ));
    }

    #[test]
    fn test_us_view() {
        let selector = CitySelector::new(default_cities(), DropdownConfig::default());
        let us = selector.lookup("US").unwrap();
        assert_eq!(us.target.center.lng, -98.5795);
        assert_eq!(us.target.center.lat, 39.8283);
        assert_eq!(us.target.zoom, 5.0);
    }

    #[test]
    fn test_pick_needs_attached_map() {
        let mut selector = CitySelector::new(default_cities(), DropdownConfig::default());
        let mut map = HeadlessMap::new().detached();
        let mut page = HeadlessPage::new();

        assert!(matches!(
            selector.pick(&mut map, &mut page, "Dallas"),
            Err(DashboardError::MapUnavailable(name)) if name == "Dallas"
        ));
        assert!(map.camera.is_none());
    }
}
