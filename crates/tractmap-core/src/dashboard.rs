use crate::cities::CitySelector;
use crate::config::DashboardConfig;
use crate::engine::{CameraTarget, LngLat, MapEngine, Page, ScreenPoint};
use crate::feature::Feature;
use crate::frame::FrameTicket;
use crate::layers::LayerSwitch;
use crate::panels::CollapsiblePanel;
use crate::tracker::{ClickOutcome, HoverTracker};
use serde::{Deserialize, Serialize};

/// Everything the host forwards from the page and the map.
///
/// Clicks inside the city menu or on the dropdown label must not be
/// forwarded as `DocumentClick`; the host stops their propagation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    StyleLoaded,
    CheckboxChanged {
        input: String,
        checked: bool,
    },
    PointerEnter {
        layer: String,
    },
    PointerMove {
        layer: String,
        at: LngLat,
        #[serde(default)]
        feature: Option<Feature>,
    },
    PointerLeave {
        layer: String,
    },
    MapClick {
        point: ScreenPoint,
        at: LngLat,
    },
    DropdownToggle,
    DocumentClick,
    CityPicked {
        name: String,
    },
    /// Either the panel id or its button id.
    PanelToggle {
        panel: String,
    },
    Resize,
}

/// What the host has to do after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    None,
    /// Run the ticket on the next animation frame, cancelling any earlier one.
    ScheduleFrame(FrameTicket),
    Click(ClickOutcome),
    Camera(CameraTarget),
}

pub struct Dashboard<M, P> {
    config: DashboardConfig,
    map: M,
    page: P,
    tracker: HoverTracker,
    cities: CitySelector,
    panels: Vec<CollapsiblePanel>,
    style_loaded: bool,
}

impl<M: MapEngine, P: Page> Dashboard<M, P> {
    pub fn new(config: DashboardConfig, map: M, page: P) -> Self {
        let cities = CitySelector::new(config.cities.clone(), config.dropdown.clone());
        let panels = config
            .panels
            .iter()
            .cloned()
            .map(CollapsiblePanel::new)
            .collect();

        Self {
            config,
            map,
            page,
            tracker: HoverTracker::new(),
            cities,
            panels,
            style_loaded: false,
        }
    }

    /// Writes the initial panel state and matches layers to their checkboxes.
    pub fn start(&mut self) {
        for panel in &mut self.panels {
            panel.attach(&mut self.page, &self.config.icons);
        }
        self.sync_toggles();
    }

    fn sync_toggles(&mut self) {
        for toggle in &self.config.toggles {
            LayerSwitch::sync_toggle(&mut self.map, &self.page, toggle);
        }
    }

    pub fn handle(&mut self, event: DashboardEvent) -> Reaction {
        match event {
            DashboardEvent::StyleLoaded => {
                if self.style_loaded {
                    log::debug!("[Dashboard] Style already loaded");
                    return Reaction::None;
                }
                self.style_loaded = true;
                LayerSwitch::sync_period(&mut self.map, &self.page, &self.config.period);
                self.sync_toggles();
                self.tracker.install(&self.config, &mut self.map);
                Reaction::None
            }
            DashboardEvent::CheckboxChanged { input, checked } => {
                if input == self.config.period.input_id {
                    LayerSwitch::select_period(&mut self.map, &self.config.period, checked);
                } else if let Some(toggle) =
                    self.config.toggles.iter().find(|t| t.input_id == input)
                {
                    LayerSwitch::set_visible(&mut self.map, &toggle.layer, checked);
                } else {
                    log::debug!("[Dashboard] No layer bound to checkbox '{}'", input);
                }
                Reaction::None
            }
            DashboardEvent::PointerEnter { layer } => {
                self.tracker.on_enter(&mut self.map, &layer);
                Reaction::None
            }
            DashboardEvent::PointerMove { layer, at, feature } => self
                .tracker
                .on_move(&self.config, &mut self.map, &layer, at, feature.as_ref())
                .map_or(Reaction::None, Reaction::ScheduleFrame),
            DashboardEvent::PointerLeave { layer } => {
                self.tracker
                    .on_leave(&self.config, &mut self.map, &mut self.page, &layer);
                Reaction::None
            }
            DashboardEvent::MapClick { point, at } => Reaction::Click(self.tracker.on_click(
                &self.config,
                &mut self.map,
                &mut self.page,
                point,
                at,
            )),
            DashboardEvent::DropdownToggle => {
                self.cities.toggle(&mut self.page);
                Reaction::None
            }
            DashboardEvent::DocumentClick => {
                self.cities.close(&mut self.page);
                Reaction::None
            }
            DashboardEvent::CityPicked { name } => {
                match self.cities.pick(&mut self.map, &mut self.page, &name) {
                    Ok(target) => Reaction::Camera(target),
                    Err(e) => {
                        log::warn!("[Cities] {}", e);
                        Reaction::None
                    }
                }
            }
            DashboardEvent::PanelToggle { panel } => {
                match self
                    .panels
                    .iter_mut()
                    .find(|p| p.id() == panel || p.button_id() == panel)
                {
                    Some(p) => p.toggle(&mut self.page, &self.config.icons),
                    None => log::debug!("[Panels] Unknown panel '{}'", panel),
                }
                Reaction::None
            }
            DashboardEvent::Resize => {
                self.tracker.on_resize(&self.config, &mut self.page);
                Reaction::None
            }
        }
    }

    /// Applies the hover popup update queued for `ticket`.
    pub fn run_frame(&mut self, ticket: FrameTicket) -> bool {
        self.tracker.run_frame(&mut self.map, ticket)
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn is_style_loaded(&self) -> bool {
        self.style_loaded
    }

    pub fn tracker(&self) -> &HoverTracker {
        &self.tracker
    }

    pub fn cities(&self) -> &CitySelector {
        &self.cities
    }

    pub fn panels(&self) -> &[CollapsiblePanel] {
        &self.panels
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }
}
