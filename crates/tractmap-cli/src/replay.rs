use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tractmap_core::frame::FrameTicket;
use tractmap_core::headless::{HeadlessMap, HeadlessPage, HitArea};
use tractmap_core::{Dashboard, DashboardConfig, DashboardEvent, Feature, Reaction, Visibility};

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptLayer {
    pub id: String,
    #[serde(default = "visible")]
    pub visibility: Visibility,
}

fn visible() -> Visibility {
    Visibility::Visible
}

fn one() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptFeature {
    pub area: HitArea,
    pub feature: Feature,
}

/// A recorded session: the initial map and page plus the events to feed in.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub layers: Vec<ScriptLayer>,
    #[serde(default)]
    pub elements: Vec<String>,
    #[serde(default)]
    pub checkboxes: BTreeMap<String, bool>,
    #[serde(default)]
    pub widths: BTreeMap<String, f64>,
    #[serde(default)]
    pub features: Vec<ScriptFeature>,
    /// Events delivered between two animation frames.
    #[serde(default = "one")]
    pub events_per_frame: usize,
    pub events: Vec<DashboardEvent>,
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay script {:?}", path))?;
        serde_json::from_str(&content).context("Failed to parse replay script")
    }

    fn build_map(&self) -> HeadlessMap {
        let mut map = HeadlessMap::new();
        for layer in &self.layers {
            map.add_layer(&layer.id, layer.visibility);
        }
        for hit in &self.features {
            map.add_feature(hit.area.clone(), hit.feature.clone());
        }
        map
    }

    fn build_page(&self) -> HeadlessPage {
        let mut page = HeadlessPage::new();
        for id in &self.elements {
            page = page.with_element(id);
        }
        for (id, checked) in &self.checkboxes {
            page = page.with_checkbox(id, *checked);
        }
        for (id, width) in &self.widths {
            page = page.with_width(id, *width);
        }
        page
    }
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub events: usize,
    pub frames_drawn: usize,
    pub frames_skipped: usize,
    pub selected: Option<String>,
    pub map: HeadlessMap,
    pub page: HeadlessPage,
}

/// Feeds the script through a headless dashboard. `on_step` sees each event
/// and the reaction it produced.
pub fn run<F>(config: DashboardConfig, script: &ReplayScript, mut on_step: F) -> ReplayReport
where
    F: FnMut(usize, &DashboardEvent, &Reaction),
{
    let mut dash = Dashboard::new(config, script.build_map(), script.build_page());
    dash.start();

    let per_frame = script.events_per_frame.max(1);
    let mut scheduled: Option<FrameTicket> = None;
    let mut frames_drawn = 0;
    let mut frames_skipped = 0;

    for (i, event) in script.events.iter().enumerate() {
        // The browser flips the checkbox before the change event fires
        if let DashboardEvent::CheckboxChanged { input, checked } = event {
            dash.page_mut().set_checked(input, *checked);
        }

        let reaction = dash.handle(event.clone());
        if let Reaction::ScheduleFrame(ticket) = &reaction {
            if scheduled.replace(*ticket).is_some() {
                frames_skipped += 1;
            }
        }
        on_step(i, event, &reaction);

        if (i + 1) % per_frame == 0 {
            if let Some(ticket) = scheduled.take() {
                if dash.run_frame(ticket) {
                    frames_drawn += 1;
                }
            }
        }
    }
    if let Some(ticket) = scheduled.take() {
        if dash.run_frame(ticket) {
            frames_drawn += 1;
        }
    }

    ReplayReport {
        events: script.events.len(),
        frames_drawn,
        frames_skipped,
        selected: dash.tracker().selected().map(str::to_string),
        map: dash.map().clone(),
        page: dash.page().clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"{
        "layers": [
            { "id": "gi-fac-1970_2020_temp" },
            { "id": "gi-fac-1990_2020" },
            { "id": "municipality-limits" }
        ],
        "elements": ["legend-marker", "detail-tract"],
        "checkboxes": { "checkbox-period-input": false, "checkbox-municipality-input": false },
        "features": [
            {
                "area": { "min": { "x": 0, "y": 0 }, "max": { "x": 10, "y": 10 } },
                "feature": { "layer": "gi-fac-1990_2020", "properties": { "GEOID": "13121001100", "FAC_1990to2020": 0.4 } }
            }
        ],
        "events_per_frame": 4,
        "events": [
            { "type": "style_loaded" },
            { "type": "pointer_enter", "layer": "gi-fac-1990_2020" },
            { "type": "pointer_move", "layer": "gi-fac-1990_2020", "at": { "lng": -84.39, "lat": 33.75 },
              "feature": { "layer": "gi-fac-1990_2020", "properties": { "GEOID": "13121001100" } } },
            { "type": "pointer_move", "layer": "gi-fac-1990_2020", "at": { "lng": -84.38, "lat": 33.75 },
              "feature": { "layer": "gi-fac-1990_2020", "properties": { "GEOID": "13121001200" } } },
            { "type": "map_click", "point": { "x": 5, "y": 5 }, "at": { "lng": -84.39, "lat": 33.75 } },
            { "type": "checkbox_changed", "input": "checkbox-municipality-input", "checked": true }
        ]
    }"#;

    #[test]
    fn test_replay_session() {
        let script: ReplayScript = serde_json::from_str(SCRIPT).unwrap();
        let mut steps = 0;
        let report = run(DashboardConfig::default(), &script, |_, _, _| steps += 1);

        assert_eq!(steps, 6);
        assert_eq!(report.events, 6);
        assert_eq!(report.frames_drawn, 1);
        assert_eq!(report.frames_skipped, 1);
        assert_eq!(report.selected.as_deref(), Some("13121001100"));
        assert_eq!(report.page.text("detail-tract"), Some("13121001100"));
        assert_eq!(
            report.map.visibility("municipality-limits"),
            Some(Visibility::Visible)
        );
        assert!(report.map.hover_popup.html.contains("13121001200"));
    }

    #[test]
    fn test_load_script_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, SCRIPT).unwrap();

        let script = ReplayScript::load(&path).unwrap();
        assert_eq!(script.layers.len(), 3);
        assert_eq!(script.events_per_frame, 4);

        std::fs::write(&path, r#"{ "layers": [] }"#).unwrap();
        assert!(ReplayScript::load(&path).is_err(), "events are required");
    }
}
