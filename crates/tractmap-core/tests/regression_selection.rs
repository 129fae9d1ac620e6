use serde_json::{json, Map, Value};
use tractmap_core::headless::{HeadlessMap, HeadlessPage, HitArea};
use tractmap_core::tracker::ClickOutcome;
use tractmap_core::{
    Dashboard, DashboardConfig, DashboardEvent, Feature, LngLat, MapEngine, PopupKind, Reaction,
    ScreenPoint, Visibility, PLACEHOLDER,
};

const PERIOD_1970: &str = "gi-fac-1970_2020_temp";
const PERIOD_1990: &str = "gi-fac-1990_2020";

fn tract(layer: &str, geoid: &str, index_key: &str, index: Value) -> Feature {
    let mut props = Map::new();
    props.insert("GEOID".to_string(), json!(geoid));
    props.insert(
        "CBSA_NAME".to_string(),
        json!("Chicago-Naperville-Elgin, IL-IN-WI"),
    );
    props.insert("classtype".to_string(), json!("stable"));
    props.insert(index_key.to_string(), index);
    props.insert("ConRent_mean_2020".to_string(), json!(1320.4));
    props.insert("Poverty_pct_2020".to_string(), json!("9.5"));
    Feature::new(Some(layer), props)
}

fn here() -> ScreenPoint {
    ScreenPoint::new(100.0, 100.0)
}

fn nowhere() -> ScreenPoint {
    ScreenPoint::new(900.0, 900.0)
}

fn at() -> LngLat {
    LngLat::new(-87.63, 41.88)
}

/// Dashboard with the 1990 period visible and one tract under `here()`.
fn mock_dashboard(index: Value) -> Dashboard<HeadlessMap, HeadlessPage> {
    let map = HeadlessMap::new()
        .with_layer(PERIOD_1970, Visibility::Visible)
        .with_layer(PERIOD_1990, Visibility::Visible)
        .with_feature(
            HitArea::around(here(), 5.0),
            tract(PERIOD_1990, "17031081500", "FAC_1990to2020", index),
        );

    let config = DashboardConfig::default();
    let mut page = HeadlessPage::new()
        .with_checkbox("checkbox-period-input", false)
        .with_width("legend-track", 200.0)
        .with_width("legend-marker", 10.0);
    for id in [
        &config.details.tract,
        &config.details.metro,
        &config.details.class,
        &config.details.index,
        &config.details.rent,
        &config.details.house_value,
        &config.details.poverty,
    ] {
        page = page.with_element(id);
    }

    let mut dash = Dashboard::new(config, map, page);
    dash.start();
    dash.handle(DashboardEvent::StyleLoaded);
    dash
}

fn click(dash: &mut Dashboard<HeadlessMap, HeadlessPage>, point: ScreenPoint) -> ClickOutcome {
    match dash.handle(DashboardEvent::MapClick { point, at: at() }) {
        Reaction::Click(outcome) => outcome,
        other => panic!("expected a click outcome, got {:?}", other),
    }
}

fn hover(dash: &mut Dashboard<HeadlessMap, HeadlessPage>, feature: Option<Feature>) -> Reaction {
    dash.handle(DashboardEvent::PointerMove {
        layer: PERIOD_1990.to_string(),
        at: at(),
        feature,
    })
}

fn leave(dash: &mut Dashboard<HeadlessMap, HeadlessPage>) {
    dash.handle(DashboardEvent::PointerLeave {
        layer: PERIOD_1990.to_string(),
    });
}

#[test]
fn test_tracker_binds_both_layers_and_adds_outlines() {
    let dash = mock_dashboard(json!(1.0));
    assert_eq!(dash.tracker().bound_layers().len(), 2);
    assert!(dash.map().has_layer("gi-hover"));
    assert!(dash.map().has_layer("gi-selected"));
    assert!(dash.map().filter("gi-hover").unwrap().matches_nothing());
    assert!(dash.map().filter("gi-selected").unwrap().matches_nothing());
}

#[test]
fn test_click_selects_tract_and_places_marker() {
    let mut dash = mock_dashboard(json!(1.0));

    let outcome = click(&mut dash, here());

    // (1 - -2) / (2 - -2) = 0.75 of a 200px track, minus half of the 10px marker
    assert_eq!(
        outcome,
        ClickOutcome::Selected {
            tract: "17031081500".to_string(),
            index: Some(1.0),
            marker_left: Some(145.0),
        }
    );
    assert_eq!(dash.tracker().selected(), Some("17031081500"));
    assert_eq!(dash.tracker().state().last_index, Some(1.0));
    assert_eq!(dash.page().marker("legend-marker"), Some(145.0));
    assert_eq!(
        dash.map().filter("gi-selected").unwrap().value,
        "17031081500"
    );

    let popup = dash.map().popup(PopupKind::Selected);
    assert!(popup.open);
    assert_eq!(popup.at, Some(at()));
    assert!(popup.html.contains("tract 17031081500"));

    let page = dash.page();
    assert_eq!(page.text("detail-tract"), Some("17031081500"));
    assert_eq!(page.text("detail-metro"), Some("Chicago-Naperville-Elgin"));
    assert_eq!(page.text("detail-class"), Some("Stable"));
    assert_eq!(page.text("detail-index"), Some("1.00"));
    assert_eq!(page.text("detail-rent"), Some("$ 1,320.40"));
    assert_eq!(page.text("detail-house"), Some(PLACEHOLDER));
    assert_eq!(page.text("detail-poverty"), Some("9.50%"));
}

#[test]
fn test_marker_clamps_to_track_ends() {
    let mut dash = mock_dashboard(json!(7.5));
    click(&mut dash, here());
    assert_eq!(dash.page().marker("legend-marker"), Some(195.0));

    let mut dash = mock_dashboard(json!("-40"));
    click(&mut dash, here());
    assert_eq!(dash.page().marker("legend-marker"), Some(-5.0));
}

#[test]
fn test_non_numeric_index_hides_marker_but_still_selects() {
    let mut dash = mock_dashboard(json!("n/a"));
    let outcome = click(&mut dash, here());

    assert!(matches!(outcome, ClickOutcome::Selected { index: None, .. }));
    assert_eq!(dash.tracker().selected(), Some("17031081500"));
    assert_eq!(dash.page().marker("legend-marker"), None);
    assert_eq!(dash.page().text("detail-index"), Some(PLACEHOLDER));
}

#[test]
fn test_click_on_empty_space_clears_selection() {
    let mut dash = mock_dashboard(json!(1.0));
    click(&mut dash, here());
    assert!(dash.tracker().selected().is_some());

    assert_eq!(click(&mut dash, nowhere()), ClickOutcome::Cleared);

    assert_eq!(dash.tracker().selected(), None);
    assert_eq!(dash.tracker().state().last_index, None);
    assert!(dash.map().filter("gi-selected").unwrap().matches_nothing());
    assert!(!dash.map().popup(PopupKind::Selected).open);
    assert_eq!(dash.page().marker("legend-marker"), None);
    assert_eq!(dash.page().text("detail-tract"), Some(PLACEHOLDER));
}

#[test]
fn test_hidden_period_layer_is_not_clickable() {
    let mut dash = mock_dashboard(json!(1.0));
    dash.handle(DashboardEvent::CheckboxChanged {
        input: "checkbox-period-input".to_string(),
        checked: true,
    });

    assert_eq!(click(&mut dash, here()), ClickOutcome::Cleared);
}

#[test]
fn test_leave_hides_marker_only_without_selection() {
    let mut dash = mock_dashboard(json!(1.0));
    let feature = tract(PERIOD_1990, "17031081500", "FAC_1990to2020", json!(1.0));

    // With a selection, the marker stays put
    click(&mut dash, here());
    hover(&mut dash, Some(feature.clone()));
    leave(&mut dash);
    assert_eq!(dash.page().marker("legend-marker"), Some(145.0));

    // Without one, leaving hides it
    click(&mut dash, nowhere());
    dash.page_mut()
        .elements
        .get_mut("legend-marker")
        .unwrap()
        .marker = Some(50.0);
    hover(&mut dash, Some(feature));
    leave(&mut dash);
    assert_eq!(dash.page().marker("legend-marker"), None);
}

#[test]
fn test_hover_outlines_tract_and_leave_resets() {
    let mut dash = mock_dashboard(json!(1.0));
    let feature = tract(PERIOD_1990, "17031081500", "FAC_1990to2020", json!(0.25));

    dash.handle(DashboardEvent::PointerEnter {
        layer: PERIOD_1990.to_string(),
    });
    assert!(dash.map().popup(PopupKind::Hover).open);
    assert_eq!(dash.map().cursor.as_deref(), Some("default"));

    hover(&mut dash, Some(feature));
    assert_eq!(dash.map().filter("gi-hover").unwrap().value, "17031081500");

    leave(&mut dash);
    assert!(dash.map().filter("gi-hover").unwrap().matches_nothing());
    assert!(!dash.map().popup(PopupKind::Hover).open);
    assert_eq!(dash.map().cursor, None);
}

#[test]
fn test_popup_redraws_coalesce_to_latest_move() {
    let mut dash = mock_dashboard(json!(1.0));
    dash.handle(DashboardEvent::PointerEnter {
        layer: PERIOD_1990.to_string(),
    });

    let mut tickets = Vec::new();
    for (i, geoid) in ["1", "2", "3"].iter().enumerate() {
        let feature = tract(PERIOD_1990, geoid, "FAC_1990to2020", json!(i as f64));
        match hover(&mut dash, Some(feature)) {
            Reaction::ScheduleFrame(ticket) => tickets.push(ticket),
            other => panic!("expected a frame request, got {:?}", other),
        }
    }

    // Stale frames fire as no-ops; only the last one draws
    assert!(!dash.run_frame(tickets[0]));
    assert!(!dash.run_frame(tickets[1]));
    assert!(dash.run_frame(tickets[2]));
    assert!(!dash.run_frame(tickets[2]));

    assert_eq!(dash.map().hover_redraws(), 1);
    let popup = dash.map().popup(PopupKind::Hover);
    assert!(popup.html.contains("tract 3"));
    assert!(popup.html.contains("index 2.00"));
    assert_eq!(dash.tracker().state().frames.dropped(), 2);
}

#[test]
fn test_leave_cancels_pending_frame() {
    let mut dash = mock_dashboard(json!(1.0));
    let feature = tract(PERIOD_1990, "1", "FAC_1990to2020", json!(1.0));

    let ticket = match hover(&mut dash, Some(feature)) {
        Reaction::ScheduleFrame(ticket) => ticket,
        other => panic!("expected a frame request, got {:?}", other),
    };
    leave(&mut dash);

    assert!(!dash.run_frame(ticket));
    assert_eq!(dash.map().hover_redraws(), 0);
}

#[test]
fn test_move_without_feature_is_ignored() {
    let mut dash = mock_dashboard(json!(1.0));
    assert_eq!(hover(&mut dash, None), Reaction::None);
    assert!(dash.map().filter("gi-hover").unwrap().matches_nothing());
}

#[test]
fn test_resize_repositions_marker_for_selection() {
    let mut dash = mock_dashboard(json!(0.0));
    click(&mut dash, here());
    assert_eq!(dash.page().marker("legend-marker"), Some(95.0));

    dash.page_mut()
        .elements
        .get_mut("legend-track")
        .unwrap()
        .width = Some(400.0);
    dash.handle(DashboardEvent::Resize);

    assert_eq!(dash.page().marker("legend-marker"), Some(195.0));
}

#[test]
fn test_index_follows_period_layer() {
    let map = HeadlessMap::new()
        .with_layer(PERIOD_1970, Visibility::Visible)
        .with_layer(PERIOD_1990, Visibility::Visible)
        .with_feature(
            HitArea::around(here(), 5.0),
            tract(PERIOD_1970, "42101000100", "FAC_1970to2020", json!(-1.0)),
        );
    let page = HeadlessPage::new().with_checkbox("checkbox-period-input", true);
    let mut dash = Dashboard::new(DashboardConfig::default(), map, page);
    dash.handle(DashboardEvent::StyleLoaded);

    let outcome = click(&mut dash, here());
    assert!(matches!(
        outcome,
        ClickOutcome::Selected { index: Some(i), .. } if i == -1.0
    ));
}

#[test]
fn test_no_period_layers_means_no_tracker() {
    let page = HeadlessPage::new();
    let mut dash = Dashboard::new(DashboardConfig::default(), HeadlessMap::new(), page);
    dash.handle(DashboardEvent::StyleLoaded);

    assert!(!dash.tracker().is_installed());
    assert_eq!(click(&mut dash, here()), ClickOutcome::Ignored);
}

#[test]
fn test_missing_period_layer_keeps_other_bound() {
    let map = HeadlessMap::new()
        .with_layer(PERIOD_1990, Visibility::Visible)
        .with_feature(
            HitArea::around(here(), 5.0),
            tract(PERIOD_1990, "17031081500", "FAC_1990to2020", json!(0.0)),
        );
    let page = HeadlessPage::new()
        .with_checkbox("checkbox-period-input", false)
        .with_element("legend-marker");
    let mut dash = Dashboard::new(DashboardConfig::default(), map, page);
    dash.start();
    dash.handle(DashboardEvent::StyleLoaded);

    assert_eq!(dash.tracker().bound_layers(), [PERIOD_1990.to_string()]);
    assert!(dash.map().has_layer("gi-hover"));

    // 0 sits mid-track on the 240px fallback, minus half the 12px marker
    assert_eq!(
        click(&mut dash, here()),
        ClickOutcome::Selected {
            tract: "17031081500".to_string(),
            index: Some(0.0),
            marker_left: Some(114.0),
        }
    );
    assert_eq!(dash.page().marker("legend-marker"), Some(114.0));
}

#[test]
fn test_style_loaded_twice_installs_once() {
    let mut dash = mock_dashboard(json!(1.0));
    let calls = dash.map().calls.len();
    click(&mut dash, here());
    let after_click = dash.map().calls.len();

    assert_eq!(dash.handle(DashboardEvent::StyleLoaded), Reaction::None);

    assert_eq!(dash.map().calls.len(), after_click);
    assert!(after_click > calls);
    assert!(dash.is_style_loaded());
    assert_eq!(dash.tracker().bound_layers().len(), 2);
    assert_eq!(dash.tracker().selected(), Some("17031081500"));
}
