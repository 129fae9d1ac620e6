use tractmap_core::headless::{HeadlessMap, HeadlessPage, MapCall};
use tractmap_core::{Dashboard, DashboardConfig, DashboardEvent, LngLat, Page, Reaction};

const MENU: &str = "dropdown-menu-city";
const LABEL_TEXT: &str = "dropdown-selected-city .txt-menu";

fn mock_dashboard() -> Dashboard<HeadlessMap, HeadlessPage> {
    let page = HeadlessPage::new()
        .with_element(MENU)
        .with_element(LABEL_TEXT);
    Dashboard::new(DashboardConfig::default(), HeadlessMap::new(), page)
}

fn menu_open(dash: &Dashboard<HeadlessMap, HeadlessPage>) -> bool {
    dash.page().has_class(MENU, "open").unwrap()
}

#[test]
fn test_us_view_uses_country_zoom() {
    let mut dash = mock_dashboard();

    let reaction = dash.handle(DashboardEvent::CityPicked {
        name: "US".to_string(),
    });

    let camera = dash.map().camera.expect("camera should have moved");
    assert_eq!(camera.center, LngLat::new(-98.5795, 39.8283));
    assert_eq!(camera.zoom, 5.0);
    assert_eq!(reaction, Reaction::Camera(camera));
    assert!(matches!(
        dash.map().calls.last(),
        Some(MapCall::EaseTo {
            duration_ms: 400,
            ..
        })
    ));
}

#[test]
fn test_pick_updates_label_and_closes_menu() {
    let mut dash = mock_dashboard();
    dash.handle(DashboardEvent::DropdownToggle);
    assert!(menu_open(&dash));

    dash.handle(DashboardEvent::CityPicked {
        name: "Houston".to_string(),
    });

    assert!(!menu_open(&dash));
    assert_eq!(dash.page().text(LABEL_TEXT), Some("Houston"));
    assert_eq!(dash.cities().current(), Some("Houston"));
    assert_eq!(dash.map().camera.unwrap().zoom, 10.0);
}

#[test]
fn test_unknown_city_changes_nothing() {
    let mut dash = mock_dashboard();
    dash.handle(DashboardEvent::DropdownToggle);

    let reaction = dash.handle(DashboardEvent::CityPicked {
        name: "Gotham".to_string(),
    });

    assert_eq!(reaction, Reaction::None);
    assert!(dash.map().camera.is_none());
    assert!(menu_open(&dash));
    assert_eq!(dash.page().text(LABEL_TEXT), Some(""));
}

#[test]
fn test_dropdown_toggles_and_closes_on_outside_click() {
    let mut dash = mock_dashboard();
    assert!(!dash.cities().is_open());

    dash.handle(DashboardEvent::DropdownToggle);
    assert!(menu_open(&dash));
    dash.handle(DashboardEvent::DropdownToggle);
    assert!(!menu_open(&dash));

    dash.handle(DashboardEvent::DropdownToggle);
    dash.handle(DashboardEvent::DocumentClick);
    assert!(!menu_open(&dash));
    assert!(!dash.cities().is_open());
}

#[test]
fn test_pick_without_map_changes_nothing() {
    let page = HeadlessPage::new()
        .with_element(MENU)
        .with_element(LABEL_TEXT);
    let mut dash = Dashboard::new(
        DashboardConfig::default(),
        HeadlessMap::new().detached(),
        page,
    );
    dash.handle(DashboardEvent::DropdownToggle);

    let reaction = dash.handle(DashboardEvent::CityPicked {
        name: "Chicago".to_string(),
    });

    assert_eq!(reaction, Reaction::None);
    assert!(dash.map().camera.is_none());
    assert!(dash.map().calls.is_empty());
    assert_eq!(dash.page().text(LABEL_TEXT), Some(""));
    assert_eq!(dash.cities().current(), None);
    assert!(menu_open(&dash));
}
