use crate::dom::DomPage;
use crate::mapbox::{self, MapboxEngine, MapboxMap};
use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::render::{request_animation_frame, AnimationFrame};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tractmap_core::frame::FrameTicket;
use tractmap_core::{Dashboard, DashboardConfig, DashboardEvent, Reaction};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, EventTarget, HtmlInputElement};

const CITY_LINK_SELECTOR: &str = ".dropdown-link";

thread_local! {
    static APP: RefCell<Option<Rc<App>>> = RefCell::new(None);
}

/// What a DOM listener does with the event before dispatching.
#[derive(Clone, Copy, PartialEq)]
enum Bubble {
    Continue,
    Stop,
    StopAndPrevent,
}

type MapHandler = Closure<dyn FnMut(JsValue)>;

pub struct App {
    dashboard: RefCell<Dashboard<MapboxEngine, DomPage>>,
    frame: RefCell<Option<AnimationFrame>>,
    listeners: RefCell<Vec<EventListener>>,
    map_handlers: RefCell<Vec<MapHandler>>,
}

impl App {
    /// Builds the dashboard, wires the page, and, when a map is given, the
    /// map. The app stays alive for the lifetime of the page.
    pub fn mount(config: DashboardConfig, map: Option<MapboxMap>) -> Option<Rc<Self>> {
        let document = web_sys::window()?.document()?;
        let has_map = map.is_some();

        let engine = MapboxEngine::new(map);
        let mut dashboard = Dashboard::new(config, engine, DomPage::new(document));
        dashboard.start();

        let app = Rc::new(App {
            dashboard: RefCell::new(dashboard),
            frame: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            map_handlers: RefCell::new(Vec::new()),
        });

        app.install_page_listeners();
        if has_map {
            app.install_map_listeners();
        }

        APP.with(|slot| *slot.borrow_mut() = Some(Rc::clone(&app)));
        Some(app)
    }

    fn dispatch(self: &Rc<Self>, event: DashboardEvent) {
        let reaction = self.dashboard.borrow_mut().handle(event);
        if let Reaction::ScheduleFrame(ticket) = reaction {
            self.schedule(ticket);
        }
    }

    fn schedule(self: &Rc<Self>, ticket: FrameTicket) {
        let app = Rc::downgrade(self);
        let handle = request_animation_frame(move |_| {
            if let Some(app) = app.upgrade() {
                app.dashboard.borrow_mut().run_frame(ticket);
            }
        });
        // dropping the previous handle cancels its frame
        *self.frame.borrow_mut() = Some(handle);
    }

    fn listen<F>(
        self: &Rc<Self>,
        target: &EventTarget,
        kind: &'static str,
        bubble: Bubble,
        make: F,
    ) where
        F: Fn(&Event) -> Option<DashboardEvent> + 'static,
    {
        let app: Weak<Self> = Rc::downgrade(self);
        let options = EventListenerOptions {
            phase: EventListenerPhase::Bubble,
            passive: bubble != Bubble::StopAndPrevent,
        };
        let listener = EventListener::new_with_options(target, kind, options, move |event| {
            match bubble {
                Bubble::Continue => {}
                Bubble::Stop => event.stop_propagation(),
                Bubble::StopAndPrevent => {
                    event.prevent_default();
                    event.stop_propagation();
                }
            }
            let Some(app) = app.upgrade() else {
                return;
            };
            if let Some(next) = make(event) {
                app.dispatch(next);
            }
        });
        self.listeners.borrow_mut().push(listener);
    }

    fn element(&self, id: &str) -> Option<Element> {
        let found = self.dashboard.borrow().page().resolve(id);
        if found.is_none() {
            log::debug!("[Dashboard] No element #{}", id);
        }
        found
    }

    fn install_page_listeners(self: &Rc<Self>) {
        let config = self.dashboard.borrow().config().clone();

        if let Some(label) = self.element(&config.dropdown.label_id) {
            self.listen(&label, "click", Bubble::Stop, |_| {
                Some(DashboardEvent::DropdownToggle)
            });
        }

        if let Some(menu) = self.element(&config.dropdown.menu_id) {
            self.listen(&menu, "click", Bubble::Stop, |_| None);

            if let Ok(links) = menu.query_selector_all(CITY_LINK_SELECTOR) {
                for i in 0..links.length() {
                    let Some(link) = links.item(i).and_then(|n| n.dyn_into::<Element>().ok())
                    else {
                        continue;
                    };
                    let text_of = link.clone();
                    self.listen(&link, "click", Bubble::StopAndPrevent, move |_| {
                        let name = text_of.text_content().unwrap_or_default();
                        Some(DashboardEvent::CityPicked {
                            name: name.trim().to_string(),
                        })
                    });
                }
            }
        }

        let document = self.dashboard.borrow().page().document().clone();
        self.listen(&document, "click", Bubble::Continue, |_| {
            Some(DashboardEvent::DocumentClick)
        });

        let inputs = std::iter::once(config.period.input_id.clone())
            .chain(config.toggles.iter().map(|t| t.input_id.clone()));
        for input_id in inputs {
            let Some(input) = self
                .element(&input_id)
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            else {
                continue;
            };
            let checkbox = input.clone();
            self.listen(&input, "change", Bubble::Continue, move |_| {
                Some(DashboardEvent::CheckboxChanged {
                    input: input_id.clone(),
                    checked: checkbox.checked(),
                })
            });
        }

        for panel in &config.panels {
            if let Some(button) = self.element(&panel.button_id) {
                let button_id = panel.button_id.clone();
                self.listen(&button, "click", Bubble::StopAndPrevent, move |_| {
                    Some(DashboardEvent::PanelToggle {
                        panel: button_id.clone(),
                    })
                });
            }
        }

        if let Some(window) = web_sys::window() {
            self.listen(&window, "resize", Bubble::Continue, |_| {
                Some(DashboardEvent::Resize)
            });
        }
    }

    fn map_handle(&self) -> Option<MapboxMap> {
        self.dashboard.borrow().map().js_map().cloned()
    }

    fn on_map<F>(self: &Rc<Self>, kind: &str, layer: Option<&str>, make: F)
    where
        F: Fn(&JsValue) -> Option<DashboardEvent> + 'static,
    {
        let Some(map) = self.map_handle() else {
            return;
        };
        let app = Rc::downgrade(self);
        let handler: MapHandler = Closure::new(move |event: JsValue| {
            let Some(app) = app.upgrade() else {
                return;
            };
            if let Some(next) = make(&event) {
                app.dispatch(next);
            }
        });
        match layer {
            Some(layer) => map.on_layer(kind, layer, handler.as_ref().unchecked_ref()),
            None => map.on(kind, handler.as_ref().unchecked_ref()),
        }
        self.map_handlers.borrow_mut().push(handler);
    }

    fn install_map_listeners(self: &Rc<Self>) {
        let Some(map) = self.map_handle() else {
            return;
        };

        if map.is_style_loaded() {
            self.style_loaded();
        } else {
            // `load` may already have fired while tiles are still streaming;
            // `idle` follows once they settle
            for kind in ["load", "idle"] {
                let app = Rc::downgrade(self);
                let handler: MapHandler = Closure::new(move |_: JsValue| {
                    if let Some(app) = app.upgrade() {
                        app.style_loaded();
                    }
                });
                map.once(kind, handler.as_ref().unchecked_ref());
                self.map_handlers.borrow_mut().push(handler);
            }
        }

        self.on_map("click", None, |event| {
            Some(DashboardEvent::MapClick {
                point: mapbox::event_point(event)?,
                at: mapbox::event_lng_lat(event)?,
            })
        });
    }

    /// Layer-scoped handlers need the style, so they bind once it has loaded.
    /// Runs at most once however many lifecycle events report it.
    fn style_loaded(self: &Rc<Self>) {
        if self.dashboard.borrow().is_style_loaded() {
            return;
        }
        self.dispatch(DashboardEvent::StyleLoaded);

        let bound = self.dashboard.borrow().tracker().bound_layers().to_vec();
        for layer in bound {
            let id = layer.clone();
            self.on_map("mouseenter", Some(&layer), move |_| {
                Some(DashboardEvent::PointerEnter { layer: id.clone() })
            });
            let id = layer.clone();
            self.on_map("mousemove", Some(&layer), move |event| {
                Some(DashboardEvent::PointerMove {
                    layer: id.clone(),
                    at: mapbox::event_lng_lat(event)?,
                    feature: mapbox::event_feature(event),
                })
            });
            let id = layer.clone();
            self.on_map("mouseleave", Some(&layer), move |_| {
                Some(DashboardEvent::PointerLeave { layer: id.clone() })
            });
        }
    }
}
