use tractmap_core::Page;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlImageElement, HtmlInputElement};

/// `Page` over the live document.
pub struct DomPage {
    document: Document,
}

impl DomPage {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Resolves `"id"` or `"id selector"` to an element.
    pub fn resolve(&self, target: &str) -> Option<Element> {
        match target.split_once(' ') {
            Some((id, selector)) => self
                .document
                .get_element_by_id(id)?
                .query_selector(selector.trim())
                .ok()
                .flatten(),
            None => self.document.get_element_by_id(target),
        }
    }
}

impl Page for DomPage {
    fn set_text(&mut self, id: &str, text: &str) -> bool {
        match self.resolve(id) {
            Some(el) => {
                el.set_text_content(Some(text));
                true
            }
            None => false,
        }
    }

    fn set_class(&mut self, id: &str, class: &str, on: bool) -> bool {
        self.resolve(id)
            .is_some_and(|el| el.class_list().toggle_with_force(class, on).is_ok())
    }

    fn has_class(&self, id: &str, class: &str) -> Option<bool> {
        self.resolve(id).map(|el| el.class_list().contains(class))
    }

    fn set_attribute(&mut self, id: &str, name: &str, value: &str) -> bool {
        self.resolve(id)
            .is_some_and(|el| el.set_attribute(name, value).is_ok())
    }

    fn set_image(&mut self, id: &str, src: &str, alt: &str) -> bool {
        let Some(el) = self.resolve(id) else {
            return false;
        };
        match el.dyn_ref::<HtmlImageElement>() {
            Some(img) => {
                img.set_src(src);
                img.set_alt(alt);
                true
            }
            None => el.set_attribute("src", src).is_ok() && el.set_attribute("alt", alt).is_ok(),
        }
    }

    fn is_checked(&self, id: &str) -> Option<bool> {
        self.resolve(id)?
            .dyn_ref::<HtmlInputElement>()
            .map(|input| input.checked())
    }

    fn element_width(&self, id: &str) -> Option<f64> {
        let width = self.resolve(id)?.get_bounding_client_rect().width();
        (width > 0.0).then_some(width)
    }

    fn set_marker(&mut self, id: &str, left_px: Option<f64>) -> bool {
        let Some(el) = self.resolve(id) else {
            return false;
        };
        let Some(el) = el.dyn_ref::<HtmlElement>() else {
            return false;
        };
        let style = el.style();
        let result = match left_px {
            Some(left) => style
                .set_property("left", &format!("{left}px"))
                .and_then(|_| style.set_property("display", "block")),
            None => style.set_property("display", "none"),
        };
        result.is_ok()
    }
}
