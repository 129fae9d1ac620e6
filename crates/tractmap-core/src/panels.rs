use crate::config::{IconConfig, PanelConfig};
use crate::engine::Page;

/// An informational box that collapses behind a button.
#[derive(Debug, Clone)]
pub struct CollapsiblePanel {
    config: PanelConfig,
    open: bool,
    wired: bool,
}

impl CollapsiblePanel {
    pub fn new(config: PanelConfig) -> Self {
        let open = config.open;
        Self {
            config,
            open,
            wired: true,
        }
    }

    /// Marks the panel body and writes the initial state. A panel whose
    /// required body is missing stays unwired and ignores toggles.
    pub fn attach<P: Page>(&mut self, page: &mut P, icons: &IconConfig) -> bool {
        if let Some(body) = &self.config.body {
            if !page.set_class(&body.target, &body.class, true) {
                log::debug!(
                    "[Panels] Panel '{}' has no body '{}', not wired",
                    self.config.panel_id,
                    body.target
                );
                self.wired = false;
                return false;
            }
        }
        self.wired = true;
        let open = self.open;
        self.set_open(page, icons, open);
        true
    }

    pub fn is_wired(&self) -> bool {
        self.wired
    }

    pub fn id(&self) -> &str {
        &self.config.panel_id
    }

    pub fn button_id(&self) -> &str {
        &self.config.button_id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle<P: Page>(&mut self, page: &mut P, icons: &IconConfig) {
        if !self.wired {
            return;
        }
        self.set_open(page, icons, !self.open);
    }

    /// Writes the open flag to the page: collapsed class, icon, `aria-expanded`.
    pub fn set_open<P: Page>(&mut self, page: &mut P, icons: &IconConfig, open: bool) {
        self.open = open;

        if !page.set_class(&self.config.panel_id, &icons.collapsed_class, !open) {
            log::debug!("[Panels] Panel '{}' not found", self.config.panel_id);
        }

        let (src, alt) = if open {
            (icons.collapse_src.as_str(), "Collapse")
        } else {
            (icons.expand_src.as_str(), "Expand")
        };
        page.set_image(&self.config.icon_id, src, alt);
        page.set_attribute(
            &self.config.button_id,
            "aria-expanded",
            if open { "true" } else { "false" },
        );
    }
}
