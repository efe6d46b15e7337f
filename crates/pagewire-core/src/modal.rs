//! Overlay lifecycle manager.
//!
//! Keeps a registry of named overlays and guarantees that at most one of
//! them is open. Opening shows the overlay, applies the `active` class one
//! frame later (so the enter transition is observed), locks page scrolling
//! and moves focus inside. Closing removes `active` at once and hides the
//! element after the settle delay, when the exit transition has finished.
//!
//! ## Open/closed is logical, not visual
//!
//! `current_open` is cleared synchronously by [`ModalController::close`].
//! During the settle delay [`ModalController::is_open`] already reports
//! the overlay as closed while it is still fading out on screen.
//!
//! ## Deferred work
//!
//! The enter frame and the final hide are scheduled [`Task`]s whose
//! handles are kept per overlay. Every `open`/`close` of an overlay
//! cancels its pending tasks first, so a hide scheduled by an earlier
//! close can never hide an overlay that was reopened in the meantime.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::env::{ElementId, Environment, Task, TaskHandle};
use crate::events::Event;
use crate::storage::ModalConfig;

pub const ACTIVE_CLASS: &str = "active";
pub const BACKDROP_CLASS: &str = "modal-overlay";
pub const OPENER_ATTR: &str = "data-modal";
pub const CLOSER_ATTR: &str = "data-close-modal";

/// Dismiss gestures an overlay accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalOptions {
    pub close_on_overlay_click: bool,
    pub close_on_esc: bool,
}

impl Default for ModalOptions {
    fn default() -> Self {
        Self {
            close_on_overlay_click: true,
            close_on_esc: true,
        }
    }
}

/// Per-registration overrides; `None` keeps the configured default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalOverrides {
    #[serde(default)]
    pub close_on_overlay_click: Option<bool>,
    #[serde(default)]
    pub close_on_esc: Option<bool>,
}

impl ModalOverrides {
    fn apply(self, defaults: ModalOptions) -> ModalOptions {
        ModalOptions {
            close_on_overlay_click: self
                .close_on_overlay_click
                .unwrap_or(defaults.close_on_overlay_click),
            close_on_esc: self.close_on_esc.unwrap_or(defaults.close_on_esc),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalRegistration {
    pub id: String,
    pub element: ElementId,
    pub options: ModalOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalSettings {
    pub settle_delay_ms: u64,
    pub frame_ms: u64,
    pub defaults: ModalOptions,
}

impl From<&ModalConfig> for ModalSettings {
    fn from(cfg: &ModalConfig) -> Self {
        Self {
            settle_delay_ms: cfg.settle_delay_ms,
            frame_ms: cfg.frame_ms,
            defaults: ModalOptions {
                close_on_overlay_click: cfg.close_on_overlay_click,
                close_on_esc: cfg.close_on_esc,
            },
        }
    }
}

impl Default for ModalSettings {
    fn default() -> Self {
        Self::from(&ModalConfig::default())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PendingTasks {
    enter: Option<TaskHandle>,
    hide: Option<TaskHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct ModalController {
    settings: ModalSettings,
    registry: HashMap<String, ModalRegistration>,
    current_open: Option<String>,
    /// `[data-close-modal]` element -> overlay it closes.
    close_triggers: HashMap<ElementId, String>,
    pending: HashMap<String, PendingTasks>,
}

impl ModalController {
    pub fn new(settings: ModalSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Mark every opener as a dialog trigger.
    pub fn install(&self, env: &mut dyn Environment) {
        let openers = env.document().elements_with_attr(OPENER_ATTR);
        for opener in openers {
            env.document_mut().set_attr(opener, "aria-haspopup", "dialog");
        }
    }

    /// Register every `.modal-overlay` carrying an id, with default options.
    /// Returns the ids registered.
    pub fn register_all(&mut self, env: &mut dyn Environment) -> Vec<String> {
        let doc = env.document();
        let ids: Vec<String> = doc
            .elements_with_class(BACKDROP_CLASS)
            .into_iter()
            .filter_map(|el| doc.html_id(el).map(str::to_string))
            .collect();
        ids.into_iter()
            .filter(|id| self.register(env, id, ModalOverrides::default()))
            .collect()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_open(&self, id: &str) -> bool {
        self.current_open.as_deref() == Some(id)
    }

    pub fn current_open(&self) -> Option<&str> {
        self.current_open.as_deref()
    }

    pub fn registration(&self, id: &str) -> Option<&ModalRegistration> {
        self.registry.get(id)
    }

    pub fn registered(&self) -> usize {
        self.registry.len()
    }

    /// Number of close triggers bound to `id`.
    pub fn close_trigger_count(&self, id: &str) -> usize {
        self.close_triggers.values().filter(|m| *m == id).count()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Register the element with html id `id` as an overlay.
    ///
    /// Returns false, leaving the registry untouched, when no such element
    /// exists. Registering again replaces the entry and its close bindings.
    pub fn register(
        &mut self,
        env: &mut dyn Environment,
        id: &str,
        overrides: ModalOverrides,
    ) -> bool {
        let doc = env.document();
        let Some(element) = doc.element_by_id(id) else {
            warn!(modal_id = id, "cannot register overlay: element not found");
            return false;
        };

        self.close_triggers.retain(|_, modal| modal != id);
        for closer in doc.descendants(element) {
            if doc.attr(closer, CLOSER_ATTR).is_some() {
                self.close_triggers.insert(closer, id.to_string());
            }
        }

        let options = overrides.apply(self.settings.defaults);
        self.registry.insert(
            id.to_string(),
            ModalRegistration {
                id: id.to_string(),
                element,
                options,
            },
        );
        debug!(modal_id = id, ?options, "overlay registered");
        true
    }

    /// Open overlay `id`, closing whichever other overlay is open.
    pub fn open(&mut self, env: &mut dyn Environment, id: &str) -> bool {
        let Some(element) = self.registry.get(id).map(|r| r.element) else {
            warn!(modal_id = id, "cannot open unregistered overlay");
            return false;
        };

        if let Some(current) = self.current_open.clone() {
            if current != id {
                self.close(env, &current);
            }
        }

        self.cancel_pending(env, id);
        env.document_mut().set_style(element, "display", "block");
        let enter = env.scheduler_mut().schedule(
            self.settings.frame_ms,
            Task::AddClass {
                element,
                class: ACTIVE_CLASS.to_string(),
            },
        );
        self.pending.entry(id.to_string()).or_default().enter = Some(enter);

        self.current_open = Some(id.to_string());

        let body = env.document().body();
        env.document_mut().set_style(body, "overflow", "hidden");

        self.focus_first_interactive(env, element);

        env.document_mut().dispatch(
            element,
            Event::ModalOpened {
                modal_id: id.to_string(),
                at: Utc::now(),
            },
        );
        debug!(modal_id = id, "overlay opened");
        true
    }

    /// Close overlay `id`. The element is hidden after the settle delay;
    /// the logical state changes immediately.
    pub fn close(&mut self, env: &mut dyn Environment, id: &str) -> bool {
        let Some(element) = self.registry.get(id).map(|r| r.element) else {
            warn!(modal_id = id, "cannot close unregistered overlay");
            return false;
        };

        self.cancel_pending(env, id);
        env.document_mut().remove_class(element, ACTIVE_CLASS);
        let hide = env.scheduler_mut().schedule(
            self.settings.settle_delay_ms,
            Task::SetStyle {
                element,
                property: "display".to_string(),
                value: "none".to_string(),
            },
        );
        self.pending.entry(id.to_string()).or_default().hide = Some(hide);

        if self.current_open.as_deref() == Some(id) {
            self.current_open = None;
        }

        // Another overlay may still hold the lock.
        if self.current_open.is_none() {
            let body = env.document().body();
            env.document_mut().remove_style(body, "overflow");
        }

        env.document_mut().dispatch(
            element,
            Event::ModalClosed {
                modal_id: id.to_string(),
                at: Utc::now(),
            },
        );
        debug!(modal_id = id, "overlay closed");
        true
    }

    pub fn close_current(&mut self, env: &mut dyn Environment) {
        if let Some(current) = self.current_open.clone() {
            self.close(env, &current);
        }
    }

    // ── Global listeners ─────────────────────────────────────────────

    /// Document click handler. Returns true if the click was consumed by
    /// an opener, a close trigger or the backdrop.
    pub fn handle_click(&mut self, env: &mut dyn Environment, target: ElementId) -> bool {
        let doc = env.document();

        let trigger = doc
            .ancestors_inclusive(target)
            .into_iter()
            .find_map(|el| self.close_triggers.get(&el).cloned());
        if let Some(modal_id) = trigger {
            return self.close(env, &modal_id);
        }

        let opener = doc
            .closest_with_attr(target, OPENER_ATTR)
            .and_then(|el| doc.attr(el, OPENER_ATTR))
            .map(str::to_string);
        if let Some(modal_id) = opener {
            return self.open(env, &modal_id);
        }

        if doc.has_class(target, BACKDROP_CLASS) {
            if let Some(current) = self.current_open.clone() {
                let allowed = self
                    .registry
                    .get(&current)
                    .is_some_and(|r| r.options.close_on_overlay_click);
                if allowed {
                    return self.close(env, &current);
                }
            }
        }
        false
    }

    /// Document keydown handler.
    pub fn handle_key(&mut self, env: &mut dyn Environment, key: &str) -> bool {
        if key != "Escape" {
            return false;
        }
        let Some(current) = self.current_open.clone() else {
            return false;
        };
        let allowed = self
            .registry
            .get(&current)
            .is_some_and(|r| r.options.close_on_esc);
        allowed && self.close(env, &current)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn cancel_pending(&mut self, env: &mut dyn Environment, id: &str) {
        if let Some(pending) = self.pending.remove(id) {
            for handle in [pending.enter, pending.hide].into_iter().flatten() {
                env.scheduler_mut().cancel(handle);
            }
        }
    }

    fn focus_first_interactive(&self, env: &mut dyn Environment, element: ElementId) {
        let doc = env.document();
        let first = doc
            .descendants(element)
            .into_iter()
            .find(|el| doc.is_focusable(*el));
        if let Some(first) = first {
            env.document_mut().focus(first);
        }
    }
}
