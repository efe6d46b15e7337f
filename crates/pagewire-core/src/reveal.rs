//! Scroll-triggered reveal animations and the intro sequence.
//!
//! Observed elements get the `visible` class the first time enough of
//! them enters the viewport; CSS does the rest. The check is re-run by the
//! page on install, scroll and resize.

use chrono::Utc;
use tracing::debug;

use crate::env::{Document, ElementId, Environment, Task};
use crate::events::Event;
use crate::storage::{IntroConfig, RevealConfig};

pub const VISIBLE_CLASS: &str = "visible";

const OBSERVED_CLASSES: &[&str] = &[
    "hero-element",
    "fade-in-element",
    "slide-in-left",
    "slide-in-right",
    "scale-in",
    "stagger-element",
    "fade-in",
    "main-content",
];

/// Page sections that fade in one after another.
const SECTION_CLASSES: &[&str] = &[
    "disclaimer",
    "welcome-section",
    "burnout-info",
    "test-section",
    "footer-section",
];

#[derive(Debug, Clone)]
pub struct RevealObserver {
    config: RevealConfig,
    observed: Vec<ElementId>,
}

impl RevealObserver {
    pub fn new(config: RevealConfig) -> Self {
        Self {
            config,
            observed: Vec::new(),
        }
    }

    pub fn observed(&self) -> &[ElementId] {
        &self.observed
    }

    /// Tag the page sections, start observing and run a first check.
    pub fn install(&mut self, env: &mut dyn Environment) {
        let sections = sections_in_order(env.document());
        for (index, section) in sections.into_iter().enumerate() {
            let doc = env.document_mut();
            doc.add_class(section, "fade-in");
            doc.set_style(
                section,
                "transition-delay",
                &format!("{}s", index as f64 * 0.1),
            );
        }

        let doc = env.document();
        let mut observed: Vec<ElementId> = OBSERVED_CLASSES
            .iter()
            .flat_map(|class| doc.elements_with_class(class))
            .filter(|el| !doc.has_class(*el, VISIBLE_CLASS))
            .collect();
        observed.sort();
        observed.dedup();
        self.observed = observed;
        debug!(observed = self.observed.len(), "reveal observer installed");

        self.check(env);
    }

    /// Reveal every observed element that now intersects the viewport.
    pub fn check(&mut self, env: &mut dyn Environment) {
        let threshold = self.config.threshold;
        let margin = self.config.root_margin_bottom_px;
        let doc = env.document();
        let root_bottom = doc.viewport().height + margin;
        let due: Vec<ElementId> = self
            .observed
            .iter()
            .copied()
            .filter(|el| intersects(doc, *el, root_bottom, threshold))
            .collect();

        for element in due {
            self.reveal(env, element);
        }
    }

    /// Reveal `element` if its top edge is inside the viewport.
    pub fn reveal_if_in_viewport(&mut self, env: &mut dyn Environment, element: ElementId) {
        let doc = env.document();
        if doc.bounding_rect(element).top < doc.viewport().height {
            self.reveal(env, element);
        }
    }

    /// After the load delay, reveal the `.fade-in` elements already on
    /// screen one by one.
    pub fn schedule_load_cascade(&self, env: &mut dyn Environment) {
        let faders = env.document().elements_with_class("fade-in");
        for (index, element) in faders.into_iter().enumerate() {
            let delay = self.config.load_delay_ms + index as u64 * self.config.stagger_ms;
            env.scheduler_mut()
                .schedule(delay, Task::RevealIfInViewport { element });
        }
    }

    fn reveal(&mut self, env: &mut dyn Environment, element: ElementId) {
        self.observed.retain(|el| *el != element);
        if env.document().has_class(element, VISIBLE_CLASS) {
            return;
        }

        let stagger = {
            let doc = env.document();
            if doc.has_class(element, "stagger-element") {
                doc.parent(element)
                    .and_then(|p| doc.children(p).iter().position(|c| *c == element))
                    .map(|index| index as u64 * self.config.stagger_ms)
            } else {
                None
            }
        };

        let doc = env.document_mut();
        doc.add_class(element, VISIBLE_CLASS);
        if let Some(delay) = stagger {
            doc.set_style(element, "transition-delay", &format!("{delay}ms"));
        }
        doc.dispatch(
            element,
            Event::ElementRevealed {
                element,
                at: Utc::now(),
            },
        );
    }
}

/// Header fade-in and hero title animation.
pub fn schedule_intro(env: &mut dyn Environment, intro: &IntroConfig) {
    let doc = env.document();
    let header = doc.elements_with_class("tilda-header").first().copied();
    let title = doc.elements_with_class("hero-title").first().copied();

    if let Some(element) = header {
        env.scheduler_mut().schedule(
            intro.header_delay_ms,
            Task::AddClass {
                element,
                class: VISIBLE_CLASS.to_string(),
            },
        );
    }
    if let Some(element) = title {
        env.scheduler_mut().schedule(
            intro.title_delay_ms,
            Task::AddClass {
                element,
                class: "fire-animation".to_string(),
            },
        );
    }
}

fn sections_in_order(doc: &dyn Document) -> Vec<ElementId> {
    let mut sections: Vec<ElementId> = SECTION_CLASSES
        .iter()
        .flat_map(|class| doc.elements_with_class(class))
        .collect();
    sections.sort();
    sections.dedup();
    sections
}

/// Visible fraction of `element` inside `[0, root_bottom)` reaches
/// `threshold`. Zero-height elements count when their top is inside.
fn intersects(doc: &dyn Document, element: ElementId, root_bottom: f64, threshold: f64) -> bool {
    let rect = doc.bounding_rect(element);
    if rect.height <= 0.0 {
        return rect.top >= 0.0 && rect.top < root_bottom;
    }
    let visible = rect.bottom().min(root_bottom) - rect.top.max(0.0);
    if visible <= 0.0 {
        return false;
    }
    visible / rect.height >= threshold
}
