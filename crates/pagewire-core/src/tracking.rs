//! Material card interactions and page view counting.

use chrono::Utc;
use tracing::info;

use crate::env::{ElementId, Environment};
use crate::error::StorageError;
use crate::events::Event;

const CARD_CLASS: &str = "material-card";

#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialsTracker;

impl MaterialsTracker {
    /// Record a click on a material card. Navigation is left to the link.
    pub fn handle_click(&self, env: &mut dyn Environment, target: ElementId) -> bool {
        let doc = env.document();
        let Some(card) = doc.closest_with_class(target, CARD_CLASS) else {
            return false;
        };
        let href = doc.attr(card, "href").map(str::to_string);
        info!(href = href.as_deref().unwrap_or(""), "material opened");
        env.document_mut().dispatch(
            card,
            Event::MaterialClicked {
                href,
                at: Utc::now(),
            },
        );
        true
    }

    pub fn handle_mouse_enter(&self, env: &mut dyn Environment, target: ElementId) {
        if env.document().has_class(target, CARD_CLASS) {
            let doc = env.document_mut();
            doc.set_style(target, "transform", "translateY(-5px)");
            doc.set_style(target, "box-shadow", "0 8px 25px rgba(0,0,0,0.15)");
        }
    }

    pub fn handle_mouse_leave(&self, env: &mut dyn Environment, target: ElementId) {
        if env.document().has_class(target, CARD_CLASS) {
            let doc = env.document_mut();
            doc.set_style(target, "transform", "translateY(0)");
            doc.set_style(target, "box-shadow", "0 4px 12px rgba(0,0,0,0.08)");
        }
    }
}

/// Per-page view counter kept in the key-value store.
#[derive(Debug, Clone)]
pub struct PageViewCounter {
    page: String,
}

impl PageViewCounter {
    pub fn new(page: impl Into<String>) -> Self {
        Self { page: page.into() }
    }

    pub fn key(&self) -> String {
        format!("views:{}", self.page)
    }

    pub fn count(&self, env: &mut dyn Environment) -> Result<u64, StorageError> {
        let key = self.key();
        match env.store_mut().kv_get(&key)? {
            Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                StorageError::CorruptValue {
                    key,
                    message: e.to_string(),
                }
            }),
            None => Ok(0),
        }
    }

    /// Count one more view and announce it on `<body>`.
    pub fn record(&self, env: &mut dyn Environment) -> Result<u64, StorageError> {
        let count = self.count(env)? + 1;
        env.store_mut().kv_set(&self.key(), &count.to_string())?;
        let body = env.document().body();
        env.document_mut().dispatch(
            body,
            Event::PageViewed {
                page: self.page.clone(),
                count,
                at: Utc::now(),
            },
        );
        info!(page = %self.page, count, "page viewed");
        Ok(count)
    }
}
