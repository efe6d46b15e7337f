//! In-page anchor links that scroll below the fixed header.

use tracing::debug;

use crate::env::{ElementId, Environment};

#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorScroller;

impl AnchorScroller {
    /// Handle a click on (or inside) an `a[href^="#"]`. Returns true when
    /// the page scrolled.
    pub fn handle_click(&self, env: &mut dyn Environment, target: ElementId) -> bool {
        let doc = env.document();
        let Some(link) = doc
            .ancestors_inclusive(target)
            .into_iter()
            .find(|el| doc.tag(*el) == Some("a"))
        else {
            return false;
        };
        let Some(fragment) = doc
            .attr(link, "href")
            .and_then(|href| href.strip_prefix('#'))
            .filter(|f| !f.is_empty())
        else {
            return false;
        };
        let Some(destination) = doc.element_by_id(fragment) else {
            debug!(fragment, "anchor target not found");
            return false;
        };

        let header_height = doc
            .elements_with_class("tilda-header")
            .first()
            .map(|h| doc.bounding_rect(*h).height)
            .unwrap_or(0.0);
        let y = doc.bounding_rect(destination).top + doc.scroll_y() - header_height;
        env.document_mut().scroll_to(y);
        true
    }
}
