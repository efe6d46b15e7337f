//! Document surface and its in-memory implementation.
//!
//! [`MemoryDocument`] is a small element tree: tag, id, classes,
//! attributes, inline style, text and a vertical box. It is built from a
//! [`PageSpec`] (usually parsed from JSON) and records every dispatched
//! [`Event`] so callers can observe what the controllers announced.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::MarkupError;
use crate::events::Event;

/// Opaque handle to an element of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub usize);

/// Vertical box of an element. `top` is relative to the document when
/// stored and relative to the viewport when returned by
/// [`Document::bounding_rect`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

/// DOM query and mutation surface used by every controller.
///
/// Query methods return elements in document order. Mutations on a handle
/// that does not belong to the document are ignored.
pub trait Document {
    fn body(&self) -> ElementId;
    fn element_by_id(&self, id: &str) -> Option<ElementId>;
    fn elements_with_class(&self, class: &str) -> Vec<ElementId>;
    fn elements_with_attr(&self, name: &str) -> Vec<ElementId>;
    /// Every element below `element`, excluding `element` itself.
    fn descendants(&self, element: ElementId) -> Vec<ElementId>;
    fn parent(&self, element: ElementId) -> Option<ElementId>;
    fn children(&self, element: ElementId) -> Vec<ElementId>;

    fn tag(&self, element: ElementId) -> Option<&str>;
    fn html_id(&self, element: ElementId) -> Option<&str>;

    fn has_class(&self, element: ElementId, class: &str) -> bool;
    fn add_class(&mut self, element: ElementId, class: &str);
    fn remove_class(&mut self, element: ElementId, class: &str);

    fn attr(&self, element: ElementId, name: &str) -> Option<&str>;
    fn set_attr(&mut self, element: ElementId, name: &str, value: &str);

    fn style(&self, element: ElementId, property: &str) -> Option<&str>;
    fn set_style(&mut self, element: ElementId, property: &str, value: &str);
    /// Clear an inline style property (`el.style.prop = ''`).
    fn remove_style(&mut self, element: ElementId, property: &str);

    fn text(&self, element: ElementId) -> Option<&str>;
    fn set_text(&mut self, element: ElementId, text: &str);

    fn focus(&mut self, element: ElementId);
    fn focused(&self) -> Option<ElementId>;

    /// Box relative to the current viewport.
    fn bounding_rect(&self, element: ElementId) -> Rect;
    fn viewport(&self) -> Viewport;
    fn set_viewport(&mut self, viewport: Viewport);
    fn scroll_y(&self) -> f64;
    fn scroll_to(&mut self, y: f64);

    /// Fire `event` at `element`.
    fn dispatch(&mut self, element: ElementId, event: Event);

    /// Nearest inclusive ancestor carrying `class`.
    fn closest_with_class(&self, element: ElementId, class: &str) -> Option<ElementId> {
        self.ancestors_inclusive(element)
            .into_iter()
            .find(|el| self.has_class(*el, class))
    }

    /// Nearest inclusive ancestor carrying attribute `name`.
    fn closest_with_attr(&self, element: ElementId, name: &str) -> Option<ElementId> {
        self.ancestors_inclusive(element)
            .into_iter()
            .find(|el| self.attr(*el, name).is_some())
    }

    fn ancestors_inclusive(&self, element: ElementId) -> Vec<ElementId> {
        let mut chain = Vec::new();
        if self.tag(element).is_none() {
            return chain;
        }
        let mut current = Some(element);
        while let Some(el) = current {
            chain.push(el);
            current = self.parent(el);
        }
        chain
    }

    /// Matches `button, [href], input, select, textarea, [tabindex]:not([tabindex="-1"])`.
    fn is_focusable(&self, element: ElementId) -> bool {
        let by_tag = matches!(
            self.tag(element),
            Some("button" | "input" | "select" | "textarea")
        );
        let by_href = self.attr(element, "href").is_some();
        let by_tabindex = self
            .attr(element, "tabindex")
            .is_some_and(|t| t.trim() != "-1");
        by_tag || by_href || by_tabindex
    }
}

/// Declarative element used to build a [`MemoryDocument`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub style: BTreeMap<String, String>,
    #[serde(default)]
    pub text: String,
    /// Document-relative top edge in pixels.
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn style(mut self, property: &str, value: &str) -> Self {
        self.style.insert(property.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn at(mut self, top: f64, height: f64) -> Self {
        self.top = top;
        self.height = height;
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// A whole page: viewport plus the children of `<body>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub body: Vec<ElementSpec>,
}

impl PageSpec {
    pub fn new(body: Vec<ElementSpec>) -> Self {
        Self {
            viewport: Viewport::default(),
            body,
        }
    }
}

/// Event record kept by [`MemoryDocument`].
#[derive(Debug, Clone, Serialize)]
pub struct DispatchedEvent {
    pub target: ElementId,
    pub target_id: Option<String>,
    pub event: Event,
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    html_id: Option<String>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    text: String,
    rect: Rect,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Node {
    fn from_spec(spec: &ElementSpec, parent: Option<ElementId>) -> Self {
        Self {
            tag: spec.tag.to_ascii_lowercase(),
            html_id: spec.id.clone(),
            classes: Vec::new(),
            attrs: spec.attrs.clone(),
            style: spec.style.clone(),
            text: spec.text.clone(),
            rect: Rect {
                top: spec.top,
                height: spec.height,
            },
            parent,
            children: Vec::new(),
        }
    }
}

/// In-memory document used headlessly.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<Node>,
    ids: HashMap<String, ElementId>,
    viewport: Viewport,
    scroll_y: f64,
    focused: Option<ElementId>,
    dispatched: Vec<DispatchedEvent>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl MemoryDocument {
    /// Empty document containing only `<body>`.
    pub fn new(viewport: Viewport) -> Self {
        let body = Node::from_spec(&ElementSpec::new("body"), None);
        Self {
            nodes: vec![body],
            ids: HashMap::new(),
            viewport,
            scroll_y: 0.0,
            focused: None,
            dispatched: Vec::new(),
        }
    }

    pub fn from_spec(spec: &PageSpec) -> Result<Self, MarkupError> {
        let mut doc = Self::new(spec.viewport);
        let body = doc.body();
        for child in &spec.body {
            doc.append(body, child)?;
        }
        Ok(doc)
    }

    pub fn from_json(json: &str) -> Result<Self, MarkupError> {
        let spec: PageSpec =
            serde_json::from_str(json).map_err(|e| MarkupError::ParseFailed(e.to_string()))?;
        Self::from_spec(&spec)
    }

    /// Append `spec` (and its subtree) as the last child of `parent`.
    pub fn append(&mut self, parent: ElementId, spec: &ElementSpec) -> Result<ElementId, MarkupError> {
        if spec.tag.trim().is_empty() {
            return Err(MarkupError::EmptyTag {
                path: self.describe(parent),
            });
        }
        if let Some(id) = &spec.id {
            if self.ids.contains_key(id) {
                return Err(MarkupError::DuplicateId(id.clone()));
            }
        }

        let element = ElementId(self.nodes.len());
        let mut node = Node::from_spec(spec, Some(parent));
        for class in &spec.classes {
            if !node.classes.contains(class) {
                node.classes.push(class.clone());
            }
        }
        self.nodes.push(node);
        if let Some(id) = &spec.id {
            self.ids.insert(id.clone(), element);
        }
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(element);
        }
        for child in &spec.children {
            self.append(element, child)?;
        }
        Ok(element)
    }

    pub fn events(&self) -> &[DispatchedEvent] {
        &self.dispatched
    }

    /// Drain the dispatched event log.
    pub fn take_events(&mut self) -> Vec<DispatchedEvent> {
        std::mem::take(&mut self.dispatched)
    }

    fn describe(&self, element: ElementId) -> String {
        match self.nodes.get(element.0) {
            Some(node) => match &node.html_id {
                Some(id) => format!("{}#{}", node.tag, id),
                None => format!("{}[{}]", node.tag, element.0),
            },
            None => format!("<detached {}>", element.0),
        }
    }

    fn collect(&self, from: ElementId, out: &mut Vec<ElementId>) {
        if let Some(node) = self.nodes.get(from.0) {
            for child in &node.children {
                out.push(*child);
                self.collect(*child, out);
            }
        }
    }

    fn all(&self) -> Vec<ElementId> {
        let mut out = vec![self.body()];
        self.collect(self.body(), &mut out);
        out
    }
}

impl Document for MemoryDocument {
    fn body(&self) -> ElementId {
        ElementId(0)
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.ids.get(id).copied()
    }

    fn elements_with_class(&self, class: &str) -> Vec<ElementId> {
        self.all()
            .into_iter()
            .filter(|el| self.has_class(*el, class))
            .collect()
    }

    fn elements_with_attr(&self, name: &str) -> Vec<ElementId> {
        self.all()
            .into_iter()
            .filter(|el| self.attr(*el, name).is_some())
            .collect()
    }

    fn descendants(&self, element: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.collect(element, &mut out);
        out
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.nodes.get(element.0).and_then(|n| n.parent)
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.nodes
            .get(element.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn tag(&self, element: ElementId) -> Option<&str> {
        self.nodes.get(element.0).map(|n| n.tag.as_str())
    }

    fn html_id(&self, element: ElementId) -> Option<&str> {
        self.nodes.get(element.0).and_then(|n| n.html_id.as_deref())
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.nodes
            .get(element.0)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn add_class(&mut self, element: ElementId, class: &str) {
        if let Some(node) = self.nodes.get_mut(element.0) {
            if !node.classes.iter().any(|c| c == class) {
                node.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&mut self, element: ElementId, class: &str) {
        if let Some(node) = self.nodes.get_mut(element.0) {
            node.classes.retain(|c| c != class);
        }
    }

    fn attr(&self, element: ElementId, name: &str) -> Option<&str> {
        self.nodes
            .get(element.0)
            .and_then(|n| n.attrs.get(name))
            .map(String::as_str)
    }

    fn set_attr(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(element.0) {
            node.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn style(&self, element: ElementId, property: &str) -> Option<&str> {
        self.nodes
            .get(element.0)
            .and_then(|n| n.style.get(property))
            .map(String::as_str)
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) {
        if value.is_empty() {
            self.remove_style(element, property);
            return;
        }
        if let Some(node) = self.nodes.get_mut(element.0) {
            node.style.insert(property.to_string(), value.to_string());
        }
    }

    fn remove_style(&mut self, element: ElementId, property: &str) {
        if let Some(node) = self.nodes.get_mut(element.0) {
            node.style.remove(property);
        }
    }

    fn text(&self, element: ElementId) -> Option<&str> {
        self.nodes.get(element.0).map(|n| n.text.as_str())
    }

    fn set_text(&mut self, element: ElementId, text: &str) {
        if let Some(node) = self.nodes.get_mut(element.0) {
            node.text = text.to_string();
        }
    }

    fn focus(&mut self, element: ElementId) {
        if self.nodes.get(element.0).is_some() {
            self.focused = Some(element);
        }
    }

    fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    fn bounding_rect(&self, element: ElementId) -> Rect {
        self.nodes
            .get(element.0)
            .map(|n| Rect {
                top: n.rect.top - self.scroll_y,
                height: n.rect.height,
            })
            .unwrap_or_default()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn scroll_to(&mut self, y: f64) {
        self.scroll_y = y.max(0.0);
    }

    fn dispatch(&mut self, element: ElementId, event: Event) {
        let target_id = self.html_id(element).map(str::to_string);
        tracing::debug!(event = event.name(), target = self.describe(element), "dispatch");
        self.dispatched.push(DispatchedEvent {
            target: element,
            target_id,
            event,
        });
    }
}
