//! Integration tests for the overlay manager driven through a whole page.
//!
//! The page is described in JSON, the way the CLI receives it, and every
//! interaction goes through `Page` so deferred tasks run on the virtual
//! clock exactly as they would in a browser.

use indoc::indoc;
use pagewire_core::env::{Document, MemoryDocument};
use pagewire_core::{Config, HeadlessEnv, MemoryStore, ModalOverrides, Page};

const SIGNUP_PAGE: &str = indoc! {r#"
    {
      "viewport": { "width": 1280, "height": 800 },
      "body": [
        { "tag": "button", "id": "signup-btn", "attrs": { "data-modal": "signup" } },
        { "tag": "button", "id": "a-btn", "attrs": { "data-modal": "a" } },
        { "tag": "button", "id": "b-btn", "attrs": { "data-modal": "b" } },
        {
          "tag": "div", "id": "signup", "classes": ["modal-overlay"],
          "style": { "display": "none" },
          "children": [
            { "tag": "div", "classes": ["modal-content"], "children": [
              { "tag": "input", "id": "email", "attrs": { "type": "email" } },
              { "tag": "button", "id": "signup-x", "attrs": { "data-close-modal": "" } }
            ]}
          ]
        },
        {
          "tag": "div", "id": "a", "classes": ["modal-overlay"],
          "style": { "display": "none" },
          "children": [ { "tag": "button", "id": "a-x", "attrs": { "data-close-modal": "" } } ]
        },
        {
          "tag": "div", "id": "b", "classes": ["modal-overlay"],
          "style": { "display": "none" },
          "children": [ { "tag": "a", "id": "b-link", "attrs": { "href": "/materials" } } ]
        }
      ]
    }
"#};

fn page() -> Page<HeadlessEnv> {
    let document = MemoryDocument::from_json(SIGNUP_PAGE).unwrap();
    Page::with_seed(HeadlessEnv::new(document, MemoryStore::default()), Config::default(), 1)
}

fn display(page: &Page<HeadlessEnv>, id: &str) -> Option<String> {
    let doc = &page.env().document;
    doc.style(doc.element_by_id(id).unwrap(), "display")
        .map(str::to_string)
}

fn active(page: &Page<HeadlessEnv>, id: &str) -> bool {
    let doc = &page.env().document;
    doc.has_class(doc.element_by_id(id).unwrap(), "active")
}

fn body_overflow(page: &Page<HeadlessEnv>) -> Option<String> {
    let doc = &page.env().document;
    doc.style(doc.body(), "overflow").map(str::to_string)
}

#[test]
fn test_signup_open_and_close_button() {
    let mut page = page();

    assert!(page.click_id("signup-btn"));
    assert_eq!(page.modals().current_open(), Some("signup"));
    assert_eq!(display(&page, "signup").as_deref(), Some("block"));
    assert_eq!(body_overflow(&page).as_deref(), Some("hidden"));
    let email = page.env().document.element_by_id("email");
    assert_eq!(page.env().document.focused(), email);

    page.advance(16);
    assert!(active(&page, "signup"));

    assert!(page.click_id("signup-x"));
    assert!(!page.modals().is_open("signup"));
    assert!(!active(&page, "signup"));
    assert_eq!(body_overflow(&page), None);
    // Still fading out.
    assert_eq!(display(&page, "signup").as_deref(), Some("block"));

    page.advance(300);
    assert_eq!(display(&page, "signup").as_deref(), Some("none"));
}

#[test]
fn test_switching_overlays_hides_the_first_after_settle() {
    let mut page = page();
    page.click_id("a-btn");
    page.advance(16);
    page.click_id("b-btn");

    assert_eq!(page.modals().current_open(), Some("b"));
    assert!(!active(&page, "a"));
    page.advance(300);

    assert_eq!(display(&page, "a").as_deref(), Some("none"));
    assert_eq!(display(&page, "b").as_deref(), Some("block"));
    assert!(active(&page, "b"));
    assert_eq!(body_overflow(&page).as_deref(), Some("hidden"));
}

#[test]
fn test_reopen_during_fade_out_survives_stale_hide() {
    let mut page = page();
    page.click_id("a-btn");
    page.advance(16);
    page.click_id("a-x");
    page.advance(100);
    page.click_id("a-btn");
    page.advance(400);

    assert!(page.modals().is_open("a"));
    assert_eq!(display(&page, "a").as_deref(), Some("block"));
    assert!(active(&page, "a"));
}

#[test]
fn test_switch_before_first_frame_never_activates_the_first() {
    let mut page = page();
    page.click_id("a-btn");
    page.click_id("b-btn");
    page.advance(1_000);

    assert!(!active(&page, "a"));
    assert!(active(&page, "b"));
}

#[test]
fn test_backdrop_click_and_escape_respect_overrides() {
    let mut page = page();
    page.register_modal(
        "signup",
        ModalOverrides {
            close_on_overlay_click: Some(false),
            close_on_esc: Some(false),
        },
    );
    page.open_modal("signup");

    assert!(!page.click_id("signup"));
    assert!(!page.key_down("Escape"));
    assert!(page.modals().is_open("signup"));

    page.open_modal("a");
    assert!(page.click_id("a"));
    assert_eq!(page.modals().current_open(), None);
}

#[test]
fn test_click_inside_content_keeps_overlay_open() {
    let mut page = page();
    page.open_modal("b");
    page.click_id("b-link");
    assert!(page.modals().is_open("b"));
}

#[test]
fn test_events_follow_overlay_lifecycle() {
    let mut page = page();
    page.env_mut().document.take_events();
    page.open_modal("a");
    page.open_modal("b");
    page.close_current_modal();

    let names: Vec<(String, Option<String>)> = page
        .env()
        .document
        .events()
        .iter()
        .map(|e| (e.event.name().to_string(), e.target_id.clone()))
        .collect();
    assert_eq!(
        names,
        vec![
            ("modalOpened".to_string(), Some("a".to_string())),
            ("modalClosed".to_string(), Some("a".to_string())),
            ("modalOpened".to_string(), Some("b".to_string())),
            ("modalClosed".to_string(), Some("b".to_string())),
        ]
    );
}
