//! Dropdown menus: the header menu and the floating menu.

use chrono::Utc;
use tracing::debug;

use crate::env::{ElementId, Environment};
use crate::events::Event;

const SHOW_CLASS: &str = "show";

/// (button class, dropdown class, container class)
const MENU_KINDS: &[(&str, &str, &str)] = &[
    ("header-menu-button", "header-dropdown", "header-menu"),
    ("menu-button", "dropdown-content", "floating-menu"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Menu {
    button: ElementId,
    dropdown: ElementId,
}

#[derive(Debug, Clone, Default)]
pub struct MenuController {
    menus: Vec<Menu>,
}

impl MenuController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover the menus present on the page and set their ARIA state.
    pub fn install(&mut self, env: &mut dyn Environment) {
        for (button_class, dropdown_class, _) in MENU_KINDS {
            let doc = env.document();
            let button = doc.elements_with_class(button_class).first().copied();
            let dropdown = doc.elements_with_class(dropdown_class).first().copied();
            if let (Some(button), Some(dropdown)) = (button, dropdown) {
                let doc = env.document_mut();
                doc.set_attr(button, "aria-haspopup", "true");
                doc.set_attr(button, "aria-expanded", "false");
                self.menus.push(Menu { button, dropdown });
            }
        }
        debug!(menus = self.menus.len(), "menus installed");
    }

    pub fn len(&self) -> usize {
        self.menus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.menus.is_empty()
    }

    pub fn is_open(&self, env: &dyn Environment, dropdown: ElementId) -> bool {
        env.document().has_class(dropdown, SHOW_CLASS)
    }

    /// Close every menu, then open `dropdown` if it was closed. Returns
    /// whether it is open afterwards.
    pub fn toggle(&mut self, env: &mut dyn Environment, dropdown: ElementId) -> bool {
        let was_open = env.document().has_class(dropdown, SHOW_CLASS);
        self.close_all(env);
        if was_open {
            return false;
        }

        env.document_mut().add_class(dropdown, SHOW_CLASS);
        self.set_expanded(env, dropdown, true);
        let first_link = {
            let doc = env.document();
            doc.descendants(dropdown)
                .into_iter()
                .find(|el| doc.tag(*el) == Some("a"))
        };
        if let Some(link) = first_link {
            env.document_mut().focus(link);
        }
        announce_toggle(env, dropdown, true);
        true
    }

    pub fn close_all(&mut self, env: &mut dyn Environment) {
        for menu in self.menus.clone() {
            self.hide(env, menu.dropdown);
        }
    }

    /// Toggle the dropdown with html id `id`. False if there is none.
    pub fn open_menu(&mut self, env: &mut dyn Environment, id: &str) -> bool {
        match env.document().element_by_id(id) {
            Some(dropdown) => {
                self.toggle(env, dropdown);
                true
            }
            None => false,
        }
    }

    pub fn close_menu(&mut self, env: &mut dyn Environment, id: &str) -> bool {
        match env.document().element_by_id(id) {
            Some(dropdown) => {
                self.hide(env, dropdown);
                true
            }
            None => false,
        }
    }

    /// Document click handler. Clicks on a menu button toggle its menu and
    /// stop there; clicks outside every menu container close all menus.
    pub fn handle_click(&mut self, env: &mut dyn Environment, target: ElementId) -> bool {
        let doc = env.document();
        let ancestors = doc.ancestors_inclusive(target);
        if let Some(menu) = self
            .menus
            .iter()
            .find(|m| ancestors.contains(&m.button))
            .copied()
        {
            self.toggle(env, menu.dropdown);
            return true;
        }

        let inside = MENU_KINDS
            .iter()
            .any(|(_, _, container)| doc.closest_with_class(target, container).is_some());
        if !inside {
            self.close_all(env);
        }
        false
    }

    pub fn handle_key(&mut self, env: &mut dyn Environment, key: &str) {
        if key == "Escape" {
            self.close_all(env);
        }
    }

    fn hide(&mut self, env: &mut dyn Environment, dropdown: ElementId) {
        if !env.document().has_class(dropdown, SHOW_CLASS) {
            return;
        }
        env.document_mut().remove_class(dropdown, SHOW_CLASS);
        self.set_expanded(env, dropdown, false);
        announce_toggle(env, dropdown, false);
    }

    fn set_expanded(&self, env: &mut dyn Environment, dropdown: ElementId, open: bool) {
        if let Some(menu) = self.menus.iter().find(|m| m.dropdown == dropdown) {
            env.document_mut()
                .set_attr(menu.button, "aria-expanded", if open { "true" } else { "false" });
        }
    }
}

fn announce_toggle(env: &mut dyn Environment, dropdown: ElementId, open: bool) {
    let menu_id = env.document().html_id(dropdown).map(str::to_string);
    env.document_mut().dispatch(
        dropdown,
        Event::MenuToggled {
            menu_id,
            open,
            at: Utc::now(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Document, ElementSpec, HeadlessEnv, PageSpec};

    fn env() -> HeadlessEnv {
        HeadlessEnv::from_spec(&PageSpec::new(vec![
            ElementSpec::new("div")
                .class("header-menu")
                .child(
                    ElementSpec::new("button")
                        .id("header-btn")
                        .class("header-menu-button")
                        .child(ElementSpec::new("span").id("header-btn-icon")),
                )
                .child(
                    ElementSpec::new("div")
                        .id("header-dd")
                        .class("header-dropdown")
                        .child(ElementSpec::new("a").id("first-link").attr("href", "/daily"))
                        .child(ElementSpec::new("a").attr("href", "/help")),
                ),
            ElementSpec::new("div")
                .class("floating-menu")
                .child(ElementSpec::new("button").id("float-btn").class("menu-button"))
                .child(ElementSpec::new("div").id("float-dd").class("dropdown-content")),
            ElementSpec::new("main").id("content"),
        ]))
        .unwrap()
    }

    fn el(env: &HeadlessEnv, id: &str) -> ElementId {
        env.document.element_by_id(id).unwrap()
    }

    fn shown(env: &HeadlessEnv, id: &str) -> bool {
        env.document.has_class(el(env, id), SHOW_CLASS)
    }

    fn installed(env: &mut HeadlessEnv) -> MenuController {
        let mut menus = MenuController::new();
        menus.install(env);
        menus
    }

    #[test]
    fn install_discovers_both_menus() {
        let mut env = env();
        let menus = installed(&mut env);
        assert_eq!(menus.len(), 2);
        assert_eq!(
            env.document.attr(el(&env, "float-btn"), "aria-expanded"),
            Some("false")
        );
    }

    #[test]
    fn toggle_is_exclusive_and_focuses_first_link() {
        let mut env = env();
        let mut menus = installed(&mut env);
        let header = el(&env, "header-dd");
        let float = el(&env, "float-dd");

        assert!(menus.toggle(&mut env, header));
        assert_eq!(env.document.focused(), Some(el(&env, "first-link")));
        assert_eq!(
            env.document.attr(el(&env, "header-btn"), "aria-expanded"),
            Some("true")
        );

        assert!(menus.toggle(&mut env, float));
        assert!(!shown(&env, "header-dd"));
        assert!(shown(&env, "float-dd"));

        assert!(!menus.toggle(&mut env, float));
        assert!(!shown(&env, "float-dd"));
    }

    #[test]
    fn button_click_toggles_and_outside_click_closes() {
        let mut env = env();
        let mut menus = installed(&mut env);
        let icon = el(&env, "header-btn-icon");
        assert!(menus.handle_click(&mut env, icon));
        assert!(shown(&env, "header-dd"));

        // Inside the menu container: stays open.
        let link = el(&env, "first-link");
        assert!(!menus.handle_click(&mut env, link));
        assert!(shown(&env, "header-dd"));

        let content = el(&env, "content");
        menus.handle_click(&mut env, content);
        assert!(!shown(&env, "header-dd"));
    }

    #[test]
    fn escape_closes_everything() {
        let mut env = env();
        let mut menus = installed(&mut env);
        assert!(menus.open_menu(&mut env, "float-dd"));
        menus.handle_key(&mut env, "Escape");
        assert!(!shown(&env, "float-dd"));

        let names: Vec<_> = env.document.events().iter().map(|e| e.event.name()).collect();
        assert_eq!(names, vec!["menuToggled", "menuToggled"]);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut env = env();
        let mut menus = installed(&mut env);
        assert!(!menus.open_menu(&mut env, "nope"));
        assert!(!menus.close_menu(&mut env, "nope"));
        assert!(menus.close_menu(&mut env, "header-dd"));
    }
}
