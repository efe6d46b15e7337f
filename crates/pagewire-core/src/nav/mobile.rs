//! Collapsible header navigation for narrow viewports.

use crate::env::{ElementId, Environment};

const EXPANDED_STYLE: &[(&str, &str)] = &[
    ("flex-direction", "column"),
    ("position", "absolute"),
    ("top", "100%"),
    ("left", "0"),
    ("right", "0"),
    ("background", "rgba(245, 245, 221, 0.98)"),
    ("backdrop-filter", "blur(10px)"),
    ("padding", "20px"),
    ("gap", "1rem"),
    ("border-top", "1px solid var(--border-color)"),
];

const DESKTOP_STYLE: &[(&str, &str)] = &[
    ("display", "flex"),
    ("flex-direction", "row"),
    ("position", "static"),
    ("background", "transparent"),
    ("padding", "0"),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MobileNav {
    button: ElementId,
    nav: ElementId,
    breakpoint_px: f64,
}

impl MobileNav {
    /// Present only when the page has both `.mobile-menu-btn` and `.header-nav`.
    pub fn install(env: &dyn Environment, breakpoint_px: f64) -> Option<Self> {
        let doc = env.document();
        let button = doc.elements_with_class("mobile-menu-btn").first().copied()?;
        let nav = doc.elements_with_class("header-nav").first().copied()?;
        Some(Self {
            button,
            nav,
            breakpoint_px,
        })
    }

    pub fn is_expanded(&self, env: &dyn Environment) -> bool {
        env.document().style(self.nav, "display") == Some("flex")
    }

    pub fn toggle(&self, env: &mut dyn Environment) {
        let expand = !self.is_expanded(env);
        let doc = env.document_mut();
        if expand {
            doc.set_style(self.nav, "display", "flex");
            for (property, value) in EXPANDED_STYLE {
                doc.set_style(self.nav, property, value);
            }
        } else {
            doc.set_style(self.nav, "display", "none");
        }
    }

    pub fn handle_click(&self, env: &mut dyn Environment, target: ElementId) -> bool {
        let doc = env.document();
        let ancestors = doc.ancestors_inclusive(target);
        if ancestors.contains(&self.button) {
            self.toggle(env);
            return true;
        }

        let on_link = ancestors.contains(&self.nav)
            && doc.closest_with_class(target, "nav-link").is_some();
        if on_link && doc.viewport().width <= self.breakpoint_px {
            env.document_mut().set_style(self.nav, "display", "none");
        }
        false
    }

    /// Re-apply the layout for the current viewport width.
    pub fn handle_resize(&self, env: &mut dyn Environment) {
        let wide = env.document().viewport().width > self.breakpoint_px;
        let doc = env.document_mut();
        if wide {
            for (property, value) in DESKTOP_STYLE {
                doc.set_style(self.nav, property, value);
            }
        } else {
            doc.set_style(self.nav, "display", "none");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Document, ElementSpec, HeadlessEnv, PageSpec, Viewport};

    fn env(width: f64) -> HeadlessEnv {
        let mut spec = PageSpec::new(vec![ElementSpec::new("header")
            .child(ElementSpec::new("button").id("burger").class("mobile-menu-btn"))
            .child(
                ElementSpec::new("nav")
                    .id("nav")
                    .class("header-nav")
                    .child(ElementSpec::new("a").id("link").class("nav-link").attr("href", "#about")),
            )]);
        spec.viewport = Viewport {
            width,
            height: 700.0,
        };
        HeadlessEnv::from_spec(&spec).unwrap()
    }

    fn display(env: &HeadlessEnv) -> Option<String> {
        let nav = env.document.element_by_id("nav").unwrap();
        env.document.style(nav, "display").map(str::to_string)
    }

    #[test]
    fn burger_toggles_column_layout() {
        let mut env = env(375.0);
        let nav = MobileNav::install(&env, 768.0).unwrap();
        let burger = env.document.element_by_id("burger").unwrap();

        assert!(nav.handle_click(&mut env, burger));
        assert_eq!(display(&env).as_deref(), Some("flex"));
        let el = env.document.element_by_id("nav").unwrap();
        assert_eq!(env.document.style(el, "flex-direction"), Some("column"));

        nav.handle_click(&mut env, burger);
        assert_eq!(display(&env).as_deref(), Some("none"));
    }

    #[test]
    fn link_click_collapses_only_on_narrow_viewports() {
        let mut env = env(375.0);
        let nav = MobileNav::install(&env, 768.0).unwrap();
        nav.toggle(&mut env);
        let link = env.document.element_by_id("link").unwrap();
        assert!(!nav.handle_click(&mut env, link));
        assert_eq!(display(&env).as_deref(), Some("none"));

        let mut wide = self::env(1024.0);
        let nav = MobileNav::install(&wide, 768.0).unwrap();
        nav.toggle(&mut wide);
        let link = wide.document.element_by_id("link").unwrap();
        nav.handle_click(&mut wide, link);
        assert_eq!(display(&wide).as_deref(), Some("flex"));
    }

    #[test]
    fn resize_restores_desktop_row() {
        let mut env = env(375.0);
        let nav = MobileNav::install(&env, 768.0).unwrap();
        env.document.set_viewport(Viewport {
            width: 1200.0,
            height: 800.0,
        });
        nav.handle_resize(&mut env);
        let el = env.document.element_by_id("nav").unwrap();
        assert_eq!(env.document.style(el, "flex-direction"), Some("row"));
        assert_eq!(env.document.style(el, "position"), Some("static"));

        env.document.set_viewport(Viewport {
            width: 600.0,
            height: 800.0,
        });
        nav.handle_resize(&mut env);
        assert_eq!(display(&env).as_deref(), Some("none"));
    }

    #[test]
    fn absent_markup_means_no_controller() {
        let env = HeadlessEnv::empty();
        assert!(MobileNav::install(&env, 768.0).is_none());
    }
}
