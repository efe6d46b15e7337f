//! Page bootstrap and event routing.
//!
//! A [`Page`] owns an [`Environment`] and every controller, installs them
//! the way the site's startup script does, and is the single entry point
//! for user input and the passage of time. Nothing happens between calls:
//! scheduled tasks and timer deadlines only run inside [`Page::advance`].

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::anchor::AnchorScroller;
use crate::env::{ElementId, Environment, Task, Viewport};
use crate::error::StorageError;
use crate::exercise::GroundingExercise;
use crate::modal::{ModalController, ModalOverrides, ModalSettings};
use crate::nav::{MenuController, MobileNav};
use crate::reveal::{schedule_intro, RevealObserver};
use crate::storage::Config;
use crate::timer::TimerBoard;
use crate::tracking::{MaterialsTracker, PageViewCounter};

const ACTION_ATTR: &str = "data-action";

pub struct Page<E: Environment> {
    env: E,
    config: Config,
    modals: ModalController,
    menus: MenuController,
    mobile_nav: Option<MobileNav>,
    reveal: RevealObserver,
    anchors: AnchorScroller,
    timers: TimerBoard,
    exercise: GroundingExercise,
    materials: MaterialsTracker,
    rng: StdRng,
}

impl<E: Environment> Page<E> {
    /// Build and install every controller.
    pub fn new(env: E, config: Config) -> Self {
        Self::build(env, config, StdRng::from_entropy())
    }

    /// Like [`Page::new`] with a fixed seed for the grounding exercise.
    pub fn with_seed(env: E, config: Config, seed: u64) -> Self {
        Self::build(env, config, StdRng::seed_from_u64(seed))
    }

    fn build(env: E, config: Config, rng: StdRng) -> Self {
        let mut page = Self {
            modals: ModalController::new(ModalSettings::from(&config.modal)),
            menus: MenuController::new(),
            mobile_nav: None,
            reveal: RevealObserver::new(config.reveal.clone()),
            anchors: AnchorScroller,
            timers: TimerBoard::new(config.pomodoro.clone(), config.quick_help.clone()),
            exercise: GroundingExercise,
            materials: MaterialsTracker,
            rng,
            env,
            config,
        };
        page.install();
        page
    }

    fn install(&mut self) {
        let env = &mut self.env;

        self.modals.install(env);
        if self.config.modal.auto_register {
            self.modals.register_all(env);
        }
        self.menus.install(env);
        self.mobile_nav = MobileNav::install(&*env, self.config.menu.mobile_breakpoint_px);
        self.reveal.install(env);
        schedule_intro(env, &self.config.intro);
        self.timers.load_count(env);

        if self.config.page.track_views {
            if let Err(e) = PageViewCounter::new(&self.config.page.name).record(env) {
                warn!(error = %e, "could not record page view");
            }
        }
        info!(
            page = %self.config.page.name,
            modals = self.modals.registered(),
            menus = self.menus.len(),
            "page installed"
        );
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    pub fn into_env(self) -> E {
        self.env
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn modals(&self) -> &ModalController {
        &self.modals
    }

    pub fn menus(&self) -> &MenuController {
        &self.menus
    }

    pub fn mobile_nav(&self) -> Option<&MobileNav> {
        self.mobile_nav.as_ref()
    }

    pub fn reveal(&self) -> &RevealObserver {
        &self.reveal
    }

    pub fn timers(&self) -> &TimerBoard {
        &self.timers
    }

    // ── Programmatic API ─────────────────────────────────────────────

    pub fn register_modal(&mut self, id: &str, overrides: ModalOverrides) -> bool {
        self.modals.register(&mut self.env, id, overrides)
    }

    pub fn open_modal(&mut self, id: &str) -> bool {
        self.modals.open(&mut self.env, id)
    }

    pub fn close_modal(&mut self, id: &str) -> bool {
        self.modals.close(&mut self.env, id)
    }

    pub fn close_current_modal(&mut self) {
        self.modals.close_current(&mut self.env)
    }

    pub fn open_menu(&mut self, id: &str) -> bool {
        self.menus.open_menu(&mut self.env, id)
    }

    pub fn close_menu(&mut self, id: &str) -> bool {
        self.menus.close_menu(&mut self.env, id)
    }

    pub fn start_timer(&mut self, timer_type: &str, minutes: u64) -> bool {
        self.timers.start(&mut self.env, timer_type, minutes)
    }

    pub fn stop_timer(&mut self, timer_type: &str) -> bool {
        self.timers.stop(&mut self.env, timer_type)
    }

    // ── Input ────────────────────────────────────────────────────────

    /// Deliver a click on `target`. Returns true if some controller acted
    /// on it.
    pub fn click(&mut self, target: ElementId) -> bool {
        let env = &mut self.env;

        if self.modals.handle_click(env, target) {
            return true;
        }
        if self.menus.handle_click(env, target) {
            return true;
        }
        if let Some(nav) = self.mobile_nav {
            if nav.handle_click(env, target) {
                return true;
            }
        }
        if self.anchors.handle_click(env, target) {
            self.reveal.check(env);
            return true;
        }
        if self.timers.handle_click(env, target) {
            return true;
        }

        let doc = env.document();
        let action = doc
            .closest_with_attr(target, ACTION_ATTR)
            .and_then(|el| doc.attr(el, ACTION_ATTR))
            .map(str::to_string);
        match action.as_deref() {
            Some("generate-task") => {
                return self.exercise.generate(env, &mut self.rng).is_some();
            }
            Some("reset-help") => return self.exercise.reset(env),
            Some(other) => debug!(action = other, "unhandled page action"),
            None => {}
        }

        self.materials.handle_click(env, target)
    }

    /// Click the element with html id `id`. Returns false if there is none.
    pub fn click_id(&mut self, id: &str) -> bool {
        match self.env.document().element_by_id(id) {
            Some(target) => self.click(target),
            None => {
                warn!(id, "click target not found");
                false
            }
        }
    }

    pub fn key_down(&mut self, key: &str) -> bool {
        let closed = self.modals.handle_key(&mut self.env, key);
        self.menus.handle_key(&mut self.env, key);
        closed
    }

    pub fn mouse_enter(&mut self, target: ElementId) {
        self.materials.handle_mouse_enter(&mut self.env, target);
    }

    pub fn mouse_leave(&mut self, target: ElementId) {
        self.materials.handle_mouse_leave(&mut self.env, target);
    }

    pub fn scroll_to(&mut self, y: f64) {
        self.env.document_mut().scroll_to(y);
        self.reveal.check(&mut self.env);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.env
            .document_mut()
            .set_viewport(Viewport { width, height });
        if let Some(nav) = self.mobile_nav {
            nav.handle_resize(&mut self.env);
        }
        self.reveal.check(&mut self.env);
    }

    /// The window `load` event.
    pub fn load(&mut self) {
        self.reveal.schedule_load_cascade(&mut self.env);
    }

    /// The window `beforeunload` event: persist the pomodoro count.
    pub fn unload(&mut self) -> Result<(), StorageError> {
        self.timers.save_count(&mut self.env)
    }

    // ── Time ─────────────────────────────────────────────────────────

    /// Let `ms` milliseconds pass. Tasks and timer deadlines inside the
    /// window run in time order; tasks they schedule run too if due in
    /// the same window.
    pub fn advance(&mut self, ms: u64) {
        let end = self.env.scheduler().now_ms().saturating_add(ms);

        loop {
            let next = [self.env.scheduler().next_due(), self.timers.next_deadline()]
                .into_iter()
                .flatten()
                .filter(|at| *at <= end)
                .min();
            let Some(at) = next else {
                break;
            };
            for task in self.env.scheduler_mut().advance_to(at) {
                self.run_task(task);
            }
            self.timers.tick(&mut self.env);
        }

        self.env.scheduler_mut().advance_to(end);
        self.timers.tick(&mut self.env);
    }

    fn run_task(&mut self, task: Task) {
        debug!(?task, "running task");
        match task {
            Task::AddClass { element, class } => {
                self.env.document_mut().add_class(element, &class);
            }
            Task::SetStyle {
                element,
                property,
                value,
            } => {
                self.env.document_mut().set_style(element, &property, &value);
            }
            Task::RevealIfInViewport { element } => {
                self.reveal.reveal_if_in_viewport(&mut self.env, element);
            }
            Task::StartTimer {
                timer_type,
                minutes,
            } => {
                self.timers.start(&mut self.env, &timer_type, minutes);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Document, ElementSpec, HeadlessEnv, Notice, PageSpec};
    use crate::events::Event;
    use crate::storage::KeyValueStore;

    fn page_spec() -> PageSpec {
        PageSpec::new(vec![
            ElementSpec::new("header")
                .class("tilda-header")
                .at(0.0, 80.0)
                .child(
                    ElementSpec::new("div")
                        .class("header-menu")
                        .child(ElementSpec::new("button").id("menu-btn").class("header-menu-button"))
                        .child(
                            ElementSpec::new("div")
                                .id("menu")
                                .class("header-dropdown")
                                .child(ElementSpec::new("a").id("menu-first").attr("href", "#tips")),
                        ),
                ),
            ElementSpec::new("button").id("open-help").attr("data-modal", "help"),
            ElementSpec::new("div")
                .id("help")
                .class("modal-overlay")
                .style("display", "none")
                .child(
                    ElementSpec::new("div")
                        .class("modal-content")
                        .child(ElementSpec::new("button").id("help-x").attr("data-close-modal", "")),
                ),
            ElementSpec::new("div").id("pomodoro-timer").text("25:00"),
            ElementSpec::new("div").id("pomodoro-counter"),
            ElementSpec::new("button")
                .id("start-focus")
                .class("timer-btn")
                .attr("data-timer-type", "pomodoro")
                .attr("data-timer-action", "start")
                .attr("data-minutes", "25"),
            ElementSpec::new("button").id("gen").attr("data-action", "generate-task"),
            ElementSpec::new("div").id("task-display").style("display", "none"),
            ElementSpec::new("div").id("help-controls").style("display", "none"),
            ElementSpec::new("section").id("tips").class("scale-in").at(3_000.0, 200.0),
        ])
    }

    fn page() -> Page<HeadlessEnv> {
        let env = HeadlessEnv::from_spec(&page_spec()).unwrap();
        Page::with_seed(env, Config::default(), 42)
    }

    fn el(page: &Page<HeadlessEnv>, id: &str) -> ElementId {
        page.env().document.element_by_id(id).unwrap()
    }

    #[test]
    fn install_registers_overlays_and_counts_the_view() {
        let page = page();
        assert!(page.modals().registration("help").is_some());
        assert_eq!(page.menus().len(), 1);
        assert_eq!(
            page.env().store.kv_get("views:index").unwrap().as_deref(),
            Some("1")
        );
        let opener = el(&page, "open-help");
        assert_eq!(
            page.env().document.attr(opener, "aria-haspopup"),
            Some("dialog")
        );
    }

    #[test]
    fn opener_click_then_frame_activates_overlay() {
        let mut page = page();
        assert!(page.click_id("open-help"));
        let help = el(&page, "help");
        assert!(!page.env().document.has_class(help, "active"));
        page.advance(16);
        assert!(page.env().document.has_class(help, "active"));

        assert!(page.key_down("Escape"));
        page.advance(300);
        assert_eq!(page.env().document.style(help, "display"), Some("none"));
    }

    #[test]
    fn intro_runs_on_schedule() {
        let mut page = page();
        let header = page.env().document.elements_with_class("tilda-header")[0];
        page.advance(499);
        assert!(!page.env().document.has_class(header, "visible"));
        page.advance(1);
        assert!(page.env().document.has_class(header, "visible"));
    }

    #[test]
    fn anchor_inside_menu_scrolls_and_reveals() {
        let mut page = page();
        page.click_id("menu-btn");
        let menu = el(&page, "menu");
        assert!(page.env().document.has_class(menu, "show"));

        assert!(page.click_id("menu-first"));
        assert_eq!(page.env().document.scroll_y(), 2_920.0);
        let tips = el(&page, "tips");
        assert!(page.env().document.has_class(tips, "visible"));
    }

    #[test]
    fn focus_pomodoro_rolls_into_break() {
        let mut page = page();
        assert!(page.click_id("start-focus"));
        page.advance(25 * 60_000);

        assert_eq!(page.timers().pomodoro_count(), 1);
        let counter = el(&page, "pomodoro-counter");
        assert_eq!(
            page.env().document.text(counter),
            Some("Pomodoros completed: 1")
        );
        assert!(page
            .env()
            .notifier
            .notices()
            .iter()
            .any(|n| matches!(n, Notice::Alert { .. })));

        page.advance(2_000);
        assert!(page.timers().is_running("pomodoro"));
        let display = el(&page, "pomodoro-timer");
        assert_eq!(page.env().document.text(display), Some("05:00"));

        page.unload().unwrap();
        assert_eq!(
            page.env().store.kv_get("pomodoroCount").unwrap().as_deref(),
            Some("1")
        );
    }

    #[test]
    fn zero_length_timers_never_stall_advance() {
        let mut config = Config::default();
        config.pomodoro.focus_min = 0;
        config.pomodoro.break_min = 0;
        config.pomodoro.auto_break_delay_ms = 0;
        let env = HeadlessEnv::from_spec(&page_spec()).unwrap();
        let mut page = Page::with_seed(env, config, 42);

        assert!(!page.start_timer("pomodoro", 0));
        page.advance(10_000);
        assert!(!page.timers().is_running("pomodoro"));
        assert_eq!(page.timers().pomodoro_count(), 0);
    }

    #[test]
    fn zero_minute_auto_break_is_dropped() {
        let mut config = Config::default();
        config.pomodoro.focus_min = 1;
        config.pomodoro.break_min = 0;
        config.pomodoro.auto_break_delay_ms = 0;
        let env = HeadlessEnv::from_spec(&page_spec()).unwrap();
        let mut page = Page::with_seed(env, config, 42);

        assert!(page.start_timer("pomodoro", 1));
        page.advance(2 * 60_000);
        assert_eq!(page.timers().pomodoro_count(), 1);
        assert!(!page.timers().is_running("pomodoro"));
        assert_eq!(page.env().scheduler.pending(), 0);
    }

    #[test]
    fn generate_task_action_fills_display() {
        let mut page = page();
        assert!(page.click_id("gen"));
        let display = el(&page, "task-display");
        let text = page.env().document.text(display).unwrap();
        assert!(text.starts_with("Find "));
    }

    #[test]
    fn resize_updates_viewport() {
        let mut page = page();
        page.resize(400.0, 700.0);
        assert_eq!(page.env().document.viewport().width, 400.0);
    }

    #[test]
    fn events_are_recorded_in_order() {
        let mut page = page();
        page.env_mut().document.take_events();
        page.open_modal("help");
        page.close_current_modal();
        let names: Vec<&str> = page
            .env()
            .document
            .events()
            .iter()
            .map(|e| e.event.name())
            .collect();
        assert_eq!(names, vec!["modalOpened", "modalClosed"]);
        assert!(matches!(
            page.env().document.events()[0].event,
            Event::ModalOpened { .. }
        ));
    }
}
