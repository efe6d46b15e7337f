//! Page timers: the Pomodoro page (`pomodoro`, `micro`) and the quick-help
//! page (`breath`, `worry`).
//!
//! Each timer type renders into `#<type>-timer`. Only one countdown per
//! type runs at a time; starting a type again restarts it.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::engine::{format_clock, Countdown, Tick};
use crate::env::{announce, ElementId, Environment, Task, TaskHandle};
use crate::error::StorageError;
use crate::events::Event;
use crate::storage::{PomodoroConfig, QuickHelpConfig};

pub const POMODORO: &str = "pomodoro";
pub const MICRO: &str = "micro";
pub const COUNT_KEY: &str = "pomodoroCount";

const RUNNING_COLOR: &str = "#e74c3c";
const DONE_COLOR: &str = "#2ecc71";
const IDLE_COLOR: &str = "#2c3e50";

/// Human names of the quick-help exercises.
const QUICK_HELP_NAMES: &[(&str, &str)] = &[
    ("breath", "Breathing 4-7-8"),
    ("worry", "Let yourself worry"),
];

#[derive(Debug, Clone)]
struct Running {
    countdown: Countdown,
    display: ElementId,
}

/// What finishing a countdown of a given type means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Routine {
    Focus,
    Break,
    Micro,
    QuickHelp(&'static str),
    Plain,
}

#[derive(Debug, Clone)]
pub struct TimerBoard {
    pomodoro: PomodoroConfig,
    quick_help: QuickHelpConfig,
    running: BTreeMap<String, Running>,
    /// Scheduled `StartTimer` tasks per timer type, such as the auto break.
    pending_starts: BTreeMap<String, TaskHandle>,
    pomodoro_count: u32,
}

impl TimerBoard {
    pub fn new(pomodoro: PomodoroConfig, quick_help: QuickHelpConfig) -> Self {
        Self {
            pomodoro,
            quick_help,
            running: BTreeMap::new(),
            pending_starts: BTreeMap::new(),
            pomodoro_count: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn pomodoro_count(&self) -> u32 {
        self.pomodoro_count
    }

    pub fn is_running(&self, timer_type: &str) -> bool {
        self.running.contains_key(timer_type)
    }

    /// Earliest deadline among running countdowns.
    pub fn next_deadline(&self) -> Option<u64> {
        self.running.values().map(|r| r.countdown.deadline_ms()).min()
    }

    /// Value shown by an idle display.
    pub fn default_minutes(&self, timer_type: &str) -> u64 {
        match timer_type {
            POMODORO => self.pomodoro.focus_min,
            MICRO => self.pomodoro.micro_min,
            _ => self.quick_help.timer_min,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Restore the persisted pomodoro count and render it.
    pub fn load_count(&mut self, env: &mut dyn Environment) {
        match env.store_mut().kv_get(COUNT_KEY) {
            Ok(Some(raw)) => match raw.trim().parse::<u32>() {
                Ok(count) => {
                    self.pomodoro_count = count;
                    render_counter(env, count);
                }
                Err(e) => warn!(key = COUNT_KEY, value = %raw, error = %e, "ignoring stored count"),
            },
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read pomodoro count"),
        }
    }

    pub fn save_count(&self, env: &mut dyn Environment) -> Result<(), StorageError> {
        env.store_mut()
            .kv_set(COUNT_KEY, &self.pomodoro_count.to_string())
    }

    /// Start (or restart) the countdown for `timer_type`.
    ///
    /// Returns false when the page has no `#<type>-timer` display or
    /// `minutes` is zero. A pending auto start for the type is cancelled.
    pub fn start(&mut self, env: &mut dyn Environment, timer_type: &str, minutes: u64) -> bool {
        self.cancel_pending_start(env, timer_type);
        if minutes == 0 {
            warn!(timer_type, "refusing zero-length timer");
            return false;
        }
        self.running.remove(timer_type);

        let Some(display) = env.document().element_by_id(&display_id(timer_type)) else {
            warn!(timer_type, "no display element for timer");
            return false;
        };

        let now = env.scheduler().now_ms();
        let doc = env.document_mut();
        doc.set_style(display, "color", RUNNING_COLOR);
        doc.set_text(display, &format_clock(minutes.saturating_mul(60)));
        doc.dispatch(
            display,
            Event::TimerStarted {
                timer_type: timer_type.to_string(),
                minutes,
                at: Utc::now(),
            },
        );
        debug!(timer_type, minutes, "timer started");

        self.running.insert(
            timer_type.to_string(),
            Running {
                countdown: Countdown::start(minutes, now),
                display,
            },
        );
        true
    }

    /// Cancel `timer_type` and reset its display. Returns false when the
    /// page has no display for it.
    pub fn stop(&mut self, env: &mut dyn Environment, timer_type: &str) -> bool {
        self.cancel_pending_start(env, timer_type);
        let was_running = self.running.remove(timer_type).is_some();

        let Some(display) = env.document().element_by_id(&display_id(timer_type)) else {
            return false;
        };
        let reset = format_clock(self.default_minutes(timer_type) * 60);
        let doc = env.document_mut();
        doc.set_text(display, &reset);
        doc.set_style(display, "color", IDLE_COLOR);
        if was_running {
            doc.dispatch(
                display,
                Event::TimerStopped {
                    timer_type: timer_type.to_string(),
                    at: Utc::now(),
                },
            );
        }
        true
    }

    /// Render every running countdown and run completion rules for those
    /// that reached zero.
    pub fn tick(&mut self, env: &mut dyn Environment) {
        let now = env.scheduler().now_ms();
        let mut finished = Vec::new();

        for (timer_type, running) in self.running.iter_mut() {
            match running.countdown.tick(now) {
                Tick::Remaining(secs) => {
                    env.document_mut()
                        .set_text(running.display, &format_clock(secs));
                }
                Tick::Finished => finished.push(timer_type.clone()),
                Tick::Idle => {}
            }
        }

        for timer_type in finished {
            if let Some(running) = self.running.remove(&timer_type) {
                self.complete(env, &timer_type, running);
            }
        }
    }

    /// Route a click on a `.timer-btn`. Returns true if it was one.
    pub fn handle_click(&mut self, env: &mut dyn Environment, target: ElementId) -> bool {
        let doc = env.document();
        let Some(button) = doc.closest_with_class(target, "timer-btn") else {
            return false;
        };
        let Some(timer_type) = doc.attr(button, "data-timer-type").map(str::to_string) else {
            return false;
        };
        let action = doc.attr(button, "data-timer-action").unwrap_or("stop").to_string();
        let minutes = doc
            .attr(button, "data-minutes")
            .and_then(|m| m.trim().parse::<u64>().ok())
            .filter(|m| *m > 0);

        match action.as_str() {
            "start" | "break" => {
                let minutes = minutes.unwrap_or_else(|| self.default_minutes(&timer_type));
                self.start(env, &timer_type, minutes);
            }
            _ => {
                self.stop(env, &timer_type);
            }
        }
        true
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn cancel_pending_start(&mut self, env: &mut dyn Environment, timer_type: &str) {
        if let Some(handle) = self.pending_starts.remove(timer_type) {
            if env.scheduler_mut().cancel(handle) {
                debug!(timer_type, "pending timer start cancelled");
            }
        }
    }

    fn routine(&self, timer_type: &str, minutes: u64) -> Routine {
        if timer_type == POMODORO && minutes == self.pomodoro.focus_min {
            return Routine::Focus;
        }
        if timer_type == POMODORO && minutes == self.pomodoro.break_min {
            return Routine::Break;
        }
        if timer_type == MICRO {
            return Routine::Micro;
        }
        QUICK_HELP_NAMES
            .iter()
            .find(|(t, _)| *t == timer_type)
            .map(|&(_, name)| Routine::QuickHelp(name))
            .unwrap_or(Routine::Plain)
    }

    fn complete(&mut self, env: &mut dyn Environment, timer_type: &str, running: Running) {
        let minutes = running.countdown.minutes();
        let doc = env.document_mut();
        doc.set_text(running.display, "00:00");
        doc.set_style(running.display, "color", DONE_COLOR);
        doc.dispatch(
            running.display,
            Event::TimerCompleted {
                timer_type: timer_type.to_string(),
                minutes,
                at: Utc::now(),
            },
        );
        info!(timer_type, minutes, "timer completed");

        match self.routine(timer_type, minutes) {
            Routine::Focus => {
                self.pomodoro_count = self.pomodoro_count.saturating_add(1);
                render_counter(env, self.pomodoro_count);
                let body = env.document().body();
                env.document_mut().dispatch(
                    body,
                    Event::PomodoroCounted {
                        count: self.pomodoro_count,
                        at: Utc::now(),
                    },
                );
                if let Err(e) = self.save_count(env) {
                    warn!(error = %e, "could not persist pomodoro count");
                }
                announce(
                    env,
                    "Pomodoro complete!",
                    &format!("Time for a {} minute break", self.pomodoro.break_min),
                );
                let handle = env.scheduler_mut().schedule(
                    self.pomodoro.auto_break_delay_ms,
                    Task::StartTimer {
                        timer_type: POMODORO.to_string(),
                        minutes: self.pomodoro.break_min,
                    },
                );
                self.pending_starts.insert(POMODORO.to_string(), handle);
            }
            Routine::Break => {
                announce(env, "Break over", "Ready for the next pomodoro?");
                let every = self.pomodoro.long_break_every;
                if every > 0 && self.pomodoro_count > 0 && self.pomodoro_count % every == 0 {
                    announce(
                        env,
                        &format!("{every} pomodoros complete!"),
                        "Time for a long 15-20 minute break",
                    );
                }
            }
            Routine::Micro => {
                announce(env, "Micro-break", "Time to stand up, stretch and take a break!");
            }
            Routine::QuickHelp(name) => {
                announce(env, "Timer complete!", &format!("Timer \"{name}\" has finished"));
            }
            Routine::Plain => {
                announce(env, "Timer complete!", &format!("Timer {timer_type} has finished"));
            }
        }
    }
}

fn display_id(timer_type: &str) -> String {
    format!("{timer_type}-timer")
}

fn render_counter(env: &mut dyn Environment, count: u32) {
    if let Some(counter) = env.document().element_by_id("pomodoro-counter") {
        env.document_mut()
            .set_text(counter, &format!("Pomodoros completed: {count}"));
    }
}
