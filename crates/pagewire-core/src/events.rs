use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::env::ElementId;

/// Every user-visible state change is announced with an Event dispatched on
/// the element it concerns. Page scripts listen for them; the CLI prints them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ModalOpened {
        modal_id: String,
        at: DateTime<Utc>,
    },
    ModalClosed {
        modal_id: String,
        at: DateTime<Utc>,
    },
    MenuToggled {
        /// `id` attribute of the dropdown, if it has one.
        menu_id: Option<String>,
        open: bool,
        at: DateTime<Utc>,
    },
    TimerStarted {
        timer_type: String,
        minutes: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        timer_type: String,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        timer_type: String,
        minutes: u64,
        at: DateTime<Utc>,
    },
    /// A focus pomodoro finished and the persistent counter moved.
    PomodoroCounted {
        count: u32,
        at: DateTime<Utc>,
    },
    ElementRevealed {
        element: ElementId,
        at: DateTime<Utc>,
    },
    MaterialClicked {
        href: Option<String>,
        at: DateTime<Utc>,
    },
    PageViewed {
        page: String,
        count: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// DOM-style event name, as a page script would listen for it.
    pub fn name(&self) -> &'static str {
        match self {
            Event::ModalOpened { .. } => "modalOpened",
            Event::ModalClosed { .. } => "modalClosed",
            Event::MenuToggled { .. } => "menuToggled",
            Event::TimerStarted { .. } => "timerStarted",
            Event::TimerStopped { .. } => "timerStopped",
            Event::TimerCompleted { .. } => "timerCompleted",
            Event::PomodoroCounted { .. } => "pomodoroCounted",
            Event::ElementRevealed { .. } => "elementRevealed",
            Event::MaterialClicked { .. } => "materialClicked",
            Event::PageViewed { .. } => "pageViewed",
        }
    }
}
