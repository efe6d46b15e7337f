//! # Pagewire Core Library
//!
//! This library holds the interactive behaviour of a small content site:
//! overlays, dropdown menus, scroll reveal animations, anchor scrolling and
//! the Pomodoro and quick-help timers. Every controller works against an
//! injected [`Environment`], so the same logic runs in a browser binding,
//! in tests and in the headless `pagewire-cli` replay tool.
//!
//! ## Architecture
//!
//! - **Environment**: document, scheduler, notifier and key-value store
//!   behind traits, with in-memory implementations in [`HeadlessEnv`]
//! - **Controllers**: one per page behaviour, each reacting to clicks,
//!   keys, scrolling or time and emitting [`Event`]s
//! - **Page**: installs the controllers and routes input and time to them
//! - **Storage**: TOML configuration and a SQLite key-value store
//!
//! ## Key Components
//!
//! - [`ModalController`]: at-most-one-open overlay manager
//! - [`Page`]: bootstrap and event routing
//! - [`TimerBoard`]: countdown timers with completion rules
//! - [`Config`]: application configuration management

pub mod anchor;
pub mod env;
pub mod error;
pub mod events;
pub mod exercise;
pub mod modal;
pub mod nav;
pub mod page;
pub mod reveal;
pub mod storage;
pub mod timer;
pub mod tracking;

pub use anchor::AnchorScroller;
pub use env::{
    Document, ElementId, ElementSpec, Environment, HeadlessEnv, MemoryDocument, PageSpec,
    Scheduler, Task,
};
pub use error::{ConfigError, CoreError, MarkupError, StorageError};
pub use events::Event;
pub use exercise::GroundingExercise;
pub use modal::{ModalController, ModalOptions, ModalOverrides, ModalSettings};
pub use nav::{MenuController, MobileNav};
pub use page::Page;
pub use reveal::RevealObserver;
pub use storage::{Config, KeyValueStore, MemoryStore, SqliteStore};
pub use timer::{Countdown, TimerBoard};
pub use tracking::{MaterialsTracker, PageViewCounter};
