//! The environment a page runs in.
//!
//! Controllers never touch a global document. They receive an
//! [`Environment`] that bundles four capabilities:
//!
//! - [`Document`]: element lookup, classes, attributes, inline styles,
//!   focus, geometry and event dispatch
//! - [`Scheduler`]: a clock plus cancellable one-shot [`Task`]s
//! - [`Notifier`]: desktop notifications and alerts
//! - [`KeyValueStore`]: small persistent flags and counters
//!
//! [`HeadlessEnv`] wires in-memory implementations of all four and is
//! what tests and the CLI drive.

mod document;
mod headless;
mod notifier;
mod scheduler;

pub use document::{
    DispatchedEvent, Document, ElementId, ElementSpec, MemoryDocument, PageSpec, Rect, Viewport,
};
pub use headless::HeadlessEnv;
pub use notifier::{announce, Notice, Permission, RecordingNotifier};
pub use scheduler::{Task, TaskHandle, VirtualScheduler};

use crate::storage::KeyValueStore;

/// Notification and alert capability.
pub trait Notifier {
    fn permission(&self) -> Permission;

    /// Ask the user for permission. Returns the resulting permission.
    fn request_permission(&mut self) -> Permission;

    fn notify(&mut self, title: &str, body: &str);

    /// Blocking alert box.
    fn alert(&mut self, message: &str);
}

/// Clock plus cancellable one-shot tasks.
///
/// Nothing runs on its own: the page driver pulls due tasks with
/// [`Scheduler::advance_to`] and executes them.
pub trait Scheduler {
    /// Current time in milliseconds since the page was created.
    fn now_ms(&self) -> u64;

    /// Schedule `task` to become due `delay_ms` from now.
    fn schedule(&mut self, delay_ms: u64, task: Task) -> TaskHandle;

    /// Cancel a pending task. Returns false if it already ran or was cancelled.
    fn cancel(&mut self, handle: TaskHandle) -> bool;

    /// Due time of the earliest pending task.
    fn next_due(&self) -> Option<u64>;

    /// Move the clock forward to `at_ms` (never backwards) and drain every
    /// task due at or before the new time, in due order.
    fn advance_to(&mut self, at_ms: u64) -> Vec<Task>;
}

/// Everything a controller may touch.
pub trait Environment {
    fn document(&self) -> &dyn Document;
    fn document_mut(&mut self) -> &mut dyn Document;
    fn scheduler(&self) -> &dyn Scheduler;
    fn scheduler_mut(&mut self) -> &mut dyn Scheduler;
    fn notifier_mut(&mut self) -> &mut dyn Notifier;
    fn store_mut(&mut self) -> &mut dyn KeyValueStore;
}
