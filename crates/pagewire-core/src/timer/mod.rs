mod board;
mod engine;

pub use board::{TimerBoard, COUNT_KEY, MICRO, POMODORO};
pub use engine::{format_clock, Countdown, CountdownState, Tick};
