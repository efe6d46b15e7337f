use std::path::PathBuf;

use clap::Args;
use pagewire_core::env::{Document, MemoryDocument};
use pagewire_core::{
    Config, HeadlessEnv, KeyValueStore, ModalOverrides, Page, Scheduler, SqliteStore,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

#[derive(Args)]
pub struct RunArgs {
    /// Page description (JSON element tree)
    #[arg(long)]
    page: PathBuf,
    /// Interaction script (TOML list of `[[step]]` tables)
    #[arg(long)]
    script: Option<PathBuf>,
    /// Config file; defaults to the user configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// SQLite store to persist counters in; in-memory when omitted
    #[arg(long)]
    store: Option<PathBuf>,
    /// Seed for the grounding exercise
    #[arg(long, default_value = "0")]
    seed: u64,
}

#[derive(Debug, Default, Deserialize)]
struct Script {
    #[serde(default, rename = "step")]
    steps: Vec<Step>,
}

/// One scripted interaction.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Step {
    Register {
        id: String,
        #[serde(default)]
        close_on_overlay_click: Option<bool>,
        #[serde(default)]
        close_on_esc: Option<bool>,
    },
    Open { id: String },
    Close { id: String },
    CloseCurrent,
    OpenMenu { id: String },
    CloseMenu { id: String },
    Click { target: String },
    Key { key: String },
    MouseEnter { target: String },
    MouseLeave { target: String },
    Scroll { y: f64 },
    Resize { width: f64, height: f64 },
    Load,
    Unload,
    Advance { ms: u64 },
    StartTimer { timer_type: String, minutes: u64 },
    StopTimer { timer_type: String },
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let document = MemoryDocument::from_json(&std::fs::read_to_string(&args.page)?)?;
    let script: Script = match &args.script {
        Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
        None => Script::default(),
    };
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_default(),
    };

    let store = match &args.store {
        Some(path) => SqliteStore::open(path)?,
        None => SqliteStore::open_memory()?,
    };
    info!(steps = script.steps.len(), "replaying script");
    replay(HeadlessEnv::new(document, store), config, &script, args.seed)
}

fn replay<S: KeyValueStore>(
    env: HeadlessEnv<S>,
    config: Config,
    script: &Script,
    seed: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut page = Page::with_seed(env, config, seed);
    flush_events(&mut page, 0)?;

    for (index, step) in script.steps.iter().enumerate() {
        let number = index + 1;
        if !apply(&mut page, step)? {
            warn!(step = number, ?step, "step had no effect");
        }
        flush_events(&mut page, number)?;
    }

    let env = page.env();
    let snapshot = json!({
        "kind": "snapshot",
        "now_ms": env.scheduler.now_ms(),
        "current_open": page.modals().current_open(),
        "pomodoro_count": page.timers().pomodoro_count(),
        "scroll_y": env.document.scroll_y(),
        "pending_tasks": env.scheduler.pending(),
        "notices": env.notifier.notices(),
    });
    println!("{}", serde_json::to_string(&snapshot)?);
    Ok(())
}

/// Apply one step. Returns false when it found nothing to act on.
fn apply<S: KeyValueStore>(
    page: &mut Page<HeadlessEnv<S>>,
    step: &Step,
) -> Result<bool, Box<dyn std::error::Error>> {
    let acted = match step {
        Step::Register {
            id,
            close_on_overlay_click,
            close_on_esc,
        } => page.register_modal(
            id,
            ModalOverrides {
                close_on_overlay_click: *close_on_overlay_click,
                close_on_esc: *close_on_esc,
            },
        ),
        Step::Open { id } => page.open_modal(id),
        Step::Close { id } => page.close_modal(id),
        Step::CloseCurrent => {
            page.close_current_modal();
            true
        }
        Step::OpenMenu { id } => page.open_menu(id),
        Step::CloseMenu { id } => page.close_menu(id),
        Step::Click { target } => page.click_id(target),
        Step::Key { key } => page.key_down(key),
        Step::MouseEnter { target } => match page.env().document.element_by_id(target) {
            Some(el) => {
                page.mouse_enter(el);
                true
            }
            None => false,
        },
        Step::MouseLeave { target } => match page.env().document.element_by_id(target) {
            Some(el) => {
                page.mouse_leave(el);
                true
            }
            None => false,
        },
        Step::Scroll { y } => {
            page.scroll_to(*y);
            true
        }
        Step::Resize { width, height } => {
            page.resize(*width, *height);
            true
        }
        Step::Load => {
            page.load();
            true
        }
        Step::Unload => {
            page.unload()?;
            true
        }
        Step::Advance { ms } => {
            page.advance(*ms);
            true
        }
        Step::StartTimer {
            timer_type,
            minutes,
        } => page.start_timer(timer_type, *minutes),
        Step::StopTimer { timer_type } => page.stop_timer(timer_type),
    };
    Ok(acted)
}

/// Print the events dispatched since the last flush, one JSON object per line.
fn flush_events<S: KeyValueStore>(
    page: &mut Page<HeadlessEnv<S>>,
    step: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    for dispatched in page.env_mut().document.take_events() {
        let line = json!({
            "kind": "event",
            "step": step,
            "name": dispatched.event.name(),
            "target": dispatched.target_id,
            "event": dispatched.event,
        });
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}
