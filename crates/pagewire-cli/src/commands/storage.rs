use std::path::PathBuf;

use clap::Subcommand;
use pagewire_core::{KeyValueStore, SqliteStore};

#[derive(Subcommand)]
pub enum StorageAction {
    /// Print a stored value
    Get {
        /// Key (e.g. "pomodoroCount", "views:index")
        key: String,
    },
    /// Store a value
    Set { key: String, value: String },
    /// List every stored pair as JSON
    List,
}

fn open(path: Option<PathBuf>) -> Result<SqliteStore, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => SqliteStore::open(&path)?,
        None => SqliteStore::open_default()?,
    })
}

pub fn run(store: Option<PathBuf>, action: StorageAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open(store)?;
    match action {
        StorageAction::Get { key } => match store.kv_get(&key)? {
            Some(value) => println!("{value}"),
            None => return Err(format!("no value for key: {key}").into()),
        },
        StorageAction::Set { key, value } => {
            store.kv_set(&key, &value)?;
            println!("ok");
        }
        StorageAction::List => {
            let entries: serde_json::Map<String, serde_json::Value> = store
                .entries()?
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::String(v)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}
