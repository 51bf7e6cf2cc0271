//! Replay navigation and hash state operations against an in-memory page
//!
//! Usage:
//!   cargo run --features cli --bin ema-nav -- script.json
//!   cargo run --features cli --bin ema-nav -- script.json --pretty
//!   cat script.json | cargo run --features cli --bin ema-nav -- -
//!
//! Script format:
//!
//! ```json
//! {
//!   "config": { "Page": { "PageRoute": "plan" }, "Features": { "AutoUpdateNavigation": true } },
//!   "href": "https://ema.test/plan",
//!   "title": "Plan",
//!   "steps": [
//!     { "op": "push", "text": "Home", "url": "https://ema.test/home", "urlKey": "home" },
//!     { "op": "setKey", "key": "scenario", "value": "42" },
//!     { "op": "navigateTo", "section": "goals", "data": { "id": 5 } },
//!     { "op": "visit", "href": "https://ema.test/goals", "title": "Goals" },
//!     { "op": "pop" },
//!     { "op": "clear" }
//!   ]
//! }
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use serde_json::{json, Value};

use ema_client::events::EventFilter;
use ema_client::host::{MemoryLocation, MemoryStorage, PageLocation};
use ema_client::{logging, AppContext, ClientConfig};

#[derive(Parser)]
#[command(name = "ema-nav")]
#[command(about = "Replay navigation and hash state operations against an in-memory page")]
struct Args {
    /// Script file, or `-` for stdin
    script: PathBuf,

    /// Pretty-print the JSON report
    #[arg(short, long)]
    pretty: bool,

    /// Log filter directives (overridden by RUST_LOG)
    #[arg(long, default_value = logging::DEFAULT_DIRECTIVES)]
    log: String,
}

#[derive(Debug, Deserialize)]
struct Script {
    #[serde(default)]
    config: Value,
    href: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
enum Step {
    #[serde(rename_all = "camelCase")]
    Push {
        text: Option<String>,
        url: Option<String>,
        url_key: Option<String>,
    },
    Pop,
    SetKey {
        key: String,
        #[serde(default)]
        value: Value,
    },
    NavigateTo {
        section: String,
        #[serde(default)]
        data: Value,
    },
    Visit {
        href: String,
        #[serde(default)]
        title: String,
    },
    Clear,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Err(e) = logging::init_with(&args.log) {
        eprintln!("Logging not initialized: {}", e);
    }

    let raw = read_script(&args.script)?;
    let script: Script = serde_json::from_str(&raw).context("Invalid script")?;
    let report = run(script)?;

    let output = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", output);
    Ok(())
}

fn read_script(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read script from stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn run(script: Script) -> Result<Value> {
    let config = if script.config.is_null() {
        ClientConfig::default()
    } else {
        ClientConfig::from_json(&script.config.to_string())?
    };

    let storage = MemoryStorage::new();
    let location = MemoryLocation::new(&script.href, &script.title);
    let context = AppContext::new(config, Arc::new(storage), Arc::new(location.clone()));
    let events = context.bus().channel(EventFilter::All, 1024);

    context.initialize()?;

    for (index, step) in script.steps.into_iter().enumerate() {
        tracing::debug!(index, step = ?step, "Applying step");
        match step {
            Step::Push { text, url, url_key } => {
                context
                    .navigation()
                    .push(text.as_deref(), url.as_deref(), url_key.as_deref())?;
                context.refresh_back_link();
            }
            Step::Pop => {
                context.navigation().pop()?;
                context.refresh_back_link();
            }
            Step::SetKey { key, value } => {
                context.hash_state().set_key(&key, value)?;
                context.hash_changed()?;
            }
            Step::NavigateTo { section, data } => {
                context.hash_state().navigate_to(&section, data)?;
                context.hash_changed()?;
            }
            Step::Visit { href, title } => {
                location.visit(&href, &title);
                context.dispatcher().reset();
                context.initialize()?;
            }
            Step::Clear => {
                context.navigation().clear();
                context.refresh_back_link();
            }
        }
    }

    let back_link = context.back_link();
    Ok(json!({
        "stack": context.navigation().entries(),
        "href": location.href(),
        "fragment": location.fragment(),
        "state": context.hash_state().get_state(),
        "backLink": {
            "visible": back_link.visible,
            "text": back_link.text,
            "href": back_link.href,
        },
        "events": events
            .drain_events()
            .iter()
            .map(|event| json!({ "name": event.name(), "event": event }))
            .collect::<Vec<_>>(),
        "busStats": {
            "published": context.bus().stats().published,
            "dropped": context.bus().stats().dropped,
        },
    }))
}
