//! Config command - show or change where rules are stored

use anyhow::Result;
use colored::Colorize;
use sheetdrop_core::config::{Backend, Config};

use super::get_sheetdrop_dir;
use crate::output;

#[derive(Debug, Default)]
pub struct ConfigChanges {
    pub backend: Option<Backend>,
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub clear_token: bool,
}

impl ConfigChanges {
    fn is_empty(&self) -> bool {
        self.backend.is_none() && self.api_url.is_none() && self.token.is_none() && !self.clear_token
    }

    /// Apply the changes, returning whether anything differs
    fn apply(&self, config: &mut Config) -> bool {
        let before = config.clone();
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(url) = &self.api_url {
            config.api_base_url = url.trim().to_string();
        }
        if self.clear_token {
            config.api_token = None;
        } else if let Some(token) = &self.token {
            config.api_token = Some(token.trim().to_string()).filter(|t| !t.is_empty());
        }
        *config != before
    }
}

fn masked(token: Option<&str>) -> String {
    match token {
        Some(t) if t.chars().count() > 8 => format!("{}…", t.chars().take(4).collect::<String>()),
        Some(_) => "set".to_string(),
        None => "not set".to_string(),
    }
}

fn config_json(config: &Config) -> serde_json::Value {
    serde_json::json!({
        "backend": config.backend.to_string(),
        "api_base_url": config.api_base_url,
        "api_token_set": config.api_token.is_some(),
    })
}

fn print_config(config: &Config) {
    println!("{}", "SheetDrop Settings".bold());
    println!("  Backend: {}", config.backend);
    println!("  API URL: {}", config.api_base_url);
    println!("  Token:   {}", masked(config.api_token.as_deref()));
    if config.backend == Backend::Local {
        println!(
            "{}",
            "  Rules are kept in the offline store and never reach the SheetDrop API.".dimmed()
        );
    }
}

pub fn run(changes: ConfigChanges, json: bool) -> Result<()> {
    let sheetdrop_dir = get_sheetdrop_dir()?;

    if changes.is_empty() {
        // Effective settings, environment overrides included
        let config = Config::load(&sheetdrop_dir)?;
        if json {
            println!("{}", config_json(&config));
        } else {
            print_config(&config);
        }
        return Ok(());
    }

    // Environment overrides must not end up in settings.json
    let mut config = Config::load_with_env(&sheetdrop_dir, |_| None)?;
    let changed = changes.apply(&mut config);
    if changed {
        config.save(&sheetdrop_dir)?;
    }

    if json {
        let mut value = config_json(&config);
        value["saved"] = serde_json::Value::Bool(changed);
        println!("{}", value);
    } else {
        if changed {
            output::success("Settings saved");
        } else {
            output::info("Settings unchanged");
        }
        print_config(&config);
    }
    Ok(())
}
