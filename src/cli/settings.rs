//! `settings` subcommands: list, get, set, toggle and maintenance.

use crate::context::AppContext;
use crate::settings::{GroupRef, SettingValue};
use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MaintenanceMode {
    On,
    Off,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// List settings with their resolved values
    List {
        /// Only settings in this group (basic, pdns, records, authentication, ldap, google, github, azure, oidc)
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Print one setting
    Get { name: String },

    /// Store a value; JSON is accepted, anything else is taken as text
    Set { name: String, value: String },

    /// Flip a boolean setting
    Toggle { name: String },

    /// Turn maintenance mode on or off
    Maintenance {
        #[arg(value_enum)]
        mode: MaintenanceMode,
    },
}

/// Run a settings subcommand, writing results to `out`.
pub fn run(ctx: &AppContext, command: &SettingsCommand, out: &mut dyn Write) -> Result<()> {
    let store = ctx.store();
    match command {
        SettingsCommand::List { group } => {
            let values = match group {
                Some(name) => store.get_group(GroupRef::Named(name))?,
                None => store.get_all()?,
            };
            print_values(&values, out)?;
        }
        SettingsCommand::Get { name } => {
            writeln!(out, "{}", store.get(name)?)?;
        }
        SettingsCommand::Set { name, value } => {
            store.set(name, &parse_cli_value(value))?;
            writeln!(out, "{} = {}", name, store.get(name)?)?;
        }
        SettingsCommand::Toggle { name } => {
            let enabled = store.toggle(name)?;
            writeln!(out, "{} = {}", name, enabled)?;
        }
        SettingsCommand::Maintenance { mode } => {
            let on = *mode == MaintenanceMode::On;
            store.set_maintenance(on)?;
            writeln!(out, "maintenance = {}", on)?;
        }
    }
    Ok(())
}

fn print_values(values: &BTreeMap<String, SettingValue>, out: &mut dyn Write) -> Result<()> {
    let width = values.keys().map(String::len).max().unwrap_or(0);
    for (name, value) in values {
        writeln!(out, "{:width$}  {}", name, value, width = width)?;
    }
    Ok(())
}

fn parse_cli_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostConfig;
    use crate::db::Database;
    use std::collections::HashMap;

    fn ctx() -> AppContext {
        AppContext::from_parts(
            HostConfig::default(),
            Database::open_in_memory().unwrap(),
            &HashMap::<String, String>::new(),
        )
        .unwrap()
    }

    fn run_to_string(ctx: &AppContext, command: SettingsCommand) -> String {
        let mut out = Vec::new();
        run(ctx, &command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn list_group_prints_aligned_rows() {
        let out = run_to_string(&ctx(), SettingsCommand::List { group: Some("pdns".into()) });
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("pdns_api_key "));
        assert!(out.contains("pdns_version      4.1.1"));
    }

    #[test]
    fn set_accepts_json_or_text() {
        let c = ctx();
        run_to_string(&c, SettingsCommand::Set { name: "session_timeout".into(), value: "30".into() });
        assert_eq!(c.store().get("session_timeout").unwrap(), SettingValue::Int(30));

        let out = run_to_string(&c, SettingsCommand::Set { name: "site_name".into(), value: "My DNS".into() });
        assert_eq!(out.trim(), "site_name = My DNS");
    }

    #[test]
    fn toggle_and_maintenance() {
        let c = ctx();
        assert_eq!(
            run_to_string(&c, SettingsCommand::Maintenance { mode: MaintenanceMode::On }).trim(),
            "maintenance = true"
        );
        assert_eq!(
            run_to_string(&c, SettingsCommand::Toggle { name: "maintenance".into() }).trim(),
            "maintenance = false"
        );
    }

    #[test]
    fn unknown_setting_is_an_error() {
        let mut out = Vec::new();
        assert!(run(&ctx(), &SettingsCommand::Get { name: "nope".into() }, &mut out).is_err());
    }
}
