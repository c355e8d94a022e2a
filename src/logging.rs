//! Tracing subscriber setup for the `zoneadmin` binary.

use anyhow::Result;
use std::fs::OpenOptions;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Where log output goes, parsed from the `--log` option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stdout,
    Stderr,
    /// Append to a file, without ANSI colors
    File(String),
}

impl LogTarget {
    pub fn parse(value: &str) -> Self {
        match value {
            "0" | "off" => LogTarget::Off,
            "1" | "stdout" => LogTarget::Stdout,
            "2" | "stderr" => LogTarget::Stderr,
            path => LogTarget::File(path.to_string()),
        }
    }
}

/// Level from a config value such as `info` or `DEBUG`. `verbose` always wins.
pub fn level_for(configured: Option<&str>, verbose: bool) -> Level {
    if verbose {
        return Level::DEBUG;
    }
    configured
        .and_then(|l| l.trim().parse::<Level>().ok())
        .unwrap_or(Level::INFO)
}

/// Install the global subscriber.
pub fn init_tracing(target: &LogTarget, level: Level) -> Result<()> {
    match target {
        LogTarget::Off => {}
        LogTarget::Stdout => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::Stderr => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_targets() {
        assert_eq!(LogTarget::parse("off"), LogTarget::Off);
        assert_eq!(LogTarget::parse("1"), LogTarget::Stdout);
        assert_eq!(LogTarget::parse("2"), LogTarget::Stderr);
        assert_eq!(
            LogTarget::parse("/var/log/zoneadmin.log"),
            LogTarget::File("/var/log/zoneadmin.log".into())
        );
    }

    #[test]
    fn level_selection() {
        assert_eq!(level_for(Some("warn"), false), Level::WARN);
        assert_eq!(level_for(Some("WARN"), true), Level::DEBUG);
        assert_eq!(level_for(Some("chatty"), false), Level::INFO);
        assert_eq!(level_for(None, false), Level::INFO);
    }
}
