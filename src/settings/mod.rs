//! Layered settings registry.
//!
//! Each setting resolves, highest precedence first, from:
//! 1. `<NAME>_FILE` (file contents) or `<NAME>` in the environment
//! 2. The persisted `setting` row
//! 3. The compiled-in default from [`catalog`]

pub mod catalog;
mod descriptor;
mod duration;
mod environment;
mod registry;
mod store;
mod value;

pub use descriptor::{SaveOutcome, SettingDescriptor};
pub use duration::parse_duration;
pub use environment::{FILE_SUFFIX, load_environment};
pub use registry::SettingsRegistry;
pub use store::{GroupRef, SettingStore, ZoneType};
pub use value::{SettingValue, ValueKind, is_truthy_text, parse_json_lenient};
