//! Layered configuration.
//!
//! Consolidates host configuration from file layers with field-by-field YAML merging:
//! 1. **Baseline** - `/srv/zoneadmin/configs/docker_config.yaml` if present,
//!    else the defaults embedded from `./config/default_config.yaml`
//! 2. **External** - the file named by `ZONEADMIN_CONF`
//! 3. **Override** - a mapping or file passed by the caller (`--config`)
//!
//! Registered settings are then overlaid from the environment (`<NAME>` or
//! `<NAME>_FILE`) and mirrored into the host map under their upper-case name.

mod env;
mod host;
mod loader;
mod merge;

pub use env::{EnvSource, ProcessEnv};
pub use host::HostConfig;
pub use loader::{
    CONFIG_PATH_ENV, ConfigLoader, ConfigOverride, ConfigPaths, ConfigSource, ConfigTier,
    DEFAULT_CONFIG, DEPLOYMENT_CONFIG_PATH,
};
pub use merge::{deep_merge, deep_merge_all};
