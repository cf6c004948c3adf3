//! Settings loading and persistence
//!
//! Settings are read from a TOML or JSON file plus `TICKBRIDGE_*`
//! environment variables, and written back when the core changes the quota
//! window or selects a workspace.

pub mod loader;
pub mod store;

pub use loader::{
    apply_env_overrides, load, load_from_file, probe_config_paths, LoadedSettings,
    CONFIG_PATH_VAR,
};
pub use store::{FileSettingsStore, MemorySettingsStore};
