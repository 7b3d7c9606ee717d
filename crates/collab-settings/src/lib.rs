//! # collab-settings
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** - [`CollabSettings::default()`]
//! 2. **Settings file** - `collab.json` or `$COLLAB_CONFIG` (deep-merged over defaults)
//! 3. **Environment variables** - `ANTHROPIC_API_KEY`, `SUPABASE_*`, `COLLAB_*` (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_file_layer, load_settings, load_settings_from_path,
    settings_path,
};
pub use types::*;
