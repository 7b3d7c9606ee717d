//! Settings loading with deep merge and environment variable overrides.
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::CollabSettings;

/// Resolve the settings file path: `$COLLAB_CONFIG`, else `./collab.json`.
pub fn settings_path() -> PathBuf {
    std::env::var("COLLAB_CONFIG")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("collab.json"))
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<CollabSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
pub fn load_settings_from_path(path: &Path) -> Result<CollabSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults with the settings file merged over them, no env overrides.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_file_layer(path: &Path) -> Result<CollabSettings> {
    let defaults = serde_json::to_value(CollabSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut CollabSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary lookup.
///
/// Invalid values are ignored with a warning, leaving the file/default value.
pub fn apply_overrides(settings: &mut CollabSettings, lookup: impl Fn(&str) -> Option<String>) {
    let string = |name: &str| lookup(name).filter(|v| !v.is_empty());
    let ranged = |name: &str, min: u64, max: u64| {
        let val = string(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid integer env var, ignoring");
        }
        result
    };

    // ── Credentials ─────────────────────────────────────────────────
    if let Some(v) = string("ANTHROPIC_API_KEY") {
        settings.anthropic.api_key = Some(v);
    }
    if let Some(v) = string("ANTHROPIC_BASE_URL") {
        settings.anthropic.base_url = v;
    }
    if let Some(v) = string("SUPABASE_URL") {
        settings.supabase.url = Some(v);
    }
    if let Some(v) = string("SUPABASE_SERVICE_ROLE_KEY") {
        settings.supabase.service_role_key = Some(v);
    }

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = string("ALLOWED_ORIGINS") {
        settings.server.allowed_origins = parse_origin_list(&v);
    }
    if let Some(v) = string("COLLAB_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = string("COLLAB_PORT") {
        match parse_u16_range(&v, 1, 65535) {
            Some(port) => settings.server.port = port,
            None => tracing::warn!(key = "COLLAB_PORT", value = %v, "invalid port env var, ignoring"),
        }
    }

    // ── Agent ───────────────────────────────────────────────────────
    if let Some(v) = string("COLLAB_MODEL") {
        settings.agent.model = v;
    }
    if let Some(v) = ranged("COLLAB_MAX_ITERATIONS", 1, 100) {
        settings.agent.max_iterations = v as u32;
    }
    if let Some(v) = ranged("COLLAB_AGENT_TIMEOUT_SECS", 1, 3_600) {
        settings.agent.timeout_secs = v;
    }
    if let Some(v) = ranged("COLLAB_TOOL_TIMEOUT_SECS", 1, 3_600) {
        settings.agent.tool_timeout_secs = v;
    }

    // ── Rate limit ──────────────────────────────────────────────────
    if let Some(v) = ranged("COLLAB_RATE_LIMIT", 1, 10_000) {
        settings.rate_limit.max_requests = v as u32;
    }
    if let Some(v) = ranged("COLLAB_RATE_WINDOW_SECS", 1, 86_400) {
        settings.rate_limit.window_secs = v;
    }

    // ── Storage & logging ───────────────────────────────────────────
    if let Some(v) = string("COLLAB_SQLITE_PATH") {
        settings.storage.sqlite_path = PathBuf::from(v);
    }
    if let Some(v) = string("COLLAB_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = string("COLLAB_LOG_JSON") {
        match parse_bool(&v) {
            Some(b) => settings.logging.json = b,
            None => tracing::warn!(key = "COLLAB_LOG_JSON", value = %v, "invalid boolean env var, ignoring"),
        }
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse an origin list given either as a JSON array or comma separated.
pub fn parse_origin_list(val: &str) -> Vec<String> {
    if let Ok(list) = serde_json::from_str::<Vec<String>>(val) {
        return list;
    }
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"server": {"port": 8000, "host": "0.0.0.0"}});
        let source = serde_json::json!({"server": {"port": 9090}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["port"], 9090);
        assert_eq!(merged["server"]["host"], "0.0.0.0");
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"items": [1, 2, 3]});
        let source = serde_json::json!({"items": [4]});
        assert_eq!(deep_merge(target, source)["items"], serde_json::json!([4]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let target = serde_json::json!({"a": {"nested": true}});
        let source = serde_json::json!({"a": 42});
        assert_eq!(deep_merge(target, source)["a"], 42);
    }

    // ── file layer ──────────────────────────────────────────────────

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_file_layer(&dir.path().join("nope.json")).unwrap();
        assert_eq!(s.server.port, 8000);
        assert_eq!(s.rate_limit.max_requests, 10);
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collab.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"{{"rateLimit": {{"maxRequests": 3}}, "server": {{"allowedOrigins": ["https://board.app"]}}}}"#
        )
        .unwrap();

        let s = load_file_layer(&path).unwrap();
        assert_eq!(s.rate_limit.max_requests, 3);
        assert_eq!(s.rate_limit.window_secs, 60, "untouched keys keep defaults");
        assert_eq!(s.server.allowed_origins, vec!["https://board.app"]);
        assert_eq!(s.server.port, 8000);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collab.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_file_layer(&path),
            Err(crate::SettingsError::Json(_))
        ));
    }

    // ── overrides ───────────────────────────────────────────────────

    #[test]
    fn overrides_apply_valid_values() {
        let mut s = CollabSettings::default();
        apply_overrides(
            &mut s,
            lookup(&[
                ("ANTHROPIC_API_KEY", "sk-ant"),
                ("SUPABASE_URL", "https://x.supabase.co"),
                ("SUPABASE_SERVICE_ROLE_KEY", "srk"),
                ("ALLOWED_ORIGINS", "https://a.app, https://b.app"),
                ("COLLAB_PORT", "9000"),
                ("COLLAB_RATE_LIMIT", "5"),
                ("COLLAB_RATE_WINDOW_SECS", "30"),
                ("COLLAB_MAX_ITERATIONS", "4"),
                ("COLLAB_AGENT_TIMEOUT_SECS", "20"),
                ("COLLAB_LOG_JSON", "off"),
            ]),
        );
        assert_eq!(s.anthropic.api_key.as_deref(), Some("sk-ant"));
        assert!(s.supabase.credentials().is_some());
        assert_eq!(s.server.allowed_origins, vec!["https://a.app", "https://b.app"]);
        assert_eq!(s.server.port, 9000);
        assert_eq!(s.rate_limit.max_requests, 5);
        assert_eq!(s.rate_limit.window_secs, 30);
        assert_eq!(s.agent.max_iterations, 4);
        assert_eq!(s.agent.timeout_secs, 20);
        assert!(!s.logging.json);
    }

    #[test]
    fn overrides_ignore_invalid_values() {
        let mut s = CollabSettings::default();
        apply_overrides(
            &mut s,
            lookup(&[
                ("COLLAB_PORT", "0"),
                ("COLLAB_RATE_LIMIT", "lots"),
                ("COLLAB_MAX_ITERATIONS", "1000"),
                ("COLLAB_LOG_JSON", "maybe"),
                ("ANTHROPIC_API_KEY", ""),
            ]),
        );
        assert_eq!(s.server.port, 8000);
        assert_eq!(s.rate_limit.max_requests, 10);
        assert_eq!(s.agent.max_iterations, 15);
        assert!(s.logging.json);
        assert!(s.anthropic.api_key.is_none());
    }

    // ── parsers ─────────────────────────────────────────────────────

    #[test]
    fn parse_bool_values() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("nah"), None);
    }

    #[test]
    fn parse_ranges() {
        assert_eq!(parse_u16_range("8000", 1, 65535), Some(8000));
        assert_eq!(parse_u16_range("70000", 1, 65535), None);
        assert_eq!(parse_u64_range("0", 1, 10), None);
        assert_eq!(parse_u64_range("10", 1, 10), Some(10));
        assert_eq!(parse_u64_range("-1", 1, 10), None);
    }

    #[test]
    fn parse_origin_list_accepts_json_or_csv() {
        assert_eq!(
            parse_origin_list(r#"["http://localhost:5173","https://x.app"]"#),
            vec!["http://localhost:5173", "https://x.app"]
        );
        assert_eq!(parse_origin_list("a, b,,c"), vec!["a", "b", "c"]);
    }
}
