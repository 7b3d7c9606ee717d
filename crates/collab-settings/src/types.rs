use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollabSettings {
    pub server: ServerSettings,
    pub agent: AgentSettings,
    pub rate_limit: RateLimitSettings,
    pub anthropic: AnthropicSettings,
    pub supabase: SupabaseSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

/// HTTP listener and CORS settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the API from a browser.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

/// Agent loop bounds and model parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentSettings {
    pub model: String,
    pub max_tokens: u32,
    pub max_iterations: u32,
    /// Overall deadline for one command, in seconds.
    pub timeout_secs: u64,
    /// Upper bound for a single tool call, in seconds.
    pub tool_timeout_secs: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_tokens: 4096,
            max_iterations: 15,
            timeout_secs: 60,
            tool_timeout_secs: 30,
        }
    }
}

impl AgentSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

/// Per-board admission window.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_secs: u64,
    /// How often idle buckets are swept from memory.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_secs: 60,
            sweep_interval_secs: 60,
        }
    }
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnthropicSettings {
    /// Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for AnthropicSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.anthropic.com".to_string(),
        }
    }
}

impl AnthropicSettings {
    pub fn api_key(&self) -> Option<SecretString> {
        self.api_key.clone().filter(|k| !k.is_empty()).map(SecretString::from)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupabaseSettings {
    pub url: Option<String>,
    #[serde(skip_serializing)]
    pub service_role_key: Option<String>,
}

impl SupabaseSettings {
    /// Both the project URL and the service-role key, when configured.
    pub fn credentials(&self) -> Option<(String, SecretString)> {
        let url = self.url.clone().filter(|u| !u.is_empty())?;
        let key = self.service_role_key.clone().filter(|k| !k.is_empty())?;
        Some((url, SecretString::from(key)))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    pub sqlite_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        Self {
            sqlite_path: PathBuf::from(home).join(".collab").join("board.db"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_match_service_limits() {
        let s = CollabSettings::default();
        assert_eq!(s.server.port, 8000);
        assert_eq!(s.server.allowed_origins, vec!["http://localhost:5173"]);
        assert_eq!(s.rate_limit.max_requests, 10);
        assert_eq!(s.rate_limit.window(), Duration::from_secs(60));
        assert_eq!(s.agent.max_iterations, 15);
        assert_eq!(s.agent.timeout(), Duration::from_secs(60));
        assert_eq!(s.agent.max_tokens, 4096);
        assert_eq!(s.agent.model, "claude-sonnet-4-5-20250929");
    }

    #[test]
    fn secrets_are_not_serialized() {
        let mut s = CollabSettings::default();
        s.anthropic.api_key = Some("sk-ant-secret".into());
        s.supabase.service_role_key = Some("service-secret".into());
        let json = serde_json::to_string(&s).unwrap();
        assert!(!json.contains("sk-ant-secret"));
        assert!(!json.contains("service-secret"));
    }

    #[test]
    fn secrets_deserialize_from_file_values() {
        let s: CollabSettings = serde_json::from_value(serde_json::json!({
            "anthropic": {"apiKey": "sk-1"},
            "supabase": {"url": "https://x.supabase.co", "serviceRoleKey": "k"}
        }))
        .unwrap();
        assert_eq!(s.anthropic.api_key().unwrap().expose_secret(), "sk-1");
        let (url, key) = s.supabase.credentials().unwrap();
        assert_eq!(url, "https://x.supabase.co");
        assert_eq!(key.expose_secret(), "k");
    }

    #[test]
    fn supabase_requires_both_values() {
        let s = SupabaseSettings {
            url: Some("https://x.supabase.co".into()),
            service_role_key: None,
        };
        assert!(s.credentials().is_none());
        let s = SupabaseSettings {
            url: Some(String::new()),
            service_role_key: Some("k".into()),
        };
        assert!(s.credentials().is_none());
    }

    #[test]
    fn empty_api_key_is_absent() {
        let s = AnthropicSettings {
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(s.api_key().is_none());
    }
}
