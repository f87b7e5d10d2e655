use std::env;

pub const SERPAPI_KEY_VAR: &str = "SERPAPI_API_KEY";
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable(s): {}", .0.join(", "))]
    MissingKeys(Vec<&'static str>),
}

/// Secret string that never shows up in `Debug` output or logs.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Credentials required before any lookup can run.
#[derive(Debug, Clone)]
pub struct Config {
    pub serpapi_key: ApiKey,
    pub openai_key: ApiKey,
}

impl Config {
    /// Reads both API keys from the environment, reporting every missing one at once.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let serpapi = read(SERPAPI_KEY_VAR);
        let openai = read(OPENAI_KEY_VAR);

        match (serpapi, openai) {
            (Some(s), Some(o)) => Ok(Self {
                serpapi_key: ApiKey::new(s),
                openai_key: ApiKey::new(o),
            }),
            (s, o) => {
                let mut missing = Vec::new();
                if s.is_none() {
                    missing.push(SERPAPI_KEY_VAR);
                }
                if o.is_none() {
                    missing.push(OPENAI_KEY_VAR);
                }
                Err(ConfigError::MissingKeys(missing))
            }
        }
    }
}
