//! Contexts - which environment to talk to, with which token and policy
//!
//! `config.toml` lives in [`paths::config_dir`]:
//!
//! ```toml
//! current-context = "prod"
//!
//! [contexts.prod]
//! environment = "https://abc123.apps.example.com"
//! token-env = "DTCTL_PROD_TOKEN"
//! safety-level = "readwrite-mine"
//! user-id = "5f3c..."
//! ```

use anyhow::{Context, Result, bail};
use declarative::{SafetyChecker, SafetyLevel};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::paths;

/// Token override honored for every context
pub const ENV_TOKEN: &str = "DTCTL_TOKEN";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub current_context: Option<String>,
    #[serde(default)]
    pub contexts: BTreeMap<String, ContextConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ContextConfig {
    /// Environment base URL
    pub environment: String,
    /// Name of the environment variable holding the token
    #[serde(default)]
    pub token_env: Option<String>,
    /// Token stored inline (prefer `token-env`)
    #[serde(default)]
    pub token: Option<String>,
    /// Safety policy; absent means no policy
    #[serde(default)]
    pub safety_level: Option<SafetyLevel>,
    /// Caller identity used for ownership checks
    #[serde(default)]
    pub user_id: String,
}

/// A context resolved to everything a command needs
#[derive(Debug)]
pub struct Target {
    pub context: String,
    pub environment: String,
    pub token: String,
    pub safety: Option<SafetyChecker>,
}

impl Config {
    /// Load `config.toml` from the config directory; a missing file is empty
    pub fn load() -> Result<Self> {
        let path = paths::config_file()?;
        if !path.exists() {
            log::debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config format in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, ctx) in &self.contexts {
            if ctx.environment.trim().is_empty() {
                bail!("context '{}' has an empty environment URL", name);
            }
        }
        if let Some(current) = &self.current_context
            && !self.contexts.contains_key(current)
        {
            bail!("current-context '{}' is not defined", current);
        }
        Ok(())
    }

    /// Pick a context: the requested one, else `current-context`
    ///
    /// `--context` and `DTCTL_CONTEXT` both arrive as `requested`.
    pub fn context(&self, requested: Option<&str>) -> Result<(&str, &ContextConfig)> {
        let name = match requested.or(self.current_context.as_deref()) {
            Some(name) => name,
            None => bail!(
                "no context selected; pass --context, set DTCTL_CONTEXT, or set current-context in {}",
                paths::CONFIG_FILE
            ),
        };
        self.contexts
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .with_context(|| {
                let known: Vec<&str> = self.contexts.keys().map(String::as_str).collect();
                format!(
                    "unknown context '{}' (known: {})",
                    name,
                    if known.is_empty() {
                        "none".to_string()
                    } else {
                        known.join(", ")
                    }
                )
            })
    }

    /// Resolve a context into a target, reading tokens through `env`
    pub fn resolve(
        &self,
        requested: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Target> {
        let (name, ctx) = self.context(requested)?;
        let token = ctx.token(&env).with_context(|| {
            format!(
                "no token for context '{}'; set {} or configure token-env",
                name, ENV_TOKEN
            )
        })?;

        Ok(Target {
            context: name.to_string(),
            environment: ctx.environment.clone(),
            token,
            safety: ctx.safety_checker(),
        })
    }
}

impl ContextConfig {
    /// Token by precedence: `DTCTL_TOKEN`, `token-env`, inline `token`
    pub fn token(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        let non_empty = |s: String| (!s.trim().is_empty()).then_some(s);
        env(ENV_TOKEN)
            .and_then(non_empty)
            .or_else(|| self.token_env.as_deref().and_then(&env).and_then(non_empty))
            .or_else(|| self.token.clone().and_then(non_empty))
    }

    pub fn safety_checker(&self) -> Option<SafetyChecker> {
        self.safety_level
            .map(|level| SafetyChecker::new(level, self.user_id.clone()))
    }
}
