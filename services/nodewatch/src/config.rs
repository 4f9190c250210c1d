//! Configuration types for the nodewatch service

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::model::NodeCategory;

/// Environment variable holding the secure-node API key
pub const ENV_SECURE_KEY: &str = "SEC_KEY";
/// Environment variable holding the super-node API key
pub const ENV_SUPER_KEY: &str = "SUP_KEY";
/// Environment variable holding the webhook URL
pub const ENV_WEBHOOK: &str = "DISCORD_WEBHOOK";
/// Environment variable holding a JSON array of ignored secure-node ids
pub const ENV_SECURE_IGNORE: &str = "SECNODE_IGNORE";
/// Environment variable holding a JSON array of ignored super-node ids
pub const ENV_SUPER_IGNORE: &str = "SUPNODE_IGNORE";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_secure")]
    pub secure: CategoryConfig,
    #[serde(rename = "super", default = "default_super")]
    pub super_nodes: CategoryConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub format: FormatConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secure: default_secure(),
            super_nodes: default_super(),
            webhook: WebhookConfig::default(),
            format: FormatConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

/// Endpoint, credential and ignore list for one node category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub base_url: String,
    pub detail_url_base: String,
    #[serde(default)]
    pub api_key: String,
    /// Node ids that never alert; `None` until set by the file or the environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore: Option<Vec<u64>>,
}

/// Chat webhook destination and message decoration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_avatar_url")]
    pub avatar_url: Option<String>,
    #[serde(default = "default_icon_url")]
    pub icon_url: Option<String>,
    #[serde(default = "default_color")]
    pub color: u32,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: default_username(),
            avatar_url: default_avatar_url(),
            icon_url: default_icon_url(),
            color: default_color(),
        }
    }
}

/// How surviving records are packed into messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FormatStrategy {
    /// One rich embed per record
    #[default]
    Embeds,
    /// One text line per record, packed into plain messages
    Text,
}

/// Formatter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatConfig {
    #[serde(default)]
    pub strategy: FormatStrategy,
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
    #[serde(default = "default_max_embeds_per_message")]
    pub max_embeds_per_message: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            strategy: FormatStrategy::default(),
            max_message_chars: default_max_message_chars(),
            max_embeds_per_message: default_max_embeds_per_message(),
        }
    }
}

/// What a failed fetch does to the rest of the sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorPolicy {
    /// Stop the run at the first failed fetch
    #[default]
    Abort,
    /// Record the failure and move on to the next pair
    Continue,
}

/// Status API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub on_error: FetchErrorPolicy,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            on_error: FetchErrorPolicy::default(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Config {
    /// Settings for a node category
    pub fn category(&self, category: NodeCategory) -> &CategoryConfig {
        match category {
            NodeCategory::Secure => &self.secure,
            NodeCategory::Super => &self.super_nodes,
        }
    }

    /// Fill credentials and ignore lists from the process environment
    pub fn resolve_secrets(&mut self) -> crate::Result<()> {
        self.resolve_secrets_with(|name| std::env::var(name).ok())
    }

    /// Fill credentials and ignore lists from `lookup`.
    ///
    /// Keys and the webhook URL from the environment replace file values;
    /// ignore ids from the environment are added to the file's lists.
    pub fn resolve_secrets_with<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_SECURE_KEY) {
            self.secure.api_key = key;
        }
        if let Some(key) = lookup(ENV_SUPER_KEY) {
            self.super_nodes.api_key = key;
        }
        if let Some(url) = lookup(ENV_WEBHOOK) {
            self.webhook.url = url;
        }
        if let Some(raw) = lookup(ENV_SECURE_IGNORE) {
            merge_ignore(&mut self.secure.ignore, ENV_SECURE_IGNORE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SUPER_IGNORE) {
            merge_ignore(&mut self.super_nodes.ignore, ENV_SUPER_IGNORE, &raw)?;
        }
        Ok(())
    }

    /// Reject configurations the sweep cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        for category in NodeCategory::ALL {
            let settings = self.category(category);
            if settings.api_key.trim().is_empty() {
                return Err(crate::NodewatchError::Config(format!(
                    "missing API key for {} nodes",
                    category
                )));
            }
            check_url(&format!("{} base_url", category), &settings.base_url)?;
            check_url(
                &format!("{} detail_url_base", category),
                &settings.detail_url_base,
            )?;
        }

        if self.webhook.url.trim().is_empty() {
            return Err(crate::NodewatchError::Config(
                "missing webhook URL".to_string(),
            ));
        }
        check_url("webhook url", &self.webhook.url)?;

        for (category, var) in [
            (NodeCategory::Secure, ENV_SECURE_IGNORE),
            (NodeCategory::Super, ENV_SUPER_IGNORE),
        ] {
            if self.category(category).ignore.is_none() {
                return Err(crate::NodewatchError::Config(format!(
                    "missing ignore list for {} nodes (set {} or the file's ignore array)",
                    category, var
                )));
            }
        }

        if self.fetch.page_size == 0 {
            return Err(crate::NodewatchError::Config(
                "fetch.page_size must be at least 1".to_string(),
            ));
        }
        if self.fetch.timeout_seconds == 0 {
            return Err(crate::NodewatchError::Config(
                "fetch.timeout_seconds must be at least 1".to_string(),
            ));
        }
        if self.format.max_message_chars < MIN_MESSAGE_CHARS {
            return Err(crate::NodewatchError::Config(format!(
                "format.max_message_chars must be at least {}",
                MIN_MESSAGE_CHARS
            )));
        }
        if self.format.max_embeds_per_message == 0 {
            return Err(crate::NodewatchError::Config(
                "format.max_embeds_per_message must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Smallest message size that still leaves room for text after the ellipsis
const MIN_MESSAGE_CHARS: usize = 16;

fn merge_ignore(ignore: &mut Option<Vec<u64>>, var: &str, raw: &str) -> crate::Result<()> {
    let ids: Vec<u64> = serde_json::from_str(raw).map_err(|e| {
        crate::NodewatchError::Config(format!(
            "{} must be a JSON array of node ids: {}",
            var, e
        ))
    })?;
    let ignore = ignore.get_or_insert_with(Vec::new);
    for id in ids {
        if !ignore.contains(&id) {
            ignore.push(id);
        }
    }
    Ok(())
}

fn check_url(what: &str, value: &str) -> crate::Result<()> {
    let parsed = reqwest::Url::parse(value)
        .map_err(|e| crate::NodewatchError::Config(format!("invalid {}: {}", what, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(crate::NodewatchError::Config(format!(
            "invalid {}: unsupported scheme '{}'",
            what, other
        ))),
    }
}

fn default_secure() -> CategoryConfig {
    CategoryConfig {
        base_url: "https://securenodes2.na.zensystem.io/api".to_string(),
        detail_url_base: "https://securenodes2.na.zensystem.io/nodes/".to_string(),
        api_key: String::new(),
        ignore: None,
    }
}

fn default_super() -> CategoryConfig {
    CategoryConfig {
        base_url: "https://supernodes2.na.zensystem.io/api".to_string(),
        detail_url_base: "https://supernodes1.na.zensystem.io/nodes/".to_string(),
        api_key: String::new(),
        ignore: None,
    }
}

fn default_username() -> String {
    "3jane".to_string()
}

fn default_avatar_url() -> Option<String> {
    Some("https://winklevosscapital.com/wp-content/uploads/2020/04/Jane-Profile.jpg".to_string())
}

fn default_icon_url() -> Option<String> {
    Some("https://www.worldcryptoindex.com/wp-content/uploads/2018/10/horizen-logo.jpg".to_string())
}

fn default_color() -> u32 {
    15258703
}

fn default_max_message_chars() -> usize {
    2000
}

fn default_max_embeds_per_message() -> usize {
    10
}

fn default_page_size() -> u32 {
    100
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::NodewatchError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content).map_err(|e| {
        crate::NodewatchError::Config(format!("Failed to parse config file {:?}: {}", path, e))
    })?;
    Ok(config)
}
