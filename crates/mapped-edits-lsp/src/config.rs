use serde::Deserialize;
use std::time::Duration;

/// Root configuration for the mapped-edits-lsp server.
///
/// Provided by the LSP client through initialization options. Every field
/// has a default, so an empty object is a valid configuration.
///
/// # Examples
///
/// ```
/// use mapped_edits_lsp::config::MappedEditsConfig;
///
/// let json = r#"{
///     "extHost": { "command": "mapped-edits-ext-host" },
///     "providerTimeoutMs": 5000
/// }"#;
///
/// let config: MappedEditsConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.ext_host.command.as_deref(), Some("mapped-edits-ext-host"));
/// assert!(config.builtin_providers);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedEditsConfig {
    #[serde(default)]
    pub ext_host: ExtHostConfig,
    /// Cancels a request after this many milliseconds; `0` disables the limit.
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,
    /// Whether the extension host registers its built-in providers.
    #[serde(default = "default_true")]
    pub builtin_providers: bool,
    /// Treat URIs that differ only in path case as the same resource.
    #[serde(default)]
    pub ignore_path_casing: bool,
}

impl MappedEditsConfig {
    pub fn provider_timeout(&self) -> Option<Duration> {
        (self.provider_timeout_ms > 0).then(|| Duration::from_millis(self.provider_timeout_ms))
    }
}

impl Default for MappedEditsConfig {
    fn default() -> Self {
        Self {
            ext_host: ExtHostConfig::default(),
            provider_timeout_ms: default_provider_timeout_ms(),
            builtin_providers: true,
            ignore_path_casing: false,
        }
    }
}

/// How to reach the extension host.
///
/// Without a `command` the extension host runs inside the server process.
///
/// # Examples
///
/// ```
/// use mapped_edits_lsp::config::ExtHostConfig;
///
/// let config = ExtHostConfig {
///     command: Some("/usr/local/bin/mapped-edits-ext-host".into()),
///     args: vec!["--ignore-path-casing".into()],
/// };
/// assert!(config.is_external());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtHostConfig {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ExtHostConfig {
    pub fn is_external(&self) -> bool {
        self.command.is_some()
    }
}

const fn default_true() -> bool {
    true
}

const fn default_provider_timeout_ms() -> u64 {
    30_000
}
