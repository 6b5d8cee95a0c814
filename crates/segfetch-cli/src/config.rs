//! Settings file and its merge with command-line flags.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use segfetch::headers::parse_header_line;
use segfetch::{ClientSetting, FetchOptions, Url};
use serde::Deserialize;

use crate::cli::App;

/// Connect limit when neither flag nor file sets one.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A body silent for this long counts as a dropped connection and is retried.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Contents of `--config <file>`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub segments:             Option<u32>,
    pub max_retries:          Option<u32>,
    pub retry_backoff_ms:     Option<u64>,
    pub chunk_size:           Option<usize>,
    pub timeout_secs:         Option<u64>,
    pub default_headers:      Option<bool>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs:    Option<u64>,
    pub proxies:              Vec<String>,
    pub headers:              BTreeMap<String, String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> { Ok(toml::from_str(text)?) }

    /// Transport settings for the HTTP client, with the same precedence as
    /// [`Config::into_options`]. Flag proxies replace file proxies.
    pub fn client_setting(&self, app: &App) -> Result<ClientSetting> {
        let connect = app
            .connect_timeout_secs
            .or(self.connect_timeout_secs)
            .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_secs);
        let read = app
            .read_timeout_secs
            .or(self.read_timeout_secs)
            .map_or(DEFAULT_READ_TIMEOUT, Duration::from_secs);

        let raw = if app.proxies.is_empty() { &self.proxies } else { &app.proxies };
        let proxies = raw
            .iter()
            .map(|proxy| Url::parse(proxy).with_context(|| format!("bad proxy url {proxy:?}")))
            .collect::<Result<Vec<_>>>()?;

        Ok(ClientSetting {
            proxies:         (!proxies.is_empty()).then_some(proxies),
            connect_timeout: Some(connect),
            read_timeout:    Some(read),
        })
    }

    /// Build download options: built-in defaults, then this file, then flags.
    pub fn into_options(self, app: &App) -> Result<FetchOptions> {
        let mut options = FetchOptions::default();

        if let Some(segments) = app.task_count.or(self.segments) {
            options = options.segments(segments);
        }
        if let Some(retries) = app.retries.or(self.max_retries) {
            options = options.max_retries(retries);
        }
        if let Some(ms) = app.backoff_ms.or(self.retry_backoff_ms) {
            options = options.retry_backoff(Duration::from_millis(ms));
        }
        if let Some(size) = self.chunk_size {
            options = options.chunk_size(size);
        }
        if let Some(secs) = app.timeout_secs.or(self.timeout_secs) {
            options = options.total_timeout(Some(Duration::from_secs(secs)));
        }

        let use_defaults = !app.no_default_headers && self.default_headers.unwrap_or(true);
        options = options.use_default_headers(use_defaults);

        let mut headers: Vec<(String, String)> = self.headers.into_iter().collect();
        for line in &app.headers {
            let header = parse_header_line(line).with_context(|| format!("bad --header {line:?}"))?;
            headers.push(header);
        }
        Ok(options.headers(segfetch::headers::merge(&[], &headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn app(args: &[&str]) -> App {
        let mut argv = vec!["segfetch", "-i", "http://host/f", "-o", "f"];
        argv.extend_from_slice(args);
        App::parse_from(argv)
    }

    #[test]
    fn empty_config_uses_defaults() {
        let options = Config::default().into_options(&app(&[])).unwrap();
        assert_eq!(options.segments, 10);
        assert_eq!(options.max_retries, 3);
        assert!(options.total_timeout.is_none());
        assert!(options.use_default_headers);
    }

    #[test]
    fn parses_file() {
        let config = Config::parse(
            r#"
            segments = 16
            max_retries = 5
            retry_backoff_ms = 250
            chunk_size = 65536
            timeout_secs = 600

            [headers]
            Referer = "https://example.com/"
            "#,
        )
        .unwrap();
        assert_eq!(config.segments, Some(16));
        assert_eq!(config.headers.get("Referer").map(String::as_str), Some("https://example.com/"));

        let options = config.into_options(&app(&[])).unwrap();
        assert_eq!(options.segments, 16);
        assert_eq!(options.max_retries, 5);
        assert_eq!(options.retry_backoff, Duration::from_millis(250));
        assert_eq!(options.chunk_size, 65536);
        assert_eq!(options.total_timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn flags_override_file() {
        let config = Config::parse("segments = 16\n[headers]\nReferer = \"a\"").unwrap();
        let options = config
            .into_options(&app(&["-t", "2", "-H", "referer: b", "--no-default-headers"]))
            .unwrap();
        assert_eq!(options.segments, 2);
        assert!(!options.use_default_headers);
        assert_eq!(options.effective_headers(), vec![("referer".to_string(), "b".to_string())]);
    }

    #[test]
    fn client_setting_defaults() {
        let setting = Config::default().client_setting(&app(&[])).unwrap();
        assert_eq!(setting.connect_timeout, Some(DEFAULT_CONNECT_TIMEOUT));
        assert_eq!(setting.read_timeout, Some(DEFAULT_READ_TIMEOUT));
        assert!(setting.proxies.is_none());
    }

    #[test]
    fn client_setting_precedence() {
        let config = Config::parse(
            r#"
            connect_timeout_secs = 3
            read_timeout_secs = 20
            proxies = ["http://file-proxy:8080"]
            "#,
        )
        .unwrap();

        let setting = config.client_setting(&app(&[])).unwrap();
        assert_eq!(setting.connect_timeout, Some(Duration::from_secs(3)));
        assert_eq!(setting.read_timeout, Some(Duration::from_secs(20)));
        assert_eq!(setting.proxies.as_ref().map(Vec::len), Some(1));

        let setting = config
            .client_setting(&app(&["--read-timeout-secs", "7", "--proxy", "https://flag-proxy:443"]))
            .unwrap();
        assert_eq!(setting.read_timeout, Some(Duration::from_secs(7)));
        let proxies = setting.proxies.unwrap();
        assert_eq!(proxies.len(), 1);
        assert_eq!(proxies[0].host_str(), Some("flag-proxy"));
    }

    #[test]
    fn rejects_bad_proxy() {
        assert!(Config::default().client_setting(&app(&["--proxy", "not a url"])).is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(Config::parse("segmnets = 3").is_err());
    }

    #[test]
    fn rejects_bad_header_flag() {
        assert!(Config::default().into_options(&app(&["-H", "nonsense"])).is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segfetch.toml");
        std::fs::write(&path, "max_retries = 1\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().max_retries, Some(1));
        assert!(Config::load(&dir.path().join("missing.toml")).is_err());
    }
}
