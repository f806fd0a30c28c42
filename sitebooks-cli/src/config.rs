use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sitebooks_categorize::{CompletionSettings, DEFAULT_BATCH_SIZE};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::state::ensure_sitebooks_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub ledger: LedgerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSection {
    pub model: String,
    /// OpenAI-compatible endpoint root; `/v1/chat/completions` is appended
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerSection {
    /// Relative paths resolve against the sitebooks home
    pub path: String,
    pub batch_size: usize,
}

impl Default for LlmSection {
    fn default() -> Self {
        let s = CompletionSettings::default();
        Self {
            model: s.model,
            base_url: "https://api.openai.com".to_string(),
            temperature: s.temperature,
            max_tokens: s.max_tokens,
            timeout_secs: 30,
        }
    }
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            path: "ledger.json".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl LlmSection {
    pub fn completion_settings(&self) -> CompletionSettings {
        CompletionSettings {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl LedgerSection {
    pub fn resolve(&self, home: &Path) -> PathBuf {
        let p = PathBuf::from(&self.path);
        if p.is_absolute() { p } else { home.join(p) }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_sitebooks_home()?.join("config.toml"))
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.llm.max_tokens, 500);
        assert_eq!(cfg.ledger.batch_size, 10);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let cfg = parse_config(
            r#"
[llm]
model = "gpt-4o"
timeout_secs = 0

[ledger]
path = "/var/lib/sitebooks/books.json"
"#,
        )
        .unwrap();
        assert_eq!(cfg.llm.model, "gpt-4o");
        assert_eq!(cfg.llm.base_url, "https://api.openai.com");
        assert_eq!(cfg.llm.timeout(), Duration::from_secs(1));
        assert_eq!(cfg.ledger.batch_size, 10);
        assert_eq!(
            cfg.ledger.resolve(Path::new("/home/x/.sitebooks")),
            PathBuf::from("/var/lib/sitebooks/books.json")
        );
    }

    #[test]
    fn test_relative_ledger_path_resolves_against_home() {
        let home = Path::new("/home/x/.sitebooks");
        assert_eq!(
            LedgerSection::default().resolve(home),
            PathBuf::from("/home/x/.sitebooks/ledger.json")
        );
    }

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        assert_eq!(parse_config(&s).unwrap(), Config::default());
    }

    #[test]
    fn test_settings_follow_config() {
        let mut cfg = Config::default();
        cfg.llm.temperature = 0.3;
        let s = cfg.llm.completion_settings();
        assert_eq!(s.temperature, 0.3);
        assert_eq!(s.model, "gpt-4o-mini");
    }
}
