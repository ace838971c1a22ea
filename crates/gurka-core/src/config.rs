use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::fields::BoostSchedule;

const DEFAULT_REPORTS_DIR: &str = "./GurkaFiles";
const DEFAULT_INDEX_DIR: &str = "./GurkaFiles/Index";

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        // GURKA_DATA__INDEX_DIR -> data.index_dir
        figment = figment.merge(Env::prefixed("GURKA_").split("__"));

        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    /// Build from an inline TOML document, without touching files or the environment.
    pub fn from_toml_str(toml: &str) -> anyhow::Result<Self> {
        let config = Self { figment: Figment::new().merge(Toml::string(toml)) };
        config.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get::<String>(key).unwrap_or_else(|_| default.to_string())
    }

    /// Directory holding `*.gurka` report files.
    pub fn reports_dir(&self) -> PathBuf {
        expand_path(self.get_or("data.reports_dir", DEFAULT_REPORTS_DIR))
    }

    /// Root under which each product gets its own index directory.
    pub fn index_dir(&self) -> PathBuf {
        expand_path(self.get_or("data.index_dir", DEFAULT_INDEX_DIR))
    }

    /// Default boosts with any `[search.boosts]` overrides applied.
    pub fn boosts(&self) -> anyhow::Result<BoostSchedule> {
        let overrides: HashMap<String, f32> = if self.figment.contains("search.boosts") {
            self.get("search.boosts")?
        } else {
            HashMap::new()
        };
        Ok(BoostSchedule::default().with_overrides(&overrides)?)
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.boosts().map(|_| ())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
