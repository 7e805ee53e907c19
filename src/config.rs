use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::{Path, PathBuf}};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Fixed rng seed; `None` seeds from the OS.
    pub seed: Option<u64>,
    pub log_predictions: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            seed: None,
            log_predictions: false,
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("invalid config JSON in {}", path.display()))
    }

    /// File (if one is found) then environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut cfg = match resolve_config_path() {
            Some(path) => {
                tracing::info!("loading config from {}", path.display());
                Self::load(&path)?
            }
            None => {
                tracing::info!("no config file found; using defaults");
                Self::default()
            }
        };
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// `lookup` maps an env var name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("BIND_ADDR") {
            self.bind_addr = addr;
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .parse()
                .with_context(|| format!("PORT is not a port number: {}", port))?;
            let host = self
                .bind_addr
                .rsplit_once(':')
                .map(|(h, _)| h)
                .unwrap_or("0.0.0.0");
            self.bind_addr = format!("{}:{}", host, port);
        }
        if let Some(seed) = lookup("PREDICTOR_SEED") {
            let seed = seed
                .parse()
                .with_context(|| format!("PREDICTOR_SEED is not a u64: {}", seed))?;
            self.seed = Some(seed);
        }
        if let Some(flag) = lookup("LOG_PRED") {
            self.log_predictions = flag == "1";
        }
        Ok(())
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }

    let mut candidates = vec![
        PathBuf::from("config/predictor.json"),
        PathBuf::from("predictor.json"),
    ];
    if let Ok(mut p) = std::env::current_exe() {
        p.pop(); // exe dir
        p.push("config/predictor.json");
        candidates.push(p);
    }

    candidates.into_iter().find(|c| c.exists())
}
