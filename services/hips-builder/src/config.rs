//! Run configuration loading.

use anyhow::{Context, Result};
use hips_common::RunConfig;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Load a YAML run configuration with environment variable substitution
/// and validate it.
pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read run config from {:?}", path.as_ref()))?;

    let expanded = substitute_env(&content)?;

    let config: RunConfig = serde_yaml::from_str(&expanded)
        .with_context(|| format!("Failed to parse run config from {:?}", path.as_ref()))?;

    hips_pipeline::validate_config(&config)?;

    Ok(config)
}

/// Command-line settings that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub java: Option<PathBuf>,
    pub jar: Option<PathBuf>,
    pub only: Vec<String>,
}

impl Overrides {
    /// Apply to `config`. `only` keeps the named maps, in config order.
    pub fn apply(&self, config: &mut RunConfig) -> Result<()> {
        if let Some(java) = &self.java {
            config.hipsgen.java = java.clone();
        }
        if let Some(jar) = &self.jar {
            config.hipsgen.jar = jar.clone();
        }

        if !self.only.is_empty() {
            let known: HashSet<&str> = config.jobs.iter().map(|j| j.tag.as_str()).collect();
            let unknown: Vec<&str> = self
                .only
                .iter()
                .map(String::as_str)
                .filter(|tag| !known.contains(tag))
                .collect();
            anyhow::ensure!(unknown.is_empty(), "Unknown map tag(s) in --only: {}", unknown.join(", "));

            config.jobs.retain(|job| self.only.contains(&job.tag));
        }
        Ok(())
    }
}

/// Replace `${NAME}` and `${NAME:-fallback}` references with values from
/// the environment. The fallback applies when `NAME` is unset or empty and
/// runs to the first `}`. A `$` not followed by `{` is kept as is.
fn substitute_env(content: &str) -> Result<String> {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let reference = &rest[start + 2..];
        let end = reference
            .find('}')
            .with_context(|| format!("Unterminated '${{' in run config near: {}", first_line(reference)))?;
        out.push_str(&env_value(&reference[..end])?);
        rest = &reference[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn env_value(reference: &str) -> Result<String> {
    let (name, fallback) = match reference.split_once(":-") {
        Some((name, fallback)) => (name.trim(), Some(fallback)),
        None => (reference.trim(), None),
    };
    match (std::env::var(name), fallback) {
        (Ok(value), Some(fallback)) if value.is_empty() => Ok(fallback.to_string()),
        (Ok(value), _) => Ok(value),
        (Err(_), Some(fallback)) => Ok(fallback.to_string()),
        (Err(_), None) => anyhow::bail!("Environment variable {} referenced in run config is not set", name),
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
