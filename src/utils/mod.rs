use config::{Environment, File};
use std::path::Path;
use tracing::info;

use crate::models::common::Config;
use crate::models::errors::ConfigError;

pub fn load_config<P: AsRef<Path>>(file_name: P) -> Result<Config, ConfigError> {
    // Build the path to the config file
    let manifest_dir = env!("CARGO_MANIFEST_DIR").to_string();
    let config_path = Path::new(&manifest_dir).join(file_name);
    info!("Config path: {}", config_path.to_string_lossy());

    // YAML file first, then SIMULATOR__SECTION__KEY environment overrides
    let config = config::Config::builder()
        .add_source(File::from(config_path.as_path()))
        .add_source(Environment::with_prefix("SIMULATOR").separator("__"))
        .build()?
        .try_deserialize()?;

    Ok(config)
}

pub fn strip_html(error: &str) -> String {
    // If the error contains HTML tags, extract just the text content
    if error.contains("<!doctype html>") || error.contains("<html>") {
        // Remove all HTML tags and return the first non-empty line of text
        error
            .lines()
            .map(|line| line.trim())
            .find(|line| {
                !line.starts_with('<')
                    && !line.ends_with('>')
                    && !line.is_empty()
                    && *line != "html"
                    && *line != "body"
            })
            .unwrap_or(error)
            .to_string()
    } else {
        // Return original error if no HTML
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_gateway_html_down_to_text() {
        let error = "HTTP error 502 with body: <html>\n<head>\n</head>\nBad Gateway\n</html>";

        assert_eq!(strip_html(error), "Bad Gateway");
        assert_eq!(strip_html("connection refused"), "connection refused");
    }

    #[test]
    fn loads_bundled_config() {
        let config = load_config("config.yml").unwrap();
        let chains = &config.simulation.chains;

        assert!(chains.iter().any(|chain| chain.chain_id == 1));
        assert_eq!(config.simulation.timeout_ms, 10_000);
    }
}
