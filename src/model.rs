use serde::Deserialize;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FormMode {
    #[default]
    Create,
    Edit,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// UI language tag ("de" or "en"); also picks the license link.
    #[serde(default = "default_language")]
    pub language: String,
    /// License the contributor accepts: "cc" or "odbl".
    #[serde(default = "default_license")]
    pub license: String,
    #[serde(default)]
    pub mode: FormMode,
    /// Command line that receives the composed entry as --flags and
    /// prints a JSON envelope on stdout.
    #[serde(default = "default_submit_cmd")]
    pub submit_cmd: String,
    /// Command line that receives the composed address and prints a JSON
    /// envelope with lat/lng.
    #[serde(default = "default_geocode_cmd")]
    pub geocode_cmd: String,
    #[serde(default = "default_max_description_len")]
    pub max_description_len: usize,
    /// Initial field values, e.g. the entry being edited.
    #[serde(default)]
    pub initial: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            license: default_license(),
            mode: FormMode::Create,
            submit_cmd: default_submit_cmd(),
            geocode_cmd: default_geocode_cmd(),
            max_description_len: default_max_description_len(),
            initial: HashMap::new(),
        }
    }
}

fn default_language() -> String {
    "en".into()
}

fn default_license() -> String {
    "cc".into()
}

fn default_submit_cmd() -> String {
    "ofdb-cli entry-save".into()
}

fn default_geocode_cmd() -> String {
    "ofdb-cli geocode".into()
}

fn default_max_description_len() -> usize {
    250
}

/// Load config from OFDB_TUI_CONFIG, falling back to ./ofdb-tui.yaml,
/// falling back to defaults.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let path = std::env::var("OFDB_TUI_CONFIG")
        .ok()
        .map(std::path::PathBuf::from)
        .or_else(|| {
            let p = std::path::PathBuf::from("ofdb-tui.yaml");
            p.exists().then_some(p)
        });
    let cfg = match path {
        Some(p) => {
            let s = std::fs::read_to_string(&p)
                .map_err(|e| anyhow::anyhow!("reading {}: {e}", p.display()))?;
            serde_yaml::from_str::<AppConfig>(&s)
                .map_err(|e| anyhow::anyhow!("parsing {}: {e}", p.display()))?
        }
        None => AppConfig::default(),
    };
    validate_app_config(&cfg).map_err(|e| anyhow::anyhow!(e))?;
    Ok(cfg)
}

pub(crate) fn validate_app_config(cfg: &AppConfig) -> Result<(), String> {
    if cfg.submit_cmd.trim().is_empty() {
        return Err("submit_cmd must not be empty".into());
    }
    if cfg.geocode_cmd.trim().is_empty() {
        return Err("geocode_cmd must not be empty".into());
    }
    match cfg.language.to_ascii_lowercase().as_str() {
        "de" | "en" => {}
        other => return Err(format!("unsupported language: '{other}'")),
    }
    match cfg.license.to_ascii_lowercase().as_str() {
        "cc" | "odbl" => {}
        other => return Err(format!("unsupported license: '{other}'")),
    }
    if cfg.max_description_len == 0 {
        return Err("max_description_len must be positive".into());
    }
    if cfg.mode == FormMode::Edit && cfg.initial.is_empty() {
        return Err("edit mode requires initial field values".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(validate_app_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn validate_rejects_unknown_language() {
        let cfg = AppConfig {
            language: "fr".into(),
            ..Default::default()
        };
        let err = validate_app_config(&cfg).unwrap_err();
        assert!(err.contains("unsupported language"));
    }

    #[test]
    fn validate_edit_mode_needs_initial_values() {
        let cfg = AppConfig {
            mode: FormMode::Edit,
            ..Default::default()
        };
        let err = validate_app_config(&cfg).unwrap_err();
        assert!(err.contains("initial"));
    }

    #[test]
    fn config_parses_from_yaml() {
        let cfg: AppConfig = serde_yaml::from_str(
            r#"
language: de
license: odbl
mode: edit
submit_cmd: "ofdb-cli entry-save --id abc"
initial:
  title: "Repair Café"
  category: "2cd00bebec0c48ba9db761da48678134"
"#,
        )
        .unwrap();
        assert_eq!(cfg.language, "de");
        assert_eq!(cfg.mode, FormMode::Edit);
        assert_eq!(cfg.max_description_len, 250);
        assert_eq!(cfg.initial.get("title").unwrap(), "Repair Café");
        assert!(validate_app_config(&cfg).is_ok());
    }
}
