//! Layered settings: defaults, `config.json`, `modvault.toml`, `MODVAULT_*`
//! environment variables, then command-line flags.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml};
use modvault_catalog::{DEFAULT_API_URL, ModelType, TypeFilter};
use serde::{Deserialize, Serialize};

pub const CONFIG_JSON: &str = "config.json";
pub const CONFIG_TOML: &str = "modvault.toml";
pub const ENV_PREFIX: &str = "MODVAULT_";

/// Key names follow the `config.json` files users already have.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub civitai_api_key:           Option<String>,
    pub debug_mode:                bool,
    pub only_size:                 bool,
    pub force_recheck:             bool,
    /// Accepted for compatibility; every selected file is fetched regardless.
    pub get_small_files:           bool,
    pub favorites_only:            bool,
    pub first_page_only:           bool,
    pub include_checkpoints:       bool,
    pub include_lora:              bool,
    pub include_textual_inversion: bool,
    pub include_hypernets:         bool,
    pub include_aesthetic_grads:   bool,
    pub include_control_net:       bool,
    pub include_poses:             bool,
    /// Accepted for compatibility; processing is sequential.
    pub threads:                   u32,
    pub api_url:                   String,
    pub output_dir:                PathBuf,
    pub ledger_path:               PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            civitai_api_key:           None,
            debug_mode:                false,
            only_size:                 false,
            force_recheck:             false,
            get_small_files:           false,
            favorites_only:            false,
            first_page_only:           false,
            include_checkpoints:       true,
            include_lora:              true,
            include_textual_inversion: true,
            include_hypernets:         true,
            include_aesthetic_grads:   true,
            include_control_net:       true,
            include_poses:             true,
            threads:                   1,
            api_url:                   DEFAULT_API_URL.to_string(),
            output_dir:                PathBuf::from("."),
            ledger_path:               PathBuf::from("memory.json"),
        }
    }
}

/// Values set on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_size:       Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_recheck:   Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorites_only:  Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_page_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir:      Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_path:     Option<PathBuf>,
}

impl Settings {
    pub fn figment(config: Option<&Path>, overrides: &Overrides) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Json::file(CONFIG_JSON))
            .merge(Toml::file(CONFIG_TOML));

        if let Some(path) = config {
            figment = match path.extension().and_then(|e| e.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                _ => figment.merge(Json::file(path)),
            };
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides))
    }

    pub fn load(config: Option<&Path>, overrides: &Overrides) -> Result<Self, figment::Error> {
        Self::figment(config, overrides).extract()
    }

    pub fn api_key(&self) -> Option<&str> { self.civitai_api_key.as_deref().filter(|k| !k.is_empty()) }

    pub fn type_filter(&self) -> TypeFilter {
        let flags = [
            (self.include_checkpoints, ModelType::Checkpoint),
            (self.include_lora, ModelType::Lora),
            (self.include_textual_inversion, ModelType::TextualInversion),
            (self.include_hypernets, ModelType::Hypernetwork),
            (self.include_aesthetic_grads, ModelType::AestheticGradient),
            (self.include_control_net, ModelType::ControlNet),
            (self.include_poses, ModelType::Poses),
        ];
        TypeFilter::new(flags.into_iter().filter_map(|(on, t)| on.then_some(t)))
    }

    /// The credential with all but its last four characters hidden.
    pub fn masked_key(&self) -> String {
        match self.api_key() {
            None => "(none)".to_string(),
            Some(key) => {
                let visible: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
                let hidden = key.chars().count().saturating_sub(4);
                format!("{}{visible}", "*".repeat(hidden))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_include_everything() {
        let settings = Settings::default();
        assert_eq!(settings.type_filter().query_values(), None);
        assert_eq!(settings.ledger_path, PathBuf::from("memory.json"));
    }

    #[test]
    fn json_env_and_flags_layer_in_order() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_JSON,
                r#"{
                    "civitai_api_key": "abcdef123456",
                    "debug_mode": false,
                    "only_size": false,
                    "force_recheck": false,
                    "get_small_files": true,
                    "favorites_only": false,
                    "include_checkpoints": true,
                    "include_lora": true,
                    "include_textual_inversion": false,
                    "include_hypernets": false,
                    "include_aesthetic_grads": false,
                    "include_control_net": false,
                    "include_poses": false
                }"#,
            )?;
            jail.create_file(CONFIG_TOML, "threads = 4\nfirst_page_only = true")?;
            jail.set_env("MODVAULT_FORCE_RECHECK", "true");

            let overrides = Overrides {
                only_size: Some(true),
                ledger_path: Some(PathBuf::from("state/ledger.json")),
                ..Overrides::default()
            };
            let settings = Settings::load(None, &overrides)?;

            assert_eq!(settings.api_key(), Some("abcdef123456"));
            assert!(settings.get_small_files);
            assert!(settings.first_page_only);
            assert_eq!(settings.threads, 4);
            assert!(settings.force_recheck);
            assert!(settings.only_size);
            assert_eq!(settings.ledger_path, PathBuf::from("state/ledger.json"));
            assert_eq!(settings.type_filter().query_values(), Some(vec!["Checkpoint", "LORA"]));
            Ok(())
        });
    }

    #[test]
    fn explicit_toml_config() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "output_dir = \"/srv/models\"\ninclude_poses = false")?;
            let settings = Settings::load(Some(Path::new("custom.toml")), &Overrides::default())?;
            assert_eq!(settings.output_dir, PathBuf::from("/srv/models"));
            assert!(!settings.include_poses);
            Ok(())
        });
    }

    #[test]
    fn masked_key_keeps_last_four() {
        let settings = Settings {
            civitai_api_key: Some("abcdef123456".into()),
            ..Settings::default()
        };
        assert_eq!(settings.masked_key(), "********3456");
        assert_eq!(Settings::default().masked_key(), "(none)");
    }
}
