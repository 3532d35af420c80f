use std::ffi::OsStr;
use std::fs::File;
use std::io::{Read as _, Write as _};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use subst::VariableMap;
use tilepick_core::config::LayerConfig;
use tracing::info;

use crate::host::UrlTemplate;
use crate::{TilepickError, TilepickResult};

pub const DEFAULT_USER_AGENT: &str = concat!("tilepick/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub layer: LayerConfig,
}

/// Where tiles come from.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Tile URL template with `{z}`, `{x}` and `{y}` placeholders
    pub url: Option<String>,

    /// User agent sent with every tile request [default: tilepick/VERSION]
    pub user_agent: Option<String>,

    /// Per-request timeout [default: 30s]
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "humantime_serde"
    )]
    pub timeout: Option<Duration>,
}

impl SourceConfig {
    pub fn url_template(&self) -> TilepickResult<UrlTemplate> {
        UrlTemplate::new(self.url.clone().ok_or(TilepickError::NoTileUrl)?)
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }
}

impl Config {
    /// Writes the configuration as YAML to `file_name`, or prints it when the name is `-`.
    pub fn save_to_file(&self, file_name: &Path) -> TilepickResult<()> {
        let yaml = serde_yaml::to_string(&self).map_err(TilepickError::ConfigSerializeError)?;
        if file_name.as_os_str() == OsStr::new("-") {
            info!("Current configuration:");
            println!("\n\n{yaml}\n");
            Ok(())
        } else {
            info!(
                "Saving config to {}, use --config to load it",
                file_name.display()
            );
            File::create(file_name)
                .map_err(|e| TilepickError::ConfigWriteError(e, file_name.to_path_buf()))?
                .write_all(yaml.as_bytes())
                .map_err(|e| TilepickError::ConfigWriteError(e, file_name.to_path_buf()))?;
            Ok(())
        }
    }
}

/// Reads a YAML configuration file, substituting `${VAR}` references from `env`.
pub fn read_config<'a, M>(file_name: &Path, env: &'a M) -> TilepickResult<Config>
where
    M: VariableMap<'a>,
    M::Value: AsRef<str>,
{
    let mut file =
        File::open(file_name).map_err(|e| TilepickError::ConfigLoadError(e, file_name.into()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| TilepickError::ConfigLoadError(e, file_name.into()))?;
    parse_config(&contents, env, file_name)
}

pub fn parse_config<'a, M>(contents: &str, env: &'a M, file_name: &Path) -> TilepickResult<Config>
where
    M: VariableMap<'a>,
    M::Value: AsRef<str>,
{
    subst::yaml::from_str(contents, env)
        .map_err(|e| TilepickError::ConfigParseError(e, file_name.into()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use indoc::indoc;
    use insta::assert_json_snapshot;

    use super::*;

    #[test]
    fn test_parse_config() {
        let env = HashMap::from([("TILE_HOST", "tiles.example.com")]);
        let config = parse_config(
            indoc! {"
                source:
                  url: https://${TILE_HOST}/{z}/{x}/{y}.pbf
                  timeout: 5s
                layer:
                  tile_size: 512
                  layers: [parks]
                  click_delay: 300ms
            "},
            &env,
            Path::new("test.yaml"),
        )
        .unwrap();

        assert_eq!(
            config.source.url.as_deref(),
            Some("https://tiles.example.com/{z}/{x}/{y}.pbf")
        );
        assert_eq!(config.source.timeout(), Duration::from_secs(5));
        assert_eq!(config.source.user_agent(), DEFAULT_USER_AGENT);
        assert_eq!(config.layer.tile_size, Some(512));
        assert_eq!(config.layer.click_delay, Some(Duration::from_millis(300)));
        assert_json_snapshot!(config, @r#"
        {
          "source": {
            "url": "https://tiles.example.com/{z}/{x}/{y}.pbf",
            "timeout": "5s"
          },
          "layer": {
            "tile_size": 512,
            "layers": [
              "parks"
            ],
            "click_delay": "300ms"
          }
        }
        "#);
    }

    #[test]
    fn test_empty_config() {
        let env: HashMap<&str, &str> = HashMap::new();
        let config = parse_config("{}", &env, Path::new("empty.yaml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(matches!(
            config.source.url_template(),
            Err(TilepickError::NoTileUrl)
        ));
    }

    #[test]
    fn test_missing_variable() {
        let env: HashMap<&str, &str> = HashMap::new();
        let err = parse_config(
            "source:\n  url: https://${TILE_HOST}/{z}/{x}/{y}.pbf\n",
            &env,
            Path::new("missing.yaml"),
        )
        .unwrap_err();
        assert!(matches!(err, TilepickError::ConfigParseError(_, _)), "{err}");
    }

    #[test]
    fn test_unknown_duration() {
        let env: HashMap<&str, &str> = HashMap::new();
        let err = parse_config(
            "layer:\n  click_delay: soon\n",
            &env,
            Path::new("bad.yaml"),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Unable to parse config file bad.yaml"));
    }
}
