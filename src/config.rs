//! Plugin parameter parsing
//!
//! protoc passes everything after the `:` of `--setter_out=<params>:<dir>`
//! (or the value of `--setter_opt`) as a single comma-separated string.
//! Supported keys follow protoc-gen-go:
//!
//! - `paths=import|source_relative`
//! - `module=<prefix>`

use crate::GeneratorError;
use std::str::FromStr;

/// How output file paths are derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathsMode {
    /// Place output under the Go import path from `go_package` (default)
    #[default]
    Import,
    /// Place output next to the input `.proto` file
    SourceRelative,
}

impl FromStr for PathsMode {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "import" => Ok(PathsMode::Import),
            "source_relative" => Ok(PathsMode::SourceRelative),
            other => Err(GeneratorError::InvalidConfig(format!(
                "unknown paths mode {:?}, expected \"import\" or \"source_relative\"",
                other
            ))),
        }
    }
}

/// Plugin configuration parsed from `CodeGeneratorRequest.parameter`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Output path strategy
    pub paths: PathsMode,
    /// Import path prefix stripped from output paths in `import` mode
    pub module: Option<String>,
}

impl Config {
    /// Parse the raw plugin parameter
    ///
    /// A missing or empty parameter yields the default configuration.
    pub fn from_parameter(parameter: Option<&str>) -> Result<Self, GeneratorError> {
        let mut config = Config::default();

        let Some(parameter) = parameter else {
            return Ok(config);
        };

        for part in parameter
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
        {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                GeneratorError::InvalidConfig(format!("expected key=value, got {:?}", part))
            })?;

            match key.trim() {
                "paths" => config.paths = value.trim().parse()?,
                "module" => {
                    let module = value.trim().trim_end_matches('/');
                    if module.is_empty() {
                        return Err(GeneratorError::InvalidConfig(
                            "module prefix must not be empty".to_string(),
                        ));
                    }
                    config.module = Some(module.to_string());
                }
                other => {
                    return Err(GeneratorError::InvalidConfig(format!(
                        "unknown parameter {:?}",
                        other
                    )))
                }
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        assert_eq!(Config::from_parameter(None).unwrap(), Config::default());
        assert_eq!(Config::from_parameter(Some("")).unwrap(), Config::default());
    }

    #[test]
    fn test_parse_paths_and_module() {
        let parameter = "paths=source_relative, module=example.com/api/";
        let config = Config::from_parameter(Some(parameter)).unwrap();
        assert_eq!(config.paths, PathsMode::SourceRelative);
        assert_eq!(config.module.as_deref(), Some("example.com/api"));
    }

    #[test]
    fn test_rejects_unknown_parameter() {
        let err = Config::from_parameter(Some("plugins=grpc")).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_bad_paths_mode() {
        assert!(Config::from_parameter(Some("paths=absolute")).is_err());
        assert!(Config::from_parameter(Some("paths")).is_err());
    }
}
