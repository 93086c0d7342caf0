//! Go package and output path derivation

use crate::config::{Config, PathsMode};
use crate::schema::SchemaFile;
use crate::GeneratorError;

/// Suffix replacing `.proto` in output file names
pub const OUTPUT_SUFFIX: &str = ".setter.pb.go";

/// Go package clause and output location for one proto file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoPackage {
    /// Name used in the `package` clause
    pub name: String,
    /// Output path relative to the plugin output directory
    pub output_path: String,
}

/// Derive the Go package name and output path for a file
///
/// With no `go_package`, the proto package names the Go package and output
/// sits next to the proto file. `go_package = "path;name"` and
/// `go_package = "example.com/path/name"` redirect output under the import
/// path. A bare `go_package = "name"` only renames the package.
pub fn derive(file: &SchemaFile, config: &Config) -> Result<GoPackage, GeneratorError> {
    let (name, import_dir) = match file.go_package.as_deref() {
        None => (file.package.clone(), None),
        Some(go_package) => match go_package.find(';') {
            Some(index) if index > 0 && index + 1 < go_package.len() => (
                go_package[index + 1..].to_string(),
                Some(&go_package[..index]),
            ),
            _ => match go_package.rfind('/') {
                Some(index) if index > 0 => (go_package[index + 1..].to_string(), Some(go_package)),
                _ => (go_package.to_string(), None),
            },
        },
    };

    let base = match (config.paths, import_dir) {
        (PathsMode::Import, Some(dir)) => {
            let joined = format!(
                "{}/{}",
                dir.trim_end_matches('/'),
                file_base_name(&file.name)
            );
            strip_module(joined, config.module.as_deref())?
        }
        _ => file.name.clone(),
    };

    Ok(GoPackage {
        name,
        output_path: with_output_suffix(&base),
    })
}

fn file_base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn with_output_suffix(path: &str) -> String {
    let stem = path.strip_suffix(".proto").unwrap_or(path);
    format!("{}{}", stem, OUTPUT_SUFFIX)
}

fn strip_module(path: String, module: Option<&str>) -> Result<String, GeneratorError> {
    let Some(module) = module else {
        return Ok(path);
    };

    path.strip_prefix(module)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(str::to_string)
        .ok_or_else(|| {
            GeneratorError::InvalidConfig(format!(
                "output path {} does not start with module prefix {}",
                path, module
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(go_package: Option<&str>) -> SchemaFile {
        SchemaFile {
            name: "api/user.proto".to_string(),
            package: "api.v1".to_string(),
            go_package: go_package.map(str::to_string),
            all_messages: false,
            messages: Vec::new(),
        }
    }

    fn derive_default(go_package: Option<&str>) -> GoPackage {
        derive(&file(go_package), &Config::default()).unwrap()
    }

    #[test]
    fn test_without_go_package() {
        let pkg = derive_default(None);
        assert_eq!(pkg.name, "api.v1");
        assert_eq!(pkg.output_path, "api/user.setter.pb.go");
    }

    #[test]
    fn test_go_package_with_explicit_name() {
        let pkg = derive_default(Some("example.com/gen/users;userpb"));
        assert_eq!(pkg.name, "userpb");
        assert_eq!(pkg.output_path, "example.com/gen/users/user.setter.pb.go");
    }

    #[test]
    fn test_go_package_import_path() {
        let pkg = derive_default(Some("example.com/gen/users"));
        assert_eq!(pkg.name, "users");
        assert_eq!(pkg.output_path, "example.com/gen/users/user.setter.pb.go");
    }

    #[test]
    fn test_bare_go_package() {
        let pkg = derive_default(Some("users"));
        assert_eq!(pkg.name, "users");
        assert_eq!(pkg.output_path, "api/user.setter.pb.go");
    }

    #[test]
    fn test_trailing_separator_is_not_a_name() {
        let pkg = derive_default(Some("example.com/gen/users;"));
        assert_eq!(pkg.name, "users;");
    }

    #[test]
    fn test_source_relative() {
        let config = Config {
            paths: PathsMode::SourceRelative,
            module: None,
        };
        let pkg = derive(&file(Some("example.com/gen/users;userpb")), &config).unwrap();
        assert_eq!(pkg.name, "userpb");
        assert_eq!(pkg.output_path, "api/user.setter.pb.go");
    }

    #[test]
    fn test_module_prefix() {
        let config = Config {
            paths: PathsMode::Import,
            module: Some("example.com/gen".to_string()),
        };
        let pkg = derive(&file(Some("example.com/gen/users")), &config).unwrap();
        assert_eq!(pkg.output_path, "users/user.setter.pb.go");

        let err = derive(&file(Some("other.org/users")), &config).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidConfig(_)));
    }
}
