//! Version command implementation.

use crate::error::Result;
use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput<'a> {
    name: &'a str,
    version: &'a str,
    build: &'a str,
}

impl VersionOutput<'static> {
    fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            build: if cfg!(debug_assertions) {
                "dev"
            } else {
                "release"
            },
        }
    }
}

impl std::fmt::Display for VersionOutput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.name, self.version, self.build)
    }
}

/// Execute the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let output = VersionOutput::current();

    if json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{output}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_line_uses_package_metadata() {
        let line = VersionOutput::current().to_string();
        assert!(line.starts_with("dtc-config-store "));
        assert!(line.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_version_json_fields() {
        let json = serde_json::to_value(VersionOutput::current()).unwrap();
        assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert!(json["build"] == "dev" || json["build"] == "release");
    }
}
