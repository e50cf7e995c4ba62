//! Output path checks run before anything is written.

use anyhow::{bail, Result};
use std::path::Path;

/// Validates that an output path is safe to write.
///
/// Checks:
/// - The extension matches the format being written (e.g. "svg", "json")
/// - An existing file is only replaced when `force` is set
pub fn validate_output_path(output: &Path, expected_extension: &str, force: bool) -> Result<()> {
    let extension = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    if extension.as_deref() != Some(expected_extension) {
        bail!(
            "Safety check failed: output file '{}' must have a .{} extension",
            output.display(),
            expected_extension
        );
    }

    if output.is_dir() {
        bail!(
            "Safety check failed: output '{}' is a directory",
            output.display()
        );
    }

    if output.exists() && !force {
        bail!(
            "Safety check failed: output '{}' already exists (use --force to overwrite)",
            output.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tune-radar-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_valid_new_output() {
        let output = scratch("new-chart.svg");
        assert!(validate_output_path(&output, "svg", false).is_ok());
    }

    #[test]
    fn test_extension_case_insensitive() {
        let output = scratch("upper.SVG");
        assert!(validate_output_path(&output, "svg", false).is_ok());
    }

    #[test]
    fn test_wrong_extension() {
        let output = PathBuf::from("/tmp/chart.json");
        let result = validate_output_path(&output, "svg", true);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must have a .svg extension"));
    }

    #[test]
    fn test_missing_extension() {
        let output = PathBuf::from("/tmp/chart");
        assert!(validate_output_path(&output, "svg", true).is_err());
    }

    #[test]
    fn test_existing_file_needs_force() {
        let output = scratch("existing.json");
        std::fs::write(&output, "{}").unwrap();

        let result = validate_output_path(&output, "json", false);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("--force"));
        assert!(validate_output_path(&output, "json", true).is_ok());

        std::fs::remove_file(&output).unwrap();
    }
}
