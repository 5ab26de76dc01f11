#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::path::Path;

pub const PROJECT_FILE_NAME: &str = "dbt_project.yml";

/// Point the `profile:` key of a dbt_project.yml body at `profile`.
///
/// The first `profile:` line is replaced. Without one, a new line goes right
/// after the first `name:` line. Content with neither comes back unchanged.
pub fn set_profile_line(content: &str, profile: &str) -> String {
    let replacement = format!("profile: \"{}\"", profile);
    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();

    if let Some(line) = lines
        .iter_mut()
        .find(|line| line.trim().starts_with("profile:"))
    {
        *line = replacement;
    } else if let Some(index) = lines
        .iter()
        .position(|line| line.trim().starts_with("name:"))
    {
        lines.insert(index + 1, replacement);
    }

    lines.join("\n")
}

pub fn rewrite_project_profile(project_dir: &Path, profile: &str) -> Result<(), AppError> {
    let path = project_dir.join(PROJECT_FILE_NAME);
    if !path.is_file() {
        return Err(AppError::new(
            ErrorCategory::ValidationError,
            format!("{} not found at {}", PROJECT_FILE_NAME, path.display()),
        )
        .with_code("DBT-004"));
    }

    let content = std::fs::read_to_string(&path)?;
    std::fs::write(&path, set_profile_line(&content, profile))?;
    tracing::info!(profile, "updated {} to use profile", PROJECT_FILE_NAME);
    Ok(())
}
