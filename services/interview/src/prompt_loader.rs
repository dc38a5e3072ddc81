use anyhow::{Context, Result};
use interview_core::SessionConfig;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const SYSTEM_PROMPT_KEY: &str = "system_prompt";
pub const EVALUATION_RUBRIC_KEY: &str = "evaluation_rubric";

/// Loads every `*.md` file in `dir_path`, keyed by file stem.
pub fn load_prompts(dir_path: &Path) -> Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();

    for entry in fs::read_dir(dir_path)
        .with_context(|| format!("Failed to read prompts directory: {}", dir_path.display()))?
    {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("md") {
            continue;
        }

        let key = path
            .file_stem()
            .and_then(|s| s.to_str())
            .context("Could not get file stem for prompt file")?
            .to_string();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;

        prompts.insert(key, content.trim().to_string());
    }

    Ok(prompts)
}

/// Replaces the built-in system prompt and rubric with loaded ones, when
/// present and non-empty.
pub fn apply_prompts(mut config: SessionConfig, prompts: &HashMap<String, String>) -> SessionConfig {
    if let Some(prompt) = prompts.get(SYSTEM_PROMPT_KEY).filter(|p| !p.is_empty()) {
        config = config.with_system_prompt(prompt.clone());
    }
    if let Some(rubric) = prompts.get(EVALUATION_RUBRIC_KEY).filter(|r| !r.is_empty()) {
        config = config.with_evaluation_rubric(rubric.clone());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn loads_markdown_files_keyed_by_stem() -> Result<()> {
        let dir = tempdir()?;
        let dir_path = dir.path();

        let mut system = File::create(dir_path.join("system_prompt.md"))?;
        writeln!(system, "You are a strict interviewer.")?;
        let mut rubric = File::create(dir_path.join("evaluation_rubric.md"))?;
        writeln!(rubric, "Rate from 1 to 10.")?;
        // Neither of these is a prompt.
        let mut notes = File::create(dir_path.join("notes.txt"))?;
        writeln!(notes, "ignore me")?;
        fs::create_dir(dir_path.join("drafts.md"))?;

        let prompts = load_prompts(dir_path)?;

        assert_eq!(prompts.len(), 2, "Should only load .md files");
        assert_eq!(
            prompts.get(SYSTEM_PROMPT_KEY).map(String::as_str),
            Some("You are a strict interviewer.")
        );
        assert_eq!(
            prompts.get(EVALUATION_RUBRIC_KEY).map(String::as_str),
            Some("Rate from 1 to 10.")
        );
        assert!(!prompts.contains_key("notes"));

        Ok(())
    }

    #[test]
    fn missing_directory_is_an_error() {
        let result = load_prompts(Path::new("nonexistent_dir_for_testing_prompts"));
        assert!(result.is_err());
    }

    #[test]
    fn loaded_prompts_override_the_defaults() {
        let prompts = HashMap::from([
            (SYSTEM_PROMPT_KEY.to_string(), "Custom interviewer".to_string()),
            (EVALUATION_RUBRIC_KEY.to_string(), String::new()),
        ]);

        let config = apply_prompts(SessionConfig::default(), &prompts);

        assert_eq!(config.system_prompt, "Custom interviewer");
        assert_eq!(
            config.evaluation_rubric,
            SessionConfig::default().evaluation_rubric,
            "empty files keep the built-in rubric"
        );
    }
}
