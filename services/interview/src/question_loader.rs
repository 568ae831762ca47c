use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum QuestionFileError {
    #[error("Failed to read question file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Question file {0} contains no questions")]
    Empty(PathBuf),
}

/// Loads the scripted questions for an interview from a text or markdown
/// file, one question per line.
pub fn load_questions(path: &Path) -> Result<Vec<String>, QuestionFileError> {
    let content = fs::read_to_string(path).map_err(|source| QuestionFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let questions = parse_questions(&content);
    if questions.is_empty() {
        return Err(QuestionFileError::Empty(path.to_path_buf()));
    }
    Ok(questions)
}

/// Blank lines and markdown headings are skipped; list markers are stripped.
pub fn parse_questions(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(strip_marker)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_marker(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix(['-', '*', '+']) {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return rest.trim();
        }
    }
    // Numbered lists: "1. " or "1) "
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest.trim();
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_questions_strips_markers() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("questions.md");
        let mut file = File::create(&path)?;
        writeln!(file, "# Backend interview")?;
        writeln!(file)?;
        writeln!(file, "- What is your experience with caching?")?;
        writeln!(file, "* Tell me about a conflict with a teammate.")?;
        writeln!(file, "3. How would you design a rate limiter?")?;
        writeln!(file, "4) Why this company?")?;
        writeln!(file, "Plain question without a marker?")?;

        let questions = load_questions(&path)?;

        assert_eq!(
            questions,
            vec![
                "What is your experience with caching?",
                "Tell me about a conflict with a teammate.",
                "How would you design a rate limiter?",
                "Why this company?",
                "Plain question without a marker?",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let result = load_questions(Path::new("nonexistent_questions_for_testing.md"));
        assert!(matches!(result, Err(QuestionFileError::Read { .. })));
    }

    #[test]
    fn test_file_without_questions_is_rejected() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.md");
        let mut file = File::create(&path)?;
        writeln!(file, "# Only a heading")?;
        writeln!(file, "-   ")?;

        let result = load_questions(&path);
        assert!(matches!(result, Err(QuestionFileError::Empty(_))));
        Ok(())
    }

    #[test]
    fn test_numbers_inside_questions_are_kept() {
        assert_eq!(
            parse_questions("2024 was a big year for you?\n10x engineers: myth or real?"),
            vec!["2024 was a big year for you?", "10x engineers: myth or real?"]
        );
    }
}
