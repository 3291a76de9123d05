//! Sequence file reading
//!
//! Two layouts are understood:
//!
//! * text: one element per line, components separated by whitespace or
//!   commas; blank lines and lines starting with `#` are skipped
//! * JSON: an array of numbers, of rows, or of matrices

use anyhow::{Context, Result};
use chunkwise_core::SequenceBuffer;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::CliError;

/// JSON input layouts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonSequence {
    Scalars(Vec<f64>),
    Rows(Vec<Vec<f64>>),
    Matrices(Vec<Vec<Vec<f64>>>),
}

/// Reader turning files into [`SequenceBuffer`]s
pub struct FileReader;

impl FileReader {
    /// Read a sequence file, choosing the layout from the extension or the
    /// first non-blank character
    pub fn read_sequence(path: &Path) -> Result<SequenceBuffer> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let name = path.display().to_string();

        let is_json = path.extension().is_some_and(|ext| ext == "json")
            || content.trim_start().starts_with('[');
        let buffer = if is_json {
            Self::parse_json(&name, &content)?
        } else {
            Self::parse_text(&name, &content)?
        };
        log::debug!(
            "Read {} elements from {}",
            buffer.len(),
            path.display()
        );
        Ok(buffer)
    }

    /// Get file size in bytes
    pub fn file_size(path: &Path) -> Result<u64> {
        let metadata = fs::metadata(path)
            .with_context(|| format!("Failed to get metadata for: {}", path.display()))?;

        Ok(metadata.len())
    }

    /// Parse the text layout
    pub fn parse_text(source: &str, content: &str) -> Result<SequenceBuffer> {
        let mut buffer = SequenceBuffer::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parse_error = |reason: String| CliError::ParseError {
                source: source.to_string(),
                line: index + 1,
                reason,
            };

            let components = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|token| !token.is_empty())
                .map(|token| {
                    token
                        .parse::<f64>()
                        .map_err(|_| parse_error(format!("'{token}' is not a number")))
                })
                .collect::<std::result::Result<Vec<f64>, CliError>>()?;

            let pushed = if components.len() == 1 {
                buffer.push(components[0])
            } else {
                buffer.push(components)
            };
            pushed.map_err(|e| parse_error(e.to_string()))?;
        }

        if buffer.is_empty() {
            return Err(CliError::ParseError {
                source: source.to_string(),
                line: 0,
                reason: "no elements".to_string(),
            }
            .into());
        }
        Ok(buffer)
    }

    /// Parse the JSON layout
    pub fn parse_json(source: &str, content: &str) -> Result<SequenceBuffer> {
        let parse_error = |reason: String| CliError::ParseError {
            source: source.to_string(),
            line: 0,
            reason,
        };

        let parsed: JsonSequence = serde_json::from_str(content).map_err(|_| {
            parse_error("expected an array of numbers, rows or matrices".to_string())
        })?;
        let buffer = match parsed {
            JsonSequence::Scalars(values) => SequenceBuffer::from_scalars(&values),
            JsonSequence::Rows(rows) => {
                SequenceBuffer::from_elements(rows).map_err(|e| parse_error(e.to_string()))?
            }
            JsonSequence::Matrices(matrices) => SequenceBuffer::from_elements(matrices)
                .map_err(|e| parse_error(e.to_string()))?,
        };

        if buffer.is_empty() {
            return Err(parse_error("no elements".to_string()).into());
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkwise_core::Shape;
    use tempfile::TempDir;

    #[test]
    fn test_parse_text_scalars() {
        let buffer = FileReader::parse_text("t", "# header\n1.5\n\n2\n-3e2\n").unwrap();
        assert_eq!(buffer.values(), &[1.5, 2.0, -300.0]);
        assert_eq!(buffer.shape(), Some(&Shape::scalar()));
    }

    #[test]
    fn test_parse_text_rows() {
        let buffer = FileReader::parse_text("t", "1, 2\n3 4\n5,\t6\n").unwrap();
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.shape(), Some(&Shape::row(2)));
        assert_eq!(buffer.element(2), Some(&[5.0, 6.0][..]));
    }

    #[test]
    fn test_parse_text_reports_line() {
        let err = FileReader::parse_text("signal.txt", "1\n2\nthree\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parse error in signal.txt at line 3: 'three' is not a number"
        );

        let err = FileReader::parse_text("rows.txt", "1 2\n3 4 5\n").unwrap_err();
        assert!(err.to_string().contains("at line 2"));
    }

    #[test]
    fn test_parse_text_rejects_empty() {
        let err = FileReader::parse_text("empty.txt", "# nothing\n\n").unwrap_err();
        assert!(err.to_string().contains("no elements"));
    }

    #[test]
    fn test_parse_json_layouts() {
        let scalars = FileReader::parse_json("j", "[1, 2.5, 3]").unwrap();
        assert_eq!(scalars.values(), &[1.0, 2.5, 3.0]);

        let rows = FileReader::parse_json("j", "[[1, 2], [3, 4]]").unwrap();
        assert_eq!(rows.shape(), Some(&Shape::row(2)));

        let matrices = FileReader::parse_json("j", "[[[1, 2], [3, 4]], [[5, 6], [7, 8]]]").unwrap();
        assert_eq!(matrices.shape(), Some(&Shape::matrix(2, 2)));
        assert_eq!(matrices.len(), 2);

        assert!(FileReader::parse_json("j", "{\"values\": [1]}").is_err());
        assert!(FileReader::parse_json("j", "[[1, 2], [3]]").is_err());
    }

    #[test]
    fn test_read_sequence_detects_layout() {
        let temp_dir = TempDir::new().unwrap();
        let text_path = temp_dir.path().join("signal.txt");
        let json_path = temp_dir.path().join("signal.json");
        fs::write(&text_path, "1\n2\n3\n").unwrap();
        fs::write(&json_path, "[1, 2, 3]").unwrap();

        let from_text = FileReader::read_sequence(&text_path).unwrap();
        let from_json = FileReader::read_sequence(&json_path).unwrap();
        assert_eq!(from_text, from_json);
        assert_eq!(FileReader::file_size(&json_path).unwrap(), 9);
    }

    #[test]
    fn test_read_sequence_nonexistent_file() {
        let err = FileReader::read_sequence(Path::new("/nonexistent/signal.txt")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }
}
