//! Vector input parsing
//!
//! One vector per line, either a JSON array (`[1, 2.5, -3]`) or numbers
//! separated by commas and/or whitespace (`1, 2.5 -3`). Blank lines and lines
//! starting with `#` are skipped.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("input contains no vectors")]
    Empty,
}

/// Parse one line. `Ok(None)` for blank and comment lines.
fn parse_line(text: &str, line: usize) -> Result<Option<Vec<f64>>, InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let values: Vec<f64> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).map_err(|e| InputError::Parse {
            line,
            message: e.to_string(),
        })?
    } else {
        trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| {
                token.parse::<f64>().map_err(|e| InputError::Parse {
                    line,
                    message: format!("'{}': {}", token, e),
                })
            })
            .collect::<Result<_, _>>()?
    };

    if values.is_empty() {
        return Err(InputError::Parse {
            line,
            message: "empty vector".to_string(),
        });
    }
    Ok(Some(values))
}

/// Parse every vector in `text`, numbering lines from 1 in errors.
pub fn parse_vectors(text: &str) -> Result<Vec<Vec<f64>>, InputError> {
    let mut vectors = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if let Some(values) = parse_line(line, i + 1)? {
            vectors.push(values);
        }
    }
    if vectors.is_empty() {
        return Err(InputError::Empty);
    }
    Ok(vectors)
}
