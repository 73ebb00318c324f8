use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// JSON rendering style for command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonFormat {
    Pretty,
    Compact,
}

impl JsonFormat {
    pub fn from_compact(compact: bool) -> Self {
        if compact {
            Self::Compact
        } else {
            Self::Pretty
        }
    }
}

/// Serialize `value` and deliver it in one step: to `target` when a
/// path is given, otherwise to stdout with a trailing newline.
pub fn emit_json<T: Serialize>(
    value: &T,
    format: JsonFormat,
    target: Option<&str>,
) -> Result<(), String> {
    let json = match format {
        JsonFormat::Compact => serde_json::to_string(value),
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
    }
    .map_err(|e| format!("JSON serialization failed: {}", e))?;

    match target {
        Some(path) => std::fs::write(Path::new(path), &json)
            .map_err(|e| format!("Failed to write '{}': {}", path, e)),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)
                .map_err(|e| format!("Failed to write to stdout: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        name: String,
        count: usize,
    }

    fn sample() -> Sample {
        Sample {
            name: "auditory/left".to_string(),
            count: 8,
        }
    }

    #[test]
    fn test_emit_compact_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        emit_json(
            &sample(),
            JsonFormat::Compact,
            Some(path.to_str().unwrap()),
        )
        .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, r#"{"name":"auditory/left","count":8}"#);
    }

    #[test]
    fn test_emit_pretty_is_indented() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        emit_json(&sample(), JsonFormat::Pretty, Some(path.to_str().unwrap())).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n  \"name\""));
    }

    #[test]
    fn test_emit_to_unwritable_path_is_error() {
        let result = emit_json(
            &sample(),
            JsonFormat::Pretty,
            Some("/nonexistent/dir/out.json"),
        );
        assert!(result.is_err());
    }
}
