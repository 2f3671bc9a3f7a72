use serde::Serialize;

use super::json::to_json;

/// Output mode determines how results are formatted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Tty,
    Json,
}

/// Detect the appropriate output mode.
pub fn detect_output_mode(json_flag: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    OutputMode::Tty
}

impl OutputMode {
    /// Print `value` as JSON, or the text produced by `tty` otherwise.
    pub fn emit<T, F>(self, value: &T, tty: F)
    where
        T: Serialize + ?Sized,
        F: FnOnce() -> String,
    {
        match self {
            OutputMode::Json => println!("{}", to_json(value)),
            OutputMode::Tty => {
                let text = tty();
                if !text.is_empty() {
                    println!("{}", text);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_flag_gives_json() {
        assert_eq!(detect_output_mode(true), OutputMode::Json);
    }

    #[test]
    fn test_no_json_flag_gives_tty() {
        assert_eq!(detect_output_mode(false), OutputMode::Tty);
    }

    #[test]
    fn test_json_mode_does_not_render_text() {
        OutputMode::Json.emit(&[1, 2], || panic!("text renderer must not run in JSON mode"));
    }
}
