use clap::ValueEnum;
use owo_colors::OwoColorize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Success,
    Error,
    Info,
    Warning,
}

impl Status {
    fn kind(self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Error => "error",
            Status::Info => "info",
            Status::Warning => "warning",
        }
    }

    fn marker(self) -> Option<String> {
        match self {
            Status::Success => Some("✓".green().to_string()),
            Status::Error => Some("✗".red().to_string()),
            Status::Warning => Some("⚠".yellow().to_string()),
            Status::Info => None,
        }
    }
}

/// Where command results go: colored lines for people, one JSON object per
/// message for scripts.
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.status(Status::Success, msg.as_ref());
    }

    /// Shown even in quiet mode
    pub fn error(&self, msg: impl AsRef<str>) {
        self.status(Status::Error, msg.as_ref());
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.status(Status::Info, msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.status(Status::Warning, msg.as_ref());
    }

    /// Human-only text such as tables; dropped in JSON modes
    pub fn println(&self, msg: impl AsRef<str>) {
        if self.quiet || !self.is_human() {
            return;
        }
        println!("{}", msg.as_ref());
    }

    /// Structured result; pretty-printed in human mode
    pub fn json(&self, data: &serde_json::Value) {
        if !self.quiet {
            println!("{}", self.render_json(data));
        }
    }

    fn status(&self, status: Status, msg: &str) {
        let Some(line) = self.render_status(status, msg) else {
            return;
        };
        if status == Status::Error && self.is_human() {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    fn render_status(&self, status: Status, msg: &str) -> Option<String> {
        if self.quiet && status != Status::Error {
            return None;
        }
        let line = match self.format {
            OutputFormat::Human => match status.marker() {
                Some(marker) => format!("{} {}", marker, msg),
                None => msg.to_string(),
            },
            OutputFormat::Json | OutputFormat::JsonPretty => {
                self.render_json(&json!({ "type": status.kind(), "message": msg }))
            }
        };
        Some(line)
    }

    fn render_json(&self, data: &serde_json::Value) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string(data).unwrap_or_default(),
            OutputFormat::JsonPretty | OutputFormat::Human => serde_json::to_string_pretty(data).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_keeps_only_errors() {
        let output = Output::new(OutputFormat::Human, true);
        assert_eq!(output.render_status(Status::Info, "listing"), None);
        assert_eq!(output.render_status(Status::Success, "saved"), None);

        let error = output.render_status(Status::Error, "disk full").unwrap();
        assert!(error.contains("✗"));
        assert!(error.ends_with("disk full"));
    }

    #[test]
    fn test_human_info_has_no_marker() {
        let output = Output::new(OutputFormat::Human, false);
        assert_eq!(output.render_status(Status::Info, "yes").as_deref(), Some("yes"));
    }

    #[test]
    fn test_json_status_is_one_compact_object() {
        let output = Output::new(OutputFormat::Json, false);
        let line = output.render_status(Status::Warning, "nothing imported").unwrap();
        assert_eq!(line, r#"{"message":"nothing imported","type":"warning"}"#);
    }
}
