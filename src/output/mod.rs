mod csv;
mod json;
mod text;

use chrono::Utc;

use crate::scheduler::SourceMode;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// One power-meter report
pub struct LevelOutput {
    pub mode: SourceMode,
    pub level_db: f32,
    /// Level mapped to `[0, 1]` for display
    pub normalized: f32,
    pub remaining_chunks: usize,
    /// Center of the installed design, `None` while passing through
    pub center_hz: Option<f32>,
}

pub trait Formatter: Send {
    fn format(&self, output: &LevelOutput) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

pub fn iso8601_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn mode_name(mode: SourceMode) -> &'static str {
    match mode {
        SourceMode::Live => "live",
        SourceMode::Looped => "looped",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LevelOutput {
        LevelOutput {
            mode: SourceMode::Looped,
            level_db: -12.5,
            normalized: 0.81,
            remaining_chunks: 3,
            center_hz: Some(1000.0),
        }
    }

    #[test]
    fn test_json_format() {
        let line = JsonFormatter.format(&sample());
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["mode"], "looped");
        assert_eq!(value["remaining_chunks"], 3);
        assert_eq!(value["center_hz"], 1000.0);
    }

    #[test]
    fn test_json_null_center() {
        let mut output = sample();
        output.center_hz = None;
        let value: serde_json::Value =
            serde_json::from_str(&JsonFormatter.format(&output)).unwrap();
        assert!(value["center_hz"].is_null());
    }

    #[test]
    fn test_csv_matches_header() {
        let formatter = CsvFormatter;
        let header_fields = formatter.header().unwrap().split(',').count();
        let line = formatter.format(&sample());
        assert_eq!(line.split(',').count(), header_fields);
        assert!(line.ends_with(",looped,-12.5,0.81,3,1000.0"));
    }

    #[test]
    fn test_text_format() {
        let line = TextFormatter::new(false).format(&sample());
        assert!(line.contains("-12.5 dB"));
        assert!(TextFormatter::new(true).format(&sample()).contains("remaining: 3"));
    }
}
