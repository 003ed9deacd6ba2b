use super::{Formatter, LevelOutput, iso8601_timestamp, mode_name};

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, output: &LevelOutput) -> String {
        let center = output
            .center_hz
            .map_or(String::new(), |hz| format!("{:.1}", hz));
        format!(
            "{},{},{:.1},{:.2},{},{}",
            iso8601_timestamp(),
            mode_name(output.mode),
            output.level_db,
            output.normalized,
            output.remaining_chunks,
            center
        )
    }

    fn header(&self) -> Option<&'static str> {
        Some("ts,mode,level_db,normalized,remaining_chunks,center_hz")
    }
}
