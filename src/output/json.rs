use super::{Formatter, LevelOutput, iso8601_timestamp, mode_name};

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, output: &LevelOutput) -> String {
        let center = output
            .center_hz
            .map_or("null".to_string(), |hz| format!("{:.1}", hz));
        format!(
            r#"{{"ts":"{}","mode":"{}","level_db":{:.1},"normalized":{:.2},"remaining_chunks":{},"center_hz":{}}}"#,
            iso8601_timestamp(),
            mode_name(output.mode),
            output.level_db,
            output.normalized,
            output.remaining_chunks,
            center
        )
    }
}
