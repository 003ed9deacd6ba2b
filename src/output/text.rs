use super::{Formatter, LevelOutput, mode_name};

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, output: &LevelOutput) -> String {
        let bar_len = (output.normalized.clamp(0.0, 1.0) * 30.0).round() as usize;
        let bar = format!("{:<30}", "#".repeat(bar_len));

        if self.verbose {
            let center = output
                .center_hz
                .map_or("passthrough".to_string(), |hz| format!("{:.1} Hz", hz));
            format!(
                "[{}] {:>6.1} dB |{}| center: {}, remaining: {}",
                mode_name(output.mode),
                output.level_db,
                bar,
                center,
                output.remaining_chunks
            )
        } else {
            format!("{:>6.1} dB |{}|", output.level_db, bar)
        }
    }
}
