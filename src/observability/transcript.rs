//! Line-oriented run report.
//!
//! Every line is echoed to stdout (when enabled) and kept in the buffer; the
//! finished buffer is the webhook payload.

use std::fmt;
use std::io::Write;

#[derive(Debug, Default, Clone)]
pub struct Transcript {
    buffer: String,
    echo: bool,
}

impl Transcript {
    /// Transcript that also prints each line to stdout
    pub fn stdout() -> Self {
        Self { buffer: String::new(), echo: true }
    }

    /// Transcript that only buffers
    pub fn buffered() -> Self {
        Self::default()
    }

    /// Append one line
    pub fn line(&mut self, line: impl fmt::Display) {
        let line = line.to_string();
        if self.echo {
            let mut out = std::io::stdout().lock();
            // stdout going away must not abort the run
            let _ = writeln!(out, "{}", line);
        }
        self.buffer.push_str(&line);
        self.buffer.push('\n');
    }

    /// Append an empty line
    pub fn blank(&mut self) {
        self.line("");
    }

    pub fn info(&mut self, message: impl fmt::Display) {
        self.line(format_args!("[INFO] {}", message));
    }

    pub fn error(&mut self, message: impl fmt::Display) {
        self.line(format_args!("[ERROR] {}", message));
    }

    pub fn success(&mut self, message: impl fmt::Display) {
        self.line(format_args!("[SUCCESS] {}", message));
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_newline_terminated() {
        let mut transcript = Transcript::buffered();
        transcript.line("========== Summary ==========");
        transcript.blank();
        transcript.line(format_args!("Total Projects: {}", 2));

        assert_eq!(transcript.as_str(), "========== Summary ==========\n\nTotal Projects: 2\n");
    }

    #[test]
    fn test_level_prefixes() {
        let mut transcript = Transcript::buffered();
        transcript.info("Processing project: www");
        transcript.error("boom");
        transcript.success("done");

        assert_eq!(
            transcript.into_string(),
            "[INFO] Processing project: www\n[ERROR] boom\n[SUCCESS] done\n"
        );
    }
}
