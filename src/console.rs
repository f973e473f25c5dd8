use crate::error::{AppError, Result};
use std::io::{BufRead, Write};

const AFFIRMATIVE: [&str; 5] = ["s", "si", "sí", "y", "yes"];

/// Case-insensitive check against the accepted "yes" answers.
#[must_use]
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    AFFIRMATIVE.contains(&answer.as_str())
}

/// Anything but an explicit "n"/"no" counts as yes, including an empty answer.
#[must_use]
pub fn is_yes_by_default(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    answer != "n" && answer != "no"
}

/// Line-oriented terminal I/O over any reader/writer pair.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Shows `message` without a newline and returns the trimmed answer.
    /// End of input is reported as `AppError::InputClosed`.
    pub fn prompt(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{message}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(AppError::InputClosed);
        }
        Ok(line.trim().to_string())
    }

    pub fn say(&mut self, line: impl std::fmt::Display) -> Result<()> {
        writeln!(self.output, "{line}")?;
        Ok(())
    }

    pub fn blank(&mut self) -> Result<()> {
        writeln!(self.output)?;
        Ok(())
    }

    pub fn clear_screen(&mut self) -> Result<()> {
        write!(self.output, "\x1B[2J\x1B[1;1H")?;
        self.output.flush()?;
        Ok(())
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.output
    }
}
