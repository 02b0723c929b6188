use super::BenchTable;
use std::io::{BufRead, Write};
use tracing::warn;

pub const PROMPT: &str = "Modes: (1) = rows1 on x-axis, (2) = cols1 on x-axis, \
    (3) = cols2 on x-axis, (4) = k on x-axis: ";

/// Which column goes on the x-axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Rows1,
    Cols1,
    Cols2,
    Threads,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Rows1, Mode::Cols1, Mode::Cols2, Mode::Threads];

    /// 1-based selector as typed by the user;
    /// None for anything outside 1..=4
    pub fn from_selector(selector: i64) -> Option<Mode> {
        match selector {
            1 => Some(Mode::Rows1),
            2 => Some(Mode::Cols1),
            3 => Some(Mode::Cols2),
            4 => Some(Mode::Threads),
            _ => None,
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            Mode::Rows1 => "rows1",
            Mode::Cols1 => "cols1",
            Mode::Cols2 => "cols2",
            Mode::Threads => "k",
        }
    }

    pub fn x_desc(self) -> String {
        let meaning = match self {
            Mode::Rows1 => "rows of LHS matrix",
            Mode::Cols1 => "columns of LHS matrix",
            Mode::Cols2 => "columns of RHS matrix",
            Mode::Threads => "amount of threads",
        };
        format!("{}= {}", self.header(), meaning)
    }

    pub fn column(self, table: &BenchTable) -> &[i64] {
        match self {
            Mode::Rows1 => &table.rows1,
            Mode::Cols1 => &table.cols1,
            Mode::Cols2 => &table.cols2,
            Mode::Threads => &table.k,
        }
    }
}

/// Parses an answer to the mode prompt.
/// Non-integer and out of range answers give None (and a blank chart later on).
pub fn parse_selection(answer: &str) -> Option<Mode> {
    match answer.trim().parse::<i64>() {
        Ok(n) => {
            let mode = Mode::from_selector(n);
            if mode.is_none() {
                warn!("mode {} is not one of 1, 2, 3, 4; the chart will be empty", n);
            }
            mode
        }
        Err(_) => {
            warn!(
                "mode {:?} is not an integer; the chart will be empty",
                answer.trim()
            );
            None
        }
    }
}

/// Writes the prompt and blocks until one line is read
pub fn prompt_mode<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> std::io::Result<Option<Mode>> {
    write!(output, "{}", PROMPT)?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(parse_selection(&answer))
}
