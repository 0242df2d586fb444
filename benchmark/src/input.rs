use agent::Result;
use std::io::{BufRead, ErrorKind, Write};

pub const COMPANIES_PROMPT: &str = "Please provide a list of companies (comma-separated): ";
pub const METRICS_PROMPT: &str = "Please provide a list of metrics (comma-separated): ";

/// Operator input, split on commas and otherwise left exactly as typed.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedInput {
    pub companies: Vec<String>,
    pub metrics: Vec<String>,
}

/// No trimming and no filtering: `"A,,B"` gives `["A", "", "B"]`.
pub fn split_list(line: &str) -> Vec<String> {
    line.split(',').map(str::to_string).collect()
}

fn prompt<R: BufRead, W: Write>(reader: &mut R, writer: &mut W, question: &str) -> Result<String> {
    write!(writer, "{}", question)?;
    writer.flush()?;

    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            "input closed before an answer was given",
        )
        .into());
    }

    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }

    Ok(line)
}

pub fn collect_input<R: BufRead, W: Write>(mut reader: R, writer: &mut W) -> Result<CollectedInput> {
    let companies = split_list(&prompt(&mut reader, writer, COMPANIES_PROMPT)?);
    let metrics = split_list(&prompt(&mut reader, writer, METRICS_PROMPT)?);

    tracing::debug!(
        companies = companies.len(),
        metrics = metrics.len(),
        "collected operator input"
    );

    Ok(CollectedInput { companies, metrics })
}
