//! Console I/O for the session
//!
//! - Input: one command or prompt answer per line, UTF-8
//! - Output: human-readable text; logs never go here

use std::io::{BufRead, Write};

use super::errors::CliResult;
use crate::record::{Field, Record};

/// Read one line without its terminator. `None` at end of input.
pub fn read_line<R: BufRead>(input: &mut R) -> CliResult<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed_len);
    Ok(Some(line))
}

/// Print `text` without a newline and read the answer.
pub fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    text: &str,
) -> CliResult<Option<String>> {
    write!(output, "{}", text)?;
    output.flush()?;
    read_line(input)
}

/// Prompt label for an editable field
pub fn field_label(field: Field) -> &'static str {
    match field {
        Field::Id => "Id",
        Field::FirstName => "First name",
        Field::LastName => "Last name",
        Field::DateOfBirth => "Date of birth",
        Field::Height => "Height",
        Field::Income => "Income",
        Field::PatronymicLetter => "Patronymic letter",
    }
}

/// One-line rendering used by `list` and `find`
pub fn format_record(record: &Record) -> String {
    format!(
        "#{}, {}, {}, {}, {}, {}, {}",
        record.id,
        record.first_name,
        record.last_name,
        record.date_of_birth.format("%Y-%b-%d"),
        record.height,
        record.income,
        record.patronymic_letter
    )
}

/// Render `records` as a boxed text table of `fields`.
///
/// Numeric columns are right-aligned, text columns left-aligned.
pub fn render_table(fields: &[Field], records: &[Record]) -> String {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| fields.iter().map(|f| record.field_text(*f)).collect())
        .collect();

    let widths: Vec<usize> = fields
        .iter()
        .enumerate()
        .map(|(column, field)| {
            rows.iter()
                .map(|row| row[column].chars().count())
                .chain(std::iter::once(field.name().len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let border = {
        let mut line = String::from("+");
        for width in &widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line
    };

    let mut out = String::new();
    out.push_str(&border);
    out.push('\n');
    let header: Vec<&str> = fields.iter().map(|f| f.name()).collect();
    out.push_str(&render_row(&header, &widths, fields));
    out.push('\n');
    out.push_str(&border);
    out.push('\n');
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&render_row(&cells, &widths, fields));
        out.push('\n');
    }
    out.push_str(&border);
    out.push('\n');
    out
}

fn render_row(cells: &[&str], widths: &[usize], fields: &[Field]) -> String {
    let mut line = String::from("|");
    for ((cell, width), field) in cells.iter().zip(widths).zip(fields) {
        let pad = " ".repeat(width - cell.chars().count());
        if is_numeric(*field) {
            line.push_str(&format!(" {}{} |", pad, cell));
        } else {
            line.push_str(&format!(" {}{} |", cell, pad));
        }
    }
    line
}

fn is_numeric(field: Field) -> bool {
    matches!(field, Field::Id | Field::Height | Field::Income)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Income, RecordDraft};
    use chrono::NaiveDate;

    fn record() -> Record {
        RecordDraft::new(
            "John",
            "Doe",
            NaiveDate::from_ymd_opt(1986, 5, 18).unwrap(),
            180,
            Income::from_hundredths(1_250_050),
            'A',
        )
        .into_record(12)
    }

    #[test]
    fn test_read_line_strips_terminator() {
        let mut input: &[u8] = b"list\r\nstat\n";
        assert_eq!(read_line(&mut input).unwrap(), Some("list".to_string()));
        assert_eq!(read_line(&mut input).unwrap(), Some("stat".to_string()));
        assert_eq!(read_line(&mut input).unwrap(), None);
    }

    #[test]
    fn test_prompt_writes_label() {
        let mut input: &[u8] = b"Ann\n";
        let mut output = Vec::new();
        let answer = prompt(&mut input, &mut output, "First name: ").unwrap();
        assert_eq!(answer.as_deref(), Some("Ann"));
        assert_eq!(output, b"First name: ");
    }

    #[test]
    fn test_format_record() {
        assert_eq!(
            format_record(&record()),
            "#12, John, Doe, 1986-May-18, 180, 12500.50, A"
        );
    }

    #[test]
    fn test_render_table() {
        let table = render_table(&[Field::Id, Field::FirstName], &[record()]);
        let expected = "\
+----+-----------+
| id | firstname |
+----+-----------+
| 12 | John      |
+----+-----------+
";
        assert_eq!(table, expected);
    }

    #[test]
    fn test_render_table_right_aligns_numbers() {
        let table = render_table(&[Field::Height, Field::Income], &[record()]);
        assert!(table.contains("|    180 | 12500.50 |"));
    }

    #[test]
    fn test_render_empty_table() {
        let table = render_table(&[Field::LastName], &[]);
        assert_eq!(table.lines().count(), 4);
    }
}
