//! Command-line verb parser
//!
//! Grammar (keywords and field names are case-insensitive, values may be
//! wrapped in single or double quotes):
//!
//! ```text
//! help [verb]
//! exit
//! create
//! edit <id>
//! find <firstname|lastname|dateofbirth> <value>
//! list
//! stat
//! insert (<field>, ...) values (<value>, ...)
//! update set <field> = <value>, ... where <condition>
//! delete where <condition>
//! select [<field>, ...] [where <condition>]
//! import json <path>
//! export json <path>
//! purge
//! ```
//!
//! A condition is `<field> = <value>` terms joined by `and` or by `or`;
//! the two cannot be mixed in one clause.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::NaiveDate;

use super::errors::{CliError, CliResult};
use crate::record::{Assignment, Field, FieldValue, Income, RecordDraft, RecordId, Selection};

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help(Option<String>),
    Exit,
    Create,
    Edit(RecordId),
    Find(FieldValue),
    List,
    Stat,
    /// Without an id the record is created under a generated one
    Insert {
        id: Option<RecordId>,
        draft: RecordDraft,
    },
    Update {
        assignments: Vec<Assignment>,
        selection: Selection,
    },
    Delete(Selection),
    /// An empty field list selects every field
    Select {
        fields: Vec<Field>,
        selection: Selection,
    },
    Import(PathBuf),
    Export(PathBuf),
    Purge,
}

/// Verbs with a one-line description, in help order
pub const VERBS: [(&str, &str); 14] = [
    ("help", "prints the help screen, or help for one verb"),
    ("exit", "exits the application"),
    ("create", "creates a record, prompting for each field"),
    ("edit", "edits the record with the given id"),
    ("find", "finds records by first name, last name or date of birth"),
    ("list", "lists all records"),
    ("stat", "prints live and removed record counts"),
    ("insert", "inserts a record: insert (field, ...) values (value, ...)"),
    ("update", "updates records: update set field = value, ... where ..."),
    ("delete", "deletes records: delete where field = value [and|or ...]"),
    ("select", "prints a table: select field, ... [where ...]"),
    ("import", "merges records from a file: import json <path>"),
    ("export", "writes all records to a file: export json <path>"),
    ("purge", "compacts removed records out of the storage file"),
];

/// Parse one non-empty command line.
pub fn parse_command(line: &str) -> CliResult<Command> {
    let line = line.trim();
    let (verb, rest) = match line.find(char::is_whitespace) {
        Some(split) => (&line[..split], line[split..].trim()),
        None => (line, ""),
    };

    match verb.to_lowercase().as_str() {
        "help" => Ok(Command::Help((!rest.is_empty()).then(|| rest.to_lowercase()))),
        "exit" => no_arguments(Command::Exit, rest),
        "create" => no_arguments(Command::Create, rest),
        "list" => no_arguments(Command::List, rest),
        "stat" => no_arguments(Command::Stat, rest),
        "purge" => no_arguments(Command::Purge, rest),
        "edit" => parse_edit(rest),
        "find" => parse_find(rest),
        "insert" => parse_insert(rest),
        "update" => parse_update(rest),
        "delete" => parse_delete(rest),
        "select" => parse_select(rest),
        "import" => parse_transfer(rest).map(Command::Import),
        "export" => parse_transfer(rest).map(Command::Export),
        other => Err(CliError::invalid_command(format!(
            "There is no '{}' command. Type 'help' for the list of commands.",
            other
        ))),
    }
}

fn no_arguments(command: Command, rest: &str) -> CliResult<Command> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(CliError::invalid_command(format!("unexpected arguments: '{}'", rest)))
    }
}

fn parse_edit(rest: &str) -> CliResult<Command> {
    match Field::Id.parse_value(unquote(rest)) {
        Ok(FieldValue::Id(id)) => Ok(Command::Edit(id)),
        _ => Err(CliError::invalid_command("usage: edit <id>")),
    }
}

fn parse_find(rest: &str) -> CliResult<Command> {
    let (name, value) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| CliError::invalid_command("usage: find <field> <value>"))?;

    let field = parse_field(name)?;
    if !matches!(field, Field::FirstName | Field::LastName | Field::DateOfBirth) {
        return Err(CliError::invalid_command(format!(
            "find supports firstname, lastname and dateofbirth, not {}",
            field
        )));
    }

    let value = field
        .parse_value(unquote(value))
        .map_err(CliError::invalid_command)?;
    Ok(Command::Find(value))
}

fn parse_insert(rest: &str) -> CliResult<Command> {
    const USAGE: &str = "usage: insert (field, ...) values (value, ...)";

    let (names, after) = parenthesized(rest).ok_or_else(|| CliError::invalid_command(USAGE))?;
    let after = strip_keyword(after, "values").ok_or_else(|| CliError::invalid_command(USAGE))?;
    let (raw_values, trailing) =
        parenthesized(after).ok_or_else(|| CliError::invalid_command(USAGE))?;
    if !trailing.trim().is_empty() {
        return Err(CliError::invalid_command(USAGE));
    }

    let names = split_outside_quotes(names, ',');
    let raw_values = split_outside_quotes(raw_values, ',');
    if names.len() != raw_values.len() {
        return Err(CliError::invalid_command(format!(
            "{} fields but {} values",
            names.len(),
            raw_values.len()
        )));
    }

    let mut seen = HashSet::new();
    let mut id = None;
    let mut values = Vec::with_capacity(names.len());
    for (name, raw) in names.iter().zip(&raw_values) {
        let field = parse_field(name)?;
        if !seen.insert(field) {
            return Err(CliError::invalid_command(format!("field {} is given twice", field)));
        }
        match field.parse_value(unquote(raw)).map_err(CliError::invalid_command)? {
            FieldValue::Id(value) => id = Some(value),
            value => values.push(value),
        }
    }

    let missing: Vec<&str> = Field::ALL
        .iter()
        .filter(|f| **f != Field::Id && !seen.contains(*f))
        .map(|f| f.name())
        .collect();
    if !missing.is_empty() {
        return Err(CliError::invalid_command(format!(
            "missing fields: {}",
            missing.join(", ")
        )));
    }

    let mut draft = RecordDraft::new("", "", NaiveDate::MIN, 0, Income::from_hundredths(0), ' ');
    for value in &values {
        value.write_to(&mut draft);
    }
    Ok(Command::Insert { id, draft })
}

fn parse_update(rest: &str) -> CliResult<Command> {
    const USAGE: &str = "usage: update set field = value, ... where field = value";

    let rest = strip_keyword(rest, "set").ok_or_else(|| CliError::invalid_command(USAGE))?;
    let (set_clause, where_clause) = match find_keyword(rest, "where") {
        Some((start, end)) => (&rest[..start], &rest[end..]),
        None => return Err(CliError::invalid_command("update requires a where clause")),
    };

    let mut assignments = Vec::new();
    for term in split_outside_quotes(set_clause, ',') {
        let value = parse_condition(&term)?;
        assignments.push(Assignment::new(value).map_err(CliError::invalid_command)?);
    }
    if assignments.is_empty() {
        return Err(CliError::invalid_command(USAGE));
    }

    Ok(Command::Update {
        assignments,
        selection: parse_where(where_clause)?,
    })
}

fn parse_delete(rest: &str) -> CliResult<Command> {
    let clause = strip_keyword(rest, "where")
        .ok_or_else(|| CliError::invalid_command("usage: delete where field = value"))?;
    Ok(Command::Delete(parse_where(clause)?))
}

fn parse_select(rest: &str) -> CliResult<Command> {
    let (field_list, selection) = match find_keyword(rest, "where") {
        Some((start, end)) => (&rest[..start], parse_where(&rest[end..])?),
        None => (rest, Selection::all()),
    };

    let mut fields = Vec::new();
    if !field_list.trim().is_empty() {
        for name in split_outside_quotes(field_list, ',') {
            let field = parse_field(&name)?;
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
    }

    Ok(Command::Select { fields, selection })
}

fn parse_transfer(rest: &str) -> CliResult<PathBuf> {
    let (format, path) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| CliError::invalid_command("usage: import|export json <path>"))?;
    if !format.eq_ignore_ascii_case("json") {
        return Err(CliError::invalid_command(format!(
            "unsupported format '{}': only json is supported",
            format
        )));
    }
    let path = unquote(path);
    if path.is_empty() {
        return Err(CliError::invalid_command("missing file path"));
    }
    Ok(PathBuf::from(path))
}

/// Parse `term (and term)*` or `term (or term)*`.
fn parse_where(clause: &str) -> CliResult<Selection> {
    let mut conditions = Vec::new();
    let mut combinator: Option<&str> = None;
    let mut rest = clause.trim();

    loop {
        let next = [find_keyword(rest, "and"), find_keyword(rest, "or")]
            .into_iter()
            .flatten()
            .min_by_key(|(start, _)| *start);

        match next {
            Some((start, end)) => {
                let keyword = rest[start..end].trim();
                let keyword = if keyword.eq_ignore_ascii_case("and") { "and" } else { "or" };
                if combinator.is_some_and(|c| c != keyword) {
                    return Err(CliError::invalid_command(
                        "cannot mix 'and' and 'or' in one where clause",
                    ));
                }
                combinator = Some(keyword);
                conditions.push(parse_condition(&rest[..start])?);
                rest = &rest[end..];
            }
            None => {
                conditions.push(parse_condition(rest)?);
                break;
            }
        }
    }

    Ok(match combinator {
        Some("or") => Selection::any_of(conditions),
        _ => Selection::all_of(conditions),
    })
}

/// Parse `field = value`.
fn parse_condition(term: &str) -> CliResult<FieldValue> {
    let (name, value) = split_once_outside_quotes(term, '=').ok_or_else(|| {
        CliError::invalid_command(format!("expected field = value, got '{}'", term.trim()))
    })?;
    parse_field(name)?
        .parse_value(unquote(value))
        .map_err(CliError::invalid_command)
}

fn parse_field(name: &str) -> CliResult<Field> {
    Field::parse(name)
        .ok_or_else(|| CliError::invalid_command(format!("unknown field '{}'", name.trim())))
}

/// Strip one pair of matching quotes, after trimming.
fn unquote(text: &str) -> &str {
    let text = text.trim();
    for quote in ['\'', '"'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Byte positions of `text` that lie outside quoted sections.
fn unquoted_positions(text: &str) -> Vec<(usize, char)> {
    let mut quote: Option<char> = None;
    let mut positions = Vec::new();
    for (index, c) in text.char_indices() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None => positions.push((index, c)),
        }
    }
    positions
}

fn split_once_outside_quotes(text: &str, separator: char) -> Option<(&str, &str)> {
    let (index, _) = unquoted_positions(text)
        .into_iter()
        .find(|(_, c)| *c == separator)?;
    Some((&text[..index], &text[index + separator.len_utf8()..]))
}

fn split_outside_quotes(text: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (index, c) in unquoted_positions(text) {
        if c == separator {
            parts.push(text[start..index].trim().to_string());
            start = index + separator.len_utf8();
        }
    }
    parts.push(text[start..].trim().to_string());
    if parts.len() == 1 && parts[0].is_empty() {
        parts.clear();
    }
    parts
}

/// Find `keyword` as a whole word outside quotes. Returns its byte range.
fn find_keyword(text: &str, keyword: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let positions = unquoted_positions(text);
    for (index, _) in &positions {
        let end = index + keyword.len();
        let candidate = match text.get(*index..end) {
            Some(candidate) => candidate,
            None => continue,
        };
        if !candidate.eq_ignore_ascii_case(keyword) {
            continue;
        }
        let before_ok = *index == 0 || bytes[index - 1].is_ascii_whitespace();
        let after_ok = end == text.len() || bytes[end].is_ascii_whitespace();
        let outside = positions.iter().any(|(i, _)| *i == end - 1);
        if before_ok && after_ok && outside {
            return Some((*index, end));
        }
    }
    None
}

/// `keyword rest` -> `rest`
fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    match find_keyword(text, keyword) {
        Some((0, end)) => Some(text[end..].trim()),
        _ => None,
    }
}

/// `( inner ) rest` -> `(inner, rest)`
fn parenthesized(text: &str) -> Option<(&str, &str)> {
    let text = text.trim();
    if !text.starts_with('(') {
        return None;
    }
    let (close, _) = unquoted_positions(text)
        .into_iter()
        .find(|(_, c)| *c == ')')?;
    Some((&text[1..close], &text[close + 1..]))
}
