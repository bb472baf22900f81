//! Session loop and command handlers
//!
//! Startup:
//! 1. Parse arguments and set the log threshold
//! 2. Load validation rules (built-in, or a rules file)
//! 3. Open the selected store, wrapped for tracing if requested
//! 4. Read commands from stdin until `exit` or end of input
//!
//! A failing command prints its error and the session continues, unless
//! the error is FATAL (the storage file is corrupt).

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;

use super::args::{Cli, StorageKind};
use super::errors::{CliError, CliResult};
use super::io::{field_label, format_record, prompt, render_table};
use super::parser::{parse_command, Command, VERBS};
use crate::observability::{
    log_event, log_event_with_fields, Event, Logger, ObservationScope, ObservedStore,
};
use crate::record::{Field, FieldValue, Income, Record, RecordDraft, RecordId, Selection};
use crate::snapshot::Snapshot;
use crate::storage::{FileStore, MemoryStore, RecordStore};
use crate::validation::{RuleKind, ValidationRules, Validator};

/// Main CLI entry point
///
/// Parses arguments, opens the store and runs the session on stdin/stdout.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    Logger::set_min_severity(cli.min_severity());
    log_event(Event::SessionStart);

    let rules = match &cli.rules_file {
        Some(path) => ValidationRules::load(path)?,
        None => ValidationRules::builtin(),
    };
    let kind = RuleKind::from(cli.validation_rules);
    log_event_with_fields(Event::RulesLoaded, &[("rules", kind.as_str())]);

    let store = open_store(&cli, Box::new(rules.get(kind).validator()))?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut output = stdout.lock();
    writeln!(
        output,
        "File cabinet: {} storage, {} validation rules. Type 'help' for the list of commands.",
        store.kind(),
        kind.as_str()
    )?;

    let mut session = Session::new(store, stdin.lock(), output);
    let result = session.run();
    log_event(Event::SessionEnd);
    result
}

/// Open the backend named on the command line.
pub fn open_store(cli: &Cli, validator: Box<dyn Validator>) -> CliResult<Box<dyn RecordStore>> {
    let store: Box<dyn RecordStore> = match cli.storage {
        StorageKind::Memory => {
            log_event_with_fields(Event::StoreOpened, &[("backend", "memory")]);
            Box::new(MemoryStore::new(validator))
        }
        StorageKind::File => Box::new(
            FileStore::open(&cli.path, validator).map_err(CliError::store_open_failed)?,
        ),
    };

    if cli.observes_store() {
        Ok(Box::new(ObservedStore::new(store, cli.use_stopwatch)))
    } else {
        Ok(store)
    }
}

/// A command session over any line input and text output
pub struct Session<R, W> {
    store: Box<dyn RecordStore>,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(store: Box<dyn RecordStore>, input: R, output: W) -> Self {
        Self {
            store,
            input,
            output,
        }
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Consume the session, returning its output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Read and execute commands until `exit` or end of input.
    pub fn run(&mut self) -> CliResult<()> {
        loop {
            let line = match prompt(&mut self.input, &mut self.output, "> ")? {
                Some(line) => line,
                None => break,
            };
            if line.trim().is_empty() {
                continue;
            }

            match parse_command(&line) {
                Ok(Command::Exit) => {
                    writeln!(self.output, "Exiting an application...")?;
                    break;
                }
                Ok(command) => {
                    if let Err(e) = self.execute(command) {
                        if e.is_fatal() {
                            return Err(e);
                        }
                        writeln!(self.output, "{}", e.message())?;
                    }
                }
                Err(e) => writeln!(self.output, "{}", e.message())?,
            }
        }
        Ok(())
    }

    /// Execute one parsed command.
    pub fn execute(&mut self, command: Command) -> CliResult<()> {
        match command {
            Command::Help(verb) => self.help(verb.as_deref()),
            Command::Exit => Ok(()),
            Command::Create => self.create(),
            Command::Edit(id) => self.edit(id),
            Command::Find(value) => self.find(value),
            Command::List => self.list(),
            Command::Stat => self.stat(),
            Command::Insert { id, draft } => self.insert(id, draft),
            Command::Update {
                assignments,
                selection,
            } => {
                let count = self.store.update(&selection, &assignments)?;
                writeln!(self.output, "{} record(s) updated.", count)?;
                Ok(())
            }
            Command::Delete(selection) => self.delete(&selection),
            Command::Select { fields, selection } => self.select(fields, &selection),
            Command::Import(path) => self.import(&path),
            Command::Export(path) => self.export(&path),
            Command::Purge => self.purge(),
        }
    }

    fn help(&mut self, verb: Option<&str>) -> CliResult<()> {
        match verb {
            None => {
                writeln!(self.output, "Available commands:")?;
                for (name, description) in VERBS {
                    writeln!(self.output, "\t{:<8} - {}", name, description)?;
                }
            }
            Some(verb) => match VERBS.iter().find(|(name, _)| *name == verb) {
                Some((name, description)) => writeln!(self.output, "{} - {}", name, description)?,
                None => writeln!(self.output, "There is no explanation for '{}' command.", verb)?,
            },
        }
        Ok(())
    }

    fn create(&mut self) -> CliResult<()> {
        let mut draft = match self.prompt_draft(None)? {
            Some(draft) => draft,
            None => return Ok(()),
        };

        loop {
            match self.store.create(draft.clone()) {
                Ok(id) => {
                    writeln!(self.output, "Record #{} is created.", id)?;
                    return Ok(());
                }
                Err(e) => match e.validation_failure().map(|f| f.field) {
                    Some(field) if field != Field::Id => {
                        writeln!(self.output, "{}", e.message())?;
                        if !self.reprompt(field, &mut draft)? {
                            return Ok(());
                        }
                    }
                    _ => return Err(e.into()),
                },
            }
        }
    }

    fn edit(&mut self, id: RecordId) -> CliResult<()> {
        let current = match self.store.get(id)? {
            Some(record) => record,
            None => {
                writeln!(self.output, "Record #{} is not found.", id)?;
                return Ok(());
            }
        };

        let mut draft = match self.prompt_draft(Some(&current))? {
            Some(draft) => draft,
            None => return Ok(()),
        };

        loop {
            match self.store.edit(id, draft.clone()) {
                Ok(()) => {
                    writeln!(self.output, "Record #{} is updated.", id)?;
                    return Ok(());
                }
                Err(e) => match e.validation_failure().map(|f| f.field) {
                    Some(field) if field != Field::Id => {
                        writeln!(self.output, "{}", e.message())?;
                        if !self.reprompt(field, &mut draft)? {
                            return Ok(());
                        }
                    }
                    _ => return Err(e.into()),
                },
            }
        }
    }

    /// Prompt for every editable field. With `current`, an empty answer
    /// keeps the current value. `None` if input ended.
    fn prompt_draft(&mut self, current: Option<&Record>) -> CliResult<Option<RecordDraft>> {
        let mut draft = match current {
            Some(record) => record.to_draft(),
            None => RecordDraft::new("", "", NaiveDate::MIN, 0, Income::from_hundredths(0), ' '),
        };

        for field in Field::ALL.into_iter().filter(|f| *f != Field::Id) {
            let value = match self.prompt_field(field, current)? {
                Some(value) => value,
                None => return Ok(None),
            };
            value.write_to(&mut draft);
        }
        Ok(Some(draft))
    }

    /// Ask for one field again after a validation failure.
    fn reprompt(&mut self, field: Field, draft: &mut RecordDraft) -> CliResult<bool> {
        match self.prompt_field(field, None)? {
            Some(value) => {
                value.write_to(draft);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Prompt until the answer parses as a value of `field`.
    fn prompt_field(
        &mut self,
        field: Field,
        current: Option<&Record>,
    ) -> CliResult<Option<FieldValue>> {
        let label = match current {
            Some(record) => format!("{} [{}]: ", field_label(field), record.field_text(field)),
            None => format!("{}: ", field_label(field)),
        };

        loop {
            let answer = match prompt(&mut self.input, &mut self.output, &label)? {
                Some(answer) => answer,
                None => return Ok(None),
            };

            let text = match current {
                Some(record) if answer.trim().is_empty() => record.field_text(field),
                _ => answer,
            };

            match field.parse_value(&text) {
                Ok(value) => return Ok(Some(value)),
                Err(reason) => writeln!(
                    self.output,
                    "Conversion failed: {}. Please, correct your input.",
                    reason
                )?,
            }
        }
    }

    fn find(&mut self, value: FieldValue) -> CliResult<()> {
        let records = match value {
            FieldValue::FirstName(name) => self.store.find_by_first_name(&name)?,
            FieldValue::LastName(name) => self.store.find_by_last_name(&name)?,
            FieldValue::DateOfBirth(date) => self.store.find_by_date_of_birth(date)?,
            other => self.store.select(&Selection::by(other))?,
        };
        self.print_records(&records)
    }

    fn list(&mut self) -> CliResult<()> {
        let records = self.store.get_all()?;
        self.print_records(&records)
    }

    fn print_records(&mut self, records: &[Record]) -> CliResult<()> {
        if records.is_empty() {
            writeln!(self.output, "No records found.")?;
        }
        for record in records {
            writeln!(self.output, "{}", format_record(record))?;
        }
        Ok(())
    }

    fn stat(&mut self) -> CliResult<()> {
        let stat = self.store.get_stat()?;
        writeln!(
            self.output,
            "{} record(s). {} removed.",
            stat.live, stat.removed
        )?;
        Ok(())
    }

    fn insert(&mut self, id: Option<RecordId>, draft: RecordDraft) -> CliResult<()> {
        match id {
            Some(id) => {
                self.store.insert(draft.into_record(id))?;
                writeln!(self.output, "Record #{} is inserted.", id)?;
            }
            None => {
                let id = self.store.create(draft)?;
                writeln!(self.output, "Record #{} is created.", id)?;
            }
        }
        Ok(())
    }

    fn delete(&mut self, selection: &Selection) -> CliResult<()> {
        let removed = self.store.delete(selection)?;
        if removed.is_empty() {
            writeln!(self.output, "No records matched.")?;
        } else {
            let ids: Vec<String> = removed.iter().map(|id| format!("#{}", id)).collect();
            writeln!(self.output, "Record(s) {} deleted.", ids.join(", "))?;
        }
        Ok(())
    }

    fn select(&mut self, fields: Vec<Field>, selection: &Selection) -> CliResult<()> {
        let fields = if fields.is_empty() {
            Field::ALL.to_vec()
        } else {
            fields
        };
        let records = self.store.select(selection)?;
        write!(self.output, "{}", render_table(&fields, &records))?;
        Ok(())
    }

    fn import(&mut self, path: &Path) -> CliResult<()> {
        let source = path.display().to_string();
        let file = File::open(path)
            .map_err(|e| CliError::io_error(format!("Cannot open {}: {}", source, e)))?;

        let scope = ObservationScope::with_fields(
            Event::RestoreStart,
            Event::RestoreComplete,
            &[("source", source.as_str())],
        );
        let load = match Snapshot::read_json(BufReader::new(file)) {
            Ok(load) => load,
            Err(e) => {
                scope.fail(e.message());
                return Err(e.into());
            }
        };
        for issue in &load.issues {
            let id_text = issue.id.map_or_else(|| "none".to_string(), |id| id.to_string());
            log_event_with_fields(
                Event::RestoreRecordRejected,
                &[("record_id", &id_text), ("reason", &issue.reason)],
            );
        }

        let report = match self.store.restore(&load.snapshot) {
            Ok(report) => report,
            Err(e) => {
                scope.fail(e.message());
                return Err(e.into());
            }
        };
        scope.complete_with_fields(&[
            ("imported", &report.imported().to_string()),
            ("rejected", &(report.rejected.len() + load.issues.len()).to_string()),
        ]);

        for issue in load.issues.iter().chain(&report.rejected) {
            writeln!(self.output, "Skipped {}", issue)?;
        }
        writeln!(
            self.output,
            "{} record(s) were imported from {}.",
            report.imported(),
            source
        )?;
        Ok(())
    }

    fn export(&mut self, path: &Path) -> CliResult<()> {
        let snapshot = self.store.make_snapshot()?;
        log_event_with_fields(Event::SnapshotTaken, &[("records", &snapshot.len().to_string())]);

        let file = File::create(path)
            .map_err(|e| CliError::io_error(format!("Cannot create {}: {}", path.display(), e)))?;
        snapshot.write_json(BufWriter::new(file))?;

        writeln!(
            self.output,
            "All records are exported into file {}.",
            path.display()
        )?;
        Ok(())
    }

    fn purge(&mut self) -> CliResult<()> {
        let before = self.store.get_stat()?;
        let scope = ObservationScope::with_fields(
            Event::PurgeStart,
            Event::PurgeComplete,
            &[("backend", self.store.kind())],
        );

        let purged = match self.store.purge() {
            Ok(purged) => purged,
            Err(e) => {
                scope.fail(e.message());
                return Err(e.into());
            }
        };
        scope.complete_with_fields(&[("purged", &purged.to_string())]);

        writeln!(
            self.output,
            "Data storage processing is completed: {} of {} records were purged.",
            purged,
            before.live + before.removed
        )?;
        Ok(())
    }
}
