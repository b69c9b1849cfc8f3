//! `batch` command implementation.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use clap::Args;
use imgreloc_core::Transformer;
use serde_json::{Map, Value};

use super::{GlobalArgs, open_output};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the batch command.
#[derive(Args)]
pub(crate) struct BatchArgs {
    /// JSON-lines file with one record object per line.
    #[arg(long)]
    input: PathBuf,

    /// Record field holding the HTML fragment.
    #[arg(long, default_value = "body")]
    field_name: String,

    /// Write transformed records here (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip failed records instead of aborting the batch.
    #[arg(long)]
    continue_on_error: bool,
}

/// Counts reported after a batch.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct BatchSummary {
    pub transformed: usize,
    pub skipped: usize,
}

impl BatchArgs {
    /// Execute the batch command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid, the input cannot be read,
    /// or a record fails and `--continue-on-error` is not set.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let transformer = global.build_transformer()?;
        output.info(&format!("Run directory: bat-{}", transformer.run_id()));

        let reader = BufReader::new(File::open(&self.input)?);
        let mut writer = open_output(self.output.as_deref())?;

        let summary = process_records(
            &transformer,
            reader,
            &mut writer,
            &self.field_name,
            self.continue_on_error,
            &output,
        )?;
        writer.flush()?;

        output.success(&format!("Transformed {} record(s)", summary.transformed));
        if summary.skipped > 0 {
            output.warning(&format!("Skipped {} failed record(s)", summary.skipped));
        }
        Ok(())
    }
}

/// Transform `field_name` of every record read from `reader`.
///
/// Blank lines are ignored. Records without the field pass through unchanged.
pub(crate) fn process_records<R: BufRead, W: Write>(
    transformer: &Transformer,
    reader: R,
    writer: &mut W,
    field_name: &str,
    continue_on_error: bool,
    output: &Output,
) -> Result<BatchSummary, CliError> {
    let mut summary = BatchSummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let line_number = index + 1;

        match transform_record(transformer, &line, field_name) {
            Ok(record) => {
                serde_json::to_writer(&mut *writer, &record).map_err(std::io::Error::from)?;
                writer.write_all(b"\n")?;
                tracing::debug!(line = line_number, "transformed record");
                summary.transformed += 1;
            }
            Err(message) if continue_on_error => {
                output.warning(&format!("Skipping record on line {line_number}: {message}"));
                summary.skipped += 1;
            }
            Err(message) => {
                return Err(CliError::Record {
                    line: line_number,
                    message,
                });
            }
        }
    }

    Ok(summary)
}

/// Parse one record and rewrite its HTML field.
fn transform_record(
    transformer: &Transformer,
    line: &str,
    field_name: &str,
) -> Result<Map<String, Value>, String> {
    let mut record: Map<String, Value> = match serde_json::from_str(line) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err("expected a JSON object".to_owned()),
        Err(e) => return Err(format!("invalid JSON: {e}")),
    };

    let html = match record.get(field_name) {
        None | Some(Value::Null) => return Ok(record),
        Some(Value::String(html)) => html.clone(),
        Some(_) => return Err(format!("field '{field_name}' is not a string")),
    };

    let body = transformer
        .transform(&html, &record)
        .map_err(|e| e.to_string())?;
    record.insert(field_name.to_owned(), Value::String(body));
    Ok(record)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use imgreloc_config::{PathSetting, RelocateConfig};
    use imgreloc_storage::{FileStore, MockFileStore, SequentialTokens};
    use pretty_assertions::assert_eq;

    use super::*;

    fn transformer(store: &Arc<MockFileStore>) -> Transformer {
        let config = RelocateConfig {
            image_file_source_path: Some(PathSetting::Field {
                field: "source_root".to_owned(),
            }),
            image_file_save_destination: Some(PathSetting::Static("/srv/public".to_owned())),
        };
        let store: Arc<dyn FileStore> = Arc::clone(store) as Arc<dyn FileStore>;
        Transformer::new(&config, store, &SequentialTokens::new("run")).unwrap()
    }

    fn run(
        store: &Arc<MockFileStore>,
        input: &str,
        continue_on_error: bool,
    ) -> (Result<BatchSummary, CliError>, Vec<Value>) {
        let transformer = transformer(store);
        let mut out = Vec::new();
        let result = process_records(
            &transformer,
            Cursor::new(input),
            &mut out,
            "body",
            continue_on_error,
            &Output::new(),
        );
        let records = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (result, records)
    }

    #[test]
    fn test_records_share_run_directory() {
        let store = Arc::new(
            MockFileStore::new()
                .with_file("/srv/media/a.png", b"a".to_vec())
                .with_file("/srv/media/b.png", b"b".to_vec()),
        );
        let input = concat!(
            r#"{"id":1,"source_root":"/srv/media","body":"<img src=\"/a.png\">"}"#,
            "\n",
            r#"{"id":2,"source_root":"/srv/media","body":"<img src=\"/b.png\">"}"#,
            "\n",
        );

        let (result, records) = run(&store, input, false);

        assert_eq!(
            result.unwrap(),
            BatchSummary {
                transformed: 2,
                skipped: 0
            }
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], 1);
        assert_eq!(
            records[0]["body"],
            r#"<img src="/srv/public/bat-run-1/a.png" data-entity-type="file" data-entity-uuid="file-1">"#
        );
        assert_eq!(
            records[1]["body"],
            r#"<img src="/srv/public/bat-run-1/b.png" data-entity-type="file" data-entity-uuid="file-2">"#
        );
        assert!(store.has_dir("/srv/public/bat-run-1"));
        assert!(!store.has_dir("/srv/public/bat-run-2"));
    }

    #[test]
    fn test_record_without_field_passes_through() {
        let store = Arc::new(MockFileStore::new());
        let (result, records) = run(&store, "{\"id\":7}\n\n", false);

        assert_eq!(result.unwrap().transformed, 1);
        assert_eq!(records[0], serde_json::json!({"id": 7}));
        assert_eq!(store.operation_count(), 0);
    }

    #[test]
    fn test_failed_record_aborts_by_default() {
        let store = Arc::new(MockFileStore::new().with_file("/srv/media/a.png", b"a".to_vec()));
        let input = concat!(
            r#"{"source_root":"/srv/media","body":"<img src=\"/a.png\">"}"#,
            "\n",
            r#"{"source_root":"/srv/media","body":"<img src=\"/missing.png\">"}"#,
            "\n",
            r#"{"source_root":"/srv/media","body":"<img src=\"/a.png\">"}"#,
            "\n",
        );

        let (result, records) = run(&store, input, false);

        let err = result.unwrap_err();
        assert!(matches!(err, CliError::Record { line: 2, .. }));
        assert!(err.to_string().contains("/srv/media/missing.png"));
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_continue_on_error_skips_failed_records() {
        let store = Arc::new(MockFileStore::new().with_file("/srv/media/a.png", b"a".to_vec()));
        let input = concat!(
            "not json\n",
            r#"{"source_root":"/srv/media","body":"<img src=\"/missing.png\">"}"#,
            "\n",
            r#"{"source_root":"/srv/media","body":"<img src=\"/a.png\">"}"#,
            "\n",
        );

        let (result, records) = run(&store, input, true);

        assert_eq!(
            result.unwrap(),
            BatchSummary {
                transformed: 1,
                skipped: 2
            }
        );
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_non_object_record_rejected() {
        let store = Arc::new(MockFileStore::new());
        let (result, _) = run(&store, "[1, 2]\n", false);

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "Record on line 1: expected a JSON object");
    }

    #[test]
    fn test_non_string_field_rejected() {
        let store = Arc::new(MockFileStore::new());
        let (result, _) = run(&store, "{\"body\": 3}\n", false);

        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("field 'body' is not a string")
        );
    }
}
