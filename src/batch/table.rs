use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use calamine::{Reader, open_workbook_auto};
use tracing::debug;

use super::{BatchOutcome, BatchRow};

const MANUFACTURER_COLUMNS: [&str; 2] = ["hersteller", "manufacturer"];
const MODEL_COLUMNS: [&str; 2] = ["modell", "model"];
const LEAD_COLUMNS: [&str; 2] = ["elektrode", "lead"];

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV file is not UTF-8 encoded; re-save it as \"CSV UTF-8\" and retry")]
    NotUtf8,

    #[error("spreadsheet error: {0}")]
    Excel(#[from] calamine::Error),

    #[error("unsupported file type '{0}': expected .csv or .xlsx")]
    UnsupportedFormat(String),

    #[error("workbook has no worksheet")]
    NoWorksheet,

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),
}

/// Parsed input rows. Rows lacking manufacturer or model are counted, not returned.
#[derive(Debug, Default)]
pub struct Table {
    pub rows: Vec<BatchRow>,
    pub skipped: usize,
    /// The header named a lead column.
    pub has_lead: bool,
}

/// Reads a `.csv` or `.xlsx` file with manufacturer and model columns.
pub fn read_table(path: &Path) -> Result<Table, TableError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let records = match extension.as_str() {
        "csv" => {
            let file = File::open(path).map_err(|source| io_error(path, source))?;
            read_csv_records(BufReader::new(file))?
        }
        "xlsx" | "xlsm" | "xls" | "ods" => read_workbook_records(path)?,
        other => return Err(TableError::UnsupportedFormat(other.to_string())),
    };

    debug!(path = %path.display(), records = records.len(), "table loaded");
    rows_from_records(records)
}

fn io_error(path: &Path, source: std::io::Error) -> TableError {
    TableError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Header plus data records; `;` is used when the header line has it but no `,`.
fn read_csv_records(mut reader: impl BufRead) -> Result<Vec<Vec<String>>, TableError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| TableError::Csv(e.into()))?;
    let content = String::from_utf8(bytes).map_err(|_| TableError::NotUtf8)?;

    let header_line = content.lines().next().unwrap_or_default();
    let delimiter = if header_line.contains(';') && !header_line.contains(',') {
        b';'
    } else {
        b','
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for record in csv_reader.records() {
        records.push(record?.iter().map(str::to_string).collect());
    }
    Ok(records)
}

fn read_workbook_records(path: &Path) -> Result<Vec<Vec<String>>, TableError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(TableError::NoWorksheet)??;
    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}

fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim().trim_start_matches('\u{feff}').to_lowercase();
        names.contains(&h.as_str())
    })
}

fn rows_from_records(records: Vec<Vec<String>>) -> Result<Table, TableError> {
    let mut records = records.into_iter();
    let headers = records.next().unwrap_or_default();

    let manufacturer_col = find_column(&headers, &MANUFACTURER_COLUMNS);
    let model_col = find_column(&headers, &MODEL_COLUMNS);
    let (manufacturer_col, model_col) = match (manufacturer_col, model_col) {
        (Some(m), Some(n)) => (m, n),
        (m, n) => {
            let mut missing = Vec::new();
            if m.is_none() {
                missing.push("Hersteller");
            }
            if n.is_none() {
                missing.push("Modell");
            }
            return Err(TableError::MissingColumns(missing));
        }
    };
    let lead_col = find_column(&headers, &LEAD_COLUMNS);

    let mut table = Table {
        has_lead: lead_col.is_some(),
        ..Default::default()
    };
    for record in records {
        let cell = |i: usize| record.get(i).map(|s| s.trim()).unwrap_or_default();
        let manufacturer = cell(manufacturer_col);
        let model = cell(model_col);
        if manufacturer.is_empty() || model.is_empty() {
            table.skipped += 1;
            continue;
        }
        let lead = lead_col
            .map(cell)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        table.rows.push(BatchRow {
            manufacturer: manufacturer.to_string(),
            model: model.to_string(),
            lead,
        });
    }
    Ok(table)
}

/// Result CSV with `Hersteller,Modell,Ergebnis` headers, plus `Elektrode` before
/// `Ergebnis` when the input had a lead column. The file is created on `create`.
pub struct ResultWriter {
    writer: csv::Writer<File>,
    path: PathBuf,
    with_lead: bool,
}

impl ResultWriter {
    pub fn create(path: &Path, with_lead: bool) -> Result<Self, TableError> {
        let file = File::create(path).map_err(|source| io_error(path, source))?;
        let mut writer = csv::Writer::from_writer(file);
        if with_lead {
            writer.write_record(["Hersteller", "Modell", "Elektrode", "Ergebnis"])?;
        } else {
            writer.write_record(["Hersteller", "Modell", "Ergebnis"])?;
        }
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            with_lead,
        })
    }

    pub fn write_all(mut self, outcomes: &[BatchOutcome]) -> Result<(), TableError> {
        for outcome in outcomes {
            let mut record = vec![outcome.manufacturer.as_str(), outcome.model.as_str()];
            if self.with_lead {
                record.push(outcome.lead.as_deref().unwrap_or_default());
            }
            record.push(outcome.result.as_str());
            self.writer.write_record(&record)?;
        }
        self.writer
            .flush()
            .map_err(|source| io_error(&self.path, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_table(content: &str) -> Result<Table, TableError> {
        csv_table_bytes(content.as_bytes())
    }

    fn csv_table_bytes(content: &[u8]) -> Result<Table, TableError> {
        rows_from_records(read_csv_records(content)?)
    }

    fn outcome(manufacturer: &str, model: &str, lead: Option<&str>, result: &str) -> BatchOutcome {
        BatchOutcome {
            manufacturer: manufacturer.into(),
            model: model.into(),
            lead: lead.map(String::from),
            result: result.into(),
            succeeded: true,
        }
    }

    #[test]
    fn reads_german_headers() {
        let table = csv_table(
            "Hersteller,Modell\nMedtronic,Attesta DR ATDR01\nBiotronik,Edora 8 DR-T\n",
        )
        .unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].manufacturer, "Medtronic");
        assert_eq!(table.rows[1].model, "Edora 8 DR-T");
        assert!(table.rows[0].lead.is_none());
    }

    #[test]
    fn reads_english_headers_case_insensitive_with_semicolons() {
        let table = csv_table("\u{feff}MANUFACTURER;Model;Lead\nAbbott;Assurity MRI;Tendril MRI\n")
            .unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].manufacturer, "Abbott");
        assert_eq!(table.rows[0].lead.as_deref(), Some("Tendril MRI"));
    }

    #[test]
    fn missing_model_column_is_reported() {
        let err = csv_table("Hersteller,Typ\nMedtronic,Attesta\n").unwrap_err();
        match err {
            TableError::MissingColumns(missing) => assert_eq!(missing, vec!["Modell"]),
            other => panic!("expected MissingColumns, got: {other:?}"),
        }
    }

    #[test]
    fn empty_file_reports_both_columns() {
        let err = csv_table("").unwrap_err();
        assert!(err.to_string().contains("Hersteller"));
        assert!(err.to_string().contains("Modell"));
    }

    #[test]
    fn rows_with_empty_fields_are_skipped() {
        let table = csv_table(
            "Hersteller,Modell\nMedtronic,\n ,Edora\nBoston Scientific,Accolade MRI\nShort\n",
        )
        .unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].manufacturer, "Boston Scientific");
        assert_eq!(table.skipped, 3);
    }

    #[test]
    fn lead_column_is_detected() {
        let with = csv_table("Hersteller,Modell,Elektrode\nMedtronic,Azure,\n").unwrap();
        assert!(with.has_lead);
        assert!(with.rows[0].lead.is_none());

        let without = csv_table("Hersteller,Modell\nMedtronic,Azure\n").unwrap();
        assert!(!without.has_lead);
    }

    #[test]
    fn cp1252_csv_asks_for_utf8() {
        let err = csv_table_bytes(b"Hersteller,Modell\nM\xfcller,Implantat\n").unwrap_err();
        assert!(matches!(err, TableError::NotUtf8));
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn read_table_rejects_unknown_extension() {
        let err = read_table(Path::new("implants.txt")).unwrap_err();
        assert!(matches!(err, TableError::UnsupportedFormat(ext) if ext == "txt"));
    }

    #[test]
    fn read_table_reads_csv_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Hersteller,Modell").unwrap();
        writeln!(file, "Medtronic,Attesta DR ATDR01").unwrap();
        file.flush().unwrap();

        let table = read_table(file.path()).unwrap();
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn read_table_missing_file_is_io_error() {
        let err = read_table(Path::new("/nonexistent/dir/implants.csv")).unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));
    }

    #[test]
    fn writer_uses_three_columns_without_lead() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let outcomes = vec![
            outcome(
                "Medtronic",
                "Attesta DR ATDR01",
                None,
                "- MR-Status: bedingt\n- Magnetfeldstärke: 1,5 T",
            ),
            outcome("Biotronik", "Edora", None, "no matching information found"),
        ];

        ResultWriter::create(&path, false)
            .unwrap()
            .write_all(&outcomes)
            .unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, vec!["Hersteller", "Modell", "Ergebnis"]);
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][2], "- MR-Status: bedingt\n- Magnetfeldstärke: 1,5 T");
        assert_eq!(&rows[1][0], "Biotronik");
    }

    #[test]
    fn writer_adds_lead_column_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let outcomes = vec![
            outcome("Medtronic", "Azure", Some("Lead A"), "- MR-Status: bedingt"),
            outcome("Medtronic", "Azure", None, "- MR-Status: bedingt"),
        ];

        ResultWriter::create(&path, true)
            .unwrap()
            .write_all(&outcomes)
            .unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, vec!["Hersteller", "Modell", "Elektrode", "Ergebnis"]);
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(&rows[0][2], "Lead A");
        assert_eq!(&rows[1][2], "");
        assert_eq!(&rows[1][3], "- MR-Status: bedingt");
    }

    #[test]
    fn writer_with_no_rows_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        ResultWriter::create(&path, false)
            .unwrap()
            .write_all(&[])
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), "Hersteller,Modell,Ergebnis");
    }

    #[test]
    fn writer_in_missing_directory_fails_on_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("out.csv");
        let err = ResultWriter::create(&path, false).err().unwrap();
        assert!(matches!(err, TableError::Io { .. }));
    }
}
