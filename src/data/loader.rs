use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};

use super::model::{CaseRecord, CaseTable, CellValue};
use crate::config::DashboardConfig;
use crate::error::{IngestError, IngestResult};

// ---------------------------------------------------------------------------
// Sheet layout
// ---------------------------------------------------------------------------

/// Where the header sits and whether the last row is footer noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SheetLayout {
    /// Zero-based physical row holding the column names.
    pub header_row: usize,
    /// Discard the final physical row (report totals).
    pub drop_footer: bool,
    /// Discard columns with no data in any row.
    pub drop_empty_columns: bool,
}

impl SheetLayout {
    /// Layout of the court system's "Conclusos" export: a title row, the
    /// header, the cases, then a totals row.
    pub const fn conclusos() -> Self {
        SheetLayout {
            header_row: 1,
            drop_footer: true,
            drop_empty_columns: true,
        }
    }

    /// Layout of the files this tool exports: header first, no footer, and
    /// every exported column kept even when blank.
    pub const fn plain() -> Self {
        SheetLayout {
            header_row: 0,
            drop_footer: false,
            drop_empty_columns: false,
        }
    }
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self::conclusos()
    }
}

/// Container formats accepted by [`ingest_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// xlsx / xlsm / xlsb / xls / ods, sniffed by calamine.
    Workbook,
    Csv,
}

impl FileKind {
    /// Dispatch by extension.
    pub fn from_path(path: &Path) -> IngestResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(FileKind::Workbook),
            "csv" => Ok(FileKind::Csv),
            other => Err(IngestError::UnsupportedExtension(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read and ingest a file from disk.
pub fn load_file(
    path: &Path,
    layout: SheetLayout,
    config: &DashboardConfig,
) -> IngestResult<CaseTable> {
    let kind = FileKind::from_path(path)?;
    let bytes = std::fs::read(path)?;
    ingest_bytes(&bytes, kind, layout, config)
}

/// Turn raw file bytes into a normalized [`CaseTable`].
///
/// Steps, in order: header row → drop all-empty columns → drop footer →
/// drop configured columns → parse the start date → derive the year column.
pub fn ingest_bytes(
    bytes: &[u8],
    kind: FileKind,
    layout: SheetLayout,
    config: &DashboardConfig,
) -> IngestResult<CaseTable> {
    let grid = match kind {
        FileKind::Workbook => read_workbook_grid(bytes)?,
        FileKind::Csv => read_csv_grid(bytes)?,
    };
    let table = normalize(grid, layout, config)?;

    log::info!(
        "Ingested {} cases with {} columns",
        table.len(),
        table.columns.len()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Grid readers: file → physical rows of cells
// ---------------------------------------------------------------------------

/// First worksheet as physical rows. calamine trims leading blank rows and
/// columns, so they are padded back to keep row numbers physical.
fn read_workbook_grid(bytes: &[u8]) -> IngestResult<Vec<Vec<CellValue>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::NoWorksheet)??;

    let Some((start_row, start_col)) = range.start() else {
        return Ok(Vec::new());
    };

    let mut grid: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![CellValue::Null; start_col as usize];
        cells.extend(row.iter().map(cell_from_data));
        grid.push(cells);
    }
    Ok(grid)
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::from_f64(*f),
        Data::String(s) => CellValue::from_text(s),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::Date)
            .unwrap_or(CellValue::Null),
        Data::DateTimeIso(s) => parse_date_text(s)
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::from_text(s)),
        Data::DurationIso(s) => CellValue::from_text(s),
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

/// CSV as physical rows. Semicolon-separated files (the usual Brazilian
/// locale export) are detected from the first few lines.
fn read_csv_grid(bytes: &[u8]) -> IngestResult<Vec<Vec<CellValue>>> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let head: Vec<u8> = bytes
        .split(|&b| b == b'\n')
        .take(5)
        .flatten()
        .copied()
        .collect();
    let semicolons = head.iter().filter(|&&b| b == b';').count();
    let commas = head.iter().filter(|&&b| b == b',').count();
    let delimiter = if semicolons > commas { b';' } else { b',' };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(guess_cell_type).collect());
    }
    Ok(grid)
}

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() {
        return CellValue::Null;
    }
    // Process numbers such as "0800001" keep their leading zeros.
    let bytes = s.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' && bytes[1].is_ascii_digit() {
        return CellValue::Text(s.to_string());
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    let numeric = s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if numeric {
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::from_f64(f);
        }
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

fn normalize(
    mut grid: Vec<Vec<CellValue>>,
    layout: SheetLayout,
    config: &DashboardConfig,
) -> IngestResult<CaseTable> {
    if grid.len() <= layout.header_row {
        return Err(IngestError::MissingHeader {
            expected: layout.header_row + 1,
        });
    }

    let mut data_rows = grid.split_off(layout.header_row + 1);
    let header_cells = grid.pop().unwrap_or_default();

    // Spacer lines between the cases and the totals row.
    let before = data_rows.len();
    data_rows.retain(|cells| cells.iter().any(|c| !c.is_null()));
    if data_rows.len() < before {
        log::debug!("Skipped {} blank row(s)", before - data_rows.len());
    }

    let width = data_rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header_cells.len()))
        .max()
        .unwrap_or(0);

    let mut columns = header_names(&header_cells, width);
    let mut records: Vec<CaseRecord> = data_rows
        .into_iter()
        .map(|mut cells| {
            cells.resize(width, CellValue::Null);
            CaseRecord::new(cells)
        })
        .collect();

    if layout.drop_empty_columns {
        let keep: Vec<bool> = (0..width)
            .map(|c| records.iter().any(|r| !r.get(c).is_null()))
            .collect();
        for (name, _) in columns.iter().zip(&keep).filter(|(_, k)| !**k) {
            log::debug!("Dropping empty column '{name}'");
        }
        retain_columns(&mut columns, &mut records, &keep);
    }

    let mut dropped_footer = None;
    if layout.drop_footer {
        if let Some(footer) = records.pop() {
            log::info!(
                "Discarded last row as footer: [{}]",
                footer
                    .values
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" | ")
            );
            dropped_footer = Some(footer);
        }
    }

    let keep: Vec<bool> = columns
        .iter()
        .map(|c| !config.dropped_columns.contains(c))
        .collect();
    for (name, _) in columns.iter().zip(&keep).filter(|(_, k)| !**k) {
        log::debug!("Dropping configured column '{name}'");
    }
    retain_columns(&mut columns, &mut records, &keep);

    if let Some(date_col) = columns.iter().position(|c| *c == config.columns.start_date) {
        let year_col = match columns.iter().position(|c| *c == config.columns.year) {
            Some(i) => i,
            None => {
                columns.push(config.columns.year.clone());
                columns.len() - 1
            }
        };
        for record in &mut records {
            let date = coerce_date(record.get(date_col));
            let year = match &date {
                CellValue::Date(d) => CellValue::Text(d.format("%Y").to_string()),
                _ => CellValue::Text("N/A".into()),
            };
            record.values.resize(columns.len(), CellValue::Null);
            record.values[date_col] = date;
            record.values[year_col] = year;
        }
    }

    Ok(CaseTable {
        columns,
        records,
        dropped_footer,
    })
}

/// Header cells to unique column names: blanks become `Unnamed: <i>`,
/// repeats get `.1`, `.2`, ... suffixes.
fn header_names(cells: &[CellValue], width: usize) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    (0..width)
        .map(|i| {
            let base = match cells.get(i) {
                Some(CellValue::Null) | None => format!("Unnamed: {i}"),
                Some(v) => v.to_string().trim().to_string(),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

fn retain_columns(columns: &mut Vec<String>, records: &mut [CaseRecord], keep: &[bool]) {
    if keep.iter().all(|k| *k) {
        return;
    }
    let mut flags = keep.iter();
    columns.retain(|_| *flags.next().unwrap_or(&true));
    for record in records {
        let mut flags = keep.iter();
        record.values.retain(|_| *flags.next().unwrap_or(&true));
    }
}

// ---------------------------------------------------------------------------
// Permissive date parsing
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%d.%m.%Y"];

/// Any cell to a date, or `Null` when it cannot be read as one.
pub fn coerce_date(value: &CellValue) -> CellValue {
    let parsed = match value {
        CellValue::Date(d) => Some(*d),
        CellValue::Integer(i) => from_excel_serial(*i as f64),
        CellValue::Float(f) => from_excel_serial(*f),
        CellValue::Text(s) => parse_date_text(s),
        CellValue::Bool(_) | CellValue::Null => None,
    };
    parsed.map(CellValue::Date).unwrap_or(CellValue::Null)
}

/// Day-first text dates, with or without a time part, and ISO forms.
pub fn parse_date_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Excel's 1900 date system (serial 1 = 1900-01-01, epoch 1899-12-30).
fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    /// A workbook shaped like the court export: title, header, cases, totals.
    fn conclusos_workbook() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Relatório de Conclusos").unwrap();
        let header = [
            "PROCESSO",
            "SISTEMA",
            "VAZIA",
            "CLASSE",
            "INÍCIO",
            "DIAS CONCLUSO",
            "FÍSICO / ELETRÔNICO?",
        ];
        for (c, h) in header.iter().enumerate() {
            sheet.write_string(1, c as u16, *h).unwrap();
        }
        let rows = [
            ("0800001-11.2023", "65 - AÇÃO CIVIL PÚBLICA", "15/03/2023", 10.0),
            ("0800002-22.2021", "120 - MANDADO DE SEGURANÇA CÍVEL", "lixo", 90.0),
            ("0800003-33.2024", "65 - AÇÃO CIVIL PÚBLICA", "2024-01-02", 85.0),
        ];
        for (i, (proc_no, class, start, days)) in rows.iter().enumerate() {
            let r = i as u32 + 2;
            sheet.write_string(r, 0, *proc_no).unwrap();
            sheet.write_string(r, 1, "PJe").unwrap();
            sheet.write_string(r, 3, *class).unwrap();
            sheet.write_string(r, 4, *start).unwrap();
            sheet.write_number(r, 5, *days).unwrap();
            sheet.write_string(r, 6, "ELETRÔNICO").unwrap();
        }
        sheet.write_string(5, 0, "Total: 3").unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn conclusos_workbook_is_normalized() {
        let cfg = DashboardConfig::default();
        let table = ingest_bytes(
            &conclusos_workbook(),
            FileKind::Workbook,
            SheetLayout::conclusos(),
            &cfg,
        )
        .unwrap();

        assert_eq!(
            table.columns,
            vec!["PROCESSO", "CLASSE", "INÍCIO", "DIAS CONCLUSO", "ANO"]
        );
        assert_eq!(table.len(), 3);

        let footer = table.dropped_footer.as_ref().unwrap();
        assert_eq!(footer.get(0), &CellValue::Text("Total: 3".into()));

        let first = table.row_map(0);
        assert_eq!(first["DIAS CONCLUSO"], &CellValue::Integer(10));
        assert_eq!(first["ANO"], &CellValue::Text("2023".into()));

        let second = table.row_map(1);
        assert!(second["INÍCIO"].is_null());
        assert_eq!(second["ANO"], &CellValue::Text("N/A".into()));

        assert_eq!(table.row_map(2)["ANO"], &CellValue::Text("2024".into()));
    }

    #[test]
    fn blank_spacer_row_before_totals_is_skipped() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Relatório de Conclusos").unwrap();
        sheet.write_string(1, 0, "PROCESSO").unwrap();
        sheet.write_string(1, 1, "DIAS CONCLUSO").unwrap();
        sheet.write_string(2, 0, "0800001").unwrap();
        sheet.write_number(2, 1, 12.0).unwrap();
        sheet.write_string(3, 0, "0800002").unwrap();
        sheet.write_number(3, 1, 95.0).unwrap();
        // Row 4 left blank.
        sheet.write_string(5, 0, "Total: 2").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = ingest_bytes(
            &bytes,
            FileKind::Workbook,
            SheetLayout::conclusos(),
            &DashboardConfig::default(),
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.records.iter().all(|r| !r.get(0).is_null()));
        let footer = table.dropped_footer.as_ref().unwrap();
        assert_eq!(footer.get(0), &CellValue::Text("Total: 2".into()));
    }

    #[test]
    fn csv_keeps_leading_zeros_and_literal_nan() {
        let csv = "PROCESSO;ETIQUETAS PJE;DIAS CONCLUSO\n0800001;NaN;7\n0;inf;2.5\n";
        let table = ingest_bytes(
            csv.as_bytes(),
            FileKind::Csv,
            SheetLayout::plain(),
            &DashboardConfig::default(),
        )
        .unwrap();
        assert_eq!(table.records[0].get(0), &CellValue::Text("0800001".into()));
        assert_eq!(table.records[0].get(1), &CellValue::Text("NaN".into()));
        assert_eq!(table.records[0].get(2), &CellValue::Integer(7));
        assert_eq!(table.records[1].get(0), &CellValue::Integer(0));
        assert_eq!(table.records[1].get(1), &CellValue::Text("inf".into()));
        assert_eq!(table.records[1].get(2), &CellValue::Float(2.5));
    }

    #[test]
    fn too_short_sheet_is_an_error() {
        let mut workbook = Workbook::new();
        workbook
            .add_worksheet()
            .write_string(0, 0, "só o título")
            .unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let err = ingest_bytes(
            &bytes,
            FileKind::Workbook,
            SheetLayout::conclusos(),
            &DashboardConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::MissingHeader { expected: 2 }));
    }

    #[test]
    fn garbage_bytes_are_an_ingest_error() {
        let err = ingest_bytes(
            b"definitely not a workbook",
            FileKind::Workbook,
            SheetLayout::conclusos(),
            &DashboardConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::Workbook(_)));
    }

    #[test]
    fn header_only_sheet_yields_empty_table() {
        let csv = "titulo\nCLASSE;DIAS CONCLUSO\n";
        let table = ingest_bytes(
            csv.as_bytes(),
            FileKind::Csv,
            SheetLayout::conclusos(),
            &DashboardConfig::default(),
        )
        .unwrap();
        assert!(table.is_empty());
        assert!(table.dropped_footer.is_none());
    }

    #[test]
    fn csv_with_semicolons_and_duplicate_headers() {
        let csv = "relatorio\nCLASSE;CLASSE;;DIAS CONCLUSO\nA;B;;5\nC;D;x;7\ntotal;;;\n";
        let table = ingest_bytes(
            csv.as_bytes(),
            FileKind::Csv,
            SheetLayout::conclusos(),
            &DashboardConfig::default(),
        )
        .unwrap();
        assert_eq!(
            table.columns,
            vec!["CLASSE", "CLASSE.1", "Unnamed: 2", "DIAS CONCLUSO"]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[1].get(3), &CellValue::Integer(7));
    }

    #[test]
    fn plain_layout_keeps_every_row() {
        let csv = "CLASSE,ANO\nA,2020\nB,2021\n";
        let table = ingest_bytes(
            csv.as_bytes(),
            FileKind::Csv,
            SheetLayout::plain(),
            &DashboardConfig::default(),
        )
        .unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn existing_year_column_is_overwritten_in_place() {
        let csv = "ANO,INÍCIO,CLASSE\n1999,01/02/2022,A\n";
        let table = ingest_bytes(
            csv.as_bytes(),
            FileKind::Csv,
            SheetLayout::plain(),
            &DashboardConfig::default(),
        )
        .unwrap();
        assert_eq!(table.columns, vec!["ANO", "INÍCIO", "CLASSE"]);
        assert_eq!(table.records[0].get(0), &CellValue::Text("2022".into()));
    }

    #[test]
    fn dates_are_read_day_first_and_from_serials() {
        let d = parse_date_text("03/04/2021 10:30").unwrap();
        assert_eq!(d.format("%Y-%m-%d %H:%M").to_string(), "2021-04-03 10:30");
        match coerce_date(&CellValue::Integer(45000)) {
            CellValue::Date(d) => assert_eq!(d.format("%Y-%m-%d").to_string(), "2023-03-15"),
            other => panic!("expected a date, got {other:?}"),
        }
        assert!(coerce_date(&CellValue::Text("amanhã".into())).is_null());
        assert!(coerce_date(&CellValue::Integer(-4)).is_null());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = FileKind::from_path(Path::new("dados.pdf")).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedExtension(ext) if ext == "pdf"));
    }
}
