use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};

use super::model::{CaseTable, CellValue};

/// Default file name offered by the save dialog.
pub const EXPORT_FILE_NAME: &str = "gps_jus_filtrado.xlsx";

const SHEET_NAME: &str = "Processos";

// ---------------------------------------------------------------------------
// xlsx export of the rows on screen
// ---------------------------------------------------------------------------

/// Build a workbook with the table's columns in row 1 and every record
/// below, in order. Missing cells are left blank.
pub fn to_xlsx_buffer(table: &CaseTable) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("dd/mm/yyyy hh:mm:ss");

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    sheet.set_freeze_panes(1, 0)?;

    for (c, name) in table.columns.iter().enumerate() {
        let c = c as u16;
        sheet.write_string_with_format(0, c, name, &header_format)?;
        sheet.set_column_width(c, 18.0)?;
    }

    for (i, record) in table.records.iter().enumerate() {
        let r = i as u32 + 1;
        for (c, value) in record.values.iter().enumerate() {
            let c = c as u16;
            match value {
                CellValue::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
                CellValue::Integer(v) => {
                    sheet.write_number(r, c, *v as f64)?;
                }
                CellValue::Float(v) => {
                    sheet.write_number(r, c, *v)?;
                }
                CellValue::Bool(b) => {
                    sheet.write_boolean(r, c, *b)?;
                }
                CellValue::Date(d) => {
                    sheet.write_datetime_with_format(r, c, d, &date_format)?;
                }
                CellValue::Null => {}
            }
        }
    }

    workbook
        .save_to_buffer()
        .context("serializing export workbook")
}

/// Write the given rows of `table` to `path`.
pub fn write_xlsx(table: &CaseTable, rows: &[usize], path: &Path) -> Result<()> {
    let bytes = to_xlsx_buffer(&table.subset(rows))?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported {} cases to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::data::loader::{ingest_bytes, FileKind, SheetLayout};
    use crate::data::model::CaseRecord;

    fn table() -> CaseTable {
        let date = chrono::NaiveDate::from_ymd_opt(2022, 5, 17)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        CaseTable::new(
            vec![
                "PROCESSO".into(),
                "INÍCIO".into(),
                "DIAS CONCLUSO".into(),
                "ETIQUETAS PJE".into(),
                "ANO".into(),
            ],
            vec![
                CaseRecord::new(vec![
                    CellValue::Text("0800001".into()),
                    CellValue::Date(date),
                    CellValue::Integer(90),
                    CellValue::Null,
                    CellValue::Text("2022".into()),
                ]),
                CaseRecord::new(vec![
                    CellValue::Text("0800002".into()),
                    CellValue::Null,
                    CellValue::Integer(12),
                    CellValue::Text("Prioridade".into()),
                    CellValue::Text("N/A".into()),
                ]),
                CaseRecord::new(vec![
                    CellValue::Text("0800003".into()),
                    CellValue::Date(date),
                    CellValue::Float(4.5),
                    CellValue::Text("URV".into()),
                    CellValue::Text("2022".into()),
                ]),
            ],
        )
    }

    #[test]
    fn export_reingests_with_same_rows_and_columns() {
        let t = table();
        let rows = vec![0, 2];
        let bytes = to_xlsx_buffer(&t.subset(&rows)).unwrap();

        let back = ingest_bytes(
            &bytes,
            FileKind::Workbook,
            SheetLayout::plain(),
            &DashboardConfig::default(),
        )
        .unwrap();
        assert_eq!(back.columns, t.columns);
        assert_eq!(back.len(), rows.len());
        assert_eq!(back.records[0].get(1), t.records[0].get(1));
        assert_eq!(back.records[1].get(2), &CellValue::Float(4.5));
        assert_eq!(back.records[0].get(4), &CellValue::Text("2022".into()));
    }

    #[test]
    fn blank_columns_survive_the_round_trip() {
        let t = table();
        // The only exported row has no label.
        let rows = vec![0];
        let bytes = to_xlsx_buffer(&t.subset(&rows)).unwrap();
        let back = ingest_bytes(
            &bytes,
            FileKind::Workbook,
            SheetLayout::plain(),
            &DashboardConfig::default(),
        )
        .unwrap();
        assert_eq!(back.columns, t.columns);
        assert_eq!(back.len(), 1);
        assert!(back.records[0].get(3).is_null());
    }

    #[test]
    fn export_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EXPORT_FILE_NAME);
        let t = table();
        write_xlsx(&t, &t.all_rows(), &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
