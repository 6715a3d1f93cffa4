use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::data::cache::IngestCache;
use crate::data::export;
use crate::data::filter::{filtered_indices, init_filter_state, year_options, FilterState};
use crate::data::loader::{FileKind, SheetLayout};
use crate::data::model::{CaseTable, CellValue};
use crate::data::summary::{self, GroupCount, Metrics};
use crate::error::IngestError;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Cases,
    Groups,
    Statistics,
}

/// Message shown in the top bar.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error { message: String, hint: Option<String> },
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Memo of ingested files.
    pub cache: IngestCache,

    /// Loaded table (None until the user opens a file).
    pub table: Option<Arc<CaseTable>>,

    /// File name of the loaded table.
    pub source_name: Option<String>,

    /// Side-panel filter selections.
    pub filters: FilterState,

    /// Choices of each category select box, per column.
    pub category_options: BTreeMap<String, Vec<CellValue>>,

    /// Years offered by the year filter, newest first.
    pub year_options: Vec<String>,

    /// Smallest and largest days pending in the table.
    pub days_bounds: Option<(f64, f64)>,

    /// Rows passing the filters (cached).
    pub filtered: Vec<usize>,

    /// Quick-search text of the case list.
    pub search: String,

    /// `filtered` narrowed by `search`: the rows listed and exported.
    pub visible: Vec<usize>,

    pub tab: Tab,

    /// Column used by the grouping tab.
    pub group_by: String,

    /// Group opened in the drill-down table.
    pub selected_group: Option<CellValue>,

    pub status: Option<Status>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let group_by = config.group_by_options.first().cloned().unwrap_or_default();
        Self {
            config,
            cache: IngestCache::default(),
            table: None,
            source_name: None,
            filters: FilterState::default(),
            category_options: BTreeMap::new(),
            year_options: Vec::new(),
            days_bounds: None,
            filtered: Vec::new(),
            search: String::new(),
            visible: Vec::new(),
            tab: Tab::Cases,
            group_by,
            selected_group: None,
            status: None,
        }
    }

    /// Read a file from disk and load it.
    pub fn open_path(&mut self, path: &Path, layout: SheetLayout) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let result = FileKind::from_path(path).and_then(|kind| {
            let bytes = std::fs::read(path)?;
            Ok((kind, bytes))
        });
        match result {
            Ok((kind, bytes)) => self.load_bytes(&name, &bytes, kind, layout),
            Err(e) => self.report_ingest_error(&e),
        }
    }

    /// Ingest (or fetch from the memo) and make it the current table.
    pub fn load_bytes(&mut self, name: &str, bytes: &[u8], kind: FileKind, layout: SheetLayout) {
        match self.cache.get_or_ingest(bytes, kind, layout, &self.config) {
            Ok(table) => {
                log::info!(
                    "Loaded '{name}': {} cases, columns {:?}",
                    table.len(),
                    table.columns
                );
                if table.is_empty() {
                    log::warn!("'{name}' has no cases below the header");
                }
                self.set_table(table, name);
            }
            Err(e) => self.report_ingest_error(&e),
        }
    }

    fn report_ingest_error(&mut self, e: &IngestError) {
        log::error!("Failed to load file: {e}");
        self.status = Some(Status::Error {
            message: format!("⚠️ {e}"),
            hint: Some(e.hint().to_string()),
        });
    }

    /// Install a freshly ingested table and reset the controls.
    pub fn set_table(&mut self, table: Arc<CaseTable>, name: &str) {
        self.filters = init_filter_state(&table, &self.config);
        self.category_options = self
            .config
            .category_filters
            .iter()
            .filter(|c| table.has_column(&c.column))
            .map(|c| {
                let values = table.distinct_values(&c.column).into_iter().collect();
                (c.column.clone(), values)
            })
            .collect();
        self.year_options = year_options(&table, &self.config);
        self.days_bounds = summary::numeric_bounds(&table, &self.config.columns.days_pending);
        self.search.clear();
        self.selected_group = None;
        self.source_name = Some(name.to_string());
        self.status = Some(Status::Info("Planilha carregada!".into()));
        self.table = Some(table);
        self.refilter();
    }

    /// "Substituir Planilha": drop the table and the ingestion memo.
    pub fn replace_spreadsheet(&mut self) {
        if !self.cache.is_empty() {
            log::debug!("Dropping {} cached file(s)", self.cache.len());
        }
        self.cache.clear();
        self.table = None;
        self.source_name = None;
        self.filters = FilterState::default();
        self.category_options.clear();
        self.year_options.clear();
        self.days_bounds = None;
        self.filtered.clear();
        self.visible.clear();
        self.search.clear();
        self.selected_group = None;
        self.status = None;
    }

    /// Recompute `filtered` (and `visible`) after a filter change.
    pub fn refilter(&mut self) {
        if let Some(table) = &self.table {
            self.filtered = filtered_indices(table, &self.filters, &self.config);
        }
        self.research();
    }

    /// Recompute `visible` after the search text changed.
    pub fn research(&mut self) {
        self.visible = match &self.table {
            Some(table) => summary::search_rows(table, &self.filtered, &self.search),
            None => Vec::new(),
        };
    }

    pub fn metrics(&self) -> Metrics {
        match &self.table {
            Some(table) => summary::metrics(table, &self.filtered, &self.config.columns.days_pending),
            None => Metrics::default(),
        }
    }

    /// Group counts of the filtered rows by the chosen column.
    pub fn groups(&self) -> Vec<GroupCount> {
        match &self.table {
            Some(table) => summary::group_counts(table, &self.filtered, &self.group_by),
            None => Vec::new(),
        }
    }

    pub fn set_group_by(&mut self, column: &str) {
        if self.group_by != column {
            self.group_by = column.to_string();
            self.selected_group = None;
        }
    }

    /// Rows of the drill-down group.
    pub fn selected_group_rows(&self) -> Vec<usize> {
        match (&self.table, &self.selected_group) {
            (Some(table), Some(key)) => {
                summary::group_rows(table, &self.filtered, &self.group_by, key)
            }
            _ => Vec::new(),
        }
    }

    /// Write the currently listed rows to an xlsx file.
    pub fn export_visible(&mut self, path: &Path) {
        let Some(table) = &self.table else {
            return;
        };
        match export::write_xlsx(table, &self.visible, path) {
            Ok(()) => {
                self.status = Some(Status::Info(format!(
                    "{} processos exportados para {}",
                    self.visible.len(),
                    path.display()
                )));
            }
            Err(e) => {
                log::error!("Export failed: {e:#}");
                self.status = Some(Status::Error {
                    message: format!("Erro ao exportar: {e:#}"),
                    hint: None,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\
Relatório de conclusos
PROCESSO;CLASSE;ETIQUETAS PJE;TAREFAS PJE;DIAS CONCLUSO;INÍCIO;SISTEMA
1;65 - AÇÃO CIVIL PÚBLICA;Prioridade;Minutar;10;01/02/2020;PJe
2;66 - AÇÃO POPULAR;;Assinar decisão;90;03/04/2021;PJe
3;65 - AÇÃO CIVIL PÚBLICA;URV;Minutar;85;xx;PJe
4;66 - AÇÃO POPULAR;;Minutar;81;05/06/2021;PJe
Total;4;;;;;
";

    fn loaded() -> AppState {
        let mut state = AppState::new(DashboardConfig::default());
        state.load_bytes(
            "conclusos.csv",
            REPORT.as_bytes(),
            FileKind::Csv,
            SheetLayout::conclusos(),
        );
        state
    }

    #[test]
    fn loading_applies_default_cleaning() {
        let state = loaded();
        let table = state.table.as_ref().unwrap();
        assert_eq!(table.len(), 4);
        assert!(!table.has_column("SISTEMA"));
        assert!(table.has_column("ANO"));
        // "Remover Minutados" is on by default.
        assert_eq!(state.filtered, vec![0, 2, 3]);
        assert_eq!(state.visible, state.filtered);
        assert!(matches!(state.status, Some(Status::Info(_))));
        assert_eq!(state.days_bounds, Some((10.0, 90.0)));
        assert_eq!(state.year_options, vec!["N/A", "2021", "2020"]);
        assert_eq!(state.category_options["CLASSE"].len(), 2);
        assert!(!state.category_options.contains_key("PRIORIDADE(S)"));
    }

    #[test]
    fn search_narrows_only_the_list() {
        let mut state = loaded();
        state.search = "urv".into();
        state.research();
        assert_eq!(state.visible, vec![2]);
        assert_eq!(state.filtered, vec![0, 2, 3]);
        assert_eq!(state.metrics().filtered, 3);
    }

    #[test]
    fn groups_and_drill_down_follow_filters() {
        let mut state = loaded();
        state.filters.urgent_only = true;
        state.refilter();
        assert_eq!(state.filtered, vec![2, 3]);

        let groups = state.groups();
        assert_eq!(groups.iter().map(|g| g.count).sum::<usize>(), 2);

        state.selected_group = Some(groups[0].key.clone());
        assert_eq!(state.selected_group_rows().len(), 1);

        state.set_group_by("TIPO CONCLUSÃO");
        assert!(state.selected_group.is_none());
        assert!(state.groups().is_empty());
    }

    #[test]
    fn bad_file_reports_error_with_hint() {
        let mut state = AppState::new(DashboardConfig::default());
        state.load_bytes(
            "quebrada.xlsx",
            b"not a zip",
            FileKind::Workbook,
            SheetLayout::conclusos(),
        );
        assert!(state.table.is_none());
        match &state.status {
            Some(Status::Error { hint: Some(h), .. }) => assert!(h.contains("Excel")),
            other => panic!("expected an error status, got {other:?}"),
        }
    }

    #[test]
    fn replace_clears_table_and_cache() {
        let mut state = loaded();
        assert_eq!(state.cache.len(), 1);
        state.replace_spreadsheet();
        assert!(state.table.is_none());
        assert!(state.cache.is_empty());
        assert!(state.visible.is_empty());
    }

    #[test]
    fn export_writes_visible_rows() {
        let mut state = loaded();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saida.xlsx");
        state.export_visible(&path);
        assert!(path.exists());

        let columns = state.table.as_ref().unwrap().columns.clone();
        let exported = state.visible.len();

        state.open_path(&path, SheetLayout::plain());
        let back = state.table.as_ref().unwrap();
        assert_eq!(back.len(), exported);
        assert_eq!(back.columns, columns);
        assert_eq!(state.source_name.as_deref(), Some("saida.xlsx"));
    }
}
