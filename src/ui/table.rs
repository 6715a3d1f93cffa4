use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::CaseTable;

// ---------------------------------------------------------------------------
// Case table widget
// ---------------------------------------------------------------------------

const ROW_HEIGHT: f32 = 18.0;

/// Render `rows` of `table` as a striped, resizable grid. `id` keeps
/// several tables on one screen apart.
pub fn case_table(ui: &mut Ui, id: &str, table: &CaseTable, rows: &[usize], max_height: f32) {
    if rows.is_empty() {
        ui.label("Nenhum processo.");
        return;
    }
    let n_cols = table.columns.len();

    ui.push_id(id, |ui: &mut Ui| {
        egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .columns(Column::initial(150.0).at_least(40.0).clip(true), n_cols)
                .min_scrolled_height(0.0)
                .max_scroll_height(max_height)
                .header(22.0, |mut header| {
                    for name in &table.columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                        let record = &table.records[rows[row.index()]];
                        for c in 0..n_cols {
                            row.col(|ui: &mut Ui| {
                                ui.add(egui::Label::new(record.get(c).to_string()).truncate());
                            });
                        }
                    });
                });
        });
    });
}
