use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::export::EXPORT_FILE_NAME;
use crate::data::loader::SheetLayout;
use crate::data::model::CellValue;
use crate::state::{AppState, Status};

// ---------------------------------------------------------------------------
// Left side panel – upload and filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(RichText::new("⚖️ GPS Jus").size(26.0).strong());
        ui.label(RichText::new("Visualização de Vara de Fazenda Pública").weak());
    });
    ui.separator();

    if ui.button("📥 Carregar Planilha Conclusos").clicked() {
        open_file_dialog(state, SheetLayout::conclusos());
    }
    if state.table.is_some() && ui.button("🔄 Substituir Planilha").clicked() {
        state.replace_spreadsheet();
        open_file_dialog(state, SheetLayout::conclusos());
    }
    ui.separator();

    if state.table.is_none() {
        ui.label("Nenhuma planilha carregada.");
        return;
    }

    ui.heading("🔍 Filtros");

    let mut changed = false;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            changed |= cleaning_section(ui, state);
            changed |= thematic_section(ui, state);
            ui.separator();

            let urgency = format!(
                "🔥 Urgência (> {} dias)",
                state.config.urgency_threshold_days
            );
            changed |= ui
                .checkbox(&mut state.filters.urgent_only, urgency)
                .on_hover_text("Mostrar apenas processos acima do limite de dias conclusos")
                .changed();
            ui.separator();

            changed |= label_section(ui, state);
            ui.separator();
            changed |= year_section(ui, state);
            ui.separator();
            changed |= category_section(ui, state);
            changed |= days_range_section(ui, state);
        });

    if changed {
        state.refilter();
    }
}

fn cleaning_section(ui: &mut Ui, state: &mut AppState) -> bool {
    let mut changed = false;
    egui::CollapsingHeader::new(RichText::new("🧹 Limpeza e Triagem").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            for rule in &state.config.cleaning {
                let mut on = state.filters.cleaning.contains(&rule.key);
                let mut response = ui.checkbox(&mut on, &rule.label);
                if let Some(help) = &rule.help {
                    response = response.on_hover_text(help);
                }
                if response.changed() {
                    toggle(&mut state.filters.cleaning, &rule.key, on);
                    changed = true;
                }
            }
        });
    changed
}

fn thematic_section(ui: &mut Ui, state: &mut AppState) -> bool {
    let mut changed = false;
    egui::CollapsingHeader::new(RichText::new("📂 Grupos Temáticos").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            for group in &state.config.themes {
                let mut on = state.filters.themes.contains(&group.key);
                if ui.checkbox(&mut on, &group.label).changed() {
                    toggle(&mut state.filters.themes, &group.key, on);
                    changed = true;
                }
            }
        });
    changed
}

fn label_section(ui: &mut Ui, state: &mut AppState) -> bool {
    ui.strong("🏷️ Etiquetas PJe");
    ui.label("Contém etiqueta:");
    let a = ui
        .add(egui::TextEdit::singleline(&mut state.filters.label_contains).hint_text("Ex: Prioridade"))
        .changed();
    ui.label("Não contém etiqueta:");
    let b = ui
        .add(egui::TextEdit::singleline(&mut state.filters.label_excludes).hint_text("Ex: Aguardando"))
        .changed();
    a || b
}

fn year_section(ui: &mut Ui, state: &mut AppState) -> bool {
    if state.year_options.is_empty() {
        return false;
    }
    let mut changed = false;
    let header = format!(
        "Filtrar por Ano (Início)  ({}/{})",
        state.filters.years.len(),
        state.year_options.len()
    );
    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt("years")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("Todos").clicked() {
                    state.filters.years = state.year_options.iter().cloned().collect();
                    changed = true;
                }
                if ui.small_button("Nenhum").clicked() {
                    state.filters.years.clear();
                    changed = true;
                }
            });
            for year in &state.year_options {
                let mut on = state.filters.years.contains(year);
                if ui.checkbox(&mut on, year).changed() {
                    toggle(&mut state.filters.years, year, on);
                    changed = true;
                }
            }
        });
    changed
}

fn category_section(ui: &mut Ui, state: &mut AppState) -> bool {
    let mut changed = false;
    for category in &state.config.category_filters {
        let Some(options) = state.category_options.get(&category.column) else {
            continue;
        };
        let current = state.filters.categories.get(&category.column).cloned();
        let selected_text = current
            .as_ref()
            .map(CellValue::to_string)
            .unwrap_or_else(|| "Todos".to_string());

        ui.label(format!("Filtrar por {}", category.label));
        egui::ComboBox::from_id_salt(&category.column)
            .selected_text(selected_text)
            .width(ui.available_width())
            .show_ui(ui, |ui: &mut Ui| {
                if ui.selectable_label(current.is_none(), "Todos").clicked() {
                    state.filters.categories.remove(&category.column);
                    changed = true;
                }
                for value in options {
                    let is_selected = current.as_ref() == Some(value);
                    if ui.selectable_label(is_selected, value.to_string()).clicked() {
                        state
                            .filters
                            .categories
                            .insert(category.column.clone(), value.clone());
                        changed = true;
                    }
                }
            });
    }
    changed
}

fn days_range_section(ui: &mut Ui, state: &mut AppState) -> bool {
    let Some((min, max)) = state.days_bounds else {
        return false;
    };
    let mut changed = false;
    ui.separator();

    let mut limited = state.filters.days_range.is_some();
    if ui.checkbox(&mut limited, "Dias Concluso (Intervalo)").changed() {
        state.filters.days_range = limited.then_some((min, max));
        changed = true;
    }
    if let Some((lo, hi)) = &mut state.filters.days_range {
        changed |= ui
            .add(egui::Slider::new(&mut *lo, min..=max).integer().text("mín"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut *hi, min..=max).integer().text("máx"))
            .changed();
        if *lo > *hi {
            std::mem::swap(lo, hi);
        }
    }
    changed
}

fn toggle(set: &mut std::collections::BTreeSet<String>, key: &str, on: bool) {
    if on {
        set.insert(key.to_string());
    } else {
        set.remove(key);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Arquivo", |ui: &mut Ui| {
            if ui.button("Abrir…").clicked() {
                open_file_dialog(state, SheetLayout::conclusos());
                ui.close_menu();
            }
            if ui
                .button("Abrir exportação…")
                .on_hover_text("Planilha gerada por \"Exportar Excel\" (cabeçalho na primeira linha)")
                .clicked()
            {
                open_file_dialog(state, SheetLayout::plain());
                ui.close_menu();
            }
            let can_export = state.table.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Exportar Excel…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(table), Some(name)) = (&state.table, &state.source_name) {
            let response = ui.label(format!(
                "{name}: {} processos, {} filtrados",
                table.len(),
                state.filtered.len()
            ));
            if let Some(footer) = &table.dropped_footer {
                let text: Vec<String> = footer
                    .values
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| v.to_string())
                    .collect();
                response.on_hover_text(format!("Última linha descartada: {}", text.join(" | ")));
            }
            ui.separator();
        }

        match &state.status {
            Some(Status::Info(msg)) => {
                ui.label(RichText::new(msg).color(Color32::DARK_GREEN));
            }
            Some(Status::Error { message, hint }) => {
                let response = ui.label(RichText::new(message).color(Color32::RED));
                if let Some(hint) = hint {
                    response.on_hover_text(hint);
                    ui.label(RichText::new(hint).color(Color32::from_rgb(0xB4, 0x53, 0x09)));
                }
            }
            None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState, layout: SheetLayout) {
    let file = rfd::FileDialog::new()
        .set_title("Carregar planilha de conclusos")
        .add_filter("Planilhas", &["xlsx", "xlsm", "xls", "xlsb", "ods", "csv"])
        .add_filter("Excel", &["xlsx", "xlsm", "xls", "xlsb"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path, layout);
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Exportar processos")
        .set_file_name(EXPORT_FILE_NAME)
        .add_filter("Excel", &["xlsx"])
        .save_file();

    if let Some(path) = file {
        state.export_visible(&path);
    }
}
