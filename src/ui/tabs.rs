use eframe::egui::{self, RichText, Ui};

use crate::color::ColorMap;
use crate::data::model::CellValue;
use crate::data::summary;
use crate::state::{AppState, Tab};
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// Central panel: metrics + tabs
// ---------------------------------------------------------------------------

/// Render the central panel.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    if state.table.is_none() {
        welcome(ui);
        return;
    }

    ui.heading(RichText::new("📊 Painel de Controle de Gabinete").strong());
    metrics_row(ui, state);
    ui.separator();

    ui.horizontal(|ui: &mut Ui| {
        ui.selectable_value(&mut state.tab, Tab::Cases, "📋 Processos");
        ui.selectable_value(&mut state.tab, Tab::Groups, "👥 Grupos de Trabalho");
        ui.selectable_value(&mut state.tab, Tab::Statistics, "📈 Estatísticas");
    });
    ui.separator();

    match state.tab {
        Tab::Cases => cases_tab(ui, state),
        Tab::Groups => groups_tab(ui, state),
        Tab::Statistics => statistics_tab(ui, state),
    }
}

fn welcome(ui: &mut Ui) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(80.0);
        ui.label(RichText::new("⚖️").size(64.0));
        ui.heading(RichText::new("GPS Jus").size(40.0).strong());
        ui.label(RichText::new("Sistema Inteligente de Gestão de Gabinete").size(18.0));
        ui.add_space(30.0);
        ui.label("Carregue a planilha baixada do GPSJus na barra lateral para iniciar.");
    });
}

fn metrics_row(ui: &mut Ui, state: &AppState) {
    let m = state.metrics();
    let days = |v: Option<i64>| v.map(|d| format!("{d} d")).unwrap_or_else(|| "-".into());
    let cards = [
        ("Total", m.total.to_string()),
        ("Filtrados", m.filtered.to_string()),
        ("Média Dias", days(m.mean_days)),
        ("Máximo Dias", days(m.max_days)),
    ];
    ui.columns(cards.len(), |columns| {
        for (ui, (label, value)) in columns.iter_mut().zip(cards) {
            egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(label).weak());
                ui.label(RichText::new(value).size(24.0).strong());
            });
        }
    });
}

// ---------------------------------------------------------------------------
// 📋 Processos
// ---------------------------------------------------------------------------

fn cases_tab(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Lista de Processos");
    ui.horizontal(|ui: &mut Ui| {
        let search = ui.add(
            egui::TextEdit::singleline(&mut state.search)
                .hint_text("🔍 Pesquisa rápida (Número, Classe, Assunto...)")
                .desired_width(420.0),
        );
        if search.changed() {
            state.research();
        }
        ui.label(format!("{} processos", state.visible.len()));
        if ui.button("📥 Exportar Excel").clicked() {
            panels::save_file_dialog(state);
        }
    });
    ui.add_space(4.0);

    if let Some(t) = state.table.clone() {
        let height = ui.available_height();
        table::case_table(ui, "cases", &t, &state.visible, height);
    }
}

// ---------------------------------------------------------------------------
// 👥 Grupos de Trabalho
// ---------------------------------------------------------------------------

fn groups_tab(ui: &mut Ui, state: &mut AppState) {
    let Some(t) = state.table.clone() else {
        return;
    };
    ui.strong("Sugestão de Grupos de Trabalho");
    ui.label("Processos agrupados por critérios similares para otimizar a produtividade.");

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Agrupar por:");
        for option in state.config.group_by_options.clone() {
            if ui
                .selectable_label(state.group_by == option, &option)
                .clicked()
            {
                state.set_group_by(&option);
            }
        }
    });

    if !t.has_column(&state.group_by) {
        ui.label(format!("A coluna '{}' não existe nesta planilha.", state.group_by));
        return;
    }

    let groups = state.groups();
    let colors = ColorMap::new(groups.iter().map(|g| &g.key));

    ui.columns(2, |columns| {
        columns[0].label("Resumo do Agrupamento");
        egui::ScrollArea::vertical()
            .id_salt("group_summary")
            .max_height(260.0)
            .show(&mut columns[0], |ui: &mut Ui| {
                egui::Grid::new("group_summary_grid")
                    .striped(true)
                    .num_columns(2)
                    .show(ui, |ui: &mut Ui| {
                        ui.strong(&state.group_by);
                        ui.strong("Qtd");
                        ui.end_row();
                        for g in &groups {
                            ui.label(RichText::new(g.key.to_string()).color(colors.color_for(&g.key)));
                            ui.label(g.count.to_string());
                            ui.end_row();
                        }
                    });
            });
        plot::group_bar_chart(&mut columns[1], "group_chart", &groups, &colors, 280.0);
    });

    ui.separator();
    let selected_text = group_caption(state.selected_group.as_ref());
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Ver detalhes de um grupo:");
        egui::ComboBox::from_id_salt("group_detail")
            .selected_text(selected_text)
            .width(420.0)
            .show_ui(ui, |ui: &mut Ui| {
                for g in &groups {
                    let label = format!("{}  ({})", g.key, g.count);
                    let is_selected = state.selected_group.as_ref() == Some(&g.key);
                    if ui.selectable_label(is_selected, label).clicked() {
                        state.selected_group = Some(g.key.clone());
                    }
                }
            });
    });

    if state.selected_group.is_some() {
        let rows = state.selected_group_rows();
        let height = ui.available_height();
        table::case_table(ui, "group_rows", &t, &rows, height);
    }
}

// ---------------------------------------------------------------------------
// 📈 Estatísticas
// ---------------------------------------------------------------------------

fn statistics_tab(ui: &mut Ui, state: &AppState) {
    let Some(t) = &state.table else {
        return;
    };
    ui.strong("Visão Geral do Gabinete");

    let days_col = &state.config.columns.days_pending;
    if t.has_column(days_col) {
        ui.label(RichText::new("Distribuição de Dias Concluso").strong());
        let distribution = summary::value_distribution(t, &state.filtered, days_col);
        plot::days_distribution_chart(ui, &distribution, 240.0);
    }

    let class_col = &state.config.columns.class;
    if t.has_column(class_col) {
        ui.add_space(8.0);
        ui.label(RichText::new("Processos por Classe").strong());
        let groups = summary::group_counts(t, &state.filtered, class_col);
        let colors = ColorMap::new(groups.iter().map(|g| &g.key));
        plot::group_bar_chart(ui, "class_chart", &groups, &colors, 240.0);
    }
}

/// Caption of the drill-down select box.
fn group_caption(selected: Option<&CellValue>) -> String {
    match selected {
        None => "Nenhum".to_string(),
        Some(key) if key.is_null() => "(vazio)".to_string(),
        Some(key) => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_caption_names_unset_and_blank_groups() {
        assert_eq!(group_caption(None), "Nenhum");
        assert_eq!(group_caption(Some(&CellValue::Null)), "(vazio)");
        assert_eq!(
            group_caption(Some(&CellValue::Text("66 - AÇÃO POPULAR".into()))),
            "66 - AÇÃO POPULAR"
        );
        assert!(!group_caption(None).contains('\u{2014}'));
    }
}
