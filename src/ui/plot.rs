use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};

use crate::color::ColorMap;
use crate::data::summary::GroupCount;

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

const AREA_COLOR: Color32 = Color32::from_rgb(0x3B, 0x82, 0xF6);

/// One bar per group, in the order given (largest first). Hovering a bar
/// shows its group.
pub fn group_bar_chart(ui: &mut Ui, id: &str, groups: &[GroupCount], colors: &ColorMap, height: f32) {
    let bars: Vec<Bar> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let name = if g.key.is_null() {
                "(vazio)".to_string()
            } else {
                g.key.to_string()
            };
            Bar::new(i as f64, g.count as f64)
                .name(name)
                .fill(colors.color_for(&g.key))
                .width(0.8)
        })
        .collect();

    Plot::new(id)
        .height(height)
        .y_axis_label("Qtd")
        .show_x(false)
        .allow_scroll(false)
        .allow_drag(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

/// Area chart of case counts per number of days pending.
pub fn days_distribution_chart(ui: &mut Ui, distribution: &[(f64, usize)], height: f32) {
    let points: PlotPoints = distribution
        .iter()
        .map(|&(days, count)| [days, count as f64])
        .collect();

    Plot::new("days_distribution")
        .height(height)
        .legend(Legend::default())
        .x_axis_label("Dias concluso")
        .y_axis_label("Processos")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(points)
                    .name("Processos")
                    .color(AREA_COLOR)
                    .fill(0.0)
                    .width(1.5),
            );
        });
}
