use std::collections::{BTreeMap, BTreeSet};

use super::model::{CaseTable, CellValue};
use crate::config::{DashboardConfig, ThemeRule};

// ---------------------------------------------------------------------------
// Row predicates
// ---------------------------------------------------------------------------

/// One row filter over a single column. Text comparisons are
/// case-insensitive; patterns are stored lowercased.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Drop rows whose text contains any pattern. Missing values pass.
    Excludes { column: String, patterns: Vec<String> },
    /// Keep rows whose text contains the pattern. Missing values fail.
    Contains { column: String, pattern: String },
    /// Keep rows whose whole value is one of `values`.
    OneOf { column: String, values: BTreeSet<String> },
    /// Keep rows where the column is filled in.
    NotMissing { column: String },
    /// Keep rows equal to a chosen category value.
    Equals { column: String, value: CellValue },
    /// Keep rows strictly above a threshold.
    GreaterThan { column: String, threshold: f64 },
    /// Keep rows inside the closed range `[min, max]`.
    Between { column: String, min: f64, max: f64 },
}

impl Predicate {
    pub fn excludes<S: AsRef<str>>(column: &str, patterns: &[S]) -> Self {
        Predicate::Excludes {
            column: column.to_string(),
            patterns: patterns.iter().map(|p| p.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn contains(column: &str, pattern: &str) -> Self {
        Predicate::Contains {
            column: column.to_string(),
            pattern: pattern.to_lowercase(),
        }
    }

    pub fn one_of<S: AsRef<str>>(column: &str, values: &[S]) -> Self {
        Predicate::OneOf {
            column: column.to_string(),
            values: values.iter().map(|v| v.as_ref().to_lowercase()).collect(),
        }
    }

    /// Column the predicate reads.
    pub fn column(&self) -> &str {
        match self {
            Predicate::Excludes { column, .. }
            | Predicate::Contains { column, .. }
            | Predicate::OneOf { column, .. }
            | Predicate::NotMissing { column }
            | Predicate::Equals { column, .. }
            | Predicate::GreaterThan { column, .. }
            | Predicate::Between { column, .. } => column,
        }
    }

    /// Whether a single cell satisfies the predicate.
    pub fn matches(&self, value: &CellValue) -> bool {
        match self {
            Predicate::Excludes { patterns, .. } => {
                // Missing text is read as "" and so never contains a pattern.
                let text = value.to_string().to_lowercase();
                !patterns.iter().any(|p| text.contains(p.as_str()))
            }
            Predicate::Contains { pattern, .. } => {
                !value.is_null() && value.to_string().to_lowercase().contains(pattern.as_str())
            }
            Predicate::OneOf { values, .. } => {
                !value.is_null() && values.contains(&value.to_string().to_lowercase())
            }
            Predicate::NotMissing { .. } => !value.is_null(),
            Predicate::Equals { value: wanted, .. } => value == wanted,
            Predicate::GreaterThan { threshold, .. } => {
                value.as_f64().is_some_and(|v| v > *threshold)
            }
            Predicate::Between { min, max, .. } => {
                value.as_f64().is_some_and(|v| v >= *min && v <= *max)
            }
        }
    }

    /// Narrow `rows` to those passing. A no-op when the column is absent.
    pub fn apply(&self, table: &CaseTable, rows: &[usize]) -> Vec<usize> {
        let Some(col) = table.column_index(self.column()) else {
            log::debug!("Skipping filter on absent column '{}'", self.column());
            return rows.to_vec();
        };
        rows.iter()
            .copied()
            .filter(|&r| self.matches(table.records[r].get(col)))
            .collect()
    }
}

/// AND-compose predicates by sequential narrowing. Row order is preserved.
pub fn apply_chain(table: &CaseTable, predicates: &[Predicate]) -> Vec<usize> {
    predicates
        .iter()
        .fold(table.all_rows(), |rows, p| p.apply(table, &rows))
}

// ---------------------------------------------------------------------------
// Filter selection: what the side panel has switched on
// ---------------------------------------------------------------------------

/// State of every filter control. An unset control (empty text, no
/// category, no range, empty year set, unchecked box) adds no predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    /// Keys of enabled cleaning rules.
    pub cleaning: BTreeSet<String>,
    /// Keys of enabled thematic groups.
    pub themes: BTreeSet<String>,
    /// Selected values of the year column.
    pub years: BTreeSet<String>,
    pub urgent_only: bool,
    pub label_contains: String,
    pub label_excludes: String,
    /// Column → chosen value. Absent means "Todos".
    pub categories: BTreeMap<String, CellValue>,
    /// Closed range on the days-pending column.
    pub days_range: Option<(f64, f64)>,
}

/// Initial selection for a freshly loaded table: default cleaning rules
/// on, every year selected, everything else unset.
pub fn init_filter_state(table: &CaseTable, config: &DashboardConfig) -> FilterState {
    FilterState {
        cleaning: config
            .cleaning
            .iter()
            .filter(|r| r.enabled_by_default)
            .map(|r| r.key.clone())
            .collect(),
        years: year_options(table, config).into_iter().collect(),
        ..FilterState::default()
    }
}

/// Distinct years, newest first.
pub fn year_options(table: &CaseTable, config: &DashboardConfig) -> Vec<String> {
    let mut years: Vec<String> = table
        .distinct_values(&config.columns.year)
        .into_iter()
        .map(|v| v.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    years.reverse();
    years
}

impl FilterState {
    /// The predicate chain in evaluation order: cleaning, thematic, then
    /// years, urgency, labels, categories and the days range.
    pub fn predicates(&self, table: &CaseTable, config: &DashboardConfig) -> Vec<Predicate> {
        let cols = &config.columns;
        let mut chain = Vec::new();

        for rule in config.cleaning.iter().filter(|r| self.cleaning.contains(&r.key)) {
            for exclusion in &rule.exclusions {
                chain.push(Predicate::excludes(&exclusion.column, &exclusion.patterns));
            }
        }

        for group in config.themes.iter().filter(|g| self.themes.contains(&g.key)) {
            chain.push(match &group.rule {
                ThemeRule::AllowList(values) => Predicate::one_of(&group.column, values),
                ThemeRule::NotMissing => Predicate::NotMissing {
                    column: group.column.clone(),
                },
            });
        }

        // Every year ticked means no constraint, as does none.
        if !self.years.is_empty() {
            let all = year_options(table, config);
            if !all.iter().all(|y| self.years.contains(y)) {
                let years: Vec<&String> = self.years.iter().collect();
                chain.push(Predicate::one_of(&cols.year, &years));
            }
        }

        if self.urgent_only {
            chain.push(Predicate::GreaterThan {
                column: cols.days_pending.clone(),
                threshold: config.urgency_threshold_days,
            });
        }

        if !self.label_contains.is_empty() {
            chain.push(Predicate::contains(&cols.labels, &self.label_contains));
        }
        if !self.label_excludes.is_empty() {
            chain.push(Predicate::excludes(&cols.labels, &[&self.label_excludes]));
        }

        for category in &config.category_filters {
            if let Some(value) = self.categories.get(&category.column) {
                chain.push(Predicate::Equals {
                    column: category.column.clone(),
                    value: value.clone(),
                });
            }
        }

        if let Some((min, max)) = self.days_range {
            chain.push(Predicate::Between {
                column: cols.days_pending.clone(),
                min,
                max,
            });
        }

        chain
    }
}

/// Return indices of cases that pass all active filters, in table order.
pub fn filtered_indices(
    table: &CaseTable,
    filters: &FilterState,
    config: &DashboardConfig,
) -> Vec<usize> {
    apply_chain(table, &filters.predicates(table, config))
}
