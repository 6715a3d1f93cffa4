use std::collections::{BTreeMap, HashMap};

use super::model::{CaseTable, CellValue};

// ---------------------------------------------------------------------------
// Quick search
// ---------------------------------------------------------------------------

/// Keep rows where any cell's display text contains `term`, ignoring case.
/// An empty term keeps everything.
pub fn search_rows(table: &CaseTable, rows: &[usize], term: &str) -> Vec<usize> {
    if term.is_empty() {
        return rows.to_vec();
    }
    let needle = term.to_lowercase();
    rows.iter()
        .copied()
        .filter(|&r| {
            table.records[r]
                .values
                .iter()
                .any(|v| v.to_string().to_lowercase().contains(&needle))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Group-by counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GroupCount {
    pub key: CellValue,
    pub count: usize,
}

/// Count rows per value of `column`, largest group first, ties by key.
/// Missing values form their own group so the counts always add up to
/// `rows.len()`. Empty when the column is absent.
pub fn group_counts(table: &CaseTable, rows: &[usize], column: &str) -> Vec<GroupCount> {
    let Some(col) = table.column_index(column) else {
        return Vec::new();
    };
    let mut counts: HashMap<&CellValue, usize> = HashMap::new();
    for value in table.column_values(col, rows) {
        *counts.entry(value).or_default() += 1;
    }
    let mut groups: Vec<GroupCount> = counts
        .into_iter()
        .map(|(key, count)| GroupCount {
            key: key.clone(),
            count,
        })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    groups
}

/// Rows of one group, for the drill-down table.
pub fn group_rows(table: &CaseTable, rows: &[usize], column: &str, key: &CellValue) -> Vec<usize> {
    let Some(col) = table.column_index(column) else {
        return Vec::new();
    };
    rows.iter()
        .copied()
        .filter(|&r| table.records[r].get(col) == key)
        .collect()
}

// ---------------------------------------------------------------------------
// Numeric summaries
// ---------------------------------------------------------------------------

/// Number of rows per distinct numeric value, ascending by value.
/// Non-numeric and missing cells are skipped.
pub fn value_distribution(table: &CaseTable, rows: &[usize], column: &str) -> Vec<(f64, usize)> {
    let Some(col) = table.column_index(column) else {
        return Vec::new();
    };
    let mut counts: BTreeMap<CellValue, usize> = BTreeMap::new();
    for v in table.column_values(col, rows).filter_map(CellValue::as_f64) {
        *counts.entry(CellValue::Float(v)).or_default() += 1;
    }
    counts
        .into_iter()
        .filter_map(|(v, n)| v.as_f64().map(|v| (v, n)))
        .collect()
}

/// Smallest and largest numeric value of a column, for range controls.
pub fn numeric_bounds(table: &CaseTable, column: &str) -> Option<(f64, f64)> {
    let col = table.column_index(column)?;
    table
        .records
        .iter()
        .filter_map(|r| r.get(col).as_f64())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })
}

/// Header metrics of the dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    pub total: usize,
    pub filtered: usize,
    /// Mean days pending, truncated to whole days.
    pub mean_days: Option<i64>,
    pub max_days: Option<i64>,
}

pub fn metrics(table: &CaseTable, rows: &[usize], days_column: &str) -> Metrics {
    let days: Vec<f64> = table
        .column_index(days_column)
        .map(|col| {
            table
                .column_values(col, rows)
                .filter_map(CellValue::as_f64)
                .collect()
        })
        .unwrap_or_default();

    let mean_days = if days.is_empty() {
        None
    } else {
        Some((days.iter().sum::<f64>() / days.len() as f64) as i64)
    };
    let max_days = days
        .iter()
        .copied()
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
        .map(|m| m as i64);

    Metrics {
        total: table.len(),
        filtered: rows.len(),
        mean_days,
        max_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CaseRecord;

    fn table() -> CaseTable {
        let row = |class: Option<&str>, days: CellValue| {
            CaseRecord::new(vec![
                class.map(|c| CellValue::Text(c.into())).unwrap_or(CellValue::Null),
                days,
            ])
        };
        CaseTable::new(
            vec!["CLASSE".into(), "DIAS CONCLUSO".into()],
            vec![
                row(Some("Ação Popular"), CellValue::Integer(10)),
                row(Some("Mandado"), CellValue::Integer(90)),
                row(None, CellValue::Integer(85)),
                row(Some("Mandado"), CellValue::Null),
                row(Some("Ação Popular"), CellValue::Integer(10)),
                row(Some("Mandado"), CellValue::Integer(3)),
            ],
        )
    }

    #[test]
    fn search_is_case_insensitive_over_all_columns() {
        let t = table();
        assert_eq!(search_rows(&t, &t.all_rows(), "AÇÃO"), vec![0, 4]);
        assert_eq!(search_rows(&t, &t.all_rows(), "85"), vec![2]);
        assert_eq!(search_rows(&t, &[1, 2], ""), vec![1, 2]);
    }

    #[test]
    fn group_counts_sum_to_rows_and_sort_descending() {
        let t = table();
        let rows = t.all_rows();
        let groups = group_counts(&t, &rows, "CLASSE");
        assert_eq!(groups.iter().map(|g| g.count).sum::<usize>(), rows.len());
        assert_eq!(groups[0].key, CellValue::Text("Mandado".into()));
        assert_eq!(groups[0].count, 3);
        assert_eq!(groups[2].key, CellValue::Null);
        assert!(group_counts(&t, &rows, "NOPE").is_empty());
    }

    #[test]
    fn drill_down_returns_group_members() {
        let t = table();
        let rows = t.all_rows();
        let mandado = CellValue::Text("Mandado".into());
        assert_eq!(group_rows(&t, &rows, "CLASSE", &mandado), vec![1, 3, 5]);
        assert_eq!(group_rows(&t, &[0, 1], "CLASSE", &mandado), vec![1]);
    }

    #[test]
    fn distribution_is_sorted_by_value() {
        let t = table();
        let dist = value_distribution(&t, &t.all_rows(), "DIAS CONCLUSO");
        assert_eq!(dist, vec![(3.0, 1), (10.0, 2), (85.0, 1), (90.0, 1)]);
    }

    #[test]
    fn bounds_skip_missing_values() {
        let t = table();
        assert_eq!(numeric_bounds(&t, "DIAS CONCLUSO"), Some((3.0, 90.0)));
        assert_eq!(numeric_bounds(&t, "CLASSE"), None);
        assert_eq!(numeric_bounds(&t, "NOPE"), None);
    }

    #[test]
    fn metrics_ignore_missing_days() {
        let t = table();
        let m = metrics(&t, &t.all_rows(), "DIAS CONCLUSO");
        assert_eq!(m.total, 6);
        assert_eq!(m.filtered, 6);
        assert_eq!(m.mean_days, Some(39));
        assert_eq!(m.max_days, Some(90));

        let empty = metrics(&t, &[], "DIAS CONCLUSO");
        assert_eq!(empty.mean_days, None);
        assert_eq!(empty.max_days, None);
    }
}
