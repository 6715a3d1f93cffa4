use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDateTime;

// ---------------------------------------------------------------------------
// CellValue – a single spreadsheet cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring what a spreadsheet column can hold.
/// Used as a `BTreeMap` / `BTreeSet` key downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDateTime),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Date(d) => d.hash(state),
            CellValue::Null => {}
        }
    }
}

/// Missing cells render as the empty string, so free-text search never
/// matches them.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => {
                if d.time() == chrono::NaiveTime::MIN {
                    write!(f, "{}", d.format("%d/%m/%Y"))
                } else {
                    write!(f, "{}", d.format("%d/%m/%Y %H:%M:%S"))
                }
            }
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Build a float cell, folding whole values into `Integer` so that
    /// "85" and "85.0" from different writers compare equal.
    pub fn from_f64(v: f64) -> Self {
        if v.is_nan() {
            CellValue::Null
        } else if v.fract() == 0.0 && v.abs() < 9.0e15 {
            CellValue::Integer(v as i64)
        } else {
            CellValue::Float(v)
        }
    }

    /// Build a text cell; blank text is a missing value.
    pub fn from_text(s: &str) -> Self {
        if s.trim().is_empty() {
            CellValue::Null
        } else {
            CellValue::Text(s.to_string())
        }
    }

    /// Try to interpret the value as an `f64` for numeric predicates.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Text(s) => s.trim().replace(',', ".").parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// CaseRecord – one row of the spreadsheet
// ---------------------------------------------------------------------------

/// A single case (one row of the source spreadsheet). `values[i]` belongs to
/// `CaseTable::columns[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    pub values: Vec<CellValue>,
}

impl CaseRecord {
    pub fn new(values: Vec<CellValue>) -> Self {
        CaseRecord { values }
    }

    /// Value at a column index; out-of-range reads as missing.
    pub fn get(&self, col: usize) -> &CellValue {
        static NULL: CellValue = CellValue::Null;
        self.values.get(col).unwrap_or(&NULL)
    }
}

// ---------------------------------------------------------------------------
// CaseTable – the complete ingested sheet
// ---------------------------------------------------------------------------

/// The ingested table. Never mutated after ingestion; filters work on row
/// index lists and [`CaseTable::subset`] materializes a derived table.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseTable {
    /// Ordered column names.
    pub columns: Vec<String>,
    /// All cases (rows), in sheet order.
    pub records: Vec<CaseRecord>,
    /// The trailing row discarded as footer noise, if any.
    pub dropped_footer: Option<CaseRecord>,
}

impl CaseTable {
    pub fn new(columns: Vec<String>, records: Vec<CaseRecord>) -> Self {
        CaseTable {
            columns,
            records,
            dropped_footer: None,
        }
    }

    /// Number of cases.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Indices of every row, in order.
    pub fn all_rows(&self) -> Vec<usize> {
        (0..self.records.len()).collect()
    }

    /// Iterate the values of one column over the given rows.
    pub fn column_values<'a>(
        &'a self,
        col: usize,
        rows: &'a [usize],
    ) -> impl Iterator<Item = &'a CellValue> + 'a {
        rows.iter().map(move |&r| self.records[r].get(col))
    }

    /// Sorted distinct non-missing values of a column, for selection widgets.
    pub fn distinct_values(&self, name: &str) -> BTreeSet<CellValue> {
        let Some(col) = self.column_index(name) else {
            return BTreeSet::new();
        };
        self.records
            .iter()
            .map(|r| r.get(col))
            .filter(|v| !v.is_null())
            .cloned()
            .collect()
    }

    /// Materialize the given rows as a new table with the same columns.
    pub fn subset(&self, rows: &[usize]) -> CaseTable {
        CaseTable {
            columns: self.columns.clone(),
            records: rows.iter().map(|&r| self.records[r].clone()).collect(),
            dropped_footer: None,
        }
    }

    /// Row as a `column → value` map.
    #[cfg(test)]
    pub fn row_map(&self, row: usize) -> std::collections::BTreeMap<&str, &CellValue> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), self.records[row].get(i)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CaseTable {
        CaseTable::new(
            vec!["CLASSE".into(), "DIAS CONCLUSO".into()],
            vec![
                CaseRecord::new(vec![CellValue::Text("A".into()), CellValue::Integer(3)]),
                CaseRecord::new(vec![CellValue::Null, CellValue::Integer(7)]),
                CaseRecord::new(vec![CellValue::Text("A".into()), CellValue::Float(1.5)]),
            ],
        )
    }

    #[test]
    fn whole_floats_fold_into_integers() {
        assert_eq!(CellValue::from_f64(85.0), CellValue::Integer(85));
        assert_eq!(CellValue::from_f64(2.5), CellValue::Float(2.5));
        assert_eq!(CellValue::from_f64(f64::NAN), CellValue::Null);
    }

    #[test]
    fn missing_renders_empty() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::from_text("   "), CellValue::Null);
    }

    #[test]
    fn distinct_values_skip_missing() {
        let t = table();
        let vals = t.distinct_values("CLASSE");
        assert_eq!(vals.len(), 1);
        assert!(t.distinct_values("NOPE").is_empty());
    }

    #[test]
    fn subset_keeps_columns_and_order() {
        let t = table();
        let s = t.subset(&[2, 0]);
        assert_eq!(s.columns, t.columns);
        assert_eq!(s.records[0], t.records[2]);
        assert_eq!(s.records[1], t.records[0]);
    }

    #[test]
    fn out_of_range_cell_reads_as_missing() {
        let r = CaseRecord::new(vec![CellValue::Integer(1)]);
        assert!(r.get(5).is_null());
    }
}
