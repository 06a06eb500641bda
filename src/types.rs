use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

//==============================================================================
// Raw Sheet Model
//==============================================================================

/// A single spreadsheet cell, reduced to the types the parsers care about
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    /// Integers and floats both land here
    Number(f64),
    Bool(bool),
    /// Excel date serials, resolved against the workbook's date system
    Date(NaiveDate),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// True for missing cells and zero-length text
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// The string payload, only for text cells
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Lenient numeric read used for report figures.
    ///
    /// Accepts numbers and numeric text with thousands separators, a leading
    /// currency symbol, or accounting-style parentheses for negatives.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => parse_report_number(s),
            _ => None,
        }
    }

    /// Strict numeric coercion: numbers, or text that parses as a float as-is
    pub fn as_strict_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Report figure with blanks and labels read as zero
    pub fn amount(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => f.write_str(&format_cell_number(*n)),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Date(d) => write!(f, "{}", d.format("%b-%y")),
        }
    }
}

/// Whole numbers print without a decimal point so header labels like 2025 stay readable
fn format_cell_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Parse figures like "1,200.50", "$300", "(45.00)" or " 12 "
fn parse_report_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (true, inner.trim()),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .trim_start_matches(['$', '€', '£', '¥', '₹'])
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    let value = cleaned.parse::<f64>().ok().filter(|n| n.is_finite())?;
    Some(if negative { -value } else { value })
}

/// A rectangular grid loaded from one sheet.
///
/// The first row of the sheet's used range becomes `columns`; every body row is
/// padded to `columns.len()`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Build a table from a full sheet grid (header row included).
    ///
    /// Rows that are empty in every column and columns that are empty in every
    /// body row are dropped. Both are decided against the untouched grid.
    pub fn from_grid(name: impl Into<String>, grid: Vec<Vec<Cell>>) -> Self {
        let mut grid = grid.into_iter();
        let Some(header) = grid.next() else {
            return Self {
                name: name.into(),
                ..Self::default()
            };
        };
        let body: Vec<Vec<Cell>> = grid.collect();

        let width = body
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0);

        let keep_cols: Vec<usize> = (0..width)
            .filter(|&col| {
                body.iter()
                    .any(|row| row.get(col).is_some_and(|cell| !cell.is_empty()))
            })
            .collect();

        let labels: Vec<String> = keep_cols
            .iter()
            .map(|&col| match header.get(col) {
                Some(cell) if !cell.is_empty() => cell.to_string(),
                _ => format!("Unnamed: {}", col),
            })
            .collect();

        let rows = body
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .map(|row| {
                keep_cols
                    .iter()
                    .map(|&col| row.get(col).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Self::new(name, dedupe_labels(labels), rows)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Cell at (row, col); out-of-range positions read as empty
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Display text of a row's first cell ("" when missing)
    pub fn first_cell_text(&self, row: usize) -> String {
        self.cell(row, 0).to_string()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }
}

/// Repeated labels get a numeric suffix: "Total", "Total.1", "Total.2"
fn dedupe_labels(labels: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    labels
        .into_iter()
        .map(|label| {
            if seen.insert(label.clone()) {
                return label;
            }
            let mut n = 1;
            loop {
                let candidate = format!("{}.{}", label, n);
                if seen.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

//==============================================================================
// Tidy Table Model
//==============================================================================

/// Column value types (homogeneous arrays)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Number(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnValue {
    pub fn len(&self) -> usize {
        match self {
            ColumnValue::Number(v) => v.len(),
            ColumnValue::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnValue::Number(_) => "Number",
            ColumnValue::Text(_) => "Text",
        }
    }
}

/// A named column; `currency` records the unit once a conversion has run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: ColumnValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: ColumnValue) -> Self {
        Self {
            name: name.into(),
            values,
            currency: None,
        }
    }

    pub fn numbers(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, ColumnValue::Number(values))
    }

    pub fn text(name: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(name, ColumnValue::Text(values))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One observation per row, one variable per column. Column order is preserved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TidyTable {
    pub name: String,
    pub columns: Vec<Column>,
}

impl TidyTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Adds a column, replacing any existing column with the same name
    pub fn add_column(&mut self, column: Column) {
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Names of the numeric columns, the ones a currency conversion can target
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| matches!(c.values, ColumnValue::Number(_)))
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Number of rows (length of first column, all should be same)
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Validate all columns have the same length
    pub fn validate_lengths(&self) -> Result<(), String> {
        let row_count = self.row_count();
        for column in &self.columns {
            if column.len() != row_count {
                return Err(format!(
                    "Column '{}' has {} rows, expected {} rows",
                    column.name,
                    column.len(),
                    row_count
                ));
            }
        }
        Ok(())
    }
}

impl From<&RawTable> for TidyTable {
    /// Columns whose filled cells are all numbers become Number columns (blanks
    /// as NaN); every other column becomes Text.
    fn from(raw: &RawTable) -> Self {
        let mut table = TidyTable::new(raw.name.clone());
        for (col, label) in raw.columns.iter().enumerate() {
            let cells: Vec<&Cell> = raw.rows.iter().map(|row| raw_cell(row, col)).collect();
            let numeric = cells.iter().any(|c| matches!(c, Cell::Number(_)))
                && cells
                    .iter()
                    .all(|c| c.is_empty() || matches!(c, Cell::Number(_)));

            let column = if numeric {
                Column::numbers(
                    label.clone(),
                    cells
                        .iter()
                        .map(|c| match c {
                            Cell::Number(n) => *n,
                            _ => f64::NAN,
                        })
                        .collect(),
                )
            } else {
                Column::text(label.clone(), cells.iter().map(|c| c.to_string()).collect())
            };
            table.add_column(column);
        }
        table
    }
}

fn raw_cell(row: &[Cell], col: usize) -> &Cell {
    row.get(col).unwrap_or(&EMPTY_CELL)
}
