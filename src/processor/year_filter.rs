use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::helpers::simd_helpers::filter_eq_i64;
use crate::processor::ProcessorError;
use crate::processor::sales_table::{SalesRecord, SalesTable};
use crate::processor::schema::NumericField;

/// The sidebar choice: every year, or one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum YearSelection {
    #[default]
    All,
    Year(i64),
}

impl fmt::Display for YearSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearSelection::All => f.write_str("All"),
            YearSelection::Year(y) => write!(f, "{y}"),
        }
    }
}

impl FromStr for YearSelection {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(YearSelection::All);
        }
        s.parse::<i64>()
            .map(YearSelection::Year)
            .map_err(|_| ProcessorError::InvalidQuery(format!("'{s}' is neither a year nor 'all'")))
    }
}

impl Serialize for YearSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            YearSelection::All => serializer.serialize_str("All"),
            YearSelection::Year(y) => serializer.serialize_i64(*y),
        }
    }
}

impl<'de> Deserialize<'de> for YearSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Year(i64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Year(y) => Ok(YearSelection::Year(y)),
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rows {
    All,
    Subset(Vec<usize>),
}

/// Rows of a [`SalesTable`] visible under a year selection.
///
/// Holds row indices rather than copies; with no filter it is the table
/// itself.
#[derive(Debug, Clone)]
pub struct TableView<'a> {
    table: &'a SalesTable,
    rows: Rows,
}

impl<'a> TableView<'a> {
    pub fn all(table: &'a SalesTable) -> Self {
        TableView {
            table,
            rows: Rows::All,
        }
    }

    pub fn table(&self) -> &'a SalesTable {
        self.table
    }

    pub fn len(&self) -> usize {
        match &self.rows {
            Rows::All => self.table.len(),
            Rows::Subset(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the view is the unfiltered table.
    pub fn is_identity(&self) -> bool {
        self.rows == Rows::All
    }

    /// Table row indices in table order.
    pub fn row_indices(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        match &self.rows {
            Rows::All => Box::new(0..self.table.len()),
            Rows::Subset(rows) => Box::new(rows.iter().copied()),
        }
    }

    /// Values of a numeric column for the visible rows. Borrowed when the
    /// view is the whole table.
    pub fn numeric(&self, field: NumericField) -> Cow<'a, [f64]> {
        let values = self.table.numeric(field);
        match &self.rows {
            Rows::All => Cow::Borrowed(values),
            Rows::Subset(rows) => Cow::Owned(rows.iter().map(|&i| values[i]).collect()),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = SalesRecord<'a>> + '_ {
        let table = self.table;
        self.row_indices().filter_map(move |row| table.record(row))
    }
}

/// Applies the year selection. `All` returns the table unchanged; a year
/// with no rows yields an empty view.
pub fn select(table: &SalesTable, selection: YearSelection) -> TableView<'_> {
    let view = match selection {
        YearSelection::All => TableView::all(table),
        YearSelection::Year(year) => TableView {
            table,
            rows: Rows::Subset(filter_eq_i64(table.years(), year)),
        },
    };
    debug!(%selection, rows = view.len(), "year filter applied");
    view
}

/// Choices offered by the year selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearOptions {
    /// Distinct years, most recently first-seen first.
    years: Vec<i64>,
}

impl YearOptions {
    pub fn from_table(table: &SalesTable) -> Self {
        let mut seen = HashSet::new();
        let mut years: Vec<i64> = table
            .years()
            .iter()
            .copied()
            .filter(|y| seen.insert(*y))
            .collect();
        years.reverse();
        YearOptions { years }
    }

    pub fn years(&self) -> &[i64] {
        &self.years
    }

    /// "All" followed by every year.
    pub fn choices(&self) -> Vec<YearSelection> {
        std::iter::once(YearSelection::All)
            .chain(self.years.iter().copied().map(YearSelection::Year))
            .collect()
    }

    /// The last choice in the list: the first year encountered in the data,
    /// or `All` for an empty table.
    pub fn default_selection(&self) -> YearSelection {
        self.years
            .last()
            .copied()
            .map_or(YearSelection::All, YearSelection::Year)
    }
}
