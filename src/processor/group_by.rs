use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::processor::AggregateOp;
use crate::processor::column::Span;
use crate::processor::sales_table::SalesTable;
use crate::processor::schema::{KeyField, NumericField};
use crate::processor::year_filter::TableView;

/// Value of a grouping column.
///
/// Ordered years first, then text; a single key column only ever holds one
/// kind, so in practice this is numeric or lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Year(i64),
    Text(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Year(y) => write!(f, "{y}"),
            GroupKey::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        GroupKey::Text(s.to_string())
    }
}

impl From<i64> for GroupKey {
    fn from(y: i64) -> Self {
        GroupKey::Year(y)
    }
}

/// One entry per distinct key, in ascending key order.
pub type Grouped<K> = Vec<(K, f64)>;

/// Borrowed form of [`GroupKey`] used while scanning rows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum KeyRef<'a> {
    Year(i64),
    Text(Cow<'a, str>),
}

impl KeyRef<'_> {
    fn into_owned(self) -> GroupKey {
        match self {
            KeyRef::Year(y) => GroupKey::Year(y),
            KeyRef::Text(s) => GroupKey::Text(s.into_owned()),
        }
    }
}

enum KeyColumn<'a> {
    Year(&'a [i64]),
    Text(&'a SalesTable, &'a [Span]),
}

impl<'a> KeyColumn<'a> {
    fn new(table: &'a SalesTable, field: KeyField) -> Self {
        match table.spans(field) {
            Some(spans) => KeyColumn::Text(table, spans),
            None => KeyColumn::Year(table.years()),
        }
    }

    fn get(&self, row: usize) -> KeyRef<'a> {
        match *self {
            KeyColumn::Year(years) => KeyRef::Year(years[row]),
            KeyColumn::Text(table, spans) => KeyRef::Text(table.text(spans[row])),
        }
    }
}

/// Running (sum, count, min, max) of one group.
#[derive(Debug, Clone, Copy)]
struct Acc {
    sum: f64,
    count: usize,
    min: f64,
    max: f64,
}

impl Acc {
    fn new() -> Self {
        Acc {
            sum: 0.0,
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn push(&mut self, v: f64) {
        self.sum += v;
        self.count += 1;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    fn finish(&self, op: AggregateOp) -> f64 {
        match op {
            AggregateOp::Sum => self.sum,
            AggregateOp::Count => self.count as f64,
            AggregateOp::Avg => self.sum / self.count as f64,
            AggregateOp::Min => self.min,
            AggregateOp::Max => self.max,
        }
    }
}

fn fold<K: Ord>(
    view: &TableView<'_>,
    value: NumericField,
    key_of: impl Fn(usize) -> K,
) -> BTreeMap<K, Acc> {
    let values = view.table().numeric(value);
    let mut groups: BTreeMap<K, Acc> = BTreeMap::new();
    for row in view.row_indices() {
        groups.entry(key_of(row)).or_insert_with(Acc::new).push(values[row]);
    }
    groups
}

/// Partitions the view by `key` and applies `op` to `value` within each
/// partition. Groups only exist for keys present in the view, so every
/// accumulator has at least one row.
pub fn group_by_key(
    view: &TableView<'_>,
    key: KeyField,
    value: NumericField,
    op: AggregateOp,
) -> Grouped<GroupKey> {
    let column = KeyColumn::new(view.table(), key);
    fold(view, value, |row| column.get(row))
        .into_iter()
        .map(|(k, acc)| (k.into_owned(), acc.finish(op)))
        .collect()
}

/// Two-key variant: one entry per distinct `(first, second)` pair.
pub fn group_by_pair(
    view: &TableView<'_>,
    keys: (KeyField, KeyField),
    value: NumericField,
    op: AggregateOp,
) -> Grouped<(GroupKey, GroupKey)> {
    let first = KeyColumn::new(view.table(), keys.0);
    let second = KeyColumn::new(view.table(), keys.1);
    fold(view, value, |row| (first.get(row), second.get(row)))
        .into_iter()
        .map(|((a, b), acc)| ((a.into_owned(), b.into_owned()), acc.finish(op)))
        .collect()
}

/// Any number of key columns; an empty key list yields a single group over
/// the whole view (or nothing, if the view is empty).
pub fn group_by(
    view: &TableView<'_>,
    keys: &[KeyField],
    value: NumericField,
    op: AggregateOp,
) -> Grouped<Vec<GroupKey>> {
    let columns: Vec<KeyColumn<'_>> = keys
        .iter()
        .map(|&k| KeyColumn::new(view.table(), k))
        .collect();
    fold(view, value, |row| {
        columns.iter().map(|c| c.get(row)).collect::<Vec<_>>()
    })
    .into_iter()
    .map(|(k, acc)| {
        (
            k.into_iter().map(KeyRef::into_owned).collect(),
            acc.finish(op),
        )
    })
    .collect()
}

pub fn group_sum(view: &TableView<'_>, key: KeyField, value: NumericField) -> Grouped<GroupKey> {
    group_by_key(view, key, value, AggregateOp::Sum)
}

pub fn group_max(view: &TableView<'_>, key: KeyField, value: NumericField) -> Grouped<GroupKey> {
    group_by_key(view, key, value, AggregateOp::Max)
}

pub fn group_sum_pair(
    view: &TableView<'_>,
    keys: (KeyField, KeyField),
    value: NumericField,
) -> Grouped<(GroupKey, GroupKey)> {
    group_by_pair(view, keys, value, AggregateOp::Sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::LoadOptions;
    use crate::processor::aggregate::sum;
    use crate::processor::year_filter::{YearSelection, select};

    const CSV: &str = "Year,Category,Product Name,Sales,Profit,Order ID,Days to ship\n\
                       2021,Technology,B,70,7,O-5,1\n\
                       2020,Furniture,A,100,10,O-1,3\n\
                       2020,Technology,B,50,5,O-2,4\n\
                       2021,Furniture,A,30,3,O-3,2\n\
                       2021,Furniture,C,20,-1,O-4,6\n";

    fn table() -> SalesTable {
        SalesTable::from_csv_bytes(CSV, &LoadOptions::default()).unwrap().0
    }

    #[test]
    fn test_group_sum_by_product() {
        let table = table();
        let view = select(&table, YearSelection::Year(2020));
        let grouped = group_sum(&view, KeyField::ProductName, NumericField::Sales);
        assert_eq!(grouped, vec![(GroupKey::from("A"), 100.0), (GroupKey::from("B"), 50.0)]);
    }

    #[test]
    fn test_group_max() {
        let table = table();
        let view = TableView::all(&table);
        let grouped = group_max(&view, KeyField::ProductName, NumericField::Sales);
        assert_eq!(
            grouped,
            vec![(GroupKey::from("A"), 100.0), (GroupKey::from("B"), 70.0), (GroupKey::from("C"), 20.0)]
        );
    }

    #[test]
    fn test_group_by_year_is_ascending() {
        let table = table();
        let view = TableView::all(&table);
        let grouped = group_sum(&view, KeyField::Year, NumericField::Profit);
        assert_eq!(grouped, vec![(GroupKey::from(2020), 15.0), (GroupKey::from(2021), 9.0)]);
    }

    #[test]
    fn test_group_totals_match_scalar_sum() {
        let table = table();
        let view = TableView::all(&table);
        let total: f64 = group_sum(&view, KeyField::Category, NumericField::Sales)
            .iter()
            .map(|(_, v)| v)
            .sum();
        assert!((total - sum(&view, NumericField::Sales)).abs() < 1e-9);
    }

    #[test]
    fn test_pair_grouping() {
        let table = table();
        let view = TableView::all(&table);
        let grouped = group_sum_pair(
            &view,
            (KeyField::Year, KeyField::Category),
            NumericField::Sales,
        );
        assert_eq!(
            grouped,
            vec![
                ((GroupKey::from(2020), GroupKey::from("Furniture")), 100.0),
                ((GroupKey::from(2020), GroupKey::from("Technology")), 50.0),
                ((GroupKey::from(2021), GroupKey::from("Furniture")), 50.0),
                ((GroupKey::from(2021), GroupKey::from("Technology")), 70.0),
            ]
        );
    }

    #[test]
    fn test_generic_group_by_and_ops() {
        let table = table();
        let view = TableView::all(&table);
        let counts = group_by(&view, &[KeyField::Category], NumericField::Sales, AggregateOp::Count);
        assert_eq!(
            counts,
            vec![
                (vec![GroupKey::from("Furniture")], 3.0),
                (vec![GroupKey::from("Technology")], 2.0),
            ]
        );
        let avg = group_by(&view, &[], NumericField::Sales, AggregateOp::Avg);
        assert_eq!(avg, vec![(Vec::<GroupKey>::new(), 54.0)]);
    }

    #[test]
    fn test_single_row_group_and_empty_view() {
        let table = table();
        let view = TableView::all(&table);
        let mins = group_by_key(&view, KeyField::ProductName, NumericField::Profit, AggregateOp::Min);
        assert_eq!(mins[2], (GroupKey::from("C"), -1.0));

        let empty = select(&table, YearSelection::Year(2000));
        assert!(group_sum(&empty, KeyField::ProductName, NumericField::Sales).is_empty());
        assert!(group_by(&empty, &[], NumericField::Sales, AggregateOp::Sum).is_empty());
    }
}
