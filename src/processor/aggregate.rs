//! Scalar summaries over a [`TableView`].
//!
//! Empty views are not errors: sums and counts are zero, while mean, min and
//! max have no value and come back as `None` (or [`AggregateResult::NoData`]).

use std::collections::HashSet;

use crate::helpers::simd_helpers::{min_max_f64, sum_f64};
use crate::processor::schema::{KeyField, NumericField};
use crate::processor::year_filter::TableView;
use crate::processor::{AggregateOp, AggregateResult};

pub fn sum(view: &TableView<'_>, field: NumericField) -> f64 {
    sum_f64(&view.numeric(field))
}

pub fn mean(view: &TableView<'_>, field: NumericField) -> Option<f64> {
    let values = view.numeric(field);
    if values.is_empty() {
        return None;
    }
    Some(sum_f64(&values) / values.len() as f64)
}

pub fn min(view: &TableView<'_>, field: NumericField) -> Option<f64> {
    min_max_f64(&view.numeric(field)).map(|(lo, _)| lo)
}

pub fn max(view: &TableView<'_>, field: NumericField) -> Option<f64> {
    min_max_f64(&view.numeric(field)).map(|(_, hi)| hi)
}

/// Number of distinct values of a key column among the visible rows.
pub fn distinct_count(view: &TableView<'_>, field: KeyField) -> usize {
    let table = view.table();
    match table.spans(field) {
        None => {
            let years = table.years();
            view.row_indices()
                .map(|row| years[row])
                .collect::<HashSet<_>>()
                .len()
        }
        Some(spans) => view
            .row_indices()
            .map(|row| table.text(spans[row]))
            .collect::<HashSet<_>>()
            .len(),
    }
}

/// Runs `op` over a numeric column of the view.
///
/// # Example
/// ```rust
/// # use sales_dashboard::processor::{AggregateOp, AggregateResult, LoadOptions};
/// # use sales_dashboard::processor::{aggregate::aggregate, sales_table::SalesTable};
/// # use sales_dashboard::processor::{schema::NumericField, year_filter::TableView};
/// let csv = "Year,Category,Product Name,Sales,Profit,Order ID,Days to ship\n";
/// let (table, _) = SalesTable::from_csv_bytes(csv, &LoadOptions::default()).unwrap();
/// let view = TableView::all(&table);
/// assert_eq!(aggregate(&view, NumericField::Sales, AggregateOp::Sum), AggregateResult::Float(0.0));
/// assert_eq!(aggregate(&view, NumericField::Sales, AggregateOp::Max), AggregateResult::NoData);
/// ```
pub fn aggregate(view: &TableView<'_>, field: NumericField, op: AggregateOp) -> AggregateResult {
    let from_option = |v: Option<f64>| v.map_or(AggregateResult::NoData, AggregateResult::Float);
    match op {
        AggregateOp::Sum => AggregateResult::Float(sum(view, field)),
        AggregateOp::Count => AggregateResult::Int(view.len() as i64),
        AggregateOp::Avg => from_option(mean(view, field)),
        AggregateOp::Min => from_option(min(view, field)),
        AggregateOp::Max => from_option(max(view, field)),
    }
}
