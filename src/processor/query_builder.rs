use serde::Serialize;
use tracing::debug;

use crate::processor::aggregate::aggregate;
use crate::processor::group_by::{GroupKey, group_by};
use crate::processor::ranking::top_n;
use crate::processor::sales_table::SalesTable;
use crate::processor::schema::{KeyField, NumericField};
use crate::processor::year_filter::{YearSelection, select};
use crate::processor::{AggregateOp, AggregateResult, ProcessorError};

/// One row of a grouped query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub keys: Vec<GroupKey>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryResult {
    /// No grouping: a single value over the filtered rows
    Aggregate(AggregateResult),
    /// Ascending key order, or descending value order when limited
    GroupBy(Vec<GroupRow>),
}

/// Ad-hoc query: year filter, optional grouping, one aggregation and an
/// optional top-N cut.
///
/// ```rust
/// # use sales_dashboard::processor::{AggregateOp, LoadOptions, sales_table::SalesTable};
/// # use sales_dashboard::processor::schema::{KeyField, NumericField};
/// # use sales_dashboard::processor::query_builder::QueryResult;
/// let csv = "Year,Category,Product Name,Sales,Profit,Order ID,Days to ship\n\
///            2020,Furniture,Chair,100,10,O-1,3\n";
/// let (table, _) = SalesTable::from_csv_bytes(csv, &LoadOptions::default()).unwrap();
/// let result = table
///     .query()
///     .group_by(KeyField::Category)
///     .aggregate(NumericField::Sales, AggregateOp::Sum)
///     .limit(5)
///     .execute()
///     .unwrap();
/// assert!(matches!(result, QueryResult::GroupBy(rows) if rows.len() == 1));
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    table: &'a SalesTable,
    selection: YearSelection,
    group_by_columns: Vec<KeyField>,
    aggregation: Option<(NumericField, AggregateOp)>,
    limit: Option<usize>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(table: &'a SalesTable) -> Self {
        Self {
            table,
            selection: YearSelection::All,
            group_by_columns: Vec::new(),
            aggregation: None,
            limit: None,
        }
    }

    /// Restrict to one year (default: all)
    pub fn year(mut self, selection: YearSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Add a single group-by column
    pub fn group_by(mut self, column: KeyField) -> Self {
        self.group_by_columns.push(column);
        self
    }

    /// Add multiple group-by columns
    pub fn group_by_multi(mut self, columns: Vec<KeyField>) -> Self {
        self.group_by_columns.extend(columns);
        self
    }

    /// Set the aggregation; a later call replaces an earlier one
    pub fn aggregate(mut self, column: NumericField, op: AggregateOp) -> Self {
        self.aggregation = Some((column, op));
        self
    }

    /// Keep only the `n` largest groups
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn execute(self) -> Result<QueryResult, ProcessorError> {
        let (column, op) = self
            .aggregation
            .ok_or_else(|| ProcessorError::InvalidQuery("no aggregation given".into()))?;

        let view = select(self.table, self.selection);
        debug!(
            selection = %self.selection,
            groups = ?self.group_by_columns,
            %column,
            %op,
            rows = view.len(),
            "executing query"
        );

        if self.group_by_columns.is_empty() {
            if self.limit.is_some() {
                return Err(ProcessorError::InvalidQuery(
                    "a limit needs at least one group-by column".into(),
                ));
            }
            return Ok(QueryResult::Aggregate(aggregate(&view, column, op)));
        }

        let mut grouped = group_by(&view, &self.group_by_columns, column, op);
        if let Some(n) = self.limit {
            grouped = top_n(grouped, n);
        }

        Ok(QueryResult::GroupBy(
            grouped
                .into_iter()
                .map(|(keys, value)| GroupRow { keys, value })
                .collect(),
        ))
    }
}

impl SalesTable {
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(self)
    }
}
