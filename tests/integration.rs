use std::io::Write;
use std::path::Path;

use sales_dashboard::processor::aggregate::{distinct_count, mean, sum};
use sales_dashboard::processor::group_by::{GroupKey, group_sum, group_sum_pair};
use sales_dashboard::processor::query_builder::QueryResult;
use sales_dashboard::processor::ranking::{TOP_N, top_n};
use sales_dashboard::processor::schema::{KeyField, NumericField};
use sales_dashboard::processor::shipping::{GaugeRange, shipping_summary};
use sales_dashboard::{
    AggregateOp, AggregateResult, DashboardConfig, InvalidValuePolicy, LoadOptions,
    ProcessorError, SalesTable, TableView, YearOptions, YearSelection, build_report, select,
};
use tempfile::NamedTempFile;

const HEADER: &str = "Year,Category,Product Name,Sales,Profit,Order ID,Days to ship\n";

fn write_csv(body: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    write!(tmp, "{HEADER}{body}").unwrap();
    tmp.flush().unwrap();
    tmp
}

fn load(body: &str) -> SalesTable {
    let tmp = write_csv(body);
    SalesTable::load_csv(tmp.path(), &LoadOptions::default()).unwrap().0
}

fn superstore() -> SalesTable {
    load(
        "2014,Furniture,\"Bretford CR4500 Series Slim Rectangular Table\",957.58,-383.03,CA-2014-1001,4\n\
         2014,Office Supplies,Eldon Fold 'N Roll Cart System,22.37,2.52,CA-2014-1002,5\n\
         2015,Technology,\"Mitel 5320 IP Phone, VoIP phone\",907.15,90.72,CA-2015-2001,3\n\
         2015,Furniture,Bush Somerset Collection Bookcase,261.96,41.91,CA-2015-2002,3\n\
         2015,Furniture,Bush Somerset Collection Bookcase,731.94,219.58,CA-2015-2003,7\n\
         2016,Office Supplies,Avery 508,14.62,6.87,CA-2016-3001,2\n\
         2016,Technology,Apple iPhone,1097.54,255.18,CA-2016-3002,6\n\
         2016,Technology,Apple iPhone,399.98,-59.99,CA-2016-3002,6\n",
    )
}

#[test]
fn test_three_row_scenario() {
    let table = load("2020,Furniture,A,100,10,O-1,3\n2020,Furniture,B,50,5,O-2,4\n2021,Furniture,A,30,3,O-3,2\n");

    let view = select(&table, YearSelection::Year(2020));
    let rows: Vec<_> = view.records().collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].product_name, "A");
    assert_eq!(rows[1].product_name, "B");

    let grouped = group_sum(&view, KeyField::ProductName, NumericField::Sales);
    assert_eq!(
        grouped,
        vec![(GroupKey::from("A"), 100.0), (GroupKey::from("B"), 50.0)]
    );
    assert_eq!(top_n(grouped, 1), vec![(GroupKey::from("A"), 100.0)]);
}

#[test]
fn test_empty_view_scenario() {
    let table = superstore();
    let view = select(&table, YearSelection::Year(1990));

    assert!(view.is_empty());
    assert_eq!(sum(&view, NumericField::Sales), 0.0);
    assert_eq!(distinct_count(&view, KeyField::OrderId), 0);
    assert_eq!(mean(&view, NumericField::Sales), None);
    assert!(top_n(group_sum(&view, KeyField::ProductName, NumericField::Sales), TOP_N).is_empty());

    let summary = shipping_summary(&view);
    assert!(summary.is_none());
    assert_eq!(GaugeRange::from_summary(summary.as_ref(), 1.0), GaugeRange::EMPTY);
}

#[test]
fn test_filter_properties() {
    let table = superstore();

    let all = select(&table, YearSelection::All);
    assert!(all.is_identity());
    assert!(all.row_indices().eq(0..table.len()));
    assert_eq!(
        sum(&all, NumericField::Sales),
        sum(&TableView::all(&table), NumericField::Sales)
    );

    for &year in YearOptions::from_table(&table).years() {
        let view = select(&table, YearSelection::Year(year));
        assert!(view.len() <= table.len());
        assert!(view.records().all(|r| r.year == year));
        let indices: Vec<usize> = view.row_indices().collect();
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_group_totals_match_scalar_sum() {
    let table = superstore();
    for selection in [YearSelection::All, YearSelection::Year(2015)] {
        let view = select(&table, selection);
        let grouped: f64 = group_sum(&view, KeyField::Category, NumericField::Sales)
            .iter()
            .map(|(_, v)| v)
            .sum();
        assert!((grouped - sum(&view, NumericField::Sales)).abs() < 1e-6);

        let pairs: f64 = group_sum_pair(&view, (KeyField::Year, KeyField::Category), NumericField::Sales)
            .iter()
            .map(|(_, v)| v)
            .sum();
        assert!((pairs - grouped).abs() < 1e-6);
    }
}

#[test]
fn test_quoted_product_names_survive_loading() {
    let table = superstore();
    let names: Vec<String> = select(&table, YearSelection::Year(2015))
        .records()
        .map(|r| r.product_name.into_owned())
        .collect();
    assert_eq!(names[0], "Mitel 5320 IP Phone, VoIP phone");
    assert_eq!(table.record(0).unwrap().category, "Furniture");
}

#[test]
fn test_full_report_pass() {
    let table = superstore();
    let config = DashboardConfig::default();
    let options = YearOptions::from_table(&table);
    assert_eq!(
        options.choices(),
        vec![
            YearSelection::All,
            YearSelection::Year(2016),
            YearSelection::Year(2015),
            YearSelection::Year(2014),
        ]
    );

    let selection = config.resolve_selection(&options, None);
    assert_eq!(selection, YearSelection::Year(2014));

    let report = build_report(&table, YearSelection::Year(2016), &config);
    assert_eq!(report.rows, 3);
    assert_eq!(report.summary.order_count, 2);
    assert_eq!(report.top_sales.bars[0].label, GroupKey::from("Apple iPhone"));
    assert_eq!(report.top_sales.bars[0].value, 1097.54);
    assert_eq!(report.top_profit.bars.len(), 2);
    assert_eq!(report.shipping.range, GaugeRange { min: 2.0, max: 6.0, value: Some(14.0 / 3.0) });
    assert_eq!(report.sales_trend.points.len(), 6);

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"title\":\"Superstore Sales Dashboard\""));
}

#[test]
fn test_query_builder_over_file() {
    let table = superstore();
    let result = table
        .query()
        .year(YearSelection::Year(2015))
        .aggregate(NumericField::DaysToShip, AggregateOp::Max)
        .execute()
        .unwrap();
    assert_eq!(result, QueryResult::Aggregate(AggregateResult::Float(7.0)));

    let result = table
        .query()
        .group_by(KeyField::Year)
        .aggregate(NumericField::Sales, AggregateOp::Count)
        .execute()
        .unwrap();
    let QueryResult::GroupBy(rows) = result else {
        panic!("Expected GroupBy result");
    };
    let counts: Vec<(String, f64)> = rows.iter().map(|r| (r.keys[0].to_string(), r.value)).collect();
    assert_eq!(
        counts,
        vec![("2014".into(), 2.0), ("2015".into(), 3.0), ("2016".into(), 3.0)]
    );
}

#[test]
fn test_invalid_values_policy() {
    let body = "2020,Furniture,A,100,10,O-1,3\n\
                2020,Furniture,B,,5,O-2,4\n\
                2021,Furniture,C,30,3,O-3,2\n";
    let tmp = write_csv(body);

    let (table, summary) = SalesTable::load_csv(tmp.path(), &LoadOptions::default()).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(summary.rows_skipped, 1);
    assert_eq!(summary.errors[0].line, 3);

    let zero = LoadOptions { invalid_values: InvalidValuePolicy::Zero };
    let (table, _) = SalesTable::load_csv(tmp.path(), &zero).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.numeric(NumericField::Sales), &[100.0, 0.0, 30.0]);

    let fail = LoadOptions { invalid_values: InvalidValuePolicy::Fail };
    assert!(matches!(
        SalesTable::load_csv(tmp.path(), &fail),
        Err(ProcessorError::InvalidValue { line: 3, .. })
    ));
}

#[test]
fn test_load_failures_are_fatal() {
    assert!(matches!(
        SalesTable::load_csv(Path::new("/nonexistent/superstore.csv"), &LoadOptions::default()),
        Err(ProcessorError::Io(_))
    ));

    let mut tmp = NamedTempFile::new().unwrap();
    write!(tmp, "Year,Category,Sales\n2020,Furniture,1\n").unwrap();
    tmp.flush().unwrap();
    assert!(matches!(
        SalesTable::load_csv(tmp.path(), &LoadOptions::default()),
        Err(ProcessorError::MissingColumn(_))
    ));

    let empty = NamedTempFile::new().unwrap();
    assert!(matches!(
        SalesTable::load_csv(empty.path(), &LoadOptions::default()),
        Err(ProcessorError::MissingHeader)
    ));
}

#[test]
fn test_large_file_parallel_load() {
    let mut body = String::new();
    for i in 0..60_000 {
        body.push_str(&format!(
            "{},Technology,\"Item {}, boxed\",{}.0,1.0,O-{},{}\n",
            2014 + i % 4,
            i % 100,
            i % 10,
            i,
            i % 7
        ));
    }
    body.push_str("bad,row\n");
    let tmp = write_csv(&body);

    let (table, summary) = SalesTable::load_csv(tmp.path(), &LoadOptions::default()).unwrap();
    assert_eq!(table.len(), 60_000);
    assert_eq!(summary.rows_skipped, 1);
    assert_eq!(summary.errors[0].line, 60_002);
    assert_eq!(distinct_count(&TableView::all(&table), KeyField::OrderId), 60_000);
    assert_eq!(table.record(59_999).unwrap().product_name, "Item 99, boxed");
    assert_eq!(select(&table, YearSelection::Year(2017)).len(), 15_000);
}
