//! One render pass: every number the dashboard page shows, computed from a
//! loaded table and a year selection, plus the display parameters the
//! presentation layer needs to draw it.

pub mod display;
pub mod format;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::config::DashboardConfig;
use crate::processor::aggregate::{distinct_count, sum};
use crate::processor::group_by::{GroupKey, Grouped, group_by_key, group_sum_pair};
use crate::processor::ranking::top_n;
use crate::processor::sales_table::SalesTable;
use crate::processor::schema::{KeyField, NumericField};
use crate::processor::shipping::{GaugeRange, ShippingSummary, shipping_summary};
use crate::processor::year_filter::{TableView, YearOptions, YearSelection, select};

use self::display::BarStyle;
use self::format::{millify, money};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub title: String,
    pub selection: YearSelection,
    /// Sidebar choices, "All" first.
    pub year_options: Vec<YearSelection>,
    /// Rows visible under the selection.
    pub rows: usize,
    pub summary: SummaryMetrics,
    pub metric_cards: Vec<MetricCard>,
    pub shipping: GaugeIndicator,
    pub sales_trend: StackedBarChart,
    pub top_sales: BarChart,
    pub top_profit: BarChart,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_sales: f64,
    pub total_profit: f64,
    /// Distinct Order IDs.
    pub order_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub label: String,
    pub value: f64,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeIndicator {
    pub title: String,
    pub range: GaugeRange,
    pub summary: Option<ShippingSummary>,
    pub bar_color: String,
    pub step_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: GroupKey,
    pub category: GroupKey,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedBarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Ascending by year, then category.
    pub points: Vec<TrendPoint>,
    pub colors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: GroupKey,
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Largest first.
    pub bars: Vec<Bar>,
}

/// Computes one full dashboard pass over `table` for `selection`.
///
/// Metric cards, the gauge and both rankings use the year-filtered rows; the
/// sales trend is broken down by year and always covers the whole table.
pub fn build_report(
    table: &SalesTable,
    selection: YearSelection,
    config: &DashboardConfig,
) -> DashboardReport {
    let view = select(table, selection);
    debug!(%selection, rows = view.len(), total = table.len(), "building dashboard");

    let display = &config.display;
    let summary = SummaryMetrics {
        total_sales: sum(&view, NumericField::Sales),
        total_profit: sum(&view, NumericField::Profit),
        order_count: distinct_count(&view, KeyField::OrderId),
    };

    let shipping = shipping_summary(&view);
    let gauge = GaugeIndicator {
        title: display.gauge.title.clone(),
        range: GaugeRange::from_summary(shipping.as_ref(), config.gauge_padding),
        summary: shipping,
        bar_color: display.gauge.bar_color.clone(),
        step_color: display.gauge.step_color.clone(),
    };

    DashboardReport {
        title: display.page_title.clone(),
        selection,
        year_options: YearOptions::from_table(table).choices(),
        rows: view.len(),
        metric_cards: metric_cards(&summary, config),
        summary,
        shipping: gauge,
        sales_trend: sales_trend(table, config),
        top_sales: ranking(&view, NumericField::Sales, &display.top_sales, config),
        top_profit: ranking(&view, NumericField::Profit, &display.top_profit, config),
    }
}

fn metric_cards(summary: &SummaryMetrics, config: &DashboardConfig) -> Vec<MetricCard> {
    let style = &config.display.metrics;
    vec![
        MetricCard {
            label: style.total_sales.clone(),
            value: summary.total_sales,
            display: money(summary.total_sales, &style.currency, style.precision),
        },
        MetricCard {
            label: style.total_profit.clone(),
            value: summary.total_profit,
            display: money(summary.total_profit, &style.currency, style.precision),
        },
        MetricCard {
            label: style.orders.clone(),
            value: summary.order_count as f64,
            display: millify(summary.order_count as f64, style.precision),
        },
    ]
}

fn sales_trend(table: &SalesTable, config: &DashboardConfig) -> StackedBarChart {
    let style = &config.display.trend;
    let grouped = group_sum_pair(
        &TableView::all(table),
        (KeyField::Year, KeyField::Category),
        NumericField::Sales,
    );
    StackedBarChart {
        title: style.title.clone(),
        x_label: style.x_label.clone(),
        y_label: style.y_label.clone(),
        points: grouped
            .into_iter()
            .map(|((year, category), sales)| TrendPoint { year, category, sales })
            .collect(),
        colors: style.category_colors.clone(),
    }
}

fn ranking(
    view: &TableView<'_>,
    value: NumericField,
    style: &BarStyle,
    config: &DashboardConfig,
) -> BarChart {
    let ranked: Grouped<GroupKey> = top_n(
        group_by_key(view, KeyField::ProductName, value, config.ranking_op),
        config.top_n,
    );
    let palette = &config.display.palette;
    BarChart {
        title: style.title_for(config.top_n),
        x_label: style.x_label.clone(),
        y_label: style.y_label.clone(),
        bars: ranked
            .into_iter()
            .enumerate()
            .map(|(i, (label, value))| Bar {
                label,
                value,
                color: if palette.is_empty() {
                    String::new()
                } else {
                    palette[i % palette.len()].clone()
                },
            })
            .collect(),
    }
}

impl fmt::Display for DashboardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}, {} rows)", self.title, self.selection, self.rows)?;
        writeln!(f)?;
        for card in &self.metric_cards {
            writeln!(f, "  {:<24} {}", card.label, card.display)?;
        }

        writeln!(f)?;
        match self.shipping.range.value {
            Some(mean) => writeln!(
                f,
                "{}: {:.2} (range {} to {})",
                self.shipping.title, mean, self.shipping.range.min, self.shipping.range.max
            )?,
            None => writeln!(f, "{}: no data", self.shipping.title)?,
        }

        writeln!(f)?;
        writeln!(f, "{}", self.sales_trend.title)?;
        for p in &self.sales_trend.points {
            writeln!(f, "  {:<6} {:<20} {:>14.2}", p.year.to_string(), p.category.to_string(), p.sales)?;
        }

        for chart in [&self.top_sales, &self.top_profit] {
            writeln!(f)?;
            writeln!(f, "{}", chart.title)?;
            for (i, bar) in chart.bars.iter().enumerate() {
                writeln!(f, "  {:>2}. {:<48} {:>12.2}", i + 1, bar.label.to_string(), bar.value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{AggregateOp, LoadOptions};

    const CSV: &str = "Year,Category,Product Name,Sales,Profit,Order ID,Days to ship\n\
                       2020,Furniture,Chair,100,10,O-1,3\n\
                       2020,Furniture,Chair,40,-5,O-1,3\n\
                       2020,Technology,Phone,300,60,O-2,5\n\
                       2021,Office Supplies,Paper,20,4,O-3,2\n\
                       2021,Furniture,Chair,80,8,O-4,2\n";

    fn table() -> SalesTable {
        SalesTable::from_csv_bytes(CSV, &LoadOptions::default()).unwrap().0
    }

    #[test]
    fn summary_follows_selection() {
        let table = table();
        let config = DashboardConfig::default();

        let report = build_report(&table, YearSelection::Year(2020), &config);
        assert_eq!(report.rows, 3);
        assert_eq!(
            report.summary,
            SummaryMetrics { total_sales: 440.0, total_profit: 65.0, order_count: 2 }
        );
        assert_eq!(report.metric_cards[0].display, "$440");
        assert_eq!(report.metric_cards[1].display, "$65");
        assert_eq!(report.metric_cards[2].display, "2");

        let all = build_report(&table, YearSelection::All, &config);
        assert_eq!(all.summary.total_sales, 540.0);
        assert_eq!(all.summary.order_count, 4);
    }

    #[test]
    fn trend_ignores_selection() {
        let table = table();
        let config = DashboardConfig::default();
        let a = build_report(&table, YearSelection::Year(2020), &config);
        let b = build_report(&table, YearSelection::All, &config);
        assert_eq!(a.sales_trend, b.sales_trend);

        let points: Vec<(String, String, f64)> = a
            .sales_trend
            .points
            .iter()
            .map(|p| (p.year.to_string(), p.category.to_string(), p.sales))
            .collect();
        assert_eq!(
            points,
            vec![
                ("2020".to_string(), "Furniture".to_string(), 140.0),
                ("2020".to_string(), "Technology".to_string(), 300.0),
                ("2021".to_string(), "Furniture".to_string(), 80.0),
                ("2021".to_string(), "Office Supplies".to_string(), 20.0),
            ]
        );
    }

    #[test]
    fn rankings_use_configured_op() {
        let table = table();
        let mut config = DashboardConfig::default();

        let report = build_report(&table, YearSelection::All, &config);
        let sales: Vec<(String, f64)> = report
            .top_sales
            .bars
            .iter()
            .map(|b| (b.label.to_string(), b.value))
            .collect();
        assert_eq!(
            sales,
            vec![("Phone".into(), 300.0), ("Chair".into(), 100.0), ("Paper".into(), 20.0)]
        );
        assert_eq!(report.top_sales.title, "Top 10 Products by Sales");
        assert_eq!(report.top_sales.bars[0].color, "#2596be");
        assert_eq!(report.top_sales.bars[1].color, "#e30d14");

        config.ranking_op = AggregateOp::Sum;
        config.top_n = 1;
        let report = build_report(&table, YearSelection::All, &config);
        assert_eq!(report.top_profit.bars.len(), 1);
        assert_eq!(report.top_profit.bars[0].label, GroupKey::from("Phone"));
        assert_eq!(report.top_profit.title, "Top 1 Products by Profit");
    }

    #[test]
    fn empty_selection_is_well_formed() {
        let table = table();
        let report = build_report(&table, YearSelection::Year(1999), &DashboardConfig::default());
        assert_eq!(report.rows, 0);
        assert_eq!(report.summary.total_sales, 0.0);
        assert_eq!(report.summary.order_count, 0);
        assert!(report.top_sales.bars.is_empty());
        assert!(report.top_profit.bars.is_empty());
        assert_eq!(report.shipping.range, GaugeRange::EMPTY);
        assert!(report.shipping.summary.is_none());
        assert_eq!(report.sales_trend.points.len(), 4);
        assert!(report.to_string().contains("no data"));
    }

    #[test]
    fn gauge_and_options() {
        let table = table();
        let report = build_report(&table, YearSelection::Year(2021), &DashboardConfig::default());
        assert_eq!(report.shipping.range, GaugeRange { min: 1.0, max: 3.0, value: Some(2.0) });
        assert_eq!(report.shipping.title, "Average Shipping Days");
        assert_eq!(
            report.year_options,
            vec![YearSelection::All, YearSelection::Year(2021), YearSelection::Year(2020)]
        );
    }

    #[test]
    fn report_serializes_for_presentation() {
        let table = table();
        let report = build_report(&table, YearSelection::Year(2020), &DashboardConfig::default());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["selection"], 2020);
        assert_eq!(json["year_options"][0], "All");
        assert_eq!(json["sales_trend"]["points"][0]["year"], 2020);
        assert_eq!(json["sales_trend"]["points"][0]["category"], "Furniture");
        assert_eq!(json["top_sales"]["bars"][0]["label"], "Phone");
        assert_eq!(json["shipping"]["range"]["value"], 11.0 / 3.0);
    }
}
