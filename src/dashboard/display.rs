//! Display parameters handed to the presentation layer along with the data.
//! Defaults reproduce the Superstore sales dashboard.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub page_title: String,
    pub sidebar_title: String,
    pub year_label: String,
    pub summary_header: String,
    pub metrics: MetricStyle,
    pub gauge: GaugeStyle,
    pub trend: TrendStyle,
    pub top_sales: BarStyle,
    pub top_profit: BarStyle,
    /// Bar colours for the ranking charts, cycled.
    pub palette: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricStyle {
    pub total_sales: String,
    pub total_profit: String,
    pub orders: String,
    pub currency: String,
    /// Decimal places kept by the abbreviated display.
    pub precision: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaugeStyle {
    pub title: String,
    pub bar_color: String,
    pub step_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendStyle {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub category_colors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarStyle {
    /// `{n}` is replaced with the ranking length.
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl BarStyle {
    pub fn title_for(&self, n: usize) -> String {
        self.title.replace("{n}", &n.to_string())
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            page_title: "Superstore Sales Dashboard".into(),
            sidebar_title: "Superstore Dashboard".into(),
            year_label: "Select a year".into(),
            summary_header: "Summarized Data 📈".into(),
            metrics: MetricStyle::default(),
            gauge: GaugeStyle::default(),
            trend: TrendStyle::default(),
            top_sales: BarStyle {
                title: "Top {n} Products by Sales".into(),
                x_label: "Total Sales".into(),
                y_label: "Product Name".into(),
            },
            top_profit: BarStyle {
                title: "Top {n} Products by Profit".into(),
                x_label: "Total Profit".into(),
                y_label: "Product Name".into(),
            },
            palette: [
                "#2596be", "#e30d14", "#fbf304", "#e4ecf4", "#062186", "#6f7786", "#658cad",
                "#0d6de1", "#facc23", "#c71320", "#e93313",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Default for MetricStyle {
    fn default() -> Self {
        MetricStyle {
            total_sales: "💸 Total Sales".into(),
            total_profit: "💰 Total profit".into(),
            orders: "📋 Number of orders".into(),
            currency: "$".into(),
            precision: 1,
        }
    }
}

impl Default for GaugeStyle {
    fn default() -> Self {
        GaugeStyle {
            title: "Average Shipping Days".into(),
            bar_color: "#e30d14".into(),
            step_color: "#fff001".into(),
        }
    }
}

impl Default for TrendStyle {
    fn default() -> Self {
        TrendStyle {
            title: "Sales Trends by Product Categories".into(),
            x_label: "Year".into(),
            y_label: "Total Sales".into(),
            category_colors: [
                ("Furniture", "#e30d14"),
                ("Office Supplies", "#fff001"),
                ("Technology", "#0453ab"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_titles_use_ranking_length() {
        let display = DisplayConfig::default();
        assert_eq!(display.top_sales.title_for(10), "Top 10 Products by Sales");
        assert_eq!(display.top_profit.title_for(5), "Top 5 Products by Profit");
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let display: DisplayConfig =
            serde_yaml::from_str("page_title: Regional Sales\ngauge:\n  bar_color: '#000000'\n")
                .unwrap();
        assert_eq!(display.page_title, "Regional Sales");
        assert_eq!(display.gauge.bar_color, "#000000");
        assert_eq!(display.gauge.title, "Average Shipping Days");
        assert_eq!(display.palette.len(), 11);
        assert_eq!(display.trend.category_colors["Technology"], "#0453ab");
    }
}
