//! Shipping-time summary feeding the "Average Shipping Days" gauge.

use serde::Serialize;

use crate::helpers::simd_helpers::{min_max_f64, sum_f64};
use crate::processor::schema::NumericField;
use crate::processor::year_filter::TableView;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShippingSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Mean, min and max of Days to ship; `None` for an empty view.
pub fn shipping_summary(view: &TableView<'_>) -> Option<ShippingSummary> {
    let days = view.numeric(NumericField::DaysToShip);
    let (min, max) = min_max_f64(&days)?;
    Some(ShippingSummary {
        mean: sum_f64(&days) / days.len() as f64,
        min,
        max,
    })
}

/// Displayable range and pointer of a bounded gauge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaugeRange {
    pub min: f64,
    pub max: f64,
    /// Absent when there was nothing to summarize.
    pub value: Option<f64>,
}

impl GaugeRange {
    /// Range used when the view has no rows.
    pub const EMPTY: GaugeRange = GaugeRange {
        min: 0.0,
        max: 1.0,
        value: None,
    };

    /// Range `[min, max]` with the mean as pointer. A collapsed range
    /// (`min == max`) is widened by `padding` on each side; a non-positive
    /// padding falls back to 1.0.
    pub fn from_summary(summary: Option<&ShippingSummary>, padding: f64) -> Self {
        let Some(s) = summary else {
            return GaugeRange::EMPTY;
        };
        let (min, max) = if s.max > s.min {
            (s.min, s.max)
        } else {
            let pad = if padding > 0.0 && padding.is_finite() {
                padding
            } else {
                1.0
            };
            (s.min - pad, s.max + pad)
        };
        GaugeRange {
            min,
            max,
            value: Some(s.mean),
        }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}
