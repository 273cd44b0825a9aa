use crate::processor::schema::{KeyField, NumericField};

/// A text cell: byte range into the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    /// The cell was quoted and contains `""` escapes that must be collapsed
    /// when the text is read back.
    pub escaped: bool,
}

impl Span {
    pub fn new(start: usize, end: usize, escaped: bool) -> Self {
        Span {
            start,
            end,
            escaped,
        }
    }
}

/// Typed column vectors for the sales schema, all of equal length.
///
/// Each parser thread fills one of these for its chunk; the chunks are then
/// appended in file order to form the table's storage.
#[derive(Debug, Clone, Default)]
pub struct SalesColumns {
    pub year: Vec<i64>,
    pub category: Vec<Span>,
    pub product_name: Vec<Span>,
    pub sales: Vec<f64>,
    pub profit: Vec<f64>,
    pub order_id: Vec<Span>,
    pub days_to_ship: Vec<f64>,
}

impl SalesColumns {
    pub fn with_capacity(rows: usize) -> Self {
        SalesColumns {
            year: Vec::with_capacity(rows),
            category: Vec::with_capacity(rows),
            product_name: Vec::with_capacity(rows),
            sales: Vec::with_capacity(rows),
            profit: Vec::with_capacity(rows),
            order_id: Vec::with_capacity(rows),
            days_to_ship: Vec::with_capacity(rows),
        }
    }

    pub fn len(&self) -> usize {
        self.year.len()
    }

    pub fn is_empty(&self) -> bool {
        self.year.is_empty()
    }

    /// Moves every row of `other` onto the end of `self`.
    pub fn append(&mut self, other: &mut SalesColumns) {
        self.year.append(&mut other.year);
        self.category.append(&mut other.category);
        self.product_name.append(&mut other.product_name);
        self.sales.append(&mut other.sales);
        self.profit.append(&mut other.profit);
        self.order_id.append(&mut other.order_id);
        self.days_to_ship.append(&mut other.days_to_ship);
    }

    pub fn numeric(&self, field: NumericField) -> &[f64] {
        match field {
            NumericField::Sales => &self.sales,
            NumericField::Profit => &self.profit,
            NumericField::DaysToShip => &self.days_to_ship,
        }
    }

    /// Spans of a text key column; `None` for [`KeyField::Year`].
    pub fn text(&self, field: KeyField) -> Option<&[Span]> {
        match field {
            KeyField::Year => None,
            KeyField::Category => Some(&self.category),
            KeyField::ProductName => Some(&self.product_name),
            KeyField::OrderId => Some(&self.order_id),
        }
    }

    pub fn shrink_to_fit(&mut self) {
        self.year.shrink_to_fit();
        self.category.shrink_to_fit();
        self.product_name.shrink_to_fit();
        self.sales.shrink_to_fit();
        self.profit.shrink_to_fit();
        self.order_id.shrink_to_fit();
        self.days_to_ship.shrink_to_fit();
    }
}
