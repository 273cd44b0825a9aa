//! Fixed column schema of the sales dataset.
//!
//! Columns are addressed through enums rather than strings so that asking for
//! the sum of a text column is a compile error, and a dataset lacking one of
//! the required headers is rejected at load time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::processor::ProcessorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int64,
    Float64,
    Str,
}

/// Every column the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Year,
    Category,
    ProductName,
    Sales,
    Profit,
    OrderId,
    DaysToShip,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Year,
        Field::Category,
        Field::ProductName,
        Field::Sales,
        Field::Profit,
        Field::OrderId,
        Field::DaysToShip,
    ];

    /// Header text as it appears in the CSV.
    pub fn header(self) -> &'static str {
        match self {
            Field::Year => "Year",
            Field::Category => "Category",
            Field::ProductName => "Product Name",
            Field::Sales => "Sales",
            Field::Profit => "Profit",
            Field::OrderId => "Order ID",
            Field::DaysToShip => "Days to ship",
        }
    }

    pub fn column_type(self) -> ColumnType {
        match self {
            Field::Year => ColumnType::Int64,
            Field::Sales | Field::Profit | Field::DaysToShip => ColumnType::Float64,
            Field::Category | Field::ProductName | Field::OrderId => ColumnType::Str,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl FromStr for Field {
    type Err = ProcessorError;

    /// Accepts the CSV header ("Product Name") or a snake_case alias
    /// ("product_name"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Field::ALL
            .into_iter()
            .find(|f| normalize(f.header()) == wanted)
            .ok_or_else(|| ProcessorError::UnknownField(s.to_string()))
    }
}

fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c.to_ascii_lowercase() })
        .collect()
}

/// Columns that can be summed, averaged, or min/max'd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericField {
    Sales,
    Profit,
    DaysToShip,
}

/// Columns usable as a grouping key or for distinct counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyField {
    Year,
    Category,
    ProductName,
    OrderId,
}

impl From<NumericField> for Field {
    fn from(f: NumericField) -> Self {
        match f {
            NumericField::Sales => Field::Sales,
            NumericField::Profit => Field::Profit,
            NumericField::DaysToShip => Field::DaysToShip,
        }
    }
}

impl From<KeyField> for Field {
    fn from(f: KeyField) -> Self {
        match f {
            KeyField::Year => Field::Year,
            KeyField::Category => Field::Category,
            KeyField::ProductName => Field::ProductName,
            KeyField::OrderId => Field::OrderId,
        }
    }
}

impl TryFrom<Field> for NumericField {
    type Error = ProcessorError;

    fn try_from(f: Field) -> Result<Self, Self::Error> {
        match f {
            Field::Sales => Ok(NumericField::Sales),
            Field::Profit => Ok(NumericField::Profit),
            Field::DaysToShip => Ok(NumericField::DaysToShip),
            other => Err(ProcessorError::InvalidQuery(format!(
                "'{other}' is not a numeric column"
            ))),
        }
    }
}

impl TryFrom<Field> for KeyField {
    type Error = ProcessorError;

    fn try_from(f: Field) -> Result<Self, Self::Error> {
        match f {
            Field::Year => Ok(KeyField::Year),
            Field::Category => Ok(KeyField::Category),
            Field::ProductName => Ok(KeyField::ProductName),
            Field::OrderId => Ok(KeyField::OrderId),
            other => Err(ProcessorError::InvalidQuery(format!(
                "'{other}' cannot be used as a grouping key"
            ))),
        }
    }
}

impl FromStr for NumericField {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Field>()?.try_into()
    }
}

impl FromStr for KeyField {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Field>()?.try_into()
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Field::from(*self).fmt(f)
    }
}

impl fmt::Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Field::from(*self).fmt(f)
    }
}

/// Position of each schema field in a CSV header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    positions: [usize; 7],
    width: usize,
}

impl HeaderMap {
    /// Resolve the schema against the header cells. Extra columns are
    /// ignored; when a name repeats, the first occurrence wins.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Result<Self, ProcessorError> {
        let mut positions = [0usize; 7];
        for field in Field::ALL {
            positions[field.index()] = headers
                .iter()
                .position(|h| h.as_ref().trim() == field.header())
                .ok_or_else(|| ProcessorError::MissingColumn(field.header().to_string()))?;
        }
        Ok(HeaderMap {
            positions,
            width: headers.len(),
        })
    }

    pub fn position(&self, field: Field) -> usize {
        self.positions[field.index()]
    }

    /// Number of cells every data row must have.
    pub fn width(&self) -> usize {
        self.width
    }
}
