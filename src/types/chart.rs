use serde::Serialize;
use serde_json::{Number, Value};
use std::str::FromStr;

use crate::db::Record;
use crate::db::queries::{CHART_FINANCIAL, CHART_INVENTORY, CHART_ORDERS, CHART_PAYMENTS};
use crate::error::AdminError;

/// The fixed set of chart data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartSource {
    Inventory,
    Orders,
    Payments,
    Financial,
}

impl ChartSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartSource::Inventory => "inventory",
            ChartSource::Orders => "orders",
            ChartSource::Payments => "payments",
            ChartSource::Financial => "financial",
        }
    }

    pub fn query(self) -> &'static str {
        match self {
            ChartSource::Inventory => CHART_INVENTORY,
            ChartSource::Orders => CHART_ORDERS,
            ChartSource::Payments => CHART_PAYMENTS,
            ChartSource::Financial => CHART_FINANCIAL,
        }
    }

    /// "inventory" -> "Inventory Data"
    pub fn title(self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => format!("{}{} Data", first.to_uppercase(), chars.as_str()),
            None => " Data".to_string(),
        }
    }
}

impl FromStr for ChartSource {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inventory" => Ok(ChartSource::Inventory),
            "orders" => Ok(ChartSource::Orders),
            "payments" => Ok(ChartSource::Payments),
            "financial" => Ok(ChartSource::Financial),
            other => Err(AdminError::InvalidSource(other.to_string())),
        }
    }
}

/// Parallel label/value sequences for one chart.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<Value>,
    pub values: Vec<Value>,
    pub label: String,
}

impl ChartSeries {
    /// Project `label`/`value` columns in row order.
    pub fn from_rows(source: ChartSource, rows: &[Record]) -> Self {
        let labels = rows
            .iter()
            .map(|row| row.get("label").cloned().unwrap_or(Value::Null))
            .collect();
        let values = rows
            .iter()
            .map(|row| plot_value(row.get("value").cloned().unwrap_or(Value::Null)))
            .collect();
        Self {
            labels,
            values,
            label: source.title(),
        }
    }
}

/// Sums over DECIMAL columns arrive as exact text; charts plot them as numbers.
fn plot_value(value: Value) -> Value {
    let Value::String(text) = &value else {
        return value;
    };
    if let Ok(i) = text.parse::<i64>() {
        return Value::from(i);
    }
    match text.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(n) => Value::Number(n),
        None => value,
    }
}
