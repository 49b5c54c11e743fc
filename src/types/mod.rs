pub mod chart;

pub use chart::{ChartSeries, ChartSource};
