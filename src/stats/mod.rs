//! Column typing, summary statistics and chart series for two-column exploration.

pub mod charts;
pub mod columns;
pub mod operations;
pub mod pair;

pub use charts::{
    chart_data, compatible_charts, Bin, BoxSummary, CategoryValue, ChartData, ChartKind, Point,
};
pub use columns::{column_kinds, detect_column_kind, to_numeric, ColumnKind};
pub use operations::{
    available_operations, calculate, linear_regression, Operation, OperationValue, Regression,
};
pub use pair::{prepare_pair, Axis, PairData, PairOptions, DEFAULT_TOP_N};
