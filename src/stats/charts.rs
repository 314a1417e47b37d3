use crate::dataset::reader::format_float;
use crate::stats::columns::ColumnKind;
use crate::stats::pair::{Axis, PairData};
use crate::utils::{RefineryError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const HISTOGRAM_BINS: usize = 10;
pub const DENSITY_BINS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Scatter,
    Line,
    Bar,
    Histogram,
    Box,
    Violin,
    Heatmap,
    DensityContour,
    Pie,
    Sunburst,
    Treemap,
    ScatterMatrix,
}

pub const ALL_CHARTS: [ChartKind; 12] = [
    ChartKind::Scatter,
    ChartKind::Line,
    ChartKind::Bar,
    ChartKind::Histogram,
    ChartKind::Box,
    ChartKind::Violin,
    ChartKind::Heatmap,
    ChartKind::DensityContour,
    ChartKind::Pie,
    ChartKind::Sunburst,
    ChartKind::Treemap,
    ChartKind::ScatterMatrix,
];

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Line => "Line Chart",
            ChartKind::Bar => "Bar Chart",
            ChartKind::Histogram => "Histogram",
            ChartKind::Box => "Box Plot",
            ChartKind::Violin => "Violin Plot",
            ChartKind::Heatmap => "Heatmap",
            ChartKind::DensityContour => "Density Contour",
            ChartKind::Pie => "Pie Chart",
            ChartKind::Sunburst => "Sunburst Chart",
            ChartKind::Treemap => "Treemap",
            ChartKind::ScatterMatrix => "Scatter Matrix",
        };
        write!(f, "{}", name)
    }
}

impl ChartKind {
    pub fn is_compatible(self, x: ColumnKind, y: ColumnKind) -> bool {
        use ColumnKind::{Categorical as C, Numeric as N};
        match self {
            ChartKind::Pie | ChartKind::Sunburst | ChartKind::Treemap => x == C || y == C,
            ChartKind::Scatter | ChartKind::Line | ChartKind::ScatterMatrix => x == N && y == N,
            ChartKind::Box | ChartKind::Violin => {
                matches!((x, y), (N, N) | (C, N) | (N, C))
            }
            ChartKind::Heatmap => (x == C && y == C) || (x == N && y == N),
            ChartKind::Histogram => x == N || y == N,
            ChartKind::Bar | ChartKind::DensityContour => true,
        }
    }
}

pub fn compatible_charts(x: ColumnKind, y: ColumnKind) -> Vec<ChartKind> {
    ALL_CHARTS
        .into_iter()
        .filter(|c| c.is_compatible(x, y))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryValue {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoxSummary {
    /// `None` when the whole column forms a single box.
    pub group: Option<String>,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartData {
    Points {
        x_label: String,
        y_label: String,
        points: Vec<Point>,
    },
    Categories {
        label: String,
        value_label: String,
        categories: Vec<CategoryValue>,
    },
    Histogram {
        column: String,
        bins: Vec<Bin>,
    },
    Boxes {
        value_column: String,
        group_column: Option<String>,
        groups: Vec<BoxSummary>,
    },
    /// `counts[row][col]` with rows along y and columns along x.
    Grid {
        x_labels: Vec<String>,
        y_labels: Vec<String>,
        counts: Vec<Vec<usize>>,
    },
}

/// Linear-interpolation quantile of sorted data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn five_numbers(group: Option<String>, mut values: Vec<f64>) -> Option<BoxSummary> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    Some(BoxSummary {
        group,
        count: values.len(),
        min: values[0],
        q1: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q3: quantile(&values, 0.75),
        max: values[values.len() - 1],
    })
}

struct Binning {
    min: f64,
    width: f64,
    bins: usize,
}

impl Binning {
    fn new(values: &[f64], bins: usize) -> Option<Self> {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !min.is_finite() {
            return None;
        }
        if max == min {
            return Some(Self { min, width: 0.0, bins: 1 });
        }
        Some(Self {
            min,
            width: (max - min) / bins as f64,
            bins,
        })
    }

    /// The last bin is closed on the right.
    fn index(&self, value: f64) -> usize {
        if self.width == 0.0 {
            return 0;
        }
        (((value - self.min) / self.width) as usize).min(self.bins - 1)
    }

    fn bounds(&self, i: usize) -> (f64, f64) {
        let start = self.min + self.width * i as f64;
        (start, start + self.width)
    }

    fn label(&self, i: usize) -> String {
        let round = |v: f64| format_float((v * 100.0).round() / 100.0);
        let (start, end) = self.bounds(i);
        format!("{} - {}", round(start), round(end))
    }
}

fn counts_of(axis: &Axis) -> ChartData {
    ChartData::Categories {
        label: axis.name.clone(),
        value_label: "Count".to_string(),
        categories: axis
            .value_counts()
            .into_iter()
            .map(|(label, count)| CategoryValue {
                label,
                value: count as f64,
            })
            .collect(),
    }
}

fn mean_by_category(cat: &Axis, num: &Axis) -> ChartData {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for (label, value) in cat.values.iter().zip(&num.numbers) {
        if let Some(v) = value {
            let entry = sums.entry(label.as_str()).or_default();
            entry.0 += v;
            entry.1 += 1;
        }
    }
    ChartData::Categories {
        label: cat.name.clone(),
        value_label: format!("Mean({})", num.name),
        categories: sums
            .into_iter()
            .map(|(label, (sum, n))| CategoryValue {
                label: label.to_string(),
                value: sum / n as f64,
            })
            .collect(),
    }
}

fn histogram(axis: &Axis) -> ChartData {
    let values = axis.present_numbers();
    let bins = match Binning::new(&values, HISTOGRAM_BINS) {
        Some(binning) => {
            let mut counts = vec![0usize; binning.bins];
            for v in &values {
                counts[binning.index(*v)] += 1;
            }
            counts
                .into_iter()
                .enumerate()
                .map(|(i, count)| {
                    let (start, end) = binning.bounds(i);
                    Bin { start, end, count }
                })
                .collect()
        }
        None => Vec::new(),
    };
    ChartData::Histogram {
        column: axis.name.clone(),
        bins,
    }
}

fn boxes(group: Option<&Axis>, values: &Axis) -> ChartData {
    let groups = match group {
        Some(g) => {
            let mut by_group: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
            for (label, value) in g.values.iter().zip(&values.numbers) {
                if let Some(v) = value {
                    by_group.entry(label.as_str()).or_default().push(*v);
                }
            }
            by_group
                .into_iter()
                .filter_map(|(label, vals)| five_numbers(Some(label.to_string()), vals))
                .collect()
        }
        None => five_numbers(None, values.present_numbers()).into_iter().collect(),
    };
    ChartData::Boxes {
        value_column: values.name.clone(),
        group_column: group.map(|g| g.name.clone()),
        groups,
    }
}

/// Per-row grid cell for one axis: numeric axes are binned, others used as-is.
fn grid_axis(axis: &Axis) -> (Vec<Option<usize>>, Vec<String>) {
    if axis.is_numeric() {
        let Some(binning) = Binning::new(&axis.present_numbers(), DENSITY_BINS) else {
            return (vec![None; axis.len()], Vec::new());
        };
        let labels = (0..binning.bins).map(|i| binning.label(i)).collect();
        let cells = axis.numbers.iter().map(|v| v.map(|v| binning.index(v))).collect();
        return (cells, labels);
    }

    let labels: Vec<String> = axis
        .present_values()
        .into_iter()
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let cells = (0..axis.len())
        .map(|i| {
            if axis.is_missing(i) {
                return None;
            }
            labels.binary_search(&axis.values[i]).ok()
        })
        .collect();
    (cells, labels)
}

fn grid(pair: &PairData) -> ChartData {
    let (x_cells, x_labels) = grid_axis(&pair.x);
    let (y_cells, y_labels) = grid_axis(&pair.y);
    let mut counts = vec![vec![0usize; x_labels.len()]; y_labels.len()];

    for (x, y) in x_cells.iter().zip(&y_cells) {
        if let (Some(xi), Some(yi)) = (x, y) {
            counts[*yi][*xi] += 1;
        }
    }

    ChartData::Grid {
        x_labels,
        y_labels,
        counts,
    }
}

fn points(pair: &PairData, sort_by_x: bool) -> ChartData {
    let mut points: Vec<Point> = pair
        .numeric_pairs()
        .into_iter()
        .map(|(x, y)| Point { x, y })
        .collect();
    if sort_by_x {
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    ChartData::Points {
        x_label: pair.x.name.clone(),
        y_label: pair.y.name.clone(),
        points,
    }
}

/// Aggregates a prepared pair into the series a chart of `kind` plots.
pub fn chart_data(pair: &PairData, kind: ChartKind) -> Result<ChartData> {
    let (x, y) = (&pair.x, &pair.y);
    if !kind.is_compatible(x.kind, y.kind) {
        return Err(RefineryError::ValidationError(format!(
            "{} is not available for {} x {} columns",
            kind, x.kind, y.kind
        )));
    }

    let data = match kind {
        ChartKind::Scatter | ChartKind::ScatterMatrix => points(pair, false),
        ChartKind::Line => points(pair, true),
        ChartKind::Bar if x.is_categorical() && y.is_numeric() => mean_by_category(x, y),
        ChartKind::Bar => counts_of(x),
        ChartKind::Pie | ChartKind::Sunburst | ChartKind::Treemap => {
            counts_of(if x.is_categorical() { x } else { y })
        }
        ChartKind::Histogram => histogram(if x.is_numeric() { x } else { y }),
        ChartKind::Box | ChartKind::Violin => match (x.is_numeric(), y.is_numeric()) {
            (false, true) => boxes(Some(x), y),
            (true, false) => boxes(Some(y), x),
            _ => boxes(None, y),
        },
        ChartKind::Heatmap | ChartKind::DensityContour => grid(pair),
    };
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Table;
    use crate::stats::pair::{prepare_pair, PairOptions};

    fn survey() -> Table {
        let mut rows = vec![vec!["district".to_string(), "income".to_string(), "household".to_string()]];
        let data = [
            ("Kabul", "100", "1"),
            ("Kabul", "300", "2"),
            ("Herat", "200", "3"),
            ("Herat", "400", "4"),
            ("Kabul", "500", "5"),
            ("Herat", "600", "6"),
            ("Kabul", "700", "7"),
            ("Herat", "800", "8"),
            ("Kabul", "900", "9"),
            ("Kabul", "1000", "10"),
        ];
        for (d, i, h) in data {
            rows.push(vec![d.to_string(), i.to_string(), h.to_string()]);
        }
        Table::from_values(rows)
    }

    fn pair(x: &str, y: &str) -> PairData {
        prepare_pair(&survey(), x, y, PairOptions::default()).unwrap()
    }

    #[test]
    fn compatibility_rules() {
        use ColumnKind::*;
        let cat_num = compatible_charts(Categorical, Numeric);
        assert!(cat_num.contains(&ChartKind::Pie));
        assert!(cat_num.contains(&ChartKind::Box));
        assert!(!cat_num.contains(&ChartKind::Scatter));
        assert!(!cat_num.contains(&ChartKind::Heatmap));

        let text_text = compatible_charts(Text, Text);
        assert_eq!(text_text, vec![ChartKind::Bar, ChartKind::DensityContour]);

        assert_eq!(compatible_charts(Numeric, Numeric).len(), 9);
    }

    #[test]
    fn bar_means_by_category() {
        let data = chart_data(&pair("district", "income"), ChartKind::Bar).unwrap();
        let ChartData::Categories { value_label, categories, .. } = data else {
            panic!("expected categories");
        };
        assert_eq!(value_label, "Mean(income)");
        assert_eq!(categories[0].label, "Herat");
        assert_eq!(categories[0].value, 500.0);
        assert_eq!(categories[1].value, 3500.0 / 6.0);
    }

    #[test]
    fn pie_counts_the_categorical_axis() {
        let data = chart_data(&pair("income", "district"), ChartKind::Pie).unwrap();
        let ChartData::Categories { label, categories, .. } = data else {
            panic!("expected categories");
        };
        assert_eq!(label, "district");
        assert_eq!(categories[0].label, "Kabul");
        assert_eq!(categories[0].value, 6.0);
    }

    #[test]
    fn histogram_uses_ten_bins() {
        let data = chart_data(&pair("district", "income"), ChartKind::Histogram).unwrap();
        let ChartData::Histogram { column, bins } = data else {
            panic!("expected histogram");
        };
        assert_eq!(column, "income");
        assert_eq!(bins.len(), HISTOGRAM_BINS);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 10);
        assert_eq!(bins[9].count, 1);
    }

    #[test]
    fn box_groups_by_category_in_either_order() {
        let data = chart_data(&pair("income", "district"), ChartKind::Box).unwrap();
        let ChartData::Boxes { value_column, groups, .. } = data else {
            panic!("expected boxes");
        };
        assert_eq!(value_column, "income");
        let herat = &groups[0];
        assert_eq!(herat.group.as_deref(), Some("Herat"));
        assert_eq!((herat.min, herat.q1, herat.median, herat.q3, herat.max), (200.0, 350.0, 500.0, 650.0, 800.0));
    }

    #[test]
    fn line_points_sorted_and_density_grid() {
        let mut t = survey();
        t.rows.swap(0, 9);
        let p = prepare_pair(&t, "household", "income", PairOptions::default()).unwrap();

        let ChartData::Points { points, .. } = chart_data(&p, ChartKind::Line).unwrap() else {
            panic!("expected points");
        };
        assert_eq!(points[0], Point { x: 1.0, y: 100.0 });

        let ChartData::Grid { x_labels, counts, .. } = chart_data(&p, ChartKind::Heatmap).unwrap() else {
            panic!("expected grid");
        };
        assert_eq!(x_labels.len(), DENSITY_BINS);
        assert_eq!(counts.iter().flatten().sum::<usize>(), 10);
    }

    #[test]
    fn incompatible_chart_is_rejected() {
        assert!(chart_data(&pair("district", "income"), ChartKind::Scatter).is_err());
    }
}
