use crate::stats::columns::ColumnKind;
use crate::stats::pair::{Axis, PairData};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Count,
    UniqueCount,
    Mode,
    Sum,
    Mean,
    Median,
    Min,
    Max,
    StdDeviation,
    Range,
    Skewness,
    Kurtosis,
    Correlation,
    LinearRegression,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Count => "Count",
            Operation::UniqueCount => "Unique Count",
            Operation::Mode => "Mode",
            Operation::Sum => "Sum",
            Operation::Mean => "Mean",
            Operation::Median => "Median",
            Operation::Min => "Min",
            Operation::Max => "Max",
            Operation::StdDeviation => "Std Deviation",
            Operation::Range => "Range",
            Operation::Skewness => "Skewness",
            Operation::Kurtosis => "Kurtosis",
            Operation::Correlation => "Correlation",
            Operation::LinearRegression => "Linear Regression",
        };
        write!(f, "{}", name)
    }
}

const NUMERIC_OPERATIONS: [Operation; 9] = [
    Operation::Sum,
    Operation::Mean,
    Operation::Median,
    Operation::Min,
    Operation::Max,
    Operation::StdDeviation,
    Operation::Range,
    Operation::Skewness,
    Operation::Kurtosis,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OperationValue {
    Number(f64),
    Text(String),
    Missing,
}

impl OperationValue {
    /// Non-finite results are reported as missing.
    fn number(value: f64) -> Self {
        if value.is_finite() {
            OperationValue::Number(value)
        } else {
            OperationValue::Missing
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OperationValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

pub fn available_operations(x: ColumnKind, y: ColumnKind) -> Vec<Operation> {
    let mut ops = vec![Operation::Count, Operation::UniqueCount, Operation::Mode];
    if x == ColumnKind::Numeric || y == ColumnKind::Numeric {
        ops.extend(NUMERIC_OPERATIONS);
    }
    if x == ColumnKind::Numeric && y == ColumnKind::Numeric {
        ops.push(Operation::Correlation);
        ops.push(Operation::LinearRegression);
    }
    ops
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let v = sorted(values);
    let n = v.len();
    match n {
        0 => f64::NAN,
        _ if n % 2 == 1 => v[n / 2],
        _ => (v[n / 2 - 1] + v[n / 2]) / 2.0,
    }
}

/// Sum of `(x - mean)^k`.
fn central_sum(values: &[f64], k: i32) -> f64 {
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(k)).sum()
}

fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    (central_sum(values, 2) / (n - 1) as f64).sqrt()
}

/// Adjusted Fisher-Pearson skewness.
fn skewness(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 3 {
        return f64::NAN;
    }
    let m2 = central_sum(values, 2) / n;
    if m2 == 0.0 {
        return 0.0;
    }
    let m3 = central_sum(values, 3) / n;
    (n * (n - 1.0)).sqrt() / (n - 2.0) * m3 / m2.powf(1.5)
}

/// Bias-corrected excess kurtosis.
fn kurtosis(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 4 {
        return f64::NAN;
    }
    let s2 = central_sum(values, 2);
    if s2 == 0.0 {
        return 0.0;
    }
    let s4 = central_sum(values, 4);
    let denom = (n - 2.0) * (n - 3.0);
    (n + 1.0) * n * (n - 1.0) * s4 / (denom * s2 * s2) - 3.0 * (n - 1.0).powi(2) / denom
}

fn mode_number(values: &[f64]) -> Option<f64> {
    let v = sorted(values);
    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < v.len() {
        let run = v[i..].iter().take_while(|x| **x == v[i]).count();
        if best.map_or(true, |(_, c)| run > c) {
            best = Some((v[i], run));
        }
        i += run;
    }
    best.map(|(x, _)| x)
}

fn mode_text(values: &[&str]) -> Option<String> {
    let mut v = values.to_vec();
    v.sort_unstable();
    let mut best: Option<(&str, usize)> = None;
    let mut i = 0;
    while i < v.len() {
        let run = v[i..].iter().take_while(|x| **x == v[i]).count();
        if best.map_or(true, |(_, c)| run > c) {
            best = Some((v[i], run));
        }
        i += run;
    }
    best.map(|(s, _)| s.to_string())
}

fn unique_count(axis: &Axis) -> usize {
    if axis.is_numeric() {
        let mut v = sorted(&axis.present_numbers());
        v.dedup();
        v.len()
    } else {
        let mut v = axis.present_values();
        v.sort_unstable();
        v.dedup();
        v.len()
    }
}

fn mode(axis: &Axis) -> OperationValue {
    let found = if axis.is_numeric() {
        mode_number(&axis.present_numbers()).map(OperationValue::Number)
    } else {
        mode_text(&axis.present_values()).map(OperationValue::Text)
    };
    found.unwrap_or(OperationValue::Missing)
}

fn numeric_operation(op: Operation, values: &[f64]) -> (&'static str, f64) {
    let min = || values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = || values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    match op {
        Operation::Sum => ("Sum", values.iter().sum()),
        Operation::Mean => ("Mean", mean(values)),
        Operation::Median => ("Median", median(values)),
        Operation::Min => ("Min", min()),
        Operation::Max => ("Max", max()),
        Operation::StdDeviation => ("Std", sample_std(values)),
        Operation::Range => ("Range", max() - min()),
        Operation::Skewness => ("Skew", skewness(values)),
        Operation::Kurtosis => ("Kurt", kurtosis(values)),
        _ => ("", f64::NAN),
    }
}

fn pearson(pairs: &[(f64, f64)]) -> f64 {
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.iter().copied().unzip();
    let (mx, my) = (mean(&xs), mean(&ys));
    let sxy: f64 = pairs.iter().map(|(x, y)| (x - mx) * (y - my)).sum();
    let sxx = central_sum(&xs, 2);
    let syy = central_sum(&ys, 2);
    sxy / (sxx * syy).sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub p_value: f64,
}

/// Least-squares fit with a two-sided t-test on the slope (n - 2 degrees of freedom).
pub fn linear_regression(pairs: &[(f64, f64)]) -> Result<Regression, String> {
    let n = pairs.len();
    let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.iter().copied().unzip();
    let (mx, my) = (mean(&xs), mean(&ys));
    let sxx = central_sum(&xs, 2);
    if sxx == 0.0 {
        return Err("Cannot calculate a linear regression if all x values are identical".to_string());
    }
    let syy = central_sum(&ys, 2);
    let sxy: f64 = pairs.iter().map(|(x, y)| (x - mx) * (y - my)).sum();

    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    let r = if syy == 0.0 {
        0.0
    } else {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    };

    let p_value = if n == 2 {
        if ys[0] == ys[1] {
            1.0
        } else {
            0.0
        }
    } else if r.abs() == 1.0 {
        0.0
    } else {
        let df = (n - 2) as f64;
        let t = r * (df / ((1.0 - r) * (1.0 + r))).sqrt();
        incomplete_beta(df / 2.0, 0.5, df / (df + t * t))
    };

    Ok(Regression {
        slope,
        intercept,
        r_squared: r * r,
        p_value,
    })
}

fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        0.120_865_097_386_617_9e-2,
        -0.539_523_938_495_3e-5,
    ];
    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut series = 1.000_000_000_190_015;
    for c in COEFFS {
        y += 1.0;
        series += c / y;
    }
    -tmp + (2.506_628_274_631_000_5 * series / x).ln()
}

/// Continued fraction for the incomplete beta function (modified Lentz).
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 3.0e-14;
    const FPMIN: f64 = 1.0e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < FPMIN {
        d = FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Regularized incomplete beta `I_x(a, b)`.
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let front = (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln()).exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Runs the selected operations over a prepared pair. Results keep selection order.
pub fn calculate(pair: &PairData, operations: &[Operation]) -> Vec<(String, OperationValue)> {
    let mut results = Vec::new();
    let axes = [&pair.x, &pair.y];
    let both_numeric = pair.x.is_numeric() && pair.y.is_numeric();

    for &op in operations {
        match op {
            Operation::Count => results.push((
                "Count(rows)".to_string(),
                OperationValue::Number(pair.row_count() as f64),
            )),
            Operation::UniqueCount => {
                for axis in axes {
                    results.push((
                        format!("Unique({})", axis.name),
                        OperationValue::Number(unique_count(axis) as f64),
                    ));
                }
            }
            Operation::Mode => {
                for axis in axes {
                    results.push((format!("Mode({})", axis.name), mode(axis)));
                }
            }
            Operation::Correlation if both_numeric => {
                results.push((
                    "Correlation(X,Y)".to_string(),
                    OperationValue::number(pearson(&pair.numeric_pairs())),
                ));
            }
            Operation::LinearRegression if both_numeric => {
                let pairs = pair.numeric_pairs();
                if pairs.len() < 2 {
                    results.push((
                        "Linear Regression".to_string(),
                        OperationValue::Text("Not enough data".to_string()),
                    ));
                    continue;
                }
                match linear_regression(&pairs) {
                    Ok(fit) => {
                        results.push(("Slope".to_string(), OperationValue::number(fit.slope)));
                        results.push(("Intercept".to_string(), OperationValue::number(fit.intercept)));
                        results.push(("R-squared".to_string(), OperationValue::number(fit.r_squared)));
                        results.push(("P-value".to_string(), OperationValue::number(fit.p_value)));
                    }
                    Err(e) => results.push((format!("{} (error)", op), OperationValue::Text(e))),
                }
            }
            Operation::Correlation | Operation::LinearRegression => {}
            _ => {
                for axis in axes.iter().filter(|a| a.is_numeric()) {
                    let values = axis.present_numbers();
                    let (label, value) = numeric_operation(op, &values);
                    let value = if values.is_empty() { f64::NAN } else { value };
                    results.push((format!("{}({})", label, axis.name), OperationValue::number(value)));
                }
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Table;
    use crate::stats::pair::{prepare_pair, PairOptions};

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    fn numeric_pair(xs: &[f64], ys: &[f64]) -> PairData {
        let mut rows = vec![vec!["x".to_string(), "y".to_string()]];
        for (x, y) in xs.iter().zip(ys) {
            rows.push(vec![x.to_string(), y.to_string()]);
        }
        prepare_pair(&Table::from_values(rows), "x", "y", PairOptions::default()).unwrap()
    }

    fn lookup<'a>(results: &'a [(String, OperationValue)], label: &str) -> &'a OperationValue {
        &results.iter().find(|(l, _)| l == label).unwrap().1
    }

    #[test]
    fn availability_depends_on_kinds() {
        let cat_only = available_operations(ColumnKind::Categorical, ColumnKind::Text);
        assert_eq!(cat_only.len(), 3);
        let mixed = available_operations(ColumnKind::Categorical, ColumnKind::Numeric);
        assert!(mixed.contains(&Operation::Kurtosis));
        assert!(!mixed.contains(&Operation::Correlation));
        let numeric = available_operations(ColumnKind::Numeric, ColumnKind::Numeric);
        assert_eq!(numeric.last(), Some(&Operation::LinearRegression));
    }

    #[test]
    fn descriptive_statistics() {
        let pair = numeric_pair(&[1.0, 2.0, 3.0, 4.0, 10.0], &[2.0, 2.0, 3.0, 5.0, 1.0]);
        let ops = [
            Operation::Sum,
            Operation::Mean,
            Operation::Median,
            Operation::StdDeviation,
            Operation::Range,
            Operation::Skewness,
            Operation::Kurtosis,
            Operation::Mode,
        ];
        let r = calculate(&pair, &ops);

        assert_eq!(lookup(&r, "Sum(x)").as_f64(), Some(20.0));
        assert_eq!(lookup(&r, "Mean(x)").as_f64(), Some(4.0));
        assert_eq!(lookup(&r, "Median(y)").as_f64(), Some(2.0));
        assert!(close(lookup(&r, "Std(x)").as_f64().unwrap(), 3.535_533_9, 1e-6));
        assert_eq!(lookup(&r, "Range(x)").as_f64(), Some(9.0));
        assert!(close(lookup(&r, "Skew(x)").as_f64().unwrap(), 1.697_056, 1e-5));
        assert!(close(lookup(&r, "Kurt(x)").as_f64().unwrap(), 3.152, 1e-9));
        assert_eq!(lookup(&r, "Mode(x)"), &OperationValue::Number(1.0));
        assert_eq!(lookup(&r, "Mode(y)"), &OperationValue::Number(2.0));
    }

    #[test]
    fn small_samples_are_missing() {
        let pair = numeric_pair(&[1.0, 2.0], &[3.0, 4.0]);
        let r = calculate(&pair, &[Operation::Skewness, Operation::Kurtosis]);
        assert!(r.iter().all(|(_, v)| *v == OperationValue::Missing));
    }

    #[test]
    fn correlation_and_regression() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [2.0, 4.0, 5.0, 4.0, 5.0];
        let pair = numeric_pair(&xs, &ys);
        let r = calculate(&pair, &[Operation::Correlation, Operation::LinearRegression]);

        assert!(close(lookup(&r, "Correlation(X,Y)").as_f64().unwrap(), 0.774_596_7, 1e-6));
        assert!(close(lookup(&r, "Slope").as_f64().unwrap(), 0.6, 1e-9));
        assert!(close(lookup(&r, "Intercept").as_f64().unwrap(), 2.2, 1e-9));
        assert!(close(lookup(&r, "R-squared").as_f64().unwrap(), 0.6, 1e-9));
        assert!(close(lookup(&r, "P-value").as_f64().unwrap(), 0.124_027_1, 1e-6));
    }

    #[test]
    fn regression_edge_cases() {
        let fit = linear_regression(&[(1.0, 1.0), (2.0, 3.0)]).unwrap();
        assert_eq!(fit.p_value, 0.0);
        assert!(linear_regression(&[(1.0, 1.0), (1.0, 3.0), (1.0, 2.0)]).is_err());

        let pair = numeric_pair(&[1.0], &[1.0]);
        let r = calculate(&pair, &[Operation::LinearRegression]);
        assert_eq!(
            r,
            vec![(
                "Linear Regression".to_string(),
                OperationValue::Text("Not enough data".to_string())
            )]
        );
    }

    #[test]
    fn categorical_counts() {
        let t = Table::from_values(vec![
            vec!["district".into(), "consent".into()],
            vec!["Kabul".into(), "yes".into()],
            vec!["Herat".into(), "no".into()],
            vec!["Kabul".into(), "yes".into()],
            vec!["Herat".into(), "yes".into()],
        ]);
        let pair = prepare_pair(&t, "district", "consent", PairOptions::default()).unwrap();
        let r = calculate(&pair, &[Operation::Count, Operation::UniqueCount, Operation::Mode, Operation::Sum]);

        assert_eq!(lookup(&r, "Count(rows)").as_f64(), Some(4.0));
        assert_eq!(lookup(&r, "Unique(district)").as_f64(), Some(2.0));
        assert_eq!(lookup(&r, "Mode(district)"), &OperationValue::Text("Herat".into()));
        assert_eq!(lookup(&r, "Mode(consent)"), &OperationValue::Text("yes".into()));
        assert!(!r.iter().any(|(l, _)| l.starts_with("Sum")));
    }
}
