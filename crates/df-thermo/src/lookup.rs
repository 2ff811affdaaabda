//! One-dimensional lookup tables with optional log/exp transforms.
//!
//! Both columns are stored in transformed space; interpolation is linear there
//! and values are mapped back on the way out. Queries outside the tabulated
//! range extrapolate linearly from the boundary segment.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use df_core::SMALL;
use serde::{Deserialize, Serialize};

use crate::error::{ThermoError, ThermoResult};

const LN_10: f64 = std::f64::consts::LN_10;

/// Transform applied to a table column before interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableMod {
    #[default]
    None,
    Ln,
    Exp,
    Log10,
    Pow10,
}

impl TableMod {
    /// Real value -> stored value.
    pub fn apply(self, v: f64) -> f64 {
        match self {
            TableMod::None => v,
            TableMod::Ln => v.max(SMALL).ln(),
            TableMod::Exp => v.exp(),
            TableMod::Log10 => v.max(SMALL).log10(),
            TableMod::Pow10 => 10f64.powf(v),
        }
    }

    /// Stored value -> real value.
    pub fn invert(self, s: f64) -> f64 {
        match self {
            TableMod::None => s,
            TableMod::Ln => s.exp(),
            TableMod::Exp => s.max(SMALL).ln(),
            TableMod::Log10 => 10f64.powf(s),
            TableMod::Pow10 => s.max(SMALL).log10(),
        }
    }

    /// d(apply)/dv at real value `v`.
    fn d_apply(self, v: f64) -> f64 {
        match self {
            TableMod::None => 1.0,
            TableMod::Ln => 1.0 / v.max(SMALL),
            TableMod::Exp => v.exp(),
            TableMod::Log10 => 1.0 / (v.max(SMALL) * LN_10),
            TableMod::Pow10 => 10f64.powf(v) * LN_10,
        }
    }

    /// d²(apply)/dv² at real value `v`.
    fn d2_apply(self, v: f64) -> f64 {
        match self {
            TableMod::None => 0.0,
            TableMod::Ln => -1.0 / v.max(SMALL).powi(2),
            TableMod::Exp => v.exp(),
            TableMod::Log10 => -1.0 / (v.max(SMALL).powi(2) * LN_10),
            TableMod::Pow10 => 10f64.powf(v) * LN_10 * LN_10,
        }
    }

    /// d(invert)/ds at stored value `s`.
    fn d_invert(self, s: f64) -> f64 {
        match self {
            TableMod::None => 1.0,
            TableMod::Ln => s.exp(),
            TableMod::Exp => 1.0 / s.max(SMALL),
            TableMod::Log10 => 10f64.powf(s) * LN_10,
            TableMod::Pow10 => 1.0 / (s.max(SMALL) * LN_10),
        }
    }

    /// d²(invert)/ds² at stored value `s`.
    fn d2_invert(self, s: f64) -> f64 {
        match self {
            TableMod::None => 0.0,
            TableMod::Ln => s.exp(),
            TableMod::Exp => -1.0 / s.max(SMALL).powi(2),
            TableMod::Log10 => 10f64.powf(s) * LN_10 * LN_10,
            TableMod::Pow10 => -1.0 / (s.max(SMALL).powi(2) * LN_10),
        }
    }
}

impl FromStr for TableMod {
    type Err = ThermoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(TableMod::None),
            "ln" => Ok(TableMod::Ln),
            "exp" => Ok(TableMod::Exp),
            "log10" => Ok(TableMod::Log10),
            "pow10" => Ok(TableMod::Pow10),
            _ => Err(ThermoError::Table {
                what: "unknown table mod (expected none, ln, exp, log10 or pow10)",
            }),
        }
    }
}

impl fmt::Display for TableMod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableMod::None => "none",
            TableMod::Ln => "ln",
            TableMod::Exp => "exp",
            TableMod::Log10 => "log10",
            TableMod::Pow10 => "pow10",
        };
        f.write_str(name)
    }
}

/// Serialized form of a table: real-space columns plus transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub x: Vec<f64>,
    pub f: Vec<f64>,
    #[serde(default, rename = "mod")]
    pub f_mod: TableMod,
    #[serde(default)]
    pub x_mod: TableMod,
}

/// Piecewise-linear table f(x).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableData", into = "TableData")]
pub struct LookupTable1D {
    real_x: Vec<f64>,
    real_f: Vec<f64>,
    xs: Vec<f64>,
    fs: Vec<f64>,
    f_mod: TableMod,
    x_mod: TableMod,
    f_monotone: bool,
}

impl LookupTable1D {
    /// Build a table from real-space columns.
    pub fn new(x: Vec<f64>, f: Vec<f64>, f_mod: TableMod, x_mod: TableMod) -> ThermoResult<Self> {
        if x.len() != f.len() {
            return Err(ThermoError::Table {
                what: "x and f columns differ in length",
            });
        }
        if x.len() < 2 {
            return Err(ThermoError::Table {
                what: "at least two points are required",
            });
        }
        if x.iter().chain(&f).any(|v| !v.is_finite()) {
            return Err(ThermoError::Table {
                what: "non-finite table entry",
            });
        }

        let xs: Vec<f64> = x.iter().map(|&v| x_mod.apply(v)).collect();
        let fs: Vec<f64> = f.iter().map(|&v| f_mod.apply(v)).collect();
        if !strictly_monotone(&xs) {
            return Err(ThermoError::Table {
                what: "x column must be strictly monotone",
            });
        }
        let f_monotone = strictly_monotone(&fs);

        Ok(Self {
            real_x: x,
            real_f: f,
            xs,
            fs,
            f_mod,
            x_mod,
            f_monotone,
        })
    }

    /// Read a two-column (x, f) table.
    ///
    /// Columns may be separated by whitespace or commas. Blank lines and lines
    /// starting with `#` or `//` are skipped.
    pub fn from_file(path: impl AsRef<Path>, f_mod: TableMod, x_mod: TableMod) -> ThermoResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ThermoError::Io {
            message: format!("{}: {e}", path.display()),
        })?;
        let (x, f) = parse_columns(&text)?;
        tracing::debug!(path = %path.display(), points = x.len(), "loaded lookup table");
        Self::new(x, f, f_mod, x_mod)
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn f_mod(&self) -> TableMod {
        self.f_mod
    }

    pub fn x_mod(&self) -> TableMod {
        self.x_mod
    }

    /// Interpolated f at `x`.
    pub fn lookup(&self, x: f64) -> f64 {
        let xt = self.x_mod.apply(x);
        let i = bracket(&self.xs, xt);
        let w = (xt - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
        let ft = self.fs[i] + w * (self.fs[i + 1] - self.fs[i]);
        self.f_mod.invert(ft)
    }

    /// x such that `lookup(x) == f`. Requires a strictly monotone f column.
    pub fn reverse_lookup(&self, f: f64) -> ThermoResult<f64> {
        if !self.f_monotone {
            return Err(ThermoError::Table {
                what: "reverse lookup requires a strictly monotone f column",
            });
        }
        let ft = self.f_mod.apply(f);
        let i = bracket(&self.fs, ft);
        let w = (ft - self.fs[i]) / (self.fs[i + 1] - self.fs[i]);
        let xt = self.xs[i] + w * (self.xs[i + 1] - self.xs[i]);
        Ok(self.x_mod.invert(xt))
    }

    /// df/dx of the interpolant at `x`.
    pub fn dfdx(&self, x: f64) -> f64 {
        let xt = self.x_mod.apply(x);
        let i = bracket(&self.xs, xt);
        let slope = self.slope(i);
        let ft = self.fs[i] + slope * (xt - self.xs[i]);
        self.f_mod.d_invert(ft) * slope * self.x_mod.d_apply(x)
    }

    /// d²f/dx² at `x`.
    ///
    /// The transformed-space curvature is the slope difference of the segments
    /// adjacent to the node nearest `x`; it is zero for a two-point table.
    pub fn d2fdx2(&self, x: f64) -> f64 {
        let xt = self.x_mod.apply(x);
        let i = bracket(&self.xs, xt);
        let slope = self.slope(i);
        let ft = self.fs[i] + slope * (xt - self.xs[i]);

        let n = self.xs.len();
        let curvature = if n < 3 {
            0.0
        } else {
            let nearest = if (xt - self.xs[i]).abs() <= (self.xs[i + 1] - xt).abs() {
                i
            } else {
                i + 1
            };
            let k = nearest.clamp(1, n - 2);
            (self.slope(k) - self.slope(k - 1)) / (0.5 * (self.xs[k + 1] - self.xs[k - 1]))
        };

        let dx = self.x_mod.d_apply(x);
        let d2x = self.x_mod.d2_apply(x);
        let dft = slope * dx;
        let d2ft = curvature * dx * dx + slope * d2x;
        self.f_mod.d2_invert(ft) * dft * dft + self.f_mod.d_invert(ft) * d2ft
    }

    fn slope(&self, i: usize) -> f64 {
        (self.fs[i + 1] - self.fs[i]) / (self.xs[i + 1] - self.xs[i])
    }
}

impl TryFrom<TableData> for LookupTable1D {
    type Error = ThermoError;

    fn try_from(data: TableData) -> Result<Self, Self::Error> {
        Self::new(data.x, data.f, data.f_mod, data.x_mod)
    }
}

impl From<LookupTable1D> for TableData {
    fn from(table: LookupTable1D) -> Self {
        TableData {
            x: table.real_x,
            f: table.real_f,
            f_mod: table.f_mod,
            x_mod: table.x_mod,
        }
    }
}

fn strictly_monotone(v: &[f64]) -> bool {
    v.windows(2).all(|w| w[1] > w[0]) || v.windows(2).all(|w| w[1] < w[0])
}

/// Index `i` of the segment `[v[i], v[i+1]]` to use for `target`, clamped to
/// the boundary segments for extrapolation.
fn bracket(v: &[f64], target: f64) -> usize {
    let n = v.len();
    let idx = if v[n - 1] > v[0] {
        v.partition_point(|&a| a <= target)
    } else {
        v.partition_point(|&a| a >= target)
    };
    idx.saturating_sub(1).min(n - 2)
}

fn parse_columns(text: &str) -> ThermoResult<(Vec<f64>, Vec<f64>)> {
    let mut x = Vec::new();
    let mut f = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        let mut tokens = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty());
        let (Some(a), Some(b)) = (tokens.next(), tokens.next()) else {
            return Err(ThermoError::Table {
                what: "expected two columns per row",
            });
        };
        let parse = |t: &str| {
            t.parse::<f64>().map_err(|_| ThermoError::Table {
                what: "unparseable table value",
            })
        };
        x.push(parse(a)?);
        f.push(parse(b)?);
    }
    Ok((x, f))
}
