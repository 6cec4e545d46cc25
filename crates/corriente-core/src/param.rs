//! Parameter declaration, constraint parsing, and validated binding.
//!
//! Algorithms declare their parameters as [`ParamSpec`]s: a name, a
//! human-readable description, a constraint string, and a default. Constraint
//! strings are either numeric ranges with open/closed bounds (`"(0,inf)"`,
//! `"[0,1]"`) or enumerated literal sets (`"{hann,hamming,square}"`).
//!
//! [`Parameters::bind`] merges caller overrides over the declared defaults and
//! validates every value against its constraint *before* returning, so a
//! failed `configure()` never leaves an algorithm half-reconfigured.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::CoreError;
use crate::types::Real;

/// A dynamically typed parameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// Scalar real value.
    Real(Real),
    /// Integer value (frame sizes, counts).
    Int(i64),
    /// Boolean flag.
    Bool(bool),
    /// String literal (typically matched against an enumeration constraint).
    Str(String),
    /// Vector of reals (filter coefficients, weights).
    VectorReal(Vec<Real>),
}

impl ParamValue {
    /// Returns a short name for the stored type, used in error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            ParamValue::Real(_) => "real",
            ParamValue::Int(_) => "int",
            ParamValue::Bool(_) => "bool",
            ParamValue::Str(_) => "string",
            ParamValue::VectorReal(_) => "vector_real",
        }
    }

    /// Returns the value as a float, coercing integers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Real(v) => Some(f64::from(*v)),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Real(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Str(v) => write!(f, "{v}"),
            ParamValue::VectorReal(v) => write!(f, "vector of {} reals", v.len()),
        }
    }
}

impl From<Real> for ParamValue {
    fn from(v: Real) -> Self {
        ParamValue::Real(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(i64::from(v))
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

impl From<Vec<Real>> for ParamValue {
    fn from(v: Vec<Real>) -> Self {
        ParamValue::VectorReal(v)
    }
}

/// Declaration of a single algorithm parameter.
#[derive(Clone, Debug)]
pub struct ParamSpec {
    /// Parameter name as accepted by `configure()`.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Constraint string: `""` (unconstrained), a range, or an enumeration.
    pub constraint: &'static str,
    /// Default value applied when the caller does not override.
    pub default: ParamValue,
}

impl ParamSpec {
    /// Creates a parameter declaration.
    pub fn new(
        name: &'static str,
        description: &'static str,
        constraint: &'static str,
        default: impl Into<ParamValue>,
    ) -> Self {
        Self {
            name,
            description,
            constraint,
            default: default.into(),
        }
    }
}

/// A parsed parameter constraint.
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    /// Any value of the declared type is accepted.
    Any,
    /// Numeric interval; each bound may be open or closed, `inf` allowed.
    Range {
        /// Lower bound (may be `-inf`).
        min: f64,
        /// Upper bound (may be `inf`).
        max: f64,
        /// True if the lower bound is excluded.
        min_open: bool,
        /// True if the upper bound is excluded.
        max_open: bool,
    },
    /// Closed set of accepted string literals.
    Enumeration(Vec<String>),
}

impl Constraint {
    /// Parses a constraint string.
    ///
    /// Accepted forms: `""` (any), `"{a,b,c}"`, and interval syntax with `(`
    /// / `[` bounds and `inf` / `-inf` endpoints, e.g. `"(0,inf)"`, `"[0,1]"`.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Constraint::Any);
        }
        if let Some(inner) = s.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
            let items: Vec<String> = inner
                .split(',')
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty())
                .collect();
            if items.is_empty() {
                return Err(CoreError::InvalidConstraint {
                    constraint: s.to_string(),
                    reason: "empty enumeration".to_string(),
                });
            }
            return Ok(Constraint::Enumeration(items));
        }

        let min_open = if s.starts_with('(') {
            true
        } else if s.starts_with('[') {
            false
        } else {
            return Err(CoreError::InvalidConstraint {
                constraint: s.to_string(),
                reason: "expected '(', '[' or '{'".to_string(),
            });
        };
        let max_open = if s.ends_with(')') {
            true
        } else if s.ends_with(']') {
            false
        } else {
            return Err(CoreError::InvalidConstraint {
                constraint: s.to_string(),
                reason: "expected ')' or ']'".to_string(),
            });
        };

        let inner = &s[1..s.len() - 1];
        let (lo, hi) = inner.split_once(',').ok_or_else(|| CoreError::InvalidConstraint {
            constraint: s.to_string(),
            reason: "expected two comma-separated bounds".to_string(),
        })?;
        let min = parse_bound(lo, s)?;
        let max = parse_bound(hi, s)?;
        if min > max {
            return Err(CoreError::InvalidConstraint {
                constraint: s.to_string(),
                reason: "lower bound exceeds upper bound".to_string(),
            });
        }
        Ok(Constraint::Range {
            min,
            max,
            min_open,
            max_open,
        })
    }

    /// Returns true if `value` satisfies this constraint.
    pub fn permits(&self, value: &ParamValue) -> bool {
        match self {
            Constraint::Any => true,
            Constraint::Range {
                min,
                max,
                min_open,
                max_open,
            } => {
                let Some(v) = value.as_number() else {
                    return false;
                };
                let lo_ok = if *min_open { v > *min } else { v >= *min };
                let hi_ok = if *max_open { v < *max } else { v <= *max };
                lo_ok && hi_ok
            }
            Constraint::Enumeration(items) => match value {
                ParamValue::Str(s) => items.iter().any(|i| i == s),
                _ => false,
            },
        }
    }
}

fn parse_bound(raw: &str, whole: &str) -> Result<f64, CoreError> {
    let raw = raw.trim();
    match raw {
        "inf" | "+inf" => Ok(f64::INFINITY),
        "-inf" => Ok(f64::NEG_INFINITY),
        _ => raw.parse::<f64>().map_err(|_| CoreError::InvalidConstraint {
            constraint: whole.to_string(),
            reason: format!("unparseable bound '{raw}'"),
        }),
    }
}

/// An ordered name → value map passed to `configure()`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parameters {
    values: BTreeMap<String, ParamValue>,
}

impl Parameters {
    /// Creates an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Returns a value by name, if present.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Returns true if no values are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over (name, value) pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merges `overrides` over declared defaults and validates the result.
    ///
    /// Every override name must be declared in `specs`, and every resulting
    /// value must satisfy its constraint. On error nothing is returned, so the
    /// caller's state is untouched (atomic configure).
    pub fn bind(
        specs: &[ParamSpec],
        overrides: &Parameters,
        algorithm: &str,
    ) -> Result<Parameters, CoreError> {
        for name in overrides.values.keys() {
            if !specs.iter().any(|s| s.name == name) {
                return Err(CoreError::UnknownParameter {
                    algorithm: algorithm.to_string(),
                    name: name.clone(),
                });
            }
        }

        let mut bound = Parameters::new();
        for spec in specs {
            let value = overrides
                .values
                .get(spec.name)
                .cloned()
                .unwrap_or_else(|| spec.default.clone());
            let constraint = Constraint::parse(spec.constraint)?;
            if !constraint.permits(&value) {
                return Err(CoreError::ParameterOutOfRange {
                    name: spec.name.to_string(),
                    constraint: spec.constraint.to_string(),
                    value: value.to_string(),
                });
            }
            bound.values.insert(spec.name.to_string(), value);
        }
        Ok(bound)
    }

    /// Returns a real parameter, coercing integers.
    pub fn real(&self, name: &str) -> Result<Real, CoreError> {
        match self.values.get(name) {
            Some(v) => v.as_number().map(|n| n as Real).ok_or_else(|| {
                CoreError::ParameterTypeMismatch {
                    name: name.to_string(),
                    expected: "real",
                    found: v.kind(),
                }
            }),
            None => Err(CoreError::MissingValue {
                name: name.to_string(),
            }),
        }
    }

    /// Returns an integer parameter.
    pub fn int(&self, name: &str) -> Result<i64, CoreError> {
        match self.values.get(name) {
            Some(ParamValue::Int(v)) => Ok(*v),
            Some(v) => Err(CoreError::ParameterTypeMismatch {
                name: name.to_string(),
                expected: "int",
                found: v.kind(),
            }),
            None => Err(CoreError::MissingValue {
                name: name.to_string(),
            }),
        }
    }

    /// Returns a boolean parameter.
    pub fn bool(&self, name: &str) -> Result<bool, CoreError> {
        match self.values.get(name) {
            Some(ParamValue::Bool(v)) => Ok(*v),
            Some(v) => Err(CoreError::ParameterTypeMismatch {
                name: name.to_string(),
                expected: "bool",
                found: v.kind(),
            }),
            None => Err(CoreError::MissingValue {
                name: name.to_string(),
            }),
        }
    }

    /// Returns a string parameter.
    pub fn str(&self, name: &str) -> Result<&str, CoreError> {
        match self.values.get(name) {
            Some(ParamValue::Str(v)) => Ok(v),
            Some(v) => Err(CoreError::ParameterTypeMismatch {
                name: name.to_string(),
                expected: "string",
                found: v.kind(),
            }),
            None => Err(CoreError::MissingValue {
                name: name.to_string(),
            }),
        }
    }

    /// Returns a vector-of-reals parameter.
    pub fn vector_real(&self, name: &str) -> Result<&[Real], CoreError> {
        match self.values.get(name) {
            Some(ParamValue::VectorReal(v)) => Ok(v),
            Some(v) => Err(CoreError::ParameterTypeMismatch {
                name: name.to_string(),
                expected: "vector_real",
                found: v.kind(),
            }),
            None => Err(CoreError::MissingValue {
                name: name.to_string(),
            }),
        }
    }
}
