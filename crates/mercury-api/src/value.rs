// ── Loosely typed switch values ──
//
// The vendor client scrapes the switch's management pages, so a value
// may arrive as text, a boolean, an integer, or a float depending on the
// field and the firmware. `SwitchValue` keeps that shape intact; typed
// interpretation happens downstream in the projection layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

/// One raw value from a switch state fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(untagged)]
#[strum(serialize_all = "snake_case")]
pub enum SwitchValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SwitchValue {
    /// Short name of the value's shape (`"bool"`, `"int"`, `"float"`, `"text"`).
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of the value.
    ///
    /// Integral floats and text holding a decimal integer are accepted;
    /// booleans and fractional floats are not.
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for SwitchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for SwitchValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for SwitchValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for SwitchValue {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for SwitchValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<String> for SwitchValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for SwitchValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}
