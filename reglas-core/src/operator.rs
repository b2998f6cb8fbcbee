//! Rule comparison operators and the range value format.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

/// `number-number`, whitespace tolerant.
static RANGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[0-9]+\s*-\s*[0-9]+\s*$").expect("range pattern is valid"));

/// Comparison applied between a factor and a rule's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operador {
    #[default]
    Eq,
    Le,
    Ge,
    /// Value holds a `low-high` range.
    Range,
}

impl Operador {
    pub const ALL: [Operador; 4] = [Operador::Eq, Operador::Le, Operador::Ge, Operador::Range];

    pub fn as_str(self) -> &'static str {
        match self {
            Operador::Eq => "=",
            Operador::Le => "<=",
            Operador::Ge => ">=",
            Operador::Range => "range",
        }
    }

    /// Human label for selection controls.
    pub fn label(self) -> &'static str {
        match self {
            Operador::Eq => "= (igual)",
            Operador::Le => "<= (menor o igual)",
            Operador::Ge => ">= (mayor o igual)",
            Operador::Range => "rango (x-y)",
        }
    }

    /// Operator string sent to the server.
    pub fn wire(self, encoding: RangeEncoding) -> &'static str {
        match (self, encoding) {
            (Operador::Range, RangeEncoding::Equals) => Operador::Eq.as_str(),
            (op, _) => op.as_str(),
        }
    }

    /// Next operator in selection order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|op| *op == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|op| *op == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Operador {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operador {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" | "==" => Ok(Operador::Eq),
            "<=" | "=<" => Ok(Operador::Le),
            ">=" | "=>" => Ok(Operador::Ge),
            "range" | "rango" => Ok(Operador::Range),
            other => Err(format!("Operador desconocido: '{other}'")),
        }
    }
}

/// How a range operator is written on the wire.
///
/// The backend evaluates `=` rules by comparing values textually and
/// recognises ranges by their `-`, so `Equals` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeEncoding {
    /// Send `"="` and keep the range in the value.
    #[default]
    Equals,
    /// Send `"range"` unchanged.
    Preserve,
}

impl FromStr for RangeEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equals" | "=" => Ok(RangeEncoding::Equals),
            "preserve" | "range" => Ok(RangeEncoding::Preserve),
            other => Err(format!("unknown range encoding '{other}'")),
        }
    }
}

/// Whether `value` is a `low-high` numeric range.
pub fn is_range_value(value: &str) -> bool {
    RANGE_PATTERN.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_pattern() {
        assert!(is_range_value("1000-2000"));
        assert!(is_range_value("  1000 -  2000 "));
        assert!(!is_range_value("abc"));
        assert!(!is_range_value("1000-"));
        assert!(!is_range_value("-5-10"));
        assert!(!is_range_value("1.5-2"));
    }

    #[test]
    fn test_range_pattern_ascii_digits_only() {
        assert!(!is_range_value("١٠٠٠-٢٠٠٠"));
        assert!(!is_range_value("１０-２０"));
    }

    #[test]
    fn test_wire_encoding() {
        assert_eq!(Operador::Range.wire(RangeEncoding::Equals), "=");
        assert_eq!(Operador::Range.wire(RangeEncoding::Preserve), "range");
        assert_eq!(Operador::Le.wire(RangeEncoding::Equals), "<=");
    }

    #[test]
    fn test_cycle() {
        assert_eq!(Operador::Eq.next(), Operador::Le);
        assert_eq!(Operador::Range.next(), Operador::Eq);
        assert_eq!(Operador::Eq.prev(), Operador::Range);
    }

    #[test]
    fn test_parse() {
        assert_eq!("=>".parse::<Operador>(), Ok(Operador::Ge));
        assert!("~".parse::<Operador>().is_err());
        assert_eq!("Preserve".parse::<RangeEncoding>(), Ok(RangeEncoding::Preserve));
    }
}
