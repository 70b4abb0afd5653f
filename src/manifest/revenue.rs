//! Free-form revenue normalization.
//!
//! Manifest authors write revenue however they please: `8500`, `"$12,500"`,
//! `"$21K"`, `"1.5M"`. Everything is normalized into integer cents so totals
//! up to billions of dollars stay exact and summation order cannot change a
//! result.

use std::fmt;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ManifestError;

/// A canonical nonnegative revenue amount, stored in cents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Revenue(u64);

impl Revenue {
    pub const ZERO: Revenue = Revenue(0);

    pub fn from_cents(cents: u64) -> Self {
        Revenue(cents)
    }

    /// Whole-dollar constructor, mostly for fixtures and tests.
    pub fn from_dollars(dollars: u64) -> Self {
        Revenue(dollars * 100)
    }

    pub fn cents(&self) -> u64 {
        self.0
    }

    pub fn as_dollars(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Add for Revenue {
    type Output = Revenue;

    fn add(self, rhs: Revenue) -> Revenue {
        Revenue(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Revenue {
    fn add_assign(&mut self, rhs: Revenue) {
        *self = *self + rhs;
    }
}

impl fmt::Display for Revenue {
    /// Renders as `$12,500.00`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = (self.0 / 100).to_string();
        let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
        for (i, c) in dollars.chars().enumerate() {
            if i > 0 && (dollars.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        write!(f, "${}.{:02}", grouped, self.0 % 100)
    }
}

/// Normalize a raw manifest revenue value.
///
/// Always returns a usable amount: malformed input degrades to zero and the
/// reason comes back alongside it for the caller to record. An absent value
/// (`null`) is plain zero, no warning.
pub fn parse_revenue(raw: &Value) -> (Revenue, Option<ManifestError>) {
    match raw {
        Value::Null => (Revenue::ZERO, None),
        Value::Number(n) => {
            if let Some(dollars) = n.as_u64() {
                match dollars.checked_mul(100) {
                    Some(cents) => (Revenue::from_cents(cents), None),
                    None => (Revenue::ZERO, Some(malformed(raw, "amount out of range"))),
                }
            } else if let Some(f) = n.as_f64() {
                if !f.is_finite() || f < 0.0 {
                    (Revenue::ZERO, Some(malformed(raw, "negative or non-finite")))
                } else {
                    (Revenue::from_cents((f * 100.0).round() as u64), None)
                }
            } else {
                // as_i64 numbers that fail as_u64 are negative
                (Revenue::ZERO, Some(malformed(raw, "negative or non-finite")))
            }
        }
        Value::String(s) => parse_revenue_str(s),
        other => (
            Revenue::ZERO,
            Some(malformed(other, "expected a number or string")),
        ),
    }
}

fn parse_revenue_str(s: &str) -> (Revenue, Option<ManifestError>) {
    let trimmed = s.trim();

    // Trailing magnitude suffix, case-insensitive.
    let (body, multiplier) = match trimmed.as_bytes().last() {
        Some(b'k' | b'K') => (&trimmed[..trimmed.len() - 1], 1_000u128),
        Some(b'm' | b'M') => (&trimmed[..trimmed.len() - 1], 1_000_000),
        _ => (trimmed, 1),
    };

    if body.contains('-') {
        return (Revenue::ZERO, Some(malformed(s, "negative amount")));
    }

    // Strip currency symbols, thousands separators, and anything else that
    // is not a digit or decimal point.
    let cleaned: String = body
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if !cleaned.bytes().any(|b| b.is_ascii_digit()) {
        return (Revenue::ZERO, Some(malformed(s, "no numeric content")));
    }
    if cleaned.matches('.').count() > 1 {
        return (Revenue::ZERO, Some(malformed(s, "more than one decimal point")));
    }

    let (whole, frac) = match cleaned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (cleaned.as_str(), ""),
    };

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        match whole.parse() {
            Ok(v) if v <= u64::MAX as u128 => v,
            _ => return (Revenue::ZERO, Some(malformed(s, "amount out of range"))),
        }
    };

    // Sub-cent precision past this point cannot matter even with the M
    // suffix applied.
    let frac = &frac[..frac.len().min(8)];
    let frac_value: u128 = if frac.is_empty() { 0 } else { frac.parse().unwrap_or(0) };

    let cents =
        whole * 100 * multiplier + (frac_value * 100 * multiplier) / 10u128.pow(frac.len() as u32);

    if cents > u64::MAX as u128 {
        return (Revenue::ZERO, Some(malformed(s, "amount out of range")));
    }

    (Revenue::from_cents(cents as u64), None)
}

fn malformed(value: impl fmt::Display, reason: &str) -> ManifestError {
    ManifestError::MalformedRevenue(format!("{value} ({reason})"))
}
