//! Common small functions used throughout the crate
//!
//! These are left public for the convenience of the user, mostly for prettier
//! formatting of scientific numbers in summaries and log messages.

use std::fmt::LowerExp;

// Alias for the format! macro out of laziness
pub use std::format as f;

/// Extends primitives with more specific formatting options
pub trait NumberFmt {
    /// Better scientific number formatting
    ///
    /// The default is not very consistent for scientific in particular, so this
    /// allows easy definition.
    ///
    /// Works for anything that can be represented as scientific using the
    /// LowerExp trait.
    ///
    /// ```rust
    /// # use doselmass::utils::NumberFmt;
    /// let number = -1.0;
    /// assert_eq!(number.sci(5, 2), "-1.00000e+00".to_string());
    /// assert_eq!((1.0).sci(5, 2), "1.00000e+00".to_string());
    /// assert_eq!((0.00125).sci(2, 2), "1.25e-03".to_string());
    /// ```
    fn sci(&self, precision: usize, exp_pad: usize) -> String;
}

impl<T: LowerExp> NumberFmt for T {
    fn sci(&self, precision: usize, exp_pad: usize) -> String {
        let mut num = f!("{:.precision$e}", &self, precision = precision);
        // `{:e}` always writes an exponent, the fallback is never hit
        let split = num.find('e').unwrap_or(num.len());
        let exp = num.split_off(split);
        // Make sure the exponent is signed
        let (sign, exp) = match exp.strip_prefix("e-") {
            Some(exp) => ('-', exp),
            None => ('+', exp.get(1..).unwrap_or("0")),
        };
        // Pad the exponent with zeros if needed and put it back on the number
        num.push_str(&f!("e{}{:0>pad$}", sign, exp, pad = exp_pad));
        num
    }
}

/// Fractional part of a value, keeping the sign of the value
///
/// Behaves like the C `fmod(value, 1.0)`, which is exactly what the `%`
/// operator does for floats. Negative inputs give negative fractions.
///
/// ```rust
/// # use doselmass::utils::fractional;
/// assert_eq!(fractional(2.25), 0.25);
/// assert_eq!(fractional(3.0), 0.0);
/// assert_eq!(fractional(-0.5), -0.5);
/// ```
#[inline]
pub fn fractional(value: f64) -> f64 {
    value % 1.0
}

/// Product of the three components of an array
///
/// ```rust
/// # use doselmass::utils::product;
/// assert_eq!(product(&[2.0, 3.0, 4.0]), 24.0);
/// ```
#[inline]
pub fn product(values: &[f64; 3]) -> f64 {
    values[0] * values[1] * values[2]
}
