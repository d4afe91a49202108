//! Small nom parsers for the text based formats
//!
//! These are all meant to be applied to a single line, and are public for
//! anyone wanting to reuse them on similar `key = value` headers.

// external crates
use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_while1};
use nom::character::complete::{digit1, space0, space1};
use nom::combinator::{map, map_res, rest, value};
use nom::multi::separated_list1;
use nom::number::complete::double;
use nom::sequence::{delimited, separated_pair, terminated};
use nom::IResult;

/// A `key = value` header line
///
/// Whitespace around the `=` is optional and the value is everything left
/// on the line, trailing whitespace removed.
///
/// ```rust
/// # use doselmass::readers::parsers::header_entry;
/// let (_, (key, value)) = header_entry("DimSize = 10 20 30").unwrap();
/// assert_eq!(key, "DimSize");
/// assert_eq!(value, "10 20 30");
/// ```
pub fn header_entry(i: &str) -> IResult<&str, (&str, &str)> {
    map(
        separated_pair(
            take_while1(|c: char| c.is_alphanumeric() || c == '_'),
            delimited(space0, tag("="), space0),
            rest,
        ),
        |(key, value): (&str, &str)| (key, value.trim_end()),
    )(i)
}

/// Whitespace separated list of floats
pub fn float_list(i: &str) -> IResult<&str, Vec<f64>> {
    terminated(separated_list1(space1, double), space0)(i)
}

/// Whitespace separated list of unsigned integers
pub fn usize_list(i: &str) -> IResult<&str, Vec<usize>> {
    terminated(
        separated_list1(space1, map_res(digit1, |s: &str| s.parse::<usize>())),
        space0,
    )(i)
}

/// MetaImage style boolean, `True` or `False` in any case
pub fn boolean(i: &str) -> IResult<&str, bool> {
    alt((
        value(true, tag_no_case("true")),
        value(false, tag_no_case("false")),
    ))(i)
}
