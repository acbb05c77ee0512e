//! ENVI header (`.hdr`) parser.
//!
//! A header starts with the `ENVI` magic line followed by `key = value`
//! entries. Values wrapped in braces may span several lines and are stored
//! as comma-separated lists. Lines starting with `;` are comments.

use georef_common::{GeorefError, GeorefResult};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1, take_until},
    character::complete::{char, line_ending, multispace1, not_line_ending, space0},
    combinator::{eof, map, opt, recognize, verify},
    multi::many0_count,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use tracing::debug;

use crate::metadata::{split_list, MetadataValue, RawMetadata};

/// Parse the text of an ENVI header into a metadata mapping.
pub fn parse_header(input: &str) -> GeorefResult<RawMetadata> {
    let (mut rest, _) = magic(input).map_err(|_| {
        GeorefError::malformed("header", "missing 'ENVI' magic on the first line")
    })?;

    let mut metadata = RawMetadata::new();

    loop {
        rest = match skip_blank(rest) {
            Ok((r, _)) => r,
            Err(_) => rest,
        };
        if rest.is_empty() {
            break;
        }

        match entry(rest) {
            Ok((r, (key, value))) => {
                metadata.insert(key, value);
                rest = r;
            }
            Err(_) => {
                let line = input[..input.len() - rest.len()].lines().count() + 1;
                let text = rest.lines().next().unwrap_or_default();
                return Err(GeorefError::malformed(
                    "header",
                    format!("line {}: expected 'key = value', got '{}'", line, text),
                ));
            }
        }
    }

    debug!(entries = metadata.len(), "Parsed ENVI header");
    Ok(metadata)
}

fn magic(input: &str) -> IResult<&str, &str> {
    terminated(
        preceded(opt(tag("\u{feff}")), tag("ENVI")),
        pair(space0, alt((line_ending, eof))),
    )(input)
}

/// Blank lines, whitespace and `;` comments.
fn skip_blank(input: &str) -> IResult<&str, usize> {
    many0_count(alt((
        multispace1,
        recognize(pair(char(';'), not_line_ending)),
    )))(input)
}

fn key(input: &str) -> IResult<&str, &str> {
    map(take_till1(|c: char| c == '=' || c == '\n' || c == '\r'), str::trim)(input)
}

fn braced(input: &str) -> IResult<&str, MetadataValue> {
    map(delimited(char('{'), take_until("}"), char('}')), |inner: &str| {
        MetadataValue::List(split_list(inner))
    })(input)
}

/// Rest of the line; an opening brace without its closing brace is rejected.
fn scalar(input: &str) -> IResult<&str, MetadataValue> {
    map(
        verify(not_line_ending, |s: &str| !s.starts_with('{')),
        |s: &str| MetadataValue::Scalar(s.trim().to_string()),
    )(input)
}

fn entry(input: &str) -> IResult<&str, (&str, MetadataValue)> {
    map(
        tuple((key, char('='), space0, alt((braced, scalar)), space0)),
        |(k, _, _, v, _)| (k, v),
    )(input)
}
