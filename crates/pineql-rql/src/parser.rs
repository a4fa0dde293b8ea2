//! Nom parser for the field-selection language.
//!
//! ```text
//! selection := ws ( field ( ws "," ws field )* ws ","? )? ws
//! field     := ident ws ( "{" selection "}" )?
//! ident     := [A-Za-z_$] [A-Za-z0-9_$-]*
//! ```

use nom::{
    bytes::complete::take_while,
    character::complete::{char, multispace0, satisfy},
    combinator::{all_consuming, cut, opt, recognize},
    error::{context, convert_error, ContextError, ParseError as NomParseError, VerboseError},
    multi::separated_list0,
    sequence::{delimited, pair, preceded},
    IResult,
};
use thiserror::Error;

use crate::ast::{FieldSelection, Selection};

/// Errors produced while parsing a selection string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RqlError {
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Incomplete input: expected more content")]
    Incomplete,
}

impl RqlError {
    /// Byte offset of the failure, when known.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Syntax { position, .. } => Some(*position),
            Self::Incomplete => None,
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Parse a complete selection string.
///
/// Empty or whitespace-only input yields an empty selection.
pub fn parse_selection(input: &str) -> Result<Selection, RqlError> {
    match all_consuming(selection::<VerboseError<&str>>)(input) {
        Ok((_, parsed)) => Ok(parsed),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let position = e
                .errors
                .first()
                .map(|(rest, _)| input.len() - rest.len())
                .unwrap_or(0);
            Err(RqlError::Syntax {
                position,
                message: convert_error(input, e),
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(RqlError::Incomplete),
    }
}

// ============================================================================
// Internal Parsers
// ============================================================================

fn selection<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Selection, E> {
    let (input, _) = multispace0(input)?;
    let (input, fields) =
        separated_list0(delimited(multispace0, char(','), multispace0), field)(input)?;
    let (input, _) = multispace0(input)?;
    // Trailing comma
    let (input, _) = opt(char(','))(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, Selection { fields }))
}

fn field<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, FieldSelection, E> {
    let (input, name) = context("field name", identifier)(input)?;
    let (input, children) = opt(preceded(multispace0, nested))(input)?;
    Ok((
        input,
        FieldSelection {
            name: name.to_string(),
            children,
        },
    ))
}

fn nested<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Selection, E> {
    delimited(
        char('{'),
        selection,
        cut(context("closing brace", char('}'))),
    )(input)
}

fn identifier<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(pair(satisfy(is_ident_start), take_while(is_ident_char)))(input)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '-'
}
