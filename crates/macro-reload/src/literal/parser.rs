//! nom grammar for strict literals.
//!
//! Accepts Python-style (`True`, `None`, `'single quotes'`, tuples) and JSON
//! style (`true`, `null`, `"double quotes"`) spellings. Arbitrary expressions,
//! identifiers and calls are rejected.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{all_consuming, map, opt, recognize, value},
    error::{Error, ErrorKind},
    multi::{separated_list0, separated_list1},
    sequence::{pair, preceded, separated_pair, terminated, tuple},
    IResult,
};

use super::Literal;
use crate::error::LiteralError;

/// Parses a complete literal; trailing input is an error.
pub fn parse(text: &str) -> Result<Literal, LiteralError> {
    match all_consuming(literal)(text) {
        Ok((_, literal)) => Ok(literal),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            if e.code == ErrorKind::TooLarge {
                let digits: String = e
                    .input
                    .chars()
                    .take_while(|c| c.is_ascii_digit() || matches!(c, '+' | '-'))
                    .collect();
                return Err(LiteralError::OutOfRange(digits));
            }
            Err(LiteralError::Syntax {
                position: text.len() - e.input.len(),
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(LiteralError::Syntax {
            position: text.len(),
        }),
    }
}

fn literal(input: &str) -> IResult<&str, Literal> {
    let (input, _) = multispace0(input)?;
    let (input, parsed) = alt((
        dict_or_set,
        list,
        tuple_or_group,
        map(quoted, Literal::Str),
        number,
        keyword,
    ))(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, parsed))
}

fn closing(delimiter: char) -> impl FnMut(&str) -> IResult<&str, char> {
    move |input| {
        preceded(
            pair(opt(char(',')), multispace0),
            char(delimiter),
        )(input)
    }
}

fn list(input: &str) -> IResult<&str, Literal> {
    let (input, _) = char('[')(input)?;
    let (input, items) = separated_list0(char(','), literal)(input)?;
    let (input, _) = preceded(multispace0, closing(']'))(input)?;
    Ok((input, Literal::List(items)))
}

fn tuple_or_group(input: &str) -> IResult<&str, Literal> {
    let (input, _) = char('(')(input)?;
    let (input, mut items) = separated_list0(char(','), literal)(input)?;
    let (input, trailing) = opt(char(','))(input)?;
    let (input, _) = preceded(multispace0, char(')'))(input)?;

    // `(x)` is a parenthesized value, `(x,)` a one-element tuple.
    if items.len() == 1 && trailing.is_none() {
        if let Some(inner) = items.pop() {
            return Ok((input, inner));
        }
    }
    Ok((input, Literal::Tuple(items)))
}

fn dict_or_set(input: &str) -> IResult<&str, Literal> {
    let (input, _) = char('{')(input)?;
    let (input, _) = multispace0(input)?;
    let empty: IResult<&str, char> = char('}')(input);
    if let Ok((rest, _)) = empty {
        return Ok((rest, Literal::Dict(Vec::new())));
    }

    alt((
        map(
            terminated(
                separated_list1(char(','), separated_pair(literal, char(':'), literal)),
                closing('}'),
            ),
            |entries| Literal::Dict(dedup_keys(entries)),
        ),
        map(
            terminated(separated_list1(char(','), literal), closing('}')),
            Literal::Set,
        ),
    ))(input)
}

/// Later entries overwrite earlier ones with the same key, which keeps its
/// first position.
fn dedup_keys(entries: Vec<(Literal, Literal)>) -> Vec<(Literal, Literal)> {
    let mut out: Vec<(Literal, Literal)> = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        match out.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => out.push((key, value)),
        }
    }
    out
}

fn quoted(input: &str) -> IResult<&str, String> {
    let (rest, quote) = one_of("\"'")(input)?;
    let mut out = String::new();
    let mut chars = rest.char_indices();

    while let Some((index, c)) = chars.next() {
        match c {
            c if c == quote => return Ok((&rest[index + 1..], out)),
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    break;
                };
                match escaped {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '0' => out.push('\0'),
                    '\\' | '\'' | '"' => out.push(escaped),
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            }
            '\n' => break,
            c => out.push(c),
        }
    }

    Err(nom::Err::Error(Error::new(input, ErrorKind::Char)))
}

fn number(input: &str) -> IResult<&str, Literal> {
    let (rest, text) = recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), opt(digit1))))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)?;

    if text.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
        return match text.parse::<f64>() {
            Ok(f) => Ok((rest, Literal::Float(f))),
            Err(_) => Err(nom::Err::Failure(Error::new(input, ErrorKind::Float))),
        };
    }

    if let Ok(i) = text.parse::<i64>() {
        return Ok((rest, Literal::Int(i)));
    }
    match text.trim_start_matches('+').parse::<u64>() {
        Ok(u) => Ok((rest, Literal::UInt(u))),
        Err(_) => Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge))),
    }
}

fn keyword(input: &str) -> IResult<&str, Literal> {
    alt((
        value(Literal::Bool(true), alt((tag("True"), tag("true")))),
        value(Literal::Bool(false), alt((tag("False"), tag("false")))),
        value(Literal::Null, alt((tag("None"), tag("null")))),
    ))(input)
}
