//! The Erlang term subset found in release descriptors and `.app` resource files.
//!
//! Parsing is done with `nom`. Numbers are kept as their lexical text since nothing
//! downstream does arithmetic on them. Lists tolerate a trailing comma so rendered
//! descriptors can be read back.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alphanumeric1, anychar, char, digit1, multispace1, not_line_ending, one_of, satisfy},
    combinator::{all_consuming, cut, map, opt, recognize, value},
    error::{context, convert_error, ErrorKind, ParseError, VerboseError, VerboseErrorKind},
    multi::{many0, many0_count, separated_list0},
    sequence::{pair, preceded, separated_pair, terminated, tuple},
    IResult,
};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TermError {
    #[error("syntax error:\n{0}")]
    Syntax(String),
    #[error("unexpected end of input")]
    Incomplete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Atom(String),
    Str(String),
    Number(String),
    Char(char),
    Tuple(Vec<Term>),
    List(Vec<Term>),
    Map(Vec<(Term, Term)>),
    Binary(Vec<Term>),
}

impl Term {
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Term::Atom(a) => Some(a),
            _ => None,
        }
    }

    /// String contents. The empty list counts as the empty string, as it does in Erlang.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Term::Str(s) => Some(s),
            Term::List(items) if items.is_empty() => Some(""),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Term]> {
        match self {
            Term::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Term]> {
        match self {
            Term::List(items) => Some(items),
            Term::Str(s) if s.is_empty() => Some(&[]),
            _ => None,
        }
    }

    /// Short description of the term's shape for error messages.
    pub fn describe(&self) -> String {
        let rendered = self.to_string();
        if rendered.chars().count() > 60 {
            let head: String = rendered.chars().take(57).collect();
            format!("{head}...")
        } else {
            rendered
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(a) => f.write_str(&format_atom(a)),
            Term::Str(s) => f.write_str(&format_string(s)),
            Term::Number(n) => f.write_str(n),
            Term::Char(c) => write!(f, "${c}"),
            Term::Tuple(items) => {
                f.write_str("{")?;
                write_separated(f, items)?;
                f.write_str("}")
            }
            Term::List(items) => {
                f.write_str("[")?;
                write_separated(f, items)?;
                f.write_str("]")
            }
            Term::Map(pairs) => {
                f.write_str("#{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k} => {v}")?;
                }
                f.write_str("}")
            }
            Term::Binary(items) => {
                f.write_str("<<")?;
                write_separated(f, items)?;
                f.write_str(">>")
            }
        }
    }
}

fn write_separated(f: &mut fmt::Formatter<'_>, items: &[Term]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

const RESERVED_WORDS: &[&str] = &[
    "after", "and", "andalso", "band", "begin", "bnot", "bor", "bsl", "bsr", "bxor", "case",
    "catch", "cond", "div", "else", "end", "fun", "if", "let", "maybe", "not", "of", "or",
    "orelse", "receive", "rem", "try", "when", "xor",
];

fn is_atom_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '@'
}

/// Render an atom, quoting it only when a bare atom would not read back the same.
pub fn format_atom(atom: &str) -> String {
    let bare = atom.starts_with(|c: char| c.is_ascii_lowercase())
        && atom.chars().all(is_atom_char)
        && !RESERVED_WORDS.contains(&atom);
    if bare {
        atom.to_owned()
    } else {
        let mut out = String::with_capacity(atom.len() + 2);
        out.push('\'');
        push_escaped(&mut out, atom, '\'');
        out.push('\'');
        out
    }
}

/// Render a double-quoted string literal.
pub fn format_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    push_escaped(&mut out, s, '"');
    out.push('"');
    out
}

fn push_escaped(out: &mut String, s: &str, delim: char) {
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{{{:X}}}", c as u32)),
            c => out.push(c),
        }
    }
}

/// Parse every dot-terminated term in `input`.
pub fn parse_terms(input: &str) -> Result<Vec<Term>, TermError> {
    let mut parser = all_consuming(terminated(
        many0(terminated(|i| term(i, 0), token(context("terminating '.'", char('.'))))),
        ws,
    ));
    match parser(input) {
        Ok((_, terms)) => Ok(terms),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            Err(TermError::Syntax(convert_error(input, e)))
        }
        Err(nom::Err::Incomplete(_)) => Err(TermError::Incomplete),
    }
}

/// Parse a single term with no terminating dot, e.g. a version or atom snippet.
pub fn parse_term(input: &str) -> Result<Term, TermError> {
    match all_consuming(terminated(|i| term(i, 0), ws))(input) {
        Ok((_, t)) => Ok(t),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            Err(TermError::Syntax(convert_error(input, e)))
        }
        Err(nom::Err::Incomplete(_)) => Err(TermError::Incomplete),
    }
}

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

fn comment(input: &str) -> Res<'_, &str> {
    preceded(char('%'), not_line_ending)(input)
}

fn ws(input: &str) -> Res<'_, ()> {
    value((), many0_count(alt((multispace1, comment))))(input)
}

fn token<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> Res<'a, O>
where
    F: FnMut(&'a str) -> Res<'a, O>,
{
    preceded(ws, inner)
}

/// Containers nested deeper than this are rejected instead of recursing further.
const MAX_DEPTH: usize = 64;

fn term(input: &str, depth: usize) -> Res<'_, Term> {
    if depth > MAX_DEPTH {
        return Err(nom::Err::Failure(VerboseError {
            errors: vec![(input, VerboseErrorKind::Context("nesting depth limit"))],
        }));
    }
    preceded(
        ws,
        alt((
            |i| tuple_term(i, depth),
            |i| list_term(i, depth),
            |i| map_term(i, depth),
            binary_term,
            string_term,
            char_term,
            map(number, |n: &str| Term::Number(n.to_owned())),
            map(atom, Term::Atom),
        )),
    )(input)
}

fn elements(input: &str, depth: usize) -> Res<'_, Vec<Term>> {
    separated_list0(token(char(',')), |i| term(i, depth + 1))(input)
}

fn tuple_term(input: &str, depth: usize) -> Res<'_, Term> {
    let (input, _) = char('{')(input)?;
    let (input, items) = cut(terminated(
        |i| elements(i, depth),
        token(context("closing '}'", char('}'))),
    ))(input)?;
    Ok((input, Term::Tuple(items)))
}

fn list_term(input: &str, depth: usize) -> Res<'_, Term> {
    let (input, _) = char('[')(input)?;
    let (input, items) = cut(terminated(
        terminated(|i| elements(i, depth), opt(token(char(',')))),
        token(context("closing ']'", char(']'))),
    ))(input)?;
    Ok((input, Term::List(items)))
}

fn map_term(input: &str, depth: usize) -> Res<'_, Term> {
    let (input, _) = tag("#{")(input)?;
    let entry = separated_pair(
        |i| term(i, depth + 1),
        token(tag("=>")),
        |i| term(i, depth + 1),
    );
    let (input, pairs) = cut(terminated(
        separated_list0(token(char(',')), entry),
        token(context("closing '}'", char('}'))),
    ))(input)?;
    Ok((input, Term::Map(pairs)))
}

fn binary_term(input: &str) -> Res<'_, Term> {
    let (input, _) = tag("<<")(input)?;
    let segment = preceded(
        ws,
        alt((
            map(string_literal, Term::Str),
            map(number, |n: &str| Term::Number(n.to_owned())),
        )),
    );
    let (input, segments) = cut(terminated(
        separated_list0(token(char(',')), segment),
        token(context("closing '>>'", tag(">>"))),
    ))(input)?;
    Ok((input, Term::Binary(segments)))
}

/// Adjacent string literals concatenate, as in `"foo" "bar"`.
fn string_term(input: &str) -> Res<'_, Term> {
    let (input, first) = string_literal(input)?;
    let (input, rest) = many0(token(string_literal))(input)?;
    let mut text = first;
    for part in rest {
        text.push_str(&part);
    }
    Ok((input, Term::Str(text)))
}

fn char_term(input: &str) -> Res<'_, Term> {
    let (input, _) = char('$')(input)?;
    let (input, c) = cut(alt((preceded(char('\\'), escape_sequence), anychar)))(input)?;
    Ok((input, Term::Char(c)))
}

fn number(input: &str) -> Res<'_, &str> {
    recognize(tuple((
        opt(char('-')),
        digit1,
        opt(alt((
            recognize(pair(char('#'), alphanumeric1)),
            recognize(tuple((
                char('.'),
                digit1,
                opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
            ))),
        ))),
    )))(input)
}

fn atom(input: &str) -> Res<'_, String> {
    alt((bare_atom, quoted_atom))(input)
}

fn bare_atom(input: &str) -> Res<'_, String> {
    map(
        recognize(pair(
            satisfy(|c| c.is_ascii_lowercase()),
            take_while(is_atom_char),
        )),
        str::to_owned,
    )(input)
}

fn quoted_atom(input: &str) -> Res<'_, String> {
    quoted_body(input, '\'')
}

fn string_literal(input: &str) -> Res<'_, String> {
    quoted_body(input, '"')
}

fn quoted_body(input: &str, delim: char) -> Res<'_, String> {
    let (mut rest, _) = char(delim)(input)?;
    let mut out = String::new();
    loop {
        let mut chars = rest.chars();
        match chars.next() {
            None => {
                return Err(nom::Err::Failure(VerboseError::from_error_kind(
                    input,
                    ErrorKind::Char,
                )))
            }
            Some(c) if c == delim => return Ok((chars.as_str(), out)),
            Some('\\') => {
                let (after, c) = escape_sequence(chars.as_str())?;
                out.push(c);
                rest = after;
            }
            Some(c) => {
                out.push(c);
                rest = chars.as_str();
            }
        }
    }
}

/// Decode the part of an escape sequence following the backslash.
fn escape_sequence(input: &str) -> Res<'_, char> {
    let fail = || nom::Err::Failure(VerboseError::from_error_kind(input, ErrorKind::Escaped));
    let mut chars = input.chars();
    let Some(c) = chars.next() else {
        return Err(fail());
    };
    let rest = chars.as_str();
    let simple = match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        's' => Some(' '),
        'e' => Some('\x1b'),
        'b' => Some('\x08'),
        'f' => Some('\x0c'),
        'v' => Some('\x0b'),
        'd' => Some('\x7f'),
        _ => None,
    };
    if let Some(decoded) = simple {
        return Ok((rest, decoded));
    }
    match c {
        '0'..='7' => {
            let digits: String = input
                .chars()
                .take(3)
                .take_while(|d| ('0'..='7').contains(d))
                .collect();
            let code = u32::from_str_radix(&digits, 8).map_err(|_| fail())?;
            let decoded = char::from_u32(code).ok_or_else(fail)?;
            Ok((&input[digits.len()..], decoded))
        }
        'x' => {
            let (hex, after) = if let Some(braced) = rest.strip_prefix('{') {
                let end = braced.find('}').ok_or_else(fail)?;
                (&braced[..end], &braced[end + 1..])
            } else {
                let len = rest
                    .chars()
                    .take(2)
                    .take_while(char::is_ascii_hexdigit)
                    .count();
                (&rest[..len], &rest[len..])
            };
            let code = u32::from_str_radix(hex, 16).map_err(|_| fail())?;
            let decoded = char::from_u32(code).ok_or_else(fail)?;
            Ok((after, decoded))
        }
        '^' => {
            let mut ctl = rest.chars();
            let letter = ctl.next().ok_or_else(fail)?;
            let decoded = char::from_u32(letter as u32 & 0x1f).ok_or_else(fail)?;
            Ok((ctl.as_str(), decoded))
        }
        other => Ok((rest, other)),
    }
}
