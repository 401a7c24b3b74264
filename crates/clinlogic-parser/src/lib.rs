//! Clinical logic query parser using Winnow
//!
//! Parses the text form of criteria, e.g. `LAST {CD4 COUNT} < 200`, into a
//! [`Criteria`] tree. Keywords are case-insensitive; tokens are written in braces.

mod combinators;
mod query;

use clinlogic_ast::Criteria;
use clinlogic_diagnostics::{
    ErrorCode, LOGIC0001, LOGIC0002, LOGIC0003, LOGIC0004, LOGIC0005, LOGIC0006, LOGIC0007,
    LOGIC0008, LogicError, Result, Span,
};
use clinlogic_types::Value;
use combinators::{Input, PResult, ws};
use winnow::error::{ContextError, ErrMode, StrContext};

/// How deeply parentheses, `NOT` and aggregators may nest in one query
pub const MAX_NESTING: usize = 64;

/// Parse a query into a criteria tree
pub fn parse(query: &str) -> Result<Criteria> {
    if query.trim().is_empty() {
        return Err(LogicError::parse(LOGIC0002, "Empty query", query));
    }
    let criteria = parse_complete(query, query::query_expr)?;
    log::trace!("parsed query '{}' as {:?}", query, criteria);
    Ok(criteria)
}

/// Parse a single literal value, e.g. a parameter supplied on the command line
pub fn parse_value(text: &str) -> Result<Value> {
    parse_complete(text, |input: &mut Input<'_>| {
        ws(input)?;
        query::literal(input)
    })
}

/// Parse each query, collecting every failure instead of stopping at the first
pub fn parse_all<'q>(queries: impl IntoIterator<Item = &'q str>) -> Result<Vec<Criteria>> {
    let mut parsed = Vec::new();
    let mut errors = Vec::new();
    for q in queries {
        match parse(q) {
            Ok(c) => parsed.push(c),
            Err(e) => errors.push(e),
        }
    }
    match errors.len() {
        0 => Ok(parsed),
        1 => Err(errors.remove(0)),
        _ => Err(LogicError::Multiple(errors)),
    }
}

fn parse_complete<T>(source: &str, mut parser: impl FnMut(&mut Input<'_>) -> PResult<T>) -> Result<T> {
    let mut input: Input<'_> = source;
    let result = parser(&mut input);
    let _ = ws(&mut input);
    let offset = source.len() - input.len();

    match result {
        Ok(value) if input.is_empty() => Ok(value),
        Ok(_) => Err(LogicError::parse_at(
            LOGIC0001,
            format!("Unexpected input '{}'", next_word(input)),
            source,
            Span::new(offset, offset + next_word(input).len()),
        )),
        Err(e) => Err(to_parse_error(e, source, input, offset)),
    }
}

/// The word at the head of the remaining input, for messages and spans
fn next_word(rest: &str) -> &str {
    let end = rest
        .char_indices()
        .find(|(i, c)| c.is_whitespace() || (*i > 0 && matches!(c, '(' | ')' | '{' | '}' | ',')))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    let end = if end == 0 { rest.chars().next().map_or(0, char::len_utf8) } else { end };
    &rest[..end]
}

fn label_code(label: &str) -> ErrorCode {
    match label {
        combinators::LABEL_TOKEN => LOGIC0003,
        combinators::LABEL_DATE => LOGIC0005,
        combinators::LABEL_UNIT => LOGIC0006,
        combinators::LABEL_NUMBER => LOGIC0004,
        combinators::LABEL_CLOSE_PAREN | combinators::LABEL_CLOSE_QUOTE => LOGIC0007,
        _ => LOGIC0001,
    }
}

fn to_parse_error(err: ErrMode<ContextError>, source: &str, rest: &str, offset: usize) -> LogicError {
    let context = match err {
        ErrMode::Backtrack(c) | ErrMode::Cut(c) => Some(c),
        ErrMode::Incomplete(_) => None,
    };
    let label = context.as_ref().and_then(|c| {
        c.context().find_map(|ctx| match ctx {
            StrContext::Label(label) => Some(*label),
            _ => None,
        })
    });

    let word = next_word(rest);
    let span = Span::new(offset, offset + word.len());
    let (code, message) = match label {
        Some(combinators::LABEL_NESTING) => (
            LOGIC0008,
            format!("Query nests more than {} levels deep", MAX_NESTING),
        ),
        Some(label) if rest.is_empty() => {
            let code = match label_code(label) {
                LOGIC0001 => LOGIC0002,
                specific => specific,
            };
            (code, format!("Unexpected end of input, expected {}", label))
        }
        Some(label) => (label_code(label), format!("Expected {}, found '{}'", label, word)),
        None if rest.is_empty() => (LOGIC0002, "Unexpected end of input".to_string()),
        None => (LOGIC0001, format!("Unexpected input '{}'", word)),
    };
    log::debug!("query parse failed at offset {}: {}", offset, message);
    LogicError::parse_at(code, message, source, span)
}
