//! Lexical building blocks for the query parser

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clinlogic_types::{Duration, DurationUnit, Value};
use winnow::ascii::{Caseless, digit1, multispace0};
use winnow::combinator::{cut_err, fail, opt};
use winnow::error::StrContext;
use winnow::prelude::*;
use winnow::token::{any, take_while};

pub(crate) type Input<'a> = &'a str;
pub(crate) type PResult<T> = winnow::ModalResult<T>;

// Context labels, mapped to error codes when a parse fails
pub(crate) const LABEL_TOKEN: &str = "token reference";
pub(crate) const LABEL_DATE: &str = "date";
pub(crate) const LABEL_UNIT: &str = "duration unit";
pub(crate) const LABEL_NUMBER: &str = "number";
pub(crate) const LABEL_CLOSE_PAREN: &str = "closing parenthesis";
pub(crate) const LABEL_CLOSE_QUOTE: &str = "closing quote";
pub(crate) const LABEL_NESTING: &str = "shallower nesting";

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Skip whitespace
pub(crate) fn ws(input: &mut Input<'_>) -> PResult<()> {
    multispace0.void().parse_next(input)
}

fn caseless<'a>(input: &mut Input<'a>, kw: &'static str) -> PResult<&'a str> {
    Caseless(kw).parse_next(input)
}

pub(crate) fn char_lit(input: &mut Input<'_>, mut c: char) -> PResult<char> {
    c.parse_next(input)
}

/// Fail without backtracking, recording what was expected
pub(crate) fn expected<T>(input: &mut Input<'_>, label: &'static str) -> PResult<T> {
    cut_err(fail::<_, T, _>.context(StrContext::Label(label))).parse_next(input)
}

/// Case-insensitive keyword that is not followed by a word character
pub(crate) fn keyword<'a>(kw: &'static str) -> impl FnMut(&mut Input<'a>) -> PResult<&'a str> {
    move |input: &mut Input<'a>| {
        let checkpoint = *input;
        let matched = caseless(input, kw)?;
        if input.starts_with(is_word_char) {
            *input = checkpoint;
            return fail.parse_next(input);
        }
        Ok(matched)
    }
}

/// Keyword preceded by optional whitespace; input is untouched on failure
pub(crate) fn padded_keyword<'a>(kw: &'static str) -> impl FnMut(&mut Input<'a>) -> PResult<&'a str> {
    move |input: &mut Input<'a>| {
        let checkpoint = *input;
        ws(input)?;
        match keyword(kw).parse_next(input) {
            Ok(matched) => Ok(matched),
            Err(e) => {
                *input = checkpoint;
                Err(e)
            }
        }
    }
}

/// Punctuation preceded by optional whitespace; input is untouched on failure
pub(crate) fn padded_lit<'a>(mut s: &'static str) -> impl FnMut(&mut Input<'a>) -> PResult<&'a str> {
    move |input: &mut Input<'a>| {
        let checkpoint = *input;
        ws(input)?;
        match s.parse_next(input) {
            Ok(matched) => Ok(matched),
            Err(e) => {
                *input = checkpoint;
                Err(e)
            }
        }
    }
}

pub(crate) fn identifier<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    take_while(1.., is_word_char).parse_next(input)
}

/// Integer or decimal number; a decimal point makes it `Numeric`
fn number_text<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    (opt('-'), digit1, opt(('.', digit1))).take().parse_next(input)
}

/// Whole numbers outside the `i64` range are read as `Numeric`
pub(crate) fn number(input: &mut Input<'_>) -> PResult<Value> {
    let text = number_text(input)?;
    if !text.contains('.') {
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Value::Integer(n));
        }
    }
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Value::Numeric(n)),
        _ => expected(input, LABEL_NUMBER),
    }
}

fn next_char(input: &mut Input<'_>) -> PResult<char> {
    any.parse_next(input)
}

/// Double-quoted string with `\"` and `\\` escapes
pub(crate) fn string_literal(input: &mut Input<'_>) -> PResult<String> {
    char_lit(input, '"')?;
    let mut out = String::new();
    loop {
        match next_char(input) {
            Ok('"') => return Ok(out),
            Ok('\\') => match next_char(input) {
                Ok(c) => out.push(c),
                Err(_) => return expected(input, LABEL_CLOSE_QUOTE),
            },
            Ok(c) => out.push(c),
            Err(_) => return expected(input, LABEL_CLOSE_QUOTE),
        }
    }
}

/// Whether the input starts like a `YYYY-MM-DD` date
pub(crate) fn looks_like_date(input: &str) -> bool {
    let bytes = input.as_bytes();
    bytes.len() >= 5 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'-'
}

fn fixed_digits(n: usize) -> impl FnMut(&mut Input<'_>) -> PResult<u32> {
    move |input: &mut Input<'_>| {
        take_while(n, |c: char| c.is_ascii_digit())
            .try_map(|s: &str| s.parse::<u32>())
            .parse_next(input)
    }
}

/// Fraction of a second, up to nanosecond precision
fn nanos(input: &mut Input<'_>) -> PResult<u32> {
    let digits = take_while(1..=9, |c: char| c.is_ascii_digit()).parse_next(input)?;
    let scale = 10u32.pow(9 - digits.len() as u32);
    Ok(digits.parse::<u32>().unwrap_or(0) * scale)
}

/// `YYYY-MM-DD` with optional `THH:MM[:SS[.fff]]`, interpreted as UTC
pub(crate) fn date_literal(input: &mut Input<'_>) -> PResult<DateTime<Utc>> {
    let parsed: PResult<_> = (
        fixed_digits(4),
        '-',
        fixed_digits(2),
        '-',
        fixed_digits(2),
        opt((
            'T',
            fixed_digits(2),
            ':',
            fixed_digits(2),
            opt((':', fixed_digits(2), opt(('.', nanos)))),
        )),
    )
        .parse_next(input);

    let Ok((year, _, month, _, day, time)) = parsed else {
        return expected(input, LABEL_DATE);
    };

    let Some(date) = i32::try_from(year)
        .ok()
        .and_then(|y| NaiveDate::from_ymd_opt(y, month, day))
    else {
        return expected(input, LABEL_DATE);
    };

    let time = match time {
        None => Some(NaiveTime::MIN),
        Some((_, h, _, m, secs)) => {
            let (s, nano) = secs.map_or((0, 0), |(_, s, frac)| (s, frac.map_or(0, |(_, n)| n)));
            NaiveTime::from_hms_nano_opt(h, m, s, nano)
        }
    };
    let Some(time) = time else {
        return expected(input, LABEL_DATE);
    };

    Ok(date.and_time(time).and_utc())
}

fn alpha_word<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)
}

pub(crate) fn duration_unit(input: &mut Input<'_>) -> PResult<DurationUnit> {
    let checkpoint = *input;
    let word = alpha_word(input)?;
    match word.parse::<DurationUnit>() {
        Ok(unit) if !input.starts_with(is_word_char) => Ok(unit),
        _ => {
            *input = checkpoint;
            fail.parse_next(input)
        }
    }
}

/// Number followed by a unit keyword, e.g. `6 months`
pub(crate) fn duration_literal(input: &mut Input<'_>) -> PResult<Duration> {
    let magnitude = number(input)?;
    ws(input)?;
    match duration_unit(input) {
        Ok(unit) => {
            let magnitude = magnitude.as_number().unwrap_or_default();
            Ok(Duration::from_unit(unit, magnitude))
        }
        Err(_) => expected(input, LABEL_UNIT),
    }
}
