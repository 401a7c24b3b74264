//! Query grammar, parsed by recursive descent
//!
//! ```text
//! query       := or_expr
//! or_expr     := and_expr ("OR" and_expr)*
//! and_expr    := not_expr ("AND" not_expr)*
//! not_expr    := "NOT" "EXISTS" not_expr | "NOT" not_expr | aggregated
//! aggregated  := aggregator aggregated | conditioned
//! aggregator  := ("LAST" | "FIRST") [integer "FROM"] | "EXISTS" | "COUNT" | "AVERAGE" | "DISTINCT"
//! conditioned := primary condition*
//! condition   := ("=" | ">=" | "<=" | ">" | "<") operand
//!              | "CONTAINS" operand | "BEFORE" operand | "AFTER" operand
//!              | "WITHIN" duration | "AS" "OF" operand
//! primary     := "{" token "}" ["(" name "=" literal ("," name "=" literal)* ")"]
//!              | "(" query ")" | operand
//! operand     := literal | "$" name | "NOW" | "TODAY"
//! literal     := duration | date | number | string | "#" string ["|" string]
//!              | "TRUE" | "FALSE" | "NULL"
//! ```

use crate::MAX_NESTING;
use crate::combinators::{
    LABEL_CLOSE_PAREN, LABEL_NESTING, LABEL_TOKEN, char_lit, date_literal, duration_literal, duration_unit,
    expected, identifier, keyword, looks_like_date, number, padded_keyword, padded_lit,
    string_literal, ws, Input, PResult,
};
use clinlogic_ast::{Criteria, DataReference, Operator};
use clinlogic_types::{Code, Duration, Value};
use winnow::prelude::*;
use winnow::token::take_while;

const LABEL_OPERAND: &str = "operand";
const LABEL_EXPRESSION: &str = "expression";
const LABEL_ARGUMENT: &str = "rule argument";

/// Entry point: a full query expression
pub(crate) fn query_expr(input: &mut Input<'_>) -> PResult<Criteria> {
    or_expr(input, 0)
}

/// One level deeper into the tree, failing once the nesting limit is reached
fn descend(input: &mut Input<'_>, depth: usize) -> PResult<usize> {
    if depth >= MAX_NESTING {
        ws(input)?;
        return expected(input, LABEL_NESTING);
    }
    Ok(depth + 1)
}

fn connective(
    input: &mut Input<'_>,
    depth: usize,
    kw: &'static str,
    operator: Operator,
    next: fn(&mut Input<'_>, usize) -> PResult<Criteria>,
) -> PResult<Criteria> {
    let first = next(input, depth)?;
    let mut operands = vec![first];
    while padded_keyword(kw).parse_next(input).is_ok() {
        operands.push(next(input, depth)?);
    }
    if operands.len() == 1 {
        Ok(operands.remove(0))
    } else {
        Ok(Criteria::nary(operator, operands))
    }
}

fn or_expr(input: &mut Input<'_>, depth: usize) -> PResult<Criteria> {
    connective(input, depth, "or", Operator::Or, and_expr)
}

fn and_expr(input: &mut Input<'_>, depth: usize) -> PResult<Criteria> {
    connective(input, depth, "and", Operator::And, not_expr)
}

fn not_expr(input: &mut Input<'_>, depth: usize) -> PResult<Criteria> {
    if padded_keyword("not").parse_next(input).is_ok() {
        let depth = descend(input, depth)?;
        if padded_keyword("exists").parse_next(input).is_ok() {
            let operand = not_expr(input, depth)?;
            return Ok(Criteria::unary(Operator::NotExists, operand));
        }
        let operand = not_expr(input, depth)?;
        return Ok(Criteria::unary(Operator::Not, operand));
    }
    aggregated(input, depth)
}

/// `n FROM` after LAST / FIRST; input is untouched when absent
fn count_prefix(input: &mut Input<'_>) -> Option<i64> {
    let checkpoint = *input;
    let counted = ws(input)
        .and_then(|()| number(input))
        .ok()
        .and_then(|n| match n {
            Value::Integer(n) if n >= 0 => Some(n),
            _ => None,
        })
        .filter(|_| padded_keyword("from").parse_next(input).is_ok());
    if counted.is_none() {
        *input = checkpoint;
    }
    counted
}

fn aggregated(input: &mut Input<'_>, depth: usize) -> PResult<Criteria> {
    for (kw, operator) in [("last", Operator::Last), ("first", Operator::First)] {
        if padded_keyword(kw).parse_next(input).is_ok() {
            let depth = descend(input, depth)?;
            let count = count_prefix(input);
            let operand = aggregated(input, depth)?;
            return Ok(match count {
                Some(n) => Criteria::binary(operator, operand, Criteria::literal(n)),
                None => Criteria::unary(operator, operand),
            });
        }
    }

    let unary = [
        ("exists", Operator::Exists),
        ("count", Operator::Count),
        ("average", Operator::Average),
        ("distinct", Operator::Distinct),
    ];
    for (kw, operator) in unary {
        if padded_keyword(kw).parse_next(input).is_ok() {
            let depth = descend(input, depth)?;
            let operand = aggregated(input, depth)?;
            return Ok(Criteria::unary(operator, operand));
        }
    }

    conditioned(input, depth)
}

fn comparison_operator(input: &mut Input<'_>) -> Option<Operator> {
    // Two-character symbols first so `>=` is not read as `>`
    let symbols = [
        (">=", Operator::Gte),
        ("<=", Operator::Lte),
        ("=", Operator::Equals),
        (">", Operator::Gt),
        ("<", Operator::Lt),
    ];
    symbols
        .into_iter()
        .find(|(sym, _)| padded_lit(*sym).parse_next(input).is_ok())
        .map(|(_, op)| op)
}

fn conditioned(input: &mut Input<'_>, depth: usize) -> PResult<Criteria> {
    let mut expr = primary(input, depth)?;

    loop {
        if let Some(operator) = comparison_operator(input) {
            let rhs = operand(input)?;
            expr = Criteria::binary(operator, expr, rhs);
            continue;
        }

        let keyword_conditions = [
            ("contains", Operator::Contains),
            ("before", Operator::Before),
            ("after", Operator::After),
        ];
        if let Some((_, operator)) = keyword_conditions
            .into_iter()
            .find(|(kw, _)| padded_keyword(*kw).parse_next(input).is_ok())
        {
            let rhs = operand(input)?;
            expr = Criteria::binary(operator, expr, rhs);
            continue;
        }

        if padded_keyword("within").parse_next(input).is_ok() {
            ws(input)?;
            let rhs = if input.starts_with('$') {
                operand(input)?
            } else {
                Criteria::literal(duration_literal(input)?)
            };
            expr = Criteria::binary(Operator::Within, expr, rhs);
            continue;
        }

        if padded_keyword("as").parse_next(input).is_ok() {
            if padded_keyword("of").parse_next(input).is_err() {
                ws(input)?;
                return expected(input, "OF");
            }
            let rhs = operand(input)?;
            expr = Criteria::binary(Operator::AsOf, expr, rhs);
            continue;
        }

        return Ok(expr);
    }
}

fn token_text<'a>(input: &mut Input<'a>) -> PResult<&'a str> {
    take_while(1.., |c: char| c != '}').parse_next(input)
}

fn reference(input: &mut Input<'_>) -> PResult<Criteria> {
    char_lit(input, '{')?;
    let token = match token_text(input) {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => return expected(input, LABEL_TOKEN),
    };
    if char_lit(input, '}').is_err() {
        return expected(input, LABEL_TOKEN);
    }

    let mut reference = DataReference::new(token);
    if padded_lit("(").parse_next(input).is_ok() {
        loop {
            ws(input)?;
            let Ok(name) = identifier(input) else {
                return expected(input, LABEL_ARGUMENT);
            };
            if padded_lit("=").parse_next(input).is_err() {
                ws(input)?;
                return expected(input, "=");
            }
            ws(input)?;
            let value = literal(input)?;
            reference.args.insert(name.to_string(), value);

            if padded_lit(",").parse_next(input).is_ok() {
                continue;
            }
            if padded_lit(")").parse_next(input).is_ok() {
                break;
            }
            ws(input)?;
            return expected(input, LABEL_CLOSE_PAREN);
        }
    }
    Ok(Criteria::Reference(reference))
}

fn primary(input: &mut Input<'_>, depth: usize) -> PResult<Criteria> {
    ws(input)?;
    if input.starts_with('{') {
        return reference(input);
    }
    if padded_lit("(").parse_next(input).is_ok() {
        let depth = descend(input, depth)?;
        let inner = or_expr(input, depth)?;
        if padded_lit(")").parse_next(input).is_err() {
            ws(input)?;
            return expected(input, LABEL_CLOSE_PAREN);
        }
        return Ok(inner);
    }
    if starts_operand(input) {
        return operand(input);
    }
    expected(input, LABEL_EXPRESSION)
}

fn starts_operand(input: &str) -> bool {
    input.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '"' | '#' | '$'))
        || ["now", "today", "true", "false", "null"].into_iter().any(|kw| {
            let mut lookahead = input;
            keyword(kw).parse_next(&mut lookahead).is_ok()
        })
}

fn operand(input: &mut Input<'_>) -> PResult<Criteria> {
    ws(input)?;
    if char_lit(input, '$').is_ok() {
        return match identifier(input) {
            Ok(name) => Ok(Criteria::parameter(name)),
            Err(_) => expected(input, "parameter name"),
        };
    }
    if padded_keyword("now").parse_next(input).is_ok()
        || padded_keyword("today").parse_next(input).is_ok()
    {
        return Ok(Criteria::ReferenceTime);
    }
    if !starts_operand(input) {
        return expected(input, LABEL_OPERAND);
    }
    literal(input).map(Criteria::literal)
}

/// A literal value: duration, date, number, string, code, boolean or null
pub(crate) fn literal(input: &mut Input<'_>) -> PResult<Value> {
    if input.starts_with('"') {
        return string_literal(input).map(Value::Text);
    }
    if char_lit(input, '#').is_ok() {
        if !input.starts_with('"') {
            return expected(input, "quoted code");
        }
        let first = string_literal(input)?;
        // `#"system"|"code"` carries the code system
        if char_lit(input, '|').is_err() {
            return Ok(Value::Coded(Code::new(first)));
        }
        if !input.starts_with('"') {
            return expected(input, "quoted code");
        }
        let code = string_literal(input)?;
        return Ok(Value::Coded(Code::new(code).with_system(first)));
    }
    if padded_keyword("true").parse_next(input).is_ok() {
        return Ok(Value::Boolean(true));
    }
    if padded_keyword("false").parse_next(input).is_ok() {
        return Ok(Value::Boolean(false));
    }
    if padded_keyword("null").parse_next(input).is_ok() {
        return Ok(Value::Null);
    }
    if looks_like_date(input) {
        return date_literal(input).map(Value::Datetime);
    }
    if input.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        let n = match number(input) {
            Ok(n) => n,
            Err(_) => return expected(input, "number"),
        };
        // A trailing unit word turns the number into a duration
        let checkpoint = *input;
        ws(input)?;
        if let Ok(unit) = duration_unit(input) {
            let magnitude = n.as_number().unwrap_or_default();
            return Ok(Value::Duration(Duration::from_unit(unit, magnitude)));
        }
        *input = checkpoint;
        return Ok(n);
    }
    if input.is_empty() {
        return expected(input, LABEL_OPERAND);
    }
    expected(input, "literal")
}
