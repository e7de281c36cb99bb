//! Parser for the condition syntax.
//!
//! ```text
//! or    := and ("||" and)*
//! and   := unary ("&&" unary)*
//! unary := "!" unary | atom
//! atom  := "true" | "false" | "(" or ")" | name "(" value ")"
//! ```
//!
//! `flag(name)` is a flag reference; any other `name(value)` is a test.

use nom::{
  IResult,
  branch::alt,
  bytes::complete::{tag, take_while, take_while1},
  character::complete::{char, multispace0, satisfy},
  combinator::{all_consuming, map, not, recognize, value},
  multi::many0,
  sequence::{delimited, pair, preceded, terminated},
};

use super::{Expr, ExprError};

pub(crate) fn parse_expr(input: &str) -> Result<Expr, ExprError> {
  all_consuming(ws(or_expr))(input)
    .map(|(_, expr)| expr)
    .map_err(|e| ExprError::Parse {
      input: input.to_string(),
      message: e.to_string(),
    })
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
  F: FnMut(&'a str) -> IResult<&'a str, O>,
{
  delimited(multispace0, inner, multispace0)
}

fn is_ident_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn identifier(input: &str) -> IResult<&str, &str> {
  recognize(pair(
    satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
    take_while(is_ident_char),
  ))(input)
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
  terminated(tag(word), not(satisfy(is_ident_char)))
}

fn constant(input: &str) -> IResult<&str, Expr> {
  ws(alt((
    value(Expr::Const(true), keyword("true")),
    value(Expr::Const(false), keyword("false")),
  )))(input)
}

fn call(input: &str) -> IResult<&str, Expr> {
  let (input, name) = ws(identifier)(input)?;
  let (input, arg) = delimited(
    ws(char('(')),
    take_while1(|c: char| c != ')' && c != '(' && !c.is_whitespace()),
    ws(char(')')),
  )(input)?;
  let expr = if name == "flag" {
    Expr::Flag(arg.to_string())
  } else {
    Expr::Test(name.to_string(), arg.to_string())
  };
  Ok((input, expr))
}

fn parens(input: &str) -> IResult<&str, Expr> {
  delimited(ws(char('(')), or_expr, ws(char(')')))(input)
}

fn unary(input: &str) -> IResult<&str, Expr> {
  alt((map(preceded(ws(char('!')), unary), Expr::not), call, constant, parens))(input)
}

fn and_expr(input: &str) -> IResult<&str, Expr> {
  let (input, first) = unary(input)?;
  let (input, rest) = many0(preceded(ws(tag("&&")), unary))(input)?;
  Ok((input, rest.into_iter().fold(first, Expr::and)))
}

fn or_expr(input: &str) -> IResult<&str, Expr> {
  let (input, first) = and_expr(input)?;
  let (input, rest) = many0(preceded(ws(tag("||")), and_expr))(input)?;
  Ok((input, rest.into_iter().fold(first, Expr::or)))
}
