//! Infix to postfix conversion.
//!
//! Classic shunting-yard with `NOT` > `AND` > `OR`. Every operator is treated
//! as left-associative: a stacked operator of equal or higher precedence is
//! emitted before the incoming one is pushed.

use std::fmt;

use crate::error::QueryError;
use crate::query::{Operator, QueryToken};

/// A token of a postfix (RPN) query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpnToken {
    Term(String),
    Op(Operator),
}

impl fmt::Display for RpnToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpnToken::Term(t) => f.write_str(t),
            RpnToken::Op(op) => write!(f, "{op}"),
        }
    }
}

/// Operator stack entry; an open group or a pending operator.
#[derive(Debug, Clone, Copy)]
enum Stacked {
    Group(usize),
    Op(Operator),
}

/// Converts infix tokens to postfix order.
pub fn shunting_yard(tokens: Vec<QueryToken>) -> Result<Vec<RpnToken>, QueryError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Stacked> = Vec::new();

    for (index, token) in tokens.into_iter().enumerate() {
        match token {
            QueryToken::Term(term) => output.push(RpnToken::Term(term)),
            QueryToken::Op(op) => {
                while let Some(&Stacked::Op(top)) = stack.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    stack.pop();
                    output.push(RpnToken::Op(top));
                }
                stack.push(Stacked::Op(op));
            }
            QueryToken::LParen => stack.push(Stacked::Group(index)),
            QueryToken::RParen => loop {
                match stack.pop() {
                    Some(Stacked::Op(op)) => output.push(RpnToken::Op(op)),
                    Some(Stacked::Group(_)) => break,
                    None => {
                        return Err(QueryError::malformed(
                            "closing parenthesis without a matching '('",
                            Some(index),
                        ))
                    }
                }
            },
        }
    }

    while let Some(entry) = stack.pop() {
        match entry {
            Stacked::Op(op) => output.push(RpnToken::Op(op)),
            Stacked::Group(index) => {
                return Err(QueryError::malformed("unclosed parenthesis", Some(index)));
            }
        }
    }

    Ok(output)
}

/// Renders an RPN sequence for logging, e.g. `[a, b, AND]`.
pub fn format_rpn(rpn: &[RpnToken]) -> String {
    let parts: Vec<String> = rpn.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::tokenize_query;
    use crate::tokenizer::IdentityNormalizer;

    fn rpn(query: &str) -> Result<String, QueryError> {
        let tokens = tokenize_query(query, &IdentityNormalizer);
        shunting_yard(tokens).map(|r| format_rpn(&r))
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(rpn("a AND b OR c").unwrap(), "[a, b, AND, c, OR]");
        assert_eq!(rpn("a OR b AND c").unwrap(), "[a, b, c, AND, OR]");
    }

    #[test]
    fn parentheses_group() {
        assert_eq!(rpn("a AND ( b OR c )").unwrap(), "[a, b, c, OR, AND]");
        assert_eq!(rpn("(a OR b) AND (c OR d)").unwrap(), "[a, b, OR, c, d, OR, AND]");
    }

    #[test]
    fn not_binds_tightest() {
        assert_eq!(rpn("a AND NOT b").unwrap(), "[a, b, NOT, AND]");
        assert_eq!(rpn("NOT a AND b").unwrap(), "[a, NOT, b, AND]");
        assert_eq!(rpn("a OR NOT b").unwrap(), "[a, b, NOT, OR]");
    }

    #[test]
    fn equal_precedence_is_left_associative() {
        assert_eq!(rpn("a AND b AND c").unwrap(), "[a, b, AND, c, AND]");
        assert_eq!(rpn("a OR b OR c").unwrap(), "[a, b, OR, c, OR]");
    }

    #[test]
    fn unbalanced_parentheses() {
        let err = rpn("( a AND b").unwrap_err();
        assert!(matches!(err, QueryError::Malformed { token_index: Some(0), .. }));
        let err = rpn("a AND b )").unwrap_err();
        assert!(matches!(err, QueryError::Malformed { token_index: Some(3), .. }));
        assert!(rpn("((a)").is_err());
    }

    #[test]
    fn single_term() {
        assert_eq!(rpn("cat").unwrap(), "[cat]");
        assert_eq!(rpn("").unwrap(), "[]");
    }
}
