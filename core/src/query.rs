//! Query lexer.
//!
//! Splits one raw query line into operators, parentheses and normalized terms.

use std::fmt;

use crate::tokenizer::Normalizer;

/// A Boolean operator of the query language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    And,
    Or,
    Not,
}

impl Operator {
    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Not => 3,
            Operator::And => 2,
            Operator::Or => 1,
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "AND" => Some(Operator::And),
            "OR" => Some(Operator::Or),
            "NOT" => Some(Operator::Not),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
        })
    }
}

/// A token of an infix query, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryToken {
    /// A normalized search term.
    Term(String),
    Op(Operator),
    LParen,
    RParen,
}

/// Tokenizes a query line, normalizing every term through `normalizer`.
///
/// Operators are recognized only in upper case; `and` is an ordinary term.
/// Terms that normalize to nothing are dropped.
pub fn tokenize_query<N: Normalizer + ?Sized>(query: &str, normalizer: &N) -> Vec<QueryToken> {
    let padded = query.replace('(', " ( ").replace(')', " ) ");
    padded
        .split_whitespace()
        .filter_map(|word| match word {
            "(" => Some(QueryToken::LParen),
            ")" => Some(QueryToken::RParen),
            _ => match Operator::from_keyword(word) {
                Some(op) => Some(QueryToken::Op(op)),
                None => {
                    let term = normalizer.normalize(word);
                    (!term.is_empty()).then_some(QueryToken::Term(term))
                }
            },
        })
        .collect()
}
