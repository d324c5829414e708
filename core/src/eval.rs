//! Postfix evaluation.
//!
//! Operands stay as pending terms until an operator consumes them, so a
//! posting list is only read when it takes part in a merge. `NOT` looks one
//! token ahead: `x y NOT AND` runs as `x ANDNOT y` and `x y NOT OR` as
//! `x OR (all ANDNOT y)`; the following operator is consumed with it.

use crate::error::QueryError;
use crate::index::{Dictionary, IndexHandle, PostingsStore};
use crate::posting::PostingList;
use crate::query::{tokenize_query, Operator};
use crate::shunting_yard::{format_rpn, shunting_yard, RpnToken};
use crate::tokenizer::Normalizer;

/// An operand on the evaluation stack.
#[derive(Debug)]
enum Operand {
    /// A normalized term not yet looked up.
    Pending(String),
    Resolved(PostingList),
}

/// Evaluates RPN sequences against one index handle.
pub struct Evaluator<'a, D, S> {
    index: &'a IndexHandle<D, S>,
    universe: Option<PostingList>,
}

impl<'a, D: Dictionary, S: PostingsStore> Evaluator<'a, D, S> {
    pub fn new(index: &'a IndexHandle<D, S>) -> Self {
        Self { index, universe: None }
    }

    fn resolve(&self, operand: Operand) -> Result<PostingList, QueryError> {
        match operand {
            Operand::Pending(term) => self.index.postings(&term),
            Operand::Resolved(list) => Ok(list),
        }
    }

    /// `all_documents_combined`, read at most once per evaluator.
    fn universe(&mut self) -> Result<&PostingList, QueryError> {
        if self.universe.is_none() {
            self.universe = Some(self.index.all_documents()?);
        }
        Ok(self.universe.get_or_insert_with(PostingList::empty))
    }

    fn complement(&mut self, list: &PostingList) -> Result<PostingList, QueryError> {
        Ok(self.universe()?.difference(list))
    }

    /// Pops `(left, right)` for a binary operator and resolves both, left first.
    fn pop_pair(
        &self,
        stack: &mut Vec<Operand>,
        op: &str,
        position: usize,
    ) -> Result<(PostingList, PostingList), QueryError> {
        let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
            return Err(QueryError::malformed(format!("{op} needs two operands"), Some(position)));
        };
        let left = self.resolve(left)?;
        let right = self.resolve(right)?;
        Ok((left, right))
    }

    pub fn run(&mut self, rpn: &[RpnToken]) -> Result<PostingList, QueryError> {
        let mut stack: Vec<Operand> = Vec::new();
        let mut i = 0;
        while i < rpn.len() {
            match &rpn[i] {
                RpnToken::Term(term) => stack.push(Operand::Pending(term.clone())),
                RpnToken::Op(Operator::And) => {
                    let (left, right) = self.pop_pair(&mut stack, "AND", i)?;
                    stack.push(Operand::Resolved(left.intersect(&right)));
                }
                RpnToken::Op(Operator::Or) => {
                    let (left, right) = self.pop_pair(&mut stack, "OR", i)?;
                    stack.push(Operand::Resolved(left.union(&right)));
                }
                RpnToken::Op(Operator::Not) => match rpn.get(i + 1) {
                    Some(RpnToken::Op(Operator::And)) => {
                        let (left, right) = self.pop_pair(&mut stack, "AND NOT", i)?;
                        stack.push(Operand::Resolved(left.difference(&right)));
                        i += 1;
                    }
                    Some(RpnToken::Op(Operator::Or)) => {
                        let (left, right) = self.pop_pair(&mut stack, "OR NOT", i)?;
                        let negated = self.complement(&right)?;
                        stack.push(Operand::Resolved(left.union(&negated)));
                        i += 1;
                    }
                    _ => {
                        let Some(operand) = stack.pop() else {
                            return Err(QueryError::malformed("NOT needs an operand", Some(i)));
                        };
                        let operand = self.resolve(operand)?;
                        stack.push(Operand::Resolved(self.complement(&operand)?));
                    }
                },
            }
            i += 1;
        }

        match stack.len() {
            0 => Ok(PostingList::empty()),
            1 => match stack.pop() {
                Some(operand) => self.resolve(operand),
                None => Ok(PostingList::empty()),
            },
            n => Err(QueryError::malformed(format!("{n} operands left without an operator"), None)),
        }
    }
}

/// Evaluates an RPN sequence with a fresh evaluator.
pub fn evaluate_rpn<D: Dictionary, S: PostingsStore>(
    index: &IndexHandle<D, S>,
    rpn: &[RpnToken],
) -> Result<PostingList, QueryError> {
    Evaluator::new(index).run(rpn)
}

/// Tokenizes, parses and evaluates one raw query line.
pub fn evaluate<D, S, N>(index: &IndexHandle<D, S>, normalizer: &N, query: &str) -> Result<PostingList, QueryError>
where
    D: Dictionary,
    S: PostingsStore,
    N: Normalizer + ?Sized,
{
    let rpn = shunting_yard(tokenize_query(query, normalizer))?;
    tracing::debug!(query = query.trim(), rpn = %format_rpn(&rpn), "evaluating query");
    evaluate_rpn(index, &rpn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryIndex;
    use crate::tokenizer::IdentityNormalizer;

    fn pets() -> MemoryIndex {
        MemoryIndex::from_postings([
            ("cat", vec![1, 3, 5]),
            ("dog", vec![2, 3, 4]),
            ("fish", vec![4, 5, 6]),
        ])
        .unwrap()
    }

    fn run(index: &MemoryIndex, query: &str) -> Vec<u32> {
        evaluate(&index.handle(), &IdentityNormalizer, query).unwrap().into_doc_ids()
    }

    #[test]
    fn binary_operators() {
        let index = pets();
        assert_eq!(run(&index, "cat AND dog"), vec![3]);
        assert_eq!(run(&index, "cat OR dog"), vec![1, 2, 3, 4, 5]);
        assert_eq!(run(&index, "cat OR dog AND fish"), vec![1, 3, 4, 5]);
        assert_eq!(run(&index, "(cat OR dog) AND fish"), vec![4, 5]);
    }

    #[test]
    fn fused_not_forms() {
        let index = pets();
        assert_eq!(run(&index, "cat AND NOT dog"), vec![1, 5]);
        // universe is 1..=6
        assert_eq!(run(&index, "cat OR NOT dog"), vec![1, 3, 5, 6]);
        assert_eq!(run(&index, "NOT cat"), vec![2, 4, 6]);
        assert_eq!(run(&index, "NOT cat AND dog"), vec![2, 4]);
        assert_eq!(run(&index, "NOT cat AND NOT dog"), vec![6]);
        assert_eq!(run(&index, "NOT (cat OR dog)"), vec![6]);
    }

    #[test]
    fn nested_not_inside_or() {
        let index = pets();
        // cat OR (dog ANDNOT fish)
        assert_eq!(run(&index, "cat OR dog AND NOT fish"), vec![1, 2, 3, 5]);
        assert_eq!(run(&index, "fish AND NOT (cat OR dog)"), vec![6]);
    }

    #[test]
    fn single_and_unknown_terms() {
        let index = pets();
        assert_eq!(run(&index, "fish"), vec![4, 5, 6]);
        assert!(run(&index, "zzzz").is_empty());
        assert!(run(&index, "zzzz AND cat").is_empty());
        assert_eq!(run(&index, "zzzz OR cat"), vec![1, 3, 5]);
        assert_eq!(run(&index, "NOT zzzz"), vec![1, 2, 3, 4, 5, 6]);
        assert!(run(&index, "").is_empty());
    }

    #[test]
    fn malformed_arrangements() {
        let index = pets();
        let handle = index.handle();
        for query in ["cat AND", "AND", "cat dog", "NOT", "cat NOT dog", "( cat", "cat )"] {
            let err = evaluate(&handle, &IdentityNormalizer, query).unwrap_err();
            assert!(err.is_malformed(), "{query} should be malformed");
        }
    }

    #[test]
    fn rpn_entry_point() {
        let index = pets();
        let rpn = vec![
            RpnToken::Term("cat".into()),
            RpnToken::Term("dog".into()),
            RpnToken::Op(Operator::Not),
            RpnToken::Op(Operator::And),
        ];
        assert_eq!(evaluate_rpn(&index.handle(), &rpn).unwrap().doc_ids(), &[1, 5]);
    }
}
