//! # Templink Expr
//!
//! Trigger expressions as structured values.
//!
//! A stored trigger expression is text whose leaves are function references
//! in `{<function-id>}` placeholder form, e.g. `{34217}>5`. Linking rewrites
//! those references (template function ids become host function ids), and
//! the rewrite must never touch anything but whole placeholders: textual
//! substitution of `{17}` inside `{173}` is exactly the class of bug this
//! crate exists to rule out.
//!
//! [`Expression`] parses the text once into a segment list (placeholders and
//! opaque text runs), rewrites by node substitution and serializes back.
//! `parse` followed by `serialize` is the identity on any accepted input.
//!
//! Braced tokens that are not all digits (user macros `{$X}`, LLD macros
//! `{#Y}`, built-ins `{TRIGGER.VALUE}`) are preserved as text.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::fmt;
use thiserror::Error;

/// Result type for expression operations.
pub type ExprResult<T> = Result<T, ExprError>;

/// A function identifier as referenced from expressions.
pub type FunctionId = u64;

/// Errors raised while parsing or rewriting an expression.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExprError {
    /// A `{` without a matching `}`.
    #[error("unterminated function reference at offset {offset}")]
    Unterminated {
        /// Byte offset of the opening brace.
        offset: usize,
    },

    /// An empty `{}` pair.
    #[error("empty function reference at offset {offset}")]
    EmptyReference {
        /// Byte offset of the opening brace.
        offset: usize,
    },

    /// A numeric reference that does not fit a function id.
    #[error("function id out of range at offset {offset}")]
    IdOutOfRange {
        /// Byte offset of the opening brace.
        offset: usize,
    },

    /// A placeholder survived a rewrite that should have replaced it.
    #[error("expression still references function {function_id} after rewrite")]
    StaleReference {
        /// The function id left behind.
        function_id: FunctionId,
    },
}

/// One node of a parsed expression.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// An opaque text run: operators, constants, macros.
    Text(String),
    /// A `{<id>}` function reference.
    Function(FunctionId),
}

/// A parsed trigger expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    segments: Vec<Segment>,
}

impl Expression {
    /// Parses placeholder-form expression text.
    ///
    /// Only all-digit braced tokens become function references; other
    /// braced tokens (macros) stay text. An empty expression parses to an
    /// empty segment list.
    pub fn parse(text: &str) -> ExprResult<Self> {
        let bytes = text.as_bytes();
        let mut segments = Vec::new();
        let mut run_start = 0usize;
        let mut pos = 0usize;

        while pos < bytes.len() {
            if bytes[pos] != b'{' {
                pos += 1;
                continue;
            }

            let close = text[pos..]
                .find('}')
                .map(|off| pos + off)
                .ok_or(ExprError::Unterminated { offset: pos })?;
            let inner = &text[pos + 1..close];

            if inner.is_empty() {
                return Err(ExprError::EmptyReference { offset: pos });
            }

            if inner.bytes().all(|b| b.is_ascii_digit()) {
                let id: FunctionId = inner
                    .parse()
                    .map_err(|_| ExprError::IdOutOfRange { offset: pos })?;
                if run_start < pos {
                    segments.push(Segment::Text(text[run_start..pos].to_string()));
                }
                segments.push(Segment::Function(id));
                run_start = close + 1;
            }
            // a macro reference; the whole token stays in the text run

            pos = close + 1;
        }

        if run_start < text.len() {
            segments.push(Segment::Text(text[run_start..].to_string()));
        }

        Ok(Expression { segments })
    }

    /// Reconstructs the expression text.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Function(id) => {
                    out.push('{');
                    out.push_str(&id.to_string());
                    out.push('}');
                }
            }
        }
        out
    }

    /// Function ids referenced, in textual order, deduplicated.
    pub fn function_ids(&self) -> Vec<FunctionId> {
        let mut ids = Vec::new();
        for segment in &self.segments {
            if let Segment::Function(id) = segment {
                if !ids.contains(id) {
                    ids.push(*id);
                }
            }
        }
        ids
    }

    /// Replaces every reference to `old` with `new`. Returns the number of
    /// nodes replaced.
    pub fn replace_function_id(&mut self, old: FunctionId, new: FunctionId) -> usize {
        let mut replaced = 0;
        for segment in &mut self.segments {
            if let Segment::Function(id) = segment {
                if *id == old {
                    *id = new;
                    replaced += 1;
                }
            }
        }
        replaced
    }

    /// Verifies that none of the given stale ids survived a rewrite.
    ///
    /// Called after every template function id has been substituted; a
    /// leftover means a template function had no host counterpart, which is
    /// a broken linkage invariant.
    pub fn validate_replaced(&self, stale: &[FunctionId]) -> ExprResult<()> {
        for segment in &self.segments {
            if let Segment::Function(id) = segment {
                if stale.contains(id) {
                    return Err(ExprError::StaleReference { function_id: *id });
                }
            }
        }
        Ok(())
    }

    /// True when the expression references no functions at all.
    pub fn is_constant(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Text(_)))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// Rewrites `text` by substituting each `(old, new)` pair and returns the
/// serialized result.
///
/// This is the equivalence-normal form used when comparing a host trigger
/// against a template trigger: the host expression with its function ids
/// replaced by the matching template function ids.
pub fn rewrite(text: &str, pairs: &[(FunctionId, FunctionId)]) -> ExprResult<String> {
    let mut expr = Expression::parse(text)?;
    for (old, new) in pairs {
        expr.replace_function_id(*old, *new);
    }
    Ok(expr.serialize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serialize_identity() {
        for text in [
            "",
            "{1}>5",
            "({12}>0) and ({13}<2)",
            "{$THRESHOLD}<{17}",
            "{TRIGGER.VALUE}=1 and {42}>0",
            "last(/host/key)=0",
        ] {
            let expr = Expression::parse(text).unwrap();
            assert_eq!(expr.serialize(), text);
        }
    }

    #[test]
    fn function_ids_in_order_without_duplicates() {
        let expr = Expression::parse("{7}>0 or {3}<1 or {7}={3}").unwrap();
        assert_eq!(expr.function_ids(), vec![7, 3]);
    }

    #[test]
    fn macros_are_not_function_references() {
        let expr = Expression::parse("{$LIMIT}<{5}").unwrap();
        assert_eq!(expr.function_ids(), vec![5]);
    }

    #[test]
    fn substring_ids_are_not_rewritten() {
        // the classic textual-substitution hazard: 17 inside 173
        let mut expr = Expression::parse("{17}+{173}").unwrap();
        expr.replace_function_id(17, 900);
        assert_eq!(expr.serialize(), "{900}+{173}");
    }

    #[test]
    fn replace_counts_nodes() {
        let mut expr = Expression::parse("{4}>{4}").unwrap();
        assert_eq!(expr.replace_function_id(4, 8), 2);
        assert_eq!(expr.replace_function_id(4, 8), 0);
    }

    #[test]
    fn unterminated_reference_is_rejected() {
        assert_eq!(
            Expression::parse("{123"),
            Err(ExprError::Unterminated { offset: 0 })
        );
    }

    #[test]
    fn empty_reference_is_rejected() {
        assert_eq!(
            Expression::parse("a{}b"),
            Err(ExprError::EmptyReference { offset: 1 })
        );
    }

    #[test]
    fn oversized_id_is_rejected() {
        let text = format!("{{{}}}", "9".repeat(40));
        assert!(matches!(
            Expression::parse(&text),
            Err(ExprError::IdOutOfRange { .. })
        ));
    }

    #[test]
    fn validate_replaced_catches_leftovers() {
        let mut expr = Expression::parse("{1}and{2}").unwrap();
        expr.replace_function_id(1, 100);
        assert_eq!(
            expr.validate_replaced(&[1, 2]),
            Err(ExprError::StaleReference { function_id: 2 })
        );
        expr.replace_function_id(2, 200);
        assert!(expr.validate_replaced(&[1, 2]).is_ok());
    }

    #[test]
    fn rewrite_helper_applies_all_pairs() {
        let out = rewrite("{9}>5 and {8}<1", &[(9, 1), (8, 2)]).unwrap();
        assert_eq!(out, "{1}>5 and {2}<1");
    }

    #[test]
    fn constant_expression() {
        assert!(Expression::parse("1=1").unwrap().is_constant());
        assert!(!Expression::parse("{3}=1").unwrap().is_constant());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn expression_text() -> impl Strategy<Value = String> {
            // interleave text runs (no braces) with function references
            prop::collection::vec(
                prop_oneof![
                    "[a-z><=+ ]{1,8}".prop_map(|t| t),
                    (1u64..100_000u64).prop_map(|id| format!("{{{id}}}")),
                ],
                0..12,
            )
            .prop_map(|parts| parts.concat())
        }

        proptest! {
            #[test]
            fn parse_then_serialize_roundtrips(text in expression_text()) {
                let expr = Expression::parse(&text).unwrap();
                prop_assert_eq!(expr.serialize(), text);
            }

            #[test]
            fn rewrite_leaves_no_stale_ids(text in expression_text(), base in 1_000_000u64..2_000_000u64) {
                let mut expr = Expression::parse(&text).unwrap();
                let old_ids = expr.function_ids();
                for (i, old) in old_ids.iter().enumerate() {
                    expr.replace_function_id(*old, base + i as u64);
                }
                prop_assert!(expr.validate_replaced(&old_ids).is_ok());
            }
        }
    }
}
