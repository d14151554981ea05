//! The tokenizer's regular expression sublanguage.
//!
//! Patterns are parsed into an [Expr] tree and compiled to an [Nfa] whose simulation
//! reports the longest matching prefix at the current buffer position. The dialect covers
//! character literals with `\` escapes, classes with ranges and negation, `.`, alternation,
//! grouping, the quantifiers `? * + {m} {m,n} {m,}` and the meta escapes
//! `\d \D \s \S \w \W \n \r \t`. Case folding happens at compile time; the tokenizer folds
//! input characters once on read.

mod nfa;
mod parser;

#[cfg(test)]
mod __tests__;

pub(crate) use nfa::Nfa;
pub(crate) use parser::parse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Expr {
    Alternation(Vec<Expr>),
    Sequence(Vec<Expr>),
    Repeat(Box<Expr>, usize, usize),
    Literal(char),
    Any,
    Class { items: Vec<ClassItem>, negated: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClassItem {
    Char(char),
    Range(char, char),
    Digit,
    NotDigit,
    Space,
    NotSpace,
    Word,
    NotWord,
}

/// Single-character upper-case fold used for case-insensitive matching.
pub(crate) fn fold(c: char) -> char {
    c.to_uppercase().next().unwrap_or(c)
}

impl ClassItem {
    pub fn matches(&self, c: char) -> bool {
        match self {
            ClassItem::Char(item) => c == *item,
            ClassItem::Range(low, high) => *low <= c && c <= *high,
            ClassItem::Digit => c.is_ascii_digit(),
            ClassItem::NotDigit => !c.is_ascii_digit(),
            ClassItem::Space => c.is_whitespace(),
            ClassItem::NotSpace => !c.is_whitespace(),
            ClassItem::Word => c.is_alphanumeric() || c == '_',
            ClassItem::NotWord => !(c.is_alphanumeric() || c == '_'),
        }
    }

    fn folded(&self) -> ClassItem {
        match self {
            ClassItem::Char(c) => ClassItem::Char(fold(*c)),
            ClassItem::Range(low, high) => ClassItem::Range(fold(*low), fold(*high)),
            other => *other,
        }
    }
}

impl Expr {
    /// Whether the expression can match the empty string. A token pattern matching the
    /// empty string could never make scanning progress and is rejected at registration.
    pub fn is_nullable(&self) -> bool {
        match self {
            Expr::Alternation(branches) => branches.iter().any(Expr::is_nullable),
            Expr::Sequence(items) => items.iter().all(Expr::is_nullable),
            Expr::Repeat(inner, min, _) => *min == 0 || inner.is_nullable(),
            Expr::Literal(_) | Expr::Any | Expr::Class { .. } => false,
        }
    }
}
