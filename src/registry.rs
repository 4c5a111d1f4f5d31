/*
 * AEVUMDB COMMUNITY LICENSE
 * Version 1.0, February 2026
 *
 * Copyright (c) 2026 Ananda Firmansyah.
 * Official Organization: AevumDB (https://github.com/aevumdb)
 *
 * This source code is licensed under the AevumDB Community License.
 * You may not use this file except in compliance with the License.
 * A copy of the License is located at the root of this repository.
 *
 * UNLESS REQUIRED BY APPLICABLE LAW OR AGREED TO IN WRITING, SOFTWARE
 * DISTRIBUTED UNDER THE LICENSE IS PROVIDED "AS IS", WITHOUT WARRANTY
 * OF ANY KIND, EITHER EXPRESS OR IMPLIED.
 */

//! # Operator Registry
//!
//! A dense `#[repr(u8)]` enum plus a `FromStr` mapping and a static
//! arity/mode table, following a JSONLogic-style opcode dispatcher rather
//! than a string-keyed map: at ~60 operators the whole set fits in one
//! table, so there's no need to split a hot-path enum from a string
//! long-tail. The compiler consults [`OpCode::info`] to validate arity and
//! mode before recursing into an operator's argument subtrees; the
//! evaluator matches on `OpCode` directly for O(1) dispatch.

use std::str::FromStr;

/// How many arguments an operator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Range(usize, usize),
    Min(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Fixed(k) => n == k,
            Arity::Range(lo, hi) => (lo..=hi).contains(&n),
            Arity::Min(lo) => n >= lo,
        }
    }

    /// The value reported in `"<op> expression must resolve to array(<N>)"`
    /// compile errors: the fixed arity, or the lower bound of a range.
    pub fn reported(&self) -> usize {
        match *self {
            Arity::Fixed(k) => k,
            Arity::Range(lo, _) => lo,
            Arity::Min(lo) => lo,
        }
    }
}

/// Which compilation mode(s) an operator is valid in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    MatchOnly,
    ExprOnly,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorInfo {
    pub name: &'static str,
    pub mode: ModeKind,
    /// Arity when invoked in expression-call form, e.g. `{$gt: [a, b]}`.
    /// Field-predicate invocations (`{field: {$gt: b}}`) take one fewer
    /// argument (the field itself supplies the implicit first operand)
    /// and are arity-checked separately by the compiler.
    pub expr_arity: Arity,
}

macro_rules! opcodes {
    ($($variant:ident => $name:literal, $mode:ident, $arity:expr;)*) => {
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum OpCode {
            $($variant,)*
        }

        impl OpCode {
            pub fn info(self) -> OperatorInfo {
                match self {
                    $(OpCode::$variant => OperatorInfo {
                        name: $name,
                        mode: ModeKind::$mode,
                        expr_arity: $arity,
                    },)*
                }
            }
        }

        impl FromStr for OpCode {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(OpCode::$variant),)*
                    _ => Err(()),
                }
            }
        }
    };
}

opcodes! {
    // --- Comparison (match & expr) ---
    Eq    => "$eq",    Both,     Arity::Fixed(2);
    Ne    => "$ne",    Both,     Arity::Fixed(2);
    Gt    => "$gt",    Both,     Arity::Fixed(2);
    Gte   => "$gte",   Both,     Arity::Fixed(2);
    Lt    => "$lt",    Both,     Arity::Fixed(2);
    Lte   => "$lte",   Both,     Arity::Fixed(2);
    Cmp   => "$cmp",   ExprOnly, Arity::Fixed(2);
    In    => "$in",    Both,     Arity::Fixed(2);
    Nin   => "$nin",   Both,     Arity::Fixed(2);

    // --- Element ---
    Exists  => "$exists",  MatchOnly, Arity::Fixed(1);
    Type    => "$type",    MatchOnly, Arity::Fixed(1);
    Size    => "$size",    MatchOnly, Arity::Fixed(1);
    All     => "$all",     MatchOnly, Arity::Fixed(1);
    Mod     => "$mod",     Both,      Arity::Fixed(2);
    Matches => "$matches", MatchOnly, Arity::Fixed(1);

    // --- Logical ---
    And => "$and", Both,      Arity::Min(0);
    Or  => "$or",  Both,      Arity::Min(0);
    Nor => "$nor", MatchOnly, Arity::Min(0);
    Not => "$not", Both,      Arity::Fixed(1);

    // --- Meta: $expr switches the rest of the subtree into expression mode ---
    Expr => "$expr", MatchOnly, Arity::Fixed(1);

    // --- Conditional (value-producing, not a dedicated Node variant) ---
    IfNull => "$ifNull", ExprOnly, Arity::Fixed(2);

    // --- Arithmetic ---
    Add      => "$add",      ExprOnly, Arity::Min(1);
    Subtract => "$subtract", ExprOnly, Arity::Fixed(2);
    Multiply => "$multiply", ExprOnly, Arity::Min(1);
    Divide   => "$divide",   ExprOnly, Arity::Fixed(2);
    Abs      => "$abs",      ExprOnly, Arity::Fixed(1);
    Ceil     => "$ceil",     ExprOnly, Arity::Fixed(1);
    Floor    => "$floor",    ExprOnly, Arity::Fixed(1);
    Round    => "$round",    ExprOnly, Arity::Range(1, 2);
    Trunc    => "$trunc",    ExprOnly, Arity::Range(1, 2);
    Sqrt     => "$sqrt",     ExprOnly, Arity::Fixed(1);
    Max      => "$max",      ExprOnly, Arity::Min(1);
    Min      => "$min",      ExprOnly, Arity::Min(1);

    // --- String ---
    ToLower     => "$toLower",     ExprOnly, Arity::Fixed(1);
    ToUpper     => "$toUpper",     ExprOnly, Arity::Fixed(1);
    Concat      => "$concat",      ExprOnly, Arity::Min(0);
    Split       => "$split",       ExprOnly, Arity::Fixed(2);
    Substr      => "$substr",      ExprOnly, Arity::Fixed(3);
    SubstrBytes => "$substrBytes", ExprOnly, Arity::Fixed(3);
    StrLenBytes => "$strLenBytes", ExprOnly, Arity::Fixed(1);
    Strcasecmp  => "$strcasecmp",  ExprOnly, Arity::Fixed(2);
    Contains    => "$contains",    ExprOnly, Arity::Fixed(2);
    StartsWith  => "$startsWith",  ExprOnly, Arity::Fixed(2);
    EndsWith    => "$endsWith",    ExprOnly, Arity::Fixed(2);
    Trim        => "$trim",        ExprOnly, Arity::Range(1, 2);
    Ltrim       => "$ltrim",       ExprOnly, Arity::Range(1, 2);
    Rtrim       => "$rtrim",       ExprOnly, Arity::Range(1, 2);

    // --- Type conversion ---
    IsNumber  => "$isNumber",  ExprOnly, Arity::Fixed(1);
    ToStringOp => "$toString", ExprOnly, Arity::Fixed(1);
    ToBool    => "$toBool",    ExprOnly, Arity::Fixed(1);
    ToBoolEx  => "$toBoolEx",  ExprOnly, Arity::Fixed(1);
    ToLong    => "$toLong",    ExprOnly, Arity::Fixed(1);
    ToInt     => "$toInt",     ExprOnly, Arity::Fixed(1);
    ToDecimal => "$toDecimal", ExprOnly, Arity::Fixed(1);

    // --- Internal only: never reachable via `$`-prefixed source syntax.
    // The compiler uses these to represent literal arrays/objects that
    // still need nested "$path" strings resolved element-wise.
    ArrayLit  => "\u{0}arrayLit",  ExprOnly, Arity::Min(0);
    ObjectLit => "\u{0}objectLit", ExprOnly, Arity::Min(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_operators() {
        assert_eq!(OpCode::from_str("$gt"), Ok(OpCode::Gt));
        assert_eq!(OpCode::from_str("$ifNull"), Ok(OpCode::IfNull));
        assert!(OpCode::from_str("$bogus").is_err());
    }

    #[test]
    fn arity_checks() {
        assert!(Arity::Fixed(2).accepts(2));
        assert!(!Arity::Fixed(2).accepts(1));
        assert!(Arity::Range(1, 2).accepts(1));
        assert!(Arity::Range(1, 2).accepts(2));
        assert!(!Arity::Range(1, 2).accepts(3));
        assert!(Arity::Min(1).accepts(5));
        assert!(!Arity::Min(1).accepts(0));
    }

    #[test]
    fn exists_is_match_only() {
        assert_eq!(OpCode::Exists.info().mode, ModeKind::MatchOnly);
        assert_eq!(OpCode::Add.info().mode, ModeKind::ExprOnly);
        assert_eq!(OpCode::Eq.info().mode, ModeKind::Both);
    }
}
