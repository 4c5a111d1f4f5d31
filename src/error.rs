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

//! Error types for the three failure kinds the engine recognizes: compile
//! errors (surfaced synchronously, before any evaluation), evaluation
//! errors (caught per-document by the driver), and source/iterator errors
//! (propagated from the queue collaborator, aborting the filter call).

use thiserror::Error;

/// Raised while compiling a query document into an executable tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    #[error("{op} expression must resolve to array({expected})")]
    Arity { op: String, expected: usize },

    #[error("{op} requires at least {min} argument(s)")]
    TooFewArguments { op: String, min: usize },

    #[error("{op} cannot be used in {mode} mode")]
    WrongMode { op: String, mode: &'static str },

    #[error("malformed branch in {op}: {reason}")]
    MalformedBranch { op: String, reason: String },

    #[error("query nesting exceeds maximum depth of {0}")]
    DepthExceeded(usize),

    #[error("{0}")]
    Other(String),
}

/// Raised while evaluating a compiled query against a single document.
/// Caught by the Filter Driver: the offending document is treated as
/// non-matching, never propagated as a [`FilterError`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("{op} does not support operand of type {ty}")]
    UnsupportedType { op: String, ty: &'static str },

    #[error("division by zero in {op}")]
    DivisionByZero { op: String },

    #[error("invalid regex pattern {pattern:?}: {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Top-level error returned by the Filter Driver.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("queue source error: {0}")]
    Source(Box<dyn std::error::Error + Send + Sync>),
}
