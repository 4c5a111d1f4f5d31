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

//! # Job Filter Engine
//!
//! A MongoDB-style document-query engine for filtering queued job records.
//! A query document is compiled once into a [`compiler::Node`] tree, then
//! evaluated against any number of documents.
//!
//! ```
//! use job_filter_engine::{Config, Driver};
//!
//! let driver = Driver::new(Config::default());
//! ```
//!
//! The crate is organized around five collaborators:
//!
//! * [`value`] — the tagged [`Value`] union every other module shares.
//! * [`path`] — dotted-path resolution with array fan-out.
//! * [`document`] — projects a [`document::RawJob`] into a queryable `Value`.
//! * [`compiler`] — parses a query document into an executable tree.
//! * [`evaluator`] — walks that tree against a document.
//! * [`driver`] — wires compilation and evaluation to a [`driver::JobSource`].

mod compiler;
mod config;
mod document;
mod driver;
mod error;
mod evaluator;
mod path;
mod regex_cache;
mod registry;
mod value;

pub use compiler::Node;
pub use config::Config;
pub use document::{project, RawJob};
pub use driver::{Driver, FilterResult, JobSource};
pub use error::{CompileError, EvalError, FilterError};
pub use evaluator::{eval_expr, eval_match};
pub use path::resolve_path;
pub use registry::OpCode;
pub use value::{Fields, Value};

/// Compiles a query document into an executable tree without constructing
/// a full [`Driver`]; useful for embedding the engine in a context that
/// already owns its own document source and only needs compile+evaluate.
pub fn compile(query: &serde_json::Value, config: &Config) -> Result<Node, CompileError> {
    compiler::compile(query, config)
}
