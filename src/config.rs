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

//! Tunables for the compiler and evaluator. The core is a library, not a
//! service: there is no file- or environment-backed configuration layer
//! here — a host embedding this crate owns that concern and constructs a
//! [`Config`] directly.

/// Compiler/evaluator tunables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum nesting depth a compiled query may reach before the
    /// compiler rejects it. Guards against pathological `$expr` / `$cond`
    /// / `$switch` nesting.
    pub max_depth: usize,
    /// Maximum number of compiled regex patterns memoized by the
    /// `$matches` cache before LRU eviction kicks in.
    pub regex_cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: 64,
            regex_cache_capacity: 256,
        }
    }
}

impl Config {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_regex_cache_capacity(mut self, capacity: usize) -> Self {
        self.regex_cache_capacity = capacity;
        self
    }
}
