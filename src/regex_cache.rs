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

//! Size-bounded, concurrently-readable cache of compiled regexes, keyed by
//! pattern string. `$matches` patterns are compiled lazily on first use and
//! memoized here so repeated evaluation of the same compiled query against
//! many documents never recompiles a pattern.

use std::sync::Mutex;

use lru::LruCache;
use regex::Regex;

use crate::error::EvalError;

pub struct RegexCache {
    inner: Mutex<LruCache<String, Regex>>,
}

impl RegexCache {
    pub fn new(capacity: usize) -> Self {
        let cap = std::num::NonZeroUsize::new(capacity.max(1)).unwrap();
        RegexCache {
            inner: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Returns a compiled regex for `pattern`, compiling and memoizing it
    /// on first use. Safe for concurrent readers.
    pub fn get_or_compile(&self, pattern: &str) -> Result<Regex, EvalError> {
        let mut cache = self.inner.lock().unwrap();
        if let Some(re) = cache.get(pattern) {
            tracing::trace!(pattern, "regex cache hit");
            return Ok(re.clone());
        }
        tracing::trace!(pattern, "regex cache miss");
        let re = Regex::new(pattern).map_err(|e| EvalError::InvalidRegex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        cache.put(pattern.to_string(), re.clone());
        Ok(re)
    }
}

impl Default for RegexCache {
    fn default() -> Self {
        RegexCache::new(256)
    }
}
