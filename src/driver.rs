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

//! # Filter Driver
//!
//! Ties the Compiler and Evaluator to an external job source, applying
//! cursor/count windowing over the matches it finds. The driver owns
//! nothing about how jobs are stored — it only asks its [`JobSource`]
//! collaborator to open a stream for a given queue partition.

use serde_json::Value as Json;

use crate::compiler::{self, Node};
use crate::config::Config;
use crate::document::{project, RawJob};
use crate::error::FilterError;
use crate::evaluator::eval_match;
use crate::regex_cache::RegexCache;
use crate::value::Value;

/// External collaborator supplying the queue's raw job records. `open`
/// yields a fresh stream, in queue order, for an opaque partition name
/// such as `"waiting"` or `"active"` — the driver treats `state` as a
/// string the collaborator alone understands.
pub trait JobSource {
    type Error: std::error::Error + Send + Sync + 'static;
    type Iter: Iterator<Item = Result<RawJob, Self::Error>>;

    /// Opens a stream of raw jobs for `state`, in queue order.
    fn open(&self, state: &str) -> Result<Self::Iter, Self::Error>;
}

/// Result of a `Driver::filter` call.
#[derive(Debug, Clone)]
pub struct FilterResult {
    /// Matching job records, in queue order.
    pub jobs: Vec<RawJob>,
    /// Total candidates scanned while producing `jobs`, including any
    /// skipped past `cursor` and any scanned but non-matching.
    pub total: usize,
    /// Cursor to resume from on the next call: `Some(cursor + count)` when
    /// stopped early because `count` was reached, `None` once the stream
    /// was exhausted.
    pub next_cursor: Option<usize>,
    /// Number of matches in `jobs` — `jobs.len()`, kept as a named field to
    /// mirror the external result shape `{ jobs, cursor, total, count }`.
    pub count: usize,
}

pub struct Driver {
    config: Config,
    regex_cache: RegexCache,
}

impl Driver {
    pub fn new(config: Config) -> Self {
        let regex_cache = RegexCache::new(config.regex_cache_capacity);
        Driver { config, regex_cache }
    }

    /// Compiles `query`, opens `source` for `state`, and walks the stream
    /// from its start, skipping the first `cursor` matches and collecting
    /// up to `count` more (`count == 0` means unbounded — drain the stream
    /// to exhaustion). `total` counts every candidate examined this call,
    /// including the skipped matches and any non-matching documents;
    /// `next_cursor` is `Some(cursor + count)` when stopped early, `None`
    /// once the stream is exhausted.
    pub fn filter<S: JobSource>(
        &self,
        source: &S,
        state: &str,
        query: &Json,
        cursor: usize,
        count: usize,
    ) -> Result<FilterResult, FilterError> {
        let node = compiler::compile(query, &self.config)?;
        let unbounded = count == 0;
        let iter = source
            .open(state)
            .map_err(|e| FilterError::Source(Box::new(e)))?;

        let mut jobs = Vec::new();
        let mut scanned = 0usize;
        let mut matches_seen = 0usize;
        let mut exhausted = true;

        for item in iter {
            let raw = item.map_err(|e| FilterError::Source(Box::new(e)))?;
            scanned += 1;
            if self.matches(&node, &raw) {
                if matches_seen >= cursor {
                    jobs.push(raw);
                }
                matches_seen += 1;
                if !unbounded && jobs.len() >= count {
                    exhausted = false;
                    break;
                }
            }
        }

        let next_cursor = if exhausted { None } else { Some(cursor + jobs.len()) };

        Ok(FilterResult {
            count: jobs.len(),
            total: scanned,
            next_cursor,
            jobs,
        })
    }

    fn matches(&self, node: &Node, raw: &RawJob) -> bool {
        let doc: Value = project(raw);
        eval_match(&doc, node, &self.regex_cache)
    }

    /// Order-preserving parallel variant of [`Driver::matches`] over an
    /// already-fetched batch, available behind the `parallel` feature.
    #[cfg(feature = "parallel")]
    pub fn filter_batch_parallel(&self, node: &Node, jobs: &[RawJob]) -> Vec<bool> {
        use rayon::prelude::*;
        jobs.par_iter().map(|raw| self.matches(node, raw)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::convert::Infallible;

    struct InMemorySource {
        jobs: Vec<RawJob>,
    }

    impl JobSource for InMemorySource {
        type Error = Infallible;
        type Iter = std::vec::IntoIter<Result<RawJob, Infallible>>;

        fn open(&self, _state: &str) -> Result<Self::Iter, Infallible> {
            let items: Vec<Result<RawJob, Infallible>> =
                self.jobs.iter().cloned().map(Ok).collect();
            Ok(items.into_iter())
        }
    }

    fn sample_source() -> InMemorySource {
        InMemorySource {
            jobs: (0..10)
                .map(|i| RawJob {
                    id: format!("job-{i}"),
                    name: "email".into(),
                    data: format!(r#"{{"qty": {}}}"#, i * 10),
                    opts: "{}".into(),
                    attempts_made: Some(i as i64),
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[test]
    fn filters_and_paginates() {
        let driver = Driver::new(Config::default());
        let source = sample_source();
        let result = driver
            .filter(&source, "waiting", &json!({"data.qty": {"$gte": 50}}), 0, 3)
            .unwrap();
        assert_eq!(result.jobs.len(), 3);
        assert_eq!(result.jobs[0].id, "job-5");
        assert_eq!(result.next_cursor, Some(3));
    }

    #[test]
    fn cursor_skips_prior_matches_not_scanned_candidates() {
        let driver = Driver::new(Config::default());
        let source = sample_source();
        let first = driver.filter(&source, "waiting", &json!({}), 0, 4).unwrap();
        assert_eq!(first.jobs[0].id, "job-0");
        assert_eq!(first.next_cursor, Some(4));

        let second = driver
            .filter(&source, "waiting", &json!({}), 4, 4)
            .unwrap();
        assert_eq!(second.jobs[0].id, "job-4");
        // Re-scans from the start of the stream: the 4 skipped matches plus
        // the 4 collected ones are all counted in `total`.
        assert_eq!(second.total, 8);
    }

    #[test]
    fn empty_query_matches_every_job_unbounded() {
        let driver = Driver::new(Config::default());
        let source = sample_source();
        let result = driver.filter(&source, "waiting", &json!({}), 0, 0).unwrap();
        assert_eq!(result.jobs.len(), 10);
        assert_eq!(result.next_cursor, None);
    }

    #[test]
    fn next_cursor_is_none_when_fewer_matches_than_count_remain() {
        let driver = Driver::new(Config::default());
        let source = sample_source();
        let result = driver
            .filter(&source, "waiting", &json!({"data.qty": {"$gte": 50}}), 0, 100)
            .unwrap();
        assert_eq!(result.jobs.len(), 5);
        assert_eq!(result.next_cursor, None);
    }

    #[test]
    fn propagates_compile_error() {
        let driver = Driver::new(Config::default());
        let source = sample_source();
        let err = driver
            .filter(&source, "waiting", &json!({"a": {"$bogus": 1}}), 0, 1)
            .unwrap_err();
        assert!(matches!(err, FilterError::Compile(_)));
    }
}
