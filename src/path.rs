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

//! # Path Resolver
//!
//! Resolves dotted paths (`data.grades.0.mean`) against a [`Value`], with
//! array fan-out: indexing into an array when a segment parses as a
//! non-negative integer, or implicitly mapping the remaining path over
//! every element otherwise. Purely functional — never mutates its input.

use crate::value::Value;

/// Resolves `path` against `doc`, returning `Value::Missing` if any
/// segment fails to resolve.
pub fn resolve_path(doc: &Value, path: &str) -> Value {
    let segments: Vec<&str> = path.split('.').collect();
    resolve_segments(doc, &segments)
}

fn resolve_segments(current: &Value, segments: &[&str]) -> Value {
    let Some((seg, rest)) = segments.split_first() else {
        return current.clone();
    };

    match current {
        Value::Object(fields) => match fields.get(seg) {
            Some(v) => resolve_segments(v, rest),
            None => Value::Missing,
        },
        Value::Array(arr) => {
            if is_non_negative_integer(seg) {
                let idx: usize = seg.parse().unwrap();
                match arr.get(idx) {
                    Some(v) => resolve_segments(v, rest),
                    None => Value::Missing,
                }
            } else {
                fan_out(arr, segments)
            }
        }
        _ => Value::Missing,
    }
}

/// Resolves `segments` against every element of `arr`, collecting the
/// non-missing results into a new array. This is the implicit-array-
/// traversal rule that lets `data.grades.mean` yield `[88, 90, 85]`.
fn fan_out(arr: &[Value], segments: &[&str]) -> Value {
    let results: Vec<Value> = arr
        .iter()
        .map(|elem| resolve_segments(elem, segments))
        .filter(|v| !v.is_missing())
        .collect();
    Value::Array(results)
}

fn is_non_negative_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
