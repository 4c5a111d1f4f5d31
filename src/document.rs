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

//! # Document Projector
//!
//! Materializes a [`RawJob`] — the flat record persisted by the queue —
//! into the queryable [`Value::Object`] the Compiler and Evaluator operate
//! on, including the computed virtual fields (`runtime`, `waitTime`,
//! `responseTime`). Fields are only inserted when every input they depend
//! on is present; path resolution then yields `Missing` for the rest,
//! which is how the Evaluator already distinguishes absent from null.

use crate::value::{Fields, Value};

/// The flat record as persisted by the queue. Out of scope: how it's
/// stored, how state transitions happen — this struct is just the shape
/// the Filter Driver receives from the `JobSource` collaborator.
#[derive(Debug, Clone, Default)]
pub struct RawJob {
    pub id: String,
    pub name: String,
    /// Serialized JSON payload. Malformed payloads project to `Value::Null`
    /// rather than aborting the query.
    pub data: String,
    /// Serialized JSON job options.
    pub opts: String,
    pub timestamp: Option<i64>,
    pub processed_on: Option<i64>,
    pub finished_on: Option<i64>,
    pub attempts_made: Option<i64>,
    pub delay: Option<i64>,
    pub priority: Option<i64>,
    pub progress: Option<Value>,
    pub returnvalue: Option<Value>,
    pub failed_reason: Option<String>,
    pub stacktrace: Vec<String>,
}

fn parse_json_field(raw: &str, field: &str, job_id: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Null;
    }
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(v) => Value::from(v),
        Err(err) => {
            tracing::warn!(job_id, field, error = %err, "malformed JSON payload, projecting to null");
            Value::Null
        }
    }
}

/// Projects a raw job record into its queryable [`Value::Object`] view.
pub fn project(raw: &RawJob) -> Value {
    let mut fields = Fields::new();

    fields.insert("id", Value::Str(raw.id.clone()));
    fields.insert("name", Value::Str(raw.name.clone()));
    fields.insert("data", parse_json_field(&raw.data, "data", &raw.id));
    fields.insert("opts", parse_json_field(&raw.opts, "opts", &raw.id));

    insert_opt_int(&mut fields, "timestamp", raw.timestamp);
    insert_opt_int(&mut fields, "processedOn", raw.processed_on);
    insert_opt_int(&mut fields, "finishedOn", raw.finished_on);
    insert_opt_int(&mut fields, "attemptsMade", raw.attempts_made);
    insert_opt_int(&mut fields, "delay", raw.delay);
    insert_opt_int(&mut fields, "priority", raw.priority);

    if let Some(progress) = &raw.progress {
        fields.insert("progress", progress.clone());
    }
    if let Some(rv) = &raw.returnvalue {
        fields.insert("returnvalue", rv.clone());
    }
    if let Some(reason) = &raw.failed_reason {
        fields.insert("failedReason", Value::Str(reason.clone()));
    }
    if !raw.stacktrace.is_empty() {
        fields.insert(
            "stacktrace",
            Value::Array(raw.stacktrace.iter().cloned().map(Value::Str).collect()),
        );
    }

    if let (Some(processed), Some(finished)) = (raw.processed_on, raw.finished_on) {
        fields.insert("runtime", Value::Int(finished - processed));
    }
    if let (Some(ts), Some(processed)) = (raw.timestamp, raw.processed_on) {
        fields.insert("waitTime", Value::Int(processed - ts));
    }
    if let (Some(ts), Some(finished)) = (raw.timestamp, raw.finished_on) {
        fields.insert("responseTime", Value::Int(finished - ts));
    }

    Value::Object(fields)
}

fn insert_opt_int(fields: &mut Fields, key: &str, v: Option<i64>) {
    if let Some(v) = v {
        fields.insert(key, Value::Int(v));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::resolve_path;

    fn sample() -> RawJob {
        RawJob {
            id: "job-1".into(),
            name: "email".into(),
            data: r#"{"qty": 120, "price": 40}"#.into(),
            opts: "{}".into(),
            timestamp: Some(100),
            processed_on: Some(150),
            finished_on: Some(200),
            ..Default::default()
        }
    }

    #[test]
    fn virtual_fields_are_computed() {
        let doc = project(&sample());
        assert_eq!(resolve_path(&doc, "runtime"), Value::Int(50));
        assert_eq!(resolve_path(&doc, "waitTime"), Value::Int(50));
        assert_eq!(resolve_path(&doc, "responseTime"), Value::Int(100));
    }

    #[test]
    fn virtual_field_missing_when_input_absent() {
        let mut raw = sample();
        raw.finished_on = None;
        let doc = project(&raw);
        assert!(resolve_path(&doc, "runtime").is_missing());
        assert!(resolve_path(&doc, "responseTime").is_missing());
        // waitTime only needs timestamp + processedOn, still present.
        assert_eq!(resolve_path(&doc, "waitTime"), Value::Int(50));
    }

    #[test]
    fn malformed_data_projects_to_null_not_abort() {
        let mut raw = sample();
        raw.data = "{not json".into();
        let doc = project(&raw);
        assert_eq!(resolve_path(&doc, "data"), Value::Null);
    }

    #[test]
    fn data_path_resolves_into_parsed_payload() {
        let doc = project(&sample());
        assert_eq!(resolve_path(&doc, "data.qty"), Value::Int(120));
    }
}
