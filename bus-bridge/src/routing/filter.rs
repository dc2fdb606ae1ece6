/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Named message predicates and ordered filter chains.

use crate::message::{now_unix_ms, Fields, Message, META_SIZE};
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

pub const SIZE_LE_1MB: &str = "size_le_1mb";
pub const RECENT_1H: &str = "recent_1h";
pub const USER_BASIC: &str = "user_basic";

const ONE_MIB: i64 = 1024 * 1024;
const ONE_HOUR_MS: i64 = 3_600 * 1_000;

/// Failure while evaluating a predicate. The chain treats it like a rejection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterError {
    reason: String,
}

impl FilterError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Display for FilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "filter evaluation failed: {}", self.reason)
    }
}

impl Error for FilterError {}

type Predicate = dyn Fn(&Message, Option<&Fields>) -> Result<bool, FilterError> + Send + Sync;

/// Stateless named predicate over a message and its decoded fields.
#[derive(Clone)]
pub struct Filter {
    name: String,
    predicate: Arc<Predicate>,
}

impl Filter {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Message, Option<&Fields>) -> Result<bool, FilterError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evaluate(&self, message: &Message, fields: Option<&Fields>) -> Result<bool, FilterError> {
        (self.predicate)(message, fields)
    }
}

impl Debug for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Name-keyed filters, registered once before the engine starts.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Filter>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with [`SIZE_LE_1MB`], [`RECENT_1H`] and [`USER_BASIC`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Filter::new(SIZE_LE_1MB, size_le_1mb));
        registry.register(Filter::new(RECENT_1H, recent_1h));
        registry.register(Filter::new(USER_BASIC, user_basic));
        registry
    }

    pub fn register(&mut self, filter: Filter) -> Option<Filter> {
        self.filters.insert(filter.name.clone(), filter)
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.register(filter);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Filter> {
        self.filters.get(name)
    }
}

/// Result of running a chain over one message.
#[derive(Debug, PartialEq, Eq)]
pub enum FilterVerdict {
    Pass,
    Rejected { filter: String },
    Failed { filter: String, err: FilterError },
}

/// A route's filters in declared order; the first rejection wins.
#[derive(Clone, Debug, Default)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

impl FilterChain {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(Filter::name).collect()
    }

    pub fn evaluate(&self, message: &Message, fields: Option<&Fields>) -> FilterVerdict {
        for filter in &self.filters {
            match filter.evaluate(message, fields) {
                Ok(true) => {}
                Ok(false) => {
                    return FilterVerdict::Rejected {
                        filter: filter.name.clone(),
                    }
                }
                Err(err) => {
                    return FilterVerdict::Failed {
                        filter: filter.name.clone(),
                        err,
                    }
                }
            }
        }
        FilterVerdict::Pass
    }
}

fn size_le_1mb(message: &Message, _fields: Option<&Fields>) -> Result<bool, FilterError> {
    let size = message.meta_i64(META_SIZE).unwrap_or_default();
    Ok(size <= ONE_MIB)
}

fn recent_1h(message: &Message, _fields: Option<&Fields>) -> Result<bool, FilterError> {
    // A message without a creation time cannot be proven recent.
    match message.age_ms(now_unix_ms()) {
        Some(age) => Ok(age <= ONE_HOUR_MS),
        None => Ok(false),
    }
}

fn user_basic(_message: &Message, fields: Option<&Fields>) -> Result<bool, FilterError> {
    let Some(fields) = fields else {
        return Ok(false);
    };
    let (Some(name), Some(age)) = (non_null(fields, "name"), non_null(fields, "age")) else {
        return Ok(false);
    };

    let name = name.as_str().unwrap_or_default();
    let Some(age) = as_integer(age) else {
        return Ok(false);
    };
    if name.is_empty() {
        return Ok(false);
    }

    Ok(age > 16 || name.contains('A'))
}

fn non_null<'a>(fields: &'a Fields, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|value| !value.is_null())
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Filter, FilterChain, FilterError, FilterRegistry, FilterVerdict, RECENT_1H, SIZE_LE_1MB,
        USER_BASIC,
    };
    use crate::message::{now_unix_ms, Fields, Message, META_CREATED_AT_MS, META_SIZE};
    use serde_json::{json, Value};

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(fields) => fields,
            other => panic!("expected object, got {other}"),
        }
    }

    fn builtin(name: &str) -> Filter {
        FilterRegistry::with_builtins()
            .get(name)
            .cloned()
            .expect("builtin should be registered")
    }

    #[test]
    fn size_le_1mb_checks_size_metadata() {
        let filter = builtin(SIZE_LE_1MB);

        let small = Message::default().with_meta(META_SIZE, 1024);
        let large = Message::default().with_meta(META_SIZE, 2 * 1024 * 1024);

        assert_eq!(filter.evaluate(&small, None), Ok(true));
        assert_eq!(filter.evaluate(&large, None), Ok(false));
    }

    #[test]
    fn recent_1h_rejects_old_and_unstamped_messages() {
        let filter = builtin(RECENT_1H);
        let now = now_unix_ms();

        let fresh = Message::default().with_meta(META_CREATED_AT_MS, now - 1_000);
        let stale = Message::default().with_meta(META_CREATED_AT_MS, now - 2 * 3_600_000);

        assert_eq!(filter.evaluate(&fresh, None), Ok(true));
        assert_eq!(filter.evaluate(&stale, None), Ok(false));
        assert_eq!(filter.evaluate(&Message::default(), None), Ok(false));
    }

    #[test]
    fn user_basic_accepts_adults_or_names_with_capital_a() {
        let filter = builtin(USER_BASIC);
        let message = Message::default();

        let adult = fields(json!({"name": "bob", "age": "30"}));
        let named_a = fields(json!({"name": "Ann", "age": 12}));
        let minor = fields(json!({"name": "bob", "age": 12}));
        let no_age = fields(json!({"name": "Ann"}));
        let bad_age = fields(json!({"name": "Ann", "age": "old"}));
        let empty_name = fields(json!({"name": "", "age": 40}));

        assert_eq!(filter.evaluate(&message, Some(&adult)), Ok(true));
        assert_eq!(filter.evaluate(&message, Some(&named_a)), Ok(true));
        assert_eq!(filter.evaluate(&message, Some(&minor)), Ok(false));
        assert_eq!(filter.evaluate(&message, Some(&no_age)), Ok(false));
        assert_eq!(filter.evaluate(&message, Some(&bad_age)), Ok(false));
        assert_eq!(filter.evaluate(&message, Some(&empty_name)), Ok(false));
        assert_eq!(filter.evaluate(&message, None), Ok(false));
    }

    #[test]
    fn chain_stops_at_first_rejection_or_error() {
        let pass = Filter::new("pass", |_, _| Ok(true));
        let reject = Filter::new("reject", |_, _| Ok(false));
        let broken = Filter::new("broken", |_, _| Err(FilterError::new("boom")));
        let message = Message::default();

        assert_eq!(
            FilterChain::new(vec![pass.clone()]).evaluate(&message, None),
            FilterVerdict::Pass
        );
        assert_eq!(
            FilterChain::new(vec![pass.clone(), reject.clone(), broken.clone()])
                .evaluate(&message, None),
            FilterVerdict::Rejected {
                filter: "reject".to_string()
            }
        );
        assert_eq!(
            FilterChain::new(vec![pass, broken, reject]).evaluate(&message, None),
            FilterVerdict::Failed {
                filter: "broken".to_string(),
                err: FilterError::new("boom")
            }
        );
        assert_eq!(
            FilterChain::default().evaluate(&message, None),
            FilterVerdict::Pass
        );
    }
}
