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

//! Field projections applied between decode and re-encode.

use crate::message::{Fields, Message};
use crate::observability::events;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use tracing::warn;

const COMPONENT: &str = "projection";

pub const KEEP_NAME_AGE_BEST_EFFORT: &str = "keep_name_age_best_effort";
pub const KEEP_NAME_AGE_STRICT: &str = "keep_name_age_strict";

/// How a projection treats declared fields that are absent from the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionMode {
    /// Keep whatever declared fields exist; never drops.
    BestEffort,
    /// Any absent declared field drops the message.
    Strict,
}

impl Display for ProjectionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionMode::BestEffort => write!(f, "best_effort"),
            ProjectionMode::Strict => write!(f, "strict"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProjectionError {
    MissingField { projection: String, field: String },
    Failed { projection: String, reason: String },
}

impl Display for ProjectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionError::MissingField { projection, field } => {
                write!(f, "projection {projection:?}: missing field {field:?}")
            }
            ProjectionError::Failed { projection, reason } => {
                write!(f, "projection {projection:?} failed: {reason}")
            }
        }
    }
}

impl Error for ProjectionError {}

type ProjectFn = dyn Fn(&Message, &Fields) -> Result<Fields, ProjectionError> + Send + Sync;

/// Named function from a message's fields to the fields that get re-encoded.
#[derive(Clone)]
pub struct Projection {
    name: String,
    mode: ProjectionMode,
    project: Arc<ProjectFn>,
}

impl Projection {
    pub fn new<F>(name: impl Into<String>, mode: ProjectionMode, project: F) -> Self
    where
        F: Fn(&Message, &Fields) -> Result<Fields, ProjectionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            mode,
            project: Arc::new(project),
        }
    }

    /// Keeps only `keep` from the input. In [`ProjectionMode::Strict`] the first absent
    /// field fails with [`ProjectionError::MissingField`].
    pub fn keep_fields<I, S>(name: impl Into<String>, keep: I, mode: ProjectionMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let keep: Vec<String> = keep.into_iter().map(Into::into).collect();
        let projection_name = name.clone();

        Self::new(name, mode, move |_message, fields| {
            let mut out = Fields::new();
            for field in &keep {
                match fields.get(field) {
                    Some(value) => {
                        out.insert(field.clone(), value.clone());
                    }
                    None if mode == ProjectionMode::Strict => {
                        return Err(ProjectionError::MissingField {
                            projection: projection_name.clone(),
                            field: field.clone(),
                        });
                    }
                    None => {}
                }
            }
            Ok(out)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    /// Runs the projection. A best-effort projection that errors hands back its input
    /// unchanged; only strict projections return `Err`.
    pub fn apply(&self, message: &Message, fields: &Fields) -> Result<Fields, ProjectionError> {
        match (self.project)(message, fields) {
            Err(err) if self.mode == ProjectionMode::BestEffort => {
                warn!(
                    event = events::PROJECTION_BEST_EFFORT_PASSTHROUGH,
                    component = COMPONENT,
                    projection = self.name.as_str(),
                    err = %err,
                    "best-effort projection failed, passing fields through"
                );
                Ok(fields.clone())
            }
            result => result,
        }
    }
}

impl Debug for Projection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projection")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default)]
pub struct ProjectionRegistry {
    projections: HashMap<String, Projection>,
}

impl ProjectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding [`KEEP_NAME_AGE_BEST_EFFORT`] and [`KEEP_NAME_AGE_STRICT`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Projection::keep_fields(
            KEEP_NAME_AGE_BEST_EFFORT,
            ["name", "age"],
            ProjectionMode::BestEffort,
        ));
        registry.register(Projection::keep_fields(
            KEEP_NAME_AGE_STRICT,
            ["name", "age"],
            ProjectionMode::Strict,
        ));
        registry
    }

    pub fn register(&mut self, projection: Projection) -> Option<Projection> {
        self.projections
            .insert(projection.name.clone(), projection)
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.register(projection);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Projection> {
        self.projections.get(name)
    }
}
