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

//! Payload codecs: wire bytes to a structured field view and back.
//!
//! A codec keeps the decoded representation around ([`Retained`]) so that a payload whose
//! fields were only partially edited can be re-encoded from that template instead of being
//! rebuilt from scratch.

use crate::message::Fields;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Codec-specific decoded representation, shared read-only with `encode`.
pub type Retained = Arc<dyn Any + Send + Sync>;

/// Output of [`PayloadCodec::decode`].
pub struct Decoded {
    pub fields: Fields,
    pub retained: Retained,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodecError {
    Malformed { schema: String, reason: String },
    NotAnObject { schema: String },
    MissingRequiredField { schema: String, field: String },
    UnexpectedTemplate { schema: String },
    Encode { schema: String, reason: String },
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Malformed { schema, reason } => {
                write!(f, "{schema}: malformed payload: {reason}")
            }
            CodecError::NotAnObject { schema } => {
                write!(f, "{schema}: payload is not an object")
            }
            CodecError::MissingRequiredField { schema, field } => {
                write!(f, "{schema}: required field {field:?} is missing")
            }
            CodecError::UnexpectedTemplate { schema } => {
                write!(f, "{schema}: retained representation has an unexpected type")
            }
            CodecError::Encode { schema, reason } => {
                write!(f, "{schema}: encode failed: {reason}")
            }
        }
    }
}

impl Error for CodecError {}

/// Converts payload bytes into [`Fields`] and back.
pub trait PayloadCodec: Send + Sync {
    /// Media type tagged onto messages this codec decoded.
    fn content_type(&self) -> &str;

    fn decode(&self, bytes: &[u8]) -> Result<Decoded, CodecError>;

    /// Re-serializes `fields`, using `retained` (from [`decode`][Self::decode]) as template.
    fn encode(&self, fields: &Fields, retained: Option<&Retained>) -> Result<Vec<u8>, CodecError>;
}

/// Schema a codec instance is bound to, resolved when configuration is loaded.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SchemaDescriptor {
    pub name: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub required_fields: Vec<String>,
}

fn default_content_type() -> String {
    JSON_CONTENT_TYPE.to_string()
}

impl SchemaDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type: default_content_type(),
            required_fields: Vec::new(),
        }
    }

    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// JSON object codec bound to one [`SchemaDescriptor`].
///
/// The retained representation is the decoded object itself; encoding emits the surviving
/// fields in the template's key order, followed by fields the template did not have.
#[derive(Clone, Debug)]
pub struct JsonCodec {
    schema: SchemaDescriptor,
}

impl JsonCodec {
    pub fn new(schema: SchemaDescriptor) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }
}

impl PayloadCodec for JsonCodec {
    fn content_type(&self) -> &str {
        &self.schema.content_type
    }

    fn decode(&self, bytes: &[u8]) -> Result<Decoded, CodecError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|err| CodecError::Malformed {
                schema: self.schema.name.clone(),
                reason: err.to_string(),
            })?;

        let Value::Object(fields) = value else {
            return Err(CodecError::NotAnObject {
                schema: self.schema.name.clone(),
            });
        };

        if let Some(missing) = self
            .schema
            .required_fields
            .iter()
            .find(|field| !fields.contains_key(field.as_str()))
        {
            return Err(CodecError::MissingRequiredField {
                schema: self.schema.name.clone(),
                field: missing.clone(),
            });
        }

        let retained: Retained = Arc::new(fields.clone());
        Ok(Decoded { fields, retained })
    }

    fn encode(&self, fields: &Fields, retained: Option<&Retained>) -> Result<Vec<u8>, CodecError> {
        let template = match retained {
            Some(retained) => Some(retained.downcast_ref::<Fields>().ok_or_else(|| {
                CodecError::UnexpectedTemplate {
                    schema: self.schema.name.clone(),
                }
            })?),
            None => None,
        };

        let mut out = Fields::new();
        if let Some(template) = template {
            for key in template.keys() {
                if let Some(value) = fields.get(key) {
                    out.insert(key.clone(), value.clone());
                }
            }
        }
        for (key, value) in fields {
            if !out.contains_key(key) {
                out.insert(key.clone(), value.clone());
            }
        }

        serde_json::to_vec(&Value::Object(out)).map_err(|err| CodecError::Encode {
            schema: self.schema.name.clone(),
            reason: err.to_string(),
        })
    }
}

/// Codec lookup by ingress point name, with an optional fallback for all other sources.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    default: Option<Arc<dyn PayloadCodec>>,
    by_source: HashMap<String, Arc<dyn PayloadCodec>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, codec: Arc<dyn PayloadCodec>) -> Self {
        self.default = Some(codec);
        self
    }

    pub fn with_source(mut self, source_name: impl Into<String>, codec: Arc<dyn PayloadCodec>) -> Self {
        self.insert(source_name, codec);
        self
    }

    pub fn insert(&mut self, source_name: impl Into<String>, codec: Arc<dyn PayloadCodec>) {
        self.by_source.insert(source_name.into(), codec);
    }

    /// Codec for `source_name`: the source-specific one if registered, else the default.
    pub fn resolve(&self, source_name: &str) -> Option<Arc<dyn PayloadCodec>> {
        self.by_source
            .get(source_name)
            .or(self.default.as_ref())
            .cloned()
    }
}
