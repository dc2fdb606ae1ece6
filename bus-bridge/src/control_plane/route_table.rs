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

//! Declarative route table, as handed over by the configuration loader.

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RouteTable {
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    #[serde(default)]
    pub group_receivers: Vec<GroupReceiverConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    pub name: String,
    pub from: SourceConfig,
    /// Direct destination. Mutually exclusive with `to_group`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<TargetConfig>,
    /// Name of a [`GroupReceiverConfig`]. Mutually exclusive with `to`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_group: Option<String>,
    #[serde(default)]
    pub mode: ModeConfig,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub connector: String,
    pub source: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    pub connector: String,
    pub target: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GroupReceiverConfig {
    pub name: String,
    pub targets: Vec<TargetConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ModeConfig {
    #[serde(rename = "type", default)]
    pub kind: ModeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    #[default]
    Persistent,
    Drop,
}

impl RouteConfig {
    /// Route from `connector/source` straight to `connector/target` in persistent mode.
    pub fn direct(
        name: impl Into<String>,
        from: (&str, &str),
        to: (&str, &str),
    ) -> Self {
        Self {
            name: name.into(),
            from: SourceConfig {
                connector: from.0.to_string(),
                source: from.1.to_string(),
            },
            to: Some(TargetConfig {
                connector: to.0.to_string(),
                target: to.1.to_string(),
            }),
            to_group: None,
            mode: ModeConfig::default(),
            filters: Vec::new(),
            projection: None,
        }
    }

    /// Route from `connector/source` to every target of group `group`.
    pub fn to_group(name: impl Into<String>, from: (&str, &str), group: &str) -> Self {
        Self {
            to: None,
            to_group: Some(group.to_string()),
            ..Self::direct(name, from, ("", ""))
        }
    }

    pub fn with_mode(mut self, mode: ModeConfig) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters = filters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_projection(mut self, projection: impl Into<String>) -> Self {
        self.projection = Some(projection.into());
        self
    }
}

impl ModeConfig {
    pub fn persistent() -> Self {
        Self::default()
    }

    pub fn drop(ttl_ms: Option<u64>, max_attempts: Option<u32>) -> Self {
        Self {
            kind: ModeKind::Drop,
            ttl_ms,
            max_attempts,
        }
    }
}

impl GroupReceiverConfig {
    pub fn new<'a>(
        name: impl Into<String>,
        targets: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        Self {
            name: name.into(),
            targets: targets
                .into_iter()
                .map(|(connector, target)| TargetConfig {
                    connector: connector.to_string(),
                    target: target.to_string(),
                })
                .collect(),
        }
    }
}
