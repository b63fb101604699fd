//! # Report Builder
//!
//! Typed structures for the reporter protocol's response document and the
//! function that assembles one from a host id, a timestamp and a value.
//!
//! The document has this shape on the wire:
//!
//! ```text
//! Host.nodes["<host_id>;<host>"].metrics.iowait.samples = [{date, value}]
//! Host.metric_templates.iowait = {id, label, format, priority}
//! Plugins = [{id, label, description, interfaces, api_version}]
//! ```
//!
//! Only the samples vary between calls. The metric template and the plugin
//! descriptor are constants.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier shared by the metric, its template and the plugin itself.
pub const METRIC_ID: &str = "iowait";

/// Suffix that marks a node key as "the host node itself".
pub const HOST_NODE_SUFFIX: &str = ";<host>";

/// Protocol interfaces this plugin implements.
pub const INTERFACES: [&str; 1] = ["reporter"];

pub const API_VERSION: &str = "1";

const PLUGIN_DESCRIPTION: &str = "Adds a graph of CPU IO Wait to hosts";

/// The full response document for a `/report` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    #[serde(rename = "Host")]
    pub host: HostSection,
    #[serde(rename = "Plugins")]
    pub plugins: Vec<PluginDescriptor>,
}

/// Per-host topology: node data plus the templates describing its metrics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostSection {
    pub nodes: BTreeMap<String, NodeEntry>,
    pub metric_templates: BTreeMap<String, MetricTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeEntry {
    pub metrics: BTreeMap<String, MetricEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricEntry {
    pub samples: Vec<Sample>,
}

/// One timestamped value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    /// RFC 3339 timestamp, second precision, UTC.
    pub date: String,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            date: timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            value,
        }
    }
}

/// Static display metadata for a metric class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricTemplate {
    pub id: String,
    pub label: String,
    pub format: String,
    /// Ordering among metrics in the UI; lower shows first.
    pub priority: f64,
}

impl MetricTemplate {
    pub fn iowait() -> Self {
        Self {
            id: METRIC_ID.to_string(),
            label: "IO Wait".to_string(),
            format: "percent".to_string(),
            priority: 0.1,
        }
    }
}

/// Identifies this plugin to the host tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginDescriptor {
    pub id: String,
    pub label: String,
    pub description: String,
    pub interfaces: Vec<String>,
    pub api_version: String,
}

impl PluginDescriptor {
    pub fn iowait() -> Self {
        Self {
            id: METRIC_ID.to_string(),
            label: METRIC_ID.to_string(),
            description: PLUGIN_DESCRIPTION.to_string(),
            interfaces: INTERFACES.iter().map(|i| i.to_string()).collect(),
            api_version: API_VERSION.to_string(),
        }
    }
}

/// Returns the node key under which a host's own metrics are reported.
pub fn host_node_key(host_id: &str) -> String {
    format!("{host_id}{HOST_NODE_SUFFIX}")
}

/// Builds a report carrying exactly one sample.
///
/// Never fails and never validates `value`; non-finite floats are passed
/// through to the encoder as-is.
pub fn build_report(host_id: &str, timestamp: DateTime<Utc>, value: f64) -> Report {
    let metrics = BTreeMap::from([(
        METRIC_ID.to_string(),
        MetricEntry {
            samples: vec![Sample::new(timestamp, value)],
        },
    )]);

    Report {
        host: HostSection {
            nodes: BTreeMap::from([(host_node_key(host_id), NodeEntry { metrics })]),
            metric_templates: BTreeMap::from([(METRIC_ID.to_string(), MetricTemplate::iowait())]),
        },
        plugins: vec![PluginDescriptor::iowait()],
    }
}
