//! Decision history and log export.
//!
//! Append-only within a run. Nothing here feeds back into control.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::phase::Phase;
use crate::rules::Decision;
use crate::sensor::SensorReadings;
use crate::vehicle::Pose;

/// One tick's decision together with the state it was made in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub tick: u64,
    pub phase: Phase,
    pub decision: Decision,
    /// Pose before the decision was applied.
    pub pose: Pose,
    pub sensors: SensorReadings,
}

/// Per-rule usage over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleUsage {
    /// Sorted by count (desc), then rule id.
    pub counts: Vec<(String, usize)>,
    pub total_decisions: usize,
    pub distinct_rules: usize,
}

impl RuleUsage {
    pub fn count(&self, rule_id: &str) -> usize {
        self.counts.iter().find(|(id, _)| id == rule_id).map_or(0, |(_, n)| *n)
    }
}

/// Flattened record for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub phase: Phase,
    pub rule: String,
    pub reasoning: String,
    pub throttle: f32,
    pub steering: f32,
    pub position: [f32; 2],
    pub angle: f32,
}

impl From<&DecisionRecord> for LogEntry {
    fn from(r: &DecisionRecord) -> Self {
        Self {
            phase: r.phase,
            rule: r.decision.rule_id.clone(),
            reasoning: r.decision.reasoning.clone(),
            throttle: r.decision.throttle,
            steering: r.decision.steering,
            position: [r.pose.x, r.pose.y],
            angle: r.pose.angle,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionLog {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<LogEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct DecisionHistory {
    records: Vec<DecisionRecord>,
}

impl DecisionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: DecisionRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DecisionRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&DecisionRecord> {
        self.records.last()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn rule_usage(&self) -> RuleUsage {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for r in &self.records {
            *counts.entry(r.decision.rule_id.as_str()).or_default() += 1;
        }

        let mut counts: Vec<(String, usize)> =
            counts.into_iter().map(|(id, n)| (id.to_string(), n)).collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        RuleUsage { distinct_rules: counts.len(), total_decisions: self.records.len(), counts }
    }

    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.records.iter().map(LogEntry::from).collect()
    }

    pub fn to_log(&self) -> DecisionLog {
        DecisionLog { generated_at: Utc::now(), entries: self.log_entries() }
    }

    /// Write the log as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &self.to_log())?;
        Ok(())
    }
}
