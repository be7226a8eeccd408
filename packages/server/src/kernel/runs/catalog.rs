//! The task catalog: the fixed, ordered list of extraction goals applied to
//! every run.
//!
//! The catalog is enumerated explicitly at startup; there is no dynamic
//! discovery. Each entry names the task, carries the retrieval hint the
//! backend query is formulated from, and knows how to parse a raw answer
//! into its typed schema.

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::common::{
    ConsolidatedNetIncome, ConsolidatedRevenue, DilutedEps, EmployeeUtilization, KeyRisks,
    SegmentContributions,
};
use crate::kernel::traits::QueryTarget;

/// Which extraction goal a task represents. One variant per typed schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    ConsolidatedRevenue,
    ConsolidatedNetIncome,
    DilutedEps,
    SegmentContributions,
    EmployeeUtilization,
    KeyRisks,
}

impl TaskKind {
    /// Parse a raw backend answer into this task's typed result, returned as
    /// the JSON value stored in the run's results map.
    ///
    /// An answer containing the `NOT FOUND` sentinel is a parse failure, not
    /// an empty success: absent answers must not appear in results.
    pub fn parse(&self, raw: &str) -> Result<Value> {
        if raw.contains("NOT FOUND") {
            return Err(anyhow!("no answer found in document"));
        }

        let json = extract_json_object(raw)
            .ok_or_else(|| anyhow!("answer contains no JSON object"))?;

        match self {
            TaskKind::ConsolidatedRevenue => parse_as::<ConsolidatedRevenue>(json),
            TaskKind::ConsolidatedNetIncome => parse_as::<ConsolidatedNetIncome>(json),
            TaskKind::DilutedEps => parse_as::<DilutedEps>(json),
            TaskKind::SegmentContributions => parse_as::<SegmentContributions>(json),
            TaskKind::EmployeeUtilization => parse_as::<EmployeeUtilization>(json),
            TaskKind::KeyRisks => parse_as::<KeyRisks>(json),
        }
    }

    /// Field list appended to the backend question so the answer arrives in a
    /// parseable shape.
    pub fn schema_fields(&self) -> &'static str {
        match self {
            TaskKind::ConsolidatedRevenue | TaskKind::ConsolidatedNetIncome => {
                r#""value" (number), "unit" (string, e.g. 'USD Billion'), "source_page" (number)"#
            }
            TaskKind::DilutedEps => r#""value" (number), "source_page" (number)"#,
            TaskKind::SegmentContributions => {
                r#""top_segments" (array of {"segment_name", "percentage_contribution"}), "source_page" (number)"#
            }
            TaskKind::EmployeeUtilization => {
                r#""rate_percentage" (number), "source_page" (number)"#
            }
            TaskKind::KeyRisks => {
                r#""key_risks" (array of {"risk_summary"}), "source_page" (number)"#
            }
        }
    }
}

fn parse_as<T: DeserializeOwned + serde::Serialize>(json: &str) -> Result<Value> {
    let typed: T = serde_json::from_str(json).context("answer does not match task schema")?;
    serde_json::to_value(typed).context("failed to serialize parsed result")
}

/// Pull the outermost JSON object out of a raw answer, tolerating prose and
/// code fences around it.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end > start {
        Some(&raw[start..=end])
    } else {
        None
    }
}

/// One entry in the catalog.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    /// Human-readable task name; also the key in the run's results map.
    pub name: &'static str,
    pub kind: TaskKind,
    pub target: QueryTarget,
    /// The precise question the backend query is formulated from.
    pub retrieval_hint: &'static str,
}

/// The fixed ordered task list applied to every run.
pub fn default_catalog() -> Vec<TaskSpec> {
    vec![
        TaskSpec {
            name: "Consolidated Revenue (USD Billion)",
            kind: TaskKind::ConsolidatedRevenue,
            target: QueryTarget::Table,
            retrieval_hint:
                "What is the final reported Consolidated Revenue from operations for the group \
                 for the most recent financial year, in USD Billion?",
        },
        TaskSpec {
            name: "Consolidated Net Income (Profit After Tax)",
            kind: TaskKind::ConsolidatedNetIncome,
            target: QueryTarget::Table,
            retrieval_hint:
                "What is the consolidated Profit After Tax (Net Income) for the group for the \
                 most recent financial year?",
        },
        TaskSpec {
            name: "Diluted Earnings Per Share (EPS in INR)",
            kind: TaskKind::DilutedEps,
            target: QueryTarget::Table,
            retrieval_hint:
                "What is the Diluted Earnings Per Share (EPS) in INR for the most recent \
                 financial year?",
        },
        TaskSpec {
            name: "Percentage contribution of the top 3 operating segments",
            kind: TaskKind::SegmentContributions,
            target: QueryTarget::Table,
            retrieval_hint:
                "What is the percentage revenue contribution of the top 3 operating segments \
                 (e.g. BFSI, Retail) for the most recent financial year?",
        },
        TaskSpec {
            name: "Employee Utilization Rate (excluding trainees)",
            kind: TaskKind::EmployeeUtilization,
            target: QueryTarget::Text,
            retrieval_hint:
                "What is the employee utilization rate excluding trainees for the most recent \
                 financial year?",
        },
        TaskSpec {
            name: "Top 2-3 most critical risks from the Management Discussion & Analysis",
            kind: TaskKind::KeyRisks,
            target: QueryTarget::Text,
            retrieval_hint:
                "What are the top 2-3 most critical risks cited in the Management Discussion \
                 and Analysis section?",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_order_is_fixed() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog[0].kind, TaskKind::ConsolidatedRevenue);
        assert_eq!(catalog[5].kind, TaskKind::KeyRisks);

        let names: Vec<_> = catalog.iter().map(|t| t.name).collect();
        let mut deduped = names.clone();
        deduped.dedup();
        assert_eq!(names, deduped, "task names must be unique keys");
    }

    #[test]
    fn parse_accepts_fenced_json() {
        let raw = "Here is the figure:\n```json\n{\"value\": 29.08, \"unit\": \"USD Billion\", \"source_page\": 96}\n```";
        let value = TaskKind::ConsolidatedRevenue.parse(raw).unwrap();
        assert_eq!(value["value"], 29.08);
        assert_eq!(value["unit"], "USD Billion");
    }

    #[test]
    fn parse_rejects_not_found_sentinel() {
        let err = TaskKind::ConsolidatedRevenue.parse("NOT FOUND").unwrap_err();
        assert!(err.to_string().contains("no answer found"));
    }

    #[test]
    fn parse_rejects_schema_mismatch() {
        // Revenue requires a unit; a bare value must not slip through.
        let err = TaskKind::ConsolidatedRevenue
            .parse(r#"{"value": 29.08}"#)
            .unwrap_err();
        assert!(err.to_string().contains("schema"));
    }

    #[test]
    fn parse_fills_eps_default_unit() {
        let value = TaskKind::DilutedEps
            .parse(r#"{"value": 115.19, "source_page": 242}"#)
            .unwrap();
        assert_eq!(value["unit"], "INR");
    }

    #[test]
    fn parse_rejects_prose_without_json() {
        let err = TaskKind::KeyRisks
            .parse("The key risks are currency volatility and attrition.")
            .unwrap_err();
        assert!(err.to_string().contains("no JSON object"));
    }
}
