//! Typed result schemas for the extraction tasks.
//!
//! Each task in the catalog parses its raw backend answer into one of these
//! shapes before the value is folded into a run's results. A value that does
//! not deserialize into its schema never reaches the results map.

use serde::{Deserialize, Serialize};

/// Consolidated revenue for the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedRevenue {
    /// The final reported consolidated revenue figure.
    pub value: f64,
    /// Currency and scale, e.g. "USD Billion" or "INR Crores".
    pub unit: String,
    /// Page in the report where the figure was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Consolidated net income (Profit After Tax) for the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedNetIncome {
    pub value: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Diluted earnings per share. Reports quote this in INR, so the unit
/// defaults when the backend omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DilutedEps {
    pub value: f64,
    #[serde(default = "default_eps_unit")]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

fn default_eps_unit() -> String {
    "INR".to_string()
}

/// Revenue contribution of a single operating segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentContribution {
    /// Name of the operating segment (e.g. BFSI, Retail).
    pub segment_name: String,
    /// Revenue contribution as a percentage.
    pub percentage_contribution: f64,
}

/// Top operating segments by revenue contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentContributions {
    pub top_segments: Vec<SegmentContribution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_page: Option<i64>,
}

/// Employee utilization rate, excluding trainees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeUtilization {
    pub rate_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// A single risk cited in the Management Discussion & Analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRisk {
    pub risk_summary: String,
}

/// The most critical management risks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRisks {
    pub key_risks: Vec<KeyRisk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_page: Option<i64>,
}
