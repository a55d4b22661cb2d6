/// Tool for estimating how long a habit takes to stick
///
/// This module implements the habit_estimate MCP tool. The numbers come
/// straight from `estimator::estimate`; nothing here is stored.

use serde::{Deserialize, Serialize};
use schemars::JsonSchema;

use crate::estimator::{self, ContextStability, DayRange, Difficulty, EstimateBreakdown, WhyType};
use crate::tools::ToolError;

/// Parameters for a duration estimate
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EstimateParams {
    /// The habit described in plain words
    pub habit_action: String,
    /// How predictable your days are: stable, mixed or chaotic
    #[serde(default)]
    pub context_stability: Option<ContextStability>,
    /// Why you want the habit: identity, outcome or mixed
    #[serde(default)]
    pub why_type: Option<WhyType>,
    /// Include the factor breakdown in the response
    #[serde(default)]
    pub explain: bool,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub recommended_days: u32,
    pub recommended_range: DayRange,
    pub difficulty: Difficulty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<EstimateBreakdown>,
    pub message: String,
}

pub fn estimate_duration(params: EstimateParams) -> Result<EstimateResponse, ToolError> {
    if params.habit_action.trim().is_empty() {
        return Err(ToolError::InvalidInput("habit_action cannot be empty".to_string()));
    }

    let estimate =
        estimator::estimate(&params.habit_action, params.context_stability, params.why_type);

    tracing::debug!(
        "Estimated {} days ({}) for '{}'",
        estimate.recommended_days,
        estimate.difficulty,
        params.habit_action
    );

    let message = format!(
        "Plan on about {} days ({}-{} day range for a {} habit).",
        estimate.recommended_days,
        estimate.recommended_range.low,
        estimate.recommended_range.high,
        estimate.difficulty
    );

    Ok(EstimateResponse {
        recommended_days: estimate.recommended_days,
        recommended_range: estimate.recommended_range,
        difficulty: estimate.difficulty,
        breakdown: params.explain.then_some(estimate.breakdown),
        message,
    })
}
