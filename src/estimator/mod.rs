/// Habit-formation duration estimator
///
/// Maps a habit description plus optional context tags to a recommended
/// number of days before the habit should feel automatic. The result is a
/// pure function of its inputs (no clock, randomness or I/O) and is treated
/// as locked ground truth by the advisory layer.

pub mod rules;

use std::fmt;

use serde::{Deserialize, Serialize};
use schemars::JsonSchema;

use rules::{HabitText, Rule};

/// How predictable the user's days are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContextStability {
    Stable,
    Mixed,
    Chaotic,
}

impl ContextStability {
    pub fn multiplier(self) -> f64 {
        match self {
            ContextStability::Stable => 0.98,
            ContextStability::Mixed => 1.08,
            ContextStability::Chaotic => 1.18,
        }
    }
}


/// Why the user wants the habit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WhyType {
    /// "I am the kind of person who..."
    Identity,
    /// A concrete result (lose weight, pass an exam)
    Outcome,
    Mixed,
}

impl WhyType {
    pub fn multiplier(self) -> f64 {
        match self {
            WhyType::Identity => 0.98,
            WhyType::Outcome => 1.12,
            WhyType::Mixed => 1.05,
        }
    }
}


/// Context multiplier when the stability is not given
pub const DEFAULT_CONTEXT_MULTIPLIER: f64 = 1.08;
/// Why multiplier when the motivation is not given; leans toward outcome
pub const DEFAULT_WHY_MULTIPLIER: f64 = 1.06;

/// Difficulty bucket; each has its own day range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Tiny,
    Normal,
    Stretch,
}

impl Difficulty {
    const NORMAL_THRESHOLD: f64 = 0.06;
    const STRETCH_THRESHOLD: f64 = 0.20;

    pub fn from_score(score: f64) -> Self {
        if score < Self::NORMAL_THRESHOLD {
            Difficulty::Tiny
        } else if score < Self::STRETCH_THRESHOLD {
            Difficulty::Normal
        } else {
            Difficulty::Stretch
        }
    }

    pub fn range(self) -> DayRange {
        match self {
            Difficulty::Tiny => DayRange { low: 18, high: 30 },
            Difficulty::Normal => DayRange { low: 30, high: 66 },
            Difficulty::Stretch => DayRange { low: 66, high: 120 },
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Tiny => "tiny",
            Difficulty::Normal => "normal",
            Difficulty::Stretch => "stretch",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    pub low: u32,
    pub high: u32,
}

/// Every intermediate value behind an estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateBreakdown {
    pub complexity: f64,
    pub valence: f64,
    pub friction: f64,
    pub context: f64,
    pub why: f64,
    pub difficulty_score: f64,
    pub position: f64,
    /// Names of the table rows that fired
    pub matched_rules: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationEstimate {
    pub recommended_days: u32,
    pub recommended_range: DayRange,
    pub difficulty: Difficulty,
    pub breakdown: EstimateBreakdown,
}

// Weights of each factor's excess over 1.0 in the difficulty score
const SCORE_WEIGHTS: [f64; 5] = [0.40, 0.20, 0.25, 0.10, 0.15];
// Weights of each factor's deviation from 1.0 in the position within the range
const POSITION_WEIGHTS: [f64; 5] = [0.35, 0.25, 0.25, 0.20, 0.20];
const POSITION_MIN: f64 = 0.25;
const POSITION_MAX: f64 = 0.75;

/// Estimate how many days `habit_action` takes to become automatic
pub fn estimate(
    habit_action: &str,
    context_stability: Option<ContextStability>,
    why_type: Option<WhyType>,
) -> DurationEstimate {
    let text = HabitText::new(habit_action);
    let mut matched_rules = Vec::new();

    let complexity = complexity_multiplier(&text, &mut matched_rules);
    let valence = table_multiplier(rules::VALENCE, rules::VALENCE_DEFAULT, &text, &mut matched_rules);
    let friction = table_multiplier(rules::FRICTION, rules::FRICTION_DEFAULT, &text, &mut matched_rules);
    let context = context_stability.map_or(DEFAULT_CONTEXT_MULTIPLIER, ContextStability::multiplier);
    let why = why_type.map_or(DEFAULT_WHY_MULTIPLIER, WhyType::multiplier);

    let factors = [complexity, valence, friction, context, why];

    let difficulty_score: f64 = factors
        .iter()
        .zip(SCORE_WEIGHTS)
        .map(|(factor, weight)| weight * (factor - 1.0).max(0.0))
        .sum();
    let difficulty = Difficulty::from_score(difficulty_score);
    let range = difficulty.range();

    let position = (0.5
        + factors
            .iter()
            .zip(POSITION_WEIGHTS)
            .map(|(factor, weight)| weight * (factor - 1.0))
            .sum::<f64>())
    .clamp(POSITION_MIN, POSITION_MAX);

    let span = (range.high - range.low) as f64;
    let raw_days = (range.low as f64 + span * position).round() as u32;
    let recommended_days = raw_days.clamp(range.low, range.high);

    tracing::debug!(
        "Estimated {} days ({}) for '{}' (score {:.3})",
        recommended_days,
        difficulty,
        habit_action,
        difficulty_score
    );

    DurationEstimate {
        recommended_days,
        recommended_range: range,
        difficulty,
        breakdown: EstimateBreakdown {
            complexity,
            valence,
            friction,
            context,
            why,
            difficulty_score,
            position,
            matched_rules,
        },
    }
}

fn complexity_multiplier(text: &HabitText, matched: &mut Vec<&'static str>) -> f64 {
    if rules::COMPLEXITY_EASY.matches(text) {
        matched.push(rules::COMPLEXITY_EASY.name);
        return rules::COMPLEXITY_EASY.value;
    }

    let mut value = rules::COMPLEXITY_BASE;
    for rule in rules::COMPLEXITY_BONUSES.iter().filter(|r| r.matches(text)) {
        matched.push(rule.name);
        value += rule.value;
    }
    value.clamp(rules::COMPLEXITY_MIN, rules::COMPLEXITY_MAX)
}

fn table_multiplier(
    table: &[Rule],
    default: f64,
    text: &HabitText,
    matched: &mut Vec<&'static str>,
) -> f64 {
    match rules::first_match(table, text) {
        Some(rule) => {
            matched.push(rule.name);
            rule.value
        }
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drink_water_is_tiny() {
        let result = estimate("Drink water", None, None);
        assert_eq!(result.difficulty, Difficulty::Tiny);
        assert_eq!(result.recommended_range, DayRange { low: 18, high: 30 });
        assert_eq!(result.breakdown.complexity, 0.9);
        assert_eq!(result.breakdown.valence, 0.95);
        assert_eq!(result.breakdown.friction, 0.95);
        assert_eq!(result.breakdown.context, DEFAULT_CONTEXT_MULTIPLIER);
        assert_eq!(result.breakdown.why, DEFAULT_WHY_MULTIPLIER);
        assert_eq!(result.recommended_days, 24);
    }

    #[test]
    fn test_cold_plunge_is_harder_than_water() {
        let plunge = estimate("cold plunge", None, None);
        let water = estimate("drink water", None, None);

        assert_eq!(plunge.breakdown.valence, 1.18);
        assert_eq!(plunge.breakdown.friction, 1.22);
        assert_eq!(plunge.difficulty, Difficulty::Normal);
        assert_eq!(plunge.recommended_days, 53);
        assert!(plunge.recommended_days > water.recommended_days);
    }

    #[test]
    fn test_stretch_bucket() {
        let result = estimate(
            "Clean the kitchen, meal prep, and study",
            Some(ContextStability::Chaotic),
            Some(WhyType::Outcome),
        );
        assert_eq!(result.difficulty, Difficulty::Stretch);
        assert!((result.breakdown.complexity - 1.30).abs() < 1e-9);
        assert!(result.recommended_days >= 66 && result.recommended_days <= 120);
        assert_eq!(result.recommended_days, 106);
    }

    #[test]
    fn test_easy_family_short_circuits_bonuses() {
        // "stretch" is easy even though "run" would add a bonus
        let result = estimate("Stretch after my run", None, None);
        assert_eq!(result.breakdown.complexity, 0.9);
        assert_eq!(result.breakdown.matched_rules[0], "trivially_easy");
    }

    #[test]
    fn test_lookalike_words_use_defaults() {
        let result = estimate("Eat a cookie", None, None);
        assert_eq!(result.breakdown.complexity, rules::COMPLEXITY_BASE);
        assert_eq!(result.breakdown.friction, rules::FRICTION_DEFAULT);
        assert!(result.breakdown.matched_rules.is_empty());

        let result = estimate("Paint a watercolor", None, None);
        assert_eq!(result.breakdown.complexity, rules::COMPLEXITY_BASE);
    }

    #[test]
    fn test_complexity_is_clamped() {
        let result = estimate("gym workout, cook and clean, then study coding", None, None);
        assert_eq!(result.breakdown.complexity, rules::COMPLEXITY_MAX);
    }

    #[test]
    fn test_context_and_why_defaults() {
        let unspecified = estimate("call grandma", None, None);
        assert_eq!(unspecified.breakdown.valence, rules::VALENCE_DEFAULT);
        assert_eq!(unspecified.breakdown.friction, rules::FRICTION_DEFAULT);

        let stable = estimate("call grandma", Some(ContextStability::Stable), Some(WhyType::Identity));
        assert_eq!(stable.breakdown.context, 0.98);
        assert_eq!(stable.breakdown.why, 0.98);
        assert!(stable.recommended_days <= unspecified.recommended_days);
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let a = estimate("Drink water", Some(ContextStability::Mixed), Some(WhyType::Mixed));
        let b = estimate("Drink water", Some(ContextStability::Mixed), Some(WhyType::Mixed));
        assert_eq!(a, b);
    }

    #[test]
    fn test_days_always_inside_range() {
        let inputs = ["", "x", "run", "cold plunge at the gym", "floss", "budget and taxes"];
        for input in inputs {
            for ctx in [None, Some(ContextStability::Stable), Some(ContextStability::Chaotic)] {
                let e = estimate(input, ctx, Some(WhyType::Outcome));
                let r = e.recommended_range;
                assert!(e.recommended_days >= r.low && e.recommended_days <= r.high);
                assert!(e.breakdown.position >= 0.25 && e.breakdown.position <= 0.75);
            }
        }
    }

    #[test]
    fn test_parse_tags() {
        let stability: ContextStability = serde_json::from_str("\"chaotic\"").unwrap();
        assert_eq!(stability, ContextStability::Chaotic);
        let why: WhyType = serde_json::from_str("\"identity\"").unwrap();
        assert_eq!(why, WhyType::Identity);
        assert!(serde_json::from_str::<ContextStability>("\"sometimes\"").is_err());
    }
}
