/// Boundary to the advisory text-generation service
///
/// The service (an LLM behind HTTP) rephrases a habit into a smaller task and
/// explains the recommended duration. It is only trusted for prose: the
/// numeric duration fields always come from `estimator::estimate`, and a
/// response that fails validation is rejected before it reaches anyone.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::HabitId;
use crate::estimator::{estimate, ContextStability, DayRange, Difficulty, DurationEstimate, WhyType};

/// Number of tips a response must carry
pub const TIP_COUNT: usize = 3;

/// How the user feels when asking for advice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodTag {
    Energized,
    Motivated,
    Calm,
    Neutral,
    Tired,
    Stressed,
    Anxious,
    Overwhelmed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryRequest {
    pub habit_action: String,
    pub mood_tag: MoodTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_stability: Option<ContextStability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_type: Option<WhyType>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdvisoryError {
    #[error("Advisory service unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed advisory response: {0}")]
    Malformed(String),

    #[error("Advisory response does not match the expected schema: {0}")]
    SchemaMismatch(String),
}

/// Raw response as returned by the service
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryResponse {
    pub modified_task: String,
    pub tips: Vec<String>,
    pub why: String,
    pub research_note: String,
    pub days_why: String,
    // Numeric fields are read only to notice disagreement; they are replaced
    #[serde(default)]
    pub recommended_days: Option<Value>,
    #[serde(default)]
    pub recommended_range: Option<Value>,
    #[serde(default)]
    pub difficulty: Option<Value>,
}

impl AdvisoryResponse {
    /// Parse and validate a raw JSON response
    pub fn from_value(value: Value) -> Result<Self, AdvisoryError> {
        if !value.is_object() {
            return Err(AdvisoryError::SchemaMismatch("response is not a JSON object".to_string()));
        }

        let response: Self =
            serde_json::from_value(value).map_err(|e| AdvisoryError::Malformed(e.to_string()))?;
        response.validate()?;
        Ok(response)
    }

    fn validate(&self) -> Result<(), AdvisoryError> {
        let fields = [
            ("modifiedTask", &self.modified_task),
            ("why", &self.why),
            ("researchNote", &self.research_note),
            ("daysWhy", &self.days_why),
        ];
        for (name, text) in fields {
            if text.trim().is_empty() {
                return Err(AdvisoryError::Malformed(format!("{} is empty", name)));
            }
        }

        if self.tips.len() != TIP_COUNT {
            return Err(AdvisoryError::Malformed(format!(
                "expected {} tips, got {}",
                TIP_COUNT,
                self.tips.len()
            )));
        }
        if self.tips.iter().any(|tip| tip.trim().is_empty()) {
            return Err(AdvisoryError::Malformed("tips must not be empty".to_string()));
        }

        Ok(())
    }

    /// Combine the service's prose with the core's own numbers
    pub fn lock(self, estimate: &DurationEstimate) -> LockedAdvice {
        if let Some(days) = &self.recommended_days {
            if days.as_u64() != Some(estimate.recommended_days as u64) {
                tracing::debug!(
                    "Advisory service proposed {} days; keeping {}",
                    days,
                    estimate.recommended_days
                );
            }
        }

        LockedAdvice {
            modified_task: self.modified_task.trim().to_string(),
            tips: self.tips.into_iter().map(|t| t.trim().to_string()).collect(),
            why: self.why.trim().to_string(),
            research_note: self.research_note.trim().to_string(),
            days_why: self.days_why.trim().to_string(),
            recommended_days: estimate.recommended_days,
            recommended_range: estimate.recommended_range,
            difficulty: estimate.difficulty,
        }
    }
}

/// Validated advice whose numbers match the estimator exactly
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedAdvice {
    pub modified_task: String,
    pub tips: Vec<String>,
    pub why: String,
    pub research_note: String,
    pub days_why: String,
    pub recommended_days: u32,
    pub recommended_range: DayRange,
    pub difficulty: Difficulty,
}

/// The external text generator
///
/// Implementations receive the locked estimate so the prose can refer to it;
/// whatever numbers they send back are discarded.
#[async_trait]
pub trait AdvisoryService: Send + Sync {
    async fn generate(
        &self,
        request: &AdvisoryRequest,
        locked: &DurationEstimate,
    ) -> Result<Value, AdvisoryError>;
}

/// Estimate, ask the service, validate, and lock the numbers
pub async fn fetch_locked_advice(
    service: &dyn AdvisoryService,
    request: &AdvisoryRequest,
) -> Result<LockedAdvice, AdvisoryError> {
    let locked = estimate(&request.habit_action, request.context_stability, request.why_type);
    let raw = service.generate(request, &locked).await?;
    let response = AdvisoryResponse::from_value(raw)?;
    Ok(response.lock(&locked))
}

type SharedAdvice = Shared<BoxFuture<'static, Result<LockedAdvice, AdvisoryError>>>;

/// Collapses concurrent requests for the same habit and mood into one call
pub struct AdvisoryCoordinator {
    service: Arc<dyn AdvisoryService>,
    in_flight: Mutex<HashMap<(HabitId, MoodTag), SharedAdvice>>,
}

impl AdvisoryCoordinator {
    pub fn new(service: Arc<dyn AdvisoryService>) -> Self {
        Self {
            service,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn request(
        &self,
        habit_id: HabitId,
        request: AdvisoryRequest,
    ) -> Result<LockedAdvice, AdvisoryError> {
        let key = (habit_id, request.mood_tag);

        let shared = {
            let mut pending = self.pending();
            match pending.get(&key) {
                Some(existing) => {
                    tracing::debug!("Joining in-flight advisory request for habit {}", key.0);
                    existing.clone()
                }
                None => {
                    let service = Arc::clone(&self.service);
                    let future = async move { fetch_locked_advice(service.as_ref(), &request).await }
                        .boxed()
                        .shared();
                    pending.insert(key.clone(), future.clone());
                    future
                }
            }
        };

        let result = shared.await;

        let mut pending = self.pending();
        if pending.get(&key).is_some_and(|f| f.peek().is_some()) {
            pending.remove(&key);
        }

        result
    }

    pub fn in_flight_count(&self) -> usize {
        self.pending().len()
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<(HabitId, MoodTag), SharedAdvice>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn good_response(days: u32) -> Value {
        json!({
            "modifiedTask": "Drink one glass of water after brushing your teeth",
            "tips": ["Keep a glass by the sink", "Pair it with brushing", "Refill at night"],
            "why": "Anchoring to an existing routine removes the decision",
            "researchNote": "Habit automaticity plateaus after a few weeks for simple actions",
            "daysWhy": "Simple actions with zero setup settle quickly",
            "recommendedDays": days,
            "difficulty": "stretch"
        })
    }

    fn request(mood: MoodTag) -> AdvisoryRequest {
        AdvisoryRequest {
            habit_action: "Drink water".to_string(),
            mood_tag: mood,
            context_stability: None,
            why_type: None,
        }
    }

    struct FixedService {
        response: Value,
        calls: AtomicUsize,
    }

    impl FixedService {
        fn new(response: Value) -> Self {
            Self { response, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl AdvisoryService for FixedService {
        async fn generate(
            &self,
            _request: &AdvisoryRequest,
            _locked: &DurationEstimate,
        ) -> Result<Value, AdvisoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(self.response.clone())
        }
    }

    struct DownService;

    #[async_trait]
    impl AdvisoryService for DownService {
        async fn generate(
            &self,
            _request: &AdvisoryRequest,
            _locked: &DurationEstimate,
        ) -> Result<Value, AdvisoryError> {
            Err(AdvisoryError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_numbers_are_overwritten() {
        let service = FixedService::new(good_response(7));
        let advice = fetch_locked_advice(&service, &request(MoodTag::Calm)).await.unwrap();
        let expected = estimate("Drink water", None, None);

        assert_eq!(advice.recommended_days, expected.recommended_days);
        assert_eq!(advice.recommended_range, expected.recommended_range);
        assert_eq!(advice.difficulty, expected.difficulty);
        assert_eq!(advice.tips.len(), TIP_COUNT);
    }

    #[test]
    fn test_malformed_responses_are_rejected() {
        let mut two_tips = good_response(24);
        two_tips["tips"] = json!(["one", "two"]);
        assert!(matches!(
            AdvisoryResponse::from_value(two_tips),
            Err(AdvisoryError::Malformed(_))
        ));

        let mut blank_why = good_response(24);
        blank_why["why"] = json!("   ");
        assert!(matches!(
            AdvisoryResponse::from_value(blank_why),
            Err(AdvisoryError::Malformed(_))
        ));

        let mut missing = good_response(24);
        missing.as_object_mut().unwrap().remove("daysWhy");
        assert!(matches!(
            AdvisoryResponse::from_value(missing),
            Err(AdvisoryError::Malformed(_))
        ));

        assert!(matches!(
            AdvisoryResponse::from_value(json!("just text")),
            Err(AdvisoryError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_service_failure_is_reported() {
        let result = tokio_test::block_on(fetch_locked_advice(&DownService, &request(MoodTag::Tired)));
        assert_eq!(
            result,
            Err(AdvisoryError::Unavailable("connection refused".to_string()))
        );
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_collapsed() {
        let service = Arc::new(FixedService::new(good_response(24)));
        let coordinator = AdvisoryCoordinator::new(service.clone());
        let habit_id = HabitId::new();

        let (first, second) = tokio::join!(
            coordinator.request(habit_id.clone(), request(MoodTag::Stressed)),
            coordinator.request(habit_id.clone(), request(MoodTag::Stressed)),
        );

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.in_flight_count(), 0);

        // A different mood is a different request
        coordinator.request(habit_id, request(MoodTag::Calm)).await.unwrap();
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    }
}
