//! Optional natural-language explanation collaborator. Any failure here
//! falls back to the deterministic templates; an itinerary with template
//! explanations beats no itinerary.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::{EngineError, EngineResult};
use crate::models::activity::Activity;
use crate::models::trip::GroupProfile;

const DEFAULT_EXPLANATION_MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT_SECONDS: u64 = 8;

pub struct ExplanationContext<'a> {
    pub plan_name: &'a str,
    pub style: &'a str,
    pub destination: &'a str,
    pub profile: &'a GroupProfile,
}

#[async_trait]
pub trait ExplanationService: Send + Sync {
    async fn explain_plan(&self, ctx: &ExplanationContext<'_>) -> EngineResult<String>;

    /// One short explanation per activity, keyed by activity name, so draft
    /// cards and composed day plans can say what each place is and why it
    /// fits the group.
    async fn explain_activities(
        &self,
        activities: &[Activity],
        ctx: &ExplanationContext<'_>,
    ) -> EngineResult<HashMap<String, String>>;
}

/// Template used for any activity the service cannot explain, and for every
/// activity when no service is configured.
pub fn template_activity_explanation(activity: &Activity, destination: &str) -> String {
    format!(
        "A great {} option for the group in {}.",
        activity.category.as_str(),
        destination
    )
}

/// Parse a "NAME: explanation" line-per-place response, tolerating list
/// dashes and markdown emphasis around the name.
pub fn parse_activity_explanations(text: &str) -> HashMap<String, String> {
    let mut explanations = HashMap::new();
    for line in text.lines() {
        let Some((name, explanation)) = line.split_once(": ") else {
            continue;
        };
        let name = name
            .trim()
            .trim_start_matches("- ")
            .replace('*', "")
            .trim()
            .to_string();
        if !name.is_empty() {
            explanations.insert(name, explanation.trim().to_string());
        }
    }
    explanations
}

/// OpenAI-compatible chat-completion client.
pub struct OpenAiExplanationService {
    api_key: String,
    model: String,
    endpoint: String,
    http: reqwest::Client,
}

impl OpenAiExplanationService {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Build from `OPENAI_API_KEY` / `OPENAI_EXPLANATION_MODEL`; `None` when
    /// no key is configured, which keeps explanations deterministic.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let model = std::env::var("OPENAI_EXPLANATION_MODEL")
            .unwrap_or_else(|_| DEFAULT_EXPLANATION_MODEL.to_string());
        Some(Self::new(api_key, model))
    }

    async fn complete(&self, prompt: String, max_tokens: u32) -> EngineResult<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": max_tokens,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::ExternalService(format!("explanation request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(EngineError::ExternalService(format!(
                "explanation service returned status {}",
                response.status()
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EngineError::ExternalService(format!("explanation response invalid: {}", e)))?;

        let text = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .trim()
            .to_string();
        if text.is_empty() {
            return Err(EngineError::ExternalService(
                "explanation service returned empty text".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl ExplanationService for OpenAiExplanationService {
    async fn explain_plan(&self, ctx: &ExplanationContext<'_>) -> EngineResult<String> {
        let prompt = format!(
            "Write 1-2 sentences explaining this itinerary option for a group trip. \
             Plan: {} ({}). Destination: {}. Top interest: {}. Pace: {}. \
             Wake style: {}. Keep it practical and concise.",
            ctx.plan_name,
            ctx.style,
            ctx.destination,
            ctx.profile.interests.top_dimension(),
            ctx.profile.schedule_preference.as_str(),
            ctx.profile.wake_preference.as_str(),
        );
        self.complete(prompt, 200).await
    }

    async fn explain_activities(
        &self,
        activities: &[Activity],
        ctx: &ExplanationContext<'_>,
    ) -> EngineResult<HashMap<String, String>> {
        if activities.is_empty() {
            return Ok(HashMap::new());
        }

        let names: Vec<&str> = activities.iter().map(|a| a.name.as_str()).collect();
        let prompt = format!(
            "For a group trip to {} with a focus on {} and pacing style '{}', \
             provide a 1-2 sentence explanation for why each of the following \
             places was chosen and what it is. Places: {}. Return the result \
             vertically, with each explanation on a new line starting with \
             'PLACE_NAME: '.",
            ctx.destination,
            ctx.profile.interests.top_dimension(),
            ctx.style,
            names.join(", "),
        );

        let text = self.complete(prompt, 1000).await?;
        let parsed = parse_activity_explanations(&text);

        Ok(activities
            .iter()
            .map(|activity| {
                let matched = parsed.get(&activity.name).cloned().or_else(|| {
                    parsed
                        .iter()
                        .find(|(name, _)| {
                            name.contains(&activity.name) || activity.name.contains(name.as_str())
                        })
                        .map(|(_, explanation)| explanation.clone())
                });
                let explanation = matched
                    .unwrap_or_else(|| template_activity_explanation(activity, ctx.destination));
                (activity.name.clone(), explanation)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::Category;

    fn activity(name: &str, category: Category) -> Activity {
        Activity {
            name: name.to_string(),
            category,
            rating: 4.5,
            price_level: 2,
            latitude: 40.74,
            longitude: -74.0,
            typical_visit_duration: 90,
            explanation: None,
            image_url: None,
            activity_url: None,
            estimated_price: None,
            price_confidence: None,
        }
    }

    #[test]
    fn test_template_names_category_and_destination() {
        let text = template_activity_explanation(
            &activity("Harbor Gallery", Category::Culture),
            "harborville",
        );
        assert_eq!(
            text,
            "A great culture option for the group in harborville."
        );
    }

    #[test]
    fn test_parse_tolerates_list_markup() {
        let parsed = parse_activity_explanations(
            "Harbor Gallery: A modern art space.\n\
             - Old Town Walk: Historic streets near the port.\n\
             **Loud Bar**: Live music most nights.\n\
             not a place line",
        );
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed["Harbor Gallery"], "A modern art space.");
        assert_eq!(parsed["Old Town Walk"], "Historic streets near the port.");
        assert_eq!(parsed["Loud Bar"], "Live music most nights.");
    }
}
