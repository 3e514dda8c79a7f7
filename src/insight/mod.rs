//! Personal profile panel and the generated Vitamin D recommendation.
//!
//! A calculation is a three-step exchange: [`ProfilePanel::begin`] validates
//! the profile and builds a tagged request, [`resolve`] performs the single
//! provider call off the UI loop, and [`ProfilePanel::complete`] applies the
//! outcome if it still belongs to the current country and profile.

mod profile;
mod provider;

pub use profile::{Sex, SkinType, UserProfile};
pub use provider::{GeminiProvider, InsightProvider};
#[cfg(test)]
pub(crate) use provider::InsightError;

use crate::catalog::CountryRecord;

/// Shown whenever the provider call fails
pub const FALLBACK_ADVISORY: &str =
    "Ensure adequate Vitamin D intake during winter months when UV levels are insufficient for natural synthesis.";

/// Shown when the provider answers with blank text
pub const EMPTY_RESPONSE_ADVICE: &str = "Consult a healthcare provider for specific advice.";

/// A calculation waiting to be sent
#[derive(Clone, Debug)]
pub struct InsightRequest {
    pub token: u64,
    pub model: String,
    pub prompt: String,
    pub profile: UserProfile,
}

/// A finished calculation, successful or not
#[derive(Clone, Debug)]
pub struct InsightOutcome {
    pub token: u64,
    pub text: String,
    pub profile: UserProfile,
}

/// Prompt sent to the text generator
pub fn build_prompt(profile: &UserProfile, country: &CountryRecord) -> String {
    format!(
        "Based on a user who is {} years old, identified as {}, with skin type {}, living in {} \
         (which currently has {} UV index), provide a concise 2-sentence recommendation for \
         Vitamin D intake. Include why the specific factors matter.",
        profile.age,
        profile.sex,
        profile.skin_type.id(),
        country.name,
        country.uv_index
    )
}

/// Perform the provider call for a request; never fails
pub async fn resolve(provider: &dyn InsightProvider, request: InsightRequest) -> InsightOutcome {
    let text = match provider.generate(&request.model, &request.prompt).await {
        Ok(text) if text.trim().is_empty() => EMPTY_RESPONSE_ADVICE.to_string(),
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, token = request.token, "insight generation failed, using fallback");
            FALLBACK_ADVISORY.to_string()
        }
    };

    InsightOutcome {
        token: request.token,
        text,
        profile: request.profile,
    }
}

/// Profile form plus the latest recommendation
#[derive(Debug)]
pub struct ProfilePanel {
    profile: UserProfile,
    insight: Option<String>,
    in_flight: bool,
    /// Bumped whenever an outstanding answer would no longer fit the inputs
    token: u64,
    model: String,
}

impl ProfilePanel {
    pub fn new(model: String) -> Self {
        Self {
            profile: UserProfile::default(),
            insight: None,
            in_flight: false,
            token: 0,
            model,
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn insight(&self) -> Option<&str> {
        self.insight.as_deref()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Calculate is enabled once an age is entered and nothing is outstanding
    pub fn can_calculate(&self) -> bool {
        self.profile.has_age() && !self.in_flight
    }

    pub fn push_age_digit(&mut self, ch: char) {
        if self.profile.push_age_digit(ch) {
            self.invalidate();
        }
    }

    pub fn pop_age_digit(&mut self) {
        if self.profile.pop_age_digit() {
            self.invalidate();
        }
    }

    pub fn set_sex(&mut self, sex: Sex) {
        if self.profile.sex != sex {
            self.profile.sex = sex;
            self.invalidate();
        }
    }

    pub fn toggle_sex(&mut self) {
        self.set_sex(self.profile.sex.toggled());
    }

    pub fn next_skin_type(&mut self) {
        self.set_skin_type(self.profile.skin_type.next());
    }

    pub fn prev_skin_type(&mut self) {
        self.set_skin_type(self.profile.skin_type.prev());
    }

    fn set_skin_type(&mut self, skin_type: SkinType) {
        if self.profile.skin_type != skin_type {
            self.profile.skin_type = skin_type;
            self.invalidate();
        }
    }

    /// The active country changed; an outstanding answer is now stale
    pub fn country_changed(&mut self) {
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.token = self.token.wrapping_add(1);
    }

    /// Start a calculation for `country`, or `None` if the action is disabled
    pub fn begin(&mut self, country: &CountryRecord) -> Option<InsightRequest> {
        if !self.can_calculate() {
            return None;
        }

        self.invalidate();
        self.in_flight = true;

        tracing::info!(country = %country.id, token = self.token, "requesting insight");
        Some(InsightRequest {
            token: self.token,
            model: self.model.clone(),
            prompt: build_prompt(&self.profile, country),
            profile: self.profile.clone(),
        })
    }

    /// Apply a finished calculation. Returns the profile it was computed for,
    /// or `None` when the inputs changed while it was outstanding.
    pub fn complete(&mut self, outcome: InsightOutcome) -> Option<UserProfile> {
        self.in_flight = false;

        if outcome.token != self.token {
            tracing::debug!(token = outcome.token, current = self.token, "discarding stale insight");
            return None;
        }

        self.insight = Some(outcome.text);
        Some(outcome.profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingProvider;

    #[async_trait]
    impl InsightProvider for FailingProvider {
        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, InsightError> {
            Err(InsightError::Status {
                status: 503,
                body: "overloaded".to_string(),
            })
        }
    }

    /// Echoes a fixed answer and counts calls
    struct FixedProvider {
        answer: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl InsightProvider for FixedProvider {
        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, InsightError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.to_string())
        }
    }

    fn panel_with_age(age: &str) -> ProfilePanel {
        let mut panel = ProfilePanel::new("gemini-3-flash-preview".to_string());
        for ch in age.chars() {
            panel.push_age_digit(ch);
        }
        panel
    }

    #[test]
    fn test_calculate_gating() {
        let catalog = Catalog::europe();
        let mut panel = panel_with_age("");
        assert!(!panel.can_calculate());
        assert!(panel.begin(catalog.first()).is_none());

        panel.push_age_digit('4');
        assert!(panel.can_calculate());
        assert!(panel.begin(catalog.first()).is_some());

        // Second request while the first is outstanding is refused
        assert!(!panel.can_calculate());
        assert!(panel.begin(catalog.first()).is_none());
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let catalog = Catalog::europe();
        let mut panel = panel_with_age("30");
        panel.toggle_sex();
        panel.next_skin_type();

        let prompt = build_prompt(panel.profile(), catalog.get("norway").unwrap());
        assert_eq!(
            prompt,
            "Based on a user who is 30 years old, identified as Male, with skin type 4, living in Norway \
             (which currently has Extremely Low UV index), provide a concise 2-sentence recommendation for \
             Vitamin D intake. Include why the specific factors matter."
        );
        assert_eq!(prompt, build_prompt(panel.profile(), catalog.get("norway").unwrap()));
    }

    #[tokio::test]
    async fn test_failure_uses_fallback() {
        let catalog = Catalog::europe();
        let sweden = catalog.get("sweden").unwrap();
        let mut panel = panel_with_age("30");
        assert_eq!(panel.profile().sex, Sex::Female);
        assert_eq!(panel.profile().skin_type.id(), 3);

        let request = panel.begin(sweden).unwrap();
        assert!(panel.in_flight());

        let outcome = resolve(&FailingProvider, request).await;
        let used = panel.complete(outcome);

        assert_eq!(panel.insight(), Some(FALLBACK_ADVISORY));
        assert!(!panel.in_flight());
        assert!(panel.can_calculate());
        assert_eq!(used.map(|p| p.age), Some("30".to_string()));
    }

    #[tokio::test]
    async fn test_blank_answer_advises_provider() {
        let catalog = Catalog::europe();
        let mut panel = panel_with_age("52");
        let provider = FixedProvider {
            answer: "  ",
            calls: AtomicUsize::new(0),
        };

        let request = panel.begin(catalog.first()).unwrap();
        panel.complete(resolve(&provider, request).await);
        assert_eq!(panel.insight(), Some(EMPTY_RESPONSE_ADVICE));
    }

    #[test]
    fn test_one_call_per_request() {
        let catalog = Catalog::europe();
        let mut panel = panel_with_age("61");
        let provider = FixedProvider {
            answer: "Take 1000 IU daily.",
            calls: AtomicUsize::new(0),
        };

        let request = panel.begin(catalog.first()).unwrap();
        assert!(panel.begin(catalog.first()).is_none());

        let outcome = tokio_test::block_on(resolve(&provider, request));
        panel.complete(outcome);

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(panel.insight(), Some("Take 1000 IU daily."));
    }

    #[tokio::test]
    async fn test_stale_answer_discarded() {
        let catalog = Catalog::europe();
        let mut panel = panel_with_age("30");
        let provider = FixedProvider {
            answer: "For Sweden.",
            calls: AtomicUsize::new(0),
        };

        let request = panel.begin(catalog.get("sweden").unwrap()).unwrap();
        // User moves on to another country while waiting
        panel.country_changed();

        let used = panel.complete(resolve(&provider, request).await);
        assert!(used.is_none());
        assert_eq!(panel.insight(), None);
        assert!(!panel.in_flight());
    }

    #[test]
    fn test_noop_edits_keep_request_current() {
        let catalog = Catalog::europe();
        let mut panel = panel_with_age("30");
        let request = panel.begin(catalog.first()).unwrap();

        panel.set_sex(Sex::Female);
        panel.push_age_digit('z');

        let outcome = InsightOutcome {
            token: request.token,
            text: "ok".to_string(),
            profile: request.profile,
        };
        assert!(panel.complete(outcome).is_some());
        assert_eq!(panel.insight(), Some("ok"));
    }

    #[test]
    fn test_profile_edit_makes_request_stale() {
        let catalog = Catalog::europe();
        let mut panel = panel_with_age("30");
        let request = panel.begin(catalog.first()).unwrap();

        panel.next_skin_type();

        let outcome = InsightOutcome {
            token: request.token,
            text: "stale".to_string(),
            profile: request.profile,
        };
        assert!(panel.complete(outcome).is_none());
        assert!(panel.can_calculate());
    }
}
