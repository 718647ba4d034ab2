//! Upstream backends and the bindings that tie tiers to them.

use crate::Plan;
use serde::{Deserialize, Serialize};

/// One of the supported upstream language-model services.
///
/// Adding a variant forces every exhaustive `match` over backends (adapter
/// construction in particular) to handle it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Backend {
    /// Anthropic Messages API
    Anthropic,
    /// OpenAI Chat Completions API
    OpenAi,
    /// Google Gemini API
    Gemini,
    /// Groq LPU inference (OpenAI-compatible)
    Groq,
    /// HuggingFace Inference API
    HuggingFace,
}

impl Backend {
    /// Provider name used in logs, metrics and error attribution.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// Name of the process configuration key holding a credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(transparent)]
pub struct CredentialRef(pub String);

impl CredentialRef {
    /// Reference a credential by key name.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The configuration key.
    pub fn key(&self) -> &str {
        &self.0
    }
}

/// How an account plan may use a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanAccess {
    /// Charged according to pricing
    Metered,
    /// Allowed at zero cost
    Free,
    /// Not allowed at all
    Denied,
}

/// Concrete backend, model and credential behind a tier.
///
/// Immutable configuration, not user data.
///
/// # Examples
///
/// ```
/// use tessera_core::{Backend, BackendBinding, Plan, PlanAccess};
///
/// let binding = BackendBinding::new(Backend::Anthropic, "claude-sonnet-4-5", "ANTHROPIC_PRO_API_KEY")
///     .with_fixed_cost(0)
///     .elevated();
///
/// assert_eq!(binding.access_for(Plan::Free), PlanAccess::Denied);
/// assert_eq!(binding.access_for(Plan::Pro), PlanAccess::Free);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendBinding {
    /// Upstream service
    pub backend: Backend,
    /// Model identifier sent to the service
    pub model_id: String,
    /// Credential used for this binding
    pub credential: CredentialRef,
    /// Fixed per-request cost overriding the tier pricing formula
    #[serde(default)]
    pub credit_cost_per_request: Option<u32>,
    /// Whether the base plan is barred from this binding
    #[serde(default)]
    pub requires_elevated_plan: bool,
}

impl BackendBinding {
    /// Create a metered binding without a fixed cost.
    pub fn new(
        backend: Backend,
        model_id: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            model_id: model_id.into(),
            credential: CredentialRef::new(credential),
            credit_cost_per_request: None,
            requires_elevated_plan: false,
        }
    }

    /// Charge a fixed amount per request.
    pub fn with_fixed_cost(mut self, cost: u32) -> Self {
        self.credit_cost_per_request = Some(cost);
        self
    }

    /// Restrict the binding to elevated plans.
    pub fn elevated(mut self) -> Self {
        self.requires_elevated_plan = true;
        self
    }

    /// Decide how an account plan may use this binding.
    ///
    /// This is the single authorization predicate for tier access. Unlimited
    /// accounts are never charged. An elevated-only binding is free for
    /// elevated plans and denied to the base plan.
    pub fn access_for(&self, plan: Plan) -> PlanAccess {
        match (plan, self.requires_elevated_plan) {
            (Plan::Unlimited, _) => PlanAccess::Free,
            (Plan::Pro, true) => PlanAccess::Free,
            (Plan::Free, true) => PlanAccess::Denied,
            (_, false) => PlanAccess::Metered,
        }
    }
}
