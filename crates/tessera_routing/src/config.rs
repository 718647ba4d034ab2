//! Configuration structures for the gateway and the credit ledger.
//!
//! The configuration system supports:
//! - Bundled defaults (include_str! from tessera.toml)
//! - User overrides (~/.config/tessera/tessera.toml, then ./tessera.toml)
//! - Environment overrides (`TESSERA__RETRY__MAX_RETRIES=5`)

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tessera_core::{Backend, BackendBinding, CapabilityTier, Plan};
use tessera_error::{ConfigError, TesseraResult};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../tessera.toml");

/// Retry and timeout settings for upstream calls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Additional attempts after the first one
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Delay before the first retry; doubles on every further retry
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound on a single upstream attempt
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
}

fn default_max_retries() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_attempt_timeout_secs() -> u64 {
    120
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
        }
    }
}

/// HTTP client settings shared by all adapters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HttpConfig {
    /// TCP connect timeout
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Longest silence allowed between reads of a response body, streamed
    /// or not
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Base URL overrides keyed by backend name (e.g. `openai`)
    #[serde(default)]
    pub base_urls: HashMap<String, String>,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_read_timeout_secs() -> u64 {
    60
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            base_urls: HashMap::new(),
        }
    }
}

impl HttpConfig {
    /// Base URL override for a backend, if configured.
    pub fn base_url(&self, backend: Backend) -> Option<&str> {
        self.base_urls.get(backend.name()).map(String::as_str)
    }
}

/// One binding per public tier.
///
/// # Example
///
/// ```toml
/// [tiers.fast]
/// backend = "groq"
/// model_id = "llama-3.1-8b-instant"
/// credential = "GROQ_API_KEY"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TierTable {
    /// Binding for `super-smart`
    #[serde(rename = "super-smart")]
    pub super_smart: BackendBinding,
    /// Binding for `pro-smart`
    #[serde(rename = "pro-smart")]
    pub pro_smart: BackendBinding,
    /// Binding for `normal`
    pub normal: BackendBinding,
    /// Binding for `fast`
    pub fast: BackendBinding,
}

impl TierTable {
    /// Binding for a tier.
    pub fn get(&self, tier: CapabilityTier) -> &BackendBinding {
        match tier {
            CapabilityTier::SuperSmart => &self.super_smart,
            CapabilityTier::ProSmart => &self.pro_smart,
            CapabilityTier::Normal => &self.normal,
            CapabilityTier::Fast => &self.fast,
        }
    }
}

/// Daily credit allowance granted on every window reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlanAllowances {
    /// Allowance for the base plan
    #[serde(default = "default_free_allowance")]
    pub free: u32,
    /// Allowance for the pro plan
    #[serde(default = "default_pro_allowance")]
    pub pro: u32,
}

fn default_free_allowance() -> u32 {
    50
}

fn default_pro_allowance() -> u32 {
    500
}

impl Default for PlanAllowances {
    fn default() -> Self {
        Self {
            free: default_free_allowance(),
            pro: default_pro_allowance(),
        }
    }
}

impl PlanAllowances {
    /// Allowance for a plan. Unlimited accounts are never checked.
    pub fn for_plan(&self, plan: Plan) -> u32 {
        match plan {
            Plan::Free => self.free,
            Plan::Pro => self.pro,
            Plan::Unlimited => u32::MAX,
        }
    }
}

/// Workload pricing for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TierPrice {
    /// Minimum credits charged per request
    pub floor: u32,
    /// Words of estimated workload bought by one credit
    pub words_per_credit: u32,
}

impl TierPrice {
    /// Create a price.
    pub const fn new(floor: u32, words_per_credit: u32) -> Self {
        Self {
            floor,
            words_per_credit,
        }
    }
}

/// Workload pricing per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PricingTable {
    /// Price for `super-smart`
    #[serde(rename = "super-smart")]
    pub super_smart: TierPrice,
    /// Price for `pro-smart`
    #[serde(rename = "pro-smart")]
    pub pro_smart: TierPrice,
    /// Price for `normal`
    pub normal: TierPrice,
    /// Price for `fast`
    pub fast: TierPrice,
}

impl PricingTable {
    /// Price for a tier.
    pub fn get(&self, tier: CapabilityTier) -> TierPrice {
        match tier {
            CapabilityTier::SuperSmart => self.super_smart,
            CapabilityTier::ProSmart => self.pro_smart,
            CapabilityTier::Normal => self.normal,
            CapabilityTier::Fast => self.fast,
        }
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            super_smart: TierPrice::new(10, 200),
            pro_smart: TierPrice::new(5, 300),
            normal: TierPrice::new(5, 500),
            fast: TierPrice::new(3, 1000),
        }
    }
}

/// Credit ledger settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct LedgerConfig {
    /// Allowances granted per plan
    #[serde(default)]
    pub allowances: PlanAllowances,
    /// Pricing per tier
    #[serde(default)]
    pub pricing: PricingTable,
}

/// Top-level Tessera configuration.
///
/// # Example
///
/// ```no_run
/// use tessera_core::CapabilityTier;
/// use tessera_routing::TesseraConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TesseraConfig::load()?;
/// let fast = config.tiers.get(CapabilityTier::Fast);
/// println!("fast tier runs on {}", fast.backend);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TesseraConfig {
    /// Retry and timeout settings
    #[serde(default)]
    pub retry: RetryConfig,
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
    /// Tier bindings
    pub tiers: TierTable,
    /// High-availability target for transient failures
    pub fallback: BackendBinding,
    /// Credit ledger settings
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl TesseraConfig {
    /// Load the bundled defaults only.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled file is invalid.
    pub fn bundled() -> TesseraResult<Self> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed or fails validation.
    pub fn from_toml_str(toml: &str) -> TesseraResult<Self> {
        let builder = Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        Self::build(builder)
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> TesseraResult<Self> {
        debug!("Loading configuration from file");
        let builder = Config::builder().add_source(File::from(path.as_ref()));
        Self::build(builder)
    }

    /// Load configuration with precedence: environment > current dir > home dir > bundled.
    ///
    /// User config files are optional and silently skipped if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if any present source is invalid or validation fails.
    #[instrument]
    pub fn load() -> TesseraResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/tessera/tessera.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("tessera").required(false))
            .add_source(
                Environment::with_prefix("TESSERA")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::build(builder)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> TesseraResult<Self> {
        let config: TesseraConfig = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the fallback shares a backend with a tier,
    /// or when pricing would divide by zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        use strum::IntoEnumIterator;

        for tier in CapabilityTier::iter() {
            let binding = self.tiers.get(tier);
            if binding.backend == self.fallback.backend {
                return Err(ConfigError::new(format!(
                    "fallback backend {} is also the primary backend of tier {}",
                    self.fallback.backend, tier
                )));
            }
            if self.ledger.pricing.get(tier).words_per_credit == 0 {
                return Err(ConfigError::new(format!(
                    "ledger.pricing.{}.words_per_credit must be positive",
                    tier
                )));
            }
        }
        Ok(())
    }
}
