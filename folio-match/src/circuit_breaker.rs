//! Per-provider circuit breaker.
//!
//! Tracks consecutive failures per provider and temporarily skips providers
//! that keep failing. After a cooldown a tripped provider is half-open: one
//! probe decides whether it is restored or tripped again.
//!
//! ```text
//! ┌────────┐  N failures   ┌────────┐  cooldown   ┌──────────┐
//! │ Closed ├──────────────►│  Open  ├────────────►│ HalfOpen │
//! └───▲────┘               └────────┘             └────┬─────┘
//!     │                         ▲                      │
//!     │  success                │  failure             │
//!     └─────────────────────────┴──────────────────────┘
//! ```

use std::collections::HashMap;
use std::time::Instant;

/// Circuit state for a single provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Healthy; requests pass.
    Closed,
    /// Failing; requests are skipped until the cooldown expires.
    Open,
    /// Cooldown elapsed; a probe request is allowed.
    HalfOpen,
}

#[derive(Debug, Clone)]
struct ProviderHealth {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure_at: Option<Instant>,
}

impl Default for ProviderHealth {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure_at: None,
        }
    }
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub cooldown_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown_secs: 60,
        }
    }
}

/// Independent health tracking for each named provider.
#[derive(Debug, Default)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    providers: HashMap<String, ProviderHealth>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            providers: HashMap::new(),
        }
    }

    /// Record a success; closes the circuit and clears the failure count.
    pub fn record_success(&mut self, provider: &str) {
        let health = self.providers.entry(provider.to_string()).or_default();
        health.state = CircuitState::Closed;
        health.consecutive_failures = 0;
    }

    /// Record a failure; opens the circuit once the threshold is reached.
    pub fn record_failure(&mut self, provider: &str) {
        let health = self.providers.entry(provider.to_string()).or_default();
        health.consecutive_failures += 1;
        health.last_failure_at = Some(Instant::now());

        if health.consecutive_failures >= self.config.failure_threshold {
            if health.state != CircuitState::Open {
                tracing::warn!(
                    provider,
                    failures = health.consecutive_failures,
                    "provider circuit opened"
                );
            }
            health.state = CircuitState::Open;
        }
    }

    /// Whether a request to `provider` should be attempted now.
    ///
    /// An open circuit whose cooldown has elapsed moves to half-open and
    /// allows the request.
    pub fn should_attempt(&mut self, provider: &str) -> bool {
        let cooldown = self.config.cooldown_secs;
        let health = self.providers.entry(provider.to_string()).or_default();

        match health.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooldown_elapsed = health
                    .last_failure_at
                    .is_none_or(|t| t.elapsed().as_secs() >= cooldown);
                if cooldown_elapsed {
                    health.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn state(&self, provider: &str) -> CircuitState {
        self.providers
            .get(provider)
            .map_or(CircuitState::Closed, |h| h.state)
    }

    /// `(provider, state, consecutive_failures)` for every tracked provider,
    /// sorted by provider name.
    pub fn health_report(&self) -> Vec<(String, CircuitState, u32)> {
        let mut report: Vec<_> = self
            .providers
            .iter()
            .map(|(name, h)| (name.clone(), h.state, h.consecutive_failures))
            .collect();
        report.sort_by(|a, b| a.0.cmp(&b.0));
        report
    }

    pub fn reset(&mut self) {
        self.providers.clear();
    }
}
