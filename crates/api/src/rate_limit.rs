//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Limits mutating requests (reading ingest, enrollment, alert actions)
//! per client IP using tower_governor.

use governor::middleware::StateInformationMiddleware;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

/// Governor config with X-RateLimit-* headers enabled
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Seconds to replenish one request
    pub per_second: u64,
    /// Burst size (max requests that can be made immediately)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // Device gateways post bursts of readings
        Self {
            per_second: 1,
            burst_size: 50,
        }
    }
}

impl RateLimitConfig {
    /// Slow replenishment, small bursts
    pub fn strict() -> Self {
        Self {
            per_second: 2,
            burst_size: 10,
        }
    }

    /// Large bursts for batch backfills
    pub fn lenient() -> Self {
        Self {
            per_second: 1,
            burst_size: 200,
        }
    }
}

/// Create a rate limiting governor config
///
/// Returns `None` when the settings are rejected by the builder (zero
/// rate or burst). Requires the service to use
/// `into_make_service_with_connect_info::<SocketAddr>()` for IP extraction.
pub fn create_governor_config(config: &RateLimitConfig) -> Option<Arc<DefaultGovernorConfig>> {
    GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .map(Arc::new)
}
