//! Prometheus metrics for the token signer.
//!
//! Counters are registered in the default registry on first use.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, CounterVec};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "jwt_signer_tokens_issued_total",
        "Total number of tokens issued",
        &["algorithm"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Token parse outcomes.
pub static TOKENS_PARSED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "jwt_signer_tokens_parsed_total",
        "Total number of tokens parsed, by outcome",
        &["outcome"]
    )
    .expect("Failed to register tokens_parsed metric")
});

/// Key material loads.
pub static KEY_LOADS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "jwt_signer_key_loads_total",
        "Total number of key material loads",
        &["key", "source", "status"]
    )
    .expect("Failed to register key_loads metric")
});

/// Record a token issuance.
pub fn record_token_issued(algorithm: &str) {
    TOKENS_ISSUED.with_label_values(&[algorithm]).inc();
}

/// Record a parse outcome: `ok` or an error code.
pub fn record_token_parsed(outcome: &str) {
    TOKENS_PARSED.with_label_values(&[outcome]).inc();
}

/// Record a key load from `file`, `generated`, or `cache`.
pub fn record_key_load(key: &str, source: &str, status: &str) {
    KEY_LOADS.with_label_values(&[key, source, status]).inc();
}
