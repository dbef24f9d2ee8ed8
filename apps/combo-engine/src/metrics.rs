//! Metric recording helpers.
//!
//! Thin wrappers over the `metrics` facade. The host process installs the
//! exporter; without one every call is a no-op.

use ::metrics::{counter, gauge};

// ============================================================================
// Chain Aggregation Metrics
// ============================================================================

/// Record a contract stored under a new strike side.
pub fn record_contract_recorded(underlying: &str) {
    counter!("chain_contracts_total", "underlying" => underlying.to_string()).increment(1);
}

/// Record a re-sent contract that was ignored.
pub fn record_duplicate_contract(underlying: &str) {
    counter!("chain_duplicates_total", "underlying" => underlying.to_string()).increment(1);
}

/// Record a newly created expiry chain.
pub fn record_chain_created(underlying: &str) {
    counter!("chain_expiries_created_total", "underlying" => underlying.to_string()).increment(1);
}

/// Record a filter decision for one expiry.
///
/// # Arguments
///
/// * `underlying` - Underlying symbol
/// * `outcome` - `"keep"`, `"prune"` or `"drop"`
pub fn record_chain_filter(underlying: &str, outcome: &str) {
    counter!(
        "chain_expiries_filtered_total",
        "underlying" => underlying.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Update the retained chain gauges after filtering.
pub fn update_chain_gauges(underlying: &str, expiries: usize, strikes: usize) {
    gauge!("chain_expiries", "underlying" => underlying.to_string()).set(expiries as f64);
    gauge!("chain_strikes", "underlying" => underlying.to_string()).set(strikes as f64);
}

// ============================================================================
// Combo Metrics
// ============================================================================

/// Record a leg state transition.
pub fn record_leg_transition(to: &str) {
    counter!("combo_leg_transitions_total", "to" => to.to_string()).increment(1);
}

/// Record a roll event.
///
/// # Arguments
///
/// * `kind` - `"calendar"` or `"diagonal"`
/// * `outcome` - `"started"`, `"completed"`, `"aborted"`, `"open_only"` or `"close_only"`
pub fn record_roll(kind: &str, outcome: &str) {
    counter!(
        "combo_rolls_total",
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a combo order event.
///
/// # Arguments
///
/// * `purpose` - Order purpose (e.g., `"open"`, `"roll_close"`)
/// * `event` - `"submitted"`, `"filled"` or `"cancelled"`
pub fn record_combo_order(purpose: &str, event: &str) {
    counter!(
        "combo_orders_total",
        "purpose" => purpose.to_string(),
        "event" => event.to_string()
    )
    .increment(1);
}

/// Update the outstanding combo orders gauge.
pub fn update_active_orders(count: usize) {
    gauge!("combo_orders_active").set(count as f64);
}
