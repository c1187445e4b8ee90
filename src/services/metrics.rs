//! Prometheus counters, served from the default registry on `/metrics`

use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    /// One increment per resolver route attempt, labelled by route name and outcome
    pub static ref ROUTE_ATTEMPTS: IntCounterVec = register_int_counter_vec!(
        "resolver_route_attempts_total",
        "Fallback resolver attempts by route and outcome",
        &["route", "outcome"]
    )
    .expect("resolver_route_attempts_total registers once");

    /// Guide loads by outcome (loaded, pending, unavailable)
    pub static ref GUIDE_FETCHES: IntCounterVec = register_int_counter_vec!(
        "guide_fetches_total",
        "Short EPG loads by outcome",
        &["outcome"]
    )
    .expect("guide_fetches_total registers once");
}

pub fn record_attempt(route: &str, outcome: &str) {
    ROUTE_ATTEMPTS.with_label_values(&[route, outcome]).inc();
}

pub fn record_guide(outcome: &str) {
    GUIDE_FETCHES.with_label_values(&[outcome]).inc();
}
