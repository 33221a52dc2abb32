use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static! {
    pub static ref CACHE_HITS: IntCounter =
        register_int_counter!("content_cache_hits_total", "Content cache hits").unwrap();
    pub static ref CACHE_MISSES: IntCounter =
        register_int_counter!("content_cache_misses_total", "Content cache misses").unwrap();
    pub static ref RESOLUTIONS: IntCounterVec = register_int_counter_vec!(
        "content_resolutions_total",
        "IMDb lookups by outcome",
        &["outcome"]
    )
    .unwrap();
    pub static ref COALESCED_LOOKUPS: IntCounter = register_int_counter!(
        "content_lookups_coalesced_total",
        "Lookups that joined an in-flight resolution"
    )
    .unwrap();
    pub static ref DISPATCHES: IntCounterVec = register_int_counter_vec!(
        "dispatch_outcomes_total",
        "Dispatch decisions by outcome",
        &["outcome"]
    )
    .unwrap();
}
