pub mod action_executor;
pub mod clipboard;
pub mod config;
pub mod contract;
pub mod core_service;
pub mod history_store;
pub mod host;
pub mod logging;
pub mod model;
pub mod query_dsl;
pub mod runtime;
pub mod search;
pub mod transport;

#[cfg(test)]
mod tests {
    mod filter_latency_test {
        include!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../tests/perf/filter_latency_test.rs"
        ));
    }
}
