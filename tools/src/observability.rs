use std::env;

use tracing_subscriber::{
    EnvFilter, Layer, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Initializes the global `tracing` subscriber: compact stdout formatting,
/// span-close events, and a sane default filter (`debug` for this crate,
/// `error` for chatty dependencies).
pub fn setup_opentelemetry(name: &'static str) {
    let fmt_log_level = env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_owned());

    let filter_fmt = EnvFilter::new(fmt_log_level.clone())
        .add_directive(format!("{name}={fmt_log_level}").parse().unwrap())
        .add_directive("hyper=error".parse().unwrap())
        .add_directive("h2=error".parse().unwrap())
        .add_directive("tower_http=error".parse().unwrap())
        .add_directive("axum::rejection=trace".parse().unwrap())
        .add_directive("tungstenite=info".parse().unwrap())
        .add_directive("tracing=error".parse().unwrap());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_span_events(FmtSpan::CLOSE)
        .with_level(true)
        .with_filter(filter_fmt);

    tracing_subscriber::registry().with(fmt_layer).init();
}
