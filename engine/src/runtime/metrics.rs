use std::sync::LazyLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Global metrics registry for the dispatch hub.
pub static METRICS: LazyLock<Metrics> = LazyLock::new(|| {
    describe_counter!("books_created_total", "Total number of books ever created");
    describe_gauge!("books_live", "Number of currently live books");
    describe_counter!(
        "book_commands_total",
        "Total number of commands processed by a book actor",
    );
    describe_gauge!("subscribers_active", "Number of active WebSocket subscribers");
    describe_counter!(
        "subscriber_events_dropped_total",
        "Total number of event frames dropped because a subscriber's queue was full",
    );

    Metrics
});

/// Application metrics facade (instance methods for incrementing counters).
pub struct Metrics;

impl Metrics {
    /// Increments the books-created counter and the live-books gauge.
    pub fn record_book_created(&self) {
        counter!("books_created_total").increment(1);
        gauge!("books_live").increment(1.0);
    }

    /// Increments the per-(venue, symbol) command counter.
    pub fn record_command(&self, venue: &str, symbol: &str) {
        counter!(
            "book_commands_total",
            "venue" => venue.to_owned(),
            "symbol" => symbol.to_owned(),
        )
        .increment(1);
    }

    pub fn record_subscriber_connected(&self) {
        gauge!("subscribers_active").increment(1.0);
    }

    pub fn record_subscriber_disconnected(&self) {
        gauge!("subscribers_active").decrement(1.0);
    }

    pub fn record_event_dropped(&self) {
        counter!("subscriber_events_dropped_total").increment(1);
    }
}
