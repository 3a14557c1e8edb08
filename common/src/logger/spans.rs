use tracing::{Span, field};

use super::TraceId;

/// Create a root span for one command / request.
///
/// Booking fields start empty and are filled in by [`annotate_span`] once the
/// request has been parsed.
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "root",
        name = %name,
        trace_id = %trace_id,
        table_id = field::Empty,
        date = field::Empty,
        reservation_id = field::Empty
    )
}

/// Create a child span (inherits trace_id from the enclosing root).
pub fn child_span(name: &'static str) -> Span {
    tracing::info_span!(
        "child",
        name = %name,
        table_id = field::Empty,
        date = field::Empty,
        reservation_id = field::Empty
    )
}

/// Records booking coordinates on the current span.
pub fn annotate_span(
    date: Option<&dyn std::fmt::Display>,
    table_id: Option<i64>,
    reservation_id: Option<i64>,
) {
    let span = Span::current();
    if let Some(date) = date {
        span.record("date", field::display(date));
    }
    if let Some(table_id) = table_id {
        span.record("table_id", table_id);
    }
    if let Some(id) = reservation_id {
        span.record("reservation_id", id);
    }
}
