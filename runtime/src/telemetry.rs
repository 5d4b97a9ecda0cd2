//! Metric names recorded by the root store
//!
//! The store records through the [`metrics`](::metrics) facade only. Hosts install
//! whichever recorder they like; without one every call is a no-op.

use ::metrics::{describe_counter, describe_histogram};

/// Actions accepted by [`RootStore::dispatch`](crate::RootStore::dispatch)
pub const DISPATCH_TOTAL: &str = "reflux.dispatch.total";

/// Actions no mounted feature area answered
pub const DISPATCH_UNMATCHED: &str = "reflux.dispatch.unmatched";

/// Actions rejected because the store was shut down
pub const DISPATCH_REJECTED: &str = "reflux.dispatch.rejected";

/// Time spent in one feature area's dispatcher
pub const REDUCER_DURATION: &str = "reflux.reducer.duration_seconds";

/// Navigation effects executed
pub const NAVIGATION_TOTAL: &str = "reflux.navigation.total";

/// Register descriptions for every store metric with the installed recorder
///
/// Call once after installing a recorder.
pub fn describe() {
    describe_counter!(DISPATCH_TOTAL, "Total number of actions dispatched to the root store");
    describe_counter!(DISPATCH_UNMATCHED, "Dispatched actions no feature area handled");
    describe_counter!(DISPATCH_REJECTED, "Dispatches rejected after shutdown");
    describe_histogram!(
        REDUCER_DURATION,
        ::metrics::Unit::Seconds,
        "Feature area dispatcher execution time"
    );
    describe_counter!(NAVIGATION_TOTAL, "Navigation effects executed by the root store");
}
