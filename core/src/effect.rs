//! Side effects requested by the composite dispatcher
//!
//! Reducing an action never performs navigation itself. It describes the
//! navigation as an [`Effect`] and the hosting store executes it.

/// A side effect to run after a state change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Navigate the application to `route`
    Navigate {
        /// Target URL path
        route: String,
    },
}

/// Effects produced by one reduction
///
/// At most one navigation per matching dispatch, so this never spills.
pub type Effects = smallvec::SmallVec<[Effect; 1]>;

impl Effect {
    /// Execute the effect against `navigator`
    pub fn execute(&self, navigator: &dyn crate::environment::Navigator) {
        match self {
            Self::Navigate { route } => {
                tracing::debug!(route = %route, "Navigating");
                navigator.navigate_by_url(route);
            },
        }
    }
}
