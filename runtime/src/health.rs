//! Health reporting for the store and its collaborators.
//!
//! A [`HealthCheck`] describes one component; a [`HealthReport`] folds many
//! checks into a single status where the worst component wins. The store's
//! own check watches its dead letter queue, and callers may mix in checks
//! from other parts of the client (API reachability, session storage).

use chrono::{DateTime, Utc};

/// Severity ladder for component health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HealthStatus {
    /// Operating normally
    Healthy,
    /// Still serving, but something needs attention
    Degraded,
    /// Not serving
    Unhealthy,
}

impl HealthStatus {
    /// True for [`HealthStatus::Healthy`].
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// True for [`HealthStatus::Degraded`].
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        matches!(self, Self::Degraded)
    }

    /// True for [`HealthStatus::Unhealthy`].
    #[must_use]
    pub const fn is_unhealthy(self) -> bool {
        matches!(self, Self::Unhealthy)
    }

    /// Combine two statuses, keeping the more severe one.
    #[must_use]
    pub const fn worst(self, other: Self) -> Self {
        match (self, other) {
            (Self::Unhealthy, _) | (_, Self::Unhealthy) => Self::Unhealthy,
            (Self::Degraded, _) | (_, Self::Degraded) => Self::Degraded,
            _ => Self::Healthy,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        };
        f.write_str(label)
    }
}

/// One component's health, with an optional explanation and free-form
/// key/value details.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Component name, e.g. `"store"`
    pub component: String,
    /// Status for this component
    pub status: HealthStatus,
    /// Human-readable explanation for non-healthy statuses
    pub message: Option<String>,
    /// Supporting details, e.g. queue sizes
    pub metadata: Vec<(String, String)>,
}

impl HealthCheck {
    /// A passing check with no message.
    #[must_use]
    pub fn healthy(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Healthy,
            message: None,
            metadata: Vec::new(),
        }
    }

    /// A degraded check carrying an explanation.
    #[must_use]
    pub fn degraded(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Degraded,
            message: Some(message.into()),
            metadata: Vec::new(),
        }
    }

    /// A failing check carrying an explanation.
    #[must_use]
    pub fn unhealthy(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
            metadata: Vec::new(),
        }
    }

    /// Attach a key/value detail to the check.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }
}

/// A snapshot of several checks folded into one overall status.
#[derive(Debug, Clone)]
pub struct HealthReport {
    /// Worst status across all checks
    pub status: HealthStatus,
    /// The individual checks the report was built from
    pub checks: Vec<HealthCheck>,
    /// When the report was taken
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    /// Fold a set of checks into a report. The overall status is the worst
    /// individual status; an empty set reports healthy.
    #[must_use]
    pub fn new(checks: Vec<HealthCheck>) -> Self {
        let status = checks
            .iter()
            .map(|check| check.status)
            .fold(HealthStatus::Healthy, HealthStatus::worst);

        Self {
            status,
            checks,
            timestamp: Utc::now(),
        }
    }

    /// True when every component passed.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    /// True when the worst component is degraded.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.status.is_degraded()
    }

    /// True when any component is down.
    #[must_use]
    pub const fn is_unhealthy(&self) -> bool {
        self.status.is_unhealthy()
    }
}
