// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::fmt::Display;

/// Identifies the protected resource a [`HealthTracker`][crate::HealthTracker] watches.
///
/// Each unique `BreakerKey` represents one failure domain (a backend host, a service
/// endpoint, a dependency). The key travels with every event-sink notification so that
/// external consumers can attribute outcomes to the right resource, and it is the
/// natural lookup key for any tracker registry maintained by the breaker-management
/// layer.
///
/// Keys should be **long-lived and low-cardinality**. Avoid high-cardinality keys like
/// user IDs or request IDs; these prevent detection of systemic failures and cause
/// unbounded growth in whatever registry holds the trackers. Static names borrow, so
/// the common case allocates nothing; names computed at runtime are owned.
///
/// # Examples
///
/// ```
/// use tripwire::BreakerKey;
///
/// let key = BreakerKey::from("payments-api");
/// assert_eq!(key.as_str(), "payments-api");
///
/// let region = "eu-1";
/// let per_region = BreakerKey::from(format!("payments-api/{region}"));
/// assert_eq!(per_region.to_string(), "payments-api/eu-1");
/// ```
///
/// # Telemetry
///
/// The values used to create keys surface in telemetry data. Do not embed sensitive
/// data such as authentication tokens or personally identifiable information.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BreakerKey(Cow<'static, str>);

impl BreakerKey {
    /// The key as a string slice, suitable for registry lookups and telemetry
    /// attributes.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BreakerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&'static str> for BreakerKey {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for BreakerKey {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::fmt::Debug;
    use std::hash::Hash;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(BreakerKey: Send, Sync, Clone, Hash, Display, Debug, PartialEq, Eq);

    #[test]
    fn static_names_borrow_and_computed_names_own() {
        let shard = 3;
        let fixed = BreakerKey::from("inventory-db");
        let computed = BreakerKey::from(format!("inventory-db/{shard}"));

        assert!(matches!(fixed.0, Cow::Borrowed(_)));
        assert!(matches!(computed.0, Cow::Owned(_)));
        assert_eq!(fixed.as_str(), "inventory-db");
        assert_eq!(computed.as_str(), "inventory-db/3");
    }

    #[test]
    fn equality_ignores_ownership() {
        let borrowed = BreakerKey::from("inventory-db");
        let owned = BreakerKey::from(String::from("inventory-db"));

        assert_eq!(borrowed, owned);
    }

    #[test]
    fn display_renders_the_name() {
        let key = BreakerKey::from("inventory-db");
        assert_eq!(key.to_string(), "inventory-db");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trips_as_a_plain_string() {
        let key = BreakerKey::from("inventory-db");

        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"inventory-db\"");

        let back: BreakerKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
