// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Finalizer attached to every configuration so deletions are observed
pub const FINALIZER: &str = "factotum.io/factotum";

/// The operator name used for server-side apply
pub const OPERATOR_NAME: &str = "factotum";

/// API group served by the factotum CRDs
pub const API_GROUP: &str = "factotum.io";

/// API version served by the factotum CRDs
pub const API_VERSION: &str = "v1alpha1";

/// Status condition written after every apply pass
pub mod conditions {
    /// The single condition type tracked on configurations
    pub const APPLIED: &str = "Applied";
    pub const TRUE: &str = "True";
    pub const FALSE: &str = "False";
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
