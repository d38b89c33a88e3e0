// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery, object creation, and patching.

pub mod crd;
pub mod objects;
pub mod patch;

pub use crd::wait_for_crds;
pub use objects::ensure_object_exists;
pub use patch::two_way_merge_patch;
