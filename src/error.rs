// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FactotumError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to serialize patch: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Finalizer update failed: {0}")]
    FinalizerError(String),

    #[error("Object creation failed: {0}")]
    CreateError(String),

    #[error("Controller processor stopped: {0}")]
    ProcessorStopped(String),
}

pub type Result<T> = std::result::Result<T, FactotumError>;
