// SPDX-License-Identifier: MIT
//! Pluggable language backends: registry, identity-keyed service cache,
//! and the service interface command handlers talk to.

pub mod cache;
pub mod registry;
pub mod service;
pub mod text;

pub use cache::ServiceCache;
pub use registry::{LanguageFactory, LanguageRegistry, TEXT_LANGUAGE};
pub use service::{
    CompletionItem, Diagnostic, InfoTip, LanguageConfig, LanguageService, Severity, Span,
};
