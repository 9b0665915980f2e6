//! Provider routing: capability table, credentials, and the fallback policy

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Optional capability tag on a model route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Image-understanding models
    Vision,
}

/// A static upstream provider entry
///
/// The table is fixed at compile time and not user-mutable at runtime.
#[derive(Debug)]
pub struct ProviderDescriptor {
    /// Provider name for logs and error messages
    pub name: &'static str,
    /// Chat completions endpoint
    pub endpoint: &'static str,
    /// Environment variable holding the API key
    pub credential_env: &'static str,
    /// Provider-required identification headers sent on every request
    pub extra_headers: &'static [(&'static str, &'static str)],
}

/// Primary provider: NVIDIA's hosted endpoint for the default model
pub static NVIDIA: ProviderDescriptor = ProviderDescriptor {
    name: "nvidia",
    endpoint: "https://integrate.api.nvidia.com/v1/chat/completions",
    credential_env: "NVIDIA_API_KEY",
    extra_headers: &[],
};

/// Secondary provider: OpenRouter, which serves arbitrary model names
pub static OPENROUTER: ProviderDescriptor = ProviderDescriptor {
    name: "openrouter",
    endpoint: "https://openrouter.ai/api/v1/chat/completions",
    credential_env: "OPENROUTER_API_KEY",
    extra_headers: &[
        ("HTTP-Referer", "http://localhost:5173"),
        ("X-Title", "Noddy AI"),
    ],
};

/// A model-name-to-provider route, optionally capability-tagged
struct ModelRoute {
    model: &'static str,
    capability: Option<Capability>,
    provider: &'static ProviderDescriptor,
}

static ROUTES: &[ModelRoute] = &[
    ModelRoute {
        model: "meta/llama-3.1-405b-instruct",
        capability: None,
        provider: &NVIDIA,
    },
    ModelRoute {
        model: "meta/llama-3.2-90b-vision-instruct",
        capability: Some(Capability::Vision),
        provider: &NVIDIA,
    },
];

/// Credential source, resolved lazily at first use
///
/// Absence of a key is surfaced when a request first needs it, not at
/// startup.
pub enum CredentialStore {
    /// Read from process environment
    Env,
    /// Fixed map, for tests
    Fixed(HashMap<String, String>),
}

impl CredentialStore {
    /// Store backed by the process environment
    pub fn from_env() -> Self {
        Self::Env
    }

    /// Store backed by a fixed map
    pub fn with_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Fixed(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Look up a credential by env var name
    pub fn get(&self, key: &str) -> Option<String> {
        match self {
            Self::Env => std::env::var(key).ok().filter(|v| !v.is_empty()),
            Self::Fixed(map) => map.get(key).cloned(),
        }
    }
}

/// A resolved provider plus the warnings the resolution produced
#[derive(Debug)]
pub struct ResolvedProvider {
    pub provider: &'static ProviderDescriptor,
    pub api_key: String,
    /// Fallback notes to surface in the turn trace
    pub warnings: Vec<String>,
}

/// Provider table with the resolution policy
///
/// Policy, in priority order:
/// 1. capability-tagged route with its credential present;
/// 2. the primary provider's model with its credential present;
/// 3. the primary provider's model with the credential absent: fall back to
///    the secondary provider and surface a warning (intentional silent
///    fallback, observable in the trace);
/// 4. any other model name: the secondary provider;
/// 5. if the resolved provider's credential is absent, fail with a
///    configuration error.
pub struct ProviderTable {
    credentials: CredentialStore,
}

impl ProviderTable {
    /// Build the table over a credential store
    pub fn new(credentials: CredentialStore) -> Self {
        Self { credentials }
    }

    fn primary_model() -> &'static str {
        // The primary's untagged route is the designated default model
        ROUTES
            .iter()
            .find(|r| std::ptr::eq(r.provider, &NVIDIA) && r.capability.is_none())
            .map(|r| r.model)
            .unwrap_or("meta/llama-3.1-405b-instruct")
    }

    /// Resolve a requested model identifier to a provider and credential
    pub fn resolve(&self, model: &str) -> Result<ResolvedProvider> {
        let mut warnings = Vec::new();

        let chosen: &'static ProviderDescriptor = if let Some(route) = ROUTES
            .iter()
            .find(|r| r.model == model && r.capability.is_some())
        {
            if self.credentials.get(route.provider.credential_env).is_some() {
                route.provider
            } else {
                warnings.push(format!(
                    "capability provider '{}' has no credential ({}), routing '{}' to '{}'",
                    route.provider.name, route.provider.credential_env, model, OPENROUTER.name
                ));
                &OPENROUTER
            }
        } else if model == Self::primary_model() {
            if self.credentials.get(NVIDIA.credential_env).is_some() {
                &NVIDIA
            } else {
                warnings.push(format!(
                    "primary provider '{}' has no credential ({}), falling back to '{}'",
                    NVIDIA.name, NVIDIA.credential_env, OPENROUTER.name
                ));
                &OPENROUTER
            }
        } else {
            &OPENROUTER
        };

        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        let api_key = self.credentials.get(chosen.credential_env).ok_or_else(|| {
            Error::config(format!(
                "provider '{}' requires {} but it is not set",
                chosen.name, chosen.credential_env
            ))
        })?;

        Ok(ResolvedProvider {
            provider: chosen,
            api_key,
            warnings,
        })
    }
}
