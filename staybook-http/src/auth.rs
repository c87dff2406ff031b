//! Authentication for booking API requests.
//!
//! An [`AuthProvider`] is asked for headers before every request, so tokens
//! that rotate (short-lived session tokens, signed requests) stay current.

use http::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::error::BookingClientError;

/// Per-endpoint authentication headers.
#[derive(Debug, Clone, Default)]
pub struct AuthHeaders {
    /// Headers to include in pre-book requests.
    pub prebook: HeaderMap,
    /// Headers to include in initialize requests.
    pub initialize: HeaderMap,
    /// Headers to include in finish requests.
    pub finish: HeaderMap,
}

impl AuthHeaders {
    /// Uses the same headers for every endpoint.
    #[must_use]
    pub fn uniform(headers: &HeaderMap) -> Self {
        Self {
            prebook: headers.clone(),
            initialize: headers.clone(),
            finish: headers.clone(),
        }
    }
}

/// Generates authentication headers for booking API requests.
pub trait AuthProvider: Send + Sync {
    /// Returns authentication headers for each endpoint.
    fn get_auth_headers(&self) -> AuthHeaders;
}

/// [`AuthProvider`] that sends a static set of headers to all endpoints.
#[derive(Debug, Clone)]
pub struct StaticAuthProvider {
    headers: HeaderMap,
}

impl StaticAuthProvider {
    /// Creates a provider that sends the same headers to all endpoints.
    #[must_use]
    pub const fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }

    /// Creates a provider from a single bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`BookingClientError::InvalidHeader`] if `token` contains
    /// characters not allowed in a header value.
    pub fn bearer(token: &str) -> Result<Self, BookingClientError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|source| {
            BookingClientError::InvalidHeader {
                context: "Failed to encode bearer token",
                source,
            }
        })?;
        value.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(Self { headers })
    }
}

impl AuthProvider for StaticAuthProvider {
    fn get_auth_headers(&self) -> AuthHeaders {
        AuthHeaders::uniform(&self.headers)
    }
}

/// [`AuthProvider`] backed by a callback invoked before every request.
pub struct CallbackAuthProvider<F> {
    create_headers: F,
}

impl<F> std::fmt::Debug for CallbackAuthProvider<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackAuthProvider")
            .finish_non_exhaustive()
    }
}

impl<F> CallbackAuthProvider<F>
where
    F: Fn() -> AuthHeaders + Send + Sync,
{
    /// Creates a new provider from a callback that returns [`AuthHeaders`].
    pub const fn new(create_headers: F) -> Self {
        Self { create_headers }
    }
}

impl<F> AuthProvider for CallbackAuthProvider<F>
where
    F: Fn() -> AuthHeaders + Send + Sync,
{
    fn get_auth_headers(&self) -> AuthHeaders {
        (self.create_headers)()
    }
}
