//! Backend contract, error taxonomy, and the backend registry.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use quota_proto::{
    ClearQuotaRequest, ClearQuotaResponse, GetPluginCapabilitiesRequest,
    GetPluginCapabilitiesResponse, GetQuotaRequest, GetQuotaResponse, ListQuotasRequest,
    ListQuotasResponse, PluginInfoRequest, PluginInfoResponse, SetQuotaRequest, SetQuotaResponse,
    ValidateQuotaResponse,
};

use crate::config::Config;
use crate::rest::RestError;

pub mod parastor;

#[derive(Debug, Error)]
pub enum StorageError {
    /// Connection-level failure talking to the backend. Retry is the
    /// caller's call; nothing here retries a quota operation.
    #[error("backend transport error: {0}")]
    Transport(String),

    #[error("backend call timed out")]
    Timeout,

    /// Login or token failure. Fatal at construction; the process must not
    /// serve traffic without a session.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The caller addressed a target kind this backend does not implement.
    /// Raised before any network call is made.
    #[error("unsupported target scope {0}")]
    UnsupportedScope(i32),

    /// The backend accepted the request but answered an application-level
    /// failure; the message is the backend's own text, passed through.
    #[error("{0}")]
    BackendRejected(String),

    #[error("no quota found for {0}")]
    NotFound(String),

    /// The backend answered something that contradicts what was asked for.
    #[error("inconsistent backend response: {0}")]
    Inconsistency(String),

    #[error("storage backend {0} is not registered")]
    BackendNotFound(String),

    #[error("not implemented")]
    NotImplemented,
}

impl From<RestError> for StorageError {
    fn from(err: RestError) -> Self {
        match err {
            RestError::Timeout => StorageError::Timeout,
            RestError::Decode(e) => {
                StorageError::Inconsistency(format!("undecodable response body: {e}"))
            }
            other => StorageError::Transport(other.to_string()),
        }
    }
}

/// The operations every storage backend must implement. Mirrors the RPC
/// surface one-to-one; the dispatch service adds nothing but error mapping.
#[async_trait]
pub trait QuotaBackend: Send + Sync {
    async fn get_plugin_info(
        &self,
        request: PluginInfoRequest,
    ) -> Result<PluginInfoResponse, StorageError>;

    async fn get_plugin_capabilities(
        &self,
        request: GetPluginCapabilitiesRequest,
    ) -> Result<GetPluginCapabilitiesResponse, StorageError>;

    async fn set_quota(&self, request: SetQuotaRequest) -> Result<SetQuotaResponse, StorageError>;

    async fn get_quota(&self, request: GetQuotaRequest) -> Result<GetQuotaResponse, StorageError>;

    async fn clear_quota(
        &self,
        request: ClearQuotaRequest,
    ) -> Result<ClearQuotaResponse, StorageError>;

    async fn list_quotas(
        &self,
        request: ListQuotasRequest,
    ) -> Result<ListQuotasResponse, StorageError>;

    async fn validate_quota_request(
        &self,
        request: SetQuotaRequest,
    ) -> Result<ValidateQuotaResponse, StorageError>;
}

impl std::fmt::Debug for dyn QuotaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn QuotaBackend")
    }
}

/// Everything a backend factory needs to construct a connection.
#[derive(Clone)]
pub struct BackendConfig {
    pub ip: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub filesystem_name: String,
    pub root_path: String,
    /// Cancelling this stops the backend's background tasks.
    pub shutdown: CancellationToken,
}

impl BackendConfig {
    pub fn from_config(cfg: &Config, shutdown: CancellationToken) -> Self {
        Self {
            ip: cfg.ip.clone(),
            port: cfg.port,
            username: cfg.username.clone(),
            password: cfg.password.clone(),
            filesystem_name: cfg.filesystem_name.clone(),
            root_path: cfg.root_path.clone(),
            shutdown,
        }
    }
}

pub type BackendFuture = Pin<Box<dyn Future<Output = Result<Arc<dyn QuotaBackend>, StorageError>> + Send>>;

/// Constructs a backend instance, performing whatever handshake the backend
/// needs (e.g. initial login). Construction errors propagate unmodified.
pub type BackendFactory = fn(BackendConfig) -> BackendFuture;

/// Name-keyed factory registry. Built once at startup and passed by
/// reference to whoever constructs the active backend; deliberately not a
/// process-wide global.
#[derive(Default)]
pub struct BackendRegistry {
    factories: HashMap<String, BackendFactory>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every production backend registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("parastor", parastor::new_backend);
        registry
    }

    /// Registering the same name twice silently overwrites: last writer
    /// wins. Tests rely on this to shadow a production factory.
    pub fn register(&mut self, name: impl Into<String>, factory: BackendFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub async fn new_backend(
        &self,
        name: &str,
        config: BackendConfig,
    ) -> Result<Arc<dyn QuotaBackend>, StorageError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| StorageError::BackendNotFound(name.to_string()))?;
        factory(config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedStub(&'static str);

    #[async_trait]
    impl QuotaBackend for NamedStub {
        async fn get_plugin_info(
            &self,
            _request: PluginInfoRequest,
        ) -> Result<PluginInfoResponse, StorageError> {
            Ok(PluginInfoResponse {
                name: self.0.to_string(),
                vendor_version: "test".to_string(),
            })
        }

        async fn get_plugin_capabilities(
            &self,
            _request: GetPluginCapabilitiesRequest,
        ) -> Result<GetPluginCapabilitiesResponse, StorageError> {
            Err(StorageError::NotImplemented)
        }

        async fn set_quota(
            &self,
            _request: SetQuotaRequest,
        ) -> Result<SetQuotaResponse, StorageError> {
            Err(StorageError::NotImplemented)
        }

        async fn get_quota(
            &self,
            _request: GetQuotaRequest,
        ) -> Result<GetQuotaResponse, StorageError> {
            Err(StorageError::NotImplemented)
        }

        async fn clear_quota(
            &self,
            _request: ClearQuotaRequest,
        ) -> Result<ClearQuotaResponse, StorageError> {
            Err(StorageError::NotImplemented)
        }

        async fn list_quotas(
            &self,
            _request: ListQuotasRequest,
        ) -> Result<ListQuotasResponse, StorageError> {
            Err(StorageError::NotImplemented)
        }

        async fn validate_quota_request(
            &self,
            _request: SetQuotaRequest,
        ) -> Result<ValidateQuotaResponse, StorageError> {
            Err(StorageError::NotImplemented)
        }
    }

    fn test_config() -> BackendConfig {
        BackendConfig {
            ip: "127.0.0.1".to_string(),
            port: 6666,
            username: "u".to_string(),
            password: "p".to_string(),
            filesystem_name: "fs".to_string(),
            root_path: "/".to_string(),
            shutdown: CancellationToken::new(),
        }
    }

    fn stub_a(_config: BackendConfig) -> BackendFuture {
        Box::pin(async { Ok(Arc::new(NamedStub("a")) as Arc<dyn QuotaBackend>) })
    }

    fn stub_b(_config: BackendConfig) -> BackendFuture {
        Box::pin(async { Ok(Arc::new(NamedStub("b")) as Arc<dyn QuotaBackend>) })
    }

    fn failing_factory(_config: BackendConfig) -> BackendFuture {
        Box::pin(async { Err(StorageError::Auth("login refused".to_string())) })
    }

    #[tokio::test]
    async fn unknown_backend_name_is_an_error() {
        let registry = BackendRegistry::new();
        let err = registry
            .new_backend("missing", test_config())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::BackendNotFound(name) if name == "missing"));
    }

    #[tokio::test]
    async fn registered_factory_constructs_the_backend() {
        let mut registry = BackendRegistry::new();
        registry.register("stub", stub_a);
        let backend = registry.new_backend("stub", test_config()).await.unwrap();
        let info = backend
            .get_plugin_info(PluginInfoRequest::default())
            .await
            .unwrap();
        assert_eq!(info.name, "a");
    }

    #[tokio::test]
    async fn re_registration_overwrites_last_writer_wins() {
        let mut registry = BackendRegistry::new();
        registry.register("stub", stub_a);
        registry.register("stub", stub_b);
        let backend = registry.new_backend("stub", test_config()).await.unwrap();
        let info = backend
            .get_plugin_info(PluginInfoRequest::default())
            .await
            .unwrap();
        assert_eq!(info.name, "b");
    }

    #[tokio::test]
    async fn construction_errors_propagate_unmodified() {
        let mut registry = BackendRegistry::new();
        registry.register("bad", failing_factory);
        let err = registry.new_backend("bad", test_config()).await.unwrap_err();
        assert!(matches!(err, StorageError::Auth(msg) if msg == "login refused"));
    }
}
