//! gRPC dispatch layer.
//!
//! `QuotaPluginService` owns one connected backend and translates between the
//! wire surface and the [`QuotaBackend`] trait. Capabilities are fetched once
//! at construction, validated, and answered from the snapshot afterwards, so
//! a capability query never costs a backend round trip.

use std::sync::Arc;

use log::{debug, warn};
use tonic::{Request, Response, Status};

use quota_proto::plugin_capability::{Capability, IdType, QuotaType, RpcType};
use quota_proto::quota_service_server::QuotaService;
use quota_proto::{
    ClearQuotaRequest, ClearQuotaResponse, GetPluginCapabilitiesRequest,
    GetPluginCapabilitiesResponse, GetQuotaRequest, GetQuotaResponse, ListQuotasRequest,
    ListQuotasResponse, PluginCapability, PluginInfoRequest, PluginInfoResponse, SetQuotaRequest,
    SetQuotaResponse, ValidateQuotaResponse,
};

use crate::storage::{QuotaBackend, StorageError};

pub struct QuotaPluginService {
    backend: Arc<dyn QuotaBackend>,
    capabilities: Vec<PluginCapability>,
}

impl std::fmt::Debug for QuotaPluginService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaPluginService")
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl QuotaPluginService {
    /// Snapshots and validates the backend's capability descriptor. A
    /// backend advertising an inconsistent descriptor is refused outright
    /// rather than served with surprises later.
    pub async fn new(backend: Arc<dyn QuotaBackend>) -> Result<Self, StorageError> {
        let response = backend
            .get_plugin_capabilities(GetPluginCapabilitiesRequest::default())
            .await?;
        validate_capabilities(&response.capabilities)?;
        Ok(Self {
            backend,
            capabilities: response.capabilities,
        })
    }

    pub fn capabilities(&self) -> &[PluginCapability] {
        &self.capabilities
    }
}

/// A usable descriptor advertises all five core RPCs, no UNKNOWN values,
/// and exactly one quota kind and one addressing kind.
fn validate_capabilities(capabilities: &[PluginCapability]) -> Result<(), StorageError> {
    let mut rpcs = Vec::new();
    let mut quota_kinds = 0usize;
    let mut id_kinds = 0usize;

    for cap in capabilities {
        match cap.capability {
            Some(Capability::Rpc(raw)) => {
                let rpc = RpcType::try_from(raw).unwrap_or(RpcType::UnknownRpc);
                if rpc == RpcType::UnknownRpc {
                    return Err(StorageError::Inconsistency(format!(
                        "capability descriptor advertises unknown rpc type {raw}"
                    )));
                }
                rpcs.push(rpc);
            }
            Some(Capability::Quota(raw)) => {
                if QuotaType::try_from(raw).unwrap_or(QuotaType::UnknownQuota)
                    == QuotaType::UnknownQuota
                {
                    return Err(StorageError::Inconsistency(format!(
                        "capability descriptor advertises unknown quota type {raw}"
                    )));
                }
                quota_kinds += 1;
            }
            Some(Capability::Id(raw)) => {
                if IdType::try_from(raw).unwrap_or(IdType::UnknownId) == IdType::UnknownId {
                    return Err(StorageError::Inconsistency(format!(
                        "capability descriptor advertises unknown id type {raw}"
                    )));
                }
                id_kinds += 1;
            }
            None => {
                return Err(StorageError::Inconsistency(
                    "capability descriptor contains an empty capability".to_string(),
                ));
            }
        }
    }

    for required in [
        RpcType::SetQuota,
        RpcType::GetQuota,
        RpcType::ClearQuota,
        RpcType::ListQuota,
        RpcType::ValidateQuota,
    ] {
        if !rpcs.contains(&required) {
            return Err(StorageError::Inconsistency(format!(
                "capability descriptor is missing rpc {required:?}"
            )));
        }
    }
    if quota_kinds != 1 {
        return Err(StorageError::Inconsistency(format!(
            "capability descriptor must advertise exactly one quota kind, got {quota_kinds}"
        )));
    }
    if id_kinds != 1 {
        return Err(StorageError::Inconsistency(format!(
            "capability descriptor must advertise exactly one id kind, got {id_kinds}"
        )));
    }
    Ok(())
}

/// Storage failure to gRPC status. The mapping is total so that callers can
/// branch on status codes without parsing messages.
pub fn storage_status(err: StorageError) -> Status {
    match err {
        StorageError::Transport(_) => Status::unavailable(err.to_string()),
        StorageError::Timeout => Status::deadline_exceeded(err.to_string()),
        StorageError::Auth(_) => Status::unauthenticated(err.to_string()),
        StorageError::UnsupportedScope(_) => Status::invalid_argument(err.to_string()),
        StorageError::BackendRejected(_) => Status::failed_precondition(err.to_string()),
        StorageError::NotFound(_) => Status::not_found(err.to_string()),
        StorageError::Inconsistency(_) | StorageError::BackendNotFound(_) => {
            Status::internal(err.to_string())
        }
        StorageError::NotImplemented => Status::unimplemented(err.to_string()),
    }
}

#[async_trait::async_trait]
impl QuotaService for QuotaPluginService {
    async fn get_plugin_info(
        &self,
        request: Request<PluginInfoRequest>,
    ) -> Result<Response<PluginInfoResponse>, Status> {
        let response = self
            .backend
            .get_plugin_info(request.into_inner())
            .await
            .map_err(storage_status)?;
        Ok(Response::new(response))
    }

    async fn get_plugin_capabilities(
        &self,
        _request: Request<GetPluginCapabilitiesRequest>,
    ) -> Result<Response<GetPluginCapabilitiesResponse>, Status> {
        Ok(Response::new(GetPluginCapabilitiesResponse {
            capabilities: self.capabilities.clone(),
        }))
    }

    async fn set_quota(
        &self,
        request: Request<SetQuotaRequest>,
    ) -> Result<Response<SetQuotaResponse>, Status> {
        let request = request.into_inner();
        debug!(
            "set_quota target={:?} size_bytes={}",
            request.target, request.size_bytes
        );
        let response = self.backend.set_quota(request).await.map_err(|err| {
            warn!("set_quota failed: {err}");
            storage_status(err)
        })?;
        Ok(Response::new(response))
    }

    async fn get_quota(
        &self,
        request: Request<GetQuotaRequest>,
    ) -> Result<Response<GetQuotaResponse>, Status> {
        let request = request.into_inner();
        debug!("get_quota target={:?}", request.target);
        let response = self
            .backend
            .get_quota(request)
            .await
            .map_err(storage_status)?;
        Ok(Response::new(response))
    }

    async fn clear_quota(
        &self,
        request: Request<ClearQuotaRequest>,
    ) -> Result<Response<ClearQuotaResponse>, Status> {
        let request = request.into_inner();
        debug!("clear_quota target={:?}", request.target);
        let response = self.backend.clear_quota(request).await.map_err(|err| {
            warn!("clear_quota failed: {err}");
            storage_status(err)
        })?;
        Ok(Response::new(response))
    }

    async fn list_quotas(
        &self,
        request: Request<ListQuotasRequest>,
    ) -> Result<Response<ListQuotasResponse>, Status> {
        let response = self
            .backend
            .list_quotas(request.into_inner())
            .await
            .map_err(storage_status)?;
        Ok(Response::new(response))
    }

    async fn validate_quota_request(
        &self,
        request: Request<SetQuotaRequest>,
    ) -> Result<Response<ValidateQuotaResponse>, Status> {
        let response = self
            .backend
            .validate_quota_request(request.into_inner())
            .await
            .map_err(storage_status)?;
        Ok(Response::new(response))
    }
}
