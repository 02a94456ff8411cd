//! ParaStor REST quota backend.
//!
//! Talks to the vendor quota API over HTTP. Every response carries an
//! application-level envelope `{err_no, err_msg, result}`; `err_no == 200`
//! is the only success signal and is independent of the HTTP status, which
//! the REST client has already checked.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use quota_proto::plugin_capability::{IdType, QuotaType, RpcType};
use quota_proto::quota_target::Scope;
use quota_proto::{
    ClearQuotaRequest, ClearQuotaResponse, GetPluginCapabilitiesRequest,
    GetPluginCapabilitiesResponse, GetQuotaRequest, GetQuotaResponse, ListQuotasRequest,
    ListQuotasResponse, PluginCapability, PluginInfoRequest, PluginInfoResponse, QuotaEntry,
    QuotaTarget, SetQuotaRequest, SetQuotaResponse, ValidateQuotaResponse,
};

use crate::rest::{RestClient, RestRequest};
use crate::session::{SessionManager, SessionProbe};
use crate::storage::{BackendConfig, BackendFuture, QuotaBackend, StorageError};

const LOGIN_URL: &str = "/restLogin";
const NODE_TOTAL_URL: &str = "/node/total";
const QUOTA_ADD_URL: &str = "/quota/add";
const QUOTA_INFO_URL: &str = "/quota/info";
const QUOTA_LIST_URL: &str = "/quota/list";
const QUOTA_DELETE_URL: &str = "/quota/delete";

/// Application-level success code in the response envelope.
const ERR_NO_OK: i64 = 200;

const TOKEN_HEADER: &str = "token";
const PLUGIN_NAME: &str = "parastor";
const VENDOR_VERSION: &str = "v1";

// ParaStor only does directory quotas with a hard limit.
const QUOTA_TYPE_DIR: &str = "DIR QUOTA";
const CAL_TYPE_LIMIT: &str = "QUOTA_LIMIT";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    err_msg: String,
    err_no: i64,
    #[serde(default)]
    result: Option<T>,
}

impl<T> Envelope<T> {
    /// Application-level success check; on failure the backend's own
    /// message is surfaced verbatim.
    fn check(self) -> Result<Option<T>, StorageError> {
        if self.err_no != ERR_NO_OK {
            return Err(StorageError::BackendRejected(self.err_msg));
        }
        Ok(self.result)
    }
}

#[derive(Debug, Default, Deserialize)]
struct NodeTotalResult {
    #[serde(default)]
    node_total: i64,
}

#[derive(Debug, Default, Deserialize)]
struct QuotaListResult {
    #[serde(default)]
    quotas: Vec<QuotaRecord>,
}

/// Only the fields this plugin maps; the vendor sends dozens more.
#[derive(Debug, Deserialize)]
struct QuotaRecord {
    #[serde(default)]
    logical_hard_threshold: u64,
    #[serde(default)]
    logical_used_capacity: u64,
    #[serde(default)]
    path: String,
    #[serde(default)]
    state: String,
}

fn quota_operate_body(path: &str) -> serde_json::Value {
    json!({
        "quota_operate_views": [
            { "absolute_path": path, "gid": 0, "uid": 0 }
        ]
    })
}

/// `"<filesystem>:<root><target.id>"`, the only addressing scheme ParaStor
/// supports. Any scope other than PATH is rejected before any network call.
fn compose_path(
    filesystem_name: &str,
    root_path: &str,
    target: Option<&QuotaTarget>,
) -> Result<String, StorageError> {
    let target = target.ok_or(StorageError::UnsupportedScope(Scope::UnknownScope as i32))?;
    if target.scope() != Scope::Path {
        return Err(StorageError::UnsupportedScope(target.scope));
    }
    Ok(format!("{filesystem_name}:{root_path}{}", target.id))
}

/// Normalized `info["status"]` value. ParaStor omits the state once a quota
/// is settled; anything else means the entry is not yet authoritative and
/// the caller should poll again.
fn quota_status(state: &str) -> String {
    if state.is_empty() || state.eq_ignore_ascii_case("ok") {
        "ok".to_string()
    } else {
        state.to_ascii_lowercase()
    }
}

/// Fixed capability descriptor for this adapter: size quotas only, path
/// addressing only, the five core quota RPCs.
pub fn capabilities() -> Vec<PluginCapability> {
    vec![
        PluginCapability::rpc(RpcType::SetQuota),
        PluginCapability::rpc(RpcType::ClearQuota),
        PluginCapability::rpc(RpcType::GetQuota),
        PluginCapability::rpc(RpcType::ListQuota),
        PluginCapability::rpc(RpcType::ValidateQuota),
        PluginCapability::quota(QuotaType::Size),
        PluginCapability::id(IdType::Path),
    ]
}

pub struct ParastorBackend {
    client: RestClient,
    session: Arc<SessionManager>,
    filesystem_name: String,
    root_path: String,
    refresh_cancel: CancellationToken,
}

/// Registry factory.
pub fn new_backend(config: BackendConfig) -> BackendFuture {
    Box::pin(async move {
        let backend = ParastorBackend::connect(config).await?;
        Ok(Arc::new(backend) as Arc<dyn QuotaBackend>)
    })
}

impl ParastorBackend {
    /// Logs in and starts the session refresh task. A failed login is fatal
    /// here; nothing downstream works without a token.
    pub async fn connect(config: BackendConfig) -> Result<Self, StorageError> {
        let base_url = format!("http://{}:{}", config.ip, config.port);
        let client = RestClient::new(&base_url)
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        let token = login(&client, &config.username, &config.password).await?;
        let session = Arc::new(SessionManager::new(token));

        let refresh_cancel = config.shutdown.child_token();
        let probe = Arc::new(NodeCountProbe {
            client: client.clone(),
        });
        session.clone().spawn_refresh(probe, refresh_cancel.clone());

        info!("logged in to parastor quota server at {base_url}");
        Ok(Self {
            client,
            session,
            filesystem_name: config.filesystem_name,
            root_path: config.root_path,
            refresh_cancel,
        })
    }

    fn target_path(&self, target: Option<&QuotaTarget>) -> Result<String, StorageError> {
        compose_path(&self.filesystem_name, &self.root_path, target)
    }
}

impl Drop for ParastorBackend {
    fn drop(&mut self) {
        self.refresh_cancel.cancel();
    }
}

async fn login(
    client: &RestClient,
    username: &str,
    password: &str,
) -> Result<String, StorageError> {
    let request = RestRequest::new(Method::POST, LOGIN_URL)
        .query("username", username)
        .query("password", password)
        .query("clientType", "REST");
    let response = client.execute::<Envelope<serde_json::Value>>(request).await?;

    if response.body.err_no != ERR_NO_OK {
        return Err(StorageError::Auth(response.body.err_msg));
    }
    let token = response
        .headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if token.is_empty() {
        return Err(StorageError::Auth("token is empty".to_string()));
    }
    Ok(token.to_string())
}

/// Node counting is nearly free for ParaStor to answer, which makes it the
/// session liveness probe.
struct NodeCountProbe {
    client: RestClient,
}

#[async_trait]
impl SessionProbe for NodeCountProbe {
    async fn probe(&self, token: &str) -> Result<(), StorageError> {
        let request = RestRequest::new(Method::GET, NODE_TOTAL_URL).header(TOKEN_HEADER, token);
        let response = self
            .client
            .execute::<Envelope<NodeTotalResult>>(request)
            .await?;
        match response.body.check()? {
            Some(result) if result.node_total > 0 => Ok(()),
            _ => Err(StorageError::Inconsistency(
                "node total missing from probe response".to_string(),
            )),
        }
    }
}

#[async_trait]
impl QuotaBackend for ParastorBackend {
    async fn get_plugin_info(
        &self,
        _request: PluginInfoRequest,
    ) -> Result<PluginInfoResponse, StorageError> {
        Ok(PluginInfoResponse {
            name: PLUGIN_NAME.to_string(),
            vendor_version: VENDOR_VERSION.to_string(),
        })
    }

    async fn get_plugin_capabilities(
        &self,
        _request: GetPluginCapabilitiesRequest,
    ) -> Result<GetPluginCapabilitiesResponse, StorageError> {
        Ok(GetPluginCapabilitiesResponse {
            capabilities: capabilities(),
        })
    }

    async fn set_quota(&self, request: SetQuotaRequest) -> Result<SetQuotaResponse, StorageError> {
        let path = self.target_path(request.target.as_ref())?;
        let token = self.session.token().await;

        let rest = RestRequest::new(Method::POST, QUOTA_ADD_URL)
            .header(TOKEN_HEADER, token)
            .query("path", path)
            .query("quota_type", QUOTA_TYPE_DIR)
            .query("logical_quota_cal_type", CAL_TYPE_LIMIT)
            .query("logical_hard_threshold", request.size_bytes.to_string());
        let response = self.client.execute::<Envelope<serde_json::Value>>(rest).await?;
        response.body.check()?;

        Ok(SetQuotaResponse::default())
    }

    async fn get_quota(&self, request: GetQuotaRequest) -> Result<GetQuotaResponse, StorageError> {
        let path = self.target_path(request.target.as_ref())?;
        let token = self.session.token().await;

        let rest = RestRequest::new(Method::POST, QUOTA_INFO_URL)
            .header(TOKEN_HEADER, token)
            .json(quota_operate_body(&path));
        let response = self.client.execute::<Envelope<QuotaListResult>>(rest).await?;
        let result = response.body.check()?.unwrap_or_default();

        let record = result
            .quotas
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::NotFound(path.clone()))?;
        if record.path.is_empty() || record.path != path {
            return Err(StorageError::Inconsistency(format!(
                "got quota for path {} while asking about {path}",
                record.path
            )));
        }

        let mut entry_info = HashMap::new();
        entry_info.insert("status".to_string(), quota_status(&record.state));

        Ok(GetQuotaResponse {
            entry: Some(QuotaEntry {
                target: Some(QuotaTarget {
                    scope: Scope::Path as i32,
                    id: path,
                }),
                size_bytes: record.logical_hard_threshold,
                used_bytes: record.logical_used_capacity,
                size_quota_enabled: record.logical_hard_threshold > 0,
                // ParaStor directory quotas do not cover inodes.
                inode_quota_enabled: false,
                inode_limit: 0,
                inode_used: 0,
                info: entry_info,
            }),
        })
    }

    async fn clear_quota(
        &self,
        request: ClearQuotaRequest,
    ) -> Result<ClearQuotaResponse, StorageError> {
        let path = self.target_path(request.target.as_ref())?;
        let token = self.session.token().await;

        let rest = RestRequest::new(Method::DELETE, QUOTA_DELETE_URL)
            .header(TOKEN_HEADER, token)
            .json(quota_operate_body(&path));
        let response = self.client.execute::<Envelope<serde_json::Value>>(rest).await?;
        response.body.check()?;

        Ok(ClearQuotaResponse::default())
    }

    async fn list_quotas(
        &self,
        request: ListQuotasRequest,
    ) -> Result<ListQuotasResponse, StorageError> {
        let path = self.target_path(request.target.as_ref())?;
        let token = self.session.token().await;

        let rest = RestRequest::new(Method::POST, QUOTA_LIST_URL).header(TOKEN_HEADER, token);
        let response = self.client.execute::<Envelope<QuotaListResult>>(rest).await?;
        let result = response.body.check()?.unwrap_or_default();

        let record = result
            .quotas
            .first()
            .ok_or_else(|| StorageError::NotFound(path.clone()))?;
        if record.path.is_empty() || record.path != path {
            return Err(StorageError::Inconsistency(format!(
                "got quota for path {} while asking about {path}",
                record.path
            )));
        }

        // Pagination and filtering are not wired up against this endpoint
        // yet; the listing call above only sanity-checks reachability.
        Ok(ListQuotasResponse {
            entries: Vec::new(),
            continue_token: String::new(),
        })
    }

    async fn validate_quota_request(
        &self,
        _request: SetQuotaRequest,
    ) -> Result<ValidateQuotaResponse, StorageError> {
        Err(StorageError::NotImplemented)
    }
}
