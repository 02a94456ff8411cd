//! Wire protocol for the storage quota plugin.
//!
//! Message and service definitions for the `quota.v1.QuotaService` gRPC
//! surface, written directly against prost instead of being generated from a
//! `.proto` file so the crate builds without `protoc`. The field tags below
//! are the wire contract; changing them breaks every deployed caller.

use std::collections::HashMap;

pub mod service;

pub use service::quota_service_server;

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct PluginInfoRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PluginInfoResponse {
    /// Backend-chosen plugin name, e.g. "parastor".
    #[prost(string, tag = "1")]
    pub name: String,

    #[prost(string, tag = "2")]
    pub vendor_version: String,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct GetPluginCapabilitiesRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetPluginCapabilitiesResponse {
    #[prost(message, repeated, tag = "1")]
    pub capabilities: Vec<PluginCapability>,
}

/// One self-reported capability of the plugin: either a supported RPC, a
/// supported quota kind, or a supported addressing kind.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct PluginCapability {
    #[prost(oneof = "plugin_capability::Capability", tags = "1, 2, 3")]
    pub capability: Option<plugin_capability::Capability>,
}

pub mod plugin_capability {
    /// RPCs the plugin is able to serve.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum RpcType {
        UnknownRpc = 0,
        SetQuota = 1,
        GetQuota = 2,
        ClearQuota = 3,
        ListQuota = 4,
        ValidateQuota = 5,
    }

    /// Quota kinds the backend enforces.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum QuotaType {
        UnknownQuota = 0,
        Size = 1,
        Inode = 2,
    }

    /// How quota targets are addressed.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum IdType {
        UnknownId = 0,
        Path = 1,
        Id = 2,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Oneof)]
    pub enum Capability {
        #[prost(enumeration = "RpcType", tag = "1")]
        Rpc(i32),
        #[prost(enumeration = "QuotaType", tag = "2")]
        Quota(i32),
        #[prost(enumeration = "IdType", tag = "3")]
        Id(i32),
    }
}

impl PluginCapability {
    pub fn rpc(rpc: plugin_capability::RpcType) -> Self {
        Self {
            capability: Some(plugin_capability::Capability::Rpc(rpc as i32)),
        }
    }

    pub fn quota(kind: plugin_capability::QuotaType) -> Self {
        Self {
            capability: Some(plugin_capability::Capability::Quota(kind as i32)),
        }
    }

    pub fn id(kind: plugin_capability::IdType) -> Self {
        Self {
            capability: Some(plugin_capability::Capability::Id(kind as i32)),
        }
    }
}

/// The addressable unit a quota applies to.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QuotaTarget {
    #[prost(enumeration = "quota_target::Scope", tag = "1")]
    pub scope: i32,

    /// Backend-specific addressing string; its meaning depends on `scope`.
    #[prost(string, tag = "2")]
    pub id: String,
}

pub mod quota_target {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Scope {
        UnknownScope = 0,
        Path = 1,
        Id = 2,
    }
}

/// Full state of one target's quota configuration and current usage.
///
/// `info` is an out-of-band status channel: when the reserved key `"status"`
/// carries any value other than `"ok"` the numeric fields are not yet
/// authoritative and the caller should poll again.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QuotaEntry {
    #[prost(message, optional, tag = "1")]
    pub target: Option<QuotaTarget>,

    #[prost(uint64, tag = "2")]
    pub size_bytes: u64,

    #[prost(uint64, tag = "3")]
    pub used_bytes: u64,

    #[prost(bool, tag = "4")]
    pub size_quota_enabled: bool,

    #[prost(bool, tag = "5")]
    pub inode_quota_enabled: bool,

    #[prost(uint64, tag = "6")]
    pub inode_limit: u64,

    #[prost(uint64, tag = "7")]
    pub inode_used: u64,

    #[prost(map = "string, string", tag = "8")]
    pub info: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SetQuotaRequest {
    #[prost(message, optional, tag = "1")]
    pub target: Option<QuotaTarget>,

    #[prost(uint64, tag = "2")]
    pub size_bytes: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SetQuotaResponse {
    #[prost(map = "string, string", tag = "1")]
    pub info: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetQuotaRequest {
    #[prost(message, optional, tag = "1")]
    pub target: Option<QuotaTarget>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetQuotaResponse {
    #[prost(message, optional, tag = "1")]
    pub entry: Option<QuotaEntry>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClearQuotaRequest {
    #[prost(message, optional, tag = "1")]
    pub target: Option<QuotaTarget>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ClearQuotaResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListQuotasRequest {
    /// Maximum number of entries per page; 0 means no limit.
    #[prost(uint32, tag = "1")]
    pub limit: u32,

    /// Opaque token from the previous page; empty starts from the beginning.
    #[prost(string, tag = "2")]
    pub continue_token: String,

    /// Optional filter on target/scope.
    #[prost(message, optional, tag = "3")]
    pub target: Option<QuotaTarget>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListQuotasResponse {
    #[prost(message, repeated, tag = "1")]
    pub entries: Vec<QuotaEntry>,

    /// Empty token signals the end of the listing.
    #[prost(string, tag = "2")]
    pub continue_token: String,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ValidateQuotaResponse {}
