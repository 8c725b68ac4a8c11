//! Zabbix JSON-RPC client
//!
//! Thin typed wrapper over the `api_jsonrpc.php` endpoint. Covers the
//! resources the gateway touches: host groups, hosts, templates, images,
//! and topology maps. Failures are surfaced immediately; no retries.

use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum ZabbixError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error {code}: {message} {data}")]
    Api {
        code: i64,
        message: String,
        data: String,
    },

    #[error("not logged in")]
    NotLoggedIn,

    #[error("encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("resource not found: {0}")]
    ResourceMissing(String),
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct GroupIds {
    groupids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct HostIds {
    hostids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MapIds {
    sysmapids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Host {
    pub hostid: String,
    pub host: String,
}

#[derive(Debug, Deserialize)]
pub struct HostGroup {
    pub groupid: String,
}

#[derive(Debug, Deserialize)]
pub struct Template {
    pub templateid: String,
}

#[derive(Debug, Deserialize)]
pub struct Image {
    pub imageid: String,
}

#[derive(Debug, Deserialize)]
pub struct SysMap {
    pub sysmapid: String,
}

#[derive(Debug, Serialize)]
pub struct HostInterface {
    #[serde(rename = "type")]
    pub interface_type: i32,
    pub main: i32,
    pub useip: i32,
    pub ip: String,
    pub dns: String,
    pub port: String,
}

#[derive(Debug, Serialize)]
pub struct GroupRef {
    pub groupid: String,
}

#[derive(Debug, Serialize)]
pub struct TemplateRef {
    pub templateid: String,
}

/// Host descriptor shared by host.create and host.update.
#[derive(Debug, Serialize)]
pub struct HostParams {
    pub host: String,
    pub interfaces: Vec<HostInterface>,
    pub groups: Vec<GroupRef>,
    pub inventory_mode: i32,
    pub inventory: Map<String, Value>,
    pub status: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<Vec<TemplateRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates_clear: Option<Vec<TemplateRef>>,
}

#[derive(Debug, Serialize)]
pub struct MapParams {
    pub name: String,
    pub width: i32,
    pub height: i32,
    pub label_type: i32,
    pub label_location: i32,
    pub highlight: i32,
    pub expandproblem: i32,
    pub markelements: i32,
    pub show_unack: i32,
    pub severity_min: i32,
    pub show_suppressed: i32,
    pub grid_size: i32,
    pub grid_show: i32,
    pub grid_align: i32,
    pub label_format: i32,
    pub label_type_host: i32,
    pub label_type_hostgroup: i32,
    pub label_type_trigger: i32,
    pub label_type_map: i32,
    pub label_type_image: i32,
    pub expand_macros: i32,
}

#[derive(Debug, Serialize)]
pub struct ElementUrl {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct HostRef {
    pub hostid: String,
}

#[derive(Debug, Serialize)]
pub struct MapElement {
    pub elementtype: i32,
    pub elementid: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_location: Option<i32>,
    pub x: i32,
    pub y: i32,
    pub elementsubtype: i32,
    pub areatype: i32,
    pub width: i32,
    pub height: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewtype: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_iconmap: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iconid_off: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<ElementUrl>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<HostRef>>,
}

pub struct ZabbixClient {
    endpoint: String,
    http: Client,
    auth: RwLock<Option<String>>,
    next_id: AtomicU64,
}

impl ZabbixClient {
    pub fn new(base_url: &str) -> Self {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: format!("{}/api_jsonrpc.php", base_url.trim_end_matches('/')),
            http,
            auth: RwLock::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// user.login - acquires the session token reused for the process lifetime.
    pub async fn login(&self, user: &str, password: &str) -> Result<(), ZabbixError> {
        let token: String = self
            .call(
                "user.login",
                json!({ "username": user, "password": password }),
            )
            .await?;
        *self.auth.write().await = Some(token);
        tracing::info!("Logged in to Zabbix API");
        Ok(())
    }

    pub async fn api_version(&self) -> Result<String, ZabbixError> {
        self.call("apiinfo.version", json!([])).await
    }

    pub async fn hostgroups_by_name(&self, name: &str) -> Result<Vec<HostGroup>, ZabbixError> {
        self.call("hostgroup.get", json!({ "filter": { "name": name } }))
            .await
    }

    pub async fn hostgroup_create(&self, name: &str) -> Result<String, ZabbixError> {
        let ids: GroupIds = self.call("hostgroup.create", json!({ "name": name })).await?;
        ids.groupids
            .into_iter()
            .next()
            .ok_or_else(|| ZabbixError::UnexpectedResponse("hostgroup.create returned no id".into()))
    }

    pub async fn hosts_by_name(&self, name: &str) -> Result<Vec<Host>, ZabbixError> {
        self.call("host.get", json!({ "filter": { "host": name } }))
            .await
    }

    pub async fn hosts_in_group(&self, group_id: &str) -> Result<Vec<Host>, ZabbixError> {
        self.call("host.get", json!({ "groupids": [group_id] })).await
    }

    pub async fn host_create(&self, params: &HostParams) -> Result<String, ZabbixError> {
        let ids: HostIds = self.call("host.create", serde_json::to_value(params)?).await?;
        ids.hostids
            .into_iter()
            .next()
            .ok_or_else(|| ZabbixError::UnexpectedResponse("host.create returned no id".into()))
    }

    pub async fn host_update(&self, host_id: &str, params: &HostParams) -> Result<(), ZabbixError> {
        let mut body = serde_json::to_value(params)?;
        body["hostid"] = Value::String(host_id.to_string());
        let _: HostIds = self.call("host.update", body).await?;
        Ok(())
    }

    pub async fn host_delete(&self, host_id: &str) -> Result<(), ZabbixError> {
        let _: HostIds = self.call("host.delete", json!([host_id])).await?;
        Ok(())
    }

    pub async fn templates_by_name(&self, name: &str) -> Result<Vec<Template>, ZabbixError> {
        self.call("template.get", json!({ "filter": { "name": name } }))
            .await
    }

    pub async fn images_by_name(&self, name: &str) -> Result<Vec<Image>, ZabbixError> {
        self.call("image.get", json!({ "filter": { "name": name } }))
            .await
    }

    pub async fn maps_by_name(&self, name: &str) -> Result<Vec<SysMap>, ZabbixError> {
        self.call("map.get", json!({ "filter": { "name": name } }))
            .await
    }

    pub async fn map_create(&self, params: &MapParams) -> Result<String, ZabbixError> {
        let ids: MapIds = self.call("map.create", serde_json::to_value(params)?).await?;
        ids.sysmapids
            .into_iter()
            .next()
            .ok_or_else(|| ZabbixError::UnexpectedResponse("map.create returned no id".into()))
    }

    pub async fn map_update_elements(
        &self,
        map_id: &str,
        elements: &[MapElement],
    ) -> Result<(), ZabbixError> {
        let _: MapIds = self
            .call(
                "map.update",
                json!({ "sysmapid": map_id, "selements": elements }),
            )
            .await?;
        Ok(())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ZabbixError> {
        // user.login and apiinfo.version are the only unauthenticated methods.
        let unauthenticated = method == "user.login" || method == "apiinfo.version";
        let auth = self.auth.read().await.clone();
        if !unauthenticated && auth.is_none() {
            return Err(ZabbixError::NotLoggedIn);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });
        if !unauthenticated {
            if let Some(token) = auth {
                body["auth"] = Value::String(token);
            }
        }

        let resp = self.http.post(&self.endpoint).json(&body).send().await?;
        let rpc: RpcResponse<T> = resp.json().await?;

        if let Some(err) = rpc.error {
            return Err(ZabbixError::Api {
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }

        rpc.result.ok_or_else(|| {
            ZabbixError::UnexpectedResponse(format!("{} returned neither result nor error", method))
        })
    }
}
