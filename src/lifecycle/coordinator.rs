//! Device lifecycle coordinator
//!
//! Orchestrates one manage_device request: resolve the group, apply the
//! mutation against Zabbix, mirror it into the ledger, then hand the group's
//! current membership to the map synchronizer as a detached task. Ordering
//! within a request is strict; across requests there is no mutual exclusion
//! per device or group name (accepted last-writer-wins race).

use std::sync::Arc;

use crate::error::AppError;
use crate::ledger::DeviceLedger;
use crate::lifecycle::group;
use crate::mapsync;
use crate::models::{DeviceAction, ManageDeviceRequest, StatusResponse, ValidatedRequest};
use crate::zabbix::client::{GroupRef, HostInterface, HostParams, TemplateRef};
use crate::zabbix::ZabbixClient;

const AGENT_PORT: &str = "10050";

pub struct DeviceCoordinator {
    zabbix: Arc<ZabbixClient>,
    ledger: Arc<DeviceLedger>,
}

impl DeviceCoordinator {
    pub fn new(zabbix: Arc<ZabbixClient>, ledger: Arc<DeviceLedger>) -> Self {
        Self { zabbix, ledger }
    }

    pub async fn manage_device(
        &self,
        request: ManageDeviceRequest,
    ) -> Result<StatusResponse, AppError> {
        let request = request.validate()?;

        let group_id = group::resolve_or_create(&self.zabbix, &request.group)
            .await
            .map_err(|e| {
                tracing::error!("Group resolution for '{}' failed: {}", request.group, e);
                AppError::BadRequest("Failed to get or create group".to_string())
            })?;

        match request.action {
            DeviceAction::Create => self.create_device(&request, &group_id).await?,
            DeviceAction::Update => self.update_device(&request, &group_id).await?,
            DeviceAction::Delete => self.delete_device(&request).await?,
        }

        self.spawn_map_sync(&request, &group_id);

        Ok(StatusResponse::success(format!(
            "Device {} completed successfully",
            request.action
        )))
    }

    async fn create_device(
        &self,
        request: &ValidatedRequest,
        group_id: &str,
    ) -> Result<(), AppError> {
        let existing = self.zabbix.hosts_by_name(&request.name).await?;
        if !existing.is_empty() {
            return Err(AppError::Conflict(format!(
                "Host \"{}\" already exists",
                request.name
            )));
        }

        let params = self.build_host_params(request, group_id).await?;
        let host_id = self.zabbix.host_create(&params).await?;
        tracing::info!("Created host '{}' with id {}", request.name, host_id);

        if let Err(e) = self
            .ledger
            .record_create(
                &request.name,
                request.dns.as_deref().unwrap_or_default(),
                &request.group,
            )
            .await
        {
            tracing::warn!("Ledger write for created host '{}' failed: {}", request.name, e);
        }
        Ok(())
    }

    async fn update_device(
        &self,
        request: &ValidatedRequest,
        group_id: &str,
    ) -> Result<(), AppError> {
        let hosts = self.zabbix.hosts_by_name(&request.name).await?;
        let host = hosts.first().ok_or_else(|| {
            AppError::NotFound(format!("Host \"{}\" not found for update", request.name))
        })?;

        let params = self.build_host_params(request, group_id).await?;
        self.zabbix.host_update(&host.hostid, &params).await?;
        tracing::info!("Updated host '{}' with id {}", request.name, host.hostid);

        if let Err(e) = self
            .ledger
            .record_update(
                &request.name,
                request.dns.as_deref().unwrap_or_default(),
                &request.group,
            )
            .await
        {
            tracing::warn!("Ledger write for updated host '{}' failed: {}", request.name, e);
        }
        Ok(())
    }

    async fn delete_device(&self, request: &ValidatedRequest) -> Result<(), AppError> {
        let hosts = self.zabbix.hosts_by_name(&request.name).await?;
        let host = hosts
            .first()
            .ok_or_else(|| AppError::NotFound("Host not found for deletion".to_string()))?;

        self.zabbix.host_delete(&host.hostid).await.map_err(|e| {
            AppError::Internal(format!("Failed to delete host '{}': {}", request.name, e))
        })?;
        tracing::info!("Deleted host '{}' with id {}", request.name, host.hostid);

        if let Err(e) = self.ledger.record_delete(&request.name).await {
            tracing::warn!("Ledger delete for host '{}' failed: {}", request.name, e);
        }
        Ok(())
    }

    /// Builds the host descriptor shared by create and update: a single
    /// passive-agent interface addressed by DNS, verbatim inventory, the
    /// resolved group, enabled status. A supplied template name must resolve;
    /// create links it, update goes through the platform's clear-and-reassign
    /// field so the old binding is replaced rather than merged.
    async fn build_host_params(
        &self,
        request: &ValidatedRequest,
        group_id: &str,
    ) -> Result<HostParams, AppError> {
        let mut params = HostParams {
            host: request.name.clone(),
            interfaces: vec![HostInterface {
                interface_type: 1,
                main: 1,
                useip: 0,
                ip: String::new(),
                dns: request.dns.clone().unwrap_or_default(),
                port: AGENT_PORT.to_string(),
            }],
            groups: vec![GroupRef {
                groupid: group_id.to_string(),
            }],
            inventory_mode: 1,
            inventory: request.inventory.clone(),
            status: 0,
            templates: None,
            templates_clear: None,
        };

        if let Some(template_name) = request.template.as_deref() {
            let templates = self.zabbix.templates_by_name(template_name).await?;
            let template = templates.first().ok_or_else(|| {
                AppError::BadRequest(format!("Template \"{}\" not found", template_name))
            })?;
            let template_ref = TemplateRef {
                templateid: template.templateid.clone(),
            };
            match request.action {
                DeviceAction::Create => params.templates = Some(vec![template_ref]),
                _ => params.templates_clear = Some(vec![template_ref]),
            }
        }

        Ok(params)
    }

    /// Fire-and-forget: the request returns before the map sync runs, and
    /// sync failures only ever reach the log.
    fn spawn_map_sync(&self, request: &ValidatedRequest, group_id: &str) {
        let zabbix = self.zabbix.clone();
        let group_id = group_id.to_string();
        let group_name = request.group.clone();
        let map_name = request.map_name.clone();

        tokio::spawn(async move {
            let hosts = match zabbix.hosts_in_group(&group_id).await {
                Ok(hosts) => hosts,
                Err(e) => {
                    tracing::warn!(
                        "Fetching hosts of group '{}' for map sync failed: {}",
                        group_name,
                        e
                    );
                    return;
                }
            };
            mapsync::sync_map(&zabbix, &group_name, &hosts, &map_name).await;
        });
    }
}
