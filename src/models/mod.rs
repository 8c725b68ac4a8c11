//! Data models for zabbix-device-gateway

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAction {
    Create,
    Update,
    Delete,
}

impl DeviceAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(DeviceAction::Create),
            "update" => Some(DeviceAction::Update),
            "delete" => Some(DeviceAction::Delete),
            _ => None,
        }
    }

    /// create and update need a DNS address for the host interface; delete does not.
    pub fn needs_dns(self) -> bool {
        matches!(self, DeviceAction::Create | DeviceAction::Update)
    }
}

impl fmt::Display for DeviceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceAction::Create => write!(f, "create"),
            DeviceAction::Update => write!(f, "update"),
            DeviceAction::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceSpec {
    pub name: Option<String>,
    pub dns: Option<String>,
    #[serde(default)]
    pub inventory: Map<String, Value>,
    pub template: Option<String>,
}

/// Inbound body of POST /manage_device. All fields optional at the wire
/// level; validate() enforces the per-action preconditions.
#[derive(Debug, Default, Deserialize)]
pub struct ManageDeviceRequest {
    pub action: Option<String>,
    pub device: Option<DeviceSpec>,
    pub group: Option<String>,
    pub map_name: Option<String>,
}

#[derive(Debug)]
pub struct ValidatedRequest {
    pub action: DeviceAction,
    pub name: String,
    pub dns: Option<String>,
    pub inventory: Map<String, Value>,
    pub template: Option<String>,
    pub group: String,
    pub map_name: String,
}

impl ManageDeviceRequest {
    pub fn validate(self) -> Result<ValidatedRequest, AppError> {
        let action = self
            .action
            .filter(|a| !a.is_empty())
            .ok_or_else(|| AppError::MissingField("action".to_string()))?;
        let action = DeviceAction::parse(&action)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown action \"{}\"", action)))?;

        let device = self
            .device
            .ok_or_else(|| AppError::MissingField("device".to_string()))?;
        let name = device
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::MissingField("name".to_string()))?;
        let group = self
            .group
            .filter(|g| !g.is_empty())
            .ok_or_else(|| AppError::MissingField("group".to_string()))?;
        let map_name = self
            .map_name
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AppError::MissingField("map_name".to_string()))?;

        let dns = device.dns.filter(|d| !d.is_empty());
        if action.needs_dns() && dns.is_none() {
            return Err(AppError::MissingField("dns".to_string()));
        }

        // An empty template name means "no template", same as leaving it out.
        let template = device.template.filter(|t| !t.is_empty());

        Ok(ValidatedRequest {
            action,
            name,
            dns,
            inventory: device.inventory,
            template,
            group,
            map_name,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}
