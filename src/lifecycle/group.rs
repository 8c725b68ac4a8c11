//! Idempotent get-or-create of Zabbix host groups

use crate::zabbix::{ZabbixClient, ZabbixError};

/// Resolves a group name to its id, creating the group on first reference.
/// Lookup is an exact name filter; if several groups match, the first wins
/// (Zabbix treats group names as effectively unique for this use).
pub async fn resolve_or_create(zabbix: &ZabbixClient, name: &str) -> Result<String, ZabbixError> {
    let groups = zabbix.hostgroups_by_name(name).await?;
    if let Some(group) = groups.first() {
        tracing::debug!("Group '{}' found with id {}", name, group.groupid);
        return Ok(group.groupid.clone());
    }

    tracing::info!("Group '{}' not found, creating", name);
    let group_id = zabbix.hostgroup_create(name).await?;
    tracing::info!("Group '{}' created with id {}", name, group_id);
    Ok(group_id)
}
