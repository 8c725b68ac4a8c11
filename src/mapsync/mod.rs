//! Topology map synchronizer
//!
//! Rebuilds the map for a group after a lifecycle mutation commits. One
//! element per host, laid out on a fixed wrapping grid. Elements are only
//! ever added; hosts that left the group keep their stale element (known
//! limitation, kept intentionally). Runs as a detached task, so every
//! failure ends here in the log and never reaches the original request.

use crate::zabbix::client::{ElementUrl, Host, HostRef, MapElement, MapParams};
use crate::zabbix::{ZabbixClient, ZabbixError};

pub const MAP_WIDTH: i32 = 680;
pub const MAP_HEIGHT: i32 = 200;
pub const CELL_WIDTH: i32 = 100;
pub const CELL_HEIGHT: i32 = 50;
pub const ROW_CAPACITY: i32 = 6;

const HOST_ICON: &str = "Phone_(24)";
const DUMMY_ICON: &str = "Dummy";
const ELEMENT_LABEL: &str = "{HOST.NAME} {HOST.CONN}";

/// Grid slot of the element at `index` within the ordered host list.
pub fn element_position(index: usize) -> (i32, i32) {
    let i = index as i32;
    ((i * CELL_WIDTH) % MAP_WIDTH, i / ROW_CAPACITY * CELL_HEIGHT)
}

pub async fn sync_map(zabbix: &ZabbixClient, group_name: &str, hosts: &[Host], map_name: &str) {
    if let Err(e) = run(zabbix, hosts, map_name).await {
        tracing::warn!("Map sync for group '{}' failed: {}", group_name, e);
    }
}

async fn run(zabbix: &ZabbixClient, hosts: &[Host], map_name: &str) -> Result<(), ZabbixError> {
    let maps = zabbix.maps_by_name(map_name).await?;
    let map_id = match maps.first() {
        Some(map) => {
            tracing::info!("Updating existing map '{}'", map_name);
            map.sysmapid.clone()
        }
        None => {
            let map_id = zabbix.map_create(&default_map_params(map_name)).await?;
            tracing::info!("Created new map '{}'", map_name);
            // Zabbix only treats some map attributes as valid once the map
            // has at least one element, hence the sentinel.
            let dummy = dummy_element(zabbix).await?;
            zabbix.map_update_elements(&map_id, &[dummy]).await?;
            map_id
        }
    };

    let icon_id = zabbix
        .images_by_name(HOST_ICON)
        .await?
        .into_iter()
        .next()
        .map(|img| img.imageid);

    let elements: Vec<MapElement> = hosts
        .iter()
        .enumerate()
        .map(|(i, host)| host_element(i, host, icon_id.clone()))
        .collect();

    if !elements.is_empty() {
        zabbix.map_update_elements(&map_id, &elements).await?;
        tracing::info!("Added {} elements to map '{}'", elements.len(), map_name);
    }

    Ok(())
}

fn default_map_params(name: &str) -> MapParams {
    MapParams {
        name: name.to_string(),
        width: MAP_WIDTH,
        height: MAP_HEIGHT,
        label_type: 0,
        label_location: 0,
        highlight: 1,
        expandproblem: 1,
        markelements: 1,
        show_unack: 0,
        severity_min: 0,
        show_suppressed: 0,
        grid_size: 100,
        grid_show: 1,
        grid_align: 0,
        label_format: 0,
        label_type_host: 2,
        label_type_hostgroup: 2,
        label_type_trigger: 2,
        label_type_map: 2,
        label_type_image: 2,
        expand_macros: 1,
    }
}

async fn dummy_element(zabbix: &ZabbixClient) -> Result<MapElement, ZabbixError> {
    let icon = zabbix
        .images_by_name(DUMMY_ICON)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ZabbixError::ResourceMissing(format!("image \"{}\"", DUMMY_ICON)))?;

    Ok(MapElement {
        elementtype: 4,
        elementid: "0".to_string(),
        label: "Dummy Element".to_string(),
        label_location: None,
        x: 0,
        y: 0,
        elementsubtype: 0,
        areatype: 0,
        width: 100,
        height: 100,
        viewtype: None,
        use_iconmap: None,
        iconid_off: Some(icon.imageid),
        urls: None,
        elements: None,
    })
}

fn host_element(index: usize, host: &Host, icon_id: Option<String>) -> MapElement {
    let (x, y) = element_position(index);
    MapElement {
        elementtype: 0,
        elementid: host.hostid.clone(),
        label: ELEMENT_LABEL.to_string(),
        label_location: Some(-1),
        x,
        y,
        elementsubtype: 0,
        areatype: 0,
        width: 200,
        height: 200,
        viewtype: Some(0),
        use_iconmap: Some(0),
        iconid_off: icon_id,
        urls: Some(vec![ElementUrl {
            name: host.host.clone(),
            url: format!("https://{}", host.host),
        }]),
        elements: Some(vec![HostRef {
            hostid: host.hostid.clone(),
        }]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zabbix::fake;
    use std::sync::Arc;

    #[test]
    fn grid_positions_wrap_at_row_capacity() {
        assert_eq!(element_position(0), (0, 0));
        assert_eq!(element_position(5), (500, 0));
        assert_eq!(element_position(6), (600, 50));
        assert_eq!(element_position(11), (420, 50));
        assert_eq!(element_position(12), (520, 100));
    }

    #[test]
    fn host_element_links_to_host_dns() {
        let host = Host {
            hostid: "101".to_string(),
            host: "phone-1.lab.local".to_string(),
        };
        let element = host_element(3, &host, Some("42".to_string()));
        assert_eq!(element.elementtype, 0);
        assert_eq!(element.label, "{HOST.NAME} {HOST.CONN}");
        assert_eq!((element.x, element.y), (300, 0));
        let urls = element.urls.unwrap();
        assert_eq!(urls[0].name, "phone-1.lab.local");
        assert_eq!(urls[0].url, "https://phone-1.lab.local");
        assert_eq!(element.elements.unwrap()[0].hostid, "101");
    }

    #[test]
    fn host_element_tolerates_missing_icon() {
        let host = Host {
            hostid: "101".to_string(),
            host: "phone-1.lab.local".to_string(),
        };
        let element = host_element(0, &host, None);
        assert!(element.iconid_off.is_none());
    }

    #[test]
    fn default_map_uses_fixed_canvas() {
        let params = default_map_params("lobby-map");
        assert_eq!(params.width, 680);
        assert_eq!(params.height, 200);
        assert_eq!(params.expand_macros, 1);
    }

    #[tokio::test]
    async fn sync_creates_map_once_and_seeds_dummy_element() {
        let (url, stub) = fake::spawn().await;
        let zabbix = Arc::new(ZabbixClient::new(&url));
        zabbix.login("admin", "secret").await.unwrap();

        let hosts = vec![
            Host {
                hostid: "1".to_string(),
                host: "phone-1.lab.local".to_string(),
            },
            Host {
                hostid: "2".to_string(),
                host: "phone-2.lab.local".to_string(),
            },
        ];

        sync_map(&zabbix, "lobby", &hosts, "lobby-map").await;
        sync_map(&zabbix, "lobby", &hosts, "lobby-map").await;

        // Second sync reuses the map created by the first.
        assert_eq!(*stub.map_creates.lock().unwrap(), 1);
        assert_eq!(stub.maps.lock().unwrap().len(), 1);

        let batches = stub.element_batches.lock().unwrap();
        // dummy seed + one host batch per sync
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 1);
        assert_eq!(batches[0][0]["elementtype"], 4);
        assert_eq!(batches[1].len(), 2);
        assert_eq!(batches[1][1]["x"], 100);
        assert_eq!(batches[1][1]["urls"][0]["url"], "https://phone-2.lab.local");
    }

    #[tokio::test]
    async fn sync_with_no_hosts_skips_element_push() {
        let (url, stub) = fake::spawn().await;
        let zabbix = Arc::new(ZabbixClient::new(&url));
        zabbix.login("admin", "secret").await.unwrap();

        sync_map(&zabbix, "empty", &[], "empty-map").await;

        let batches = stub.element_batches.lock().unwrap();
        // Only the dummy seed was pushed.
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0]["label"], "Dummy Element");
    }
}
