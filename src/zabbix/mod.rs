//! Zabbix platform integration

pub mod client;
#[cfg(test)]
pub mod fake;

pub use self::client::{ZabbixClient, ZabbixError};
