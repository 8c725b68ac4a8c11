//! Local device ledger
//!
//! A single-table SQLite mirror of the devices this service has managed.
//! Zabbix stays authoritative; these records are a bookkeeping trail written
//! only after the corresponding external mutation succeeded. Connections are
//! opened per call, so concurrent requests never contend on a shared handle.

use std::path::PathBuf;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};

pub struct DeviceLedger {
    path: PathBuf,
}

impl DeviceLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the devices table if absent. Safe to call on every startup.
    pub async fn init(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.connect().await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS devices \
             (id INTEGER PRIMARY KEY, name TEXT, dns TEXT, group_name TEXT)",
        )
        .execute(&mut conn)
        .await?;
        conn.close().await
    }

    pub async fn record_create(
        &self,
        name: &str,
        dns: &str,
        group_name: &str,
    ) -> Result<(), sqlx::Error> {
        let mut conn = self.connect().await?;
        sqlx::query("INSERT INTO devices (name, dns, group_name) VALUES (?, ?, ?)")
            .bind(name)
            .bind(dns)
            .bind(group_name)
            .execute(&mut conn)
            .await?;
        conn.close().await
    }

    pub async fn record_update(
        &self,
        name: &str,
        dns: &str,
        group_name: &str,
    ) -> Result<(), sqlx::Error> {
        let mut conn = self.connect().await?;
        sqlx::query("UPDATE devices SET dns = ?, group_name = ? WHERE name = ?")
            .bind(dns)
            .bind(group_name)
            .bind(name)
            .execute(&mut conn)
            .await?;
        conn.close().await
    }

    pub async fn record_delete(&self, name: &str) -> Result<(), sqlx::Error> {
        let mut conn = self.connect().await?;
        sqlx::query("DELETE FROM devices WHERE name = ?")
            .bind(name)
            .execute(&mut conn)
            .await?;
        conn.close().await
    }

    async fn connect(&self) -> Result<SqliteConnection, sqlx::Error> {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .connect()
            .await
    }
}
