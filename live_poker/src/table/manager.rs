//! Table manager for spawning and managing multiple table actors.

use super::{
    actor::{TableActor, TableHandle},
    config::TableConfig,
    messages::TableId,
};
use crate::game::{HandPhase, entities::Chips};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Table metadata for discovery
#[derive(Debug, Clone, Serialize)]
pub struct TableMetadata {
    pub id: TableId,
    pub name: String,
    pub player_count: usize,
    pub max_players: usize,
    pub spectator_count: usize,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub speed: String,
    pub is_running: bool,
    pub phase: HandPhase,
    pub hands_played: u64,
}

/// Table manager for managing multiple table instances
#[derive(Clone, Debug)]
pub struct TableManager {
    /// Active table handles
    tables: Arc<RwLock<HashMap<TableId, TableHandle>>>,

    /// Speed labels, kept for listings
    speeds: Arc<RwLock<HashMap<TableId, String>>>,

    /// Next table ID
    next_table_id: Arc<RwLock<TableId>>,

    /// Upper bound on concurrently open tables
    max_tables: usize,
}

impl TableManager {
    /// Create a new table manager
    pub fn new(max_tables: usize) -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            speeds: Arc::new(RwLock::new(HashMap::new())),
            next_table_id: Arc::new(RwLock::new(1)),
            max_tables,
        }
    }

    /// Create a new table and spawn its actor
    ///
    /// # Arguments
    ///
    /// * `config` - Table configuration
    ///
    /// # Returns
    ///
    /// * `Result<TableId, String>` - Table ID or error
    pub async fn create_table(&self, config: TableConfig) -> Result<TableId, String> {
        // Validate configuration
        config.validate()?;

        let mut tables = self.tables.write().await;
        if tables.len() >= self.max_tables {
            return Err(format!("Table limit of {} reached", self.max_tables));
        }

        // Get next table ID
        let mut next_id = self.next_table_id.write().await;
        let table_id = *next_id;
        *next_id += 1;
        drop(next_id);

        let speed = config.speed.to_string();
        let name = config.name.clone();
        let (actor, handle) = TableActor::new(table_id, config);
        tables.insert(table_id, handle);
        drop(tables);

        self.speeds.write().await.insert(table_id, speed);

        // Spawn actor task
        tokio::spawn(async move {
            actor.run().await;
        });

        log::info!("Created and spawned table {} '{}'", table_id, name);

        Ok(table_id)
    }

    /// Get a table handle
    pub async fn get_table(&self, table_id: TableId) -> Option<TableHandle> {
        let tables = self.tables.read().await;
        tables.get(&table_id).cloned()
    }

    /// Lowest open table id, the table `/websocket` connects to.
    pub async fn default_table(&self) -> Option<TableHandle> {
        let tables = self.tables.read().await;
        tables
            .iter()
            .min_by_key(|(id, _)| **id)
            .map(|(_, handle)| handle.clone())
    }

    /// List all active tables, ordered by id
    pub async fn list_tables(&self) -> Vec<TableMetadata> {
        // Snapshot handles so the lock isn't held across actor round trips.
        let handles: Vec<TableHandle> = self.tables.read().await.values().cloned().collect();
        let speeds = self.speeds.read().await.clone();

        let mut metadata_list = Vec::with_capacity(handles.len());
        for handle in handles {
            let state = match handle.state().await {
                Ok(state) => state,
                Err(e) => {
                    log::warn!("Table {} unavailable: {}", handle.table_id(), e);
                    continue;
                }
            };
            metadata_list.push(TableMetadata {
                id: state.table_id,
                name: state.table_name,
                player_count: state.player_count,
                max_players: state.max_seats,
                spectator_count: state.spectator_count,
                small_blind: state.small_blind,
                big_blind: state.big_blind,
                speed: speeds.get(&state.table_id).cloned().unwrap_or_default(),
                is_running: state.is_running,
                phase: state.phase,
                hands_played: state.hands_played,
            });
        }
        metadata_list.sort_by_key(|metadata| metadata.id);
        metadata_list
    }

    /// Close a table
    ///
    /// # Returns
    ///
    /// * `Result<(), String>` - Success or error
    pub async fn close_table(&self, table_id: TableId) -> Result<(), String> {
        let handle = self
            .tables
            .write()
            .await
            .remove(&table_id)
            .ok_or_else(|| format!("Table {table_id} not found"))?;
        self.speeds.write().await.remove(&table_id);

        // An actor that already stopped counts as closed.
        if let Err(e) = handle.close().await {
            log::debug!("Table {} close: {}", table_id, e);
        }

        log::info!("Closed table {}", table_id);

        Ok(())
    }

    /// Closes every table, e.g. on shutdown.
    pub async fn close_all(&self) {
        let ids: Vec<TableId> = self.tables.read().await.keys().copied().collect();
        for table_id in ids {
            if let Err(e) = self.close_table(table_id).await {
                log::warn!("{}", e);
            }
        }
    }

    pub async fn table_count(&self) -> usize {
        self.tables.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_list_tables() {
        let manager = TableManager::new(4);
        let first = manager
            .create_table(TableConfig {
                name: "first".to_string(),
                ..TableConfig::default()
            })
            .await
            .unwrap();
        let second = manager.create_table(TableConfig::default()).await.unwrap();
        assert_eq!((first, second), (1, 2));

        let tables = manager.list_tables().await;
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "first");
        assert_eq!(tables[0].speed, "normal");
        assert_eq!(tables[0].phase, HandPhase::WaitingForPlayers);
        assert_eq!(
            manager.default_table().await.map(|handle| handle.table_id()),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let manager = TableManager::new(4);
        let config = TableConfig {
            small_blind: 0,
            ..TableConfig::default()
        };
        assert!(manager.create_table(config).await.is_err());
        assert_eq!(manager.table_count().await, 0);
    }

    #[tokio::test]
    async fn test_table_limit() {
        let manager = TableManager::new(1);
        manager.create_table(TableConfig::default()).await.unwrap();
        assert!(manager.create_table(TableConfig::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_close_table() {
        let manager = TableManager::new(2);
        let id = manager.create_table(TableConfig::default()).await.unwrap();
        let handle = manager.get_table(id).await.unwrap();
        manager.close_table(id).await.unwrap();
        assert!(manager.get_table(id).await.is_none());
        assert!(handle.state().await.is_err());
        assert!(manager.close_table(id).await.is_err());
    }
}
