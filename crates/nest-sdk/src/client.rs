use std::fs;
use std::sync::Arc;

use nest_auth::{AuthEmulator, AuthLatency};
use nest_query::{QueryBuilder, QueryContext, Relation, RelationRegistry};
use nest_store::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, TableStore};
use nest_types::{tables, User};
use serde_json::json;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{SdkError, SdkResult};
use crate::storage::StorageClient;

/// Id of the seeded demo profile.
pub const DEMO_USER_ID: &str = "user-123-mock";
/// Email of the seeded demo profile.
pub const DEMO_EMAIL: &str = "demo@nest.app";

/// In-process stand-in for the hosted backend client.
///
/// Tables, auth and storage share one [`TableStore`], so a profile created on
/// sign-in is visible to queries right away.
pub struct MockClient {
    config: ClientConfig,
    store: Arc<TableStore>,
    relations: Arc<RelationRegistry>,
    auth: AuthEmulator,
    storage: StorageClient,
}

impl MockClient {
    pub fn new(config: ClientConfig) -> SdkResult<Self> {
        let store = Arc::new(TableStore::new());
        if config.seed_demo_profile {
            let demo = User::authenticated(DEMO_USER_ID, DEMO_EMAIL).to_profile();
            store.write_table(tables::PROFILES, |rows| rows.push(demo))?;
        }

        let snapshots: Arc<dyn KeyValueStore> = match &config.session_dir {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(nest_store::StoreError::from)?;
                Arc::new(FileKeyValueStore::new(dir.clone()))
            }
            None => Arc::new(InMemoryKeyValueStore::new()),
        };
        let auth = AuthEmulator::new(
            Arc::clone(&store),
            snapshots,
            AuthLatency {
                auth: config.auth_latency,
                sign_out: config.sign_out_latency,
            },
        )?;

        let mut relations = RelationRegistry::new();
        relations.register(
            Relation::belongs_to(tables::PROFILES, tables::PROFILES, "user_id")
                .with_placeholder(json!({ "email": "unknown" })),
        );

        info!(
            query_latency_ms = config.query_latency.as_millis() as u64,
            persistent_session = config.session_dir.is_some(),
            "running against mock backend"
        );
        Ok(Self {
            storage: StorageClient::new(config.upload_latency),
            config,
            store,
            relations: Arc::new(relations),
            auth,
        })
    }

    /// Start a query against `table`.
    pub fn from(&self, table: &str) -> QueryBuilder {
        let ctx = QueryContext::new(Arc::clone(&self.store))
            .with_relations(Arc::clone(&self.relations))
            .with_latency(self.config.query_latency);
        QueryBuilder::new(ctx, table)
    }

    /// Add or replace a relation used when queries embed related rows.
    ///
    /// Builders created earlier keep the registry they started with.
    pub fn register_relation(&mut self, relation: Relation) {
        debug!(relation = %relation.name, table = %relation.table, "relation registered");
        Arc::make_mut(&mut self.relations).register(relation);
    }

    pub fn auth(&self) -> &AuthEmulator {
        &self.auth
    }

    pub fn storage(&self) -> &StorageClient {
        &self.storage
    }

    pub fn store(&self) -> &Arc<TableStore> {
        &self.store
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Names of the tables that currently hold rows.
    pub fn tables(&self) -> SdkResult<Vec<String>> {
        self.store.table_names().map_err(SdkError::from)
    }
}
