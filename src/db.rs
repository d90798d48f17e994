use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{
    Client, Collection, Database as MongoDatabase,
    bson::{Document, doc, oid::ObjectId},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::analytics::{SearchEvent, SearchEventStore};
use crate::catalog::{CatalogError, CatalogStore};
use crate::config::CONFIG;
use crate::data_models::{LocationRecord, PropertyRecord};
use crate::filter::{PropertyFilter, baseline_sort};

/// Collection names as constants for consistency
pub mod collections {
    pub const PROPERTIES: &str = "properties";
    pub const LOCATIONS: &str = "locations";
    pub const SEARCH_EVENTS: &str = "search_events";
}

/// Main database wrapper providing connection management and collection access
#[derive(Debug, Clone)]
pub struct Database {
    client: Client,
    db: MongoDatabase,
}

impl Database {
    /// Create a new Database instance with custom URI and database name.
    /// Useful for testing with a different database.
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        let client_options = ClientOptions::parse(uri)
            .await
            .context("Failed to parse MongoDB connection string")?;

        let client =
            Client::with_options(client_options).context("Failed to create MongoDB client")?;

        // Ping the database to verify connection
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .context("Failed to connect to MongoDB")?;

        log::info!("Connected to MongoDB database: {}", db_name);

        let db = client.database(db_name);

        Ok(Self { client, db })
    }

    /// Create a Database instance using environment configuration
    pub async fn from_config() -> Result<Self> {
        Self::new(&CONFIG.mongo_uri, &CONFIG.mongo_db_name).await
    }

    /// Get a typed collection by name
    pub fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.db.collection(name)
    }

    /// Get the underlying MongoDB client (for advanced operations)
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn properties(&self) -> Collection<PropertyRecord> {
        self.collection(collections::PROPERTIES)
    }

    pub fn locations(&self) -> Collection<LocationRecord> {
        self.collection(collections::LOCATIONS)
    }

    pub fn search_events(&self) -> Collection<SearchEvent> {
        self.collection(collections::SEARCH_EVENTS)
    }
}

// =============================================================================
// Generic read/write operations
// =============================================================================

pub struct Repository<T>
where
    T: Send + Sync,
{
    collection: Collection<T>,
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    pub fn new(collection: Collection<T>) -> Self {
        Self { collection }
    }

    /// Insert a single document
    pub async fn insert(&self, doc: &T) -> Result<ObjectId> {
        let result = self
            .collection
            .insert_one(doc)
            .await
            .context("Failed to insert document")?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow::anyhow!("Failed to get inserted ObjectId"))
    }

    /// Insert multiple documents
    pub async fn insert_many(&self, docs: &[T]) -> Result<Vec<ObjectId>> {
        let result = self
            .collection
            .insert_many(docs)
            .await
            .context("Failed to insert documents")?;

        Ok(result
            .inserted_ids
            .values()
            .filter_map(|id| id.as_object_id())
            .collect())
    }

    /// Find all documents matching a filter
    pub async fn find(&self, filter: Document) -> Result<Vec<T>> {
        self.find_sorted(filter, None).await
    }

    /// Find all documents matching a filter in the given sort order
    pub async fn find_sorted(&self, filter: Document, sort: Option<Document>) -> Result<Vec<T>> {
        let options = FindOptions::builder().sort(sort).build();

        let cursor = self
            .collection
            .find(filter)
            .with_options(options)
            .await
            .context("Failed to execute find query")?;

        cursor
            .try_collect()
            .await
            .context("Failed to collect results")
    }
}

// =============================================================================
// Catalog backed by the properties and locations collections
// =============================================================================

pub struct MongoCatalog {
    properties: Repository<PropertyRecord>,
    locations: Repository<LocationRecord>,
}

impl MongoCatalog {
    pub fn new(db: &Database) -> Self {
        Self {
            properties: Repository::new(db.properties()),
            locations: Repository::new(db.locations()),
        }
    }
}

/// Case-insensitive "contains" match on name or slug of active locations.
pub fn location_lookup(needle: &str) -> Document {
    let pattern = regex::escape(needle.trim());
    doc! {
        "active": true,
        "$or": [
            { "name": { "$regex": pattern.clone(), "$options": "i" } },
            { "slug": { "$regex": pattern, "$options": "i" } },
        ],
    }
}

#[async_trait]
impl CatalogStore for MongoCatalog {
    async fn find_properties(
        &self,
        filter: &PropertyFilter,
    ) -> Result<Vec<PropertyRecord>, CatalogError> {
        let found = self
            .properties
            .find_sorted(filter.to_document(), Some(baseline_sort()))
            .await?;
        Ok(found)
    }

    async fn find_locations(&self, needle: &str) -> Result<Vec<LocationRecord>, CatalogError> {
        let found = self.locations.find(location_lookup(needle)).await?;
        Ok(found)
    }
}

// =============================================================================
// Search events
// =============================================================================

pub struct SearchEventRepo {
    repo: Repository<SearchEvent>,
}

impl SearchEventRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            repo: Repository::new(db.search_events()),
        }
    }
}

#[async_trait]
impl SearchEventStore for SearchEventRepo {
    async fn save(&self, event: &SearchEvent) -> Result<()> {
        let id = self
            .repo
            .insert(event)
            .await
            .context("Failed to store search event")?;
        log::debug!("stored search event {}", id);
        Ok(())
    }
}

// =============================================================================
// Test utilities
// =============================================================================
