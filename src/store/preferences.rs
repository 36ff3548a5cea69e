use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use log::info;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_rusqlite::Connection;

use crate::recipes::Recipe;

const LIKED_KEY: &str = "liked_recipes";
const RATINGS_KEY: &str = "recipe_ratings";
const EVENT_CHANNEL_SIZE: usize = 16;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] tokio_rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
}

/// Change notification emitted after every successful write, so every
/// surface showing likes or ratings can stay in sync.
#[derive(Debug, Clone)]
pub enum PreferenceEvent {
    LikesChanged { count: usize },
    RatingChanged { id: String, stars: u8 },
}

/// Liked recipes and star ratings, persisted as two JSON-encoded entries
/// in a local SQLite key-value table. Writes are last-write-wins.
#[derive(Clone)]
pub struct PreferenceStore {
    conn: Arc<Connection>,
    events: broadcast::Sender<PreferenceEvent>,
}

impl PreferenceStore {
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path).await?;
        Self::with_connection(conn).await
    }

    /// Throwaway store for tests and dry runs.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().await?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let store = Self {
            conn: Arc::new(conn),
            events,
        };
        store.initialize().await?;
        Ok(store)
    }

    async fn initialize(&self) -> Result<(), StoreError> {
        self.conn
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TABLE IF NOT EXISTS preferences (
                        key TEXT PRIMARY KEY,
                        value TEXT NOT NULL,
                        updated_at TEXT NOT NULL
                    );",
                )?;
                Ok(())
            })
            .await?;

        info!("Preference store initialized");
        Ok(())
    }

    /// New receiver for preference change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<PreferenceEvent> {
        self.events.subscribe()
    }

    /// Adds the recipe to the liked set if absent, removes it if present.
    /// Returns whether the recipe is liked after the toggle.
    pub async fn toggle_like(&self, recipe: &Recipe) -> Result<bool, StoreError> {
        let mut liked = self.liked_recipes().await?;

        let now_liked = match liked.iter().position(|item| item.id == recipe.id) {
            Some(index) => {
                liked.remove(index);
                false
            }
            None => {
                liked.push(recipe.clone());
                true
            }
        };

        self.write_key(LIKED_KEY, serde_json::to_string(&liked)?)
            .await?;
        let _ = self
            .events
            .send(PreferenceEvent::LikesChanged { count: liked.len() });

        Ok(now_liked)
    }

    pub async fn liked_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        match self.read_key(LIKED_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn is_liked(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self
            .liked_recipes()
            .await?
            .iter()
            .any(|recipe| recipe.id == id))
    }

    /// Overwrite-or-insert one rating entry. Values outside 1-5 are
    /// rejected without touching the store.
    pub async fn set_rating(&self, id: &str, stars: u8) -> Result<(), StoreError> {
        if !(1..=5).contains(&stars) {
            return Err(StoreError::InvalidRating(stars));
        }

        let mut ratings = self.ratings().await?;
        ratings.insert(id.to_string(), stars);

        self.write_key(RATINGS_KEY, serde_json::to_string(&ratings)?)
            .await?;
        let _ = self.events.send(PreferenceEvent::RatingChanged {
            id: id.to_string(),
            stars,
        });

        Ok(())
    }

    pub async fn ratings(&self) -> Result<HashMap<String, u8>, StoreError> {
        match self.read_key(RATINGS_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(HashMap::new()),
        }
    }

    pub async fn rating(&self, id: &str) -> Result<Option<u8>, StoreError> {
        Ok(self.ratings().await?.get(id).copied())
    }

    async fn write_key(&self, key: &str, value: String) -> Result<(), StoreError> {
        let key = key.to_string();
        let updated_at = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)",
                    [&key, &value, &updated_at],
                )?;
                Ok(())
            })
            .await?;

        Ok(())
    }

    async fn read_key(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = key.to_string();

        let value = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare("SELECT value FROM preferences WHERE key = ?1")?;
                let mut rows = stmt.query([key])?;
                let value = match rows.next()? {
                    Some(row) => Some(row.get::<_, String>(0)?),
                    None => None,
                };
                Ok(value)
            })
            .await?;

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(id: &str, title: &str) -> Recipe {
        Recipe {
            id: id.to_string(),
            title: title.to_string(),
            thumbnail: String::new(),
            category: "Seafood".to_string(),
            servings: 2,
            time_minutes: 25,
        }
    }

    #[tokio::test]
    async fn test_toggle_like_adds_then_removes() {
        let store = PreferenceStore::in_memory().await.unwrap();
        let salmon = recipe("52959", "Baked salmon with fennel & tomatoes");

        assert!(store.toggle_like(&salmon).await.unwrap());
        let liked = store.liked_recipes().await.unwrap();
        assert_eq!(liked.len(), 1);
        assert!(store.is_liked("52959").await.unwrap());

        assert!(!store.toggle_like(&salmon).await.unwrap());
        assert!(store.liked_recipes().await.unwrap().is_empty());
        assert!(!store.is_liked("52959").await.unwrap());
    }

    #[tokio::test]
    async fn test_toggle_like_changes_size_by_one() {
        let store = PreferenceStore::in_memory().await.unwrap();
        store.toggle_like(&recipe("1", "Chicken Soup")).await.unwrap();
        store.toggle_like(&recipe("2", "Beef Stew")).await.unwrap();
        assert_eq!(store.liked_recipes().await.unwrap().len(), 2);

        store.toggle_like(&recipe("1", "Chicken Soup")).await.unwrap();
        let liked = store.liked_recipes().await.unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].id, "2");
    }

    #[tokio::test]
    async fn test_set_rating_overwrites() {
        let store = PreferenceStore::in_memory().await.unwrap();

        store.set_rating("52772", 3).await.unwrap();
        store.set_rating("52772", 5).await.unwrap();

        assert_eq!(store.rating("52772").await.unwrap(), Some(5));
        assert_eq!(store.ratings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_rating_is_rejected() {
        let store = PreferenceStore::in_memory().await.unwrap();

        assert!(matches!(
            store.set_rating("52772", 0).await,
            Err(StoreError::InvalidRating(0))
        ));
        assert!(matches!(
            store.set_rating("52772", 6).await,
            Err(StoreError::InvalidRating(6))
        ));
        assert!(store.ratings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_writes_emit_events() {
        let store = PreferenceStore::in_memory().await.unwrap();
        let mut events = store.subscribe();

        store.toggle_like(&recipe("1", "Chicken Soup")).await.unwrap();
        match events.try_recv().unwrap() {
            PreferenceEvent::LikesChanged { count } => assert_eq!(count, 1),
            other => panic!("unexpected event: {:?}", other),
        }

        store.set_rating("1", 4).await.unwrap();
        match events.try_recv().unwrap() {
            PreferenceEvent::RatingChanged { id, stars } => {
                assert_eq!(id, "1");
                assert_eq!(stars, 4);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        assert!(events.try_recv().is_err());
    }
}
