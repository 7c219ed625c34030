use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CustomMovie, RatingEntry, User};

/// Counter name for registration user ids.
pub const USER_ID_COUNTER: &str = "userId";
/// Counter name for catalog ids handed to user-submitted movies.
pub const MOVIE_ID_COUNTER: &str = "movieId";

/// Fields accepted by a profile update; everything is optional.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub status: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Default)]
struct StoreInner {
    users: HashMap<Uuid, User>,
    /// One rating document per user, at most one entry per film.
    rates: HashMap<Uuid, Vec<RatingEntry>>,
    /// Favorite movie ids per user, insertion order preserved.
    favorites: HashMap<Uuid, Vec<i64>>,
    custom_movies: Vec<CustomMovie>,
    counters: HashMap<String, i64>,
}

/// In-process document store for user, rating, favorite, and submission
/// state.
///
/// Collections live behind a single writer lock, which is what makes the
/// pre-insert existence checks (favorites, email uniqueness) and the
/// find-and-increment counters actually atomic.
#[derive(Default)]
pub struct Store {
    inner: RwLock<StoreInner>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- counters ----

    /// Creates the named counter seeded at `seed` unless it already exists.
    pub async fn init_counter(&self, name: &str, seed: i64) -> i64 {
        let mut inner = self.inner.write().await;
        *inner.counters.entry(name.to_string()).or_insert(seed)
    }

    /// Atomic find-and-increment; returns the new value.
    pub async fn next_id(&self, name: &str) -> i64 {
        let mut inner = self.inner.write().await;
        let value = inner.counters.entry(name.to_string()).or_insert(0);
        *value += 1;
        *value
    }

    // ---- users ----

    /// Inserts a user, assigning its numeric id from the user counter.
    /// The email-uniqueness check happens under the same write lock.
    pub async fn create_user(
        &self,
        username: String,
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        country: String,
        status: String,
    ) -> AppResult<User> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.email == email) {
            return Err(AppError::InvalidInput("Email déjà utilisé".to_string()));
        }

        let counter = inner
            .counters
            .entry(USER_ID_COUNTER.to_string())
            .or_insert(0);
        *counter += 1;
        let user_id = *counter;

        let user = User {
            id: Uuid::new_v4(),
            user_id,
            username,
            email,
            password_hash,
            first_name,
            last_name,
            country,
            status,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Option<User> {
        let inner = self.inner.read().await;
        inner.users.values().find(|u| u.email == email).cloned()
    }

    pub async fn get_user(&self, id: Uuid) -> Option<User> {
        self.inner.read().await.users.get(&id).cloned()
    }

    pub async fn update_user(&self, id: Uuid, update: ProfileUpdate) -> Option<User> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(&id)?;

        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(first_name) = update.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            user.last_name = last_name;
        }
        if let Some(country) = update.country {
            user.country = country;
        }
        if let Some(status) = update.status {
            user.status = status;
        }
        if let Some(password_hash) = update.password_hash {
            user.password_hash = password_hash;
        }
        Some(user.clone())
    }

    // ---- ratings ----

    /// Adds or updates the caller's rating for a film.
    ///
    /// A second rating for the same (user, film) updates the existing
    /// entry's score and timestamp in place.
    pub async fn upsert_rating(&self, user: Uuid, film_id: i64, note: f64) -> Vec<RatingEntry> {
        let mut inner = self.inner.write().await;
        let doc = inner.rates.entry(user).or_default();

        match doc.iter_mut().find(|r| r.film_id == film_id) {
            Some(existing) => {
                existing.note = note;
                existing.date = Utc::now();
            }
            None => doc.push(RatingEntry {
                film_id,
                note,
                date: Utc::now(),
            }),
        }
        doc.clone()
    }

    pub async fn ratings_for(&self, user: Uuid) -> Vec<RatingEntry> {
        self.inner
            .read()
            .await
            .rates
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of distinct films the user has rated.
    pub async fn distinct_rated_count(&self, user: Uuid) -> usize {
        self.ratings_for(user).await.len()
    }

    /// Every rating document, for the catalog synchronizer.
    pub async fn all_ratings(&self) -> Vec<(Uuid, Vec<RatingEntry>)> {
        self.inner
            .read()
            .await
            .rates
            .iter()
            .map(|(user, doc)| (*user, doc.clone()))
            .collect()
    }

    // ---- favorites ----

    pub async fn add_favorite(&self, user: Uuid, movie_id: i64) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let list = inner.favorites.entry(user).or_default();
        if list.contains(&movie_id) {
            return Err(AppError::InvalidInput("Film déjà en favoris".to_string()));
        }
        list.push(movie_id);
        Ok(())
    }

    pub async fn favorites_for(&self, user: Uuid) -> Vec<i64> {
        self.inner
            .read()
            .await
            .favorites
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn remove_favorite(&self, user: Uuid, movie_id: i64) -> bool {
        let mut inner = self.inner.write().await;
        match inner.favorites.get_mut(&user) {
            Some(list) => {
                let before = list.len();
                list.retain(|id| *id != movie_id);
                list.len() != before
            }
            None => false,
        }
    }

    // ---- custom movies ----

    pub async fn add_custom_movie(&self, movie: CustomMovie) {
        self.inner.write().await.custom_movies.push(movie);
    }

    /// Submissions by this user created after `cutoff`, which is how the
    /// weekly quota window is counted.
    pub async fn submissions_since(&self, user_id: &str, cutoff: DateTime<Utc>) -> usize {
        self.inner
            .read()
            .await
            .custom_movies
            .iter()
            .filter(|m| m.user_id == user_id && m.created_at >= cutoff)
            .count()
    }

    pub async fn custom_movie_by_id(&self, movie_id: i64) -> Option<CustomMovie> {
        self.inner
            .read()
            .await
            .custom_movies
            .iter()
            .find(|m| m.movie_id == movie_id)
            .cloned()
    }

    /// Most recent submissions, newest first.
    pub async fn latest_submissions(&self, limit: usize) -> Vec<CustomMovie> {
        let inner = self.inner.read().await;
        let mut movies: Vec<CustomMovie> = inner.custom_movies.clone();
        movies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        movies.truncate(limit);
        movies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn store_with_user() -> (Store, User) {
        let store = Store::new();
        let user = store
            .create_user(
                "alice".to_string(),
                "alice@example.com".to_string(),
                "hash".to_string(),
                "Alice".to_string(),
                "Martin".to_string(),
                "France".to_string(),
                "etudiant".to_string(),
            )
            .await
            .unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn test_counter_find_and_increment() {
        let store = Store::new();
        store.init_counter(MOVIE_ID_COUNTER, 9000).await;
        assert_eq!(store.next_id(MOVIE_ID_COUNTER).await, 9001);
        assert_eq!(store.next_id(MOVIE_ID_COUNTER).await, 9002);
    }

    #[tokio::test]
    async fn test_init_counter_does_not_reseed() {
        let store = Store::new();
        store.init_counter(USER_ID_COUNTER, 100).await;
        assert_eq!(store.init_counter(USER_ID_COUNTER, 999).await, 100);
    }

    #[tokio::test]
    async fn test_user_ids_come_from_counter() {
        let (store, user) = store_with_user().await;
        assert_eq!(user.user_id, 1);

        let second = store
            .create_user(
                "bob".to_string(),
                "bob@example.com".to_string(),
                "hash".to_string(),
                "Bob".to_string(),
                "Durand".to_string(),
                "Unknown".to_string(),
                "autre".to_string(),
            )
            .await
            .unwrap();
        assert_eq!(second.user_id, 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (store, _user) = store_with_user().await;
        let result = store
            .create_user(
                "alice2".to_string(),
                "alice@example.com".to_string(),
                "hash".to_string(),
                "A".to_string(),
                "B".to_string(),
                "Unknown".to_string(),
                "autre".to_string(),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rating_upsert_updates_in_place() {
        let (store, user) = store_with_user().await;

        let doc = store.upsert_rating(user.id, 42, 3.0).await;
        assert_eq!(doc.len(), 1);
        let first_date = doc[0].date;

        let doc = store.upsert_rating(user.id, 42, 4.5).await;
        assert_eq!(doc.len(), 1, "re-rating must not create a duplicate");
        assert_eq!(doc[0].note, 4.5);
        assert!(doc[0].date >= first_date);

        let doc = store.upsert_rating(user.id, 7, 2.0).await;
        assert_eq!(doc.len(), 2);
        assert_eq!(store.distinct_rated_count(user.id).await, 2);
    }

    #[tokio::test]
    async fn test_favorite_duplicate_rejected() {
        let (store, user) = store_with_user().await;
        store.add_favorite(user.id, 5).await.unwrap();
        assert!(store.add_favorite(user.id, 5).await.is_err());
        assert_eq!(store.favorites_for(user.id).await, vec![5]);
    }

    #[tokio::test]
    async fn test_remove_favorite() {
        let (store, user) = store_with_user().await;
        store.add_favorite(user.id, 5).await.unwrap();
        assert!(store.remove_favorite(user.id, 5).await);
        assert!(!store.remove_favorite(user.id, 5).await);
    }

    #[tokio::test]
    async fn test_submissions_since_counts_rolling_window() {
        let (store, user) = store_with_user().await;
        let user_key = user.id.to_string();

        let mut old = sample_movie(1, &user_key);
        old.created_at = Utc::now() - Duration::days(8);
        store.add_custom_movie(old).await;
        store.add_custom_movie(sample_movie(2, &user_key)).await;
        store.add_custom_movie(sample_movie(3, &user_key)).await;

        let cutoff = Utc::now() - Duration::days(7);
        assert_eq!(store.submissions_since(&user_key, cutoff).await, 2);
        assert_eq!(store.submissions_since("someone-else", cutoff).await, 0);
    }

    #[tokio::test]
    async fn test_latest_submissions_newest_first() {
        let (store, user) = store_with_user().await;
        let user_key = user.id.to_string();

        let mut first = sample_movie(1, &user_key);
        first.created_at = Utc::now() - Duration::hours(2);
        let mut second = sample_movie(2, &user_key);
        second.created_at = Utc::now() - Duration::hours(1);
        store.add_custom_movie(first).await;
        store.add_custom_movie(second).await;

        let latest = store.latest_submissions(10).await;
        assert_eq!(latest[0].movie_id, 2);
        assert_eq!(latest[1].movie_id, 1);
    }

    fn sample_movie(movie_id: i64, user_id: &str) -> CustomMovie {
        CustomMovie {
            movie_id,
            title: format!("Movie {}", movie_id),
            genres: vec!["Drama".to_string()],
            year: "2024".to_string(),
            description: String::new(),
            actors: vec![],
            backdrop: String::new(),
            description_clean: String::new(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        }
    }
}
