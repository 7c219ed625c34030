use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One catalog row exactly as stored on disk.
///
/// The catalog is append-only: one row per (movie, rating event), so a
/// `movie_id` is not unique across rows. List-valued fields stay in their
/// on-disk encoding here (`genres` pipe-joined, `actors` comma-joined);
/// [`MovieSummary`] is the parsed view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogRecord {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub title: String,
    #[serde(default)]
    pub genres: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub actors: String,
    #[serde(default)]
    pub backdrop: String,
    #[serde(default)]
    pub description_clean: String,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl CatalogRecord {
    /// Looks up a field value by its catalog column name.
    ///
    /// Used by the append path, which serializes fields in whatever order
    /// the target file's header dictates. Unknown columns map to "".
    pub fn field(&self, column: &str) -> String {
        match column {
            "movieId" => self.movie_id.to_string(),
            "title" => self.title.clone(),
            "genres" => self.genres.clone(),
            "year" => self.year.clone(),
            "release_date" => self.release_date.clone().unwrap_or_default(),
            "description" => self.description.clone(),
            "actors" => self.actors.clone(),
            "backdrop" => self.backdrop.clone(),
            "description_clean" => self.description_clean.clone(),
            "userId" => self.user_id.clone().unwrap_or_default(),
            "rating" => self
                .rating
                .map(|r| format_rating(r))
                .unwrap_or_default(),
            _ => String::new(),
        }
    }
}

/// Formats a rating the way the catalog stores it: "4" rather than "4.0",
/// "4.5" for half steps.
pub fn format_rating(rating: f64) -> String {
    if rating.fract() == 0.0 {
        format!("{}", rating as i64)
    } else {
        format!("{}", rating)
    }
}

/// Display metadata for a single movie, deduplicated across catalog rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub title: String,
    pub year: String,
    #[serde(default)]
    pub release_date: Option<String>,
    pub genres: Vec<String>,
    pub description: String,
    pub actors: Vec<String>,
    pub backdrop: String,
}

impl From<&CatalogRecord> for MovieSummary {
    fn from(record: &CatalogRecord) -> Self {
        Self {
            movie_id: record.movie_id,
            title: record.title.clone(),
            year: record.year.clone(),
            release_date: record.release_date.clone(),
            genres: split_genres(&record.genres),
            description: record.description.clone(),
            actors: split_actors(&record.actors),
            backdrop: record.backdrop.clone(),
        }
    }
}

/// Splits the pipe-joined genre encoding.
pub fn split_genres(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(String::from)
        .collect()
}

/// Splits the comma-joined actor encoding.
pub fn split_actors(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect()
}

/// A registered user document.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// User fields safe to return to clients.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub username: String,
    pub email: String,
    #[serde(rename = "FirstName")]
    pub first_name: String,
    #[serde(rename = "LastName")]
    pub last_name: String,
    pub country: String,
    pub status: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            country: user.country.clone(),
            status: user.status.clone(),
        }
    }
}

/// One rating inside a user's rating document.
///
/// At most one entry exists per (user, film); re-rating updates the entry
/// in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingEntry {
    #[serde(rename = "filmId")]
    pub film_id: i64,
    pub note: f64,
    pub date: DateTime<Utc>,
}

/// A favorite marker; uniqueness per (user, movie) is enforced by the store.
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteEntry {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
}

/// A user-submitted movie, kept in the store both as structured data for the
/// synchronizer and as the record the weekly submission quota counts.
#[derive(Debug, Clone, Serialize)]
pub struct CustomMovie {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub title: String,
    pub genres: Vec<String>,
    pub year: String,
    pub description: String,
    pub actors: Vec<String>,
    pub backdrop: String,
    pub description_clean: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl CustomMovie {
    /// Builds the catalog row for this movie carrying one rating event.
    pub fn to_catalog_record(&self, rater_id: &str, note: f64) -> CatalogRecord {
        CatalogRecord {
            movie_id: self.movie_id,
            title: self.title.clone(),
            genres: self.genres.join("|"),
            year: self.year.clone(),
            release_date: None,
            description: self.description.clone(),
            actors: self.actors.join(", "),
            backdrop: self.backdrop.clone(),
            description_clean: self.description_clean.clone(),
            user_id: Some(rater_id.to_string()),
            rating: Some(note),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> CatalogRecord {
        CatalogRecord {
            movie_id: 42,
            title: "Heat".to_string(),
            genres: "Action|Crime|Thriller".to_string(),
            year: "1995".to_string(),
            release_date: Some("1995-12-15".to_string()),
            description: "A group of professional bank robbers".to_string(),
            actors: "Al Pacino, Robert De Niro".to_string(),
            backdrop: "https://image.example/heat.jpg".to_string(),
            description_clean: "professional bank robbers".to_string(),
            user_id: Some("12".to_string()),
            rating: Some(4.5),
        }
    }

    #[test]
    fn test_summary_splits_list_fields() {
        let summary = MovieSummary::from(&sample_record());
        assert_eq!(summary.genres, vec!["Action", "Crime", "Thriller"]);
        assert_eq!(summary.actors, vec!["Al Pacino", "Robert De Niro"]);
        assert_eq!(summary.movie_id, 42);
    }

    #[test]
    fn test_split_genres_drops_empty_segments() {
        assert_eq!(split_genres("Drama||"), vec!["Drama"]);
        assert!(split_genres("").is_empty());
    }

    #[test]
    fn test_field_lookup_by_column_name() {
        let record = sample_record();
        assert_eq!(record.field("movieId"), "42");
        assert_eq!(record.field("rating"), "4.5");
        assert_eq!(record.field("userId"), "12");
        assert_eq!(record.field("release_date"), "1995-12-15");
        assert_eq!(record.field("nonexistent"), "");
    }

    #[test]
    fn test_format_rating_whole_and_half() {
        assert_eq!(format_rating(4.0), "4");
        assert_eq!(format_rating(3.5), "3.5");
        assert_eq!(format_rating(0.0), "0");
    }

    #[test]
    fn test_custom_movie_to_catalog_record_joins_genres() {
        let movie = CustomMovie {
            movie_id: 99901,
            title: "Backyard Odyssey".to_string(),
            genres: vec!["Sci-Fi".to_string(), "Adventure".to_string()],
            year: "2024".to_string(),
            description: "Homemade space opera".to_string(),
            actors: vec!["A".to_string(), "B".to_string()],
            backdrop: String::new(),
            description_clean: "homemade space opera".to_string(),
            user_id: "u-1".to_string(),
            created_at: Utc::now(),
        };

        let record = movie.to_catalog_record("rater-7", 5.0);
        assert_eq!(record.genres, "Sci-Fi|Adventure");
        assert_eq!(record.user_id.as_deref(), Some("rater-7"));
        assert_eq!(record.rating, Some(5.0));
    }

    #[test]
    fn test_catalog_record_deserializes_from_headers() {
        let data = "movieId,title,genres,year,description,actors,backdrop,description_clean,userId,rating\n\
                    1,Toy Story,Animation|Children|Comedy,1995,Toys come alive,Tom Hanks,http://img,toys alive,7,4\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let record: CatalogRecord = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(record.movie_id, 1);
        assert_eq!(record.title, "Toy Story");
        assert_eq!(record.user_id.as_deref(), Some("7"));
        assert_eq!(record.rating, Some(4.0));
        assert_eq!(record.release_date, None);
    }
}
