//! External collaborators and the glue that joins their output to the
//! catalog: the scoring-service gateway, the enrichment layer, and the
//! movie-metadata client.

pub mod enrichment;
pub mod recommender;
pub mod tmdb;
