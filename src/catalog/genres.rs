/// Closed genre vocabulary the catalog and the scoring service agree on.
pub const ALLOWED_GENRES: &[&str] = &[
    "Animation",
    "Drama",
    "Mystery",
    "Sci-Fi",
    "Thriller",
    "Adventure",
    "Children",
    "Comedy",
    "Fantasy",
    "Romance",
    "Action",
    "Horror",
    "Crime",
    "Film-Noir",
    "War",
    "Musical",
    "Western",
    "Documentary",
    "History",
];

/// Maps a free-text genre label onto the closed vocabulary.
///
/// Alias rules are substring matches, case-insensitive, applied in order;
/// the first matching rule wins. Labels that resolve to nothing in the
/// vocabulary are dropped by the caller.
pub fn normalize_genre(name: &str) -> Option<&'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();

    if lower.contains("science fiction") || lower.contains("sci-fi") {
        return Some("Sci-Fi");
    }
    if lower.contains("family") || lower.contains("children") {
        return Some("Children");
    }
    if lower.contains("film-noir") {
        return Some("Film-Noir");
    }
    if lower.contains("music") {
        return Some("Musical");
    }
    if lower.contains("documentary") {
        return Some("Documentary");
    }
    if lower.contains("history") {
        return Some("History");
    }

    let mut chars = lower.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => return None,
    };

    ALLOWED_GENRES.iter().find(|g| **g == capitalized).copied()
}

/// Normalizes a submitted genre list, discarding unresolvable labels.
pub fn normalize_genres(names: &[String]) -> Vec<String> {
    names
        .iter()
        .filter_map(|n| normalize_genre(n))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_science_fiction() {
        assert_eq!(normalize_genre("Science Fiction"), Some("Sci-Fi"));
        assert_eq!(normalize_genre("sci-fi"), Some("Sci-Fi"));
    }

    #[test]
    fn test_alias_family_and_children() {
        assert_eq!(normalize_genre("Family"), Some("Children"));
        assert_eq!(normalize_genre("children's film"), Some("Children"));
    }

    #[test]
    fn test_alias_music_covers_musical() {
        assert_eq!(normalize_genre("Music"), Some("Musical"));
        assert_eq!(normalize_genre("musical"), Some("Musical"));
    }

    #[test]
    fn test_exact_member_is_capitalized() {
        assert_eq!(normalize_genre("drama"), Some("Drama"));
        assert_eq!(normalize_genre("WESTERN"), Some("Western"));
    }

    #[test]
    fn test_unknown_label_is_dropped() {
        assert_eq!(normalize_genre("Telenovela"), None);
        assert_eq!(normalize_genre(""), None);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        // "historical music documentary" hits the music rule before
        // documentary or history.
        assert_eq!(normalize_genre("historical music documentary"), Some("Musical"));
    }

    #[test]
    fn test_normalize_genres_filters_list() {
        let input = vec![
            "Science Fiction".to_string(),
            "Telenovela".to_string(),
            "comedy".to_string(),
        ];
        assert_eq!(normalize_genres(&input), vec!["Sci-Fi", "Comedy"]);
    }
}
