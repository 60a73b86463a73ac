//! Parser for the dataset files.
//!
//! Every file holds one record per line with `::` separated fields:
//! - genres.dat:    genreId::name
//! - directors.dat: directorId::name
//! - users.dat:     userId::login::name
//! - films.dat:     filmId::title::releaseYear::genreId|...::directorId|...
//! - reviews.dat:   reviewId::filmId::userId::isPositive::content
//! - likes.dat:     userId::filmId
//! - votes.dat:     reviewId::userId::LIKE|DISLIKE
//!
//! Blank lines are skipped and line numbers in errors are 1-based.

use crate::error::{CatalogError, Result};
use crate::types::*;
use engagement::Polarity;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Read the non-blank lines of a file, paired with their line number
fn read_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    if !path.exists() {
        return Err(CatalogError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path)?;

    Ok(content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim().to_string()))
        .filter(|(_, line)| !line.is_empty())
        .collect())
}

/// Cursor over the `::` separated fields of one line
struct LineFields<'a> {
    file: &'static str,
    line: usize,
    parts: std::str::SplitN<'a, &'static str>,
}

impl<'a> LineFields<'a> {
    fn new(file: &'static str, line: usize, text: &'a str, fields: usize) -> Self {
        Self {
            file,
            line,
            parts: text.splitn(fields, "::"),
        }
    }

    fn parse_error(&self, reason: String) -> CatalogError {
        CatalogError::ParseError {
            file: self.file.to_string(),
            line: self.line,
            reason,
        }
    }

    /// Next raw field, or a parse error naming the missing field
    fn text(&mut self, name: &str) -> Result<&'a str> {
        match self.parts.next() {
            Some(value) => Ok(value),
            None => Err(self.parse_error(format!("Missing {}", name))),
        }
    }

    /// Next field parsed into `T`
    fn parse<T>(&mut self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.text(name)?;
        raw.trim()
            .parse()
            .map_err(|e| self.parse_error(format!("Invalid {}: {}", name, e)))
    }
}

/// Parse the genres.dat file
pub fn parse_genres(path: &Path) -> Result<Vec<Genre>> {
    let mut genres = Vec::new();
    for (line_no, line) in read_lines(path)? {
        let mut fields = LineFields::new("genres.dat", line_no, &line, 2);
        genres.push(Genre {
            id: fields.parse("genreId")?,
            name: fields.text("name")?.to_string(),
        });
    }
    Ok(genres)
}

/// Parse the directors.dat file
pub fn parse_directors(path: &Path) -> Result<Vec<Director>> {
    let mut directors = Vec::new();
    for (line_no, line) in read_lines(path)? {
        let mut fields = LineFields::new("directors.dat", line_no, &line, 2);
        directors.push(Director {
            id: fields.parse("directorId")?,
            name: fields.text("name")?.to_string(),
        });
    }
    Ok(directors)
}

/// Parse the users.dat file
pub fn parse_users(path: &Path) -> Result<Vec<User>> {
    let mut users = Vec::new();
    for (line_no, line) in read_lines(path)? {
        let mut fields = LineFields::new("users.dat", line_no, &line, 3);
        users.push(User {
            id: fields.parse("userId")?,
            login: fields.text("login")?.to_string(),
            name: fields.text("name")?.to_string(),
        });
    }
    Ok(users)
}

/// Parse the films.dat file
///
/// Genre and director lists are pipe-separated and may be empty: "1|2" or ""
pub fn parse_films(path: &Path) -> Result<Vec<Film>> {
    let mut films = Vec::new();
    for (line_no, line) in read_lines(path)? {
        let mut fields = LineFields::new("films.dat", line_no, &line, 5);
        let id = fields.parse("filmId")?;
        let title = fields.text("title")?.to_string();
        let release_year = fields.parse("releaseYear")?;
        let genres = parse_id_list("genreId", fields.text("genres")?)
            .map_err(|reason| fields.parse_error(reason))?;
        let directors = parse_id_list("directorId", fields.text("directors")?)
            .map_err(|reason| fields.parse_error(reason))?;

        films.push(Film {
            id,
            title,
            release_year,
            genres,
            directors,
        });
    }
    Ok(films)
}

/// Parse the reviews.dat file
///
/// Content is the last field and may itself contain "::"
pub fn parse_reviews(path: &Path) -> Result<Vec<Review>> {
    let mut reviews = Vec::new();
    for (line_no, line) in read_lines(path)? {
        let mut fields = LineFields::new("reviews.dat", line_no, &line, 5);
        reviews.push(Review {
            id: fields.parse("reviewId")?,
            film_id: fields.parse("filmId")?,
            user_id: fields.parse("userId")?,
            is_positive: fields.parse("isPositive")?,
            content: fields.text("content")?.to_string(),
        });
    }
    Ok(reviews)
}

/// Parse the likes.dat file
pub fn parse_likes(path: &Path) -> Result<Vec<LikeRecord>> {
    let mut likes = Vec::new();
    for (line_no, line) in read_lines(path)? {
        let mut fields = LineFields::new("likes.dat", line_no, &line, 2);
        likes.push(LikeRecord {
            user_id: fields.parse("userId")?,
            film_id: fields.parse("filmId")?,
        });
    }
    Ok(likes)
}

/// Parse the votes.dat file
pub fn parse_votes(path: &Path) -> Result<Vec<VoteRecord>> {
    let mut votes = Vec::new();
    for (line_no, line) in read_lines(path)? {
        let mut fields = LineFields::new("votes.dat", line_no, &line, 3);
        let review_id = fields.parse("reviewId")?;
        let user_id = fields.parse("userId")?;
        let polarity = parse_polarity(fields.text("polarity")?.trim())?;
        votes.push(VoteRecord {
            review_id,
            user_id,
            polarity,
        });
    }
    Ok(votes)
}

/// Parse a vote polarity
///
/// Example: "LIKE" -> Ok(Polarity::Like)
///          "dislike" -> Ok(Polarity::Dislike)
pub fn parse_polarity(s: &str) -> Result<Polarity> {
    match s.to_ascii_uppercase().as_str() {
        "LIKE" => Ok(Polarity::Like),
        "DISLIKE" => Ok(Polarity::Dislike),
        _ => Err(CatalogError::InvalidValue {
            field: "polarity".to_string(),
            value: s.to_string(),
        }),
    }
}

/// Parse pipe-separated ids
///
/// Example: "1|2|6" -> {1, 2, 6}
///          "" -> {}
fn parse_id_list(name: &str, s: &str) -> std::result::Result<BTreeSet<u32>, String> {
    s.split('|')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse()
                .map_err(|e| format!("Invalid {} '{}': {}", name, part, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(
            parse_id_list("genreId", "1|2|6").unwrap(),
            BTreeSet::from([1, 2, 6])
        );
        assert!(parse_id_list("genreId", "").unwrap().is_empty());
        assert!(parse_id_list("directorId", "1|x").is_err());
    }

    #[test]
    fn test_parse_polarity() {
        assert_eq!(parse_polarity("LIKE").unwrap(), Polarity::Like);
        assert_eq!(parse_polarity("dislike").unwrap(), Polarity::Dislike);
        assert!(parse_polarity("MEH").is_err());
    }

    #[test]
    fn test_parse_films() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "films.dat",
            "1::Brother::1997::2|4::3\n\n2::Silent Film::1920::::\n",
        );

        let films = parse_films(&path).unwrap();
        assert_eq!(films.len(), 2);
        assert_eq!(films[0].title, "Brother");
        assert_eq!(films[0].release_year, 1997);
        assert_eq!(films[0].genres, BTreeSet::from([2, 4]));
        assert_eq!(films[0].directors, BTreeSet::from([3]));
        assert!(films[1].genres.is_empty());
        assert!(films[1].directors.is_empty());
    }

    #[test]
    fn test_film_without_director_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "films.dat", "1::Brother::1997::2\n");

        match parse_films(&path) {
            Err(CatalogError::ParseError { line, reason, .. }) => {
                assert_eq!(line, 1);
                assert!(reason.contains("directors"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_reviews_keeps_separator_in_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "reviews.dat",
            "1::10::100::true::Great :: really great\n",
        );

        let reviews = parse_reviews(&path).unwrap();
        assert_eq!(reviews[0].content, "Great :: really great");
        assert!(reviews[0].is_positive);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "likes.dat", "1::10\n\nabc::11\n");

        match parse_likes(&path) {
            Err(CatalogError::ParseError { line, file, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(file, "likes.dat");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "votes.dat", "1::2\n");
        assert!(matches!(
            parse_votes(&path),
            Err(CatalogError::ParseError { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = parse_users(&dir.path().join("users.dat"));
        assert!(matches!(result, Err(CatalogError::FileNotFound { .. })));
    }
}
