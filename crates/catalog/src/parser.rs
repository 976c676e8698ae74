//! Reader and writer for JSON-lines catalog files.
//!
//! Format: one JSON object per line, one line per [`Movie`]:
//!
//! ```text
//! {"id":1,"title":"Stalker","overview":"...","genres":["Drama"],"runtime":161,"embedding":[0.01]}
//! ```
//!
//! Blank lines are skipped. Errors carry the file name and 1-based line
//! number of the offending record.

use crate::error::{CatalogError, Result};
use crate::types::Movie;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Parse a catalog file from disk
pub fn parse_catalog(path: &Path) -> Result<Vec<Movie>> {
    let file = File::open(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => CatalogError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => CatalogError::IoError(err),
    })?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    parse_reader(BufReader::new(file), &file_name)
}

/// Parse catalog records from any buffered reader.
///
/// `file_name` is only used to label parse errors.
pub fn parse_reader<R: BufRead>(reader: R, file_name: &str) -> Result<Vec<Movie>> {
    let mut movies = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let movie: Movie =
            serde_json::from_str(trimmed).map_err(|err| CatalogError::ParseError {
                file: file_name.to_string(),
                line: line_no,
                reason: err.to_string(),
            })?;
        movies.push(movie);
    }

    Ok(movies)
}

/// Write movies to `path` in the same JSON-lines format, replacing the file
pub fn write_catalog(path: &Path, movies: &[Movie]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_records(&mut writer, movies)?;
    writer.flush()?;
    Ok(())
}

/// Serialize movies as JSON lines into any writer
pub fn write_records<W: Write>(writer: &mut W, movies: &[Movie]) -> Result<()> {
    for movie in movies {
        serde_json::to_writer(&mut *writer, movie)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_full_record() {
        let data = r#"{"id":7,"tmdb_id":1398,"title":"Stalker","overview":"A guide leads two men.","genres":["Drama","Science Fiction"],"runtime":161,"platforms":["Mubi"],"vote_average":8.1,"release_date":"1979-05-25","embedding":[0.5,0.5]}"#;

        let movies = parse_reader(Cursor::new(data), "catalog.jsonl").unwrap();

        assert_eq!(movies.len(), 1);
        let movie = &movies[0];
        assert_eq!(movie.id, 7);
        assert_eq!(movie.tmdb_id, Some(1398));
        assert_eq!(movie.runtime, Some(161));
        assert_eq!(movie.year(), Some(1979));
        assert_eq!(movie.embedding, vec![0.5, 0.5]);
    }

    #[test]
    fn test_optional_fields_default() {
        let data = "{\"id\":1,\"title\":\"Bare\"}\n";

        let movies = parse_reader(Cursor::new(data), "catalog.jsonl").unwrap();

        assert_eq!(movies[0].overview, None);
        assert!(movies[0].genres.is_empty());
        assert!(movies[0].embedding.is_empty());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let data = "\n{\"id\":1,\"title\":\"A\"}\n   \n{\"id\":2,\"title\":\"B\"}\n";

        let movies = parse_reader(Cursor::new(data), "catalog.jsonl").unwrap();

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[1].title, "B");
    }

    #[test]
    fn test_parse_error_reports_line() {
        let data = "{\"id\":1,\"title\":\"A\"}\n{\"id\":\"oops\"}\n";

        let err = parse_reader(Cursor::new(data), "catalog.jsonl").unwrap_err();

        match err {
            CatalogError::ParseError { file, line, .. } => {
                assert_eq!(file, "catalog.jsonl");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = parse_catalog(Path::new("definitely/not/here.jsonl")).unwrap_err();
        assert!(matches!(err, CatalogError::FileNotFound { .. }));
    }

    #[test]
    fn test_written_records_parse_back() {
        let movies = vec![
            Movie::new(1, "Paterson", vec![0.1, 0.2]).with_genres(["Drama"]),
            Movie::new(2, "Mad Max: Fury Road", vec![0.3, 0.4]).with_runtime(120),
        ];

        let mut buffer = Vec::new();
        write_records(&mut buffer, &movies).unwrap();
        let parsed = parse_reader(Cursor::new(buffer), "memory").unwrap();

        assert_eq!(parsed, movies);
    }
}
