//! SQLite progress store
//!
//! Owns books, chapters, prerequisite edges and progress records, and
//! enforces the gating rules on every mutation. Each mutation runs in a
//! single transaction; a rejected request rolls back without writing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{
    Chapter, ChapterStatus, Gate, GraphError, Outcome, Percent, PrerequisiteGraph, Progress,
    Rejection,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: i32, supported: i32 },

    #[error("Stored prerequisites for '{book}' are inconsistent: {source}")]
    InconsistentGraph {
        book: String,
        #[source]
        source: GraphError,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Chapter counts for one book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookStats {
    pub completed: usize,
    pub total: usize,
}

/// A chapter row resolved inside a book
#[derive(Debug, Clone)]
struct ChapterRow {
    id: i64,
    chapter: Chapter,
}

/// Persistent store for reading progress
pub struct ProgressStore {
    /// Path to the SQLite database (None when in memory)
    db_path: Option<PathBuf>,

    /// Database connection
    conn: Connection,
}

impl ProgressStore {
    /// Schema version - bump when the schema changes
    const SCHEMA_VERSION: i32 = 1;

    /// Opens or creates the store at the given path
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

        Self::from_connection(conn, Some(db_path.to_path_buf()))
    }

    /// Opens a store that lives only as long as the returned value
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let mut store = Self { db_path, conn };
        store.ensure_schema()?;

        Ok(store)
    }

    /// Creates the schema on a fresh database and refuses newer ones
    fn ensure_schema(&mut self) -> Result<()> {
        let current_version = self.get_schema_version()?;

        if current_version > Self::SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema {
                found: current_version,
                supported: Self::SCHEMA_VERSION,
            }
            .into());
        }

        if current_version < Self::SCHEMA_VERSION {
            self.create_schema()?;
        }

        Ok(())
    }

    /// Gets the current schema version
    fn get_schema_version(&self) -> Result<i32> {
        let result: Option<i32> = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()?;

        Ok(result.unwrap_or(0))
    }

    fn create_schema(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS books (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS chapters (
                id INTEGER PRIMARY KEY,
                book_id INTEGER NOT NULL REFERENCES books(id),
                title TEXT NOT NULL,
                required_percent INTEGER NOT NULL
                    CHECK (required_percent BETWEEN 0 AND 100),
                UNIQUE (book_id, title)
            );

            CREATE TABLE IF NOT EXISTS prerequisites (
                chapter_id INTEGER NOT NULL REFERENCES chapters(id),
                prerequisite_id INTEGER NOT NULL REFERENCES chapters(id),
                PRIMARY KEY (chapter_id, prerequisite_id),
                CHECK (chapter_id != prerequisite_id)
            );

            CREATE TABLE IF NOT EXISTS progress (
                chapter_id INTEGER PRIMARY KEY REFERENCES chapters(id),
                percent INTEGER NOT NULL CHECK (percent BETWEEN 0 AND 100),
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chapters_book ON chapters(book_id);
            CREATE INDEX IF NOT EXISTS idx_prerequisites_target ON prerequisites(prerequisite_id);
            ",
        )?;

        tx.execute_batch(&format!("PRAGMA user_version = {}", Self::SCHEMA_VERSION))?;
        tx.commit()?;

        Ok(())
    }

    /// Registers a chapter, creating its book on first use
    ///
    /// Re-registering an existing chapter overwrites its threshold. Blank
    /// titles are rejected.
    pub fn upsert_chapter(&mut self, book: &str, chapter: &str, required: Percent) -> Result<Outcome> {
        if book.trim().is_empty() || chapter.trim().is_empty() {
            return Ok(Outcome::rejected(Rejection::EmptyTitle {
                book: book.to_string(),
                chapter: chapter.to_string(),
            }));
        }

        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO books (title) VALUES (?1) ON CONFLICT(title) DO NOTHING",
            params![book],
        )?;
        let book_id: i64 = tx.query_row(
            "SELECT id FROM books WHERE title = ?1",
            params![book],
            |row| row.get(0),
        )?;

        tx.execute(
            "INSERT INTO chapters (book_id, title, required_percent) VALUES (?1, ?2, ?3)
             ON CONFLICT(book_id, title) DO UPDATE SET required_percent = excluded.required_percent",
            params![book_id, chapter, required.value()],
        )?;

        tx.commit()?;
        Ok(Outcome::Applied)
    }

    /// Records progress for a chapter whose prerequisites are all completed
    pub fn record_progress(&mut self, book: &str, chapter: &str, percent: Percent) -> Result<Outcome> {
        let tx = self.conn.transaction()?;

        let Some(book_id) = find_book(&tx, book)? else {
            return Ok(Outcome::rejected(Rejection::BookNotFound {
                book: book.to_string(),
            }));
        };

        let Some(target) = find_chapter(&tx, book_id, book, chapter)? else {
            return Ok(Outcome::rejected(Rejection::ChapterNotFound {
                book: book.to_string(),
                chapter: chapter.to_string(),
            }));
        };

        if let Gate::Blocked { pending } = gate_for(&tx, book, target.id)? {
            return Ok(Outcome::rejected(Rejection::PrerequisitesIncomplete {
                chapter: chapter.to_string(),
                pending,
            }));
        }

        let progress = Progress::new(percent);
        tx.execute(
            "INSERT INTO progress (chapter_id, percent, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(chapter_id) DO UPDATE SET
                 percent = excluded.percent,
                 updated_at = excluded.updated_at",
            params![
                target.id,
                progress.percent.value(),
                progress.updated_at.to_rfc3339()
            ],
        )?;

        tx.commit()?;
        Ok(Outcome::Applied)
    }

    /// Adds the edge `chapter` requires `prerequisite` within one book
    pub fn add_prerequisite(&mut self, book: &str, chapter: &str, prerequisite: &str) -> Result<Outcome> {
        let tx = self.conn.transaction()?;

        let (book_id, target, required) = match resolve_edge(&tx, book, chapter, prerequisite)? {
            Ok(resolved) => resolved,
            Err(reason) => return Ok(Outcome::rejected(reason)),
        };

        let mut graph = book_graph(&tx, book_id, book)?;
        if graph.prerequisites(chapter).iter().any(|p| p == prerequisite) {
            return Ok(Outcome::Applied);
        }

        if let Err(e) = graph.add_prerequisite(chapter, prerequisite) {
            let reason = match e {
                GraphError::SelfPrerequisite(chapter) => Rejection::SelfPrerequisite { chapter },
                GraphError::CycleDetected(chapter, prerequisite) => Rejection::CycleDetected {
                    chapter,
                    prerequisite,
                },
                GraphError::ChapterNotFound(chapter) => Rejection::ChapterNotFound {
                    book: book.to_string(),
                    chapter,
                },
            };
            return Ok(Outcome::rejected(reason));
        }

        tx.execute(
            "INSERT OR IGNORE INTO prerequisites (chapter_id, prerequisite_id) VALUES (?1, ?2)",
            params![target.id, required.id],
        )?;

        tx.commit()?;
        Ok(Outcome::Applied)
    }

    /// Removes the edge `chapter` requires `prerequisite`
    ///
    /// Removing an edge that does not exist is a no-op and still applies.
    pub fn remove_prerequisite(&mut self, book: &str, chapter: &str, prerequisite: &str) -> Result<Outcome> {
        let tx = self.conn.transaction()?;

        let (_, target, required) = match resolve_edge(&tx, book, chapter, prerequisite)? {
            Ok(resolved) => resolved,
            Err(reason) => return Ok(Outcome::rejected(reason)),
        };

        tx.execute(
            "DELETE FROM prerequisites WHERE chapter_id = ?1 AND prerequisite_id = ?2",
            params![target.id, required.id],
        )?;

        tx.commit()?;
        Ok(Outcome::Applied)
    }

    /// Number of chapters registered under a book (0 for unknown books)
    pub fn count_chapters(&self, book: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM chapters c
             JOIN books b ON b.id = c.book_id
             WHERE b.title = ?1",
            params![book],
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }

    /// Number of completed chapters in a book (0 for unknown books)
    pub fn count_completed_chapters(&self, book: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM chapters c
             JOIN books b ON b.id = c.book_id
             JOIN progress p ON p.chapter_id = c.id
             WHERE b.title = ?1
             AND p.percent >= c.required_percent",
            params![book],
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }

    /// Completed and total chapter counts for a book
    pub fn stats(&self, book: &str) -> Result<BookStats> {
        Ok(BookStats {
            completed: self.count_completed_chapters(book)?,
            total: self.count_chapters(book)?,
        })
    }

    /// Looks up a chapter by book and title
    pub fn chapter(&self, book: &str, chapter: &str) -> Result<Option<Chapter>> {
        let Some(book_id) = find_book(&self.conn, book)? else {
            return Ok(None);
        };

        Ok(find_chapter(&self.conn, book_id, book, chapter)?.map(|row| row.chapter))
    }

    /// Returns the progress record for a chapter, if one exists
    pub fn progress(&self, book: &str, chapter: &str) -> Result<Option<Progress>> {
        let progress = self
            .conn
            .query_row(
                "SELECT p.percent, p.updated_at FROM progress p
                 JOIN chapters c ON c.id = p.chapter_id
                 JOIN books b ON b.id = c.book_id
                 WHERE b.title = ?1 AND c.title = ?2",
                params![book, chapter],
                |row| progress_from_row(row, 0),
            )
            .optional()?
            .flatten();

        Ok(progress)
    }

    /// Returns the direct prerequisites of a chapter, sorted by title
    pub fn prerequisites(&self, book: &str, chapter: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT pre.title FROM prerequisites d
             JOIN chapters c ON c.id = d.chapter_id
             JOIN chapters pre ON pre.id = d.prerequisite_id
             JOIN books b ON b.id = c.book_id
             WHERE b.title = ?1 AND c.title = ?2
             ORDER BY pre.title",
        )?;

        let titles = stmt
            .query_map(params![book, chapter], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(titles)
    }

    /// Lists every chapter of a book in reading order with its derived state
    pub fn chapters(&self, book: &str) -> Result<Vec<ChapterStatus>> {
        let Some(book_id) = find_book(&self.conn, book)? else {
            return Ok(vec![]);
        };

        let mut stmt = self.conn.prepare(
            "SELECT c.title, c.required_percent, p.percent, p.updated_at
             FROM chapters c
             LEFT JOIN progress p ON p.chapter_id = c.id
             WHERE c.book_id = ?1",
        )?;

        let rows: Vec<(Chapter, Option<Progress>)> = stmt
            .query_map(params![book_id], |row| {
                let chapter = Chapter::new(book, row.get::<_, String>(0)?, percent_column(row, 1)?);
                Ok((chapter, progress_from_row(row, 2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let graph = book_graph(&self.conn, book_id, book)?;
        let by_title: HashMap<&str, &(Chapter, Option<Progress>)> = rows
            .iter()
            .map(|entry| (entry.0.title.as_str(), entry))
            .collect();

        let chapters = graph
            .reading_order()
            .into_iter()
            .filter_map(|title| by_title.get(title.as_str()).copied())
            .map(|(chapter, progress)| {
                let prerequisites = graph.prerequisites(&chapter.title);
                let gate = Gate::evaluate(
                    prerequisites
                        .iter()
                        .filter_map(|p| by_title.get(p.as_str()))
                        .map(|(c, p)| (c, p.as_ref())),
                );

                ChapterStatus {
                    title: chapter.title.clone(),
                    required: chapter.required,
                    progress: progress.clone(),
                    completed: chapter.is_completed_by(progress.as_ref()),
                    pending: gate.pending().to_vec(),
                }
            })
            .collect();

        Ok(chapters)
    }

    /// Returns the path to the database, or None when in memory
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }
}

fn find_book(conn: &Connection, book: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM books WHERE title = ?1",
            params![book],
            |row| row.get(0),
        )
        .optional()?;

    Ok(id)
}

fn find_chapter(conn: &Connection, book_id: i64, book: &str, title: &str) -> Result<Option<ChapterRow>> {
    let row = conn
        .query_row(
            "SELECT id, required_percent FROM chapters WHERE book_id = ?1 AND title = ?2",
            params![book_id, title],
            |row| {
                Ok(ChapterRow {
                    id: row.get(0)?,
                    chapter: Chapter::new(book, title, percent_column(row, 1)?),
                })
            },
        )
        .optional()?;

    Ok(row)
}

/// Resolves both ends of a prerequisite edge, or the reason it cannot exist
fn resolve_edge(
    conn: &Connection,
    book: &str,
    chapter: &str,
    prerequisite: &str,
) -> Result<Result<(i64, ChapterRow, ChapterRow), Rejection>> {
    let Some(book_id) = find_book(conn, book)? else {
        return Ok(Err(Rejection::BookNotFound {
            book: book.to_string(),
        }));
    };

    let Some(target) = find_chapter(conn, book_id, book, chapter)? else {
        return Ok(Err(Rejection::ChapterNotFound {
            book: book.to_string(),
            chapter: chapter.to_string(),
        }));
    };

    let Some(required) = find_chapter(conn, book_id, book, prerequisite)? else {
        return Ok(Err(Rejection::PrerequisiteNotFound {
            book: book.to_string(),
            prerequisite: prerequisite.to_string(),
        }));
    };

    Ok(Ok((book_id, target, required)))
}

/// Evaluates the completion gate for a chapter
fn gate_for(conn: &Connection, book: &str, chapter_id: i64) -> Result<Gate> {
    let mut stmt = conn.prepare(
        "SELECT c.title, c.required_percent, p.percent, p.updated_at
         FROM prerequisites d
         JOIN chapters c ON c.id = d.prerequisite_id
         LEFT JOIN progress p ON p.chapter_id = c.id
         WHERE d.chapter_id = ?1
         ORDER BY c.title",
    )?;

    let prerequisites: Vec<(Chapter, Option<Progress>)> = stmt
        .query_map(params![chapter_id], |row| {
            let chapter = Chapter::new(book, row.get::<_, String>(0)?, percent_column(row, 1)?);
            Ok((chapter, progress_from_row(row, 2)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Gate::evaluate(
        prerequisites.iter().map(|(c, p)| (c, p.as_ref())),
    ))
}

/// Loads the prerequisite graph of one book
fn book_graph(conn: &Connection, book_id: i64, book: &str) -> Result<PrerequisiteGraph> {
    let mut stmt = conn.prepare("SELECT title FROM chapters WHERE book_id = ?1")?;
    let titles = stmt
        .query_map(params![book_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT c.title, pre.title FROM prerequisites d
         JOIN chapters c ON c.id = d.chapter_id
         JOIN chapters pre ON pre.id = d.prerequisite_id
         WHERE c.book_id = ?1",
    )?;
    let edges = stmt
        .query_map(params![book_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<(String, String)>, _>>()?;

    PrerequisiteGraph::from_edges(
        titles.iter().map(String::as_str),
        edges.iter().map(|(c, p)| (c.as_str(), p.as_str())),
    )
    .map_err(|source| {
        StoreError::InconsistentGraph {
            book: book.to_string(),
            source,
        }
        .into()
    })
}

fn percent_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Percent> {
    let value: i64 = row.get(idx)?;
    Percent::new(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

/// Reads an optional `(percent, updated_at)` pair starting at `idx`
fn progress_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Progress>> {
    let percent: Option<i64> = row.get(idx)?;
    let Some(percent) = percent else {
        return Ok(None);
    };

    let percent = Percent::new(percent)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))?;

    let updated_at: String = row.get(idx + 1)?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx + 1, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(Some(Progress { percent, updated_at }))
}
