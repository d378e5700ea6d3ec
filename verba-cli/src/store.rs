//! SQLite persistence for analyzed clips.
//!
//! One `clip` row per analysis run, one `word` row per word, keyed by
//! `(clip_name, word_index)` with indices contiguous from 0. Words are
//! stored as the codec's opaque blobs.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use verba_core::codec::{decode_word, encode_word};
use verba_core::error::{Result, VerbaError};
use verba_core::Clip;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS clip (
  name          TEXT PRIMARY KEY,
  vector_size   INTEGER NOT NULL,
  window_size   INTEGER NOT NULL,
  window_stride INTEGER NOT NULL,
  created_at    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS word (
  clip_name  TEXT NOT NULL,
  word_index INTEGER NOT NULL,
  vectors    BLOB NOT NULL,
  PRIMARY KEY (clip_name, word_index)
);

CREATE INDEX IF NOT EXISTS word_by_clip ON word(clip_name);
"#;

pub struct ClipStore {
    conn: Connection,
}

impl ClipStore {
    /// Open (and if necessary create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        // The schema is applied on every open; it only contains
        // IF NOT EXISTS clauses.
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self { conn })
    }

    pub fn clip_exists(&self, name: &str) -> Result<bool> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM clip WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    /// Store a clip and all of its words in one transaction.
    ///
    /// # Errors
    /// `VerbaError::DuplicateClip` when the name is already taken; the store
    /// is left untouched in that case, and a failure partway through the
    /// word inserts rolls the whole clip back.
    pub fn add_clip(&mut self, clip: &Clip) -> Result<()> {
        if self.clip_exists(&clip.name)? {
            return Err(VerbaError::DuplicateClip(clip.name.clone()));
        }

        let tx = self.conn.transaction().map_err(db_err)?;
        tx.execute(
            "INSERT INTO clip (name, vector_size, window_size, window_stride, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                clip.name,
                clip.vector_size as i64,
                clip.window_size as i64,
                clip.window_stride as i64,
                Utc::now().timestamp(),
            ],
        )
        .map_err(db_err)?;

        for (index, word) in clip.words.iter().enumerate() {
            let blob = encode_word(word)?;
            tx.execute(
                "INSERT INTO word (clip_name, word_index, vectors) VALUES (?1, ?2, ?3)",
                params![clip.name, index as i64, blob],
            )
            .map_err(db_err)?;
        }

        tx.commit().map_err(db_err)?;
        debug!(clip = clip.name, words = clip.words.len(), "clip stored");
        Ok(())
    }

    /// Load a clip and its words, ordered by word index.
    ///
    /// # Errors
    /// `VerbaError::NoSuchClip` when the name is unknown and
    /// `VerbaError::CorruptClip` when the stored word indices are not
    /// contiguous from 0.
    pub fn get_clip(&self, name: &str) -> Result<Clip> {
        let header: Option<(i64, i64, i64)> = self
            .conn
            .query_row(
                "SELECT vector_size, window_size, window_stride FROM clip WHERE name = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(db_err)?;
        let Some((vector_size, window_size, window_stride)) = header else {
            return Err(VerbaError::NoSuchClip(name.to_string()));
        };

        let mut stmt = self
            .conn
            .prepare(
                "SELECT word_index, vectors FROM word
                 WHERE clip_name = ?1 ORDER BY word_index",
            )
            .map_err(db_err)?;
        let mut rows = stmt.query(params![name]).map_err(db_err)?;

        let mut words = Vec::new();
        while let Some(row) = rows.next().map_err(db_err)? {
            let index: i64 = row.get(0).map_err(db_err)?;
            if index != words.len() as i64 {
                return Err(VerbaError::CorruptClip {
                    name: name.to_string(),
                    detail: format!(
                        "word indices not contiguous from 0 (expected {}, found {index})",
                        words.len()
                    ),
                });
            }
            let blob: Vec<u8> = row.get(1).map_err(db_err)?;
            words.push(decode_word(&blob)?);
        }

        Ok(Clip {
            name: name.to_string(),
            vector_size: vector_size as usize,
            window_size: window_size as usize,
            window_stride: window_stride as usize,
            words,
        })
    }

    /// Delete a clip and all of its words. Removing an absent clip is not
    /// an error.
    pub fn remove_clip(&mut self, name: &str) -> Result<()> {
        let tx = self.conn.transaction().map_err(db_err)?;
        tx.execute("DELETE FROM clip WHERE name = ?1", params![name])
            .map_err(db_err)?;
        tx.execute("DELETE FROM word WHERE clip_name = ?1", params![name])
            .map_err(db_err)?;
        tx.commit().map_err(db_err)?;
        Ok(())
    }

    pub fn all_clip_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM clip ORDER BY name")
            .map_err(db_err)?;
        let names = stmt
            .query_map([], |row| row.get(0))
            .map_err(db_err)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(db_err)?;
        Ok(names)
    }
}

fn db_err(e: rusqlite::Error) -> VerbaError {
    VerbaError::Database(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use verba_core::Word;

    fn sample_clip(name: &str) -> Clip {
        Clip {
            name: name.to_string(),
            vector_size: 2,
            window_size: 1024,
            window_stride: 512,
            words: vec![
                Word::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]]),
                Word::new(vec![vec![-0.5, 0.25]]),
                Word::default(),
            ],
        }
    }

    fn open_store(dir: &tempfile::TempDir) -> ClipStore {
        ClipStore::open(&dir.path().join("test.db")).unwrap()
    }

    #[test]
    fn clip_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);

        let clip = sample_clip("hello");
        store.add_clip(&clip).unwrap();

        let loaded = store.get_clip("hello").unwrap();
        assert_eq!(loaded, clip);
    }

    #[test]
    fn duplicate_add_fails_and_keeps_one_copy() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);

        store.add_clip(&sample_clip("hello")).unwrap();
        let err = store.add_clip(&sample_clip("hello")).unwrap_err();
        assert!(matches!(err, VerbaError::DuplicateClip(name) if name == "hello"));

        assert_eq!(store.all_clip_names().unwrap(), vec!["hello"]);
        assert_eq!(store.get_clip("hello").unwrap().words.len(), 3);
    }

    #[test]
    fn missing_clip_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        assert!(matches!(
            store.get_clip("ghost"),
            Err(VerbaError::NoSuchClip(name)) if name == "ghost"
        ));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);

        store.add_clip(&sample_clip("hello")).unwrap();
        store.remove_clip("hello").unwrap();
        assert!(store.all_clip_names().unwrap().is_empty());
        assert!(!store.clip_exists("hello").unwrap());

        // Removing again (or removing something never added) is fine.
        store.remove_clip("hello").unwrap();
        store.remove_clip("never-there").unwrap();
    }

    #[test]
    fn names_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        for name in ["zeta", "alpha", "mid"] {
            let mut clip = sample_clip(name);
            clip.words.clear();
            store.add_clip(&clip).unwrap();
        }
        assert_eq!(
            store.all_clip_names().unwrap(),
            vec!["alpha", "mid", "zeta"]
        );
    }

    #[test]
    fn gap_in_word_indices_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        store.add_clip(&sample_clip("hello")).unwrap();

        // Simulate corruption: drop the middle word row.
        store
            .conn
            .execute(
                "DELETE FROM word WHERE clip_name = 'hello' AND word_index = 1",
                [],
            )
            .unwrap();

        assert!(matches!(
            store.get_clip("hello"),
            Err(VerbaError::CorruptClip { .. })
        ));
    }

    #[test]
    fn truncated_blob_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        store.add_clip(&sample_clip("hello")).unwrap();

        store
            .conn
            .execute(
                "UPDATE word SET vectors = x'0200000000000000' WHERE word_index = 0",
                [],
            )
            .unwrap();

        assert!(matches!(
            store.get_clip("hello"),
            Err(VerbaError::CorruptWord { .. })
        ));
    }
}
