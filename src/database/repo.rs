use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::database::schema::{PRAGMAS, SCHEMA};
use crate::error::{Result, StoreError};
use crate::ingest::hasher;
use crate::utils::config::StoreConfig;
use crate::wallpaper::Wallpaper;

/// A tag name together with the number of wallpapers carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSummary {
    pub name: String,
    pub count: i64,
}

/// Owns the single connection to the wallpaper/tag database.
///
/// Every mutation runs in its own transaction, so readers never see a
/// half-applied add, remove or update.
pub struct TagStore {
    conn: Connection,
    verify_on_read: bool,
}

impl TagStore {
    /// Opens the database at `config.db_path`, creating the schema if needed.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let conn = Connection::open(&config.db_path)?;
        conn.execute_batch(PRAGMAS)?;
        conn.execute_batch(SCHEMA)?;
        debug!("Opened tag store at {:?}", config.db_path);
        Ok(Self {
            conn,
            verify_on_read: config.verify_on_read,
        })
    }

    /// Starts tracking `wallpaper` under its tags.
    ///
    /// Fails with `DuplicateAsset` if a wallpaper with the same content hash
    /// is already tracked, whatever its path.
    pub fn add(&mut self, wallpaper: &Wallpaper) -> Result<()> {
        let tags = validate_tags(&wallpaper.tags)?;

        let tx = self.conn.transaction()?;
        let id = insert_wallpaper(&tx, wallpaper, &tags)?;
        tx.commit()?;

        info!("Added {:?} as #{} with {} tag(s)", wallpaper.path, id, tags.len());
        Ok(())
    }

    /// All wallpapers tagged `tag`, in insertion order, each with its full tag set.
    ///
    /// Records are rebuilt from stored rows only, so a wallpaper whose file
    /// has since moved is still listed under its last known path.
    pub fn get(&self, tag: &str) -> Result<Vec<Wallpaper>> {
        let tx = self.conn.unchecked_transaction()?;

        let rows = {
            let mut stmt = tx.prepare(
                "SELECT w.id, w.path, w.hash
                 FROM wallpapers w
                 JOIN wallpaper_tags wt ON wt.wallpaper_id = w.id
                 JOIN tags t ON t.id = wt.tag_id
                 WHERE t.name = ?1
                 ORDER BY w.id",
            )?;
            let rows = stmt
                .query_map(params![tag], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let mut wallpapers = Vec::with_capacity(rows.len());
        for (id, path, hash) in rows {
            wallpapers.push(Wallpaper {
                path: PathBuf::from(path),
                hash,
                tags: tags_for(&tx, id)?,
            });
        }

        debug!("Tag '{}' matched {} wallpaper(s)", tag, wallpapers.len());
        Ok(wallpapers)
    }

    /// Resolves the wallpaper stored under exactly `path`.
    ///
    /// With `verify_on_read` the file is re-hashed: it must still exist and
    /// still match the stored digest.
    pub fn read_wp(&self, path: &Path) -> Result<Wallpaper> {
        let wallpaper = self.lookup(path)?;

        if self.verify_on_read {
            let actual = hasher::calculate_hash(path)?;
            if actual != wallpaper.hash {
                warn!("Content of {:?} no longer matches its stored hash", path);
                return Err(StoreError::HashMismatch {
                    path: wallpaper.path,
                    stored: wallpaper.hash,
                    actual,
                });
            }
        }

        Ok(wallpaper)
    }

    /// The stored record for `path`, trusting the stored hash. The file does
    /// not need to exist, so a deleted file can still be passed to `remove`.
    pub fn lookup(&self, path: &Path) -> Result<Wallpaper> {
        let path_str = utf8_path(path)?;
        let tx = self.conn.unchecked_transaction()?;

        let (id, hash): (i64, String) = tx
            .query_row(
                "SELECT id, hash FROM wallpapers WHERE path = ?1 ORDER BY id DESC LIMIT 1",
                params![path_str],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| StoreError::AssetNotFound(path_str.to_string()))?;
        let tags = tags_for(&tx, id)?;

        debug!("Resolved {:?} as #{}", path, id);
        Ok(Wallpaper {
            path: path.to_path_buf(),
            hash,
            tags,
        })
    }

    /// Stops tracking the wallpaper with `wallpaper.hash`, then drops any tag
    /// left without wallpapers. The stored path is not consulted.
    pub fn remove(&mut self, wallpaper: &Wallpaper) -> Result<()> {
        let tx = self.conn.transaction()?;
        let orphans = delete_wallpaper(&tx, &wallpaper.hash)?;
        tx.commit()?;

        info!("Removed {} ({} orphaned tag(s) dropped)", wallpaper.hash, orphans);
        Ok(())
    }

    /// Replaces `old` with `new` atomically.
    ///
    /// If adding `new` fails the transaction is rolled back and `old` stays
    /// tracked exactly as before.
    pub fn update(&mut self, old: &Wallpaper, new: &Wallpaper) -> Result<()> {
        let tags = validate_tags(&new.tags)?;

        let tx = self.conn.transaction()?;
        delete_wallpaper(&tx, &old.hash)?;
        let id = insert_wallpaper(&tx, new, &tags)?;
        tx.commit()?;

        info!("Updated {:?} -> {:?} (#{})", old.path, new.path, id);
        Ok(())
    }

    /// Points the wallpaper with `wallpaper.hash` at `wallpaper.path`, keeping
    /// its tags. Returns the path that was stored before.
    pub fn relocate(&mut self, wallpaper: &Wallpaper) -> Result<PathBuf> {
        let path_str = utf8_path(&wallpaper.path)?;
        if !wallpaper.path.is_file() {
            return Err(StoreError::AssetNotFound(wallpaper.path.display().to_string()));
        }

        let tx = self.conn.transaction()?;
        let (id, previous) = tx
            .query_row(
                "SELECT id, path FROM wallpapers WHERE hash = ?1",
                params![wallpaper.hash],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?
            .ok_or_else(|| StoreError::AssetNotFound(wallpaper.hash.clone()))?;

        tx.execute(
            "UPDATE wallpapers SET path = ?1 WHERE id = ?2",
            params![path_str, id],
        )?;
        tx.commit()?;

        info!("Relocated #{} from {:?} to {:?}", id, previous, wallpaper.path);
        Ok(PathBuf::from(previous))
    }

    /// Every tag in the store with its wallpaper count, by name.
    pub fn tags(&self) -> Result<Vec<TagSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name, COUNT(wt.wallpaper_id)
             FROM tags t
             LEFT JOIN wallpaper_tags wt ON wt.tag_id = t.id
             GROUP BY t.id
             ORDER BY t.name",
        )?;
        let summaries = stmt
            .query_map([], |row| {
                Ok(TagSummary {
                    name: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(summaries)
    }
}

/// Paths are stored as text; anything not valid UTF-8 could never be matched
/// again by `lookup`.
fn utf8_path(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        StoreError::ValidationError(format!("path is not valid UTF-8: {:?}", path))
    })
}

fn validate_tags(tags: &[String]) -> Result<BTreeSet<&str>> {
    let mut set = BTreeSet::new();
    for tag in tags {
        if tag.trim().is_empty() {
            return Err(StoreError::ValidationError("tag names must not be empty".into()));
        }
        set.insert(tag.as_str());
    }
    Ok(set)
}

fn insert_wallpaper(conn: &Connection, wallpaper: &Wallpaper, tags: &BTreeSet<&str>) -> Result<i64> {
    if wallpaper.hash.is_empty() {
        return Err(StoreError::ValidationError("content hash must not be empty".into()));
    }
    let path_str = utf8_path(&wallpaper.path)?;
    // The file may have vanished since the Wallpaper was built.
    if !wallpaper.path.is_file() {
        return Err(StoreError::AssetNotFound(wallpaper.path.display().to_string()));
    }

    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM wallpapers WHERE hash = ?1",
            params![wallpaper.hash],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Err(StoreError::DuplicateAsset(wallpaper.hash.clone()));
    }

    let wallpaper_id: i64 = conn.query_row(
        "INSERT INTO wallpapers (path, hash) VALUES (?1, ?2) RETURNING id",
        params![path_str, wallpaper.hash],
        |row| row.get(0),
    )?;

    let mut stmt_tag = conn.prepare("INSERT OR IGNORE INTO tags (name) VALUES (?1)")?;
    let mut stmt_get_tag_id = conn.prepare("SELECT id FROM tags WHERE name = ?1")?;
    let mut stmt_wallpaper_tag = conn.prepare(
        "INSERT OR IGNORE INTO wallpaper_tags (wallpaper_id, tag_id) VALUES (?1, ?2)",
    )?;

    for tag in tags {
        stmt_tag.execute(params![tag])?;
        let tag_id: i64 = stmt_get_tag_id.query_row(params![tag], |row| row.get(0))?;
        stmt_wallpaper_tag.execute(params![wallpaper_id, tag_id])?;
    }

    Ok(wallpaper_id)
}

/// Deletes the wallpaper with `hash` and its associations, then garbage
/// collects orphaned tags. Returns how many tags were dropped.
fn delete_wallpaper(conn: &Connection, hash: &str) -> Result<usize> {
    let wallpaper_id: i64 = conn
        .query_row(
            "SELECT id FROM wallpapers WHERE hash = ?1",
            params![hash],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| StoreError::AssetNotFound(hash.to_string()))?;

    conn.execute("DELETE FROM wallpaper_tags WHERE wallpaper_id = ?1", params![wallpaper_id])?;
    conn.execute("DELETE FROM wallpapers WHERE id = ?1", params![wallpaper_id])?;
    let orphans = conn.execute(
        "DELETE FROM tags WHERE id NOT IN (SELECT tag_id FROM wallpaper_tags)",
        [],
    )?;
    Ok(orphans)
}

fn tags_for(conn: &Connection, wallpaper_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM tags t
         JOIN wallpaper_tags wt ON wt.tag_id = t.id
         WHERE wt.wallpaper_id = ?1
         ORDER BY t.name",
    )?;
    let tags = stmt
        .query_map(params![wallpaper_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(tags)
}
