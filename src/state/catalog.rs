use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use super::data::{images_from_json, images_to_json, Subject, SubjectKind, VisitStats};
use crate::error::{CatalogError, Result};

/// A subject waiting to be inserted (no id/timestamp yet). Used by the
/// admin add-puppy path and by the seed installer.
#[derive(Debug, Clone)]
pub struct NewSubject {
    pub name: String,
    pub kind: SubjectKind,
    pub images: Vec<String>,
    pub is_sold: bool,
}

/// The Catalog manages the SQLite database behind the site:
/// subject records (parents and puppies) with their photo lists,
/// plus the page-visit log.
///
/// It is constructed explicitly with `open` and passed by reference to
/// every operation; there is no global connection handle.
pub struct Catalog {
    conn: Connection,
    db_path: PathBuf,
}

impl Catalog {
    /// Open (or create) the catalog database at `db_path` and make sure
    /// the schema exists.
    pub fn open(db_path: &Path) -> Result<Catalog> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| {
                    CatalogError::DirectoryUnreadable {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
        }

        let conn = Connection::open(db_path)?;

        let catalog = Catalog {
            conn,
            db_path: db_path.to_path_buf(),
        };
        catalog.init_schema()?;

        Ok(catalog)
    }

    /// Default database location in the user's data directory:
    /// - Linux: ~/.local/share/kennel-catalog/kennel.db
    /// - macOS: ~/Library/Application Support/kennel-catalog/kennel.db
    /// - Windows: %APPDATA%\kennel-catalog\kennel.db
    pub fn default_db_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .expect("Could not determine user data directory");

        path.push("kennel-catalog");
        path.push("kennel.db");
        path
    }

    /// Create tables and indexes if they don't exist.
    fn init_schema(&self) -> Result<()> {
        // One table for all subjects; parent and puppy rows are shaped
        // identically.
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS subjects (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                kind            TEXT NOT NULL CHECK (kind IN ('dam', 'sire', 'puppy')),
                images          TEXT NOT NULL,
                is_sold         BOOLEAN NOT NULL DEFAULT 0,
                created_at      INTEGER NOT NULL
            )",
            [],
        )?;

        // A puppy is addressed by its derived name, a parent by its kind;
        // this backs both uniqueness rules.
        self.conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_subjects_kind_name
             ON subjects(kind, name)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_subjects_created_at
             ON subjects(created_at DESC)",
            [],
        )?;

        // Page-view log, one row per tracked visit
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS visits (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                ip_address      TEXT NOT NULL,
                user_agent      TEXT NOT NULL,
                page            TEXT NOT NULL,
                visited_at      INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_visits_page ON visits(page)",
            [],
        )?;

        Ok(())
    }

    /// Total number of subjects (parents + puppies)
    pub fn subject_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM subjects", [], |row| row.get(0))?;
        Ok(count)
    }

    /// All puppies, newest first
    pub fn all_puppies(&self) -> Result<Vec<Subject>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, kind, images, is_sold, created_at
             FROM subjects
             WHERE kind = 'puppy'
             ORDER BY created_at DESC, id DESC",
        )?;

        let rows = stmt.query_map([], row_to_parts)?;

        let mut subjects = Vec::new();
        for row in rows {
            subjects.push(parts_to_subject(row?)?);
        }

        Ok(subjects)
    }

    /// The dam or sire record, if one has been created yet
    pub fn parent(&self, kind: SubjectKind) -> Result<Option<Subject>> {
        let parts = self
            .conn
            .query_row(
                "SELECT id, name, kind, images, is_sold, created_at
                 FROM subjects WHERE kind = ?1",
                [kind.as_str()],
                row_to_parts,
            )
            .optional()?;

        parts.map(parts_to_subject).transpose()
    }

    /// Look up a puppy by its derived display name
    pub fn puppy_by_name(&self, name: &str) -> Result<Option<Subject>> {
        let parts = self
            .conn
            .query_row(
                "SELECT id, name, kind, images, is_sold, created_at
                 FROM subjects WHERE kind = 'puppy' AND name = ?1",
                [name],
                row_to_parts,
            )
            .optional()?;

        parts.map(parts_to_subject).transpose()
    }

    /// Insert a subject and return its new ID
    pub fn insert_subject(
        &self,
        name: &str,
        kind: SubjectKind,
        images: &[String],
        is_sold: bool,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO subjects (name, kind, images, is_sold, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                name,
                kind.as_str(),
                images_to_json(images)?,
                is_sold,
                Utc::now().timestamp(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Admin "add puppy": new unsold puppy with an initial image list
    pub fn add_puppy(&self, name: &str, images: &[String]) -> Result<i64> {
        self.insert_subject(name, SubjectKind::Puppy, images, false)
    }

    /// Overwrite a subject's image list
    pub fn update_images(&self, id: i64, images: &[String]) -> Result<()> {
        self.conn.execute(
            "UPDATE subjects SET images = ?1 WHERE id = ?2",
            params![images_to_json(images)?, id],
        )?;
        Ok(())
    }

    /// Admin sold/available toggle. Sync never calls this.
    pub fn set_sold(&self, id: i64, is_sold: bool) -> Result<()> {
        self.conn.execute(
            "UPDATE subjects SET is_sold = ?1 WHERE id = ?2 AND kind = 'puppy'",
            params![is_sold, id],
        )?;
        Ok(())
    }

    /// Delete a puppy record. Parents cannot be deleted this way.
    pub fn delete_puppy(&self, id: i64) -> Result<()> {
        self.conn.execute(
            "DELETE FROM subjects WHERE id = ?1 AND kind = 'puppy'",
            [id],
        )?;
        Ok(())
    }

    /// Remove a single image path from a subject's list.
    /// A missing subject or a path not in the list is a no-op.
    pub fn remove_image(&self, id: i64, image_path: &str) -> Result<()> {
        let parts = self
            .conn
            .query_row(
                "SELECT id, name, kind, images, is_sold, created_at
                 FROM subjects WHERE id = ?1",
                [id],
                row_to_parts,
            )
            .optional()?;

        let Some(parts) = parts else {
            return Ok(());
        };

        let subject = parts_to_subject(parts)?;
        let remaining: Vec<String> = subject
            .images
            .into_iter()
            .filter(|img| img != image_path)
            .collect();

        self.update_images(id, &remaining)
    }

    /// Replace the entire subject set in one transaction.
    ///
    /// Either every row lands or the previous contents survive; a failure
    /// after the DELETE rolls the DELETE back too. This is the only
    /// multi-statement write in the crate and exists for seed reset.
    pub fn replace_all_subjects(&mut self, rows: &[NewSubject]) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM subjects", [])?;

        let now = Utc::now().timestamp();
        for row in rows {
            tx.execute(
                "INSERT INTO subjects (name, kind, images, is_sold, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.name,
                    row.kind.as_str(),
                    images_to_json(&row.images)?,
                    row.is_sold,
                    now,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Record one page view
    pub fn track_visit(&self, ip_address: &str, user_agent: &str, page: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO visits (ip_address, user_agent, page, visited_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![ip_address, user_agent, page, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    /// Aggregate the visit log for the admin page
    pub fn visit_stats(&self) -> Result<VisitStats> {
        let total_visits: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM visits", [], |row| row.get(0))?;

        let unique_visitors: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT ip_address) FROM visits",
            [],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT page, COUNT(*) AS visits
             FROM visits
             GROUP BY page
             ORDER BY visits DESC, page ASC",
        )?;

        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut by_page = Vec::new();
        for row in rows {
            by_page.push(row?);
        }

        Ok(VisitStats {
            total_visits,
            unique_visitors,
            by_page,
        })
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// Raw column values of one subject row, before the images column and
/// kind string are decoded.
type SubjectParts = (i64, String, String, String, bool, i64);

fn row_to_parts(row: &rusqlite::Row<'_>) -> rusqlite::Result<SubjectParts> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn parts_to_subject(parts: SubjectParts) -> Result<Subject> {
    let (id, name, kind, images, is_sold, created_at) = parts;

    let kind = SubjectKind::from_str(&kind).ok_or(CatalogError::InvalidKind(kind))?;

    Ok(Subject {
        id,
        name,
        kind,
        images: images_from_json(&images)?,
        is_sold,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_test_catalog(dir: &TempDir) -> Catalog {
        Catalog::open(&dir.path().join("test.db")).unwrap()
    }

    fn strings(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_add_and_fetch_puppy() {
        let dir = TempDir::new().unwrap();
        let catalog = open_test_catalog(&dir);

        let id = catalog
            .add_puppy("Gray", &strings(&["/dogs/gray/image1.jpg"]))
            .unwrap();

        let puppy = catalog.puppy_by_name("Gray").unwrap().unwrap();
        assert_eq!(puppy.id, id);
        assert_eq!(puppy.kind, SubjectKind::Puppy);
        assert_eq!(puppy.images, strings(&["/dogs/gray/image1.jpg"]));
        assert!(!puppy.is_sold);

        assert!(catalog.puppy_by_name("Nobody").unwrap().is_none());
    }

    #[test]
    fn test_parent_lookup() {
        let dir = TempDir::new().unwrap();
        let catalog = open_test_catalog(&dir);

        assert!(catalog.parent(SubjectKind::Dam).unwrap().is_none());

        catalog
            .insert_subject(
                "Queenie",
                SubjectKind::Dam,
                &strings(&["/dogs/dam/image1.jpg"]),
                false,
            )
            .unwrap();

        let dam = catalog.parent(SubjectKind::Dam).unwrap().unwrap();
        assert_eq!(dam.name, "Queenie");
        assert!(catalog.parent(SubjectKind::Sire).unwrap().is_none());
    }

    #[test]
    fn test_set_sold_and_delete() {
        let dir = TempDir::new().unwrap();
        let catalog = open_test_catalog(&dir);

        let id = catalog.add_puppy("Green", &strings(&["/dogs/green/image1.jpg"])).unwrap();

        catalog.set_sold(id, true).unwrap();
        assert!(catalog.puppy_by_name("Green").unwrap().unwrap().is_sold);

        catalog.delete_puppy(id).unwrap();
        assert!(catalog.puppy_by_name("Green").unwrap().is_none());
    }

    #[test]
    fn test_set_sold_leaves_parents_alone() {
        let dir = TempDir::new().unwrap();
        let catalog = open_test_catalog(&dir);

        let id = catalog
            .insert_subject("King", SubjectKind::Sire, &[], false)
            .unwrap();

        catalog.set_sold(id, true).unwrap();
        catalog.delete_puppy(id).unwrap();

        let sire = catalog.parent(SubjectKind::Sire).unwrap().unwrap();
        assert!(!sire.is_sold);
    }

    #[test]
    fn test_remove_image() {
        let dir = TempDir::new().unwrap();
        let catalog = open_test_catalog(&dir);

        let id = catalog
            .add_puppy(
                "Red",
                &strings(&["/dogs/red/image1.jpg", "/dogs/red/image2.jpg"]),
            )
            .unwrap();

        catalog.remove_image(id, "/dogs/red/image1.jpg").unwrap();
        let puppy = catalog.puppy_by_name("Red").unwrap().unwrap();
        assert_eq!(puppy.images, strings(&["/dogs/red/image2.jpg"]));

        // Unknown path and unknown subject are both no-ops
        catalog.remove_image(id, "/dogs/red/missing.jpg").unwrap();
        catalog.remove_image(9999, "/dogs/red/image2.jpg").unwrap();
        let puppy = catalog.puppy_by_name("Red").unwrap().unwrap();
        assert_eq!(puppy.images, strings(&["/dogs/red/image2.jpg"]));
    }

    #[test]
    fn test_all_puppies_excludes_parents() {
        let dir = TempDir::new().unwrap();
        let catalog = open_test_catalog(&dir);

        catalog
            .insert_subject("Queenie", SubjectKind::Dam, &[], false)
            .unwrap();
        catalog.add_puppy("Blue", &[]).unwrap();
        catalog.add_puppy("Sky", &[]).unwrap();

        let puppies = catalog.all_puppies().unwrap();
        assert_eq!(puppies.len(), 2);
        assert!(puppies.iter().all(|p| p.kind == SubjectKind::Puppy));
    }

    #[test]
    fn test_replace_all_subjects_swaps_contents() {
        let dir = TempDir::new().unwrap();
        let mut catalog = open_test_catalog(&dir);

        catalog.add_puppy("Old", &strings(&["/dogs/old/image1.jpg"])).unwrap();

        catalog
            .replace_all_subjects(&[NewSubject {
                name: "Fresh".to_string(),
                kind: SubjectKind::Puppy,
                images: strings(&["/dogs/fresh/image1.jpg"]),
                is_sold: false,
            }])
            .unwrap();

        assert!(catalog.puppy_by_name("Old").unwrap().is_none());
        assert!(catalog.puppy_by_name("Fresh").unwrap().is_some());
        assert_eq!(catalog.subject_count().unwrap(), 1);
    }

    #[test]
    fn test_replace_all_subjects_rolls_back_on_failure() {
        let dir = TempDir::new().unwrap();
        let mut catalog = open_test_catalog(&dir);

        catalog.add_puppy("Old", &strings(&["/dogs/old/image1.jpg"])).unwrap();

        // Second row violates the (kind, name) unique index, so the
        // insert fails after the DELETE has already run inside the
        // transaction. The old contents must survive untouched.
        let dup = NewSubject {
            name: "Twin".to_string(),
            kind: SubjectKind::Puppy,
            images: vec![],
            is_sold: false,
        };
        let result = catalog.replace_all_subjects(&[dup.clone(), dup]);
        assert!(result.is_err());

        assert_eq!(catalog.subject_count().unwrap(), 1);
        let old = catalog.puppy_by_name("Old").unwrap().unwrap();
        assert_eq!(old.images, strings(&["/dogs/old/image1.jpg"]));
        assert!(catalog.puppy_by_name("Twin").unwrap().is_none());
    }

    #[test]
    fn test_visit_stats() {
        let dir = TempDir::new().unwrap();
        let catalog = open_test_catalog(&dir);

        catalog.track_visit("10.0.0.1", "test-agent", "home").unwrap();
        catalog.track_visit("10.0.0.1", "test-agent", "home").unwrap();
        catalog.track_visit("10.0.0.2", "test-agent", "admin").unwrap();

        let stats = catalog.visit_stats().unwrap();
        assert_eq!(stats.total_visits, 3);
        assert_eq!(stats.unique_visitors, 2);
        assert_eq!(
            stats.by_page,
            vec![("home".to_string(), 2), ("admin".to_string(), 1)]
        );
    }
}
