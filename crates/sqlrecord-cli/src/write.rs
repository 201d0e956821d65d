//! Syncing a rendered catalog into its output directory.
//!
//! Every table gets a status against what is on disk. Generated files whose
//! table is no longer configured are removed; anything without the
//! generated header is left alone.

use crate::catalog::{GeneratedFile, generated_table};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Apply every change.
    Write,
    /// Report changes without touching the filesystem.
    DryRun,
    /// Fail if anything would change.
    Check,
}

impl SyncMode {
    pub fn from_flags(dry_run: bool, check: bool) -> Self {
        if dry_run {
            SyncMode::DryRun
        } else if check {
            SyncMode::Check
        } else {
            SyncMode::Write
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileStatus {
    Created,
    Updated,
    Removed,
    Unchanged,
}

impl FileStatus {
    fn as_str(self) -> &'static str {
        match self {
            FileStatus::Created => "created",
            FileStatus::Updated => "updated",
            FileStatus::Removed => "removed",
            FileStatus::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogChange {
    pub table: String,
    pub path: PathBuf,
    pub status: FileStatus,
}

#[derive(Debug, Default)]
pub struct SyncSummary {
    /// One entry per table, sorted by path.
    pub changes: Vec<CatalogChange>,
    /// Whether the changes were applied to disk.
    pub applied: bool,
}

impl SyncSummary {
    pub fn count(&self, status: FileStatus) -> usize {
        self.changes.iter().filter(|c| c.status == status).count()
    }

    /// Changes other than [`FileStatus::Unchanged`].
    pub fn pending(&self) -> impl Iterator<Item = &CatalogChange> {
        self.changes
            .iter()
            .filter(|c| c.status != FileStatus::Unchanged)
    }

    pub fn is_clean(&self) -> bool {
        self.pending().next().is_none()
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = [
            FileStatus::Created,
            FileStatus::Updated,
            FileStatus::Removed,
            FileStatus::Unchanged,
        ]
        .map(|s| format!("{} {s}", self.count(s)));
        let tables = self.changes.len() - self.count(FileStatus::Removed);
        write!(f, "{tables} tables: {}", counts.join(", "))
    }
}

/// Compare `files` with `out_dir` and, in [`SyncMode::Write`], apply the
/// difference.
pub fn sync_catalog(
    out_dir: &Path,
    files: &[GeneratedFile],
    mode: SyncMode,
) -> anyhow::Result<SyncSummary> {
    let mut changes = Vec::with_capacity(files.len());
    for f in files {
        let status = match std::fs::read_to_string(&f.path) {
            Ok(existing) if existing == f.content => FileStatus::Unchanged,
            Ok(_) => FileStatus::Updated,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileStatus::Created,
            Err(e) => anyhow::bail!("failed to read {}: {e}", f.path.display()),
        };
        changes.push(CatalogChange {
            table: f.table.clone(),
            path: f.path.clone(),
            status,
        });
    }
    changes.extend(stale_files(out_dir, files)?);
    changes.sort_by(|a, b| a.path.cmp(&b.path));

    let mut summary = SyncSummary {
        changes,
        applied: false,
    };

    match mode {
        SyncMode::DryRun => {}
        SyncMode::Check => {
            if !summary.is_clean() {
                let list = summary
                    .pending()
                    .map(|c| format!("{} ({})", c.table, c.status))
                    .collect::<Vec<_>>()
                    .join(", ");
                anyhow::bail!("generated catalog is out of date: {list}");
            }
        }
        SyncMode::Write => {
            for f in files {
                if summary.pending().any(|c| c.path == f.path) {
                    write_atomic(&f.path, &f.content)?;
                }
            }
            for c in &summary.changes {
                if c.status == FileStatus::Removed {
                    std::fs::remove_file(&c.path).map_err(|e| {
                        anyhow::anyhow!("failed to remove {}: {e}", c.path.display())
                    })?;
                }
            }
            summary.applied = true;
        }
    }

    Ok(summary)
}

/// Generated `.sql` files in `out_dir` that no current table owns.
fn stale_files(out_dir: &Path, files: &[GeneratedFile]) -> anyhow::Result<Vec<CatalogChange>> {
    let entries = match std::fs::read_dir(out_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => anyhow::bail!("failed to read directory {}: {e}", out_dir.display()),
    };
    let current: HashSet<&Path> = files.iter().map(|f| f.path.as_path()).collect();

    let mut stale = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| anyhow::anyhow!("failed to read directory {}: {e}", out_dir.display()))?
            .path();
        if path.extension().and_then(|e| e.to_str()) != Some("sql")
            || !path.is_file()
            || current.contains(path.as_path())
        {
            continue;
        }
        // Unreadable files are not ours to delete.
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        if let Some(table) = generated_table(&content) {
            stale.push(CatalogChange {
                table: table.to_string(),
                path,
                status: FileStatus::Removed,
            });
        }
    }
    Ok(stale)
}

fn write_atomic(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("failed to create directory {}: {e}", parent.display()))?;
    }

    let tmp = tmp_path(path);
    std::fs::write(&tmp, content)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", tmp.display()))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        anyhow::anyhow!(
            "failed to rename {} -> {}: {e}",
            tmp.display(),
            path.display()
        )
    })?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => path.with_extension(format!("{ext}.tmp")),
        None => path.with_extension("tmp"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::HEADER;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "sqlrecord-sync-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn file(dir: &Path, table: &str, body: &str) -> GeneratedFile {
        GeneratedFile {
            table: table.to_string(),
            path: dir.join(format!("{table}.sql")),
            content: format!("{HEADER}\n-- table: {table}\n\n{body}\n"),
        }
    }

    fn statuses(summary: &SyncSummary) -> Vec<(&str, FileStatus)> {
        summary
            .changes
            .iter()
            .map(|c| (c.table.as_str(), c.status))
            .collect()
    }

    #[test]
    fn tmp_path_keeps_extension() {
        assert_eq!(tmp_path(Path::new("a/b.sql")), PathBuf::from("a/b.sql.tmp"));
        assert_eq!(tmp_path(Path::new("a/b")), PathBuf::from("a/b.tmp"));
    }

    #[test]
    fn mode_from_flags() {
        assert_eq!(SyncMode::from_flags(false, false), SyncMode::Write);
        assert_eq!(SyncMode::from_flags(true, true), SyncMode::DryRun);
        assert_eq!(SyncMode::from_flags(false, true), SyncMode::Check);
    }

    #[test]
    fn dry_run_and_check_leave_disk_alone() {
        let dir = scratch_dir("fresh");
        let files = vec![file(&dir.join("nested"), "t", "SELECT 1;")];

        assert!(sync_catalog(&dir, &files, SyncMode::Check).is_err());

        let dry = sync_catalog(&dir, &files, SyncMode::DryRun).unwrap();
        assert_eq!(statuses(&dry), vec![("t", FileStatus::Created)]);
        assert!(!dry.applied);
        assert!(!files[0].path.exists());

        let written = sync_catalog(&dir, &files, SyncMode::Write).unwrap();
        assert!(written.applied);
        assert_eq!(std::fs::read_to_string(&files[0].path).unwrap(), files[0].content);

        let clean = sync_catalog(&dir, &files, SyncMode::Check).unwrap();
        assert!(clean.is_clean());
        assert_eq!(clean.to_string(), "1 tables: 0 created, 0 updated, 0 removed, 1 unchanged");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn dropped_tables_are_pruned() {
        let dir = scratch_dir("prune");
        let first = vec![
            file(&dir, "a", "SELECT 1;"),
            file(&dir, "b", "SELECT 2;"),
            file(&dir, "c", "SELECT 3;"),
        ];
        sync_catalog(&dir, &first, SyncMode::Write).unwrap();
        std::fs::write(dir.join("manual.sql"), "SELECT 42;\n").unwrap();

        let second = vec![file(&dir, "a", "SELECT 1;"), file(&dir, "b", "SELECT 22;")];
        let err = sync_catalog(&dir, &second, SyncMode::Check).unwrap_err();
        assert!(err.to_string().contains("b (updated), c (removed)"), "{err}");

        let summary = sync_catalog(&dir, &second, SyncMode::Write).unwrap();
        assert_eq!(
            statuses(&summary),
            vec![
                ("a", FileStatus::Unchanged),
                ("b", FileStatus::Updated),
                ("c", FileStatus::Removed),
            ]
        );
        assert_eq!(summary.to_string(), "2 tables: 0 created, 1 updated, 1 removed, 1 unchanged");
        assert!(!dir.join("c.sql").exists());
        assert!(dir.join("manual.sql").exists());
        assert!(sync_catalog(&dir, &second, SyncMode::Check).unwrap().is_clean());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
