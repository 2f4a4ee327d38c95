/// File organization: moving a folder's files into category directories.
///
/// This module enumerates the top-level files of a source directory, moves each
/// one into `<source>/<Category>/` and records every successful move so the
/// batch can be undone later.
use crate::activity_log::ActivityLog;
use crate::error::{OrganizeError, Result};
use crate::file_category::{Category, FileMapper};
use crate::progress::ProgressSink;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Record of one completed file move.
///
/// Serialized field names follow the state file format (`source`,
/// `destination`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOperation {
    /// Name of the file, unchanged by the move.
    pub filename: String,
    /// Directory the file was taken from.
    #[serde(rename = "source")]
    pub source_dir: PathBuf,
    /// Category directory the file was moved into.
    #[serde(rename = "destination")]
    pub destination_dir: PathBuf,
    /// When the move happened.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Parses a stored timestamp.
///
/// RFC 3339 is what `save` writes. Older state files carry ISO 8601 local
/// times without an offset (`2025-01-02T10:11:12.123456`); those are read in
/// the local time zone.
pub fn parse_timestamp(text: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(text) {
        return Ok(with_offset.with_timezone(&Utc));
    }
    let naive = text
        .parse::<NaiveDateTime>()
        .map_err(|e| format!("invalid timestamp '{}': {}", text, e))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| format!("timestamp '{}' does not exist in local time", text))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_timestamp(&text).map_err(serde::de::Error::custom)
}

impl MoveOperation {
    /// Where the file lives after the move.
    pub fn moved_path(&self) -> PathBuf {
        self.destination_dir.join(&self.filename)
    }

    /// Where the file lived before the move.
    pub fn original_path(&self) -> PathBuf {
        self.source_dir.join(&self.filename)
    }
}

/// All moves produced by one organize run.
///
/// A batch only exists when at least one file was moved. It is never changed
/// after creation; undo removes it whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "source")]
    pub source_dir: PathBuf,
    pub operations: Vec<MoveOperation>,
    pub total_moved: usize,
    pub total_files: usize,
}

impl Batch {
    fn new(source_dir: &Path, operations: Vec<MoveOperation>, total_files: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            source_dir: source_dir.to_path_buf(),
            total_moved: operations.len(),
            operations,
            total_files,
        }
    }

    /// One-line summary for history listings, in local time.
    ///
    /// Example: `2025-11-09 14:30: 3 files moved in /home/me/Downloads`
    pub fn describe(&self) -> String {
        format!(
            "{}: {} {} moved in {}",
            self.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            self.total_moved,
            if self.total_moved == 1 { "file" } else { "files" },
            self.source_dir.display()
        )
    }
}

/// Counts reported back to the caller after an organize run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrganizeResult {
    /// Regular files found at the top level of the source directory.
    pub total_files: usize,
    /// Files actually moved.
    pub moved_count: usize,
    /// Files whose move failed and were left in place.
    pub failed_count: usize,
}

/// What started an organize run. Scheduled runs are logged differently so
/// they can be told apart in the activity log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Trigger {
    #[default]
    Manual,
    Scheduled,
}

impl Trigger {
    fn moved_message(self, filename: &str, category: Category) -> String {
        match self {
            Trigger::Manual => format!("Moved: {} -> {}", filename, category),
            Trigger::Scheduled => format!("Scheduled move: {} -> {}", filename, category),
        }
    }

    fn failed_message(self, filename: &str, error: &OrganizeError) -> String {
        match self {
            Trigger::Manual => format!("Error moving {}: {}", filename, error),
            Trigger::Scheduled => format!("Error in scheduled move for {}: {}", filename, error),
        }
    }
}

/// Where a file would go, as computed by a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub filename: String,
    pub category: Category,
}

/// Organizes files by moving them into category subdirectories.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Lists the regular files directly inside `source_dir`, sorted by name.
    ///
    /// Subdirectories are not descended into. Paths in `skip` must be
    /// canonical; matching files are left out of the listing.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::Directory` if `source_dir` cannot be read.
    pub fn list_files(source_dir: &Path, skip: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(source_dir).map_err(|e| OrganizeError::Directory {
            path: source_dir.to_path_buf(),
            source: e,
        })?;

        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| fs::metadata(path).map(|m| m.is_file()).unwrap_or(false))
            .filter(|path| {
                skip.is_empty()
                    || fs::canonicalize(path)
                        .map(|canonical| !skip.contains(&canonical))
                        .unwrap_or(true)
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Moves a file into its category directory and records the operation.
    ///
    /// The category directory is created when missing. An existing file with
    /// the same name in the category directory is never overwritten: the move
    /// fails with `ErrorKind::AlreadyExists` and the source file stays put.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use autosort::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let op = FileOrganizer::move_to_category_with_record(
    ///     Path::new("/path/to/base"),
    ///     Path::new("/path/to/base/image.png"),
    ///     "Images",
    /// );
    ///
    /// match op {
    ///     Ok(op) => println!("Moved {}", op.moved_path().display()),
    ///     Err(e) => eprintln!("Organization failed: {}", e),
    /// }
    /// ```
    pub fn move_to_category_with_record(
        source_dir: &Path,
        file_path: &Path,
        category_dir_name: &str,
    ) -> Result<MoveOperation> {
        if !source_dir.is_dir() {
            return Err(OrganizeError::Directory {
                path: source_dir.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "source directory does not exist",
                ),
            });
        }

        let category_path = source_dir.join(category_dir_name);

        let file_name = file_path
            .file_name()
            .ok_or_else(|| OrganizeError::MoveFailure {
                from: file_path.to_path_buf(),
                to: category_path.clone(),
                cause: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "file has no name component",
                ),
            })?;

        fs::create_dir_all(&category_path).map_err(|e| {
            OrganizeError::DirectoryCreationFailed {
                path: category_path.clone(),
                source: e,
            }
        })?;

        let destination_path = category_path.join(file_name);
        if destination_path.symlink_metadata().is_ok() {
            return Err(OrganizeError::MoveFailure {
                from: file_path.to_path_buf(),
                to: destination_path,
                cause: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "a file with that name already exists in the category folder",
                ),
            });
        }

        fs::rename(file_path, &destination_path).map_err(|e| OrganizeError::MoveFailure {
            from: file_path.to_path_buf(),
            to: destination_path.clone(),
            cause: e,
        })?;

        Ok(MoveOperation {
            filename: file_name.to_string_lossy().into_owned(),
            source_dir: source_dir.to_path_buf(),
            destination_dir: category_path,
            timestamp: Utc::now(),
        })
    }

    /// Resolves `source_dir` to the absolute, symlink-free path that gets
    /// recorded, so a batch can be undone from any working directory.
    ///
    /// # Errors
    ///
    /// `OrganizeError::Directory` if the path does not exist.
    pub fn resolve_source(source_dir: &Path) -> Result<PathBuf> {
        fs::canonicalize(source_dir).map_err(|e| OrganizeError::Directory {
            path: source_dir.to_path_buf(),
            source: e,
        })
    }

    /// Organizes every top-level file of `source_dir`.
    ///
    /// Files are processed one at a time in name order. A failed move is
    /// logged and counted but does not stop the run. Returns the counts and,
    /// when at least one file moved, the batch to append to the history.
    /// Paths in the batch are absolute even when `source_dir` is relative.
    ///
    /// # Errors
    ///
    /// Only `OrganizeError::Directory`, raised before any file is touched.
    pub fn organize_directory(
        source_dir: &Path,
        trigger: Trigger,
        mapper: &FileMapper,
        skip: &[PathBuf],
        log: &ActivityLog,
        progress: &mut dyn ProgressSink,
    ) -> Result<(OrganizeResult, Option<Batch>)> {
        let source_dir = Self::resolve_source(source_dir)?;
        let source_dir = source_dir.as_path();
        let files = Self::list_files(source_dir, skip)?;
        let total_files = files.len();
        let mut result = OrganizeResult {
            total_files,
            ..Default::default()
        };

        if total_files == 0 {
            return Ok((result, None));
        }

        let mut operations = Vec::with_capacity(total_files);
        for (index, file_path) in files.iter().enumerate() {
            let filename = file_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let category = mapper.classify(&filename);

            match Self::move_to_category_with_record(source_dir, file_path, category.dir_name()) {
                Ok(operation) => {
                    log.info(&trigger.moved_message(&filename, category));
                    operations.push(operation);
                    result.moved_count += 1;
                }
                Err(e) => {
                    log.error(&trigger.failed_message(&filename, &e));
                    result.failed_count += 1;
                }
            }

            progress.update(index + 1, total_files);
        }

        let batch = (!operations.is_empty()).then(|| Batch::new(source_dir, operations, total_files));
        Ok((result, batch))
    }

    /// Computes where each file would go without touching the filesystem.
    pub fn preview(
        source_dir: &Path,
        mapper: &FileMapper,
        skip: &[PathBuf],
    ) -> Result<Vec<PlannedMove>> {
        let source_dir = Self::resolve_source(source_dir)?;
        let files = Self::list_files(&source_dir, skip)?;
        Ok(files
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| {
                let filename = name.to_string_lossy().into_owned();
                let category = mapper.classify(&filename);
                PlannedMove { filename, category }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn quiet_log(dir: &TempDir) -> ActivityLog {
        ActivityLog::new(dir.path().join("activity.log"))
    }

    #[test]
    fn test_move_to_category_creates_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let file_path = base_path.join("test.txt");
        fs::write(&file_path, "test content").expect("Failed to write test file");

        let op = FileOrganizer::move_to_category_with_record(base_path, &file_path, "Documents")
            .expect("Failed to move file");

        let category_dir = base_path.join("Documents");
        assert!(category_dir.is_dir());
        assert!(!file_path.exists());
        assert!(category_dir.join("test.txt").exists());

        assert_eq!(op.filename, "test.txt");
        assert_eq!(op.source_dir, base_path);
        assert_eq!(op.destination_dir, category_dir);
        assert_eq!(op.original_path(), file_path);
    }

    #[test]
    fn test_move_to_category_uses_existing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        let category_dir = base_path.join("Images");
        fs::create_dir(&category_dir).expect("Failed to create category directory");

        let file_path = base_path.join("test.png");
        fs::write(&file_path, "test content").expect("Failed to write test file");

        FileOrganizer::move_to_category_with_record(base_path, &file_path, "Images")
            .expect("Failed to move file");

        assert!(!file_path.exists());
        assert!(category_dir.join("test.png").exists());
    }

    #[test]
    fn test_move_to_category_invalid_base_path() {
        let non_existent = Path::new("/non/existent/path");
        let file_path = Path::new("/some/file.txt");

        let result = FileOrganizer::move_to_category_with_record(non_existent, file_path, "Documents");
        assert!(matches!(result, Err(OrganizeError::Directory { .. })));
    }

    #[test]
    fn test_move_refuses_to_overwrite_existing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();

        fs::create_dir(base_path.join("Documents")).expect("Failed to create category directory");
        fs::write(base_path.join("Documents/b.txt"), "already sorted").expect("write failed");
        fs::write(base_path.join("b.txt"), "new arrival").expect("write failed");

        let result =
            FileOrganizer::move_to_category_with_record(base_path, &base_path.join("b.txt"), "Documents");

        match result {
            Err(OrganizeError::MoveFailure { cause, .. }) => {
                assert_eq!(cause.kind(), std::io::ErrorKind::AlreadyExists);
            }
            other => panic!("expected MoveFailure, got {:?}", other),
        }
        assert_eq!(
            fs::read_to_string(base_path.join("Documents/b.txt")).expect("read failed"),
            "already sorted"
        );
        assert_eq!(
            fs::read_to_string(base_path.join("b.txt")).expect("read failed"),
            "new arrival"
        );
    }

    #[test]
    fn test_list_files_skips_directories_and_sorts() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("b.txt"), "").expect("write failed");
        fs::write(base_path.join("a.jpg"), "").expect("write failed");
        fs::create_dir(base_path.join("nested")).expect("mkdir failed");
        fs::write(base_path.join("nested/inner.txt"), "").expect("write failed");

        let files = FileOrganizer::list_files(base_path, &[]).expect("list failed");
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.txt"]);
    }

    #[test]
    fn test_list_files_honours_skip_list() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("state.json"), "{}").expect("write failed");
        fs::write(base_path.join("photo.png"), "").expect("write failed");

        let skip = vec![fs::canonicalize(base_path.join("state.json")).expect("canonicalize failed")];
        let files = FileOrganizer::list_files(base_path, &skip).expect("list failed");
        assert_eq!(files, vec![base_path.join("photo.png")]);
    }

    #[test]
    fn test_organize_directory_scenario() {
        let source = TempDir::new().expect("Failed to create temp directory");
        let logs = TempDir::new().expect("Failed to create temp directory");
        let log = quiet_log(&logs);
        for name in ["a.jpg", "b.txt", "c.xyz"] {
            fs::write(source.path().join(name), name).expect("write failed");
        }

        let mut updates = Vec::new();
        let (result, batch) = FileOrganizer::organize_directory(
            source.path(),
            Trigger::Manual,
            &FileMapper::default(),
            &[],
            &log,
            &mut |current: usize, total: usize| updates.push((current, total)),
        )
        .expect("organize failed");

        assert_eq!(
            result,
            OrganizeResult {
                total_files: 3,
                moved_count: 3,
                failed_count: 0
            }
        );
        assert!(source.path().join("Images/a.jpg").is_file());
        assert!(source.path().join("Documents/b.txt").is_file());
        assert!(source.path().join("Others/c.xyz").is_file());
        assert_eq!(updates, vec![(1, 3), (2, 3), (3, 3)]);

        let batch = batch.expect("a batch should be recorded");
        assert_eq!(batch.total_moved, 3);
        assert_eq!(batch.total_files, 3);
        let names: Vec<_> = batch.operations.iter().map(|op| op.filename.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.txt", "c.xyz"]);

        let log_text = log.read_all().expect("read failed");
        assert!(log_text.contains("Moved: a.jpg -> Images"));
        assert!(log_text.contains("Moved: c.xyz -> Others"));
    }

    #[test]
    fn test_organize_empty_directory_records_nothing() {
        let source = TempDir::new().expect("Failed to create temp directory");
        let logs = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(source.path().join("just_a_folder")).expect("mkdir failed");

        let (result, batch) = FileOrganizer::organize_directory(
            source.path(),
            Trigger::Manual,
            &FileMapper::default(),
            &[],
            &quiet_log(&logs),
            &mut |_: usize, _: usize| {},
        )
        .expect("organize failed");

        assert_eq!(result, OrganizeResult::default());
        assert!(batch.is_none());
    }

    #[test]
    fn test_organize_continues_after_a_failed_move() {
        let source = TempDir::new().expect("Failed to create temp directory");
        let logs = TempDir::new().expect("Failed to create temp directory");
        let log = quiet_log(&logs);
        fs::create_dir(source.path().join("Documents")).expect("mkdir failed");
        fs::write(source.path().join("Documents/b.txt"), "old").expect("write failed");
        fs::write(source.path().join("b.txt"), "new").expect("write failed");
        fs::write(source.path().join("c.png"), "").expect("write failed");

        let (result, batch) = FileOrganizer::organize_directory(
            source.path(),
            Trigger::Manual,
            &FileMapper::default(),
            &[],
            &log,
            &mut |_: usize, _: usize| {},
        )
        .expect("organize failed");

        assert_eq!(result.total_files, 2);
        assert_eq!(result.moved_count, 1);
        assert_eq!(result.failed_count, 1);
        let batch = batch.expect("one file moved");
        assert_eq!(batch.operations.len(), 1);
        assert_eq!(batch.operations[0].filename, "c.png");
        assert!(source.path().join("b.txt").exists());
        assert!(log.read_all().expect("read failed").contains("ERROR: Error moving b.txt"));
    }

    #[test]
    fn test_organize_missing_directory_fails() {
        let logs = TempDir::new().expect("Failed to create temp directory");
        let result = FileOrganizer::organize_directory(
            Path::new("/non/existent/path"),
            Trigger::Manual,
            &FileMapper::default(),
            &[],
            &quiet_log(&logs),
            &mut |_: usize, _: usize| {},
        );
        assert!(matches!(result, Err(OrganizeError::Directory { .. })));
    }

    #[test]
    fn test_preview_does_not_touch_files() {
        let source = TempDir::new().expect("Failed to create temp directory");
        fs::write(source.path().join("song.MP3"), "").expect("write failed");
        fs::write(source.path().join("notes"), "").expect("write failed");

        let plan = FileOrganizer::preview(source.path(), &FileMapper::default(), &[])
            .expect("preview failed");

        assert_eq!(
            plan,
            vec![
                PlannedMove {
                    filename: "notes".to_string(),
                    category: Category::Others
                },
                PlannedMove {
                    filename: "song.MP3".to_string(),
                    category: Category::Music
                },
            ]
        );
        assert!(source.path().join("song.MP3").exists());
        assert!(!source.path().join("Music").exists());
    }

    #[test]
    fn test_organize_records_absolute_paths() {
        let source = TempDir::new().expect("Failed to create temp directory");
        let logs = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(source.path().join("inbox")).expect("mkdir failed");
        fs::write(source.path().join("inbox/a.jpg"), "").expect("write failed");
        // `inbox/../inbox` is the same folder, spelled indirectly.
        let indirect = source.path().join("inbox").join("..").join("inbox");

        let (_, batch) = FileOrganizer::organize_directory(
            &indirect,
            Trigger::Manual,
            &FileMapper::default(),
            &[],
            &quiet_log(&logs),
            &mut |_: usize, _: usize| {},
        )
        .expect("organize failed");

        let batch = batch.expect("one file moved");
        let canonical = fs::canonicalize(source.path().join("inbox")).expect("canonicalize failed");
        assert_eq!(batch.source_dir, canonical);
        assert_eq!(batch.operations[0].source_dir, canonical);
        assert_eq!(batch.operations[0].destination_dir, canonical.join("Images"));
    }

    #[test]
    fn test_scheduled_runs_use_their_own_log_wording() {
        let source = TempDir::new().expect("Failed to create temp directory");
        let logs = TempDir::new().expect("Failed to create temp directory");
        let log = quiet_log(&logs);
        fs::create_dir(source.path().join("Documents")).expect("mkdir failed");
        fs::write(source.path().join("Documents/b.txt"), "old").expect("write failed");
        fs::write(source.path().join("b.txt"), "new").expect("write failed");
        fs::write(source.path().join("c.png"), "").expect("write failed");

        FileOrganizer::organize_directory(
            source.path(),
            Trigger::Scheduled,
            &FileMapper::default(),
            &[],
            &log,
            &mut |_: usize, _: usize| {},
        )
        .expect("organize failed");

        let log_text = log.read_all().expect("read failed");
        assert!(log_text.contains("Scheduled move: c.png -> Images"));
        assert!(log_text.contains("ERROR: Error in scheduled move for b.txt"));
        assert!(!log_text.contains("Moved: c.png"));
    }

    #[test]
    fn test_parse_timestamp_accepts_both_formats() {
        let utc = parse_timestamp("2025-01-02T10:11:12.123456+00:00").expect("rfc3339");
        assert_eq!(utc.to_rfc3339(), "2025-01-02T10:11:12.123456+00:00");

        let naive = "2025-01-02T10:11:12.123456"
            .parse::<NaiveDateTime>()
            .expect("naive");
        let local = parse_timestamp("2025-01-02T10:11:12.123456").expect("local time");
        assert_eq!(local.with_timezone(&Local).naive_local(), naive);
        assert!(parse_timestamp("2025-01-02T10:11:12").is_ok());

        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_batch_describe() {
        let batch = Batch::new(Path::new("/downloads"), Vec::new(), 2);
        let line = batch.describe();
        assert!(line.ends_with(": 0 files moved in /downloads"));
    }
}
