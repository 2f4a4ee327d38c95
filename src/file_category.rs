/// File categorization by extension.
///
/// This module holds the category table that decides which subdirectory a file
/// is moved into. Lookups are case-insensitive and walk the table in declaration
/// order, so the first category that claims an extension wins.
///
/// # Examples
///
/// ```
/// use autosort::file_category::{Category, FileMapper};
///
/// let mapper = FileMapper::default();
/// assert_eq!(mapper.classify("holiday.JPG"), Category::Images);
/// assert_eq!(mapper.classify("notes.txt"), Category::Documents);
/// assert_eq!(mapper.classify("README"), Category::Others);
/// ```
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A destination bucket for organized files.
///
/// `Others` has no extensions of its own; it receives everything the other
/// categories do not claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Image files (JPG, PNG, GIF, etc.)
    Images,
    /// Video files (MP4, MKV, AVI, etc.)
    Videos,
    /// Documents, including office formats and CSV
    Documents,
    /// Audio files (MP3, WAV, FLAC, etc.)
    Music,
    /// Archive files (ZIP, RAR, 7Z, etc.)
    Archives,
    /// Source code and markup
    Code,
    /// Installers, packages and scripts
    Executables,
    /// Anything not matched by another category
    Others,
}

impl Category {
    /// All categories in table declaration order, `Others` last.
    pub const ALL: [Category; 8] = [
        Category::Images,
        Category::Videos,
        Category::Documents,
        Category::Music,
        Category::Archives,
        Category::Code,
        Category::Executables,
        Category::Others,
    ];

    /// Returns the directory name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use autosort::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "Images");
    /// assert_eq!(Category::Others.dir_name(), "Others");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Videos => "Videos",
            Category::Documents => "Documents",
            Category::Music => "Music",
            Category::Archives => "Archives",
            Category::Code => "Code",
            Category::Executables => "Executables",
            Category::Others => "Others",
        }
    }

    /// Extensions recognized for this category out of the box.
    fn standard_extensions(&self) -> &'static [&'static str] {
        match self {
            Category::Images => &[
                ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".svg", ".webp",
            ],
            Category::Videos => &[
                ".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".webm", ".m4v",
            ],
            Category::Documents => &[
                ".pdf", ".docx", ".doc", ".txt", ".xlsx", ".pptx", ".csv", ".rtf", ".odt",
            ],
            Category::Music => &[".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma", ".m4a"],
            Category::Archives => &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2"],
            Category::Code => &[
                ".py", ".js", ".html", ".css", ".java", ".cpp", ".c", ".php", ".rb", ".json",
                ".xml",
            ],
            Category::Executables => &[".exe", ".msi", ".bat", ".sh", ".deb", ".rpm"],
            Category::Others => &[],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Parses a category name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .find(|category| category.dir_name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Maps file extensions to categories.
///
/// The table is an ordered list rather than a hash map: when two categories
/// claim the same extension the earlier one wins.
#[derive(Debug, Clone)]
pub struct FileMapper {
    table: Vec<(Category, Vec<String>)>,
}

impl FileMapper {
    /// Creates a new `FileMapper` with the standard table.
    pub fn new() -> Self {
        let table = Category::ALL
            .iter()
            .map(|category| {
                let extensions = category
                    .standard_extensions()
                    .iter()
                    .map(|ext| ext.to_string())
                    .collect();
                (*category, extensions)
            })
            .collect();
        Self { table }
    }

    /// Adds an extension to a category.
    ///
    /// The extension is stored lowercase with a leading dot, so `"HEIC"` and
    /// `".heic"` are equivalent. Adding an extension to `Others` is a no-op
    /// since `Others` is the fallback anyway.
    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        if category == Category::Others {
            return;
        }
        let normalized = normalize_extension(ext);
        if normalized.len() < 2 {
            return;
        }
        if let Some((_, extensions)) = self.table.iter_mut().find(|(c, _)| *c == category)
            && !extensions.contains(&normalized)
        {
            extensions.push(normalized);
        }
    }

    /// Maps an extension (with or without the leading dot) to a category.
    ///
    /// Returns `None` when no category claims it.
    ///
    /// # Examples
    ///
    /// ```
    /// use autosort::file_category::{Category, FileMapper};
    ///
    /// let mapper = FileMapper::default();
    /// assert_eq!(mapper.extension_to_category(".PDF"), Some(Category::Documents));
    /// assert_eq!(mapper.extension_to_category("mp3"), Some(Category::Music));
    /// assert_eq!(mapper.extension_to_category("xyz"), None);
    /// ```
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        let normalized = normalize_extension(ext);
        self.table
            .iter()
            .find(|(_, extensions)| extensions.contains(&normalized))
            .map(|(category, _)| *category)
    }

    /// Determines the category for a file name.
    ///
    /// The extension is whatever follows the last dot. Names without one,
    /// dotfiles such as `.bashrc`, and unknown extensions all land in
    /// `Category::Others`.
    pub fn classify(&self, filename: &str) -> Category {
        Path::new(filename)
            .extension()
            .map(|ext| ext.to_string_lossy())
            .filter(|ext| !ext.is_empty())
            .and_then(|ext| self.extension_to_category(&ext))
            .unwrap_or(Category::Others)
    }

    /// Returns the extensions currently mapped to `category`.
    pub fn extensions(&self, category: Category) -> &[String] {
        self.table
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, extensions)| extensions.as_slice())
            .unwrap_or(&[])
    }

    /// Iterates over the table in declaration order.
    pub fn categories(&self) -> impl Iterator<Item = (Category, &[String])> + '_ {
        self.table
            .iter()
            .map(|(category, extensions)| (*category, extensions.as_slice()))
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_extension(ext: &str) -> String {
    let lower = ext.trim().to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}
