/// File categorization for routing new files into destination subfolders.
///
/// Maps a file extension to one of a fixed set of categories. The table is
/// plain data: an ordered list of (category, extensions) pairs plus a single
/// catch-all, so the lists can change without touching any dispatch logic.
///
/// # Examples
///
/// ```
/// use tidywatch::file_category::Category;
///
/// assert_eq!(Category::for_extension("png"), Category::Images);
/// assert_eq!(Category::for_extension("PDF"), Category::Documents);
/// assert_eq!(Category::for_extension("xyz"), Category::Others);
/// ```

/// A named bucket of related file extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Image files (JPG, PNG, GIF).
    Images,
    /// Document files (PDF, DOCX, TXT).
    Documents,
    /// Video files (MP4, AVI, MKV).
    Videos,
    /// Audio files (MP3, WAV, FLAC).
    Music,
    /// Archive files (ZIP, RAR, 7Z).
    Archives,
    /// Installers and executables (EXE, MSI, DMG).
    Programs,
    /// Everything else.
    Others,
}

/// Declared category order. Lookup walks this slice front to back and
/// returns on the first list containing the extension, so an extension
/// accidentally listed twice resolves to the earlier category.
const CATEGORY_EXTENSIONS: &[(Category, &[&str])] = &[
    (Category::Images, &["jpg", "jpeg", "png", "gif"]),
    (Category::Documents, &["pdf", "doc", "docx", "txt"]),
    (Category::Videos, &["mp4", "avi", "mkv"]),
    (Category::Music, &["mp3", "wav", "flac"]),
    (Category::Archives, &["zip", "rar", "7z"]),
    (Category::Programs, &["exe", "msi", "dmg"]),
];

impl Category {
    /// Returns the category for a file extension (without the leading dot).
    ///
    /// Lookup is case-insensitive. Empty and unrecognized extensions fall
    /// through to [`Category::Others`]. Total: this never fails.
    pub fn for_extension(extension: &str) -> Category {
        let extension = extension.to_lowercase();
        for (category, extensions) in CATEGORY_EXTENSIONS {
            if extensions.contains(&extension.as_str()) {
                return *category;
            }
        }
        Category::Others
    }

    /// Returns the destination directory name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use tidywatch::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "images");
    /// assert_eq!(Category::Others.dir_name(), "others");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "images",
            Category::Documents => "documents",
            Category::Videos => "videos",
            Category::Music => "music",
            Category::Archives => "archives",
            Category::Programs => "programs",
            Category::Others => "others",
        }
    }
}
