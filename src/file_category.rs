/// Type categories used when sorting files into folders.
///
/// The extension decides first. Files whose extension is missing or unknown
/// are sniffed with `infer` and categorized by MIME type.
///
/// # Examples
///
/// ```
/// use hidenseek::file_category::{Category, FileMapper};
///
/// let mapper = FileMapper::default();
/// assert_eq!(mapper.extension_to_category("JPG"), Some(Category::Image));
/// assert_eq!(mapper.mime_to_category("audio/mpeg"), Some(Category::Audio));
/// assert_eq!(mapper.categorize(None, None), Category::Other);
/// ```
use std::collections::HashMap;
use std::path::Path;

/// Broad file category, one sort folder each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Image,
    Audio,
    Video,
    Document,
    Archive,
    Code,
    Spreadsheet,
    Presentation,
    Font,
    Other,
}

impl Category {
    /// Folder name for this category.
    ///
    /// ```
    /// use hidenseek::file_category::Category;
    ///
    /// assert_eq!(Category::Image.dir_name(), "images");
    /// assert_eq!(Category::Other.dir_name(), "other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Image => "images",
            Category::Audio => "audio",
            Category::Video => "videos",
            Category::Document => "documents",
            Category::Archive => "archives",
            Category::Code => "code",
            Category::Spreadsheet => "spreadsheets",
            Category::Presentation => "presentations",
            Category::Font => "fonts",
            Category::Other => "other",
        }
    }
}

const EXTENSIONS: &[(Category, &[&str])] = &[
    (
        Category::Image,
        &[
            "png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "tif", "tiff", "ico", "heic",
            "heif", "raw",
        ],
    ),
    (
        Category::Audio,
        &["mp3", "wav", "ogg", "flac", "aac", "m4a", "wma", "opus"],
    ),
    (
        Category::Video,
        &["mp4", "mkv", "avi", "mov", "flv", "wmv", "webm", "3gp", "m4v"],
    ),
    (
        Category::Document,
        &["pdf", "txt", "doc", "docx", "html", "htm", "md", "rtf", "odt", "epub"],
    ),
    (
        Category::Archive,
        &["zip", "rar", "7z", "tar", "gz", "bz2", "xz", "zst"],
    ),
    (
        Category::Code,
        &[
            "py", "java", "c", "cpp", "h", "hpp", "js", "ts", "rs", "go", "sh", "bash", "json",
            "xml", "yaml", "yml", "toml",
        ],
    ),
    (Category::Spreadsheet, &["csv", "xls", "xlsx", "ods"]),
    (Category::Presentation, &["ppt", "pptx", "odp", "key"]),
    (Category::Font, &["ttf", "otf", "woff", "woff2"]),
];

// Full MIME types first; a bare top-level type acts as a prefix fallback.
const MIME_TYPES: &[(&str, Category)] = &[
    ("application/pdf", Category::Document),
    ("application/msword", Category::Document),
    ("application/rtf", Category::Document),
    ("application/epub+zip", Category::Document),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Category::Document,
    ),
    ("application/vnd.oasis.opendocument.text", Category::Document),
    ("application/zip", Category::Archive),
    ("application/vnd.rar", Category::Archive),
    ("application/x-rar-compressed", Category::Archive),
    ("application/x-7z-compressed", Category::Archive),
    ("application/x-tar", Category::Archive),
    ("application/gzip", Category::Archive),
    ("application/x-bzip2", Category::Archive),
    ("application/x-xz", Category::Archive),
    ("application/zstd", Category::Archive),
    ("application/vnd.ms-excel", Category::Spreadsheet),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Category::Spreadsheet,
    ),
    ("application/vnd.oasis.opendocument.spreadsheet", Category::Spreadsheet),
    ("application/vnd.ms-powerpoint", Category::Presentation),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        Category::Presentation,
    ),
    ("application/vnd.oasis.opendocument.presentation", Category::Presentation),
    ("application/font-woff", Category::Font),
    ("application/wasm", Category::Code),
    ("text/x-shellscript", Category::Code),
    ("image", Category::Image),
    ("audio", Category::Audio),
    ("video", Category::Video),
    ("font", Category::Font),
    ("text", Category::Document),
];

/// Maps extensions and MIME types to categories.
#[derive(Debug, Clone)]
pub struct FileMapper {
    mime_map: HashMap<String, Category>,
    extension_map: HashMap<String, Category>,
}

impl FileMapper {
    /// Creates a mapper with the standard tables.
    pub fn new() -> Self {
        let mut mapper = Self {
            mime_map: HashMap::new(),
            extension_map: HashMap::new(),
        };
        for (category, extensions) in EXTENSIONS {
            for ext in *extensions {
                mapper.add_extension_mapping(ext, *category);
            }
        }
        for (mime, category) in MIME_TYPES {
            mapper.add_mime_mapping(mime, *category);
        }
        mapper
    }

    pub fn add_mime_mapping(&mut self, mime: &str, category: Category) {
        self.mime_map.insert(mime.to_lowercase(), category);
    }

    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        self.extension_map.insert(ext.to_lowercase(), category);
    }

    /// Case-insensitive extension lookup.
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        self.extension_map.get(&ext.to_lowercase()).copied()
    }

    /// MIME lookup: exact type, then its top-level type.
    pub fn mime_to_category(&self, mime_type: &str) -> Option<Category> {
        let mime = mime_type.to_lowercase();
        if let Some(category) = self.mime_map.get(&mime) {
            return Some(*category);
        }
        let top_level = mime.split('/').next()?;
        self.mime_map.get(top_level).copied()
    }

    /// Extension first, then MIME type, then `Other`.
    pub fn categorize(&self, ext: Option<&str>, mime_type: Option<&str>) -> Category {
        if let Some(extension) = ext
            && let Some(category) = self.extension_to_category(extension)
        {
            return category;
        }

        if let Some(mime) = mime_type
            && let Some(category) = self.mime_to_category(mime)
        {
            return category;
        }

        Category::Other
    }

    /// Categorizes a file on disk, reading its header only when the
    /// extension does not settle it.
    pub fn categorize_path(&self, path: &Path) -> Category {
        let ext = path.extension().and_then(|e| e.to_str());
        if let Some(category) = ext.and_then(|e| self.extension_to_category(e)) {
            return category;
        }

        let sniffed = infer::get_from_path(path).ok().flatten();
        self.categorize(ext, sniffed.map(|kind| kind.mime_type()))
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_category_dir_names() {
        assert_eq!(Category::Image.dir_name(), "images");
        assert_eq!(Category::Audio.dir_name(), "audio");
        assert_eq!(Category::Video.dir_name(), "videos");
        assert_eq!(Category::Document.dir_name(), "documents");
        assert_eq!(Category::Archive.dir_name(), "archives");
        assert_eq!(Category::Code.dir_name(), "code");
        assert_eq!(Category::Spreadsheet.dir_name(), "spreadsheets");
        assert_eq!(Category::Presentation.dir_name(), "presentations");
        assert_eq!(Category::Font.dir_name(), "fonts");
        assert_eq!(Category::Other.dir_name(), "other");
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let mapper = FileMapper::default();
        assert_eq!(mapper.extension_to_category("PDF"), Some(Category::Document));
        assert_eq!(mapper.extension_to_category("Mp3"), Some(Category::Audio));
        assert_eq!(mapper.extension_to_category("xyz"), None);
    }

    #[test]
    fn test_mime_top_level_fallback() {
        let mapper = FileMapper::default();
        assert_eq!(mapper.mime_to_category("image/x-canon-cr2"), Some(Category::Image));
        assert_eq!(mapper.mime_to_category("application/zip"), Some(Category::Archive));
        assert_eq!(mapper.mime_to_category("application/x-unknown"), None);
    }

    #[test]
    fn test_extension_beats_mime() {
        let mapper = FileMapper::default();
        assert_eq!(
            mapper.categorize(Some("txt"), Some("image/png")),
            Category::Document
        );
        assert_eq!(mapper.categorize(Some("xyz"), Some("image/png")), Category::Image);
        assert_eq!(mapper.categorize(Some("xyz"), None), Category::Other);
    }

    #[test]
    fn test_categorize_path_by_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("holiday.JPG");
        fs::write(&path, "not really a jpeg").unwrap();

        assert_eq!(FileMapper::default().categorize_path(&path), Category::Image);
    }

    #[test]
    fn test_categorize_path_sniffs_content_without_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("scan");
        let png_header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        fs::write(&path, png_header).unwrap();

        assert_eq!(FileMapper::default().categorize_path(&path), Category::Image);
    }

    #[test]
    fn test_categorize_path_unknown() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("blob");
        fs::write(&path, "plain bytes").unwrap();

        assert_eq!(FileMapper::default().categorize_path(&path), Category::Other);
    }

    #[test]
    fn test_custom_mapping() {
        let mut mapper = FileMapper::default();
        mapper.add_extension_mapping("NEF", Category::Image);
        assert_eq!(mapper.extension_to_category("nef"), Some(Category::Image));
    }
}
