//! Extension-based classification into the three category folders.
//!
//! The extension table is data, not logic: callers may layer their own
//! `extension → category` overrides on top of the defaults. Extensions that
//! neither table mentions always fall back to [`Category::Other`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Fixed classification buckets.
///
/// Serialized by variant name; the aliases accept the folder labels written
/// by earlier versions of the ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Category {
    #[serde(alias = "Dossier technique", alias = "technical")]
    TechnicalDocument,
    #[serde(alias = "Correspondance", alias = "correspondence")]
    Correspondence,
    #[serde(alias = "Autres fichiers", alias = "other")]
    Other,
}

impl Category {
    /// Every category, in folder-creation order.
    pub const ALL: [Category; 3] = [
        Category::TechnicalDocument,
        Category::Correspondence,
        Category::Other,
    ];

    /// Name of the output folder holding this category.
    pub fn folder_name(self) -> &'static str {
        match self {
            Category::TechnicalDocument => "Dossier technique",
            Category::Correspondence => "Correspondance",
            Category::Other => "Autres fichiers",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.folder_name())
    }
}

const TECHNICAL_EXTENSIONS: &[&str] = &[
    "pdf", "dwg", "dxf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "zip",
    "rar",
];

const CORRESPONDENCE_EXTENSIONS: &[&str] = &["msg", "eml"];

/// Static extension lookup with optional caller overrides.
#[derive(Debug, Clone)]
pub struct CategoryPolicy {
    table: HashMap<String, Category>,
}

impl Default for CategoryPolicy {
    fn default() -> Self {
        let mut table = HashMap::new();
        for ext in TECHNICAL_EXTENSIONS {
            table.insert((*ext).to_string(), Category::TechnicalDocument);
        }
        for ext in CORRESPONDENCE_EXTENSIONS {
            table.insert((*ext).to_string(), Category::Correspondence);
        }
        Self { table }
    }
}

impl CategoryPolicy {
    /// Default table with `overrides` applied on top.
    ///
    /// Keys are normalized the same way lookups are (`".PDF"` == `"pdf"`).
    pub fn with_overrides(overrides: &HashMap<String, Category>) -> Self {
        let mut policy = Self::default();
        for (ext, category) in overrides {
            let key = normalize_extension(ext);
            if !key.is_empty() {
                policy.table.insert(key, *category);
            }
        }
        policy
    }

    /// Category for a bare extension, with or without the leading dot.
    pub fn category_for(&self, extension: &str) -> Category {
        self.table
            .get(&normalize_extension(extension))
            .copied()
            .unwrap_or(Category::Other)
    }

    /// Category for a file path, using its extension.
    pub fn category_for_path(&self, path: &Path) -> Category {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.category_for(ext)
    }
}

/// Where the three category folders live.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    base: PathBuf,
}

impl OutputLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Folder for `category` under the base directory.
    pub fn folder(&self, category: Category) -> PathBuf {
        self.base.join(category.folder_name())
    }

    /// Create every category folder. Existing content is left alone.
    pub fn ensure(&self) -> std::io::Result<()> {
        for category in Category::ALL {
            std::fs::create_dir_all(self.folder(category))?;
        }
        Ok(())
    }

    /// `true` when `path` is one of the category folders.
    pub fn is_category_folder(&self, path: &Path) -> bool {
        Category::ALL.iter().any(|c| self.folder(*c) == path)
    }
}

/// Lowercase an extension and drop any leading dots.
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}
