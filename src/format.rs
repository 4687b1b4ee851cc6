//! Format registry: logical document formats and their file extensions.
//!
//! A [`Format`] is a logical document type, distinct from the extension used
//! to store it (`.md` and `.markdown` are both [`Format::Markdown`]). The
//! tables below are the single source of truth for detection and for naming
//! output files; every lookup is a pure function over them.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A logical document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Pdf,
    Docx,
    Markdown,
    Html,
    Txt,
    Pptx,
    Xlsx,
}

impl Format {
    /// Every registered format, in registry order.
    pub const ALL: [Format; 7] = [
        Format::Pdf,
        Format::Docx,
        Format::Markdown,
        Format::Html,
        Format::Txt,
        Format::Pptx,
        Format::Xlsx,
    ];

    /// Formats that can be produced as conversion output.
    ///
    /// Presentation and spreadsheet files are source-only: they are read by
    /// the extraction engine but never written.
    pub const TARGETS: [Format; 5] = [
        Format::Pdf,
        Format::Docx,
        Format::Markdown,
        Format::Html,
        Format::Txt,
    ];

    /// Recognised extensions (lowercase, without the dot). The first entry
    /// is the canonical one.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Format::Pdf => &["pdf"],
            Format::Docx => &["docx", "doc"],
            Format::Markdown => &["md", "markdown"],
            Format::Html => &["html", "htm"],
            Format::Txt => &["txt", "text"],
            Format::Pptx => &["pptx"],
            Format::Xlsx => &["xlsx"],
        }
    }

    /// Canonical extension used when no explicit output path is given.
    pub fn default_extension(self) -> &'static str {
        self.extensions()[0]
    }

    /// Whether the format may be requested as a conversion target.
    pub fn is_supported_target(self) -> bool {
        Format::TARGETS.contains(&self)
    }

    /// Lowercase format name, as used on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Format::Pdf => "pdf",
            Format::Docx => "docx",
            Format::Markdown => "markdown",
            Format::Html => "html",
            Format::Txt => "txt",
            Format::Pptx => "pptx",
            Format::Xlsx => "xlsx",
        }
    }

    /// Look up the format owning an extension (case-insensitive, with or
    /// without a leading dot).
    pub fn from_extension(ext: &str) -> Option<Format> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        Format::ALL
            .into_iter()
            .find(|f| f.extensions().contains(&ext.as_str()))
    }

    /// Detect the format of `path` from its extension.
    ///
    /// # Errors
    /// [`ConvertError::UnsupportedExtension`] when the path has no extension
    /// or the extension is not registered.
    pub fn detect(path: &Path) -> Result<Format, ConvertError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        Format::from_extension(&ext).ok_or_else(|| ConvertError::UnsupportedExtension {
            path: path.to_path_buf(),
            extension: if ext.is_empty() {
                "<none>".to_string()
            } else {
                format!(".{ext}")
            },
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = ConvertError;

    /// Parse a format name. Accepts the canonical names, any registered
    /// extension, and the aliases `word` and `text`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches('.').to_ascii_lowercase();
        match name.as_str() {
            "pdf" => Ok(Format::Pdf),
            "docx" | "word" => Ok(Format::Docx),
            "markdown" => Ok(Format::Markdown),
            "html" => Ok(Format::Html),
            "txt" | "text" | "plain" => Ok(Format::Txt),
            "pptx" => Ok(Format::Pptx),
            "xlsx" => Ok(Format::Xlsx),
            other => Format::from_extension(other).ok_or_else(|| ConvertError::UnknownFormat {
                name: s.to_string(),
            }),
        }
    }
}

/// An ordered `(source, target)` conversion pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormatPair {
    pub source: Format,
    pub target: Format,
}

impl FormatPair {
    pub fn new(source: Format, target: Format) -> Self {
        Self { source, target }
    }

    /// Same format on both sides: served by a plain copy, not a strategy.
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }
}

impl fmt::Display for FormatPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn extension_mapping_is_a_function() {
        let mut owners: HashMap<&str, Format> = HashMap::new();
        for format in Format::ALL {
            assert!(!format.extensions().is_empty(), "{format} has no extensions");
            for ext in format.extensions() {
                if let Some(prev) = owners.insert(*ext, format) {
                    panic!(".{ext} is claimed by both {prev} and {format}");
                }
            }
        }
    }

    #[test]
    fn detect_is_case_insensitive() {
        assert_eq!(Format::detect(Path::new("a/REPORT.PDF")).unwrap(), Format::Pdf);
        assert_eq!(Format::detect(Path::new("notes.Markdown")).unwrap(), Format::Markdown);
        assert_eq!(Format::detect(Path::new("page.HTM")).unwrap(), Format::Html);
        assert_eq!(Format::detect(Path::new("legacy.doc")).unwrap(), Format::Docx);
    }

    #[test]
    fn detect_rejects_unknown_and_missing_extensions() {
        let err = Format::detect(Path::new("image.png")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnsupportedFormat);
        assert!(err.to_string().contains(".png"));

        let err = Format::detect(&PathBuf::from("Makefile")).unwrap_err();
        assert!(err.to_string().contains("<none>"));
    }

    #[test]
    fn canonical_extension_is_first() {
        assert_eq!(Format::Markdown.default_extension(), "md");
        assert_eq!(Format::Docx.default_extension(), "docx");
        assert_eq!(Format::Txt.default_extension(), "txt");
    }

    #[test]
    fn presentation_formats_are_source_only() {
        assert!(!Format::Pptx.is_supported_target());
        assert!(!Format::Xlsx.is_supported_target());
        for f in Format::TARGETS {
            assert!(f.is_supported_target());
        }
    }

    #[test]
    fn parse_names_and_aliases() {
        assert_eq!("Markdown".parse::<Format>().unwrap(), Format::Markdown);
        assert_eq!("md".parse::<Format>().unwrap(), Format::Markdown);
        assert_eq!(".htm".parse::<Format>().unwrap(), Format::Html);
        assert_eq!("text".parse::<Format>().unwrap(), Format::Txt);
        assert_eq!("word".parse::<Format>().unwrap(), Format::Docx);
        assert!("odt".parse::<Format>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Format::Markdown).unwrap(), "\"markdown\"");
        let f: Format = serde_json::from_str("\"txt\"").unwrap();
        assert_eq!(f, Format::Txt);
    }
}
