use std::path::PathBuf;

use crate::error::{TwibbonError, TwibbonResult};

/// Ordered list of preset frame names resolvable under a base path.
///
/// The engine treats this as an opaque external list; it only consumes
/// (name -> resolvable raster path) pairs in catalog order.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FrameCatalog {
    /// Base directory the entry names resolve against.
    pub base: PathBuf,
    /// Entry file names, in display order.
    pub names: Vec<String>,
}

impl FrameCatalog {
    /// Load and validate a catalog manifest from JSON.
    pub fn from_reader(r: impl std::io::Read) -> TwibbonResult<Self> {
        let catalog: Self = serde_json::from_reader(r)
            .map_err(|e| TwibbonError::validation(format!("parse catalog manifest: {e}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> TwibbonResult<()> {
        for name in &self.names {
            normalize_entry_name(name)?;
        }
        Ok(())
    }

    /// Entry names in catalog order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Resolve a catalog entry to its asset path.
    ///
    /// Unknown names are rejected: the catalog is the whole universe of
    /// presets.
    pub fn resolve(&self, name: &str) -> TwibbonResult<PathBuf> {
        if !self.names.iter().any(|n| n == name) {
            return Err(TwibbonError::validation(format!(
                "unknown catalog frame '{name}'"
            )));
        }
        let norm = normalize_entry_name(name)?;
        Ok(self.base.join(norm))
    }
}

/// Which frame source is active. Exactly one mode is selected at a time;
/// switching modes supersedes the frame slot's in-flight load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameSelection {
    /// A named entry from the external preset catalog.
    Preset(String),
    /// A user-supplied raster.
    Upload,
}

/// Normalize and validate a catalog entry name.
///
/// Uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
fn normalize_entry_name(name: &str) -> TwibbonResult<String> {
    let s = name.replace('\\', "/");
    if s.starts_with('/') {
        return Err(TwibbonError::validation(
            "catalog entry names must be relative",
        ));
    }
    if s.is_empty() {
        return Err(TwibbonError::validation(
            "catalog entry name must be non-empty",
        ));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(TwibbonError::validation(
                "catalog entry names must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(TwibbonError::validation(
            "catalog entry name must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_catalog() -> FrameCatalog {
        FrameCatalog {
            base: PathBuf::from("frames"),
            names: vec![
                "frame1.png".to_string(),
                "frame2.png".to_string(),
                "frame3.png".to_string(),
                "frame4.png".to_string(),
            ],
        }
    }

    #[test]
    fn json_roundtrip_preserves_order() {
        let catalog = basic_catalog();
        let s = serde_json::to_string(&catalog).unwrap();
        let de = FrameCatalog::from_reader(s.as_bytes()).unwrap();
        assert_eq!(de.names(), catalog.names());
    }

    #[test]
    fn resolve_joins_base_and_name() {
        let catalog = basic_catalog();
        assert_eq!(
            catalog.resolve("frame2.png").unwrap(),
            PathBuf::from("frames/frame2.png")
        );
    }

    #[test]
    fn resolve_rejects_unknown_names() {
        assert!(basic_catalog().resolve("surprise.png").is_err());
    }

    #[test]
    fn validate_rejects_traversal_and_absolute_entries() {
        let mut catalog = basic_catalog();
        catalog.names.push("../../etc/passwd".to_string());
        assert!(catalog.validate().is_err());

        let mut catalog = basic_catalog();
        catalog.names.push("/abs.png".to_string());
        assert!(catalog.validate().is_err());

        let mut catalog = basic_catalog();
        catalog.names.push(String::new());
        assert!(catalog.validate().is_err());
    }
}
