//! File-level XML document IO. Writes are plain truncating writes; crash
//! safety comes from the backup protocol in the loader.

use std::fs;
use std::path::Path;

use syncd_domain::xml::{self, Element};

use crate::error::StoreError;

pub(crate) fn read_document(path: &Path) -> Result<Element, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path).map_err(|source| StoreError::io(path, source))?;
    xml::parse_document(&raw).map_err(|err| StoreError::MalformedXml {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

pub(crate) fn write_document(path: &Path, root: &Element) -> Result<(), StoreError> {
    let rendered = xml::write_document(root).map_err(|err| StoreError::MalformedXml {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    fs::write(path, rendered).map_err(|source| StoreError::io(path, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn distinguishes_missing_unreadable_and_malformed() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let missing = temp.path().join("missing.xml");
        assert!(matches!(
            read_document(&missing),
            Err(StoreError::NotFound(_))
        ));

        let malformed = temp.path().join("malformed.xml");
        fs::write(&malformed, "<profile name=")?;
        assert!(matches!(
            read_document(&malformed),
            Err(StoreError::MalformedXml { .. })
        ));
        Ok(())
    }

    #[test]
    fn writes_with_prolog_and_reads_back() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("doc.xml");
        let mut root = Element::new("profile");
        root.set_attr("name", "foo");
        root.set_attr("type", "sync");
        write_document(&path, &root)?;

        let raw = fs::read_to_string(&path)?;
        assert!(raw.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert_eq!(read_document(&path)?, root);
        Ok(())
    }
}
