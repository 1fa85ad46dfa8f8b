//! DOCX zip package I/O
//!
//! A package is kept as an ordered list of `(entry_name, bytes)` so that it can
//! be written back with the entry order Word expects (`[Content_Types].xml`
//! first). Media entries are stored, everything else is deflated.

use crate::domain::errors::DocumentError;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

/// In-memory OPC package
#[derive(Debug, Clone)]
pub struct DocxPackage {
    entries: Vec<PackageEntry>,
}

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    is_dir: bool,
}

impl DocxPackage {
    /// Reads a package from raw bytes, preserving entry order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| DocumentError::Archive(e.to_string()))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| DocumentError::Archive(e.to_string()))?;
            let name = entry.name().to_string();
            let is_dir = entry.is_dir();
            let mut data = Vec::new();
            if !is_dir {
                entry
                    .read_to_end(&mut data)
                    .map_err(|e| DocumentError::Archive(format!("{name}: {e}")))?;
            }
            entries.push(PackageEntry { name, data, is_dir });
        }

        Ok(Self { entries })
    }

    /// Writes the package back to zip bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for entry in &self.entries {
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), stored)
                    .map_err(|e| DocumentError::Archive(e.to_string()))?;
                continue;
            }
            let opts = if entry.name.starts_with("word/media/") {
                stored
            } else {
                deflated
            };
            zip.start_file(entry.name.as_str(), opts)
                .map_err(|e| DocumentError::Archive(e.to_string()))?;
            zip.write_all(&entry.data)
                .map_err(|e| DocumentError::Archive(e.to_string()))?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| DocumentError::Archive(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    /// Returns the bytes of a part, if present.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| !e.is_dir && e.name == name)
            .map(|e| e.data.as_slice())
    }

    /// Replaces (or appends) a part.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(PackageEntry {
                name: name.to_string(),
                data,
                is_dir: false,
            }),
        }
    }

    /// Names of all file entries, in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.name.as_str())
    }
}
