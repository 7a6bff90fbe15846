//! The ZIP container of an OOXML package.

use deck_core::{Error, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// One entry of the archive, kept as read.
#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    last_modified: DateTime,
    is_dir: bool,
}

/// All entries of a package, in archive order.
#[derive(Debug, Clone)]
pub struct Package {
    entries: Vec<PackageEntry>,
}

impl Package {
    /// Read every entry of the archive into memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", index, e)))?;

            // The declared size is untrusted; never reserve more than the archive holds.
            let mut contents = Vec::with_capacity((file.size() as usize).min(data.len()));
            file.read_to_end(&mut contents)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", file.name(), e)))?;

            entries.push(PackageEntry {
                name: file.name().to_string(),
                data: contents,
                compression: file.compression(),
                last_modified: file.last_modified(),
                is_dir: file.is_dir(),
            });
        }

        log::debug!("Opened package with {} entries", entries.len());

        Ok(Self { entries })
    }

    /// The stored name of the entry matching `name`.
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.entry(name).map(|e| e.name.as_str())
    }

    /// Whether the package holds a part with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Raw bytes of a part.
    pub fn read(&self, name: &str) -> Result<&[u8]> {
        self.entry(name)
            .map(|e| e.data.as_slice())
            .ok_or_else(|| Error::MissingPart(name.to_string()))
    }

    /// A part decoded as UTF-8 text.
    pub fn read_string(&self, name: &str) -> Result<String> {
        let bytes = self.read(name)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::XmlError(format!("'{}' is not valid UTF-8: {}", name, e)))
    }

    /// Serialize the package, substituting the given part contents.
    ///
    /// Entries keep their order, compression and timestamps.
    pub fn to_bytes_with(&self, replacements: &HashMap<String, Vec<u8>>) -> Result<Vec<u8>> {
        if let Some(name) = replacements
            .keys()
            .find(|name| !self.entries.iter().any(|e| &e.name == *name))
        {
            return Err(Error::Processing(format!("no package entry named '{}'", name)));
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for entry in &self.entries {
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = FileOptions::default()
                .compression_method(method)
                .last_modified_time(entry.last_modified);

            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options).map_err(zip_write_error)?;
                continue;
            }

            let data = replacements.get(&entry.name).unwrap_or(&entry.data);
            zip.start_file(entry.name.as_str(), options.large_file(data.len() as u64 >= u32::MAX as u64))
                .map_err(zip_write_error)?;
            zip.write_all(data)?;
        }

        let cursor = zip.finish().map_err(zip_write_error)?;
        Ok(cursor.into_inner())
    }

    fn entry(&self, name: &str) -> Option<&PackageEntry> {
        // Part names are case-insensitive in OPC.
        self.entries
            .iter()
            .find(|e| e.name == name)
            .or_else(|| self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(name)))
    }
}

fn zip_write_error(e: zip::result::ZipError) -> Error {
    Error::ZipError(format!("Failed to write ZIP: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive(files: &[(&str, &str, CompressionMethod)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content, method) in files {
            zip.start_file(*name, FileOptions::default().compression_method(*method))
                .unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_rejects_non_zip() {
        let err = Package::from_bytes(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, Error::ZipError(_)));
    }

    #[test]
    fn test_read_and_lookup() {
        let bytes = archive(&[
            ("[Content_Types].xml", "<Types/>", CompressionMethod::Deflated),
            ("ppt/presentation.xml", "<p:presentation/>", CompressionMethod::Stored),
        ]);
        let package = Package::from_bytes(&bytes).unwrap();

        assert!(package.contains("ppt/presentation.xml"));
        assert!(package.contains("PPT/Presentation.xml"));
        assert_eq!(
            package.canonical_name("PPT/Presentation.xml"),
            Some("ppt/presentation.xml")
        );
        assert_eq!(package.canonical_name("ppt/other.xml"), None);
        assert_eq!(package.read_string("ppt/presentation.xml").unwrap(), "<p:presentation/>");
        assert!(matches!(
            package.read("ppt/missing.xml"),
            Err(Error::MissingPart(_))
        ));
    }

    #[test]
    fn test_rewrite_keeps_order_and_compression() {
        let bytes = archive(&[
            ("a.xml", "<a/>", CompressionMethod::Stored),
            ("b.xml", "<b/>", CompressionMethod::Deflated),
        ]);
        let package = Package::from_bytes(&bytes).unwrap();

        let mut replacements = HashMap::new();
        replacements.insert("b.xml".to_string(), b"<b>new</b>".to_vec());
        let out = package.to_bytes_with(&replacements).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(out)).unwrap();
        assert_eq!(archive.by_index(0).unwrap().name(), "a.xml");
        assert_eq!(
            archive.by_index(0).unwrap().compression(),
            CompressionMethod::Stored
        );

        let mut content = String::new();
        archive
            .by_name("b.xml")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<b>new</b>");
    }

    #[test]
    fn test_rewrite_rejects_unknown_entry() {
        let bytes = archive(&[("a.xml", "<a/>", CompressionMethod::Stored)]);
        let package = Package::from_bytes(&bytes).unwrap();

        let mut replacements = HashMap::new();
        replacements.insert("A.xml".to_string(), b"<a>new</a>".to_vec());
        let err = package.to_bytes_with(&replacements).unwrap_err();
        assert!(matches!(err, Error::Processing(_)));
    }
}
