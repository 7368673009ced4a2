//! Tagged binary container with per-section checksums.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{EmogifError, Result};

/// File magic.
pub const MAGIC: [u8; 4] = *b"EMOG";
/// Major format version; readers reject other majors.
pub const VERSION_MAJOR: u16 = 1;
/// Minor format version; newer minors only add sections.
pub const VERSION_MINOR: u16 = 0;

/// A four-byte section tag.
pub type Tag = [u8; 4];

fn tag_name(tag: &Tag) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

/// Collects sections and writes them as one container.
#[derive(Debug, Default)]
pub struct ArtifactWriter {
    sections: Vec<(Tag, Vec<u8>)>,
}

impl ArtifactWriter {
    pub fn new() -> Self {
        ArtifactWriter::default()
    }

    /// Encode `value` as the payload of section `tag`.
    pub fn add_section<T: Serialize>(&mut self, tag: Tag, value: &T) -> Result<&mut Self> {
        let payload = bincode::serde::encode_to_vec(value, bincode::config::standard()).map_err(
            |e| {
                EmogifError::serialization(format!(
                    "Failed to encode section {}: {e}",
                    tag_name(&tag)
                ))
            },
        )?;
        self.sections.push((tag, payload));
        Ok(self)
    }

    /// Add a section with a pre-encoded payload.
    pub fn add_raw_section(&mut self, tag: Tag, payload: Vec<u8>) -> &mut Self {
        self.sections.push((tag, payload));
        self
    }

    /// Serialize the container.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.write_all(&MAGIC)?;
        out.write_u16::<LittleEndian>(VERSION_MAJOR)?;
        out.write_u16::<LittleEndian>(VERSION_MINOR)?;
        out.write_u32::<LittleEndian>(self.sections.len() as u32)?;
        for (tag, payload) in &self.sections {
            out.write_all(tag)?;
            out.write_u64::<LittleEndian>(payload.len() as u64)?;
            out.write_u32::<LittleEndian>(crc32fast::hash(payload))?;
            out.write_all(payload)?;
        }
        Ok(out)
    }

    /// Write the container to `path`, replacing any existing file atomically.
    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        write_atomically(path, &bytes)?;
        debug!(
            "Wrote {} sections ({} bytes) to {}",
            self.sections.len(),
            bytes.len(),
            path.display()
        );
        Ok(())
    }
}

/// Write through a uniquely named temporary file in the target directory,
/// then rename it over the target.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    let temp = parent.join(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

    let result = (|| -> io::Result<()> {
        let mut file = File::create(&temp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&temp, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }
    Ok(())
}

/// A parsed container with verified section checksums.
#[derive(Debug)]
pub struct ArtifactReader {
    path: PathBuf,
    version: (u16, u16),
    sections: HashMap<Tag, Vec<u8>>,
}

impl ArtifactReader {
    /// Read and verify the container at `path`.
    ///
    /// A missing file is [`EmogifError::ArtifactNotFound`]; anything that
    /// cannot be parsed is [`EmogifError::CorruptArtifact`].
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(EmogifError::ArtifactNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_bytes(path, &bytes)
    }

    /// Parse a container held in memory; `path` is used in error messages.
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self> {
        let corrupt = |reason: String| EmogifError::corrupt(path, reason);
        let truncated = |_: io::Error| EmogifError::corrupt(path, "unexpected end of file");

        let mut cursor = Cursor::new(bytes);
        let mut magic = [0u8; 4];
        cursor.read_exact(&mut magic).map_err(truncated)?;
        if magic != MAGIC {
            return Err(corrupt("bad magic".to_string()));
        }

        let major = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let minor = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        if major != VERSION_MAJOR {
            return Err(corrupt(format!("unsupported version {major}.{minor}")));
        }

        let count = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
        let mut sections = HashMap::new();
        for _ in 0..count {
            let mut tag = [0u8; 4];
            cursor.read_exact(&mut tag).map_err(truncated)?;
            let len = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
            let crc = cursor.read_u32::<LittleEndian>().map_err(truncated)?;

            let remaining = (bytes.len() as u64).saturating_sub(cursor.position());
            if len > remaining {
                return Err(corrupt(format!(
                    "section {} claims {len} bytes but only {remaining} remain",
                    tag_name(&tag)
                )));
            }
            let mut payload = vec![0u8; len as usize];
            cursor.read_exact(&mut payload).map_err(truncated)?;
            if crc32fast::hash(&payload) != crc {
                return Err(corrupt(format!(
                    "checksum mismatch in section {}",
                    tag_name(&tag)
                )));
            }
            sections.insert(tag, payload);
        }

        if (cursor.position() as usize) < bytes.len() {
            debug!(
                "{} has {} trailing bytes after the last section",
                path.display(),
                bytes.len() - cursor.position() as usize
            );
        }

        Ok(ArtifactReader {
            path: path.to_path_buf(),
            version: (major, minor),
            sections,
        })
    }

    pub fn version(&self) -> (u16, u16) {
        self.version
    }

    pub fn has_section(&self, tag: &Tag) -> bool {
        self.sections.contains_key(tag)
    }

    /// Decode section `tag`; a missing or undecodable section is corruption.
    pub fn section<T: DeserializeOwned>(&self, tag: Tag) -> Result<T> {
        let payload = self.sections.get(&tag).ok_or_else(|| {
            EmogifError::corrupt(&self.path, format!("missing section {}", tag_name(&tag)))
        })?;
        let (value, _) =
            bincode::serde::decode_from_slice(payload, bincode::config::standard()).map_err(
                |e| {
                    EmogifError::corrupt(
                        &self.path,
                        format!("cannot decode section {}: {e}", tag_name(&tag)),
                    )
                },
            )?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn sample() -> ArtifactWriter {
        let mut writer = ArtifactWriter::new();
        writer.add_section(*b"NUMS", &vec![1u32, 2, 3]).unwrap();
        writer.add_section(*b"TEXT", &"hello".to_string()).unwrap();
        writer
    }

    #[test]
    fn test_write_and_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("a.bin");
        sample().write_to_path(&path).unwrap();

        let reader = ArtifactReader::open(&path).unwrap();
        assert_eq!(reader.version(), (1, 0));
        assert_eq!(reader.section::<Vec<u32>>(*b"NUMS").unwrap(), vec![1, 2, 3]);
        assert_eq!(reader.section::<String>(*b"TEXT").unwrap(), "hello");

        // no temporary files are left behind
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ArtifactReader::open(&dir.path().join("none.bin")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_corruption_is_detected() {
        let bytes = sample().to_bytes().unwrap();
        let path = Path::new("mem.bin");

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        let mut bad_version = bytes.clone();
        bad_version[4] = 9;
        let mut flipped = bytes.clone();
        let last = flipped.len() - 1;
        flipped[last] ^= 0xff;
        let truncated = bytes[..bytes.len() - 3].to_vec();

        for broken in [bad_magic, bad_version, flipped, truncated, Vec::new()] {
            let err = ArtifactReader::from_bytes(path, &broken).unwrap_err();
            assert!(matches!(err, EmogifError::CorruptArtifact { .. }), "{err}");
        }
    }

    #[test]
    fn test_missing_section_and_unknown_tags() {
        let mut writer = sample();
        writer.add_raw_section(*b"XTRA", vec![0xde, 0xad]);
        let bytes = writer.to_bytes().unwrap();
        let reader = ArtifactReader::from_bytes(Path::new("mem.bin"), &bytes).unwrap();

        assert!(reader.has_section(b"XTRA"));
        assert!(matches!(
            reader.section::<String>(*b"NONE"),
            Err(EmogifError::CorruptArtifact { .. })
        ));
        assert!(matches!(
            reader.section::<Vec<String>>(*b"NUMS"),
            Err(EmogifError::CorruptArtifact { .. })
        ));
    }
}
