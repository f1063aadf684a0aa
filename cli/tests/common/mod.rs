#![allow(dead_code)]

use tar::{EntryType, Header};

/// In-memory tarball builder that writes entry names verbatim, so `./`
/// prefixes survive into the archive.
pub struct TarFixture {
    builder: tar::Builder<Vec<u8>>,
}

impl TarFixture {
    pub fn new() -> Self {
        Self {
            builder: tar::Builder::new(Vec::new()),
        }
    }

    pub fn file(self, name: &str, data: &[u8]) -> Self {
        self.append(name, EntryType::Regular, data)
    }

    pub fn dir(self, name: &str) -> Self {
        self.append(name, EntryType::Directory, b"")
    }

    fn append(mut self, name: &str, kind: EntryType, data: &[u8]) -> Self {
        let mut header = Header::new_gnu();
        let raw = name.as_bytes();
        header.as_old_mut().name[..raw.len()].copy_from_slice(raw);
        header.set_entry_type(kind);
        header.set_size(data.len() as u64);
        header.set_mode(if kind == EntryType::Directory { 0o755 } else { 0o644 });
        header.set_cksum();
        self.builder.append(&header, data).unwrap();
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.builder.into_inner().unwrap()
    }
}
