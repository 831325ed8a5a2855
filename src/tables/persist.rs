//! Flat table files: a fixed header followed by little-endian entries.
//!
//! Header layout (32 bytes): magic, format version (u32), entry width in bytes (u32), entry count
//! (u64), payload fingerprint (u64).

use std::fs::File;
use std::hash::Hasher;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use fxhash::FxHasher64;

const MAGIC: &[u8; 8] = b"RCSTBL\0\0";
pub const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: u64 = 32;
const FINGERPRINT_OFFSET: u64 = 24;
const BLOCK: usize = 1 << 20;

/// A fixed-width table entry.
pub trait Entry: Copy + Default + Send + Sync + 'static {
    const WIDTH: usize;

    fn put(self, out: &mut Vec<u8>);
    fn take(bytes: &[u8]) -> Self;
}

macro_rules! entry {
    ($t:ty) => {
        impl Entry for $t {
            const WIDTH: usize = core::mem::size_of::<$t>();

            fn put(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn take(bytes: &[u8]) -> Self {
                let mut le = [0; core::mem::size_of::<$t>()];
                le.copy_from_slice(bytes);
                <$t>::from_le_bytes(le)
            }
        }
    };
}

entry!(u8);
entry!(u16);
entry!(u32);

/// Hash over the payload taken in 8-byte words, so chunked writes agree with one-shot reads.
pub struct Fingerprint {
    hasher: FxHasher64,
    tail: [u8; 8],
    tail_len: usize,
    total: u64,
}

impl Default for Fingerprint {
    fn default() -> Self {
        Fingerprint {
            hasher: FxHasher64::default(),
            tail: [0; 8],
            tail_len: 0,
            total: 0,
        }
    }
}

impl Fingerprint {
    pub fn update(&mut self, mut bytes: &[u8]) {
        self.total += bytes.len() as u64;
        if self.tail_len > 0 {
            let n = (8 - self.tail_len).min(bytes.len());
            self.tail[self.tail_len..self.tail_len + n].copy_from_slice(&bytes[..n]);
            self.tail_len += n;
            bytes = &bytes[n..];
            if self.tail_len < 8 {
                return;
            }
            self.hasher.write_u64(u64::from_le_bytes(self.tail));
            self.tail_len = 0;
        }

        let mut words = bytes.chunks_exact(8);
        for word in &mut words {
            let mut le = [0; 8];
            le.copy_from_slice(word);
            self.hasher.write_u64(u64::from_le_bytes(le));
        }
        let rest = words.remainder();
        self.tail[..rest.len()].copy_from_slice(rest);
        self.tail_len = rest.len();
    }

    pub fn finish(mut self) -> u64 {
        if self.tail_len > 0 {
            self.tail[self.tail_len..].fill(0);
            self.hasher.write_u64(u64::from_le_bytes(self.tail));
        }
        self.hasher.write_u64(self.total);
        self.hasher.finish()
    }
}

/// Where tables are read from and written to. Without a directory every table is built in memory.
#[derive(Debug, Clone, Copy)]
pub struct Store<'a> {
    dir: Option<&'a Path>,
}

impl<'a> Store<'a> {
    pub fn new(dir: Option<&'a Path>) -> Self {
        Store { dir }
    }

    pub fn in_memory() -> Store<'static> {
        Store { dir: None }
    }

    fn path(&self, name: &str) -> Option<PathBuf> {
        self.dir.map(|d| d.join(name))
    }

    /// Loads `name` if its file exists, otherwise builds it and saves the result.
    pub fn load_or_build<T: Entry>(
        &self,
        name: &str,
        len: usize,
        build: impl FnOnce() -> Vec<T>,
    ) -> anyhow::Result<Vec<T>> {
        if let Some(table) = self.load(name, len)? {
            return Ok(table);
        }

        let table = populating(name, build);
        anyhow::ensure!(
            table.len() == len,
            "{} has {} entries, expected {}",
            name,
            table.len(),
            len
        );
        self.save(name, &table)?;
        Ok(table)
    }

    pub fn save<T: Entry>(&self, name: &str, table: &[T]) -> anyhow::Result<()> {
        if let Some(mut writer) = self.writer::<T>(name, table.len())? {
            writer.write(table)?;
            writer.finish()?;
        }
        Ok(())
    }

    /// Reads a table file. A missing file is `None`; a file that doesn't match is an error.
    pub fn load<T: Entry>(&self, name: &str, len: usize) -> anyhow::Result<Option<Vec<T>>> {
        let Some(path) = self.path(name) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let start = Instant::now();
        log::debug!("Loading {}", path.display());
        let table = read_table(&path, len)
            .with_context(|| format!("Table file {} is unusable, delete it to rebuild", path.display()))?;
        log::info!("Loaded {}, took {:?}", name, start.elapsed());
        Ok(Some(table))
    }

    /// Starts streaming a table to disk. `None` when nothing is persisted.
    pub fn writer<T: Entry>(&self, name: &str, len: usize) -> anyhow::Result<Option<TableWriter<T>>> {
        match self.path(name) {
            Some(path) => Ok(Some(TableWriter::create(path, len)?)),
            None => Ok(None),
        }
    }
}

/// Runs `build`, logging how long it took.
pub fn populating<R>(name: &str, build: impl FnOnce() -> R) -> R {
    let start = Instant::now();
    log::info!("Populating table {}", name);
    let result = build();
    log::info!("Finished populating table {}, took {:?}", name, start.elapsed());
    result
}

fn read_table<T: Entry>(path: &Path, len: usize) -> anyhow::Result<Vec<T>> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::with_capacity(BLOCK, file);

    let mut header = [0; HEADER_LEN as usize];
    reader
        .read_exact(&mut header)
        .context("truncated header")?;
    anyhow::ensure!(&header[..8] == MAGIC, "not a table file");

    let version = u32::take(&header[8..12]);
    let width = u32::take(&header[12..16]) as usize;
    let count = u64::from_le_bytes(header_u64(&header[16..24]));
    let fingerprint = u64::from_le_bytes(header_u64(&header[24..32]));
    anyhow::ensure!(
        version == FORMAT_VERSION,
        "format version {} but this build reads version {}",
        version,
        FORMAT_VERSION
    );
    anyhow::ensure!(width == T::WIDTH, "entries are {} bytes wide, expected {}", width, T::WIDTH);
    anyhow::ensure!(count == len as u64, "holds {} entries, expected {}", count, len);
    anyhow::ensure!(
        file_len == HEADER_LEN + (len * T::WIDTH) as u64,
        "file is {} bytes, expected {}",
        file_len,
        HEADER_LEN + (len * T::WIDTH) as u64
    );

    let mut table = Vec::with_capacity(len);
    let mut hash = Fingerprint::default();
    let mut block = vec![0; BLOCK - BLOCK % T::WIDTH];
    let mut remaining = len * T::WIDTH;
    while remaining > 0 {
        let n = remaining.min(block.len());
        reader.read_exact(&mut block[..n]).context("truncated payload")?;
        hash.update(&block[..n]);
        table.extend(block[..n].chunks_exact(T::WIDTH).map(T::take));
        remaining -= n;
    }
    anyhow::ensure!(hash.finish() == fingerprint, "fingerprint mismatch");
    Ok(table)
}

fn header_u64(bytes: &[u8]) -> [u8; 8] {
    let mut le = [0; 8];
    le.copy_from_slice(bytes);
    le
}

/// Writes a table to `<name>.tmp` and renames it into place once every entry is written.
pub struct TableWriter<T> {
    path: PathBuf,
    tmp: PathBuf,
    out: BufWriter<File>,
    hash: Fingerprint,
    expected: usize,
    written: usize,
    buf: Vec<u8>,
    _entry: core::marker::PhantomData<T>,
}

impl<T: Entry> TableWriter<T> {
    fn create(path: PathBuf, len: usize) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Creating table directory {}", parent.display()))?;
        }
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let file = File::create(&tmp).with_context(|| format!("Creating {}", tmp.display()))?;
        let mut out = BufWriter::with_capacity(BLOCK, file);
        out.write_all(MAGIC)?;
        out.write_all(&FORMAT_VERSION.to_le_bytes())?;
        out.write_all(&(T::WIDTH as u32).to_le_bytes())?;
        out.write_all(&(len as u64).to_le_bytes())?;
        out.write_all(&0u64.to_le_bytes())?;

        Ok(TableWriter {
            path,
            tmp,
            out,
            hash: Fingerprint::default(),
            expected: len,
            written: 0,
            buf: Vec::with_capacity(BLOCK),
            _entry: core::marker::PhantomData,
        })
    }

    pub fn write(&mut self, entries: &[T]) -> anyhow::Result<()> {
        for chunk in entries.chunks(BLOCK / T::WIDTH) {
            self.buf.clear();
            for &e in chunk {
                e.put(&mut self.buf);
            }
            self.hash.update(&self.buf);
            self.out
                .write_all(&self.buf)
                .with_context(|| format!("Writing {}", self.tmp.display()))?;
        }
        self.written += entries.len();
        Ok(())
    }

    pub fn finish(self) -> anyhow::Result<()> {
        let TableWriter {
            path,
            tmp,
            out,
            hash,
            expected,
            written,
            ..
        } = self;
        anyhow::ensure!(
            written == expected,
            "{} received {} entries, expected {}",
            path.display(),
            written,
            expected
        );

        let mut file = out.into_inner().map_err(|e| e.into_error())?;
        file.seek(SeekFrom::Start(FINGERPRINT_OFFSET))?;
        file.write_all(&hash.finish().to_le_bytes())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Moving {} into place", tmp.display()))?;
        log::debug!("Saved {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cubesolver-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn fingerprint_ignores_chunking() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i * 7 % 251) as u8).collect();

        let mut whole = Fingerprint::default();
        whole.update(&data);

        let mut pieces = Fingerprint::default();
        for chunk in data.chunks(13) {
            pieces.update(chunk);
        }
        assert_eq!(whole.finish(), pieces.finish());
    }

    #[test]
    fn fingerprint_sees_length() {
        let mut a = Fingerprint::default();
        a.update(&[1, 2, 3]);
        let mut b = Fingerprint::default();
        b.update(&[1, 2, 3, 0]);
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn builds_once_then_loads() {
        let dir = scratch_dir("reload");
        let store = Store::new(Some(&dir));
        let table: Vec<u16> = (0..5000).collect();

        let built = store.load_or_build("t", 5000, || table.clone()).unwrap();
        assert_eq!(built, table);
        let loaded = store
            .load_or_build::<u16>("t", 5000, || panic!("should load from disk"))
            .unwrap();
        assert_eq!(loaded, table);
        assert!(!dir.join("t.tmp").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn streamed_tables_match_one_shot() {
        let dir = scratch_dir("stream");
        let store = Store::new(Some(&dir));
        let table: Vec<u32> = (0..3000).map(|i| i * 31).collect();

        let mut writer = store.writer::<u32>("s", table.len()).unwrap().unwrap();
        for chunk in table.chunks(7) {
            writer.write(chunk).unwrap();
        }
        writer.finish().unwrap();
        assert_eq!(store.load::<u32>("s", table.len()).unwrap(), Some(table));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn corrupt_tables_are_rejected() {
        let dir = scratch_dir("corrupt");
        let store = Store::new(Some(&dir));
        store
            .load_or_build("c", 100, || vec![7u8; 100])
            .unwrap();

        let path = dir.join("c");
        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 1;
        std::fs::write(&path, &bytes).unwrap();
        assert!(store.load::<u8>("c", 100).is_err());

        std::fs::write(&path, &bytes[..50]).unwrap();
        assert!(store.load::<u8>("c", 100).is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let dir = scratch_dir("shape");
        let store = Store::new(Some(&dir));
        store.load_or_build("w", 64, || vec![1u16; 64]).unwrap();

        assert!(store.load::<u16>("w", 65).is_err());
        assert!(store.load::<u32>("w", 32).is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_none() {
        let dir = scratch_dir("missing");
        assert_eq!(Store::new(Some(&dir)).load::<u8>("nothing", 1).unwrap(), None);
        assert_eq!(Store::in_memory().load::<u8>("nothing", 1).unwrap(), None);
    }
}
