use std::borrow::Cow;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;

use fwcore::io::{checked_range, ByteSource};
use fwcore::ContainerError;

/// Random access reads straight from a file.
///
/// Every read seeks and fills a scratch buffer that is reused between
/// calls, the returned slice borrows that buffer.
pub struct FileSource {
    file: File,
    size: u64,
    buf: Vec<u8>,
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ContainerError> {
        let file = File::open(path.as_ref())?;
        let size = file.metadata()?.len();
        debug!("opened {} ({} bytes)", path.as_ref().display(), size);

        Ok(FileSource {
            file,
            size,
            buf: Vec::new(),
        })
    }
}

impl ByteSource for FileSource {
    fn size(&self) -> u64 {
        self.size
    }

    fn read(&mut self, count: u64, offset: u64) -> Result<Cow<'_, [u8]>, ContainerError> {
        let range = checked_range(count, offset, self.size)?;

        self.buf.clear();
        self.buf.resize(range.len(), 0);
        if !self.buf.is_empty() {
            self.file.seek(SeekFrom::Start(offset))?;
            self.file.read_exact(&mut self.buf)?;
        }
        Ok(Cow::Borrowed(&self.buf))
    }
}

/// Output file that only appears at its path once committed.
///
/// Content goes to a temporary file in the destination directory, dropping
/// an uncommitted `AtomicFile` removes it.
pub struct AtomicFile {
    path: PathBuf,
    temp: NamedTempFile,
}

impl AtomicFile {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, ContainerError> {
        let path = path.as_ref().to_path_buf();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok(AtomicFile {
            temp: NamedTempFile::new_in(dir)?,
            path,
        })
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), ContainerError> {
        self.temp.write_all(bytes)?;
        Ok(())
    }

    pub fn commit(self) -> Result<(), ContainerError> {
        self.temp.as_file().sync_all()?;
        self.temp.persist(&self.path).map_err(|e| e.error)?;
        debug!("wrote {}", self.path.display());
        Ok(())
    }
}
