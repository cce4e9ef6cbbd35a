use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;

/// A byte source a device can be mounted from.
pub trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}

/// Shared handle to a seekable byte source.
///
/// The scanner, the registry and a mounted device all need the same
/// backing stream at different times. `Media` hands each of them a clone
/// of one locked source; the cursor belongs to whoever currently holds the
/// lock, so holders must not interleave positioned reads with raw
/// `Read`/`Seek` calls from another clone mid-operation.
#[derive(Clone)]
pub struct Media {
    inner: Arc<Mutex<Box<dyn ReadSeek>>>,
}

impl Media {
    pub fn new(source: Box<dyn ReadSeek>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(source)),
        }
    }

    /// Open a file on the host filesystem as media.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Wrap an in-memory byte buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(Box::new(Cursor::new(bytes)))
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, Box<dyn ReadSeek>>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::other("media lock poisoned"))
    }

    /// Total stream length. Restores the cursor afterwards.
    pub fn stream_len(&self) -> Result<u64> {
        let mut source = self.lock()?;
        let position = source.stream_position()?;
        let len = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(position))?;
        Ok(len)
    }

    /// Reset the cursor to the start of the stream.
    pub fn rewind(&self) -> Result<()> {
        let mut source = self.lock()?;
        source.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    /// Read up to `buf.len()` bytes starting at `offset`.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut source = self.lock()?;
        source.seek(SeekFrom::Start(offset))?;
        let read = source.read(buf)?;
        Ok(read)
    }

    /// Read exactly `buf.len()` bytes starting at `offset`.
    pub fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut source = self.lock()?;
        source.seek(SeekFrom::Start(offset))?;
        source.read_exact(buf)?;
        Ok(())
    }
}

impl Read for Media {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.lock()?.read(buf)
    }
}

impl Seek for Media {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.lock()?.seek(pos)
    }
}

/// An independent reader over a byte range of some media.
///
/// Each slice carries its own cursor and reads through positioned media
/// access, so handing out slices never disturbs the owning device's state.
pub struct MediaSlice {
    media: Media,
    start: u64,
    len: u64,
    pos: u64,
}

impl MediaSlice {
    pub fn new(media: Media, start: u64, len: u64) -> Self {
        Self {
            media,
            start,
            len,
            pos: 0,
        }
    }
}

impl Read for MediaSlice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.len.saturating_sub(self.pos);
        if remaining == 0 {
            return Ok(0);
        }

        let take = buf.len().min(remaining as usize);
        let read = self
            .media
            .read_at(self.start + self.pos, &mut buf[..take])
            .map_err(io::Error::other)?;
        self.pos += read as u64;
        Ok(read)
    }
}

impl Seek for MediaSlice {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(delta) => self.len as i64 + delta,
            SeekFrom::Current(delta) => self.pos as i64 + delta,
        };

        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of slice",
            ));
        }

        self.pos = target as u64;
        Ok(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positioned_reads_do_not_move_each_other() {
        let media = Media::from_bytes((0..=255).collect());

        let mut a = [0u8; 4];
        let mut b = [0u8; 4];
        media.read_exact_at(16, &mut a).unwrap();
        media.read_exact_at(0, &mut b).unwrap();
        assert_eq!(a, [16, 17, 18, 19]);
        assert_eq!(b, [0, 1, 2, 3]);

        assert_eq!(media.stream_len().unwrap(), 256);
    }

    #[test]
    fn test_slice_is_bounded_and_independent() {
        let media = Media::from_bytes((0..=255).collect());

        let mut first = MediaSlice::new(media.clone(), 10, 5);
        let mut second = MediaSlice::new(media, 10, 5);

        let mut buf = Vec::new();
        first.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, vec![10, 11, 12, 13, 14]);

        // The second slice starts fresh regardless of the first.
        let mut byte = [0u8; 1];
        second.read_exact(&mut byte).unwrap();
        assert_eq!(byte[0], 10);
    }

    #[test]
    fn test_slice_seek() {
        let media = Media::from_bytes((0..=255).collect());
        let mut slice = MediaSlice::new(media, 100, 10);

        slice.seek(SeekFrom::End(-2)).unwrap();
        let mut rest = Vec::new();
        slice.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, vec![108, 109]);

        assert!(slice.seek(SeekFrom::Current(-100)).is_err());
    }
}
