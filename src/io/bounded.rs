use super::ReadAt;
use async_trait::async_trait;
use std::io;
use std::sync::Arc;

/// A read-only window `[start, start + size)` over another reader.
///
/// Offset 0 of the window maps to `start` of the inner reader. Nothing is
/// copied; every read is translated and forwarded. Reads never return bytes
/// outside the window: they are truncated at `size`, and reads at or past
/// `size` return 0.
pub struct BoundedReader<R: ReadAt> {
    inner: Arc<R>,
    start: u64,
    size: u64,
}

impl<R: ReadAt> BoundedReader<R> {
    /// Create a window over `inner`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the range overflows or extends past the end
    /// of the inner reader.
    pub fn new(inner: Arc<R>, start: u64, size: u64) -> io::Result<Self> {
        match start.checked_add(size) {
            Some(end) if end <= inner.size() => Ok(Self { inner, start, size }),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "range {}+{} is outside a source of {} bytes",
                    start,
                    size,
                    inner.size()
                ),
            )),
        }
    }
}

#[async_trait]
impl<R: ReadAt> ReadAt for BoundedReader<R> {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if offset >= self.size || buf.is_empty() {
            return Ok(0);
        }
        let remaining = self.size - offset;
        let len = (buf.len() as u64).min(remaining) as usize;
        self.inner.read_at(self.start + offset, &mut buf[..len]).await
    }

    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;

    fn source() -> Arc<MemoryReader> {
        Arc::new(MemoryReader::new((0u8..=99).collect::<Vec<_>>()))
    }

    #[tokio::test]
    async fn offsets_map_onto_the_window() {
        let view = BoundedReader::new(source(), 40, 20).unwrap();
        assert_eq!(view.size(), 20);

        for o in 0..20u64 {
            let mut b = [0u8; 1];
            assert_eq!(view.read_at(o, &mut b).await.unwrap(), 1);
            assert_eq!(b[0], 40 + o as u8);
        }
    }

    #[tokio::test]
    async fn reads_are_truncated_at_the_boundary() {
        let view = BoundedReader::new(source(), 40, 20).unwrap();

        let mut buf = [0xAAu8; 8];
        let n = view.read_at(16, &mut buf).await.unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf[..4], &[56, 57, 58, 59]);
        // untouched past the window
        assert_eq!(&buf[4..], &[0xAA; 4]);

        assert_eq!(view.read_at(20, &mut buf).await.unwrap(), 0);
        assert_eq!(view.read_at(u64::MAX, &mut buf).await.unwrap(), 0);

        let err = view.read_exact_at(18, &mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn rejects_ranges_outside_the_source() {
        assert!(BoundedReader::new(source(), 90, 11).is_err());
        assert!(BoundedReader::new(source(), u64::MAX, 2).is_err());
        assert!(BoundedReader::new(source(), 100, 0).is_ok());
    }
}
