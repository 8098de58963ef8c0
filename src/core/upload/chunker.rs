//! Fixed-size chunking of an async byte source

use crate::domain::Result;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Splits a reader into chunks of at most `limit` bytes
///
/// Each chunk is filled by repeated reads until it is full or the source
/// reports end of data, so every chunk but the last is exactly `limit`
/// bytes long.
#[derive(Debug)]
pub struct ChunkReader<R> {
    reader: R,
    limit: usize,
    finished: bool,
}

impl<R: AsyncRead + Unpin> ChunkReader<R> {
    pub fn new(reader: R, limit: usize) -> Self {
        Self {
            reader,
            limit: limit.max(1),
            finished: false,
        }
    }

    /// Next chunk, or `None` once the source is exhausted
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.finished {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.limit];
        let mut filled = 0;

        while filled < self.limit {
            let n = self.reader.read(&mut buf[filled..]).await?;
            if n == 0 {
                self.finished = true;
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }

        buf.truncate(filled);
        Ok(Some(buf))
    }
}
