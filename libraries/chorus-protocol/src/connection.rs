//! Framed connection over any async byte stream.
use crate::error::{ProtocolError, Result};
use crate::message;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf,
    WriteHalf,
};
use tracing::trace;

/// One side of a sync protocol exchange.
///
/// Wraps a byte stream with header-line framing, sized payload transfer, and
/// per-operation deadlines. Both the client and the server drive the protocol
/// through this type; the message sequence itself lives with the callers.
pub struct Connection<S> {
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
    timeout: Duration,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    /// Wrap a stream, applying `timeout` to every read and write.
    pub fn new(stream: S, timeout: Duration) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            timeout,
        }
    }

    // Header lines

    /// Read one header line, without its terminating newline.
    ///
    /// Lines longer than [`message::MAX_HEADER_LINE`] are a violation; a
    /// clean EOF before any byte is [`ProtocolError::ConnectionClosed`].
    pub async fn read_message(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        let mut limited = (&mut self.reader).take(message::MAX_HEADER_LINE as u64);
        let n = deadline(self.timeout, limited.read_until(b'\n', &mut buf)).await??;

        if n == 0 {
            return Err(ProtocolError::ConnectionClosed);
        }
        if !buf.ends_with(b"\n") {
            return Err(ProtocolError::violation(
                "header line unterminated or too long",
            ));
        }

        let line = String::from_utf8(buf)
            .map_err(|_| ProtocolError::violation("header line is not valid UTF-8"))?;
        let line = line.trim().to_string();
        trace!(%line, "recv");
        Ok(line)
    }

    /// Read a header line and require it to be exactly `expected`.
    pub async fn expect_line(&mut self, expected: &str) -> Result<()> {
        let line = self.read_message().await?;
        if line == expected {
            Ok(())
        } else {
            Err(ProtocolError::Violation(format!(
                "expected {expected}, got {line:?}"
            )))
        }
    }

    /// Read a `KEY:VALUE` header and require `key`; returns the value.
    ///
    /// The value is everything after the first `:`, so values containing `:`
    /// are legal.
    pub async fn read_value(&mut self, key: &str) -> Result<String> {
        let line = self.read_message().await?;
        match line.split_once(':') {
            Some((k, value)) if k == key => Ok(value.trim().to_string()),
            _ => Err(ProtocolError::Violation(format!(
                "expected {key} header, got {line:?}"
            ))),
        }
    }

    /// Read a `KEY:<decimal>` header and parse the value.
    pub async fn read_count(&mut self, key: &str) -> Result<u64> {
        let value = self.read_value(key).await?;
        value.parse().map_err(|_| {
            ProtocolError::Violation(format!("{key} header is not a number: {value:?}"))
        })
    }

    /// Send one bare header line.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        if line.contains('\n') {
            return Err(ProtocolError::violation(
                "header line may not contain a newline",
            ));
        }
        trace!(%line, "send");
        let framed = format!("{line}\n");
        deadline(self.timeout, self.writer.write_all(framed.as_bytes())).await??;
        deadline(self.timeout, self.writer.flush()).await??;
        Ok(())
    }

    /// Send a `KEY:VALUE` header line.
    pub async fn send_header(&mut self, key: &str, value: impl std::fmt::Display) -> Result<()> {
        self.send_line(&format!("{key}:{value}")).await
    }

    // Sized payloads

    /// Read exactly `len` payload bytes.
    pub async fn read_payload(&mut self, len: u64) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; usize::try_from(len).map_err(|_| {
            ProtocolError::violation("payload length does not fit in memory")
        })?];
        deadline(self.timeout, self.reader.read_exact(&mut buf))
            .await?
            .map_err(map_eof)?;
        Ok(buf)
    }

    /// Write a payload previously announced by a size header.
    pub async fn write_payload(&mut self, payload: &[u8]) -> Result<()> {
        deadline(self.timeout, self.writer.write_all(payload)).await??;
        deadline(self.timeout, self.writer.flush()).await??;
        Ok(())
    }

    // Snapshot documents

    /// Send a snapshot document: `<size_key>:<n>` followed by `n` bytes.
    pub async fn send_document(&mut self, size_key: &str, document: &str) -> Result<()> {
        self.send_header(size_key, document.len()).await?;
        self.write_payload(document.as_bytes()).await
    }

    /// Receive a snapshot document announced by `<size_key>:<n>`.
    pub async fn recv_document(&mut self, size_key: &str) -> Result<String> {
        let len = self.read_count(size_key).await?;
        let payload = self.read_payload(len).await?;
        String::from_utf8(payload)
            .map_err(|_| ProtocolError::violation("snapshot document is not valid UTF-8"))
    }

    // Audio files

    /// Send one audio file: size and name headers, then the raw bytes,
    /// streamed in chunks.
    pub async fn send_file(&mut self, path: &Path) -> Result<()> {
        let len = tokio::fs::metadata(path).await?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ProtocolError::violation("audio file path has no file name"))?;

        self.send_header(message::MP3_SIZE, len).await?;
        self.send_header(message::MP3_NAME, &name).await?;

        let mut file = File::open(path).await?;
        let mut buf = vec![0u8; message::CHUNK_SIZE];
        let mut sent = 0u64;
        while sent < len {
            // Never send more than the announced size, even if the file
            // grows underneath us
            let want = (len - sent).min(message::CHUNK_SIZE as u64) as usize;
            let n = file.read(&mut buf[..want]).await?;
            if n == 0 {
                return Err(ProtocolError::violation(
                    "audio file shrank while being sent",
                ));
            }
            deadline(self.timeout, self.writer.write_all(&buf[..n])).await??;
            sent += n as u64;
        }
        deadline(self.timeout, self.writer.flush()).await??;
        trace!(%name, len, "sent audio file");
        Ok(())
    }

    /// Receive one audio file into `dest_dir`, returning the written path.
    ///
    /// The received name is reduced to its final path component before being
    /// joined to `dest_dir`, so a malicious name cannot escape the directory.
    /// Reads exactly the declared byte count and never past it.
    pub async fn recv_file(&mut self, dest_dir: &Path) -> Result<PathBuf> {
        let len = self.read_count(message::MP3_SIZE).await?;
        let raw_name = self.read_value(message::MP3_NAME).await?;

        let name = Path::new(&raw_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty() && n.as_str() != "." && n.as_str() != "..")
            .ok_or_else(|| {
                ProtocolError::Violation(format!("unusable audio file name {raw_name:?}"))
            })?;

        let path = dest_dir.join(&name);
        let mut file = File::create(&path).await?;
        let mut buf = vec![0u8; message::CHUNK_SIZE];
        let mut remaining = len;
        while remaining > 0 {
            let want = remaining.min(message::CHUNK_SIZE as u64) as usize;
            deadline(self.timeout, self.reader.read_exact(&mut buf[..want]))
                .await?
                .map_err(map_eof)?;
            file.write_all(&buf[..want]).await?;
            remaining -= want as u64;
        }
        file.flush().await?;
        trace!(%name, len, "received audio file");
        Ok(path)
    }
}

async fn deadline<F, T>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ProtocolError::Timeout)
}

fn map_eof(err: std::io::Error) -> ProtocolError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        ProtocolError::ConnectionClosed
    } else {
        ProtocolError::Io(err)
    }
}
