//! `Content-Length` framing, as used by the LSP base protocol.

use mapped_edits_core::{MappedEditsError, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const CONTENT_LENGTH: &str = "content-length";

/// Largest body a peer may announce.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Reads one frame body.
///
/// Returns `Ok(None)` on a clean EOF before any header. Unknown headers are
/// skipped. A `Content-Length` above [`MAX_FRAME_LEN`] is rejected before
/// any body is buffered.
pub async fn read_frame<R>(reader: &mut R, buf: &mut String) -> Result<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut saw_header = false;

    loop {
        buf.clear();
        let bytes_read = reader.read_line(buf).await?;
        if bytes_read == 0 {
            if saw_header {
                return Err(MappedEditsError::protocol("unexpected EOF in frame header"));
            }
            return Ok(None);
        }

        let line = buf.trim();
        if line.is_empty() {
            if saw_header {
                break;
            }
            continue;
        }
        saw_header = true;

        if let Some((name, value)) = line.split_once(':')
            && name.trim().eq_ignore_ascii_case(CONTENT_LENGTH)
        {
            content_length = Some(value.trim().parse().map_err(|_| {
                MappedEditsError::protocol(format!("invalid Content-Length: {}", value.trim()))
            })?);
        }
    }

    let length =
        content_length.ok_or_else(|| MappedEditsError::protocol("missing Content-Length"))?;
    if length > MAX_FRAME_LEN {
        return Err(MappedEditsError::protocol(format!(
            "frame of {length} bytes exceeds the {MAX_FRAME_LEN} byte limit"
        )));
    }

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

pub async fn write_frame<W>(writer: &mut W, body: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}
