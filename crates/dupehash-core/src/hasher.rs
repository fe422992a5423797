//! Sampled file hasher (C2).
//!
//! Computes a file's fingerprint from either the whole file or three sampled
//! windows, per spec §4.2. The `3*S >= L` short-circuit (spec's resolution of
//! OQ1) guarantees the sampled hash of a small file equals its exact content
//! hash, and that the stored `segment_length` is normalized to `0` whenever that
//! happens (spec invariant 3).

use crate::buffer_pool::BufferPool;
use crate::fingerprint::Fingerprint;
use crate::progress::ProgressSink;
use blake2::digest::consts::U64;
use blake2::{Blake2b, Digest};
use std::io;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::sync::CancellationToken;

type Blake2b512 = Blake2b<U64>;

/// Result of a sampled or whole-file hash: the fingerprint, and the
/// `segment_length` that should actually be stored (0 if whole-hashed, possibly
/// normalized down from what was requested).
#[derive(Debug, Clone, Copy)]
pub struct SampledHash {
    pub fingerprint: Fingerprint,
    pub segment_length: u64,
}

/// Hash a readable, seekable async stream of length `len`.
///
/// `requested_segment_length == 0` always forces a whole-file hash. Otherwise,
/// if `3 * requested_segment_length >= len`, the three sampled windows would
/// touch or overlap, so the whole file is hashed instead and the stored
/// `segment_length` is normalized to 0.
///
/// # Errors
/// Returns an I/O error from the underlying reader. Cancellation is reported as
/// `io::ErrorKind::Interrupted`.
pub async fn hash_stream<R>(
    reader: &mut R,
    len: u64,
    requested_segment_length: u64,
    pool: &BufferPool,
    progress: &dyn ProgressSink,
    cancel: &CancellationToken,
) -> io::Result<SampledHash>
where
    R: tokio::io::AsyncRead + tokio::io::AsyncSeek + Unpin,
{
    progress.add_to_read(len);

    let use_whole_file = requested_segment_length == 0 || 3 * requested_segment_length >= len;

    if use_whole_file {
        let fingerprint = hash_whole(reader, pool, progress, cancel).await?;
        return Ok(SampledHash {
            fingerprint,
            segment_length: 0,
        });
    }

    let fingerprint = hash_sampled(reader, len, requested_segment_length, pool, progress, cancel).await?;
    Ok(SampledHash {
        fingerprint,
        segment_length: requested_segment_length,
    })
}

async fn hash_whole<R>(
    reader: &mut R,
    pool: &BufferPool,
    progress: &dyn ProgressSink,
    cancel: &CancellationToken,
) -> io::Result<Fingerprint>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut hasher = Blake2b512::new();
    let mut buf = pool.rent();
    loop {
        if cancel.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "hash cancelled"));
        }
        let n = reader.read(buf.as_mut_slice()).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf.as_mut_slice()[..n]);
        progress.add_read(n as u64);
    }
    Ok(finalize(hasher))
}

/// Sample three disjoint windows of exactly `segment_length` bytes: head,
/// center-aligned middle, and tail, fed into one incremental hash in that fixed
/// order (spec §4.2: "head, middle, tail, because two files that differ only in
/// the middle would otherwise collide").
async fn hash_sampled<R>(
    reader: &mut R,
    len: u64,
    segment_length: u64,
    pool: &BufferPool,
    progress: &dyn ProgressSink,
    cancel: &CancellationToken,
) -> io::Result<Fingerprint>
where
    R: tokio::io::AsyncRead + tokio::io::AsyncSeek + Unpin,
{
    let head_offset = 0u64;
    let middle_offset = (len / 2).saturating_sub(segment_length / 2);
    let tail_offset = len - segment_length;

    let mut hasher = Blake2b512::new();
    for offset in [head_offset, middle_offset, tail_offset] {
        if cancel.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "hash cancelled"));
        }
        read_window(reader, offset, segment_length, pool, &mut hasher, progress, cancel).await?;
    }
    Ok(finalize(hasher))
}

async fn read_window<R>(
    reader: &mut R,
    offset: u64,
    window_len: u64,
    pool: &BufferPool,
    hasher: &mut Blake2b512,
    progress: &dyn ProgressSink,
    cancel: &CancellationToken,
) -> io::Result<()>
where
    R: tokio::io::AsyncRead + tokio::io::AsyncSeek + Unpin,
{
    reader.seek(io::SeekFrom::Start(offset)).await?;
    let mut remaining = window_len;
    let mut buf = pool.rent();
    while remaining > 0 {
        if cancel.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "hash cancelled"));
        }
        let want = remaining.min(buf.len() as u64) as usize;
        let n = reader.read(&mut buf.as_mut_slice()[..want]).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "file truncated during sampled read",
            ));
        }
        hasher.update(&buf.as_mut_slice()[..n]);
        progress.add_read(n as u64);
        remaining -= n as u64;
    }
    Ok(())
}

fn finalize(hasher: Blake2b512) -> Fingerprint {
    let out = hasher.finalize();
    let mut bytes = [0u8; crate::fingerprint::FINGERPRINT_LEN];
    bytes.copy_from_slice(&out);
    Fingerprint::from_bytes(bytes)
}
