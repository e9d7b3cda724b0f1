//! Probe-then-fill helper for data whose size is only known by asking.
//!
//! Both URL components and the raw response header block are retrieved the
//! same way: ask how many bytes are needed, allocate exactly that, then fill.

use std::collections::TryReserveError;

/// Allocate a buffer of the size reported by `probe` and let `fill` write
/// into it. `fill` returns how many bytes it wrote; the buffer is truncated
/// to that count.
pub(crate) fn probe_then_fill<E>(
    probe: impl FnOnce() -> Result<usize, E>,
    fill: impl FnOnce(&mut [u8]) -> Result<usize, E>,
) -> Result<Vec<u8>, E>
where
    E: From<TryReserveError>,
{
    let size = probe()?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)?;
    buf.resize(size, 0);
    let written = fill(&mut buf)?;
    buf.truncate(written);
    Ok(buf)
}
