//! Ordered fan-out for per-scan decoding
//!
//! Both decoders run in two phases:
//! 1. **Sequential**: parse the XML and collect raw scans (metadata + Base64 text)
//! 2. **Parallel**: decode every raw scan as an independent Rayon task
//!
//! Results are collected through an indexed parallel iterator, so the output
//! keeps the input order no matter which task finishes first. The first
//! error stops the remaining work and is returned; nothing partial escapes.

use log::debug;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::error::Result;

/// Apply `decode` to every item in parallel, preserving input order
///
/// With `threads` set, the work runs on a dedicated pool of that size;
/// otherwise the global Rayon pool is used.
pub fn decode_ordered<T, U, F>(items: Vec<T>, threads: Option<usize>, decode: F) -> Result<Vec<U>>
where
    T: Send,
    U: Send,
    F: Fn(T) -> Result<U> + Sync + Send,
{
    debug!(
        "Decoding {} scans (threads: {})",
        items.len(),
        threads
            .map(|n| n.to_string())
            .unwrap_or_else(|| "default".to_string())
    );

    let run = move || items.into_par_iter().map(&decode).collect::<Result<Vec<U>>>();

    match threads {
        Some(n) => {
            let pool = ThreadPoolBuilder::new().num_threads(n).build()?;
            pool.install(run)
        }
        None => run(),
    }
}
