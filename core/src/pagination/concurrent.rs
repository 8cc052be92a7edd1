//! Doubling search followed by ternary partitioning with paired probes.
//!
//! Each round probes the two interior thirds of the bracket at once: one on
//! the calling thread, one on a scoped worker. The round only decides once
//! both answers are in, so completion order never affects the result.

use std::thread;

use crate::error::SearchError;

use super::{locate, BoundaryFinder, CancelToken, Probe, Search, Window};

/// Brackets at most this wide are scanned linearly instead of partitioned.
const LINEAR_SCAN_WIDTH: u32 = 3;

/// Finds the last page in fewer round trips than [`SequentialFinder`]
/// (`log3` instead of `log2` rounds after the doubling phase) at the cost of
/// up to twice as many requests.
///
/// The probe is invoked from two threads at once; any rate limiting must
/// live in the probe's own transport.
///
/// [`SequentialFinder`]: super::SequentialFinder
#[derive(Debug, Clone, Default)]
pub struct ConcurrentFinder {
    cancel: CancelToken,
}

impl ConcurrentFinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(cancel: CancelToken) -> Self {
        Self { cancel }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

impl BoundaryFinder for ConcurrentFinder {
    fn find<P: Probe>(&self, probe: &P, ceiling: u32) -> Result<u32, SearchError<P::Error>> {
        locate("concurrent", probe, ceiling, &self.cancel, partition)
    }
}

fn partition<P: Probe>(search: &mut Search<'_, P>, window: Window) -> Result<u32, SearchError<P::Error>> {
    let Window {
        mut best,
        mut left,
        mut right,
    } = window;

    while left <= right {
        search.check_cancelled()?;

        if right - left <= LINEAR_SCAN_WIDTH {
            for page in (left..=right).rev() {
                if search.probe(page)? {
                    return Ok(page);
                }
            }
            return Ok(best);
        }

        let third = (right - left) / 3;
        let mid1 = left + third;
        let mid2 = left + 2 * (right - left) / 3;
        let (mid1_has_data, mid2_has_data) = probe_pair(search, mid1, mid2)?;

        if mid2_has_data {
            best = mid2;
            left = mid2 + 1;
        } else if mid1_has_data {
            best = mid1;
            left = mid1 + 1;
            right = mid2 - 1;
        } else {
            right = mid1 - 1;
        }
    }
    Ok(best)
}

/// Probe `first` on this thread and `second` on a scoped worker, waiting for
/// both. When both fail, `first`'s error wins.
fn probe_pair<P: Probe>(
    search: &mut Search<'_, P>,
    first: u32,
    second: u32,
) -> Result<(bool, bool), SearchError<P::Error>> {
    let probe = search.probe_fn();
    let (a, b) = thread::scope(|s| {
        let worker = s.spawn(move || probe.has_data(second));
        let a = probe.has_data(first);
        let b = match worker.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        (a, b)
    });

    let a = a.map_err(|source| SearchError::Probe { page: first, source })?;
    search.record(first, a);
    let b = b.map_err(|source| SearchError::Probe { page: second, source })?;
    search.record(second, b);
    Ok((a, b))
}
