//! Doubling search followed by plain bisection, one probe at a time.

use crate::error::SearchError;

use super::{locate, BoundaryFinder, CancelToken, Probe, Search, Window};

/// Finds the last page with at most one request in flight.
///
/// Costs about `2 * log2(n)` probes for `n` pages.
#[derive(Debug, Clone, Default)]
pub struct SequentialFinder {
    cancel: CancelToken,
}

impl SequentialFinder {
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

impl BoundaryFinder for SequentialFinder {
    fn find<P: Probe>(&self, probe: &P, ceiling: u32) -> Result<u32, SearchError<P::Error>> {
        locate("sequential", probe, ceiling, &self.cancel, bisect)
    }
}

fn bisect<P: Probe>(search: &mut Search<'_, P>, window: Window) -> Result<u32, SearchError<P::Error>> {
    let Window {
        mut best,
        mut left,
        mut right,
    } = window;

    while left <= right {
        search.check_cancelled()?;
        let mid = left + (right - left) / 2;
        if search.probe(mid)? {
            best = mid;
            left = mid + 1;
        } else {
            // mid >= left >= 1, so this never underflows; when it reaches
            // left - 1 the loop ends.
            right = mid - 1;
        }
    }
    Ok(best)
}
