//! Last-page discovery for listings that never report a total.
//!
//! # Overview
//! amoCRM list endpoints return `_links.next` but no item or page count.
//! The finders here answer "what is the last non-empty page?" with
//! O(log n) probes, where a probe is any monotonic predicate
//! `page -> has data`.
//!
//! # Design
//! - Both finders share the same front half: probe page 1, then double the
//!   page until an empty one turns up or the ceiling is reached. Each step
//!   depends on the previous answer, so this phase is always sequential.
//! - `SequentialFinder` then bisects the bracket with one probe in flight.
//! - `ConcurrentFinder` splits the bracket in three and probes both interior
//!   points at once, trading extra requests for fewer round trips.
//! - The probe is required to be monotonic: once a page is empty every later
//!   page is empty. Violations (inserts or deletes racing the search) are not
//!   detected; the answer is then plausible but unspecified.
//! - Reaching the ceiling with data still present returns the ceiling. This
//!   cannot tell "exactly ceiling" from "more than ceiling" apart; a `warn!`
//!   is emitted and callers needing exactness pass a larger ceiling.

pub mod adapter;
pub mod concurrent;
pub mod sequential;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::normalize_ceiling;
use crate::error::SearchError;

pub use adapter::{links_probe, LinksProbe};
pub use concurrent::ConcurrentFinder;
pub use sequential::SequentialFinder;

/// Answers whether a page of a remote collection holds any data.
///
/// Implementations must be safe to call from two threads at once; the
/// concurrent finder overlaps probes.
pub trait Probe: Sync {
    type Error: std::error::Error + Send + 'static;

    fn has_data(&self, page: u32) -> Result<bool, Self::Error>;
}

impl<F, E> Probe for F
where
    F: Fn(u32) -> Result<bool, E> + Sync,
    E: std::error::Error + Send + 'static,
{
    type Error = E;

    fn has_data(&self, page: u32) -> Result<bool, E> {
        self(page)
    }
}

/// Common entry point of both finders.
pub trait BoundaryFinder {
    /// Return the last page with data, or 0 when page 1 is empty.
    ///
    /// `ceiling` bounds the highest page probed; 0 selects
    /// [`DEFAULT_CEILING`](crate::config::DEFAULT_CEILING).
    fn find<P: Probe>(&self, probe: &P, ceiling: u32) -> Result<u32, SearchError<P::Error>>;
}

/// Cooperative cancellation flag shared between a caller and a search.
///
/// Finders sample it at the top of every loop iteration. Probes already in
/// flight are allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Open bracket `(best, right + 1)`: `best` is known to have data, `right + 1`
/// is known to be empty, and every page in `left..=right` is still unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Window {
    pub best: u32,
    pub left: u32,
    pub right: u32,
}

impl Window {
    fn between(non_empty: u32, empty: u32) -> Self {
        Self {
            best: non_empty,
            left: non_empty + 1,
            right: empty - 1,
        }
    }
}

enum Growth {
    /// The ceiling page itself has data.
    Saturated,
    Bracketed(Window),
}

/// Per-invocation bookkeeping shared by both finders.
pub(crate) struct Search<'a, P: Probe> {
    probe: &'a P,
    cancel: &'a CancelToken,
    probes: u32,
}

impl<'a, P: Probe> Search<'a, P> {
    fn new(probe: &'a P, cancel: &'a CancelToken) -> Self {
        Self {
            probe,
            cancel,
            probes: 0,
        }
    }

    pub(crate) fn probe_fn(&self) -> &'a P {
        self.probe
    }

    pub(crate) fn check_cancelled(&self) -> Result<(), SearchError<P::Error>> {
        if self.cancel.is_cancelled() {
            debug!(probes = self.probes, "boundary search cancelled");
            return Err(SearchError::Cancelled);
        }
        Ok(())
    }

    pub(crate) fn probe(&mut self, page: u32) -> Result<bool, SearchError<P::Error>> {
        self.probes += 1;
        let has_data = self
            .probe
            .has_data(page)
            .map_err(|source| SearchError::Probe { page, source })?;
        debug!(page, has_data, "probe");
        Ok(has_data)
    }

    /// Account for probes issued outside `probe`, e.g. on worker threads.
    pub(crate) fn record(&mut self, page: u32, has_data: bool) {
        self.probes += 1;
        debug!(page, has_data, "probe");
    }

    /// Doubling phase: 2, 4, 8, ... clamped to `ceiling`.
    fn grow(&mut self, ceiling: u32) -> Result<Growth, SearchError<P::Error>> {
        let mut page = 1;
        while page < ceiling {
            self.check_cancelled()?;
            let next = page.saturating_mul(2).min(ceiling);
            if !self.probe(next)? {
                return Ok(Growth::Bracketed(Window::between(page, next)));
            }
            page = next;
        }
        Ok(Growth::Saturated)
    }
}

/// Shared driver: page-1 check, growth, then the finder-specific `refine`.
pub(crate) fn locate<P, R>(
    finder: &'static str,
    probe: &P,
    ceiling: u32,
    cancel: &CancelToken,
    refine: R,
) -> Result<u32, SearchError<P::Error>>
where
    P: Probe,
    R: FnOnce(&mut Search<'_, P>, Window) -> Result<u32, SearchError<P::Error>>,
{
    let ceiling = normalize_ceiling(ceiling);
    let _span = tracing::debug_span!("boundary_search", finder, ceiling).entered();

    let mut search = Search::new(probe, cancel);
    search.check_cancelled()?;

    if !search.probe(1)? {
        info!(finder, last_page = 0, probes = search.probes, "collection is empty");
        return Ok(0);
    }

    let last_page = match search.grow(ceiling)? {
        Growth::Saturated => {
            warn!(finder, ceiling, "ceiling reached with data present; result is a lower bound");
            ceiling
        }
        Growth::Bracketed(window) => refine(&mut search, window)?,
    };

    info!(finder, last_page, probes = search.probes, "boundary found");
    Ok(last_page)
}
