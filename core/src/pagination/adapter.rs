//! Turning listing calls into probes.
//!
//! A page "has data" when the server answered it with a `_links.self`
//! reference. Past-the-end pages come back as 204 with no body, which parses
//! to empty `Links`, so no entity knowledge is needed.

use crate::client::CrmClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{EntityKind, Links, ListFilter};

use super::Probe;

/// Probe built from any `page -> Links` fetcher.
pub struct LinksProbe<F> {
    fetch: F,
}

/// Wrap a `page -> Links` fetcher as a [`Probe`].
pub fn links_probe<F, E>(fetch: F) -> LinksProbe<F>
where
    F: Fn(u32) -> Result<Links, E> + Sync,
    E: std::error::Error + Send + 'static,
{
    LinksProbe { fetch }
}

impl<F, E> Probe for LinksProbe<F>
where
    F: Fn(u32) -> Result<Links, E> + Sync,
    E: std::error::Error + Send + 'static,
{
    type Error = E;

    fn has_data(&self, page: u32) -> Result<bool, E> {
        Ok((self.fetch)(page)?.has_self())
    }
}

/// Probe over one entity listing, executed through the host's transport.
///
/// Every probe reuses the caller's filter, only `page` changes, so the page
/// count found matches the caller's `limit`.
pub struct PageProbe<'c, X> {
    client: &'c CrmClient,
    kind: EntityKind,
    filter: ListFilter,
    execute: X,
}

impl<'c, X> PageProbe<'c, X>
where
    X: Fn(HttpRequest) -> Result<HttpResponse, ApiError> + Sync,
{
    pub(crate) fn new(client: &'c CrmClient, kind: EntityKind, filter: ListFilter, execute: X) -> Self {
        Self {
            client,
            kind,
            filter,
            execute,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Fetch `page` and return its links.
    pub fn links(&self, page: u32) -> Result<Links, ApiError> {
        let filter = self.filter.clone().with_page(page);
        let request = self.client.build_list(self.kind, &filter);
        let response = (self.execute)(request)?;
        Ok(self.client.parse_list(self.kind, response)?.links)
    }
}

impl<X> Probe for PageProbe<'_, X>
where
    X: Fn(HttpRequest) -> Result<HttpResponse, ApiError> + Sync,
{
    type Error = ApiError;

    fn has_data(&self, page: u32) -> Result<bool, ApiError> {
        Ok(self.links(page)?.has_self())
    }
}
