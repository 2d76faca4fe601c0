use super::{CacheError, Generation, RequestKey, ResponseSnapshot};
use crate::backend::Backend;
use crate::http::request::SendError;
use crate::Request;
use http::StatusCode;
use thiserror::Error;
use url::Url;

/// Why a precache run stored nothing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PrecacheError {
    /// A URL could not be fetched at all.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: Url,
        #[source]
        source: SendError,
    },
    /// A URL answered with a non-`2xx` status.
    #[error("fetching {url} returned status {status}")]
    Status { url: Url, status: StatusCode },
    /// The fetched responses could not be written.
    #[error("failed to store precached responses: {0}")]
    Cache(#[from] CacheError),
}

/// Fetch every URL and store the responses in the generation, all or nothing.
///
/// URLs are fetched in order. The first network failure or non-`2xx` status aborts the run before
/// anything is written, so the generation never holds a partial set. Returns the number of entries
/// stored.
pub async fn add_all(
    generation: &dyn Generation,
    backend: &dyn Backend,
    urls: &[Url],
) -> Result<usize, PrecacheError> {
    let mut entries = Vec::with_capacity(urls.len());
    for url in urls {
        let resp = Request::get(url)
            .send(backend)
            .await
            .map_err(|source| PrecacheError::Fetch {
                url: url.clone(),
                source,
            })?;
        let snapshot = match ResponseSnapshot::capture(&resp) {
            Ok(snapshot) => snapshot,
            Err(CacheError::NotCacheable(status)) => {
                return Err(PrecacheError::Status {
                    url: url.clone(),
                    status,
                })
            }
            Err(e) => return Err(e.into()),
        };
        entries.push((RequestKey::get(url.clone()), snapshot));
    }
    let stored = entries.len();
    generation.put_all(entries).await?;
    log::debug!("precached {} entries into {}", stored, generation.name());
    Ok(stored)
}
