use crate::Request;
use http::Method;
use std::fmt;
use url::Url;

/// Identifies an entry in a cache generation: the request method and its absolute URL.
///
/// The URL fragment is never part of the key, so `/index.html#about` and `/index.html` share an
/// entry.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RequestKey {
    method: Method,
    url: Url,
}

impl RequestKey {
    pub fn new(method: Method, mut url: Url) -> Self {
        url.set_fragment(None);
        Self { method, url }
    }

    /// The key of a `GET` for the given URL.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn from_request(req: &Request) -> Self {
        Self::new(req.get_method().clone(), req.get_url().clone())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_is_not_part_of_the_key() {
        let a = RequestKey::get(Url::parse("https://example.com/index.html#about").unwrap());
        let b = RequestKey::from_request(&Request::get("https://example.com/index.html"));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "GET https://example.com/index.html");
    }

    #[test]
    fn query_is_part_of_the_key() {
        let a = RequestKey::get(Url::parse("https://example.com/api/data?page=1").unwrap());
        let b = RequestKey::get(Url::parse("https://example.com/api/data?page=2").unwrap());
        assert_ne!(a, b);
    }
}
