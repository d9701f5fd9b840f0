//! Configuration types for API clients.

/// Configuration for an API client.
///
/// This struct provides the configuration options needed for making HTTP requests to the
/// storefront API. Authentication is not part of the configuration; it is handled by middleware
/// installed on `client`, which reacts to the [`AuthRequired`](crate::AuthRequired) extension.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Base URL path for the API (e.g., "<https://shop.example.com/api>"), without a trailing
    /// slash.
    pub base_path: String,
    /// HTTP client with middleware support.
    pub client: reqwest_middleware::ClientWithMiddleware,
}

impl Configuration {
    /// Create a configuration, normalizing away any trailing slash in `base_path`.
    pub fn new(
        base_path: impl Into<String>,
        client: reqwest_middleware::ClientWithMiddleware,
    ) -> Self {
        let mut base_path = base_path.into();
        while base_path.ends_with('/') {
            base_path.pop();
        }
        Self { base_path, client }
    }

    /// Join an endpoint path such as `/cart/` onto the base path.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_path, path)
        } else {
            format!("{}/{}", self.base_path, path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_without_double_slashes() {
        let config = Configuration::new("http://localhost:8000/api/", reqwest::Client::new().into());

        assert_eq!(config.base_path, "http://localhost:8000/api");
        assert_eq!(config.url("/cart/"), "http://localhost:8000/api/cart/");
        assert_eq!(config.url("favorites/"), "http://localhost:8000/api/favorites/");
    }
}
