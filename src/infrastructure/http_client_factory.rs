use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

pub struct HttpClientFactory;

impl HttpClientFactory {
    /// HTTP client with exponential-backoff retries on transient failures.
    ///
    /// `request_timeout` bounds each attempt; the caller bounds the whole call.
    pub fn create_client(request_timeout: Duration, max_retries: u32) -> ClientWithMiddleware {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

        let client = Client::builder()
            .pool_max_idle_per_host(2)
            .timeout(request_timeout)
            .connect_timeout(request_timeout.min(Duration::from_secs(5)))
            .build()
            .unwrap_or_else(|_| Client::new());

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }
}
