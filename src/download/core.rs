//! Streaming service download with proxy selection and progress events

use std::time::Duration;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::proxy::{
    ProxyEnvironment, ProxyResolver, ProxyTransport, SystemEnvironment, effective_strict_tls,
};
use crate::error::{DownloadFailure, InstallError, InstallResult};
use crate::install::progress::{EventSink, InstallEvent};

const DOWNLOAD_CONNECT_TIMEOUT: Duration = Duration::from_secs(30); // Initial connection
const DOWNLOAD_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(300); // 5 min no data
const PROGRESS_THRESHOLD: u64 = 64 * 1024;

/// Downloads a URL into an open file, one attempt per call
#[derive(Debug, Clone)]
pub struct HttpFetcher<E = SystemEnvironment> {
    proxy_resolver: ProxyResolver<E>,
    user_agent: String,
    inactivity_timeout: Duration,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::with_environment(SystemEnvironment)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ProxyEnvironment> HttpFetcher<E> {
    /// Fetcher that reads proxy variables from `env` instead of the process
    pub fn with_environment(env: E) -> Self {
        Self {
            proxy_resolver: ProxyResolver::with_environment(env),
            user_agent: concat!("service-downloader/", env!("CARGO_PKG_VERSION")).to_string(),
            inactivity_timeout: DOWNLOAD_INACTIVITY_TIMEOUT,
        }
    }

    /// Fail the download when no data arrives for `inactivity`
    pub fn with_inactivity_timeout(mut self, inactivity: Duration) -> Self {
        self.inactivity_timeout = inactivity;
        self
    }

    /// Build a client that only uses the proxy chosen by our resolver
    fn client_for(
        &self,
        target: &Url,
        proxy: Option<&str>,
        strict_tls: Option<bool>,
    ) -> Result<reqwest::Client, DownloadFailure> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(DOWNLOAD_CONNECT_TIMEOUT)
            .user_agent(self.user_agent.as_str())
            .no_proxy()
            .danger_accept_invalid_certs(!effective_strict_tls(strict_tls));

        if let Some(params) = self.proxy_resolver.resolve(target, proxy, strict_tls) {
            let endpoint = params.endpoint();
            log::info!("Using proxy {endpoint}");

            let mut proxy = match params.transport {
                ProxyTransport::Http => reqwest::Proxy::http(&endpoint),
                ProxyTransport::Https => reqwest::Proxy::https(&endpoint),
            }
            .map_err(DownloadFailure::Client)?;

            if let Some(auth) = &params.auth {
                proxy = proxy.basic_auth(&auth.username, auth.password.as_deref().unwrap_or(""));
            }

            builder = builder
                .proxy(proxy)
                .danger_accept_invalid_certs(!params.strict_tls);
        }

        builder.build().map_err(DownloadFailure::Client)
    }

    /// Stream `url` into `destination`, returning the number of bytes written.
    ///
    /// Emits `DownloadStart`, `DownloadProgress` and `DownloadEnd` on
    /// `events`. `cancel` is checked while waiting for each chunk.
    pub async fn download(
        &self,
        url: &str,
        destination: &mut tokio::fs::File,
        proxy: Option<&str>,
        strict_tls: Option<bool>,
        events: &EventSink,
        cancel: &CancellationToken,
    ) -> InstallResult<u64> {
        let fail = |source: DownloadFailure| InstallError::Download {
            url: url.to_string(),
            source,
        };

        let target = Url::parse(url).map_err(|e| fail(e.into()))?;
        let client = self.client_for(&target, proxy, strict_tls).map_err(fail)?;

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(InstallError::Cancelled),
            response = client.get(target).send() => {
                response.map_err(|e| fail(DownloadFailure::Transport(e)))?
            }
        };

        if !response.status().is_success() {
            return Err(fail(DownloadFailure::Status(response.status())));
        }

        let total_bytes = response.content_length();
        events.emit(InstallEvent::DownloadStart { size: total_bytes });

        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;
        let mut last_progress_bytes = 0u64;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(InstallError::Cancelled),
                next = timeout(self.inactivity_timeout, stream.next()) => next,
            };

            let chunk = match next {
                Ok(Some(Ok(chunk))) => chunk,
                // The connection closing before Content-Length bytes surfaces as a body error
                Ok(Some(Err(e))) => match total_bytes.filter(|expected| received < *expected) {
                    Some(expected) => {
                        log::debug!("Body ended early after {received} bytes: {e}");
                        return Err(fail(DownloadFailure::Incomplete { received, expected }));
                    }
                    None => return Err(fail(DownloadFailure::Transport(e))),
                },
                Ok(None) => break, // Stream ended normally
                Err(_) => return Err(fail(DownloadFailure::Timeout(self.inactivity_timeout))),
            };

            destination
                .write_all(&chunk)
                .await
                .map_err(|e| fail(DownloadFailure::Write(e)))?;
            received += chunk.len() as u64;

            if received - last_progress_bytes >= PROGRESS_THRESHOLD {
                events.emit(InstallEvent::DownloadProgress { received });
                last_progress_bytes = received;
            }
        }

        if received != last_progress_bytes {
            events.emit(InstallEvent::DownloadProgress { received });
        }

        if let Some(expected) = total_bytes.filter(|expected| received < *expected) {
            return Err(fail(DownloadFailure::Incomplete { received, expected }));
        }

        destination
            .flush()
            .await
            .map_err(|e| fail(DownloadFailure::Write(e)))?;

        events.emit(InstallEvent::DownloadEnd);
        Ok(received)
    }
}
