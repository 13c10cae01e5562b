//! # Callback-Fetch Transport Adapter
//!
//! The repository engine wants a synchronous "send request, get response"
//! call; the host only offers an asynchronous, callback-based fetch. This
//! adapter bridges the two: it hands the host a one-shot reply slot, then
//! parks the calling task on the slot's channels until the host's own
//! scheduling turn delivers a response, an error, or the timeout fires.
//!
//! The timeout bounds how long the *caller* waits. The underlying fetch is
//! not cancelled (no host cancellation token is assumed); a late reply lands
//! on a dropped receiver and disappears.

use std::time::Duration;

use tokio::sync::oneshot;
use tracing::debug;
use tracing::warn;

use futures::future::Either;
use futures::future::select;

use caskrepo::marker::MaybeSend;
use caskrepo::marker::MaybeSync;
use caskrepo::transport;
use caskrepo::transport::HttpRequest;
use caskrepo::transport::HttpResponse;
use caskrepo::transport::Transport;

use crate::task;

/// Hard bound on one round trip.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The callback-only fetch primitive furnished by the host.
///
/// `start` must not block: it kicks the request off and returns, delivering
/// the outcome later through `reply`. The native test suite implements this
/// with plain structs; the web boundary implements it over `fetch()`.
pub trait HostFetch: MaybeSend + MaybeSync + 'static {
    fn start(&self, request: HttpRequest, reply: FetchReply);
}

/// One-shot reply slot handed to the host per request.
///
/// Holds one success channel and one error channel. Consuming `self` makes
/// duplicate delivery impossible; dropping it unfired is observed by the
/// adapter as an abandoned request.
pub struct FetchReply {
    ok: oneshot::Sender<HttpResponse>,
    err: oneshot::Sender<String>,
}

impl FetchReply {
    pub fn respond(self, response: HttpResponse) {
        let _ = self.ok.send(response);
    }

    pub fn fail(self, message: impl Into<String>) {
        let _ = self.err.send(message.into());
    }
}

/// [`Transport`] implementation over a [`HostFetch`].
pub struct FetchTransport<F: HostFetch> {
    fetch: F,
}

impl<F: HostFetch> FetchTransport<F> {
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
impl<F: HostFetch> Transport for FetchTransport<F> {
    async fn round_trip(&self, mut request: HttpRequest) -> transport::Result<HttpResponse> {
        // Hosts distinguish "no body" from "empty body" for verbs like GET.
        if request.body.as_deref().is_some_and(|b| b.is_empty()) {
            request.body = None;
        }

        debug!(method = %request.method, url = %request.url, "starting host fetch");

        let (ok_tx, ok_rx) = oneshot::channel();
        let (err_tx, err_rx) = oneshot::channel();
        self.fetch.start(
            request,
            FetchReply {
                ok: ok_tx,
                err: err_tx,
            },
        );

        let settled = async {
            // The reply slot fires one channel and drops the other, so a
            // closed channel means "look at the other one", not failure.
            match select(ok_rx, err_rx).await {
                Either::Left((Ok(response), _)) => Ok(response),
                Either::Right((Ok(message), _)) => Err(transport::Error::Fetch(message)),
                Either::Left((Err(_), err_rx)) => match err_rx.await {
                    Ok(message) => Err(transport::Error::Fetch(message)),
                    Err(_) => Err(transport::Error::Io("host fetch abandoned the request".into())),
                },
                Either::Right((Err(_), ok_rx)) => match ok_rx.await {
                    Ok(response) => Ok(response),
                    Err(_) => Err(transport::Error::Io("host fetch abandoned the request".into())),
                },
            }
        };

        tokio::select! {
            outcome = settled => outcome,
            _ = task::sleep(REQUEST_TIMEOUT) => {
                warn!(timeout = ?REQUEST_TIMEOUT, "host fetch timed out");
                Err(transport::Error::Timeout)
            }
        }
    }
}
