//! Unit tests for the deferred machinery, the handle table, and the
//! callback-fetch adapter, all against mock hosts.

use std::sync::Arc;
use std::sync::Mutex;

use caskrepo::transport;
use caskrepo::transport::HttpRequest;
use caskrepo::transport::HttpResponse;
use caskrepo::transport::Transport;

use crate::defer;
use crate::defer::Rejection;
use crate::fetch::FetchReply;
use crate::fetch::FetchTransport;
use crate::fetch::HostFetch;
use crate::listing::escape_html;
use crate::listing::human_size;
use crate::registry::Registry;

fn request(method: &str, url: &str, body: Option<Vec<u8>>) -> HttpRequest {
    HttpRequest::new(method, url, body)
}

// ==== DEFERRED RESULTS ====

#[tokio::test]
async fn test_deferred_resolves_once() {
    let (completion, deferred) = defer::deferred();
    completion.resolve(7u32);
    assert_eq!(deferred.wait().await.unwrap(), 7);
}

#[tokio::test]
async fn test_deferred_rejects_with_message() {
    let (completion, deferred) = defer::deferred::<u32>();
    completion.reject("no such thing");
    let rejection = deferred.wait().await.unwrap_err();
    assert_eq!(rejection.message(), "no such thing");
}

#[tokio::test]
async fn test_dropped_completion_rejects_instead_of_hanging() {
    let (completion, deferred) = defer::deferred::<u32>();
    drop(completion);
    let rejection = deferred.wait().await.unwrap_err();
    assert!(rejection.message().contains("abandoned"));
}

#[tokio::test]
async fn test_spawn_bridged_success() {
    let deferred = defer::spawn_bridged(async { Ok::<_, Rejection>("done".to_string()) });
    assert_eq!(deferred.wait().await.unwrap(), "done");
}

#[tokio::test]
async fn test_spawn_bridged_error_becomes_rejection() {
    let deferred =
        defer::spawn_bridged(async { Err::<u32, _>(Rejection::new("engine exploded")) });
    let rejection = deferred.wait().await.unwrap_err();
    assert_eq!(rejection.message(), "engine exploded");
}

#[tokio::test]
async fn test_spawn_bridged_traps_panics() {
    let deferred = defer::spawn_bridged(async {
        if true {
            panic!("boom");
        }
        Ok::<u32, Rejection>(0)
    });
    let rejection = deferred.wait().await.unwrap_err();
    assert!(rejection.message().contains("panicked"), "{}", rejection);
    assert!(rejection.message().contains("boom"), "{}", rejection);
}

// ==== REGISTRY ====

#[tokio::test]
async fn test_handles_are_monotonic_from_zero() {
    let registry = Registry::new();
    let a = registry.insert(Arc::new(mock::EmptyRepository));
    let b = registry.insert(Arc::new(mock::EmptyRepository));
    assert_eq!(a.0, 0);
    assert_eq!(b.0, 1);
    assert!(registry.get(a).is_ok());
    assert!(registry.get(b).is_ok());
}

#[tokio::test]
async fn test_unknown_handle_message_names_the_handle() {
    let registry = Registry::new();
    let err = registry.get(crate::registry::RepoId(42)).unwrap_err();
    assert_eq!(err.to_string(), "invalid repository handle: 42");
}

// ==== FETCH ADAPTER ====

/// Replies immediately with a fixed response.
struct InstantFetch {
    status: u16,
    body: Vec<u8>,
}

impl HostFetch for InstantFetch {
    fn start(&self, _request: HttpRequest, reply: FetchReply) {
        reply.respond(HttpResponse {
            status: self.status,
            body: self.body.clone(),
        });
    }
}

/// Rejects immediately, as a browser fetch does on network failure.
struct RefusingFetch;

impl HostFetch for RefusingFetch {
    fn start(&self, _request: HttpRequest, reply: FetchReply) {
        reply.fail("connection refused");
    }
}

/// Drops the reply slot without ever firing it.
struct VanishingFetch;

impl HostFetch for VanishingFetch {
    fn start(&self, _request: HttpRequest, reply: FetchReply) {
        drop(reply);
    }
}

/// Keeps the reply slot alive forever and never fires it.
struct StallingFetch {
    parked: Mutex<Vec<FetchReply>>,
}

impl HostFetch for StallingFetch {
    fn start(&self, _request: HttpRequest, reply: FetchReply) {
        self.parked.lock().unwrap().push(reply);
    }
}

/// Records the body option it was handed, then replies 204.
struct BodySpyFetch {
    seen: Arc<Mutex<Option<Option<Vec<u8>>>>>,
}

impl HostFetch for BodySpyFetch {
    fn start(&self, request: HttpRequest, reply: FetchReply) {
        *self.seen.lock().unwrap() = Some(request.body);
        reply.respond(HttpResponse {
            status: 204,
            body: Vec::new(),
        });
    }
}

#[tokio::test]
async fn test_round_trip_success() {
    let transport = FetchTransport::new(InstantFetch {
        status: 200,
        body: b"payload".to_vec(),
    });
    let response = transport
        .round_trip(request("GET", "https://cask.test/r", None))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"payload");
}

#[tokio::test]
async fn test_non_2xx_status_is_not_a_transport_error() {
    let transport = FetchTransport::new(InstantFetch {
        status: 500,
        body: b"server sad".to_vec(),
    });
    let response = transport
        .round_trip(request("GET", "https://cask.test/r", None))
        .await
        .unwrap();
    // Status interpretation belongs to the repository engine.
    assert_eq!(response.status, 500);
}

#[tokio::test]
async fn test_fetch_rejection_surfaces_as_fetch_error() {
    let transport = FetchTransport::new(RefusingFetch);
    let err = transport
        .round_trip(request("GET", "https://cask.test/r", None))
        .await
        .unwrap_err();
    match err {
        transport::Error::Fetch(msg) => assert!(msg.contains("refused")),
        other => panic!("expected Fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_dropped_reply_is_an_io_error() {
    let transport = FetchTransport::new(VanishingFetch);
    let err = transport
        .round_trip(request("GET", "https://cask.test/r", None))
        .await
        .unwrap_err();
    match err {
        transport::Error::Io(_) => {}
        other => panic!("expected Io error, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_fetch_times_out() {
    let transport = FetchTransport::new(StallingFetch {
        parked: Mutex::new(Vec::new()),
    });
    let err = transport
        .round_trip(request("GET", "https://cask.test/r", None))
        .await
        .unwrap_err();
    match err {
        transport::Error::Timeout => {}
        other => panic!("expected Timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_body_becomes_no_body() {
    let seen = Arc::new(Mutex::new(None));
    let transport = FetchTransport::new(BodySpyFetch { seen: seen.clone() });

    transport
        .round_trip(request("GET", "https://cask.test/r", Some(Vec::new())))
        .await
        .unwrap();
    assert_eq!(seen.lock().unwrap().clone(), Some(None));

    transport
        .round_trip(request("PUT", "https://cask.test/r", Some(b"data".to_vec())))
        .await
        .unwrap();
    assert_eq!(seen.lock().unwrap().clone(), Some(Some(b"data".to_vec())));
}

// ==== FORMATTER HELPERS ====

#[test]
fn test_escape_html() {
    assert_eq!(
        escape_html("a<b>&\"c\"'d'"),
        "a&lt;b&gt;&amp;&quot;c&quot;&#39;d&#39;"
    );
    assert_eq!(escape_html("plain/path.txt"), "plain/path.txt");
}

#[test]
fn test_human_size() {
    assert_eq!(human_size(0), "0 B");
    assert_eq!(human_size(1023), "1023 B");
    assert_eq!(human_size(1024), "1.0 KiB");
    assert_eq!(human_size(1536), "1.5 KiB");
    assert_eq!(human_size(64 << 20), "64.0 MiB");
    assert_eq!(human_size(5 * (1 << 30)), "5.0 GiB");
}

mod mock {
    //! A repository that holds nothing; enough to occupy a registry slot.

    use caskrepo::entry::FileEntry;
    use caskrepo::filter::PathFilter;
    use caskrepo::repo;
    use caskrepo::repo::BlockId;
    use caskrepo::repo::EntryReader;
    use caskrepo::repo::Repository;
    use caskrepo::repo::RevisionId;

    #[derive(Debug)]
    pub struct EmptyRepository;

    #[async_trait::async_trait]
    impl Repository for EmptyRepository {
        async fn head(&self) -> repo::Result<RevisionId> {
            Ok(RevisionId("r0".into()))
        }

        async fn read_block(&self, id: &BlockId) -> repo::Result<Vec<u8>> {
            Err(repo::Error::NotFound(id.to_string()))
        }

        async fn list(
            &self,
            _revision: &RevisionId,
            _filter: &PathFilter,
        ) -> repo::Result<Vec<FileEntry>> {
            Ok(Vec::new())
        }

        async fn open_reader(
            &self,
            _revision: &RevisionId,
            _filter: PathFilter,
        ) -> repo::Result<Box<dyn EntryReader>> {
            Ok(Box::new(Drained))
        }
    }

    struct Drained;

    #[async_trait::async_trait]
    impl EntryReader for Drained {
        async fn next_entry(&mut self) -> repo::Result<Option<FileEntry>> {
            Ok(None)
        }
    }
}
