//! # Host Boundary
//!
//! The `wasm32` edge of the bridge: `#[wasm_bindgen]` exports the host page
//! calls, each returning a `js_sys::Promise`. The host's single thread only
//! ever suspends at the promise; the work itself runs on spawned tasks via
//! the bridge crate.
//!
//! The repository engine is a collaborator: the embedding crate calls
//! [`install`] once with its opener, and every export resolves through the
//! bridge built there. `future_to_promise` settles each promise exactly once
//! with either the success value or a string rejection.

#![cfg(target_arch = "wasm32")]

mod fetch;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use caskbridge::bridge::Bridge;
use caskbridge::defer::Rejection;
use caskbridge::fetch::FetchTransport;
use caskbridge::registry::RepoId;
use caskrepo::repo::RepositoryOpener;

use crate::fetch::BrowserFetch;

thread_local! {
    static BRIDGE: RefCell<Option<Rc<Bridge>>> = RefCell::new(None);
}

/// Better panic messages in the console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Wires the repository engine in. The embedding crate calls this once,
/// before any export is used; exports invoked earlier reject.
pub fn install(opener: Arc<dyn RepositoryOpener>) {
    let transport = Arc::new(FetchTransport::new(BrowserFetch));
    BRIDGE.with(|cell| {
        *cell.borrow_mut() = Some(Rc::new(Bridge::new(opener, transport)));
    });
}

fn bridge() -> Result<Rc<Bridge>, JsValue> {
    BRIDGE
        .with(|cell| cell.borrow().clone())
        .ok_or_else(|| JsValue::from_str("bridge not initialized"))
}

fn reject(rejection: Rejection) -> JsValue {
    JsValue::from_str(rejection.message())
}

/// Opens a repository; resolves to its integer handle.
#[wasm_bindgen]
pub fn open(uri: String, passphrase: String) -> js_sys::Promise {
    future_to_promise(async move {
        let bridge = bridge()?;
        let handle = bridge.open(uri, passphrase).wait().await.map_err(reject)?;
        Ok(JsValue::from_f64(handle.0 as f64))
    })
}

/// Resolves to the head revision's identifier.
#[wasm_bindgen]
pub fn head(handle: u32) -> js_sys::Promise {
    future_to_promise(async move {
        let bridge = bridge()?;
        let revision = bridge
            .head(RepoId(handle as u64))
            .wait()
            .await
            .map_err(reject)?;
        Ok(JsValue::from_str(&revision))
    })
}

/// Resolves to a `<tr>` fragment listing the head revision, minus entries
/// matched by the comma-separated exclusion list (empty lists everything).
#[wasm_bindgen]
pub fn ls(handle: u32, excludes: String) -> js_sys::Promise {
    future_to_promise(async move {
        let bridge = bridge()?;
        let rows = bridge
            .list(RepoId(handle as u64), excludes)
            .wait()
            .await
            .map_err(reject)?;
        Ok(JsValue::from_str(&rows))
    })
}

/// Resolves to a `[Uint8Array, string]` pair: the file's content and the
/// name to save it under. `revision_id` is taken verbatim; empty means head.
#[wasm_bindgen(js_name = readFile)]
pub fn read_file(handle: u32, path_b64: String, revision_id: String) -> js_sys::Promise {
    future_to_promise(async move {
        let bridge = bridge()?;
        let download = bridge
            .read_file(RepoId(handle as u64), path_b64, revision_id)
            .wait()
            .await
            .map_err(reject)?;
        let bytes = js_sys::Uint8Array::from(download.bytes.as_slice());
        let pair = js_sys::Array::of2(&bytes, &JsValue::from_str(&download.name));
        Ok(pair.into())
    })
}
