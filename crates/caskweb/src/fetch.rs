//! Browser implementation of the host fetch capability.
//!
//! `fetch()` delivers its response in two asynchronous steps: the `Response`
//! object first (headers), then the body once `arrayBuffer()` resolves. Both
//! continuations run here, on the host's own scheduling turn; the transport
//! adapter's task is parked on the reply slot the whole time.

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_futures::spawn_local;
use web_sys::Request;
use web_sys::RequestInit;
use web_sys::Response;

use caskbridge::fetch::FetchReply;
use caskbridge::fetch::HostFetch;
use caskrepo::transport::HttpRequest;
use caskrepo::transport::HttpResponse;

pub struct BrowserFetch;

impl HostFetch for BrowserFetch {
    fn start(&self, request: HttpRequest, reply: FetchReply) {
        spawn_local(async move {
            match run(request).await {
                Ok(response) => reply.respond(response),
                Err(message) => reply.fail(message),
            }
        });
    }
}

async fn run(request: HttpRequest) -> Result<HttpResponse, String> {
    let init = RequestInit::new();
    init.set_method(&request.method);
    if let Some(body) = &request.body {
        let bytes = js_sys::Uint8Array::from(body.as_slice());
        init.set_body(&bytes.into());
    }

    let js_request =
        Request::new_with_str_and_init(&request.url, &init).map_err(|e| text_of(&e))?;

    let window = web_sys::window().ok_or_else(|| "no global window".to_string())?;

    let response: Response = JsFuture::from(window.fetch_with_request(&js_request))
        .await
        .map_err(|e| text_of(&e))?
        .dyn_into()
        .map_err(|_| "fetch did not yield a Response".to_string())?;

    let buffer = JsFuture::from(response.array_buffer().map_err(|e| text_of(&e))?)
        .await
        .map_err(|e| text_of(&e))?;
    let body = js_sys::Uint8Array::new(&buffer).to_vec();

    Ok(HttpResponse {
        status: response.status(),
        body,
    })
}

fn text_of(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}
