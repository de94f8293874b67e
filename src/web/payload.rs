//! Builds the HTTP-flavoured request section of a notice.

use std::collections::BTreeSet;
use std::sync::Weak;

use serde_json::Value;
use tracing::debug;

use crate::client::ClientConfig;
use crate::payload::{ContextMap, GenericPayloadBuilder, PayloadBuilder, RequestPayload};
use crate::redact::{filter_map, omit_keys, RedactionSet};

use super::{MultiDict, RequestState, WebHost};

/// Payload builder installed by [`WebExtension`](super::WebExtension).
///
/// Holds the host weakly: the host's signals own the listeners that own the
/// client that owns this builder.
pub struct WebPayloadBuilder {
    host: Weak<dyn WebHost>,
    exclude_headers: BTreeSet<String>,
}

impl WebPayloadBuilder {
    /// Creates a builder reading request state from `host`.
    pub fn new(host: Weak<dyn WebHost>, exclude_headers: BTreeSet<String>) -> Self {
        Self {
            host,
            exclude_headers,
        }
    }
}

impl PayloadBuilder for WebPayloadBuilder {
    fn build(&self, context: &ContextMap, config: &ClientConfig) -> RequestPayload {
        let request = self.host.upgrade().and_then(|host| host.current_request());
        match request {
            Some(request) => build_request_payload(
                &request,
                context,
                config.params_filters(),
                &self.exclude_headers,
            ),
            None => {
                debug!("no request in flight, using generic payload");
                GenericPayloadBuilder.build(context, config)
            }
        }
    }
}

/// Assembles the payload for `request`.
///
/// Query values come first and form values replace query values with the
/// same key. Params and session are filtered against `filters`; headers in
/// `exclude_headers` are left out.
///
/// # Examples
///
/// ```
/// use faultline::web::{build_request_payload, RequestState, ViewMeta};
/// use faultline::RedactionSet;
/// use serde_json::{json, Map};
/// use std::collections::BTreeSet;
///
/// let mut request = RequestState::new("http://localhost/error?a=1");
/// request.set_view(ViewMeta::function("app", "error"));
/// request.add_query_param("a", "1");
///
/// let filters = RedactionSet::new();
/// let payload = build_request_payload(&request, &Map::new(), &filters, &BTreeSet::new());
///
/// assert_eq!(payload.url.as_deref(), Some("http://localhost/error"));
/// assert_eq!(payload.action, "error");
/// assert_eq!(payload.params["a"], json!(["1"]));
/// ```
pub fn build_request_payload(
    request: &RequestState,
    context: &ContextMap,
    filters: &RedactionSet,
    exclude_headers: &BTreeSet<String>,
) -> RequestPayload {
    let (component, action) = request
        .view()
        .map(|view| (view.component(), view.action()))
        .unwrap_or_default();

    let mut params = filter_map(&multi_dict_to_map(request.query()), filters);
    params.extend(filter_map(&multi_dict_to_map(request.form()), filters));

    let cgi_data = omit_keys(request.headers(), exclude_headers)
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect();

    RequestPayload {
        url: Some(request.base_url().to_string()),
        component,
        action,
        params,
        session: Some(filter_map(request.session(), filters)),
        cgi_data,
        context: context.clone(),
    }
}

fn multi_dict_to_map(values: &MultiDict) -> ContextMap {
    values
        .iter()
        .map(|(key, list)| {
            let list = list.iter().cloned().map(Value::String).collect();
            (key.clone(), Value::Array(list))
        })
        .collect()
}
