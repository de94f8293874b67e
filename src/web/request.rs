//! Snapshot of an in-flight HTTP request.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::payload::ContextMap;

/// Multi-valued mapping for query strings and form bodies.
pub type MultiDict = BTreeMap<String, Vec<String>>;

/// Metadata about the view that matched a request.
///
/// # Examples
///
/// ```
/// use faultline::web::ViewMeta;
///
/// let view = ViewMeta::class_based("app.views", "ErrorView", "error").in_blueprint("admin");
/// assert_eq!(view.component(), "app.views.ErrorView");
/// assert_eq!(view.action(), "admin.error");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewMeta {
    module: String,
    class_name: Option<String>,
    endpoint: String,
    blueprint: Option<String>,
}

impl ViewMeta {
    /// A plain function view defined in `module`.
    pub fn function(module: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            class_name: None,
            endpoint: endpoint.into(),
            blueprint: None,
        }
    }

    /// A class-based view `class_name` defined in `module`.
    pub fn class_based(
        module: impl Into<String>,
        class_name: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            class_name: Some(class_name.into()),
            ..Self::function(module, endpoint)
        }
    }

    /// Places the view under a blueprint, which qualifies its action.
    pub fn in_blueprint(mut self, blueprint: impl Into<String>) -> Self {
        self.blueprint = Some(blueprint.into());
        self
    }

    /// Module path, with the class name appended for class-based views.
    pub fn component(&self) -> String {
        match &self.class_name {
            Some(class_name) => format!("{}.{}", self.module, class_name),
            None => self.module.clone(),
        }
    }

    /// Endpoint name, prefixed with the blueprint when there is one.
    pub fn action(&self) -> String {
        match &self.blueprint {
            Some(blueprint) => format!("{}.{}", blueprint, self.endpoint),
            None => self.endpoint.clone(),
        }
    }
}

/// Everything the web payload needs from the request being handled.
///
/// Hosts fill this in as they dispatch; all values are raw and unfiltered.
///
/// # Examples
///
/// ```
/// use faultline::web::{RequestState, ViewMeta};
///
/// let mut request = RequestState::new("http://localhost/error?a=1");
/// request.set_view(ViewMeta::function("app", "error"));
/// request.add_query_param("a", "1");
/// request.add_header("Host", "localhost");
///
/// assert_eq!(request.base_url(), "http://localhost/error");
/// assert_eq!(request.query()["a"], vec!["1".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestState {
    url: String,
    view: Option<ViewMeta>,
    query: MultiDict,
    form: MultiDict,
    session: ContextMap,
    headers: BTreeMap<String, String>,
}

impl RequestState {
    /// Creates a request snapshot for `url`. Everything else starts empty.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the matched view.
    pub fn set_view(&mut self, view: ViewMeta) {
        self.view = Some(view);
    }

    /// Appends a query-string value under `key`.
    pub fn add_query_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.entry(key.into()).or_default().push(value.into());
    }

    /// Appends a form-body value under `key`.
    pub fn add_form_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.form.entry(key.into()).or_default().push(value.into());
    }

    /// Stores a session value.
    pub fn set_session_value(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.session.insert(key.into(), value.into());
    }

    /// Sets a header, replacing any previous value.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Full request URL as received.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request URL without query string or fragment.
    pub fn base_url(&self) -> &str {
        let end = self.url.find(&['?', '#'][..]).unwrap_or(self.url.len());
        &self.url[..end]
    }

    /// The matched view, if routing succeeded.
    pub fn view(&self) -> Option<&ViewMeta> {
        self.view.as_ref()
    }

    /// Query-string values.
    pub fn query(&self) -> &MultiDict {
        &self.query
    }

    /// Form-body values.
    pub fn form(&self) -> &MultiDict {
        &self.form
    }

    /// Session data.
    pub fn session(&self) -> &ContextMap {
        &self.session
    }

    /// Request headers.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}
