//! End-to-end tests for web request error reporting.
//!
//! Requests are dispatched through a small in-process host that fires the
//! same lifecycle signals a web framework would.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, OnceLock};
use std::thread;

use common::{
    api_key_config, current_thread_tag, default_headers, division_by_zero, thread_tag,
    TestRequest, TestWebApp,
};
use faultline::web::{ViewMeta, WebExtension, WebHost};
use faultline::{Client, ContextGenerators, Error, GeneratorError, MemoryTransport, FILTERED};
use serde_json::{json, Value};

fn error_app() -> TestWebApp {
    TestWebApp::new()
        .route("/error", ViewMeta::function("tests.flask_app", "error"), |_| {
            Err(division_by_zero())
        })
        .route("/ok", ViewMeta::function("tests.flask_app", "ok"), |_| {
            Ok("ok".to_string())
        })
}

fn install(
    app: TestWebApp,
    config: &[(&str, &str)],
    generators: ContextGenerators,
    report_exceptions: bool,
) -> (Arc<TestWebApp>, WebExtension, Arc<MemoryTransport>) {
    let app = Arc::new(app);
    let transport = Arc::new(MemoryTransport::new());
    let mut extension = WebExtension::new(app.clone(), transport.clone());
    extension.install(&api_key_config(config), generators, report_exceptions);
    (app, extension, transport)
}

fn headers_json(overrides: &[(&str, &str)]) -> Value {
    let mut headers = default_headers();
    for (name, value) in overrides {
        headers.insert(name.to_string(), value.to_string());
    }
    json!(headers)
}

#[test]
fn failing_request_is_reported_with_full_payload() {
    let (app, extension, transport) = install(
        error_app(),
        &[("FAULTLINE_ENVIRONMENT", "test_environment")],
        ContextGenerators::new(),
        true,
    );

    let status = app.dispatch(TestRequest::get("/error?a=1&b=2&b=3")).unwrap();

    assert_eq!(status, 500);
    let notices = transport.notices();
    assert_eq!(notices.len(), 1);
    let notice = &notices[0];
    assert_eq!(notice.error.class(), "ZeroDivisionError");
    assert_eq!(notice.server.environment_name, "test_environment");
    assert_eq!(
        extension.client().unwrap().environment().as_deref(),
        Some("test_environment")
    );
    assert_eq!(notice.request.url.as_deref(), Some("http://localhost/error"));
    assert_eq!(notice.request.component, "tests.flask_app");
    assert_eq!(notice.request.action, "error");
    assert_eq!(
        Value::Object(notice.request.params.clone()),
        json!({"a": ["1"], "b": ["2", "3"]})
    );
    assert_eq!(notice.request.session, Some(serde_json::Map::new()));
    assert_eq!(Value::Object(notice.request.cgi_data.clone()), headers_json(&[]));
    assert!(notice.request.context.is_empty());
}

#[test]
fn successful_request_sends_nothing() {
    let (app, _extension, transport) =
        install(error_app(), &[], ContextGenerators::new(), true);

    assert_eq!(app.dispatch(TestRequest::get("/ok")).unwrap(), 200);
    assert!(transport.is_empty());
}

#[test]
fn generators_populate_context() {
    let generators = ContextGenerators::new()
        .with("ringbearer", || Ok("frodo"))
        .with("user", || Ok(json!({"id": 7})));
    let (app, _extension, transport) = install(error_app(), &[], generators, true);

    app.dispatch(TestRequest::get("/error")).unwrap();

    let notice = &transport.notices()[0];
    assert_eq!(
        Value::Object(notice.request.context.clone()),
        json!({"ringbearer": "frodo", "user": {"id": 7}})
    );
}

#[test]
fn generators_run_once_per_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let generators = ContextGenerators::new().with("n", move || {
        Ok(counter.fetch_add(1, Ordering::SeqCst) as u64)
    });
    let (app, _extension, transport) = install(error_app(), &[], generators, true);

    app.dispatch(TestRequest::get("/ok")).unwrap();
    app.dispatch(TestRequest::get("/error")).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(transport.notices()[0].request.context["n"], json!(1));
}

#[test]
fn context_is_active_during_request_and_empty_after() {
    let client: Arc<OnceLock<Arc<Client>>> = Arc::new(OnceLock::new());
    let observed = Arc::new(OnceLock::new());

    let app = {
        let client = client.clone();
        let observed = observed.clone();
        TestWebApp::new().route("/peek", ViewMeta::function("app", "peek"), move |_| {
            if let Some(client) = client.get() {
                let _ = observed.set(client.context());
            }
            Ok("ok".to_string())
        })
    };
    let generators = ContextGenerators::new().with("ringbearer", || Ok("frodo"));
    let app = Arc::new(app);
    let transport = Arc::new(MemoryTransport::new());
    let mut extension = WebExtension::new(app.clone(), transport);
    let _ = client.set(extension.install(&api_key_config(&[]), generators, true));

    app.dispatch(TestRequest::get("/peek")).unwrap();

    assert_eq!(observed.get().unwrap()["ringbearer"], json!("frodo"));
    assert!(client.get().unwrap().context().is_empty());
}

#[test]
fn authorization_headers_are_excluded_by_default() {
    let (app, _extension, transport) =
        install(error_app(), &[], ContextGenerators::new(), true);

    app.dispatch(
        TestRequest::get("/error")
            .header("Authorization", "Bearer 123")
            .header("Proxy-Authorization", "Basic xyz")
            .header("X-Request-Id", "r-1"),
    )
    .unwrap();

    let cgi_data = &transport.notices()[0].request.cgi_data;
    assert!(!cgi_data.contains_key("Authorization"));
    assert!(!cgi_data.contains_key("Proxy-Authorization"));
    assert_eq!(cgi_data["X-Request-Id"], json!("r-1"));
}

#[test]
fn custom_exclude_headers_replace_defaults() {
    let (app, _extension, transport) = install(
        error_app(),
        &[("FAULTLINE_EXCLUDE_HEADERS", "User-Agent, X-Secret")],
        ContextGenerators::new(),
        true,
    );

    app.dispatch(
        TestRequest::get("/error")
            .header("Authorization", "Bearer 123")
            .header("X-Secret", "s"),
    )
    .unwrap();

    let cgi_data = &transport.notices()[0].request.cgi_data;
    assert!(!cgi_data.contains_key("User-Agent"));
    assert!(!cgi_data.contains_key("X-Secret"));
    assert_eq!(cgi_data["Authorization"], json!("Bearer 123"));
}

#[test]
fn reporting_disabled_still_manages_context() {
    let (app, extension, transport) = install(
        error_app(),
        &[],
        ContextGenerators::new().with("k", || Ok("v")),
        false,
    );

    assert_eq!(app.dispatch(TestRequest::get("/error")).unwrap(), 500);

    assert!(transport.is_empty());
    assert!(!extension.report_exceptions());
    assert_eq!(app.signals().request_started.receiver_count(), 1);
    assert_eq!(app.signals().got_request_exception.receiver_count(), 0);
}

#[test]
fn missing_api_key_sends_nothing() {
    let app = Arc::new(error_app());
    let transport = Arc::new(MemoryTransport::new());
    let mut extension = WebExtension::new(app.clone(), transport.clone());

    let client = extension.install(
        &std::collections::BTreeMap::<String, String>::new(),
        ContextGenerators::new(),
        true,
    );
    assert_eq!(app.dispatch(TestRequest::get("/error")).unwrap(), 500);

    assert!(!client.is_configured());
    assert!(transport.is_empty());
}

#[test]
fn blueprint_qualifies_action() {
    let app = TestWebApp::new().route(
        "/blueprint/error",
        ViewMeta::function("tests.flask_app", "error").in_blueprint("blueprint"),
        |_| Err(division_by_zero()),
    );
    let (app, _extension, transport) = install(app, &[], ContextGenerators::new(), true);

    app.dispatch(TestRequest::get("/blueprint/error")).unwrap();

    let notice = &transport.notices()[0];
    assert_eq!(notice.request.component, "tests.flask_app");
    assert_eq!(notice.request.action, "blueprint.error");
    assert_eq!(notice.request.url.as_deref(), Some("http://localhost/blueprint/error"));
}

#[test]
fn class_based_view_appends_class_to_component() {
    let app = TestWebApp::new().route(
        "/view/error",
        ViewMeta::class_based("tests.flask_app", "ErrorView", "error_view"),
        |_| Err(division_by_zero()),
    );
    let (app, _extension, transport) = install(app, &[], ContextGenerators::new(), true);

    app.dispatch(TestRequest::get("/view/error")).unwrap();

    let notice = &transport.notices()[0];
    assert_eq!(notice.request.component, "tests.flask_app.ErrorView");
    assert_eq!(notice.request.action, "error_view");
}

#[test]
fn form_and_query_params_are_filtered() {
    let (app, _extension, transport) = install(
        error_app(),
        &[("FAULTLINE_PARAMS_FILTERS", "password, secret")],
        ContextGenerators::new(),
        true,
    );

    app.dispatch(
        TestRequest::get("/error?a=1&secret=q")
            .form("foo", "bar")
            .form("password", "hunter2"),
    )
    .unwrap();

    let request = &transport.notices()[0].request;
    assert_eq!(
        Value::Object(request.params.clone()),
        json!({"a": ["1"], "secret": FILTERED, "foo": ["bar"], "password": FILTERED})
    );
    assert_eq!(request.cgi_data["Content-Type"], json!("application/x-www-form-urlencoded"));
    assert_eq!(request.cgi_data["Content-Length"], json!("24"));
}

#[test]
fn form_value_wins_over_query_value_with_same_key() {
    let (app, _extension, transport) =
        install(error_app(), &[], ContextGenerators::new(), true);

    app.dispatch(TestRequest::get("/error?a=query").form("a", "form")).unwrap();

    assert_eq!(transport.notices()[0].request.params["a"], json!(["form"]));
}

#[test]
fn session_values_are_filtered() {
    let app = TestWebApp::new().route("/login", ViewMeta::function("app", "login"), |request| {
        request.set_session_value("user_id", 42);
        request.set_session_value("password", "hunter2");
        Err(division_by_zero())
    });
    let (app, _extension, transport) = install(app, &[], ContextGenerators::new(), true);

    app.dispatch(TestRequest::get("/login")).unwrap();

    let session = transport.notices()[0].request.session.clone().unwrap();
    assert_eq!(
        Value::Object(session),
        json!({"user_id": 42, "password": FILTERED})
    );
}

#[test]
fn teardown_disconnects_every_listener() {
    let (app, mut extension, transport) =
        install(error_app(), &[], ContextGenerators::new(), true);

    extension.teardown();
    app.dispatch(TestRequest::get("/error")).unwrap();

    assert!(!extension.is_installed());
    assert!(transport.is_empty());
    let signals = app.signals();
    assert_eq!(signals.request_started.receiver_count(), 0);
    assert_eq!(signals.request_tearing_down.receiver_count(), 0);
    assert_eq!(signals.got_request_exception.receiver_count(), 0);
}

#[test]
fn dropping_extension_disconnects_listeners() {
    let (app, extension, _transport) =
        install(error_app(), &[], ContextGenerators::new(), true);

    drop(extension);

    assert_eq!(app.signals().request_started.receiver_count(), 0);
}

#[test]
fn reinstall_does_not_duplicate_reports() {
    let (app, mut extension, transport) =
        install(error_app(), &[], ContextGenerators::new(), true);

    extension.install(&api_key_config(&[]), ContextGenerators::new(), true);
    app.dispatch(TestRequest::get("/error")).unwrap();

    assert_eq!(transport.len(), 1);
}

#[test]
fn generator_failure_aborts_request() {
    let handled = Arc::new(AtomicUsize::new(0));
    let app = {
        let handled = handled.clone();
        TestWebApp::new().route("/ok", ViewMeta::function("app", "ok"), move |_| {
            handled.fetch_add(1, Ordering::SeqCst);
            Ok("ok".to_string())
        })
    };
    let generators = ContextGenerators::new()
        .with("ok", || Ok(1))
        .with("user", || Err::<Value, _>(GeneratorError::new("session store down")));
    let (app, extension, transport) = install(app, &[], generators, true);

    let result = app.dispatch(TestRequest::get("/ok"));

    match result {
        Err(Error::ContextGenerator { name, source }) => {
            assert_eq!(name, "user");
            assert_eq!(source.message(), "session store down");
        }
        other => panic!("expected generator failure, got {:?}", other),
    }
    assert_eq!(handled.load(Ordering::SeqCst), 0);
    assert!(transport.is_empty());
    assert!(extension.client().unwrap().context().is_empty());
}

#[test]
fn form_post_merges_over_query_with_filters() {
    let (app, _extension, transport) = install(
        error_app(),
        &[("FAULTLINE_PARAMS_FILTERS", "skip,password")],
        ContextGenerators::new(),
        true,
    );

    app.dispatch(
        TestRequest::get("/error?a=1&b=2&b=3")
            .form("foo", "bar")
            .form("password", "qwerty")
            .form("skip", "secret")
            .form("a", "newvalue"),
    )
    .unwrap();

    assert_eq!(
        Value::Object(transport.notices()[0].request.params.clone()),
        json!({
            "a": ["newvalue"],
            "b": ["2", "3"],
            "foo": ["bar"],
            "password": FILTERED,
            "skip": FILTERED,
        })
    );
}

#[test]
fn concurrent_requests_keep_their_own_context() {
    let both_started = Arc::new(Barrier::new(2));
    let fast_finished = Arc::new(Barrier::new(2));
    let app = {
        let (started_fast, started_slow) = (both_started.clone(), both_started.clone());
        let finished = fast_finished.clone();
        TestWebApp::new()
            .route("/fast", ViewMeta::function("app", "fast"), move |_| {
                started_fast.wait();
                Ok("ok".to_string())
            })
            .route("/slow", ViewMeta::function("app", "slow"), move |_| {
                started_slow.wait();
                finished.wait();
                Err(division_by_zero())
            })
    };
    let generators = ContextGenerators::new().with("thread", thread_tag);
    let (app, _extension, transport) = install(app, &[], generators, true);

    let fast = {
        let app = app.clone();
        thread::spawn(move || {
            let status = app.dispatch(TestRequest::get("/fast"));
            fast_finished.wait();
            status.unwrap()
        })
    };
    let slow = {
        let app = app.clone();
        thread::spawn(move || {
            let status = app.dispatch(TestRequest::get("/slow?who=slow")).unwrap();
            (status, current_thread_tag())
        })
    };

    assert_eq!(fast.join().unwrap(), 200);
    let (status, slow_thread) = slow.join().unwrap();
    assert_eq!(status, 500);

    let notices = transport.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].request.action, "slow");
    assert_eq!(notices[0].request.params["who"], json!(["slow"]));
    assert_eq!(notices[0].request.context["thread"], json!(slow_thread));
}
