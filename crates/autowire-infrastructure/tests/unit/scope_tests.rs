//! Tests for scoped service overrides

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Barrier};
use std::thread;

use autowire_domain::Instance;
use autowire_infrastructure::ServiceSource;
use serde_json::json;

use crate::fixtures::{Clock, Handler, Request, container};

fn scoped_config() -> serde_json::Value {
    json!({ "services": { "request": "Request", "handler": "Handler" } })
}

fn request(path: &str) -> Instance {
    Instance::new("Request", Request { path: path.to_string() })
}

#[test]
fn test_binding_is_visible_inside_and_restored_after() {
    let container = container(scoped_config());
    let original = container.get("request").expect("request");

    let seen = container
        .run_scope([("request", ServiceSource::from(request("/scoped")))], |scoped| {
            scoped.get_as::<Request>("request").map(|r| r.path.clone())
        })
        .expect("scope")
        .expect("request");

    assert_eq!(seen, "/scoped");
    assert!(container.get("request").expect("request").ptr_eq(&original));
}

#[test]
fn test_unset_service_is_unset_again_after_scope() {
    let container = container(scoped_config());
    container
        .run_scope([("request", ServiceSource::from(request("/scoped")))], |_| ())
        .expect("scope");

    assert!(!container.is_created("request"));
    assert_eq!(container.get_as::<Request>("request").expect("request").path, "/");
}

#[test]
fn test_services_created_in_scope_are_evicted() {
    let container = container(scoped_config());

    let path = container
        .run_scope([("request", ServiceSource::from(request("/inner")))], |scoped| {
            scoped.get_as::<Handler>("handler").map(|h| h.request.path.clone())
        })
        .expect("scope")
        .expect("handler");
    assert_eq!(path, "/inner");

    assert!(!container.is_created("handler"));
    let handler = container.get_as::<Handler>("handler").expect("handler");
    assert_eq!(handler.request.path, "/");
}

#[test]
fn test_failure_inside_scope_still_restores() {
    let container = container(scoped_config());
    let original = container.get("request").expect("request");

    let result = container
        .run_scope([("request", ServiceSource::from(request("/scoped")))], |scoped| {
            scoped.get("missing").map(|_| ())
        })
        .expect("scope");
    assert!(result.is_err());
    assert!(container.get("request").expect("request").ptr_eq(&original));
}

#[test]
fn test_panic_inside_scope_still_restores() {
    let container = container(scoped_config());
    let original = container.get("request").expect("request");

    let outcome = catch_unwind(AssertUnwindSafe(|| -> autowire_domain::Result<()> {
        container.run_scope([("request", ServiceSource::from(request("/scoped")))], |_| {
            panic!("scoped work failed");
        })
    }));
    assert!(outcome.is_err());
    assert!(container.get("request").expect("request").ptr_eq(&original));
}

#[test]
fn test_factory_binding_is_scoped() {
    let container = container(scoped_config());
    let bindings = [(
        "request",
        ServiceSource::factory(|_| Ok(Instance::new("Request", Request { path: "/factory".to_string() }))),
    )];

    let path = container
        .run_scope(bindings, |scoped| scoped.get_as::<Request>("request").map(|r| r.path.clone()))
        .expect("scope")
        .expect("request");
    assert_eq!(path, "/factory");
    assert_eq!(container.get_as::<Request>("request").expect("request").path, "/");
}

#[test]
fn test_binding_of_wrong_type_is_rejected_and_nothing_leaks() {
    let container = container(scoped_config());
    let bindings = [("handler", ServiceSource::from(Instance::new("Clock", Clock)))];

    let error = container.run_scope(bindings, |_| ()).err().expect("mismatch");
    assert_eq!(
        error.to_string(),
        "Service 'handler' must be instance of Handler, Clock given."
    );
    assert!(!container.is_created("handler"));
}

#[test]
fn test_scope_is_only_seen_by_its_thread() {
    let container = container(scoped_config());
    let original = container.get("request").expect("request");
    let entered = Arc::new(Barrier::new(2));
    let checked = Arc::new(Barrier::new(2));

    let other = {
        let container = container.clone();
        let (entered, checked) = (Arc::clone(&entered), Arc::clone(&checked));
        thread::spawn(move || {
            entered.wait();
            let seen = container.get("request").expect("request");
            let handler = container.get_as::<Handler>("handler").expect("handler");
            checked.wait();
            (seen, handler.request.path.clone())
        })
    };

    let (handler_path, request_path) = container
        .run_scope([("request", ServiceSource::from(request("/scoped")))], |scoped| {
            let handler = scoped.get_as::<Handler>("handler").map(|h| h.request.path.clone());
            entered.wait();
            checked.wait();
            let path = scoped.get_as::<Request>("request").map(|r| r.path.clone());
            (handler, path)
        })
        .expect("scope");
    assert_eq!(handler_path.expect("handler"), "/scoped");
    assert_eq!(request_path.expect("request"), "/scoped");

    let (seen, handler_path) = other.join().expect("other thread");
    assert!(seen.ptr_eq(&original));
    assert_eq!(handler_path, "/");
    assert!(container.get("request").expect("request").ptr_eq(&original));
    assert_eq!(container.get_as::<Handler>("handler").expect("handler").request.path, "/");
}

#[test]
fn test_nested_scope_shadows_and_restores_outer() {
    let container = container(scoped_config());

    let paths = container
        .run_scope([("request", ServiceSource::from(request("/outer")))], |outer| {
            let inner = outer
                .run_scope([("request", ServiceSource::from(request("/inner")))], |inner| {
                    inner.get_as::<Request>("request").map(|r| r.path.clone())
                })
                .expect("inner scope");
            let after = outer.get_as::<Request>("request").map(|r| r.path.clone());
            (inner, after)
        })
        .expect("outer scope");

    assert_eq!(paths.0.expect("inner"), "/inner");
    assert_eq!(paths.1.expect("outer"), "/outer");
    assert_eq!(container.get_as::<Request>("request").expect("request").path, "/");
}
