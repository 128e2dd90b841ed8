//! Tests for assembling several applications into one handler.

mod common;

use common::{entries, get_route, recording, send, trace};
use switchyard::{assemble, merge_applications, Application, BackendKind, Error};

fn prefixed(prefix: &str, kind: BackendKind) -> Application {
    let mut app = Application::new();
    app.set_prefix(prefix).unwrap();
    app.set_router(kind).unwrap();
    app
}

#[tokio::test]
async fn test_prefixed_apps_are_mounted_as_subtrees() {
    for kind in [BackendKind::Axum, BackendKind::Radix] {
        let trace = trace();

        let mut root = prefixed("", kind);
        root.add_middleware(recording("global", &trace)).unwrap();
        root.add_route(get_route("/health", 1, "healthy")).unwrap();

        let mut admin = prefixed("/admin", kind);
        admin.add_middleware(recording("admin", &trace)).unwrap();
        admin.add_route(get_route("/users", 2, "users")).unwrap();

        let mut shop = prefixed("/shop", kind);
        shop.set_default_version(3).unwrap();
        shop.add_route(get_route("/cart", 3, "cart")).unwrap();

        let handler = merge_applications(&[root, admin, shop]).unwrap();

        assert_eq!(send(&handler, "GET", "/v1/health").await, (200, "healthy".to_string()));
        assert_eq!(entries(&trace), vec!["global in", "global out"]);

        trace.lock().unwrap().clear();
        assert_eq!(send(&handler, "GET", "/admin/v2/users").await, (200, "users".to_string()));
        assert_eq!(
            entries(&trace),
            vec!["global in", "admin in", "admin out", "global out"]
        );

        assert_eq!(send(&handler, "GET", "/shop/cart").await.0, 200);
        assert_eq!(send(&handler, "GET", "/shop/v3/cart").await.0, 200);
        assert_eq!(send(&handler, "GET", "/cart").await.0, 404);
    }
}

#[test]
fn test_any_error_means_no_handler() {
    let mut broken = prefixed("/b", BackendKind::Radix);
    broken.add_route(get_route("/old", -1, "old")).unwrap();
    let fine = {
        let mut app = prefixed("/f", BackendKind::Radix);
        app.add_route(get_route("/new", 1, "new")).unwrap();
        app
    };

    let errors = merge_applications(&[fine, broken]).err().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors.to_string().contains("/old"));
}

#[test]
fn test_invalid_app_middleware_is_reported() {
    let mut app = prefixed("/m", BackendKind::Axum);
    app.add_middleware(switchyard::MiddlewareDescriptor::from_value(42u16))
        .unwrap();

    let backend = BackendKind::Axum.new_router(true).unwrap();
    let errors = assemble(backend, &[app]).err().unwrap();
    assert!(matches!(
        &errors.errors()[0],
        Error::InvalidMiddleware { type_name, .. } if type_name == "u16"
    ));
}

#[tokio::test]
async fn test_undefined_backend_follows_the_others() {
    let mut a = prefixed("/a", BackendKind::Undefined);
    a.add_route(get_route("/x", 1, "ax")).unwrap();
    let mut b = prefixed("/b", BackendKind::Radix);
    b.add_route(get_route("/x", 1, "bx")).unwrap();

    let handler = merge_applications(&[a, b]).unwrap();
    assert_eq!(send(&handler, "GET", "/a/v1/x").await, (200, "ax".to_string()));
    assert_eq!(send(&handler, "GET", "/b/v1/x").await, (200, "bx".to_string()));
}

#[test]
fn test_all_undefined_is_invalid() {
    let a = prefixed("/a", BackendKind::Undefined);
    let errors = merge_applications(&[a]).err().unwrap();
    assert_eq!(errors.errors(), &[Error::InvalidBackend(BackendKind::Undefined)]);
}
