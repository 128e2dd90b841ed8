//! Authentication middleware wired through an application.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;

use common::body_string;
use switchyard::auth::{
    Authenticator, BasicAuthenticator, BasicProvider, BasicUser, MemoryUserManager, Provider, User,
    UserManager,
};
use switchyard::http::call;
use switchyard::middleware::{
    current_user, AuthenticationHandler, RequireAuth, RequireRole, UserMiddleware,
    UserMiddlewareConfig,
};
use switchyard::{Application, Handler, MiddlewareDescriptor, Request, Route};

fn users() -> Vec<BasicUser> {
    vec![
        BasicUser::new("alice", "alice@example.com", "alice-key", vec!["admin".to_string()]),
        BasicUser::new("bob", "bob@example.com", "bob-key", vec![]),
    ]
}

fn whoami(req: Request) -> impl std::future::Future<Output = String> {
    let name = current_user(&req)
        .map(|u| u.username().to_string())
        .unwrap_or_else(|| "anonymous".to_string());
    async move { name }
}

struct Fixture {
    handler: Handler,
    manager: Arc<MemoryUserManager>,
}

fn fixture() -> Fixture {
    let users = users();
    let manager = Arc::new(MemoryUserManager::with_users(users.clone()));
    let authenticator: Arc<dyn Authenticator> = Arc::new(BasicAuthenticator::new(
        users.iter().map(|u| u as &dyn User),
        HashMap::new(),
    ));
    let user_manager: Arc<dyn UserManager> = manager.clone();
    let provider = BasicProvider::new(Some(authenticator), Some(user_manager));
    provider.open().unwrap();

    let mut app = Application::new();
    app.add_middleware(MiddlewareDescriptor::stateful(AuthenticationHandler::new(
        Arc::new(provider),
    )))
    .unwrap();
    app.add_middleware(MiddlewareDescriptor::stateful(UserMiddleware::new(
        manager.clone(),
        UserMiddlewareConfig::default(),
    )))
    .unwrap();

    app.add_route(Route::new("/public").with_version(1).get().handler_fn(whoami))
        .unwrap();
    app.add_route(
        Route::new("/private")
            .with_version(1)
            .get()
            .handler_fn(whoami)
            .wrap(MiddlewareDescriptor::stateful(RequireAuth)),
    )
    .unwrap();
    app.add_route(
        Route::new("/admin")
            .with_version(1)
            .get()
            .handler_fn(whoami)
            .wrap(MiddlewareDescriptor::stateful(RequireRole::new("admin"))),
    )
    .unwrap();

    Fixture {
        handler: app.handler().unwrap(),
        manager,
    }
}

async fn get(handler: &Handler, uri: &str, headers: &[(&str, &str)]) -> (u16, String) {
    let mut builder = Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let res = call(handler.clone(), builder.body(Body::empty()).unwrap()).await;
    let status = res.status().as_u16();
    (status, body_string(res).await)
}

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let f = fixture();

    assert_eq!(get(&f.handler, "/v1/public", &[]).await, (200, "anonymous".to_string()));
    assert_eq!(get(&f.handler, "/v1/private", &[]).await.0, 401);
    assert_eq!(get(&f.handler, "/v1/admin", &[]).await.0, 401);

    let token = f.manager.create_user_token("bob", "bob-key").unwrap();
    let bearer = format!("Bearer {}", token);
    let auth = [("Authorization", bearer.as_str())];
    assert_eq!(get(&f.handler, "/v1/private", &auth).await.0, 200);
    assert_eq!(get(&f.handler, "/v1/admin", &auth).await.0, 401);
}

#[tokio::test]
async fn test_role_grants_admin_route() {
    let f = fixture();
    let token = f.manager.create_user_token("alice", "alice-key").unwrap();
    let bearer = format!("Bearer {}", token);

    let res = get(&f.handler, "/v1/admin", &[("Authorization", bearer.as_str())]).await;
    assert_eq!(res.0, 200);
}

#[tokio::test]
async fn test_user_resolved_from_cookie() {
    let f = fixture();
    let token = f.manager.create_user_token("alice", "alice-key").unwrap();
    let cookie = format!("theme=dark; auth-token={}", token);

    let res = get(&f.handler, "/v1/public", &[("Cookie", cookie.as_str())]).await;
    assert_eq!(res, (200, "alice".to_string()));
}

#[tokio::test]
async fn test_percent_encoded_cookie_token() {
    let f = fixture();
    let token = f.manager.create_user_token("alice", "alice-key").unwrap();
    let cookie = format!("auth-token={}", token.replace('.', "%2E"));

    let res = get(&f.handler, "/v1/public", &[("Cookie", cookie.as_str())]).await;
    assert_eq!(res, (200, "alice".to_string()));
}

#[tokio::test]
async fn test_user_resolved_from_api_key_headers() {
    let f = fixture();

    let ok = [("Api-User", "bob"), ("Api-Key", "bob-key")];
    assert_eq!(get(&f.handler, "/v1/public", &ok).await, (200, "bob".to_string()));

    let wrong = [("Api-User", "bob"), ("Api-Key", "alice-key")];
    let (status, body) = get(&f.handler, "/v1/public", &wrong).await;
    assert_eq!(status, 401);
    assert_eq!(body, "Unauthorized - invalid API key");
}

#[tokio::test]
async fn test_incomplete_provider_rejects_everyone() {
    let manager = Arc::new(MemoryUserManager::with_users(users()));
    let provider = BasicProvider::new(None, Some(manager.clone() as Arc<dyn UserManager>));
    assert!(provider.open().is_err());

    let mut app = Application::new();
    app.add_middleware(MiddlewareDescriptor::stateful(AuthenticationHandler::new(
        Arc::new(provider),
    )))
    .unwrap();
    app.add_route(
        Route::new("/private")
            .with_version(1)
            .get()
            .handler_fn(whoami)
            .wrap(MiddlewareDescriptor::stateful(RequireAuth)),
    )
    .unwrap();
    let handler = app.handler().unwrap();

    let token = manager.create_user_token("bob", "bob-key").unwrap();
    let bearer = format!("Bearer {}", token);
    let res = get(&handler, "/v1/private", &[("Authorization", bearer.as_str())]).await;
    assert_eq!(res.0, 401);
}
