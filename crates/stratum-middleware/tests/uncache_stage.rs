//! Uncache stage driven by a resolved configuration.

use std::sync::Arc;

use bytes::Bytes;
use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
use http_body_util::Full;
use serde_json::json;
use stratum_cache::{CacheCatalog, DowngradeReport, SharedCacheRegistry, CACHE_REGISTRY_PATH};
use stratum_config::{ApplicationContext, ConfigTree};
use stratum_middleware::{BoxFuture, Middleware, Next, Request, Response, UncacheMiddleware};

fn tree() -> ConfigTree {
    let mut tree = ConfigTree::new();
    tree.set(
        CACHE_REGISTRY_PATH,
        json!({
            "pages": {"backend": "simple-file"},
            "hash": {"frontend": "variable", "backend": "redis", "options": {"database": 4}},
            "thumbnails": {"frontend": "variable", "backend": "redis"},
        }),
    );
    tree.set(
        "EXTCONF.stratum.caching.cacheConfigurations.thumbnails.uncache",
        json!(false),
    );
    tree
}

fn stage_for(context: &str) -> (UncacheMiddleware, Arc<SharedCacheRegistry>) {
    let context = ApplicationContext::parse(context).unwrap();
    let registry = Arc::new(SharedCacheRegistry::from_tree(&tree(), &CacheCatalog::default()).unwrap());
    let stage = UncacheMiddleware::new(Arc::clone(&registry), context.is_development());
    (stage, registry)
}

fn request() -> Request {
    HttpRequest::builder()
        .uri("/admin/layout")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

fn handler(request: Request) -> BoxFuture<'static, Response> {
    let status = if request.extensions().get::<DowngradeReport>().is_some() {
        StatusCode::OK
    } else {
        StatusCode::NO_CONTENT
    };
    Box::pin(async move {
        HttpResponse::builder()
            .status(status)
            .body(Full::new(Bytes::new()))
            .unwrap()
    })
}

#[tokio::test]
async fn development_context_downgrades_before_handler() {
    let (stage, registry) = stage_for("Development/Local");
    let response = stage.process(request(), Next::new(handler)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut tree = ConfigTree::new();
    registry.snapshot().write_to(&mut tree);
    assert_eq!(tree.get("SYS.caching.cacheConfigurations.pages.backend"), Some(&json!("null")));
    assert_eq!(
        tree.get("SYS.caching.cacheConfigurations.hash.backend"),
        Some(&json!("transient-memory"))
    );
    assert_eq!(tree.get("SYS.caching.cacheConfigurations.hash.options"), None);
    assert_eq!(
        tree.get("SYS.caching.cacheConfigurations.thumbnails.backend"),
        Some(&json!("redis"))
    );
}

#[tokio::test]
async fn production_context_leaves_caches_alone() {
    let (stage, registry) = stage_for("Production/Staging");
    let before = registry.snapshot();
    let response = stage.process(request(), Next::new(handler)).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(registry.snapshot(), before);
}

#[tokio::test]
async fn concurrent_requests_share_one_registry() {
    let (stage, registry) = stage_for("Development");
    let stage = Arc::new(stage);

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let stage = Arc::clone(&stage);
            tokio::spawn(async move {
                stage
                    .process(request(), Next::new(handler))
                    .await
                    .status()
            })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    let snapshot = registry.snapshot();
    let pages = snapshot.get("pages").unwrap();
    assert_eq!(pages.backend().map(|b| b.id()), Some("null"));
}
