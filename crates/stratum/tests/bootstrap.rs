//! Full bootstrap against an on-disk sandbox, through to the uncache stage.

use std::fs;
use std::path::Path;

use bytes::Bytes;
use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
use http_body_util::Full;
use serde_json::json;
use stratum::cache::{DowngradeAction, DowngradeReport};
use stratum::config::EnvSource;
use stratum::middleware::{BoxFuture, Middleware, Next, Request, Response};
use stratum::{Bootstrap, LoaderOptions, StratumError};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sandbox() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(
        root,
        "1_environment/Development.toml",
        r#"
[SYS]
sitename = "Shop"

[SYS.caching.cacheConfigurations.pages]
backend = "simple-file"

[SYS.caching.cacheConfigurations.hash]
frontend = "variable"
backend = "redis"
options = { database = 3 }

[SYS.caching.cacheConfigurations.rootline]
frontend = "variable"
backend = "database"
"#,
    );
    write(
        root,
        "1_environment/Production.toml",
        r#"
[SYS]
sitename = "Shop"

[SYS.caching.cacheConfigurations.pages]
backend = "simple-file"
"#,
    );
    write(
        root,
        "2_location/Local.toml",
        r#"
[DB.Connections.Default]
host = "localhost"
dbname = "shop"
"#,
    );
    tmp
}

fn options(root: &Path, env: &[(&str, &str)]) -> LoaderOptions {
    LoaderOptions::default()
        .with_sandbox_root(root)
        .with_env(EnvSource::Snapshot(
            env.iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        ))
}

#[test]
fn development_bootstrap_end_to_end() {
    let tmp = sandbox();
    let context = Bootstrap::with_options(
        "Development/Local",
        options(tmp.path(), &[("STRATUM__DB__Connections__Default__dbname", "shop_dev")]),
    )
    .unwrap()
    .use_production_preset()
    .include_context_files()
    .unwrap()
    .use_development_preset()
    .keep_cache("rootline")
    .load_environment()
    .append_context_to_site_name(true)
    .finish()
    .unwrap();

    assert!(context.is_development());
    let config = context.config();
    assert_eq!(config.get_str("SYS.sitename"), Some("Shop(D/L)"));
    assert_eq!(config.get_str("DB.Connections.Default.dbname"), Some("shop_dev"));
    assert_eq!(config.get_str("DB.Connections.Default.host"), Some("localhost"));
    assert_eq!(config.get_bool("BE.debug"), Some(true));
    assert_eq!(config.layer_files().len(), 2);

    let report = context.downgrade_caches().unwrap();
    assert_eq!(report.action("pages"), Some(DowngradeAction::NullBackend));
    assert_eq!(report.action("hash"), Some(DowngradeAction::TransientBackend));
    assert_eq!(report.action("rootline"), Some(DowngradeAction::OptedOut));

    let caches = context.cache_configurations();
    assert_eq!(caches["hash"], json!({"frontend": "variable", "backend": "transient-memory"}));
    assert_eq!(caches["rootline"]["backend"], json!("database"));
    assert_eq!(config.get("SYS.caching.cacheConfigurations.pages"), None);
    assert_eq!(
        context.to_tree().get("SYS.caching.cacheConfigurations.pages.backend"),
        Some(&json!("null"))
    );
}

#[test]
fn production_bootstrap_keeps_caches() {
    let tmp = sandbox();
    let context = Bootstrap::with_options("Production", options(tmp.path(), &[]))
        .unwrap()
        .include_context_files()
        .unwrap()
        .load_environment()
        .finish()
        .unwrap();

    assert!(!context.is_development());
    assert!(context.downgrade_caches().is_none());
    assert_eq!(
        context.cache_configurations(),
        json!({"pages": {"backend": "simple-file"}})
    );
}

#[test]
fn missing_layer_aborts_bootstrap() {
    let tmp = sandbox();
    let err = Bootstrap::with_options("Development/Local/eu", options(tmp.path(), &[]))
        .unwrap()
        .include_context_files()
        .unwrap_err();

    assert!(matches!(err, StratumError::Config(_)));
    assert!(err.to_string().contains("3_something"));
}

#[test]
fn context_is_shareable_across_threads() {
    let tmp = sandbox();
    let context = Bootstrap::with_options("Development/Local", options(tmp.path(), &[]))
        .unwrap()
        .include_context_files()
        .unwrap()
        .finish()
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let context = std::sync::Arc::clone(&context);
            std::thread::spawn(move || context.downgrade_caches().map(|r| r.changed()))
        })
        .collect();
    let changed: usize = handles.into_iter().map(|h| h.join().unwrap().unwrap()).sum();
    assert_eq!(changed, 3);
}

fn handler(request: Request) -> BoxFuture<'static, Response> {
    let changed = request
        .extensions()
        .get::<DowngradeReport>()
        .map_or(0, DowngradeReport::changed);
    Box::pin(async move {
        HttpResponse::builder()
            .status(if changed > 0 { StatusCode::OK } else { StatusCode::NO_CONTENT })
            .body(Full::new(Bytes::new()))
            .unwrap()
    })
}

#[tokio::test]
async fn stage_downgrades_on_first_request_only() {
    let tmp = sandbox();
    let context = Bootstrap::with_options("Development/Local", options(tmp.path(), &[]))
        .unwrap()
        .include_context_files()
        .unwrap()
        .finish()
        .unwrap();
    let stage = context.uncache_stage();

    let request = || {
        HttpRequest::builder()
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap()
    };
    let first = stage.process(request(), Next::new(handler)).await;
    let second = stage.process(request(), Next::new(handler)).await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::NO_CONTENT);
}
