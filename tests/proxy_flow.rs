//! End-to-end tests: render content, follow the proxied link, get an image.

use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, EXPIRES};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use camo_proxy::camo::extract_image_urls;

mod common;
use common::{MockResponse, FALLBACK_GIF};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-png-body";

#[tokio::test]
async fn test_serves_upstream_image() {
    let upstream = common::start_static_upstream(MockResponse::ok("image/png", PNG)).await;
    let fallback = common::fallback_file();
    let config = common::test_config(&fallback);
    let (proxy, shutdown) = common::start_proxy(config.clone()).await;

    let url = common::proxied_url(&config, proxy, &format!("http://{upstream}/pics/cat.PNG"));
    let res = common::client().get(&url).send().await.unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()[CONTENT_TYPE], "image/png");
    assert_eq!(res.headers()[CACHE_CONTROL], "public, max-age=14400");
    assert!(res.headers()[EXPIRES].to_str().unwrap().ends_with("GMT"));
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(&res.bytes().await.unwrap()[..], PNG);

    shutdown.trigger();
}

#[tokio::test]
async fn test_tampered_digest_gets_fallback() {
    let upstream = common::start_static_upstream(MockResponse::ok("image/png", PNG)).await;
    let fallback = common::fallback_file();
    let config = common::test_config(&fallback);
    let (proxy, shutdown) = common::start_proxy(config.clone()).await;

    let url = common::proxied_url(&config, proxy, &format!("http://{upstream}/a.png"));
    let tampered = url.replacen("&digest=", "&digest=0", 1);
    let res = common::client().get(&tampered).send().await.unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()[CONTENT_TYPE], "image/gif");
    assert_eq!(res.headers()[CACHE_CONTROL], "public, max-age=14400");
    assert_eq!(&res.bytes().await.unwrap()[..], FALLBACK_GIF);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unsupported_extension_is_not_fetched() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let upstream = common::start_upstream(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        async { MockResponse::ok("application/octet-stream", b"MZ") }
    })
    .await;
    let fallback = common::fallback_file();
    let config = common::test_config(&fallback);
    let (proxy, shutdown) = common::start_proxy(config.clone()).await;

    let url = common::proxied_url(&config, proxy, &format!("http://{upstream}/setup.exe"));
    let res = common::client().get(&url).send().await.unwrap();

    assert_eq!(res.headers()[CONTENT_TYPE], "image/gif");
    assert_eq!(&res.bytes().await.unwrap()[..], FALLBACK_GIF);
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_errors_get_fallback() {
    let fallback = common::fallback_file();
    let config = common::test_config(&fallback);
    let (proxy, shutdown) = common::start_proxy(config.clone()).await;

    let not_found = common::start_static_upstream(MockResponse::status(404)).await;
    let empty = common::start_static_upstream(MockResponse::ok("image/png", b"")).await;
    let slow = common::start_static_upstream(
        MockResponse::ok("image/png", PNG).delayed(Duration::from_secs(3)),
    )
    .await;

    for upstream in [not_found, empty, slow] {
        let url = common::proxied_url(&config, proxy, &format!("http://{upstream}/a.png"));
        let res = common::client().get(&url).send().await.unwrap();
        assert_eq!(res.status(), 200, "upstream {upstream}");
        assert_eq!(res.headers()[CONTENT_TYPE], "image/gif", "upstream {upstream}");
        assert_eq!(&res.bytes().await.unwrap()[..], FALLBACK_GIF);
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_body_gets_fallback() {
    let upstream =
        common::start_static_upstream(MockResponse::ok("image/png", &[7u8; 4096])).await;
    let fallback = common::fallback_file();
    let mut config = common::test_config(&fallback);
    config.upstream.max_body_bytes = 1024;
    let (proxy, shutdown) = common::start_proxy(config.clone()).await;

    let url = common::proxied_url(&config, proxy, &format!("http://{upstream}/big.png"));
    let res = common::client().get(&url).send().await.unwrap();
    assert_eq!(res.headers()[CONTENT_TYPE], "image/gif");

    shutdown.trigger();
}

#[tokio::test]
async fn test_redirect_limit() {
    let target = common::start_static_upstream(MockResponse::ok("image/jpeg", b"jpeg")).await;
    let hop = common::start_static_upstream(MockResponse::redirect(format!(
        "http://{target}/final.jpg"
    )))
    .await;

    let fallback = common::fallback_file();
    let mut config = common::test_config(&fallback);
    let (proxy, shutdown) = common::start_proxy(config.clone()).await;
    let url = common::proxied_url(&config, proxy, &format!("http://{hop}/start.jpg"));
    let res = common::client().get(&url).send().await.unwrap();
    assert_eq!(res.headers()[CONTENT_TYPE], "image/jpeg");
    assert_eq!(&res.bytes().await.unwrap()[..], b"jpeg");
    shutdown.trigger();

    config.upstream.max_redirects = 0;
    let (proxy, shutdown) = common::start_proxy(config.clone()).await;
    let url = common::proxied_url(&config, proxy, &format!("http://{hop}/start.jpg"));
    let res = common::client().get(&url).send().await.unwrap();
    assert_eq!(res.headers()[CONTENT_TYPE], "image/gif");
    shutdown.trigger();
}

#[tokio::test]
async fn test_render_then_follow_link() {
    let upstream = common::start_upstream(|path| async move {
        match path.as_str() {
            "/a.gif" => MockResponse::ok("image/gif", b"GIF89a-a"),
            "/b.webp" => MockResponse::ok("image/webp", b"RIFF-b"),
            _ => MockResponse::status(404),
        }
    })
    .await;
    let fallback = common::fallback_file();
    let config = common::test_config(&fallback);
    let (proxy, shutdown) = common::start_proxy(config).await;

    let content = format!(
        r#"<p><img src="http://{upstream}/a.gif"> and <IMG SRC="http://{upstream}/b.webp"></p>"#
    );
    let res = common::client()
        .post(format!("http://{proxy}/render"))
        .json(&json!({ "content": content }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["images"], 2);

    let rendered = body["content"].as_str().unwrap();
    let links = extract_image_urls(rendered);
    assert_eq!(links.len(), 2);

    let mut bodies = Vec::new();
    for link in links {
        assert!(link.starts_with(&format!("http://{proxy}/camo?action=camo&amp;digest=")));
        let res = common::client()
            .get(link.replace("&amp;", "&"))
            .send()
            .await
            .unwrap();
        bodies.push(res.bytes().await.unwrap().to_vec());
    }
    assert_eq!(bodies, vec![b"GIF89a-a".to_vec(), b"RIFF-b".to_vec()]);

    shutdown.trigger();
}

#[tokio::test]
async fn test_group_restrictions() {
    let upstream = common::start_static_upstream(MockResponse::ok("image/png", PNG)).await;
    let fallback = common::fallback_file();
    let mut config = common::test_config(&fallback);
    config.access.allowed_groups = vec![4];
    let (proxy, shutdown) = common::start_proxy(config.clone()).await;

    let content = format!(r#"<img src="http://{upstream}/a.png">"#);
    let render = |group: &'static str| {
        let content = content.clone();
        async move {
            let res = common::client()
                .post(format!("http://{proxy}/render"))
                .header("X-Camo-Group", group)
                .json(&json!({ "content": content }))
                .send()
                .await
                .unwrap();
            res.json::<Value>().await.unwrap()
        }
    };
    assert_eq!(render("1").await["content"], content.as_str());
    assert_eq!(render("4").await["images"], 1);

    let url = common::proxied_url(&config, proxy, &format!("http://{upstream}/a.png"));
    let denied = common::client().get(&url).send().await.unwrap();
    assert_eq!(denied.headers()[CONTENT_TYPE], "image/gif");
    let allowed = common::client()
        .get(&url)
        .header("X-Camo-Group", "4")
        .send()
        .await
        .unwrap();
    assert_eq!(allowed.headers()[CONTENT_TYPE], "image/png");

    shutdown.trigger();
}

#[tokio::test]
async fn test_health_reports_inactive_without_key() {
    let fallback = common::fallback_file();
    let mut config = common::test_config(&fallback);
    config.camo.private_key.clear();
    let (proxy, shutdown) = common::start_proxy(config).await;

    let body: Value = common::client()
        .get(format!("http://{proxy}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["enabled"], false);

    let res = common::client()
        .get(format!("http://{proxy}/camo?digest=x&image=y"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()[CONTENT_TYPE], "image/gif");

    shutdown.trigger();
}
