use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use harvester::collectors::HttpCollector;
use harvester::{
    AgentConfig, CollectionAgent, CollectionPipeline, CollectionRequest, CollectorStrategy,
    Config, DataSource, DataTarget, ExecutionContext, ExecutionStatus, RawPayload, SourceType,
};

const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example Feed</title>
    <item>
      <title>Launch day</title>
      <link>https://example.test/launch</link>
      <description><![CDATA[<p>We <b>launched</b> today</p>]]></description>
      <pubDate>Mon, 05 Oct 2026 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Follow up</title>
      <link>https://example.test/follow-up</link>
      <description>Numbers &amp; notes</description>
    </item>
  </channel>
</rss>"#;

const PAGE: &str = r#"<html>
  <head><title>Release Notes</title></head>
  <body>
    <nav>Home</nav>
    <article><h2>v1.0</h2><p>First release</p></article>
    <article><h2>v1.1</h2><p>Bug fixes</p></article>
    <img src="/logo.png">
  </body>
</html>"#;

fn collector() -> HttpCollector {
    HttpCollector::new(&Config {
        fetch_timeout_secs: 5,
        ..Config::default()
    })
    .unwrap()
}

fn target(server: &MockServer, route: &str, kind: SourceType) -> DataTarget {
    DataTarget::new("test", kind, format!("{}{}", server.uri(), route))
}

#[tokio::test]
async fn test_collect_rss_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(FEED),
        )
        .expect(1)
        .mount(&server)
        .await;

    let collector = collector();
    let target = target(&server, "/feed.xml", SourceType::Rss);
    let raw = collector.collect(&target).await.unwrap();

    let RawPayload::Rss { feed_title, items } = &raw else {
        panic!("expected an RSS payload, got {:?}", raw);
    };
    assert_eq!(feed_title.as_deref(), Some("Example Feed"));
    assert_eq!(items.len(), 2);

    let cleaned = collector.clean(raw, &target).unwrap();
    assert_eq!(cleaned[0].title, "Launch day");
    assert_eq!(cleaned[0].url, "https://example.test/launch");
    assert!(cleaned[0].content.contains("launched"));
    assert_eq!(cleaned[1].content, "Numbers & notes");
}

#[tokio::test]
async fn test_collect_website_sections() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&server)
        .await;

    let collector = collector();
    let mut target = target(&server, "/notes", SourceType::Website);
    target.selectors = vec!["article".to_string()];

    let raw = collector.collect(&target).await.unwrap();
    let items = collector.clean(raw, &target).unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "Release Notes");
    assert_eq!(items[0].content, "v1.0 First release");
    assert_eq!(items[1].content, "v1.1 Bug fixes");
}

#[tokio::test]
async fn test_collect_whole_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&server)
        .await;

    let collector = collector();
    let target = target(&server, "/notes", SourceType::Website);
    let items = collector
        .clean(collector.collect(&target).await.unwrap(), &target)
        .unwrap();

    assert_eq!(items.len(), 1);
    assert!(items[0].content.contains("First release"));
    assert!(items[0].content.contains("Bug fixes"));
    assert_eq!(items[0].media.len(), 1);
    assert_eq!(items[0].media[0].url, format!("{}/logo.png", server.uri()));
}

#[tokio::test]
async fn test_collect_api_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "One", "body": "first"},
            {"id": 2, "title": "Two", "body": "second"}
        ])))
        .mount(&server)
        .await;

    let collector = collector();
    let target = target(&server, "/api/items", SourceType::Api);
    let items = collector
        .clean(collector.collect(&target).await.unwrap(), &target)
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[1].title, "Two");
    assert_eq!(items[1].content, "second");
    assert_eq!(items[1].metadata["raw"]["id"], 2);
}

#[tokio::test]
async fn test_invalid_json_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = collector()
        .collect(&target(&server, "/api/items", SourceType::Api))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Invalid JSON"));
}

#[tokio::test]
async fn test_server_error_fails_collect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = collector()
        .collect(&target(&server, "/feed.xml", SourceType::Rss))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_target_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut target = target(&server, "/private", SourceType::Api);
    target
        .headers
        .insert("authorization".to_string(), "Bearer secret".to_string());

    assert!(collector().collect(&target).await.is_ok());
}

#[tokio::test]
async fn test_connection_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/up"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = |route: &str| DataSource {
        id: route.trim_start_matches('/').to_string(),
        name: route.to_string(),
        source_type: "website".to_string(),
        url: format!("{}{}", server.uri(), route),
        config: Default::default(),
    };

    let collector = collector();
    assert!(collector.test_connection(&source("/up")).await.unwrap());
    assert!(!collector.test_connection(&source("/down")).await.unwrap());
}

#[tokio::test]
async fn test_pipeline_fetches_once_per_interval() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
        .expect(1)
        .mount(&server)
        .await;

    let config: AgentConfig = serde_json::from_value(json!({
        "id": "feeds",
        "name": "Feeds",
        "category": "data_collection",
        "dataSources": [
            {
                "id": "example",
                "name": "Example",
                "type": "rss",
                "url": format!("{}/feed.xml", server.uri())
            }
        ]
    }))
    .unwrap();

    let mut agent = CollectionAgent::new(config.clone(), CollectionPipeline::new(collector()));
    agent.initialize(config).await.unwrap();
    let context = ExecutionContext::new("user-1");

    let first = agent
        .execute(&CollectionRequest::default(), &context)
        .await
        .unwrap();
    let second = agent
        .execute(&CollectionRequest::default(), &context)
        .await
        .unwrap();

    assert_eq!(first.status, ExecutionStatus::Success);
    assert_eq!(first.data.summary.new_items, 2);
    assert_eq!(first.metrics.network_requests, 1);
    assert_eq!(second.data.summary.new_items, 2);
    assert_eq!(second.metrics.network_requests, 0);
}
