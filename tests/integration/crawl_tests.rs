//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for business websites and the
//! classifier endpoint, and run full sessions end-to-end over HTTP.

use lead_ripple::config::{ClassifierConfig, Config, ExportFormat};
use lead_ripple::crawler::{FetchErrorKind, Session};
use lead_ripple::leads::{ContentClassifier, LlmClassifier, OfflineClassifier};
use lead_ripple::output::export_leads;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Enough prose to clear the minimum content length
const FILLER: &str = "Acme Roofing has repaired and replaced roofs across the valley for thirty years. \
                      Our crews handle shingle, metal and flat roofs for homes and businesses.";

/// Creates a test configuration with every delay switched off
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.fetch.delay_min_ms = 0;
    config.fetch.delay_max_ms = 0;
    config.fetch.timeout_secs = 5;
    config.crawler.inter_depth_delay_ms = 0;
    config.governor.retry_attempts = 2;
    config.governor.retry_delay_ms = 0;
    config.governor.max_retry_delay_ms = 0;
    config
}

fn offline_session(config: Config) -> Session {
    Session::with_http_driver(config, Arc::new(OfflineClassifier::new()))
        .expect("Failed to create session")
}

/// An HTML page with `body` inside its main region
fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>{}</title></head><body>\
             <nav><a href=\"/\">Home</a></nav><main>{}</main>\
             <footer>Copyright Acme</footer></body></html>",
            title, body
        ),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str, fetches: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(title, body))
        .expect(fetches)
        .mount(server)
        .await;
}

fn fetched_paths(report: &lead_ripple::CrawlReport) -> Vec<String> {
    report
        .pages
        .iter()
        .map(|p| p.node.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_only_content_links_are_scheduled() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        "Home",
        &format!(
            r##"<p>{}</p>
            <a href="/about">About Us</a>
            <a href="/x.pdf">Download</a>
            <a href="#top">Top</a>"##,
            FILLER
        ),
        1,
    )
    .await;
    mount_page(&server, "/about", "About", FILLER, 1).await;
    mount_page(&server, "/x.pdf", "PDF", FILLER, 0).await;

    let session = offline_session(create_test_config());
    let report = session
        .run(&[server.uri()], 1)
        .await
        .expect("Crawl failed");

    assert_eq!(fetched_paths(&report), vec!["/", "/about"]);
    assert_eq!(report.pages[1].node.depth, 1);
    assert_eq!(report.pages[1].node.anchor_text, "About Us");
    assert_eq!(report.stats.links_scheduled, 1);
    assert!(report.pages.iter().all(|p| p.success()));
}

#[tokio::test]
async fn test_short_page_is_insufficient_content() {
    let server = MockServer::start().await;

    // Well under the minimum content length
    mount_page(
        &server,
        "/",
        "Tiny",
        r#"Welcome to Acme. We fix roofs. Call us!! <a href="/about">About Us</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/about", "About", FILLER, 0).await;

    let session = offline_session(create_test_config());
    let report = session.run(&[server.uri()], 1).await.expect("Crawl failed");

    assert_eq!(report.pages.len(), 1);
    let page = &report.pages[0];
    assert!(!page.success());
    assert_eq!(page.error, Some(FetchErrorKind::InsufficientContent));
    assert_eq!(report.stats.links_scheduled, 0);
}

#[tokio::test]
async fn test_depth_zero_fetches_seeds_only() {
    let server = MockServer::start().await;
    let links = format!(r#"<p>{}</p><a href="/about">About Us</a>"#, FILLER);

    mount_page(&server, "/", "Home", &links, 1).await;
    mount_page(&server, "/branch", "Branch", &links, 1).await;
    mount_page(&server, "/about", "About", FILLER, 0).await;

    let session = offline_session(create_test_config());
    let seeds = vec![server.uri(), format!("{}/branch", server.uri())];
    let report = session.run(&seeds, 0).await.expect("Crawl failed");

    assert_eq!(report.pages.len(), 2);
    assert!(report.pages.iter().all(|p| p.node.depth == 0));
    assert_eq!(report.stats.links_scheduled, 0);
}

#[tokio::test]
async fn test_depth_bound_without_revisits() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        "Home",
        &format!(r#"<p>{}</p><a href="/about">About Us</a>"#, FILLER),
        1,
    )
    .await;
    // Links back to the seed, which must not be fetched again
    mount_page(
        &server,
        "/about",
        "About",
        &format!(
            r#"<p>{}</p><a href="/team">Our Team</a><a href="/">Acme Roofing</a>"#,
            FILLER
        ),
        1,
    )
    .await;
    mount_page(
        &server,
        "/team",
        "Team",
        &format!(r#"<p>{}</p><a href="/careers">Careers</a>"#, FILLER),
        1,
    )
    .await;
    mount_page(&server, "/careers", "Careers", FILLER, 0).await;

    let session = offline_session(create_test_config());
    let report = session.run(&[server.uri()], 2).await.expect("Crawl failed");

    assert_eq!(fetched_paths(&report), vec!["/", "/about", "/team"]);
    assert_eq!(report.stats.depth_reached, 2);
    assert_eq!(
        report.pages[2].node.parent_url.as_ref().map(|u| u.path().to_string()),
        Some("/about".to_string())
    );
}

#[tokio::test]
async fn test_fan_out_cap_in_document_order() {
    let server = MockServer::start().await;

    let links: String = (1..=5)
        .map(|i| format!(r#"<a href="/office-{}">Regional office {}</a>"#, i, i))
        .collect();
    mount_page(
        &server,
        "/",
        "Home",
        &format!("<p>{}</p>{}", FILLER, links),
        1,
    )
    .await;
    for i in 1..=5 {
        let fetches = if i <= 2 { 1 } else { 0 };
        mount_page(&server, &format!("/office-{}", i), "Office", FILLER, fetches).await;
    }

    let mut config = create_test_config();
    config.crawler.max_child_links_per_page = 2;

    let session = offline_session(config);
    let report = session.run(&[server.uri()], 1).await.expect("Crawl failed");

    assert_eq!(fetched_paths(&report), vec!["/", "/office-1", "/office-2"]);
    assert_eq!(report.stats.links_over_cap, 3);
}

#[tokio::test]
async fn test_non_html_is_unsupported_content() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/brochure"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;

    let session = offline_session(create_test_config());
    let report = session
        .run(&[format!("{}/brochure", server.uri())], 0)
        .await
        .expect("Crawl failed");

    assert_eq!(report.pages[0].error, Some(FetchErrorKind::UnsupportedContent));
    assert_eq!(report.pages[0].attempts, 1);
}

#[tokio::test]
async fn test_server_error_is_retried_then_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let session = offline_session(create_test_config());
    let report = session.run(&[server.uri()], 1).await.expect("Crawl failed");

    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.pages[0].error, Some(FetchErrorKind::NavigationFailure));
    assert_eq!(report.pages[0].attempts, 2);
    assert_eq!(report.stats.failures.get(&FetchErrorKind::NavigationFailure), Some(&1));
}

/// Mounts a chat completions endpoint that always replies with `content`
async fn mount_chat_reply(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })))
        .mount(server)
        .await;
}

fn llm_classifier(server: &MockServer) -> LlmClassifier {
    let config = ClassifierConfig {
        endpoint: format!("{}/v1/chat/completions", server.uri()),
        timeout_secs: 5,
        ..Default::default()
    };
    LlmClassifier::new(&config, "test-key").expect("Failed to create classifier")
}

#[tokio::test]
async fn test_llm_classifier_reads_fenced_reply() {
    let server = MockServer::start().await;
    mount_chat_reply(
        &server,
        "Here are the leads:\n```json\n[{\"name\": \"Jane Doe\", \"title\": \"Owner\", \"email\": \"jane@acme.com\", \"reviewCount\": \"12 reviews\"}]\n```",
    )
    .await;

    let leads = llm_classifier(&server)
        .classify_leads(FILLER, "roofing")
        .await
        .expect("Classification failed");

    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].name, "Jane Doe");
    assert_eq!(leads[0].title.as_deref(), Some("Owner"));
    assert_eq!(leads[0].review_count, Some(12));
}

#[tokio::test]
async fn test_llm_classifier_scores_relevance() {
    let server = MockServer::start().await;
    mount_chat_reply(&server, "Relevance: 8/10").await;

    let score = llm_classifier(&server)
        .score_url_relevance("https://acme.com", "Acme Roofing", "Roof repair", "roofing")
        .await
        .expect("Scoring failed");

    assert_eq!(score, 8);
}

#[tokio::test]
async fn test_llm_classifier_unauthorized_is_not_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = llm_classifier(&server)
        .classify_leads(FILLER, "")
        .await
        .unwrap_err();

    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_session_with_llm_exports_json() {
    let site = MockServer::start().await;
    let api = MockServer::start().await;

    mount_page(&site, "/", "Home", FILLER, 1).await;
    mount_chat_reply(
        &api,
        r#"{"leads": [{"name": "Dr. Jane Doe", "email": "Jane@Acme.com", "phone": "(555) 123-4567"},
                      {"name": "", "email": "info@acme.com"}]}"#,
    )
    .await;

    let classifier: Arc<dyn ContentClassifier> = Arc::new(llm_classifier(&api));
    let session = Session::with_http_driver(create_test_config(), classifier)
        .expect("Failed to create session");
    let report = session.run(&[site.uri()], 0).await.expect("Crawl failed");

    assert_eq!(report.leads.len(), 1);
    assert_eq!(report.stats.leads_rejected, 1);
    assert_eq!(report.stats.fallback_pages, 0);

    let lead = &report.leads[0];
    assert_eq!(lead.name, "Jane Doe");
    assert_eq!(lead.email.as_deref(), Some("jane@acme.com"));
    assert_eq!(lead.source_url, format!("{}/", site.uri()));

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file = export_leads(&report.leads, ExportFormat::Json, dir.path()).expect("Export failed");
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();

    assert_eq!(written.as_array().map(Vec::len), Some(1));
    assert_eq!(written[0]["name"], "Jane Doe");
}

#[tokio::test]
async fn test_offline_session_exports_sqlite() {
    let site = MockServer::start().await;

    mount_page(
        &site,
        "/",
        "Home",
        &format!(
            r#"<p>{}</p><p>Email jane.doe@acme-roofing.com or sales@acme-roofing.com.</p>
            <a href="/contact">Contact us</a>"#,
            FILLER
        ),
        1,
    )
    .await;
    mount_page(
        &site,
        "/contact",
        "Contact",
        &format!("<p>{}</p><p>Reach Jane at jane.doe@acme-roofing.com</p>", FILLER),
        1,
    )
    .await;

    let session = offline_session(create_test_config());
    let report = session.run(&[site.uri()], 1).await.expect("Crawl failed");

    // Jane appears on both pages but is kept once
    assert_eq!(report.leads.len(), 2);
    assert_eq!(report.stats.duplicate_leads, 1);

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file =
        export_leads(&report.leads, ExportFormat::Sqlite, dir.path()).expect("Export failed");
    assert_eq!(file.extension().and_then(|e| e.to_str()), Some("db"));

    let conn = rusqlite::Connection::open(&file).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 2);
}
