//! Integration tests for the crawler
//!
//! Most tests drive the crawler with an in-memory link graph so concurrency can
//! be observed directly. The HTTP tests use wiremock to serve real pages.

use async_trait::async_trait;
use ripple_crawler::{
    CrawlReport, CrawlerConfig, CrawlerError, Document, Downloader, FetchError, HttpConfig,
    HttpDownloader, ParseError, WebCrawler,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Upper bound for any crawl in these tests
const CRAWL_TIMEOUT: Duration = Duration::from_secs(10);

/// A page whose links are known up front
struct StubPage {
    links: Result<Vec<String>, ParseError>,
    extractions: Arc<AtomicUsize>,
}

#[async_trait]
impl Document for StubPage {
    async fn extract_links(&self) -> Result<Vec<String>, ParseError> {
        self.extractions.fetch_add(1, Ordering::SeqCst);
        self.links.clone()
    }
}

/// In-memory downloader serving a link graph
///
/// Records how often each URL is fetched and how many downloads run at once,
/// globally and per host.
#[derive(Default)]
struct GraphDownloader {
    graph: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    unparsable: HashSet<String>,
    hanging: HashSet<String>,
    delay: Duration,

    fetches: Mutex<HashMap<String, usize>>,
    extractions: Arc<AtomicUsize>,
    running: AtomicUsize,
    peak: AtomicUsize,
    per_host_running: Mutex<HashMap<String, usize>>,
    per_host_limit: usize,
    per_host_violated: AtomicBool,
    hang_dropped: Arc<AtomicBool>,
}

impl GraphDownloader {
    fn new(edges: &[(&str, &[&str])]) -> Self {
        let graph = edges
            .iter()
            .map(|(from, to)| {
                (
                    from.to_string(),
                    to.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect();
        Self {
            graph,
            ..Self::default()
        }
    }

    fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    fn unparsable(mut self, url: &str) -> Self {
        self.unparsable.insert(url.to_string());
        self
    }

    fn hanging(mut self, url: &str) -> Self {
        self.hanging.insert(url.to_string());
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn watch_per_host(mut self, limit: usize) -> Self {
        self.per_host_limit = limit;
        self
    }

    fn fetch_count(&self, url: &str) -> usize {
        self.fetches.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn total_fetches(&self) -> usize {
        self.fetches.lock().unwrap().values().sum()
    }

    fn enter_host(&self, host: &str) {
        let mut running = self.per_host_running.lock().unwrap();
        let count = running.entry(host.to_string()).or_insert(0);
        *count += 1;
        if self.per_host_limit > 0 && *count > self.per_host_limit {
            self.per_host_violated.store(true, Ordering::SeqCst);
        }
    }

    fn leave_host(&self, host: &str) {
        let mut running = self.per_host_running.lock().unwrap();
        if let Some(count) = running.get_mut(host) {
            *count -= 1;
        }
    }
}

/// Sets a flag when dropped, marking an interrupted download
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Downloader for GraphDownloader {
    async fn download(&self, url: &str) -> Result<Box<dyn Document>, FetchError> {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        if self.hanging.contains(url) {
            let _flag = DropFlag(Arc::clone(&self.hang_dropped));
            std::future::pending::<()>().await;
        }

        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_default();

        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.enter_host(&host);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.leave_host(&host);
        self.running.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(url) {
            return Err(FetchError::Request {
                url: url.to_string(),
                message: "connection reset".to_string(),
            });
        }

        let links = if self.unparsable.contains(url) {
            Err(ParseError::UnsupportedContent {
                url: url.to_string(),
                content_type: "application/octet-stream".to_string(),
            })
        } else {
            Ok(self.graph.get(url).cloned().unwrap_or_default())
        };

        Ok(Box::new(StubPage {
            links,
            extractions: Arc::clone(&self.extractions),
        }))
    }
}

fn config(downloads: usize, extractors: usize, per_host: usize) -> CrawlerConfig {
    CrawlerConfig {
        download_concurrency: downloads,
        extract_concurrency: extractors,
        per_host_limit: per_host,
    }
}

async fn crawl(
    downloader: &Arc<GraphDownloader>,
    config: &CrawlerConfig,
    seed: &str,
    depth: u32,
) -> CrawlReport {
    let crawler = WebCrawler::new(downloader.clone(), config).expect("valid config");
    tokio::time::timeout(CRAWL_TIMEOUT, crawler.crawl(seed, depth))
        .await
        .expect("crawl should finish")
        .expect("crawl should succeed")
}

fn sorted(urls: &[String]) -> Vec<&str> {
    let mut urls: Vec<&str> = urls.iter().map(String::as_str).collect();
    urls.sort();
    urls
}

/// Checks the report invariants that hold for every crawl
fn assert_consistent(report: &CrawlReport, discovered: &[&str]) {
    let good: HashSet<&str> = report.downloaded.iter().map(String::as_str).collect();
    assert_eq!(good.len(), report.downloaded.len(), "URL downloaded twice");

    for url in report.errors.keys() {
        assert!(!good.contains(url.as_str()), "{} is both good and bad", url);
    }
    for url in good.iter().copied().chain(report.errors.keys().map(String::as_str)) {
        assert!(discovered.contains(&url), "{} was never discovered", url);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_diamond_downloads_shared_page_once() {
    let downloader = Arc::new(
        GraphDownloader::new(&[
            ("https://a.com/", &["https://a.com/b", "https://a.com/c"]),
            ("https://a.com/b", &["https://a.com/d"]),
            ("https://a.com/c", &["https://a.com/d"]),
            ("https://a.com/d", &["https://a.com/"]),
        ])
        .with_delay(Duration::from_millis(5)),
    );

    let report = crawl(&downloader, &config(8, 8, 0), "https://a.com/", 4).await;

    assert_eq!(
        sorted(&report.downloaded),
        vec![
            "https://a.com/",
            "https://a.com/b",
            "https://a.com/c",
            "https://a.com/d"
        ]
    );
    assert_eq!(downloader.fetch_count("https://a.com/d"), 1);
    assert_eq!(downloader.fetch_count("https://a.com/"), 1);
    assert_eq!(downloader.total_fetches(), 4);
    assert_consistent(
        &report,
        &["https://a.com/", "https://a.com/b", "https://a.com/c", "https://a.com/d"],
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_depth_one_downloads_only_seed() {
    let downloader = Arc::new(GraphDownloader::new(&[(
        "https://a.com/",
        &["https://a.com/b", "https://a.com/c"],
    )]));

    let report = crawl(&downloader, &config(4, 4, 0), "https://a.com/", 1).await;

    assert_eq!(report.downloaded, vec!["https://a.com/"]);
    assert!(report.errors.is_empty());
    assert_eq!(downloader.total_fetches(), 1);
    assert_eq!(downloader.extractions.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_depth_bounds_hop_distance() {
    let edges: &[(&str, &[&str])] = &[
        ("https://a.com/0", &["https://a.com/1"]),
        ("https://a.com/1", &["https://a.com/2"]),
        ("https://a.com/2", &["https://a.com/3"]),
        ("https://a.com/3", &["https://a.com/4"]),
    ];

    let downloader = Arc::new(GraphDownloader::new(edges));
    let report = crawl(&downloader, &config(4, 4, 0), "https://a.com/0", 2).await;
    assert_eq!(sorted(&report.downloaded), vec!["https://a.com/0", "https://a.com/1"]);

    let downloader = Arc::new(GraphDownloader::new(edges));
    let report = crawl(&downloader, &config(4, 4, 0), "https://a.com/0", 3).await;
    assert_eq!(
        sorted(&report.downloaded),
        vec!["https://a.com/0", "https://a.com/1", "https://a.com/2"]
    );
    assert_eq!(downloader.fetch_count("https://a.com/3"), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_page_reachable_at_shorter_distance_is_found() {
    // d is three hops away via b and c, but one hop away directly
    let downloader = Arc::new(GraphDownloader::new(&[
        ("https://a.com/", &["https://a.com/b", "https://a.com/d"]),
        ("https://a.com/b", &["https://a.com/c"]),
        ("https://a.com/c", &["https://a.com/d"]),
    ]));

    let report = crawl(&downloader, &config(1, 1, 0), "https://a.com/", 2).await;

    assert_eq!(
        sorted(&report.downloaded),
        vec!["https://a.com/", "https://a.com/b", "https://a.com/d"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_per_host_limit_is_enforced() {
    let links: Vec<String> = (0..30)
        .map(|i| format!("https://same.com/{}", i))
        .chain((0..10).map(|i| format!("https://other.com/{}", i)))
        .collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();

    let downloader = Arc::new(
        GraphDownloader::new(&[("https://same.com/", link_refs.as_slice())])
            .with_delay(Duration::from_millis(5))
            .watch_per_host(1),
    );

    let report = crawl(&downloader, &config(16, 4, 1), "https://same.com/", 2).await;

    assert_eq!(report.downloaded.len(), 41);
    assert!(!downloader.per_host_violated.load(Ordering::SeqCst));
    // Two hosts may still run side by side
    assert!(downloader.peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_download_concurrency_is_bounded() {
    let links: Vec<String> = (0..40).map(|i| format!("https://h{}.com/", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();

    let downloader = Arc::new(
        GraphDownloader::new(&[("https://seed.com/", link_refs.as_slice())])
            .with_delay(Duration::from_millis(5)),
    );

    let report = crawl(&downloader, &config(3, 2, 0), "https://seed.com/", 2).await;

    assert_eq!(report.downloaded.len(), 41);
    assert!(downloader.peak.load(Ordering::SeqCst) <= 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failure_is_isolated() {
    let downloader = Arc::new(
        GraphDownloader::new(&[
            ("https://a.com/", &["https://a.com/b", "https://a.com/bad"]),
            ("https://a.com/b", &["https://a.com/c"]),
            ("https://a.com/bad", &["https://a.com/unreachable"]),
        ])
        .failing("https://a.com/bad"),
    );

    let report = crawl(&downloader, &config(4, 4, 0), "https://a.com/", 3).await;

    assert_eq!(
        sorted(&report.downloaded),
        vec!["https://a.com/", "https://a.com/b", "https://a.com/c"]
    );
    assert_eq!(report.errors.len(), 1);
    assert_eq!(
        report.errors["https://a.com/bad"],
        FetchError::Request {
            url: "https://a.com/bad".to_string(),
            message: "connection reset".to_string(),
        }
    );
    assert_eq!(downloader.fetch_count("https://a.com/bad"), 1);
    assert_consistent(
        &report,
        &["https://a.com/", "https://a.com/b", "https://a.com/c", "https://a.com/bad"],
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failing_seed_is_reported() {
    let downloader = Arc::new(GraphDownloader::new(&[]).failing("https://down.com/"));

    let report = crawl(&downloader, &config(2, 2, 0), "https://down.com/", 3).await;

    assert!(report.downloaded.is_empty());
    assert!(report.errors.contains_key("https://down.com/"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_extraction_failure_means_no_links() {
    let downloader = Arc::new(
        GraphDownloader::new(&[
            ("https://a.com/", &["https://a.com/blob", "https://a.com/b"]),
            ("https://a.com/blob", &["https://a.com/hidden"]),
        ])
        .unparsable("https://a.com/blob"),
    );

    let report = crawl(&downloader, &config(4, 4, 0), "https://a.com/", 3).await;

    assert_eq!(
        sorted(&report.downloaded),
        vec!["https://a.com/", "https://a.com/b", "https://a.com/blob"]
    );
    assert!(report.errors.is_empty());
    assert_eq!(downloader.fetch_count("https://a.com/hidden"), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_crawls_share_crawler() {
    let downloader = Arc::new(GraphDownloader::new(&[
        ("https://a.com/", &["https://a.com/x"]),
        ("https://b.com/", &["https://b.com/y", "https://b.com/z"]),
    ]));
    let crawler = WebCrawler::new(downloader.clone(), &config(2, 2, 1)).unwrap();

    let (a, b) = tokio::time::timeout(
        CRAWL_TIMEOUT,
        async { tokio::join!(crawler.crawl("https://a.com/", 2), crawler.crawl("https://b.com/", 2)) },
    )
    .await
    .expect("crawls should finish");

    assert_eq!(sorted(&a.unwrap().downloaded), vec!["https://a.com/", "https://a.com/x"]);
    assert_eq!(
        sorted(&b.unwrap().downloaded),
        vec!["https://b.com/", "https://b.com/y", "https://b.com/z"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_during_crawl_returns_partial_result() {
    let downloader = Arc::new(
        GraphDownloader::new(&[(
            "https://a.com/",
            &["https://a.com/hang", "https://a.com/b"],
        )])
        .hanging("https://a.com/hang"),
    );
    let crawler = Arc::new(WebCrawler::new(downloader.clone(), &config(4, 4, 0)).unwrap());

    let running = {
        let crawler = Arc::clone(&crawler);
        tokio::spawn(async move { crawler.crawl("https://a.com/", 3).await })
    };

    // Let the seed and its links start
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!running.is_finished());

    crawler.close();

    let result = tokio::time::timeout(Duration::from_secs(2), running)
        .await
        .expect("crawl should stop promptly after close")
        .unwrap();

    match result {
        Err(CrawlerError::Cancelled { partial }) => {
            assert!(partial.downloaded.contains(&"https://a.com/".to_string()));
            assert!(!partial.downloaded.contains(&"https://a.com/hang".to_string()));
        }
        other => panic!("expected cancellation, got {:?}", other),
    }

    // The in-flight download was interrupted, not awaited
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(downloader.hang_dropped.load(Ordering::SeqCst));

    assert!(matches!(
        crawler.crawl("https://a.com/", 1).await,
        Err(CrawlerError::Closed)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dropping_crawler_cancels_work() {
    let downloader = Arc::new(GraphDownloader::new(&[]).hanging("https://a.com/"));
    let crawler = WebCrawler::new(downloader.clone(), &config(1, 1, 0)).unwrap();

    let crawl = crawler.crawl("https://a.com/", 2);
    assert!(tokio::time::timeout(Duration::from_millis(100), crawl)
        .await
        .is_err());

    drop(crawler);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(downloader.hang_dropped.load(Ordering::SeqCst));
}

/// Serves an endless chain of pages, each linking to the next
struct ChainDownloader {
    fetches: AtomicUsize,
    delay: Duration,
}

#[async_trait]
impl Downloader for ChainDownloader {
    async fn download(&self, url: &str) -> Result<Box<dyn Document>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        let next = url
            .rsplit('/')
            .next()
            .and_then(|n| n.parse::<u64>().ok())
            .map(|n| format!("https://chain.com/{}", n + 1));
        Ok(Box::new(StubPage {
            links: Ok(next.into_iter().collect()),
            extractions: Arc::new(AtomicUsize::new(0)),
        }))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_abandoned_crawl_stops_downloading() {
    let downloader = Arc::new(ChainDownloader {
        fetches: AtomicUsize::new(0),
        delay: Duration::from_millis(20),
    });
    let crawler = WebCrawler::new(downloader.clone(), &config(2, 2, 0)).unwrap();

    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), crawler.crawl("https://chain.com/0", 1000))
            .await;
    assert!(abandoned.is_err());

    // Let tasks that were mid-poll at abandonment wind down
    tokio::time::sleep(Duration::from_millis(50)).await;
    let at_abandon = downloader.fetches.load(Ordering::SeqCst);
    assert!(at_abandon >= 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(downloader.fetches.load(Ordering::SeqCst), at_abandon);

    // Only that crawl was cancelled; the crawler still works
    assert!(!crawler.is_closed());
    let report = tokio::time::timeout(CRAWL_TIMEOUT, crawler.crawl("https://chain.com/0", 3))
        .await
        .expect("crawl should finish")
        .expect("crawl should succeed");
    assert_eq!(
        sorted(&report.downloaded),
        vec!["https://chain.com/0", "https://chain.com/1", "https://chain.com/2"]
    );
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let downloader = Arc::new(GraphDownloader::default());
    assert!(WebCrawler::new(downloader.clone(), &config(0, 1, 0)).is_err());
    assert!(WebCrawler::new(downloader, &config(1, 0, 0)).is_err());
}

fn html_page(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_http_crawl_end_to_end() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="{0}/page1">Page 1</a>
            <a href="/page2">Page 2</a>
            <a href="{0}/missing">Missing</a>
            <a href="mailto:someone@example.com">Mail</a>
            </body></html>"#,
            base_url
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html_page(format!(
            r#"<html><body><a href="{}/page3">Page 3</a></body></html>"#,
            base_url
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html_page(r#"<html><body><a href="/">Home</a></body></html>"#.to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Beyond the depth limit
    Mock::given(method("GET"))
        .and(path("/page3"))
        .respond_with(html_page("<html></html>".to_string()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let http = HttpConfig {
        timeout_secs: 5,
        connect_timeout_secs: 5,
        ..HttpConfig::default()
    };
    let downloader = Arc::new(HttpDownloader::new(&http).unwrap());
    let crawler = WebCrawler::new(downloader, &config(4, 2, 2)).unwrap();

    let seed = format!("{}/", base_url);
    let report = tokio::time::timeout(CRAWL_TIMEOUT, crawler.crawl(&seed, 2))
        .await
        .expect("crawl should finish")
        .expect("crawl should succeed");

    let page1 = format!("{}/page1", base_url);
    let page2 = format!("{}/page2", base_url);
    let missing = format!("{}/missing", base_url);

    let mut expected = vec![seed.as_str(), page1.as_str(), page2.as_str()];
    expected.sort();
    assert_eq!(sorted(&report.downloaded), expected);

    assert_eq!(report.errors.len(), 1);
    assert_eq!(
        report.errors[&missing],
        FetchError::Status {
            url: missing.clone(),
            status: 404,
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_http_diamond_fetches_shared_page_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    for (page, links) in [
        ("/", vec!["/b", "/c"]),
        ("/b", vec!["/d"]),
        ("/c", vec!["/d"]),
        ("/d", vec!["/"]),
    ] {
        let body = links
            .iter()
            .map(|l| format!(r#"<a href="{}">{}</a>"#, l, l))
            .collect::<String>();
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html_page(format!("<html><body>{}</body></html>", body)))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let downloader = Arc::new(HttpDownloader::new(&HttpConfig::default()).unwrap());
    let crawler = WebCrawler::new(downloader, &config(4, 4, 0)).unwrap();

    let report = tokio::time::timeout(CRAWL_TIMEOUT, crawler.crawl(&format!("{}/", base_url), 5))
        .await
        .expect("crawl should finish")
        .expect("crawl should succeed");

    assert_eq!(report.downloaded.len(), 4);
    assert!(report.errors.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_http_non_html_page_is_downloaded_but_not_followed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(r#"<a href="/data.json">Data</a>"#.to_string()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"next": "<a href=\"/never\">x</a>"}"#)
                .insert_header("content-type", "application/json"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/never"))
        .respond_with(html_page(String::new()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let downloader = Arc::new(HttpDownloader::new(&HttpConfig::default()).unwrap());
    let crawler = WebCrawler::new(downloader, &CrawlerConfig::default()).unwrap();

    let report = tokio::time::timeout(CRAWL_TIMEOUT, crawler.crawl(&format!("{}/", base_url), 3))
        .await
        .expect("crawl should finish")
        .expect("crawl should succeed");

    assert_eq!(report.downloaded.len(), 2);
    assert!(report.errors.is_empty());
}
