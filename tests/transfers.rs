use std::net::TcpListener;
use std::time::{Duration, Instant};

use curl_request::errors::CURLE_OPERATION_TIMEDOUT;
use curl_request::{
    execute_async, multi_execute, multi_execute_with, BatchOptions, CurlOpt, CurlRequest, CurlState, OptionValue,
};
use mockito::Matcher;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A host type composing the request capability.
struct Page {
    name: &'static str,
    curl: CurlState,
}

impl Page {
    fn new(name: &'static str, url: &str) -> Self {
        let mut curl = CurlState::new();
        curl.set_url(url);
        Self { name, curl }
    }
}

impl CurlRequest for Page {
    fn curl(&self) -> &CurlState {
        &self.curl
    }

    fn curl_mut(&mut self) -> &mut CurlState {
        &mut self.curl
    }
}

#[test]
fn single_get_records_body_headers_and_cookies() {
    init_logging();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/hello")
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_header("set-cookie", "a=1; Path=/")
        .with_header("set-cookie", "b=2")
        .with_body("hello world")
        .create();

    let mut page = Page::new("hello", &format!("{}/hello", server.url()));
    page.execute();

    mock.assert();
    assert_eq!(page.get_error_code(), Some(0));
    assert_eq!(page.get_error_message(), None);
    assert_eq!(page.get_content().as_deref(), Some("hello world"));
    assert!(page.is_http_ok());
    assert_eq!(page.get_cookies().as_deref(), Some("a=1; b=2"));
    assert!(page.get_header().starts_with("HTTP/1.1 200"));

    let info = page.get_info().unwrap();
    assert_eq!(info.http_code, 200);
    assert!(info.url.as_deref().unwrap().ends_with("/hello"));
    assert_eq!(info.content_type.as_deref(), Some("text/plain"));

    let map = page.get_header_map();
    assert_eq!(map.get("content-type").unwrap(), "text/plain");

    let resp = page.to_response().unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.status_text, "OK");
    assert_eq!(resp.text(), "hello world");
    assert_eq!(page.name, "hello");
}

#[test]
fn post_data_is_sent() {
    init_logging();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/form")
        .match_body("x=1&y=2")
        .with_status(201)
        .with_body("created")
        .create();

    let mut req = CurlState::new();
    req.set_url(&format!("{}/form", server.url()));
    req.set_post_data(Some(b"x=1&y=2".as_slice()));
    req.execute();

    mock.assert();
    assert_eq!(req.get_info().unwrap().http_code, 201);
    assert!(req.is_http_ok());
    assert_eq!(req.get_content().as_deref(), Some("created"));
}

#[test]
fn non_2xx_is_not_a_transport_error() {
    init_logging();
    let mut server = mockito::Server::new();
    server.mock("GET", "/missing").with_status(404).with_body("nope").create();

    let mut req = CurlState::new();
    req.set_url(&format!("{}/missing", server.url()));
    req.execute();

    assert_eq!(req.get_error_code(), Some(0));
    assert!(!req.is_http_ok());
    assert_eq!(req.get_content().as_deref(), Some("nope"));
}

#[test]
fn header_text_is_reset_between_executions() {
    init_logging();
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/again")
        .with_status(200)
        .with_header("set-cookie", "c=1")
        .expect(2)
        .create();

    let mut req = CurlState::new();
    req.set_url(&format!("{}/again", server.url()));
    req.execute();
    req.execute();

    assert_eq!(req.get_header().matches("HTTP/1.1 ").count(), 1);
    assert_eq!(req.get_cookies().as_deref(), Some("c=1"));
}

#[test]
fn redirects_are_followed_with_referer() {
    init_logging();
    let mut server = mockito::Server::new();
    let url = server.url();
    server
        .mock("GET", "/old")
        .with_status(302)
        .with_header("location", &format!("{url}/new"))
        .with_header("set-cookie", "r=1")
        .create();
    let target = server
        .mock("GET", "/new")
        .match_header("referer", Matcher::Regex("/old$".to_string()))
        .with_status(200)
        .with_header("set-cookie", "n=2")
        .with_body("moved here")
        .create();

    let mut req = CurlState::new();
    req.set_url(&format!("{url}/old"));
    req.execute();

    target.assert();
    let info = req.get_info().unwrap();
    assert_eq!(info.http_code, 200);
    assert_eq!(info.redirect_count, 1);
    assert!(info.url.as_deref().unwrap().ends_with("/new"));

    // Cookies from every response, headers from the final one
    assert_eq!(req.get_cookies().as_deref(), Some("r=1; n=2"));
    assert!(req.get_header_map().get("location").is_none());
    assert_eq!(req.get_content().as_deref(), Some("moved here"));
}

#[test]
fn redirects_can_be_disabled() {
    init_logging();
    let mut server = mockito::Server::new();
    let url = server.url();
    server
        .mock("GET", "/old")
        .with_status(302)
        .with_header("location", &format!("{url}/new"))
        .create();

    let mut req = CurlState::new();
    req.set_url(&format!("{url}/old"));
    req.set_option(CurlOpt::FollowLocation, OptionValue::Bool(false));
    req.execute();

    let info = req.get_info().unwrap();
    assert_eq!(info.http_code, 302);
    assert!(!req.is_http_ok());
    assert!(info.redirect_url.as_deref().unwrap().ends_with("/new"));
}

#[test]
fn batch_results_land_on_their_own_request() {
    init_logging();
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/one")
        .with_status(200)
        .with_header("x-which", "one")
        .with_body("first")
        .create();
    server
        .mock("GET", "/two")
        .with_status(404)
        .with_header("x-which", "two")
        .with_body("second")
        .create();

    let mut pages = vec![
        Page::new("one", &format!("{}/one", server.url())),
        Page::new("two", &format!("{}/two", server.url())),
    ];
    multi_execute(pages.iter_mut()).unwrap();

    let one = &pages[0];
    assert_eq!(one.name, "one");
    assert_eq!(one.get_error_code(), Some(0));
    assert_eq!(one.get_content().as_deref(), Some("first"));
    assert!(one.is_http_ok());
    assert_eq!(one.get_header_map().get("x-which").unwrap(), "one");
    assert!(one.get_info().unwrap().url.as_deref().unwrap().ends_with("/one"));

    let two = &pages[1];
    assert_eq!(two.get_error_code(), Some(0));
    assert_eq!(two.get_content().as_deref(), Some("second"));
    assert!(!two.is_http_ok());
    assert_eq!(two.get_header_map().get("x-which").unwrap(), "two");
    assert!(!two.get_header().to_ascii_lowercase().contains("x-which: one"));
}

#[test]
fn batch_populates_failed_transfers_too() {
    init_logging();
    let mut server = mockito::Server::new();
    server.mock("GET", "/ok").with_status(200).with_body("fine").create();

    // Bind and drop to get a port nobody listens on
    let closed = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let mut good = CurlState::new();
    good.set_url(&format!("{}/ok", server.url()));
    let mut refused = CurlState::new();
    refused.set_url(&format!("http://{closed}/"));

    let mut batch: Vec<Box<dyn CurlRequest>> = vec![Box::new(good), Box::new(refused)];
    multi_execute(batch.iter_mut().map(|r| r.as_mut())).unwrap();

    assert_eq!(batch[0].get_error_code(), Some(0));
    assert!(batch[0].is_http_ok());

    assert_ne!(batch[1].get_error_code(), Some(0));
    assert!(batch[1].get_error_code().is_some());
    assert!(!batch[1].get_error_message().unwrap_or_default().is_empty());
    assert!(batch[1].get_info().is_some());
    assert!(!batch[1].is_http_ok());
}

#[test]
fn batch_deadline_stops_stuck_transfers() {
    init_logging();
    let mut server = mockito::Server::new();
    server.mock("GET", "/fast").with_status(200).with_body("quick").create();

    // Accepts connections at the kernel level but never answers
    let silent = TcpListener::bind("127.0.0.1:0").unwrap();
    let silent_addr = silent.local_addr().unwrap();

    let mut fast = CurlState::new();
    fast.set_url(&format!("{}/fast", server.url()));
    let mut stuck = CurlState::new();
    stuck.set_url(&format!("http://{silent_addr}/"));

    let mut batch = vec![fast, stuck];
    let started = Instant::now();
    multi_execute_with(batch.iter_mut(), &BatchOptions::with_deadline(Duration::from_millis(500))).unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_secs(5), "batch took {elapsed:?}");
    assert_eq!(batch[0].get_error_code(), Some(0));
    assert_eq!(batch[0].get_content().as_deref(), Some("quick"));
    assert_eq!(batch[1].get_error_code(), Some(CURLE_OPERATION_TIMEDOUT));
    assert!(batch[1].get_error_message().unwrap().contains("deadline"));

    drop(silent);
}

#[test]
fn unreachable_host_fails_within_connect_timeout() {
    init_logging();
    let mut req = CurlState::new();
    req.set_url("http://10.255.255.1/");
    req.set_option(CurlOpt::ConnectTimeout, OptionValue::Int(1));

    let started = Instant::now();
    req.execute();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_secs(5), "execute took {elapsed:?}");
    let code = req.get_error_code().unwrap();
    assert_ne!(code, 0);
    assert!(!req.get_error_message().unwrap().is_empty());
    assert!(!req.is_http_ok());
}

#[tokio::test]
async fn async_execute_hands_the_request_back() {
    init_logging();
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/async")
        .with_status(200)
        .with_body("from the pool")
        .create_async()
        .await;

    let page = Page::new("async", &format!("{}/async", server.url()));
    let page = execute_async(page).await.unwrap();

    assert_eq!(page.name, "async");
    assert!(page.is_http_ok());
    assert_eq!(page.get_content().as_deref(), Some("from the pool"));
}
