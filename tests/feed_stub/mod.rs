use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Jane's Updates</title>
    <item>
      <guid><![CDATA[https://www.goodreads.com/user_status/show/3]]></guid>
      <pubDate><![CDATA[Wed, 25 Jun 2025 08:15:00 -0700]]></pubDate>
      <title><![CDATA[Jane is on page 123 of 300 of 'Ender's Game' by Orson Scott Card]]></title>
      <description><![CDATA[<img src="https://i.gr-assets.com/books/1s/375802._SY75_.jpg" />
        Jane is on page 123 of 300 of <a class="bookTitle" href="/book/show/375802">Ender's Game</a>
        by <a class="authorName" href="https://www.goodreads.com/author/show/589.Orson_Scott_Card">Orson Scott Card</a>]]></description>
    </item>
    <item>
      <guid>https://www.goodreads.com/user_status/show/2</guid>
      <pubDate>Mon, 16 Jun 2025 19:00:00 -0700</pubDate>
      <title>Jane started reading 'Ender's Game' by Orson Scott Card</title>
      <description>Jane started reading Ender's Game</description>
    </item>
    <item>
      <guid>https://www.goodreads.com/review/show/1</guid>
      <pubDate>Fri, 20 Jun 2025 21:00:00 +0000</pubDate>
      <title>Jane started reading 'Dune' by Frank Herbert</title>
      <description>Jane started reading Dune</description>
    </item>
  </channel>
</rss>"#;

pub const PROFILE_PAGE: &str =
    "<html><body><div class=\"challenge\">Jane has read 26 of 30 books</div></body></html>";

/// Serves [`FEED`] at `/feed` and [`PROFILE_PAGE`] at `/user/show/42`.
/// Flip `failing` to answer 500 on every path.
pub struct FeedStub {
    pub base_url: String,
    pub feed_hits: Arc<AtomicUsize>,
    pub failing: Arc<AtomicBool>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

#[allow(dead_code)]
impl FeedStub {
    pub fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start feed stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let feed_hits = Arc::new(AtomicUsize::new(0));
        let failing = Arc::new(AtomicBool::new(false));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = {
            let feed_hits = Arc::clone(&feed_hits);
            let failing = Arc::clone(&failing);
            thread::spawn(move || {
                loop {
                    if shutdown_rx.try_recv().is_ok() {
                        break;
                    }

                    let request = match server.recv_timeout(Duration::from_millis(50)) {
                        Ok(Some(req)) => req,
                        Ok(None) => continue,
                        Err(_) => break,
                    };

                    let path = request.url().split('?').next().unwrap_or("").to_string();
                    if path == "/feed" {
                        feed_hits.fetch_add(1, Ordering::SeqCst);
                    }

                    let (status, body) = if failing.load(Ordering::SeqCst) {
                        (500, "upstream exploded")
                    } else {
                        match path.as_str() {
                            "/feed" => (200, FEED),
                            "/user/show/42" => (200, PROFILE_PAGE),
                            _ => (404, "not found"),
                        }
                    };
                    let _ = request
                        .respond(tiny_http::Response::from_string(body).with_status_code(status));
                }
            })
        };

        Self {
            base_url,
            feed_hits,
            failing,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn feed_url(&self) -> String {
        format!("{}/feed?key=abc", self.base_url)
    }

    pub fn hits(&self) -> usize {
        self.feed_hits.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Drop for FeedStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
