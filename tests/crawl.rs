// Integration tests: listing pages → articles → deduplicated events, no network

use std::cell::RefCell;
use std::collections::HashMap;

use funcultural::crawl::Crawler;
use funcultural::fetch::Fetcher;
use funcultural::settings::CrawlSettings;
use funcultural::{BlockKind, Config, CrawlSession, FetchError};
use pretty_assertions::assert_eq;

const LISTING: &str = "https://site.test/noticias";

/// Canned pages keyed by URL; records every request.
#[derive(Default)]
struct FakeFetcher {
    pages: HashMap<String, String>,
    requests: RefCell<Vec<String>>,
}

impl FakeFetcher {
    fn with(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), body.into());
        self
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}

fn settings(max_pages: u32) -> CrawlSettings {
    CrawlSettings {
        listing_url: LISTING.into(),
        site_base: "https://site.test".into(),
        max_pages,
        request_delay_ms: 0,
        cache_dir: None,
        ..CrawlSettings::default()
    }
}

fn card(slug: &str, title: &str, date: &str) -> String {
    format!(
        "<div class=\"resultado-pesquisa\">\
         <a href=\"/noticias/{slug}\"><img src=\"/banners/{slug}.jpg\"></a>\
         <div class=\"tag-noticia\">Música / Dança</div>\
         <div class=\"titulo-noticia-pesquisa\">{title}</div>\
         <div class=\"datanot\">{date}</div></div>"
    )
}

fn listing(cards: &[String], next: Option<u32>) -> String {
    let pagination = next
        .map(|n| format!("<ul class=\"pagination\"><li><a href=\"?page={n}\">{n}</a></li></ul>"))
        .unwrap_or_default();
    format!("<html><body>{}{pagination}</body></html>", cards.concat())
}

fn article(text: &str) -> String {
    format!(
        "<html><body><article class=\"noticia-conteudo\">\
         <div class=\"artigo-img-wrap\"><img src=\"/uploads/foto.jpg\"></div>\
         <p>{text}</p></article></body></html>"
    )
}

fn site() -> FakeFetcher {
    FakeFetcher::default()
        .with(
            &format!("{LISTING}?page=1"),
            listing(
                &[
                    card("festival", "  Festival   de Teatro ", "10/08/2023"),
                    card("quebrada", "Página quebrada", "há 2 dias"),
                ],
                Some(2),
            ),
        )
        .with(
            &format!("{LISTING}?page=2"),
            listing(
                &[
                    card("festival", "Festival de Teatro", "10/08/2023"),
                    card("oficina", "Oficina de Dança", "há 3 meses"),
                ],
                None,
            ),
        )
        .with(
            "https://site.test/noticias/festival",
            article("O festival reúne grupos de teatro de todo o estado."),
        )
        .with(
            "https://site.test/noticias/quebrada",
            "<html><body><p>Conteúdo fora do artigo principal aqui.</p></body></html>",
        )
        .with(
            "https://site.test/noticias/oficina",
            article("As inscrições para a oficina de dança estão abertas."),
        )
}

#[test]
fn test_crawl_collects_events_across_pages() {
    let fetcher = site();
    let settings = settings(3);
    let config = Config::default();
    let crawler = Crawler::new(&fetcher, &settings, &config).unwrap();
    let mut session = CrawlSession::new();

    let events = crawler.crawl(&mut session);

    let links: Vec<_> = events.iter().map(|e| e.link.as_str()).collect();
    assert_eq!(
        links,
        vec![
            "https://site.test/noticias/festival",
            "https://site.test/noticias/oficina",
        ]
    );
    assert_eq!(session.seen_count(), 3);

    let festival = &events[0];
    assert_eq!(festival.title, "Festival de Teatro");
    assert_eq!(festival.tag, "Música / Dança");
    assert_eq!(festival.displayed_date, "10/08/2023");
    assert_eq!(festival.banner_image_url, "/banners/festival.jpg");
    assert_eq!(festival.source, "Funcultural");
    assert_eq!(
        festival.blocks.iter().map(|b| b.kind).collect::<Vec<_>>(),
        vec![BlockKind::Paragraph, BlockKind::Image]
    );
    assert_eq!(festival.blocks[1].content, "https://site.test/uploads/foto.jpg");

    // The repeated card on page 2 is never fetched a second time.
    let requests = fetcher.requests.borrow();
    let festival_fetches = requests
        .iter()
        .filter(|u| u.ends_with("/noticias/festival"))
        .count();
    assert_eq!(festival_fetches, 1);
}

#[test]
fn test_max_pages_limits_pagination() {
    let fetcher = site();
    let settings = settings(1);
    let config = Config::default();
    let crawler = Crawler::new(&fetcher, &settings, &config).unwrap();

    let events = crawler.crawl(&mut CrawlSession::new());

    assert_eq!(events.len(), 1);
    assert!(!fetcher
        .requests
        .borrow()
        .iter()
        .any(|u| u.ends_with("?page=2")));
}

#[test]
fn test_unreachable_listing_yields_no_events() {
    let fetcher = FakeFetcher::default();
    let settings = settings(3);
    let config = Config::default();
    let crawler = Crawler::new(&fetcher, &settings, &config).unwrap();

    assert!(crawler.crawl(&mut CrawlSession::new()).is_empty());
    assert_eq!(fetcher.requests.borrow().len(), 1);
}

#[test]
fn test_invalid_listing_url_is_rejected() {
    let fetcher = FakeFetcher::default();
    let settings = CrawlSettings {
        listing_url: "not a url".into(),
        ..settings(1)
    };
    let config = Config::default();
    assert!(matches!(
        Crawler::new(&fetcher, &settings, &config),
        Err(funcultural::Error::Url { .. })
    ));
}
