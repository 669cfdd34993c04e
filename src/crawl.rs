use std::thread;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::event::Event;
use crate::fetch::Fetcher;
use crate::identity::{dedup_events, CrawlSession};
use crate::normalize::normalize;
use crate::settings::{CrawlSettings, SiteSelectors};
use crate::tags::count_tags;
use crate::{segment_article, Config, Error};

const MISSING_TITLE: &str = "Título não encontrado";
const MISSING_TAG: &str = "Sem tag";
const MISSING_DATE: &str = "Sem data";

/// Scalar fields of one listing card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCard {
    pub title: String,
    pub tag: String,
    /// Absolute article URL.
    pub link: String,
    pub displayed_date: String,
    pub banner_url: String,
}

/// Compiled CSS selectors for the listing and article templates.
pub struct Selectors {
    card: Selector,
    title: Selector,
    tag: Selector,
    date: Selector,
    link: Selector,
    image: Selector,
    article: Selector,
}

impl Selectors {
    pub fn compile(site: &SiteSelectors) -> Result<Self, Error> {
        let parse = |css: &str| Selector::parse(css).map_err(|e| Error::Selector(format!("{css}: {e}")));
        Ok(Self {
            card: parse(&site.card)?,
            title: parse(&site.title)?,
            tag: parse(&site.tag)?,
            date: parse(&site.date)?,
            link: parse("a[href]")?,
            image: parse("img[src]")?,
            article: parse(&site.article)?,
        })
    }

    pub fn article(&self) -> &Selector {
        &self.article
    }
}

/// Listing cards on one page, in document order.
///
/// Cards without a link are dropped.
pub fn parse_listing(page: &Html, selectors: &Selectors, listing_url: &Url) -> Vec<ListingCard> {
    page.select(&selectors.card)
        .filter_map(|card| parse_card(card, selectors, listing_url))
        .collect()
}

fn parse_card(card: ElementRef<'_>, selectors: &Selectors, listing_url: &Url) -> Option<ListingCard> {
    let href = card
        .select(&selectors.link)
        .next()
        .and_then(|a| a.value().attr("href"))?;
    let link = listing_url.join(href.trim()).ok()?.to_string();

    let text_of = |sel: &Selector, default: &str| {
        card.select(sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_else(|| default.to_string())
    };

    Some(ListingCard {
        title: text_of(&selectors.title, MISSING_TITLE),
        tag: text_of(&selectors.tag, MISSING_TAG),
        link,
        displayed_date: text_of(&selectors.date, MISSING_DATE),
        banner_url: card
            .select(&selectors.image)
            .next()
            .and_then(|img| img.value().attr("src"))
            .unwrap_or_default()
            .to_string(),
    })
}

/// Whether the pagination links point at page `current + 1`.
pub fn has_next_page(page: &Html, current: u32) -> bool {
    let css = format!("ul.pagination a[href*=\"page={}\"]", current + 1);
    Selector::parse(&css)
        .map(|sel| page.select(&sel).next().is_some())
        .unwrap_or(false)
}

/// Sequential crawler over the paginated news listing.
pub struct Crawler<'a, F: Fetcher> {
    fetcher: &'a F,
    settings: &'a CrawlSettings,
    config: &'a Config,
    selectors: Selectors,
    listing_url: Url,
    site_base: Url,
}

impl<'a, F: Fetcher> Crawler<'a, F> {
    pub fn new(fetcher: &'a F, settings: &'a CrawlSettings, config: &'a Config) -> Result<Self, Error> {
        let parse_url = |raw: &str| {
            Url::parse(raw).map_err(|source| Error::Url {
                url: raw.to_string(),
                source,
            })
        };
        Ok(Self {
            fetcher,
            settings,
            config,
            selectors: Selectors::compile(&settings.selectors)?,
            listing_url: parse_url(&settings.listing_url)?,
            site_base: parse_url(&settings.site_base)?,
        })
    }

    /// Crawl every listing page and return the deduplicated event collection.
    ///
    /// A failed or empty listing page ends pagination; a failed article only
    /// loses that one event.
    pub fn crawl(&self, session: &mut CrawlSession) -> Vec<Event> {
        let mut events = Vec::new();
        let mut page_no = 1u32;

        loop {
            let page_url = format!("{}?page={page_no}", self.listing_url);
            let page = match self.fetcher.fetch(&page_url) {
                Ok(body) => Html::parse_document(&body),
                Err(e) => {
                    tracing::warn!(page = page_no, error = %e, "listing page unavailable, stopping");
                    break;
                }
            };

            let cards = parse_listing(&page, &self.selectors, &self.listing_url);
            if cards.is_empty() {
                tracing::info!(page = page_no, "listing page has no cards, stopping");
                break;
            }
            tracing::info!(page = page_no, cards = cards.len(), "crawling listing page");

            for card in cards {
                if !session.mark_seen(&card.link) {
                    tracing::debug!(link = %card.link, "already visited this run");
                    continue;
                }
                self.pause();
                if let Some(event) = self.build_event(card) {
                    events.push(event);
                }
            }

            if page_no >= self.settings.max_pages || !has_next_page(&page, page_no) {
                break;
            }
            page_no += 1;
            self.pause();
        }

        let (events, dropped) = dedup_events(events);
        tracing::info!(events = events.len(), duplicates = dropped, "crawl finished");
        for (tag, count) in count_tags(&events) {
            tracing::info!(tag = %tag, count, "tag frequency");
        }
        events
    }

    /// Fetch and segment one article. `None` when it cannot be fetched,
    /// has no article node, or yields no blocks.
    pub fn build_event(&self, card: ListingCard) -> Option<Event> {
        let body = match self.fetcher.fetch(&card.link) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(link = %card.link, error = %e, "skipping article");
                return None;
            }
        };
        let page = Html::parse_document(&body);
        let Some(blocks) = segment_article(&page, self.selectors.article(), &self.site_base, self.config)
        else {
            tracing::warn!(link = %card.link, "article node not found, skipping");
            return None;
        };
        if blocks.is_empty() {
            tracing::warn!(link = %card.link, "article produced no blocks, skipping");
            return None;
        }

        Some(Event {
            title: normalize(&card.title),
            tag: normalize(&card.tag),
            blocks,
            banner_image_url: card.banner_url,
            link: card.link,
            source: self.settings.source_name.clone(),
            displayed_date: card.displayed_date,
        })
    }

    fn pause(&self) {
        let delay = Duration::from_millis(self.settings.request_delay_ms);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}
