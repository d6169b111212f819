use crate::cascade::Cascade;
use crate::error::{ExtractionError, ScrapeError};
use crate::fetch::PageFetcher;
use crate::record::CandidateRecord;
use crate::sanitize::sanitize_description;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

pub const LISTING_LOCATORS: &[&str] = &["div.bsl", "div.uta"];

pub const IMAGE_LOCATORS: &[(&str, &[&str])] = &[
    ("div.thumb img", &["src", "data-src"]),
    ("div.bigcover img", &["src", "data-src"]),
    (r#"meta[property="og:image"]"#, &["content"]),
];

pub const DESCRIPTION_LOCATORS: &[&str] = &["div.entry-content", r#"div[itemprop="description"]"#];

/// Used whenever the detail page has no usable synopsis.
pub const FALLBACK_DESCRIPTION: &str = "A legendary story you must read.";

pub struct Page {
    url: String,
    doc: Html,
}

impl Page {
    pub fn parse(url: &str, html: &str) -> Self {
        Self {
            url: url.to_string(),
            doc: Html::parse_document(html),
        }
    }

    fn resolve(&self, reference: &str) -> String {
        Url::parse(&self.url)
            .and_then(|base| base.join(reference))
            .map(|u| u.to_string())
            .unwrap_or_else(|_| reference.to_string())
    }

    fn first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.doc.select(selector).next()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturedEntry {
    pub title: String,
    pub link: String,
    pub locator: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailFields {
    pub image: String,
    /// Raw synopsis text; not yet sanitized.
    pub description: String,
}

fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|_| ExtractionError::Selector(css.to_string()))
}

fn non_blank_attr(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

type EntryCascade = Cascade<Page, Result<FeaturedEntry, ExtractionError>>;

fn listing_cascade() -> Result<EntryCascade, ExtractionError> {
    let anchor = selector("a")?;
    let mut cascade = Cascade::new();
    for css in LISTING_LOCATORS {
        let locator = selector(css)?;
        let block = locator.clone();
        let anchor = anchor.clone();
        let name = (*css).to_string();
        cascade = cascade.then(
            *css,
            move |page: &Page| page.first(&locator).is_some(),
            move |page: &Page| read_featured(page, &block, &anchor, &name),
        );
    }
    Ok(cascade)
}

fn read_featured(
    page: &Page,
    block: &Selector,
    anchor: &Selector,
    locator: &str,
) -> Result<FeaturedEntry, ExtractionError> {
    let missing = |attribute| ExtractionError::MissingAttribute {
        url: page.url.clone(),
        attribute,
    };

    let block = page.first(block).ok_or_else(|| ExtractionError::NoContent {
        url: page.url.clone(),
    })?;
    let link = block.select(anchor).next().ok_or_else(|| missing("link"))?;
    let href = non_blank_attr(link, "href").ok_or_else(|| missing("href"))?;
    let title = non_blank_attr(link, "title").ok_or_else(|| missing("title"))?;

    Ok(FeaturedEntry {
        title,
        link: page.resolve(&href),
        locator: locator.to_string(),
    })
}

pub fn parse_listing(html: &str, page_url: &str) -> Result<FeaturedEntry, ExtractionError> {
    let page = Page::parse(page_url, html);
    match listing_cascade()?.run(&page) {
        Some(hit) => {
            debug!(locator = %hit.strategy, "Listing locator matched");
            hit.value
        }
        None => Err(ExtractionError::NoContent {
            url: page_url.to_string(),
        }),
    }
}

/// Inline `data:` URIs are lazy-load placeholders, never the real cover.
fn image_source(page: &Page, container: &Selector, attrs: &[&str]) -> Option<String> {
    let el = page.first(container)?;
    attrs
        .iter()
        .filter_map(|a| non_blank_attr(el, a))
        .find(|src| !src.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:")))
        .map(|src| page.resolve(&src))
}

fn image_cascade() -> Result<Cascade<Page, Option<String>>, ExtractionError> {
    let mut cascade = Cascade::new();
    for (css, attrs) in IMAGE_LOCATORS {
        let locator = selector(css)?;
        let container = locator.clone();
        let attrs: &'static [&'static str] = *attrs;
        cascade = cascade.then(
            *css,
            move |page: &Page| image_source(page, &locator, attrs).is_some(),
            move |page: &Page| image_source(page, &container, attrs),
        );
    }
    Ok(cascade)
}

fn description_cascade() -> Result<Cascade<Page, String>, ExtractionError> {
    let mut cascade = Cascade::new();
    for css in DESCRIPTION_LOCATORS {
        let locator = selector(css)?;
        let block = locator.clone();
        cascade = cascade.then(
            *css,
            move |page: &Page| page.first(&locator).is_some(),
            move |page: &Page| {
                page.first(&block)
                    .map(|el| el.text().collect::<Vec<_>>().join(" "))
                    .unwrap_or_default()
            },
        );
    }
    Ok(cascade)
}

pub fn parse_detail(html: &str, page_url: &str) -> Result<DetailFields, ExtractionError> {
    let page = Page::parse(page_url, html);

    let image = image_cascade()?
        .run(&page)
        .and_then(|hit| {
            debug!(locator = %hit.strategy, "Image locator matched");
            hit.value
        })
        .ok_or_else(|| ExtractionError::MissingImage {
            url: page_url.to_string(),
        })?;

    let description = match description_cascade()?.run(&page) {
        Some(hit) if !hit.value.trim().is_empty() => hit.value,
        _ => {
            debug!(url = page_url, "No synopsis block; using fallback description");
            FALLBACK_DESCRIPTION.to_string()
        }
    };

    Ok(DetailFields { image, description })
}

#[instrument(level = "info", skip(fetcher, listing_html))]
pub async fn extract_candidate(
    fetcher: &dyn PageFetcher,
    listing_html: &str,
    listing_url: &str,
    description_max_chars: usize,
) -> Result<CandidateRecord, ScrapeError> {
    let entry = parse_listing(listing_html, listing_url)?;
    let detail_html = fetcher.fetch_text(&entry.link).await?;
    let detail = parse_detail(&detail_html, &entry.link)?;

    let mut description = sanitize_description(&detail.description, description_max_chars);
    if description.is_empty() {
        description = sanitize_description(FALLBACK_DESCRIPTION, description_max_chars);
    }

    Ok(CandidateRecord {
        title: entry.title,
        link: entry.link,
        image: detail.image,
        description,
    })
}
