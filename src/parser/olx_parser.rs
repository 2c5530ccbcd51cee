// OLX search-results parsing
use crate::model::{Listing, ParserError, PRICE_PLACEHOLDER, TITLE_PLACEHOLDER};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

// Cards and prices are located through test/data attributes; the css-* class
// names on the page are regenerated with every frontend build.
const CARD_SELECTOR: &str = r#"div[data-cy="l-card"], div[data-testid="l-card"]"#;
const LINK_SELECTOR: &str = "a[href]";
const TITLE_SELECTOR: &str = r#"[data-cy="ad-card-title"] h4, [data-cy="ad-card-title"] h6, h4, h6"#;
const PRICE_SELECTOR: &str = r#"[data-testid="ad-price"]"#;

static LISTING_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-ID(\d+)\.[A-Za-z0-9]+$").expect("listing id regex"));

pub struct OlxParser {
    base_url: Url,
    card: Selector,
    link: Selector,
    title: Selector,
    price: Selector,
}

impl OlxParser {
    pub fn new(base_url: Url) -> Result<Self, ParserError> {
        Ok(Self {
            base_url,
            card: selector(CARD_SELECTOR)?,
            link: selector(LINK_SELECTOR)?,
            title: selector(TITLE_SELECTOR)?,
            price: selector(PRICE_SELECTOR)?,
        })
    }

    pub fn parse_document(html: &str) -> Html {
        Html::parse_document(html)
    }

    /// Lazily yields every card that has both a link and an identity.
    pub fn listings<'a>(&'a self, document: &'a Html) -> impl Iterator<Item = Listing> + 'a {
        document
            .select(&self.card)
            .filter_map(move |card| self.parse_card(card))
    }

    /// Number of listing containers on the page, valid or not.
    pub fn card_count(&self, document: &Html) -> usize {
        document.select(&self.card).count()
    }

    fn parse_card(&self, card: ElementRef<'_>) -> Option<Listing> {
        let Some(link_node) = card.select(&self.link).next() else {
            debug!("Skipping card without link");
            return None;
        };
        let href = link_node.value().attr("href")?.trim();
        let url = match self.base_url.join(href) {
            Ok(u) => u,
            Err(e) => {
                debug!("Skipping card with unusable href {:?}: {}", href, e);
                return None;
            }
        };
        let Some(id) = listing_id(&url) else {
            debug!("Skipping card without listing id: {}", url);
            return None;
        };

        let title = card
            .select(&self.title)
            .next()
            .map(text_of)
            .filter(|t| !t.is_empty())
            .or_else(|| Some(text_of(link_node)).filter(|t| !t.is_empty()))
            .unwrap_or_else(|| TITLE_PLACEHOLDER.to_string());

        let price = card
            .select(&self.price)
            .next()
            .map(text_of)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| PRICE_PLACEHOLDER.to_string());

        Some(Listing {
            id,
            title,
            price,
            url: url.to_string(),
        })
    }
}

/// Extracts the numeric id from a `...-ID<digits>.<ext>` path; query and fragment are ignored.
pub fn listing_id(url: &Url) -> Option<String> {
    LISTING_ID
        .captures(url.path())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn selector(css: &'static str) -> Result<Selector, ParserError> {
    Selector::parse(css).map_err(|e| ParserError::Selector {
        selector: css,
        reason: e.to_string(),
    })
}

/// Element text with whitespace runs collapsed.
fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> OlxParser {
        OlxParser::new(Url::parse("https://www.olx.pl").unwrap()).unwrap()
    }

    fn extract(html: &str) -> Vec<Listing> {
        let p = parser();
        let doc = OlxParser::parse_document(html);
        p.listings(&doc).collect()
    }

    const PAGE: &str = r#"
        <html><body>
        <div data-testid="listing-grid">
          <div data-cy="l-card" data-testid="l-card" id="1" class="css-1apmciz">
            <a class="css-z3gu2d" href="/d/oferta/iphone-14-pro-128gb-CID99-ID101.html?reason=extended"></a>
            <div data-cy="ad-card-title" class="css-u2ayx9">
              <a class="css-1tqlkj0" href="/d/oferta/iphone-14-pro-128gb-CID99-ID101.html?reason=extended">
                <h4 class="css-hzlye5">  iPhone 14 Pro 128GB </h4>
              </a>
              <p data-testid="ad-price" class="css-6j1qjp">1 150 zł<span class="css-1vxklie">do negocjacji</span></p>
            </div>
          </div>
          <div data-cy="l-card" class="css-1apmciz">
            <div data-cy="ad-card-title">
              <a href="/d/oferta/iphone-14-pro-128gb-etui-CID99-ID202.html">
                <h6>IPHONE 14 PRO 128GB etui gratis</h6>
              </a>
            </div>
          </div>
          <div data-cy="l-card" class="css-1apmciz">
            <div data-cy="ad-card-title"><h4>Wyróżnione bez linku</h4></div>
            <p data-testid="ad-price">900 zł</p>
          </div>
        </div>
        </body></html>
    "#;

    #[test]
    fn extracts_valid_cards_and_skips_malformed() {
        let listings = extract(PAGE);
        assert_eq!(listings.len(), 2);

        assert_eq!(listings[0].id, "101");
        assert_eq!(listings[0].title, "iPhone 14 Pro 128GB");
        assert_eq!(listings[0].price, "1 150 zł do negocjacji");
        assert_eq!(
            listings[0].url,
            "https://www.olx.pl/d/oferta/iphone-14-pro-128gb-CID99-ID101.html?reason=extended"
        );

        assert_eq!(listings[1].id, "202");
        assert_eq!(listings[1].price, PRICE_PLACEHOLDER);
    }

    #[test]
    fn counts_all_cards_including_malformed() {
        let p = parser();
        let doc = OlxParser::parse_document(PAGE);
        assert_eq!(p.card_count(&doc), 3);
    }

    #[test]
    fn title_falls_back_to_link_text_then_placeholder() {
        let html = r#"
            <div data-cy="l-card"><a href="/d/oferta/a-ID1.html">Link title</a></div>
            <div data-cy="l-card"><a href="/d/oferta/b-ID2.html"><img src="x.jpg"></a></div>
        "#;
        let listings = extract(html);
        assert_eq!(listings[0].title, "Link title");
        assert_eq!(listings[1].title, TITLE_PLACEHOLDER);
    }

    #[test]
    fn keeps_absolute_hrefs_intact() {
        let html = r#"<div data-cy="l-card"><a href="https://www.otodom.pl/pl/oferta/mieszkanie-ID4711.html">x</a></div>"#;
        let listings = extract(html);
        assert_eq!(listings[0].url, "https://www.otodom.pl/pl/oferta/mieszkanie-ID4711.html");
        assert_eq!(listings[0].id, "4711");
    }

    #[test]
    fn skips_cards_without_id_suffix() {
        let html = r#"
            <div data-cy="l-card"><a href="/d/oferta/no-identifier.html">x</a></div>
            <div data-cy="l-card"><a href="/d/oferta/letters-IDabc.html">x</a></div>
        "#;
        assert!(extract(html).is_empty());
    }

    #[test]
    fn unrecognized_markup_yields_nothing() {
        assert!(extract("").is_empty());
        assert!(extract("{\"not\": \"html\"}").is_empty());
        assert!(extract("<html><body><div class=\"css-1apmciz\">old layout</div></body></html>").is_empty());
    }

    #[test]
    fn listing_id_ignores_query_and_fragment() {
        let plain = Url::parse("https://www.olx.pl/d/oferta/iphone-CID99-ID123456.html").unwrap();
        let query = Url::parse("https://www.olx.pl/d/oferta/iphone-CID99-ID123456.html?reason=hp&x=1#gallery").unwrap();
        assert_eq!(listing_id(&plain).as_deref(), Some("123456"));
        assert_eq!(listing_id(&query).as_deref(), Some("123456"));
    }

    #[test]
    fn listing_id_requires_suffix_at_end_of_path() {
        for raw in [
            "https://www.olx.pl/d/oferta/iphone.html",
            "https://www.olx.pl/d/oferta/iphone-ID123/more.html",
            "https://www.olx.pl/d/oferta/iphone-ID.html",
            "https://www.olx.pl/d/oferta/iphone?id=-ID123.html",
        ] {
            let url = Url::parse(raw).unwrap();
            assert_eq!(listing_id(&url), None, "{}", raw);
        }
    }
}
