use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, TimeZone};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::config::FetcherConfig;
use crate::disguise::{build_client, random_delay, RequestDisguise};
use crate::error::{FetchError, FetchResult};
use crate::models::{Competition, Match, TeamRef};
use crate::source::FixtureSource;

const MATCH_SELECTOR: &str = ".event__match";
const TITLE_SELECTOR: &str = ".event__title";
const HOME_SELECTOR: &str = ".event__participant--home";
const AWAY_SELECTOR: &str = ".event__participant--away";
const TIME_SELECTOR: &str = ".event__time";

/// Prefix the source puts in front of match IDs
const MATCH_ID_PREFIX: &str = "g_1_";

/// One fixture block as it appears on the page
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedFixture {
    pub id: String,
    pub competition: String,
    pub home_team: String,
    pub away_team: String,
    pub kickoff_text: String,
}

/// HTML fallback used when the API is disabled
pub struct FixtureScraper {
    config: FetcherConfig,
    disguise: RequestDisguise,
}

impl FixtureScraper {
    pub fn new(config: FetcherConfig) -> Self {
        let disguise = RequestDisguise::from_config(&config.http);
        Self { config, disguise }
    }

    /// Scrape the fixtures page and build normalized matches
    pub async fn fetch_fixtures(&self) -> FetchResult<Vec<Match>> {
        let html = self.fetch_page().await?;
        let fixtures = parse_fixtures_page(&html)?;

        info!("Parsed {} fixture blocks from {}", fixtures.len(), self.config.scraper.url);

        let mut matches = Vec::with_capacity(fixtures.len());
        for fixture in fixtures {
            random_delay(self.config.scraper.delay).await;
            let home_team = self.team_details(&fixture.home_team).await;

            random_delay(self.config.scraper.delay).await;
            let away_team = self.team_details(&fixture.away_team).await;

            let kickoff = parse_kickoff_time(&fixture.kickoff_text, &Local::now());

            matches.push(Match {
                id: fixture.id,
                competition: Competition { name: fixture.competition, code: String::new() },
                home_team,
                away_team,
                match_time: kickoff.to_rfc3339(),
                status: "SCHEDULED".to_string(),
            });
        }

        Ok(matches)
    }

    async fn fetch_page(&self) -> FetchResult<String> {
        // Fresh client per page load so the proxy and headers rotate together
        let client = build_client(&self.config.http)?;
        let url = &self.config.scraper.url;

        info!("Fetching fixtures page: {}", url);

        let response = client.get(url).headers(self.disguise.browser_headers()?).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status { url: url.clone(), status: response.status() });
        }

        let html = response.text().await?;
        debug!("Fetched fixtures page ({} bytes)", html.len());
        Ok(html)
    }

    /// Team details for a scraped fixture.
    ///
    /// The page carries no logos or history, so form is reported as
    /// unavailable rather than invented.
    pub async fn team_details(&self, team_name: &str) -> TeamRef {
        TeamRef::without_form(None, team_name, "")
    }
}

#[async_trait]
impl FixtureSource for FixtureScraper {
    async fn fetch_upcoming(&self) -> FetchResult<Vec<Match>> {
        self.fetch_fixtures().await
    }

    fn name(&self) -> &'static str {
        "html-scraper"
    }
}

fn selector(css: &str) -> FetchResult<Selector> {
    Selector::parse(css)
        .map_err(|e| FetchError::Parse(format!("failed to create selector '{}': {}", css, e)))
}

/// Extract fixture blocks from a fixtures page.
///
/// Each block takes its competition from the closest `.event__title` that
/// precedes it in document order. Missing pieces get placeholders: an empty
/// id, "Unknown" team names and a "00:00" kickoff.
pub fn parse_fixtures_page(html: &str) -> FetchResult<Vec<ScrapedFixture>> {
    let document = Html::parse_document(html);

    let blocks = selector(&format!("{}, {}", TITLE_SELECTOR, MATCH_SELECTOR))?;
    let title = selector(TITLE_SELECTOR)?;
    let home = selector(HOME_SELECTOR)?;
    let away = selector(AWAY_SELECTOR)?;
    let time = selector(TIME_SELECTOR)?;

    let mut fixtures = Vec::new();
    let mut current_competition: Option<String> = None;

    for element in document.select(&blocks) {
        if title.matches(&element) {
            current_competition = Some(element_text(&element));
            continue;
        }

        let competition = current_competition.clone().unwrap_or_else(|| "Unknown League".to_string());
        let fixture = parse_match_block(&element, competition, &home, &away, &time);
        if fixture.id.is_empty() {
            debug!("Match block without id: {} vs {}", fixture.home_team, fixture.away_team);
        }
        fixtures.push(fixture);
    }

    Ok(fixtures)
}

fn parse_match_block(
    element: &ElementRef,
    competition: String,
    home: &Selector,
    away: &Selector,
    time: &Selector,
) -> ScrapedFixture {
    let id = element.value().attr("id").unwrap_or_default().replace(MATCH_ID_PREFIX, "");

    let child_text = |sel: &Selector, fallback: &str| {
        element
            .select(sel)
            .next()
            .map(|e| element_text(&e))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    };

    ScrapedFixture {
        id,
        competition,
        home_team: child_text(home, "Unknown"),
        away_team: child_text(away, "Unknown"),
        kickoff_text: child_text(time, "00:00"),
    }
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Interpret kickoff text relative to `now`.
///
/// `HH:MM` is taken as a time today in `now`'s timezone, rolled to tomorrow
/// when it has already passed. Anything unreadable becomes `now + 24h`.
pub fn parse_kickoff_time<Tz: TimeZone>(text: &str, now: &DateTime<Tz>) -> DateTime<Tz> {
    let fallback = || now.clone() + Duration::hours(24);

    let Some((hour, minute)) = text.trim().split_once(':') else {
        return fallback();
    };
    let (Ok(hour), Ok(minute)) = (hour.trim().parse::<u32>(), minute.trim().parse::<u32>()) else {
        warn!("Unparseable match time '{}'", text);
        return fallback();
    };

    let Some(naive) = now.date_naive().and_hms_opt(hour, minute, 0) else {
        warn!("Out-of-range match time '{}'", text);
        return fallback();
    };

    let Some(kickoff) = now.timezone().from_local_datetime(&naive).earliest() else {
        return fallback();
    };

    if kickoff < *now {
        kickoff + Duration::days(1)
    } else {
        kickoff
    }
}
