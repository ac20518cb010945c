use chrono::{Duration, Local, NaiveDate};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use async_trait::async_trait;

use crate::config::FetcherConfig;
use crate::disguise::{build_client, random_delay, RequestDisguise};
use crate::error::{FetchError, FetchResult};
use crate::form::{classify_form, FORM_LENGTH};
use crate::models::{ApiMatch, ApiMatchList, ApiTeam, Competition, FormResult, FormStatus, Match, TeamRef};
use crate::source::FixtureSource;

/// Fetches fixtures and team history from a football-data.org style API
pub struct FootballDataFetcher {
    config: FetcherConfig,
    disguise: RequestDisguise,
}

impl FootballDataFetcher {
    pub fn new(config: FetcherConfig) -> Self {
        let disguise = RequestDisguise::from_config(&config.http);
        Self { config, disguise }
    }

    /// Fixtures between `date_from` and `date_to` (inclusive ISO dates), each
    /// enriched with both teams' last five results.
    pub async fn fetch_fixtures(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> FetchResult<Vec<Match>> {
        let client = build_client(&self.config.http)?;
        self.fetch_fixtures_with(&client, date_from, date_to).await
    }

    async fn fetch_fixtures_with(
        &self,
        client: &Client,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> FetchResult<Vec<Match>> {
        let url = self.endpoint("matches");
        let date_from = date_from.format("%Y-%m-%d").to_string();
        let date_to = date_to.format("%Y-%m-%d").to_string();

        info!("Fetching fixtures {} to {} from: {}", date_from, date_to, url);

        let list: ApiMatchList = self
            .get_json(client, &url, &[("dateFrom", date_from.as_str()), ("dateTo", date_to.as_str())])
            .await?;

        info!("Received {} fixtures, fetching team form", list.matches.len());

        let mut matches = Vec::with_capacity(list.matches.len());
        for fixture in &list.matches {
            random_delay(self.config.api.delay).await;
            let home_team = self.team_with_form(client, &fixture.home_team).await;

            random_delay(self.config.api.delay).await;
            let away_team = self.team_with_form(client, &fixture.away_team).await;

            matches.push(normalize_fixture(fixture, home_team, away_team));
        }

        Ok(matches)
    }

    /// Last five finished results for `team_id`, most recent first
    pub async fn team_form(&self, client: &Client, team_id: u64) -> FetchResult<Vec<FormResult>> {
        let url = self.endpoint(&format!("teams/{}/matches", team_id));
        let limit = FORM_LENGTH.to_string();

        debug!("Fetching form for team {} from: {}", team_id, url);

        let history: ApiMatchList = self
            .get_json(client, &url, &[("status", "FINISHED"), ("limit", limit.as_str())])
            .await?;

        Ok(classify_form(team_id, &history.matches))
    }

    async fn team_with_form(&self, client: &Client, team: &ApiTeam) -> TeamRef {
        let name = team.name.clone().unwrap_or_default();
        let logo = team.crest.clone().unwrap_or_default();

        let Some(team_id) = team.id else {
            warn!("Team '{}' has no ID, form unavailable", name);
            return TeamRef::without_form(None, name, logo);
        };

        match self.team_form(client, team_id).await {
            Ok(form) => TeamRef {
                id: Some(team_id),
                name,
                logo,
                last_five_matches: form,
                form_status: FormStatus::Available,
            },
            Err(e) => {
                error!("Error fetching form for team {}: {}", team_id, e);
                TeamRef::without_form(Some(team_id), name, logo)
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        client: &Client,
        url: &str,
        query: &[(&str, &str)],
    ) -> FetchResult<T> {
        let headers = self.disguise.api_headers(&self.config.api.api_key)?;
        let response = client.get(url).headers(headers).query(query).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: response.status() });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Malformed(format!("{}: {}", url, e)))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl FixtureSource for FootballDataFetcher {
    async fn fetch_upcoming(&self) -> FetchResult<Vec<Match>> {
        let today = Local::now().date_naive();
        let until = today + Duration::days(self.config.api.window_days);
        self.fetch_fixtures(today, until).await
    }

    fn name(&self) -> &'static str {
        "football-data-api"
    }
}

/// Flatten an API fixture into a [`Match`]
fn normalize_fixture(fixture: &ApiMatch, home_team: TeamRef, away_team: TeamRef) -> Match {
    Match {
        id: fixture.id.map(|id| id.to_string()).unwrap_or_default(),
        competition: Competition {
            name: fixture.competition.name.clone().unwrap_or_default(),
            code: fixture.competition.code.clone().unwrap_or_default(),
        },
        home_team,
        away_team,
        match_time: fixture.utc_date.clone().unwrap_or_default(),
        status: fixture.status.clone().unwrap_or_default(),
    }
}
