use serde::{Deserialize, Serialize};

/// Outcome of one finished match from a single team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
    #[serde(rename = "D")]
    Draw,
}

impl FormResult {
    /// Single-letter code used in JSON and CSV output
    pub fn letter(self) -> char {
        match self {
            FormResult::Win => 'W',
            FormResult::Loss => 'L',
            FormResult::Draw => 'D',
        }
    }
}

/// Whether a team's form sequence came from real match history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    #[default]
    Available,
    /// History lookup failed or the source has no history to offer
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Competition {
    pub name: String,
    pub code: String,
}

/// A team as embedded in a [`Match`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRef {
    /// Remote API team ID (scraped teams have none)
    pub id: Option<u64>,
    pub name: String,
    pub logo: String,
    /// Most recent first, at most five entries
    pub last_five_matches: Vec<FormResult>,
    pub form_status: FormStatus,
}

impl TeamRef {
    /// Team whose form could not be determined
    pub fn without_form(id: Option<u64>, name: impl Into<String>, logo: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            logo: logo.into(),
            last_five_matches: Vec::new(),
            form_status: FormStatus::Unavailable,
        }
    }

    /// Compact form string, e.g. "WWLDL"
    pub fn form_string(&self) -> String {
        self.last_five_matches.iter().map(|r| r.letter()).collect()
    }
}

/// Normalized upcoming fixture served to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub competition: Competition,
    pub home_team: TeamRef,
    pub away_team: TeamRef,
    /// Kickoff as ISO-8601 text
    pub match_time: String,
    pub status: String,
}

/// football-data.org `/matches` and `/teams/{id}/matches` response body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiMatchList {
    #[serde(default)]
    pub matches: Vec<ApiMatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMatch {
    pub id: Option<u64>,
    #[serde(default)]
    pub competition: ApiCompetition,
    #[serde(default)]
    pub home_team: ApiTeam,
    #[serde(default)]
    pub away_team: ApiTeam,
    pub utc_date: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub score: ApiScore,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiCompetition {
    pub name: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiTeam {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub crest: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiScore {
    #[serde(default)]
    pub full_time: ApiGoals,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ApiGoals {
    pub home: Option<u32>,
    pub away: Option<u32>,
}
