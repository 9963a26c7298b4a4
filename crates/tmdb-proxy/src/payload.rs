use crate::action::Action;
use crate::request::Locale;
use crate::upstream::UpstreamError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Number of people kept from a person search.
const PERSON_SEARCH_LIMIT: usize = 5;

/// Normalized response of one action.
///
/// Serialized untagged: each variant is written as its bare JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Search and discover results, season episodes.
    Results(Vec<Value>),
    /// Movie, TV or person details, passed through.
    Details(Value),
    /// Movie or TV cast and crew.
    Credits(Credits),
    /// Watch-provider entry for the configured region; `null` when absent.
    Providers(Option<Value>),
    /// A person's cast and directing credits, newest first.
    Filmography(Vec<PersonCredit>),
    People(Vec<PersonSummary>),
}

impl Payload {
    pub fn empty_list() -> Self {
        Payload::Results(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<Value>,
    #[serde(default)]
    pub crew: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

/// One entry of a person's combined credits.
///
/// Only the fields the merge needs are typed; everything else is carried
/// through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonCredit {
    pub id: u64,
    pub media_type: MediaType,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl PersonCredit {
    pub fn job(&self) -> Option<&str> {
        self.rest.get("job").and_then(Value::as_str)
    }

    /// Release date for movies, first air date for TV, "" when neither is set.
    pub fn sort_date(&self) -> &str {
        let date = |field: &str| {
            self.rest
                .get(field)
                .and_then(Value::as_str)
                .filter(|d| !d.is_empty())
        };
        date("release_date")
            .or_else(|| date("first_air_date"))
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSummary {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CombinedCredits {
    #[serde(default)]
    cast: Vec<PersonCredit>,
    #[serde(default)]
    crew: Vec<PersonCredit>,
}

/// Reshape a raw TMDB body into the payload for `action`.
pub fn normalize(action: Action, body: Value, locale: &Locale) -> Result<Payload, UpstreamError> {
    match action {
        Action::SearchMovies
        | Action::SearchTvShows
        | Action::DiscoverMovies
        | Action::DiscoverTvShows => Ok(Payload::Results(take_list(body, "results")?)),

        Action::GetSeasonEpisodes => Ok(Payload::Results(take_list(body, "episodes")?)),

        Action::GetMovieDetails | Action::GetTvDetails | Action::GetPersonDetails => {
            if !body.is_object() {
                return Err(UpstreamError::Decode("details body is not an object".into()));
            }
            Ok(Payload::Details(body))
        }

        Action::GetMovieCredits | Action::GetTvCredits => Ok(Payload::Credits(decode(body)?)),

        Action::GetMovieWatchProviders | Action::GetTvWatchProviders => {
            Ok(Payload::Providers(select_region(body, &locale.watch_region)))
        }

        Action::GetPersonCredits => Ok(Payload::Filmography(merge_person_credits(decode(body)?))),

        Action::SearchPerson => {
            let people = take_list(body, "results")?
                .into_iter()
                .take(PERSON_SEARCH_LIMIT)
                .map(decode::<PersonSummary>)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Payload::People(people))
        }
    }
}

/// Merge cast and directing credits into one list.
///
/// Every cast credit is kept; of the crew only `Director` credits. A title the
/// person both acted in and directed appears once (the cast entry, which comes
/// first). The result is sorted newest first and the sort is stable.
fn merge_person_credits(credits: CombinedCredits) -> Vec<PersonCredit> {
    let mut seen: HashSet<(u64, MediaType)> = HashSet::new();

    let mut merged: Vec<PersonCredit> = credits
        .cast
        .into_iter()
        .chain(
            credits
                .crew
                .into_iter()
                .filter(|c| c.job() == Some("Director")),
        )
        .filter(|c| seen.insert((c.id, c.media_type)))
        .collect();

    merged.sort_by(|a, b| b.sort_date().cmp(a.sort_date()));
    merged
}

/// The `results[region]` entry of a watch-providers body. No fallback region.
fn select_region(body: Value, region: &str) -> Option<Value> {
    let Value::Object(mut body) = body else {
        return None;
    };
    match body.remove("results")? {
        Value::Object(mut countries) => countries.remove(region).filter(|v| !v.is_null()),
        _ => None,
    }
}

fn take_list(body: Value, field: &str) -> Result<Vec<Value>, UpstreamError> {
    match body {
        Value::Object(mut map) => match map.remove(field) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(UpstreamError::Decode(format!("missing `{field}` list"))),
        },
        _ => Err(UpstreamError::Decode("body is not an object".into())),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, UpstreamError> {
    serde_json::from_value(value).map_err(|e| UpstreamError::Decode(e.to_string()))
}
