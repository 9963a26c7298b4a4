use crate::action::Action;
use crate::error::ProxyError;
use crate::upstream::Endpoint;

/// Query parameters of one inbound request, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Params(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// First value given for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<Vec<(String, String)>> for Params {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Params(pairs)
    }
}

/// Fixed locale settings sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub language: String,
    /// Country whose watch-provider entry is kept.
    pub watch_region: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            language: "pt-BR".to_string(),
            watch_region: "BR".to_string(),
        }
    }
}

/// What to do for a validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Blank search query: answer with an empty list, no cache, no upstream.
    Empty,
    Fetch(Endpoint),
}

/// Validate `params` for `action` and build the upstream call.
pub fn plan(action: Action, params: &Params, locale: &Locale) -> Result<Plan, ProxyError> {
    let lang = locale.language.as_str();

    let endpoint = match action {
        Action::SearchMovies => return Ok(search("/search/movie", params, lang)),
        Action::SearchTvShows => return Ok(search("/search/tv", params, lang)),
        Action::SearchPerson => return Ok(search("/search/person", params, lang)),

        Action::GetMovieDetails => {
            Endpoint::new(format!("/movie/{}", id(params, "movieId")?)).param("language", lang)
        }
        Action::GetMovieCredits => {
            Endpoint::new(format!("/movie/{}/credits", id(params, "movieId")?))
                .param("language", lang)
        }
        Action::GetTvDetails => {
            Endpoint::new(format!("/tv/{}", id(params, "tvId")?)).param("language", lang)
        }
        Action::GetTvCredits => {
            Endpoint::new(format!("/tv/{}/credits", id(params, "tvId")?)).param("language", lang)
        }
        Action::GetSeasonEpisodes => Endpoint::new(format!(
            "/tv/{}/season/{}",
            id(params, "tvId")?,
            id(params, "seasonNumber")?
        ))
        .param("language", lang),

        // Provider lists are per country already; TMDB takes no language here
        Action::GetMovieWatchProviders => {
            Endpoint::new(format!("/movie/{}/watch/providers", id(params, "movieId")?))
        }
        Action::GetTvWatchProviders => {
            Endpoint::new(format!("/tv/{}/watch/providers", id(params, "tvId")?))
        }

        Action::GetPersonDetails => {
            Endpoint::new(format!("/person/{}", id(params, "personId")?)).param("language", lang)
        }
        Action::GetPersonCredits => {
            Endpoint::new(format!("/person/{}/combined_credits", id(params, "personId")?))
                .param("language", lang)
        }

        Action::DiscoverMovies => discover("/discover/movie", params, lang)?,
        Action::DiscoverTvShows => discover("/discover/tv", params, lang)?,
    };

    Ok(Plan::Fetch(endpoint))
}

fn search(path: &str, params: &Params, lang: &str) -> Plan {
    match params.get("query") {
        Some(query) if !query.trim().is_empty() => Plan::Fetch(
            Endpoint::new(path)
                .param("query", query)
                .param("language", lang),
        ),
        _ => Plan::Empty,
    }
}

fn discover(path: &str, params: &Params, lang: &str) -> Result<Endpoint, ProxyError> {
    let page = match params.get("page").map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => p
            .parse::<u32>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or(ProxyError::InvalidParameter("page"))?,
        None => 1,
    };

    let mut endpoint = Endpoint::new(path)
        .param("language", lang)
        .param("sort_by", "popularity.desc")
        .param("page", page.to_string());

    if let Some(genres) = params.get("genreId").map(str::trim).filter(|g| !g.is_empty()) {
        // TMDB accepts comma (AND) and pipe (OR) separated genre ids
        if !genres
            .chars()
            .all(|c| c.is_ascii_digit() || c == ',' || c == '|')
        {
            return Err(ProxyError::InvalidParameter("genreId"));
        }
        endpoint = endpoint.param("with_genres", genres);
    }

    Ok(endpoint)
}

fn id(params: &Params, name: &'static str) -> Result<u64, ProxyError> {
    params
        .get(name)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or(ProxyError::InvalidParameter(name))
}
