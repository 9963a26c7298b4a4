use std::time::Duration;

/// Every lookup the proxy knows how to forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    SearchMovies,
    SearchTvShows,
    GetMovieDetails,
    GetMovieCredits,
    GetTvDetails,
    GetTvCredits,
    GetSeasonEpisodes,
    GetMovieWatchProviders,
    GetTvWatchProviders,
    GetPersonDetails,
    GetPersonCredits,
    SearchPerson,
    DiscoverMovies,
    DiscoverTvShows,
}

/// Freshness category of an action. Each class has its own TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionClass {
    Search,
    Details,
    Credits,
    Providers,
    Discover,
    Person,
}

/// Wire name and freshness class of each action.
///
/// `getSeasonEpisodes` sits in the search class: episode lists are refreshed
/// on the shortest window. No current action maps to `Person`; person
/// lookups are classed by what they return (details, credits, search).
const ACTION_TABLE: [(&str, Action, ActionClass); 14] = [
    ("searchMovies", Action::SearchMovies, ActionClass::Search),
    ("searchTVShows", Action::SearchTvShows, ActionClass::Search),
    ("getMovieDetails", Action::GetMovieDetails, ActionClass::Details),
    ("getMovieCredits", Action::GetMovieCredits, ActionClass::Credits),
    ("getTVDetails", Action::GetTvDetails, ActionClass::Details),
    ("getTVCredits", Action::GetTvCredits, ActionClass::Credits),
    ("getSeasonEpisodes", Action::GetSeasonEpisodes, ActionClass::Search),
    ("getMovieWatchProviders", Action::GetMovieWatchProviders, ActionClass::Providers),
    ("getTVWatchProviders", Action::GetTvWatchProviders, ActionClass::Providers),
    ("getPersonDetails", Action::GetPersonDetails, ActionClass::Details),
    ("getPersonCredits", Action::GetPersonCredits, ActionClass::Credits),
    ("searchPerson", Action::SearchPerson, ActionClass::Search),
    ("discoverMovies", Action::DiscoverMovies, ActionClass::Discover),
    ("discoverTVShows", Action::DiscoverTvShows, ActionClass::Discover),
];

impl Action {
    pub fn from_name(name: &str) -> Option<Action> {
        ACTION_TABLE
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, action, _)| *action)
    }

    pub fn all() -> impl Iterator<Item = Action> {
        ACTION_TABLE.iter().map(|(_, action, _)| *action)
    }

    pub fn name(self) -> &'static str {
        self.row().0
    }

    pub fn class(self) -> ActionClass {
        self.row().2
    }

    fn row(self) -> &'static (&'static str, Action, ActionClass) {
        ACTION_TABLE
            .iter()
            .find(|(_, action, _)| *action == self)
            .unwrap_or_else(|| unreachable!("every action has a table row"))
    }
}

impl ActionClass {
    pub const ALL: [ActionClass; 6] = [
        ActionClass::Search,
        ActionClass::Details,
        ActionClass::Credits,
        ActionClass::Providers,
        ActionClass::Discover,
        ActionClass::Person,
    ];

    /// Class for an action name. Unknown names fall back to `Search`, the
    /// shortest window.
    pub fn classify(action_name: &str) -> ActionClass {
        Action::from_name(action_name)
            .map(Action::class)
            .unwrap_or(ActionClass::Search)
    }

    pub fn name(self) -> &'static str {
        match self {
            ActionClass::Search => "search",
            ActionClass::Details => "details",
            ActionClass::Credits => "credits",
            ActionClass::Providers => "providers",
            ActionClass::Discover => "discover",
            ActionClass::Person => "person",
        }
    }
}

/// TTL per action class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlPolicy {
    pub search: Duration,
    pub details: Duration,
    pub credits: Duration,
    pub providers: Duration,
    pub discover: Duration,
    pub person: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        const MINUTE: u64 = 60;
        const HOUR: u64 = 60 * MINUTE;
        Self {
            search: Duration::from_secs(5 * MINUTE),
            details: Duration::from_secs(HOUR),
            credits: Duration::from_secs(24 * HOUR),
            providers: Duration::from_secs(6 * HOUR),
            discover: Duration::from_secs(30 * MINUTE),
            person: Duration::from_secs(24 * HOUR),
        }
    }
}

impl TtlPolicy {
    pub fn ttl(&self, class: ActionClass) -> Duration {
        match class {
            ActionClass::Search => self.search,
            ActionClass::Details => self.details,
            ActionClass::Credits => self.credits,
            ActionClass::Providers => self.providers,
            ActionClass::Discover => self.discover,
            ActionClass::Person => self.person,
        }
    }

    pub fn ttl_for_action(&self, action_name: &str) -> Duration {
        self.ttl(ActionClass::classify(action_name))
    }
}
