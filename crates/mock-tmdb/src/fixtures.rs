//! Canned TMDB bodies. Only a handful of titles exist; anything else is 404.

use serde_json::{json, Value};

pub const MATRIX: u64 = 603;
pub const BREAKING_BAD: u64 = 1396;
pub const KEANU_REEVES: u64 = 6384;

pub fn movies() -> Vec<Value> {
    vec![
        json!({
            "id": MATRIX,
            "title": "Matrix",
            "original_title": "The Matrix",
            "overview": "Um hacker descobre a verdade sobre a realidade.",
            "poster_path": "/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg",
            "backdrop_path": "/fNG7i7RqMErkcqhohV2a6cV1Ehy.jpg",
            "release_date": "1999-03-30",
            "vote_average": 8.2,
            "genre_ids": [28, 878],
            "popularity": 85.3
        }),
        json!({
            "id": 245891,
            "title": "John Wick: De Volta ao Jogo",
            "original_title": "John Wick",
            "overview": "Um ex-assassino sai da aposentadoria.",
            "poster_path": "/fZPSd91yGE9fCcCe6OoQr6E3Bev.jpg",
            "backdrop_path": null,
            "release_date": "2014-10-22",
            "vote_average": 7.4,
            "genre_ids": [28, 53],
            "popularity": 60.1
        }),
    ]
}

pub fn tv_shows() -> Vec<Value> {
    vec![json!({
        "id": BREAKING_BAD,
        "name": "Breaking Bad",
        "overview": "Um professor de química vira fabricante de metanfetamina.",
        "poster_path": "/ggFHVNu6YYI5L9pCfOacjizRGt.jpg",
        "backdrop_path": "/tsRy63Mu5cu8etL1X7ZLyf7UP1M.jpg",
        "first_air_date": "2008-01-20",
        "vote_average": 8.9,
        "genre_ids": [18, 80],
        "popularity": 300.2
    })]
}

pub fn people() -> Vec<Value> {
    (0..7u64)
        .map(|i| {
            let (name, profile_path) = if i == 0 {
                ("Keanu Reeves".to_string(), json!("/4D0PpNI0kmP58hgrwGC3wCjxhnm.jpg"))
            } else {
                (format!("Keanu Reeves Fan {i}"), Value::Null)
            };
            json!({
                "id": KEANU_REEVES + i,
                "name": name,
                "profile_path": profile_path,
                "known_for_department": "Acting",
                "popularity": 50.0 - i as f64
            })
        })
        .collect()
}

pub fn movie_details(id: u64) -> Option<Value> {
    (id == MATRIX).then(|| {
        json!({
            "id": MATRIX,
            "title": "Matrix",
            "overview": "Um hacker descobre a verdade sobre a realidade.",
            "poster_path": "/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg",
            "backdrop_path": "/fNG7i7RqMErkcqhohV2a6cV1Ehy.jpg",
            "release_date": "1999-03-30",
            "vote_average": 8.2,
            "genre_ids": [28, 878],
            "popularity": 85.3,
            "runtime": 136,
            "genres": [{"id": 28, "name": "Ação"}, {"id": 878, "name": "Ficção científica"}],
            "tagline": "Bem-vindo ao mundo real.",
            "status": "Released",
            "budget": 63000000,
            "revenue": 463517383,
            "production_companies": [{"id": 79, "name": "Village Roadshow Pictures", "logo_path": null}]
        })
    })
}

pub fn movie_credits(id: u64) -> Option<Value> {
    (id == MATRIX).then(|| {
        json!({
            "id": MATRIX,
            "cast": [
                {"id": KEANU_REEVES, "name": "Keanu Reeves", "character": "Neo", "profile_path": null, "order": 0},
                {"id": 2975, "name": "Laurence Fishburne", "character": "Morpheus", "profile_path": null, "order": 1}
            ],
            "crew": [
                {"id": 9339, "name": "Lilly Wachowski", "job": "Director", "department": "Directing", "profile_path": null},
                {"id": 9340, "name": "Lana Wachowski", "job": "Director", "department": "Directing", "profile_path": null}
            ]
        })
    })
}

pub fn tv_details(id: u64) -> Option<Value> {
    (id == BREAKING_BAD).then(|| {
        json!({
            "id": BREAKING_BAD,
            "name": "Breaking Bad",
            "first_air_date": "2008-01-20",
            "number_of_seasons": 5,
            "number_of_episodes": 62,
            "status": "Ended",
            "genres": [{"id": 18, "name": "Drama"}, {"id": 80, "name": "Crime"}],
            "created_by": [{"id": 66633, "name": "Vince Gilligan"}],
            "seasons": [
                {"id": 3572, "season_number": 1, "episode_count": 7, "air_date": "2008-01-20",
                 "poster_path": null, "name": "Temporada 1", "overview": ""}
            ]
        })
    })
}

pub fn tv_credits(id: u64) -> Option<Value> {
    (id == BREAKING_BAD).then(|| {
        json!({
            "id": BREAKING_BAD,
            "cast": [
                {"id": 17419, "name": "Bryan Cranston", "character": "Walter White", "profile_path": null, "order": 0}
            ],
            "crew": [
                {"id": 66633, "name": "Vince Gilligan", "job": "Executive Producer", "department": "Production", "profile_path": null}
            ]
        })
    })
}

pub fn season(tv_id: u64, season: u32) -> Option<Value> {
    if tv_id != BREAKING_BAD || !(1..=5).contains(&season) {
        return None;
    }
    let episodes: Vec<Value> = (1..=3)
        .map(|n| {
            json!({
                "id": 62085 + n,
                "name": format!("Episódio {n}"),
                "overview": "",
                "still_path": null,
                "episode_number": n,
                "season_number": season,
                "air_date": "2008-01-20",
                "vote_average": 8.0,
                "runtime": 47
            })
        })
        .collect();
    Some(json!({
        "_id": "52542282760ee313280017f9",
        "id": 3572,
        "season_number": season,
        "episodes": episodes
    }))
}

pub fn watch_providers(id: u64) -> Value {
    let results = if id == MATRIX {
        json!({
            "US": {"link": "https://www.themoviedb.org/movie/603/watch?locale=US",
                   "flatrate": [{"provider_id": 1899, "provider_name": "Max"}]},
            "BR": {"link": "https://www.themoviedb.org/movie/603/watch?locale=BR",
                   "flatrate": [{"provider_id": 1899, "provider_name": "Max"}],
                   "rent": [{"provider_id": 2, "provider_name": "Apple TV"}]}
        })
    } else {
        // Known elsewhere, not streaming in Brazil
        json!({
            "US": {"link": format!("https://www.themoviedb.org/tv/{id}/watch?locale=US"),
                   "flatrate": [{"provider_id": 8, "provider_name": "Netflix"}]}
        })
    };
    json!({"id": id, "results": results})
}

pub fn person_details(id: u64) -> Option<Value> {
    (id == KEANU_REEVES).then(|| {
        json!({
            "id": KEANU_REEVES,
            "name": "Keanu Reeves",
            "birthday": "1964-09-02",
            "place_of_birth": "Beirut, Lebanon",
            "known_for_department": "Acting",
            "profile_path": "/4D0PpNI0kmP58hgrwGC3wCjxhnm.jpg",
            "biography": ""
        })
    })
}

/// Keanu directed Man of Tai Chi and acted in it; he also produced a title
/// he is not in the cast of.
pub fn person_combined_credits(id: u64) -> Option<Value> {
    (id == KEANU_REEVES).then(|| {
        json!({
            "id": KEANU_REEVES,
            "cast": [
                {"id": MATRIX, "media_type": "movie", "title": "Matrix", "character": "Neo", "release_date": "1999-03-30"},
                {"id": 245891, "media_type": "movie", "title": "John Wick", "character": "John Wick", "release_date": "2014-10-22"},
                {"id": 138832, "media_type": "movie", "title": "Man of Tai Chi", "character": "Donaka Mark", "release_date": "2013-07-05"},
                {"id": 61860, "media_type": "tv", "name": "Swedish Dicks", "character": "Tex", "first_air_date": "2016-08-01"},
                {"id": 99999, "media_type": "movie", "title": "Untitled", "character": "", "release_date": ""}
            ],
            "crew": [
                {"id": 138832, "media_type": "movie", "title": "Man of Tai Chi", "job": "Director", "release_date": "2013-07-05"},
                {"id": 501, "media_type": "movie", "title": "Side by Side", "job": "Producer", "release_date": "2012-08-19"}
            ]
        })
    })
}
