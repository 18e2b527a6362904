use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use url::Url;

fn encode(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

fn join(base: &Url, path_and_query: &str) -> String {
    format!("{}{}", base.as_str().trim_end_matches('/'), path_and_query)
}

pub fn search_url(base: &Url, query: &str) -> String {
    join(base, &format!("/search?q={}", encode(query)))
}

pub fn artist_details_url(base: &Url, song_title: &str) -> String {
    join(
        base,
        &format!("/get_artist_details?song_title={}", encode(song_title)),
    )
}

pub fn playlists_url(base: &Url) -> String {
    join(base, "/playlists")
}

pub fn stream_url(base: &Url, track_id: &str) -> String {
    join(base, &format!("/play/{}", encode(track_id)))
}

pub fn embed_url(track_id: &str, start_seconds: f64, autoplay: bool) -> String {
    let start = if start_seconds.is_finite() && start_seconds > 0.0 {
        start_seconds.floor() as u64
    } else {
        0
    };
    format!(
        "https://www.youtube.com/embed/{}?enablejsapi=1&controls=0&rel=0&modestbranding=1&mute=1&start={start}&autoplay={}",
        encode(track_id),
        u8::from(autoplay)
    )
}
