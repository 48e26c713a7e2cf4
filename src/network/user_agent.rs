//! Browser header generation

use rand::seq::SliceRandom;

const PLATFORMS: [&str; 5] = [
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "Macintosh; Intel Mac OS X 14_4_1",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux x86_64",
];

const CHROME: [&str; 5] = ["124.0.0.0", "125.0.0.0", "126.0.0.0", "127.0.0.0", "128.0.0.0"];

const FIREFOX: [&str; 4] = ["126.0", "127.0", "128.0", "129.0"];

/// Pick a realistic desktop user agent
pub fn generate_user_agent() -> String {
    let mut rng = rand::thread_rng();
    let platform = PLATFORMS.choose(&mut rng).copied().unwrap_or(PLATFORMS[0]);

    // Two in three requests look like Chrome
    if [true, true, false].choose(&mut rng).copied().unwrap_or(true) {
        let version = CHROME.choose(&mut rng).copied().unwrap_or(CHROME[0]);
        format!(
            "Mozilla/5.0 ({platform}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{version} Safari/537.36"
        )
    } else {
        let version = FIREFOX.choose(&mut rng).copied().unwrap_or(FIREFOX[0]);
        format!("Mozilla/5.0 ({platform}; rv:{version}) Gecko/20100101 Firefox/{version}")
    }
}

/// Accept header for HTML pages
pub fn accept_html() -> &'static str {
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
}

/// Accept-Language header for a region code such as `us-en` or `de-de`
pub fn accept_language(region: &str) -> String {
    match region.split_once('-') {
        Some((country, lang)) if !country.is_empty() && !lang.is_empty() && country != "wt" => {
            format!(
                "{lang}-{},{lang};q=0.9,en;q=0.8",
                country.to_ascii_uppercase()
            )
        }
        _ => "en-US,en;q=0.9".to_string(),
    }
}
