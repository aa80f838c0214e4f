//! Coarse device description from a `User-Agent` header, used in login alerts.

const UNKNOWN_BROWSER: &str = "Unknown browser";
const UNKNOWN_OS: &str = "Unknown OS";

/// Returns `"{browser} on {os}"`.
pub fn describe(user_agent: Option<&str>) -> String {
    let ua = user_agent.map(str::trim).unwrap_or_default();
    format!("{} on {}", browser(ua), operating_system(ua))
}

fn browser(ua: &str) -> &'static str {
    // Order matters: Edge and Opera also advertise Chrome, Chrome also advertises Safari.
    if ua.contains("Edg/") || ua.contains("Edge/") {
        "Edge"
    } else if ua.contains("OPR/") || ua.contains("Opera") {
        "Opera"
    } else if ua.contains("Firefox/") || ua.contains("FxiOS/") {
        "Firefox"
    } else if ua.contains("Chrome/") || ua.contains("CriOS/") {
        "Chrome"
    } else if ua.contains("Safari/") && ua.contains("Version/") {
        "Safari"
    } else if ua.starts_with("curl/") {
        "curl"
    } else {
        UNKNOWN_BROWSER
    }
}

fn operating_system(ua: &str) -> &'static str {
    if ua.contains("Windows") {
        "Windows"
    } else if ua.contains("Android") {
        "Android"
    } else if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iPod") {
        "iOS"
    } else if ua.contains("Mac OS X") || ua.contains("Macintosh") {
        "macOS"
    } else if ua.contains("CrOS") {
        "ChromeOS"
    } else if ua.contains("Linux") || ua.contains("X11") {
        "Linux"
    } else {
        UNKNOWN_OS
    }
}
