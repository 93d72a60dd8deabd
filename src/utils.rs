//! Formatting and source-URI helpers shared by the label mirror and the shell.

use url::Url;

/// Render a playback position as `M:SS` or `H:MM:SS`.
/// Negative and non-finite inputs render as `0:00`.
pub fn format_duration(time: f64) -> String {
    if !time.is_finite() || time < 0.0 {
        return "0:00".to_string();
    }
    let total = time.floor() as u64;
    let seconds = total % 60;
    let minutes = (total / 60) % 60;
    let hours = total / 3600;
    if hours == 0 {
        format!("{}:{:02}", minutes, seconds)
    } else {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Like [`format_duration`] but an unknown time reads as a loading placeholder.
pub fn format_video_duration(time: f64) -> String {
    if !time.is_finite() || time < 0.0 {
        return "Loading...".to_string();
    }
    format_duration(time)
}

fn trim_fixed(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value);
    if fixed.contains('.') {
        fixed
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        fixed
    }
}

fn scaled_label(value: f64, base: f64, units: &[&str]) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "Unknown".to_string();
    }
    let mut scaled = value;
    let mut unit_index = 0;
    while scaled >= base && unit_index < units.len() - 1 {
        scaled /= base;
        unit_index += 1;
    }
    let decimals = if scaled < 10.0 && unit_index > 0 { 2 } else { 1 };
    format!("{} {}", trim_fixed(scaled, decimals), units[unit_index])
}

pub fn format_file_size(bytes: f64) -> String {
    scaled_label(bytes, 1024.0, &["B", "KB", "MB", "GB", "TB"])
}

pub fn format_bitrate(bits_per_second: f64) -> String {
    scaled_label(bits_per_second, 1000.0, &["bps", "Kbps", "Mbps", "Gbps"])
}

/// `1×`, `1.25×`, `0.5×`.
pub fn format_playback_rate(rate: f64) -> String {
    if !rate.is_finite() {
        return "1×".to_string();
    }
    if rate.fract() == 0.0 {
        format!("{:.0}×", rate)
    } else {
        format!("{}×", trim_fixed(rate, 2))
    }
}

/// Absolute form of `raw` against the page location. Anything that does not
/// parse is returned untouched.
pub fn resolve_source_uri(raw: &str, base: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let resolved = match Url::parse(base) {
        Ok(base) => base.join(raw),
        Err(_) => Url::parse(raw),
    };
    resolved
        .map(|url| url.to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// Human label for a source: the decoded file name, or the host when the path
/// is empty.
pub fn derive_source_label(src: &str, base: &str) -> String {
    if src.is_empty() {
        return "Unavailable".to_string();
    }
    let parsed = match Url::parse(base) {
        Ok(base) => base.join(src),
        Err(_) => Url::parse(src),
    };
    match parsed {
        Ok(url) => {
            let last = url
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(decode_segment);
            match last {
                Some(name) => name,
                None => url.host_str().unwrap_or_default().to_string(),
            }
        }
        Err(_) => {
            let last = src.rsplit('/').next().unwrap_or_default();
            if last.is_empty() {
                decode_segment(src)
            } else {
                decode_segment(last)
            }
        }
    }
}

/// MIME type guessed from the file extension of `src`, or empty.
pub fn derive_mime_from_src(src: &str) -> String {
    if src.is_empty() {
        return String::new();
    }
    let clean = src.split(['?', '#']).next().unwrap_or_default();
    let file_name = clean.rsplit('/').next().unwrap_or_default();
    let Some((_, extension)) = file_name.rsplit_once('.') else {
        return String::new();
    };
    if extension.is_empty() {
        return String::new();
    }
    let extension = extension.to_lowercase();
    match extension.as_str() {
        "mp4" => "video/mp4".to_string(),
        "webm" => "video/webm".to_string(),
        "ogv" => "video/ogg".to_string(),
        "mov" => "video/quicktime".to_string(),
        "m3u8" => "application/x-mpegURL".to_string(),
        other => format!("video/{other}"),
    }
}
