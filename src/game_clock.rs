use chrono::Duration as ChronoDuration;

const MAX_CLOCK_DIGITS: usize = 6;

/// Parses a minutes-played value: `M:SS`, `MM:SS` or `H:MM:SS`, with an
/// optional fractional part on the seconds (`12:03.5`).
pub fn parse_game_time(raw: &str) -> Option<ChronoDuration> {
    let parts = raw.trim().split(':').collect::<Vec<_>>();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (0, parse_whole(m)?, *s),
        [h, m, s] => {
            let minutes = parse_whole(m)?;
            if minutes >= 60 {
                return None;
            }
            (parse_whole(h)?, minutes, *s)
        }
        _ => return None,
    };
    let (secs, millis) = parse_seconds(seconds)?;
    if secs >= 60 {
        return None;
    }
    let total_ms = ((hours * 60 + minutes) * 60 + secs) * 1000 + millis;
    Some(ChronoDuration::milliseconds(total_ms))
}

pub fn total_seconds(duration: ChronoDuration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}

/// `M:SS` with whole minutes and zero-padded seconds; hours roll into minutes.
pub fn format_clock(seconds: f64) -> String {
    let whole = if seconds.is_finite() {
        seconds.max(0.0).floor() as i64
    } else {
        0
    };
    format!("{}:{:02}", whole / 60, whole % 60)
}

fn parse_whole(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.len() > MAX_CLOCK_DIGITS || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn parse_seconds(raw: &str) -> Option<(i64, i64)> {
    let (whole, fraction) = match raw.trim().split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (raw, None),
    };
    let secs = parse_whole(whole)?;
    let millis = match fraction {
        None => 0,
        Some(f) if f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit()) => return None,
        Some(f) => {
            let padded = format!("{f:0<3}");
            padded[..3].parse::<i64>().ok()?
        }
    };
    Some((secs, millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(raw: &str) -> Option<f64> {
        parse_game_time(raw).map(total_seconds)
    }

    #[test]
    fn parses_minute_second_forms() {
        assert_eq!(secs("5:00"), Some(300.0));
        assert_eq!(secs("05:07"), Some(307.0));
        assert_eq!(secs("0:00"), Some(0.0));
        assert_eq!(secs("32:15"), Some(1935.0));
        assert_eq!(secs("1:02:03"), Some(3723.0));
        assert_eq!(secs(" 4:30.5 "), Some(270.5));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(secs(""), None);
        assert_eq!(secs("DNP"), None);
        assert_eq!(secs("5"), None);
        assert_eq!(secs("5:75"), None);
        assert_eq!(secs("1:75:00"), None);
        assert_eq!(secs("-1:00"), None);
        assert_eq!(secs("4:30."), None);
    }

    #[test]
    fn formats_as_minutes_and_seconds() {
        assert_eq!(format_clock(300.0), "5:00");
        assert_eq!(format_clock(65.9), "1:05");
        assert_eq!(format_clock(3723.0), "62:03");
        assert_eq!(format_clock(0.0), "0:00");
    }
}
