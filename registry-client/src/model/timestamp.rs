use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Parse an ISO-8601 timestamp as published in the registry.
///
/// Accepts extended (`2023-06-01T10:00:00+02:00`) and basic
/// (`20230601T100000Z`) forms, reduced precision dates (`2023`, `2023-06`)
/// and times (`T10`, `T10:00`), fractional seconds, and `Z`, `±HH`,
/// `±HHMM` or `±HH:MM` offsets. Times without an offset are taken as UTC,
/// dates without a time as midnight.
pub fn parse_iso8601(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    if !s.is_ascii() {
        return None;
    }

    let (date, time) = match s.find(|c| c == 'T' || c == ' ') {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };

    let date = parse_date(date)?;
    let (time, offset_secs) = match time {
        Some(time) => parse_time(time)?,
        None => (NaiveTime::default(), 0),
    };

    Some(Utc.from_utc_datetime(&date.and_time(time)) - Duration::seconds(offset_secs))
}

fn digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let (year, month, day) = match s.len() {
        4 => (digits(s)?, 1, 1),
        7 if s.as_bytes()[4] == b'-' => (digits(&s[..4])?, digits(&s[5..])?, 1),
        8 => (digits(&s[..4])?, digits(&s[4..6])?, digits(&s[6..])?),
        10 if s.as_bytes()[4] == b'-' && s.as_bytes()[7] == b'-' => {
            (digits(&s[..4])?, digits(&s[5..7])?, digits(&s[8..])?)
        }
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

/// Returns the wall-clock time and the offset east of UTC in seconds.
fn parse_time(s: &str) -> Option<(NaiveTime, i64)> {
    let (clock, offset_secs) = if let Some(clock) = s.strip_suffix('Z') {
        (clock, 0)
    } else if let Some(i) = s.rfind(|c| c == '+' || c == '-') {
        let sign = if s.as_bytes()[i] == b'-' { -1 } else { 1 };
        (&s[..i], sign * parse_offset(&s[i + 1..])?)
    } else {
        (s, 0)
    };

    let (clock, fraction) = match clock.find(|c| c == '.' || c == ',') {
        Some(i) => (&clock[..i], Some(&clock[i + 1..])),
        None => (clock, None),
    };

    let fields: Vec<&str> = if clock.contains(':') {
        clock.split(':').collect()
    } else {
        match clock.len() {
            2 => vec![clock],
            4 => vec![&clock[..2], &clock[2..]],
            6 => vec![&clock[..2], &clock[2..4], &clock[4..]],
            _ => return None,
        }
    };
    if fields.is_empty() || fields.len() > 3 || fields.iter().any(|f| f.len() != 2) {
        return None;
    }

    let hour = digits(fields[0])?;
    let minute = fields.get(1).map_or(Some(0), |f| digits(f))?;
    let second = fields.get(2).map_or(Some(0), |f| digits(f))?;

    let nanos = match fraction {
        Some(f) if f.len() > 9 || digits(f).is_none() => return None,
        Some(f) => digits(&format!("{f:0<9}"))?,
        None => 0,
    };

    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?;
    Some((time, offset_secs))
}

fn parse_offset(s: &str) -> Option<i64> {
    let (hours, minutes) = match s.len() {
        2 => (digits(s)?, 0),
        4 => (digits(&s[..2])?, digits(&s[2..])?),
        5 if s.as_bytes()[2] == b':' => (digits(&s[..2])?, digits(&s[3..])?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(i64::from(hours * 3600 + minutes * 60))
}
