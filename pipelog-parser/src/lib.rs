// pipelog-parser - timestamp scanning for log lines
//
// Lines are free-form, so the scanner only looks near the start of a line
// and returns the first timestamp it can make sense of.

use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// timestamps must start within this many bytes of the line start
const SCAN_WINDOW: usize = 64;

lazy_static! {
    // 2024-03-01T10:22:33.123Z, 2024-03-01 10:22:33,5 +02:00 (offset ignored)
    static ref ISO_RE: Regex = Regex::new(
        r"(?x)
          (?P<y>\d{4})-(?P<mo>\d{2})-(?P<d>\d{2})
          [T\x20]
          (?P<h>\d{2}):(?P<mi>\d{2}):(?P<s>\d{2})
          (?:[.,](?P<frac>\d{1,9}))?"
    ).unwrap();

    // 2024/03/01 10:22:33
    static ref SLASHED_RE: Regex = Regex::new(
        r"(?P<y>\d{4})/(?P<mo>\d{2})/(?P<d>\d{2})\x20(?P<h>\d{2}):(?P<mi>\d{2}):(?P<s>\d{2})"
    ).unwrap();

    // common log format: 01/Mar/2024:10:22:33 +0000
    static ref CLF_RE: Regex = Regex::new(
        r"(?P<d>\d{2})/(?P<mon>[A-Z][a-z]{2})/(?P<y>\d{4}):(?P<h>\d{2}):(?P<mi>\d{2}):(?P<s>\d{2})"
    ).unwrap();
}

fn month_from_abbrev(mon: &str) -> Option<u32> {
    let month = match mon {
        "Jan" => 1,
        "Feb" => 2,
        "Mar" => 3,
        "Apr" => 4,
        "May" => 5,
        "Jun" => 6,
        "Jul" => 7,
        "Aug" => 8,
        "Sep" => 9,
        "Oct" => 10,
        "Nov" => 11,
        "Dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn field(caps: &Captures, name: &str) -> Option<u32> {
    caps.name(name)?.as_str().parse().ok()
}

// right-pad the fraction so "5" means 500ms, not 5ns
fn nanos_from_fraction(caps: &Captures) -> u32 {
    caps.name("frac")
        .map(|m| {
            let digits = m.as_str();
            let padded = format!("{:0<9}", digits);
            padded[..9].parse().unwrap_or(0)
        })
        .unwrap_or(0)
}

fn build(caps: &Captures, month: u32) -> Option<NaiveDateTime> {
    let year = caps.name("y")?.as_str().parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, field(caps, "d")?)?.and_hms_nano_opt(
        field(caps, "h")?,
        field(caps, "mi")?,
        field(caps, "s")?,
        nanos_from_fraction(caps),
    )
}

fn from_numeric(caps: &Captures) -> Option<NaiveDateTime> {
    build(caps, field(caps, "mo")?)
}

fn from_clf(caps: &Captures) -> Option<NaiveDateTime> {
    build(caps, month_from_abbrev(caps.name("mon")?.as_str())?)
}

/// Scan a log line for a leading timestamp.
///
/// Recognized shapes are ISO-8601 style (`2024-03-01T10:22:33.123Z`, with a
/// space or `T` separator), slashed dates (`2024/03/01 10:22:33`) and the
/// common log format (`01/Mar/2024:10:22:33 +0000`). Offsets are dropped: the
/// result is the wall time as written. When several candidates start inside
/// the scan window the leftmost one wins.
pub fn scan_timestamp(line: &str) -> Option<NaiveDateTime> {
    type Convert = fn(&Captures) -> Option<NaiveDateTime>;
    let formats: [(&Regex, Convert); 3] = [
        (&ISO_RE, from_numeric),
        (&SLASHED_RE, from_numeric),
        (&CLF_RE, from_clf),
    ];

    formats
        .iter()
        .filter_map(|(re, convert)| {
            let caps = re.captures(line)?;
            let start = caps.get(0)?.start();
            if start >= SCAN_WINDOW {
                return None;
            }
            convert(&caps).map(|ts| (start, ts))
        })
        .min_by_key(|(start, _)| *start)
        .map(|(_, ts)| ts)
}
