//! Date/time formatting for the date helper family.
//!
//! Helpers never read the system time directly. They ask the injected
//! [`Clock`] for "now" and hand the value to a [`DateTimeFormatter`], so tests
//! can pin both the time and the time zone:
//!
//! ```rust
//! use stanza_render::datetime::{ChronoFormatter, DateTimeFormatter, FixedClock, FormatOptions, Style, TimeZoneSpec, Clock};
//!
//! let clock = FixedClock::parse("2025-01-01T12:00:00Z").unwrap();
//! let formatter = ChronoFormatter::new(TimeZoneSpec::new(-300, "EST", "Eastern Standard Time", "ET", "Eastern Time"));
//!
//! let text = formatter.format(clock.now(), &FormatOptions::new(Style::DateTimeLong));
//! assert_eq!(text, "January 1, 2025 at 7:00am");
//! ```

use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Creates a clock frozen at an RFC 3339 timestamp.
    pub fn parse(timestamp: &str) -> Result<Self, chrono::ParseError> {
        let parsed = DateTime::parse_from_rfc3339(timestamp)?;
        Ok(Self(parsed.with_timezone(&Utc)))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Output style requested by a helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// `2025-01-01`
    Date,
    /// `January 1, 2025`
    DateLong,
    /// `Jan 1, 2025`
    DateMedium,
    /// `1/1/2025`
    DateShort,
    /// `7:00:00am`
    TimeLong,
    /// `7:00am`
    TimeMedium,
    /// `7am`, or `7:30am` when minutes are set
    TimeShort,
    /// `7:00am EST`
    TimeWithZone,
    /// `January 1, 2025 at 7:00am`
    DateTimeLong,
    /// `Jan 1, 2025, 7:00am`
    DateTimeMedium,
    /// `1/1/2025, 7:00am`
    DateTimeShort,
    /// `January 1, 2025 at 7:00am EST`
    DateTimeWithZone,
}

/// How the am/pm marker is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Meridiem {
    /// `7:00am`
    #[default]
    Lower,
    /// `7:00AM`
    Caps,
    /// `7:00 am`
    Space,
    /// `7:00 a.m.`
    Period,
    /// `7:00a`
    Short,
}

impl Meridiem {
    /// Looks up a style by its template name (`caps`, `space`, `period`, `short`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lower" => Some(Meridiem::Lower),
            "caps" => Some(Meridiem::Caps),
            "space" => Some(Meridiem::Space),
            "period" => Some(Meridiem::Period),
            "short" => Some(Meridiem::Short),
            _ => None,
        }
    }

    fn marker(self, pm: bool) -> &'static str {
        match (self, pm) {
            (Meridiem::Lower, false) => "am",
            (Meridiem::Lower, true) => "pm",
            (Meridiem::Caps, false) => "AM",
            (Meridiem::Caps, true) => "PM",
            (Meridiem::Space, false) => " am",
            (Meridiem::Space, true) => " pm",
            (Meridiem::Period, false) => " a.m.",
            (Meridiem::Period, true) => " p.m.",
            (Meridiem::Short, false) => "a",
            (Meridiem::Short, true) => "p",
        }
    }
}

/// Which time zone name is appended by the zone styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoneNameStyle {
    /// `EST`
    #[default]
    Short,
    /// `Eastern Standard Time`
    Long,
    /// `ET`
    ShortGeneric,
    /// `Eastern Time`
    LongGeneric,
}

impl ZoneNameStyle {
    /// Looks up a style by its template name (`short`, `long`, `shortGeneric`, `longGeneric`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "short" => Some(ZoneNameStyle::Short),
            "long" => Some(ZoneNameStyle::Long),
            "shortGeneric" => Some(ZoneNameStyle::ShortGeneric),
            "longGeneric" => Some(ZoneNameStyle::LongGeneric),
            _ => None,
        }
    }
}

/// Options for [`DateTimeFormatter::format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub style: Style,
    pub meridiem: Meridiem,
    pub zone_name: ZoneNameStyle,
}

impl FormatOptions {
    pub fn new(style: Style) -> Self {
        Self {
            style,
            meridiem: Meridiem::default(),
            zone_name: ZoneNameStyle::default(),
        }
    }

    pub fn meridiem(mut self, meridiem: Meridiem) -> Self {
        self.meridiem = meridiem;
        self
    }

    pub fn zone_name(mut self, zone_name: ZoneNameStyle) -> Self {
        self.zone_name = zone_name;
        self
    }
}

/// Bounds for [`DateTimeFormatter::relative`].
///
/// Values outside `[min, max]` are written as an absolute long date instead
/// of a relative phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelativeOptions {
    pub min: Option<DateTime<Utc>>,
    pub max: Option<DateTime<Utc>>,
}

/// Formats instants for display.
pub trait DateTimeFormatter: Send + Sync {
    /// Formats `value` in the given style.
    fn format(&self, value: DateTime<Utc>, options: &FormatOptions) -> String;

    /// Describes `value` relative to `now` (`6 months ago`, `in 3 days`).
    fn relative(&self, value: DateTime<Utc>, now: DateTime<Utc>, options: &RelativeOptions)
        -> String;
}

/// A fixed-offset time zone with its display names.
///
/// Deserializes from configuration:
///
/// ```yaml
/// time_zone:
///   utc_offset_minutes: -300
///   short: EST
///   long: Eastern Standard Time
///   short_generic: ET
///   long_generic: Eastern Time
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeZoneSpec {
    /// Offset from UTC in minutes (east positive).
    pub utc_offset_minutes: i32,
    pub short: String,
    pub long: String,
    pub short_generic: String,
    pub long_generic: String,
}

impl TimeZoneSpec {
    pub fn new(
        utc_offset_minutes: i32,
        short: impl Into<String>,
        long: impl Into<String>,
        short_generic: impl Into<String>,
        long_generic: impl Into<String>,
    ) -> Self {
        Self {
            utc_offset_minutes,
            short: short.into(),
            long: long.into(),
            short_generic: short_generic.into(),
            long_generic: long_generic.into(),
        }
    }

    /// Coordinated Universal Time.
    pub fn utc() -> Self {
        Self::new(0, "UTC", "Coordinated Universal Time", "UTC", "Coordinated Universal Time")
    }

    /// The zone's offset. Out-of-range offsets fall back to UTC.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)).unwrap_or(Utc.fix())
    }

    /// Display name in the given style.
    pub fn name(&self, style: ZoneNameStyle) -> &str {
        match style {
            ZoneNameStyle::Short => &self.short,
            ZoneNameStyle::Long => &self.long,
            ZoneNameStyle::ShortGeneric => &self.short_generic,
            ZoneNameStyle::LongGeneric => &self.long_generic,
        }
    }
}

impl Default for TimeZoneSpec {
    fn default() -> Self {
        Self::utc()
    }
}

/// English-language formatter over a fixed-offset zone.
#[derive(Debug, Clone, Default)]
pub struct ChronoFormatter {
    zone: TimeZoneSpec,
}

impl ChronoFormatter {
    pub fn new(zone: TimeZoneSpec) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> &TimeZoneSpec {
        &self.zone
    }
}

impl DateTimeFormatter for ChronoFormatter {
    fn format(&self, value: DateTime<Utc>, options: &FormatOptions) -> String {
        let local = value.with_timezone(&self.zone.offset());
        let meridiem = options.meridiem;
        let zone = self.zone.name(options.zone_name);

        match options.style {
            Style::Date => local.format("%Y-%m-%d").to_string(),
            Style::DateLong => date_long(&local),
            Style::DateMedium => date_medium(&local),
            Style::DateShort => date_short(&local),
            Style::TimeLong => time(&local, TimePrecision::Seconds, meridiem),
            Style::TimeMedium => time(&local, TimePrecision::Minutes, meridiem),
            Style::TimeShort => time(&local, TimePrecision::Compact, meridiem),
            Style::TimeWithZone => {
                format!("{} {}", time(&local, TimePrecision::Minutes, meridiem), zone)
            }
            Style::DateTimeLong => format!(
                "{} at {}",
                date_long(&local),
                time(&local, TimePrecision::Minutes, meridiem)
            ),
            Style::DateTimeMedium => format!(
                "{}, {}",
                date_medium(&local),
                time(&local, TimePrecision::Minutes, meridiem)
            ),
            Style::DateTimeShort => format!(
                "{}, {}",
                date_short(&local),
                time(&local, TimePrecision::Minutes, meridiem)
            ),
            Style::DateTimeWithZone => format!(
                "{} at {} {}",
                date_long(&local),
                time(&local, TimePrecision::Minutes, meridiem),
                zone
            ),
        }
    }

    fn relative(
        &self,
        value: DateTime<Utc>,
        now: DateTime<Utc>,
        options: &RelativeOptions,
    ) -> String {
        let below = options.min.is_some_and(|min| value < min);
        let above = options.max.is_some_and(|max| value > max);
        if below || above {
            return self.format(value, &FormatOptions::new(Style::DateLong));
        }

        let seconds = (value - now).num_seconds();
        if seconds == 0 {
            return "now".to_string();
        }

        let (count, unit) = relative_unit(seconds.unsigned_abs());
        let unit = if count == 1 {
            unit.to_string()
        } else {
            format!("{unit}s")
        };

        if seconds < 0 {
            format!("{count} {unit} ago")
        } else {
            format!("in {count} {unit}")
        }
    }
}

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const DAYS_PER_MONTH: f64 = 30.44;
const DAYS_PER_YEAR: f64 = 365.25;

/// Picks the coarsest unit that keeps the number readable.
fn relative_unit(seconds: u64) -> (u64, &'static str) {
    let rounded = |unit: u64| ((seconds as f64) / (unit as f64)).round().max(1.0) as u64;

    if seconds < 45 {
        return (seconds, "second");
    }
    if seconds < 45 * MINUTE {
        return (rounded(MINUTE), "minute");
    }
    if seconds < 22 * HOUR {
        return (rounded(HOUR), "hour");
    }
    if seconds < 26 * DAY {
        return (rounded(DAY), "day");
    }

    let days = seconds as f64 / DAY as f64;
    let months = (days / DAYS_PER_MONTH).round().max(1.0) as u64;
    if months < 11 {
        return (months, "month");
    }
    ((days / DAYS_PER_YEAR).round().max(1.0) as u64, "year")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimePrecision {
    Seconds,
    Minutes,
    /// Hour only when minutes are zero.
    Compact,
}

fn date_long<T: Datelike>(value: &T) -> String {
    format!("{} {}, {}", month_name(value.month()), value.day(), value.year())
}

fn date_medium<T: Datelike>(value: &T) -> String {
    let name = month_name(value.month());
    format!("{} {}, {}", &name[..3], value.day(), value.year())
}

fn date_short<T: Datelike>(value: &T) -> String {
    format!("{}/{}/{}", value.month(), value.day(), value.year())
}

fn time<T: Timelike>(value: &T, precision: TimePrecision, meridiem: Meridiem) -> String {
    let (pm, hour) = value.hour12();
    let marker = meridiem.marker(pm);

    match precision {
        TimePrecision::Seconds => {
            format!("{}:{:02}:{:02}{}", hour, value.minute(), value.second(), marker)
        }
        TimePrecision::Minutes => format!("{}:{:02}{}", hour, value.minute(), marker),
        TimePrecision::Compact if value.minute() == 0 => format!("{hour}{marker}"),
        TimePrecision::Compact => format!("{}:{:02}{}", hour, value.minute(), marker),
    }
}

fn month_name(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    MONTHS[(month.clamp(1, 12) - 1) as usize]
}
