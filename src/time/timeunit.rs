use core::str::FromStr;
use lazy_static::*;
use regex::Regex;
use std::time::Duration;
use thiserror::Error;

lazy_static! {
    static ref DURATION_REGEX: Regex = Regex::new(
        r"^\s*(?P<value>\d+)\s*(?P<unit>[a-z]+)\s*$"
    )
    .expect("Regex compilation error");
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("'{0}' is not a duration, expected <number><unit> such as 200ms or 10s")]
    Syntax(String),
    #[error("unit '{0}' not supported")]
    UnitNotSupported(String),
}

/// Duration written as `<value><unit>`, e.g. `200ms` or `10s`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationUnit {
    value: u64,
    unit: TimeUnit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeUnit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
}

impl FromStr for DurationUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DURATION_REGEX
            .captures(s)
            .ok_or_else(|| Error::Syntax(s.to_owned()))?;
        let value: u64 = caps["value"]
            .parse()
            .map_err(|_| Error::Syntax(s.to_owned()))?;
        let unit = caps["unit"].parse::<TimeUnit>()?;
        value
            .checked_mul(unit.seconds())
            .ok_or_else(|| Error::Syntax(s.to_owned()))?;
        Ok(Self { value, unit })
    }
}

impl From<DurationUnit> for Duration {
    fn from(d: DurationUnit) -> Self {
        match d.unit {
            TimeUnit::Nanosecond => Duration::from_nanos(d.value),
            TimeUnit::Microsecond => Duration::from_micros(d.value),
            TimeUnit::Millisecond => Duration::from_millis(d.value),
            TimeUnit::Second => Duration::from_secs(d.value),
            TimeUnit::Minute | TimeUnit::Hour | TimeUnit::Day => {
                Duration::from_secs(d.value * d.unit.seconds())
            }
        }
    }
}

impl TimeUnit {
    /// Seconds in one unit. Units below a second count as one.
    fn seconds(self) -> u64 {
        match self {
            TimeUnit::Minute => 60,
            TimeUnit::Hour => 60 * 60,
            TimeUnit::Day => 60 * 60 * 24,
            _ => 1,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ns" | "nanos" => Ok(TimeUnit::Nanosecond),
            "us" | "micros" => Ok(TimeUnit::Microsecond),
            "ms" | "millis" => Ok(TimeUnit::Millisecond),
            "s" | "sec" | "secs" => Ok(TimeUnit::Second),
            "m" | "min" | "mins" => Ok(TimeUnit::Minute),
            "h" => Ok(TimeUnit::Hour),
            "d" => Ok(TimeUnit::Day),
            _ => Err(Error::UnitNotSupported(s.to_owned())),
        }
    }
}

/// Parses a duration string straight into [`Duration`].
pub fn parse_duration(s: &str) -> Result<Duration, Error> {
    s.parse::<DurationUnit>().map(Duration::from)
}
