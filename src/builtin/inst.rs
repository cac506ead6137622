use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use crate::scan;

const NANOS_PER_SEC: i128 = 1_000_000_000;
const SECS_PER_DAY: i64 = 86_400;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InstantError {
    #[error("malformed timestamp, expected `YYYY-MM-DDThh:mm:ss[.fff](Z|+hh:mm)`")]
    Malformed,
    #[error("{field} {value} is out of range")]
    OutOfRange { field: &'static str, value: u32 },
}

/// A point in time as written in an RFC 3339 timestamp.
///
/// The written fields and offset are kept; equality and hashing use the UTC
/// moment, so `16:39:57-08:00` equals `00:39:57Z` on the following day.
/// Trailing fields may be left out (`1985`, `1985-04-12`,
/// `1985-04-12T23:20`); missing ones default to their minimum and a
/// missing offset means UTC.
#[derive(Copy, Clone, Debug)]
pub struct Instant {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    nanosecond: u32,
    offset_minutes: i16,
}

impl Instant {
    #[inline]
    pub fn year(&self) -> u16 {
        self.year
    }

    #[inline]
    pub fn month(&self) -> u8 {
        self.month
    }

    #[inline]
    pub fn day(&self) -> u8 {
        self.day
    }

    #[inline]
    pub fn hour(&self) -> u8 {
        self.hour
    }

    #[inline]
    pub fn minute(&self) -> u8 {
        self.minute
    }

    #[inline]
    pub fn second(&self) -> u8 {
        self.second
    }

    #[inline]
    pub fn nanosecond(&self) -> u32 {
        self.nanosecond
    }

    /// Offset from UTC in minutes, as written.
    #[inline]
    pub fn offset_minutes(&self) -> i16 {
        self.offset_minutes
    }

    /// Nanoseconds since 1970-01-01T00:00:00Z.
    pub fn unix_nanos(&self) -> i128 {
        let days = days_from_civil(i64::from(self.year), u32::from(self.month), u32::from(self.day));
        let seconds = days * SECS_PER_DAY
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second)
            - i64::from(self.offset_minutes) * 60;
        i128::from(seconds) * NANOS_PER_SEC + i128::from(self.nanosecond)
    }
}

impl PartialEq for Instant {
    fn eq(&self, other: &Self) -> bool {
        self.unix_nanos() == other.unix_nanos()
    }
}

impl Eq for Instant {}

impl Hash for Instant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.unix_nanos().hash(state);
    }
}

impl FromStr for Instant {
    type Err = InstantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cursor = Cursor {
            bytes: s.as_bytes(),
            pos: 0,
        };
        let mut instant = Instant {
            year: cursor.digits(4)? as u16,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            nanosecond: 0,
            offset_minutes: 0,
        };

        if cursor.eat(b'-') {
            instant.month = in_range("month", cursor.digits(2)?, 1, 12)?;
            if cursor.eat(b'-') {
                let last = days_in_month(instant.year, instant.month);
                instant.day = in_range("day", cursor.digits(2)?, 1, last)?;
                if cursor.eat(b'T') || cursor.eat(b't') {
                    cursor.time(&mut instant)?;
                }
            }
        }

        if cursor.pos != cursor.bytes.len() {
            return Err(InstantError::Malformed);
        }
        Ok(instant)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )?;
        match self.nanosecond {
            0 => {}
            n if n % 1_000_000 == 0 => write!(f, ".{:03}", n / 1_000_000)?,
            n if n % 1_000 == 0 => write!(f, ".{:06}", n / 1_000)?,
            n => write!(f, ".{n:09}")?,
        }
        if self.offset_minutes == 0 {
            return f.write_str("Z");
        }
        let sign = if self.offset_minutes < 0 { '-' } else { '+' };
        let offset = self.offset_minutes.unsigned_abs();
        write!(f, "{sign}{:02}:{:02}", offset / 60, offset % 60)
    }
}

struct Cursor<'s> {
    bytes: &'s [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn eat(&mut self, byte: u8) -> bool {
        let hit = self.bytes.get(self.pos) == Some(&byte);
        self.pos += usize::from(hit);
        hit
    }

    fn expect(&mut self, byte: u8) -> Result<(), InstantError> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(InstantError::Malformed)
        }
    }

    /// Exactly `len` decimal digits.
    fn digits(&mut self, len: usize) -> Result<u32, InstantError> {
        let digits = self
            .bytes
            .get(self.pos..self.pos + len)
            .filter(|digits| digits.iter().all(u8::is_ascii_digit))
            .ok_or(InstantError::Malformed)?;
        self.pos += len;
        Ok(scan::accumulate_digits(0, digits) as u32)
    }

    /// `hh:mm[:ss[.fraction]]` followed by an optional offset.
    fn time(&mut self, instant: &mut Instant) -> Result<(), InstantError> {
        instant.hour = in_range("hour", self.digits(2)?, 0, 23)?;
        self.expect(b':')?;
        instant.minute = in_range("minute", self.digits(2)?, 0, 59)?;
        if self.eat(b':') {
            instant.second = in_range("second", self.digits(2)?, 0, 59)?;
            if self.eat(b'.') {
                instant.nanosecond = self.fraction()?;
            }
        }
        instant.offset_minutes = self.offset()?;
        Ok(())
    }

    /// One to nine fractional digits, scaled to nanoseconds.
    fn fraction(&mut self) -> Result<u32, InstantError> {
        let len = scan::digit_run(self.bytes, self.pos) - self.pos;
        if !(1..=9).contains(&len) {
            return Err(InstantError::Malformed);
        }
        let value = self.digits(len)?;
        Ok(value * 10u32.pow((9 - len) as u32))
    }

    fn offset(&mut self) -> Result<i16, InstantError> {
        let sign = match self.bytes.get(self.pos) {
            None => return Ok(0),
            Some(b'Z' | b'z') => {
                self.pos += 1;
                return Ok(0);
            }
            Some(b'+') => 1,
            Some(b'-') => -1,
            Some(_) => return Err(InstantError::Malformed),
        };
        self.pos += 1;
        let hours = in_range("offset hour", self.digits(2)?, 0, 23)?;
        self.expect(b':')?;
        let minutes = in_range("offset minute", self.digits(2)?, 0, 59)?;
        Ok(sign * (i16::from(hours) * 60 + i16::from(minutes)))
    }
}

fn in_range(field: &'static str, value: u32, min: u8, max: u8) -> Result<u8, InstantError> {
    if (u32::from(min)..=u32::from(max)).contains(&value) {
        Ok(value as u8)
    } else {
        Err(InstantError::OutOfRange { field, value })
    }
}

fn is_leap_year(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Days since 1970-01-01 in the proleptic Gregorian calendar.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let year_of_era = year.rem_euclid(400);
    let shifted_month = (i64::from(month) + 9) % 12;
    let day_of_year = (153 * shifted_month + 2) / 5 + i64::from(day) - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * 146_097 + day_of_era - 719_468
}
