//! The two ISO9660 timestamp encodings

use crate::error::{Iso9660Error, Result};

/// Binary timestamp of a directory record
///
/// `gmt_offset` counts quarter hours east of UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct DateTime7 {
    /// Years since 1900
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub gmt_offset: i8,
}

impl DateTime7 {
    /// Build a UTC timestamp
    pub fn new(full_year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Result<Self> {
        if !(1900..=2155).contains(&full_year)
            || !(1..=12).contains(&month)
            || !(1..=31).contains(&day)
            || hour > 23
            || minute > 59
            || second > 59
        {
            return Err(Iso9660Error::InvalidDatetime);
        }
        Ok(Self {
            year: (full_year - 1900) as u8,
            month,
            day,
            hour,
            minute,
            second,
            gmt_offset: 0,
        })
    }

    /// Decode the on-disk bytes
    pub fn from_bytes(bytes: &[u8; 7]) -> Self {
        Self {
            year: bytes[0],
            month: bytes[1],
            day: bytes[2],
            hour: bytes[3],
            minute: bytes[4],
            second: bytes[5],
            gmt_offset: bytes[6] as i8,
        }
    }

    /// Encode to the on-disk 7-byte form
    pub fn to_bytes(&self) -> [u8; 7] {
        [
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.gmt_offset as u8,
        ]
    }
    
    /// Calendar year
    pub fn full_year(&self) -> u16 {
        1900 + self.year as u16
    }
}

impl Default for DateTime7 {
    /// 2000-01-01 00:00:00 UTC
    fn default() -> Self {
        Self {
            year: 100,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            gmt_offset: 0,
        }
    }
}

/// Digit-string timestamp of a volume descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct DateTime17 {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub hundredths: u8,
    pub gmt_offset: i8,
}

impl DateTime17 {
    /// The "not specified" value: sixteen ASCII zeros and a zero offset
    pub const UNSPECIFIED: [u8; 17] = *b"0000000000000000\0";

    /// `None` for the unspecified value or non-digit bytes
    pub fn from_bytes(bytes: &[u8; 17]) -> Option<Self> {
        if bytes == &Self::UNSPECIFIED {
            return None;
        }
        let digits = |range: core::ops::Range<usize>| -> Option<u16> {
            bytes[range].iter().try_fold(0u16, |acc, &b| {
                b.is_ascii_digit().then(|| acc * 10 + (b - b'0') as u16)
            })
        };
        Some(Self {
            year: digits(0..4)?,
            month: digits(4..6)? as u8,
            day: digits(6..8)? as u8,
            hour: digits(8..10)? as u8,
            minute: digits(10..12)? as u8,
            second: digits(12..14)? as u8,
            hundredths: digits(14..16)? as u8,
            gmt_offset: bytes[16] as i8,
        })
    }

    /// Encode to the on-disk ASCII form
    pub fn to_bytes(&self) -> [u8; 17] {
        let mut out = [0u8; 17];
        let mut put = |at: usize, width: usize, mut value: u16| {
            for i in (0..width).rev() {
                out[at + i] = b'0' + (value % 10) as u8;
                value /= 10;
            }
        };
        put(0, 4, self.year);
        put(4, 2, self.month as u16);
        put(6, 2, self.day as u16);
        put(8, 2, self.hour as u16);
        put(10, 2, self.minute as u16);
        put(12, 2, self.second as u16);
        put(14, 2, self.hundredths as u16);
        out[16] = self.gmt_offset as u8;
        out
    }
}

impl From<DateTime7> for DateTime17 {
    fn from(dt: DateTime7) -> Self {
        Self {
            year: dt.full_year(),
            month: dt.month,
            day: dt.day,
            hour: dt.hour,
            minute: dt.minute,
            second: dt.second,
            hundredths: 0,
            gmt_offset: dt.gmt_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_datetime_round_trip() {
        let dt = DateTime17::from(DateTime7::new(2024, 3, 9, 17, 5, 42).unwrap());
        let bytes = dt.to_bytes();
        assert_eq!(&bytes[..16], b"2024030917054200");
        assert_eq!(DateTime17::from_bytes(&bytes), Some(dt));
    }

    #[test]
    fn test_unspecified_datetime() {
        assert_eq!(DateTime17::from_bytes(&DateTime17::UNSPECIFIED), None);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(DateTime7::new(2024, 13, 1, 0, 0, 0), Err(Iso9660Error::InvalidDatetime));
    }
}
