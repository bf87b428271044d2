//! Becker & Hickl SPC FIFO record decoder.
//!
//! Covers the 4-byte record family (SPC-130/134/140/144/150/154/160/830).
//! The first word is a header carrying the macrotime clock period; every
//! following little-endian word is one record:
//!
//! | bits  | field                                  |
//! |-------|----------------------------------------|
//! | 0-11  | macrotime (or overflow count, see MTOV)|
//! | 12-15 | routing channel                        |
//! | 16-27 | ADC value (microtime = 4095 - ADC)     |
//! | 28    | MARK                                   |
//! | 29    | GAP                                    |
//! | 30    | MTOV (macrotime overflow)              |
//! | 31    | INVALID                                |
//!
//! SPC-600/630 use 6-byte records after a 6-byte header whose second
//! `u16` is the clock period. Each record is `u16` (bits 0-11 ADC, bit 13
//! macrotime overflow), a `u8` high macrotime byte, a `u8` routing channel
//! and a `u16` low macrotime word, giving a 24-bit macrotime.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const RECORD_BYTES: usize = 4;
const MACROTIME_MASK: u32 = 0x0FFF;
const MACROTIME_PERIOD: i64 = 1 << 12;
const ADC_MAX: i64 = 4095;
const OVERFLOW_COUNT_MASK: u32 = 0x0FFF_FFFF;
const CLOCK_MASK: u32 = 0x00FF_FFFF;
const CLOCK_UNIT_S: f64 = 0.1e-9;

const FLAG_MTOV: u32 = 1 << 30;
const FLAG_INVALID: u32 = 1 << 31;

const WIDE_RECORD_BYTES: usize = 6;
const WIDE_MACROTIME_PERIOD: i64 = 1 << 24;
const WIDE_FLAG_OVERFLOW: u16 = 1 << 13;

/// SPC hardware models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SpcModel {
    Spc130,
    #[default]
    Spc134,
    Spc140,
    Spc144,
    Spc150,
    Spc154,
    Spc160,
    Spc600,
    Spc630,
    Spc830,
}

impl SpcModel {
    /// Returns true for models using 4-byte FIFO records.
    #[must_use]
    pub fn uses_four_byte_records(self) -> bool {
        !matches!(self, SpcModel::Spc600 | SpcModel::Spc630)
    }

    /// Size of one FIFO record (and of the file header) in bytes.
    #[must_use]
    pub fn record_bytes(self) -> usize {
        if self.uses_four_byte_records() {
            RECORD_BYTES
        } else {
            WIDE_RECORD_BYTES
        }
    }

    /// Canonical model name, e.g. `"SPC-134"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SpcModel::Spc130 => "SPC-130",
            SpcModel::Spc134 => "SPC-134",
            SpcModel::Spc140 => "SPC-140",
            SpcModel::Spc144 => "SPC-144",
            SpcModel::Spc150 => "SPC-150",
            SpcModel::Spc154 => "SPC-154",
            SpcModel::Spc160 => "SPC-160",
            SpcModel::Spc600 => "SPC-600",
            SpcModel::Spc630 => "SPC-630",
            SpcModel::Spc830 => "SPC-830",
        }
    }
}

impl fmt::Display for SpcModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpcModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();
        match digits.as_str() {
            "130" => Ok(SpcModel::Spc130),
            "134" => Ok(SpcModel::Spc134),
            "140" => Ok(SpcModel::Spc140),
            "144" => Ok(SpcModel::Spc144),
            "150" => Ok(SpcModel::Spc150),
            "154" => Ok(SpcModel::Spc154),
            "160" => Ok(SpcModel::Spc160),
            "600" => Ok(SpcModel::Spc600),
            "630" => Ok(SpcModel::Spc630),
            "830" => Ok(SpcModel::Spc830),
            _ => Err(Error::UnsupportedModel(s.to_string())),
        }
    }
}

/// Decoded SPC photon records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpcRecords {
    /// Macrotime ticks with overflows applied.
    pub macrotimes: Vec<i64>,
    /// Routing channel per photon.
    pub channels: Vec<u8>,
    /// Microtime per photon (ADC bins, reversed so larger = later).
    pub microtimes: Vec<i64>,
    /// Macrotime clock period in seconds.
    pub resolution_s: f64,
}

/// Decodes an SPC FIFO buffer (header record included).
///
/// # Errors
/// Returns [`Error::Misaligned`] / [`Error::TooShort`] for malformed buffers
/// and [`Error::InvalidRecord`] if the header carries a zero clock period.
pub fn decode_fifo(bytes: &[u8], model: SpcModel) -> Result<SpcRecords> {
    let record_bytes = model.record_bytes();
    if !bytes.len().is_multiple_of(record_bytes) {
        return Err(Error::Misaligned {
            len: bytes.len(),
            record_bytes,
        });
    }
    if bytes.is_empty() {
        return Err(Error::TooShort {
            rows: 0,
            required: 1,
        });
    }

    if model.uses_four_byte_records() {
        decode_four_byte(bytes)
    } else {
        decode_six_byte(bytes)
    }
}

fn zero_clock() -> Error {
    Error::InvalidRecord("header macrotime clock is zero".to_string())
}

#[allow(clippy::cast_possible_truncation)]
fn decode_four_byte(bytes: &[u8]) -> Result<SpcRecords> {
    let mut words = bytes
        .chunks_exact(RECORD_BYTES)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]));

    let header = words.next().ok_or_else(zero_clock)?;
    let clock = header & CLOCK_MASK;
    if clock == 0 {
        return Err(zero_clock());
    }

    let capacity = bytes.len() / RECORD_BYTES;
    let mut records = SpcRecords {
        macrotimes: Vec::with_capacity(capacity),
        channels: Vec::with_capacity(capacity),
        microtimes: Vec::with_capacity(capacity),
        resolution_s: f64::from(clock) * CLOCK_UNIT_S,
    };

    let mut overflows: i64 = 0;
    for word in words {
        let invalid = word & FLAG_INVALID != 0;
        let mtov = word & FLAG_MTOV != 0;

        if invalid {
            if mtov {
                overflows += i64::from(word & OVERFLOW_COUNT_MASK);
            }
            continue;
        }
        if mtov {
            overflows += 1;
        }

        let macrotime = i64::from(word & MACROTIME_MASK);
        let channel = ((word >> 12) & 0x0F) as u8;
        let adc = i64::from((word >> 16) & 0x0FFF);

        records
            .macrotimes
            .push(overflows * MACROTIME_PERIOD + macrotime);
        records.channels.push(channel);
        records.microtimes.push(ADC_MAX - adc);
    }

    Ok(records)
}

fn decode_six_byte(bytes: &[u8]) -> Result<SpcRecords> {
    let mut chunks = bytes.chunks_exact(WIDE_RECORD_BYTES);
    let header = chunks.next().ok_or_else(zero_clock)?;
    let clock = u16::from_le_bytes([header[2], header[3]]);
    if clock == 0 {
        return Err(zero_clock());
    }

    let capacity = bytes.len() / WIDE_RECORD_BYTES;
    let mut records = SpcRecords {
        macrotimes: Vec::with_capacity(capacity),
        channels: Vec::with_capacity(capacity),
        microtimes: Vec::with_capacity(capacity),
        resolution_s: f64::from(clock) * CLOCK_UNIT_S,
    };

    let mut overflows: i64 = 0;
    for r in chunks {
        let field0 = u16::from_le_bytes([r[0], r[1]]);
        let low = u16::from_le_bytes([r[4], r[5]]);
        if field0 & WIDE_FLAG_OVERFLOW != 0 {
            overflows += 1;
        }

        let macrotime = (i64::from(r[2]) << 16) | i64::from(low);
        records
            .macrotimes
            .push(overflows * WIDE_MACROTIME_PERIOD + macrotime);
        records.channels.push(r[3]);
        records
            .microtimes
            .push(ADC_MAX - i64::from(field0 & 0x0FFF));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photon(macrotime: u32, channel: u32, adc: u32) -> u32 {
        (macrotime & 0x0FFF) | ((channel & 0x0F) << 12) | ((adc & 0x0FFF) << 16)
    }

    fn encode(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn test_model_parsing() {
        assert_eq!("SPC-134".parse::<SpcModel>().unwrap(), SpcModel::Spc134);
        assert_eq!("spc830".parse::<SpcModel>().unwrap(), SpcModel::Spc830);
        assert!("SPC-999".parse::<SpcModel>().is_err());
        assert_eq!(SpcModel::default().to_string(), "SPC-134");
    }

    #[test]
    fn test_decode_photons_and_overflow() {
        let words = [
            500, // 50 ns clock
            photon(10, 0, 4000),
            photon(20, 1, 95) | FLAG_MTOV,
            FLAG_INVALID | FLAG_MTOV | 3,
            photon(5, 1, 0),
            photon(7, 0, 1) | FLAG_INVALID,
        ];
        let records = decode_fifo(&encode(&words), SpcModel::Spc134).unwrap();

        assert!((records.resolution_s - 50e-9).abs() < 1e-15);
        assert_eq!(records.macrotimes, vec![10, 4096 + 20, 4 * 4096 + 5]);
        assert_eq!(records.channels, vec![0, 1, 1]);
        assert_eq!(records.microtimes, vec![95, 4000, 4095]);
    }

    #[test]
    fn test_header_only() {
        let records = decode_fifo(&encode(&[250]), SpcModel::Spc150).unwrap();
        assert!(records.macrotimes.is_empty());
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(matches!(
            decode_fifo(&[0u8; 6], SpcModel::Spc134),
            Err(Error::Misaligned { .. })
        ));
        assert!(matches!(
            decode_fifo(&[], SpcModel::Spc134),
            Err(Error::TooShort { .. })
        ));
        assert!(matches!(
            decode_fifo(&encode(&[0]), SpcModel::Spc134),
            Err(Error::InvalidRecord(_))
        ));
        assert!(matches!(
            decode_fifo(&[0u8; 8], SpcModel::Spc630),
            Err(Error::Misaligned { record_bytes: 6, .. })
        ));
        assert!(matches!(
            decode_fifo(&[0u8; 6], SpcModel::Spc600),
            Err(Error::InvalidRecord(_))
        ));
    }

    fn wide_record(adc: u16, overflow: bool, macrotime: u32, channel: u8) -> [u8; 6] {
        let field0 = (adc & 0x0FFF) | if overflow { WIDE_FLAG_OVERFLOW } else { 0 };
        let [f0, f1] = field0.to_le_bytes();
        let [lo0, lo1, hi, _] = macrotime.to_le_bytes();
        [f0, f1, hi, channel, lo0, lo1]
    }

    #[test]
    fn test_decode_six_byte_records() {
        let mut data = vec![0u8, 0, 0xF4, 0x01, 0, 0]; // 500 x 0.1 ns
        data.extend(wide_record(4000, false, 0x01_0002, 0));
        data.extend(wide_record(95, true, 7, 1));
        data.extend(wide_record(0, false, 0xFF_FFFF, 1));
        let records = decode_fifo(&data, SpcModel::Spc630).unwrap();

        assert!((records.resolution_s - 50e-9).abs() < 1e-15);
        assert_eq!(
            records.macrotimes,
            vec![0x01_0002, (1 << 24) + 7, (1 << 24) + 0xFF_FFFF]
        );
        assert_eq!(records.channels, vec![0, 1, 1]);
        assert_eq!(records.microtimes, vec![95, 4000, 4095]);
        assert_eq!(SpcModel::Spc630.record_bytes(), 6);
    }
}
