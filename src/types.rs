//! Common types used throughout parquet-reshape
//!
//! This module contains shared enumerations used by the configuration,
//! the CLI and the streaming engine.

use arrow::datatypes::TimeUnit;
use parquet::basic::{BrotliLevel, Compression, GzipLevel, ZstdLevel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// File extension of every Parquet file read or written by this crate
pub const PARQUET_EXTENSION: &str = "parquet";

// ============================================================================
// Timestamp Unit
// ============================================================================

/// Precision that timestamp columns can be coerced to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TimestampUnit {
    /// Seconds
    S,
    /// Milliseconds
    Ms,
    /// Microseconds
    Us,
    /// Nanoseconds
    Ns,
}

impl TimestampUnit {
    /// Short name as accepted on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            TimestampUnit::S => "s",
            TimestampUnit::Ms => "ms",
            TimestampUnit::Us => "us",
            TimestampUnit::Ns => "ns",
        }
    }
}

impl From<TimestampUnit> for TimeUnit {
    fn from(unit: TimestampUnit) -> Self {
        match unit {
            TimestampUnit::S => TimeUnit::Second,
            TimestampUnit::Ms => TimeUnit::Millisecond,
            TimestampUnit::Us => TimeUnit::Microsecond,
            TimestampUnit::Ns => TimeUnit::Nanosecond,
        }
    }
}

impl From<TimeUnit> for TimestampUnit {
    fn from(unit: TimeUnit) -> Self {
        match unit {
            TimeUnit::Second => TimestampUnit::S,
            TimeUnit::Millisecond => TimestampUnit::Ms,
            TimeUnit::Microsecond => TimestampUnit::Us,
            TimeUnit::Nanosecond => TimestampUnit::Ns,
        }
    }
}

impl fmt::Display for TimestampUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimestampUnit {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s" => Ok(TimestampUnit::S),
            "ms" => Ok(TimestampUnit::Ms),
            "us" => Ok(TimestampUnit::Us),
            "ns" => Ok(TimestampUnit::Ns),
            other => Err(crate::Error::invalid_value(
                "coerce_timestamps",
                format!("timestamp unit must be one of: s, ms, us, ns (got '{other}')"),
            )),
        }
    }
}

// ============================================================================
// Compression Codec
// ============================================================================

/// Parquet compression codec applied to every row group of an output file
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Codec {
    #[default]
    #[value(alias = "none")]
    Uncompressed,
    Snappy,
    Gzip,
    Brotli,
    Lz4,
    Lz4Raw,
    Zstd,
}

impl Codec {
    /// Lowercase name, as printed in summaries
    pub fn as_str(self) -> &'static str {
        match self {
            Codec::Uncompressed => "uncompressed",
            Codec::Snappy => "snappy",
            Codec::Gzip => "gzip",
            Codec::Brotli => "brotli",
            Codec::Lz4 => "lz4",
            Codec::Lz4Raw => "lz4-raw",
            Codec::Zstd => "zstd",
        }
    }

    /// Name understood by DuckDB's `COPY ... (COMPRESSION <name>)`
    pub fn duckdb_name(self) -> &'static str {
        match self {
            Codec::Uncompressed => "UNCOMPRESSED",
            Codec::Snappy => "SNAPPY",
            Codec::Gzip => "GZIP",
            Codec::Brotli => "BROTLI",
            Codec::Lz4 => "LZ4",
            Codec::Lz4Raw => "LZ4_RAW",
            Codec::Zstd => "ZSTD",
        }
    }

    /// Map a physical column-chunk codec back to a writable codec.
    ///
    /// Returns `None` for codecs the writer cannot produce (LZO).
    pub fn from_parquet(compression: Compression) -> Option<Self> {
        match compression {
            Compression::UNCOMPRESSED => Some(Codec::Uncompressed),
            Compression::SNAPPY => Some(Codec::Snappy),
            Compression::GZIP(_) => Some(Codec::Gzip),
            Compression::BROTLI(_) => Some(Codec::Brotli),
            Compression::LZ4 => Some(Codec::Lz4),
            Compression::LZ4_RAW => Some(Codec::Lz4Raw),
            Compression::ZSTD(_) => Some(Codec::Zstd),
            Compression::LZO => None,
        }
    }
}

impl From<Codec> for Compression {
    fn from(codec: Codec) -> Self {
        match codec {
            Codec::Uncompressed => Compression::UNCOMPRESSED,
            Codec::Snappy => Compression::SNAPPY,
            Codec::Gzip => Compression::GZIP(GzipLevel::default()),
            Codec::Brotli => Compression::BROTLI(BrotliLevel::default()),
            Codec::Lz4 => Compression::LZ4,
            Codec::Lz4Raw => Compression::LZ4_RAW,
            Codec::Zstd => Compression::ZSTD(ZstdLevel::default()),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Codec {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "none" | "uncompressed" => Ok(Codec::Uncompressed),
            "snappy" => Ok(Codec::Snappy),
            "gzip" => Ok(Codec::Gzip),
            "brotli" => Ok(Codec::Brotli),
            "lz4" => Ok(Codec::Lz4),
            "lz4-raw" => Ok(Codec::Lz4Raw),
            "zstd" => Ok(Codec::Zstd),
            other => Err(crate::Error::invalid_value(
                "compression",
                format!("unsupported codec '{other}'"),
            )),
        }
    }
}

// ============================================================================
// Conversion Target
// ============================================================================

/// Direction of a whole-file format conversion
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ConvertTarget {
    /// CSV files in, Parquet files out
    #[default]
    Parquet,
    /// Parquet files in, CSV files out
    Csv,
}

impl ConvertTarget {
    /// Extension of the files that are picked up as inputs
    pub fn source_extension(self) -> &'static str {
        match self {
            ConvertTarget::Parquet => "csv",
            ConvertTarget::Csv => PARQUET_EXTENSION,
        }
    }

    /// Extension given to the mirrored output files
    pub fn target_extension(self) -> &'static str {
        match self {
            ConvertTarget::Parquet => PARQUET_EXTENSION,
            ConvertTarget::Csv => "csv",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("zstd", Codec::Zstd)]
    #[test_case("ZSTD", Codec::Zstd)]
    #[test_case("none", Codec::Uncompressed)]
    #[test_case("uncompressed", Codec::Uncompressed)]
    #[test_case("lz4_raw", Codec::Lz4Raw)]
    #[test_case("Snappy", Codec::Snappy)]
    fn test_codec_from_str(input: &str, expected: Codec) {
        assert_eq!(input.parse::<Codec>().unwrap(), expected);
    }

    #[test]
    fn test_codec_rejects_unknown() {
        assert!("lzo".parse::<Codec>().is_err());
    }

    #[test]
    fn test_codec_parquet_mapping() {
        for codec in [
            Codec::Uncompressed,
            Codec::Snappy,
            Codec::Gzip,
            Codec::Brotli,
            Codec::Lz4,
            Codec::Lz4Raw,
            Codec::Zstd,
        ] {
            assert_eq!(Codec::from_parquet(codec.into()), Some(codec));
        }
        assert_eq!(Codec::from_parquet(Compression::LZO), None);
    }

    #[test_case("s", TimeUnit::Second)]
    #[test_case("ms", TimeUnit::Millisecond)]
    #[test_case("us", TimeUnit::Microsecond)]
    #[test_case("NS", TimeUnit::Nanosecond)]
    fn test_timestamp_unit(input: &str, expected: TimeUnit) {
        let unit: TimestampUnit = input.parse().unwrap();
        assert_eq!(TimeUnit::from(unit), expected);
        assert_eq!(TimestampUnit::from(expected), unit);
    }

    #[test]
    fn test_timestamp_unit_rejects_unknown() {
        assert!("minutes".parse::<TimestampUnit>().is_err());
    }

    #[test]
    fn test_convert_target_extensions() {
        assert_eq!(ConvertTarget::Parquet.source_extension(), "csv");
        assert_eq!(ConvertTarget::Parquet.target_extension(), "parquet");
        assert_eq!(ConvertTarget::Csv.source_extension(), "parquet");
        assert_eq!(ConvertTarget::Csv.target_extension(), "csv");
    }
}
