//! # EDF container codec
//!
//! Reads and writes the fixed-layout EDF container: a 256 byte ASCII header,
//! a 256 byte per-signal metadata block stored column by column, and a body of
//! data records in which every signal contributes a block of little-endian
//! 16-bit samples.
//!
//! ## Quick Start
//!
//! ### Reading a file
//!
//! ```rust
//! use edfcodec::{EdfFile, Result};
//!
//! fn main() -> Result<()> {
//!     # let dir = tempfile::tempdir()?;
//!     # let path = dir.path().join("recording.edf");
//!     # edfcodec::doctest_utils::create_two_signal_file(&path)?;
//!     // Decode the header and every signal
//!     let file = EdfFile::open(&path)?;
//!
//!     if let Some(header) = file.header() {
//!         println!("Signals: {}", header.signal_count);
//!         println!("Records: {} x {}s", header.record_count, header.record_duration_seconds);
//!     }
//!     for signal in file.signals() {
//!         println!("{}", signal);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Reading one channel
//!
//! Opening lazily decodes only the header. A later read walks the records and
//! keeps only the requested channel, so memory stays proportional to that
//! channel.
//!
//! ```rust
//! use edfcodec::{EdfFile, Result};
//!
//! fn main() -> Result<()> {
//!     # let dir = tempfile::tempdir()?;
//!     # let path = dir.path().join("recording.edf");
//!     # edfcodec::doctest_utils::create_two_signal_file(&path)?;
//!     let mut file = EdfFile::open_lazy(&path)?;
//!
//!     if let Some(ecg) = file.read_signal_by_label("ECG")? {
//!         println!("ECG: {} samples", ecg.samples.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Creating a file
//!
//! ```rust
//! use edfcodec::{EdfFile, Header, Signal, Result};
//!
//! fn main() -> Result<()> {
//!     # let dir = tempfile::tempdir()?;
//!     # let path = dir.path().join("output.edf");
//!     let signal = Signal {
//!         label: "EEG Fp1".to_string(),
//!         transducer_type: "AgAgCl electrode".to_string(),
//!         physical_dimension: "uV".to_string(),
//!         physical_minimum: -200.0,
//!         physical_maximum: 200.0,
//!         digital_minimum: -32768,
//!         digital_maximum: 32767,
//!         prefiltering: "HP:0.1Hz LP:70Hz".to_string(),
//!         samples_per_record: 256,
//!         samples: (0..512).map(|i| (i % 100) as i16).collect(),
//!         ..Default::default()
//!     };
//!
//!     let header = Header {
//!         patient_id: "P001".to_string(),
//!         record_id: "R001".to_string(),
//!         start_date: "01.01.24".to_string(),
//!         start_time: "08.30.00".to_string(),
//!         record_count: 2,
//!         record_duration_seconds: 1.0,
//!         signal_count: 1,
//!         ..Default::default()
//!     };
//!
//!     // The header size is derived and filled in on save
//!     let mut file = EdfFile::with_signals(header, vec![signal]);
//!     file.save(&path)?;
//!     assert_eq!(file.header().map(|h| h.header_size_bytes), Some(512));
//!     Ok(())
//! }
//! ```
//!
//! ## Physical values
//!
//! Samples are stored as raw digital values. [`Signal::scale_factor`] gives
//! the flat gain `(physical_max - physical_min) / (digital_max - digital_min)`
//! applied by [`Signal::scaled_sample`]:
//!
//! ```rust
//! use edfcodec::Signal;
//!
//! let signal = Signal {
//!     physical_minimum: -100.0,
//!     physical_maximum: 100.0,
//!     digital_minimum: -1000,
//!     digital_maximum: 1000,
//!     samples: vec![500],
//!     ..Default::default()
//! };
//! assert!((signal.scaled_sample(0).unwrap() - 50.0).abs() < 1e-9);
//! ```

pub mod error;
pub mod fields;
pub mod types;
pub mod utils;
pub mod reader;
pub mod writer;
pub mod file;

#[doc(hidden)]
pub mod doctest_utils; // For internal doctest support

// Re-export main types for convenience
pub use error::{EdfError, Result};
pub use fields::Field;
pub use types::{Header, Signal, SignalColumns};
pub use reader::EdfReader;
pub use writer::EdfWriter;
pub use file::EdfFile;

// Important constants
pub const HEADER_BLOCK_SIZE: usize = 256; // fixed header
pub const SIGNAL_BLOCK_SIZE: usize = 256; // metadata per signal
pub const SAMPLE_SIZE: usize = 2; // little-endian i16

/// Library version
///
/// ```rust
/// let version = edfcodec::version();
/// assert!(version.contains('.'));
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
