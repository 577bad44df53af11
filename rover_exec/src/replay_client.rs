//! # Replay Client
//!
//! Provides rover telemetry from a recorded drive log, so that the autonomy can be run without the
//! simulator. A drive log is a CSV file with one row per frame:
//!
//! ```text
//! Path;SteerAngle;Throttle;Brake;Speed;X_Position;Y_Position;Pitch;Yaw;Roll
//! IMG/robocam_2017_05_02_11_16_20_903.jpg;0;0;1;0;99,66999;85,58897;0,0;56,82556;0,0
//! ```
//!
//! The columns may be separated by `;` or `,`. Numbers may use a decimal comma. Frame paths are
//! relative to the directory containing the log. Drive logs don't record the sample flags, so
//! `near_sample` and `picking_up` are always false and the sample count is zero.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::{Path, PathBuf},
};

use chrono::Utc;
use comms_if::eqpt::telem::RoverTelem;
use csv::{ReaderBuilder, StringRecordsIntoIter};
use log::debug;
use serde::Deserialize;
use util::convert::telem_str_to_f64;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of rover telemetry, one sample per cycle.
pub trait TelemSource {
    /// An error which can occur while acquiring telemetry.
    type Error;

    /// Get the next telemetry sample, or `None` if the source is exhausted.
    fn next_telem(&mut self) -> Result<Option<RoverTelem>, Self::Error>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Replays the frames and poses of a recorded drive log.
pub struct ReplayClient<R: Read = File> {
    records: StringRecordsIntoIter<R>,

    headers: csv::StringRecord,

    /// Directory relative to which frame paths are resolved
    base_dir: PathBuf,

    /// Number of rows read so far
    num_rows: usize,
}

/// One row of a drive log, with all values kept as strings since the log may use a decimal comma.
#[derive(Debug, Deserialize)]
struct DriveLogRecord {
    #[serde(rename = "Path")]
    path: String,
    #[serde(rename = "SteerAngle")]
    steer_angle: String,
    #[serde(rename = "Throttle")]
    throttle: String,
    #[serde(rename = "Speed")]
    speed: String,
    #[serde(rename = "X_Position")]
    x_position: String,
    #[serde(rename = "Y_Position")]
    y_position: String,
    #[serde(rename = "Pitch")]
    pitch: String,
    #[serde(rename = "Yaw")]
    yaw: String,
    #[serde(rename = "Roll")]
    roll: String,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors converting a telemetry record into a [`RoverTelem`].
#[derive(Debug, thiserror::Error)]
pub enum TelemError {
    #[error("Invalid value for {field}: \"{value}\"")]
    InvalidValue { field: &'static str, value: String },

    #[error("Could not load the frame {0:?}: {1}")]
    FrameError(PathBuf, image::ImageError),
}

/// Errors which can occur while replaying a drive log.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Could not open the drive log: {0}")]
    OpenError(std::io::Error),

    #[error("Could not read the drive log: {0}")]
    ReadError(csv::Error),

    #[error("Invalid telemetry on row {0}: {1}")]
    TelemError(usize, TelemError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ReplayClient<File> {
    /// Open the drive log at the given path.
    pub fn open<P: AsRef<Path>>(log_path: P) -> Result<Self, ReplayError> {
        let log_path = log_path.as_ref();

        let base_dir = log_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let delimiter = {
            let mut header = String::new();
            BufReader::new(File::open(log_path).map_err(ReplayError::OpenError)?)
                .read_line(&mut header)
                .map_err(ReplayError::OpenError)?;
            detect_delimiter(&header)
        };

        let file = File::open(log_path).map_err(ReplayError::OpenError)?;

        Self::with_delimiter(file, delimiter, base_dir)
    }
}

impl<R: Read> ReplayClient<R> {
    /// Build a client reading a drive log from any reader.
    pub fn with_delimiter<P: AsRef<Path>>(
        reader: R,
        delimiter: u8,
        base_dir: P,
    ) -> Result<Self, ReplayError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers().map_err(ReplayError::ReadError)?.clone();

        debug!("Drive log columns: {:?}", headers);

        Ok(Self {
            records: reader.into_records(),
            headers,
            base_dir: base_dir.as_ref().to_path_buf(),
            num_rows: 0,
        })
    }

    /// Number of rows read so far.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn to_telem(&self, record: &DriveLogRecord) -> Result<RoverTelem, TelemError> {
        let frame_path = self.base_dir.join(&record.path);
        let image = image::open(&frame_path)
            .map_err(|e| TelemError::FrameError(frame_path.clone(), e))?
            .to_rgb8();

        Ok(RoverTelem {
            timestamp: Utc::now(),
            image,
            speed_ms: parse("Speed", &record.speed)?,
            position_m: [
                parse("X_Position", &record.x_position)?,
                parse("Y_Position", &record.y_position)?,
            ],
            yaw_deg: parse("Yaw", &record.yaw)?,
            pitch_deg: parse("Pitch", &record.pitch)?,
            roll_deg: parse("Roll", &record.roll)?,
            throttle: parse("Throttle", &record.throttle)?,
            steer_deg: parse("SteerAngle", &record.steer_angle)?,
            near_sample: false,
            picking_up: false,
            sample_count: 0,
            samples_pos_m: None,
        })
    }
}

impl<R: Read> TelemSource for ReplayClient<R> {
    type Error = ReplayError;

    fn next_telem(&mut self) -> Result<Option<RoverTelem>, Self::Error> {
        let row = match self.records.next() {
            Some(r) => r.map_err(ReplayError::ReadError)?,
            None => return Ok(None),
        };
        self.num_rows += 1;

        let record: DriveLogRecord = row
            .deserialize(Some(&self.headers))
            .map_err(ReplayError::ReadError)?;

        self.to_telem(&record)
            .map(Some)
            .map_err(|e| ReplayError::TelemError(self.num_rows, e))
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Pick the column delimiter from the header line.
fn detect_delimiter(header: &str) -> u8 {
    if header.contains(';') {
        b';'
    } else {
        b','
    }
}

fn parse(field: &'static str, value: &str) -> Result<f64, TelemError> {
    telem_str_to_f64(value).map_err(|_| TelemError::InvalidValue {
        field,
        value: value.into(),
    })
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::{Rgb, RgbImage};

    const HEADER: &str = "Path;SteerAngle;Throttle;Brake;Speed;X_Position;Y_Position;Pitch;Yaw;Roll";

    /// Write a frame into a fresh temporary directory, returning the directory.
    fn frame_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("replay_client_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        RgbImage::from_pixel(320, 160, Rgb([10, 20, 30]))
            .save(dir.join("frame.png"))
            .unwrap();
        dir
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter(HEADER), b';');
        assert_eq!(detect_delimiter(&HEADER.replace(';', ",")), b',');
    }

    #[test]
    fn test_replay() {
        let dir = frame_dir("replay");
        let log = format!(
            "{}\nframe.png;-3,5;0,2;0;1,25;99,5;85,25;359,75;56,5;0,5\n\
             frame.png;0;0;1;0;100;86;0;57;0\n",
            HEADER
        );

        let mut client = ReplayClient::with_delimiter(log.as_bytes(), b';', &dir).unwrap();

        let telem = client.next_telem().unwrap().unwrap();
        assert_eq!(telem.image.dimensions(), (320, 160));
        assert_eq!(telem.image.get_pixel(0, 0), &Rgb([10, 20, 30]));
        assert_eq!(telem.steer_deg, -3.5);
        assert_eq!(telem.throttle, 0.2);
        assert_eq!(telem.speed_ms, 1.25);
        assert_eq!(telem.position_m, [99.5, 85.25]);
        assert_eq!(telem.pitch_deg, 359.75);
        assert_eq!(telem.yaw_deg, 56.5);
        assert_eq!(telem.roll_deg, 0.5);
        assert!(!telem.near_sample);
        assert!(!telem.picking_up);
        assert_eq!(telem.sample_count, 0);

        assert!(client.next_telem().unwrap().is_some());
        assert!(client.next_telem().unwrap().is_none());
        assert_eq!(client.num_rows(), 2);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_comma_delimited() {
        let dir = frame_dir("comma");
        let log = format!(
            "{}\nframe.png,0,0,0,inf,1.5,2.5,0,0,0\n",
            HEADER.replace(';', ",")
        );

        let mut client = ReplayClient::with_delimiter(log.as_bytes(), b',', &dir).unwrap();
        let telem = client.next_telem().unwrap().unwrap();

        assert_eq!(telem.position_m, [1.5, 2.5]);
        assert!(!telem.is_valid());

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_errors() {
        let dir = frame_dir("errors");
        let log = format!(
            "{}\nframe.png;0;0;0;fast;0;0;0;0;0\nmissing.png;0;0;0;0;0;0;0;0;0\n",
            HEADER
        );

        let mut client = ReplayClient::with_delimiter(log.as_bytes(), b';', &dir).unwrap();

        match client.next_telem() {
            Err(ReplayError::TelemError(1, TelemError::InvalidValue { field, .. })) => {
                assert_eq!(field, "Speed")
            }
            r => panic!("Expected an invalid value error, got {:?}", r.map(|_| ())),
        }
        match client.next_telem() {
            Err(ReplayError::TelemError(2, TelemError::FrameError(..))) => (),
            r => panic!("Expected a frame error, got {:?}", r.map(|_| ())),
        }

        std::fs::remove_dir_all(dir).ok();
    }
}
