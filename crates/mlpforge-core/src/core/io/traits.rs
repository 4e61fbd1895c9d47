use crate::core::models::batch::ConfigurationBatch;
use crate::core::models::configuration::{AtomicConfiguration, LabeledConfiguration};
use nalgebra::Vector3;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// One frame as stored on disk: positions always, labels when the file has them.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub configuration: AtomicConfiguration,
    pub energy: Option<f64>,
    pub forces: Option<Vec<Vector3<f64>>>,
}

impl Frame {
    pub fn is_labeled(&self) -> bool {
        self.energy.is_some() && self.forces.is_some()
    }

    pub fn into_labeled(self) -> Option<LabeledConfiguration> {
        match (self.energy, self.forces) {
            (Some(energy), Some(forces)) => {
                Some(LabeledConfiguration::new(self.configuration, energy, forces))
            }
            _ => None,
        }
    }
}

impl From<AtomicConfiguration> for Frame {
    fn from(configuration: AtomicConfiguration) -> Self {
        Self {
            configuration,
            energy: None,
            forces: None,
        }
    }
}

impl From<LabeledConfiguration> for Frame {
    fn from(labeled: LabeledConfiguration) -> Self {
        Self {
            configuration: labeled.configuration,
            energy: Some(labeled.energy),
            forces: Some(labeled.forces),
        }
    }
}

/// Defines the interface for reading and writing multi-frame structure files.
///
/// Implementors handle the format-specific parsing and serialization; the
/// provided methods add path handling and conversion to batches.
pub trait ConfigurationFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads every frame from a buffered reader, in file order.
    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Frame>, Self::Error>;

    /// Writes frames to a writer, in slice order.
    fn write_to(frames: &[Frame], writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Error returned when a frame that must be labeled is not.
    fn unlabeled_frame_error(frame_index: usize) -> Self::Error;

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Frame>, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    fn write_to_path<P: AsRef<Path>>(frames: &[Frame], path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(frames, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads a file whose frames must all carry an energy and forces.
    fn read_batch_from_path<P: AsRef<Path>>(path: P) -> Result<ConfigurationBatch, Self::Error> {
        Self::read_from_path(path)?
            .into_iter()
            .enumerate()
            .map(|(i, frame)| frame.into_labeled().ok_or_else(|| Self::unlabeled_frame_error(i)))
            .collect()
    }

    fn write_batch_to_path<P: AsRef<Path>>(
        batch: &ConfigurationBatch,
        path: P,
    ) -> Result<(), Self::Error> {
        let frames: Vec<Frame> = batch.iter().cloned().map(Frame::from).collect();
        Self::write_to_path(&frames, path)
    }

    fn write_configurations_to_path<P: AsRef<Path>>(
        configurations: &[AtomicConfiguration],
        path: P,
    ) -> Result<(), Self::Error> {
        let frames: Vec<Frame> = configurations.iter().cloned().map(Frame::from).collect();
        Self::write_to_path(&frames, path)
    }
}
