use super::error::EngineError;
use super::tasks::energy_outlier::EnergyBaseline;
use crate::core::models::batch::ConfigurationBatch;
use std::fmt;

/// The check that rejected a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectionCause {
    Overlap,
    Force,
    Energy,
}

impl RejectionCause {
    pub const ALL: [RejectionCause; 3] = [Self::Overlap, Self::Force, Self::Energy];
}

impl fmt::Display for RejectionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Overlap => "atomic overlap",
            Self::Force => "excessive force",
            Self::Energy => "energy outlier",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectionReason {
    Overlap { min_distance: f64, threshold: f64 },
    ExcessiveForce { max_force: f64, tolerance: f64 },
    EnergyOutlier { z_score: f64, sigma_n: f64 },
}

impl RejectionReason {
    pub fn cause(&self) -> RejectionCause {
        match self {
            Self::Overlap { .. } => RejectionCause::Overlap,
            Self::ExcessiveForce { .. } => RejectionCause::Force,
            Self::EnergyOutlier { .. } => RejectionCause::Energy,
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overlap {
                min_distance,
                threshold,
            } => write!(f, "Min dist {min_distance:.3} < {threshold}"),
            Self::ExcessiveForce {
                max_force,
                tolerance,
            } => write!(f, "Max force {max_force:.2} > {tolerance}"),
            Self::EnergyOutlier { z_score, sigma_n } => {
                write!(f, "Energy outlier (Z-score {z_score:.2} > {sigma_n})")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameStatus {
    Valid,
    Rejected(RejectionReason),
}

impl FrameStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogEntry {
    pub frame: usize,
    pub reason: RejectionReason,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame {}: {}", self.frame, self.reason)
    }
}

/// Append-only record of rejections, in the order the checks fired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RejectionLog {
    entries: Vec<LogEntry>,
}

impl RejectionLog {
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, cause: RejectionCause) -> usize {
        self.entries
            .iter()
            .filter(|e| e.reason.cause() == cause)
            .count()
    }

    /// One `Frame <index>: <reason>` line per entry.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(LogEntry::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Per-frame status for one quality-control run.
///
/// Every frame starts [`FrameStatus::Valid`] and can be rejected at most once;
/// each rejection is mirrored in the [`RejectionLog`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityMask {
    statuses: Vec<FrameStatus>,
    log: RejectionLog,
}

impl ValidityMask {
    pub fn new(frame_count: usize) -> Self {
        Self {
            statuses: vec![FrameStatus::Valid; frame_count],
            log: RejectionLog::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn status(&self, frame: usize) -> Option<&FrameStatus> {
        self.statuses.get(frame)
    }

    pub fn is_valid(&self, frame: usize) -> bool {
        self.statuses.get(frame).is_some_and(FrameStatus::is_valid)
    }

    pub fn valid_indices(&self) -> Vec<usize> {
        self.statuses
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.is_valid().then_some(i))
            .collect()
    }

    pub fn valid_count(&self) -> usize {
        self.statuses.iter().filter(|s| s.is_valid()).count()
    }

    pub fn reject(&mut self, frame: usize, reason: RejectionReason) -> Result<(), EngineError> {
        let status = self.statuses.get_mut(frame).ok_or_else(|| {
            EngineError::Internal(format!("frame index {frame} is outside the batch"))
        })?;
        if let FrameStatus::Rejected(existing) = status {
            return Err(EngineError::AlreadyRejected {
                frame,
                existing: existing.to_string(),
            });
        }
        *status = FrameStatus::Rejected(reason);
        self.log.entries.push(LogEntry { frame, reason });
        Ok(())
    }

    pub fn statuses(&self) -> &[FrameStatus] {
        &self.statuses
    }

    pub fn log(&self) -> &RejectionLog {
        &self.log
    }

    pub fn into_parts(self) -> (Vec<FrameStatus>, RejectionLog) {
        (self.statuses, self.log)
    }
}

/// Frames that survived quality control, or the distinguished empty result.
#[derive(Debug, Clone, PartialEq)]
pub enum FilteredBatch {
    Retained(ConfigurationBatch),
    Empty,
}

impl FilteredBatch {
    pub fn from_batch(batch: ConfigurationBatch) -> Self {
        if batch.is_empty() {
            Self::Empty
        } else {
            Self::Retained(batch)
        }
    }

    pub fn len(&self) -> usize {
        self.batch().map_or(0, ConfigurationBatch::len)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn batch(&self) -> Option<&ConfigurationBatch> {
        match self {
            Self::Retained(batch) => Some(batch),
            Self::Empty => None,
        }
    }

    pub fn into_batch(self) -> ConfigurationBatch {
        match self {
            Self::Retained(batch) => batch,
            Self::Empty => ConfigurationBatch::new(),
        }
    }
}

/// Everything one quality-control run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct QcOutcome {
    pub statuses: Vec<FrameStatus>,
    pub rejection_log: RejectionLog,
    pub filtered: FilteredBatch,
    /// The baseline the energy check resolved, whether or not it was usable.
    pub energy_baseline: Option<EnergyBaseline>,
}

impl QcOutcome {
    pub fn total(&self) -> usize {
        self.statuses.len()
    }

    pub fn kept(&self) -> usize {
        self.filtered.len()
    }

    pub fn rejected(&self) -> usize {
        self.rejection_log.len()
    }

    pub fn rejected_indices(&self) -> Vec<usize> {
        self.rejection_log.entries().iter().map(|e| e.frame).collect()
    }
}
