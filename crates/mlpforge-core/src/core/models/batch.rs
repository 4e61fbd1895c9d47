use super::configuration::{LabeledConfiguration, ShapeError};

/// An ordered, owned sequence of labeled frames.
///
/// Frames are not required to share an atom count; per-atom quantities are
/// always computed frame by frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationBatch {
    frames: Vec<LabeledConfiguration>,
}

impl ConfigurationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frames(frames: Vec<LabeledConfiguration>) -> Self {
        Self { frames }
    }

    pub fn push(&mut self, frame: LabeledConfiguration) {
        self.frames.push(frame);
    }

    pub fn extend(&mut self, other: ConfigurationBatch) {
        self.frames.extend(other.frames);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[LabeledConfiguration] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> Option<&LabeledConfiguration> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabeledConfiguration> {
        self.frames.iter()
    }

    pub fn into_frames(self) -> Vec<LabeledConfiguration> {
        self.frames
    }

    /// Checks every frame and returns the index of the first malformed one.
    pub fn validate(&self) -> Result<(), (usize, ShapeError)> {
        self.frames
            .iter()
            .enumerate()
            .try_for_each(|(i, frame)| frame.validate().map_err(|e| (i, e)))
    }

    /// Keeps only the frames for which `keep(index)` is true, preserving order.
    pub fn retain_indices(self, mut keep: impl FnMut(usize) -> bool) -> Self {
        let frames = self
            .frames
            .into_iter()
            .enumerate()
            .filter_map(|(i, frame)| keep(i).then_some(frame))
            .collect();
        Self { frames }
    }
}

impl FromIterator<LabeledConfiguration> for ConfigurationBatch {
    fn from_iter<T: IntoIterator<Item = LabeledConfiguration>>(iter: T) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ConfigurationBatch {
    type Item = LabeledConfiguration;
    type IntoIter = std::vec::IntoIter<LabeledConfiguration>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConfigurationBatch {
    type Item = &'a LabeledConfiguration;
    type IntoIter = std::slice::Iter<'a, LabeledConfiguration>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
