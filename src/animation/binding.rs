/// Defines the target property for animation data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPath {
    Translation, // Maps to transform.position
    Rotation,    // Maps to transform.rotation
    Scale,       // Maps to transform.scale
    Weights,     // Maps to Morph Target weights
}

impl TargetPath {
    pub const ALL: [TargetPath; 4] = [
        TargetPath::Translation,
        TargetPath::Rotation,
        TargetPath::Scale,
        TargetPath::Weights,
    ];
}

/// The tracks of the active clip that drive one node, at most one per
/// channel. Values are indices into `AnimationClip::tracks`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelBindings {
    pub translation: Option<usize>,
    pub rotation: Option<usize>,
    pub scale: Option<usize>,
    pub weights: Option<usize>,
}

impl ChannelBindings {
    #[inline]
    #[must_use]
    pub fn get(&self, path: TargetPath) -> Option<usize> {
        match path {
            TargetPath::Translation => self.translation,
            TargetPath::Rotation => self.rotation,
            TargetPath::Scale => self.scale,
            TargetPath::Weights => self.weights,
        }
    }

    #[inline]
    pub fn slot_mut(&mut self, path: TargetPath) -> &mut Option<usize> {
        match path {
            TargetPath::Translation => &mut self.translation,
            TargetPath::Rotation => &mut self.rotation,
            TargetPath::Scale => &mut self.scale,
            TargetPath::Weights => &mut self.weights,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Bound `(channel, track index)` pairs in TRS-then-weights order.
    pub fn iter(&self) -> impl Iterator<Item = (TargetPath, usize)> + '_ {
        TargetPath::ALL
            .into_iter()
            .filter_map(|path| self.get(path).map(|index| (path, index)))
    }
}
