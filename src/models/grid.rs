use std::fmt;

use crate::error::CmyError;

/// Largest module scale (pixels per module edge) the scale detector will infer.
pub const MAX_SCALE: u32 = 20;

/// Legal code dimension in modules: 21, 25, 29, .. 77.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridSize(usize);

impl GridSize {
    /// Every legal grid size, ascending.
    pub const ALL: [GridSize; 15] = [
        GridSize(21),
        GridSize(25),
        GridSize(29),
        GridSize(33),
        GridSize(37),
        GridSize(41),
        GridSize(45),
        GridSize(49),
        GridSize(53),
        GridSize(57),
        GridSize(61),
        GridSize(65),
        GridSize(69),
        GridSize(73),
        GridSize(77),
    ];

    /// Smallest legal size (21)
    pub const MIN: GridSize = GridSize(21);
    /// Largest legal size (77)
    pub const MAX: GridSize = GridSize(77);

    /// Validate a module count
    pub fn new(modules: usize) -> Result<Self, CmyError> {
        if (21..=77).contains(&modules) && (modules - 21) % 4 == 0 {
            Ok(Self(modules))
        } else {
            Err(CmyError::InvalidGridSize(modules))
        }
    }

    /// Legal size closest to `modules`, preferring the smaller one on ties
    pub fn nearest(modules: usize) -> Self {
        Self::ALL
            .iter()
            .copied()
            .min_by_key(|s| s.0.abs_diff(modules))
            .unwrap_or(Self::MIN)
    }

    /// Modules per side
    pub fn get(self) -> usize {
        self.0
    }

    /// Position in [`GridSize::ALL`]
    pub(crate) fn index(self) -> usize {
        (self.0 - 21) / 4
    }
}

impl TryFrom<usize> for GridSize {
    type Error = CmyError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.0, self.0)
    }
}

/// One of the three subtractive planes. Each carries its own packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Absorbs red; stored in the green channel of the raster
    Cyan,
    /// Absorbs green; stored in the red channel of the raster
    Magenta,
    /// Absorbs blue; stored in the blue channel of the raster
    Yellow,
}

impl Channel {
    /// Text split order on encode, concatenation order on decode.
    pub const ORDER: [Channel; 3] = [Channel::Cyan, Channel::Magenta, Channel::Yellow];

    /// Index of the RGBA component this plane is written to and read from.
    pub fn rgb_index(self) -> usize {
        match self {
            Channel::Magenta => 0,
            Channel::Cyan => 1,
            Channel::Yellow => 2,
        }
    }

    /// Lowercase ink name
    pub fn name(self) -> &'static str {
        match self {
            Channel::Cyan => "cyan",
            Channel::Magenta => "magenta",
            Channel::Yellow => "yellow",
        }
    }
}

/// Module-to-pixel scale together with the grid size it was inferred for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleInfo {
    /// Pixels per module edge, 1..=MAX_SCALE
    pub scale: u32,
    /// Grid size in modules
    pub size: GridSize,
}

impl Default for ScaleInfo {
    fn default() -> Self {
        Self {
            scale: 10,
            size: GridSize::MIN,
        }
    }
}
