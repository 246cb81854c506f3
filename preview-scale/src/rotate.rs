// SPDX-License-Identifier: MIT
//! Quarter-turn rotation for square BGRA8 images.

use crate::cpu::ScaleError;

/// Clockwise rotation applied to compensate for sensor mounting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Parse a sensor orientation in degrees. Only quarter turns are accepted.
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Deg0)
    }
}

/// Rotate a square `side × side` BGRA8 image clockwise into `dst`.
///
/// `src` and `dst` must both hold at least `side * side * 4` bytes and must not alias.
pub fn rotate_square_bgra(
    src: &[u8],
    side: u32,
    rotation: Rotation,
    dst: &mut [u8],
) -> Result<(), ScaleError> {
    let n = side as usize;
    let len = n * n * 4;
    if src.len() < len || dst.len() < len {
        return Err(ScaleError::BufferTooSmall);
    }

    if rotation.is_identity() {
        dst[..len].copy_from_slice(&src[..len]);
        return Ok(());
    }

    let last = n - 1;
    for y in 0..n {
        for x in 0..n {
            // dst(x, y) pulls from the source pixel that lands here after a clockwise turn
            let (sx, sy) = match rotation {
                Rotation::Deg0 => (x, y),
                Rotation::Deg90 => (y, last - x),
                Rotation::Deg180 => (last - x, last - y),
                Rotation::Deg270 => (last - y, x),
            };
            let s = (sy * n + sx) * 4;
            let d = (y * n + x) * 4;
            dst[d..d + 4].copy_from_slice(&src[s..s + 4]);
        }
    }
    Ok(())
}
