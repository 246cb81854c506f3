// SPDX-License-Identifier: MIT
//! # YUV 4:2:0 to BGRA8 Conversion
//!
//! Camera preview streams deliver three planes: full-resolution luma and two
//! chroma planes subsampled by two in both directions. Chroma planes may be
//! planar (pixel stride 1) or semi-planar/interleaved (pixel stride 2), and
//! every plane may carry row padding.
//!
//! Conversion uses BT.601 limited-range coefficients in 10-bit fixed point.

use crate::cpu::ScaleError;

/// Borrowed view of one image plane.
#[derive(Clone, Copy, Debug)]
pub struct PlaneRef<'a> {
    pub data: &'a [u8],
    /// Bytes between the starts of consecutive rows
    pub row_stride: usize,
    /// Bytes between consecutive samples within a row
    pub pixel_stride: usize,
}

impl<'a> PlaneRef<'a> {
    /// Tightly packed plane: `pixel_stride == 1`, `row_stride == width`.
    pub fn packed(data: &'a [u8], width: usize) -> Self {
        Self {
            data,
            row_stride: width,
            pixel_stride: 1,
        }
    }

    /// Smallest buffer length that can hold `cols × rows` samples with these strides.
    pub fn required_len(&self, cols: usize, rows: usize) -> usize {
        if cols == 0 || rows == 0 {
            return 0;
        }
        (rows - 1) * self.row_stride + (cols - 1) * self.pixel_stride + 1
    }
}

const MAX_CHANNEL: i32 = 262_143;

#[inline]
fn yuv_to_bgra(y: i32, u: i32, v: i32) -> [u8; 4] {
    let y = (y - 16).max(0);
    let u = u - 128;
    let v = v - 128;

    let y1192 = 1192 * y;
    let r = (y1192 + 1634 * v).clamp(0, MAX_CHANNEL);
    let g = (y1192 - 833 * v - 400 * u).clamp(0, MAX_CHANNEL);
    let b = (y1192 + 2066 * u).clamp(0, MAX_CHANNEL);

    [(b >> 10) as u8, (g >> 10) as u8, (r >> 10) as u8, 0xff]
}

/// Convert three YUV 4:2:0 planes into `out`, one BGRA8 pixel per input pixel.
///
/// `out` must hold at least `width * height` pixels. Planes are validated
/// against their strides before any pixel is written.
pub fn yuv420_to_bgra(
    y_plane: PlaneRef<'_>,
    u_plane: PlaneRef<'_>,
    v_plane: PlaneRef<'_>,
    width: u32,
    height: u32,
    out: &mut [[u8; 4]],
) -> Result<(), ScaleError> {
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 {
        return Err(ScaleError::EmptyInput);
    }
    if out.len() < w * h {
        return Err(ScaleError::BufferTooSmall);
    }

    let cw = w.div_ceil(2);
    let ch = h.div_ceil(2);
    if y_plane.data.len() < y_plane.required_len(w, h) {
        return Err(ScaleError::PlaneTooSmall { plane: "y" });
    }
    if u_plane.data.len() < u_plane.required_len(cw, ch) {
        return Err(ScaleError::PlaneTooSmall { plane: "u" });
    }
    if v_plane.data.len() < v_plane.required_len(cw, ch) {
        return Err(ScaleError::PlaneTooSmall { plane: "v" });
    }

    for row in 0..h {
        let y_row = row * y_plane.row_stride;
        let u_row = (row >> 1) * u_plane.row_stride;
        let v_row = (row >> 1) * v_plane.row_stride;
        let dst = &mut out[row * w..(row + 1) * w];

        for (col, px) in dst.iter_mut().enumerate() {
            let y = y_plane.data[y_row + col * y_plane.pixel_stride] as i32;
            let u = u_plane.data[u_row + (col >> 1) * u_plane.pixel_stride] as i32;
            let v = v_plane.data[v_row + (col >> 1) * v_plane.pixel_stride] as i32;
            *px = yuv_to_bgra(y, u, v);
        }
    }
    Ok(())
}
