//! Thermal frame payloads.
//!
//! A thermal report carries 64 samples, each a Big Endian `i16` in hundredths
//! of a degree Celsius. Sample `i` lands at row `i / 8`, column `i % 8`.

use serde::Serialize;

use crate::error::{LinkError, Result};
use crate::protocol::{THERMAL_GRID_SIZE, THERMAL_PAYLOAD_SIZE};

/// Fixed-point scale of the wire samples.
const CENTI: f32 = 100.0;

/// 8×8 grid of temperatures in °C, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThermalFrame {
    cells: [[f32; THERMAL_GRID_SIZE]; THERMAL_GRID_SIZE],
}

impl ThermalFrame {
    /// Build a frame from a ready grid.
    pub fn from_rows(cells: [[f32; THERMAL_GRID_SIZE]; THERMAL_GRID_SIZE]) -> Self {
        Self { cells }
    }

    /// Temperature at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if either index is 8 or more.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.cells[row][col]
    }

    /// Rows of the grid.
    pub fn rows(&self) -> &[[f32; THERMAL_GRID_SIZE]; THERMAL_GRID_SIZE] {
        &self.cells
    }

    /// All 64 readings in sample order.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.cells.iter().flat_map(|row| row.iter().copied())
    }

    /// Coldest reading.
    pub fn min(&self) -> f32 {
        self.iter().fold(f32::INFINITY, f32::min)
    }

    /// Hottest reading.
    pub fn max(&self) -> f32 {
        self.iter().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Average over all cells.
    pub fn mean(&self) -> f32 {
        self.iter().sum::<f32>() / (THERMAL_GRID_SIZE * THERMAL_GRID_SIZE) as f32
    }

    /// Location and value of the hottest cell; the first one wins on ties.
    pub fn hottest(&self) -> (usize, usize, f32) {
        let mut best = (0, 0, self.cells[0][0]);
        for (i, value) in self.iter().enumerate() {
            if value > best.2 {
                best = (i / THERMAL_GRID_SIZE, i % THERMAL_GRID_SIZE, value);
            }
        }
        best
    }
}

/// Converts between thermal payload bytes and [`ThermalFrame`].
pub struct ThermalCodec;

impl ThermalCodec {
    /// Decode a 128-byte thermal payload.
    ///
    /// Any other length is [`LinkError::MalformedThermalPayload`]; nothing is
    /// partially decoded.
    pub fn decode(payload: &[u8]) -> Result<ThermalFrame> {
        if payload.len() != THERMAL_PAYLOAD_SIZE {
            return Err(LinkError::MalformedThermalPayload { len: payload.len() });
        }

        let mut cells = [[0.0f32; THERMAL_GRID_SIZE]; THERMAL_GRID_SIZE];
        for (i, sample) in payload.chunks_exact(2).enumerate() {
            let raw = i16::from_be_bytes([sample[0], sample[1]]);
            cells[i / THERMAL_GRID_SIZE][i % THERMAL_GRID_SIZE] = raw as f32 / CENTI;
        }

        Ok(ThermalFrame { cells })
    }

    /// Encode a frame the way the sensor board does.
    ///
    /// Readings are rounded to the nearest hundredth and saturate at the
    /// `i16` range.
    pub fn encode(frame: &ThermalFrame) -> Vec<u8> {
        let mut payload = Vec::with_capacity(THERMAL_PAYLOAD_SIZE);
        for value in frame.iter() {
            let raw = (value * CENTI).round() as i16;
            payload.extend_from_slice(&raw.to_be_bytes());
        }
        payload
    }
}
