use heapless::Vec;

use crate::MAX_DEVICE_KEYS;
use crate::error::ConfigError;
use crate::split::message::{DeviceId, device_id};

/// A device registered at the central and the keymap positions it covers.
///
/// The coordinate map is indexed by `row * cols + col` in the device's local coordinates, and
/// holds logical keymap indices. Touch sensors are devices with a single row of electrodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    device_id: DeviceId,
    cols: u8,
    rows: u8,
    coord_map: Vec<u16, MAX_DEVICE_KEYS>,
}

impl Interface {
    /// A device covering a rectangle of a keymap which is `keymap_cols` wide.
    ///
    /// The device's local `(0, 0)` is `(col_min, row_min)`. A min larger than its max runs that
    /// axis backwards, e.g. for a mirrored half.
    pub fn rect(
        id: &str,
        keymap_cols: u16,
        col_min: u8,
        row_min: u8,
        col_max: u8,
        row_max: u8,
    ) -> Result<Self, ConfigError> {
        let cols = col_min.abs_diff(col_max) as u16 + 1;
        let rows = row_min.abs_diff(row_max) as u16 + 1;
        if cols as usize * rows as usize > MAX_DEVICE_KEYS {
            return Err(ConfigError::DeviceMapTooLarge);
        }

        let mut coord_map = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let row = step(row_min, row_max, r) as u32;
                let col = step(col_min, col_max, c) as u32;
                let index = row * keymap_cols as u32 + col;
                let index = u16::try_from(index).map_err(|_| ConfigError::CoordOutOfRange {
                    index: u16::MAX,
                    keys_per_layer: keymap_cols,
                })?;
                coord_map.push(index).map_err(|_| ConfigError::DeviceMapTooLarge)?;
            }
        }

        Ok(Self {
            device_id: device_id(id)?,
            cols: cols as u8,
            rows: rows as u8,
            coord_map,
        })
    }

    /// A device with an explicit coordinate map of `cols * rows` logical indices
    pub fn with_coord_map(id: &str, cols: u8, rows: u8, coord_map: &[u16]) -> Result<Self, ConfigError> {
        let expected = cols as u16 * rows as u16;
        if coord_map.len() != expected as usize {
            error!(
                "Coordinate map of {} has {} entries, expected {}",
                id,
                coord_map.len(),
                expected
            );
            return Err(ConfigError::CoordMapSizeMismatch {
                expected,
                found: coord_map.len().min(u16::MAX as usize) as u16,
            });
        }
        Ok(Self {
            device_id: device_id(id)?,
            cols,
            rows,
            coord_map: Vec::from_slice(coord_map).map_err(|_| ConfigError::DeviceMapTooLarge)?,
        })
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn coord_map(&self) -> &[u16] {
        &self.coord_map
    }

    /// Logical index of a local position, `None` outside the device
    pub fn logical_index(&self, col: u8, row: u8) -> Option<u16> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.coord_map
            .get(row as usize * self.cols as usize + col as usize)
            .copied()
    }

    /// Check every mapped index against the keymap width
    pub(crate) fn validate(&self, keys_per_layer: u16) -> Result<(), ConfigError> {
        match self.coord_map.iter().find(|i| **i >= keys_per_layer) {
            Some(index) => {
                error!(
                    "Device {} maps to index {}, keymap has {} keys per layer",
                    self.device_id.as_str(),
                    index,
                    keys_per_layer
                );
                Err(ConfigError::CoordOutOfRange {
                    index: *index,
                    keys_per_layer,
                })
            }
            None => Ok(()),
        }
    }
}

/// `offset` steps from `from` towards `to`
fn step(from: u8, to: u8, offset: u16) -> u16 {
    if from <= to {
        from as u16 + offset
    } else {
        from as u16 - offset
    }
}
