//! Barcode strip extraction and bit decoding.
//!
//! The recorder imprints a small bit-pattern in the corner of every data
//! frame: 5 groups of 4 bit-cells, each cell 4 px wide with a 1 px border
//! on each side, groups separated by 3 px gaps. A cell reads black (0) or
//! white (1); the 20 cells in image order, reversed, are the bits of the
//! frame index from most to least significant position.

use image::GrayImage;

use super::BarcodeError;
use crate::models::BarcodeGeometry;

const BORDER: u32 = 1; // either side of each value cell
const VALUE_SIZE: u32 = 4;
const VALUES_PER_GROUP: u32 = 4;
const GROUP_SEPARATOR: u32 = 3;
const NUM_GROUPS: u32 = 5;
const GROUP_SIZE: u32 = VALUES_PER_GROUP * (VALUE_SIZE + 2 * BORDER);

/// Minimum strip width required to read every cell.
const LAYOUT_WIDTH: u32 = NUM_GROUPS * (GROUP_SIZE + GROUP_SEPARATOR) - GROUP_SEPARATOR;

/// Whole-strip mean luminance above which an all-white read is classified
/// as the constant-white metadata frame.
const METADATA_FRAME_MEAN: u32 = 250;

/// Crop the barcode strip out of a frame's luminance plane.
///
/// Rows `yOffset+1 .. yOffset+height` and columns
/// `xOffset .. xOffset+width+3`: the declared width under-counts the border
/// pixels by 3, and the first row is skipped.
pub fn crop_barcode_strip(
    frame: &GrayImage,
    geometry: &BarcodeGeometry,
) -> Result<GrayImage, BarcodeError> {
    let crop_width = geometry.width + 3;
    let crop_height = geometry.height.saturating_sub(1);
    let fits_x = geometry.x_offset + crop_width <= frame.width();
    let fits_y = geometry.y_offset + geometry.height <= frame.height();
    if crop_height == 0 || !fits_x || !fits_y {
        return Err(BarcodeError::RegionOutOfBounds {
            geometry: *geometry,
            frame_width: frame.width(),
            frame_height: frame.height(),
        });
    }
    Ok(image::imageops::crop_imm(
        frame,
        geometry.x_offset,
        geometry.y_offset + 1,
        crop_width,
        crop_height,
    )
    .to_image())
}

/// Decode the integer value held in a cropped barcode strip.
///
/// Each cell's pixel-mean luminance normalizes to one of
/// black(-1) / grey(0, unused) / white(1) via `round(mean/255 * 2 - 1)`;
/// only white cells contribute their bit. An all-white read over a strip
/// whose overall mean exceeds 250 is the constant-white metadata frame and
/// decodes to 0 regardless of cell layout.
pub fn decode_barcode_strip(strip: &GrayImage) -> Result<u64, BarcodeError> {
    if strip.width() < LAYOUT_WIDTH || strip.height() == 0 {
        return Err(BarcodeError::StripTooNarrow {
            width: strip.width(),
            height: strip.height(),
            required: LAYOUT_WIDTH,
        });
    }

    let mut cells = Vec::with_capacity((NUM_GROUPS * VALUES_PER_GROUP) as usize);
    for group_index in 0..NUM_GROUPS {
        let group_start = group_index * (GROUP_SIZE + GROUP_SEPARATOR);
        for value_index in 0..VALUES_PER_GROUP {
            let value_start =
                group_start + (VALUE_SIZE + BORDER) * value_index + (value_index + 1) * BORDER;
            cells.push(normalized_cell_value(strip, value_start));
        }
    }

    if cells.iter().all(|cell| *cell == 1) && strip_mean(strip).round() as u32 > METADATA_FRAME_MEAN
    {
        // whole barcode area is white: the metadata frame
        return Ok(0);
    }

    let mut value = 0u64;
    for (exponent, cell) in cells.iter().rev().enumerate() {
        if *cell == 1 {
            value += 1 << exponent;
        }
    }
    Ok(value)
}

/// Mean luminance of one cell, normalized to {-1, 0, 1}.
fn normalized_cell_value(strip: &GrayImage, value_start: u32) -> i32 {
    let mut sum = 0u64;
    let mut count = 0u64;
    for y in 0..strip.height() {
        for x in value_start..value_start + VALUE_SIZE {
            sum += strip.get_pixel(x, y).0[0] as u64;
            count += 1;
        }
    }
    let mean = sum as f64 / count as f64;
    ((mean / 255.0) * 2.0 - 1.0).round() as i32
}

fn strip_mean(strip: &GrayImage) -> f64 {
    let sum: u64 = strip.pixels().map(|p| p.0[0] as u64).sum();
    sum as f64 / strip.pixels().count() as f64
}
