/*
Copyright 2021 Jakub Lewandowski

This file is part of Upper Air Patterns (UAP).

Upper Air Patterns (UAP) is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

Upper Air Patterns (UAP) is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with Upper Air Patterns (UAP). If not, see https://www.gnu.org/licenses/.
*/

//! Colormaps used for filled contours, colorbars and arrows.

use crate::Float;
use image::Rgba;
use serde::Deserialize;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Deserialize)]
pub enum Colormap {
    #[serde(rename = "YlOrRd")]
    YlOrRd,
    #[serde(rename = "viridis")]
    Viridis,
    #[serde(rename = "Blues")]
    Blues,
    #[serde(rename = "RdBu_r")]
    RdBuR,
    #[serde(rename = "coolwarm")]
    Coolwarm,
}

impl Default for Colormap {
    fn default() -> Self {
        Colormap::YlOrRd
    }
}

const YL_OR_RD: [u32; 9] = [
    0xffffcc, 0xffeda0, 0xfed976, 0xfeb24c, 0xfd8d3c, 0xfc4e2a, 0xe31a1c, 0xbd0026, 0x800026,
];

const VIRIDIS: [u32; 9] = [
    0x440154, 0x472d7b, 0x3b528b, 0x2c728e, 0x21918c, 0x28ae80, 0x5ec962, 0xaddc30, 0xfde725,
];

const BLUES: [u32; 9] = [
    0xf7fbff, 0xdeebf7, 0xc6dbef, 0x9ecae1, 0x6baed6, 0x4292c6, 0x2171b5, 0x08519c, 0x08306b,
];

const RD_BU_R: [u32; 11] = [
    0x053061, 0x2166ac, 0x4393c3, 0x92c5de, 0xd1e5f0, 0xf7f7f7, 0xfddbc7, 0xf4a582, 0xd6604d,
    0xb2182b, 0x67001f,
];

const COOLWARM: [u32; 9] = [
    0x3b4cc0, 0x6282ea, 0x8db0fe, 0xb8d0f9, 0xdddcdc, 0xf5c4ad, 0xf49a7b, 0xde604d, 0xb40426,
];

impl Colormap {
    fn stops(self) -> &'static [u32] {
        match self {
            Colormap::YlOrRd => &YL_OR_RD,
            Colormap::Viridis => &VIRIDIS,
            Colormap::Blues => &BLUES,
            Colormap::RdBuR => &RD_BU_R,
            Colormap::Coolwarm => &COOLWARM,
        }
    }

    /// Colour at position `t` in `[0, 1]`, linearly
    /// interpolated between the colormap stops.
    pub fn sample(self, t: Float) -> Rgba<u8> {
        let stops = self.stops();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

        let position = t * (stops.len() - 1) as Float;
        let lower = (position.floor() as usize).min(stops.len() - 2);
        let frac = position - lower as Float;

        let from = rgb(stops[lower]);
        let to = rgb(stops[lower + 1]);

        let mut color = [0u8, 0, 0, 255];
        for channel in 0..3 {
            let value = Float::from(from[channel])
                + (Float::from(to[channel]) - Float::from(from[channel])) * frac;
            color[channel] = value.round() as u8;
        }

        Rgba(color)
    }

    /// Colour of the filled band containing `t`, when `[0, 1]`
    /// is divided into `levels` bands of equal width.
    pub fn band(self, t: Float, levels: u16) -> Rgba<u8> {
        self.sample(quantize(t, levels))
    }
}

/// Snaps `t` to the position of its band, first
/// band maps to 0 and the last one to 1.
pub fn quantize(t: Float, levels: u16) -> Float {
    if levels < 2 {
        return t;
    }

    let levels = Float::from(levels);
    let band = (t.clamp(0.0, 1.0) * levels).floor().min(levels - 1.0);

    band / (levels - 1.0)
}

fn rgb(hex: u32) -> [u8; 3] {
    [(hex >> 16) as u8, (hex >> 8) as u8, hex as u8]
}
