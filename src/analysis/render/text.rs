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

//! Titles and axis labels drawn with the embedded
//! DejaVu Sans Mono font.

use crate::errors::RenderError;
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};

const FONT_DATA: &[u8] = include_bytes!("../../../assets/DejaVuSansMono.ttf");

pub struct Typeface {
    font: Font<'static>,
}

impl Typeface {
    pub fn load() -> Result<Self, RenderError> {
        Font::try_from_bytes(FONT_DATA)
            .map(|font| Typeface { font })
            .ok_or(RenderError::FontUnavailable)
    }

    /// Width and height (in pixels) of the text.
    pub fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        let (width, height) = text_size(Scale::uniform(size), &self.font, text);
        (width.max(0) as u32, height.max(0) as u32)
    }

    /// Draws the text centred horizontally on `centre_x`
    /// with the top of the line at `top`.
    pub fn draw_centred(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        centre_x: i32,
        top: i32,
        size: f32,
        color: Rgba<u8>,
    ) {
        let (width, _) = self.measure(text, size);

        draw_text_mut(
            canvas,
            color,
            centre_x - width as i32 / 2,
            top,
            Scale::uniform(size),
            &self.font,
            text,
        );
    }

    /// Draws the text read from bottom to top, centred
    /// vertically on `centre_y` with its left edge at `left`.
    pub fn draw_vertical(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        left: i32,
        centre_y: i32,
        size: f32,
        color: Rgba<u8>,
    ) {
        let (width, height) = self.measure(text, size);

        if width == 0 || height == 0 {
            return;
        }

        let mut line = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
        draw_text_mut(&mut line, color, 0, 0, Scale::uniform(size), &self.font, text);

        let rotated = imageops::rotate270(&line);
        let top = centre_y - width as i32 / 2;

        imageops::overlay(canvas, &rotated, i64::from(left), i64::from(top));
    }
}
