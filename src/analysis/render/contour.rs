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

//! Contour line (isoline) drawing with marching squares.
//!
//! Segments are traced in the grid index space and then
//! mapped through the coordinate axes to the map panel.
//! Labels are drawn with simple seven-segment digits.

use super::projection::PlateCarree;
use crate::Float;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use ndarray::ArrayView2;

const LINE_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const LABEL_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Point in grid index space, `x` along longitude
/// and `y` along latitude.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Point {
    pub x: Float,
    pub y: Float,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// `count` evenly spaced levels strictly between `min` and `max`.
pub fn contour_levels(min: Float, max: Float, count: u16) -> Vec<Float> {
    if count == 0 || !(max > min) {
        return vec![];
    }

    let step = (max - min) / (Float::from(count) + 1.0);
    (1..=count).map(|k| min + step * Float::from(k)).collect()
}

/// Marching squares over the grid, cells with NaN corners are skipped.
pub fn march_squares(values: ArrayView2<Float>, level: Float) -> Vec<Segment> {
    let (rows, cols) = values.dim();

    if rows < 2 || cols < 2 {
        return vec![];
    }

    let mut segments = vec![];

    for y in 0..rows - 1 {
        for x in 0..cols - 1 {
            let tl = values[[y, x]];
            let tr = values[[y, x + 1]];
            let bl = values[[y + 1, x]];
            let br = values[[y + 1, x + 1]];

            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut case = 0u8;
            if tl >= level {
                case |= 1;
            }
            if tr >= level {
                case |= 2;
            }
            if br >= level {
                case |= 4;
            }
            if bl >= level {
                case |= 8;
            }

            let (x, y) = (x as Float, y as Float);
            let top = crossing((x, y), (x + 1.0, y), tl, tr, level);
            let right = crossing((x + 1.0, y), (x + 1.0, y + 1.0), tr, br, level);
            let bottom = crossing((x, y + 1.0), (x + 1.0, y + 1.0), bl, br, level);
            let left = crossing((x, y), (x, y + 1.0), tl, bl, level);

            let edges = match case {
                1 | 14 => vec![(left, top)],
                2 | 13 => vec![(top, right)],
                3 | 12 => vec![(left, right)],
                4 | 11 => vec![(right, bottom)],
                5 => vec![(left, top), (right, bottom)],
                6 | 9 => vec![(top, bottom)],
                7 | 8 => vec![(left, bottom)],
                10 => vec![(top, right), (left, bottom)],
                _ => vec![],
            };

            segments.extend(edges.into_iter().map(|(start, end)| Segment { start, end }));
        }
    }

    segments
}

/// Linear interpolation of the level crossing on the cell edge.
fn crossing(a: (Float, Float), b: (Float, Float), va: Float, vb: Float, level: Float) -> Point {
    let t = if (vb - va).abs() < Float::EPSILON {
        0.5
    } else {
        ((level - va) / (vb - va)).clamp(0.0, 1.0)
    };

    Point {
        x: a.0 + t * (b.0 - a.0),
        y: a.1 + t * (b.1 - a.1),
    }
}

/// Coordinate value at fractional index of the axis.
fn axis_value(axis: &[Float], position: Float) -> Float {
    let lower = (position.floor() as usize).min(axis.len() - 1);
    let upper = (lower + 1).min(axis.len() - 1);
    let frac = position - lower as Float;

    axis[lower] + (axis[upper] - axis[lower]) * frac
}

/// Draws contour lines of `levels` on the panel placed at `origin`.
pub fn draw_contours(
    canvas: &mut RgbaImage,
    values: ArrayView2<Float>,
    lats: &[Float],
    lons: &[Float],
    projection: &PlateCarree,
    origin: (Float, Float),
    levels: &[Float],
) {
    let to_pixel = |point: Point| {
        let lon = axis_value(lons, point.x);
        let lat = axis_value(lats, point.y);
        let (x, y) = projection.project(lon, lat);

        ((origin.0 + x) as f32, (origin.1 + y) as f32)
    };

    for &level in levels {
        let segments = march_squares(values, level);

        for segment in &segments {
            draw_line_segment_mut(
                canvas,
                to_pixel(segment.start),
                to_pixel(segment.end),
                LINE_COLOR,
            );
        }

        // one label per level, on the middle segment of the trace
        if let Some(segment) = segments.get(segments.len() / 2) {
            let start = to_pixel(segment.start);
            let end = to_pixel(segment.end);
            let centre = ((start.0 + end.0) / 2.0, (start.1 + end.1) / 2.0);

            draw_label(canvas, centre, &format!("{:.0}", level), 7.0, LINE_COLOR);
        }
    }
}

/// Draws the text centred at `centre` on white background,
/// only digits, minus sign and dot are supported.
pub fn draw_label(
    canvas: &mut RgbaImage,
    centre: (f32, f32),
    text: &str,
    char_height: f32,
    color: Rgba<u8>,
) {
    let char_width = char_height * 0.6;
    let advance = char_width * 1.5;
    let text_width = advance * text.chars().count() as f32;

    let left = centre.0 - text_width / 2.0;
    let top = centre.1 - char_height / 2.0;

    let background = Rect::at((left - 1.0) as i32, (top - 1.0) as i32)
        .of_size((text_width + 2.0) as u32 + 1, (char_height + 2.0) as u32 + 1);
    draw_filled_rect_mut(canvas, background, LABEL_BACKGROUND);

    for (i, ch) in text.chars().enumerate() {
        let x = left + advance * i as f32 + advance / 2.0;
        draw_character(canvas, (x, centre.1), ch, char_width, char_height, color);
    }
}

fn draw_character(
    canvas: &mut RgbaImage,
    centre: (f32, f32),
    ch: char,
    width: f32,
    height: f32,
    color: Rgba<u8>,
) {
    let w = width / 2.0;
    let h = height / 2.0;

    let strokes = match ch {
        '0' => vec![
            ((-w, -h), (w, -h)),
            ((w, -h), (w, h)),
            ((w, h), (-w, h)),
            ((-w, h), (-w, -h)),
        ],
        '1' => vec![((0.0, -h), (0.0, h))],
        '2' => vec![
            ((-w, -h), (w, -h)),
            ((w, -h), (w, 0.0)),
            ((w, 0.0), (-w, 0.0)),
            ((-w, 0.0), (-w, h)),
            ((-w, h), (w, h)),
        ],
        '3' => vec![
            ((-w, -h), (w, -h)),
            ((w, -h), (w, h)),
            ((w, h), (-w, h)),
            ((-w, 0.0), (w, 0.0)),
        ],
        '4' => vec![
            ((-w, -h), (-w, 0.0)),
            ((-w, 0.0), (w, 0.0)),
            ((w, -h), (w, h)),
        ],
        '5' => vec![
            ((w, -h), (-w, -h)),
            ((-w, -h), (-w, 0.0)),
            ((-w, 0.0), (w, 0.0)),
            ((w, 0.0), (w, h)),
            ((w, h), (-w, h)),
        ],
        '6' => vec![
            ((w, -h), (-w, -h)),
            ((-w, -h), (-w, h)),
            ((-w, h), (w, h)),
            ((w, h), (w, 0.0)),
            ((w, 0.0), (-w, 0.0)),
        ],
        '7' => vec![((-w, -h), (w, -h)), ((w, -h), (0.0, h))],
        '8' => vec![
            ((-w, -h), (w, -h)),
            ((w, -h), (w, h)),
            ((w, h), (-w, h)),
            ((-w, h), (-w, -h)),
            ((-w, 0.0), (w, 0.0)),
        ],
        '9' => vec![
            ((-w, 0.0), (w, 0.0)),
            ((w, 0.0), (w, -h)),
            ((w, -h), (-w, -h)),
            ((-w, -h), (-w, 0.0)),
            ((w, 0.0), (w, h)),
        ],
        '-' => vec![((-w, 0.0), (w, 0.0))],
        '.' => vec![((0.0, h * 0.7), (0.0, h))],
        _ => vec![],
    };

    for ((x1, y1), (x2, y2)) in strokes {
        draw_line_segment_mut(
            canvas,
            (centre.0 + x1, centre.1 + y1),
            (centre.0 + x2, centre.1 + y2),
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use ndarray::{array, Array2};

    #[test]
    fn evenly_spaced_levels() {
        assert_eq!(contour_levels(0.0, 60.0, 5), vec![10.0, 20.0, 30.0, 40.0, 50.0]);
        assert!(contour_levels(0.0, 60.0, 0).is_empty());
        assert!(contour_levels(5.0, 5.0, 3).is_empty());

        let dense = contour_levels(0.0, 1.0, u16::MAX);
        assert_eq!(dense.len(), usize::from(u16::MAX));
        assert!(dense.iter().all(|&level| level > 0.0 && level < 1.0));
    }

    #[test]
    fn flat_field_has_no_contours() {
        let values = Array2::from_elem((4, 4), 10.0);
        assert!(march_squares(values.view(), 5.0).is_empty());
        assert!(march_squares(values.view(), 15.0).is_empty());
    }

    #[test]
    fn vertical_isoline() {
        // values grow along x, level 1.5 crosses halfway between columns 1 and 2
        let values = array![[0.0, 1.0, 2.0, 3.0], [0.0, 1.0, 2.0, 3.0], [0.0, 1.0, 2.0, 3.0]];
        let segments = march_squares(values.view(), 1.5);

        assert_eq!(segments.len(), 2);
        for segment in segments {
            assert!(approx_eq!(Float, segment.start.x, 1.5));
            assert!(approx_eq!(Float, segment.end.x, 1.5));
        }
    }

    #[test]
    fn nan_cells_skipped() {
        let values = array![[0.0, Float::NAN], [0.0, 2.0]];
        assert!(march_squares(values.view(), 1.0).is_empty());
    }

    #[test]
    fn fractional_axis_values() {
        let lats = [70.0, 60.0, 50.0];

        assert!(approx_eq!(Float, axis_value(&lats, 0.5), 65.0));
        assert!(approx_eq!(Float, axis_value(&lats, 2.0), 50.0));
    }

    #[test]
    fn contours_drawn_on_canvas() {
        let values = array![[0.0, 1.0, 2.0, 3.0], [0.0, 1.0, 2.0, 3.0], [0.0, 1.0, 2.0, 3.0]];
        let lats = [40.0, 30.0, 20.0];
        let lons = [0.0, 10.0, 20.0, 30.0];
        let projection = PlateCarree::new(&lats, &lons, 90, 60).unwrap();

        let mut canvas = RgbaImage::from_pixel(100, 70, Rgba([255, 255, 255, 255]));
        draw_contours(
            &mut canvas,
            values.view(),
            &lats,
            &lons,
            &projection,
            (5.0, 5.0),
            &[1.5],
        );

        // isoline at lon 15 is at x = 5 + 45
        assert_eq!(*canvas.get_pixel(50, 10), LINE_COLOR);
        assert_eq!(*canvas.get_pixel(20, 10), Rgba([255, 255, 255, 255]));
    }
}
