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

//! Quiver (wind vector) drawing.

use super::colormap::Colormap;
use super::projection::PlateCarree;
use crate::constants::QUIVER_MAX_ARROWS;
use crate::Float;
use image::RgbaImage;
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use ndarray::ArrayView2;

/// Stride between drawn gridpoints so that at most
/// `QUIVER_MAX_ARROWS` arrows are drawn along an axis.
pub fn thinning_step(len: usize) -> usize {
    ((len + QUIVER_MAX_ARROWS - 1) / QUIVER_MAX_ARROWS).max(1)
}

/// Maximum finite wind speed of the field.
pub fn max_speed(u: ArrayView2<Float>, v: ArrayView2<Float>) -> Option<Float> {
    u.iter()
        .zip(v.iter())
        .map(|(u, v)| u.hypot(*v))
        .filter(|s| s.is_finite())
        .reduce(Float::max)
}

/// Draws an arrow per thinned gridpoint, arrow length is
/// scaled by the maximum speed and colour follows the speed.
#[allow(clippy::too_many_arguments)]
pub fn draw_quiver(
    canvas: &mut RgbaImage,
    u: ArrayView2<Float>,
    v: ArrayView2<Float>,
    lats: &[Float],
    lons: &[Float],
    projection: &PlateCarree,
    origin: (Float, Float),
    map_size: (u32, u32),
    colormap: Colormap,
) {
    let max_speed = match max_speed(u, v) {
        Some(speed) if speed > 0.0 => speed,
        _ => return,
    };

    let (rows, cols) = u.dim();
    let step_y = thinning_step(rows);
    let step_x = thinning_step(cols);

    let cell = Float::min(
        Float::from(map_size.0) / (cols as Float / step_x as Float).max(1.0),
        Float::from(map_size.1) / (rows as Float / step_y as Float).max(1.0),
    );
    let max_length = 0.9 * cell;

    for y in (0..rows).step_by(step_y) {
        for x in (0..cols).step_by(step_x) {
            let (u, v) = (u[[y, x]], v[[y, x]]);
            let speed = u.hypot(v);

            if !speed.is_finite() || speed == 0.0 {
                continue;
            }

            let (px, py) = projection.project(lons[x], lats[y]);
            let tail = (origin.0 + px, origin.1 + py);

            // screen y axis points south
            let length = max_length * speed / max_speed;
            let direction = (u / speed, -v / speed);
            let tip = (
                tail.0 + direction.0 * length,
                tail.1 + direction.1 * length,
            );

            let color = colormap.sample(speed / max_speed);

            draw_line_segment_mut(
                canvas,
                (tail.0 as f32, tail.1 as f32),
                (tip.0 as f32, tip.1 as f32),
                color,
            );

            let head = 0.3 * length;
            if head < 2.0 {
                continue;
            }

            let base = (tip.0 - direction.0 * head, tip.1 - direction.1 * head);
            let normal = (-direction.1 * head / 2.0, direction.0 * head / 2.0);

            let triangle = [
                to_point(tip),
                to_point((base.0 + normal.0, base.1 + normal.1)),
                to_point((base.0 - normal.0, base.1 - normal.1)),
            ];

            if triangle[0] != triangle[2] && triangle[0] != triangle[1] {
                draw_polygon_mut(canvas, &triangle, color);
            }
        }
    }
}

fn to_point(xy: (Float, Float)) -> Point<i32> {
    Point::new(xy.0.round() as i32, xy.1.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use image::Rgba;
    use ndarray::Array2;

    #[test]
    fn arrows_thinned() {
        assert_eq!(thinning_step(10), 1);
        assert_eq!(thinning_step(QUIVER_MAX_ARROWS), 1);
        assert_eq!(thinning_step(QUIVER_MAX_ARROWS + 1), 2);
        assert_eq!(thinning_step(144), 4);
        assert_eq!(thinning_step(0), 1);
    }

    #[test]
    fn speed_maximum() {
        let u = Array2::from_shape_vec((1, 3), vec![3.0, 0.0, Float::NAN]).unwrap();
        let v = Array2::from_shape_vec((1, 3), vec![4.0, 1.0, 1.0]).unwrap();

        assert!(approx_eq!(Float, max_speed(u.view(), v.view()).unwrap(), 5.0));
    }

    #[test]
    fn eastward_arrow() {
        let u = Array2::from_elem((3, 3), 10.0);
        let v = Array2::zeros((3, 3));
        let lats = [40.0, 30.0, 20.0];
        let lons = [0.0, 10.0, 20.0];
        let projection = PlateCarree::new(&lats, &lons, 60, 60).unwrap();

        let white = Rgba([255, 255, 255, 255]);
        let mut canvas = RgbaImage::from_pixel(80, 80, white);

        draw_quiver(
            &mut canvas,
            u.view(),
            v.view(),
            &lats,
            &lons,
            &projection,
            (10.0, 10.0),
            (60, 60),
            Colormap::Viridis,
        );

        // arrow from the central gridpoint (40, 40) points east
        let color = Colormap::Viridis.sample(1.0);
        assert_eq!(*canvas.get_pixel(50, 40), color);
        assert_eq!(*canvas.get_pixel(30, 40), white);
    }
}
