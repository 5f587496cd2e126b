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

//! Module responsible for drawing the maps.
//!
//! A figure consists of a title and one or more map panels placed
//! side by side, each with its own title and a horizontal colorbar
//! below it. Panels are drawn in Plate Carrée projection: the field
//! is sampled with bilinear interpolation for every pixel and coloured
//! with filled bands of the colormap, optionally overlaid with line contours.
//!
//! Rendering returns an in-memory [`Figure`], writing
//! it to a file is a separate step.

mod bisection;
pub mod colormap;
mod contour;
mod projection;
mod quiver;
mod text;

use self::colormap::Colormap;
use self::projection::PlateCarree;
use self::text::Typeface;
use super::configuration::Render;
use super::derived;
use super::region::fits_axes;
use crate::constants::QUIVER_FIGSIZE;
use crate::errors::{DerivedError, RenderError};
use crate::Float;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use log::{debug, warn};
use ndarray::{Array2, ArrayView2};
use std::path::Path;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const NO_DATA: Rgba<u8> = Rgba([220, 220, 220, 255]);
const QUIVER_BACKGROUND: Rgba<u8> = Rgba([245, 245, 245, 255]);
const FRAME: Rgba<u8> = Rgba([0, 0, 0, 255]);
const TICK_LABEL_HEIGHT: f32 = 7.0;

/// Single map panel: a 2-D field with its coordinate axes.
#[derive(Clone, PartialEq, Debug)]
pub struct Panel {
    pub title: String,
    pub values: Array2<Float>,
    pub lats: Vec<Float>,
    pub lons: Vec<Float>,

    /// Whether line contours are drawn over the field.
    pub contours: bool,
}

/// Rendered image with its title.
#[derive(Clone, PartialEq, Debug)]
pub struct Figure {
    pub title: String,
    pub image: RgbaImage,
}

impl Figure {
    /// Writes the figure to file, format follows the extension.
    pub fn save(&self, path: &Path) -> Result<(), RenderError> {
        debug!("Saving figure {} to {}", self.title, path.display());

        self.image.save(path)?;
        Ok(())
    }
}

/// Pixel rectangle on the canvas.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
struct Frame {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Frame {
    fn rect(&self) -> Rect {
        Rect::at(self.x as i32, self.y as i32).of_size(self.width, self.height)
    }

    fn origin(&self) -> (Float, Float) {
        (Float::from(self.x), Float::from(self.y))
    }
}

/// Places of title, map and colorbar of one panel,
/// axis labels are placed only when requested.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
struct PanelLayout {
    title: Frame,
    map: Frame,
    colorbar: Frame,
    x_label: Option<Frame>,
    y_label: Option<Frame>,
}

#[derive(Clone, PartialEq, Debug)]
struct FigureLayout {
    title: Frame,
    panels: Vec<PanelLayout>,

    /// Font sizes of the figure title and of the panel texts.
    title_size: f32,
    label_size: f32,
}

/// Renders fields with the configured settings.
#[derive(Copy, Clone, Debug)]
pub struct Presenter<'a> {
    settings: &'a Render,
}

impl<'a> Presenter<'a> {
    pub fn new(settings: &'a Render) -> Self {
        Presenter { settings }
    }

    /// Draws the panels side by side on a figure of configured size.
    pub fn render_panels(&self, title: &str, panels: &[Panel]) -> Result<Figure, RenderError> {
        let first = panels.first().ok_or(RenderError::EmptyGrid)?;

        for panel in panels {
            check_panel(panel.values.view(), &panel.lats, &panel.lons)?;
        }

        let aspect = PlateCarree::aspect(&first.lats, &first.lons).ok_or(RenderError::EmptyGrid)?;
        let size = self.settings.pixels(self.settings.figsize);
        let mut canvas = blank_canvas(size);

        let typeface = Typeface::load()?;
        let figure_layout = layout(size, panels.len(), aspect, false);

        draw_caption(
            &mut canvas,
            &typeface,
            title,
            figure_layout.title,
            figure_layout.title_size,
        );

        for (panel, layout) in panels.iter().zip(figure_layout.panels.iter()) {
            debug!("Drawing panel {} of {}", panel.title, title);
            self.draw_panel(&mut canvas, panel, *layout)?;
            draw_caption(
                &mut canvas,
                &typeface,
                &panel.title,
                layout.title,
                figure_layout.label_size,
            );
        }

        Ok(Figure {
            title: title.to_string(),
            image: canvas,
        })
    }

    /// Draws the wind vectors on a single map
    /// with a colorbar of wind speed.
    pub fn render_quiver(
        &self,
        title: &str,
        u: ArrayView2<Float>,
        v: ArrayView2<Float>,
        lats: &[Float],
        lons: &[Float],
    ) -> Result<Figure, RenderError> {
        check_panel(u, lats, lons)?;
        check_panel(v, lats, lons)?;

        let aspect = PlateCarree::aspect(lats, lons).ok_or(RenderError::EmptyGrid)?;
        let size = self.settings.pixels(QUIVER_FIGSIZE);
        let mut canvas = blank_canvas(size);

        let typeface = Typeface::load()?;
        let figure_layout = layout(size, 1, aspect, true);
        let panel = figure_layout
            .panels
            .first()
            .copied()
            .ok_or(RenderError::EmptyGrid)?;

        draw_caption(
            &mut canvas,
            &typeface,
            title,
            figure_layout.title,
            figure_layout.title_size,
        );

        let projection = PlateCarree::new(lats, lons, panel.map.width, panel.map.height)?;

        fill_frame(&mut canvas, panel.map, QUIVER_BACKGROUND);
        quiver::draw_quiver(
            &mut canvas,
            u,
            v,
            lats,
            lons,
            &projection,
            panel.map.origin(),
            (panel.map.width, panel.map.height),
            self.settings.colormap,
        );
        draw_hollow_rect_mut(&mut canvas, panel.map.rect(), FRAME);

        let speed_range = quiver::max_speed(u, v).map(|max| (0.0, max));
        draw_colorbar(
            &mut canvas,
            panel.colorbar,
            self.settings.colormap,
            None,
            speed_range,
        );

        if let Some(frame) = panel.x_label {
            draw_caption(&mut canvas, &typeface, "Longitudes", frame, figure_layout.label_size);
        }

        if let Some(frame) = panel.y_label {
            typeface.draw_vertical(
                &mut canvas,
                "Latitudes",
                frame.x as i32,
                (frame.y + frame.height / 2) as i32,
                figure_layout.label_size,
                FRAME,
            );
        }

        Ok(Figure {
            title: title.to_string(),
            image: canvas,
        })
    }

    fn draw_panel(
        &self,
        canvas: &mut RgbaImage,
        panel: &Panel,
        layout: PanelLayout,
    ) -> Result<(), RenderError> {
        let map = layout.map;
        let projection = PlateCarree::new(&panel.lats, &panel.lons, map.width, map.height)?;

        let extremes = derived::finite_extremes(&panel.values.view());
        let scaled = match derived::normalize(panel.values.view()) {
            Ok(scaled) => Some(scaled),
            Err(DerivedError::ConstantField) => {
                warn!(
                    "Field of panel {} is constant or empty, painting it with a single colour",
                    panel.title
                );
                None
            }
            Err(err) => return Err(err.into()),
        };

        let colormap = self.settings.colormap;
        let fill_levels = self.settings.fill_levels;

        for py in 0..map.height {
            for px in 0..map.width {
                let (lon, lat) =
                    projection.inverse_project(Float::from(px) + 0.5, Float::from(py) + 0.5);

                let color = match &scaled {
                    Some(scaled) => sample(scaled.view(), &panel.lats, &panel.lons, lon, lat)
                        .map(|t| colormap.band(t, fill_levels)),
                    None => sample(panel.values.view(), &panel.lats, &panel.lons, lon, lat)
                        .map(|_| colormap.sample(0.5)),
                };

                paint(canvas, map.x + px, map.y + py, color.unwrap_or(NO_DATA));
            }
        }

        if let (true, Some((min, max))) = (panel.contours, extremes) {
            let levels = contour::contour_levels(min, max, self.settings.contours);

            contour::draw_contours(
                canvas,
                panel.values.view(),
                &panel.lats,
                &panel.lons,
                &projection,
                map.origin(),
                &levels,
            );
        }

        draw_hollow_rect_mut(canvas, map.rect(), FRAME);
        draw_colorbar(canvas, layout.colorbar, colormap, Some(fill_levels), extremes);

        Ok(())
    }
}

fn check_panel(values: ArrayView2<Float>, lats: &[Float], lons: &[Float]) -> Result<(), RenderError> {
    if values.is_empty() || lats.is_empty() || lons.is_empty() {
        return Err(RenderError::EmptyGrid);
    }

    if !fits_axes(&values, lats.len(), lons.len()) {
        return Err(RenderError::AxisMismatch {
            grid: values.dim(),
            lats: lats.len(),
            lons: lons.len(),
        });
    }

    Ok(())
}

fn blank_canvas(size: (u32, u32)) -> RgbaImage {
    RgbaImage::from_pixel(size.0.max(1), size.1.max(1), BACKGROUND)
}

fn paint(canvas: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>) {
    if x < canvas.width() && y < canvas.height() {
        canvas.put_pixel(x, y, color);
    }
}

fn fill_frame(canvas: &mut RgbaImage, frame: Frame, color: Rgba<u8>) {
    for y in frame.y..frame.y + frame.height {
        for x in frame.x..frame.x + frame.width {
            paint(canvas, x, y, color);
        }
    }
}

/// Draws the text centred in the frame.
fn draw_caption(
    canvas: &mut RgbaImage,
    typeface: &Typeface,
    text: &str,
    frame: Frame,
    size: f32,
) {
    let top = frame.y as f32 + (frame.height as f32 - size).max(0.0) / 2.0;

    typeface.draw_centred(
        canvas,
        text,
        (frame.x + frame.width / 2) as i32,
        top as i32,
        size,
        FRAME,
    );
}

/// Splits the figure into the title band and equal slots, then places
/// the panel title, the map (keeping its aspect ratio) and the colorbar
/// in each slot. With `axis_labels` space is left for labels
/// below the colorbar and to the left of the map.
fn layout(size: (u32, u32), count: usize, aspect: Float, axis_labels: bool) -> FigureLayout {
    let (width, height) = size;
    let count = count.max(1) as u32;
    let slot = width / count;

    let title_size = (0.06 * height as f32).max(10.0);
    let label_size = (0.045 * height as f32).max(8.0);

    let margin = ((0.04 * Float::from(slot.min(height))) as u32).max(4);
    let gap = margin / 2;
    let title_height = (title_size * 1.4).ceil() as u32;
    let label_height = (label_size * 1.4).ceil() as u32;
    let colorbar_height = ((0.05 * Float::from(height)) as u32).max(4);
    let ticks_height = TICK_LABEL_HEIGHT as u32 + 6;
    let axis_label_height = if axis_labels { label_height } else { 0 };

    let available_width = slot.saturating_sub(2 * margin + axis_label_height).max(1);
    let reserved_height = title_height
        + label_height
        + gap
        + colorbar_height
        + ticks_height
        + axis_label_height
        + margin;
    let available_height = height.saturating_sub(reserved_height).max(1);

    let (map_width, map_height) =
        if Float::from(available_width) / Float::from(available_height) > aspect {
            (
                ((Float::from(available_height) * aspect) as u32).max(1),
                available_height,
            )
        } else {
            (
                available_width,
                ((Float::from(available_width) / aspect) as u32).max(1),
            )
        };

    let panels = (0..count)
        .map(|i| {
            let x = slot * i
                + axis_label_height
                + slot.saturating_sub(axis_label_height + map_width) / 2;
            let y = title_height + label_height;

            let title = Frame {
                x,
                y: title_height,
                width: map_width,
                height: label_height,
            };

            let map = Frame {
                x,
                y,
                width: map_width,
                height: map_height,
            };

            let colorbar = Frame {
                x,
                y: y + map_height + gap,
                width: map_width,
                height: colorbar_height,
            };

            let x_label = Frame {
                x,
                y: colorbar.y + colorbar_height + ticks_height,
                width: map_width,
                height: axis_label_height,
            };

            let y_label = Frame {
                x: x.saturating_sub(axis_label_height),
                y,
                width: axis_label_height,
                height: map_height,
            };

            PanelLayout {
                title,
                map,
                colorbar,
                x_label: Some(x_label).filter(|_| axis_labels),
                y_label: Some(y_label).filter(|_| axis_labels),
            }
        })
        .collect();

    FigureLayout {
        title: Frame {
            x: 0,
            y: 0,
            width,
            height: title_height,
        },
        panels,
        title_size,
        label_size,
    }
}

/// Bilinear sample of the grid at geographic position,
/// `None` outside the grid or next to missing values.
fn sample(
    values: ArrayView2<Float>,
    lats: &[Float],
    lons: &[Float],
    lon: Float,
    lat: Float,
) -> Option<Float> {
    let y = axis_position(lats, lat)?;
    let x = axis_position(lons, lon)?;

    let (rows, cols) = values.dim();
    let (y0, x0) = (y.floor() as usize, x.floor() as usize);
    let (y1, x1) = ((y0 + 1).min(rows - 1), (x0 + 1).min(cols - 1));
    let (fy, fx) = (y - y0 as Float, x - x0 as Float);

    let top = values[[y0, x0]] * (1.0 - fx) + values[[y0, x1]] * fx;
    let bottom = values[[y1, x0]] * (1.0 - fx) + values[[y1, x1]] * fx;
    let value = top * (1.0 - fy) + bottom * fy;

    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

fn axis_position(axis: &[Float], value: Float) -> Option<Float> {
    if axis.len() == 1 {
        return Some(0.0);
    }

    bisection::fractional_index(axis, value).ok()
}

/// Draws the colorbar with value ticks below it. Colours are
/// banded when `levels` are given and continuous otherwise.
fn draw_colorbar(
    canvas: &mut RgbaImage,
    frame: Frame,
    colormap: Colormap,
    levels: Option<u16>,
    range: Option<(Float, Float)>,
) {
    let last = Float::from(frame.width.saturating_sub(1).max(1));

    for dx in 0..frame.width {
        let t = Float::from(dx) / last;
        let color = match levels {
            Some(levels) => colormap.band(t, levels),
            None => colormap.sample(t),
        };

        for dy in 0..frame.height {
            paint(canvas, frame.x + dx, frame.y + dy, color);
        }
    }

    draw_hollow_rect_mut(canvas, frame.rect(), FRAME);

    let (min, max) = match range {
        Some(range) => range,
        None => return,
    };

    let bottom = (frame.y + frame.height) as f32;

    for k in 0..5u8 {
        let t = Float::from(k) / 4.0;
        let x = frame.x as f32 + (t * last) as f32;

        draw_line_segment_mut(canvas, (x, bottom), (x, bottom + 3.0), FRAME);
        contour::draw_label(
            canvas,
            (x, bottom + 4.0 + TICK_LABEL_HEIGHT / 2.0),
            &tick_label(min + (max - min) * t, max - min),
            TICK_LABEL_HEIGHT,
            FRAME,
        );
    }
}

/// Formats the tick value with precision fitting the range.
fn tick_label(value: Float, range: Float) -> String {
    if range >= 10.0 {
        format!("{:.0}", value)
    } else if range >= 1.0 {
        format!("{:.1}", value)
    } else {
        format!("{:.2}", value)
    }
}
