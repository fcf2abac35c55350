// src/compose.rs
//! Композитинг слоёв в видимый кадр.
//!
//! Для каждого пикселя окна просмотра берётся обратное преобразование камеры
//! (сдвиг + масштаб, округление вниз — ближайший сосед, без сглаживания), и
//! слои подмешиваются в фиксированном порядке. Слои — независимые растры в
//! координатах карты; каждый перерисовывается только своим владельцем по
//! своему условию инвалидации, композитинг их лишь читает.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::camera::Camera;
use crate::raster::{Pixel, PixelRaster};

/// Режим смешивания слоя.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    Multiply,
}

/// Слой композитинга: именованный растр, режим смешивания, непрозрачность.
#[derive(Debug, Clone, Copy)]
pub struct Layer<'a> {
    pub name: &'static str,
    pub raster: &'a PixelRaster,
    pub blend: BlendMode,
    pub opacity: f32,
}

/// Смешивает пиксель слоя в накопленный цвет кадра.
#[inline]
#[must_use]
pub fn blend_pixel(dst: Pixel, src: Pixel, mode: BlendMode, opacity: f32) -> Pixel {
    let alpha = f32::from(src[3]) / 255.0 * opacity;
    if alpha <= 0.0 {
        return dst;
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let d = f32::from(dst[c]);
        let s = f32::from(src[c]);
        let mixed = match mode {
            BlendMode::Normal => s,
            BlendMode::Multiply => d * s / 255.0,
        };
        out[c] = (mixed * alpha + d * (1.0 - alpha)).round().clamp(0.0, 255.0) as u8;
    }
    let da = f32::from(dst[3]) / 255.0;
    out[3] = ((alpha + da * (1.0 - alpha)) * 255.0).round().clamp(0.0, 255.0) as u8;
    out
}

/// Собирает кадр размером с окно просмотра.
///
/// Пиксели окна, не попавшие на карту, остаются цветом `background`
/// (при корректном `clamp` камеры такие возможны только на вырожденных
/// размерах).
#[must_use]
pub fn render_frame(layers: &[Layer<'_>], camera: &Camera, background: Pixel) -> PixelRaster {
    let (viewport_w, viewport_h) = camera.viewport();
    let mut frame = PixelRaster::new(viewport_w, viewport_h);
    if frame.is_empty() {
        return frame;
    }

    // обратное отображение по осям независимо: колонка → X карты, строка → Y
    let map_x: Vec<i64> = (0..viewport_w)
        .map(|sx| camera.screen_to_map(f64::from(sx), 0.0).0)
        .collect();
    let map_y: Vec<i64> = (0..viewport_h)
        .map(|sy| camera.screen_to_map(0.0, f64::from(sy)).1)
        .collect();

    let row_bytes = (viewport_w as usize) * 4;

    let compose_row = |sy: usize, row: &mut [u8]| {
        let my = map_y[sy];
        for (sx, dst) in row.chunks_exact_mut(4).enumerate() {
            let mut px = background;
            for layer in layers {
                if let Some(src) = layer.raster.get_checked(map_x[sx], my) {
                    px = blend_pixel(px, src, layer.blend, layer.opacity);
                }
            }
            dst.copy_from_slice(&px);
        }
    };

    #[cfg(feature = "parallel")]
    frame
        .data
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(sy, row)| compose_row(sy, row));

    #[cfg(not(feature = "parallel"))]
    for (sy, row) in frame.data.chunks_mut(row_bytes).enumerate() {
        compose_row(sy, row);
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraSettings;

    fn camera_1to1(map: u32, viewport: u32) -> Camera {
        Camera::new(
            &CameraSettings {
                initial_zoom: 1.0,
                min_zoom: 1.0,
                max_zoom: 8.0,
            },
            map,
            map,
            viewport,
            viewport,
        )
    }

    #[test]
    fn normal_blend_full_alpha_replaces() {
        let px = blend_pixel([10, 10, 10, 255], [200, 100, 50, 255], BlendMode::Normal, 1.0);
        assert_eq!(px, [200, 100, 50, 255]);
    }

    #[test]
    fn normal_blend_half_opacity_mixes() {
        let px = blend_pixel([0, 0, 0, 255], [200, 100, 50, 255], BlendMode::Normal, 0.5);
        assert_eq!(px, [100, 50, 25, 255]);
    }

    #[test]
    fn transparent_source_is_noop() {
        let dst = [7, 8, 9, 255];
        assert_eq!(blend_pixel(dst, [200, 200, 200, 0], BlendMode::Normal, 1.0), dst);
    }

    #[test]
    fn multiply_darkens() {
        let px = blend_pixel(
            [200, 200, 200, 255],
            [128, 128, 128, 255],
            BlendMode::Multiply,
            1.0,
        );
        // 200 × 128 / 255 ≈ 100
        assert_eq!(px[0], 100);
        assert!(px[0] < 200);
    }

    #[test]
    fn layers_compose_in_order() {
        let bottom = PixelRaster::filled(4, 4, [255, 0, 0, 255]);
        let mut top = PixelRaster::new(4, 4);
        top.set(1, 1, [0, 0, 255, 255]);

        let camera = camera_1to1(4, 4);
        let frame = render_frame(
            &[
                Layer {
                    name: "bottom",
                    raster: &bottom,
                    blend: BlendMode::Normal,
                    opacity: 1.0,
                },
                Layer {
                    name: "top",
                    raster: &top,
                    blend: BlendMode::Normal,
                    opacity: 1.0,
                },
            ],
            &camera,
            [0, 0, 0, 255],
        );
        assert_eq!(frame.get(0, 0), [255, 0, 0, 255]);
        assert_eq!(frame.get(1, 1), [0, 0, 255, 255]);
    }

    #[test]
    fn nearest_neighbor_scales_up() {
        let mut map = PixelRaster::new(2, 2);
        map.set(0, 0, [10, 0, 0, 255]);
        map.set(1, 0, [0, 20, 0, 255]);
        map.set(0, 1, [0, 0, 30, 255]);
        map.set(1, 1, [40, 40, 40, 255]);

        // зум 2: каждый пиксель карты занимает блок 2×2 на экране
        let camera = camera_1to1(2, 4);
        assert!((camera.zoom - 2.0).abs() < 1e-9);
        let frame = render_frame(
            &[Layer {
                name: "map",
                raster: &map,
                blend: BlendMode::Normal,
                opacity: 1.0,
            }],
            &camera,
            [0, 0, 0, 255],
        );
        assert_eq!(frame.get(0, 0), [10, 0, 0, 255]);
        assert_eq!(frame.get(1, 1), [10, 0, 0, 255]);
        assert_eq!(frame.get(2, 0), [0, 20, 0, 255]);
        assert_eq!(frame.get(3, 3), [40, 40, 40, 255]);
    }

    #[test]
    fn empty_viewport_yields_empty_frame() {
        let camera = Camera::new(
            &CameraSettings {
                initial_zoom: 1.0,
                min_zoom: 1.0,
                max_zoom: 8.0,
            },
            4,
            4,
            0,
            0,
        );
        let frame = render_frame(&[], &camera, [0, 0, 0, 255]);
        assert!(frame.is_empty());
    }
}
