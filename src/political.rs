// src/political.rs
//! Политическая раскраска: растр владения поверх базовой карты.
//!
//! Один проход по базовому растру: пиксель провинции, у которой есть
//! владелец, красится цветом страны с полной альфой; всё остальное остаётся
//! прозрачным, чтобы сквозь слой читались рельеф и вода. Тем же проходом
//! собираются счётчики пикселей и ограничивающие прямоугольники стран —
//! метрики для подписей, чтобы не сканировать растр второй раз.
//!
//! Во внутреннем цикле нет ни выделений памяти, ни поиска по строковым
//! ключам: таблица `цвет провинции → (номер страны, RGBA)` строится один раз
//! до прохода, соседние пиксели одного цвета переиспользуют последний
//! результат поиска.

use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::country::{CountryTable, OwnershipMap};
use crate::province::index::color_key;
use crate::province::ProvinceIndex;
use crate::raster::PixelRaster;

/// Метрики страны, собранные при раскраске.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryStats {
    /// Сколько пикселей карты принадлежит стране
    pub pixels: usize,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl CountryStats {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            pixels: 0,
            min_x: u32::MAX,
            min_y: u32::MAX,
            max_x: 0,
            max_y: 0,
        }
    }

    #[inline]
    fn note(&mut self, x: u32, y: u32) {
        self.pixels += 1;
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn absorb(&mut self, other: &CountryStats) {
        self.pixels += other.pixels;
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Ограничивающий прямоугольник `(min_x, min_y, max_x, max_y)`;
    /// `None`, если страна не владеет ни одним пикселем.
    #[must_use]
    pub fn bbox(&self) -> Option<(u32, u32, u32, u32)> {
        if self.pixels == 0 {
            None
        } else {
            Some((self.min_x, self.min_y, self.max_x, self.max_y))
        }
    }
}

/// Результат политической раскраски.
#[derive(Debug)]
pub struct PoliticalView {
    /// RGBA-растр: цвет страны там, где есть владелец, иначе прозрачно
    pub raster: PixelRaster,
    /// Метрики по странам, индекс — порядковый номер страны
    pub stats: Vec<CountryStats>,
}

/// Перекрашивает карту по текущему владению.
#[must_use]
pub fn render_political(
    index: &ProvinceIndex,
    ownership: &OwnershipMap,
    countries: &CountryTable,
) -> PoliticalView {
    let (w, h) = index.map_size();
    let mut raster = PixelRaster::new(w, h);
    let n = countries.len();

    // цвет провинции → (номер страны, готовый RGBA) — один раз до прохода
    let mut paint: HashMap<u32, (usize, [u8; 4])> = HashMap::new();
    for province in index.iter() {
        let Some(owner) = ownership.owner_of(&province.id) else {
            continue;
        };
        let (Some(ordinal), Some(display)) = (countries.ordinal(owner), countries.get(owner))
        else {
            continue;
        };
        if let Some(color) = index.color_of(&province.id) {
            let rgba = [display.color[0], display.color[1], display.color[2], 255];
            paint.insert(color_key(color[0], color[1], color[2]), (ordinal, rgba));
        }
    }

    if w == 0 || h == 0 {
        return PoliticalView {
            raster,
            stats: vec![CountryStats::empty(); n],
        };
    }

    let row_bytes = (w as usize) * 4;
    let base = &index.base().data;

    #[cfg(feature = "parallel")]
    let stats = raster
        .data
        .par_chunks_mut(row_bytes)
        .zip(base.par_chunks(row_bytes))
        .enumerate()
        .fold(
            || vec![CountryStats::empty(); n],
            |mut acc, (y, (out_row, base_row))| {
                paint_row(y as u32, base_row, out_row, &paint, &mut acc);
                acc
            },
        )
        .reduce(
            || vec![CountryStats::empty(); n],
            |mut a, b| {
                for (dst, src) in a.iter_mut().zip(&b) {
                    dst.absorb(src);
                }
                a
            },
        );

    #[cfg(not(feature = "parallel"))]
    let stats = {
        let mut acc = vec![CountryStats::empty(); n];
        for (y, (out_row, base_row)) in raster
            .data
            .chunks_mut(row_bytes)
            .zip(base.chunks(row_bytes))
            .enumerate()
        {
            paint_row(y as u32, base_row, out_row, &paint, &mut acc);
        }
        acc
    };

    PoliticalView { raster, stats }
}

fn paint_row(
    y: u32,
    base_row: &[u8],
    out_row: &mut [u8],
    paint: &HashMap<u32, (usize, [u8; 4])>,
    stats: &mut [CountryStats],
) {
    // соседние пиксели почти всегда одного цвета — кэшируем последний поиск
    let mut last: Option<(u32, Option<(usize, [u8; 4])>)> = None;
    for (x, (src, dst)) in base_row
        .chunks_exact(4)
        .zip(out_row.chunks_exact_mut(4))
        .enumerate()
    {
        let key = color_key(src[0], src[1], src[2]);
        let hit = match last {
            Some((k, cached)) if k == key => cached,
            _ => {
                let fresh = paint.get(&key).copied();
                last = Some((key, fresh));
                fresh
            }
        };
        if let Some((ordinal, rgba)) = hit {
            dst.copy_from_slice(&rgba);
            stats[ordinal].note(x as u32, y);
        }
    }
}
