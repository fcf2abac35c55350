// src/border/province.rs
//! Контуры провинций для подсветки выбора.
//!
//! Пиксель принадлежит контуру провинции, если он совпадает с её цветом, а
//! хотя бы один из восьми соседей — нет (выход за край растра считается
//! "другим"). Полный проход по растру на провинцию — дорого, поэтому контуры
//! считаются лениво и запоминаются: большинство провинций за сессию никто
//! не выбирает.

use std::collections::HashMap;

use crate::border::{BorderKind, BorderSet};
use crate::province::ProvinceIndex;
use crate::raster::PixelRaster;

const NEIGHBORS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Контур области заданного цвета в базовом растре.
#[must_use]
pub fn extract_province_border(base: &PixelRaster, color: [u8; 3], id: &str) -> BorderSet {
    let mut set = BorderSet::empty(BorderKind::Province(id.to_string()));
    if base.is_empty() {
        return set;
    }
    let w = base.width as usize;
    let h = base.height as usize;
    let data = &base.data;

    for y in 0..h {
        let row = y * w;
        for x in 0..w {
            let i = (row + x) * 4;
            if data[i] != color[0] || data[i + 1] != color[1] || data[i + 2] != color[2] {
                continue;
            }
            let mut boundary = false;
            for &(dx, dy) in &NEIGHBORS_8 {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                    boundary = true;
                    break;
                }
                let j = ((ny as usize) * w + nx as usize) * 4;
                if data[j] != color[0] || data[j + 1] != color[1] || data[j + 2] != color[2] {
                    boundary = true;
                    break;
                }
            }
            if boundary {
                set.pixels.push((x as u32, y as u32));
            }
        }
    }
    set
}

/// Ленивый кэш контуров по идентификатору провинции.
///
/// Запрос контура неизвестной провинции — штатная ситуация (выбор может быть
/// эфемерным или уже невалидным) и возвращает пустой набор, а не ошибку.
#[derive(Debug, Default)]
pub struct ProvinceBorderCache {
    cache: HashMap<String, BorderSet>,
}

impl ProvinceBorderCache {
    /// Контур провинции; считается при первом обращении, дальше — из кэша.
    pub fn border(&mut self, index: &ProvinceIndex, id: &str) -> &BorderSet {
        self.cache.entry(id.to_string()).or_insert_with(|| {
            match index.color_of(id) {
                Some(color) => extract_province_border(index.base(), color, id),
                None => BorderSet::empty(BorderKind::Province(id.to_string())),
            }
        })
    }

    /// Сбрасывает записи только для перечисленных провинций.
    pub fn invalidate<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for id in ids {
            self.cache.remove(id.as_ref());
        }
    }

    /// Полный сброс (массовая загрузка владения).
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
