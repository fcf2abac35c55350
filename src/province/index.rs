// src/province/index.rs
//! Индекс провинций: цвет пикселя → провинция.
//!
//! Индекс строится один раз из таблицы определений и базового растра и после
//! этого неизменяем. Точечный запрос — O(1): прямое чтение пикселя плюс
//! поиск по хэшу упакованного цвета. Запросы приходят на каждое движение
//! мыши и миллионами во время извлечения границ, так что ничего дороже здесь
//! быть не должно.

use std::collections::HashMap;

use crate::error::MapError;
use crate::province::{Province, ProvinceDef, SENTINEL_COLOR};
use crate::raster::PixelRaster;

/// Упаковка RGB-тройки в ключ хэша.
#[inline]
#[must_use]
pub fn color_key(r: u8, g: u8, b: u8) -> u32 {
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Неизменяемый индекс: провинции, их цвета и базовый растр для точечных
/// запросов.
#[derive(Debug)]
pub struct ProvinceIndex {
    base: PixelRaster,
    provinces: Vec<Province>,
    colors: Vec<[u8; 3]>,
    by_color: HashMap<u32, usize>,
    by_id: HashMap<String, usize>,
}

impl ProvinceIndex {
    /// Строит индекс из таблицы определений и базового растра.
    ///
    /// Инварианты таблицы: цвета уникальны, идентификаторы уникальны,
    /// зарезервированный цвет фона не используется. Нарушение любого —
    /// ошибка построения, а не тихое перезатирание.
    pub fn build(defs: &[ProvinceDef], base: PixelRaster) -> Result<Self, MapError> {
        let mut provinces = Vec::with_capacity(defs.len());
        let mut colors = Vec::with_capacity(defs.len());
        let mut by_color = HashMap::with_capacity(defs.len());
        let mut by_id = HashMap::with_capacity(defs.len());

        for def in defs {
            let color = def.color();
            if color == SENTINEL_COLOR {
                return Err(MapError::ReservedProvinceColor {
                    id: def.id.clone(),
                });
            }
            let key = color_key(color[0], color[1], color[2]);
            if let Some(&prev) = by_color.get(&key) {
                let first: &Province = &provinces[prev];
                return Err(MapError::DuplicateProvinceColor {
                    color,
                    first: first.id.clone(),
                    second: def.id.clone(),
                });
            }
            if by_id.contains_key(&def.id) {
                return Err(MapError::DuplicateProvinceId {
                    id: def.id.clone(),
                });
            }
            let ordinal = provinces.len();
            by_color.insert(key, ordinal);
            by_id.insert(def.id.clone(), ordinal);
            provinces.push(Province {
                id: def.id.clone(),
                name: def.name.clone(),
            });
            colors.push(color);
        }

        Ok(Self {
            base,
            provinces,
            colors,
            by_color,
            by_id,
        })
    }

    /// Провинция под точкой карты; за границами растра или на цвете, не
    /// входящем в таблицу (вода/фон), — `None`.
    #[inline]
    #[must_use]
    pub fn province_at(&self, x: i64, y: i64) -> Option<&Province> {
        let px = self.base.get_checked(x, y)?;
        let key = color_key(px[0], px[1], px[2]);
        self.by_color.get(&key).map(|&i| &self.provinces[i])
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Province> {
        self.by_id.get(id).map(|&i| &self.provinces[i])
    }

    /// Зарегистрированный цвет провинции — обратный поиск для извлечения
    /// границ и политической раскраски.
    #[must_use]
    pub fn color_of(&self, id: &str) -> Option<[u8; 3]> {
        self.by_id.get(id).map(|&i| self.colors[i])
    }

    /// Номер провинции по ключу цвета (для плотных таблиц во внутренних
    /// циклах).
    #[inline]
    #[must_use]
    pub fn ordinal_by_key(&self, key: u32) -> Option<usize> {
        self.by_color.get(&key).copied()
    }

    #[must_use]
    pub fn province_by_ordinal(&self, ordinal: usize) -> Option<&Province> {
        self.provinces.get(ordinal)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Province> {
        self.provinces.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.provinces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.provinces.is_empty()
    }

    /// Базовый растр провинций (только чтение; не меняется после загрузки).
    #[must_use]
    pub fn base(&self) -> &PixelRaster {
        &self.base
    }

    #[must_use]
    pub fn map_size(&self) -> (u32, u32) {
        (self.base.width, self.base.height)
    }
}
