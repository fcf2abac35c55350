// src/label/grid.rs
//! Сетка занятости страны.
//!
//! Поиск места под подпись работает не по сырому растру, а по огрублённой
//! булевой сетке над ограничивающим прямоугольником страны. Размер ячейки
//! подстраивается под габариты: маленькая страна — мелкие ячейки, большая —
//! крупные, так что число ячеек ограничено независимо от размера территории.

use crate::country::OwnershipMap;
use crate::province::ProvinceIndex;

/// Размер ячейки по короткой стороне ограничивающего прямоугольника.
#[must_use]
pub fn cell_size_for(shorter_side: u32) -> u32 {
    if shorter_side < 100 {
        10
    } else if shorter_side < 250 {
        20
    } else if shorter_side < 500 {
        30
    } else if shorter_side < 1000 {
        40
    } else {
        50
    }
}

/// Булева сетка занятости над ограничивающим прямоугольником страны.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    pub cols: usize,
    pub rows: usize,
    /// Размер ячейки в пикселях карты
    pub cell: u32,
    /// Левый верхний угол прямоугольника в координатах карты
    pub origin: (u32, u32),
    /// Занятость по строкам: индекс `row * cols + col`
    pub cells: Vec<bool>,
}

impl OccupancyGrid {
    /// Строит сетку: ячейка занята, если её центральная точка через индекс
    /// и карту владения разрешается в провинцию этой страны.
    ///
    /// Вырожденный прямоугольник (`min ≥ max` по любой оси) — `None`:
    /// такой стране якорь не ставится.
    #[must_use]
    pub fn build(
        index: &ProvinceIndex,
        ownership: &OwnershipMap,
        country_id: &str,
        bbox: (u32, u32, u32, u32),
    ) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = bbox;
        if min_x >= max_x || min_y >= max_y {
            return None;
        }
        let bbox_w = max_x - min_x + 1;
        let bbox_h = max_y - min_y + 1;
        let cell = cell_size_for(bbox_w.min(bbox_h));
        let cols = bbox_w.div_ceil(cell) as usize;
        let rows = bbox_h.div_ceil(cell) as usize;

        let mut cells = vec![false; cols * rows];
        for row in 0..rows {
            let sy = (min_y + (row as u32) * cell + cell / 2).min(max_y);
            for col in 0..cols {
                let sx = (min_x + (col as u32) * cell + cell / 2).min(max_x);
                let occupied = index
                    .province_at(i64::from(sx), i64::from(sy))
                    .and_then(|p| ownership.owner_of(&p.id))
                    .is_some_and(|owner| owner == country_id);
                cells[row * cols + col] = occupied;
            }
        }

        Some(Self {
            cols,
            rows,
            cell,
            origin: (min_x, min_y),
            cells,
        })
    }

    #[inline]
    #[must_use]
    pub fn occupied(&self, col: usize, row: usize) -> bool {
        self.cells[row * self.cols + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::{CountryDef, CountryTable};
    use crate::province::ProvinceDef;
    use crate::raster::PixelRaster;

    #[test]
    fn cell_size_buckets() {
        assert_eq!(cell_size_for(0), 10);
        assert_eq!(cell_size_for(99), 10);
        assert_eq!(cell_size_for(100), 20);
        assert_eq!(cell_size_for(249), 20);
        assert_eq!(cell_size_for(250), 30);
        assert_eq!(cell_size_for(499), 30);
        assert_eq!(cell_size_for(500), 40);
        assert_eq!(cell_size_for(999), 40);
        assert_eq!(cell_size_for(1000), 50);
        assert_eq!(cell_size_for(100_000), 50);
    }

    #[test]
    fn degenerate_bbox_is_none() {
        let index = ProvinceIndex::build(&[], PixelRaster::new(4, 4)).unwrap();
        let ownership = OwnershipMap::default();
        assert!(OccupancyGrid::build(&index, &ownership, "red", (3, 0, 3, 2)).is_none());
        assert!(OccupancyGrid::build(&index, &ownership, "red", (0, 2, 3, 2)).is_none());
    }

    #[test]
    fn cells_reflect_ownership() {
        // 40×40: левая половина — провинция "a" (страна red), правая — "b" (ничья)
        let mut base = PixelRaster::new(40, 40);
        for y in 0..40 {
            for x in 0..40 {
                let color = if x < 20 { [10, 0, 0, 255] } else { [0, 20, 0, 255] };
                base.set(x, y, color);
            }
        }
        let defs = vec![
            ProvinceDef {
                r: 10,
                g: 0,
                b: 0,
                id: "a".to_string(),
                name: "A".to_string(),
            },
            ProvinceDef {
                r: 0,
                g: 20,
                b: 0,
                id: "b".to_string(),
                name: "B".to_string(),
            },
        ];
        let index = ProvinceIndex::build(&defs, base).unwrap();
        let countries = CountryTable::from_defs(&[CountryDef {
            id: "red".to_string(),
            name: "Redland".to_string(),
            color: "#c80000".to_string(),
        }])
        .unwrap();
        let mut ownership = OwnershipMap::default();
        ownership.assign(&index, &countries, "a", "red").unwrap();

        let grid = OccupancyGrid::build(&index, &ownership, "red", (0, 0, 39, 39)).unwrap();
        assert_eq!(grid.cell, 10);
        assert_eq!((grid.cols, grid.rows), (4, 4));
        // левые два столбца ячеек заняты, правые — нет
        for row in 0..4 {
            assert!(grid.occupied(0, row));
            assert!(grid.occupied(1, row));
            assert!(!grid.occupied(2, row));
            assert!(!grid.occupied(3, row));
        }
    }
}
