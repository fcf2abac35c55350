// src/label/placer.rs
//! Вычисление якорей подписей.
//!
//! Для каждой страны с территорией: сетка занятости над её ограничивающим
//! прямоугольником, наибольший вписанный прямоугольник, центр прямоугольника
//! в координатах растра — это и есть якорь. Работа по странам независима,
//! поэтому есть два режима: пакетный кооперативный ([`AnchorJob`]) с точкой
//! уступки каждые несколько стран, чтобы не замораживать цикл
//! взаимодействия, и одномоментный параллельный ([`compute_all`]) для
//! нативных сборок.
//!
//! Каждая задача несёт порядковый номер пересчёта: результат применяется
//! только если за время работы не случилось новой мутации владения —
//! устаревший результат молча отбрасывается, это не ошибка.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::country::{CountryTable, OwnershipMap};
use crate::label::grid::OccupancyGrid;
use crate::label::rect::largest_rect;
use crate::label::LabelAnchor;
use crate::political::CountryStats;
use crate::province::ProvinceIndex;

/// Сколько стран обрабатывается между точками уступки.
pub const DEFAULT_BATCH: usize = 8;

/// Якорь одной страны; `None`, если страна без территории или её
/// прямоугольник вырожден.
#[must_use]
pub fn anchor_for(
    index: &ProvinceIndex,
    ownership: &OwnershipMap,
    countries: &CountryTable,
    ordinal: usize,
    stats: &CountryStats,
) -> Option<LabelAnchor> {
    let bbox = stats.bbox()?;
    let country = countries.by_ordinal(ordinal)?;
    let grid = OccupancyGrid::build(index, ownership, &country.id, bbox)?;
    let rect = largest_rect(grid.cols, grid.rows, &grid.cells)?;

    // центр прямоугольника обратно в координаты растра
    let (_, _, max_x, max_y) = bbox;
    let x = (grid.origin.0 + (rect.col as u32) * grid.cell
        + ((rect.w as u32) * grid.cell) / 2)
        .min(max_x);
    let y = (grid.origin.1 + (rect.row as u32) * grid.cell
        + ((rect.h as u32) * grid.cell) / 2)
        .min(max_y);

    Some(LabelAnchor {
        country: ordinal,
        x,
        y,
    })
}

/// Пакетная задача вычисления якорей для всех стран.
#[derive(Debug)]
pub struct AnchorJob {
    seq: u64,
    cursor: usize,
    total: usize,
    anchors: Vec<LabelAnchor>,
}

impl AnchorJob {
    #[must_use]
    pub fn new(seq: u64, total: usize) -> Self {
        Self {
            seq,
            cursor: 0,
            total,
            anchors: Vec::new(),
        }
    }

    /// Номер пересчёта, под который создана задача.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cursor >= self.total
    }

    /// Продвигает задачу не более чем на `batch` стран.
    /// Возвращает `true`, когда вся работа завершена.
    pub fn step(
        &mut self,
        batch: usize,
        index: &ProvinceIndex,
        ownership: &OwnershipMap,
        countries: &CountryTable,
        stats: &[CountryStats],
    ) -> bool {
        let end = (self.cursor + batch.max(1)).min(self.total);
        for ordinal in self.cursor..end {
            if let Some(anchor) = anchor_for(index, ownership, countries, ordinal, &stats[ordinal])
            {
                self.anchors.push(anchor);
            }
        }
        self.cursor = end;
        self.is_done()
    }

    /// Готовые якоря; имеет смысл только после завершения.
    #[must_use]
    pub fn into_anchors(self) -> Vec<LabelAnchor> {
        self.anchors
    }
}

/// Одномоментное вычисление якорей всех стран на пуле потоков.
#[cfg(feature = "parallel")]
#[must_use]
pub fn compute_all(
    index: &ProvinceIndex,
    ownership: &OwnershipMap,
    countries: &CountryTable,
    stats: &[CountryStats],
) -> Vec<LabelAnchor> {
    (0..countries.len())
        .into_par_iter()
        .filter_map(|ordinal| anchor_for(index, ownership, countries, ordinal, &stats[ordinal]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::CountryDef;
    use crate::raster::PixelRaster;
    use crate::province::ProvinceDef;

    /// 60×60: провинция "a" занимает левые 30 столбцов, страна red владеет ею.
    fn fixture() -> (ProvinceIndex, OwnershipMap, CountryTable, Vec<CountryStats>) {
        let mut base = PixelRaster::new(60, 60);
        for y in 0..60 {
            for x in 0..60 {
                let color = if x < 30 { [10, 0, 0, 255] } else { [0, 20, 0, 255] };
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
        let countries = CountryTable::from_defs(&[
            CountryDef {
                id: "red".to_string(),
                name: "Redland".to_string(),
                color: "#c80000".to_string(),
            },
            CountryDef {
                id: "blue".to_string(),
                name: "Bluemark".to_string(),
                color: "#0000c8".to_string(),
            },
        ])
        .unwrap();
        let mut ownership = OwnershipMap::default();
        ownership.assign(&index, &countries, "a", "red").unwrap();

        let view = crate::political::render_political(&index, &ownership, &countries);
        (index, ownership, countries, view.stats)
    }

    #[test]
    fn anchor_lands_inside_territory() {
        let (index, ownership, countries, stats) = fixture();
        let anchor = anchor_for(&index, &ownership, &countries, 0, &stats[0]).unwrap();
        // якорь внутри левой половины, принадлежащей стране
        assert!(anchor.x < 30);
        assert!(anchor.y < 60);
        let province = index
            .province_at(i64::from(anchor.x), i64::from(anchor.y))
            .unwrap();
        assert_eq!(ownership.owner_of(&province.id), Some(&"red".to_string()));
    }

    #[test]
    fn landless_country_has_no_anchor() {
        let (index, ownership, countries, stats) = fixture();
        assert!(anchor_for(&index, &ownership, &countries, 1, &stats[1]).is_none());
    }

    #[test]
    fn job_steps_to_completion() {
        let (index, ownership, countries, stats) = fixture();
        let mut job = AnchorJob::new(7, countries.len());
        assert_eq!(job.seq(), 7);
        assert!(!job.is_done());
        // батч размером 1: две страны — два шага
        assert!(!job.step(1, &index, &ownership, &countries, &stats));
        assert!(job.step(1, &index, &ownership, &countries, &stats));
        let anchors = job.into_anchors();
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].country, 0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn compute_all_matches_job() {
        let (index, ownership, countries, stats) = fixture();
        let mut job = AnchorJob::new(0, countries.len());
        while !job.step(DEFAULT_BATCH, &index, &ownership, &countries, &stats) {}
        let mut sequential = job.into_anchors();
        let mut parallel = compute_all(&index, &ownership, &countries, &stats);
        sequential.sort_unstable_by_key(|a| a.country);
        parallel.sort_unstable_by_key(|a| a.country);
        assert_eq!(sequential, parallel);
    }
}
