// src/border/country.rs
//! Границы стран — постоянный чёрный контур поверх политической раскраски.
//!
//! Вход — политический растр: каждый пиксель уже окрашен цветом
//! страны-владельца, ничьи пиксели прозрачны. Проверяются только соседи
//! справа и снизу: проход исчерпывает весь растр, так что каждая смежная
//! пара пикселей встречается ровно один раз, и двух направлений достаточно —
//! вдвое дешевле восьми. Это верно только для полного прохода; при разбиении
//! растра на тайлы пикселям на швах понадобились бы чтения из соседних
//! тайлов, поэтому проход здесь намеренно однопоточный.
//!
//! Прозрачные пиксели не порождают границ ни с какой стороны: стык суши и
//! воды контуром не считается. Полный пересчёт запускается на каждой мутации
//! владения и обязан укладываться в доли секунды даже на ~12M пикселей —
//! во внутреннем цикле только сравнения сырых байтов, без выделений памяти
//! и поиска по таблицам.

use crate::border::{BorderKind, BorderSet};
use crate::raster::PixelRaster;

/// Цвет контура стран в маске.
pub const BORDER_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Извлекает границы стран из политического растра.
///
/// Возвращает набор координат и готовую к композитингу RGBA-маску
/// (непрозрачный чёрный на граничных пикселях). Пустой растр даёт пустой
/// результат.
#[must_use]
pub fn extract_country_borders(political: &PixelRaster) -> (BorderSet, PixelRaster) {
    let w = political.width as usize;
    let h = political.height as usize;
    let mut mask = PixelRaster::new(political.width, political.height);
    let mut set = BorderSet::empty(BorderKind::Country);
    if w == 0 || h == 0 {
        return (set, mask);
    }

    let data = &political.data;
    let mut marked = vec![false; w * h];

    for y in 0..h {
        let row = y * w;
        for x in 0..w {
            let i = (row + x) * 4;
            if data[i + 3] == 0 {
                continue;
            }
            // сосед справа
            if x + 1 < w {
                let j = i + 4;
                if data[j + 3] != 0
                    && (data[i] != data[j]
                        || data[i + 1] != data[j + 1]
                        || data[i + 2] != data[j + 2])
                {
                    marked[row + x] = true;
                    marked[row + x + 1] = true;
                }
            }
            // сосед снизу
            if y + 1 < h {
                let j = i + w * 4;
                if data[j + 3] != 0
                    && (data[i] != data[j]
                        || data[i + 1] != data[j + 1]
                        || data[i + 2] != data[j + 2])
                {
                    marked[row + x] = true;
                    marked[row + x + w] = true;
                }
            }
        }
    }

    for y in 0..h {
        let row = y * w;
        for x in 0..w {
            if marked[row + x] {
                set.pixels.push((x as u32, y as u32));
                mask.set(x as u32, y as u32, BORDER_COLOR);
            }
        }
    }

    (set, mask)
}
