// src/label/rect.rs
//! Наибольший прямоугольник из занятых ячеек.
//!
//! Классическая схема: при проходе по строкам сверху вниз для каждого
//! столбца поддерживается высота непрерывной занятой колонки, и на каждой
//! строке задача сводится к наибольшему прямоугольнику в гистограмме —
//! монотонный стек, O(cols) на строку. Побеждает первый прямоугольник,
//! достигший максимальной площади.

/// Прямоугольник в координатах ячеек сетки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub col: usize,
    pub row: usize,
    pub w: usize,
    pub h: usize,
}

impl CellRect {
    #[must_use]
    pub fn area(&self) -> usize {
        self.w * self.h
    }
}

/// Ищет наибольший прямоугольник из `true`-ячеек; `None`, если занятых
/// ячеек нет.
#[must_use]
pub fn largest_rect(cols: usize, rows: usize, cells: &[bool]) -> Option<CellRect> {
    if cols == 0 || rows == 0 {
        return None;
    }
    debug_assert_eq!(cells.len(), cols * rows);

    let mut heights = vec![0usize; cols];
    let mut best: Option<CellRect> = None;

    for row in 0..rows {
        for col in 0..cols {
            heights[col] = if cells[row * cols + col] {
                heights[col] + 1
            } else {
                0
            };
        }
        sweep_histogram(&heights, row, &mut best);
    }
    best
}

/// Один проход монотонного стека по гистограмме строки `row`.
fn sweep_histogram(heights: &[usize], row: usize, best: &mut Option<CellRect>) {
    let mut stack: Vec<usize> = Vec::with_capacity(heights.len());
    for col in 0..=heights.len() {
        // барьер нулевой высоты в конце выталкивает весь стек
        let current = if col < heights.len() { heights[col] } else { 0 };
        while let Some(&top) = stack.last() {
            if heights[top] <= current {
                break;
            }
            stack.pop();
            let h = heights[top];
            let left = stack.last().map_or(0, |&i| i + 1);
            let w = col - left;
            let area = h * w;
            if area > best.as_ref().map_or(0, CellRect::area) {
                *best = Some(CellRect {
                    col: left,
                    row: row + 1 - h,
                    w,
                    h,
                });
            }
        }
        stack.push(col);
    }
}
