use image::{ImageBuffer, Rgba, RgbaImage};

/// RGBA-пиксель в порядке байтов `[r, g, b, a]`.
pub type Pixel = [u8; 4];

/// Полностью прозрачный пиксель — фон по умолчанию.
pub const TRANSPARENT: Pixel = [0, 0, 0, 0];

/// Двумерный RGBA-буфер: плоский вектор байт размером `width × height × 4`,
/// индекс пикселя — `(y * width + x) * 4`.
///
/// Все операции с прямоугольниками обрезаются по границам буфера, выход за
/// границы при чтении — это `None`, а не ошибка: промахи случаются при каждом
/// движении курсора и не должны ничего ломать.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelRaster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelRaster {
    /// Создаёт прозрачный буфер. Нулевые размеры допустимы (пустая карта).
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    /// Создаёт буфер, залитый одним цветом.
    #[must_use]
    pub fn filled(width: u32, height: u32, px: Pixel) -> Self {
        let mut raster = Self::new(width, height);
        raster.fill(px);
        raster
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Читает пиксель. Координаты должны быть в границах буфера.
    #[inline]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Pixel {
        let i = self.offset(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Читает пиксель с проверкой границ; за пределами буфера — `None`.
    #[inline]
    #[must_use]
    pub fn get_checked(&self, x: i64, y: i64) -> Option<Pixel> {
        if self.contains(x, y) {
            Some(self.get(x as u32, y as u32))
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, px: Pixel) {
        let i = self.offset(x, y);
        self.data[i..i + 4].copy_from_slice(&px);
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn fill(&mut self, px: Pixel) {
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    /// Заливает прямоугольник, обрезанный по границам буфера.
    pub fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, px: Pixel) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + i64::from(w)).min(i64::from(self.width));
        let y1 = (y + i64::from(h)).min(i64::from(self.height));
        for yy in y0..y1 {
            for xx in x0..x1 {
                self.set(xx as u32, yy as u32, px);
            }
        }
    }

    /// Копирует прямоугольник из `src` без смешивания; области, выходящие за
    /// границы любого из буферов, отбрасываются.
    pub fn copy_rect(
        &mut self,
        src: &PixelRaster,
        src_x: u32,
        src_y: u32,
        w: u32,
        h: u32,
        dst_x: i64,
        dst_y: i64,
    ) {
        let w = w.min(src.width.saturating_sub(src_x));
        let h = h.min(src.height.saturating_sub(src_y));
        for row in 0..h {
            let dy = dst_y + i64::from(row);
            if dy < 0 || dy >= i64::from(self.height) {
                continue;
            }
            for col in 0..w {
                let dx = dst_x + i64::from(col);
                if dx < 0 || dx >= i64::from(self.width) {
                    continue;
                }
                let px = src.get(src_x + col, src_y + row);
                self.set(dx as u32, dy as u32, px);
            }
        }
    }

    /// Оборачивает готовое RGBA-изображение без копирования данных.
    #[must_use]
    pub fn from_image(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }

    /// Передаёт буфер обратно в `image` без копирования.
    ///
    /// Длина `data` всегда согласована с размерами (все конструкторы и
    /// операции это сохраняют), поэтому сборка не может не удаться.
    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(self.width, self.height, self.data)
            .expect("длина буфера не согласована с размерами растра")
    }

    pub fn save_as_png(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let img: RgbaImage =
            ImageBuffer::from_raw(self.width, self.height, self.data.clone())
                .ok_or("Failed to create image buffer")?;
        img.save(path)?;
        Ok(())
    }
}
