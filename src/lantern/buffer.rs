use crate::util::ViewportSize;

/// One `T` per pixel, row major. Resizing throws the old contents away.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer<T> {
    size: ViewportSize,
    data: Vec<T>,
}

impl<T: Copy + Default> PixelBuffer<T> {
    pub fn new(size: ViewportSize) -> Self {
        Self {
            size,
            data: vec![T::default(); size.pixel_count()],
        }
    }

    /// Reallocates to `new_size`, filled with `T::default()`.
    ///
    /// Returns false, touching nothing, when the size is unchanged.
    pub fn resize(&mut self, new_size: ViewportSize) -> bool {
        if self.size == new_size {
            return false;
        }

        *self = Self::new(new_size);
        true
    }

    pub fn clear(&mut self) {
        self.data.fill(T::default());
    }

    pub fn size(&self) -> ViewportSize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&T> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.data.get(x as usize + y as usize * self.size.width as usize)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}
