/// Read-only, row-major view over a dense `width × height` field.
pub trait FieldView {
    type Pixel: Copy;

    fn width(&self) -> usize;
    fn height(&self) -> usize;

    fn row(&self, y: usize) -> &[Self::Pixel];

    fn rows(&self) -> Rows<'_, Self>
    where
        Self: Sized,
    {
        Rows { field: self, y: 0 }
    }

    fn len(&self) -> usize {
        self.width() * self.height()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn same_size<O: FieldView>(&self, other: &O) -> bool
    where
        Self: Sized,
    {
        self.width() == other.width() && self.height() == other.height()
    }
}

pub struct Rows<'a, F: ?Sized + FieldView> {
    field: &'a F,
    y: usize,
}

impl<'a, F: FieldView> Iterator for Rows<'a, F> {
    type Item = &'a [F::Pixel];

    fn next(&mut self) -> Option<Self::Item> {
        if self.y >= self.field.height() {
            return None;
        }
        let y = self.y;
        self.y += 1;
        Some(self.field.row(y))
    }
}
