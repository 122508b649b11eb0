use super::{Code, Position};
use once_cell::unsync::OnceCell;

impl<'c> From<&'c str> for Code<'c> {
    fn from(value: &'c str) -> Self {
        Code::new(value)
    }
}

impl<'c> Code<'c> {
    pub fn new(value: &'c str) -> Self {
        Self {
            value,
            line_breaks: OnceCell::new(),
        }
    }

    pub fn obtain_line_breaks(&self) -> &Vec<usize> {
        self.line_breaks.get_or_init(|| {
            self.value
                .bytes()
                .enumerate()
                .filter_map(|(index, b)| if b == b'\n' { Some(index) } else { None })
                .collect()
        })
    }

    /// Obtain the line and column information at the byte position of the input text.
    pub fn obtain_position(&self, pointer: usize) -> Position {
        let line_breaks = self.obtain_line_breaks();
        let index = match line_breaks.binary_search(&pointer) {
            Ok(index) | Err(index) => index,
        };

        if index == 0 {
            Position::new(1, self.value[..pointer].chars().count() + 1)
        } else {
            let break_point = line_breaks[index - 1] + 1;
            Position::new(index + 1, self.value[break_point..pointer].chars().count() + 1)
        }
    }
}
