use crate::quran::Chapter;
use anyhow::Result;

/// The scrollable verse list a controller keeps in view.
///
/// Both calls may fail while the list is still laying out rows; the
/// controller retries once.
pub trait ListHost: Send {
    fn scroll_to_index(&mut self, index: usize) -> Result<()>;
    fn scroll_to_offset(&mut self, offset: f32) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    /// Top of the list, where the preamble header sits above verse 1.
    Top,
    Row(usize),
}

impl ScrollTarget {
    pub fn for_verse(chapter: &Chapter, verse_id: u32) -> Self {
        if chapter.has_preamble && verse_id == 1 {
            ScrollTarget::Top
        } else {
            ScrollTarget::Row(verse_id.saturating_sub(1) as usize)
        }
    }

    pub fn apply<L: ListHost + ?Sized>(self, host: &mut L) -> Result<()> {
        match self {
            ScrollTarget::Top => host.scroll_to_offset(0.0),
            ScrollTarget::Row(index) => host.scroll_to_index(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(has_preamble: bool) -> Chapter {
        Chapter {
            id: 2,
            name: String::new(),
            transliteration: String::new(),
            translation: String::new(),
            has_preamble,
            verses: Vec::new(),
            verse_timings: Vec::new(),
        }
    }

    #[test]
    fn first_verse_after_preamble_scrolls_to_top() {
        assert_eq!(ScrollTarget::for_verse(&chapter(true), 1), ScrollTarget::Top);
        assert_eq!(ScrollTarget::for_verse(&chapter(false), 1), ScrollTarget::Row(0));
        assert_eq!(ScrollTarget::for_verse(&chapter(true), 5), ScrollTarget::Row(4));
    }
}
