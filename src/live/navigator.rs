use crate::models::Song;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Ordered song list with a cursor. Movement saturates at both ends; there
/// is no wrap-around.
#[derive(Debug, Clone, Default)]
pub struct TrackNavigator {
    songs: Vec<Song>,
    index: usize,
}

impl TrackNavigator {
    pub fn new(songs: Vec<Song>) -> Self {
        Self { songs, index: 0 }
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&Song> {
        self.songs.get(self.index)
    }

    /// One-based position and total, e.g. `(3, 12)` for "3 of 12".
    pub fn position(&self) -> Option<(usize, usize)> {
        (!self.is_empty()).then(|| (self.index + 1, self.songs.len()))
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.songs.len()
    }

    /// Move one song in `direction`. Returns `true` only when the cursor
    /// actually moved.
    pub fn step(&mut self, direction: Direction) -> bool {
        match direction {
            Direction::Previous => self.previous(),
            Direction::Next => self.next(),
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }
}
