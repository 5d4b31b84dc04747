use std::collections::BTreeSet;

use ratatui::layout::Rect;

use crate::model::file::FileRecord;

/// Multi-selection over listing indices.
///
/// The cursor is independent of the selection: moving it does not change
/// what is selected. When nothing is selected, operations act on the entry
/// under the cursor (see [`Selection::effective`]).
#[derive(Debug, Clone, Default)]
pub struct Selection {
    selected: BTreeSet<usize>,
    /// Selection that a shift-range is layered on top of.
    base: BTreeSet<usize>,
    anchor: Option<usize>,
    cursor: usize,
    marquee: Option<Marquee>,
}

/// Rubber-band rectangle being dragged over the listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Marquee {
    pub origin: (u16, u16),
    pub current: (u16, u16),
    additive: bool,
    base: BTreeSet<usize>,
    moved: bool,
}

impl Marquee {
    /// Screen rectangle spanned by the drag, inclusive of both corners.
    pub fn rect(&self) -> Rect {
        let (x0, y0) = self.origin;
        let (x1, y1) = self.current;
        Rect::new(
            x0.min(x1),
            y0.min(y1),
            x0.abs_diff(x1) + 1,
            y0.abs_diff(y1) + 1,
        )
    }

    pub fn moved(&self) -> bool {
        self.moved
    }
}

impl Selection {
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    #[cfg(test)]
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }

    /// Selected indices, or the cursor alone when nothing is selected.
    pub fn effective(&self, len: usize) -> Vec<usize> {
        if self.selected.is_empty() {
            if self.cursor < len {
                vec![self.cursor]
            } else {
                Vec::new()
            }
        } else {
            self.selected.iter().copied().filter(|i| *i < len).collect()
        }
    }

    pub fn marquee(&self) -> Option<&Marquee> {
        self.marquee.as_ref()
    }

    pub fn set_cursor(&mut self, index: usize, len: usize) {
        self.cursor = index.min(len.saturating_sub(1));
    }

    pub fn move_cursor(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = (self.cursor as isize + delta).clamp(0, len as isize - 1);
        self.cursor = next as usize;
    }

    /// Plain click: select only `index`.
    pub fn click(&mut self, index: usize) {
        self.selected.clear();
        self.selected.insert(index);
        self.base.clear();
        self.anchor = Some(index);
        self.cursor = index;
    }

    /// Ctrl-click / space: flip `index` and make it the anchor.
    pub fn toggle(&mut self, index: usize) {
        if !self.selected.remove(&index) {
            self.selected.insert(index);
        }
        self.base = self.selected.clone();
        self.anchor = Some(index);
        self.cursor = index;
    }

    /// Shift-click / shift-arrow: select the range from the anchor to
    /// `index`, replacing the previous range but keeping the base.
    pub fn extend_to(&mut self, index: usize) {
        let anchor = *self.anchor.get_or_insert(self.cursor);
        let (lo, hi) = if anchor <= index {
            (anchor, index)
        } else {
            (index, anchor)
        };
        self.selected = self.base.clone();
        self.selected.extend(lo..=hi);
        self.cursor = index;
    }

    pub fn select_all(&mut self, len: usize) {
        self.selected = (0..len).collect();
        self.base = self.selected.clone();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.base.clear();
        self.anchor = None;
        self.marquee = None;
    }

    /// Reset for a freshly opened directory.
    pub fn reset(&mut self) {
        self.clear();
        self.cursor = 0;
    }

    /// Paths of the selected records, for re-mapping after a reload.
    pub fn selected_paths(&self, records: &[FileRecord]) -> Vec<String> {
        self.selected
            .iter()
            .filter_map(|i| records.get(*i))
            .map(|r| r.path.clone())
            .collect()
    }

    /// Re-map a remembered selection onto a new listing. Entries that
    /// vanished are dropped; the cursor follows its path when possible.
    pub fn restore(&mut self, paths: &[String], cursor_path: Option<&str>, records: &[FileRecord]) {
        let old_cursor = self.cursor;
        self.clear();
        for (i, rec) in records.iter().enumerate() {
            if paths.iter().any(|p| *p == rec.path) {
                self.selected.insert(i);
            }
        }
        self.base = self.selected.clone();
        self.cursor = cursor_path
            .and_then(|p| records.iter().position(|r| r.path == p))
            .unwrap_or_else(|| old_cursor.min(records.len().saturating_sub(1)));
    }

    // --- Marquee ---

    /// Start a potential drag at `point`. With `additive` the existing
    /// selection is kept underneath the marquee.
    pub fn begin_marquee(&mut self, point: (u16, u16), additive: bool) {
        let base = if additive {
            self.selected.clone()
        } else {
            BTreeSet::new()
        };
        self.marquee = Some(Marquee {
            origin: point,
            current: point,
            additive,
            base,
            moved: false,
        });
    }

    /// Move the marquee corner and recompute the selection from the rows it
    /// intersects. `rows` pairs listing indices with their screen areas.
    pub fn update_marquee(&mut self, point: (u16, u16), rows: &[(usize, Rect)]) {
        let Some(marquee) = self.marquee.as_mut() else {
            return;
        };
        marquee.current = point;
        if point != marquee.origin {
            marquee.moved = true;
        }
        if !marquee.moved {
            return;
        }
        let area = marquee.rect();
        let hits = marquee_hits(area, rows);
        let mut selected = marquee.base.clone();
        selected.extend(hits.iter().copied());

        if let Some((idx, _)) = rows
            .iter()
            .find(|(idx, r)| hits.contains(idx) && r.y == point.1)
        {
            self.cursor = *idx;
        }
        self.selected = selected;
    }

    /// Finish the drag. Returns false when the pointer never moved, which
    /// callers treat as a plain click.
    pub fn end_marquee(&mut self) -> bool {
        let Some(marquee) = self.marquee.take() else {
            return false;
        };
        if marquee.moved {
            self.base = self.selected.clone();
            if !marquee.additive {
                self.anchor = Some(self.cursor);
            }
        }
        marquee.moved
    }

    pub fn cancel_marquee(&mut self) {
        if let Some(marquee) = self.marquee.take() {
            if marquee.moved {
                self.selected = marquee.base;
            }
        }
    }
}

/// Indices of the rows whose areas intersect `area`.
pub fn marquee_hits(area: Rect, rows: &[(usize, Rect)]) -> Vec<usize> {
    rows.iter()
        .filter(|(_, r)| r.intersects(area))
        .map(|(i, _)| *i)
        .collect()
}
