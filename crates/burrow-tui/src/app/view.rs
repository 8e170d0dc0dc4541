//! Per-view navigation state.
//!
//! A [`View`] is one directory listing with its own selection, scroll
//! position and back-stack. The [`ViewSet`] holds the fixed number of views
//! and which one is active.
//!
//! Scroll state is kept as `selection` (index into the entries) and `pos`
//! (row of the selection inside the list area), so the first visible entry
//! is always `selection - pos`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use burrow_core::{CoreError, Entry, MAX_VIEWS, snapshot};
use itertools::Itertools;
use tracing::{debug, warn};

use crate::event::ChordState;
use crate::render::{Banner, Damage, StatusLine};

/// Rows taken by the header and the status line.
const CHROME_ROWS: usize = 2;

/// One directory listing and its navigation state.
#[derive(Debug)]
pub struct View {
    /// Directory being listed.
    wd: PathBuf,
    /// Snapshot of `wd`, sorted.
    entries: Vec<Entry>,
    selection: usize,
    pos: usize,
    /// Always equal to the number of marked entries.
    marks: usize,
    /// `(pos, selection)` saved on every descent.
    back: Vec<(usize, usize)>,
    banner: Option<Banner>,
    /// Entry to select after the next refresh.
    relocate: Option<OsString>,
    /// Rows available for entries.
    height: usize,
    show_hidden: bool,
    pub(crate) chord: ChordState,
}

impl View {
    /// Create a view of `wd` for a terminal `rows` high. Nothing is read
    /// until the first [`refresh`](Self::refresh).
    pub fn new(wd: impl Into<PathBuf>, rows: u16, show_hidden: bool) -> Self {
        Self {
            wd: wd.into(),
            entries: Vec::new(),
            selection: 0,
            pos: 0,
            marks: 0,
            back: Vec::new(),
            banner: None,
            relocate: None,
            height: list_height(rows),
            show_hidden,
            chord: ChordState::default(),
        }
    }

    pub fn wd(&self) -> &Path {
        &self.wd
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn marks(&self) -> usize {
        self.marks
    }

    /// Index of the first visible entry.
    pub fn top(&self) -> usize {
        self.selection - self.pos
    }

    /// Rows available for entries.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn set_banner(&mut self, banner: Banner) {
        self.banner = Some(banner);
    }

    pub fn clear_banner(&mut self) {
        self.banner = None;
    }

    /// Depth of the back-stack.
    pub fn depth(&self) -> usize {
        self.back.len()
    }

    /// Entry under the selection.
    pub fn current(&self) -> Option<&Entry> {
        self.entries.get(self.selection)
    }

    /// Full path of the entry under the selection.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.current().map(|e| self.wd.join(e.name()))
    }

    /// Full paths of all marked entries, in listing order.
    pub fn marked_paths(&self) -> Vec<PathBuf> {
        self.entries
            .iter()
            .filter(|e| e.marked)
            .map(|e| self.wd.join(e.name()))
            .collect()
    }

    /// Select the entry called `name` after the next refresh.
    pub fn relocate_to(&mut self, name: impl Into<OsString>) {
        self.relocate = Some(name.into());
    }

    pub fn status(&self) -> StatusLine {
        StatusLine {
            position: self.selection,
            total: self.entries.len(),
            marks: self.marks,
        }
    }

    /// Adapt to a new terminal height.
    pub fn resize(&mut self, rows: u16) -> Damage {
        self.height = list_height(rows);
        (self.selection, self.pos) =
            reconcile(self.selection, self.pos, self.entries.len(), self.height);
        Damage::Full
    }

    /// Re-read the working directory.
    ///
    /// A directory that can no longer be listed is left for its parent, with
    /// an error banner, until a readable ancestor is found. Only when not even
    /// the root can be read is the error returned.
    pub fn refresh(&mut self) -> Result<(), CoreError> {
        loop {
            match snapshot(&self.wd, self.show_hidden) {
                Ok(entries) => {
                    self.install(entries);
                    return Ok(());
                }
                Err(err) => {
                    warn!(path = %self.wd.display(), error = %err, "listing failed, moving up");
                    self.banner = Some(Banner::error(err.to_string()));
                    if !self.leave_directory() {
                        return Err(err);
                    }
                }
            }
        }
    }

    fn install(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
        self.marks = 0;
        (self.selection, self.pos) =
            reconcile(self.selection, self.pos, self.entries.len(), self.height);

        if let Some(name) = self.relocate.take() {
            if let Some(index) = self.entries.iter().position(|e| e.name() == name) {
                self.select_index(index);
            }
        }
        debug!(
            path = %self.wd.display(),
            count = self.entries.len(),
            selection = self.selection,
            "refreshed"
        );
    }

    /// Select `index`, keeping the viewport if it is already visible and
    /// centering it otherwise.
    fn select_index(&mut self, index: usize) {
        let top = self.top();
        let top = if (top..top + self.height).contains(&index) {
            top
        } else {
            (index - index.min(self.height / 2)).min(self.entries.len().saturating_sub(self.height))
        };
        self.selection = index;
        self.pos = index - top;
    }

    /// Enter the selected directory. Returns whether the working directory
    /// changed; files and failed descents leave it as it was.
    pub fn descend(&mut self) -> Result<bool, CoreError> {
        let Some(entry) = self.current().filter(|e| e.is_dir_like()) else {
            return Ok(false);
        };
        let name = entry.name().to_os_string();
        let before = self.wd.clone();

        self.back.push((self.pos, self.selection));
        self.wd.push(name);
        self.selection = 0;
        self.pos = 0;
        self.refresh()?;
        Ok(self.wd != before)
    }

    /// Go to the parent directory, selecting the directory just left.
    /// Returns `false` at the root.
    pub fn ascend(&mut self) -> Result<bool, CoreError> {
        if !self.leave_directory() {
            return Ok(false);
        }
        self.refresh()?;
        Ok(true)
    }

    fn leave_directory(&mut self) -> bool {
        let Some(parent) = self.wd.parent().map(Path::to_path_buf) else {
            return false;
        };
        if let Some(name) = self.wd.file_name() {
            self.relocate = Some(name.to_os_string());
        }
        self.wd = parent;
        (self.pos, self.selection) = self.back.pop().unwrap_or((0, 0));
        true
    }

    pub fn move_down(&mut self) -> Damage {
        if self.selection + 1 >= self.entries.len() {
            return Damage::None;
        }
        let old = self.selection;
        self.selection += 1;
        if self.pos + 1 < self.height {
            self.pos += 1;
            Damage::moved(old, self.selection)
        } else {
            Damage::Full
        }
    }

    pub fn move_up(&mut self) -> Damage {
        if self.selection == 0 {
            return Damage::None;
        }
        let old = self.selection;
        self.selection -= 1;
        if self.pos > 0 {
            self.pos -= 1;
            Damage::moved(old, self.selection)
        } else {
            Damage::Full
        }
    }

    /// Show the next page, selecting its first entry.
    pub fn page_down(&mut self) -> Damage {
        let next_top = self.top() + self.height;
        if next_top >= self.entries.len() {
            return Damage::None;
        }
        self.selection = next_top;
        self.pos = 0;
        Damage::Full
    }

    /// Show the previous page, selecting its last entry.
    pub fn page_up(&mut self) -> Damage {
        let top = self.top();
        if top == 0 {
            return Damage::None;
        }
        let new_top = top.saturating_sub(self.height);
        self.selection = (new_top + self.height - 1).min(self.entries.len() - 1);
        self.pos = self.selection - new_top;
        Damage::Full
    }

    pub fn go_top(&mut self) -> Damage {
        if self.selection == 0 {
            return Damage::None;
        }
        let old = self.selection;
        let scrolled = self.top() != 0;
        self.selection = 0;
        self.pos = 0;
        if scrolled {
            Damage::Full
        } else {
            Damage::moved(old, 0)
        }
    }

    pub fn go_bottom(&mut self) -> Damage {
        let Some(last) = self.entries.len().checked_sub(1) else {
            return Damage::None;
        };
        if self.selection == last {
            return Damage::None;
        }
        let old = self.selection;
        let top = self.top();
        self.selection = last;
        if last < top + self.height {
            self.pos = last - top;
            Damage::moved(old, last)
        } else {
            self.pos = (self.height - 1).min(last);
            Damage::Full
        }
    }

    /// Flip the mark on the selected entry.
    pub fn toggle_mark(&mut self) -> Damage {
        let Some(entry) = self.entries.get_mut(self.selection) else {
            return Damage::None;
        };
        entry.marked = !entry.marked;
        if entry.marked {
            self.marks += 1;
        } else {
            self.marks -= 1;
        }
        Damage::Rows(vec![self.selection])
    }

    /// Mark every entry whose path `allowed` accepts.
    pub fn mark_all(&mut self, allowed: impl Fn(&Path) -> bool) -> Damage {
        let wd = &self.wd;
        let newly = self
            .entries
            .iter_mut()
            .filter(|e| !e.marked && allowed(&wd.join(e.name())))
            .update(|e| e.marked = true)
            .count();
        self.marks += newly;
        if newly == 0 { Damage::None } else { Damage::Full }
    }

    pub fn clear_marks(&mut self) -> Damage {
        let rows = self.entries.iter().positions(|e| e.marked).collect_vec();
        if rows.is_empty() {
            return Damage::None;
        }
        self.entries.iter_mut().for_each(|e| e.marked = false);
        self.marks = 0;
        Damage::Rows(rows)
    }

    /// Show or hide dot-files, keeping the selected entry selected.
    pub fn toggle_hidden(&mut self) -> Result<(), CoreError> {
        if let Some(name) = self.current().map(|e| e.name().to_os_string()) {
            self.relocate = Some(name);
        }
        self.show_hidden = !self.show_hidden;
        self.refresh()
    }
}

fn list_height(rows: u16) -> usize {
    (rows as usize).saturating_sub(CHROME_ROWS).max(1)
}

/// Fit `(selection, pos)` to a listing of `count` entries shown `height`
/// rows at a time.
///
/// The selection only ever moves down to the last entry, taking `pos` with
/// it, and the viewport is pulled down when the last page would otherwise
/// end in blank rows.
pub(crate) fn reconcile(selection: usize, pos: usize, count: usize, height: usize) -> (usize, usize) {
    if count == 0 {
        return (0, 0);
    }
    let height = height.max(1);
    let mut selection = selection;
    let mut pos = pos.min(selection);

    if selection >= count {
        let excess = selection - (count - 1);
        selection = count - 1;
        pos = pos.saturating_sub(excess);
    }
    pos = pos.min(height - 1);

    let top = (selection - pos).min(count.saturating_sub(height));
    (selection, selection - top)
}

/// The fixed set of views and which one is active.
#[derive(Debug)]
pub struct ViewSet {
    views: Vec<View>,
    active: usize,
}

impl ViewSet {
    /// `count` views, all starting at `wd`.
    pub fn new(count: usize, wd: &Path, rows: u16, show_hidden: bool) -> Self {
        let views = (0..count.clamp(1, MAX_VIEWS))
            .map(|_| View::new(wd, rows, show_hidden))
            .collect();
        Self { views, active: 0 }
    }

    pub fn active(&self) -> &View {
        &self.views[self.active]
    }

    pub fn active_mut(&mut self) -> &mut View {
        &mut self.views[self.active]
    }

    pub fn index(&self) -> usize {
        self.active
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&View> {
        self.views.get(index)
    }

    /// Make view `index` active and refresh it. Other views are untouched.
    /// Returns `false` for an out of range or already active index.
    pub fn switch(&mut self, index: usize) -> Result<bool, CoreError> {
        if index >= self.views.len() || index == self.active {
            return Ok(false);
        }
        debug!(from = self.active, to = index, "switching view");
        self.active = index;
        self.views[index].refresh()?;
        Ok(true)
    }

    /// Switch to the following view, wrapping around.
    pub fn next(&mut self) -> Result<bool, CoreError> {
        self.switch((self.active + 1) % self.views.len())
    }

    /// Switch to the preceding view, wrapping around.
    pub fn prev(&mut self) -> Result<bool, CoreError> {
        let len = self.views.len();
        self.switch((self.active + len - 1) % len)
    }

    pub fn resize(&mut self, rows: u16) {
        for view in &mut self.views {
            view.resize(rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// A directory with `count` files named f00, f01, ...
    fn populated(count: usize) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..count {
            fs::write(dir.path().join(format!("f{i:02}")), "").unwrap();
        }
        dir
    }

    fn view_of(dir: &Path, rows: u16) -> View {
        let mut view = View::new(dir, rows, false);
        view.refresh().unwrap();
        view
    }

    fn check_invariants(view: &View) {
        let count = view.entries().len();
        if count == 0 {
            assert_eq!((view.selection(), view.pos()), (0, 0));
        } else {
            assert!(view.selection() < count);
        }
        assert!(view.pos() <= view.selection());
        assert!(view.pos() < view.height());
        assert_eq!(view.marks(), view.entries().iter().filter(|e| e.marked).count());
    }

    #[test]
    fn test_reconcile_table() {
        // (selection, pos, count, height) -> (selection, pos)
        let cases = [
            ((5, 2, 0, 10), (0, 0)),
            ((3, 1, 10, 5), (3, 1)),
            ((9, 4, 9, 5), (8, 4)),
            ((7, 2, 9, 5), (7, 3)),
            ((2, 2, 3, 10), (2, 2)),
            ((6, 0, 3, 10), (2, 2)),
            ((8, 7, 20, 4), (8, 3)),
            ((5, 9, 20, 10), (5, 5)),
            ((0, 0, 1, 1), (0, 0)),
            ((4, 0, 5, 1), (4, 0)),
        ];
        for ((sel, pos, count, height), expected) in cases {
            assert_eq!(
                reconcile(sel, pos, count, height),
                expected,
                "reconcile({sel}, {pos}, {count}, {height})"
            );
        }
    }

    #[test]
    fn test_move_bounds() {
        let dir = populated(3);
        let mut view = view_of(dir.path(), 10);

        assert!(view.move_up().is_none());
        assert_eq!(view.selection(), 0);

        assert_eq!(view.move_down(), Damage::Rows(vec![0, 1]));
        view.move_down();
        assert!(view.move_down().is_none());
        assert_eq!(view.selection(), 2);
        check_invariants(&view);
    }

    #[test]
    fn test_move_scrolls_at_bottom_row() {
        let dir = populated(10);
        // 6 rows leave 4 for entries.
        let mut view = view_of(dir.path(), 6);

        for _ in 0..3 {
            view.move_down();
        }
        assert_eq!((view.selection(), view.pos()), (3, 3));
        assert_eq!(view.move_down(), Damage::Full);
        assert_eq!((view.selection(), view.pos()), (4, 3));
        assert_eq!(view.top(), 1);

        view.go_top();
        assert_eq!((view.selection(), view.pos()), (0, 0));
        check_invariants(&view);
    }

    #[test]
    fn test_empty_directory_navigation() {
        let dir = populated(0);
        let mut view = view_of(dir.path(), 10);

        assert!(view.move_down().is_none());
        assert!(view.move_up().is_none());
        assert!(view.page_down().is_none());
        assert!(view.page_up().is_none());
        assert!(view.go_bottom().is_none());
        assert!(view.toggle_mark().is_none());
        check_invariants(&view);
    }

    #[test]
    fn test_page_down_and_up() {
        let dir = populated(10);
        let mut view = view_of(dir.path(), 6);

        assert_eq!(view.page_down(), Damage::Full);
        assert_eq!((view.selection(), view.pos()), (4, 0));
        view.page_down();
        assert_eq!((view.selection(), view.pos()), (8, 0));

        view.page_up();
        assert_eq!((view.selection(), view.top()), (7, 4));
        view.page_up();
        assert_eq!((view.selection(), view.top()), (3, 0));
        assert!(view.page_up().is_none());
        check_invariants(&view);
    }

    #[test]
    fn test_page_down_on_last_page_is_noop() {
        let dir = populated(10);
        let mut view = view_of(dir.path(), 6);
        view.go_bottom();
        let before = (view.selection(), view.pos());

        assert!(view.page_down().is_none());
        assert_eq!((view.selection(), view.pos()), before);

        let dir = populated(3);
        let mut view = view_of(dir.path(), 10);
        assert!(view.page_down().is_none());
        assert_eq!((view.selection(), view.pos()), (0, 0));
    }

    #[test]
    fn test_go_bottom() {
        let dir = populated(10);
        let mut view = view_of(dir.path(), 6);

        assert_eq!(view.go_bottom(), Damage::Full);
        assert_eq!((view.selection(), view.pos()), (9, 3));
        assert!(view.go_bottom().is_none());

        let dir = populated(3);
        let mut view = view_of(dir.path(), 10);
        assert_eq!(view.go_bottom(), Damage::Rows(vec![0, 2]));
        assert_eq!((view.selection(), view.pos()), (2, 2));
    }

    #[test]
    fn test_marks_track_toggles() {
        let dir = populated(5);
        let mut view = view_of(dir.path(), 10);

        for step in [0, 1, 0, 2, 2, 3, 0, 4] {
            while view.selection() < step {
                view.move_down();
            }
            while view.selection() > step {
                view.move_up();
            }
            view.toggle_mark();
            check_invariants(&view);
        }
        assert_eq!(view.marks(), 4);

        view.clear_marks();
        check_invariants(&view);
        assert_eq!(view.marks(), 0);

        view.mark_all(|p| !p.ends_with("f02"));
        assert_eq!(view.marks(), 4);
        assert_eq!(view.marked_paths().len(), 4);
        check_invariants(&view);
    }

    #[test]
    fn test_refresh_resets_marks() {
        let dir = populated(3);
        let mut view = view_of(dir.path(), 10);
        view.toggle_mark();
        view.refresh().unwrap();
        assert_eq!(view.marks(), 0);
        check_invariants(&view);
    }

    #[test]
    fn test_descend_ascend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a", "b", "c", "d"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("c/inner"), "").unwrap();
        let mut view = view_of(dir.path(), 4);

        view.move_down();
        view.move_down();
        let before = (view.pos(), view.selection());
        assert_eq!(before, (1, 2));

        assert!(view.descend().unwrap());
        assert_eq!(view.wd(), dir.path().join("c"));
        assert_eq!((view.pos(), view.selection()), (0, 0));
        assert_eq!(view.depth(), 1);

        assert!(view.ascend().unwrap());
        assert_eq!(view.wd(), dir.path());
        assert_eq!((view.pos(), view.selection()), before);
        assert_eq!(view.depth(), 0);
    }

    #[test]
    fn test_ascend_without_history_selects_left_directory() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a", "b", "c"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        let mut view = view_of(&dir.path().join("c"), 10);

        assert!(view.ascend().unwrap());
        assert_eq!(view.current().unwrap().display_name(), "c");
    }

    #[test]
    fn test_ascend_at_root() {
        let mut view = View::new("/", 10, false);
        view.refresh().unwrap();
        assert!(!view.ascend().unwrap());
        assert_eq!(view.wd(), Path::new("/"));
    }

    #[test]
    fn test_descend_into_file_is_noop() {
        let dir = populated(1);
        let mut view = view_of(dir.path(), 10);
        assert!(!view.descend().unwrap());
        assert_eq!(view.wd(), dir.path());
        assert_eq!(view.depth(), 0);
    }

    #[test]
    fn test_refresh_of_removed_directory_moves_up() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("gone/deeper")).unwrap();
        let mut view = view_of(dir.path(), 10);
        view.descend().unwrap();
        view.descend().unwrap();
        assert_eq!(view.wd(), dir.path().join("gone/deeper"));

        fs::remove_dir_all(dir.path().join("gone")).unwrap();
        view.refresh().unwrap();

        assert_eq!(view.wd(), dir.path());
        assert!(view.banner().is_some());
        assert_eq!(view.depth(), 0);
        check_invariants(&view);
    }

    #[test]
    fn test_refresh_after_deletion_keeps_selection_valid() {
        let dir = populated(10);
        let mut view = view_of(dir.path(), 6);
        view.go_bottom();

        fs::remove_file(dir.path().join("f09")).unwrap();
        fs::remove_file(dir.path().join("f08")).unwrap();
        view.refresh().unwrap();

        assert_eq!(view.selection(), 7);
        assert_eq!(view.top() + view.height(), 8);
        check_invariants(&view);
    }

    #[test]
    fn test_relocate_selects_new_entry() {
        let dir = populated(30);
        let mut view = view_of(dir.path(), 12);

        fs::write(dir.path().join("f25-new"), "").unwrap();
        view.relocate_to("f25-new");
        view.refresh().unwrap();

        assert_eq!(view.current().unwrap().display_name(), "f25-new");
        check_invariants(&view);
        // Off-screen targets are centered.
        assert_eq!(view.pos(), view.height() / 2);
    }

    #[test]
    fn test_toggle_hidden_keeps_selection() {
        let dir = populated(3);
        fs::write(dir.path().join(".dot"), "").unwrap();
        let mut view = view_of(dir.path(), 10);
        view.move_down();

        view.toggle_hidden().unwrap();
        assert!(view.show_hidden());
        assert_eq!(view.entries().len(), 4);
        assert_eq!(view.current().unwrap().display_name(), "f01");
    }

    #[test]
    fn test_view_set_switch() {
        let dir = populated(3);
        let mut views = ViewSet::new(2, dir.path(), 10, false);
        views.active_mut().refresh().unwrap();
        views.active_mut().move_down();

        assert!(views.switch(1).unwrap());
        assert_eq!(views.index(), 1);
        assert_eq!(views.active().selection(), 0);
        assert_eq!(views.active().entries().len(), 3);
        assert_eq!(views.get(0).unwrap().selection(), 1);

        assert!(!views.switch(1).unwrap());
        assert!(!views.switch(5).unwrap());
        assert!(views.next().unwrap());
        assert_eq!(views.index(), 0);
    }

    #[test]
    fn test_view_set_prev_wraps() {
        let dir = populated(1);
        let mut views = ViewSet::new(3, dir.path(), 10, false);

        assert!(views.prev().unwrap());
        assert_eq!(views.index(), 2);
        assert!(views.prev().unwrap());
        assert_eq!(views.index(), 1);
    }
}
