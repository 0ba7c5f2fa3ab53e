/// The four record tabs, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Tab {
    Students,
    Instructors,
    Courses,
    Registrations,
}

impl Tab {
    pub(crate) const ALL: [Tab; 4] = [
        Tab::Students,
        Tab::Instructors,
        Tab::Courses,
        Tab::Registrations,
    ];

    pub(crate) fn title(self) -> &'static str {
        match self {
            Tab::Students => "Students",
            Tab::Instructors => "Instructors",
            Tab::Courses => "Courses",
            Tab::Registrations => "Registrations",
        }
    }

    pub(crate) fn index(self) -> usize {
        Tab::ALL.iter().position(|tab| *tab == self).unwrap_or(0)
    }

    pub(crate) fn from_digit(ch: char) -> Option<Tab> {
        let index = ch.to_digit(10)?.checked_sub(1)?;
        Tab::ALL.get(index as usize).copied()
    }

    pub(crate) fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub(crate) fn prev(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// Rows shown in one tab plus the active filter and selection. The rows are
/// already filtered by the record store's search queries.
pub(crate) struct ListScreen<T> {
    pub(crate) items: Vec<T>,
    pub(crate) filter: Option<String>,
    pub(crate) selected: usize,
}

impl<T> ListScreen<T> {
    pub(crate) fn new(items: Vec<T>) -> Self {
        Self {
            items,
            filter: None,
            selected: 0,
        }
    }

    pub(crate) fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter.filter(|f| !f.trim().is_empty());
    }

    /// Replace the rows, keeping the selection in bounds.
    pub(crate) fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.ensure_in_bounds();
    }

    pub(crate) fn current(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.items.is_empty() {
            return;
        }
        let last = self.items.len() - 1;
        self.selected = self.selected.saturating_add_signed(offset).min(last);
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }

    /// Focus the first row matching `predicate`; returns whether one did.
    pub(crate) fn select_where(&mut self, predicate: impl Fn(&T) -> bool) -> bool {
        match self.items.iter().position(predicate) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }

    pub(crate) fn ensure_in_bounds(&mut self) {
        if self.items.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.items.len() {
            self.selected = self.items.len() - 1;
        }
    }
}
