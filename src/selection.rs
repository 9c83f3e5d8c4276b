//! The set of pages marked for export.
//!
//! [`Selection`] owns both the chosen pages and the valid range they are
//! drawn from, so "select all" and range checks share one notion of which
//! pages exist. Membership is a set; iteration follows insertion order, which
//! is also the order a conversion run processes pages in.

use crate::config::PageSelection;
use crate::error::Pdf2ImgError;
use std::collections::HashSet;

/// An insertion-ordered, duplicate-free set of 1-indexed page numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    page_count: usize,
    order: Vec<usize>,
    members: HashSet<usize>,
}

impl Selection {
    /// An empty selection over pages `1..=page_count`.
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count,
            ..Self::default()
        }
    }

    /// Number of pages in the valid range (0 when no document is loaded).
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Start over for a newly loaded document.
    pub fn reset(&mut self, page_count: usize) {
        self.clear();
        self.page_count = page_count;
    }

    /// Flip membership of `page`. Returns whether the page is selected
    /// afterwards.
    pub fn toggle(&mut self, page: usize) -> Result<bool, Pdf2ImgError> {
        self.check(page)?;
        if self.members.remove(&page) {
            self.order.retain(|&p| p != page);
            Ok(false)
        } else {
            Ok(self.add(page))
        }
    }

    /// Select every page in the valid range. Pages already selected keep
    /// their position; the rest are appended in ascending order.
    pub fn select_all(&mut self) {
        for page in 1..=self.page_count {
            self.add(page);
        }
    }

    /// Select the pages named by a [`PageSelection`] expression, ignoring
    /// entries outside the valid range. Returns how many were added.
    pub fn apply(&mut self, expr: &PageSelection) -> usize {
        expr.to_pages(self.page_count)
            .into_iter()
            .filter(|&page| self.add(page))
            .count()
    }

    /// Remove every page; the valid range is kept.
    pub fn deselect_all(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Remove every page and forget the valid range (document unloaded).
    pub fn clear(&mut self) {
        self.deselect_all();
        self.page_count = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn contains(&self, page: usize) -> bool {
        self.members.contains(&page)
    }

    /// Selected pages in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied()
    }

    /// Snapshot of the selected pages in insertion order.
    pub fn pages(&self) -> Vec<usize> {
        self.order.clone()
    }

    /// Append `page` unless already present; true if it was added.
    fn add(&mut self, page: usize) -> bool {
        let added = self.members.insert(page);
        if added {
            self.order.push(page);
        }
        added
    }

    fn check(&self, page: usize) -> Result<(), Pdf2ImgError> {
        if page == 0 || page > self.page_count {
            return Err(Pdf2ImgError::PageOutOfRange {
                page,
                total: self.page_count,
            });
        }
        Ok(())
    }
}
