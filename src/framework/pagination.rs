// Pagination - slices newest-first listings into fixed-size pages
//
// Page numbers come from the query string and are never trusted: anything
// that is not an integer means page 1, anything outside 1..=num_pages means
// the last page.

use serde::{Deserialize, Serialize};

pub const POSTS_PER_PAGE: usize = 10;

/// `?page=` query parameter, kept raw so malformed values can fall back
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Requested page number before clamping; malformed or missing means 1
    pub fn requested(&self) -> i64 {
        parse_page_number(self.page.as_deref())
    }
}

/// Integers too large for `i64` saturate, so they still land on the last page
pub fn parse_page_number(raw: Option<&str>) -> i64 {
    let Some(value) = raw.map(str::trim) else {
        return 1;
    };
    if let Ok(number) = value.parse::<i64>() {
        return number;
    }

    let (negative, digits) = match value.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        1
    } else if negative {
        i64::MIN
    } else {
        i64::MAX
    }
}

/// Page arithmetic over a result set of `count` items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: usize,
}

impl Paginator {
    pub fn new(count: u64) -> Self {
        Self::with_per_page(count, POSTS_PER_PAGE)
    }

    pub fn with_per_page(count: u64, per_page: usize) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Always at least 1: an empty result set still has an (empty) first page
    pub fn num_pages(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page as u64)
        }
    }

    /// Resolve an untrusted page number to a valid one
    pub fn page_number(&self, requested: i64) -> u64 {
        let num_pages = self.num_pages();
        if requested >= 1 && (requested as u64) <= num_pages {
            requested as u64
        } else {
            num_pages
        }
    }

    /// Offset of the first item on a valid page
    pub fn offset(&self, number: u64) -> u64 {
        (number.max(1) - 1) * self.per_page as u64
    }

    pub fn limit(&self) -> u64 {
        self.per_page as u64
    }
}

/// One window of a listing plus navigation metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u64>,
    pub previous_page_number: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, number: u64, paginator: &Paginator) -> Self {
        let num_pages = paginator.num_pages();
        let has_next = number < num_pages;
        let has_previous = number > 1;

        Self {
            items,
            number,
            num_pages,
            count: paginator.count(),
            has_next,
            has_previous,
            next_page_number: has_next.then(|| number + 1),
            previous_page_number: has_previous.then(|| number - 1),
        }
    }
}
