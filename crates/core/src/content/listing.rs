//! Search, category filtering and "load more" pagination for post listings.
//!
//! Everything here is pure: callers fetch the posts, this module narrows
//! them down and decides how many are shown.

use crate::post::Post;

/// Category sentinel that disables category filtering.
pub const ALL_CATEGORIES: &str = "All";

/// Categories offered by the listing page, in display order.
pub const CATEGORIES: [&str; 6] = [
    ALL_CATEGORIES,
    "Population Health",
    "Care Management",
    "Analytics",
    "Value-Based Care",
    "Clinical Quality",
];

/// A text query plus a category, ANDed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFilter {
    needle: String,
    category: String,
}

impl Default for ListingFilter {
    fn default() -> Self {
        Self::new("", ALL_CATEGORIES)
    }
}

impl ListingFilter {
    /// A whitespace-only query matches everything; any other query is used
    /// as typed, surrounding spaces included.
    pub fn new(query: &str, category: &str) -> Self {
        let needle = if query.trim().is_empty() {
            String::new()
        } else {
            query.to_lowercase()
        };
        Self {
            needle,
            category: category.to_string(),
        }
    }

    /// Case-insensitive substring match on title, excerpt or any tag; exact
    /// match on category unless it is [`ALL_CATEGORIES`].
    pub fn matches(&self, post: &Post) -> bool {
        self.matches_category(post) && self.matches_text(post)
    }

    fn matches_category(&self, post: &Post) -> bool {
        self.category == ALL_CATEGORIES || post.category == self.category
    }

    fn matches_text(&self, post: &Post) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        let hit = |text: &str| text.to_lowercase().contains(&self.needle);
        hit(&post.title) || hit(&post.excerpt) || post.tags.iter().any(|tag| hit(tag))
    }

    /// Matching posts in input order.
    pub fn apply<'p, I>(&self, posts: I) -> Vec<&'p Post>
    where
        I: IntoIterator<Item = &'p Post>,
    {
        posts.into_iter().filter(|post| self.matches(post)).collect()
    }
}

pub fn filter_posts<'p>(posts: &'p [Post], query: &str, category: &str) -> Vec<&'p Post> {
    ListingFilter::new(query, category).apply(posts)
}

/// How many items of a list are shown, growing by a fixed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    initial: usize,
    increment: usize,
    visible_count: usize,
}

impl Pagination {
    /// Blog listing page: 9 posts, then 6 more per click.
    pub const LISTING: Pagination = Pagination::new(9, 6);
    /// Home page grid below the featured post.
    pub const HOME_GRID: Pagination = Pagination::new(4, 3);

    pub const fn new(initial: usize, increment: usize) -> Self {
        Self {
            initial,
            increment,
            visible_count: initial,
        }
    }

    /// Start from a caller-supplied count, never below the initial size.
    pub fn with_visible(mut self, visible_count: usize) -> Self {
        self.visible_count = visible_count.max(self.initial);
        self
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    pub fn page_increment(&self) -> usize {
        self.increment
    }

    pub fn load_more(&mut self) {
        self.visible_count = self.visible_count.saturating_add(self.increment);
    }

    pub fn reset(&mut self) {
        self.visible_count = self.initial;
    }

    pub fn visible<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..items.len().min(self.visible_count)]
    }

    pub fn has_more(&self, total: usize) -> bool {
        total > self.visible_count
    }
}

/// One rendered page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage<'p> {
    pub posts: Vec<&'p Post>,
    pub total: usize,
    pub visible_count: usize,
    pub has_more: bool,
}

/// Listing state across interactions. Changing the query or the category
/// starts pagination over.
#[derive(Debug, Clone)]
pub struct Listing {
    posts: Vec<Post>,
    query: String,
    category: String,
    pagination: Pagination,
}

impl Listing {
    pub fn new(posts: Vec<Post>, pagination: Pagination) -> Self {
        Self {
            posts,
            query: String::new(),
            category: ALL_CATEGORIES.to_string(),
            pagination,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn set_query(&mut self, query: &str) {
        if self.query != query {
            self.query = query.to_string();
            self.pagination.reset();
        }
    }

    pub fn set_category(&mut self, category: &str) {
        if self.category != category {
            self.category = category.to_string();
            self.pagination.reset();
        }
    }

    pub fn load_more(&mut self) {
        self.pagination.load_more();
    }

    pub fn page(&self) -> ListingPage<'_> {
        let filtered = filter_posts(&self.posts, &self.query, &self.category);
        paginate(&filtered, &self.pagination)
    }
}

/// Cut an already filtered list down to the visible page.
pub fn paginate<'p>(filtered: &[&'p Post], pagination: &Pagination) -> ListingPage<'p> {
    ListingPage {
        posts: pagination.visible(filtered).to_vec(),
        total: filtered.len(),
        visible_count: pagination.visible_count(),
        has_more: pagination.has_more(filtered.len()),
    }
}
