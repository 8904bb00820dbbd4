//! Pure selection logic over fetched posts: related posts and listings.

pub mod listing;
pub mod related;

pub use listing::{
    filter_posts, paginate, Listing, ListingFilter, ListingPage, Pagination, ALL_CATEGORIES, CATEGORIES,
};
pub use related::{
    ContentSelector, LookupError, LookupPhase, RandomTagPicker, TagPicker, DEFAULT_RELATED_LIMIT,
};
