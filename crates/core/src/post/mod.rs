pub mod ingest;
pub mod model;
pub mod repository;

pub use ingest::{validate_ingest, NewPost};
pub use model::{Author, Post, PostStatus, Seo, POSTS_COLLECTION};
pub use repository::PostRepository;
