//! Domain layer for the VBC.ai blog: documents and their stores, posts,
//! related-post selection, listing filters, leads, the admin credential
//! and the sitemap.

pub mod admin;
pub mod content;
pub mod document;
pub mod lead;
pub mod post;
pub mod sitemap;
pub mod store;
