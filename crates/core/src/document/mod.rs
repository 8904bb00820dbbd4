pub mod id;
pub mod model;
pub mod validate;

pub use id::{DocumentId, IdError};
pub use model::Document;
pub use validate::ValidationError;
