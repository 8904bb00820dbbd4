pub mod model;
pub mod repository;

pub use model::{decode_form, ContactForm, DemoForm, Lead, LeadSource, SubscribeForm, LEADS_COLLECTION};
pub use repository::LeadRepository;
