// Recruiter-side interview authoring and the candidate landing page:
// question/feedback generation, the interviews table, share links, and
// the fetch client behind the landing page.

pub mod feedback;
pub mod fetch;
pub mod handlers;
pub mod links;
pub mod prompts;
pub mod questions;
pub mod store;
