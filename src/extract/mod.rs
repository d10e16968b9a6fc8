//! Turning a finished run into a single rendered payload.
//!
//! [`select`] picks which entry to surface, [`normalize`] reduces its
//! content to text using [`fence`] and [`html`], and [`classify`] labels the
//! result.

pub mod classify;
pub mod fence;
pub mod html;
pub mod normalize;
pub mod select;

pub use classify::{MediaType, classify};
pub use fence::extract_code_fence;
pub use html::extract_raw_html;
pub use normalize::normalize;
pub use select::select_content;
