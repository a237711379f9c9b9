//! Markup surgery for promptpage.
//!
//! Pages are parsed into an index-addressed [`Document`] by a tolerant parser
//! that keeps whatever structure the author (or the model) wrote. On top of
//! that tree this crate provides:
//! - [`extract_fragment`]: detach the request form, or synthesize one
//! - [`extract_html`]: find the HTML payload in a model response
//! - [`reinsert_fragment`]: graft the form back into the rewritten page
//! - [`page_title`]: read a page title with a full HTML5 parser

mod fragment;
mod graft;
mod parser;
mod response;
mod title;
pub mod tree;

pub use fragment::{Extraction, Fragment, FragmentOrigin, default_fragment, extract_fragment};
pub use graft::{GraftStrategy, Grafted, reinsert_fragment};
pub use response::extract_html;
pub use title::page_title;
pub use tree::{Document, Element, NodeId};
