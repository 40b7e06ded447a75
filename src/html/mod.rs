//! HTML rendering: a small node tree, link forms and the page shell

pub mod form;
pub mod node;
pub mod page;

pub use form::link_node;
pub use node::{Node, RenderContext};
pub use page::{HeadCallback, render_page};
