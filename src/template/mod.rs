//! Notification templates
//!
//! [`TemplateModel`] describes the content of one notification,
//! [`TemplateCompiler`] turns it into the [`ToastDocument`] a transport renders.

pub mod compiler;
pub mod document;
pub mod model;

pub use compiler::{file_uri, TemplateCompiler};
pub use document::{Element, Node, ToastDocument};
pub use model::{AudioOption, Layout, TemplateModel, TextField};
