//! Demo discovery and design-token integration for cem.
//!
//! Matches demo HTML files to custom elements (microdata, URL-pattern
//! parameters, content scanning), generates canonical demo URLs through
//! the URL-template mini-language, and enriches CSS custom properties with
//! DTCG token metadata.

pub mod discovery;
pub mod microdata;
pub mod tokens;
pub mod url_pattern;
pub mod url_template;

pub use discovery::{attach_demos, discover, DemoMap};
pub use microdata::{is_custom_element_tag, DemoDoc};
pub use tokens::DesignTokens;
pub use url_pattern::UrlPattern;
pub use url_template::UrlTemplate;
