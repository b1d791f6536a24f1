//! CLI command implementations.

pub(crate) mod check_href;
pub(crate) mod render;

pub(crate) use check_href::CheckHrefArgs;
pub(crate) use render::RenderArgs;
