//! Control-number ticket rendering.

mod config;
mod renderer;

pub use config::{ControlNumberImageConfig, fill_template};
pub use renderer::ImageControlNumberRenderer;
