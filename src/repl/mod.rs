//! Terminal front end: the chat prompt and report rendering

pub mod display;
pub mod input;

pub use display::ChatDisplay;
pub use input::InputHandler;
