pub mod window;

pub use window::WindowId;
