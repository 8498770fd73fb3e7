pub mod warp10;

pub use warp10::Warp10Backend;
