pub mod hit;
pub mod path;

pub use hit::{Hit, hit_test};
pub use path::{edge_curve, pending_line};

// Re-export the curve types callers receive so they need no direct kurbo dependency.
pub use kurbo::{CubicBez, Line};
