mod perspective;
pub use perspective::*;
