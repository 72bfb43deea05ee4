// Report synthesis and rendering

pub mod narrative;
pub mod report;
pub mod templates;

pub use narrative::*;
pub use report::*;
pub use templates::*;
