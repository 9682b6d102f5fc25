mod brush;
mod layer;
mod mask;
mod selection;
mod tool;

pub use brush::*;
pub use layer::*;
pub use mask::*;
pub use selection::*;
pub use tool::*;
