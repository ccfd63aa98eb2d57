mod coordinator;
mod error;
mod fetch;
mod geocode;
mod loader;
mod map_view;
mod math;
mod overlay;
mod routing;
mod style;
mod viewport;

pub use coordinator::*;
pub use error::*;
pub use fetch::*;
pub use geocode::*;
pub use loader::*;
pub use map_view::*;
pub use math::*;
pub use overlay::*;
pub use routing::*;
pub use style::*;
pub use viewport::*;
