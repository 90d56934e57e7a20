pub mod enums;
pub mod external_reference;
pub mod observable;
pub mod pagination;
pub mod panels;
pub mod platform;
pub mod relationship;

pub use enums::*;
pub use external_reference::*;
pub use observable::*;
pub use pagination::*;
pub use panels::*;
pub use platform::*;
pub use relationship::*;
