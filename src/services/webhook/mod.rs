pub mod types;
pub mod signature;
pub mod delivery;
pub mod dispatcher;

pub use types::*;
pub use signature::*;
pub use delivery::*;
pub use dispatcher::*;
