pub mod dispatch;
pub mod follows;
pub mod interactions;
pub mod notifications;

pub use dispatch::*;
pub use follows::*;
pub use interactions::*;
pub use notifications::*;
