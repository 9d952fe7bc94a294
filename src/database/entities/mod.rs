pub mod follows;
pub mod likes;
pub mod notifications;
pub mod reviews;
pub mod users;

pub use follows::*;
pub use likes::*;
pub use notifications::*;
pub use reviews::*;
pub use users::*;
