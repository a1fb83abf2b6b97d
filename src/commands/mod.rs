mod add;
mod init;
mod list;
mod notes;
mod remove;

pub use add::{add, parse_alias};
pub use init::init;
pub use list::list;
pub use notes::notes;
pub use remove::remove;
