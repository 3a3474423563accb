// Each module handles one CLI subcommand family; main.rs stays focused on
// parsing and dispatch.

pub mod commander;
pub mod distance;
pub mod info;
pub mod locate;
pub mod poi;
pub mod radius;
pub mod register;
pub mod travel;
