mod route_table;
pub use self::route_table::*;
