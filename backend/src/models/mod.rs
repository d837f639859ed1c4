pub mod diagnostics;
pub mod raw;
pub mod record;
pub mod result_set;
pub mod time;


pub use diagnostics::*;
pub use raw::*;
pub use record::*;
pub use result_set::*;
pub use time::*;
