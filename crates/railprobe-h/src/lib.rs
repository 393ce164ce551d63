pub mod cdp;
pub mod driver;
pub mod script;

pub use driver::HeadlessDriver;
