pub mod advance;
pub mod boundary;
pub mod detect;
pub mod emergency;
pub mod error;
pub mod evaluate;
pub mod io;
pub mod lock;
pub mod paths;
pub mod rules;
pub mod state;
pub mod store;
pub mod types;

pub use error::{CadenceError, Result};
