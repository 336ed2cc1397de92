pub mod db;
pub mod entities;
pub mod error;
pub mod services;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;
