//! Retrieval locators for content-addressed fragments.
//!
//! A [`Locator`] is the structured form of a URL-like location string. Two
//! strings that name the same endpoint address parse to equal locators, so
//! mirrors such as `ipfs://Qm..` and `dweb:/ipfs/Qm..` collapse into one.

pub use self::error::{LocatorError, Result};
pub use self::locator::{Endpoint, Locator};

mod error;
mod locator;
