//! Operation translators.
//!
//! Binary and unary operators are enumerated kinds with one `match` each;
//! member functions dispatch by name into the string library or the array
//! library. The string/array split mirrors the host language: a function
//! name decides which library is consulted, the receiver's sort decides
//! whether the call is modellable.

pub mod arrays;
pub mod binary;
pub mod strings;
pub mod unary;
