pub mod scheme;

pub use scheme::{KeyedSignatureScheme, Signature, SignatureScheme};
