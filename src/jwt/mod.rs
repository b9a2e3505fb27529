pub mod claims;
pub mod mode;
pub mod params;
pub mod serializer;
pub mod signer;

pub use claims::Claims;
pub use mode::SigningMode;
pub use params::{SignParams, SignParamsBuilder};
pub use serializer::CompactToken;
pub use signer::Signer;
