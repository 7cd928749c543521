//! Provider and model metadata.
//!
//! # Example
//!
//! ```
//! use tokenscope::models::{Encoding, ModelRegistry, Provider};
//!
//! let registry = ModelRegistry::new();
//!
//! let card = registry.get("gpt-4o").unwrap();
//! assert_eq!(card.provider, Provider::OpenAI);
//! assert_eq!(card.encoding, Some(Encoding::O200kBase));
//! ```

mod card;
mod registry;

pub use card::{Encoding, ModelCard, Provider};
pub use registry::{ModelRegistry, KNOWN_MODELS};
