//! Built-in processors for the common syntax-corruption codes.

mod duplicate_keyword;
mod missing_comma;
mod redundant_await;
mod stray_separator;

pub use duplicate_keyword::DuplicateKeyword;
pub use missing_comma::MissingComma;
pub use redundant_await::RedundantAwait;
pub use stray_separator::StraySeparator;

use super::ProcessorRegistry;

/// Registers every built-in processor into `registry`.
pub fn register_all(registry: &mut ProcessorRegistry) {
    registry.register(MissingComma::CODE, || Box::new(MissingComma));
    registry.register(StraySeparator::CODE, || Box::new(StraySeparator));
    registry.register(DuplicateKeyword::CODE, || Box::new(DuplicateKeyword));
    registry.register(RedundantAwait::CODE, || Box::new(RedundantAwait));
}
