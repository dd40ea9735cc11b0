//! Mapping rules: the [`Rule`] model, the target address validator and the
//! [`RuleStore`] that owns the ordered rule collection.

mod rule;
mod store;
mod validate;

pub use rule::{Rule, RuleField, RuleId};
pub use store::RuleStore;
pub use validate::{is_valid_address, validate_target};
