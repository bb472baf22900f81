//! Record validation
//!
//! A validator is an explicit value injected into each store at
//! construction and replaceable with `set_validator`. The usual validator
//! is a `CompositeValidator` assembled by `ValidatorBuilder` from a
//! `RuleSet`, one independent check per field.
//!
//! Two rule sets exist: `default` and `custom`. Both have built-in
//! thresholds and can be overridden from a JSON rules file.

mod builder;
mod errors;
mod rules;
mod validator;

pub use builder::ValidatorBuilder;
pub use errors::{RulesError, RulesResult, ValidationFailure};
pub use rules::{DateRule, RangeRule, RuleKind, RuleSet, ValidationRules};
pub use validator::{
    CompositeValidator, DateOfBirthValidator, HeightValidator, IncomeValidator, NameValidator,
    PatronymicLetterValidator, Validator,
};
