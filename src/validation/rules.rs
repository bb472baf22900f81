//! Validation rule thresholds
//!
//! Rules file format (JSON), either set may be omitted to keep the
//! built-in values:
//!
//! ```text
//! {
//!   "default": {
//!     "first_name": { "min": 2, "max": 60 },
//!     "last_name": { "min": 2, "max": 60 },
//!     "date_of_birth": { "from": "1950-01-01" },
//!     "height": { "min": 50, "max": 250 },
//!     "income": { "min": "0", "max": "1000000" },
//!     "patronymic_letter": { "min": "A", "max": "Z" }
//!   },
//!   "custom": { ... }
//! }
//! ```
//!
//! A missing `date_of_birth.to` means "today".

use std::fs;
use std::path::Path;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::builder::ValidatorBuilder;
use super::errors::{RulesError, RulesResult};
use super::validator::CompositeValidator;
use crate::record::Income;

/// Which rule set to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Default,
    Custom,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Default => "default",
            RuleKind::Custom => "custom",
        }
    }
}

/// Inclusive `min..=max` range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeRule<T> {
    pub min: T,
    pub max: T,
}

impl<T> RangeRule<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

/// Inclusive date range, open-ended at "today" when `to` is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRule {
    pub from: NaiveDate,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

/// Thresholds for every record field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub first_name: RangeRule<usize>,
    pub last_name: RangeRule<usize>,
    pub date_of_birth: DateRule,
    pub height: RangeRule<i16>,
    pub income: RangeRule<Income>,
    pub patronymic_letter: RangeRule<char>,
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

impl RuleSet {
    /// Built-in `default` thresholds
    pub fn builtin_default() -> Self {
        Self {
            first_name: RangeRule::new(2, 60),
            last_name: RangeRule::new(2, 60),
            date_of_birth: DateRule {
                from: ymd(1950, 1, 1),
                to: None,
            },
            height: RangeRule::new(50, 250),
            income: RangeRule::new(Income::from_units(0), Income::from_units(1_000_000)),
            patronymic_letter: RangeRule::new('A', 'Z'),
        }
    }

    /// Built-in `custom` thresholds
    pub fn builtin_custom() -> Self {
        Self {
            first_name: RangeRule::new(3, 40),
            last_name: RangeRule::new(3, 40),
            date_of_birth: DateRule {
                from: ymd(1900, 1, 1),
                to: None,
            },
            height: RangeRule::new(100, 220),
            income: RangeRule::new(Income::from_units(100), Income::from_units(500_000)),
            patronymic_letter: RangeRule::new('A', 'M'),
        }
    }

    /// Check internal consistency: every range non-inverted, letters uppercase.
    pub fn check(&self, set: &str) -> RulesResult<()> {
        let inverted = |rule: &'static str| RulesError::InvertedRange {
            set: set.to_string(),
            rule,
        };

        if self.first_name.min > self.first_name.max {
            return Err(inverted("first_name"));
        }
        if self.last_name.min > self.last_name.max {
            return Err(inverted("last_name"));
        }
        if let Some(to) = self.date_of_birth.to {
            if self.date_of_birth.from > to {
                return Err(inverted("date_of_birth"));
            }
        }
        if self.height.min > self.height.max {
            return Err(inverted("height"));
        }
        if self.income.min > self.income.max {
            return Err(inverted("income"));
        }
        if self.patronymic_letter.min > self.patronymic_letter.max {
            return Err(inverted("patronymic_letter"));
        }
        if !self.patronymic_letter.min.is_ascii_uppercase()
            || !self.patronymic_letter.max.is_ascii_uppercase()
        {
            return Err(RulesError::OutOfDomain {
                set: set.to_string(),
                rule: "patronymic_letter",
                expected: "uppercase Latin letters",
            });
        }
        if self.first_name.min == 0 || self.last_name.min == 0 {
            return Err(RulesError::OutOfDomain {
                set: set.to_string(),
                rule: "name length",
                expected: "at least 1",
            });
        }
        Ok(())
    }

    /// Build the validator chain, resolving an open date range to `today`.
    pub fn validator_for(&self, today: NaiveDate) -> CompositeValidator {
        ValidatorBuilder::new()
            .validate_first_name(self.first_name.min, self.first_name.max)
            .validate_last_name(self.last_name.min, self.last_name.max)
            .validate_date_of_birth(self.date_of_birth.from, self.date_of_birth.to.unwrap_or(today))
            .validate_height(self.height.min, self.height.max)
            .validate_income(self.income.min, self.income.max)
            .validate_patronymic_letter(self.patronymic_letter.min, self.patronymic_letter.max)
            .build()
    }

    /// Build the validator chain against the local calendar date.
    pub fn validator(&self) -> CompositeValidator {
        self.validator_for(Local::now().date_naive())
    }
}

#[derive(Debug, Default, Deserialize)]
struct RulesFile {
    #[serde(default)]
    default: Option<RuleSet>,
    #[serde(default)]
    custom: Option<RuleSet>,
}

/// Both rule sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    pub default: RuleSet,
    pub custom: RuleSet,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ValidationRules {
    /// Built-in thresholds for both sets
    pub fn builtin() -> Self {
        Self {
            default: RuleSet::builtin_default(),
            custom: RuleSet::builtin_custom(),
        }
    }

    /// Load a rules file. Sets absent from the file keep built-in values.
    pub fn load(path: &Path) -> RulesResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| RulesError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&content).map_err(|e| match e {
            RulesError::Parse { source, .. } => RulesError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Parse rules from JSON text
    pub fn from_json(content: &str) -> RulesResult<Self> {
        let file: RulesFile = serde_json::from_str(content).map_err(|e| RulesError::Parse {
            path: "<inline>".to_string(),
            source: e,
        })?;

        let rules = Self {
            default: file.default.unwrap_or_else(RuleSet::builtin_default),
            custom: file.custom.unwrap_or_else(RuleSet::builtin_custom),
        };
        rules.default.check(RuleKind::Default.as_str())?;
        rules.custom.check(RuleKind::Custom.as_str())?;
        Ok(rules)
    }

    pub fn get(&self, kind: RuleKind) -> &RuleSet {
        match kind {
            RuleKind::Default => &self.default,
            RuleKind::Custom => &self.custom,
        }
    }
}
