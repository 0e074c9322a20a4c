/*!
 * # Permissions Module
 *
 * Capabilities are an enumerated `Action x Module` table. Tokens carry them
 * as strings such as `view_purchasing` or `update_production`; they are parsed
 * once into a [`PermissionMatrix`] and checked by typed lookup afterwards.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::warn;

/// Permission actions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
}

impl Action {
    fn bit(self) -> u8 {
        match self {
            Action::View => 0b0001,
            Action::Create => 0b0010,
            Action::Update => 0b0100,
            Action::Delete => 0b1000,
        }
    }
}

/// Application modules capabilities are granted on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Module {
    Purchasing,
    Sales,
    Parts,
    People,
    Production,
    Users,
    Settings,
}

impl Module {
    fn index(self) -> usize {
        self as usize
    }
}

const MODULE_COUNT: usize = 7;

/// Format a permission string, e.g. `update_purchasing`
pub fn format_permission(action: Action, module: Module) -> String {
    format!("{}_{}", action, module)
}

/// One granted capability
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Capability {
    pub action: Action,
    pub module: Module,
}

impl Capability {
    pub const fn new(action: Action, module: Module) -> Self {
        Self { action, module }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.action, self.module)
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (action, module) = raw
            .split_once('_')
            .ok_or_else(|| format!("malformed permission `{}`", raw))?;
        let action = Action::from_str(action).map_err(|_| format!("unknown action in `{}`", raw))?;
        let module = Module::from_str(module).map_err(|_| format!("unknown module in `{}`", raw))?;
        Ok(Self { action, module })
    }
}

/// Every module's granted actions packed into a bitset
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PermissionMatrix {
    grants: [u8; MODULE_COUNT],
}

impl PermissionMatrix {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Everything on every module
    pub fn full() -> Self {
        let mut matrix = Self::empty();
        for module in Module::iter() {
            for action in Action::iter() {
                matrix.grant(action, module);
            }
        }
        matrix
    }

    /// Parses token permission strings. Unknown strings are skipped.
    pub fn from_claims<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matrix = Self::empty();
        for raw in permissions {
            match raw.as_ref().parse::<Capability>() {
                Ok(cap) => matrix.grant(cap.action, cap.module),
                Err(reason) => warn!(%reason, "ignoring permission claim"),
            }
        }
        matrix
    }

    pub fn grant(&mut self, action: Action, module: Module) {
        self.grants[module.index()] |= action.bit();
    }

    pub fn with(mut self, action: Action, module: Module) -> Self {
        self.grant(action, module);
        self
    }

    pub fn revoke(&mut self, action: Action, module: Module) {
        self.grants[module.index()] &= !action.bit();
    }

    pub fn can(&self, action: Action, module: Module) -> bool {
        self.grants[module.index()] & action.bit() != 0
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.can(capability.action, capability.module)
    }

    /// Permission strings suitable for token claims
    pub fn to_claims(&self) -> Vec<String> {
        let mut out = Vec::new();
        for module in Module::iter() {
            for action in Action::iter() {
                if self.can(action, module) {
                    out.push(format_permission(action, module));
                }
            }
        }
        out
    }
}

/// Kind of account acting on the system
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Supplier,
    Customer,
}

impl Role {
    pub fn is_employee(&self) -> bool {
        matches!(self, Role::Employee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_claim_strings() {
        let matrix = PermissionMatrix::from_claims(["view_purchasing", "update_production"]);
        assert!(matrix.can(Action::View, Module::Purchasing));
        assert!(matrix.can(Action::Update, Module::Production));
        assert!(!matrix.can(Action::Update, Module::Purchasing));
        assert!(!matrix.can(Action::View, Module::Production));
    }

    #[test]
    fn junk_claims_are_ignored() {
        let matrix = PermissionMatrix::from_claims(["purchasing", "fly_purchasing", "view_moon", ""]);
        assert_eq!(matrix, PermissionMatrix::empty());
    }

    #[test]
    fn revoke_clears_a_single_bit() {
        let mut matrix = PermissionMatrix::full();
        matrix.revoke(Action::Delete, Module::Users);
        assert!(!matrix.can(Action::Delete, Module::Users));
        assert!(matrix.can(Action::Create, Module::Users));
        assert!(matrix.can(Action::Delete, Module::Purchasing));
    }

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!("employee".parse::<Role>().unwrap(), Role::Employee);
        assert_eq!(Role::Supplier.to_string(), "supplier");
    }

    fn capability() -> impl Strategy<Value = Capability> {
        let actions: Vec<Action> = Action::iter().collect();
        let modules: Vec<Module> = Module::iter().collect();
        (prop::sample::select(actions), prop::sample::select(modules))
            .prop_map(|(a, m)| Capability::new(a, m))
    }

    proptest! {
        #[test]
        fn claims_round_trip(caps in prop::collection::vec(capability(), 0..20)) {
            let mut matrix = PermissionMatrix::empty();
            for cap in &caps {
                matrix.grant(cap.action, cap.module);
            }
            let reparsed = PermissionMatrix::from_claims(matrix.to_claims());
            prop_assert_eq!(reparsed, matrix);
            for cap in &caps {
                prop_assert!(reparsed.allows(*cap));
            }
        }
    }
}
