//! Invariant checking for deterministic simulation testing.
//!
//! This module verifies the structural invariants of both indexes, and that
//! they agree with each other and with a reference model, after each
//! operation.

use std::collections::HashMap;

use crate::storage::Inventory;
use crate::types::Product;

/// An invariant violation detected during simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violation.
    pub description: String,
    /// Operation index where it was detected.
    pub operation_index: usize,
    /// Additional context.
    pub context: String,
}

/// Checker for index invariants.
#[derive(Debug, Default)]
pub struct InvariantChecker {
    /// Detected violations.
    violations: Vec<InvariantViolation>,
}

impl InvariantChecker {
    /// Create a new invariant checker.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    /// Get all violations.
    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    /// Check if any violations were detected.
    #[must_use]
    pub const fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Take the recorded violations, leaving the checker empty.
    pub fn take_violations(&mut self) -> Vec<InvariantViolation> {
        std::mem::take(&mut self.violations)
    }

    /// Add a violation.
    pub fn add_violation(&mut self, violation: InvariantViolation) {
        self.violations.push(violation);
    }

    fn violation(&mut self, description: &str, operation_index: usize, context: String) {
        self.violations.push(InvariantViolation {
            description: description.to_string(),
            operation_index,
            context,
        });
    }

    /// Check the price tree's balance, height and ordering invariants.
    pub fn check_price_index(&mut self, inventory: &Inventory, operation_index: usize) {
        let tree = inventory.price_index();
        if !tree.is_balanced() {
            self.violation(
                "Price index is not balanced",
                operation_index,
                format!("height {} with {} entries", tree.height(), tree.len()),
            );
        }
        if !tree.check_heights() {
            self.violation(
                "Price index has a stale node height",
                operation_index,
                String::new(),
            );
        }
        if !tree.is_ordered() {
            self.violation(
                "Price index in-order traversal is not sorted",
                operation_index,
                String::new(),
            );
        }
    }

    /// Check the identifier table's key uniqueness and slot placement.
    pub fn check_id_index(&mut self, inventory: &Inventory, operation_index: usize) {
        if let Err(context) = inventory.id_index().check_invariants() {
            self.violation("Identifier index is inconsistent", operation_index, context);
        }
    }

    /// Check that both indexes hold the same products.
    pub fn check_cross_index(&mut self, inventory: &Inventory, operation_index: usize) {
        if let Err(context) = inventory.check_consistency() {
            self.violation("Indexes disagree", operation_index, context);
        }
    }

    /// Check the inventory against the products the model expects.
    pub fn check_expected_state(
        &mut self,
        inventory: &Inventory,
        expected: &HashMap<String, Product>,
        operation_index: usize,
    ) {
        if inventory.len() != expected.len() {
            self.violation(
                "Product count differs from model",
                operation_index,
                format!("inventory has {}, model has {}", inventory.len(), expected.len()),
            );
        }
        for (id, product) in expected {
            match inventory.get(id) {
                Ok(Some(stored)) if stored == product => {}
                other => self.violation(
                    "Stored product differs from model",
                    operation_index,
                    format!("id {id}: expected {product}, got {other:?}"),
                ),
            }
        }
    }

    /// Run every check.
    pub fn check_all(
        &mut self,
        inventory: &Inventory,
        expected: &HashMap<String, Product>,
        operation_index: usize,
    ) {
        self.check_price_index(inventory, operation_index);
        self.check_id_index(inventory, operation_index);
        self.check_cross_index(inventory, operation_index);
        self.check_expected_state(inventory, expected, operation_index);
    }
}
