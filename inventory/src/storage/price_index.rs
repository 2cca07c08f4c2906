//! Price index: an AVL tree keyed by price.
//!
//! The tree answers ordered queries (cheapest, most expensive, price ranges,
//! full sorted dumps) in `O(log n + k)`.
//!
//! # Structure
//!
//! Each node owns its children through `Option<Box<Node>>`; there are no
//! parent pointers. Insert and delete recurse down the tree and hand the
//! (possibly new) subtree root back to the caller, which is how rotations
//! propagate to the root.
//!
//! # Equal prices
//!
//! Inserting a price that is already present descends into the right subtree.
//! Equal keys are never compared on any other field. Rotations can later move
//! equal keys to either side of each other, so only the in-order sequence is
//! guaranteed to be non-decreasing; the relative order among equal prices is
//! best effort.
//!
//! # Invariants
//!
//! - For every node, the heights of its subtrees differ by at most one.
//! - Every stored height equals `1 + max(left height, right height)`, with an
//!   absent child counting as 0.
//! - In-order traversal yields non-decreasing prices.

use std::cmp::Ordering;

use crate::types::{Price, Product};

type Link<V> = Option<Box<Node<V>>>;

/// A balanced search tree mapping prices to payloads.
///
/// The payload is usually the full [`Product`], but callers that only need
/// names (or ids) can store those instead.
#[derive(Debug)]
pub struct PriceIndex<V = Product> {
    root: Link<V>,
    len: usize,
}

impl<V> Default for PriceIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PriceIndex<V> {
    /// Create an empty index.
    #[must_use]
    pub const fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Number of stored entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when nothing is stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the tree; 0 when empty.
    #[must_use]
    pub fn height(&self) -> u32 {
        height(self.root.as_deref())
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Insert a payload under `price`.
    ///
    /// Equal prices go to the right subtree. Every node on the insertion path
    /// has its height recomputed and is rebalanced on the way back up.
    pub fn insert(&mut self, price: Price, value: V) {
        self.root = Some(Self::insert_node(self.root.take(), price, value));
        self.len += 1;
    }

    /// Delete one entry with the given price.
    ///
    /// Returns `false` and leaves the tree untouched when the price is absent.
    pub fn delete(&mut self, price: Price) -> bool {
        self.delete_where(price, |_| true).is_some()
    }

    /// Delete the first entry at `price` whose payload satisfies `predicate`.
    ///
    /// Several entries may share a price. Both sides of an equal key are
    /// searched, since rotations can place equal keys on either side.
    /// Returns the removed payload.
    pub fn delete_where<F>(&mut self, price: Price, mut predicate: F) -> Option<V>
    where
        F: FnMut(&V) -> bool,
    {
        if !self.contains_where(price, &mut predicate) {
            tracing::debug!("price {price} not present in price index");
            return None;
        }

        let mut removed = None;
        self.root = Self::remove_node(self.root.take(), price, &mut predicate, &mut removed);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Returns `true` if an entry at `price` satisfies `predicate`.
    #[must_use]
    pub fn contains_where<F>(&self, price: Price, mut predicate: F) -> bool
    where
        F: FnMut(&V) -> bool,
    {
        Self::find_node(self.root.as_deref(), price, &mut predicate)
    }

    /// The payload with the lowest price, if any.
    #[must_use]
    pub fn find_cheapest(&self) -> Option<&V> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some(&node.value)
    }

    /// The payload with the highest price, if any.
    #[must_use]
    pub fn find_most_expensive(&self) -> Option<&V> {
        let mut node = self.root.as_deref()?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Some(&node.value)
    }

    /// All payloads with `min <= price <= max`, in ascending price order.
    ///
    /// Subtrees that cannot hold a qualifying price are skipped. A range with
    /// `min > max` can never match and yields an empty result.
    #[must_use]
    pub fn find_products_in_range(&self, min: Price, max: Price) -> Vec<&V> {
        let mut result = Vec::new();
        if min <= max {
            Self::collect_range(self.root.as_deref(), min, max, &mut result);
        }
        result
    }

    /// Every payload ordered by price, ascending or descending.
    #[must_use]
    pub fn get_sorted_products(&self, descending: bool) -> Vec<&V> {
        let mut result = Vec::with_capacity(self.len);
        Self::collect_all(self.root.as_deref(), descending, &mut result);
        result
    }

    /// Every `(price, payload)` pair in ascending price order.
    #[must_use]
    pub fn entries(&self) -> Vec<(Price, &V)> {
        fn traverse<'a, V>(node: Option<&'a Node<V>>, output: &mut Vec<(Price, &'a V)>) {
            if let Some(node) = node {
                traverse(node.left.as_deref(), output);
                output.push((node.price, &node.value));
                traverse(node.right.as_deref(), output);
            }
        }
        let mut result = Vec::with_capacity(self.len);
        traverse(self.root.as_deref(), &mut result);
        result
    }

    /// Verify the AVL balance condition at every node.
    ///
    /// Heights are recomputed from the structure rather than trusted, so this
    /// is `O(n)`. Intended for tests and verification.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        fn checked_height<V>(node: Option<&Node<V>>) -> Option<u32> {
            let Some(node) = node else {
                return Some(0);
            };
            let left = checked_height(node.left.as_deref())?;
            let right = checked_height(node.right.as_deref())?;
            if left.abs_diff(right) > 1 {
                return None;
            }
            Some(1 + left.max(right))
        }
        checked_height(self.root.as_deref()).is_some()
    }

    /// Verify that every stored height matches the heights of its children.
    #[must_use]
    pub fn check_heights(&self) -> bool {
        fn check<V>(node: Option<&Node<V>>) -> bool {
            node.is_none_or(|n| {
                n.height == 1 + height(n.left.as_deref()).max(height(n.right.as_deref()))
                    && check(n.left.as_deref())
                    && check(n.right.as_deref())
            })
        }
        check(self.root.as_deref())
    }

    /// Verify that in-order traversal yields non-decreasing prices.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.entries().windows(2).all(|pair| pair[0].0 <= pair[1].0)
    }
}

impl<V> PriceIndex<V> {
    fn insert_node(node: Link<V>, price: Price, value: V) -> Box<Node<V>> {
        let Some(mut node) = node else {
            return Box::new(Node::new(price, value));
        };
        if price < node.price {
            node.left = Some(Self::insert_node(node.left.take(), price, value));
        } else {
            node.right = Some(Self::insert_node(node.right.take(), price, value));
        }
        Self::balance(node)
    }

    fn find_node<F>(node: Option<&Node<V>>, price: Price, predicate: &mut F) -> bool
    where
        F: FnMut(&V) -> bool,
    {
        let Some(node) = node else {
            return false;
        };
        match price.cmp(&node.price) {
            Ordering::Less => Self::find_node(node.left.as_deref(), price, predicate),
            Ordering::Greater => Self::find_node(node.right.as_deref(), price, predicate),
            Ordering::Equal => {
                predicate(&node.value)
                    || Self::find_node(node.left.as_deref(), price, predicate)
                    || Self::find_node(node.right.as_deref(), price, predicate)
            }
        }
    }

    fn remove_node<F>(node: Link<V>, price: Price, predicate: &mut F, removed: &mut Option<V>) -> Link<V>
    where
        F: FnMut(&V) -> bool,
    {
        let mut node = node?;
        match price.cmp(&node.price) {
            Ordering::Less => {
                node.left = Self::remove_node(node.left.take(), price, predicate, removed);
            }
            Ordering::Greater => {
                node.right = Self::remove_node(node.right.take(), price, predicate, removed);
            }
            Ordering::Equal => {
                if predicate(&node.value) {
                    let (value, replacement) = Self::unlink(node);
                    *removed = Some(value);
                    return replacement;
                }
                node.left = Self::remove_node(node.left.take(), price, predicate, removed);
                if removed.is_none() {
                    node.right = Self::remove_node(node.right.take(), price, predicate, removed);
                }
            }
        }
        Some(Self::balance(node))
    }

    /// Detach `node` from the tree, returning its payload and the subtree that
    /// takes its place.
    ///
    /// A node with two children is replaced by its in-order successor.
    fn unlink(mut node: Box<Node<V>>) -> (V, Link<V>) {
        match (node.left.take(), node.right.take()) {
            (None, right) => (node.value, right),
            (left, None) => (node.value, left),
            (Some(left), Some(right)) => {
                let (successor_price, successor_value, new_right) = Self::take_min(right);
                let value = std::mem::replace(&mut node.value, successor_value);
                node.price = successor_price;
                node.left = Some(left);
                node.right = new_right;
                (value, Some(Self::balance(node)))
            }
        }
    }

    fn take_min(mut node: Box<Node<V>>) -> (Price, V, Link<V>) {
        match node.left.take() {
            None => {
                let right = node.right.take();
                (node.price, node.value, right)
            }
            Some(left) => {
                let (price, value, new_left) = Self::take_min(left);
                node.left = new_left;
                (price, value, Some(Self::balance(node)))
            }
        }
    }

    fn rotate_left(mut node: Box<Node<V>>) -> Box<Node<V>> {
        let Some(mut right) = node.right.take() else {
            return node;
        };
        node.right = right.left.take();
        node.update();
        right.left = Some(node);
        right.update();
        right
    }

    fn rotate_right(mut node: Box<Node<V>>) -> Box<Node<V>> {
        let Some(mut left) = node.left.take() else {
            return node;
        };
        node.left = left.right.take();
        node.update();
        left.right = Some(node);
        left.update();
        left
    }

    fn balance(mut node: Box<Node<V>>) -> Box<Node<V>> {
        node.update();
        let balance = node.balance_factor();
        if balance > 1 {
            if let Some(left) = node.left.take() {
                let left = if left.balance_factor() < 0 {
                    Self::rotate_left(left)
                } else {
                    left
                };
                node.left = Some(left);
            }
            return Self::rotate_right(node);
        }
        if balance < -1 {
            if let Some(right) = node.right.take() {
                let right = if right.balance_factor() > 0 {
                    Self::rotate_right(right)
                } else {
                    right
                };
                node.right = Some(right);
            }
            return Self::rotate_left(node);
        }
        node
    }

    fn collect_range<'a>(node: Option<&'a Node<V>>, min: Price, max: Price, output: &mut Vec<&'a V>) {
        let Some(node) = node else {
            return;
        };
        if min <= node.price {
            Self::collect_range(node.left.as_deref(), min, max, output);
        }
        if min <= node.price && node.price <= max {
            output.push(&node.value);
        }
        if node.price <= max {
            Self::collect_range(node.right.as_deref(), min, max, output);
        }
    }

    fn collect_all<'a>(node: Option<&'a Node<V>>, descending: bool, output: &mut Vec<&'a V>) {
        let Some(node) = node else {
            return;
        };
        let (first, second) = if descending {
            (node.right.as_deref(), node.left.as_deref())
        } else {
            (node.left.as_deref(), node.right.as_deref())
        };
        Self::collect_all(first, descending, output);
        output.push(&node.value);
        Self::collect_all(second, descending, output);
    }
}

#[derive(Debug)]
struct Node<V> {
    price: Price,
    value: V,
    height: u32,
    left: Link<V>,
    right: Link<V>,
}

impl<V> Node<V> {
    const fn new(price: Price, value: V) -> Self {
        Self {
            price,
            value,
            height: 1,
            left: None,
            right: None,
        }
    }

    fn update(&mut self) {
        self.height = 1 + height(self.left.as_deref()).max(height(self.right.as_deref()));
    }

    fn balance_factor(&self) -> i64 {
        i64::from(height(self.left.as_deref())) - i64::from(height(self.right.as_deref()))
    }
}

fn height<V>(node: Option<&Node<V>>) -> u32 {
    node.map_or(0, |n| n.height)
}
