//! Regex node representation and smart constructors.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, BitAnd, Mul};
use std::rc::Rc;

use crate::error::Error;

// Tag masks mixed into structural hashes, one per composite variant.
const SUM_MASK: u64 = 0x426a_3d31;
const AND_MASK: u64 = 0x1ab3_4de1;
const PRD_MASK: u64 = 0x12b9_b0a1;
const KST_MASK: u64 = 0x2439_ab37;

fn hash_combine(seed: &mut u64, mask: u64, hash: u64) {
    *seed ^= hash
        .wrapping_add(mask)
        .wrapping_add(*seed << 6)
        .wrapping_add(*seed >> 2);
}

#[derive(Debug)]
enum Node<L> {
    /// ∅ — matches no word.
    Zero,
    /// ε — matches only the empty word.
    One,
    /// A single letter.
    Lit(L),
    /// Alternation. Unordered, deduplicated, at least two items.
    Sum(Vec<Regex<L>>),
    /// Intersection. Unordered, deduplicated, at least two items.
    And(Vec<Regex<L>>),
    /// Concatenation. Ordered, at least two items.
    Prd(Vec<Regex<L>>),
    /// Kleene star.
    Kst(Regex<L>),
}

#[derive(Debug)]
struct Inner<L> {
    hash: u64,
    node: Node<L>,
}

/// A regular expression over letters of type `L`.
///
/// Values are immutable and cheap to clone (shared nodes). Two expressions
/// compare equal iff they are structurally equal modulo the normalizations
/// applied by the smart constructors; the structural hash is cached per
/// node and stable under the set ordering of sums and intersections.
pub struct Regex<L> {
    inner: Rc<Inner<L>>,
}

impl<L> Clone for Regex<L> {
    fn clone(&self) -> Self {
        Regex {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<L: fmt::Debug> fmt::Debug for Regex<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.node.fmt(f)
    }
}

impl<L: PartialEq> PartialEq for Regex<L> {
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        if self.inner.hash != other.inner.hash {
            return false;
        }
        match (&self.inner.node, &other.inner.node) {
            (Node::Zero, Node::Zero) | (Node::One, Node::One) => true,
            (Node::Lit(a), Node::Lit(b)) => a == b,
            (Node::Sum(a), Node::Sum(b)) | (Node::And(a), Node::And(b)) => {
                a.len() == b.len() && a.iter().all(|r| b.contains(r))
            }
            (Node::Prd(a), Node::Prd(b)) => a == b,
            (Node::Kst(a), Node::Kst(b)) => a == b,
            _ => false,
        }
    }
}

impl<L: Eq> Eq for Regex<L> {}

impl<L> Hash for Regex<L> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.inner.hash);
    }
}

impl<L: Clone + Eq + Hash> Regex<L> {
    /// ∅ — the empty language.
    pub fn zero() -> Self {
        Self::from_node(Node::Zero)
    }

    /// ε — the language of the empty word.
    pub fn one() -> Self {
        Self::from_node(Node::One)
    }

    /// The language of the single one-letter word `letter`.
    pub fn lit(letter: L) -> Self {
        Self::from_node(Node::Lit(letter))
    }

    /// Concatenation of literals: the language of the single word `w`.
    pub fn word(w: &[L]) -> Self {
        w.iter()
            .fold(Self::one(), |acc, l| Self::concat(&acc, &Self::lit(l.clone())))
    }

    /// Alternation of literals: any single letter of `letters`.
    pub fn any_of(letters: &[L]) -> Self {
        letters
            .iter()
            .fold(Self::zero(), |acc, l| Self::sum(&acc, &Self::lit(l.clone())))
    }

    /// Alternation: `r + s`.
    ///
    /// Applies `∅+r = r`, `r+∅ = r`, `r+r = r` and flattens nested sums;
    /// the result has set semantics.
    pub fn sum(r: &Self, s: &Self) -> Self {
        if r.is_zero() {
            return s.clone();
        }
        if s.is_zero() {
            return r.clone();
        }
        if r == s {
            return r.clone();
        }
        match (&r.inner.node, &s.inner.node) {
            (Node::Sum(rs), Node::Sum(ss)) => {
                let mut items = rs.clone();
                for t in ss {
                    insert_unique(&mut items, t.clone());
                }
                Self::sum_node(items)
            }
            (Node::Sum(rs), _) => {
                let mut items = rs.clone();
                insert_unique(&mut items, s.clone());
                Self::sum_node(items)
            }
            (_, Node::Sum(ss)) => {
                let mut items = ss.clone();
                insert_unique(&mut items, r.clone());
                Self::sum_node(items)
            }
            _ => Self::sum_node(vec![r.clone(), s.clone()]),
        }
    }

    /// Intersection: `r & s`.
    ///
    /// Applies `∅&r = ∅`, `r&∅ = ∅`, `r&r = r` and flattens nested
    /// intersections; the result has set semantics.
    pub fn and(r: &Self, s: &Self) -> Self {
        if r.is_zero() {
            return r.clone();
        }
        if s.is_zero() {
            return s.clone();
        }
        if r == s {
            return r.clone();
        }
        match (&r.inner.node, &s.inner.node) {
            (Node::And(rs), Node::And(ss)) => {
                let mut items = rs.clone();
                for t in ss {
                    insert_unique(&mut items, t.clone());
                }
                Self::and_node(items)
            }
            (Node::And(rs), _) => {
                let mut items = rs.clone();
                insert_unique(&mut items, s.clone());
                Self::and_node(items)
            }
            (_, Node::And(ss)) => {
                let mut items = ss.clone();
                insert_unique(&mut items, r.clone());
                Self::and_node(items)
            }
            _ => Self::and_node(vec![r.clone(), s.clone()]),
        }
    }

    /// Concatenation: `r · s`.
    ///
    /// Applies `∅·r = ∅`, `r·∅ = ∅`, `ε·r = r`, `r·ε = r`,
    /// `(x*)·(x*) = x*` and flattens nested products. The distributive
    /// law over sums is intentionally not applied: expanding products of
    /// alternations explodes the number of derivative states.
    pub fn concat(r: &Self, s: &Self) -> Self {
        if r.is_zero() || s.is_one() {
            return r.clone();
        }
        if s.is_zero() || r.is_one() {
            return s.clone();
        }
        if let (Node::Kst(ri), Node::Kst(si)) = (&r.inner.node, &s.inner.node) {
            if ri == si {
                return r.clone();
            }
        }
        match (&r.inner.node, &s.inner.node) {
            (Node::Prd(rs), Node::Prd(ss)) => {
                let mut items = rs.clone();
                items.extend(ss.iter().cloned());
                Self::prd_node(items)
            }
            (Node::Prd(rs), _) => {
                let mut items = rs.clone();
                items.push(s.clone());
                Self::prd_node(items)
            }
            (_, Node::Prd(ss)) => {
                let mut items = Vec::with_capacity(ss.len() + 1);
                items.push(r.clone());
                items.extend(ss.iter().cloned());
                Self::prd_node(items)
            }
            _ => Self::prd_node(vec![r.clone(), s.clone()]),
        }
    }

    /// Kleene star: `r*`.
    ///
    /// Applies `ε* = ε`, `∅* = ε`, `(r*)* = r*`.
    pub fn kstar(&self) -> Self {
        match &self.inner.node {
            Node::Zero | Node::One => Self::one(),
            Node::Kst(_) => self.clone(),
            _ => Self::from_node(Node::Kst(self.clone())),
        }
    }

    /// The n-fold concatenation of `self`; `repeat(0)` is ε.
    pub fn repeat(&self, n: u32) -> Self {
        let mut rep = Self::one();
        for _ in 0..n {
            rep = Self::concat(&rep, self);
        }
        rep
    }

    /// Whether ε belongs to the language.
    pub fn nullable(&self) -> bool {
        match &self.inner.node {
            Node::Zero | Node::Lit(_) => false,
            Node::One | Node::Kst(_) => true,
            Node::Sum(items) => items.iter().any(Self::nullable),
            Node::And(items) | Node::Prd(items) => items.iter().all(Self::nullable),
        }
    }

    /// ν: ε when nullable, ∅ otherwise.
    pub fn nu(&self) -> Self {
        if self.nullable() {
            Self::one()
        } else {
            Self::zero()
        }
    }

    /// Brzozowski derivative with respect to the letter `x`: the language
    /// of words `w` such that `x·w` belongs to `self`.
    pub fn derivative(&self, x: &L) -> Self {
        match &self.inner.node {
            Node::Zero | Node::One => Self::zero(),
            Node::Lit(c) => {
                if c == x {
                    Self::one()
                } else {
                    Self::zero()
                }
            }
            // ∂a (r + s) ≡ ∂a r + ∂a s
            Node::Sum(items) => {
                let mut ds: Vec<Regex<L>> = Vec::new();
                for r in items {
                    let d = r.derivative(x);
                    if !d.is_zero() && !ds.contains(&d) {
                        ds.push(d);
                    }
                }
                match ds.len() {
                    0 => Self::zero(),
                    1 => ds.swap_remove(0),
                    _ => ds.iter().fold(Self::zero(), |acc, d| Self::sum(&acc, d)),
                }
            }
            // ∂a (r & s) ≡ ∂a r & ∂a s, short-circuiting on ∅
            Node::And(items) => {
                let mut ds: Vec<Regex<L>> = Vec::new();
                for r in items {
                    let d = r.derivative(x);
                    if d.is_zero() {
                        return d;
                    }
                    if !ds.contains(&d) {
                        ds.push(d);
                    }
                }
                match ds.split_first() {
                    None => Self::zero(),
                    Some((first, [])) => first.clone(),
                    Some((first, rest)) => {
                        rest.iter().fold(first.clone(), |acc, d| Self::and(&acc, d))
                    }
                }
            }
            // ∂a (r · s) ≡ ∂a r · s + ν(r) · ∂a s
            Node::Prd(items) => {
                let head = &items[0];
                let tail = if items.len() == 2 {
                    items[1].clone()
                } else {
                    Self::prd_node(items[1..].to_vec())
                };
                let d_head = Self::concat(&head.derivative(x), &tail);
                if head.nullable() {
                    Self::sum(&d_head, &tail.derivative(x))
                } else {
                    d_head
                }
            }
            // ∂a (r*) ≡ ∂a r · r*
            Node::Kst(item) => Self::concat(&item.derivative(x), self),
        }
    }

    /// Derivative with respect to a word, left to right.
    pub fn derivative_word(&self, w: &[L]) -> Self {
        let mut t = self.clone();
        for l in w {
            t = t.derivative(l);
        }
        t
    }

    /// Whether `w` belongs to the language.
    pub fn matches(&self, w: &[L]) -> bool {
        self.derivative_word(w).nullable()
    }

    /// The set of letters appearing in the expression.
    pub fn alphabet(&self) -> BTreeSet<L>
    where
        L: Ord,
    {
        let mut letters = BTreeSet::new();
        self.collect_letters(&mut letters);
        letters
    }

    fn collect_letters(&self, out: &mut BTreeSet<L>)
    where
        L: Ord,
    {
        match &self.inner.node {
            Node::Zero | Node::One => {}
            Node::Lit(c) => {
                out.insert(c.clone());
            }
            Node::Sum(items) | Node::And(items) | Node::Prd(items) => {
                for r in items {
                    r.collect_letters(out);
                }
            }
            Node::Kst(item) => item.collect_letters(out),
        }
    }

    /// Whether the expression is a single literal.
    pub fn is_literal(&self) -> bool {
        matches!(&self.inner.node, Node::Lit(_))
    }

    /// The letter of a literal expression.
    pub fn letter(&self) -> Result<&L, Error> {
        match &self.inner.node {
            Node::Lit(c) => Ok(c),
            _ => Err(Error::InvalidShape),
        }
    }

    /// Rebuilds the expression over a different letter type, renormalizing
    /// through the smart constructors (letters merged by `f` collapse).
    pub fn map<T, F>(&self, f: &F) -> Regex<T>
    where
        T: Clone + Eq + Hash,
        F: Fn(&L) -> T,
    {
        match &self.inner.node {
            Node::Zero => Regex::zero(),
            Node::One => Regex::one(),
            Node::Lit(c) => Regex::lit(f(c)),
            Node::Sum(items) => items
                .iter()
                .fold(Regex::zero(), |acc, r| Regex::sum(&acc, &r.map(f))),
            Node::And(items) => {
                let mapped: Vec<Regex<T>> = items.iter().map(|r| r.map(f)).collect();
                let (first, rest) = mapped.split_first().expect("intersection has items");
                rest.iter().fold(first.clone(), |acc, r| Regex::and(&acc, r))
            }
            Node::Prd(items) => items
                .iter()
                .fold(Regex::one(), |acc, r| Regex::concat(&acc, &r.map(f))),
            Node::Kst(item) => item.map(f).kstar(),
        }
    }

    fn is_zero(&self) -> bool {
        matches!(&self.inner.node, Node::Zero)
    }

    fn is_one(&self) -> bool {
        matches!(&self.inner.node, Node::One)
    }

    fn sum_node(items: Vec<Regex<L>>) -> Self {
        debug_assert!(items.len() >= 2);
        Self::from_node(Node::Sum(items))
    }

    fn and_node(items: Vec<Regex<L>>) -> Self {
        debug_assert!(items.len() >= 2);
        Self::from_node(Node::And(items))
    }

    fn prd_node(items: Vec<Regex<L>>) -> Self {
        debug_assert!(items.len() >= 2);
        Self::from_node(Node::Prd(items))
    }

    fn from_node(node: Node<L>) -> Self {
        let hash = match &node {
            Node::Zero => 0,
            Node::One => 1,
            Node::Lit(c) => {
                let mut h = DefaultHasher::new();
                c.hash(&mut h);
                h.finish()
            }
            // Children combined commutatively so the hash is stable under
            // set ordering.
            Node::Sum(items) => {
                let sum = items
                    .iter()
                    .fold(0u64, |acc, r| acc.wrapping_add(r.inner.hash));
                let mut seed = 0;
                hash_combine(&mut seed, SUM_MASK, sum);
                seed
            }
            Node::And(items) => {
                let sum = items
                    .iter()
                    .fold(0u64, |acc, r| acc.wrapping_add(r.inner.hash));
                let mut seed = 0;
                hash_combine(&mut seed, AND_MASK, sum);
                seed
            }
            Node::Prd(items) => {
                let mut seed = 0;
                for r in items {
                    hash_combine(&mut seed, PRD_MASK, r.inner.hash);
                }
                seed
            }
            Node::Kst(item) => {
                let mut seed = 0;
                hash_combine(&mut seed, KST_MASK, item.inner.hash);
                seed
            }
        };
        Regex {
            inner: Rc::new(Inner { hash, node }),
        }
    }
}

fn insert_unique<L: PartialEq>(items: &mut Vec<Regex<L>>, r: Regex<L>) {
    if !items.contains(&r) {
        items.push(r);
    }
}

impl<L: Clone + Eq + Hash> Add for &Regex<L> {
    type Output = Regex<L>;

    fn add(self, rhs: Self) -> Regex<L> {
        Regex::sum(self, rhs)
    }
}

impl<L: Clone + Eq + Hash> Add for Regex<L> {
    type Output = Regex<L>;

    fn add(self, rhs: Self) -> Regex<L> {
        Regex::sum(&self, &rhs)
    }
}

impl<L: Clone + Eq + Hash> Mul for &Regex<L> {
    type Output = Regex<L>;

    fn mul(self, rhs: Self) -> Regex<L> {
        Regex::concat(self, rhs)
    }
}

impl<L: Clone + Eq + Hash> Mul for Regex<L> {
    type Output = Regex<L>;

    fn mul(self, rhs: Self) -> Regex<L> {
        Regex::concat(&self, &rhs)
    }
}

impl<L: Clone + Eq + Hash> BitAnd for &Regex<L> {
    type Output = Regex<L>;

    fn bitand(self, rhs: Self) -> Regex<L> {
        Regex::and(self, rhs)
    }
}

impl<L: Clone + Eq + Hash> BitAnd for Regex<L> {
    type Output = Regex<L>;

    fn bitand(self, rhs: Self) -> Regex<L> {
        Regex::and(&self, &rhs)
    }
}

impl<L: fmt::Display> fmt::Display for Regex<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<L: fmt::Display>(
            f: &mut fmt::Formatter<'_>,
            items: &[Regex<L>],
            sep: &str,
        ) -> fmt::Result {
            write!(f, "(")?;
            for (i, r) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, "{sep}")?;
                }
                write!(f, "{r}")?;
            }
            write!(f, ")")
        }
        match &self.inner.node {
            Node::Zero => write!(f, "∅"),
            Node::One => write!(f, "ε"),
            Node::Lit(c) => write!(f, "{c}"),
            Node::Sum(items) => join(f, items, "+"),
            Node::And(items) => join(f, items, "&"),
            Node::Prd(items) => join(f, items, "·"),
            Node::Kst(item) => write!(f, "({item})*"),
        }
    }
}
