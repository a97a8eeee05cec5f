//! Contexts and context selectors.
//!
//! A context is a bounded sequence of context elements: call sites for
//! call-site sensitivity, allocation objects for object sensitivity,
//! classes for type sensitivity. The selector decides which elements a
//! callee or heap object is keyed by; the insensitive selector keys
//! everything by the empty context, which makes the solver the
//! context-insensitive analysis.

use crate::ir::{ClassId, StmtSite};
use crate::pta::heap::ObjId;
use crate::{Error, Result};

/// One element of a context string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CtxElem {
    /// A call site (call-site sensitivity).
    CallSite(StmtSite),
    /// An allocation object (object sensitivity).
    Obj(ObjId),
    /// A class (type sensitivity).
    Type(ClassId),
}

/// A context: the (possibly empty) sequence of its elements.
///
/// Equality and hashing are structural.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Ctx(Vec<CtxElem>);

impl Ctx {
    /// The empty context.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` for the empty context.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The elements, oldest first.
    #[must_use]
    pub fn elements(&self) -> &[CtxElem] {
        &self.0
    }

    /// Appends an element, keeping only the last `limit` elements.
    #[must_use]
    pub fn appended(&self, elem: CtxElem, limit: usize) -> Self {
        if limit == 0 {
            return Self::empty();
        }
        let mut elems = self.0.clone();
        elems.push(elem);
        let skip = elems.len().saturating_sub(limit);
        Self(elems.split_off(skip))
    }

    /// The suffix of at most `limit` elements.
    #[must_use]
    pub fn truncated(&self, limit: usize) -> Self {
        let skip = self.0.len().saturating_sub(limit);
        Self(self.0[skip..].to_vec())
    }
}

/// Chooses the contexts callees and heap objects are keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSelector {
    /// Every context is empty: the context-insensitive analysis.
    Insensitive,
    /// k-limited call-site sensitivity.
    KCallSite(usize),
    /// k-limited object sensitivity.
    KObject(usize),
    /// k-limited type sensitivity.
    KType(usize),
}

impl ContextSelector {
    /// Parses a pointer-analysis variant id: `ci`, `<k>-call`,
    /// `<k>-obj`, or `<k>-type`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Options`] for anything else.
    pub fn parse(id: &str) -> Result<Self> {
        if id == "ci" {
            return Ok(Self::Insensitive);
        }
        if let Some((k, kind)) = id.split_once('-') {
            if let Ok(k) = k.parse::<usize>() {
                match kind {
                    "call" => return Ok(Self::KCallSite(k)),
                    "obj" => return Ok(Self::KObject(k)),
                    "type" => return Ok(Self::KType(k)),
                    _ => {}
                }
            }
        }
        Err(Error::Options(id.to_string()))
    }

    /// The empty context.
    #[must_use]
    pub fn empty_context(&self) -> Ctx {
        Ctx::empty()
    }

    /// Context of the callee of a static call.
    #[must_use]
    pub fn select_static(&self, caller: &Ctx, site: StmtSite) -> Ctx {
        match self {
            Self::Insensitive => Ctx::empty(),
            Self::KCallSite(k) => caller.appended(CtxElem::CallSite(site), *k),
            // object/type sensitivity has no receiver to key by
            Self::KObject(_) | Self::KType(_) => caller.clone(),
        }
    }

    /// Context of the callee of an instance call dispatched on
    /// receiver object `recv` (whose heap context is `recv_ctx` and
    /// dynamic class `recv_class`).
    #[must_use]
    pub fn select_instance(
        &self,
        caller: &Ctx,
        site: StmtSite,
        recv_ctx: &Ctx,
        recv: ObjId,
        recv_class: ClassId,
    ) -> Ctx {
        match self {
            Self::Insensitive => Ctx::empty(),
            Self::KCallSite(k) => caller.appended(CtxElem::CallSite(site), *k),
            Self::KObject(k) => recv_ctx.appended(CtxElem::Obj(recv), *k),
            Self::KType(k) => recv_ctx.appended(CtxElem::Type(recv_class), *k),
        }
    }

    /// Heap context of an object allocated in a method running under
    /// `method_ctx`. One element shorter than method contexts, the
    /// usual k/k−1 pairing.
    #[must_use]
    pub fn select_heap(&self, method_ctx: &Ctx) -> Ctx {
        match self {
            Self::Insensitive => Ctx::empty(),
            Self::KCallSite(k) | Self::KObject(k) | Self::KType(k) => {
                method_ctx.truncated(k.saturating_sub(1))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::MethodId;

    fn site(index: u32) -> StmtSite {
        StmtSite::new(MethodId::new(0), index)
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            ContextSelector::parse("ci").unwrap(),
            ContextSelector::Insensitive
        );
        assert_eq!(
            ContextSelector::parse("1-call").unwrap(),
            ContextSelector::KCallSite(1)
        );
        assert_eq!(
            ContextSelector::parse("2-obj").unwrap(),
            ContextSelector::KObject(2)
        );
        assert_eq!(
            ContextSelector::parse("1-type").unwrap(),
            ContextSelector::KType(1)
        );
        assert!(ContextSelector::parse("3-station").is_err());
        assert!(ContextSelector::parse("cs").is_err());
    }

    #[test]
    fn test_k_limiting() {
        let selector = ContextSelector::KCallSite(2);
        let c0 = selector.empty_context();
        let c1 = selector.select_static(&c0, site(0));
        let c2 = selector.select_static(&c1, site(1));
        let c3 = selector.select_static(&c2, site(2));

        assert_eq!(c1.elements(), &[CtxElem::CallSite(site(0))]);
        assert_eq!(
            c2.elements(),
            &[CtxElem::CallSite(site(0)), CtxElem::CallSite(site(1))]
        );
        // oldest element dropped at the limit
        assert_eq!(
            c3.elements(),
            &[CtxElem::CallSite(site(1)), CtxElem::CallSite(site(2))]
        );
    }

    #[test]
    fn test_heap_context_is_one_shorter() {
        let selector = ContextSelector::KCallSite(1);
        let c1 = selector.select_static(&Ctx::empty(), site(0));
        assert!(selector.select_heap(&c1).is_empty());

        let selector2 = ContextSelector::KCallSite(2);
        let c2 = selector2.select_static(&c1, site(1));
        assert_eq!(selector2.select_heap(&c2).elements().len(), 1);
    }

    #[test]
    fn test_insensitive_always_empty() {
        let selector = ContextSelector::Insensitive;
        let ctx = selector.select_static(&Ctx::empty(), site(4));
        assert!(ctx.is_empty());
        assert!(selector.select_heap(&ctx).is_empty());
    }
}
