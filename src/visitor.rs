//! Depth-first traversal of call-site graphs
//!
//! [`walk`] owns traversal order; a [`CallSiteVisitor`] owns the meaning of
//! each node. The visitor has one required hook per node kind and no
//! defaults, so a new [`CallSite`] variant does not compile until every
//! visitor handles it.
//!
//! Path state is passed by value down each edge. A wrapper hook returns the
//! state for its single child only; aggregate children each receive a clone
//! of the state their parent received. Nothing flows sideways or upward
//! except results.

use crate::call_site::{
    CallSite, ClosedEnumerableCallSite, ConstructorCallSite, InterceptionCallSite,
    ScopedCallSite, SingletonCallSite, TransientCallSite,
};
use crate::ServiceType;

/// Decision taken by a wrapper hook before the walker descends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descend<S, O> {
    /// Visit the wrapped child with this state; its result becomes ours
    Into(S),
    /// Do not descend; this is the wrapper's result
    Stop(O),
}

/// Per-node behavior driven by [`walk`].
pub trait CallSiteVisitor {
    /// Path-local state, copied down each edge
    type State: Clone;
    /// Per-subtree result
    type Output;
    /// Raised by a hook; aborts the walk
    type Error;

    fn enter_transient(
        &mut self,
        site: &TransientCallSite,
        state: &Self::State,
    ) -> Result<Descend<Self::State, Self::Output>, Self::Error>;

    fn enter_singleton(
        &mut self,
        site: &SingletonCallSite,
        state: &Self::State,
    ) -> Result<Descend<Self::State, Self::Output>, Self::Error>;

    fn enter_scoped(
        &mut self,
        site: &ScopedCallSite,
        state: &Self::State,
    ) -> Result<Descend<Self::State, Self::Output>, Self::Error>;

    fn enter_interception(
        &mut self,
        site: &InterceptionCallSite,
        state: &Self::State,
    ) -> Result<Descend<Self::State, Self::Output>, Self::Error>;

    /// Fold parameter results, given in declaration order.
    fn combine_constructor(
        &mut self,
        site: &ConstructorCallSite,
        results: Vec<Self::Output>,
    ) -> Self::Output;

    /// Fold element results, given in registration order.
    fn combine_enumerable(
        &mut self,
        site: &ClosedEnumerableCallSite,
        results: Vec<Self::Output>,
    ) -> Self::Output;

    fn visit_empty_enumerable(
        &mut self,
        item_type: ServiceType,
        state: &Self::State,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_constant(
        &mut self,
        service_type: ServiceType,
        state: &Self::State,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_create_instance(
        &mut self,
        implementation: ServiceType,
        state: &Self::State,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_instance_service(
        &mut self,
        service_type: ServiceType,
        state: &Self::State,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_service_provider(&mut self, state: &Self::State) -> Result<Self::Output, Self::Error>;

    fn visit_service_scope(&mut self, state: &Self::State) -> Result<Self::Output, Self::Error>;

    fn visit_factory(
        &mut self,
        service_type: ServiceType,
        state: &Self::State,
    ) -> Result<Self::Output, Self::Error>;
}

/// Visit `call_site` and its subtree, returning the visitor's result.
///
/// Every child of an aggregate is visited, in order, even once a result is
/// known; the first error from any hook is returned unchanged.
pub fn walk<V>(visitor: &mut V, call_site: &CallSite, state: V::State) -> Result<V::Output, V::Error>
where
    V: CallSiteVisitor + ?Sized,
{
    match call_site {
        CallSite::Transient(site) => {
            let step = visitor.enter_transient(site, &state)?;
            descend(visitor, &site.service, step)
        }
        CallSite::Singleton(site) => {
            let step = visitor.enter_singleton(site, &state)?;
            descend(visitor, &site.service, step)
        }
        CallSite::Scoped(site) => {
            let step = visitor.enter_scoped(site, &state)?;
            descend(visitor, &site.service, step)
        }
        CallSite::Interception(site) => {
            let step = visitor.enter_interception(site, &state)?;
            descend(visitor, &site.target, step)
        }
        CallSite::Constructor(site) => {
            let results = walk_each(visitor, &site.parameters, &state)?;
            Ok(visitor.combine_constructor(site, results))
        }
        CallSite::ClosedEnumerable(site) => {
            let results = walk_each(visitor, &site.services, &state)?;
            Ok(visitor.combine_enumerable(site, results))
        }
        CallSite::EmptyEnumerable { item_type } => visitor.visit_empty_enumerable(*item_type, &state),
        CallSite::Constant { service_type } => visitor.visit_constant(*service_type, &state),
        CallSite::CreateInstance { implementation } => {
            visitor.visit_create_instance(*implementation, &state)
        }
        CallSite::InstanceService { service_type } => {
            visitor.visit_instance_service(*service_type, &state)
        }
        CallSite::ServiceProviderService => visitor.visit_service_provider(&state),
        CallSite::ServiceScopeService => visitor.visit_service_scope(&state),
        CallSite::FactoryService { service_type } => visitor.visit_factory(*service_type, &state),
    }
}

#[inline]
fn descend<V>(
    visitor: &mut V,
    child: &CallSite,
    step: Descend<V::State, V::Output>,
) -> Result<V::Output, V::Error>
where
    V: CallSiteVisitor + ?Sized,
{
    match step {
        Descend::Into(child_state) => walk(visitor, child, child_state),
        Descend::Stop(output) => Ok(output),
    }
}

fn walk_each<V>(
    visitor: &mut V,
    children: &[CallSite],
    state: &V::State,
) -> Result<Vec<V::Output>, V::Error>
where
    V: CallSiteVisitor + ?Sized,
{
    children
        .iter()
        .map(|child| walk(&mut *visitor, child, state.clone()))
        .collect()
}
