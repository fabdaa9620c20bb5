//! The mutation operator trait.

use rand::RngCore;

use crate::state::StateMut;

/// Changes a state in place.
///
/// Operators must keep busy routes customer-disjoint: check
/// [`StateRef::customer_overlap`](crate::state::StateRef::customer_overlap)
/// (or use the helpers in [`util`](super::util)) before every `make_busy`.
///
/// The rng is a trait object so operators can be boxed and mixed freely.
pub trait Mutation: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Mutates `state`; returns whether the operator considers itself to
    /// have done something.
    fn mutate(&self, state: &mut StateMut<'_>, epoch: usize, rng: &mut dyn RngCore) -> bool;
}

impl<M: Mutation + ?Sized> Mutation for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn mutate(&self, state: &mut StateMut<'_>, epoch: usize, rng: &mut dyn RngCore) -> bool {
        (**self).mutate(state, epoch, rng)
    }
}

/// Adapts a closure into a named [`Mutation`].
///
/// ```
/// use u_assign::mutation::{FnMutation, Mutation};
///
/// let noop = FnMutation::new("noop", |_state, _epoch, _rng| false);
/// assert_eq!(noop.name(), "noop");
/// ```
pub struct FnMutation<F> {
    name: String,
    f: F,
}

impl<F> FnMutation<F>
where
    F: Fn(&mut StateMut<'_>, usize, &mut dyn RngCore) -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Mutation for FnMutation<F>
where
    F: Fn(&mut StateMut<'_>, usize, &mut dyn RngCore) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn mutate(&self, state: &mut StateMut<'_>, epoch: usize, rng: &mut dyn RngCore) -> bool {
        (self.f)(state, epoch, rng)
    }
}

impl<F> std::fmt::Debug for FnMutation<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMutation").field("name", &self.name).finish()
    }
}
