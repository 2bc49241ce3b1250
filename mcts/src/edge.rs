use std::rc::Rc;

use futures_intrusive::sync::LocalManualResetEvent;
use generational_arena::Index;
use half::f16;
use model::ActionWithPolicy;

/// One legal-move slot of a node. Slots are created for every legal move at
/// node construction and never added or removed afterwards, so selection and
/// proof propagation can index children by legal-move position.
#[derive(Debug)]
pub struct PnsEdge<A> {
    action: A,
    policy_score: f16,
    node: PnsEdgeState,
}

impl<A> PnsEdge<A> {
    pub fn new(action: A, policy_score: f16) -> Self {
        Self {
            action,
            policy_score,
            node: PnsEdgeState::Unexpanded,
        }
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    pub fn policy_score(&self) -> f32 {
        self.policy_score.to_f32()
    }

    pub fn node_index(&self) -> Option<Index> {
        self.node.get_index()
    }

    pub fn is_unexpanded(&self) -> bool {
        self.node.is_unexpanded()
    }

    pub fn is_expanding(&self) -> bool {
        self.node.is_expanding()
    }

    pub fn mark_as_expanding(&mut self) {
        self.node.mark_as_expanding()
    }

    pub fn set_expanded(&mut self, index: Index) {
        self.node.set_expanded(index);
    }

    pub fn get_waiter(&mut self) -> Rc<LocalManualResetEvent> {
        self.node.get_waiter()
    }
}

impl<A> From<ActionWithPolicy<A>> for PnsEdge<A> {
    fn from(action_with_policy: ActionWithPolicy<A>) -> Self {
        PnsEdge::new(action_with_policy.action, action_with_policy.policy_score)
    }
}

#[derive(Debug)]
enum PnsEdgeState {
    Unexpanded,
    Expanding,
    ExpandingWithWaiters(Rc<LocalManualResetEvent>),
    Expanded(Index),
}

impl PnsEdgeState {
    fn get_index(&self) -> Option<Index> {
        if let Self::Expanded(index) = self {
            Some(*index)
        } else {
            None
        }
    }

    fn is_unexpanded(&self) -> bool {
        matches!(self, Self::Unexpanded)
    }

    fn is_expanding(&self) -> bool {
        matches!(self, Self::Expanding | Self::ExpandingWithWaiters(_))
    }

    fn mark_as_expanding(&mut self) {
        debug_assert!(matches!(self, Self::Unexpanded));
        *self = Self::Expanding
    }

    fn set_expanded(&mut self, index: Index) {
        debug_assert!(!matches!(self, Self::Unexpanded));
        debug_assert!(!matches!(self, Self::Expanded(_)));
        let state = std::mem::replace(self, Self::Expanded(index));
        if let Self::ExpandingWithWaiters(reset_events) = state {
            reset_events.set()
        }
    }

    fn get_waiter(&mut self) -> Rc<LocalManualResetEvent> {
        match self {
            Self::Expanding => {
                let reset_event = Rc::new(LocalManualResetEvent::new(false));
                *self = Self::ExpandingWithWaiters(reset_event.clone());
                reset_event
            }
            Self::ExpandingWithWaiters(reset_event) => reset_event.clone(),
            _ => panic!("Edge is not currently expanding"),
        }
    }
}
