//! The devtools monitor's view of the whole history ("lifted state").

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One recorded action, as stored by the monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformAction {
    /// The message, as it was sent with `Connection::send`.
    pub action: Value,
    /// `timestamp`, `type` and anything else the monitor keeps.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The model after one staged action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedState {
    pub state: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A monitor's snapshot of the action history and the states it computed.
///
/// Fields the monitor adds beyond these are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiftedState {
    /// Keyed by the decimal action id, as JSON object keys are strings.
    pub actions_by_id: BTreeMap<String, PerformAction>,
    pub computed_states: Vec<ComputedState>,
    pub current_state_index: usize,
    pub next_action_id: u64,
    pub skipped_action_ids: Vec<u64>,
    pub staged_action_ids: Vec<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of [`LiftedState::toggle_action`].
#[derive(Debug, Clone, PartialEq)]
pub struct Toggled {
    /// The lifted state to mirror back to the monitor.
    pub state: LiftedState,
    /// How to bring the program in line with it, if anything changed.
    pub replay: Option<Replay>,
}

/// Reset to `from`, then apply `actions` in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Replay {
    pub from: Value,
    pub actions: Vec<Value>,
}

impl LiftedState {
    /// Invert the skipped status of action `id` and work out the replay.
    ///
    /// The program is reset to the state computed just before `id`, then
    /// every later staged action that is not skipped is applied again; `id`
    /// itself is applied only when it is being un-skipped.  `self` is left
    /// untouched.
    ///
    /// An id that is not staged, or the initial action at position 0, yields
    /// an unchanged state and no replay.
    pub fn toggle_action(&self, id: u64) -> Toggled {
        let unchanged = || Toggled {
            state: self.clone(),
            replay: None,
        };

        let start = match self.staged_action_ids.iter().position(|staged| *staged == id) {
            Some(start) if start > 0 => start,
            _ => return unchanged(),
        };
        let from = match self.computed_states.get(start - 1) {
            Some(computed) => computed.state.clone(),
            None => return unchanged(),
        };

        let was_skipped = self.skipped_action_ids.contains(&id);
        let mut actions = Vec::new();
        for (offset, staged) in self.staged_action_ids[start..].iter().enumerate() {
            let replayed = if offset == 0 {
                was_skipped
            } else {
                !self.skipped_action_ids.contains(staged)
            };
            if !replayed {
                continue;
            }
            match self.actions_by_id.get(&staged.to_string()) {
                Some(perform) => actions.push(perform.action.clone()),
                None => return unchanged(),
            }
        }

        let mut state = self.clone();
        if was_skipped {
            state.skipped_action_ids.retain(|skipped| *skipped != id);
        } else {
            state.skipped_action_ids.push(id);
        }

        Toggled {
            state,
            replay: Some(Replay { from, actions }),
        }
    }

    /// The state computed by the last staged action.
    pub fn last_computed_state(&self) -> Option<&Value> {
        self.computed_states.last().map(|computed| &computed.state)
    }
}
