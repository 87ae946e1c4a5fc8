use serde::{Deserialize, Serialize};

use crate::prelude::SelectionError;
use crate::processing::{Granularity, IdentityIndex};
use crate::record::{CategoryKey, IdentityKey};
use crate::selection::view::ViewRequest;

/// What the user is looking at inside the active category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "identity", rename_all = "lowercase")]
pub enum Focus {
    #[default]
    Overview,
    Identity(IdentityKey),
}

/// Current category, focus and granularity. Owned by whoever drives the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    category: CategoryKey,
    focus: Focus,
    granularity: Granularity,
}

impl SelectionState {
    pub fn new(category: CategoryKey, granularity: Granularity) -> Self {
        Self {
            category,
            focus: Focus::Overview,
            granularity,
        }
    }

    pub fn category(&self) -> &CategoryKey {
        &self.category
    }

    pub fn focus(&self) -> &Focus {
        &self.focus
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Switches category and always returns focus to the overview.
    pub fn select_category(&mut self, category: CategoryKey) {
        self.category = category;
        self.focus = Focus::Overview;
    }

    /// Changes focus, rejecting identities missing from `identities`, which
    /// must be the index of the active category's collection.
    pub fn select_focus(
        &mut self,
        focus: Focus,
        identities: &IdentityIndex,
    ) -> Result<(), SelectionError> {
        if let Focus::Identity(identity) = &focus {
            if !identities.contains(identity) {
                return Err(SelectionError::UnknownIdentity {
                    identity: identity.clone(),
                    category: self.category.clone(),
                });
            }
        }
        self.focus = focus;
        Ok(())
    }

    pub fn select_granularity(&mut self, granularity: Granularity) {
        self.granularity = granularity;
    }

    pub fn current_view(&self) -> ViewRequest {
        match &self.focus {
            Focus::Overview => ViewRequest::Overview {
                category: self.category.clone(),
            },
            Focus::Identity(identity) => ViewRequest::Series {
                category: self.category.clone(),
                identity: identity.clone(),
                granularity: self.granularity,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Detection, DetectionCollection};
    use chrono::{Local, TimeZone};

    fn index(ids: &[&str]) -> IdentityIndex {
        let stamp = Local.timestamp_opt(1_700_000_000, 0).unwrap();
        let collection = DetectionCollection::new(
            CategoryKey::default(),
            ids.iter()
                .map(|id| Detection::new((*id).into(), 77.0, 28.5, stamp))
                .collect(),
        );
        IdentityIndex::build(&collection)
    }

    #[test]
    fn starts_on_default_category_overview() {
        let state = SelectionState::default();
        assert_eq!(state.category().as_str(), "face");
        assert_eq!(state.focus(), &Focus::Overview);
        assert_eq!(state.granularity(), Granularity::Daily);
    }

    #[test]
    fn category_change_resets_focus_only() {
        let mut state = SelectionState::default();
        state
            .select_focus(Focus::Identity("F1".into()), &index(&["F1"]))
            .unwrap();
        state.select_granularity(Granularity::Monthly);

        state.select_category("car".into());
        assert_eq!(state.focus(), &Focus::Overview);
        assert_eq!(state.granularity(), Granularity::Monthly);

        state
            .select_focus(Focus::Identity("F1".into()), &index(&["F1"]))
            .unwrap();
        state.select_category("car".into());
        assert_eq!(state.focus(), &Focus::Overview);
    }

    #[test]
    fn focus_and_granularity_are_independent() {
        let mut state = SelectionState::default();
        let identities = index(&["F1", "F2"]);
        state
            .select_focus(Focus::Identity("F2".into()), &identities)
            .unwrap();
        state.select_granularity(Granularity::Hourly);
        assert_eq!(state.focus(), &Focus::Identity("F2".into()));

        state.select_focus(Focus::Overview, &identities).unwrap();
        assert_eq!(state.granularity(), Granularity::Hourly);
    }

    #[test]
    fn unknown_identity_is_rejected_and_state_kept() {
        let mut state = SelectionState::default();
        let err = state
            .select_focus(Focus::Identity("C7".into()), &index(&["F1"]))
            .unwrap_err();
        assert_eq!(
            err,
            SelectionError::UnknownIdentity {
                identity: "C7".into(),
                category: "face".into()
            }
        );
        assert_eq!(state.focus(), &Focus::Overview);
    }

    #[test]
    fn current_view_follows_focus() {
        let mut state = SelectionState::new("car".into(), Granularity::Weekly);
        assert_eq!(
            state.current_view(),
            ViewRequest::Overview {
                category: "car".into()
            }
        );

        state
            .select_focus(Focus::Identity("C2".into()), &index(&["C1", "C2"]))
            .unwrap();
        assert_eq!(
            state.current_view(),
            ViewRequest::Series {
                category: "car".into(),
                identity: "C2".into(),
                granularity: Granularity::Weekly
            }
        );
    }

    #[test]
    fn focus_serializes_with_kind_tag() {
        let json = serde_json::to_string(&Focus::Identity("F1".into())).unwrap();
        assert_eq!(json, r#"{"kind":"identity","identity":"F1"}"#);
        let parsed: Focus = serde_json::from_str(r#"{"kind":"overview"}"#).unwrap();
        assert_eq!(parsed, Focus::Overview);
    }
}
