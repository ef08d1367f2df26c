//! List-editable collections (references, payloads).
//!
//! A [`ListOp`] records edits rather than a final list: an explicit list, or
//! prepended/appended/deleted/ordered items applied on top of weaker opinions.
//! Rewriting an asset path must touch every list the item appears in while
//! keeping the order of untouched items, which is what
//! [`ListOp::modify_item_edits`] does.

use serde::{Deserialize, Serialize};

/// A list-edit operation over items of type `T`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOp<T> {
    /// Explicit items; when set, the other lists are ignored on application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit: Option<Vec<T>>,
    /// Items prepended to weaker opinions.
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub prepended: Vec<T>,
    /// Items appended to weaker opinions.
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub appended: Vec<T>,
    /// Items removed from weaker opinions.
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub deleted: Vec<T>,
    /// Reordering hint.
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub ordered: Vec<T>,
}

impl<T> Default for ListOp<T> {
    fn default() -> Self {
        Self {
            explicit: None,
            prepended: Vec::new(),
            appended: Vec::new(),
            deleted: Vec::new(),
            ordered: Vec::new(),
        }
    }
}

impl<T: Clone + PartialEq> ListOp<T> {
    /// Creates an explicit list op.
    pub fn explicit(items: Vec<T>) -> Self {
        Self {
            explicit: Some(items),
            ..Self::default()
        }
    }

    /// Creates a list op that prepends `items`.
    pub fn prepended(items: Vec<T>) -> Self {
        Self {
            prepended: items,
            ..Self::default()
        }
    }

    /// Returns `true` when the list op holds no edits at all.
    pub fn is_empty(&self) -> bool {
        self.explicit.is_none()
            && self.prepended.is_empty()
            && self.appended.is_empty()
            && self.deleted.is_empty()
            && self.ordered.is_empty()
    }

    /// Iterates every item of every list, explicit items first.
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.explicit
            .iter()
            .flatten()
            .chain(self.prepended.iter())
            .chain(self.appended.iter())
            .chain(self.deleted.iter())
            .chain(self.ordered.iter())
    }

    /// The list this op produces when applied to an empty weaker list.
    pub fn applied_items(&self) -> Vec<T> {
        if let Some(explicit) = &self.explicit {
            return explicit.clone();
        }
        let mut result: Vec<T> = Vec::new();
        for item in self.prepended.iter().chain(self.appended.iter()) {
            if !self.deleted.contains(item) && !result.contains(item) {
                result.push(item.clone());
            }
        }
        result
    }

    /// Maps every item of every list through `f`.
    ///
    /// `None` removes the item, `Some` replaces it. Untouched items keep their
    /// position; a replacement that duplicates an earlier item of the same
    /// list is dropped. Returns `true` if any list changed.
    pub fn modify_item_edits<F>(&mut self, mut f: F) -> bool
    where
        F: FnMut(&T) -> Option<T>,
    {
        let mut changed = false;

        if let Some(explicit) = self.explicit.as_mut() {
            changed |= modify_list(explicit, &mut f);
        }
        changed |= modify_list(&mut self.prepended, &mut f);
        changed |= modify_list(&mut self.appended, &mut f);
        changed |= modify_list(&mut self.deleted, &mut f);
        changed |= modify_list(&mut self.ordered, &mut f);

        changed
    }
}

fn modify_list<T, F>(list: &mut Vec<T>, f: &mut F) -> bool
where
    T: Clone + PartialEq,
    F: FnMut(&T) -> Option<T>,
{
    let mut updated: Vec<T> = Vec::with_capacity(list.len());
    for item in list.iter() {
        if let Some(new_item) = f(item) {
            if !updated.contains(&new_item) {
                updated.push(new_item);
            }
        }
    }

    if updated == *list {
        return false;
    }
    *list = updated;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modify_item_edits_replace_and_remove() {
        let mut op = ListOp::prepended(vec!["a", "b", "c"]);
        op.appended = vec!["d"];

        let changed = op.modify_item_edits(|item| match *item {
            "b" => None,
            "c" => Some("z"),
            other => Some(other),
        });

        assert!(changed);
        assert_eq!(op.prepended, vec!["a", "z"]);
        assert_eq!(op.appended, vec!["d"]);
    }

    #[test]
    fn test_modify_item_edits_no_change() {
        let mut op = ListOp::explicit(vec![1, 2, 3]);
        assert!(!op.modify_item_edits(|i| Some(*i)));
        assert_eq!(op.explicit, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_modify_item_edits_collapses_duplicates() {
        let mut op = ListOp::prepended(vec!["a", "b"]);
        assert!(op.modify_item_edits(|_| Some("a")));
        assert_eq!(op.prepended, vec!["a"]);
    }

    #[test]
    fn test_applied_items() {
        let mut op = ListOp::prepended(vec!["a", "b"]);
        op.appended = vec!["c"];
        op.deleted = vec!["b"];
        assert_eq!(op.applied_items(), vec!["a", "c"]);
        assert_eq!(op.items().count(), 4);
    }
}
