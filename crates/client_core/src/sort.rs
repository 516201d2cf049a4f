//! Single-column sort state of a list view.

use shared::protocol::SortDirection;

/// Active sort column. There is always exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub field: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Clicking the active column flips its direction; any other column starts ascending.
    pub fn toggle(&mut self, field: &str) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field.to_string();
            self.direction = SortDirection::Asc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn same_field_flips_direction() {
        let mut sort = SortState::ascending("name");
        sort.toggle("name");
        assert_eq!(sort.direction, SortDirection::Desc);
        sort.toggle("name");
        assert_eq!(sort.direction, SortDirection::Asc);
    }

    #[test]
    fn new_field_resets_to_ascending() {
        let mut sort = SortState::ascending("name");
        sort.toggle("name");
        sort.toggle("createdAt");
        assert_eq!(sort, SortState::ascending("createdAt"));
    }

    proptest! {
        #[test]
        fn double_toggle_is_identity(field in "[a-zA-Z]{1,12}", desc in any::<bool>()) {
            let mut sort = SortState::ascending(field.clone());
            if desc {
                sort.toggle(&field);
            }
            let before = sort.clone();
            sort.toggle(&field);
            sort.toggle(&field);
            prop_assert_eq!(sort, before);
        }

        #[test]
        fn switching_field_always_ascends(other in "[a-z]{1,12}", desc in any::<bool>()) {
            prop_assume!(other != "plateNumber");
            let mut sort = SortState::ascending("plateNumber");
            if desc {
                sort.toggle("plateNumber");
            }
            sort.toggle(&other);
            prop_assert_eq!(sort.direction, SortDirection::Asc);
            prop_assert_eq!(sort.field, other);
        }
    }
}
