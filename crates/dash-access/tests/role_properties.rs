//! Role hierarchy ordering and instance visibility properties

use std::collections::BTreeMap;

use dash_access::{
    can_view_widget_instance, filter_widgets_by_role, get_all_flags, has_role_access, Role,
};
use dash_schema::WidgetPermissions;
use dash_test_utils::notes_widget;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn role_name() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => role().prop_map(|r| r.as_str().to_string()),
        1 => "[a-z]{1,8}",
    ]
}

fn permissions() -> impl Strategy<Value = WidgetPermissions> {
    prop::collection::btree_map(
        "w-[0-9]",
        prop::collection::vec(role_name(), 0..4),
        0..8,
    )
}

proptest! {
    #[test]
    fn access_is_a_total_order(a in role(), b in role(), c in role()) {
        let access = |x: Role, y: Role| has_role_access(x.as_str(), y.as_str());

        prop_assert!(access(a, a));
        prop_assert!(access(a, b) || access(b, a));
        if a != b {
            prop_assert!(access(a, b) != access(b, a));
        }
        if access(a, b) && access(b, c) {
            prop_assert!(access(a, c));
        }
        prop_assert_eq!(access(a, b), a >= b);
    }

    #[test]
    fn unknown_roles_never_grant(name in "[a-z]{1,8}", known in role()) {
        prop_assume!(name.parse::<Role>().is_err());
        prop_assert!(!has_role_access(&name, known.as_str()));
        prop_assert!(!has_role_access(known.as_str(), &name));
    }

    #[test]
    fn admin_sees_every_instance(permissions in permissions(), count in 0u32..10) {
        let widgets: Vec<_> = (0..count)
            .map(|i| notes_widget(&format!("w-{i}"), i))
            .collect();

        for widget in &widgets {
            prop_assert!(can_view_widget_instance(widget, &permissions, "admin"));
        }
        let visible = filter_widgets_by_role(&widgets, &permissions, "admin");
        prop_assert_eq!(visible.len(), widgets.len());
    }

    #[test]
    fn filtering_keeps_input_order(permissions in permissions(), user in role()) {
        let widgets: Vec<_> = (0..10).map(|i| notes_widget(&format!("w-{i}"), i)).collect();
        let visible = filter_widgets_by_role(&widgets, &permissions, user.as_str());

        let positions: Vec<_> = visible
            .iter()
            .filter_map(|v| widgets.iter().position(|w| w.id == v.id))
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        prop_assert_eq!(positions, sorted);
    }
}

#[test]
fn empty_role_list_hides_from_all_but_admin() {
    let widgets = vec![notes_widget("w-0", 0), notes_widget("w-1", 1)];
    let permissions = BTreeMap::from([("w-0".to_string(), Vec::new())]);

    for role in Role::ALL {
        let ids: Vec<_> = filter_widgets_by_role(&widgets, &permissions, role.as_str())
            .into_iter()
            .map(|w| w.id.as_str())
            .collect();
        let expected = if role == Role::Admin { vec!["w-0", "w-1"] } else { vec!["w-1"] };
        assert_eq!(ids, expected, "role {role}");
    }
}

#[test]
fn resolved_flags_serialize_camel_case() {
    let flags = get_all_flags(&BTreeMap::from([("darkMode".to_string(), false)]));
    let dark = flags.iter().find(|f| f.key == "darkMode").unwrap();
    let value = serde_json::to_value(dark).unwrap();

    assert_eq!(value["key"], "darkMode");
    assert_eq!(value["enabled"], false);
    assert_eq!(value["isOverridden"], true);
}
