//! Navigation Builder
//!
//! Derives the client menu from a permission set and nothing else.

use serde::Serialize;

use crate::domain::value_object::permission_set::PermissionSet;

/// (permission, title, route name, icon)
const TOP_LEVEL: [(&str, &str, &str, &str); 3] = [
    ("view-home", "Home", "root", "tabler-smart-home"),
    ("view-product", "Product", "products", "tabler-file"),
    ("view-users", "User", "users", "tabler-user-circle"),
];

const SETTING_PERMISSION: &str = "view-setting";
const SETTING_TITLE: &str = "Setting";
const SETTING_ICON: &str = "tabler-settings";

/// (permission, title, route name)
const SETTING_CHILDREN: [(&str, &str, &str); 3] = [
    ("view-role-setting", "Role", "settings-role"),
    ("view-module-setting", "Permission", "settings-permission"),
    ("view-config-setting", "Config", "settings-config"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavRoute {
    pub name: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavIcon {
    pub icon: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavChild {
    pub title: &'static str,
    pub to: &'static str,
}

/// A menu entry. Groups carry children and no route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NavRoute>,
    pub icon: NavIcon,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavChild>,
}

/// Menu entries in fixed order. The settings group appears only when
/// `view-setting` and at least one of its children are granted.
pub fn build_navigation(permissions: &PermissionSet) -> Vec<NavItem> {
    let mut items: Vec<NavItem> = TOP_LEVEL
        .iter()
        .filter(|(permission, ..)| permissions.contains(permission))
        .map(|&(_, title, route, icon)| NavItem {
            title,
            to: Some(NavRoute { name: route }),
            icon: NavIcon { icon },
            children: Vec::new(),
        })
        .collect();

    if permissions.contains(SETTING_PERMISSION) {
        let children: Vec<NavChild> = SETTING_CHILDREN
            .iter()
            .filter(|(permission, ..)| permissions.contains(permission))
            .map(|&(_, title, to)| NavChild { title, to })
            .collect();

        if !children.is_empty() {
            items.push(NavItem {
                title: SETTING_TITLE,
                to: None,
                icon: NavIcon { icon: SETTING_ICON },
                children,
            });
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> PermissionSet {
        names.iter().copied().collect()
    }

    #[test]
    fn test_empty_set_has_no_entries() {
        assert!(build_navigation(&PermissionSet::new()).is_empty());
    }

    #[test]
    fn test_top_level_order_is_fixed() {
        let nav = build_navigation(&set(&["view-users", "view-home", "view-product"]));
        let titles: Vec<_> = nav.iter().map(|item| item.title).collect();
        assert_eq!(titles, ["Home", "Product", "User"]);
        assert_eq!(nav[0].to, Some(NavRoute { name: "root" }));
        assert_eq!(nav[2].icon.icon, "tabler-user-circle");
    }

    #[test]
    fn test_setting_without_children_is_hidden() {
        assert!(build_navigation(&set(&["view-setting"])).is_empty());
    }

    #[test]
    fn test_children_without_setting_are_hidden() {
        assert!(build_navigation(&set(&["view-role-setting", "view-config-setting"])).is_empty());
    }

    #[test]
    fn test_setting_with_one_child() {
        let nav = build_navigation(&set(&["view-setting", "view-role-setting"]));
        assert_eq!(nav.len(), 1);
        assert_eq!(nav[0].title, "Setting");
        assert_eq!(nav[0].to, None);
        assert_eq!(
            nav[0].children,
            vec![NavChild {
                title: "Role",
                to: "settings-role"
            }]
        );
    }

    #[test]
    fn test_children_keep_declaration_order() {
        let nav = build_navigation(&set(&[
            "view-config-setting",
            "view-setting",
            "view-module-setting",
            "view-role-setting",
        ]));
        let titles: Vec<_> = nav[0].children.iter().map(|c| c.title).collect();
        assert_eq!(titles, ["Role", "Permission", "Config"]);
    }

    #[test]
    fn test_serialized_shape() {
        let nav = build_navigation(&set(&["view-home", "view-setting", "view-module-setting"]));
        let json = serde_json::to_value(&nav).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"title": "Home", "to": {"name": "root"}, "icon": {"icon": "tabler-smart-home"}},
                {
                    "title": "Setting",
                    "icon": {"icon": "tabler-settings"},
                    "children": [{"title": "Permission", "to": "settings-permission"}]
                }
            ])
        );
    }

    #[test]
    fn test_same_set_same_menu() {
        let permissions = set(&[
            "view-home",
            "view-users",
            "view-setting",
            "view-config-setting",
        ]);
        let first = build_navigation(&permissions);
        assert_eq!(first, build_navigation(&permissions));
    }
}
