use std::sync::Arc;

use xsig_hook::{Options, XHook};

use crate::test_ctx::{SimObject, SimRuntime};

const HOLDER: &str = "com.app.view.Holder";
const WIDGET: &str = "com.app.view.Widget";

fn sample_holder() -> Arc<SimObject> {
    SimObject::holder(
        HOLDER,
        &[
            ("a", SimObject::leaf(WIDGET, 1)),
            ("b", SimObject::leaf("com.app.view.Label", 2)),
            ("d", SimObject::leaf("com.app.view.FancyWidget", 3)),
        ],
    )
}

pub fn scenario_hit_any() {
    let hook = XHook::new(SimRuntime::app(), Options::default());
    let holder = sample_holder();
    let widget = WIDGET.to_string();

    let first = hook.hit_any(&holder, &widget, |_| true);
    assert_eq!(first.map(|value| value.tag), Some(1), "first in declaration order");

    // c 为 null 被跳过，d 的运行时类型是 Widget 的子类
    let fancy = hook.hit_any(&holder, &widget, |value| value.tag != 1);
    assert_eq!(fancy.map(|value| value.tag), Some(3));

    let none = hook.hit_any(&holder, &widget, |value| value.tag > 10);
    assert!(none.is_none());
    let label = hook.hit_any(&holder, &"com.app.view.Label".to_string(), |_| true);
    assert_eq!(label.map(|value| value.tag), Some(2));
}

pub fn scenario_find_component() {
    let hook = XHook::new(SimRuntime::app(), Options::default());
    let holder_class = HOLDER.to_string();

    let fields: Vec<String> = hook
        .find_component_in_class(&holder_class, WIDGET)
        .into_iter()
        .map(|field| field.name)
        .collect();
    assert_eq!(fields, vec!["a", "c", "d"]);
    assert!(hook.find_component_in_class(&holder_class, "Widget").is_empty(), "exact match only");

    let holder = sample_holder();
    let values = hook.find_component_in_object(&holder, WIDGET);
    let tags: Vec<i32> = values.iter().map(|value| value.tag).collect();
    assert_eq!(tags, vec![1, 3], "null field c skipped");
}
