mod common;

use common::at;
use lazytodo_core::{Descriptor, Task, TaskState, TaskType, TaskTypeChange};
use serde_json::json;

#[test]
fn descriptors_serialize_with_type_tag() {
    let value = serde_json::to_value(Descriptor::ChangeTaskType {
        task: TaskTypeChange {
            id: 1,
            kind: TaskType::Done,
            is_animating: true,
        },
    })
    .unwrap();

    assert_eq!(
        value,
        json!({
            "type": "CHANGE_TASK_TYPE",
            "task": { "id": 1, "type": "DONE", "isAnimating": true }
        })
    );
}

#[test]
fn unit_and_optional_descriptors_keep_compact_shape() {
    assert_eq!(
        serde_json::to_value(Descriptor::ClearDeferringTask).unwrap(),
        json!({ "type": "CLEAR_DEFERRING_TASK" })
    );
    assert_eq!(
        serde_json::to_value(Descriptor::SetInvalidated { id: None }).unwrap(),
        json!({ "type": "SET_INVALIDATED" })
    );
}

#[test]
fn add_task_descriptor_replays_from_json() {
    let descriptor = Descriptor::AddTask {
        task: Task::new(3, "Write tests", at(1_445_444_940)),
    };
    let value = serde_json::to_value(&descriptor).unwrap();

    assert_eq!(value["type"], "ADD_TASK");
    assert_eq!(value["task"]["timestamp"], "2015-10-21T16:29:00Z");
    assert_eq!(value["task"]["type"], "CURRENT");
    assert_eq!(value["task"]["defer"]["state"], "idle");

    let decoded: Descriptor = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, descriptor);
}

#[test]
fn defer_task_descriptor_accepts_missing_until() {
    let decoded: Descriptor = serde_json::from_value(json!({
        "type": "DEFER_TASK",
        "id": 4,
        "isAnimating": false
    }))
    .unwrap();

    assert_eq!(
        decoded,
        Descriptor::DeferTask {
            id: 4,
            until: None,
            is_animating: false
        }
    );
}

#[test]
fn state_uses_camel_case_keys() {
    let mut state = TaskState::empty();
    state.filter_type = TaskType::Deferred;
    let value = serde_json::to_value(&state).unwrap();
    assert_eq!(value, json!({ "tasks": [], "filterType": "DEFERRED" }));
}
