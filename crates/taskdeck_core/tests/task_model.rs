use taskdeck_core::{Priority, Task, TaskValidationError};
use uuid::Uuid;

#[test]
fn task_new_sets_defaults() {
    let task = Task::new("hello", 3);

    assert!(!task.id.is_nil());
    assert_eq!(task.title, "hello");
    assert_eq!(task.description, None);
    assert_eq!(task.priority, Priority::Low);
    assert_eq!(task.due_date, None);
    assert!(!task.is_completed);
    assert_eq!(task.position, 3);
}

#[test]
fn task_serialization_uses_expected_wire_fields() {
    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let mut task = Task::with_id(id, "Call Alice", 1).unwrap();
    task.description = Some("about the trip".to_string());
    task.priority = Priority::High;
    task.due_date = Some(1_700_000_000_000);

    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["id"], id.to_string());
    assert_eq!(json["title"], "Call Alice");
    assert_eq!(json["description"], "about the trip");
    assert_eq!(json["priority"], "high");
    assert_eq!(json["due_date"], 1_700_000_000_000_i64);
    assert_eq!(json["is_completed"], false);
    assert_eq!(json["position"], 1);

    let decoded: Task = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, task);
}

#[test]
fn validate_rejects_nil_id() {
    let mut task = Task::new("nil", 0);
    task.id = Uuid::nil();

    assert_eq!(task.validate(), Err(TaskValidationError::NilId));
}
