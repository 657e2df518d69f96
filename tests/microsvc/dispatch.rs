//! Direct dispatch of the planner commands.

use std::time::Instant;

use minimal_planner::microsvc::{CommandRequest, HandlerError, Session};
use minimal_planner::{RecordsExt, Todo, User};
use serde_json::json;

use crate::support::{planner, second_user, stranger_token};

#[test]
fn registers_every_kind() {
    let fx = planner();
    let commands = fx.service.commands();
    for kind in ["todo", "sticky", "list", "event"] {
        for op in ["create", "update", "delete", "all", "get"] {
            let name = format!("{kind}.{op}");
            assert!(commands.contains(&name.as_str()), "missing {name}");
        }
    }
    assert!(commands.contains(&"user.get"));
    assert_eq!(fx.service.kinds(), &["todo", "sticky", "list", "event"]);
}

#[test]
fn unknown_command() {
    let fx = planner();
    let err = fx
        .service
        .dispatch("todo.archive", json!({}), fx.session())
        .unwrap_err();
    assert!(matches!(err, HandlerError::UnknownCommand(_)));
    assert_eq!(err.status_code(), 404);
}

#[test]
fn create_then_list() {
    let fx = planner();
    let reply = fx
        .service
        .dispatch("todo.create", json!({ "name": "Buy milk" }), fx.session())
        .unwrap();
    assert_eq!(reply.status, 201);
    assert_eq!(reply.body["message"], "Todo Created Successfully");
    let id = reply.body["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());

    let reply = fx.service.dispatch("todo.all", json!(null), fx.session()).unwrap();
    assert_eq!(reply.status, 200);
    let items = reply.body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], id.as_str());
    assert_eq!(items[0]["name"], "Buy milk");
}

#[test]
fn empty_listings_use_markers() {
    let fx = planner();
    let cases = [
        ("todo.all", "No todos found for this user"),
        ("sticky.all", "No Sticky found for this user"),
        ("list.all", "No list found for this user"),
        ("event.all", "No events found for this user"),
    ];
    for (command, message) in cases {
        let reply = fx.service.dispatch(command, json!(null), fx.session()).unwrap();
        assert_eq!(reply.body, json!({ "message": message }));
    }
}

#[test]
fn validation_failure_is_bad_request_and_writes_nothing() {
    let fx = planner();
    let err = fx
        .service
        .dispatch("list.create", json!({ "name": "Home" }), fx.session())
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(fx.store.count("list").unwrap(), 0);
}

#[test]
fn owner_is_resolved_before_validation() {
    let fx = planner();
    let err = fx
        .service
        .dispatch(
            "list.create",
            json!({}),
            Session::bearer(&stranger_token()),
        )
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[test]
fn non_object_payload_is_rejected_by_guard() {
    let fx = planner();
    let err = fx
        .service
        .dispatch("todo.create", json!(["Buy milk"]), fx.session())
        .unwrap_err();
    assert!(matches!(err, HandlerError::GuardRejected(_)));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn wrongly_typed_field_is_decode_failure() {
    let fx = planner();
    let err = fx
        .service
        .dispatch("todo.create", json!({ "name": 42 }), fx.session())
        .unwrap_err();
    assert!(matches!(err, HandlerError::DecodeFailed(_)));
}

#[test]
fn sticky_partial_update_by_body_id() {
    let fx = planner();
    let reply = fx
        .service
        .dispatch(
            "sticky.create",
            json!({ "topic": "Old", "content": "body", "color": "yellow" }),
            fx.session(),
        )
        .unwrap();
    let id = reply.body["id"].as_str().unwrap().to_string();

    let reply = fx
        .service
        .dispatch("sticky.update", json!({ "id": id, "topic": "New" }), fx.session())
        .unwrap();
    assert_eq!(
        reply.body,
        json!({ "message": "Sticky updated successfully", "matched": 1, "updated": 1 })
    );

    let reply = fx.service.dispatch("sticky.all", json!(null), fx.session()).unwrap();
    assert_eq!(reply.body[0]["topic"], "New");
    assert_eq!(reply.body[0]["content"], "body");
    assert_eq!(reply.body[0]["color"], "yellow");
}

#[test]
fn update_without_id_is_bad_request() {
    let fx = planner();
    let err = fx
        .service
        .dispatch("todo.update", json!({ "name": "x" }), fx.session())
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[test]
fn targeted_update_and_delete() {
    let fx = planner();
    let reply = fx
        .service
        .dispatch("todo.create", json!({ "name": "Buy milk" }), fx.session())
        .unwrap();
    let id = reply.body["id"].as_str().unwrap().to_string();

    let reply = fx
        .service
        .dispatch_to(
            "todo.update",
            Some(&id),
            json!({ "name": "Buy bread", "due_date": "2024-05-01" }),
            fx.session(),
        )
        .unwrap();
    assert_eq!(reply.body["message"], "Todo updated successfully");

    let todo = fx.store.records::<Todo>().get(&id).unwrap().unwrap();
    assert_eq!(todo.name, "Buy bread");
    assert_eq!(todo.due_date, "2024-05-01");

    let reply = fx
        .service
        .dispatch_to("todo.delete", Some(&id), json!(null), fx.session())
        .unwrap();
    assert_eq!(reply.body, json!({ "message": "Todo Deleted Successfully" }));

    let err = fx
        .service
        .dispatch_to("todo.delete", Some(&id), json!(null), fx.session())
        .unwrap_err();
    assert_eq!(err.status_code(), 404);

    let user = fx.store.records::<User>().get("u-ann").unwrap().unwrap();
    assert!(user.todos.is_empty());
}

#[test]
fn get_single_list() {
    let fx = planner();
    let reply = fx
        .service
        .dispatch("list.create", json!({ "name": "Home", "color": "blue" }), fx.session())
        .unwrap();
    let id = reply.body["id"].as_str().unwrap().to_string();

    let reply = fx
        .service
        .dispatch_to("list.get", Some(&id), json!(null), fx.session())
        .unwrap();
    assert_eq!(reply.body, json!({ "id": id, "name": "Home", "color": "blue" }));

    let err = fx
        .service
        .dispatch_to("list.get", Some("missing"), json!(null), fx.session())
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[test]
fn request_response_envelope() {
    let fx = planner();
    let mut request = CommandRequest {
        command: "event.create".into(),
        input: json!({
            "title": "Standup",
            "start": "2024-05-01T09:00:00Z",
            "end": "2024-05-01T09:15:00Z",
            "color": "green",
        }),
        ..CommandRequest::default()
    };
    request
        .session_variables
        .insert("authorization".into(), format!("Bearer {}", fx.token));

    let response = fx.service.dispatch_request(&request);
    assert_eq!(response.status, 201);
    assert_eq!(response.body["message"], "Event Created Successfully");

    request.input = json!({ "title": "No times" });
    let response = fx.service.dispatch_request(&request);
    assert_eq!(response.status, 400);
    assert!(response.body["error"].is_string());
}

#[test]
fn foreign_delete_is_not_found_and_keeps_both_copies() {
    let fx = planner();
    let bob = Session::bearer(&second_user(&fx));
    let reply = fx
        .service
        .dispatch("todo.create", json!({ "name": "Buy milk" }), fx.session())
        .unwrap();
    let id = reply.body["id"].as_str().unwrap().to_string();

    let err = fx
        .service
        .dispatch_to("todo.delete", Some(&id), json!(null), bob)
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert!(fx.store.records::<Todo>().get(&id).unwrap().is_some());

    let reply = fx
        .service
        .dispatch_to("todo.delete", Some(&id), json!(null), fx.session())
        .unwrap();
    assert_eq!(reply.status, 200);
    let user = fx.store.records::<User>().get("u-ann").unwrap().unwrap();
    assert!(user.todos.is_empty());
}

#[test]
fn passed_deadline_is_timeout_without_writes() {
    let fx = planner();
    let err = fx
        .service
        .dispatch_before(
            "todo.create",
            None,
            json!({ "name": "Buy milk" }),
            fx.session(),
            Instant::now(),
        )
        .unwrap_err();
    assert!(matches!(err, HandlerError::Timeout));
    assert_eq!(err.status_code(), 504);
    assert_eq!(fx.store.count("todo").unwrap(), 0);

    let reply = fx
        .service
        .dispatch_before(
            "todo.all",
            None,
            json!(null),
            fx.session(),
            Instant::now(),
        )
        .unwrap();
    assert_eq!(reply.body["message"], "No todos found for this user");
}
