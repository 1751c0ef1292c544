#![cfg(feature = "reqwest")]

mod common;

// std
use std::time::Duration as StdDuration;
// crates.io
use httpmock::prelude::*;
// self
use common::*;
use taskdeck_client::{
	error::ErrorKind,
	tasks::{NewTask, TaskId, TaskPatch, TaskPriority, TaskQuery, TaskStatus},
};

fn task_id(value: &str) -> TaskId {
	TaskId::new(value).expect("Task id fixture should be valid.")
}

#[tokio::test]
async fn list_tasks_filters_and_coalesces() {
	let server = MockServer::start_async().await;
	let (client, _) = reqwest_client(&server.base_url());
	let list = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/tasks")
				.query_param("status", "in_progress")
				.query_param("search", "docs")
				.header("authorization", "Bearer access-1");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"tasks":[{"id":4,"title":"Write docs","status":"in_progress"}]}"#)
				.delay(StdDuration::from_millis(50));
		})
		.await;

	seed(client.session(), credential("access-1", Some("refresh-1"))).await;

	let query = TaskQuery::default().with_status(TaskStatus::InProgress).with_search("docs");
	let (a, b) = tokio::join!(client.list_tasks(&query), client.list_tasks(&query));
	let a = a.expect("Listing should succeed.");

	assert_eq!(a, b.expect("Joined listing should succeed."));
	assert_eq!(a.len(), 1);
	assert_eq!(a[0].id, task_id("4"));
	assert_eq!(a[0].status, TaskStatus::InProgress);

	list.assert_calls_async(1).await;
}

#[tokio::test]
async fn task_crud_round_trip() {
	let server = MockServer::start_async().await;
	let (client, _) = reqwest_client(&server.base_url());
	let create = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/tasks")
				.json_body(serde_json::json!({ "title": "Ship", "priority": "high" }));
			then.status(201)
				.header("content-type", "application/json")
				.body(r#"{"task":{"id":"t-1","title":"Ship","priority":"high"}}"#);
		})
		.await;
	let fetch = server
		.mock_async(|when, then| {
			when.method(GET).path("/tasks/t-1");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"id":"t-1","title":"Ship","priority":"high"}"#);
		})
		.await;
	let replace = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path("/tasks/t-1")
				.json_body(serde_json::json!({ "title": "Ship it", "status": "todo" }));
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"id":"t-1","title":"Ship it","status":"todo"}"#);
		})
		.await;
	let update = server
		.mock_async(|when, then| {
			when.method(PATCH).path("/tasks/t-1").json_body(serde_json::json!({ "status": "done" }));
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"id":"t-1","title":"Ship it","status":"done"}"#);
		})
		.await;
	let delete = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/tasks/t-1");
			then.status(204);
		})
		.await;

	seed(client.session(), credential("access-1", Some("refresh-1"))).await;

	let id = task_id("t-1");
	let created = client
		.create_task(&NewTask::new("Ship").with_priority(TaskPriority::High))
		.await
		.expect("Create should succeed.");

	assert_eq!(created.id, id);

	let fetched = client.get_task(&id).await.expect("Fetch should succeed.");

	assert_eq!(fetched.priority, Some(TaskPriority::High));

	let replaced = client
		.replace_task(&id, &NewTask::new("Ship it").with_status(TaskStatus::Todo))
		.await
		.expect("Replace should succeed.");

	assert_eq!(replaced.title, "Ship it");

	let updated = client
		.update_task(&id, &TaskPatch::default().status(TaskStatus::Done))
		.await
		.expect("Update should succeed.");

	assert_eq!(updated.status, TaskStatus::Done);

	client.delete_task(&id).await.expect("Delete should succeed.");

	create.assert_async().await;
	fetch.assert_async().await;
	replace.assert_async().await;
	update.assert_async().await;
	delete.assert_async().await;
}

#[tokio::test]
async fn missing_task_is_a_validation_error() {
	let server = MockServer::start_async().await;
	let (client, _) = reqwest_client(&server.base_url());
	let _missing = server
		.mock_async(|when, then| {
			when.method(GET).path("/tasks/404");
			then.status(404).header("content-type", "application/json").body("{}");
		})
		.await;

	seed(client.session(), credential("access-1", Some("refresh-1"))).await;

	let err = client.get_task(&task_id("404")).await.expect_err("Missing task should fail.");

	assert_eq!(err.kind(), ErrorKind::Validation);
	assert_eq!(err.to_string(), "Request failed: Not Found.");
}

#[tokio::test]
async fn malformed_task_reports_payload_error() {
	let server = MockServer::start_async().await;
	let (client, _) = reqwest_client(&server.base_url());
	let _broken = server
		.mock_async(|when, then| {
			when.method(GET).path("/tasks/9");
			then.status(200).header("content-type", "application/json").body(r#"{"id":9}"#);
		})
		.await;

	seed(client.session(), credential("access-1", Some("refresh-1"))).await;

	let err = client.get_task(&task_id("9")).await.expect_err("Task without title should fail.");

	assert_eq!(err.kind(), ErrorKind::Payload);
}
