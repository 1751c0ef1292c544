//! Typed task API over the authenticated client.
//!
//! Reads go through [`AuthenticatedClient::get_deduplicated`], so a dashboard that asks for
//! the same list from several widgets at once issues one call. Writes are never coalesced.

mod id;

pub use id::{TaskId, TaskIdError};

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	client::{AuthenticatedClient, RequestKey},
	error::PayloadError,
	http::{ApiResponse, ApiTransport, Method},
};

/// Workflow status of a task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
	/// Not started.
	#[default]
	Todo,
	/// Being worked on.
	InProgress,
	/// Finished.
	Done,
	/// Any status this client does not know about yet.
	#[serde(other)]
	Unknown,
}
impl TaskStatus {
	/// Returns the wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			TaskStatus::Todo => "todo",
			TaskStatus::InProgress => "in_progress",
			TaskStatus::Done => "done",
			TaskStatus::Unknown => "unknown",
		}
	}
}
impl Display for TaskStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Task priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
	/// Can wait.
	Low,
	/// Default urgency.
	Medium,
	/// Needs attention first.
	High,
}

/// Task as returned by the API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
	/// Server-assigned identifier.
	pub id: TaskId,
	/// Short title.
	pub title: String,
	/// Free-form description.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Workflow status.
	#[serde(default)]
	pub status: TaskStatus,
	/// Priority, when set.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub priority: Option<TaskPriority>,
	/// Due date (RFC 3339), when set.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	#[serde(with = "time::serde::rfc3339::option")]
	pub due_date: Option<OffsetDateTime>,
	/// Remaining fields the API returned.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body for creating or fully replacing a task.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewTask {
	/// Short title.
	pub title: String,
	/// Free-form description.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Initial status; the API default applies when unset.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<TaskStatus>,
	/// Priority.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub priority: Option<TaskPriority>,
	/// Due date.
	#[serde(skip_serializing_if = "Option::is_none")]
	#[serde(with = "time::serde::rfc3339::option")]
	pub due_date: Option<OffsetDateTime>,
}
impl NewTask {
	/// Creates a body carrying only a title.
	pub fn new(title: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			description: None,
			status: None,
			priority: None,
			due_date: None,
		}
	}

	/// Sets the description.
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());

		self
	}

	/// Sets the status.
	pub fn with_status(mut self, status: TaskStatus) -> Self {
		self.status = Some(status);

		self
	}

	/// Sets the priority.
	pub fn with_priority(mut self, priority: TaskPriority) -> Self {
		self.priority = Some(priority);

		self
	}

	/// Sets the due date.
	pub fn with_due_date(mut self, due_date: OffsetDateTime) -> Self {
		self.due_date = Some(due_date);

		self
	}
}

/// Partial update; only the fields that are set are sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TaskPatch {
	/// New title.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	/// New description.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// New status.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<TaskStatus>,
	/// New priority.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub priority: Option<TaskPriority>,
	/// New due date.
	#[serde(skip_serializing_if = "Option::is_none")]
	#[serde(with = "time::serde::rfc3339::option")]
	pub due_date: Option<OffsetDateTime>,
}
impl TaskPatch {
	/// Returns `true` when no field is set.
	pub fn is_empty(&self) -> bool {
		self == &Self::default()
	}

	/// Sets the title.
	pub fn title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());

		self
	}

	/// Sets the description.
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());

		self
	}

	/// Sets the status.
	pub fn status(mut self, status: TaskStatus) -> Self {
		self.status = Some(status);

		self
	}

	/// Sets the priority.
	pub fn priority(mut self, priority: TaskPriority) -> Self {
		self.priority = Some(priority);

		self
	}

	/// Sets the due date.
	pub fn due_date(mut self, due_date: OffsetDateTime) -> Self {
		self.due_date = Some(due_date);

		self
	}
}

/// Filters for [`AuthenticatedClient::list_tasks`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TaskQuery {
	/// Only tasks in this status.
	pub status: Option<TaskStatus>,
	/// Free-text search.
	pub search: Option<String>,
}
impl TaskQuery {
	/// Restricts the listing to `status`.
	pub fn with_status(mut self, status: TaskStatus) -> Self {
		self.status = Some(status);

		self
	}

	/// Adds a free-text search.
	pub fn with_search(mut self, search: impl Into<String>) -> Self {
		self.search = Some(search.into());

		self
	}

	/// Builds the read key for the task collection at `tasks_path`.
	pub fn key(&self, tasks_path: &str) -> RequestKey {
		let mut key = RequestKey::get(tasks_path);

		if let Some(status) = self.status {
			key = key.with_query("status", status.as_str());
		}
		if let Some(search) = self.search.as_deref() {
			key = key.with_query("search", search);
		}

		key
	}
}

/// Wrapper fields a task listing may arrive under.
const LIST_FIELDS: &[&str] = &["tasks", "data"];
/// Wrapper fields a single task may arrive under.
const TASK_FIELDS: &[&str] = &["task"];

/// Decodes a response that is either bare or wrapped in one of `fields`.
///
/// The shape is picked on the raw JSON first so a decode failure reports the path inside
/// the payload instead of an untagged "no variant matched" error.
fn decode_wrapped<R>(response: &ApiResponse, fields: &[&str]) -> Result<R>
where
	R: DeserializeOwned,
{
	let inner = match response.json::<Value>()? {
		Value::Object(mut map) => match fields.iter().find_map(|field| map.remove(*field)) {
			Some(inner) => inner,
			None => Value::Object(map),
		},
		other => other,
	};

	serde_path_to_error::deserialize(inner)
		.map_err(|e| PayloadError::decode(e, response.status).into())
}

impl<T> AuthenticatedClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Lists tasks matching `query`, sharing the call with identical concurrent listings.
	pub async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>> {
		let key = query.key(&self.session().config.endpoints.tasks);
		let response = self.get_deduplicated(key).await?;

		decode_wrapped(&response, LIST_FIELDS)
	}

	/// Fetches one task, sharing the call with identical concurrent fetches.
	pub async fn get_task(&self, id: &TaskId) -> Result<Task> {
		let key = RequestKey::get(&self.task_path(id));
		let response = self.get_deduplicated(key).await?;

		decode_wrapped(&response, TASK_FIELDS)
	}

	/// Creates a task.
	pub async fn create_task(&self, task: &NewTask) -> Result<Task> {
		let path = self.session().config.endpoints.tasks.clone();

		self.write(Method::Post, &path, task).await
	}

	/// Replaces every field of a task.
	pub async fn replace_task(&self, id: &TaskId, task: &NewTask) -> Result<Task> {
		self.write(Method::Put, &self.task_path(id), task).await
	}

	/// Updates the fields set in `patch`.
	pub async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task> {
		self.write(Method::Patch, &self.task_path(id), patch).await
	}

	/// Deletes a task; any response body is ignored.
	pub async fn delete_task(&self, id: &TaskId) -> Result<()> {
		self.execute(Method::Delete, &self.task_path(id), None).await?;

		Ok(())
	}

	async fn write<B>(&self, method: Method, path: &str, body: &B) -> Result<Task>
	where
		B: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(body).map_err(PayloadError::encode)?;
		let response = self.execute(method, path, Some(body)).await?;

		decode_wrapped(&response, TASK_FIELDS)
	}

	fn task_path(&self, id: &TaskId) -> String {
		format!("{}/{id}", self.session().config.endpoints.tasks.trim_end_matches('/'))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn task_decodes_with_defaults_and_extras() {
		let task: Task = serde_json::from_str(
			r#"{"id":3,"title":"Ship","priority":"high","due_date":"2026-01-02T03:04:05Z","owner":"ada"}"#,
		)
		.expect("Task fixture should decode.");

		assert_eq!(task.id.as_ref(), "3");
		assert_eq!(task.status, TaskStatus::Todo);
		assert_eq!(task.priority, Some(TaskPriority::High));
		assert_eq!(task.due_date, Some(time::macros::datetime!(2026-01-02 03:04:05 UTC)));
		assert_eq!(task.extra.get("owner"), Some(&serde_json::json!("ada")));
	}

	#[test]
	fn unknown_status_is_tolerated() {
		let task: Task = serde_json::from_str(r#"{"id":"a","title":"t","status":"blocked"}"#)
			.expect("Unknown status should decode.");

		assert_eq!(task.status, TaskStatus::Unknown);
	}

	#[test]
	fn listings_accept_bare_and_wrapped_shapes() {
		let decode = |body: &str| {
			let response = ApiResponse::new(200, body.as_bytes().to_vec());

			decode_wrapped::<Vec<Task>>(&response, LIST_FIELDS)
		};
		let bare = decode(r#"[{"id":1,"title":"a"}]"#).expect("Bare list should decode.");
		let wrapped =
			decode(r#"{"tasks":[{"id":1,"title":"a"}]}"#).expect("Wrapped list should decode.");
		let data = decode(r#"{"data":[]}"#).expect("Data-wrapped list should decode.");

		assert_eq!(bare, wrapped);
		assert!(data.is_empty());
	}

	#[test]
	fn wrapped_decode_failure_keeps_the_path() {
		let response = ApiResponse::new(200, br#"{"task":{"id":1,"title":42}}"#.to_vec());
		let err = decode_wrapped::<Task>(&response, TASK_FIELDS)
			.expect_err("Numeric title should fail to decode.");

		match err {
			Error::Payload(PayloadError::Decode { path, status, .. }) => {
				assert_eq!(path, "title");
				assert_eq!(status, 200);
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn patch_sends_only_set_fields() {
		let patch = TaskPatch::default().status(TaskStatus::Done);

		assert!(!patch.is_empty());
		assert!(TaskPatch::default().is_empty());
		assert_eq!(
			serde_json::to_value(&patch).expect("Patch should encode."),
			serde_json::json!({ "status": "done" })
		);
	}

	#[test]
	fn new_task_omits_unset_fields() {
		let body = NewTask::new("Write docs").with_priority(TaskPriority::Low);

		assert_eq!(
			serde_json::to_value(&body).expect("Task body should encode."),
			serde_json::json!({ "title": "Write docs", "priority": "low" })
		);
	}

	#[test]
	fn query_key_is_order_independent() {
		let query = TaskQuery::default().with_search("milk").with_status(TaskStatus::InProgress);

		assert_eq!(query.key("/tasks"), RequestKey::get("/tasks?status=in_progress&search=milk"));
	}
}
