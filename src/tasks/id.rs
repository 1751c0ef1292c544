//! Validated task identifiers.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const TASK_ID_MAX_LEN: usize = 128;
const RESERVED: [char; 4] = ['/', '?', '#', '%'];

/// Error returned when task identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum TaskIdError {
	/// The identifier was empty.
	#[error("Task identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Task identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier contains a character that would change the request path.
	#[error("Task identifier contains reserved character `{character}`.")]
	ReservedCharacter {
		/// Offending character.
		character: char,
	},
	/// The identifier exceeded the allowed length.
	#[error("Task identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted length.
		max: usize,
	},
}

/// Server-assigned task identifier, safe to splice into a request path.
///
/// The API may send identifiers as strings or integers; both decode into the same value and
/// always serialize back as a string.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub struct TaskId(String);
impl TaskId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, TaskIdError> {
		let view = value.as_ref();

		validate(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for TaskId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for TaskId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for TaskId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<TaskId> for String {
	fn from(value: TaskId) -> Self {
		value.0
	}
}
impl From<u64> for TaskId {
	fn from(value: u64) -> Self {
		Self(value.to_string())
	}
}
impl TryFrom<String> for TaskId {
	type Error = TaskIdError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate(&value)?;

		Ok(Self(value))
	}
}
impl<'de> Deserialize<'de> for TaskId {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		match RawTaskId::deserialize(deserializer)? {
			RawTaskId::Text(text) => Self::try_from(text).map_err(serde::de::Error::custom),
			RawTaskId::Number(number) => Ok(Self::from(number)),
		}
	}
}
impl FromStr for TaskId {
	type Err = TaskIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for TaskId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Task({})", self.0)
	}
}
impl Display for TaskId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTaskId {
	Text(String),
	Number(u64),
}

fn validate(view: &str) -> Result<(), TaskIdError> {
	if view.is_empty() {
		return Err(TaskIdError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(TaskIdError::ContainsWhitespace);
	}
	if let Some(character) = view.chars().find(|c| RESERVED.contains(c)) {
		return Err(TaskIdError::ReservedCharacter { character });
	}
	if view.len() > TASK_ID_MAX_LEN {
		return Err(TaskIdError::TooLong { max: TASK_ID_MAX_LEN });
	}

	Ok(())
}
