//! Domain types for the todo handlers.

use serde::{Deserialize, Serialize};

use crate::store::Insert;

/// Table every statement targets.
pub const TODOS_TABLE: &str = "todos";

/// A persisted todo row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    pub todo: String,
}

/// The insert record for a new todo. Only the `todo` field of the submitted
/// form is kept; a missing field stays `None` and binds as SQL NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTodo {
    pub todo: Option<String>,
}

impl NewTodo {
    /// Parse a `application/x-www-form-urlencoded` body. The first `todo`
    /// pair wins; every other field is dropped.
    pub fn from_form(body: &str) -> Self {
        let todo = form_urlencoded::parse(body.as_bytes())
            .find(|(key, _)| key == "todo")
            .map(|(_, value)| value.into_owned());
        Self { todo }
    }

    pub fn to_insert(&self) -> Insert {
        Insert::into_table(TODOS_TABLE).value("todo", self.todo.clone())
    }
}

/// Confirmation text returned by a successful create.
pub fn confirmation_message(id: i64) -> String {
    format!("Tarea insertada correctamente con id {id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqlValue;

    #[test]
    fn form_decodes_plus_and_percent_escapes() {
        let input = NewTodo::from_form("todo=Buy+milk%21");
        assert_eq!(input.todo.as_deref(), Some("Buy milk!"));
    }

    #[test]
    fn form_drops_other_fields() {
        let input = NewTodo::from_form("owner=ana&todo=Walk+dog&done=1");
        assert_eq!(input.todo.as_deref(), Some("Walk dog"));
        let (sql, params) = input.to_insert().to_sql();
        assert_eq!(sql, "INSERT INTO todos (todo) VALUES (?)");
        assert_eq!(params, vec![SqlValue::Text("Walk dog".to_string())]);
    }

    #[test]
    fn form_without_todo_binds_null() {
        let input = NewTodo::from_form("title=nope");
        assert!(input.todo.is_none());
        let (_, params) = input.to_insert().to_sql();
        assert_eq!(params, vec![SqlValue::Null]);
    }

    #[test]
    fn first_duplicate_wins() {
        let input = NewTodo::from_form("todo=a&todo=b");
        assert_eq!(input.todo.as_deref(), Some("a"));
    }

    #[test]
    fn empty_value_is_kept() {
        let input = NewTodo::from_form("todo=");
        assert_eq!(input.todo.as_deref(), Some(""));
    }

    #[test]
    fn confirmation_includes_id() {
        assert_eq!(
            confirmation_message(7),
            "Tarea insertada correctamente con id 7"
        );
    }

    #[test]
    fn todo_serializes_flat() {
        let todo = Todo {
            id: 7,
            todo: "Buy milk".to_string(),
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json, serde_json::json!({"id": 7, "todo": "Buy milk"}));
    }
}
