//! Static tool catalog for `POST /mcp/list_tools`, per spec.md §4.10's
//! table of tools and required parameters.

use serde_json::{Value, json};

pub fn catalog() -> Value {
    json!([
        {
            "name": "create_task",
            "description": "Create a task with a title and due date.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "Task title" },
                    "due_date": { "type": "string", "description": "RFC 3339 due date" },
                    "priority": { "type": "integer", "description": "Priority 1-5, defaults to 3" },
                    "user_id": { "type": "string", "description": "Owning user id, defaults to the authenticated subject" },
                },
                "required": ["title", "due_date"],
            },
        },
        {
            "name": "create_goal",
            "description": "Create a goal with a title and target date.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "Goal title" },
                    "target_date": { "type": "string", "description": "RFC 3339 target date" },
                    "start_date": { "type": "string", "description": "RFC 3339 start date, defaults to now" },
                    "user_id": { "type": "string", "description": "Owning user id, defaults to the authenticated subject" },
                },
                "required": ["title", "target_date"],
            },
        },
        {
            "name": "parse_task",
            "description": "Parse a free-form natural-language description into a structured task.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "input": { "type": "string", "description": "Free-form task description" },
                },
                "required": ["input"],
            },
        },
        {
            "name": "generate_subtasks",
            "description": "Break a task down into an ordered list of subtasks.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "task_title": { "type": "string", "description": "Title of the parent task" },
                    "task_description": { "type": "string", "description": "Optional longer description" },
                },
                "required": ["task_title"],
            },
        },
        {
            "name": "analyze_productivity",
            "description": "Summarize completed and overdue tasks for a user over a trailing window.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "user_id": { "type": "string", "description": "User id to analyze" },
                    "days": { "type": "integer", "description": "Trailing window in days, defaults to 7" },
                },
                "required": ["user_id"],
            },
        },
    ])
}
