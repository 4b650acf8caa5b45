//! Tool descriptors: input schemas, argument marshaling, post-processing.
//!
//! The tool set is a closed sum type. Every variant carries its own schema
//! and marshaling rule in one exhaustive `match`, so a tool without an
//! argument rule is a compile error rather than a runtime lookup miss.

use serde_json::{Map, Value, json};

use crate::error::ToolError;
use crate::normalize::NormalizedResult;

/// Flag terminating every argument vector to request machine-readable output.
pub const JSON_FLAG: &str = "--json";

/// One registered tool: schema, marshaling rule, optional post-processing.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: Value,
    pub kind: ToolKind,
    pub post: Option<PostProcess>,
}

impl ToolDescriptor {
    /// Build the full argument vector for a validated payload.
    ///
    /// Deterministic: fields are consumed in a fixed per-tool order, never in
    /// payload iteration order, and the vector always ends with [`JSON_FLAG`].
    pub fn argv(&self, payload: &Map<String, Value>) -> Result<Vec<String>, ToolError> {
        let mut argv = self.kind.marshal(self.name, payload)?;
        argv.push(JSON_FLAG.to_string());
        Ok(argv)
    }
}

/// Post-processing applied to a normalized result after invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    /// Derive the journal file path from the returned directory path.
    JournalPath,
    /// Annotate that the server returns a path rather than revealing a folder.
    RevealNote,
}

impl PostProcess {
    pub fn apply(self, result: NormalizedResult) -> NormalizedResult {
        let mut map = match result {
            NormalizedResult::Structured(Value::Object(map)) => map,
            other => return other,
        };
        match self {
            PostProcess::JournalPath => {
                if let Some(path) = map.get("path").and_then(Value::as_str) {
                    map.insert(
                        "journalPath".to_string(),
                        json!(format!("{path}/journal.org")),
                    );
                    map.insert(
                        "note".to_string(),
                        json!("In server context, this returns the path. Use a client to actually open the file."),
                    );
                }
            }
            PostProcess::RevealNote => {
                map.insert(
                    "note".to_string(),
                    json!("In server context, this returns the path. Use a client to actually reveal the folder."),
                );
            }
        }
        NormalizedResult::Structured(Value::Object(map))
    }
}

/// Closed set of operations the gateway exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    List,
    Read,
    Headings,
    Search,
    Agenda,
    Environment,
    Version,
    AiOverview,
    Directory,
    Path,
    Create,
    Archive,
    Delete,
    Open,
    Reveal,
}

impl ToolKind {
    pub const ALL: [ToolKind; 15] = [
        ToolKind::List,
        ToolKind::Read,
        ToolKind::Headings,
        ToolKind::Search,
        ToolKind::Agenda,
        ToolKind::Environment,
        ToolKind::Version,
        ToolKind::AiOverview,
        ToolKind::Directory,
        ToolKind::Path,
        ToolKind::Create,
        ToolKind::Archive,
        ToolKind::Delete,
        ToolKind::Open,
        ToolKind::Reveal,
    ];

    /// The descriptor for this tool, including its input schema.
    pub fn descriptor(self) -> ToolDescriptor {
        match self {
            ToolKind::List => ToolDescriptor {
                name: "para_list",
                description:
                    "List all projects and/or areas in the PARA system. Optionally filter by type.",
                schema: json!({
                    "type": "object",
                    "properties": {
                        "type": {
                            "type": "string",
                            "enum": ["project", "area", "all"],
                            "description": "Filter by type: 'project', 'area', or 'all' (default: all)",
                            "default": "all"
                        }
                    }
                }),
                kind: self,
                post: None,
            },
            ToolKind::Read => ToolDescriptor {
                name: "para_read",
                description:
                    "Read the entire journal file content for a specific project or area.",
                schema: type_and_name_schema(),
                kind: self,
                post: None,
            },
            ToolKind::Headings => ToolDescriptor {
                name: "para_headings",
                description:
                    "Extract org-mode headings from the journal file of a project or area.",
                schema: type_and_name_schema(),
                kind: self,
                post: None,
            },
            ToolKind::Search => ToolDescriptor {
                name: "para_search",
                description:
                    "Search for text in PARA files with context. Fast full-text search.",
                schema: json!({
                    "type": "object",
                    "properties": {
                        "scope": {
                            "type": "string",
                            "enum": ["project", "area", "projects", "areas", "resources", "archive", "all"],
                            "description": "Search scope: a specific 'project' or 'area', or one of the collection scopes"
                        },
                        "name": {
                            "type": "string",
                            "description": "Name of the project or area (required when scope is 'project' or 'area')"
                        },
                        "query": {
                            "type": "string",
                            "description": "Search query text"
                        },
                        "context": {
                            "type": "integer",
                            "description": "Number of context lines before/after each match (default: 2)",
                            "default": 2
                        },
                        "caseSensitive": {
                            "type": "boolean",
                            "description": "Whether to perform case-sensitive search (default: false)",
                            "default": false
                        }
                    },
                    "required": ["scope", "query"]
                }),
                kind: self,
                post: None,
            },
            ToolKind::Agenda => ToolDescriptor {
                name: "para_agenda",
                description:
                    "Export the org-mode agenda from PARA projects and areas: TODOs, deadlines, and scheduled items.",
                schema: json!({
                    "type": "object",
                    "properties": {
                        "days": {
                            "type": "integer",
                            "description": "Number of days in the agenda view (default: 7)",
                            "default": 7
                        },
                        "project": {
                            "type": "string",
                            "description": "Limit the agenda to a specific project name"
                        },
                        "area": {
                            "type": "string",
                            "description": "Limit the agenda to a specific area name"
                        },
                        "scope": {
                            "type": "string",
                            "enum": ["projects", "areas", "all"],
                            "description": "Scope: 'projects', 'areas', or 'all' (default: all)",
                            "default": "all"
                        }
                    }
                }),
                kind: self,
                post: None,
            },
            ToolKind::Environment => ToolDescriptor {
                name: "para_environment",
                description:
                    "Display environment configuration and validate the PARA setup (PARA_HOME, PARA_ARCHIVE, etc.).",
                schema: empty_schema(),
                kind: self,
                post: None,
            },
            ToolKind::Version => ToolDescriptor {
                name: "para_version",
                description: "Get para version information.",
                schema: empty_schema(),
                kind: self,
                post: None,
            },
            ToolKind::AiOverview => ToolDescriptor {
                name: "para_ai_overview",
                description:
                    "Get comprehensive documentation about para, including all commands and usage.",
                schema: empty_schema(),
                kind: self,
                post: None,
            },
            ToolKind::Directory => ToolDescriptor {
                name: "para_directory",
                description: "Get the absolute directory path for a specific project or area.",
                schema: type_and_name_schema(),
                kind: self,
                post: None,
            },
            ToolKind::Path => ToolDescriptor {
                name: "para_path",
                description:
                    "Get PARA system paths (home, resources, archive, or the path to a specific project/area).",
                schema: json!({
                    "type": "object",
                    "properties": {
                        "location": {
                            "type": "string",
                            "enum": ["home", "resources", "archive", "project", "area"],
                            "description": "Location type to get the path for"
                        },
                        "name": {
                            "type": "string",
                            "description": "Name of project or area (required if location is 'project' or 'area')"
                        }
                    },
                    "required": ["location"]
                }),
                kind: self,
                post: None,
            },
            ToolKind::Create => ToolDescriptor {
                name: "para_create",
                description:
                    "Create a new project or area, including its directory and journal file.",
                schema: type_and_name_schema(),
                kind: self,
                post: None,
            },
            ToolKind::Archive => ToolDescriptor {
                name: "para_archive",
                description:
                    "Archive a completed project or area by moving it to the archive location.",
                schema: type_and_name_schema(),
                kind: self,
                post: None,
            },
            ToolKind::Delete => ToolDescriptor {
                name: "para_delete",
                description:
                    "Permanently delete a project or area. This action cannot be undone.",
                schema: type_and_name_schema(),
                kind: self,
                post: None,
            },
            ToolKind::Open => ToolDescriptor {
                name: "para_open",
                description: "Get the path to the journal file for a project or area.",
                schema: type_and_name_schema(),
                kind: self,
                post: Some(PostProcess::JournalPath),
            },
            ToolKind::Reveal => ToolDescriptor {
                name: "para_reveal",
                description: "Get the directory path for a project or area.",
                schema: type_and_name_schema(),
                kind: self,
                post: Some(PostProcess::RevealNote),
            },
        }
    }

    /// Build the bare argument vector (without the trailing [`JSON_FLAG`]).
    ///
    /// Conditional requirements (a name that is only mandatory under certain
    /// scopes) are enforced here, before any process is launched.
    fn marshal(self, tool: &str, payload: &Map<String, Value>) -> Result<Vec<String>, ToolError> {
        let mut args: Vec<String> = Vec::new();
        match self {
            ToolKind::List => {
                args.push("list".to_string());
                // "all" is the CLI's own default; the bare `list` form is used for it.
                if let Some(kind) = optional_str(payload, "type")
                    && kind != "all"
                {
                    args.push(kind.to_string());
                }
            }
            ToolKind::Read => push_type_and_name(&mut args, "read", tool, payload)?,
            ToolKind::Headings => push_type_and_name(&mut args, "headings", tool, payload)?,
            ToolKind::Search => {
                let scope = require_str(tool, payload, "scope")?;
                args.push("search".to_string());
                args.push(scope.to_string());
                if matches!(scope, "project" | "area") {
                    let name = require_str(tool, payload, "name")?;
                    args.push(name.to_string());
                }
                args.push(require_str(tool, payload, "query")?.to_string());
                // The CLI's own default context is 2; only a divergence is passed.
                if let Some(context) = optional_u64(payload, "context")
                    && context != 2
                {
                    args.push("-C".to_string());
                    args.push(context.to_string());
                }
                if optional_bool(payload, "caseSensitive").unwrap_or(false) {
                    args.push("--case-sensitive".to_string());
                }
            }
            ToolKind::Agenda => {
                args.push("agenda".to_string());
                args.push("--days".to_string());
                args.push(optional_u64(payload, "days").unwrap_or(7).to_string());
                // Fixed precedence: project, then area, then the scope catch-all.
                if let Some(project) = optional_str(payload, "project") {
                    args.push("--project".to_string());
                    args.push(project.to_string());
                } else if let Some(area) = optional_str(payload, "area") {
                    args.push("--area".to_string());
                    args.push(area.to_string());
                } else {
                    args.push("--scope".to_string());
                    args.push(optional_str(payload, "scope").unwrap_or("all").to_string());
                }
            }
            ToolKind::Environment => args.push("environment".to_string()),
            ToolKind::Version => args.push("version".to_string()),
            ToolKind::AiOverview => args.push("ai-overview".to_string()),
            ToolKind::Directory => push_type_and_name(&mut args, "directory", tool, payload)?,
            ToolKind::Path => {
                let location = require_str(tool, payload, "location")?;
                args.push("path".to_string());
                args.push(location.to_string());
                if matches!(location, "project" | "area") {
                    args.push(require_str(tool, payload, "name")?.to_string());
                }
            }
            ToolKind::Create => push_type_and_name(&mut args, "create", tool, payload)?,
            ToolKind::Archive => push_type_and_name(&mut args, "archive", tool, payload)?,
            ToolKind::Delete => push_type_and_name(&mut args, "delete", tool, payload)?,
            // Both resolve through the directory command; they differ only in
            // post-processing.
            ToolKind::Open | ToolKind::Reveal => {
                push_type_and_name(&mut args, "directory", tool, payload)?
            }
        }
        Ok(args)
    }
}

/// Shared schema for the `<command> <type> <name>` tool family.
fn type_and_name_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "type": {
                "type": "string",
                "enum": ["project", "area"],
                "description": "Type of item: 'project' or 'area'"
            },
            "name": {
                "type": "string",
                "description": "Name of the project or area"
            }
        },
        "required": ["type", "name"]
    })
}

fn empty_schema() -> Value {
    json!({
        "type": "object",
        "properties": {}
    })
}

fn push_type_and_name(
    args: &mut Vec<String>,
    command: &str,
    tool: &str,
    payload: &Map<String, Value>,
) -> Result<(), ToolError> {
    args.push(command.to_string());
    args.push(require_str(tool, payload, "type")?.to_string());
    args.push(require_str(tool, payload, "name")?.to_string());
    Ok(())
}

fn require_str<'a>(
    tool: &str,
    payload: &'a Map<String, Value>,
    field: &str,
) -> Result<&'a str, ToolError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::MissingField {
            tool: tool.to_string(),
            field: field.to_string(),
        })
}

fn optional_str<'a>(payload: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    payload.get(field).and_then(Value::as_str)
}

fn optional_u64(payload: &Map<String, Value>, field: &str) -> Option<u64> {
    payload.get(field).and_then(Value::as_u64)
}

fn optional_bool(payload: &Map<String, Value>, field: &str) -> Option<bool> {
    payload.get(field).and_then(Value::as_bool)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().expect("object payload").clone()
    }

    fn argv_for(kind: ToolKind, value: Value) -> Vec<String> {
        kind.descriptor().argv(&payload(value)).unwrap()
    }

    #[test]
    fn create_builds_positional_vector() {
        let argv = argv_for(ToolKind::Create, json!({"type": "project", "name": "alpha"}));
        assert_eq!(argv, vec!["create", "project", "alpha", "--json"]);
    }

    #[test]
    fn list_omits_default_type() {
        assert_eq!(
            argv_for(ToolKind::List, json!({"type": "all"})),
            vec!["list", "--json"]
        );
        assert_eq!(
            argv_for(ToolKind::List, json!({"type": "project"})),
            vec!["list", "project", "--json"]
        );
    }

    #[test]
    fn search_scoped_to_project_includes_name() {
        let argv = argv_for(
            ToolKind::Search,
            json!({"scope": "project", "name": "alpha", "query": "deadline"}),
        );
        assert_eq!(argv, vec!["search", "project", "alpha", "deadline", "--json"]);
    }

    #[test]
    fn search_without_name_for_project_scope_is_missing_field() {
        let err = ToolKind::Search
            .descriptor()
            .argv(&payload(json!({"scope": "project", "query": "x"})))
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingField { ref field, .. } if field == "name"));
    }

    #[test]
    fn search_collection_scope_needs_no_name() {
        let argv = argv_for(ToolKind::Search, json!({"scope": "all", "query": "x"}));
        assert_eq!(argv, vec!["search", "all", "x", "--json"]);
    }

    #[test]
    fn search_default_context_is_omitted() {
        let argv = argv_for(
            ToolKind::Search,
            json!({"scope": "all", "query": "x", "context": 2}),
        );
        assert!(!argv.contains(&"-C".to_string()));

        let argv = argv_for(
            ToolKind::Search,
            json!({"scope": "all", "query": "x", "context": 5}),
        );
        assert_eq!(argv, vec!["search", "all", "x", "-C", "5", "--json"]);
    }

    #[test]
    fn boolean_flag_only_when_true() {
        let argv = argv_for(
            ToolKind::Search,
            json!({"scope": "all", "query": "x", "caseSensitive": false}),
        );
        assert!(!argv.contains(&"--case-sensitive".to_string()));

        let argv = argv_for(
            ToolKind::Search,
            json!({"scope": "all", "query": "x", "caseSensitive": true}),
        );
        assert!(argv.contains(&"--case-sensitive".to_string()));
    }

    #[test]
    fn agenda_project_takes_precedence_over_area() {
        let both = argv_for(
            ToolKind::Agenda,
            json!({"project": "alpha", "area": "health"}),
        );
        let project_only = argv_for(ToolKind::Agenda, json!({"project": "alpha"}));
        assert_eq!(both, project_only);
        assert_eq!(both, vec!["agenda", "--days", "7", "--project", "alpha", "--json"]);
    }

    #[test]
    fn agenda_falls_back_to_scope() {
        let argv = argv_for(ToolKind::Agenda, json!({}));
        assert_eq!(argv, vec!["agenda", "--days", "7", "--scope", "all", "--json"]);

        let argv = argv_for(ToolKind::Agenda, json!({"days": 14, "scope": "projects"}));
        assert_eq!(
            argv,
            vec!["agenda", "--days", "14", "--scope", "projects", "--json"]
        );
    }

    #[test]
    fn path_requires_name_only_for_item_locations() {
        let argv = argv_for(ToolKind::Path, json!({"location": "home"}));
        assert_eq!(argv, vec!["path", "home", "--json"]);

        let argv = argv_for(ToolKind::Path, json!({"location": "project", "name": "alpha"}));
        assert_eq!(argv, vec!["path", "project", "alpha", "--json"]);

        let err = ToolKind::Path
            .descriptor()
            .argv(&payload(json!({"location": "area"})))
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingField { ref field, .. } if field == "name"));
    }

    #[test]
    fn open_and_reveal_route_through_directory() {
        let input = json!({"type": "area", "name": "health"});
        assert_eq!(
            argv_for(ToolKind::Open, input.clone()),
            vec!["directory", "area", "health", "--json"]
        );
        assert_eq!(
            argv_for(ToolKind::Reveal, input),
            vec!["directory", "area", "health", "--json"]
        );
    }

    #[test]
    fn marshaling_is_deterministic() {
        let input = json!({
            "scope": "project",
            "name": "alpha",
            "query": "deadline",
            "context": 4,
            "caseSensitive": true
        });
        let first = argv_for(ToolKind::Search, input.clone());
        let second = argv_for(ToolKind::Search, input);
        assert_eq!(first, second);
    }

    #[test]
    fn every_vector_ends_with_json_flag() {
        let argv = argv_for(ToolKind::Version, json!({}));
        assert_eq!(argv.last().map(String::as_str), Some(JSON_FLAG));
    }

    #[test]
    fn journal_path_hook_derives_from_path() {
        let result = NormalizedResult::Structured(json!({"path": "/para/projects/alpha"}));
        let result = PostProcess::JournalPath.apply(result);
        let value = result.into_value();
        assert_eq!(value["journalPath"], "/para/projects/alpha/journal.org");
        assert!(value["note"].is_string());
    }

    #[test]
    fn journal_path_hook_leaves_pathless_results_alone() {
        let result = NormalizedResult::Structured(json!({"error": "not found"}));
        let value = PostProcess::JournalPath.apply(result).into_value();
        assert!(value.get("journalPath").is_none());
    }

    #[test]
    fn reveal_hook_annotates_objects_only() {
        let raw = NormalizedResult::RawFallback("plain text".to_string());
        assert!(PostProcess::RevealNote.apply(raw).is_raw());

        let result = NormalizedResult::Structured(json!({"path": "/para/areas/health"}));
        let value = PostProcess::RevealNote.apply(result).into_value();
        assert!(value["note"].as_str().unwrap().contains("reveal"));
    }
}
