//! Helpers for the service's backslash-separated hierarchical paths.
//!
//! Classification nodes report absolute paths (`\Fabrikam\Iteration\Release\2024`), create calls
//! take a path relative to the group root (`\Release\2024`), and team settings report iterations
//! as `Fabrikam\Release\2024\2024-01`.

use crate::models::TreeStructureGroup;

pub const PATH_SEPARATOR: char = '\\';

/// Converts an absolute iteration path into the relative path expected by create calls.
///
/// Paths that do not start with `\{project}\Iteration` are returned unchanged.
pub fn relative_path(absolute: &str, project: &str) -> String {
    let prefix = group_root(project, TreeStructureGroup::Iterations);
    match absolute.strip_prefix(&prefix) {
        Some(rest) => rest.to_string(),
        None => absolute.to_string(),
    }
}

/// Absolute path of a group's root node: `\{project}\Iteration`.
pub fn group_root(project: &str, group: TreeStructureGroup) -> String {
    format!(
        "{sep}{project}{sep}{root}",
        sep = PATH_SEPARATOR,
        root = group.root_segment()
    )
}

/// Prefix that team iteration paths under the managed root start with: `{project}\{root}`.
pub fn scope_prefix(project: &str, root: &str) -> String {
    format!("{}{}{}", project, PATH_SEPARATOR, root)
}

/// Exact, case-sensitive prefix match.
pub fn is_in_scope(path: &str, prefix: &str) -> bool {
    path.starts_with(prefix)
}

/// Non-empty segments of a path, accepting either `\` or `/` as separator.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split([PATH_SEPARATOR, '/']).filter(|s| !s.is_empty())
}

/// Joins segments into an absolute path.
pub fn join<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    segments.into_iter().fold(String::new(), |mut path, segment| {
        path.push(PATH_SEPARATOR);
        path.push_str(segment);
        path
    })
}
