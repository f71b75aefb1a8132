//! Slash-delimited repository path helpers
//!
//! Paths are repository-relative, use `/`, and carry no trailing slash. The
//! empty string is the repository root.

/// Everything before the last `/`, or `""` for a top-level item
pub fn get_parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Everything after the last `/`
pub fn get_file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// True if `path` is `ancestor` itself or lies beneath it
///
/// The root (`""`) is an ancestor of every path.
pub fn is_ancestor(ancestor: &str, path: &str) -> bool {
    if ancestor.is_empty() {
        return true;
    }
    path == ancestor
        || (path.len() > ancestor.len()
            && path.starts_with(ancestor)
            && path.as_bytes()[ancestor.len()] == b'/')
}

/// Number of `/`-delimited segments (`""` has depth 0, `a/b` depth 2)
pub fn get_folder_depth(path: &str) -> usize {
    if path.is_empty() {
        0
    } else {
        path.split('/').count()
    }
}

/// Join a parent folder and a child name
pub fn combine(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        parent.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Portion of `path` below `ancestor`, or None if it is not beneath it
pub fn make_relative<'a>(ancestor: &str, path: &'a str) -> Option<&'a str> {
    if !is_ancestor(ancestor, path) {
        return None;
    }
    if ancestor.is_empty() {
        return Some(path);
    }
    Some(path[ancestor.len()..].trim_start_matches('/'))
}

/// Ancestors of `path` from its parent up to (excluding) the root
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(Some(get_parent(path)), |p| Some(get_parent(*p)))
        .take_while(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_and_file_name() {
        assert_eq!(get_parent("root/sub/file.txt"), "root/sub");
        assert_eq!(get_parent("file.txt"), "");
        assert_eq!(get_file_name("root/sub/file.txt"), "file.txt");
        assert_eq!(get_file_name("file.txt"), "file.txt");
    }

    #[test]
    fn test_is_ancestor() {
        assert!(is_ancestor("root", "root"));
        assert!(is_ancestor("root", "root/sub/file.txt"));
        assert!(is_ancestor("", "root"));
        assert!(!is_ancestor("root/sub", "root/sub-other/file.txt"));
        assert!(!is_ancestor("root/sub", "root"));
    }

    #[test]
    fn test_folder_depth() {
        assert_eq!(get_folder_depth(""), 0);
        assert_eq!(get_folder_depth("root"), 1);
        assert_eq!(get_folder_depth("root/parent/child"), 3);
    }

    #[test]
    fn test_combine_and_relative() {
        assert_eq!(combine("", "a"), "a");
        assert_eq!(combine("a/b", "c"), "a/b/c");
        assert_eq!(make_relative("a/b", "a/b/c/d"), Some("c/d"));
        assert_eq!(make_relative("a/b", "a/b"), Some(""));
        assert_eq!(make_relative("a/b", "a/bc"), None);
        assert_eq!(make_relative("", "a/b"), Some("a/b"));
    }

    #[test]
    fn test_ancestors() {
        let all: Vec<_> = ancestors("a/b/c/file").collect();
        assert_eq!(all, vec!["a/b/c", "a/b", "a"]);
        assert_eq!(ancestors("file").count(), 0);
    }
}
