//! Relative-path decomposition
//!
//! A library path is at most `primary/secondary/sub.../file.ext`. The primary
//! and secondary directories and the file name each get analyzed as separate
//! components; deeper directories are kept only as an opaque sub-path.

/// Structural parts of a file path relative to the library root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    pub primary: String,
    pub secondary: String,
    pub sub_path: String,
    pub file_name: String,
    pub extension: String,
}

/// Splits `path` on `/` into the layout parts. The extension is everything
/// after the final dot of the last component, without the dot.
pub fn split_layout(path: &str) -> Layout {
    let mut layout = Layout::default();

    let (dir_part, file_part) = match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    };

    match file_part.rfind('.') {
        Some(i) => {
            layout.file_name = file_part[..i].to_string();
            layout.extension = file_part[i + 1..].to_string();
        }
        None => layout.file_name = file_part.to_string(),
    }

    if dir_part.is_empty() {
        return layout;
    }
    let dirs: Vec<&str> = dir_part.split('/').collect();
    layout.primary = dirs[0].to_string();
    if dirs.len() > 1 {
        layout.secondary = dirs[1].to_string();
    }
    if dirs.len() > 2 {
        layout.sub_path = dirs[2..].join("/");
    }

    layout
}
